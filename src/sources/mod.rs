//! Where RFLink lines come from

mod serial;

pub use serial::{open_serial, LineReader, TransportError, READ_TIMEOUT};
