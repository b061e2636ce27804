//! Line transport from the RFLink bridge
//!
//! The bridge writes one `\r\n`-terminated message per line. Read timeouts
//! only mean the radio was quiet; any other read error (or the stream
//! ending) is fatal to the exporter. There is no reconnect.
//! TODO: reopen the device with backoff instead of exiting on read errors.

use log::trace;
use std::io::{self, BufRead, BufReader};
use std::time::Duration;
use thiserror::Error;

/// How long a single read may block before it is retried
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open device {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("read failed: {0}")]
    Read(#[from] io::Error),
    #[error("stream closed by the device")]
    Closed,
}

/// Open the serial device and wrap it in a line reader
pub fn open_serial(
    port: &str,
    baud: u32,
) -> Result<LineReader<BufReader<Box<dyn serialport::SerialPort>>>, TransportError> {
    let device = serialport::new(port, baud)
        .timeout(READ_TIMEOUT)
        .open()
        .map_err(|source| TransportError::Open {
            port: port.to_string(),
            source,
        })?;
    Ok(LineReader::new(BufReader::new(device)))
}

/// Splits a byte stream into lines
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Block until the next full line is available
    ///
    /// The returned line has its `\r\n` stripped and invalid UTF-8 replaced.
    pub fn next_line(&mut self) -> Result<String, TransportError> {
        loop {
            match self.reader.read_until(b'\n', &mut self.buf) {
                // Nothing buffered and nothing more to come
                Ok(0) if self.buf.is_empty() => return Err(TransportError::Closed),
                Ok(_) => {
                    let line = String::from_utf8_lossy(&self.buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    self.buf.clear();
                    return Ok(line);
                }
                // Bytes read before the timeout stay in `buf`
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    trace!("Serial read timed out, {} bytes pending", self.buf.len());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(TransportError::Read(e)),
            }
        }
    }
}
