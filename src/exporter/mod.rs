//! Prometheus exposition: the sink implementation and the HTTP endpoint

mod http;
mod prometheus_sink;

pub use http::{router, serve, METRICS_PATH};
pub use prometheus_sink::PrometheusSink;
