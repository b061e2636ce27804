//! Ingestion path: RFLink line -> parsed readings -> registry
//!
//! All inserts into the registry go through here, one line at a time, in
//! arrival order.

use crate::sources::{LineReader, TransportError};
use log::{debug, error, info, warn};
use rflink_prom_core::{
    parse_message, resolve_name, ExpositionSink, Metric, MetricDescriptor, NameLookup, ParseError,
    Registry, SensorIdentity, SinkError,
};
use std::io::BufRead;
use std::sync::Arc;

pub struct Ingestor<S: ExpositionSink> {
    registry: Arc<Registry<S>>,
    sink: Arc<S>,
    names: Arc<dyn NameLookup>,
}

impl<S: ExpositionSink> Ingestor<S> {
    pub fn new(registry: Arc<Registry<S>>, sink: Arc<S>, names: Arc<dyn NameLookup>) -> Self {
        Self {
            registry,
            sink,
            names,
        }
    }

    /// Decode one line and update the metrics it reports
    ///
    /// Returns the number of metrics updated. Bad fields are skipped; only a
    /// line too short to name a vendor is rejected.
    pub fn handle_line(&self, line: &str) -> Result<usize, ParseError> {
        let message = parse_message(line)?;
        let sensor_key = message.sensor.key();

        let mut updated = 0;
        for (field, value) in &message.readings {
            let metric = self.registry.get_or_try_create(&sensor_key, field, || {
                self.new_metric(&message.sensor, field)
            });
            match metric {
                Ok(metric) => {
                    metric.set(*value);
                    updated += 1;
                }
                Err(e) => warn!("[{}|{}] Skipping field: {}", message.sensor, field, e),
            }
        }
        Ok(updated)
    }

    /// Read lines until the transport fails
    ///
    /// Only returns on a transport error, which the caller treats as fatal.
    pub fn run<R: BufRead>(&self, lines: &mut LineReader<R>) -> TransportError {
        loop {
            let line = match lines.next_line() {
                Ok(line) => line,
                Err(e) => return e,
            };
            if line.is_empty() {
                continue;
            }

            debug!("Received from rflink: {}", line);
            if let Err(e) = self.handle_line(&line) {
                error!("Cannot update metrics from message: {}, skipping", e);
            }
        }
    }

    pub fn registry(&self) -> &Arc<Registry<S>> {
        &self.registry
    }

    fn new_metric(&self, sensor: &SensorIdentity, field: &str) -> Result<Metric<S>, SinkError> {
        debug!(
            "Creating new metric: vendor={}, id={}, type={}",
            sensor.vendor, sensor.id, field
        );
        let name = resolve_name(self.names.as_ref(), &sensor.id);
        let descriptor = MetricDescriptor::for_reading(sensor, field, &name);
        let metric = Metric::new(sensor.clone(), field, descriptor, Arc::clone(&self.sink))?;

        info!(
            "Created new gauge {}: vendor={}, id={}, name={}",
            metric.descriptor().fq_name(),
            sensor.vendor,
            sensor.id,
            name
        );
        Ok(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::PrometheusSink;
    use std::collections::HashMap;
    use std::io::Cursor;

    fn ingestor(names: HashMap<String, String>) -> Ingestor<PrometheusSink> {
        Ingestor::new(
            Arc::new(Registry::new()),
            Arc::new(PrometheusSink::new()),
            Arc::new(names),
        )
    }

    #[tokio::test]
    async fn test_handle_line_creates_metrics() {
        let ingest = ingestor(HashMap::new());

        let updated = ingest
            .handle_line("20;1A;Oregon TempHygro;ID=ABCD;TEMP=010a;HUM=45;BAT=OK;")
            .unwrap();
        assert_eq!(updated, 3);

        let registry = ingest.registry();
        assert_eq!(registry.sensor_count(), 1);
        let temp = registry.get("Oregon TempHygro abcd", "temp").unwrap();
        assert_eq!(temp.value(), 26.6);
        assert!(temp.is_registered());
        assert_eq!(temp.descriptor().labels["vendor"], "oregon_temphygro");
        assert_eq!(temp.descriptor().labels["name"], "abcd");
    }

    #[tokio::test]
    async fn test_friendly_name_is_used() {
        let mut names = HashMap::new();
        names.insert("abcd".to_string(), "Living room".to_string());
        let ingest = ingestor(names);

        ingest.handle_line("20;1A;Oregon;ID=ABCD;TEMP=010a;").unwrap();
        let temp = ingest.registry().get("Oregon abcd", "temp").unwrap();
        assert_eq!(temp.descriptor().labels["name"], "Living room");
    }

    #[tokio::test]
    async fn test_repeated_line_updates_same_metric() {
        let ingest = ingestor(HashMap::new());

        ingest.handle_line("20;1A;Oregon;ID=ABCD;TEMP=010a;").unwrap();
        let first = ingest.registry().get("Oregon abcd", "temp").unwrap();
        ingest.handle_line("20;1B;Oregon;ID=ABCD;TEMP=810a;").unwrap();
        let second = ingest.registry().get("Oregon abcd", "temp").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.value(), -26.6);
        assert_eq!(ingest.registry().metric_count(), 1);
    }

    #[tokio::test]
    async fn test_short_line_is_rejected() {
        let ingest = ingestor(HashMap::new());
        assert_eq!(ingest.handle_line("20;1A"), Err(ParseError::TooFewFields(2)));
        assert_eq!(ingest.registry().metric_count(), 0);
    }

    #[tokio::test]
    async fn test_run_returns_transport_error() {
        let ingest = ingestor(HashMap::new());
        let data = "20;00;Nodo RadioFrequencyLink - RFLink Gateway;\r\n\
                    garbage\r\n\
                    \r\n\
                    20;01;Xiron;ID=4C01;TEMP=00c8;HUM=38;BAT=OK;\r\n";
        let mut lines = LineReader::new(Cursor::new(data));

        let err = ingest.run(&mut lines);
        assert!(matches!(err, TransportError::Closed));
        assert_eq!(ingest.registry().metric_count(), 3);
        assert_eq!(ingest.registry().get("Xiron 4c01", "temp").unwrap().value(), 20.0);
    }
}
