//! In-memory sink that records what the core asks of it

use crate::sink::{ExpositionSink, MetricDescriptor, SinkError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct SinkState {
    descriptors: Vec<MetricDescriptor>,
    registered: HashSet<usize>,
    values: HashMap<usize, f64>,
    register_calls: usize,
    unregister_calls: usize,
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    state: Mutex<SinkState>,
    reject: AtomicBool,
}

impl RecordingSink {
    pub(crate) fn reject_registrations(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub(crate) fn is_registered(&self, handle: usize) -> bool {
        self.state.lock().unwrap().registered.contains(&handle)
    }

    pub(crate) fn value(&self, handle: usize) -> Option<f64> {
        self.state.lock().unwrap().values.get(&handle).copied()
    }

    pub(crate) fn register_calls(&self) -> usize {
        self.state.lock().unwrap().register_calls
    }

    pub(crate) fn unregister_calls(&self) -> usize {
        self.state.lock().unwrap().unregister_calls
    }

    pub(crate) fn described(&self) -> usize {
        self.state.lock().unwrap().descriptors.len()
    }
}

impl ExpositionSink for RecordingSink {
    type Handle = usize;

    fn describe(&self, descriptor: &MetricDescriptor) -> Result<usize, SinkError> {
        let mut state = self.state.lock().unwrap();
        state.descriptors.push(descriptor.clone());
        Ok(state.descriptors.len() - 1)
    }

    fn register(&self, handle: &usize) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        state.register_calls += 1;
        if self.reject.load(Ordering::SeqCst) {
            return Err(SinkError::Rejected {
                name: state.descriptors[*handle].fq_name(),
                reason: "rejected by test".to_string(),
            });
        }
        state.registered.insert(*handle);
        Ok(())
    }

    fn unregister(&self, handle: &usize) {
        let mut state = self.state.lock().unwrap();
        state.unregister_calls += 1;
        state.registered.remove(handle);
    }

    fn set_value(&self, handle: &usize, value: f64) {
        self.state.lock().unwrap().values.insert(*handle, value);
    }
}
