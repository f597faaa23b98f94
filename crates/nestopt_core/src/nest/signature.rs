use std::collections::HashMap;

use tracing::debug;

use crate::nest::{Descriptor, Result};

/// Memoizes one traced artifact per argument descriptor.
///
/// Values with equal descriptors share a trace, so optionals holding
/// different payloads of the same structure do not retrace.
pub struct SignatureCache<T> {
	entries: HashMap<Descriptor, T>,
	traces: usize,
}

impl<T> Default for SignatureCache<T> {
	fn default() -> Self {
		Self {
			entries: HashMap::new(),
			traces: 0,
		}
	}
}

impl<T> SignatureCache<T> {
	/// Empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Cached artifact for `signature`, tracing it on first use.
	pub fn get_or_trace(&mut self, signature: &Descriptor, trace: impl FnOnce(&Descriptor) -> Result<T>) -> Result<&T> {
		if !self.entries.contains_key(signature) {
			let artifact = trace(signature)?;
			self.traces += 1;
			debug!(signature = %signature, traces = self.traces, "traced new signature");
			self.entries.insert(signature.clone(), artifact);
		}
		Ok(&self.entries[signature])
	}

	/// Number of times a trace function ran.
	pub fn trace_count(&self) -> usize {
		self.traces
	}

	/// Number of distinct cached signatures.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether nothing has been traced.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
