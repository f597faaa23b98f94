use std::sync::Arc;

use crate::nest::{Describe, Descriptor, NestError, OptionalDescriptor, OptionalSlot, Payload, Result, Value};

/// Runtime container holding a structured value or nothing.
///
/// State lives in a single [`OptionalSlot`] so the container crosses
/// boundaries as one unit; the inner descriptor is shared, not copied.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalValue {
	slot: OptionalSlot,
	inner: Arc<Descriptor>,
}

impl OptionalValue {
	/// Wrap a present value. The inner descriptor is inferred from it.
	pub fn from_value(value: impl Into<Value>) -> Self {
		let value = value.into();
		Self {
			slot: OptionalSlot::present(value.to_slots()),
			inner: Arc::new(value.describe()),
		}
	}

	/// Absent optional of the given inner descriptor.
	pub fn empty(inner: Descriptor) -> Self {
		Self {
			slot: OptionalSlot::absent(),
			inner: Arc::new(inner),
		}
	}

	/// Re-attach an inner descriptor to a slot received from elsewhere.
	///
	/// The payload is checked lazily by [`OptionalValue::get_value`].
	pub fn from_slot(slot: OptionalSlot, inner: impl Into<Arc<Descriptor>>) -> Self {
		Self { slot, inner: inner.into() }
	}

	/// Whether a value is held.
	pub fn has_value(&self) -> bool {
		self.slot.is_present()
	}

	/// Decode the held value.
	pub fn get_value(&self) -> Result<Value> {
		match self.slot.payload() {
			Payload::Absent => Err(NestError::NoValue),
			Payload::Present(slots) => self.inner.unflatten(slots.to_vec()),
		}
	}

	/// Descriptor of the wrapped value.
	pub fn element_spec(&self) -> &Descriptor {
		&self.inner
	}

	/// Shared handle to the descriptor of the wrapped value.
	pub fn shared_spec(&self) -> &Arc<Descriptor> {
		&self.inner
	}

	/// Descriptor of this optional itself.
	pub fn descriptor(&self) -> Descriptor {
		Descriptor::Optional(self.optional_descriptor())
	}

	/// Optional descriptor sharing this container's inner descriptor.
	pub fn optional_descriptor(&self) -> OptionalDescriptor {
		OptionalDescriptor::from_shared(self.inner.clone())
	}

	/// Single encoded slot.
	pub fn slot(&self) -> &OptionalSlot {
		&self.slot
	}

	/// Consume into the single encoded slot.
	pub fn into_slot(self) -> OptionalSlot {
		self.slot
	}
}

#[cfg(test)]
mod tests;
