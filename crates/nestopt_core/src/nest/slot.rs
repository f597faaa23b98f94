use std::fmt;
use std::sync::Arc;

use crate::nest::{DType, Shape, SparseTensor, Tensor};

/// One element of the uniform encoding used to cross a boundary.
///
/// Every leaf occupies exactly one slot, and so does every optional,
/// whatever its inner structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
	/// Dense tensor leaf.
	Dense(Tensor),
	/// Sparse tensor leaf.
	Sparse(SparseTensor),
	/// Opaque optional cell.
	Optional(OptionalSlot),
}

impl Slot {
	/// Kind and concrete shape of this slot.
	pub fn spec(&self) -> SlotSpec {
		match self {
			Self::Dense(tensor) => SlotSpec {
				kind: SlotKind::Dense(tensor.dtype()),
				shape: Shape::known(tensor.shape()),
			},
			Self::Sparse(sparse) => SlotSpec {
				kind: SlotKind::Sparse(sparse.dtype()),
				shape: Shape::known(&sparse.dense_extents()),
			},
			Self::Optional(_) => SlotSpec::variant(),
		}
	}
}

/// Presence-tagged payload of an [`OptionalSlot`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
	/// Nothing is held.
	Absent,
	/// Flattened slots of the held value.
	Present(Arc<[Slot]>),
}

/// Arity-1 opaque cell carrying an optional's full state.
///
/// Clones share the payload, so copying a slot across a boundary never
/// re-encodes the wrapped value.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalSlot {
	payload: Payload,
}

impl OptionalSlot {
	/// Cell holding nothing.
	pub fn absent() -> Self {
		Self { payload: Payload::Absent }
	}

	/// Cell holding the flattened slots of a value.
	pub fn present(slots: Vec<Slot>) -> Self {
		Self {
			payload: Payload::Present(slots.into()),
		}
	}

	/// Whether the cell holds a value.
	pub fn is_present(&self) -> bool {
		matches!(self.payload, Payload::Present(_))
	}

	/// Presence-tagged payload.
	pub fn payload(&self) -> &Payload {
		&self.payload
	}

	/// Held slots, if present.
	pub fn slots(&self) -> Option<&[Slot]> {
		match &self.payload {
			Payload::Absent => None,
			Payload::Present(slots) => Some(slots),
		}
	}

	/// Whether two cells share the same payload allocation.
	pub fn shares_payload_with(&self, other: &OptionalSlot) -> bool {
		match (&self.payload, &other.payload) {
			(Payload::Present(a), Payload::Present(b)) => Arc::ptr_eq(a, b),
			(Payload::Absent, Payload::Absent) => true,
			_ => false,
		}
	}
}

/// Encoded kind of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
	/// Dense tensor of the given element kind.
	Dense(DType),
	/// Sparse tensor of the given element kind.
	Sparse(DType),
	/// Opaque optional cell.
	Variant,
}

/// Kind and shape of one flattened slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotSpec {
	/// Encoded kind.
	pub kind: SlotKind,
	/// Shape (scalar for variants).
	pub shape: Shape,
}

impl SlotSpec {
	/// Spec of an optional cell: one scalar variant.
	pub fn variant() -> Self {
		Self {
			kind: SlotKind::Variant,
			shape: Shape::scalar(),
		}
	}
}

impl fmt::Display for SlotSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.kind {
			SlotKind::Dense(dtype) => write!(f, "{dtype}{}", self.shape),
			SlotKind::Sparse(dtype) => write!(f, "sparse {dtype}{}", self.shape),
			SlotKind::Variant => write!(f, "variant{}", self.shape),
		}
	}
}
