use std::collections::BTreeMap;

use crate::nest::{Descriptor, OptionalValue, Shape, Slot, SparseTensor, Tensor};

/// Structured value: nested aggregate of tensor leaves and optionals.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Dense tensor leaf.
	Tensor(Tensor),
	/// Sparse tensor leaf.
	Sparse(SparseTensor),
	/// Ordered sequence of children.
	Sequence(Vec<Value>),
	/// Named children, kept in key order.
	Mapping(BTreeMap<Box<str>, Value>),
	/// Embedded optional, encoded as a single slot.
	Optional(OptionalValue),
}

impl Value {
	/// Sequence built from anything convertible into values.
	pub fn tuple<I, V>(items: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		Self::Sequence(items.into_iter().map(Into::into).collect())
	}

	/// Mapping built from `(name, value)` pairs.
	pub fn mapping<I, K, V>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<Box<str>>,
		V: Into<Value>,
	{
		Self::Mapping(entries.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
	}

	/// Child of a sequence by position.
	pub fn get(&self, index: usize) -> Option<&Value> {
		match self {
			Self::Sequence(items) => items.get(index),
			_ => None,
		}
	}

	/// Child of a mapping by name.
	pub fn field(&self, name: &str) -> Option<&Value> {
		match self {
			Self::Mapping(entries) => entries.get(name),
			_ => None,
		}
	}

	/// Dense leaf payload.
	pub fn as_tensor(&self) -> Option<&Tensor> {
		match self {
			Self::Tensor(tensor) => Some(tensor),
			_ => None,
		}
	}

	/// Embedded optional payload.
	pub fn as_optional(&self) -> Option<&OptionalValue> {
		match self {
			Self::Optional(optional) => Some(optional),
			_ => None,
		}
	}

	/// Stable lowercase label of the variant.
	pub fn kind_label(&self) -> &'static str {
		match self {
			Self::Tensor(_) => "tensor",
			Self::Sparse(_) => "sparse",
			Self::Sequence(_) => "sequence",
			Self::Mapping(_) => "mapping",
			Self::Optional(_) => "optional",
		}
	}

	/// Flatten against the value's own structure. Depth-first, keys in order.
	pub(crate) fn push_slots(&self, out: &mut Vec<Slot>) {
		match self {
			Self::Tensor(tensor) => out.push(Slot::Dense(tensor.clone())),
			Self::Sparse(sparse) => out.push(Slot::Sparse(sparse.clone())),
			Self::Sequence(items) => items.iter().for_each(|item| item.push_slots(out)),
			Self::Mapping(entries) => entries.values().for_each(|item| item.push_slots(out)),
			Self::Optional(optional) => out.push(Slot::Optional(optional.slot().clone())),
		}
	}

	pub(crate) fn to_slots(&self) -> Vec<Slot> {
		let mut out = Vec::new();
		self.push_slots(&mut out);
		out
	}
}

impl From<Tensor> for Value {
	fn from(value: Tensor) -> Self {
		Self::Tensor(value)
	}
}

impl From<SparseTensor> for Value {
	fn from(value: SparseTensor) -> Self {
		Self::Sparse(value)
	}
}

impl From<OptionalValue> for Value {
	fn from(value: OptionalValue) -> Self {
		Self::Optional(value)
	}
}

macro_rules! value_from_tensor {
	($($ty:ty),*) => {
		$(
			impl From<$ty> for Value {
				fn from(value: $ty) -> Self {
					Self::Tensor(Tensor::from(value))
				}
			}
		)*
	};
}

value_from_tensor!(bool, i32, i64, f32, f64, &str, Vec<bool>, Vec<i32>, Vec<i64>, Vec<f32>, Vec<f64>, Vec<&str>);

/// Capability of reporting one's own structure descriptor.
pub trait Describe {
	/// Descriptor inferred from runtime shape and kind.
	fn describe(&self) -> Descriptor;
}

impl Describe for Tensor {
	fn describe(&self) -> Descriptor {
		Descriptor::tensor(self.dtype(), Shape::known(self.shape()))
	}
}

impl Describe for SparseTensor {
	fn describe(&self) -> Descriptor {
		Descriptor::sparse(self.dtype(), Shape::known(&self.dense_extents()))
	}
}

impl Describe for OptionalValue {
	fn describe(&self) -> Descriptor {
		self.descriptor()
	}
}

impl Describe for Value {
	fn describe(&self) -> Descriptor {
		match self {
			Self::Tensor(tensor) => tensor.describe(),
			Self::Sparse(sparse) => sparse.describe(),
			Self::Sequence(items) => Descriptor::Sequence(items.iter().map(Describe::describe).collect()),
			Self::Mapping(entries) => Descriptor::Mapping(entries.iter().map(|(key, item)| (key.clone(), item.describe())).collect()),
			Self::Optional(optional) => optional.describe(),
		}
	}
}
