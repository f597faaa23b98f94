use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::nest::{DType, Describe, NestError, OptionalValue, Result, Shape, Slot, SlotKind, SlotSpec, Value};

mod parse;

/// Storage layout of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
	/// Dense row-major tensor.
	Dense,
	/// Sparse `(indices, values, dense_shape)` triple.
	Sparse,
}

/// Element kind, shape, and layout of one tensor leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeafDescriptor {
	/// Element kind.
	pub dtype: DType,
	/// Possibly partial shape (dense shape for sparse leaves).
	pub shape: Shape,
	/// Dense or sparse storage.
	pub layout: Layout,
}

/// Recursive schema of a structured value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Descriptor {
	/// Tensor leaf.
	Leaf(LeafDescriptor),
	/// Ordered children.
	Sequence(Vec<Descriptor>),
	/// Named children in key order.
	Mapping(BTreeMap<Box<str>, Descriptor>),
	/// Value of the inner descriptor, or nothing.
	Optional(OptionalDescriptor),
}

/// Schema of a present-or-absent value. Always encodes as one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionalDescriptor {
	inner: Arc<Descriptor>,
}

impl Descriptor {
	/// Dense leaf descriptor.
	pub fn tensor(dtype: DType, shape: Shape) -> Self {
		Self::Leaf(LeafDescriptor {
			dtype,
			shape,
			layout: Layout::Dense,
		})
	}

	/// Sparse leaf descriptor over a dense shape.
	pub fn sparse(dtype: DType, shape: Shape) -> Self {
		Self::Leaf(LeafDescriptor {
			dtype,
			shape,
			layout: Layout::Sparse,
		})
	}

	/// Optional wrapping `inner`.
	pub fn optional(inner: Descriptor) -> Self {
		Self::Optional(OptionalDescriptor::new(inner))
	}

	/// Mapping descriptor from `(name, descriptor)` pairs.
	pub fn mapping<I, K>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, Descriptor)>,
		K: Into<Box<str>>,
	{
		Self::Mapping(entries.into_iter().map(|(key, item)| (key.into(), item)).collect())
	}

	/// Infer the descriptor of a value.
	pub fn from_value(value: &impl Describe) -> Self {
		value.describe()
	}

	/// Parse the textual form produced by `Display`.
	pub fn parse(input: &str) -> Result<Self> {
		parse::parse_descriptor(input)
	}

	/// Optional view of this descriptor, if it is one.
	pub fn as_optional(&self) -> Option<&OptionalDescriptor> {
		match self {
			Self::Optional(optional) => Some(optional),
			_ => None,
		}
	}

	/// Structural compatibility. Symmetric and reflexive.
	pub fn is_compatible_with(&self, other: &Descriptor) -> bool {
		match (self, other) {
			(Self::Leaf(a), Self::Leaf(b)) => a.dtype == b.dtype && a.layout == b.layout && a.shape.is_compatible_with(&b.shape),
			(Self::Sequence(a), Self::Sequence(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_compatible_with(y)),
			(Self::Mapping(a), Self::Mapping(b)) => {
				a.len() == b.len() && a.iter().zip(b).all(|((ka, va), (kb, vb))| ka == kb && va.is_compatible_with(vb))
			}
			(Self::Optional(a), Self::Optional(b)) => a.inner.is_compatible_with(&b.inner),
			_ => false,
		}
	}

	/// Most specific descriptor compatible with both operands.
	///
	/// Dims that disagree become unknown. Returns `None` when the operands
	/// differ in variant, element kind, layout, arity, or keys.
	pub fn most_specific_common(&self, other: &Descriptor) -> Option<Descriptor> {
		match (self, other) {
			(Self::Leaf(a), Self::Leaf(b)) if a.dtype == b.dtype && a.layout == b.layout => Some(Self::Leaf(LeafDescriptor {
				dtype: a.dtype,
				shape: a.shape.most_specific_common(&b.shape),
				layout: a.layout,
			})),
			(Self::Sequence(a), Self::Sequence(b)) if a.len() == b.len() => {
				a.iter().zip(b).map(|(x, y)| x.most_specific_common(y)).collect::<Option<Vec<_>>>().map(Self::Sequence)
			}
			(Self::Mapping(a), Self::Mapping(b)) if a.len() == b.len() => a
				.iter()
				.zip(b)
				.map(|((ka, va), (kb, vb))| if ka == kb { va.most_specific_common(vb).map(|item| (ka.clone(), item)) } else { None })
				.collect::<Option<BTreeMap<_, _>>>()
				.map(Self::Mapping),
			(Self::Optional(a), Self::Optional(b)) => a.inner.most_specific_common(&b.inner).map(Self::optional),
			_ => None,
		}
	}

	/// Number of slots a conforming value flattens to.
	pub fn num_slots(&self) -> usize {
		match self {
			Self::Leaf(_) | Self::Optional(_) => 1,
			Self::Sequence(items) => items.iter().map(Self::num_slots).sum(),
			Self::Mapping(entries) => entries.values().map(Self::num_slots).sum(),
		}
	}

	/// Kind and shape of every slot, in flatten order.
	pub fn flat_slot_specs(&self) -> Vec<SlotSpec> {
		let mut out = Vec::with_capacity(self.num_slots());
		self.push_slot_specs(&mut out);
		out
	}

	fn push_slot_specs(&self, out: &mut Vec<SlotSpec>) {
		match self {
			Self::Leaf(leaf) => out.push(SlotSpec {
				kind: match leaf.layout {
					Layout::Dense => SlotKind::Dense(leaf.dtype),
					Layout::Sparse => SlotKind::Sparse(leaf.dtype),
				},
				shape: leaf.shape.clone(),
			}),
			Self::Sequence(items) => items.iter().for_each(|item| item.push_slot_specs(out)),
			Self::Mapping(entries) => entries.values().for_each(|item| item.push_slot_specs(out)),
			Self::Optional(_) => out.push(SlotSpec::variant()),
		}
	}

	/// Flatten a conforming value into slots, depth-first in key order.
	pub fn flatten(&self, value: &Value) -> Result<Vec<Slot>> {
		let mut out = Vec::with_capacity(self.num_slots());
		self.flatten_into(value, &mut out)?;
		Ok(out)
	}

	fn flatten_into(&self, value: &Value, out: &mut Vec<Slot>) -> Result<()> {
		match (self, value) {
			(Self::Leaf(leaf), Value::Tensor(tensor)) if leaf.layout == Layout::Dense && leaf.dtype == tensor.dtype() && leaf.shape.accepts(tensor.shape()) => {
				out.push(Slot::Dense(tensor.clone()));
			}
			(Self::Leaf(leaf), Value::Sparse(sparse))
				if leaf.layout == Layout::Sparse && leaf.dtype == sparse.dtype() && leaf.shape.accepts(&sparse.dense_extents()) =>
			{
				out.push(Slot::Sparse(sparse.clone()));
			}
			(Self::Sequence(items), Value::Sequence(values)) if items.len() == values.len() => {
				for (item, child) in items.iter().zip(values) {
					item.flatten_into(child, out)?;
				}
			}
			(Self::Mapping(entries), Value::Mapping(values)) if entries.len() == values.len() && entries.keys().eq(values.keys()) => {
				for (item, child) in entries.values().zip(values.values()) {
					item.flatten_into(child, out)?;
				}
			}
			(Self::Optional(optional), Value::Optional(child)) if optional.inner.is_compatible_with(child.element_spec()) => {
				out.push(Slot::Optional(child.slot().clone()));
			}
			_ => {
				return Err(NestError::ShapeMismatch {
					expected: self.to_string(),
					got: value.describe().to_string(),
				});
			}
		}
		Ok(())
	}

	/// Rebuild a value from slots produced by [`Descriptor::flatten`].
	pub fn unflatten(&self, slots: Vec<Slot>) -> Result<Value> {
		let expected = self.num_slots();
		if slots.len() != expected {
			return Err(NestError::SlotCountMismatch { expected, got: slots.len() });
		}
		let mut iter = slots.into_iter();
		self.unflatten_from(&mut iter)
	}

	fn unflatten_from(&self, slots: &mut impl Iterator<Item = Slot>) -> Result<Value> {
		match self {
			Self::Leaf(_) | Self::Optional(_) => {
				let slot = slots.next().ok_or(NestError::SlotCountMismatch {
					expected: self.num_slots(),
					got: 0,
				})?;
				self.unflatten_leaf(slot)
			}
			Self::Sequence(items) => items.iter().map(|item| item.unflatten_from(slots)).collect::<Result<Vec<_>>>().map(Value::Sequence),
			Self::Mapping(entries) => entries
				.iter()
				.map(|(key, item)| item.unflatten_from(slots).map(|value| (key.clone(), value)))
				.collect::<Result<BTreeMap<_, _>>>()
				.map(Value::Mapping),
		}
	}

	fn unflatten_leaf(&self, slot: Slot) -> Result<Value> {
		match (self, slot) {
			(Self::Leaf(leaf), Slot::Dense(tensor)) if leaf.layout == Layout::Dense && leaf.dtype == tensor.dtype() && leaf.shape.accepts(tensor.shape()) => {
				Ok(Value::Tensor(tensor))
			}
			(Self::Leaf(leaf), Slot::Sparse(sparse))
				if leaf.layout == Layout::Sparse && leaf.dtype == sparse.dtype() && leaf.shape.accepts(&sparse.dense_extents()) =>
			{
				Ok(Value::Sparse(sparse))
			}
			(Self::Optional(optional), Slot::Optional(cell)) => Ok(Value::Optional(OptionalValue::from_slot(cell, optional.inner.clone()))),
			(_, slot) => Err(NestError::ShapeMismatch {
				expected: self.to_string(),
				got: slot.spec().to_string(),
			}),
		}
	}
}

impl OptionalDescriptor {
	/// Optional of `inner`.
	pub fn new(inner: Descriptor) -> Self {
		Self { inner: Arc::new(inner) }
	}

	/// Optional sharing an existing inner descriptor.
	pub fn from_shared(inner: Arc<Descriptor>) -> Self {
		Self { inner }
	}

	/// Descriptor of the wrapped value.
	pub fn inner(&self) -> &Descriptor {
		&self.inner
	}

	/// Shared handle to the wrapped descriptor.
	pub fn shared_inner(&self) -> &Arc<Descriptor> {
		&self.inner
	}

	/// Encoded arity. Always one, whatever `inner` is.
	pub fn num_slots(&self) -> usize {
		1
	}

	/// Only optionals with a compatible inner descriptor are compatible.
	pub fn is_compatible_with(&self, other: &Descriptor) -> bool {
		match other {
			Descriptor::Optional(other) => self.inner.is_compatible_with(&other.inner),
			_ => false,
		}
	}

	/// Emit the optional's single internal slot.
	pub fn flatten(&self, value: &OptionalValue) -> Result<Vec<Slot>> {
		if !self.inner.is_compatible_with(value.element_spec()) {
			return Err(NestError::ShapeMismatch {
				expected: self.to_string(),
				got: value.descriptor().to_string(),
			});
		}
		Ok(vec![Slot::Optional(value.slot().clone())])
	}

	/// Wrap a single slot with this descriptor's inner.
	pub fn unflatten(&self, slots: Vec<Slot>) -> Result<OptionalValue> {
		let got = slots.len();
		let mut iter = slots.into_iter();
		match (iter.next(), iter.next()) {
			(Some(Slot::Optional(cell)), None) => Ok(OptionalValue::from_slot(cell, self.inner.clone())),
			(Some(slot), None) => Err(NestError::ShapeMismatch {
				expected: self.to_string(),
				got: slot.spec().to_string(),
			}),
			_ => Err(NestError::SlotCountMismatch { expected: 1, got }),
		}
	}
}

impl From<OptionalDescriptor> for Descriptor {
	fn from(value: OptionalDescriptor) -> Self {
		Self::Optional(value)
	}
}

impl fmt::Display for Descriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Leaf(leaf) => {
				if leaf.layout == Layout::Sparse {
					f.write_str("sparse ")?;
				}
				write!(f, "{}{}", leaf.dtype, leaf.shape)
			}
			Self::Sequence(items) => {
				f.write_str("(")?;
				for (idx, item) in items.iter().enumerate() {
					if idx > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{item}")?;
				}
				f.write_str(")")
			}
			Self::Mapping(entries) => {
				f.write_str("{")?;
				for (idx, (key, item)) in entries.iter().enumerate() {
					if idx > 0 {
						f.write_str(", ")?;
					}
					write_key(f, key)?;
					write!(f, ": {item}")?;
				}
				f.write_str("}")
			}
			Self::Optional(optional) => write!(f, "{optional}"),
		}
	}
}

impl fmt::Display for OptionalDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "optional({})", self.inner)
	}
}

fn write_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
	if parse::is_bare_key(key) {
		return f.write_str(key);
	}
	f.write_str("\"")?;
	for ch in key.chars() {
		if matches!(ch, '"' | '\\') {
			f.write_str("\\")?;
		}
		write!(f, "{ch}")?;
	}
	f.write_str("\"")
}
