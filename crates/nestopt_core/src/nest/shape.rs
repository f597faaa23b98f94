use std::fmt;

/// One dimension of a descriptor shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
	/// Fixed extent.
	Known(usize),
	/// Extent not fixed by the descriptor.
	Unknown,
}

impl Dim {
	/// Whether two dims can describe the same concrete extent.
	pub fn is_compatible_with(self, other: Dim) -> bool {
		match (self, other) {
			(Self::Known(a), Self::Known(b)) => a == b,
			_ => true,
		}
	}

	/// Known extent, if any.
	pub fn value(self) -> Option<usize> {
		match self {
			Self::Known(value) => Some(value),
			Self::Unknown => None,
		}
	}
}

/// Possibly partially-known tensor shape.
///
/// `dims == None` means the rank itself is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
	dims: Option<Vec<Dim>>,
}

impl Shape {
	/// Scalar shape `[]`.
	pub fn scalar() -> Self {
		Self { dims: Some(Vec::new()) }
	}

	/// Shape whose rank is unknown.
	pub fn unknown_rank() -> Self {
		Self { dims: None }
	}

	/// Shape with the given dims.
	pub fn new(dims: Vec<Dim>) -> Self {
		Self { dims: Some(dims) }
	}

	/// Fully-known shape from concrete extents.
	pub fn known(extents: &[usize]) -> Self {
		Self::new(extents.iter().copied().map(Dim::Known).collect())
	}

	/// Dims when the rank is known.
	pub fn dims(&self) -> Option<&[Dim]> {
		self.dims.as_deref()
	}

	/// Rank when known.
	pub fn rank(&self) -> Option<usize> {
		self.dims.as_ref().map(Vec::len)
	}

	/// Concrete extents when every dim is known.
	pub fn as_known(&self) -> Option<Vec<usize>> {
		self.dims.as_ref()?.iter().map(|dim| dim.value()).collect()
	}

	/// Unknown rank or unknown dims match anything; otherwise ranks and known dims must agree.
	pub fn is_compatible_with(&self, other: &Shape) -> bool {
		match (&self.dims, &other.dims) {
			(Some(left), Some(right)) => left.len() == right.len() && left.iter().zip(right).all(|(a, b)| a.is_compatible_with(*b)),
			_ => true,
		}
	}

	/// Whether a concrete tensor shape satisfies this shape.
	pub fn accepts(&self, extents: &[usize]) -> bool {
		self.is_compatible_with(&Shape::known(extents))
	}

	/// Most specific shape compatible with both operands.
	pub fn most_specific_common(&self, other: &Shape) -> Shape {
		match (&self.dims, &other.dims) {
			(Some(left), Some(right)) if left.len() == right.len() => Shape::new(
				left.iter()
					.zip(right)
					.map(|(a, b)| if a == b { *a } else { Dim::Unknown })
					.collect(),
			),
			_ => Shape::unknown_rank(),
		}
	}
}

impl fmt::Display for Shape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let Some(dims) = &self.dims else {
			return f.write_str("[*]");
		};
		f.write_str("[")?;
		for (idx, dim) in dims.iter().enumerate() {
			if idx > 0 {
				f.write_str(",")?;
			}
			match dim {
				Dim::Known(value) => write!(f, "{value}")?,
				Dim::Unknown => f.write_str("?")?,
			}
		}
		f.write_str("]")
	}
}
