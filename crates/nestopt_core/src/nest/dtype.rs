use std::fmt;

/// Element kind stored in a tensor leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DType {
	/// Boolean element.
	Bool,
	/// 32-bit signed integer.
	I32,
	/// 64-bit signed integer.
	I64,
	/// 32-bit float.
	F32,
	/// 64-bit float.
	F64,
	/// Variable-length UTF-8 string.
	String,
}

impl DType {
	/// All element kinds in wire-code order.
	pub const ALL: [DType; 6] = [Self::Bool, Self::I32, Self::I64, Self::F32, Self::F64, Self::String];

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Bool => "bool",
			Self::I32 => "int32",
			Self::I64 => "int64",
			Self::F32 => "float32",
			Self::F64 => "float64",
			Self::String => "string",
		}
	}

	/// Parse a label produced by [`DType::as_str`].
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|dtype| dtype.as_str() == name)
	}

	/// One-byte code used by the wire format.
	pub fn code(self) -> u8 {
		match self {
			Self::Bool => 1,
			Self::I32 => 2,
			Self::I64 => 3,
			Self::F32 => 4,
			Self::F64 => 5,
			Self::String => 6,
		}
	}

	/// Inverse of [`DType::code`].
	pub fn from_code(code: u8) -> Option<Self> {
		Self::ALL.into_iter().find(|dtype| dtype.code() == code)
	}

	/// Whether elements of this kind support addition.
	pub fn is_numeric(self) -> bool {
		matches!(self, Self::I32 | Self::I64 | Self::F32 | Self::F64)
	}
}

impl fmt::Display for DType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
