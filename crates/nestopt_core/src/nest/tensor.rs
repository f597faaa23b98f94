use crate::nest::{DType, NestError, Result};

/// Flat row-major element storage, one variant per element kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
	/// Boolean elements.
	Bool(Vec<bool>),
	/// 32-bit signed integers.
	I32(Vec<i32>),
	/// 64-bit signed integers.
	I64(Vec<i64>),
	/// 32-bit floats.
	F32(Vec<f32>),
	/// 64-bit floats.
	F64(Vec<f64>),
	/// UTF-8 strings.
	String(Vec<Box<str>>),
}

impl TensorData {
	/// Element kind of this storage.
	pub fn dtype(&self) -> DType {
		match self {
			Self::Bool(_) => DType::Bool,
			Self::I32(_) => DType::I32,
			Self::I64(_) => DType::I64,
			Self::F32(_) => DType::F32,
			Self::F64(_) => DType::F64,
			Self::String(_) => DType::String,
		}
	}

	/// Number of stored elements.
	pub fn len(&self) -> usize {
		match self {
			Self::Bool(items) => items.len(),
			Self::I32(items) => items.len(),
			Self::I64(items) => items.len(),
			Self::F32(items) => items.len(),
			Self::F64(items) => items.len(),
			Self::String(items) => items.len(),
		}
	}

	/// Whether no elements are stored.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// `count` copies of the additive identity for `dtype`.
	pub fn zeros(dtype: DType, count: usize) -> Self {
		match dtype {
			DType::Bool => Self::Bool(vec![false; count]),
			DType::I32 => Self::I32(vec![0; count]),
			DType::I64 => Self::I64(vec![0; count]),
			DType::F32 => Self::F32(vec![0.0; count]),
			DType::F64 => Self::F64(vec![0.0; count]),
			DType::String => Self::String(vec![Box::from(""); count]),
		}
	}

	fn add(&self, other: &TensorData) -> Result<TensorData> {
		match (self, other) {
			(Self::I32(a), Self::I32(b)) => Ok(Self::I32(a.iter().zip(b).map(|(x, y)| x.wrapping_add(*y)).collect())),
			(Self::I64(a), Self::I64(b)) => Ok(Self::I64(a.iter().zip(b).map(|(x, y)| x.wrapping_add(*y)).collect())),
			(Self::F32(a), Self::F32(b)) => Ok(Self::F32(a.iter().zip(b).map(|(x, y)| x + y).collect())),
			(Self::F64(a), Self::F64(b)) => Ok(Self::F64(a.iter().zip(b).map(|(x, y)| x + y).collect())),
			(left, right) if left.dtype() != right.dtype() => Err(NestError::IncompatibleOperands {
				left: left.dtype().to_string(),
				right: right.dtype().to_string(),
			}),
			(left, _) => Err(NestError::UnsupportedDType {
				op: "add",
				dtype: left.dtype(),
			}),
		}
	}
}

/// Dense tensor leaf with a fully known shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
	shape: Vec<usize>,
	data: TensorData,
}

impl Tensor {
	/// Build a tensor, checking that `data` fills `shape` exactly.
	pub fn new(shape: Vec<usize>, data: TensorData) -> Result<Self> {
		let expected = element_count(&shape)?;
		if expected != data.len() {
			return Err(NestError::TensorSizeMismatch {
				shape,
				expected,
				got: data.len(),
			});
		}
		Ok(Self { shape, data })
	}

	/// One-dimensional tensor over `data`.
	pub fn vector(data: TensorData) -> Self {
		Self {
			shape: vec![data.len()],
			data,
		}
	}

	/// All-zero tensor of the given kind and shape.
	pub fn zeros(dtype: DType, shape: Vec<usize>) -> Result<Self> {
		let count = element_count(&shape)?;
		Ok(Self {
			shape,
			data: TensorData::zeros(dtype, count),
		})
	}

	/// Element kind.
	pub fn dtype(&self) -> DType {
		self.data.dtype()
	}

	/// Concrete extents.
	pub fn shape(&self) -> &[usize] {
		&self.shape
	}

	/// Element storage.
	pub fn data(&self) -> &TensorData {
		&self.data
	}

	/// Number of elements.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Whether the tensor has zero elements.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Same kind and shape with every element at its additive identity.
	pub fn zeros_like(&self) -> Self {
		Self {
			shape: self.shape.clone(),
			data: TensorData::zeros(self.dtype(), self.len()),
		}
	}

	/// Elementwise sum. Shapes and kinds must match exactly.
	pub fn add(&self, other: &Tensor) -> Result<Tensor> {
		if self.shape != other.shape || self.dtype() != other.dtype() {
			return Err(NestError::IncompatibleOperands {
				left: self.signature(),
				right: other.signature(),
			});
		}
		Ok(Self {
			shape: self.shape.clone(),
			data: self.data.add(&other.data)?,
		})
	}

	/// Scalar payload widened to `f64`, for numeric scalar tensors.
	pub fn scalar_f64(&self) -> Option<f64> {
		if !self.shape.is_empty() {
			return None;
		}
		match &self.data {
			TensorData::I32(items) => items.first().map(|v| f64::from(*v)),
			TensorData::I64(items) => items.first().map(|v| *v as f64),
			TensorData::F32(items) => items.first().map(|v| f64::from(*v)),
			TensorData::F64(items) => items.first().copied(),
			TensorData::Bool(_) | TensorData::String(_) => None,
		}
	}

	pub(crate) fn signature(&self) -> String {
		let dims: Vec<String> = self.shape.iter().map(usize::to_string).collect();
		format!("{}[{}]", self.dtype(), dims.join(","))
	}
}

/// Element count of `shape`, failing instead of wrapping on overflow.
fn element_count(shape: &[usize]) -> Result<usize> {
	shape
		.iter()
		.try_fold(1_usize, |count, dim| count.checked_mul(*dim))
		.ok_or_else(|| NestError::ShapeOverflow { shape: shape.to_vec() })
}

macro_rules! scalar_from {
	($ty:ty, $variant:ident) => {
		impl From<$ty> for Tensor {
			fn from(value: $ty) -> Self {
				Self {
					shape: Vec::new(),
					data: TensorData::$variant(vec![value]),
				}
			}
		}

		impl From<Vec<$ty>> for Tensor {
			fn from(values: Vec<$ty>) -> Self {
				Self::vector(TensorData::$variant(values))
			}
		}
	};
}

scalar_from!(bool, Bool);
scalar_from!(i32, I32);
scalar_from!(i64, I64);
scalar_from!(f32, F32);
scalar_from!(f64, F64);

impl From<&str> for Tensor {
	fn from(value: &str) -> Self {
		Self {
			shape: Vec::new(),
			data: TensorData::String(vec![Box::from(value)]),
		}
	}
}

impl From<Vec<&str>> for Tensor {
	fn from(values: Vec<&str>) -> Self {
		Self::vector(TensorData::String(values.into_iter().map(Box::from).collect()))
	}
}
