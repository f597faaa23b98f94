use crate::nest::{DType, NestError, Result, Tensor, TensorData};

/// Sparse leaf stored as an `(indices, values, dense_shape)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseTensor {
	indices: Tensor,
	values: Tensor,
	dense_shape: Tensor,
}

impl SparseTensor {
	/// Build a sparse tensor from its components.
	///
	/// `indices` must be `int64[nnz, rank]`, `values` must be `[nnz]`, and
	/// `dense_shape` must be `int64[rank]` with every index inside it.
	pub fn new(indices: Tensor, values: Tensor, dense_shape: Tensor) -> Result<Self> {
		let TensorData::I64(shape_data) = dense_shape.data() else {
			return Err(invalid(format!("dense_shape must be int64, got {}", dense_shape.dtype())));
		};
		if dense_shape.shape().len() != 1 {
			return Err(invalid(format!("dense_shape must be rank 1, got rank {}", dense_shape.shape().len())));
		}
		if shape_data.iter().any(|extent| *extent < 0) {
			return Err(invalid("dense_shape has a negative extent".to_owned()));
		}
		let rank = shape_data.len();

		let TensorData::I64(index_data) = indices.data() else {
			return Err(invalid(format!("indices must be int64, got {}", indices.dtype())));
		};
		let [nnz, index_rank] = indices.shape() else {
			return Err(invalid(format!("indices must be rank 2, got rank {}", indices.shape().len())));
		};
		if *index_rank != rank {
			return Err(invalid(format!("indices rank {index_rank} disagrees with dense_shape rank {rank}")));
		}
		if values.shape() != [*nnz] {
			return Err(invalid(format!("values shape {:?} does not match {nnz} indices", values.shape())));
		}

		if rank > 0 {
			for row in index_data.chunks(rank) {
				for (index, extent) in row.iter().zip(shape_data) {
					if *index < 0 || index >= extent {
						return Err(invalid(format!("index {row:?} is out of bounds for dense_shape {shape_data:?}")));
					}
				}
			}
		}

		Ok(Self {
			indices,
			values,
			dense_shape,
		})
	}

	/// Build from row-major coordinates, values, and dense extents.
	pub fn from_parts(coords: Vec<Vec<i64>>, values: TensorData, dense_shape: Vec<i64>) -> Result<Self> {
		let rank = dense_shape.len();
		let nnz = coords.len();
		if let Some(row) = coords.iter().find(|row| row.len() != rank) {
			return Err(invalid(format!("index {row:?} does not have rank {rank}")));
		}
		let flat: Vec<i64> = coords.into_iter().flatten().collect();
		let indices = Tensor::new(vec![nnz, rank], TensorData::I64(flat))?;
		let values = Tensor::vector(values);
		let dense_shape = Tensor::vector(TensorData::I64(dense_shape));
		Self::new(indices, values, dense_shape)
	}

	/// Element kind of the stored values.
	pub fn dtype(&self) -> DType {
		self.values.dtype()
	}

	/// Coordinates of stored values, `int64[nnz, rank]`.
	pub fn indices(&self) -> &Tensor {
		&self.indices
	}

	/// Stored values, `[nnz]`.
	pub fn values(&self) -> &Tensor {
		&self.values
	}

	/// Dense extents, `int64[rank]`.
	pub fn dense_shape(&self) -> &Tensor {
		&self.dense_shape
	}

	/// Dense extents as concrete dims.
	pub fn dense_extents(&self) -> Vec<usize> {
		match self.dense_shape.data() {
			TensorData::I64(items) => items.iter().map(|extent| usize::try_from(*extent).unwrap_or(0)).collect(),
			_ => Vec::new(),
		}
	}

	/// Same sparsity pattern with zeroed values.
	pub fn zeros_like(&self) -> Self {
		Self {
			indices: self.indices.clone(),
			values: self.values.zeros_like(),
			dense_shape: self.dense_shape.clone(),
		}
	}

	/// Add values of two sparse tensors sharing one sparsity pattern.
	pub fn add(&self, other: &SparseTensor) -> Result<SparseTensor> {
		if self.indices != other.indices || self.dense_shape != other.dense_shape {
			return Err(NestError::IncompatibleOperands {
				left: format!("sparse {} with {} entries", self.dtype(), self.values.len()),
				right: format!("sparse {} with {} entries", other.dtype(), other.values.len()),
			});
		}
		Ok(Self {
			indices: self.indices.clone(),
			values: self.values.add(&other.values)?,
			dense_shape: self.dense_shape.clone(),
		})
	}
}

fn invalid(reason: String) -> NestError {
	NestError::InvalidSparse { reason }
}
