use std::collections::BTreeMap;

use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

use crate::nest::{DType, Describe, OptionalValue, SparseTensor, Tensor, TensorData, Value};

pub(crate) fn arb_dtype() -> impl Strategy<Value = DType> {
	prop::sample::select(DType::ALL.to_vec())
}

fn arb_data(dtype: DType, count: usize) -> BoxedStrategy<TensorData> {
	match dtype {
		DType::Bool => vec(any::<bool>(), count).prop_map(TensorData::Bool).boxed(),
		DType::I32 => vec(-1000_i32..1000, count).prop_map(TensorData::I32).boxed(),
		DType::I64 => vec(-1000_i64..1000, count).prop_map(TensorData::I64).boxed(),
		DType::F32 => vec(-1.0e3_f32..1.0e3, count).prop_map(TensorData::F32).boxed(),
		DType::F64 => vec(-1.0e3_f64..1.0e3, count).prop_map(TensorData::F64).boxed(),
		DType::String => vec("[a-z]{0,4}", count)
			.prop_map(|items| TensorData::String(items.into_iter().map(String::into_boxed_str).collect()))
			.boxed(),
	}
}

pub(crate) fn arb_tensor() -> impl Strategy<Value = Tensor> {
	(arb_dtype(), vec(0_usize..3, 0..3)).prop_flat_map(|(dtype, shape)| {
		let count = shape.iter().product::<usize>();
		arb_data(dtype, count).prop_map(move |data| Tensor::new(shape.clone(), data).expect("data fills shape"))
	})
}

pub(crate) fn arb_sparse() -> impl Strategy<Value = SparseTensor> {
	(arb_dtype(), 1_i64..4, 1_i64..4).prop_flat_map(|(dtype, rows, cols)| {
		let cells: Vec<Vec<i64>> = (0..rows).flat_map(|r| (0..cols).map(move |c| vec![r, c])).collect();
		let total = cells.len();
		prop::sample::subsequence(cells, 0..=total).prop_flat_map(move |coords| {
			arb_data(dtype, coords.len())
				.prop_map(move |values| SparseTensor::from_parts(coords.clone(), values, vec![rows, cols]).expect("coordinates are in bounds"))
		})
	})
}

/// Nested values up to a few levels deep, including present and absent optionals.
pub(crate) fn arb_value() -> impl Strategy<Value = Value> {
	let leaf = prop_oneof![4 => arb_tensor().prop_map(Value::Tensor), 1 => arb_sparse().prop_map(Value::Sparse)];
	leaf.prop_recursive(3, 24, 4, |inner| {
		prop_oneof![
			vec(inner.clone(), 0..4).prop_map(Value::Sequence),
			btree_map("[a-c]{1,2}", inner.clone(), 0..3).prop_map(|entries| {
				Value::Mapping(entries.into_iter().map(|(key, item)| (key.into_boxed_str(), item)).collect::<BTreeMap<_, _>>())
			}),
			inner.clone().prop_map(|item| Value::Optional(OptionalValue::from_value(item))),
			inner.prop_map(|item| Value::Optional(OptionalValue::empty(item.describe()))),
		]
	})
}

/// Numeric-only values (no strings, bools, or sparse leaves) for arithmetic laws.
pub(crate) fn arb_numeric_tensor() -> impl Strategy<Value = Tensor> {
	(prop::sample::select(vec![DType::I32, DType::I64, DType::F64]), vec(0_usize..3, 0..3)).prop_flat_map(|(dtype, shape)| {
		let count = shape.iter().product::<usize>();
		arb_data(dtype, count).prop_map(move |data| Tensor::new(shape.clone(), data).expect("data fills shape"))
	})
}

/// Two numeric tensors sharing a dtype and shape, so they can be added.
pub(crate) fn arb_numeric_pair() -> impl Strategy<Value = (Tensor, Tensor)> {
	(prop::sample::select(vec![DType::I32, DType::I64, DType::F32, DType::F64]), vec(0_usize..3, 0..3)).prop_flat_map(|(dtype, shape)| {
		let count = shape.iter().product::<usize>();
		let left = shape.clone();
		(arb_data(dtype, count), arb_data(dtype, count)).prop_map(move |(a, b)| {
			(Tensor::new(left.clone(), a).expect("data fills shape"), Tensor::new(left.clone(), b).expect("data fills shape"))
		})
	})
}
