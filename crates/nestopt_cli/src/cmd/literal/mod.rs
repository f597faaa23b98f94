//! JSON value literals.
//!
//! Plain JSON maps onto scalars, sequences, and mappings: integers become
//! `int32` scalars, other numbers `float32` scalars. Leaves of any other
//! kind or rank use tagged objects:
//!
//! ```text
//! {"tensor": {"dtype": "int64", "shape": [2], "data": [1, 2]}}
//! {"sparse": {"dtype": "float32", "indices": [[0, 1]], "values": [1.5], "dense_shape": [2, 2]}}
//! {"optional": <literal> | null, "spec": "<descriptor>"}
//! ```

use std::collections::BTreeMap;

use nestopt::nest::{DType, Describe, Descriptor, NestError, OptionalValue, Result, SparseTensor, Tensor, TensorData, Value};
use serde::Deserialize;
use serde_json::{Map, Number, Value as Json, json};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TensorLiteral {
	dtype: String,
	#[serde(default)]
	shape: Option<Vec<usize>>,
	data: Vec<Json>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SparseLiteral {
	dtype: String,
	indices: Vec<Vec<i64>>,
	values: Vec<Json>,
	dense_shape: Vec<i64>,
}

/// Convert a JSON literal into a structured value.
pub fn parse_value(json: &Json) -> Result<Value> {
	match json {
		Json::Null => Err(invalid("null is only allowed as an \"optional\" payload")),
		Json::Bool(flag) => Ok(Value::from(*flag)),
		Json::Number(number) => parse_number(number),
		Json::String(text) => Ok(Value::from(text.as_str())),
		Json::Array(items) => items.iter().map(parse_value).collect::<Result<Vec<_>>>().map(Value::Sequence),
		Json::Object(fields) => parse_object(fields),
	}
}

fn parse_number(number: &Number) -> Result<Value> {
	if let Some(int) = number.as_i64() {
		return i32::try_from(int)
			.map(Value::from)
			.map_err(|_| invalid(format!("integer {int} does not fit int32; use a tagged int64 tensor")));
	}
	if number.is_u64() {
		return Err(invalid(format!("integer {number} does not fit int32; use a tagged int64 tensor")));
	}
	number.as_f64().map(|float| Value::from(float as f32)).ok_or_else(|| invalid(format!("unsupported number {number}")))
}

fn parse_object(fields: &Map<String, Json>) -> Result<Value> {
	if fields.contains_key("optional") {
		return parse_optional(fields).map(Value::Optional);
	}
	if fields.len() == 1 {
		if let Some(body) = fields.get("tensor") {
			return parse_tensor(body).map(Value::Tensor);
		}
		if let Some(body) = fields.get("sparse") {
			return parse_sparse(body).map(Value::Sparse);
		}
	}

	let mut entries = BTreeMap::new();
	for (key, item) in fields {
		entries.insert(key.as_str().into(), parse_value(item)?);
	}
	Ok(Value::Mapping(entries))
}

fn parse_optional(fields: &Map<String, Json>) -> Result<OptionalValue> {
	if let Some(extra) = fields.keys().find(|key| *key != "optional" && *key != "spec") {
		return Err(invalid(format!("unexpected field {extra:?} in optional literal")));
	}
	let spec = match fields.get("spec") {
		None => None,
		Some(Json::String(text)) => Some(Descriptor::parse(text)?),
		Some(other) => return Err(invalid(format!("\"spec\" must be a descriptor string, got {other}"))),
	};

	match (fields.get("optional"), spec) {
		(Some(Json::Null) | None, Some(spec)) => Ok(OptionalValue::empty(spec)),
		(Some(Json::Null) | None, None) => Err(invalid("an empty optional needs a \"spec\"")),
		(Some(payload), None) => Ok(OptionalValue::from_value(parse_value(payload)?)),
		(Some(payload), Some(spec)) => {
			let value = parse_value(payload)?;
			let got = value.describe();
			if !spec.is_compatible_with(&got) {
				return Err(NestError::ShapeMismatch {
					expected: spec.to_string(),
					got: got.to_string(),
				});
			}
			Ok(OptionalValue::from_slot(OptionalValue::from_value(value).into_slot(), spec))
		}
	}
}

fn parse_tensor(body: &Json) -> Result<Tensor> {
	let literal = TensorLiteral::deserialize(body).map_err(|err| invalid(format!("tensor literal: {err}")))?;
	let dtype = parse_dtype(&literal.dtype)?;
	let data = parse_data(dtype, &literal.data)?;
	match literal.shape {
		Some(shape) => Tensor::new(shape, data),
		None => Ok(Tensor::vector(data)),
	}
}

fn parse_sparse(body: &Json) -> Result<SparseTensor> {
	let literal = SparseLiteral::deserialize(body).map_err(|err| invalid(format!("sparse literal: {err}")))?;
	let dtype = parse_dtype(&literal.dtype)?;
	let values = parse_data(dtype, &literal.values)?;
	SparseTensor::from_parts(literal.indices, values, literal.dense_shape)
}

fn parse_dtype(name: &str) -> Result<DType> {
	DType::from_name(name).ok_or_else(|| invalid(format!("unknown dtype {name:?}")))
}

fn parse_data(dtype: DType, items: &[Json]) -> Result<TensorData> {
	let bad = |item: &Json| invalid(format!("{item} is not a valid {dtype} element"));
	Ok(match dtype {
		DType::Bool => TensorData::Bool(items.iter().map(|item| item.as_bool().ok_or_else(|| bad(item))).collect::<Result<_>>()?),
		DType::I32 => TensorData::I32(
			items
				.iter()
				.map(|item| item.as_i64().and_then(|int| i32::try_from(int).ok()).ok_or_else(|| bad(item)))
				.collect::<Result<_>>()?,
		),
		DType::I64 => TensorData::I64(items.iter().map(|item| item.as_i64().ok_or_else(|| bad(item))).collect::<Result<_>>()?),
		DType::F32 => TensorData::F32(
			items
				.iter()
				.map(|item| item.as_f64().map(|float| float as f32).ok_or_else(|| bad(item)))
				.collect::<Result<_>>()?,
		),
		DType::F64 => TensorData::F64(items.iter().map(|item| item.as_f64().ok_or_else(|| bad(item))).collect::<Result<_>>()?),
		DType::String => TensorData::String(
			items
				.iter()
				.map(|item| item.as_str().map(Box::from).ok_or_else(|| bad(item)))
				.collect::<Result<_>>()?,
		),
	})
}

/// Render a structured value in the literal format accepted by [`parse_value`].
///
/// Present optionals are decoded, so a payload that does not match its
/// descriptor surfaces here as an error.
pub fn render_value(value: &Value) -> Result<Json> {
	Ok(match value {
		Value::Tensor(tensor) => render_tensor(tensor),
		Value::Sparse(sparse) => json!({
			"sparse": {
				"dtype": sparse.dtype().as_str(),
				"indices": index_rows(sparse),
				"values": render_data(sparse.values().data()),
				"dense_shape": render_data(sparse.dense_shape().data()),
			}
		}),
		Value::Sequence(items) => Json::Array(items.iter().map(render_value).collect::<Result<_>>()?),
		Value::Mapping(entries) => {
			let mut fields = Map::new();
			for (key, item) in entries {
				fields.insert(key.to_string(), render_value(item)?);
			}
			Json::Object(fields)
		}
		Value::Optional(optional) => render_optional(optional)?,
	})
}

/// Render an optional as a tagged `{"optional", "spec"}` object.
pub fn render_optional(optional: &OptionalValue) -> Result<Json> {
	let payload = if optional.has_value() { render_value(&optional.get_value()?)? } else { Json::Null };
	Ok(json!({
		"optional": payload,
		"spec": optional.element_spec().to_string(),
	}))
}

fn render_tensor(tensor: &Tensor) -> Json {
	if tensor.shape().is_empty() {
		let bare = match tensor.data() {
			TensorData::Bool(items) => items.first().map(|item| json!(item)),
			TensorData::I32(items) => items.first().map(|item| json!(item)),
			TensorData::F32(items) => items.first().filter(|item| item.is_finite()).map(|item| json!(item)),
			TensorData::String(items) => items.first().map(|item| json!(item)),
			TensorData::I64(_) | TensorData::F64(_) => None,
		};
		if let Some(bare) = bare {
			return bare;
		}
	}
	json!({
		"tensor": {
			"dtype": tensor.dtype().as_str(),
			"shape": tensor.shape(),
			"data": render_data(tensor.data()),
		}
	})
}

fn render_data(data: &TensorData) -> Json {
	match data {
		TensorData::Bool(items) => json!(items),
		TensorData::I32(items) => json!(items),
		TensorData::I64(items) => json!(items),
		TensorData::F32(items) => json!(items),
		TensorData::F64(items) => json!(items),
		TensorData::String(items) => json!(items),
	}
}

fn index_rows(sparse: &SparseTensor) -> Json {
	let TensorData::I64(flat) = sparse.indices().data() else {
		return Json::Array(Vec::new());
	};
	let rank = sparse.indices().shape().get(1).copied().unwrap_or(0);
	if rank == 0 {
		return Json::Array(vec![json!([]); sparse.values().len()]);
	}
	Json::Array(flat.chunks(rank).map(|row| json!(row)).collect())
}

fn invalid(reason: impl Into<String>) -> NestError {
	NestError::InvalidValueLiteral { reason: reason.into() }
}
