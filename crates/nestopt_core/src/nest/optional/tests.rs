use proptest::prelude::*;

use crate::nest::test_support::{arb_sparse, arb_value};
use crate::nest::{
	DType, Describe, Descriptor, ErrorKind, NestError, OptionalDescriptor, OptionalValue, Shape, SparseTensor, Status, Tensor, TensorData, Value,
};

fn scalar_f32() -> Descriptor {
	Descriptor::tensor(DType::F32, Shape::scalar())
}

#[test]
fn from_value_holds_scalar() {
	let opt = OptionalValue::from_value(37.0_f32);
	assert!(opt.has_value());
	assert_eq!(opt.get_value().expect("value present"), Value::from(37.0_f32));
}

#[test]
fn from_structured_value_round_trips() {
	let value = Value::mapping([
		("a", Value::from(37.0_f32)),
		("b", Value::Sequence(vec![Value::from(vec!["Foo"]), Value::from("Bar")])),
	]);
	let opt = OptionalValue::from_value(value.clone());
	assert!(opt.has_value());
	assert_eq!(opt.get_value().expect("value present"), value);
}

#[test]
fn from_sparse_pair_round_trips() {
	let st0 = SparseTensor::from_parts(vec![vec![0]], TensorData::I64(vec![0]), vec![1]).expect("valid sparse");
	let st1 = SparseTensor::from_parts(vec![vec![0, 0], vec![1, 1]], TensorData::F32(vec![-1.0, 1.0]), vec![2, 2]).expect("valid sparse");
	let opt = OptionalValue::from_value(Value::tuple([st0.clone(), st1.clone()]));
	let value = opt.get_value().expect("value present");
	assert_eq!(value.get(0), Some(&Value::Sparse(st0)));
	assert_eq!(value.get(1), Some(&Value::Sparse(st1)));
}

#[test]
fn empty_has_no_value() {
	let opt = OptionalValue::empty(scalar_f32());
	assert!(opt.element_spec().is_compatible_with(&scalar_f32()));
	assert!(!opt.element_spec().is_compatible_with(&Descriptor::tensor(DType::F32, Shape::known(&[1]))));
	assert!(!opt.element_spec().is_compatible_with(&Descriptor::tensor(DType::I32, Shape::scalar())));
	assert!(!opt.has_value());

	let err = opt.get_value().expect_err("absent optional");
	assert!(matches!(err, NestError::NoValue));
	assert_eq!(err.kind(), ErrorKind::NoValue);
	assert_eq!(err.status(), Status::InvalidArgument);
}

#[test]
fn descriptor_of_optional_is_optional_spec() {
	let opt = OptionalValue::from_value(37.0_f32);
	let descriptor = Descriptor::from_value(&opt);
	assert!(descriptor.as_optional().is_some());
	assert!(descriptor.is_compatible_with(&descriptor));
	assert!(opt.element_spec().is_compatible_with(&scalar_f32()));
	assert!(!descriptor.is_compatible_with(&Descriptor::from_value(&Tensor::from(42.0_f32))));
}

#[test]
fn nested_optional_decodes_inner_optional() {
	let inner = OptionalValue::from_value(vec![1.0_f32, 2.0]);
	let outer = OptionalValue::from_value(Value::Sequence(vec![Value::from(5.0_f32), Value::from(inner.clone())]));

	let value = outer.get_value().expect("outer present");
	assert_eq!(value.get(0), Some(&Value::from(5.0_f32)));
	let decoded = value.get(1).and_then(Value::as_optional).expect("second element is an optional");
	assert_eq!(decoded, &inner);
	assert_eq!(decoded.get_value().expect("inner present"), Value::from(vec![1.0_f32, 2.0]));
}

#[test]
fn optional_descriptor_round_trips_nested_optional() {
	let inner = OptionalValue::from_value(37.0_f32);
	let outer = OptionalValue::from_value(inner.clone());
	let desc = outer.optional_descriptor();

	let slots = desc.flatten(&outer).expect("flatten succeeds");
	assert_eq!(slots.len(), 1);
	let round_trip = desc.unflatten(slots).expect("unflatten succeeds");
	assert_eq!(round_trip, outer);

	let middle = round_trip.get_value().expect("outer present");
	let middle = middle.as_optional().expect("payload is an optional");
	assert_eq!(middle.get_value().expect("inner present"), Value::from(37.0_f32));
}

#[test]
fn optional_descriptor_rejects_incompatible_value() {
	let desc = OptionalDescriptor::new(scalar_f32());
	let err = desc.flatten(&OptionalValue::from_value(1_i32)).expect_err("int32 payload for float32 spec");
	assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
}

#[test]
fn slot_from_boundary_is_reattached_without_copy() {
	let opt = OptionalValue::from_value(Value::tuple([37.0_f32, 42.0]));
	let received = OptionalValue::from_slot(opt.slot().clone(), opt.element_spec().clone());
	assert!(received.slot().shares_payload_with(opt.slot()));
	assert_eq!(received.get_value().expect("present"), opt.get_value().expect("present"));
}

#[test]
fn mismatched_payload_fails_with_shape_mismatch() {
	let opt = OptionalValue::from_value(Value::tuple([1.0_f32, 2.0]));
	let wrong = OptionalValue::from_slot(opt.slot().clone(), scalar_f32());
	assert!(wrong.has_value());
	let err = wrong.get_value().expect_err("two slots for a scalar spec");
	assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
}

proptest! {
	#[test]
	fn from_value_then_get_value_is_identity(value in arb_value()) {
		let opt = OptionalValue::from_value(value.clone());
		prop_assert!(opt.has_value());
		prop_assert_eq!(opt.element_spec(), &value.describe());
		prop_assert_eq!(opt.get_value().expect("present"), value);
	}

	#[test]
	fn empty_never_has_value(value in arb_value()) {
		let opt = OptionalValue::empty(value.describe());
		prop_assert!(!opt.has_value());
		prop_assert_eq!(opt.get_value().map_err(|err| err.kind()), Err(ErrorKind::NoValue));
	}

	#[test]
	fn optional_descriptor_round_trip_law(value in arb_value(), present in any::<bool>()) {
		let opt = if present { OptionalValue::from_value(value.clone()) } else { OptionalValue::empty(value.describe()) };
		let desc = opt.optional_descriptor();
		let round_trip = desc.unflatten(desc.flatten(&opt).expect("flatten")).expect("unflatten");
		prop_assert_eq!(round_trip.has_value(), opt.has_value());
		prop_assert_eq!(&round_trip, &opt);
	}

	#[test]
	fn sparse_values_survive_wrapping(sparse in arb_sparse()) {
		let opt = OptionalValue::from_value(sparse.clone());
		prop_assert_eq!(opt.get_value().expect("present"), Value::Sparse(sparse));
	}
}
