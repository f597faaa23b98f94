use proptest::prelude::*;

use crate::nest::test_support::arb_value;
use crate::nest::{
	Compression, DType, Describe, Descriptor, ErrorKind, NestError, OptionalSlot, OptionalValue, Shape, Slot, Status, Tensor, Value, WIRE_MAGIC,
	WIRE_VERSION, WireOptions, decode_optional, decode_slots, encode_optional, encode_slots, transfer,
};

fn device_payload() -> OptionalValue {
	OptionalValue::from_value(Value::Sequence(vec![Value::from(37.0_f32), Value::from("Foo"), Value::from(42_i32)]))
}

#[test]
fn raw_frame_starts_with_magic_and_version() {
	let bytes = encode_optional(&device_payload(), &WireOptions::uncompressed()).expect("encode");
	assert_eq!(&bytes[..4], &WIRE_MAGIC);
	assert_eq!(bytes[4], WIRE_VERSION);
	assert_eq!(Compression::detect(&bytes), Compression::None);
}

#[test]
fn compressed_frame_round_trips() {
	let opt = WireOptions::always_compress();
	let value = device_payload();
	let bytes = encode_optional(&value, &opt).expect("encode");
	assert_eq!(Compression::detect(&bytes), Compression::Zstd);
	let decoded = decode_optional(&bytes, &value.optional_descriptor(), &opt).expect("decode");
	assert_eq!(decoded, value);
}

#[test]
fn default_options_leave_small_frames_raw() {
	let bytes = encode_optional(&device_payload(), &WireOptions::default()).expect("encode");
	assert_eq!(Compression::detect(&bytes), Compression::None);
}

#[test]
fn transfer_preserves_present_value() {
	let copied = transfer(&device_payload(), &WireOptions::default()).expect("transfer");
	let value = copied.get_value().expect("present");
	assert_eq!(value.get(0), Some(&Value::from(37.0_f32)));
	assert_eq!(value.get(1), Some(&Value::from("Foo")));
	assert_eq!(value.get(2), Some(&Value::from(42_i32)));
}

#[test]
fn transfer_preserves_absence_and_spec() {
	let empty = OptionalValue::empty(Descriptor::tensor(DType::F32, Shape::scalar()));
	let copied = transfer(&empty, &WireOptions::default()).expect("transfer");
	assert!(!copied.has_value());
	assert_eq!(copied.element_spec(), empty.element_spec());
	assert!(matches!(copied.get_value(), Err(NestError::NoValue)));
}

#[test]
fn transfer_preserves_nested_optionals() {
	let nested = OptionalValue::from_value(Value::Sequence(vec![
		Value::from(OptionalValue::from_value(1.0_f32)),
		Value::from(OptionalValue::empty(Descriptor::tensor(DType::I64, Shape::known(&[2])))),
	]));
	assert_eq!(transfer(&nested, &WireOptions::always_compress()).expect("transfer"), nested);
}

#[test]
fn truncated_frame_is_data_loss() {
	let bytes = encode_optional(&device_payload(), &WireOptions::uncompressed()).expect("encode");
	for cut in [0, 3, 5, 9, bytes.len() - 1] {
		let err = decode_slots(&bytes[..cut], &WireOptions::default()).expect_err("truncated frame");
		assert_eq!(err.kind(), ErrorKind::DataLoss, "cut at {cut}: {err}");
		assert_eq!(err.status(), Status::DataLoss);
	}
}

#[test]
fn bad_magic_is_rejected() {
	let mut bytes = encode_optional(&device_payload(), &WireOptions::uncompressed()).expect("encode");
	bytes[0] = b'X';
	assert!(matches!(decode_slots(&bytes, &WireOptions::default()), Err(NestError::UnknownMagic { .. })));
}

#[test]
fn unknown_version_is_rejected() {
	let mut bytes = encode_optional(&device_payload(), &WireOptions::uncompressed()).expect("encode");
	bytes[4] = WIRE_VERSION + 1;
	assert!(matches!(
		decode_slots(&bytes, &WireOptions::default()),
		Err(NestError::UnsupportedWireVersion { version }) if version == WIRE_VERSION + 1
	));
}

#[test]
fn trailing_bytes_are_rejected() {
	let mut bytes = encode_slots(&[Slot::Dense(Tensor::from(1_i32))], &WireOptions::uncompressed()).expect("encode");
	bytes.push(0);
	assert!(matches!(decode_slots(&bytes, &WireOptions::default()), Err(NestError::TrailingBytes { leftover: 1 })));
}

#[test]
fn bad_slot_tag_is_rejected() {
	let mut bytes = encode_slots(&[Slot::Optional(OptionalSlot::absent())], &WireOptions::uncompressed()).expect("encode");
	let last = bytes.len() - 1;
	bytes[last] = 9;
	assert!(matches!(decode_slots(&bytes, &WireOptions::default()), Err(NestError::BadWireTag { kind: "slot", tag: 9, .. })));
}

#[test]
fn nesting_beyond_depth_limit_is_rejected() {
	let mut slot = Slot::Optional(OptionalSlot::absent());
	for _ in 0..4 {
		slot = Slot::Optional(OptionalSlot::present(vec![slot]));
	}
	let bytes = encode_slots(&[slot], &WireOptions::uncompressed()).expect("encode");

	let shallow = WireOptions {
		max_depth: 2,
		..WireOptions::default()
	};
	assert!(matches!(decode_slots(&bytes, &shallow), Err(NestError::WireDepthExceeded { max_depth: 2 })));
	assert_eq!(decode_slots(&bytes, &WireOptions::default()).expect("within default depth").len(), 1);
}

fn nested_scalar(levels: usize) -> OptionalValue {
	let mut value = OptionalValue::from_value(1.5_f32);
	for _ in 1..levels {
		value = OptionalValue::from_value(value);
	}
	value
}

#[test]
fn encoder_and_decoder_share_depth_limit() {
	let opt = WireOptions::uncompressed();
	let limit = opt.max_depth as usize;

	let deepest = nested_scalar(limit);
	assert_eq!(transfer(&deepest, &opt).expect("limit depth round trips"), deepest);

	let err = transfer(&nested_scalar(limit + 1), &opt).expect_err("one level too deep");
	assert!(matches!(err, NestError::WireDepthExceeded { max_depth: 64 }));
	assert!(matches!(encode_optional(&nested_scalar(70), &opt), Err(NestError::WireDepthExceeded { .. })));
}

#[test]
fn corrupted_string_bytes_are_data_loss() {
	let opt = WireOptions::uncompressed();
	let mut bytes = encode_slots(&[Slot::Dense(Tensor::from("ab"))], &opt).expect("encode");
	let last = bytes.len() - 1;
	bytes[last] = 0xFF;

	let err = decode_slots(&bytes, &opt).expect_err("invalid utf-8");
	assert!(matches!(err, NestError::InvalidUtf8 { at } if at == last - 1));
	assert_eq!(err.status(), Status::DataLoss);

	let err = decode_slots(&bytes[..last], &opt).expect_err("truncated string");
	assert_eq!(err.kind(), ErrorKind::DataLoss);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn oversized_lengths_are_rejected() {
	let mut out = Vec::new();
	let len = u32::MAX as usize + 1;
	assert!(matches!(super::put_len(&mut out, len), Err(NestError::WireLengthOverflow { len: got }) if got == len));
	assert!(out.is_empty());
	super::put_len(&mut out, u32::MAX as usize).expect("largest length fits");
	assert_eq!(out, u32::MAX.to_le_bytes());
}

#[test]
fn decompression_limit_is_enforced() {
	let slots = [Slot::Dense(Tensor::zeros(DType::F64, vec![1024]).expect("small shape"))];
	let bytes = encode_slots(&slots, &WireOptions::always_compress()).expect("encode");
	let tight = WireOptions {
		max_decompressed_bytes: 128,
		..WireOptions::default()
	};
	assert!(matches!(decode_slots(&bytes, &tight), Err(NestError::DecompressedTooLarge { limit: 128 })));
}

#[test]
fn decode_checks_descriptor_slot_count() {
	let bytes = encode_slots(&[Slot::Dense(Tensor::from(1.0_f32)), Slot::Dense(Tensor::from(2.0_f32))], &WireOptions::uncompressed()).expect("encode");
	let err = decode_optional(&bytes, &device_payload().optional_descriptor(), &WireOptions::default()).expect_err("two slots for one optional");
	assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
}

proptest! {
	#[test]
	fn slots_survive_encoding(value in arb_value(), compress in any::<bool>()) {
		let opt = if compress { WireOptions::always_compress() } else { WireOptions::uncompressed() };
		let descriptor = value.describe();
		let slots = descriptor.flatten(&value).expect("flatten");
		let bytes = encode_slots(&slots, &opt).expect("encode");
		let decoded = decode_slots(&bytes, &opt).expect("decode");
		prop_assert_eq!(&decoded, &slots);
		prop_assert_eq!(descriptor.unflatten(decoded).expect("unflatten"), value);
	}

	#[test]
	fn transfer_is_identity(value in arb_value()) {
		let opt = OptionalValue::from_value(value);
		prop_assert_eq!(transfer(&opt, &WireOptions::default()).expect("transfer"), opt);
	}
}
