use std::path::PathBuf;

use nestopt::nest::{Compression, Descriptor, NestError, OptionalValue, Result, WireOptions, encode_optional};

use crate::cmd::util::{emit_json, read_literal};

#[derive(clap::Args)]
pub struct Args {
	/// JSON value literal to wrap.
	#[arg(required_unless_present = "empty")]
	pub file: Option<PathBuf>,
	/// Build an empty optional of this descriptor instead.
	#[arg(long, conflicts_with = "file")]
	pub empty: Option<String>,
	#[arg(long)]
	pub json: bool,
}

/// Wrap a literal (or nothing) and report the resulting optional.
pub fn run(args: Args) -> Result<()> {
	let optional = match (&args.file, &args.empty) {
		(_, Some(spec)) => OptionalValue::empty(Descriptor::parse(spec)?),
		(Some(path), None) => OptionalValue::from_value(read_literal(path)?),
		(None, None) => {
			return Err(NestError::InvalidValueLiteral {
				reason: "expected a value file or --empty <descriptor>".to_owned(),
			});
		}
	};

	let wire = encode_optional(&optional, &WireOptions::default())?;
	let descriptor = optional.descriptor();
	let slot_spec = descriptor.flat_slot_specs().first().map(ToString::to_string).unwrap_or_default();

	if args.json {
		return emit_json(&WrapJson {
			has_value: optional.has_value(),
			element_spec: optional.element_spec().to_string(),
			descriptor: descriptor.to_string(),
			num_slots: descriptor.num_slots(),
			slot_spec,
			wire_bytes: wire.len(),
			compression: Compression::detect(&wire).as_str(),
		});
	}

	println!("has_value: {}", optional.has_value());
	println!("element_spec: {}", optional.element_spec());
	println!("descriptor: {descriptor}");
	println!("slot: {slot_spec}");
	println!("wire_bytes: {}", wire.len());
	println!("compression: {}", Compression::detect(&wire).as_str());
	Ok(())
}

#[derive(serde::Serialize)]
struct WrapJson {
	has_value: bool,
	element_spec: String,
	descriptor: String,
	num_slots: usize,
	slot_spec: String,
	wire_bytes: usize,
	compression: &'static str,
}
