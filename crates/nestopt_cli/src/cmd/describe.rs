use std::path::PathBuf;

use nestopt::nest::{Describe, Result};

use crate::cmd::util::{emit_json, read_literal};

#[derive(clap::Args)]
pub struct Args {
	/// JSON value literal.
	pub file: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print the inferred descriptor and its flat slot layout.
pub fn run(args: Args) -> Result<()> {
	let value = read_literal(&args.file)?;
	let descriptor = value.describe();
	let slot_specs: Vec<String> = descriptor.flat_slot_specs().iter().map(ToString::to_string).collect();

	if args.json {
		return emit_json(&DescribeJson {
			path: args.file.display().to_string(),
			kind: value.kind_label(),
			descriptor: descriptor.to_string(),
			num_slots: descriptor.num_slots(),
			slot_specs,
		});
	}

	println!("path: {}", args.file.display());
	println!("kind: {}", value.kind_label());
	println!("descriptor: {descriptor}");
	println!("slots: {}", descriptor.num_slots());
	for (index, spec) in slot_specs.iter().enumerate() {
		println!("  {index}\t{spec}");
	}
	Ok(())
}

#[derive(serde::Serialize)]
struct DescribeJson {
	path: String,
	kind: &'static str,
	descriptor: String,
	num_slots: usize,
	slot_specs: Vec<String>,
}
