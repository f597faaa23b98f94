use nestopt::nest::{Descriptor, Result};

use crate::cmd::util::emit_json;

#[derive(clap::Args)]
pub struct Args {
	/// Left descriptor text, e.g. `(float32[], int32[?])`.
	pub left: String,
	/// Right descriptor text.
	pub right: String,
	#[arg(long)]
	pub json: bool,
}

/// Report whether two descriptors are compatible and their common generalization.
pub fn run(args: Args) -> Result<()> {
	let left = Descriptor::parse(&args.left)?;
	let right = Descriptor::parse(&args.right)?;
	let compatible = left.is_compatible_with(&right);
	let common = left.most_specific_common(&right);

	if args.json {
		return emit_json(&CheckJson {
			left: left.to_string(),
			right: right.to_string(),
			compatible,
			common: common.as_ref().map(ToString::to_string),
		});
	}

	println!("left: {left}");
	println!("right: {right}");
	println!("compatible: {compatible}");
	match common {
		Some(common) => println!("common: {common}"),
		None => println!("common: none"),
	}
	Ok(())
}

#[derive(serde::Serialize)]
struct CheckJson {
	left: String,
	right: String,
	compatible: bool,
	common: Option<String>,
}
