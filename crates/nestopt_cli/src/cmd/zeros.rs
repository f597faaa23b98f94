use std::path::PathBuf;

use nestopt::nest::{Result, zero_fill};

use crate::cmd::util::{print_optional, read_optional};

#[derive(clap::Args)]
pub struct Args {
	/// JSON value literal; a top-level optional literal is used as-is.
	pub file: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Zero-fill an optional, keeping absence and structure.
pub fn run(args: Args) -> Result<()> {
	let optional = read_optional(&args.file)?;
	print_optional(&zero_fill(&optional), args.json)
}
