use std::path::PathBuf;

use nestopt::nest::{Result, pairwise_add};

use crate::cmd::util::{print_optional, read_optional};

#[derive(clap::Args)]
pub struct Args {
	/// Left operand literal.
	pub left: PathBuf,
	/// Right operand literal.
	pub right: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Add two optionals leafwise.
pub fn run(args: Args) -> Result<()> {
	let left = read_optional(&args.left)?;
	let right = read_optional(&args.right)?;
	print_optional(&pairwise_add(&left, &right)?, args.json)
}
