use std::path::PathBuf;

use nestopt::nest::{Compression, Result, WireOptions, decode_optional, encode_optional};
use tracing::debug;

use crate::cmd::util::{OptionalJson, emit_json, read_optional};

#[derive(clap::Args)]
pub struct Args {
	/// JSON value literal; a top-level optional literal is used as-is.
	pub file: PathBuf,
	/// Force zstd compression of the frame.
	#[arg(long)]
	pub compress: bool,
	#[arg(long)]
	pub json: bool,
}

/// Encode an optional, decode it against the same descriptor, and compare.
pub fn run(args: Args) -> Result<()> {
	let optional = read_optional(&args.file)?;
	let options = if args.compress { WireOptions::always_compress() } else { WireOptions::default() };

	let wire = encode_optional(&optional, &options)?;
	let compression = Compression::detect(&wire);
	debug!(bytes = wire.len(), compression = compression.as_str(), "encoded optional");
	let decoded = decode_optional(&wire, &optional.optional_descriptor(), &options)?;
	let identical = decoded == optional;

	if args.json {
		return emit_json(&RoundtripJson {
			wire_bytes: wire.len(),
			compression: compression.as_str(),
			identical,
			decoded: OptionalJson::new(&decoded)?,
		});
	}

	println!("wire_bytes: {}", wire.len());
	println!("compression: {}", compression.as_str());
	println!("identical: {identical}");
	println!("has_value: {}", decoded.has_value());
	println!("element_spec: {}", decoded.element_spec());
	Ok(())
}

#[derive(serde::Serialize)]
struct RoundtripJson {
	wire_bytes: usize,
	compression: &'static str,
	identical: bool,
	decoded: OptionalJson,
}
