use std::io::Read;

use crate::nest::{NestError, Result};

/// zstd frame magic used by compressed wire frames.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Compression mode detected for an encoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// Raw frame.
	None,
	/// zstd-compressed frame.
	Zstd,
}

impl Compression {
	/// Render compression mode as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Zstd => "zstd",
		}
	}

	/// Detect the mode from leading bytes.
	pub fn detect(raw: &[u8]) -> Self {
		if raw.starts_with(&ZSTD_MAGIC) { Self::Zstd } else { Self::None }
	}
}

/// Compress a raw frame.
pub(crate) fn encode_zstd(raw: &[u8], level: i32) -> Result<Vec<u8>> {
	Ok(zstd::stream::encode_all(raw, level)?)
}

/// Decompress a zstd frame, refusing output above `limit` bytes.
pub(crate) fn decode_zstd(raw: &[u8], limit: usize) -> Result<Vec<u8>> {
	let mut decoder = zstd::stream::read::Decoder::new(raw)?;
	let mut out = Vec::new();
	let mut buf = [0_u8; 8192];

	loop {
		let read = decoder.read(&mut buf)?;
		if read == 0 {
			break;
		}

		if out.len() + read > limit {
			return Err(NestError::DecompressedTooLarge { limit });
		}

		out.extend_from_slice(&buf[..read]);
	}

	Ok(out)
}
