//! Byte encoding of slots for crossing function and device boundaries.
//!
//! Frame layout (little-endian):
//!
//! ```text
//! "NOPT" | version:u8 | count:u32 | slot*
//! slot   = 1 dense | 2 sparse | 3 (absent optional) | 4 count:u32 slot*
//! dense  = dtype:u8 rank:u32 dim:u64* data
//! sparse = dense(indices) dense(values) dense(dense_shape)
//! ```
//!
//! Strings are stored as `len:u32` followed by UTF-8 bytes. Frames whose
//! body exceeds [`WireOptions::compress_threshold`] are zstd-compressed.

use tracing::debug;

use crate::nest::bytes::Cursor;
use crate::nest::compression::{decode_zstd, encode_zstd};
use crate::nest::{
	Compression, DType, NestError, OptionalDescriptor, OptionalSlot, OptionalValue, Result, Slot, SparseTensor, Tensor, TensorData,
};

/// Leading magic of a raw frame.
pub const WIRE_MAGIC: [u8; 4] = *b"NOPT";
/// Frame version written by this encoder.
pub const WIRE_VERSION: u8 = 1;

const TAG_DENSE: u8 = 1;
const TAG_SPARSE: u8 = 2;
const TAG_ABSENT: u8 = 3;
const TAG_PRESENT: u8 = 4;

/// Encoding limits and compression switches.
#[derive(Debug, Clone)]
pub struct WireOptions {
	/// Compress frames larger than this many bytes; `None` never compresses.
	pub compress_threshold: Option<usize>,
	/// zstd compression level.
	pub compression_level: i32,
	/// Maximum decompressed frame size accepted by the decoder.
	pub max_decompressed_bytes: usize,
	/// Maximum optional nesting depth written by the encoder and accepted by the decoder.
	pub max_depth: u32,
}

impl Default for WireOptions {
	fn default() -> Self {
		Self {
			compress_threshold: Some(64 * 1024),
			compression_level: 3,
			max_decompressed_bytes: 256 * 1024 * 1024,
			max_depth: 64,
		}
	}
}

impl WireOptions {
	/// Never compress.
	pub fn uncompressed() -> Self {
		Self {
			compress_threshold: None,
			..Self::default()
		}
	}

	/// Compress every frame.
	pub fn always_compress() -> Self {
		Self {
			compress_threshold: Some(0),
			..Self::default()
		}
	}
}

/// Encode slots into one frame.
///
/// Optional nesting deeper than [`WireOptions::max_depth`] is rejected here,
/// so every frame this returns decodes under the same options.
pub fn encode_slots(slots: &[Slot], opt: &WireOptions) -> Result<Vec<u8>> {
	let mut out = Vec::new();
	out.extend_from_slice(&WIRE_MAGIC);
	out.push(WIRE_VERSION);
	put_len(&mut out, slots.len())?;
	for slot in slots {
		put_slot(&mut out, slot, opt, 0)?;
	}

	match opt.compress_threshold {
		Some(threshold) if out.len() > threshold => {
			let compressed = encode_zstd(&out, opt.compression_level)?;
			debug!(raw = out.len(), compressed = compressed.len(), "compressed wire frame");
			Ok(compressed)
		}
		_ => Ok(out),
	}
}

/// Decode a frame produced by [`encode_slots`].
pub fn decode_slots(bytes: &[u8], opt: &WireOptions) -> Result<Vec<Slot>> {
	match Compression::detect(bytes) {
		Compression::Zstd => {
			let raw = decode_zstd(bytes, opt.max_decompressed_bytes)?;
			debug!(compressed = bytes.len(), raw = raw.len(), "decompressed wire frame");
			decode_raw(&raw, opt)
		}
		Compression::None => decode_raw(bytes, opt),
	}
}

/// Encode an optional as a one-slot frame.
pub fn encode_optional(value: &OptionalValue, opt: &WireOptions) -> Result<Vec<u8>> {
	encode_slots(&value.optional_descriptor().flatten(value)?, opt)
}

/// Decode a one-slot frame and attach `descriptor`.
pub fn decode_optional(bytes: &[u8], descriptor: &OptionalDescriptor, opt: &WireOptions) -> Result<OptionalValue> {
	descriptor.unflatten(decode_slots(bytes, opt)?)
}

/// Copy an optional across a byte boundary.
///
/// Only the single slot is encoded; the receiver re-attaches the same
/// descriptor without inspecting the payload.
pub fn transfer(value: &OptionalValue, opt: &WireOptions) -> Result<OptionalValue> {
	let bytes = encode_optional(value, opt)?;
	decode_optional(&bytes, &value.optional_descriptor(), opt)
}

fn decode_raw(bytes: &[u8], opt: &WireOptions) -> Result<Vec<Slot>> {
	let mut cursor = Cursor::new(bytes);
	let magic = cursor.read_code4().map_err(|_| NestError::UnknownMagic { magic: first4(bytes) })?;
	if magic != WIRE_MAGIC {
		return Err(NestError::UnknownMagic { magic });
	}
	let version = cursor.read_u8()?;
	if version != WIRE_VERSION {
		return Err(NestError::UnsupportedWireVersion { version });
	}

	let slots = read_slots(&mut cursor, opt, 0)?;
	if cursor.remaining() > 0 {
		return Err(NestError::TrailingBytes { leftover: cursor.remaining() });
	}
	Ok(slots)
}

fn read_slots(cursor: &mut Cursor<'_>, opt: &WireOptions, depth: u32) -> Result<Vec<Slot>> {
	if depth > opt.max_depth {
		return Err(NestError::WireDepthExceeded { max_depth: opt.max_depth });
	}
	let count = cursor.read_len()?;
	// Every slot needs at least its tag byte.
	ensure_available(cursor, count)?;
	let mut slots = Vec::with_capacity(count);
	for _ in 0..count {
		slots.push(read_slot(cursor, opt, depth)?);
	}
	Ok(slots)
}

fn read_slot(cursor: &mut Cursor<'_>, opt: &WireOptions, depth: u32) -> Result<Slot> {
	let at = cursor.pos();
	match cursor.read_u8()? {
		TAG_DENSE => Ok(Slot::Dense(read_tensor(cursor)?)),
		TAG_SPARSE => {
			let indices = read_tensor(cursor)?;
			let values = read_tensor(cursor)?;
			let dense_shape = read_tensor(cursor)?;
			Ok(Slot::Sparse(SparseTensor::new(indices, values, dense_shape)?))
		}
		TAG_ABSENT => Ok(Slot::Optional(OptionalSlot::absent())),
		TAG_PRESENT => Ok(Slot::Optional(OptionalSlot::present(read_slots(cursor, opt, depth + 1)?))),
		tag => Err(NestError::BadWireTag { kind: "slot", tag, at }),
	}
}

fn read_tensor(cursor: &mut Cursor<'_>) -> Result<Tensor> {
	let at = cursor.pos();
	let tag = cursor.read_u8()?;
	let dtype = DType::from_code(tag).ok_or(NestError::BadWireTag { kind: "dtype", tag, at })?;

	let rank = cursor.read_len()?;
	ensure_available(cursor, rank.saturating_mul(8))?;
	let mut shape = Vec::with_capacity(rank);
	let mut count = 1_usize;
	for _ in 0..rank {
		let dim = cursor.read_u64_le()?;
		let dim = usize::try_from(dim).map_err(|_| too_large(cursor))?;
		count = count.checked_mul(dim).ok_or_else(|| too_large(cursor))?;
		shape.push(dim);
	}

	let data = match dtype {
		DType::Bool => TensorData::Bool(fixed(cursor, count, 1)?.iter().map(|byte| *byte != 0).collect()),
		DType::I32 => TensorData::I32(fixed(cursor, count, 4)?.chunks_exact(4).map(|raw| i32::from_le_bytes(to_array(raw))).collect()),
		DType::I64 => TensorData::I64(fixed(cursor, count, 8)?.chunks_exact(8).map(|raw| i64::from_le_bytes(to_array(raw))).collect()),
		DType::F32 => TensorData::F32(fixed(cursor, count, 4)?.chunks_exact(4).map(|raw| f32::from_le_bytes(to_array(raw))).collect()),
		DType::F64 => TensorData::F64(fixed(cursor, count, 8)?.chunks_exact(8).map(|raw| f64::from_le_bytes(to_array(raw))).collect()),
		DType::String => {
			ensure_available(cursor, count.saturating_mul(4))?;
			let mut items = Vec::with_capacity(count);
			for _ in 0..count {
				let len = cursor.read_len()?;
				let at = cursor.pos();
				let raw = cursor.read_exact(len)?;
				let item = std::str::from_utf8(raw).map_err(|_| NestError::InvalidUtf8 { at })?;
				items.push(Box::from(item));
			}
			TensorData::String(items)
		}
	};
	Tensor::new(shape, data)
}

fn fixed<'a>(cursor: &mut Cursor<'a>, count: usize, width: usize) -> Result<&'a [u8]> {
	let need = count.checked_mul(width).ok_or_else(|| too_large(cursor))?;
	cursor.read_exact(need)
}

fn ensure_available(cursor: &Cursor<'_>, need: usize) -> Result<()> {
	if need > cursor.remaining() {
		return Err(NestError::UnexpectedEof {
			at: cursor.pos(),
			need,
			rem: cursor.remaining(),
		});
	}
	Ok(())
}

fn too_large(cursor: &Cursor<'_>) -> NestError {
	NestError::UnexpectedEof {
		at: cursor.pos(),
		need: usize::MAX,
		rem: cursor.remaining(),
	}
}

fn to_array<const N: usize>(raw: &[u8]) -> [u8; N] {
	let mut out = [0_u8; N];
	out.copy_from_slice(raw);
	out
}

fn first4(bytes: &[u8]) -> [u8; 4] {
	let mut magic = [0_u8; 4];
	let take = bytes.len().min(4);
	magic[..take].copy_from_slice(&bytes[..take]);
	magic
}

fn put_len(out: &mut Vec<u8>, len: usize) -> Result<()> {
	let len = u32::try_from(len).map_err(|_| NestError::WireLengthOverflow { len })?;
	out.extend_from_slice(&len.to_le_bytes());
	Ok(())
}

fn put_slot(out: &mut Vec<u8>, slot: &Slot, opt: &WireOptions, depth: u32) -> Result<()> {
	match slot {
		Slot::Dense(tensor) => {
			out.push(TAG_DENSE);
			put_tensor(out, tensor)
		}
		Slot::Sparse(sparse) => {
			out.push(TAG_SPARSE);
			put_tensor(out, sparse.indices())?;
			put_tensor(out, sparse.values())?;
			put_tensor(out, sparse.dense_shape())
		}
		Slot::Optional(cell) => match cell.slots() {
			None => {
				out.push(TAG_ABSENT);
				Ok(())
			}
			Some(slots) => {
				if depth >= opt.max_depth {
					return Err(NestError::WireDepthExceeded { max_depth: opt.max_depth });
				}
				out.push(TAG_PRESENT);
				put_len(out, slots.len())?;
				for item in slots {
					put_slot(out, item, opt, depth + 1)?;
				}
				Ok(())
			}
		},
	}
}

fn put_tensor(out: &mut Vec<u8>, tensor: &Tensor) -> Result<()> {
	out.push(tensor.dtype().code());
	put_len(out, tensor.shape().len())?;
	for dim in tensor.shape() {
		out.extend_from_slice(&(*dim as u64).to_le_bytes());
	}
	match tensor.data() {
		TensorData::Bool(items) => out.extend(items.iter().map(|item| u8::from(*item))),
		TensorData::I32(items) => items.iter().for_each(|item| out.extend_from_slice(&item.to_le_bytes())),
		TensorData::I64(items) => items.iter().for_each(|item| out.extend_from_slice(&item.to_le_bytes())),
		TensorData::F32(items) => items.iter().for_each(|item| out.extend_from_slice(&item.to_le_bytes())),
		TensorData::F64(items) => items.iter().for_each(|item| out.extend_from_slice(&item.to_le_bytes())),
		TensorData::String(items) => {
			for item in items {
				put_len(out, item.len())?;
				out.extend_from_slice(item.as_bytes());
			}
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests;
