use thiserror::Error;

use crate::nest::DType;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, NestError>;

/// Errors produced while describing, encoding, and combining structured values.
#[derive(Debug, Error)]
pub enum NestError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Value or slot did not conform to the descriptor it was checked against.
	#[error("shape mismatch: expected {expected}, got {got}")]
	ShapeMismatch {
		/// Rendered descriptor or slot kind that was expected.
		expected: String,
		/// Rendered descriptor or slot kind that was found.
		got: String,
	},
	/// Unflatten received the wrong number of slots.
	#[error("slot count mismatch: expected {expected}, got {got}")]
	SlotCountMismatch {
		/// Slots the descriptor consumes.
		expected: usize,
		/// Slots supplied by the caller.
		got: usize,
	},
	/// Value access on an optional that holds nothing.
	#[error("optional has no value")]
	NoValue,
	/// Access before the producing resource was initialized.
	#[error("{resource} has not been initialized")]
	NotReady {
		/// Label of the resource that is not ready.
		resource: String,
	},
	/// Combinator operands have incompatible descriptors or slot kinds.
	#[error("incompatible operands: {left} vs {right}")]
	IncompatibleOperands {
		/// Rendered left operand kind.
		left: String,
		/// Rendered right operand kind.
		right: String,
	},
	/// One combinator operand holds a value and another does not.
	#[error("optional presence mismatch: operand {index} differs from operand 0")]
	PresenceMismatch {
		/// Index of the first operand whose presence differs.
		index: usize,
	},
	/// Operator is not defined for an element kind.
	#[error("{op} is not supported for dtype {dtype}")]
	UnsupportedDType {
		/// Operator name.
		op: &'static str,
		/// Offending element kind.
		dtype: DType,
	},
	/// `add_n` was called without operands.
	#[error("add_n requires at least one operand")]
	EmptyAddN,
	/// Tensor data length disagrees with its shape.
	#[error("tensor of shape {shape:?} needs {expected} elements, got {got}")]
	TensorSizeMismatch {
		/// Declared tensor shape.
		shape: Vec<usize>,
		/// Element count implied by the shape.
		expected: usize,
		/// Element count supplied.
		got: usize,
	},
	/// Element count implied by a shape does not fit in `usize`.
	#[error("tensor shape {shape:?} has too many elements")]
	ShapeOverflow {
		/// Offending shape.
		shape: Vec<usize>,
	},
	/// Sparse triple violates its structural invariants.
	#[error("invalid sparse tensor: {reason}")]
	InvalidSparse {
		/// Human-readable reason.
		reason: String,
	},
	/// Descriptor text could not be parsed.
	#[error("invalid descriptor at offset {at}: {reason} in {input:?}")]
	InvalidDescriptor {
		/// Original descriptor text.
		input: String,
		/// Byte offset of the failure.
		at: usize,
		/// Human-readable reason.
		reason: &'static str,
	},
	/// No single descriptor covers a set of values.
	#[error("cannot infer element spec: {reason}")]
	SpecInference {
		/// Human-readable reason.
		reason: String,
	},
	/// Value literal could not be converted into a structured value.
	#[error("invalid value literal: {reason}")]
	InvalidValueLiteral {
		/// Human-readable reason.
		reason: String,
	},
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Unknown leading frame magic.
	#[error("unknown wire magic {magic:?}")]
	UnknownMagic {
		/// First up-to-4 bytes of the frame.
		magic: [u8; 4],
	},
	/// Frame version is not understood by this decoder.
	#[error("unsupported wire version {version}")]
	UnsupportedWireVersion {
		/// Version byte found in the frame.
		version: u8,
	},
	/// Unknown slot or dtype tag inside a frame.
	#[error("bad wire tag {tag} for {kind} at offset {at}")]
	BadWireTag {
		/// Tag category being decoded.
		kind: &'static str,
		/// Offending tag byte.
		tag: u8,
		/// Cursor offset of the tag.
		at: usize,
	},
	/// String element bytes are not valid UTF-8.
	#[error("invalid utf-8 string element at offset {at}")]
	InvalidUtf8 {
		/// Cursor offset of the string bytes.
		at: usize,
	},
	/// Count or length does not fit the frame's `u32` length field.
	#[error("length {len} does not fit a wire length field")]
	WireLengthOverflow {
		/// Offending length.
		len: usize,
	},
	/// Frame carried bytes after the last slot.
	#[error("wire frame has {leftover} trailing bytes")]
	TrailingBytes {
		/// Unconsumed bytes.
		leftover: usize,
	},
	/// Nested optional payloads exceeded the configured depth.
	#[error("wire nesting depth exceeded (max={max_depth})")]
	WireDepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// Decompression output exceeded configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
}

/// Coarse failure classes that callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Data inconsistent with a descriptor.
	ShapeMismatch,
	/// Materialized optional is absent.
	NoValue,
	/// Producing resource is not initialized yet.
	NotReady,
	/// Other caller errors.
	InvalidArgument,
	/// Corrupted or truncated encoded bytes.
	DataLoss,
	/// Underlying IO failure.
	Io,
}

/// Runtime status code an error surfaces as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
	/// Caller supplied an argument the operation cannot accept.
	InvalidArgument,
	/// System is not in a state the operation requires.
	FailedPrecondition,
	/// Unrecoverable data corruption.
	DataLoss,
	/// Environment failure outside the runtime.
	Unavailable,
}

impl NestError {
	/// Classify this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Io(_) => ErrorKind::Io,
			Self::ShapeMismatch { .. } | Self::SlotCountMismatch { .. } => ErrorKind::ShapeMismatch,
			Self::NoValue => ErrorKind::NoValue,
			Self::NotReady { .. } => ErrorKind::NotReady,
			Self::IncompatibleOperands { .. }
			| Self::PresenceMismatch { .. }
			| Self::UnsupportedDType { .. }
			| Self::EmptyAddN
			| Self::TensorSizeMismatch { .. }
			| Self::ShapeOverflow { .. }
			| Self::WireLengthOverflow { .. }
			| Self::InvalidSparse { .. }
			| Self::InvalidDescriptor { .. }
			| Self::SpecInference { .. }
			| Self::InvalidValueLiteral { .. } => ErrorKind::InvalidArgument,
			Self::UnexpectedEof { .. }
			| Self::UnknownMagic { .. }
			| Self::UnsupportedWireVersion { .. }
			| Self::BadWireTag { .. }
			| Self::InvalidUtf8 { .. }
			| Self::TrailingBytes { .. }
			| Self::WireDepthExceeded { .. }
			| Self::DecompressedTooLarge { .. } => ErrorKind::DataLoss,
		}
	}

	/// Status code surfaced to the surrounding runtime.
	pub fn status(&self) -> Status {
		self.kind().status()
	}
}

impl ErrorKind {
	/// Map a failure class onto its runtime status code.
	pub fn status(self) -> Status {
		match self {
			Self::ShapeMismatch | Self::NoValue | Self::InvalidArgument => Status::InvalidArgument,
			Self::NotReady => Status::FailedPrecondition,
			Self::DataLoss => Status::DataLoss,
			Self::Io => Status::Unavailable,
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::ShapeMismatch => "shape_mismatch",
			Self::NoValue => "no_value",
			Self::NotReady => "not_ready",
			Self::InvalidArgument => "invalid_argument",
			Self::DataLoss => "data_loss",
			Self::Io => "io",
		}
	}
}
