mod bytes;
mod combine;
mod compression;
mod descriptor;
mod dtype;
mod error;
mod iterator;
mod optional;
mod shape;
mod signature;
mod slot;
mod sparse;
mod tensor;
mod value;
mod wire;

#[cfg(test)]
mod test_support;

/// Slot-level and optional-level structural combinators.
pub use combine::{add_n, pairwise_add, zero_fill, zeros_like};
/// Compression detection result.
pub use compression::Compression;
/// Structure descriptor types.
pub use descriptor::{Descriptor, Layout, LeafDescriptor, OptionalDescriptor};
/// Element kinds.
pub use dtype::DType;
/// Error and result aliases.
pub use error::{ErrorKind, NestError, Result, Status};
/// Iterator collaborator producing optionals.
pub use iterator::{ElementIterator, IteratorOptions, PendingOptional};
/// Optional container.
pub use optional::OptionalValue;
/// Shapes and dims.
pub use shape::{Dim, Shape};
/// Per-descriptor trace cache.
pub use signature::SignatureCache;
/// Uniform encoding units.
pub use slot::{OptionalSlot, Payload, Slot, SlotKind, SlotSpec};
/// Sparse leaf.
pub use sparse::SparseTensor;
/// Dense leaf.
pub use tensor::{Tensor, TensorData};
/// Structured values and descriptor inference.
pub use value::{Describe, Value};
/// Boundary byte codec.
pub use wire::{WIRE_MAGIC, WIRE_VERSION, WireOptions, decode_optional, decode_slots, encode_optional, encode_slots, transfer};
