//! Type-erased optional values over nested tensor structures.

/// Structured values, descriptors, optionals, combinators, and the wire codec.
pub mod nest;
