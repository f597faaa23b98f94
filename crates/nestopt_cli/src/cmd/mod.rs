/// Leafwise optional addition command.
pub mod add;
/// Descriptor comparison command.
pub mod check;
/// Descriptor inference command.
pub mod describe;
/// JSON value literals.
pub mod literal;
/// Wire codec round-trip command.
pub mod roundtrip;
/// Optional construction report command.
pub mod wrap;
/// Zero-fill command.
pub mod zeros;

mod util;
