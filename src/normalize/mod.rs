//! Normalizer
//!
//! Projects raw feed records onto an entity's whitelisted, lower-case
//! columns, coerces every value to its column type and drops records
//! that lack a required identifier.

mod batch;
mod normalizer;

pub use batch::Batch;
pub use normalizer::Normalizer;
