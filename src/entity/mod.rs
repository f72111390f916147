//! Entity descriptors
//!
//! An entity is one source feed and its target table: the crash records
//! themselves (`traffic`) or the people involved in them (`people`). A
//! single pipeline runs any entity; everything that differs between
//! entities lives in its descriptor.

mod builtin;
mod descriptor;

pub use builtin::{get_builtin, list_builtin, BUILTIN_ENTITIES};
pub use descriptor::{load_entity, load_entity_from_str, EntityDescriptor};
