//! Mutant naming — `color_shape_animal` identifiers
//!
//! Names are permanent and unique for the lifetime of a zoo, including across
//! save/load and migration.

mod allocator;
pub mod vocabulary;

pub use allocator::{NameAllocator, NameSource};
pub use vocabulary::NAME_SPACE;

/// Whether `name` is a well-formed member of the name space
pub fn is_valid_name(name: &str) -> bool {
    vocabulary::decompose(name).is_some()
}
