//! The zoo — design rounds of named mutants and their lineage
//!
//! `MutantZoo` owns the rounds and the name allocator. A `DesignRound` only
//! ever sees the allocator through `NameSource`, so rounds carry no reference
//! back to the zoo.

mod design_round;
mod lineage;
mod mutant;
mod registry;

pub use design_round::{BatchRequest, DesignRound, InputMode, RoundRequest};
pub use lineage::format_lineage;
pub use mutant::Mutant;
pub use registry::MutantZoo;

use std::collections::BTreeMap;

/// Free-form annotations (strings, numbers, bools, lists, maps)
pub type Notes = BTreeMap<String, serde_json::Value>;
