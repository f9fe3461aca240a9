//! Mutant Zoo — bookkeeping for iterative protein design
//!
//! Every design round brings in a batch of structures or sequences. Each one
//! becomes a mutant with a permanent, human-friendly name drawn from a seeded
//! vocabulary, an optional parent for lineage, and free-form notes. The whole
//! zoo saves to a JSON state document and can be migrated into a
//! self-contained bundle that stays valid when moved.

pub mod config;
pub mod error;
pub mod naming;
pub mod storage;
pub mod structure;
pub mod zoo;

#[cfg(test)]
mod test_support;

pub use config::ZooConfig;
pub use error::ZooError;
pub use naming::{NameAllocator, NameSource};
pub use storage::MigrationReport;
pub use structure::{ChainSequences, PdbReader, StructureReader};
pub use zoo::{BatchRequest, DesignRound, InputMode, Mutant, MutantZoo, RoundRequest};
