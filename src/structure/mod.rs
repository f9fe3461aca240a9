//! Structure and sequence-file collaborators
//!
//! The zoo only needs two things from the outside world: a chain → sequence map
//! for a structure file, and a way to write sequences back out as FASTA.

pub mod fasta;
pub mod pdb;

pub use fasta::{read_fasta_file, write_sequence_file, SeqRecord};
pub use pdb::PdbReader;

use crate::error::ZooError;
use std::collections::BTreeMap;
use std::path::Path;

/// Chain identifier → one-letter sequence
pub type ChainSequences = BTreeMap<String, String>;

/// Turns a structure file into per-chain sequences
pub trait StructureReader: Send + Sync {
    fn sequence_from_structure(&self, path: &Path) -> Result<ChainSequences, ZooError>;
}
