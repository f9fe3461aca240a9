//! Mutant — one tracked variant
//!
//! A mutant knows its own name, its sequences and structure, and the *name* of
//! its parent. The parent is never held as a reference; it is looked up through
//! the zoo when needed, which keeps every record plain data.

use super::{lineage, MutantZoo, Notes};
use crate::error::ZooError;
use crate::storage::MutantRecord;
use crate::structure::{write_sequence_file, ChainSequences};
use log::warn;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A single variant record
#[derive(Debug, Clone, PartialEq)]
pub struct Mutant {
    name: String,
    /// Chain id → sequence
    pub sequence: Option<ChainSequences>,
    /// Structure file backing this mutant
    pub structure: Option<PathBuf>,
    /// Name of the mutant this one was derived from
    pub parent: Option<String>,
    pub notes: Notes,
    /// Tagged auxiliary files
    pub files: BTreeMap<String, PathBuf>,
}

impl Mutant {
    /// Only the zoo mints mutants; the name must come from its allocator.
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            sequence: None,
            structure: None,
            parent: None,
            notes: Notes::new(),
            files: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_note(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.notes.insert(key.into(), value.into());
    }

    pub fn add_file(&mut self, tag: impl Into<String>, path: impl Into<PathBuf>) {
        self.files.insert(tag.into(), path.into());
    }

    /// Look the parent up by name. A parent name that does not resolve is
    /// logged and treated as no parent.
    pub fn resolve_parent<'z>(&self, zoo: &'z MutantZoo) -> Option<&'z Mutant> {
        let parent = self.parent.as_deref()?;
        let found = zoo.get_mutant_by_name(parent);
        if found.is_none() {
            warn!(
                "Mutant '{}' names parent '{}' which is not in the zoo",
                self.name, parent
            );
        }
        found
    }

    /// Ancestry, root first, ending with this mutant
    pub fn trace_lineage(&self, zoo: &MutantZoo) -> Result<Vec<String>, ZooError> {
        lineage::trace(zoo, self, false)
    }

    /// Like `trace_lineage`, but an unresolvable parent is an error
    pub fn trace_lineage_strict(&self, zoo: &MutantZoo) -> Result<Vec<String>, ZooError> {
        lineage::trace(zoo, self, true)
    }

    /// Write this mutant's sequences as a single FastA record
    pub fn write_fasta(&self, out_path: impl AsRef<Path>) -> Result<(), ZooError> {
        let sequence = self.sequence.as_ref().ok_or_else(|| {
            ZooError::Configuration(format!("Mutant '{}' has no sequence", self.name))
        })?;
        write_sequence_file(&self.name, sequence, out_path)
    }

    pub fn to_record(&self) -> MutantRecord {
        MutantRecord {
            name: self.name.clone(),
            sequence: self.sequence.clone(),
            structure: self.structure.clone(),
            parent: self.parent.clone(),
            notes: self.notes.clone(),
            files: self.files.clone(),
        }
    }

    pub(crate) fn from_record(record: MutantRecord) -> Self {
        Self {
            name: record.name,
            sequence: record.sequence,
            structure: record.structure,
            parent: record.parent,
            notes: record.notes,
            files: record.files,
        }
    }

    pub fn summary(&self) -> String {
        let chains = self.sequence.as_ref().map(|s| s.len()).unwrap_or(0);
        let residues: usize = self
            .sequence
            .as_ref()
            .map(|s| s.values().map(|seq| seq.len()).sum())
            .unwrap_or(0);
        format!(
            "Mutant '{}' | chains={} | residues={} | parent={} | files={}",
            self.name,
            chains,
            residues,
            self.parent.as_deref().unwrap_or("-"),
            self.files.len()
        )
    }
}
