//! DesignRound — a named batch of mutants created from one input source
//!
//! Intake is two-phase: every input is read first, then names are allocated in
//! sorted input order. A bad input therefore never consumes names or leaves a
//! half-built batch, and the same seed always gives the same file the same name.

use super::{Mutant, MutantZoo, Notes};
use crate::config::ZooConfig;
use crate::error::ZooError;
use crate::naming::NameSource;
use crate::structure::{fasta, read_fasta_file, ChainSequences, StructureReader};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// How a batch of mutants is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    /// One mutant per structure file in a directory
    #[serde(rename = "pdbDir")]
    PdbDir,
    /// One mutant per record of a FastA file
    #[serde(rename = "fastaFile")]
    FastaFile,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InputMode::PdbDir => "pdbDir",
            InputMode::FastaFile => "fastaFile",
        };
        write!(f, "{}", s)
    }
}

/// One batch of inputs sharing a parent and a notes payload
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub input_mode: InputMode,
    pub input_dir: Option<PathBuf>,
    pub input_file: Option<PathBuf>,
    pub shared_parent: Option<String>,
    /// Copied into every mutant of the batch
    pub notes: Notes,
}

impl BatchRequest {
    pub fn pdb_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            input_mode: InputMode::PdbDir,
            input_dir: Some(dir.into()),
            input_file: None,
            shared_parent: None,
            notes: Notes::new(),
        }
    }

    pub fn fasta_file(file: impl Into<PathBuf>) -> Self {
        Self {
            input_mode: InputMode::FastaFile,
            input_dir: None,
            input_file: Some(file.into()),
            shared_parent: None,
            notes: Notes::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.shared_parent = Some(parent.into());
        self
    }

    pub fn with_note(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.notes.insert(key.into(), value.into());
        self
    }
}

/// Everything needed to open a new round
#[derive(Debug, Clone)]
pub struct RoundRequest {
    pub name: String,
    /// Round-level notes
    pub notes: Notes,
    pub batch: BatchRequest,
}

impl RoundRequest {
    pub fn new(name: impl Into<String>, batch: BatchRequest) -> Self {
        Self {
            name: name.into(),
            notes: Notes::new(),
            batch,
        }
    }

    pub fn with_note(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.notes.insert(key.into(), value.into());
        self
    }
}

/// A single input, read and ready to be named
struct Intake {
    sequence: ChainSequences,
    structure: Option<PathBuf>,
    header: Option<String>,
}

/// A named group of mutants created together
#[derive(Debug, Clone, PartialEq)]
pub struct DesignRound {
    name: String,
    pub notes: Notes,
    input_mode: InputMode,
    input_dir: Option<PathBuf>,
    input_file: Option<PathBuf>,
    /// Creation order
    mutants: Vec<Mutant>,
}

impl DesignRound {
    /// Open a round and mint one mutant per input of the request's batch
    pub fn create(
        names: &mut dyn NameSource,
        reader: &dyn StructureReader,
        config: &ZooConfig,
        request: RoundRequest,
    ) -> Result<Self, ZooError> {
        let RoundRequest { name, notes, batch } = request;
        let mut round = Self {
            name,
            notes,
            input_mode: batch.input_mode,
            input_dir: batch.input_dir.clone(),
            input_file: batch.input_file.clone(),
            mutants: Vec::new(),
        };
        round.add_mutants(names, reader, config, batch)?;
        Ok(round)
    }

    /// Rebuild a round from persisted parts
    pub(crate) fn from_parts(
        name: String,
        notes: Notes,
        input_mode: InputMode,
        input_dir: Option<PathBuf>,
        input_file: Option<PathBuf>,
        mutants: Vec<Mutant>,
    ) -> Self {
        Self {
            name,
            notes,
            input_mode,
            input_dir,
            input_file,
            mutants,
        }
    }

    /// Intake another batch into this round. Returns the new names in order.
    pub fn add_mutants(
        &mut self,
        names: &mut dyn NameSource,
        reader: &dyn StructureReader,
        config: &ZooConfig,
        batch: BatchRequest,
    ) -> Result<Vec<String>, ZooError> {
        let intakes = collect_inputs(reader, config, &batch)?;

        let mut minted = Vec::with_capacity(intakes.len());
        for intake in intakes {
            let mut mutant = Mutant::new(names.next_name()?);
            mutant.sequence = Some(intake.sequence);
            mutant.structure = intake.structure;
            mutant.parent = batch.shared_parent.clone();
            mutant.notes = batch.notes.clone();
            if let Some(header) = intake.header {
                mutant.add_note("fasta_header", header);
            }
            minted.push(mutant.name().to_string());
            self.mutants.push(mutant);
        }

        info!(
            "Round '{}': added {} mutant(s) from {} ({} total)",
            self.name,
            minted.len(),
            batch.input_mode,
            self.mutants.len()
        );
        Ok(minted)
    }

    pub fn add_note(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.notes.insert(key.into(), value.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn input_dir(&self) -> Option<&Path> {
        self.input_dir.as_deref()
    }

    pub fn input_file(&self) -> Option<&Path> {
        self.input_file.as_deref()
    }

    pub fn mutants(&self) -> &[Mutant] {
        &self.mutants
    }

    pub(crate) fn mutants_mut(&mut self) -> &mut [Mutant] {
        &mut self.mutants
    }

    pub fn mutant_names(&self) -> Vec<String> {
        self.mutants.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn get_mutant(&self, name: &str) -> Option<&Mutant> {
        self.mutants.iter().find(|m| m.name() == name)
    }

    pub fn get_mutant_mut(&mut self, name: &str) -> Option<&mut Mutant> {
        self.mutants.iter_mut().find(|m| m.name() == name)
    }

    pub fn len(&self) -> usize {
        self.mutants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutants.is_empty()
    }

    /// Lineage of every mutant of this round, in creation order
    pub fn trace_lineages(&self, zoo: &MutantZoo) -> Result<Vec<Vec<String>>, ZooError> {
        self.mutants.iter().map(|m| m.trace_lineage(zoo)).collect()
    }

    /// Write every mutant with a sequence into one FastA file
    pub fn write_fasta(&self, out_path: impl AsRef<Path>) -> Result<usize, ZooError> {
        let mut out = BufWriter::new(File::create(out_path)?);
        let mut written = 0;
        for mutant in &self.mutants {
            if let Some(sequence) = &mutant.sequence {
                fasta::write_record(&mut out, mutant.name(), sequence)?;
                written += 1;
            }
        }
        out.flush()?;
        Ok(written)
    }
}

fn collect_inputs(
    reader: &dyn StructureReader,
    config: &ZooConfig,
    batch: &BatchRequest,
) -> Result<Vec<Intake>, ZooError> {
    match batch.input_mode {
        InputMode::PdbDir => {
            let dir = batch.input_dir.as_deref().ok_or_else(|| {
                ZooError::Configuration("pdbDir input requires an input directory".into())
            })?;
            let files = structure_files(dir, config)?;
            files
                .into_iter()
                .map(|path| -> Result<Intake, ZooError> {
                    let sequence = reader.sequence_from_structure(&path)?;
                    Ok(Intake {
                        sequence,
                        structure: Some(path),
                        header: None,
                    })
                })
                .collect()
        }
        InputMode::FastaFile => {
            let file = batch.input_file.as_deref().ok_or_else(|| {
                ZooError::Configuration("fastaFile input requires an input file".into())
            })?;
            if !file.is_file() {
                return Err(ZooError::Configuration(format!(
                    "Input file {} does not exist or is not a file",
                    file.display()
                )));
            }
            let records = read_fasta_file(file)?;
            if records.is_empty() {
                return Err(ZooError::Configuration(format!(
                    "Input file {} holds no sequence records",
                    file.display()
                )));
            }
            Ok(records
                .into_iter()
                .map(|record| Intake {
                    sequence: [("A".to_string(), record.sequence)].into_iter().collect(),
                    structure: None,
                    header: Some(record.header),
                })
                .collect())
        }
    }
}

/// Structure files directly inside `dir`, sorted by file name
fn structure_files(dir: &Path, config: &ZooConfig) -> Result<Vec<PathBuf>, ZooError> {
    if !dir.is_dir() {
        return Err(ZooError::Configuration(format!(
            "Input directory {} does not exist or is not a directory",
            dir.display()
        )));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && config.is_structure_file(&path) {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(ZooError::Configuration(format!(
            "Input directory {} contains no structure files ({})",
            dir.display(),
            config.structure_extensions.join(", ")
        )));
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
