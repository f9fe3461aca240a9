//! MutantZoo — owns design rounds, the name ledger, and persistence
//!
//! Provides round creation, lookups by name, lineage tracing, save/load of
//! the state document and migration into a relocatable bundle.

use super::{lineage, BatchRequest, DesignRound, Mutant, Notes, RoundRequest};
use crate::config::ZooConfig;
use crate::error::ZooError;
use crate::naming::NameAllocator;
use crate::storage::{self, migrate, MigrationReport};
use crate::structure::{PdbReader, StructureReader};
use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::Rng;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Upper bound (inclusive) for randomly chosen seeds
const MAX_RANDOM_SEED: u64 = 1_000_000;

/// The registry of every design round and mutant
pub struct MutantZoo {
    pub(crate) design_rounds: Vec<DesignRound>,
    pub notes: Notes,
    pub(crate) names: NameAllocator,
    /// Base directory for relative paths (set by migrate, or by loading a bundle)
    pub(crate) top_dir: Option<PathBuf>,
    /// Stored paths are relative to `top_dir`
    pub(crate) relative_paths: bool,
    pub(crate) created_at: DateTime<Utc>,
    config: ZooConfig,
    reader: Box<dyn StructureReader>,
}

impl MutantZoo {
    /// Create an empty zoo. Without a seed a random one is drawn once and kept.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen_range(0..=MAX_RANDOM_SEED));
        info!("Created mutant zoo with seed {}", seed);
        Self::assemble(
            NameAllocator::new(seed),
            Notes::new(),
            Vec::new(),
            None,
            false,
            Utc::now(),
            ZooConfig::default(),
        )
    }

    pub(crate) fn assemble(
        names: NameAllocator,
        notes: Notes,
        design_rounds: Vec<DesignRound>,
        top_dir: Option<PathBuf>,
        relative_paths: bool,
        created_at: DateTime<Utc>,
        config: ZooConfig,
    ) -> Self {
        Self {
            design_rounds,
            notes,
            names,
            top_dir,
            relative_paths,
            created_at,
            config,
            reader: Box::new(PdbReader),
        }
    }

    pub fn with_config(mut self, config: ZooConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the structure → sequence collaborator
    pub fn with_reader(mut self, reader: impl StructureReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn config(&self) -> &ZooConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.names.seed()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn allocated_names(&self) -> &BTreeSet<String> {
        self.names.allocated()
    }

    pub fn top_dir(&self) -> Option<&Path> {
        self.top_dir.as_deref()
    }

    pub fn relative_paths(&self) -> bool {
        self.relative_paths
    }

    pub fn design_rounds(&self) -> &[DesignRound] {
        &self.design_rounds
    }

    /// Issue a fresh name outside of any intake
    pub fn allocate_name(&mut self) -> Result<String, ZooError> {
        self.names.allocate()
    }

    /// Open a new round and intake its first batch
    pub fn new_design_round(&mut self, request: RoundRequest) -> Result<&DesignRound, ZooError> {
        self.validate_round_name(&request.name)?;
        self.check_shared_parent(&request.batch);
        info!("Creating new design round: {}", request.name);

        let round = DesignRound::create(
            &mut self.names,
            &*self.reader,
            &self.config,
            request,
        )?;
        let idx = self.design_rounds.len();
        self.design_rounds.push(round);
        Ok(&self.design_rounds[idx])
    }

    /// Intake another batch into an existing round
    pub fn add_mutants(
        &mut self,
        round_name: &str,
        batch: BatchRequest,
    ) -> Result<Vec<String>, ZooError> {
        let idx = self
            .design_rounds
            .iter()
            .position(|r| r.name() == round_name)
            .ok_or_else(|| round_not_found(round_name))?;
        self.check_shared_parent(&batch);
        let round = &mut self.design_rounds[idx];
        round.add_mutants(&mut self.names, &*self.reader, &self.config, batch)
    }

    pub fn get_round_by_name(&self, name: &str) -> Result<&DesignRound, ZooError> {
        self.design_rounds
            .iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| round_not_found(name))
    }

    pub fn get_round_by_name_mut(&mut self, name: &str) -> Result<&mut DesignRound, ZooError> {
        self.design_rounds
            .iter_mut()
            .find(|r| r.name() == name)
            .ok_or_else(|| round_not_found(name))
    }

    /// Linear scan over every round; absence is not an error
    pub fn get_mutant_by_name(&self, name: &str) -> Option<&Mutant> {
        self.design_rounds.iter().find_map(|r| r.get_mutant(name))
    }

    pub fn get_mutant_by_name_mut(&mut self, name: &str) -> Option<&mut Mutant> {
        self.design_rounds
            .iter_mut()
            .find_map(|r| r.get_mutant_mut(name))
    }

    /// The round a mutant belongs to
    pub fn find_round_of(&self, mutant_name: &str) -> Option<&DesignRound> {
        self.design_rounds
            .iter()
            .find(|r| r.get_mutant(mutant_name).is_some())
    }

    /// Every mutant with its round, rounds in order, mutants in creation order
    pub fn iter_mutants(&self) -> impl Iterator<Item = (&DesignRound, &Mutant)> {
        self.design_rounds
            .iter()
            .flat_map(|r| r.mutants().iter().map(move |m| (r, m)))
    }

    pub fn mutant_count(&self) -> usize {
        self.design_rounds.iter().map(|r| r.len()).sum()
    }

    pub fn add_note(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.notes.insert(key.into(), value.into());
    }

    /// Ancestry of the named mutant, root first
    pub fn trace_lineage(&self, mutant_name: &str) -> Result<Vec<String>, ZooError> {
        let mutant = self
            .get_mutant_by_name(mutant_name)
            .ok_or_else(|| ZooError::NotFound(format!("Mutant {} not found in mutant zoo", mutant_name)))?;
        lineage::trace(self, mutant, false)
    }

    /// Turn a stored path into one usable from the current directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match (&self.top_dir, self.relative_paths) {
            (Some(top), true) => top.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Write the state document
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ZooError> {
        let path = path.as_ref();
        storage::write_state(&storage::ZooState::capture(self), path)?;
        info!(
            "Saved mutant zoo ({} rounds, {} mutants) to {}",
            self.design_rounds.len(),
            self.mutant_count(),
            path.display()
        );
        Ok(())
    }

    /// Load a state document with the default configuration
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ZooError> {
        Self::load_with_config(path, ZooConfig::default())
    }

    pub fn load_with_config(path: impl AsRef<Path>, config: ZooConfig) -> Result<Self, ZooError> {
        let path = path.as_ref();
        let state = storage::read_state(path)?;
        let zoo = state.restore(path, config)?;
        info!(
            "Loaded mutant zoo ({} rounds, {} mutants) from {}",
            zoo.design_rounds.len(),
            zoo.mutant_count(),
            path.display()
        );
        Ok(zoo)
    }

    /// Copy every backing file into `out_dir` and save a relocatable state document there
    pub fn migrate(&mut self, out_dir: impl AsRef<Path>) -> Result<MigrationReport, ZooError> {
        migrate::migrate_zoo(self, out_dir.as_ref())
    }

    pub fn summary(&self) -> String {
        format!(
            "MutantZoo | seed={} | rounds={} | mutants={} | names issued={} | created {}",
            self.seed(),
            self.design_rounds.len(),
            self.mutant_count(),
            self.names.allocated().len(),
            self.created_at.format("%Y-%m-%d %H:%M:%S")
        )
    }

    fn validate_round_name(&self, name: &str) -> Result<(), ZooError> {
        if name.trim().is_empty() || name == "." || name == ".." {
            return Err(ZooError::Configuration(format!(
                "Invalid design round name '{}'",
                name
            )));
        }
        if name.contains(['/', '\\']) {
            return Err(ZooError::Configuration(format!(
                "Design round name '{}' must not contain path separators",
                name
            )));
        }
        if self.design_rounds.iter().any(|r| r.name() == name) {
            return Err(ZooError::Configuration(format!(
                "Design round '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    fn check_shared_parent(&self, batch: &BatchRequest) {
        if let Some(parent) = batch.shared_parent.as_deref() {
            if self.get_mutant_by_name(parent).is_none() {
                warn!("Shared parent '{}' is not in the zoo", parent);
            }
        }
    }
}

impl fmt::Debug for MutantZoo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutantZoo")
            .field("seed", &self.seed())
            .field("design_rounds", &self.design_rounds)
            .field("notes", &self.notes)
            .field("allocated_names", &self.names.allocated().len())
            .field("top_dir", &self.top_dir)
            .field("relative_paths", &self.relative_paths)
            .finish()
    }
}

fn round_not_found(name: &str) -> ZooError {
    ZooError::NotFound(format!("Round {} not found in mutant zoo", name))
}
