//! Migration — copy a zoo into a self-contained, relocatable bundle
//!
//! Layout of a bundle:
//!
//! ```text
//! out_dir/
//!   zoo_state.json              relative_paths = true
//!   <round>/<mutant>.pdb        structure copies
//!   <round>/<mutant>.fasta      sequence-only mutants
//!   <round>/<tag>_<mutant>.ext  tagged files
//! ```
//!
//! Item failures do not stop the run. Each is collected, the state document
//! is still written, and the caller gets every failure at once.

use crate::error::ZooError;
use crate::structure::write_sequence_file;
use crate::zoo::{Mutant, MutantZoo};
use chrono::{DateTime, Utc};
use log::{info, warn};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Tag under which a written sequence file is recorded
pub const SEQUENCE_FILE_TAG: &str = "sequence_file";

/// What a bundle file stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    Structure,
    SequenceFile,
    Tagged(String),
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Structure => write!(f, "structure"),
            ArtifactKind::SequenceFile => write!(f, "sequence file"),
            ArtifactKind::Tagged(tag) => write!(f, "file '{}'", tag),
        }
    }
}

/// A file that made it into the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedFile {
    pub round: String,
    pub mutant: String,
    pub kind: ArtifactKind,
    /// Relative to the bundle directory
    pub relative_path: PathBuf,
    /// Hex sha256, present when copies are verified
    pub checksum: Option<String>,
}

/// An item that could not be archived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFailure {
    pub round: String,
    pub mutant: String,
    pub source: PathBuf,
    pub reason: String,
}

impl fmt::Display for MigrationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}: {}: {}",
            self.round,
            self.mutant,
            self.source.display(),
            self.reason
        )
    }
}

/// Outcome of a successful migration
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub out_dir: PathBuf,
    pub state_file: PathBuf,
    pub archived: Vec<ArchivedFile>,
    pub migrated_at: DateTime<Utc>,
}

impl MigrationReport {
    pub fn summary(&self) -> String {
        let verified = self.archived.iter().filter(|a| a.checksum.is_some()).count();
        format!(
            "Migrated {} file(s) ({} verified) into {} | state: {} | at {}",
            self.archived.len(),
            verified,
            self.out_dir.display(),
            self.state_file.display(),
            self.migrated_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

pub(crate) fn migrate_zoo(zoo: &mut MutantZoo, out_dir: &Path) -> Result<MigrationReport, ZooError> {
    let config = zoo.config().clone();
    let previous_top = zoo.top_dir.clone();
    let was_relative = zoo.relative_paths;
    let resolve = |p: &Path| -> PathBuf {
        match (&previous_top, was_relative) {
            (Some(top), true) => top.join(p),
            _ => p.to_path_buf(),
        }
    };

    info!("Migrating mutant zoo into {}", out_dir.display());
    std::fs::create_dir_all(out_dir)?;
    // From here on every stored path is either bundle-relative or absolute
    zoo.top_dir = Some(out_dir.to_path_buf());
    zoo.relative_paths = true;

    let mut archived: Vec<ArchivedFile> = Vec::new();
    let mut failures: Vec<MigrationFailure> = Vec::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();

    for round in zoo.design_rounds.iter_mut() {
        let round_name = round.name().to_string();
        let round_dir = out_dir.join(&round_name);
        if let Err(err) = std::fs::create_dir_all(&round_dir) {
            warn!("Could not create {}: {}", round_dir.display(), err);
            for mutant in round.mutants_mut() {
                pin_to_sources(mutant, &resolve);
                failures.push(MigrationFailure {
                    round: round_name.clone(),
                    mutant: mutant.name().to_string(),
                    source: round_dir.clone(),
                    reason: err.to_string(),
                });
            }
            continue;
        }

        for mutant in round.mutants_mut() {
            let name = mutant.name().to_string();
            let tagged: Vec<(String, PathBuf)> = mutant
                .files
                .iter()
                .map(|(tag, path)| (tag.clone(), path.clone()))
                .collect();
            let mut wrote_sequence = false;

            let mut fail = |source: PathBuf, err: ZooError| {
                warn!("Could not archive {}/{}: {}", round_name, name, err);
                failures.push(MigrationFailure {
                    round: round_name.clone(),
                    mutant: name.clone(),
                    source,
                    reason: err.to_string(),
                });
            };

            if let Some(structure) = mutant.structure.clone() {
                let source = resolve(&structure);
                let ext = source
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| ".pdb".to_string());
                let relative = claim(&mut claimed, &round_name, &name, &ext);
                match copy_verified(&source, &out_dir.join(&relative), config.verify_copies) {
                    Ok(checksum) => {
                        mutant.structure = Some(relative.clone());
                        archived.push(ArchivedFile {
                            round: round_name.clone(),
                            mutant: name.clone(),
                            kind: ArtifactKind::Structure,
                            relative_path: relative,
                            checksum,
                        });
                    }
                    Err(err) => {
                        let absolute = absolutize(&source);
                        mutant.structure = Some(absolute.clone());
                        fail(absolute, err);
                    }
                }
            } else if let Some(sequence) = mutant.sequence.as_ref() {
                let ext = format!(".{}", config.sequence_extension);
                let relative = claim(&mut claimed, &round_name, &name, &ext);
                let dest = out_dir.join(&relative);
                let written = write_sequence_file(&name, sequence, &dest).and_then(|_| {
                    if config.verify_copies {
                        file_checksum(&dest).map(Some)
                    } else {
                        Ok(None)
                    }
                });
                match written {
                    Ok(checksum) => {
                        wrote_sequence = true;
                        mutant.files.insert(SEQUENCE_FILE_TAG.to_string(), relative.clone());
                        archived.push(ArchivedFile {
                            round: round_name.clone(),
                            mutant: name.clone(),
                            kind: ArtifactKind::SequenceFile,
                            relative_path: relative,
                            checksum,
                        });
                    }
                    Err(err) => fail(dest, err),
                }
            }

            for (tag, path) in tagged {
                if wrote_sequence && tag == SEQUENCE_FILE_TAG {
                    continue;
                }
                let source = resolve(&path);
                let ext = source
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_default();
                let stem = format!("{}_{}", tag.replace([' ', '/', '\\'], "_"), name);
                let relative = claim(&mut claimed, &round_name, &stem, &ext);
                match copy_verified(&source, &out_dir.join(&relative), config.verify_copies) {
                    Ok(checksum) => {
                        mutant.files.insert(tag.clone(), relative.clone());
                        archived.push(ArchivedFile {
                            round: round_name.clone(),
                            mutant: name.clone(),
                            kind: ArtifactKind::Tagged(tag),
                            relative_path: relative,
                            checksum,
                        });
                    }
                    Err(err) => {
                        let absolute = absolutize(&source);
                        mutant.files.insert(tag, absolute.clone());
                        fail(absolute, err);
                    }
                }
            }
        }
    }

    let state_file = out_dir.join(&config.state_file_name);
    zoo.save(&state_file)?;

    if !failures.is_empty() {
        warn!(
            "Migration into {} finished with {} failure(s)",
            out_dir.display(),
            failures.len()
        );
        return Err(ZooError::Migration {
            failures,
            archived: archived.len(),
        });
    }

    let report = MigrationReport {
        out_dir: out_dir.to_path_buf(),
        state_file,
        archived,
        migrated_at: Utc::now(),
    };
    info!("{}", report.summary());
    Ok(report)
}

/// Reserve `<round>/<stem><ext>` for this run. Tags that sanitize to the same
/// stem get `_2`, `_3`, ... appended so no copy overwrites another.
fn claim(claimed: &mut HashSet<PathBuf>, round: &str, stem: &str, ext: &str) -> PathBuf {
    let mut candidate = PathBuf::from(round).join(format!("{}{}", stem, ext));
    let mut n = 2;
    while !claimed.insert(candidate.clone()) {
        candidate = PathBuf::from(round).join(format!("{}_{}{}", stem, n, ext));
        n += 1;
    }
    candidate
}

/// Point every reference of a mutant at its absolute source
fn pin_to_sources(mutant: &mut Mutant, resolve: &dyn Fn(&Path) -> PathBuf) {
    if let Some(structure) = mutant.structure.take() {
        mutant.structure = Some(absolutize(&resolve(&structure)));
    }
    for path in mutant.files.values_mut() {
        *path = absolutize(&resolve(path.as_path()));
    }
}

/// Copy `source` to `dest` and, when asked, confirm both hash the same.
/// A destination that already is the source is left alone.
fn copy_verified(source: &Path, dest: &Path, verify: bool) -> Result<Option<String>, ZooError> {
    if !source.is_file() {
        return Err(ZooError::NotFound(format!(
            "{} does not exist or is not a file",
            source.display()
        )));
    }
    let same_file = match (source.canonicalize(), dest.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if !same_file {
        std::fs::copy(source, dest)?;
    }
    if !verify {
        return Ok(None);
    }

    let expected = file_checksum(source)?;
    let actual = file_checksum(dest)?;
    if expected != actual {
        let _ = std::fs::remove_file(dest);
        return Err(ZooError::Integrity(format!(
            "Checksum mismatch copying {} (expected {}, got {})",
            source.display(),
            expected,
            actual
        )));
    }
    Ok(Some(actual))
}

/// Hex-encoded sha256 of a file's contents
pub fn file_checksum(path: &Path) -> Result<String, ZooError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Failed items keep pointing outside the bundle, which stays valid only for
/// absolute paths once `relative_paths` is set.
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
