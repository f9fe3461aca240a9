//! Zoo state document — JSON persistence
//!
//! The document is a plain tree of records: every round and every mutant is
//! written out in full, and a mutant's parent is just its name. Mutants are
//! keyed by name inside their round, in creation order.
//!
//! Loading is lenient about what older documents leave out (`parent`, `notes`,
//! `files`, `name_cursor`, `created_at`) and strict about identity: a record's
//! name must match its key and no name may appear twice.

pub mod migrate;

pub use migrate::{ArchivedFile, ArtifactKind, MigrationFailure, MigrationReport};

use crate::config::ZooConfig;
use crate::error::ZooError;
use crate::naming::NameAllocator;
use crate::structure::ChainSequences;
use crate::zoo::{DesignRound, InputMode, Mutant, MutantZoo, Notes};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Serialized form of a mutant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutantRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sequence: Option<ChainSequences>,
    #[serde(default)]
    pub structure: Option<PathBuf>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Notes,
    #[serde(default, deserialize_with = "nullable")]
    pub files: BTreeMap<String, PathBuf>,
}

/// Serialized form of a design round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Notes,
    #[serde(default = "default_input_mode")]
    pub input_mode: InputMode,
    #[serde(default)]
    pub input_dir: Option<PathBuf>,
    #[serde(default)]
    pub input_file: Option<PathBuf>,
    #[serde(default, with = "mutant_map")]
    pub mutants: Vec<MutantRecord>,
}

/// The whole zoo as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZooState {
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Notes,
    #[serde(default, alias = "mutant_names")]
    pub allocated_names: Vec<String>,
    pub seed: u64,
    #[serde(default)]
    pub name_cursor: usize,
    #[serde(default)]
    pub relative_paths: bool,
    #[serde(default)]
    pub top_dir: Option<PathBuf>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub design_rounds: Vec<RoundRecord>,
}

fn default_input_mode() -> InputMode {
    InputMode::PdbDir
}

/// `null` reads as the empty value
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ZooState {
    pub fn capture(zoo: &MutantZoo) -> Self {
        Self {
            notes: zoo.notes.clone(),
            allocated_names: zoo.names.allocated().iter().cloned().collect(),
            seed: zoo.names.seed(),
            name_cursor: zoo.names.cursor(),
            relative_paths: zoo.relative_paths,
            top_dir: zoo.top_dir.clone(),
            created_at: Some(zoo.created_at),
            design_rounds: zoo
                .design_rounds
                .iter()
                .map(|round| RoundRecord {
                    name: round.name().to_string(),
                    notes: round.notes.clone(),
                    input_mode: round.input_mode(),
                    input_dir: round.input_dir().map(Path::to_path_buf),
                    input_file: round.input_file().map(Path::to_path_buf),
                    mutants: round.mutants().iter().map(Mutant::to_record).collect(),
                })
                .collect(),
        }
    }

    /// Rebuild a zoo. `doc_path` is where this document was read from; with
    /// `relative_paths` set, every stored path is rebased onto its directory.
    pub fn restore(self, doc_path: &Path, config: ZooConfig) -> Result<MutantZoo, ZooError> {
        let top_dir = if self.relative_paths {
            Some(containing_dir(doc_path))
        } else {
            self.top_dir
        };
        let mut names =
            NameAllocator::restore(self.seed, self.allocated_names, self.name_cursor);

        let mut seen: HashSet<String> = HashSet::new();
        let mut rounds: Vec<DesignRound> = Vec::with_capacity(self.design_rounds.len());
        for round in self.design_rounds {
            if rounds.iter().any(|r| r.name() == round.name) {
                warn!(
                    "Design round '{}' appears more than once; lookups return the first",
                    round.name
                );
            }
            let mut mutants = Vec::with_capacity(round.mutants.len());
            for record in round.mutants {
                if record.name.is_empty() {
                    return Err(ZooError::Integrity(format!(
                        "Round '{}' holds a mutant without a name",
                        round.name
                    )));
                }
                if !seen.insert(record.name.clone()) {
                    return Err(ZooError::Integrity(format!(
                        "Mutant name '{}' appears more than once",
                        record.name
                    )));
                }
                if names.register(&record.name) {
                    warn!(
                        "Mutant '{}' was missing from allocated names; re-registered",
                        record.name
                    );
                }
                let mut mutant = Mutant::from_record(record);
                if let (true, Some(top)) = (self.relative_paths, top_dir.as_deref()) {
                    rebase(&mut mutant, top);
                }
                mutants.push(mutant);
            }
            rounds.push(DesignRound::from_parts(
                round.name,
                round.notes,
                round.input_mode,
                round.input_dir,
                round.input_file,
                mutants,
            ));
        }

        Ok(MutantZoo::assemble(
            names,
            self.notes,
            rounds,
            top_dir,
            false,
            self.created_at.unwrap_or_else(Utc::now),
            config,
        ))
    }
}

/// Join a mutant's structure and tagged files onto `top`
fn rebase(mutant: &mut Mutant, top: &Path) {
    if let Some(structure) = mutant.structure.take() {
        mutant.structure = Some(top.join(structure));
    }
    for path in mutant.files.values_mut() {
        *path = top.join(&*path);
    }
}

fn containing_dir(doc_path: &Path) -> PathBuf {
    match doc_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Write the document to a temporary sibling, then rename it into place
pub fn write_state(state: &ZooState, path: &Path) -> Result<(), ZooError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

pub fn read_state(path: &Path) -> Result<ZooState, ZooError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Mutant records as a JSON object keyed by name, keeping document order
mod mutant_map {
    use super::MutantRecord;
    use serde::de::{self, MapAccess, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(records: &[MutantRecord], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(records.iter().map(|r| (r.name.as_str(), r)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<MutantRecord>, D::Error> {
        struct OrderedRecords;

        impl<'de> Visitor<'de> for OrderedRecords {
            type Value = Vec<MutantRecord>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of mutant name to mutant record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut records = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, mut record)) = map.next_entry::<String, MutantRecord>()? {
                    if record.name.is_empty() {
                        record.name = key;
                    } else if record.name != key {
                        return Err(de::Error::custom(format!(
                            "mutant record '{}' is stored under key '{}'",
                            record.name, key
                        )));
                    }
                    records.push(record);
                }
                Ok(records)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }
        }

        deserializer.deserialize_any(OrderedRecords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{scratch_dir, structure_batch};
    use crate::zoo::{BatchRequest, RoundRequest};
    use serde_json::json;

    fn populated_zoo(dir: &Path) -> MutantZoo {
        let mut zoo = MutantZoo::new(Some(42));
        zoo.add_note("project", "thermostable GFP");
        let founders = zoo
            .new_design_round(
                RoundRequest::new("batch1", BatchRequest::pdb_dir(dir)).with_note("tool", "rfdiffusion"),
            )
            .unwrap()
            .mutant_names();
        zoo.new_design_round(RoundRequest::new(
            "batch2",
            BatchRequest::pdb_dir(dir)
                .with_parent(founders[1].clone())
                .with_note("stage", "mpnn"),
        ))
        .unwrap();
        let m = zoo.get_mutant_by_name_mut(&founders[0]).unwrap();
        m.add_note("tm", 71.5);
        m.add_file("md run", dir.join("a.pdb"));
        zoo
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = structure_batch("state-roundtrip");
        let zoo = populated_zoo(&dir);
        let path = dir.join("state").join("zoo_state.json");
        zoo.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = MutantZoo::load(&path).unwrap();
        assert_eq!(loaded.seed(), zoo.seed());
        assert_eq!(loaded.notes, zoo.notes);
        assert_eq!(loaded.allocated_names(), zoo.allocated_names());
        assert_eq!(loaded.design_rounds(), zoo.design_rounds());
        assert_eq!(loaded.created_at(), zoo.created_at());
        assert!(!loaded.relative_paths());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_allocation_continues_after_reload() {
        let dir = structure_batch("state-continue");
        let mut zoo = populated_zoo(&dir);
        let path = dir.join("zoo_state.json");
        zoo.save(&path).unwrap();

        let mut loaded = MutantZoo::load(&path).unwrap();
        for _ in 0..5 {
            assert_eq!(loaded.allocate_name().unwrap(), zoo.allocate_name().unwrap());
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_document_shape() {
        let dir = structure_batch("state-shape");
        let zoo = populated_zoo(&dir);
        let value = serde_json::to_value(ZooState::capture(&zoo)).unwrap();

        for key in ["notes", "allocated_names", "seed", "relative_paths", "top_dir", "design_rounds"] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(value["seed"], json!(42));
        assert_eq!(value["relative_paths"], json!(false));
        assert_eq!(value["top_dir"], serde_json::Value::Null);

        let round = &value["design_rounds"][1];
        assert_eq!(round["name"], json!("batch2"));
        assert_eq!(round["input_mode"], json!("pdbDir"));
        let batch2 = zoo.get_round_by_name("batch2").unwrap();
        let parent = batch2.mutants()[0].parent.clone().unwrap();
        for m in batch2.mutants() {
            assert_eq!(round["mutants"][m.name()]["parent"], json!(parent));
            assert_eq!(round["mutants"][m.name()]["name"], json!(m.name()));
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_mutant_order_survives_reload() {
        let dir = structure_batch("state-order");
        let zoo = populated_zoo(&dir);
        let path = dir.join("zoo_state.json");
        zoo.save(&path).unwrap();
        let loaded = MutantZoo::load(&path).unwrap();
        for (a, b) in zoo.design_rounds().iter().zip(loaded.design_rounds()) {
            assert_eq!(a.mutant_names(), b.mutant_names());
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_loads_older_documents() {
        let dir = scratch_dir("state-legacy");
        let path = dir.join("zoo.json");
        // Raw text: the mutant order on disk is deliberately not alphabetical
        let doc = r#"{
            "notes": null,
            "mutant_names": ["red_cube_fox", "blue_star_cat"],
            "seed": 17,
            "relative_paths": false,
            "top_dir": null,
            "design_rounds": [{
                "name": "round1",
                "notes": {},
                "input_mode": "pdbDir",
                "input_dir": "/data/round1",
                "input_file": null,
                "mutants": {
                    "red_cube_fox": {
                        "name": "red_cube_fox",
                        "sequence": {"A": "MKV"},
                        "structure": "/data/round1/a.pdb"
                    },
                    "blue_star_cat": {
                        "sequence": null,
                        "structure": null,
                        "parent": "red_cube_fox",
                        "notes": null
                    }
                }
            }]
        }"#;
        std::fs::write(&path, doc).unwrap();

        let zoo = MutantZoo::load(&path).unwrap();
        assert_eq!(zoo.seed(), 17);
        assert!(zoo.notes.is_empty());
        let round = zoo.get_round_by_name("round1").unwrap();
        assert_eq!(round.mutant_names(), vec!["red_cube_fox", "blue_star_cat"]);
        let first = round.get_mutant("red_cube_fox").unwrap();
        assert!(first.parent.is_none());
        assert!(first.notes.is_empty() && first.files.is_empty());
        let second = round.get_mutant("blue_star_cat").unwrap();
        assert_eq!(second.parent.as_deref(), Some("red_cube_fox"));
        assert_eq!(
            zoo.trace_lineage("blue_star_cat").unwrap(),
            vec!["red_cube_fox", "blue_star_cat"]
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_reregisters_names_missing_from_ledger() {
        let dir = scratch_dir("state-ledger");
        let path = dir.join("zoo.json");
        let doc = json!({
            "allocated_names": [],
            "seed": 3,
            "design_rounds": [{
                "name": "r",
                "mutants": {"gold_oval_bear": {"name": "gold_oval_bear"}}
            }]
        });
        std::fs::write(&path, doc.to_string()).unwrap();
        let mut zoo = MutantZoo::load(&path).unwrap();
        assert!(zoo.allocated_names().contains("gold_oval_bear"));
        for _ in 0..50 {
            assert_ne!(zoo.allocate_name().unwrap(), "gold_oval_bear");
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rejects_bad_identity() {
        let dir = scratch_dir("state-identity");
        let mismatched = dir.join("mismatch.json");
        std::fs::write(
            &mismatched,
            json!({
                "seed": 1,
                "design_rounds": [{"name": "r", "mutants": {"red_cube_fox": {"name": "blue_star_cat"}}}]
            })
            .to_string(),
        )
        .unwrap();
        assert!(matches!(
            MutantZoo::load(&mismatched),
            Err(ZooError::Serialization(_))
        ));

        let duplicated = dir.join("dupe.json");
        std::fs::write(
            &duplicated,
            json!({
                "seed": 1,
                "design_rounds": [
                    {"name": "r1", "mutants": {"red_cube_fox": {}}},
                    {"name": "r2", "mutants": {"red_cube_fox": {}}}
                ]
            })
            .to_string(),
        )
        .unwrap();
        assert!(matches!(
            MutantZoo::load(&duplicated),
            Err(ZooError::Integrity(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_relative_paths_rebased_on_load() {
        let dir = scratch_dir("state-relative");
        let path = dir.join("zoo_state.json");
        let doc = json!({
            "seed": 5,
            "relative_paths": true,
            "top_dir": "/somewhere/else",
            "design_rounds": [{
                "name": "r",
                "mutants": {
                    "red_cube_fox": {
                        "structure": "r/red_cube_fox.pdb",
                        "files": {"md run": "r/md_run_red_cube_fox.xtc"}
                    }
                }
            }]
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let zoo = MutantZoo::load(&path).unwrap();
        assert!(!zoo.relative_paths());
        assert_eq!(zoo.top_dir(), Some(dir.as_path()));
        let m = zoo.get_mutant_by_name("red_cube_fox").unwrap();
        assert_eq!(m.structure.as_deref(), Some(dir.join("r/red_cube_fox.pdb").as_path()));
        assert_eq!(m.files["md run"], dir.join("r/md_run_red_cube_fox.xtc"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_containing_dir_of_bare_file_name() {
        assert_eq!(containing_dir(Path::new("zoo_state.json")), PathBuf::from("."));
        assert_eq!(containing_dir(Path::new("/a/b/zoo.json")), PathBuf::from("/a/b"));
    }
}
