//! Zoo configuration
//!
//! Runtime knobs only. None of this is written into the state document, so a
//! bundle saved under one configuration loads under any other.

use crate::error::ZooError;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for intake, persistence and migration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZooConfig {
    /// File name of the state document written by `migrate`
    pub state_file_name: String,
    /// Extensions (without dot, lower-case) recognised as structure files
    pub structure_extensions: Vec<String>,
    /// Extension used for sequence files written during migration
    pub sequence_extension: String,
    /// Re-hash every copied file and compare with its source
    pub verify_copies: bool,
}

impl Default for ZooConfig {
    fn default() -> Self {
        Self {
            state_file_name: "zoo_state.json".to_string(),
            structure_extensions: vec!["pdb".to_string()],
            sequence_extension: "fasta".to_string(),
            verify_copies: true,
        }
    }
}

impl ZooConfig {
    /// Read a JSON config file. Keys left out keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ZooError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        info!("Loaded zoo configuration from {}", path.display());
        Ok(config)
    }

    /// Whether `path` looks like a structure file (extension match ignores case)
    pub fn is_structure_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.structure_extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_extension_ignores_case() {
        let config = ZooConfig::default();
        assert!(config.is_structure_file(Path::new("/data/a.pdb")));
        assert!(config.is_structure_file(Path::new("/data/B.PDB")));
        assert!(config.is_structure_file(Path::new("c.Pdb")));
        assert!(!config.is_structure_file(Path::new("d.cif")));
        assert!(!config.is_structure_file(Path::new("pdb")));
    }

    #[test]
    fn test_load_partial_config_file() {
        let dir = crate::test_support::scratch_dir("config-load");
        let path = dir.join("zoo_config.json");
        std::fs::write(&path, r#"{"structure_extensions": ["pdb", "ent"], "verify_copies": false}"#)
            .unwrap();

        let config = ZooConfig::load(&path).unwrap();
        assert!(config.is_structure_file(Path::new("x.ent")));
        assert!(!config.verify_copies);
        assert_eq!(config.state_file_name, "zoo_state.json");
        assert_eq!(config.sequence_extension, "fasta");

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(ZooConfig::load(&path), Err(ZooError::Serialization(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_extra_extensions() {
        let config = ZooConfig {
            structure_extensions: vec!["pdb".into(), "ent".into()],
            ..ZooConfig::default()
        };
        assert!(config.is_structure_file(Path::new("pdb1abc.ent")));
    }
}
