//! PDB reader — best-effort chain sequences from coordinate records
//!
//! Only the first model is read. Residues are taken in file order; a new
//! residue starts whenever the residue number or insertion code changes within
//! a chain. Unknown residue names are kept as `_XXX_` instead of failing.

use super::{ChainSequences, StructureReader};
use crate::error::ZooError;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const WATER: [&str; 3] = ["HOH", "WAT", "DOD"];

/// Reads fixed-column PDB files
#[derive(Debug, Clone, Copy, Default)]
pub struct PdbReader;

impl PdbReader {
    pub fn new() -> Self {
        Self
    }
}

/// One-letter code for a standard amino acid
pub fn three_to_one(residue: &str) -> Option<char> {
    let code = match residue {
        "ALA" => 'A',
        "ARG" => 'R',
        "ASN" => 'N',
        "ASP" => 'D',
        "CYS" => 'C',
        "GLN" => 'Q',
        "GLU" => 'E',
        "GLY" => 'G',
        "HIS" => 'H',
        "ILE" => 'I',
        "LEU" => 'L',
        "LYS" => 'K',
        "MET" => 'M',
        "PHE" => 'F',
        "PRO" => 'P',
        "SER" => 'S',
        "THR" => 'T',
        "TRP" => 'W',
        "TYR" => 'Y',
        "VAL" => 'V',
        _ => return None,
    };
    Some(code)
}

#[derive(Default)]
struct ChainBuilder {
    sequence: String,
    last_residue: Option<String>,
}

impl StructureReader for PdbReader {
    fn sequence_from_structure(&self, path: &Path) -> Result<ChainSequences, ZooError> {
        let file = File::open(path)?;
        let mut chains: BTreeMap<String, ChainBuilder> = BTreeMap::new();

        let mut reader = BufReader::new(file);
        let mut buf: Vec<u8> = Vec::new();

        // Lines are decoded lossily: stray Latin-1 bytes in REMARK records are common
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let decoded = String::from_utf8_lossy(&buf);
            let l = decoded.trim_end_matches(['\n', '\r']);
            if l.starts_with("ENDMDL") {
                break;
            }
            if !(l.starts_with("ATOM") || l.starts_with("HETATM")) {
                continue;
            }
            let (Some(res_name), Some(chain), Some(res_seq)) =
                (l.get(17..20), l.get(21..22), l.get(22..26))
            else {
                continue;
            };
            let res_name = res_name.trim();
            if res_name.is_empty() || WATER.contains(&res_name) {
                continue;
            }
            let chain = match chain.trim() {
                "" => "_".to_string(),
                c => c.to_string(),
            };
            let insertion = l.get(26..27).unwrap_or(" ");
            let residue_key = format!("{}{}", res_seq.trim(), insertion.trim());

            let builder = chains.entry(chain).or_default();
            if builder.last_residue.as_deref() == Some(residue_key.as_str()) {
                continue;
            }
            builder.last_residue = Some(residue_key);
            match three_to_one(res_name) {
                Some(code) => builder.sequence.push(code),
                None => {
                    builder.sequence.push('_');
                    builder.sequence.push_str(res_name);
                    builder.sequence.push('_');
                }
            }
        }

        Ok(chains
            .into_iter()
            .map(|(chain, builder)| (chain, builder.sequence))
            .collect())
    }
}
