//! FastA reading and writing
//!
//! Writing follows the zoo's convention of one header per mutant followed by
//! one body line per chain, in chain order.

use super::ChainSequences;
use crate::error::ZooError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A header and a raw (unwrapped) sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub header: String,
    pub sequence: String,
}

/// Read every record of a FastA file; sequence lines are concatenated.
pub fn read_fasta_file<P: AsRef<Path>>(path: P) -> Result<Vec<SeqRecord>, ZooError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut result: Vec<SeqRecord> = Vec::new();

    for line in BufReader::new(file).lines() {
        let l = line?;
        let l = l.trim_end();
        if l.is_empty() {
            continue;
        }
        if let Some(hdr) = l.strip_prefix('>') {
            result.push(SeqRecord {
                header: hdr.trim().to_string(),
                sequence: String::new(),
            });
        } else {
            match result.last_mut() {
                Some(record) => record.sequence.push_str(l.trim()),
                None => {
                    return Err(ZooError::Configuration(format!(
                        "{}: sequence data before first '>' header",
                        path.display()
                    )))
                }
            }
        }
    }
    Ok(result)
}

/// Append one mutant's record to an open writer
pub fn write_record<W: Write>(
    out: &mut W,
    name: &str,
    sequences: &ChainSequences,
) -> std::io::Result<()> {
    writeln!(out, ">{}", name)?;
    for seq in sequences.values() {
        writeln!(out, "{}", seq)?;
    }
    Ok(())
}

/// Write a single-record sequence file for one mutant
pub fn write_sequence_file<P: AsRef<Path>>(
    name: &str,
    sequences: &ChainSequences,
    out_path: P,
) -> Result<(), ZooError> {
    let mut out = BufWriter::new(File::create(out_path)?);
    write_record(&mut out, name, sequences)?;
    out.flush()?;
    Ok(())
}
