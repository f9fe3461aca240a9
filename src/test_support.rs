//! Fixtures shared by the unit tests

use std::path::{Path, PathBuf};

pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mutant-zoo-{}-{}", label, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A fixed-column ATOM record
pub fn atom_line(serial: u32, atom: &str, residue: &str, chain: char, res_seq: i32) -> String {
    format!(
        "ATOM  {:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}",
        serial, atom, residue, chain, res_seq, 0.0, 0.0, 0.0, 1.0, 0.0
    )
}

/// Write a small single-chain structure, one CA atom per residue
pub fn write_structure(path: &Path, residues: &[&str]) {
    let mut lines: Vec<String> = residues
        .iter()
        .enumerate()
        .map(|(i, res)| atom_line(i as u32 + 1, "CA", res, 'A', i as i32 + 1))
        .collect();
    lines.push("END".to_string());
    std::fs::write(path, lines.join("\n")).unwrap();
}

/// Directory holding `a.pdb`, `b.pdb`, `c.pdb`
pub fn structure_batch(label: &str) -> PathBuf {
    let dir = scratch_dir(label);
    write_structure(&dir.join("a.pdb"), &["MET", "ALA"]);
    write_structure(&dir.join("b.pdb"), &["MET", "GLY", "TRP"]);
    write_structure(&dir.join("c.pdb"), &["LYS", "XYZ"]);
    dir
}

/// Recursively copy a directory tree
pub fn copy_tree(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).unwrap();
    for entry in std::fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        let dest = to.join(entry.file_name());
        if path.is_dir() {
            copy_tree(&path, &dest);
        } else {
            std::fs::copy(&path, &dest).unwrap();
        }
    }
}
