//! Lineage — walking parent names back to the founding mutant
//!
//! The walk is bounded by the number of mutants in the zoo: a longer chain
//! must revisit a mutant, so it is reported as a cycle instead of looping.

use super::{Mutant, MutantZoo};
use crate::error::ZooError;
use log::warn;

pub(crate) fn trace(zoo: &MutantZoo, start: &Mutant, strict: bool) -> Result<Vec<String>, ZooError> {
    let bound = zoo.mutant_count();
    let mut chain = vec![start.name().to_string()];
    let mut current = start;

    while let Some(parent_name) = current.parent.as_deref() {
        if chain.len() > bound {
            return Err(ZooError::Integrity(format!(
                "Lineage of '{}' exceeds {} mutants; parent cycle through '{}'",
                start.name(),
                bound,
                parent_name
            )));
        }
        match zoo.get_mutant_by_name(parent_name) {
            Some(parent) => {
                chain.push(parent.name().to_string());
                current = parent;
            }
            None if strict => {
                return Err(ZooError::Integrity(format!(
                    "Mutant '{}' names parent '{}' which is not in the zoo",
                    current.name(),
                    parent_name
                )));
            }
            None => {
                warn!(
                    "Lineage of '{}' stops at '{}': parent '{}' not found",
                    start.name(),
                    current.name(),
                    parent_name
                );
                break;
            }
        }
    }

    chain.reverse();
    Ok(chain)
}

/// Render a lineage as `root --> ... --> leaf`
pub fn format_lineage(chain: &[String]) -> String {
    chain.join(" --> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::structure_batch;
    use crate::zoo::{BatchRequest, RoundRequest};

    fn zoo_with_three() -> (MutantZoo, Vec<String>, std::path::PathBuf) {
        let dir = structure_batch("lineage");
        let mut zoo = MutantZoo::new(Some(42));
        let names = zoo
            .new_design_round(RoundRequest::new("batch1", BatchRequest::pdb_dir(&dir)))
            .unwrap()
            .mutant_names();
        (zoo, names, dir)
    }

    fn set_parent(zoo: &mut MutantZoo, child: &str, parent: &str) {
        zoo.get_mutant_by_name_mut(child).unwrap().parent = Some(parent.to_string());
    }

    #[test]
    fn test_chain_root_first() {
        let (mut zoo, n, dir) = zoo_with_three();
        set_parent(&mut zoo, &n[2], &n[1]);
        set_parent(&mut zoo, &n[1], &n[0]);

        let chain = zoo.trace_lineage(&n[2]).unwrap();
        assert_eq!(chain, vec![n[0].clone(), n[1].clone(), n[2].clone()]);
        assert_eq!(
            format_lineage(&chain),
            format!("{} --> {} --> {}", n[0], n[1], n[2])
        );

        let root = zoo.trace_lineage(&n[0]).unwrap();
        assert_eq!(root, vec![n[0].clone()]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_cycle_is_integrity_error() {
        let (mut zoo, n, dir) = zoo_with_three();
        set_parent(&mut zoo, &n[0], &n[1]);
        set_parent(&mut zoo, &n[1], &n[0]);

        assert!(matches!(zoo.trace_lineage(&n[0]), Err(ZooError::Integrity(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let (mut zoo, n, dir) = zoo_with_three();
        set_parent(&mut zoo, &n[0], &n[0]);
        assert!(matches!(zoo.trace_lineage(&n[0]), Err(ZooError::Integrity(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unresolved_parent_lenient_and_strict() {
        let (mut zoo, n, dir) = zoo_with_three();
        set_parent(&mut zoo, &n[1], &n[0]);
        set_parent(&mut zoo, &n[0], "ghost_name_here");

        let chain = zoo.trace_lineage(&n[1]).unwrap();
        assert_eq!(chain, vec![n[0].clone(), n[1].clone()]);

        let mutant = zoo.get_mutant_by_name(&n[1]).unwrap();
        assert!(matches!(
            mutant.trace_lineage_strict(&zoo),
            Err(ZooError::Integrity(_))
        ));
        assert!(zoo.get_mutant_by_name(&n[0]).unwrap().resolve_parent(&zoo).is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
