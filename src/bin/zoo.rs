//! Zoo CLI — name, track and archive protein design rounds
//!
//! Commands:
//!   zoo init     — start a new zoo state file
//!   zoo round    — open a design round from a structure dir or FastA file
//!   zoo add      — add another batch to an existing round
//!   zoo list     — list rounds and mutants
//!   zoo lineage  — print a mutant's ancestry
//!   zoo note     — attach a note to a mutant, a round or the zoo
//!   zoo fasta    — write a round's sequences to one FastA file
//!   zoo migrate  — copy everything into a relocatable bundle

use mutant_zoo::zoo::format_lineage;
use mutant_zoo::{BatchRequest, MutantZoo, RoundRequest, ZooConfig, ZooError};
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_STATE_FILE: &str = "zoo_state.json";

fn print_usage() {
    println!(
        r#"
Mutant Zoo — permanent names and lineage for protein design rounds

Usage: zoo <command> [options]

The state file is ./zoo_state.json unless ZOO_STATE points elsewhere.
ZOO_CONFIG may name a JSON file overriding the default configuration.

Commands:
  init     [seed]                        Create an empty zoo
  round    <name> <input> [parent]       New round from a structure dir or FastA file
  add      <round> <input> [parent]      Add a batch to an existing round
  list     [round]                       List rounds and mutants
  lineage  <mutant>                      Show ancestry, root first
  note     <target> <key> <value>        Note on a mutant, a round, or "zoo"
  fasta    <round> <out.fasta>           Export a round's sequences
  migrate  <out-dir>                     Copy all files into a relocatable bundle

Examples:
  zoo init 42
  zoo round batch1 ./rfdiffusion_out
  zoo round batch2 ./mpnn/seqs.fasta red_cube_fox
  zoo note red_cube_fox tm 71.5
  zoo lineage blue_star_cat
  zoo migrate ./archive
"#
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "init" => cmd_init(&args[2..]),
        "round" => cmd_round(&args[2..]),
        "add" => cmd_add(&args[2..]),
        "list" => cmd_list(&args[2..]),
        "lineage" => cmd_lineage(&args[2..]),
        "note" => cmd_note(&args[2..]),
        "fasta" => cmd_fasta(&args[2..]),
        "migrate" => cmd_migrate(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("  Error: {}", e);
        std::process::exit(1);
    }
}

fn state_file() -> PathBuf {
    env::var_os("ZOO_STATE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
}

fn zoo_config() -> Result<ZooConfig, ZooError> {
    match env::var_os("ZOO_CONFIG") {
        Some(path) => ZooConfig::load(PathBuf::from(path)),
        None => Ok(ZooConfig::default()),
    }
}

fn load_zoo() -> Result<MutantZoo, ZooError> {
    let path = state_file();
    let zoo = MutantZoo::load_with_config(&path, zoo_config()?)?;
    println!(
        "  Loaded {} round(s), {} mutant(s) from {}",
        zoo.design_rounds().len(),
        zoo.mutant_count(),
        path.display()
    );
    Ok(zoo)
}

fn save_zoo(zoo: &MutantZoo) -> Result<(), ZooError> {
    let path = state_file();
    zoo.save(&path)?;
    println!("  Saved to {}", path.display());
    Ok(())
}

/// A directory is a structure batch, anything else is read as FastA
fn batch_for(input: &str, parent: Option<&String>) -> BatchRequest {
    let path = Path::new(input);
    let batch = if path.is_dir() {
        BatchRequest::pdb_dir(path)
    } else {
        BatchRequest::fasta_file(path)
    };
    match parent {
        Some(p) => batch.with_parent(p.clone()),
        None => batch,
    }
}

fn usage_error(usage: &str) -> Result<(), ZooError> {
    Err(ZooError::Configuration(format!("Usage: {}", usage)))
}

fn cmd_init(args: &[String]) -> Result<(), ZooError> {
    let path = state_file();
    if path.exists() {
        return Err(ZooError::Configuration(format!(
            "{} already exists",
            path.display()
        )));
    }
    let seed = match args.first() {
        Some(s) => Some(s.parse::<u64>().map_err(|_| {
            ZooError::Configuration(format!("seed must be a non-negative integer, got '{}'", s))
        })?),
        None => None,
    };
    let zoo = MutantZoo::new(seed).with_config(zoo_config()?);
    println!("\n  {}", zoo.summary());
    save_zoo(&zoo)
}

fn cmd_round(args: &[String]) -> Result<(), ZooError> {
    if args.len() < 2 {
        return usage_error("zoo round <name> <input> [parent]");
    }
    let mut zoo = load_zoo()?;
    let round = zoo.new_design_round(RoundRequest::new(
        args[0].clone(),
        batch_for(&args[1], args.get(2)),
    ))?;
    println!("\n  Round '{}' ({} mutants):", round.name(), round.len());
    for mutant in round.mutants() {
        println!("    {}", mutant.summary());
    }
    save_zoo(&zoo)
}

fn cmd_add(args: &[String]) -> Result<(), ZooError> {
    if args.len() < 2 {
        return usage_error("zoo add <round> <input> [parent]");
    }
    let mut zoo = load_zoo()?;
    let added = zoo.add_mutants(&args[0], batch_for(&args[1], args.get(2)))?;
    println!("\n  Added {} mutant(s) to '{}':", added.len(), args[0]);
    for name in &added {
        println!("    {}", name);
    }
    save_zoo(&zoo)
}

fn cmd_list(args: &[String]) -> Result<(), ZooError> {
    let zoo = load_zoo()?;
    let rounds: Vec<_> = match args.first() {
        Some(name) => vec![zoo.get_round_by_name(name)?],
        None => zoo.design_rounds().iter().collect(),
    };
    if rounds.is_empty() {
        println!("\n  No design rounds. Use 'zoo round' to get started.");
        return Ok(());
    }
    println!("\n  {}", zoo.summary());
    for round in rounds {
        println!("\n  Round '{}' [{}] ({} mutants)", round.name(), round.input_mode(), round.len());
        println!("  {}", "-".repeat(72));
        for mutant in round.mutants() {
            println!("  {}", mutant.summary());
        }
    }
    Ok(())
}

fn cmd_lineage(args: &[String]) -> Result<(), ZooError> {
    let Some(name) = args.first() else {
        return usage_error("zoo lineage <mutant>");
    };
    let zoo = load_zoo()?;
    let chain = zoo.trace_lineage(name)?;
    println!("\n  {}", format_lineage(&chain));
    Ok(())
}

fn cmd_note(args: &[String]) -> Result<(), ZooError> {
    if args.len() < 3 {
        return usage_error("zoo note <mutant|round|zoo> <key> <value>");
    }
    let (target, key) = (&args[0], args[1].clone());
    // Numbers, booleans and JSON literals keep their type; anything else is a string
    let value = serde_json::from_str(&args[2])
        .unwrap_or_else(|_| serde_json::Value::String(args[2].clone()));

    let mut zoo = load_zoo()?;
    if target == "zoo" {
        zoo.add_note(key, value);
    } else if let Some(mutant) = zoo.get_mutant_by_name_mut(target) {
        mutant.add_note(key, value);
    } else {
        zoo.get_round_by_name_mut(target)
            .map_err(|_| {
                ZooError::NotFound(format!("No mutant or round named '{}'", target))
            })?
            .add_note(key, value);
    }
    println!("\n  Noted {}.{}", target, args[1]);
    save_zoo(&zoo)
}

fn cmd_fasta(args: &[String]) -> Result<(), ZooError> {
    if args.len() < 2 {
        return usage_error("zoo fasta <round> <out.fasta>");
    }
    let zoo = load_zoo()?;
    let written = zoo.get_round_by_name(&args[0])?.write_fasta(&args[1])?;
    println!("\n  Wrote {} record(s) to {}", written, args[1]);
    Ok(())
}

fn cmd_migrate(args: &[String]) -> Result<(), ZooError> {
    let Some(out_dir) = args.first() else {
        return usage_error("zoo migrate <out-dir>");
    };
    let mut zoo = load_zoo()?;
    let report = zoo.migrate(out_dir)?;
    println!("\n  {}", report.summary());
    println!("  Load it from anywhere with ZOO_STATE={}", report.state_file.display());
    Ok(())
}
