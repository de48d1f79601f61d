use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;
use std::process::{Command, ExitCode};

use s2sql::candidate::QueryFilters;
use s2sql::config::EngineConfig;
use s2sql::dictionary::DictionaryIndex;
use s2sql::plugin::model::load_plugins_from_json;
use s2sql::plugin::PatternRecaller;
use s2sql::schema::SemanticSchema;

fn print_usage() {
    eprintln!(
        "Usage:
  cargo run --bin xtask -- precommit [--locked]
  cargo run --bin xtask -- ci [--locked]
  cargo run --bin xtask -- validate-fixtures <dir>"
    );
}

fn run_cargo(args: &[&str], locked: bool) -> Result<(), String> {
    let mut args: Vec<&str> = args.to_vec();
    if locked {
        let at = args.iter().position(|a| *a == "--").unwrap_or(args.len());
        args.insert(at, "--locked");
    }
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(&args)
        .status()
        .map_err(|error| format!("Failed to run cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("`cargo {}` exited with status {status}", args.join(" ")))
    }
}

fn run_precommit(locked: bool) -> Result<(), String> {
    run_cargo(&["fmt", "--all", "--", "--check"], false)?;
    run_cargo(
        &["clippy", "--all-targets", "--", "-D", "warnings"],
        locked,
    )?;
    run_cargo(&["test", "--lib", "--tests"], locked)
}

fn run_ci(locked: bool) -> Result<(), String> {
    run_precommit(locked)?;
    run_cargo(&["test", "--doc"], locked)?;
    validate_fixtures(Path::new("tests/fixtures"))
}

/// Which loader a fixture file goes through, by file-name prefix.
fn fixture_kind(name: &str) -> Option<&'static str> {
    ["config", "dictionary", "schema", "plugins", "filters"]
        .into_iter()
        .find(|kind| name.starts_with(kind))
}

fn validate_fixture(kind: &str, raw: &str) -> Result<(), String> {
    let outcome = match kind {
        "config" => EngineConfig::load_from_json(raw).map(drop),
        "dictionary" => {
            DictionaryIndex::load_from_json(raw, s2sql::config::DEFAULT_SEARCH_SIZE).map(drop)
        }
        "schema" => SemanticSchema::load_from_json(raw).map(drop),
        "plugins" => load_plugins_from_json(raw)
            .and_then(PatternRecaller::new)
            .map(drop),
        "filters" => serde_json::from_str::<QueryFilters>(raw)
            .map(drop)
            .map_err(s2sql::Error::from),
        _ => return Ok(()),
    };
    outcome.map_err(|e| e.to_string())
}

fn validate_fixtures(dir: &Path) -> Result<(), String> {
    let entries = fs::read_dir(dir)
        .map_err(|error| format!("Failed to read fixture directory {}: {error}", dir.display()))?;

    let mut failures = Vec::new();
    let mut checked = 0usize;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Err(error) = validate_fixtures(&path) {
                failures.push(error);
            }
            continue;
        }
        if !path.extension().is_some_and(|e| e == "json") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(kind) = fixture_kind(name) else {
            eprintln!("skipping {name}: unknown fixture kind");
            continue;
        };
        let raw = fs::read_to_string(&path)
            .map_err(|error| format!("Failed to read {}: {error}", path.display()))?;
        checked += 1;
        if let Err(error) = validate_fixture(kind, &raw) {
            failures.push(format!("{name} ({kind}): {error}"));
        }
    }

    if failures.is_empty() {
        eprintln!("{checked} fixture(s) valid");
        Ok(())
    } else {
        Err(failures.join("\n"))
    }
}

fn parse_flags(rest: &[String], allowed: &[&str]) -> Result<HashSet<String>, ExitCode> {
    let mut flags = HashSet::new();
    for flag in rest {
        if !allowed.contains(&flag.as_str()) {
            eprintln!("Unknown option: {flag}");
            print_usage();
            return Err(ExitCode::from(2));
        }
        flags.insert(flag.clone());
    }
    Ok(flags)
}

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        return ExitCode::from(2);
    };
    let rest: Vec<String> = args.collect();

    let result = match command.as_str() {
        "precommit" | "ci" => {
            let flags = match parse_flags(&rest, &["--locked"]) {
                Ok(flags) => flags,
                Err(code) => return code,
            };
            let locked = flags.contains("--locked");
            if command == "ci" {
                run_ci(locked)
            } else {
                run_precommit(locked)
            }
        }
        "validate-fixtures" => {
            if rest.len() != 1 {
                eprintln!("validate-fixtures requires exactly one directory argument.");
                print_usage();
                return ExitCode::from(2);
            }
            validate_fixtures(Path::new(&rest[0]))
        }
        _ => {
            eprintln!("Unknown command: {command}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(1)
        }
    }
}
