//! tupleflow: inspecciona, valida y evalúa pipelines descritos en JSON.
//!
//! ```text
//! tupleflow signature pipeline.json
//! tupleflow validate pipeline.json --classes Long,Long
//! tupleflow eval pipeline.json --input '{"a": 1}' [--state '{"a": 0}']
//! tupleflow fingerprint pipeline.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde_json::Value as Json;
use tuple_core::config::init_dotenv;
use tuple_core::{AnyUnit, Direction, UnitSpec, Value, ValueType};
use tuple_ops::builtin_registry;

#[derive(Parser, Debug)]
#[command(name = "tupleflow", version, about = "Inspect and run tuple pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the kind and the input/output signatures of a unit.
    Signature { file: PathBuf },

    /// Check candidate argument classes against a unit's signature.
    Validate {
        file: PathBuf,
        /// Comma separated classes, e.g. `Long,Long`.
        #[arg(long, value_delimiter = ',')]
        classes: Vec<String>,
        /// Validate the output side instead of the input.
        #[arg(long)]
        output: bool,
    },

    /// Evaluate a unit on JSON values.
    Eval {
        file: PathBuf,
        /// Input value (JSON).
        #[arg(long)]
        input: String,
        /// Fold state for binary operators, first argument for bi-functions.
        #[arg(long)]
        state: Option<String>,
    },

    /// Print the blake3 fingerprint of the canonical spec.
    Fingerprint { file: PathBuf },
}

fn load_spec(path: &Path) -> Result<UnitSpec> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let json: Json = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(UnitSpec::decode(&json)?)
}

fn load_unit(path: &Path) -> Result<AnyUnit> {
    let spec = load_spec(path)?;
    debug!("building {} from {}", spec.class, path.display());
    Ok(builtin_registry().build(&spec)?)
}

fn parse_value(raw: &str) -> Result<Value> {
    let json: Json = serde_json::from_str(raw).with_context(|| format!("invalid JSON value: {raw}"))?;
    Ok(Value::from_json(&json))
}

fn signature(path: &Path) -> Result<()> {
    let unit = load_unit(path)?;
    println!("kind:   {}", unit.kind());
    println!("input:  {}", unit.input_signature()?);
    println!("output: {}", unit.output_signature()?);
    Ok(())
}

fn validate(path: &Path, classes: &[String], output: bool) -> Result<bool> {
    let unit = load_unit(path)?;
    let candidates = classes.iter()
                            .filter(|c| !c.trim().is_empty())
                            .map(|c| c.parse::<ValueType>().map_err(anyhow::Error::msg))
                            .collect::<Result<Vec<_>>>()?;
    let (direction, sig) = if output {
        (Direction::Output, unit.output_signature()?)
    } else {
        (Direction::Input, unit.input_signature()?)
    };
    let result = sig.assignable(&candidates);
    info!("{:?} signature {} checked against {:?}", direction, sig, candidates);
    if result.is_valid() {
        println!("valid");
    } else {
        for e in result.errors() {
            println!("{e}");
        }
    }
    Ok(result.is_valid())
}

fn eval(path: &Path, input: &str, state: Option<&str>) -> Result<()> {
    let unit = load_unit(path)?;
    let input = parse_value(input)?;
    let out = match unit {
        AnyUnit::Predicate(p) => Value::Bool(p.test(&input)?),
        AnyUnit::Function(f) => f.apply(input)?,
        AnyUnit::BinaryOperator(op) => {
            let Some(state) = state else {
                bail!("binary operators need --state");
            };
            op.apply(parse_value(state)?, input)?
        }
        AnyUnit::BiFunction(b) => {
            let Some(first) = state else {
                bail!("bi-functions need --state as their first argument");
            };
            b.apply(parse_value(first)?, input)?
        }
    };
    println!("{}", out.to_json());
    Ok(())
}

fn fingerprint(path: &Path) -> Result<()> {
    let spec = load_spec(path)?;
    // reconstruir y re-describir normaliza tags cortos y campos por defecto
    let unit = builtin_registry().build(&spec)?;
    println!("{}", unit.to_spec()?.fingerprint());
    Ok(())
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::Signature { file } => signature(&file).map(|_| true),
        Command::Validate { file, classes, output } => validate(&file, &classes, output),
        Command::Eval { file, input, state } => eval(&file, &input, state.as_deref()).map(|_| true),
        Command::Fingerprint { file } => fingerprint(&file).map(|_| true),
    }
}

fn main() -> ExitCode {
    init_dotenv();
    env_logger::init();
    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
