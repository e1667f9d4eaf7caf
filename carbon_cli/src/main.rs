//! # Carbon Intelligence CLI
//!
//! Runs a project file through the carbon pipeline and prints a summary.
//!
//! ```text
//! carbon_cli <project.json> [--config carbon.toml] [--materials materials.json]
//!            [--output result.json] [--json]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `carbon_core=info,warn`).

use std::path::PathBuf;
use std::process::ExitCode;

use carbon_core::config::CarbonConfig;
use carbon_core::engine::CarbonIntelligenceCore;
use carbon_core::errors::{CarbonError, CarbonResult};
use carbon_core::file_io::{load_project, save_result};
use carbon_core::materials::MaterialsDatabase;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: carbon_cli <project.json> [--config FILE] [--materials FILE] [--output FILE] [--json]";

#[derive(Debug, Default)]
struct Args {
    project: PathBuf,
    config: Option<PathBuf>,
    materials: Option<PathBuf>,
    output: Option<PathBuf>,
    print_json: bool,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    let mut project = None;

    while let Some(arg) = raw.next() {
        let mut value = |flag: &str| raw.next().map(PathBuf::from).ok_or_else(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "--config" => args.config = Some(value("--config")?),
            "--materials" => args.materials = Some(value("--materials")?),
            "--output" | "-o" => args.output = Some(value("--output")?),
            "--json" => args.print_json = true,
            "--help" | "-h" => return Err(USAGE.to_string()),
            flag if flag.starts_with('-') => return Err(format!("unknown option {}\n{}", flag, USAGE)),
            path => {
                if project.replace(PathBuf::from(path)).is_some() {
                    return Err(format!("only one project file is accepted\n{}", USAGE));
                }
            }
        }
    }

    args.project = project.ok_or_else(|| USAGE.to_string())?;
    Ok(args)
}

async fn run(args: Args) -> CarbonResult<()> {
    let config = match &args.config {
        Some(path) => CarbonConfig::load(path)?,
        None => CarbonConfig::default(),
    };
    let database = match &args.materials {
        Some(path) => MaterialsDatabase::load_with_builtin(path)?,
        None => MaterialsDatabase::builtin(),
    };
    tracing::info!(materials = database.len(), batch_size = config.batch_size, "engine configured");

    let core = CarbonIntelligenceCore::from_config(config, database)?;
    let project = load_project(&args.project)?;
    tracing::info!(project = %project.id, name = %project.name, "project loaded");

    let result = core.calculate_project(&project).await?;

    print!("{}", result.summary());
    if args.print_json {
        let json = serde_json::to_string_pretty(&result).map_err(|e| CarbonError::SerializationError {
            reason: e.to_string(),
        })?;
        println!("{}", json);
    }

    if let Some(path) = &args.output {
        save_result(&result, path)?;
        tracing::info!(path = %path.display(), "result written");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "carbon_core=info,warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(code = err.error_code(), "{}", err);
            eprintln!("error [{}]: {}", err.error_code(), err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_full() {
        let args = parse(&["tower.json", "--config", "c.toml", "--materials", "m.json", "-o", "out.json", "--json"]).unwrap();
        assert_eq!(args.project, PathBuf::from("tower.json"));
        assert_eq!(args.config, Some(PathBuf::from("c.toml")));
        assert_eq!(args.materials, Some(PathBuf::from("m.json")));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
        assert!(args.print_json);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["a.json", "b.json"]).is_err());
        assert!(parse(&["a.json", "--config"]).is_err());
        assert!(parse(&["a.json", "--verbose"]).is_err());
    }
}
