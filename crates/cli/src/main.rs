mod args;

use std::process::ExitCode;

use clap::Parser;
use sermap::generator::Generator;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::args::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    run(&args)
}

fn run(args: &Args) -> ExitCode {
    let settings = match args.settings() {
        Ok(settings) => settings,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    info!("Generating map from {}...", settings.csv_path.display());
    match Generator::new(settings).run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
fn args_in(dir: &std::path::Path, csv: &str) -> Args {
    use std::ffi::OsStr;

    let csv = dir.join(csv);
    let output = dir.join("index.html");
    Args::parse_from([
        OsStr::new("sermap"),
        OsStr::new("--csv"),
        csv.as_os_str(),
        OsStr::new("--no-shapefile"),
        OsStr::new("--output"),
        output.as_os_str(),
    ])
}

#[test]
fn missing_csv_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run(&args_in(dir.path(), "missing.csv")), ExitCode::FAILURE);
    assert!(!dir.path().join("index.html").exists());
}

#[test]
fn missing_config_exits_with_failure() {
    let args = Args::parse_from(["sermap", "--config", "/nonexistent/sermap.toml"]);
    assert_eq!(run(&args), ExitCode::FAILURE);
}

#[test]
fn valid_csv_exits_with_success() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("ser.csv"),
        "ID;Color;Res_NumPla;Calle\n1;Azul;12;Calle Mayor\n",
    )
    .unwrap();
    assert_eq!(run(&args_in(dir.path(), "ser.csv")), ExitCode::SUCCESS);
    assert!(dir.path().join("index.html").exists());
}
