use std::{
    fs,
    io::{self, Read, Write},
    process::ExitCode,
};

use clap::Parser;
use log::error;

use jsonpath_plus::{errors::JSONPathError, Config, JSONPathEngine};

/// Evaluate a JSONPath-Plus path against a JSON document
#[derive(Parser)]
#[command(name = "jsonpath-plus")]
#[command(version)]
#[command(about = "Evaluate a JSONPath-Plus path against a JSON document", long_about = None)]
struct Cli {
    /// The path to evaluate, like `$.store.book[?(@.price < 10)]`
    path: String,

    /// JSON file to read (omit to read from stdin)
    file: Option<String>,

    /// Include the byte span of each match in the document
    #[arg(short, long)]
    positions: bool,

    /// Use the production limits
    #[arg(long, conflicts_with = "config")]
    production: bool,

    /// Read limits from a JSON config file
    #[arg(short, long)]
    config: Option<String>,
}

fn load_config(cli: &Cli) -> Result<Config, JSONPathError> {
    if cli.production {
        return Ok(Config::production());
    }

    match &cli.config {
        Some(file) => {
            let text = fs::read_to_string(file)
                .map_err(|err| JSONPathError::config(format!("{}: {}", file, err)))?;
            Config::from_json(&text)
        }
        None => Ok(Config::default()),
    }
}

fn read_document(file: Option<&str>) -> io::Result<String> {
    match file {
        Some(file) => fs::read_to_string(file),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let engine = JSONPathEngine::new(load_config(cli)?)?;
    let text = read_document(cli.file.as_deref())?;
    let mut matches = engine.query(&cli.path, &text)?;

    if !cli.positions {
        for m in matches.iter_mut() {
            m.position = None;
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for m in &matches {
        serde_json::to_writer(&mut out, m)?;
        out.write_all(b"\n")?;
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("jsonpath-plus: {}", err);
            ExitCode::FAILURE
        }
    }
}
