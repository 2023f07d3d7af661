mod diagnostics;
mod program_file;
mod settings;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use inkling::{Runtime, literal};
use program_file::ProgramFile;
use settings::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "inkling")]
#[command(about = "Inkling expression language runtime")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the builtin operators with their precedence
    Catalog {
        /// Print metadata as JSON for an external parser
        #[arg(long)]
        json: bool,
    },
    /// Evaluate an RPN program file
    Run {
        /// Path to a .json program file
        file: PathBuf,
        /// TOML file with a [limits] table
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Parse a value literal and print its canonical form
    Literal {
        /// The literal text
        text: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env().init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Catalog { json } => catalog(json),
        Commands::Run { file, config } => run(&file, config),
        Commands::Literal { text } => normalize(&text),
    }
}

fn catalog(json: bool) -> Result<()> {
    let metadata = Runtime::new().catalog().metadata();
    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }
    for entry in metadata {
        let lazy = if entry.short_circuit { " lazy" } else { "" };
        println!(
            "{:>7}  {:>4}  {:<6} {:<7}{lazy}  {}",
            entry.name,
            entry.precedence,
            format!("{:?}", entry.associativity).to_lowercase(),
            format!("{:?}", entry.arity).to_lowercase(),
            entry.summary,
        );
    }
    Ok(())
}

fn run(file: &Path, config: Option<PathBuf>) -> Result<()> {
    let settings = Settings::load(config.as_deref())?;
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let program = ProgramFile::from_json(&text)
        .and_then(|program| program.compile())
        .with_context(|| format!("loading {}", file.display()))?;
    log::info!("running {}", file.display());

    let runtime = Runtime::with_limits(settings.limits);
    let result = runtime.evaluate(&Arc::new(program));
    if let Some(fault) = result.as_error() {
        bail!("{fault}");
    }
    println!("{result}");
    Ok(())
}

fn normalize(text: &str) -> Result<()> {
    match literal::parse(text) {
        Ok(value) => {
            println!("{value}");
            Ok(())
        }
        Err(errors) => {
            eprint!("{}", diagnostics::report("literal", text, &errors));
            bail!("invalid literal");
        }
    }
}
