//! The launcher collaborator (spec §6.3): reads a serialized semantic
//! target off disk, invokes the back-end, and reports any Diagnostic. This
//! binary is a thin, real consumer of the library — it is not the subject
//! of this repository; the loader/lexer/parser/checker it stands in for
//! are out-of-scope collaborators (spec §1).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mlogc::semantic::Target;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a JSON-serialized semantic target.
    input: PathBuf,

    /// Directory the `.mlog` artifact is written into.
    #[arg(long, default_value = ".")]
    artifacts_dir: PathBuf,

    /// Overrides the target name used for the output file stem.
    #[arg(long)]
    target: Option<String>,

    /// Raises log verbosity (`-v`, `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    let contents = match std::fs::read_to_string(&args.input) {
        Ok(contents) => contents,
        Err(err) => {
            eprintln!("error: could not read {}: {err}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let target: Target = match serde_json::from_str(&contents) {
        Ok(target) => target,
        Err(err) => {
            eprintln!("error: could not parse {}: {err}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let subject = args.target.as_deref().unwrap_or(target.name.as_str());

    match mlogc::build(subject, &args.artifacts_dir, &target) {
        Ok(path) => {
            println!("wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(diagnostic) => {
            eprintln!("error: {diagnostic}");
            ExitCode::FAILURE
        }
    }
}
