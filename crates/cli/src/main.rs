use std::path::PathBuf;

use clap::Parser;
use miette::{IntoDiagnostic, WrapErr};

/// Infer the type of a JavaScript file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the file to check
    file_path: PathBuf,
}

fn main() -> miette::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let source = std::fs::read_to_string(&args.file_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read {}", args.file_path.display()))?;

    let name = args.file_path.display().to_string();
    match js_check::analyse_source(&source) {
        Ok(ty) => {
            println!("{ty}");
            Ok(())
        }
        Err(err) => Err(err.into_report(name, &source).into()),
    }
}
