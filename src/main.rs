//! Pageweave CLI entry point
//!
//! Deliberately thin: it resolves a configuration (either from a YAML file
//! or a bare `--root`), runs one `Loader::load`, and reports diagnostics to
//! stderr. A fuller CLI or build wrapper is someone else's problem.

use clap::Parser;
use pageweave_config::Config;
use pageweave_core::Loader;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "pageweave")]
#[command(author = "Pageweave Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Loads and expands a component-templated page tree", long_about = None)]
struct Args {
    /// Entry file to load, relative to the document root.
    entry: String,

    /// Document root every resolved path is confined to. Ignored if
    /// `--config` is given.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Configuration file path. Overrides `--root` if both are given.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let config = match (&args.config, &args.root) {
        (Some(path), _) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("failed to load configuration: {}", e);
                return ExitCode::FAILURE;
            }
        },
        (None, Some(root)) => Config::for_root(root.clone()),
        (None, None) => Config::for_root(std::env::current_dir().unwrap_or_default()),
    };

    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let root = config.root.clone();
    let loader = Loader::new(config);
    let session = rt.block_on(loader.load(&args.entry));

    for (diagnostic, file) in session.diagnostics.iter().zip(&session.diagnostic_files) {
        eprintln!("{}", pageweave_utils::format_diagnostic(&pageweave_utils::display_path(&root, file), diagnostic));
    }

    if session.tree.is_none() || session.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
