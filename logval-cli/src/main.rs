//! logval CLI - inspect and generate `#[log_value]` provider tables.
//!
//! Features:
//! - Automatic crate root detection
//! - Plain text or JSON reports of the resolved tables
//! - Optional artifact generation outside a build script
//! - `--strict` exit code for CI

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use logval_build::{init_structured_logging, print_json, print_plain, CfgContext, Logval};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect #[log_value] provider tables")]
pub struct Cli {
    /// Path to the crate (or any directory inside it)
    #[arg(default_value = ".")]
    path: String,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Directory names to skip while scanning
    #[arg(long, num_args = 1..)]
    exclude: Vec<String>,

    /// Write the generated provider file into this directory
    #[arg(long, value_name = "DIR")]
    out: Option<String>,

    /// Artifact file name (overrides logval.toml)
    #[arg(long, value_name = "FILE")]
    file: Option<String>,

    /// Ignore logval.toml
    #[arg(long)]
    no_config: bool,

    /// Evaluate `cfg(feature = "..")` with exactly these features enabled;
    /// without it feature-gated providers are reported
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    features: Option<Vec<String>>,

    /// Exit with code 1 when any diagnostic is reported
    #[arg(long)]
    strict: bool,
}

/// Finds the nearest directory holding both `Cargo.toml` and `src/`,
/// starting at `path` and walking up.
fn find_crate_root(path: &Path) -> Option<PathBuf> {
    let canonical = path.canonicalize().ok()?;
    let mut current = Some(canonical.as_path());
    while let Some(dir) = current {
        if dir.join("Cargo.toml").is_file() && dir.join("src").is_dir() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] logval internal error: {}", info);
    }));

    init_structured_logging();

    let cli = Cli::parse();

    let root = find_crate_root(Path::new(&cli.path))
        .ok_or_else(|| anyhow!("no crate (Cargo.toml with src/) at or above {}", cli.path))?;

    let mut logval = Logval::new(&root)
        .exclude_dirs(cli.exclude.iter().cloned())
        .with_config(!cli.no_config);
    if let Some(file) = &cli.file {
        logval = logval.output_file(file.clone());
    }
    if let Some(features) = &cli.features {
        logval = logval.cfg_context(CfgContext::with_features(features));
    }

    let discovery = match &cli.out {
        Some(out) => {
            let generation = logval
                .generate(Path::new(out))
                .with_context(|| format!("Failed to generate providers for {}", root.display()))?;
            if !cli.json {
                let state = if generation.written { "written" } else { "unchanged" };
                println!("{} ({})", generation.artifact.display(), state);
            }
            generation.discovery
        }
        None => logval
            .discover()
            .with_context(|| format!("Failed to discover providers in {}", root.display()))?,
    };

    if cli.json {
        print_json(&discovery);
    } else {
        print_plain(&discovery);
    }

    if cli.strict && !discovery.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}
