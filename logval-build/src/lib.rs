//! logval-build: build-time discovery of `#[log_value]` providers.
//!
//! Scans a crate's sources, validates every function annotated with
//! `#[log_value(...)]`, resolves conflicts by priority and writes a Rust
//! source file defining `GeneratedProviders`, the crate's
//! [`ProviderSource`](logval_core::ProviderSource).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! // build.rs
//! fn main() {
//!     if let Err(e) = logval_build::generate() {
//!         panic!("logval: {e}");
//!     }
//! }
//! ```
//!
//! ```rust,ignore
//! // src/main.rs
//! logval_core::include_providers!();
//! ```
//!
//! Rejected providers and priority ties never fail the build; they are
//! reported as [`Diagnostic`]s (cargo warnings under `generate`).
//!
//! # Module Organization
//!
//! - [`scan`]: Parallel file discovery and module paths
//! - [`attr`]: `#[log_value]` argument parsing
//! - [`cfg`]: `#[cfg(...)]` evaluation against the build's features
//! - [`extract`]: Provider extraction and shape validation
//! - [`discover`]: Reachability checks and priority resolution
//! - [`synth`]: Artifact rendering and atomic writes
//! - [`builder`]: Fluent builder API
//! - [`config`]: logval.toml
//! - [`error`]: Typed error handling

pub mod attr;
pub mod builder;
pub mod cfg;
pub mod config;
pub mod discover;
pub mod error;
pub mod extract;
pub mod logging;
pub mod report;
pub mod scan;
pub mod synth;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

pub use builder::{Generation, Logval};
pub use cfg::{CfgContext, CfgState};
pub use config::{load_config, LogvalConfig, CONFIG_FILE, DEFAULT_OUTPUT_FILE};
pub use discover::{discover, Discovery, ResolvedEntry};
pub use error::{IoResultExt, LogvalError, LogvalResult};
pub use extract::{DiscoveredProvider, InputShape, Rejection, ViewKind};
pub use logging::init_structured_logging;
pub use report::{print_json, print_plain};

/// A non-fatal problem found during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: Option<usize>,
    /// Provider path, when the problem concerns one.
    pub provider: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn from_error(err: &LogvalError) -> Self {
        let (file, line, message) = match err {
            LogvalError::Parse {
                path,
                message,
                line,
                ..
            } => (path.clone(), *line, format!("skipped, failed to parse: {message}")),
            other => (
                other.path().cloned().unwrap_or_default(),
                None,
                other.to_string(),
            ),
        };
        Self {
            file,
            line,
            provider: None,
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        if let Some(provider) = &self.provider {
            write!(f, ": {provider}")?;
        }
        write!(f, ": {}", self.message)
    }
}

fn env_dir(name: &str) -> LogvalResult<PathBuf> {
    std::env::var_os(name)
        .map(PathBuf::from)
        .ok_or_else(|| LogvalError::invalid_argument(format!("{name} is not set; call generate() from build.rs")))
}

/// Entry point for `build.rs`.
///
/// Discovers providers of the crate being built (`CARGO_MANIFEST_DIR`),
/// evaluating `#[cfg]` against the enabled features and target, writes the
/// artifact into `OUT_DIR`, registers rerun triggers and turns every
/// diagnostic into a cargo warning.
pub fn generate() -> LogvalResult<Generation> {
    let manifest_dir = env_dir("CARGO_MANIFEST_DIR")?;
    let out_dir = env_dir("OUT_DIR")?;
    let generation = Logval::new(&manifest_dir)
        .cfg_context(CfgContext::from_env())
        .generate(&out_dir)?;

    println!(
        "cargo:rerun-if-changed={}",
        manifest_dir.join(CONFIG_FILE).display()
    );
    for root in &generation.discovery.roots {
        println!("cargo:rerun-if-changed={}", root.display());
    }
    for file in &generation.discovery.files {
        println!("cargo:rerun-if-changed={}", file.display());
    }
    for diagnostic in &generation.discovery.diagnostics {
        println!("cargo:warning=logval: {}", diagnostic);
    }
    Ok(generation)
}
