//! Builder API for provider discovery and table generation.
//!
//! ```rust,ignore
//! use logval_build::Logval;
//!
//! let generation = Logval::new("/path/to/crate")
//!     .exclude_dirs(["fixtures"])
//!     .generate(&out_dir)?;
//!
//! for diagnostic in &generation.discovery.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::cfg::CfgContext;
use crate::config::{is_plain_file_name, load_config, LogvalConfig};
use crate::discover::{discover, Discovery};
use crate::error::{LogvalError, LogvalResult};
use crate::synth::{render, write_artifact};

/// Outcome of [`Logval::generate`].
#[derive(Debug, Clone)]
pub struct Generation {
    pub discovery: Discovery,
    /// Path of the artifact inside the output directory.
    pub artifact: PathBuf,
    /// False when the artifact already had identical contents.
    pub written: bool,
}

/// Discovery configuration for one crate.
///
/// Settings from `logval.toml` in the crate root are applied first;
/// anything set on the builder takes precedence.
#[derive(Debug, Clone)]
pub struct Logval {
    root: PathBuf,

    /// Extra directory names to skip
    excluded_dirs: Vec<String>,

    /// Replaces the configured source roots
    source_roots: Option<Vec<String>>,

    /// Replaces the configured artifact name
    output_file: Option<String>,

    /// Whether to read logval.toml
    use_config: bool,

    /// Features and target options for `#[cfg]` evaluation
    cfg: CfgContext,
}

impl Logval {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded_dirs: Vec::new(),
            source_roots: None,
            output_file: None,
            use_config: true,
            cfg: CfgContext::unknown(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add directory names to exclude from scanning.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Scan these roots (relative to the crate root) instead of `src`.
    pub fn source_roots(mut self, roots: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.source_roots = Some(roots.into_iter().map(Into::into).collect());
        self
    }

    /// Artifact file name inside the output directory.
    pub fn output_file(mut self, name: impl Into<String>) -> Self {
        self.output_file = Some(name.into());
        self
    }

    /// Enable or disable reading logval.toml.
    pub fn with_config(mut self, enabled: bool) -> Self {
        self.use_config = enabled;
        self
    }

    /// What `#[cfg(...)]` predicates are evaluated against. Without it only
    /// `test` is known (and false).
    pub fn cfg_context(mut self, cfg: CfgContext) -> Self {
        self.cfg = cfg;
        self
    }

    /// Effective settings after merging logval.toml and builder overrides.
    pub fn settings(&self) -> LogvalResult<LogvalConfig> {
        let mut config = if self.use_config {
            load_config(&self.root)?.unwrap_or_default()
        } else {
            LogvalConfig::default()
        };
        config
            .discovery
            .exclude
            .extend(self.excluded_dirs.iter().cloned());
        if let Some(roots) = &self.source_roots {
            config.discovery.roots = roots.clone();
        }
        if let Some(file) = &self.output_file {
            if !is_plain_file_name(file) {
                return Err(LogvalError::invalid_argument(format!(
                    "output file `{file}` must be a plain file name"
                )));
            }
            config.output.file = file.clone();
        }
        Ok(config)
    }

    /// Scan sources and resolve the provider tables without writing anything.
    pub fn discover(&self) -> LogvalResult<Discovery> {
        discover(&self.root, &self.settings()?, &self.cfg)
    }

    /// Scan, resolve and write the artifact into `out_dir`.
    ///
    /// The artifact is always produced, even with no providers, so the
    /// including crate compiles.
    pub fn generate(&self, out_dir: &Path) -> LogvalResult<Generation> {
        let config = self.settings()?;
        let discovery = discover(&self.root, &config, &self.cfg)?;
        let artifact = out_dir.join(&config.output.file);
        let written = write_artifact(&artifact, &render(&discovery)?)?;
        Ok(Generation {
            discovery,
            artifact,
            written,
        })
    }
}
