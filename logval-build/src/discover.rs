//! Provider discovery across a crate's source roots.
//!
//! Files are read and parsed in parallel; everything after that runs
//! sequentially in sorted-file, source-line order, so the resolved tables do
//! not depend on thread scheduling.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use logval_core::resolve::{Offer, PriorityResolver};

use crate::cfg::{CfgContext, CfgState};
use crate::config::LogvalConfig;
use crate::error::{IoResultExt, LogvalError, LogvalResult};
use crate::extract::{extract_providers, DiscoveredProvider, FileScan, ModDecl, Rejection};
use crate::scan::{gather_rs_files, is_binary_root, module_path};
use crate::Diagnostic;

/// One winning binding in a resolved table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    /// Target type as written in the generated source.
    pub target: String,
    pub priority: i32,
    /// Index into [`Discovery::providers`].
    pub provider: usize,
}

/// Result of scanning a crate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Discovery {
    pub roots: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
    /// Accepted providers in visiting order.
    pub providers: Vec<DiscoveredProvider>,
    pub exact: Vec<ResolvedEntry>,
    /// In first-declaration order; the runtime scans it front to back.
    pub assignable: Vec<ResolvedEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Discovery {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn provider(&self, entry: &ResolvedEntry) -> &DiscoveredProvider {
        &self.providers[entry.provider]
    }
}

struct ScannedFile {
    root: usize,
    /// `main.rs` next to a `lib.rs`: the root of a separate binary crate.
    binary: bool,
    scan: FileScan,
}

fn scan_file(
    root: usize,
    src_root: &Path,
    file: &Path,
    cfg: &CfgContext,
) -> LogvalResult<ScannedFile> {
    let content = fs::read_to_string(file).with_path(file)?;
    let binary = is_binary_root(src_root, file);
    let Some(module) = module_path(src_root, file) else {
        debug!(file = %file.display(), "no module path, skipping");
        return Ok(ScannedFile {
            root,
            binary,
            scan: FileScan::default(),
        });
    };
    let scan = match extract_providers(file, module, &content, cfg) {
        Ok(scan) => scan,
        Err(e) if e.is_recoverable() => {
            warn!(file = %file.display(), error = %e, "skipping unparseable file");
            FileScan {
                diagnostics: vec![Diagnostic::from_error(&e)],
                ..FileScan::default()
            }
        }
        Err(e) => return Err(e),
    };
    Ok(ScannedFile { root, binary, scan })
}

/// Module declarations of one source root, split by the crate declaring them.
#[derive(Default)]
struct ModuleTree {
    library: HashMap<Vec<String>, ModDecl>,
    /// Declared from a binary root only.
    binary: HashMap<Vec<String>, ModDecl>,
}

/// Checks that every module enclosing the provider is compiled and
/// reachable by path from the crate root.
///
/// Returns `Ok(false)` for providers inside modules switched off by `cfg`,
/// which are dropped without a diagnostic.
fn check_reachable(provider: &DiscoveredProvider, modules: &ModuleTree) -> Result<bool, Rejection> {
    for depth in 1..=provider.module.len() {
        let prefix = &provider.module[..depth];
        let Some(decl) = modules.library.get(prefix) else {
            if modules.binary.contains_key(prefix) {
                return Err(Rejection::BinaryOnly);
            }
            return Err(Rejection::ModuleNotDeclared(prefix.join("::")));
        };
        match &decl.cfg {
            CfgState::Enabled => {}
            CfgState::Disabled => return Ok(false),
            CfgState::Conditional(predicate) => {
                return Err(Rejection::Conditional(predicate.clone()))
            }
        }
        if depth > 1 && !decl.exported {
            return Err(Rejection::NotVisible);
        }
    }
    Ok(true)
}

fn rejected(provider: &DiscoveredProvider, rejection: Rejection) -> Diagnostic {
    Diagnostic {
        file: provider.file.clone(),
        line: Some(provider.line),
        provider: Some(provider.path.clone()),
        message: rejection.to_string(),
    }
}

fn resolve_table(
    providers: &[DiscoveredProvider],
    targets: impl Fn(&DiscoveredProvider) -> &[String],
    table: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ResolvedEntry> {
    let mut resolver: PriorityResolver<String, usize> = PriorityResolver::new();
    for (index, provider) in providers.iter().enumerate() {
        for target in targets(provider) {
            match resolver.offer(target.clone(), provider.priority, index) {
                Offer::Inserted => {}
                Offer::Replaced { previous } => debug!(
                    table,
                    target = %target,
                    winner = %provider.path,
                    loser = %providers[previous].path,
                    "higher priority provider replaces earlier one"
                ),
                Offer::Outranked { winner } => debug!(
                    table,
                    target = %target,
                    winner = %providers[winner].path,
                    loser = %provider.path,
                    "provider outranked"
                ),
                Offer::Tied { winner } => {
                    let kept = &providers[winner];
                    warn!(
                        table,
                        target = %target,
                        kept = %kept.path,
                        ignored = %provider.path,
                        priority = provider.priority,
                        "providers tie on priority"
                    );
                    diagnostics.push(Diagnostic {
                        file: provider.file.clone(),
                        line: Some(provider.line),
                        provider: Some(provider.path.clone()),
                        message: format!(
                            "ties with `{}` on priority {} for {} target `{}`; keeping `{}`",
                            kept.path, provider.priority, table, target, kept.path
                        ),
                    });
                }
            }
        }
    }
    resolver
        .into_ordered()
        .into_iter()
        .map(|(target, priority, provider)| ResolvedEntry {
            target,
            priority,
            provider,
        })
        .collect()
}

/// Scans the source roots under `crate_root` and resolves both tables.
///
/// `cfg` decides which `#[cfg(...)]`-gated modules and items are compiled.
pub fn discover(
    crate_root: &Path,
    config: &LogvalConfig,
    cfg: &CfgContext,
) -> LogvalResult<Discovery> {
    if !crate_root.is_dir() {
        return Err(LogvalError::invalid_argument(format!(
            "crate root {} is not a directory",
            crate_root.display()
        )));
    }

    let roots: Vec<PathBuf> = config
        .discovery
        .roots
        .iter()
        .map(|r| crate_root.join(r))
        .collect();

    let mut work: Vec<(usize, PathBuf)> = Vec::new();
    for (index, src_root) in roots.iter().enumerate() {
        let files = gather_rs_files(src_root, &config.discovery.exclude)?;
        work.extend(files.into_iter().map(|f| (index, f)));
    }

    let scanned = work
        .par_iter()
        .map(|(index, file)| scan_file(*index, &roots[*index], file, cfg))
        .collect::<LogvalResult<Vec<_>>>()?;

    let mut modules: Vec<ModuleTree> = roots.iter().map(|_| ModuleTree::default()).collect();
    let mut candidates: Vec<(usize, DiscoveredProvider)> = Vec::new();
    let mut diagnostics = Vec::new();
    for file in scanned {
        let tree = &mut modules[file.root];
        let decls = if file.binary {
            &mut tree.binary
        } else {
            &mut tree.library
        };
        for decl in file.scan.modules {
            decls.entry(decl.path.clone()).or_insert(decl);
        }
        diagnostics.extend(file.scan.diagnostics);
        if file.binary {
            diagnostics.extend(
                file.scan
                    .providers
                    .iter()
                    .map(|p| rejected(p, Rejection::BinaryOnly)),
            );
        } else {
            candidates.extend(file.scan.providers.into_iter().map(|p| (file.root, p)));
        }
    }

    let mut providers = Vec::new();
    for (root, mut provider) in candidates {
        match check_reachable(&provider, &modules[root]) {
            Ok(true) => {
                provider.order = providers.len();
                providers.push(provider);
            }
            Ok(false) => debug!(provider = %provider.path, "provider in cfg-disabled module"),
            Err(rejection) => diagnostics.push(rejected(&provider, rejection)),
        }
    }

    let exact = resolve_table(&providers, |p| p.exact.as_slice(), "exact", &mut diagnostics);
    let assignable = resolve_table(&providers, |p| p.assignable.as_slice(), "assignable", &mut diagnostics);

    info!(
        files = work.len(),
        providers = providers.len(),
        exact = exact.len(),
        assignable = assignable.len(),
        diagnostics = diagnostics.len(),
        "provider discovery complete"
    );

    Ok(Discovery {
        roots,
        files: work.into_iter().map(|(_, f)| f).collect(),
        providers,
        exact,
        assignable,
        diagnostics,
    })
}
