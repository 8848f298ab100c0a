//! Rendering and writing the generated provider tables.
//!
//! The artifact defines `GeneratedProviders`, a unit struct implementing
//! `logval_core::ProviderSource`, and is meant to be included at the crate
//! root with `logval_core::include_providers!()`. Every path in it is either
//! absolute (`::logval_core`) or rooted at `crate::`.

use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::discover::{Discovery, ResolvedEntry};
use crate::error::{IoResultExt, LogvalError, LogvalResult};
use crate::extract::InputShape;

const HEADER: &str = "// @generated by logval-build. Do not edit.";

fn adapter_call(target: &str, shape: &InputShape, function: &str) -> String {
    match shape {
        InputShape::Erased => format!("::logval_core::adapt::erased(value, {function})"),
        InputShape::Concrete(_) => {
            format!("::logval_core::adapt::concrete::<{target}>(value, {function})")
        }
        InputShape::View(kind) => {
            format!("::logval_core::adapt::{}(value, {function})", kind.adapter())
        }
    }
}

fn render_table(out: &mut String, name: &str, discovery: &Discovery, entries: &[ResolvedEntry]) {
    let _ = writeln!(
        out,
        "    fn {name}(&self) -> ::std::vec::Vec<::logval_core::ProviderBinding> {{"
    );
    if entries.is_empty() {
        let _ = writeln!(out, "        ::std::vec::Vec::new()");
        let _ = writeln!(out, "    }}");
        return;
    }
    let _ = writeln!(out, "        ::std::vec![");
    for entry in entries {
        let provider = discovery.provider(entry);
        let _ = writeln!(out, "            ::logval_core::ProviderBinding::new(");
        let _ = writeln!(
            out,
            "                ::logval_core::TypeKey::of::<{}>(),",
            entry.target
        );
        let _ = writeln!(out, "                {},", entry.priority);
        let _ = writeln!(out, "                {:?},", provider.path);
        let _ = writeln!(
            out,
            "                |value| {},",
            adapter_call(&entry.target, &provider.input, &provider.path)
        );
        let _ = writeln!(out, "            ),");
    }
    let _ = writeln!(out, "        ]");
    let _ = writeln!(out, "    }}");
}

fn render_body(discovery: &Discovery) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "/// Providers discovered in this crate.");
    let _ = writeln!(out, "#[allow(dead_code)]");
    let _ = writeln!(out, "pub struct GeneratedProviders;");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "impl ::logval_core::ProviderSource for GeneratedProviders {{"
    );
    render_table(&mut out, "exact", discovery, &discovery.exact);
    let _ = writeln!(out);
    render_table(&mut out, "assignable", discovery, &discovery.assignable);
    let _ = writeln!(out, "}}");
    out
}

/// SHA-256 of the rendered tables, hex encoded.
pub fn fingerprint(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(64), |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        })
}

/// Renders the complete artifact. The output depends only on the
/// discovery result, so unchanged sources give byte-identical files.
///
/// The result is parsed back before it is returned; a table that would not
/// parse is a [`LogvalError::Synthesis`] instead of a broken build later.
pub fn render(discovery: &Discovery) -> LogvalResult<String> {
    let body = render_body(discovery);
    syn::parse_file(&body).map_err(|e| {
        LogvalError::synthesis(format!("generated source does not parse: {e}"))
    })?;
    Ok(format!(
        "{HEADER}\n// fingerprint: sha256:{}\n// {} exact, {} assignable\n\n{body}",
        fingerprint(&body),
        discovery.exact.len(),
        discovery.assignable.len(),
    ))
}

/// Writes `contents` to `path` unless the file already holds exactly that.
///
/// Writes go to a sibling temp file that is renamed into place, so a reader
/// never sees a partial artifact. Returns whether the file was written.
pub fn write_artifact(path: &Path, contents: &str) -> LogvalResult<bool> {
    if let Ok(existing) = fs::read_to_string(path) {
        if existing == contents {
            debug!(path = %path.display(), "artifact unchanged");
            return Ok(false);
        }
    }

    let parent = path
        .parent()
        .ok_or_else(|| LogvalError::invalid_argument(format!("{} has no parent", path.display())))?;
    fs::create_dir_all(parent).with_path(parent)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LogvalError::invalid_argument(format!("bad artifact path {}", path.display())))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp = parent.join(format!(".{file_name}.{}.{nanos}.tmp", std::process::id()));

    fs::write(&temp, contents).with_path(&temp)?;
    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(LogvalError::io(path, e));
    }
    info!(path = %path.display(), bytes = contents.len(), "artifact written");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{DiscoveredProvider, ViewKind};
    use std::path::PathBuf;

    fn provider(path: &str, input: InputShape) -> DiscoveredProvider {
        DiscoveredProvider {
            path: path.to_string(),
            file: PathBuf::from("src/fmt.rs"),
            line: 1,
            visibility: "pub",
            module: vec!["fmt".to_string()],
            exact: Vec::new(),
            assignable: Vec::new(),
            priority: 0,
            order: 0,
            input,
        }
    }

    fn sample() -> Discovery {
        Discovery {
            providers: vec![
                provider("crate::fmt::money", InputShape::Concrete("Money".to_string())),
                provider("crate::fmt::items", InputShape::View(ViewKind::Collection)),
            ],
            exact: vec![ResolvedEntry {
                target: "crate::Money".to_string(),
                priority: 5,
                provider: 0,
            }],
            assignable: vec![ResolvedEntry {
                target: "dyn ::logval_core::CollectionView".to_string(),
                priority: 0,
                provider: 1,
            }],
            ..Discovery::default()
        }
    }

    #[test]
    fn test_render_bindings() {
        let out = render(&sample()).unwrap();
        assert!(out.starts_with(HEADER));
        assert!(out.contains("::logval_core::TypeKey::of::<crate::Money>(),"));
        assert!(out.contains(
            "|value| ::logval_core::adapt::concrete::<crate::Money>(value, crate::fmt::money),"
        ));
        assert!(out.contains("\"crate::fmt::items\","));
        assert!(out.contains("::logval_core::adapt::collection(value, crate::fmt::items)"));
        assert!(out.contains("// 1 exact, 1 assignable"));
    }

    #[test]
    fn test_empty_discovery_still_defines_source() {
        let out = render(&Discovery::default()).unwrap();
        assert!(out.contains("pub struct GeneratedProviders;"));
        assert_eq!(out.matches("::std::vec::Vec::new()").count(), 2);
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(render(&sample()).unwrap(), render(&sample()).unwrap());
        assert_ne!(
            render(&sample()).unwrap(),
            render(&Discovery::default()).unwrap()
        );
    }

    #[test]
    fn test_unparseable_target_is_a_synthesis_error() {
        let mut discovery = sample();
        discovery.exact[0].target = "crate::Money)".to_string();
        match render(&discovery) {
            Err(LogvalError::Synthesis { message }) => {
                assert!(message.contains("does not parse"), "{message}")
            }
            other => panic!("expected synthesis error, got {other:?}"),
        }
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let hex = fingerprint("");
        assert_eq!(
            hex,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
