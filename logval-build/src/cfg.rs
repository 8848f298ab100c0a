//! Evaluating `#[cfg(...)]` on modules and items.
//!
//! The generated table is compiled into a normal (non-test) build, so `test`
//! is always false. Features and target options are known when running from
//! a build script (`CARGO_FEATURE_*`, `CARGO_CFG_*`); elsewhere they are
//! unknown, and code behind them is reported instead of emitted.

use std::collections::{HashMap, HashSet};
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ExprLit, Lit, Meta, Token};

/// Whether a module or item ends up in the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfgState {
    Enabled,
    Disabled,
    /// Depends on a predicate that cannot be evaluated; carries the
    /// predicate as written.
    Conditional(String),
}

/// What is known about the build being configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CfgContext {
    /// Enabled features, upper-cased with `-` as `_`. `None` when unknown.
    features: Option<HashSet<String>>,
    /// Target options (`unix`, `target_os`, ...) and their values. `None`
    /// when unknown.
    options: Option<HashMap<String, Vec<String>>>,
}

fn feature_key(name: &str) -> String {
    name.to_ascii_uppercase().replace('-', "_")
}

impl CfgContext {
    /// Nothing known beyond `test` being off.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Exactly these features enabled; target options stay unknown.
    pub fn with_features(features: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            features: Some(features.into_iter().map(|f| feature_key(f.as_ref())).collect()),
            options: None,
        }
    }

    /// Reads the variables cargo sets for build scripts.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Builds the context from `CARGO_FEATURE_<NAME>` and
    /// `CARGO_CFG_<NAME>=<v1,v2>` pairs. Without any `CARGO_CFG_*` entry the
    /// target options are treated as unknown.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut features = HashSet::new();
        let mut options: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in vars {
            if let Some(feature) = key.strip_prefix("CARGO_FEATURE_") {
                features.insert(feature.to_string());
            } else if let Some(option) = key.strip_prefix("CARGO_CFG_") {
                let values = value
                    .split(',')
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect();
                options.insert(option.to_ascii_lowercase(), values);
            }
        }
        Self {
            features: Some(features),
            options: (!options.is_empty()).then_some(options),
        }
    }

    fn feature(&self, name: &str) -> Option<bool> {
        self.features
            .as_ref()
            .map(|features| features.contains(&feature_key(name)))
    }

    fn option(&self, name: &str, value: Option<&str>) -> Option<bool> {
        let options = self.options.as_ref()?;
        Some(match (options.get(name), value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(values), Some(value)) => values.iter().any(|v| v == value),
        })
    }

    /// Evaluates one predicate; `None` means unknown.
    fn eval(&self, meta: &Meta) -> Option<bool> {
        match meta {
            Meta::Path(path) => {
                let name = path.get_ident()?.to_string();
                if name == "test" {
                    Some(false)
                } else {
                    self.option(&name, None)
                }
            }
            Meta::NameValue(nv) => {
                let key = nv.path.get_ident()?.to_string();
                let Expr::Lit(ExprLit {
                    lit: Lit::Str(value),
                    ..
                }) = &nv.value
                else {
                    return None;
                };
                if key == "feature" {
                    self.feature(&value.value())
                } else {
                    self.option(&key, Some(&value.value()))
                }
            }
            Meta::List(list) => {
                let name = list.path.get_ident()?.to_string();
                let nested = list
                    .parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
                    .ok()?;
                let results: Vec<Option<bool>> = nested.iter().map(|m| self.eval(m)).collect();
                match name.as_str() {
                    "all" => {
                        if results.contains(&Some(false)) {
                            Some(false)
                        } else if results.iter().all(|r| *r == Some(true)) {
                            Some(true)
                        } else {
                            None
                        }
                    }
                    "any" => {
                        if results.contains(&Some(true)) {
                            Some(true)
                        } else if results.iter().all(|r| *r == Some(false)) {
                            Some(false)
                        } else {
                            None
                        }
                    }
                    "not" if results.len() == 1 => results[0].map(|r| !r),
                    _ => None,
                }
            }
        }
    }

    /// Combines every `#[cfg(...)]` on an item.
    pub fn state(&self, attrs: &[Attribute]) -> CfgState {
        let mut unknown = None;
        for attr in attrs.iter().filter(|a| a.path().is_ident("cfg")) {
            let Meta::List(list) = &attr.meta else {
                continue;
            };
            let predicate = list.parse_args::<Meta>().ok();
            match predicate.as_ref().and_then(|p| self.eval(p)) {
                Some(true) => {}
                Some(false) => return CfgState::Disabled,
                None => {
                    unknown.get_or_insert_with(|| list.tokens.to_string());
                }
            }
        }
        match unknown {
            Some(predicate) => CfgState::Conditional(predicate),
            None => CfgState::Enabled,
        }
    }
}
