//! Provider bindings and the extension point that hands generated tables to
//! the registry.

use std::fmt;

use crate::value::{LogValue, TypeKey};

/// A formatter: renders one value into its log string. Must not retain the
/// value.
pub type Formatter = fn(&dyn LogValue) -> String;

/// Where a binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The built-in catalog.
    Builtin,
    /// Build-time discovery (the generated artifact).
    Generated,
    /// Explicit registration on the registry builder.
    Registered,
    /// Cached result of an assignable match for a concrete runtime type.
    Promoted,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => write!(f, "builtin"),
            Self::Generated => write!(f, "generated"),
            Self::Registered => write!(f, "registered"),
            Self::Promoted => write!(f, "promoted"),
        }
    }
}

/// One resolved association between a target type and a formatter.
#[derive(Clone, Copy)]
pub struct ProviderBinding {
    pub target: TypeKey,
    pub priority: i32,
    /// Declaring location, e.g. `crate::fmt::money`.
    pub source: &'static str,
    pub origin: Origin,
    pub formatter: Formatter,
}

impl ProviderBinding {
    /// Binding as emitted by the table synthesizer.
    pub fn new(target: TypeKey, priority: i32, source: &'static str, formatter: Formatter) -> Self {
        Self {
            target,
            priority,
            source,
            origin: Origin::Generated,
            formatter,
        }
    }

    pub fn builtin(target: TypeKey, source: &'static str, formatter: Formatter) -> Self {
        Self {
            target,
            priority: 0,
            source,
            origin: Origin::Builtin,
            formatter,
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Copy of this binding cached under a concrete runtime type.
    pub fn promote(&self, runtime: TypeKey) -> Self {
        Self {
            target: runtime,
            origin: Origin::Promoted,
            ..*self
        }
    }

    pub fn format(&self, value: &dyn LogValue) -> String {
        (self.formatter)(value)
    }
}

impl fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("target", &self.target)
            .field("priority", &self.priority)
            .field("source", &self.source)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Extension point returning the two provider mappings.
///
/// The build-time synthesizer implements this for `GeneratedProviders`; `()`
/// is the absent extension.
pub trait ProviderSource {
    fn exact(&self) -> Vec<ProviderBinding> {
        Vec::new()
    }

    fn assignable(&self) -> Vec<ProviderBinding> {
        Vec::new()
    }
}

impl ProviderSource for () {}

/// Includes the artifact written by `logval-build` into the current module.
///
/// Expands to `include!(concat!(env!("OUT_DIR"), "/logval_providers.rs"))`,
/// or to the given file name.
#[macro_export]
macro_rules! include_providers {
    () => {
        include!(concat!(env!("OUT_DIR"), "/logval_providers.rs"));
    };
    ($file:literal) => {
        include!(concat!(env!("OUT_DIR"), "/", $file));
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shout(value: &dyn LogValue) -> String {
        value.fallback().to_uppercase()
    }

    #[test]
    fn test_promote_keeps_formatter() {
        let binding = ProviderBinding::new(TypeKey::of::<String>(), 4, "crate::shout", shout);
        let promoted = binding.promote(TypeKey::of::<i32>());
        assert_eq!(promoted.target, TypeKey::of::<i32>());
        assert_eq!(promoted.origin, Origin::Promoted);
        assert_eq!(promoted.priority, 4);
        assert_eq!(promoted.source, "crate::shout");
        assert_eq!(promoted.format(&String::from("abc")), "\"ABC\"");
    }

    #[test]
    fn test_unit_source_is_empty() {
        assert!(ProviderSource::exact(&()).is_empty());
        assert!(ProviderSource::assignable(&()).is_empty());
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(Origin::Generated.to_string(), "generated");
        assert_eq!(Origin::Promoted.to_string(), "promoted");
    }
}
