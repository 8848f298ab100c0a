//! The two-tier dispatch registry.
//!
//! Lookup goes exact table first, then the ordered assignable table. A
//! successful assignable match is promoted into the exact table under the
//! value's runtime type, so later lookups for that type are a single hash
//! probe. Nothing else ever mutates the tables after `build`.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace, warn};

use crate::binding::{Formatter, Origin, ProviderBinding, ProviderSource};
use crate::catalog;
use crate::config::RegistryConfig;
use crate::resolve::{Offer, PriorityResolver};
use crate::value::{LogValue, Presence, TypeKey};

/// Dispatch counters. Relaxed atomics; values are advisory.
#[derive(Debug, Default)]
pub struct DispatchStats {
    exact_hits: AtomicU64,
    assignable_hits: AtomicU64,
    promotions: AtomicU64,
    fallbacks: AtomicU64,
    scanned: AtomicU64,
    panics: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub exact_hits: u64,
    pub assignable_hits: u64,
    pub promotions: u64,
    pub fallbacks: u64,
    /// Assignable entries tested across all scans.
    pub scanned: u64,
    pub panics: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            exact_hits: self.exact_hits.load(Ordering::Relaxed),
            assignable_hits: self.assignable_hits.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            scanned: self.scanned.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

/// The route a value takes through the registry.
#[derive(Debug, Clone, Copy)]
pub enum Route {
    /// Absent value; renders the null placeholder.
    Absent,
    /// Exact-table hit (including promoted entries).
    Exact(ProviderBinding),
    /// First matching assignable entry and its position.
    Assignable { index: usize, binding: ProviderBinding },
    /// Nothing matched; renders the value's fallback.
    Fallback,
}

/// Resolves values to formatters.
///
/// Build once at startup, then share by reference or `Arc`; all dispatch
/// methods take `&self`.
///
/// ```rust,ignore
/// let registry = Registry::builder().source(&GeneratedProviders).build();
/// assert_eq!(registry.format(&Money { amount: 5 }), "$5");
/// ```
pub struct Registry {
    exact: DashMap<TypeKey, ProviderBinding>,
    assignable: Box<[ProviderBinding]>,
    config: RegistryConfig,
    stats: DispatchStats,
}

impl Registry {
    /// Registry with the built-in catalog only.
    pub fn new() -> Self {
        RegistryBuilder::new().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of exact entries, promoted ones included.
    pub fn exact_len(&self) -> usize {
        self.exact.len()
    }

    pub fn lookup_exact(&self, key: TypeKey) -> Option<ProviderBinding> {
        self.exact.get(&key).map(|entry| *entry.value())
    }

    /// Assignable targets in match order.
    pub fn assignable_bindings(&self) -> &[ProviderBinding] {
        &self.assignable
    }

    /// Renders a value; `None` and absent wrappers give the null placeholder.
    pub fn format_value(&self, value: Option<&dyn LogValue>) -> String {
        let Some(value) = value.and_then(peel) else {
            return self.config.null_text.clone();
        };
        let key = value.type_key();

        if let Some(binding) = self.lookup_exact(key) {
            DispatchStats::bump(&self.stats.exact_hits, 1);
            return self.invoke(&binding, value);
        }

        match self.scan(value) {
            Some((index, binding)) => {
                DispatchStats::bump(&self.stats.scanned, index as u64 + 1);
                DispatchStats::bump(&self.stats.assignable_hits, 1);
                let promoted = self.promote(key, binding);
                self.invoke(&promoted, value)
            }
            None => {
                DispatchStats::bump(&self.stats.scanned, self.assignable.len() as u64);
                DispatchStats::bump(&self.stats.fallbacks, 1);
                self.fallback(value)
            }
        }
    }

    pub fn format(&self, value: &dyn LogValue) -> String {
        self.format_value(Some(value))
    }

    /// Reports the route `value` would take, without invoking a formatter
    /// or promoting.
    pub fn explain(&self, value: &dyn LogValue) -> Route {
        let Some(value) = peel(value) else {
            return Route::Absent;
        };
        if let Some(binding) = self.lookup_exact(value.type_key()) {
            return Route::Exact(binding);
        }
        match self.scan(value) {
            Some((index, binding)) => Route::Assignable { index, binding },
            None => Route::Fallback,
        }
    }

    fn scan(&self, value: &dyn LogValue) -> Option<(usize, ProviderBinding)> {
        self.assignable
            .iter()
            .enumerate()
            .find(|(_, binding)| value.is_assignable_to(binding.target))
            .map(|(index, binding)| (index, *binding))
    }

    /// Caches `binding` under the runtime type. An existing entry wins, so
    /// racing promotions of the same key are idempotent.
    fn promote(&self, key: TypeKey, binding: ProviderBinding) -> ProviderBinding {
        match self.exact.entry(key) {
            Entry::Occupied(occupied) => *occupied.get(),
            Entry::Vacant(vacant) => {
                DispatchStats::bump(&self.stats.promotions, 1);
                trace!(runtime = %key, target = %binding.target, "promoted assignable match");
                *vacant.insert(binding.promote(key))
            }
        }
    }

    fn invoke(&self, binding: &ProviderBinding, value: &dyn LogValue) -> String {
        if !self.config.catch_panics {
            return binding.format(value);
        }
        match panic::catch_unwind(AssertUnwindSafe(|| binding.format(value))) {
            Ok(rendered) => rendered,
            Err(_) => {
                DispatchStats::bump(&self.stats.panics, 1);
                warn!(
                    value_type = value.simple_name(),
                    provider = binding.source,
                    "formatter panicked, using fallback"
                );
                self.fallback(value)
            }
        }
    }

    fn fallback(&self, value: &dyn LogValue) -> String {
        if !self.config.catch_panics {
            return value.fallback();
        }
        panic::catch_unwind(AssertUnwindSafe(|| value.fallback()))
            .unwrap_or_else(|_| format!("<unformattable {}>", value.simple_name()))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("exact", &self.exact.len())
            .field("assignable", &self.assignable)
            .field("config", &self.config)
            .finish()
    }
}

fn peel(value: &dyn LogValue) -> Option<&dyn LogValue> {
    let mut current = value;
    loop {
        match current.presence() {
            Presence::Present => return Some(current),
            Presence::Absent => return None,
            Presence::Inner(inner) => current = inner,
        }
    }
}

const REGISTERED: &str = "<registered>";

/// Collects extension bindings and merges them over the built-in catalog.
///
/// Extension bindings (sources and explicit registrations, in the order they
/// are added) are resolved among themselves by priority, earlier winning
/// ties. An extension exact entry replaces a catalog entry with the same key.
/// An extension assignable entry takes over the slot of a built-in with the
/// same target; new targets are appended after the built-ins.
pub struct RegistryBuilder {
    config: RegistryConfig,
    exact: PriorityResolver<TypeKey, ProviderBinding>,
    assignable: PriorityResolver<TypeKey, ProviderBinding>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
            exact: PriorityResolver::new(),
            assignable: PriorityResolver::new(),
        }
    }

    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds both tables of a provider source, typically `GeneratedProviders`.
    pub fn source(mut self, source: &dyn ProviderSource) -> Self {
        for binding in source.exact() {
            offer(&mut self.exact, binding, "exact");
        }
        for binding in source.assignable() {
            offer(&mut self.assignable, binding, "assignable");
        }
        self
    }

    /// Registers a formatter for the exact type `T`.
    pub fn exact<T: LogValue>(self, formatter: Formatter) -> Self {
        self.exact_with_priority::<T>(0, formatter)
    }

    pub fn exact_with_priority<T: LogValue>(mut self, priority: i32, formatter: Formatter) -> Self {
        let binding = ProviderBinding::new(TypeKey::of::<T>(), priority, REGISTERED, formatter)
            .with_origin(Origin::Registered);
        offer(&mut self.exact, binding, "exact");
        self
    }

    /// Registers a formatter for every value assignable to `C`, usually a
    /// capability such as `dyn CollectionView` or a user marker trait.
    pub fn assignable<C: ?Sized + 'static>(self, formatter: Formatter) -> Self {
        self.assignable_with_priority::<C>(0, formatter)
    }

    pub fn assignable_with_priority<C: ?Sized + 'static>(
        mut self,
        priority: i32,
        formatter: Formatter,
    ) -> Self {
        let binding = ProviderBinding::new(TypeKey::of::<C>(), priority, REGISTERED, formatter)
            .with_origin(Origin::Registered);
        offer(&mut self.assignable, binding, "assignable");
        self
    }

    pub fn build(self) -> Registry {
        let exact: DashMap<TypeKey, ProviderBinding> = catalog::builtin_exact()
            .into_iter()
            .map(|binding| (binding.target, binding))
            .collect();
        for (key, _, binding) in self.exact.into_ordered() {
            exact.insert(key, binding);
        }

        let mut assignable = catalog::builtin_assignable();
        for (key, _, binding) in self.assignable.into_ordered() {
            match assignable.iter_mut().find(|slot| slot.target == key) {
                Some(slot) => *slot = binding,
                None => assignable.push(binding),
            }
        }

        debug!(
            exact = exact.len(),
            assignable = assignable.len(),
            "built log value registry"
        );
        Registry {
            exact,
            assignable: assignable.into_boxed_slice(),
            config: self.config,
            stats: DispatchStats::default(),
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn offer(
    resolver: &mut PriorityResolver<TypeKey, ProviderBinding>,
    binding: ProviderBinding,
    table: &'static str,
) {
    match resolver.offer(binding.target, binding.priority, binding) {
        Offer::Inserted => {}
        Offer::Replaced { previous } => debug!(
            table,
            target = %binding.target,
            winner = binding.source,
            replaced = previous.source,
            "higher priority provider replaced binding"
        ),
        Offer::Outranked { winner } => debug!(
            table,
            target = %binding.target,
            winner = winner.source,
            dropped = binding.source,
            "lower priority provider ignored"
        ),
        Offer::Tied { winner } => warn!(
            table,
            target = %binding.target,
            winner = winner.source,
            dropped = binding.source,
            priority = binding.priority,
            "providers tie on priority, keeping the first"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_only_registry() {
        let registry = Registry::new();
        assert_eq!(registry.format(&42i32), "42");
        assert_eq!(registry.format(&vec![1u8, 2]), "Vec(2u8)");
        assert_eq!(registry.format_value(None), "null");
    }

    #[test]
    fn test_option_is_peeled() {
        let registry = Registry::new();
        assert_eq!(registry.format(&Some(7u32)), "7");
        assert_eq!(registry.format(&None::<u32>), "null");
        let nested: Option<Box<dyn LogValue>> = Some(Box::new(String::from("x")));
        assert_eq!(registry.format(&nested), "x");
    }

    #[test]
    fn test_explain_does_not_promote() {
        let registry = Registry::new();
        let before = registry.exact_len();
        match registry.explain(&vec![1i32]) {
            Route::Assignable { index, binding } => {
                assert_eq!(index, 0);
                assert_eq!(binding.origin, Origin::Builtin);
            }
            other => panic!("unexpected route {other:?}"),
        }
        assert_eq!(registry.exact_len(), before);
        assert!(matches!(registry.explain(&None::<u8>), Route::Absent));
    }

    #[test]
    fn test_registered_exact_overrides_catalog() {
        let registry = Registry::builder()
            .exact::<i32>(|value| format!("int {}", catalog::display::<i32>(value)))
            .build();
        assert_eq!(registry.format(&3i32), "int 3");
        assert_eq!(
            registry.lookup_exact(TypeKey::of::<i32>()).map(|b| b.origin),
            Some(Origin::Registered)
        );
    }

    #[test]
    fn test_custom_config_null_text() {
        let config = RegistryConfig {
            null_text: "-".to_string(),
            ..RegistryConfig::default()
        };
        let registry = Registry::builder().config(config).build();
        assert_eq!(registry.format_value(None), "-");
    }
}
