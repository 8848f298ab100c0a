//! Typed adapters used by generated provider tables.
//!
//! A discovered provider takes `&T`, `&dyn LogValue` or one of the capability
//! views. The synthesized table wraps each call in a non-capturing closure
//! that goes through one of these functions, so every table entry has the
//! uniform [`Formatter`](crate::Formatter) signature.

use crate::value::{ArrayView, CollectionView, LogValue, MapView, ResponseView, VariantView};

pub fn erased(value: &dyn LogValue, provider: fn(&dyn LogValue) -> String) -> String {
    provider(value)
}

/// Downcasts to `T` first; a value of another type gets its fallback.
pub fn concrete<T: LogValue>(value: &dyn LogValue, provider: fn(&T) -> String) -> String {
    match value.downcast_ref::<T>() {
        Some(inner) => provider(inner),
        None => value.fallback(),
    }
}

pub fn collection(value: &dyn LogValue, provider: fn(&dyn CollectionView) -> String) -> String {
    match value.as_collection() {
        Some(view) => provider(view),
        None => value.fallback(),
    }
}

pub fn map(value: &dyn LogValue, provider: fn(&dyn MapView) -> String) -> String {
    match value.as_map() {
        Some(view) => provider(view),
        None => value.fallback(),
    }
}

pub fn array(value: &dyn LogValue, provider: fn(&dyn ArrayView) -> String) -> String {
    match value.as_array() {
        Some(view) => provider(view),
        None => value.fallback(),
    }
}

pub fn variant(value: &dyn LogValue, provider: fn(&dyn VariantView) -> String) -> String {
    match value.as_variant() {
        Some(view) => provider(view),
        None => value.fallback(),
    }
}

pub fn response(value: &dyn LogValue, provider: fn(&dyn ResponseView) -> String) -> String {
    match value.as_response() {
        Some(view) => provider(view),
        None => value.fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Formatter;

    #[derive(Debug)]
    struct Money {
        amount: u64,
    }
    impl LogValue for Money {}

    fn money(value: &Money) -> String {
        format!("${}", value.amount)
    }

    fn items(view: &dyn CollectionView) -> String {
        format!("{} items", view.len())
    }

    #[test]
    fn test_concrete_closure_coerces_to_formatter() {
        let formatter: Formatter = |value| concrete::<Money>(value, money);
        assert_eq!(formatter(&Money { amount: 5 }), "$5");
        assert_eq!(formatter(&3u8), "3");
    }

    #[test]
    fn test_view_adapter() {
        let formatter: Formatter = |value| collection(value, items);
        assert_eq!(formatter(&vec![1u8, 2, 3]), "3 items");
        assert_eq!(formatter(&Money { amount: 1 }), "Money { amount: 1 }");
    }

    #[test]
    fn test_erased_passes_through() {
        let formatter: Formatter = |value| erased(value, |v| v.simple_name().to_string());
        assert_eq!(formatter(&Money { amount: 1 }), "Money");
    }
}
