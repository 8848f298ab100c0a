//! Formatters for the order service's values.

use logval_core::{log_value, CollectionView, LogValue};

use crate::model::{Declined, Order};

/// Outranked by `order_id`.
#[allow(dead_code)]
#[log_value(exact(crate::model::Order), priority = 1)]
pub fn order_brief(_value: &Order) -> String {
    "Order".to_string()
}

#[log_value(exact(crate::model::Order), priority = 5)]
pub fn order_id(value: &Order) -> String {
    format!("Order#{}", value.id)
}

#[log_value(exact(crate::model::Declined))]
pub(crate) fn declined(value: &Declined) -> String {
    format!("declined: {}", value.reason)
}

/// Replaces the built-in `Vec(3i32)` style for every collection.
#[log_value(assignable(dyn logval_core::CollectionView))]
pub fn items(value: &dyn CollectionView) -> String {
    format!("{} items", value.len())
}

#[log_value(assignable(dyn crate::model::Sensitive))]
pub fn redacted(value: &dyn LogValue) -> String {
    format!("<{} redacted>", value.simple_name())
}

#[allow(dead_code)]
pub struct Verbose;

impl Verbose {
    /// Not a provider: it needs a `Verbose` instance, so the build reports
    /// it and leaves it out of the tables.
    #[log_value(exact(crate::model::Order), priority = 9)]
    pub fn order(&self, value: &Order) -> String {
        format!("{value:?}")
    }
}
