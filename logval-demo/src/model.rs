//! Domain types passed through the order service.

use logval_core::{log_value, loggable, loggable_enum};

/// Values that must never reach the logs verbatim.
pub trait Sensitive {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money(pub u32);

impl Money {
    #[log_value(exact(self::Money))]
    pub fn render(value: &Money) -> String {
        format!("${}", value.0)
    }
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: u32,
    pub total: Money,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CardNumber(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Web,
    Phone,
}

#[derive(Debug)]
pub struct Declined {
    pub reason: String,
}

loggable!(Money, Order, Declined);
loggable!(CardNumber: dyn Sensitive);
loggable_enum!(Channel);

impl Sensitive for CardNumber {}
