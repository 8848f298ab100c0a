//! Generated tables wired into a live registry.

use super::*;
use logval_core::{Origin, Route};
use std::collections::VecDeque;

fn order() -> Order {
    Order {
        id: 7,
        total: Money(5),
        lines: vec!["tea".to_string()],
    }
}

#[test]
fn test_associated_function_provider() {
    assert_eq!(registry().format(&Money(5)), "$5");
}

#[test]
fn test_higher_priority_provider_wins() {
    assert_eq!(registry().format(&order()), "Order#7");
}

#[test]
fn test_collection_capability_is_promoted() {
    let registry = registry();
    let values = vec![1, 2, 3];
    assert!(matches!(registry.explain(&values), Route::Assignable { index: 0, .. }));
    assert_eq!(registry.format(&values), "3 items");
    assert!(matches!(registry.explain(&values), Route::Exact(b) if b.origin == Origin::Promoted));
    assert_eq!(registry.format(&values), "3 items");

    let stats = registry.stats();
    assert_eq!(stats.promotions, 1);
    assert_eq!(stats.assignable_hits, 1);
    assert_eq!(stats.exact_hits, 1);

    let queue: VecDeque<u8> = VecDeque::from(vec![1, 2]);
    assert_eq!(registry.format(&queue), "2 items");
}

#[test]
fn test_user_capability_after_builtins() {
    let registry = registry();
    let card = CardNumber("4111".to_string());
    assert_eq!(registry.format(&card), "<CardNumber redacted>");
    assert_eq!(registry.assignable_bindings().len(), 8);
}

#[test]
fn test_instance_provider_is_not_generated() {
    let exact = GeneratedProviders.exact();
    assert!(exact.iter().all(|b| !b.source.contains("Verbose")));
    let sources: Vec<_> = exact.iter().map(|b| b.source).collect();
    assert!(sources.contains(&"crate::providers::order_id"));
    assert!(!sources.contains(&"crate::providers::order_brief"));
    assert!(sources.contains(&"<crate::model::Money>::render"));
}

#[test]
fn test_absent_value_uses_placeholder() {
    assert_eq!(registry().format_value(None), "null");
}

#[test]
fn test_builtins_still_apply() {
    let registry = registry();
    assert_eq!(registry.format(&Channel::Phone), "Channel:Phone");
    assert_eq!(registry.format(&42u32), "42");
}

#[test]
fn test_call_lines() {
    let registry = registry();
    let order = order();
    let card = CardNumber("4111".to_string());
    let call = registry.start_call(
        "OrderService",
        "place",
        &[
            Arg::value("order", &order),
            Arg::value("card", &card),
            Arg::value("channel", &Channel::Web),
            Arg::masked("pin", "****"),
        ],
    );
    assert_eq!(call.params(), "Order#7,<CardNumber redacted>,Channel:Web,****");
    let line = call.succeed(Some(&order.total));
    assert!(line.starts_with("place(Order#7,<CardNumber redacted>,Channel:Web,****):$5 ["));
    assert!(line.ends_with("s] succeed."));
}

#[test]
fn test_observe_failure() {
    let registry = registry();
    let order = order();
    let outcome = registry.observe("OrderService", "place", &[Arg::value("order", &order)], || {
        place_order(&order, &CardNumber(String::new()), Channel::Phone)
    });
    let declined = outcome.unwrap_err();
    assert_eq!(registry.format(&declined), "declined: no card for Phone order 7");
}
