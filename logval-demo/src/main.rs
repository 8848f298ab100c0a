//! Order service demo: call logging with build-time discovered formatters.
//!
//! Run with `RUST_LOG=info cargo run -p logval-demo` to see the JSON events.

mod model;
mod providers;

logval_core::include_providers!();

use logval_core::prelude::*;

use model::{CardNumber, Channel, Declined, Money, Order};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Registry with the built-in catalog and this crate's providers.
pub fn registry() -> Registry {
    Registry::builder().source(&GeneratedProviders).build()
}

fn place_order(order: &Order, card: &CardNumber, channel: Channel) -> Result<Money, Declined> {
    if card.0.is_empty() {
        return Err(Declined {
            reason: format!("no card for {channel:?} order {}", order.id),
        });
    }
    Ok(order.total)
}

fn main() {
    init_logging();
    let registry = registry();

    let order = Order {
        id: 7,
        total: Money(5),
        lines: vec!["tea".to_string(), "milk".to_string(), "bread".to_string()],
    };
    let card = CardNumber("4111111111111111".to_string());
    let channel = Channel::Web;

    let args = [
        Arg::value("order", &order),
        Arg::value("card", &card),
        Arg::value("lines", &order.lines),
        Arg::value("channel", &channel),
        Arg::masked("pin", "****"),
    ];
    let call = registry.start_call("OrderService", "place", &args);
    println!("{}", call.params());
    let line = match place_order(&order, &card, channel) {
        Ok(total) => call.succeed(Some(&total)),
        Err(declined) => call.fail(&declined),
    };
    println!("{line}");

    let refused = registry.observe("OrderService", "place", &[Arg::value("order", &order)], || {
        place_order(&order, &CardNumber(String::new()), Channel::Phone)
    });
    if let Err(declined) = refused {
        println!("{}", registry.format(&declined));
    }
}

#[cfg(test)]
mod tests;
