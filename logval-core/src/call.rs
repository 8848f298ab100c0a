//! Service call logging on top of the registry.
//!
//! ```rust,ignore
//! let call = registry.start_call("OrderService", "place", &[Arg::value("order", &order)]);
//! match service.place(&order) {
//!     Ok(id) => call.succeed(Some(&id)),
//!     Err(err) => call.fail(&err),
//! }
//! ```
//!
//! Emits `place(Order#7) started.`, then
//! `place(Order#7):42 [0.013s] succeed.` or `... failed.`.

use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::registry::Registry;
use crate::value::LogValue;

/// One call argument.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Value {
        name: &'a str,
        value: Option<&'a dyn LogValue>,
    },
    /// Sensitive argument; its value is never formatted.
    Masked { name: &'a str, mask: &'a str },
}

impl<'a> Arg<'a> {
    pub fn value(name: &'a str, value: &'a dyn LogValue) -> Self {
        Self::Value {
            name,
            value: Some(value),
        }
    }

    pub fn optional(name: &'a str, value: Option<&'a dyn LogValue>) -> Self {
        Self::Value { name, value }
    }

    pub fn masked(name: &'a str, mask: &'a str) -> Self {
        Self::Masked { name, mask }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Self::Value { name, .. } | Self::Masked { name, .. } => *name,
        }
    }

    fn render(&self, registry: &Registry) -> String {
        match self {
            Self::Value { value, .. } => registry.format_value(*value),
            Self::Masked { name, mask } if mask.is_empty() => name.to_string(),
            Self::Masked { mask, .. } => mask.to_string(),
        }
    }
}

/// An in-flight call. Dropping it without closing logs nothing further.
#[derive(Debug)]
pub struct CallLog<'r> {
    registry: &'r Registry,
    service: String,
    method: String,
    params: String,
    started: Instant,
}

impl<'r> CallLog<'r> {
    pub fn params(&self) -> &str {
        &self.params
    }

    /// `<method>(<params>) future started.`; the call stays open.
    pub fn future_started(&self) -> String {
        let message = format!("{}({}) future started.", self.method, self.params);
        info!(service = %self.service, method = %self.method, params = %self.params, "{message}");
        message
    }

    pub fn succeed(self, result: Option<&dyn LogValue>) -> String {
        let rendered = self.registry.format_value(result);
        self.close_ok(rendered)
    }

    /// Success of a call without a result value.
    pub fn succeed_void(self) -> String {
        let rendered = self.registry.config().void_text.clone();
        self.close_ok(rendered)
    }

    pub fn fail(self, err: &dyn LogValue) -> String {
        let rendered = self.registry.format(err);
        let elapsed = self.started.elapsed();
        let message = self.closing(&rendered, elapsed, "failed");
        error!(
            service = %self.service,
            method = %self.method,
            params = %self.params,
            result = %rendered,
            elapsed = elapsed.as_secs_f64(),
            "{message}"
        );
        message
    }

    fn close_ok(self, rendered: String) -> String {
        let elapsed = self.started.elapsed();
        let message = self.closing(&rendered, elapsed, "succeed");
        info!(
            service = %self.service,
            method = %self.method,
            params = %self.params,
            result = %rendered,
            elapsed = elapsed.as_secs_f64(),
            "{message}"
        );
        message
    }

    fn closing(&self, result: &str, elapsed: Duration, outcome: &str) -> String {
        format!(
            "{}({}):{} [{:.3}s] {}.",
            self.method,
            self.params,
            result,
            elapsed.as_secs_f64(),
            outcome
        )
    }
}

impl Registry {
    /// Logs `<method>(<params>) started.` and returns the open call.
    pub fn start_call(&self, service: &str, method: &str, args: &[Arg<'_>]) -> CallLog<'_> {
        let params = args
            .iter()
            .map(|arg| arg.render(self))
            .collect::<Vec<_>>()
            .join(",");
        info!(service = service, method = method, params = %params, "{}({}) started.", method, params);
        CallLog {
            registry: self,
            service: service.to_string(),
            method: method.to_string(),
            params,
            started: Instant::now(),
        }
    }

    /// Runs `call` between a start and a success or failure entry.
    pub fn observe<T, E, F>(&self, service: &str, method: &str, args: &[Arg<'_>], call: F) -> Result<T, E>
    where
        T: LogValue,
        E: LogValue,
        F: FnOnce() -> Result<T, E>,
    {
        let log = self.start_call(service, method, args);
        let outcome = call();
        match &outcome {
            Ok(value) => {
                log.succeed(Some(value as &dyn LogValue));
            }
            Err(err) => {
                log.fail(err);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_params_joined() {
        let registry = Registry::new();
        let amount = 5u32;
        let name = String::from("ann");
        let call = registry.start_call(
            "Svc",
            "pay",
            &[Arg::value("amount", &amount), Arg::value("name", &name), Arg::optional("note", None)],
        );
        assert_eq!(call.params(), "5,ann,null");
    }

    #[test]
    fn test_masked_argument() {
        let registry = Registry::new();
        let call = registry.start_call(
            "Svc",
            "login",
            &[Arg::masked("password", "***"), Arg::masked("token", "")],
        );
        assert_eq!(call.params(), "***,token");
    }

    #[test]
    fn test_succeed_message() {
        let registry = Registry::new();
        let id = 42u64;
        let message = registry.start_call("Svc", "place", &[]).succeed(Some(&id));
        assert!(message.starts_with("place():42 ["));
        assert!(message.ends_with("s] succeed."));
    }

    #[test]
    fn test_void_and_failure() {
        let registry = Registry::new();
        let void = registry.start_call("Svc", "ping", &[]).succeed_void();
        assert!(void.starts_with("ping():void ["));

        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let failed = registry.start_call("Svc", "ping", &[]).fail(&err);
        assert!(failed.starts_with("ping():boom ["));
        assert!(failed.ends_with("s] failed."));
    }

    #[test]
    fn test_future_started() {
        let registry = Registry::new();
        let call = registry.start_call("Svc", "fetch", &[Arg::value("id", &1u8)]);
        assert_eq!(call.future_started(), "fetch(1) future started.");
        assert!(call.succeed(None).starts_with("fetch(1):null ["));
    }

    #[test]
    fn test_observe_returns_outcome() {
        let registry = Registry::new();
        let ok: Result<u8, String> = registry.observe("Svc", "one", &[], || Ok(1));
        assert_eq!(ok, Ok(1));
        let err: Result<u8, String> = registry.observe("Svc", "one", &[], || Err("no".to_string()));
        assert_eq!(err, Err("no".to_string()));
    }
}
