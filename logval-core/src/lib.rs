//! logval-core: typed-value formatting dispatch for service call logging.
//!
//! Arguments and results of service calls are rendered as short strings
//! (`Vec(3i32)`, `u8[16]`, `Color:Red`, `$5`) instead of dumping their
//! contents. A [`Registry`] maps each value to a formatter in two tiers:
//!
//! 1. an exact table keyed by the value's runtime [`TypeKey`];
//! 2. an ordered table of capabilities (`dyn CollectionView`, `dyn Read`,
//!    user marker traits). The first one the value is assignable to wins and
//!    is cached in the exact table for the runtime type.
//!
//! User formatters are declared with `#[log_value(...)]` and collected at
//! build time by `logval-build`, which writes a Rust source file the program
//! includes at its crate root with [`include_providers!`]:
//!
//! ```rust,ignore
//! // src/main.rs
//! logval_core::include_providers!();
//!
//! let registry = Registry::builder()
//!     .source(&GeneratedProviders)
//!     .build();
//! ```

pub mod adapt;
pub mod binding;
pub mod call;
pub mod catalog;
pub mod config;
#[cfg(feature = "http")]
mod http_response;
mod impls;
pub mod prelude;
pub mod registry;
pub mod resolve;
pub mod value;

pub use binding::{Formatter, Origin, ProviderBinding, ProviderSource};
pub use call::{Arg, CallLog};
pub use config::RegistryConfig;
pub use logval_macros::log_value;
pub use registry::{DispatchStats, Registry, RegistryBuilder, Route, StatsSnapshot};
pub use value::{
    simple_type_name, ArrayView, CollectionView, LogValue, MapView, Presence, ResponseView,
    TypeKey, VariantView,
};
