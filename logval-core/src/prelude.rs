//! Common imports for programs that declare providers and log calls.

pub use crate::binding::ProviderSource;
pub use crate::call::Arg;
pub use crate::registry::Registry;
pub use crate::value::{
    ArrayView, CollectionView, LogValue, MapView, ResponseView, TypeKey, VariantView,
};
pub use crate::{log_value, loggable, loggable_enum};
