//! The built-in formatter catalog and the tables it seeds.
//!
//! Every formatter degrades to the value's fallback when handed a value of
//! the wrong shape, so a misrouted binding can never fail.

use std::borrow::Cow;
use std::fmt::Display;
use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::binding::ProviderBinding;
use crate::impls::resolve_element_name;
use crate::value::{
    ArrayView, CollectionView, LogValue, MapView, ResponseView, TypeKey, VariantView,
};

/// `Display` of the exact type `T`.
pub fn display<T: LogValue + Display>(value: &dyn LogValue) -> String {
    match value.downcast_ref::<T>() {
        Some(inner) => inner.to_string(),
        None => value.fallback(),
    }
}

/// `u8[16]`: element name and length, never the contents.
pub fn array(value: &dyn LogValue) -> String {
    match value.as_array() {
        Some(view) => format!("{}[{}]", view.element_name(), view.len()),
        None => value.fallback(),
    }
}

/// `Color:Red`
pub fn enumeration(value: &dyn LogValue) -> String {
    match value.as_variant() {
        Some(view) => format!("{}:{}", view.type_name(), view.variant_name()),
        None => value.fallback(),
    }
}

/// Streams render as their type name; contents are never read.
pub fn input_stream(value: &dyn LogValue) -> String {
    value.simple_name().to_string()
}

pub fn output_stream(value: &dyn LogValue) -> String {
    value.simple_name().to_string()
}

/// `[404-Not Found,false]`
pub fn response(value: &dyn LogValue) -> String {
    match value.as_response() {
        Some(view) => format!(
            "[{}-{},{}]",
            view.status_code(),
            view.reason(),
            view.has_body()
        ),
        None => value.fallback(),
    }
}

/// `empty HashMap` or `HashMap 2 of [String+i32]`
pub fn map(value: &dyn LogValue) -> String {
    let Some(view) = value.as_map() else {
        return value.fallback();
    };
    if view.is_empty() {
        return format!("empty {}", view.type_name());
    }
    let first = view.first_entry();
    let key = resolve_element_name(view.declared_key(), first.map(|(k, _)| k));
    let val = resolve_element_name(view.declared_value(), first.map(|(_, v)| v));
    format!("{} {} of [{}+{}]", view.type_name(), view.len(), key, val)
}

/// `empty Vec` or `Vec(3i32)`
pub fn collection(value: &dyn LogValue) -> String {
    let Some(view) = value.as_collection() else {
        return value.fallback();
    };
    if view.is_empty() {
        return format!("empty {}", view.type_name());
    }
    let element = resolve_element_name(view.declared_element(), view.first());
    format!("{}({}{})", view.type_name(), view.len(), element)
}

const SOURCE: &str = "logval_core::catalog";

macro_rules! seed_display {
    ($out:ident; $($ty:ty),+ $(,)?) => {
        $($out.push(ProviderBinding::builtin(TypeKey::of::<$ty>(), SOURCE, display::<$ty>));)+
    };
}

macro_rules! seed_boxed_arrays {
    ($out:ident; $($ty:ty),+ $(,)?) => {
        $($out.push(ProviderBinding::builtin(TypeKey::of::<Box<[$ty]>>(), SOURCE, array));)+
    };
}

/// Exact-table seed: primitives, strings and boxed primitive slices.
pub fn builtin_exact() -> Vec<ProviderBinding> {
    let mut out = Vec::with_capacity(48);
    seed_display!(out;
        i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
        String, &'static str, Box<str>, Arc<str>, Cow<'static, str>, io::Error,
    );
    seed_boxed_arrays!(out;
        i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
    );
    out
}

/// Assignable-table seed, in match order.
pub fn builtin_assignable() -> Vec<ProviderBinding> {
    vec![
        ProviderBinding::builtin(TypeKey::of::<dyn CollectionView>(), SOURCE, collection),
        ProviderBinding::builtin(TypeKey::of::<dyn MapView>(), SOURCE, map),
        ProviderBinding::builtin(TypeKey::of::<dyn ArrayView>(), SOURCE, array),
        ProviderBinding::builtin(TypeKey::of::<dyn VariantView>(), SOURCE, enumeration),
        ProviderBinding::builtin(TypeKey::of::<dyn Read>(), SOURCE, input_stream),
        ProviderBinding::builtin(TypeKey::of::<dyn Write>(), SOURCE, output_stream),
        ProviderBinding::builtin(TypeKey::of::<dyn ResponseView>(), SOURCE, response),
    ]
}
