//! The value model: type identifiers, the `LogValue` descriptor trait and the
//! capability views that assignable dispatch matches against.
//!
//! There is no runtime reflection. A value describes itself through
//! `LogValue`: its exact `TypeKey`, the capabilities it can be viewed as, and
//! any extra supertype keys it wants to be assignable to.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable identifier of a concrete type or of a capability (trait object).
///
/// Equality and hashing use the `TypeId` only; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of `T`. Works for trait objects too: `TypeKey::of::<dyn CollectionView>()`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name as reported by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn simple_name(&self) -> &'static str {
        simple_type_name(self.name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strips the module path and generic arguments from a type name.
///
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec`, `dyn
/// logval_core::value::CollectionView` becomes `CollectionView`. Names that
/// are not paths (`[u8; 4]`, `&str`, tuples) are returned unchanged.
pub fn simple_type_name(full: &'static str) -> &'static str {
    let full = full.strip_prefix("dyn ").unwrap_or(full);
    if full.starts_with(['[', '(', '&', '*']) {
        return full;
    }
    let head = match full.find('<') {
        Some(idx) => &full[..idx],
        None => full,
    };
    match head.rfind("::") {
        Some(idx) => &head[idx + 2..],
        None => head,
    }
}

/// Blanket `Any` access, so `&dyn LogValue` can be downcast.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Whether a value is present, absent, or a transparent wrapper around
/// another value.
pub enum Presence<'a> {
    Present,
    Absent,
    Inner(&'a dyn LogValue),
}

/// A value that can be rendered into a log line.
///
/// Implementations only need to exist; every method has a default. Override
/// the capability views to make a type match the built-in assignable entries,
/// and `supertypes` to make it match user-declared capabilities.
///
/// ```rust,ignore
/// #[derive(Debug)]
/// struct Money { amount: u64 }
/// impl LogValue for Money {}
/// ```
pub trait LogValue: AsAny + fmt::Debug + Send + Sync + 'static {
    /// Exact runtime type of the value.
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Self>()
    }

    fn simple_name(&self) -> &'static str {
        simple_type_name(type_name::<Self>())
    }

    /// Simple name known from the static type, `None` for type-erased
    /// containers whose element type is only known at runtime.
    fn declared_name() -> Option<&'static str>
    where
        Self: Sized,
    {
        Some(simple_type_name(type_name::<Self>()))
    }

    fn presence(&self) -> Presence<'_> {
        Presence::Present
    }

    fn as_collection(&self) -> Option<&dyn CollectionView> {
        None
    }

    fn as_map(&self) -> Option<&dyn MapView> {
        None
    }

    fn as_array(&self) -> Option<&dyn ArrayView> {
        None
    }

    fn as_variant(&self) -> Option<&dyn VariantView> {
        None
    }

    fn as_response(&self) -> Option<&dyn ResponseView> {
        None
    }

    /// Extra capability keys this type is assignable to.
    fn supertypes(&self) -> Vec<TypeKey> {
        Vec::new()
    }

    fn is_assignable_to(&self, target: TypeKey) -> bool {
        if target == self.type_key() {
            return true;
        }
        let by_view = if target == TypeKey::of::<dyn CollectionView>() {
            self.as_collection().is_some()
        } else if target == TypeKey::of::<dyn MapView>() {
            self.as_map().is_some()
        } else if target == TypeKey::of::<dyn ArrayView>() {
            self.as_array().is_some()
        } else if target == TypeKey::of::<dyn VariantView>() {
            self.as_variant().is_some()
        } else if target == TypeKey::of::<dyn ResponseView>() {
            self.as_response().is_some()
        } else {
            false
        };
        by_view || self.supertypes().contains(&target)
    }

    /// Default textual representation used when nothing matches.
    fn fallback(&self) -> String {
        format!("{:?}", self)
    }
}

impl dyn LogValue {
    pub fn downcast_ref<T: LogValue>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: LogValue>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// A sized collection of elements.
pub trait CollectionView {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Simple name of the collection type itself.
    fn type_name(&self) -> &'static str;

    /// Element name from the static element type, if concrete.
    fn declared_element(&self) -> Option<&'static str>;

    fn first(&self) -> Option<&dyn LogValue>;
}

/// A key/value map.
pub trait MapView {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn type_name(&self) -> &'static str;

    fn declared_key(&self) -> Option<&'static str>;

    fn declared_value(&self) -> Option<&'static str>;

    fn first_entry(&self) -> Option<(&dyn LogValue, &dyn LogValue)>;
}

/// A fixed-length array or boxed slice.
pub trait ArrayView {
    fn len(&self) -> usize;

    fn element_name(&self) -> &'static str;
}

/// An enum value that can name its current variant.
pub trait VariantView {
    fn type_name(&self) -> &'static str;

    fn variant_name(&self) -> String;
}

/// An HTTP-response-like value.
pub trait ResponseView {
    fn status_code(&self) -> u16;

    fn reason(&self) -> &str;

    fn has_body(&self) -> bool;
}

/// Name of a unit variant taken from its `Debug` output.
///
/// `Red` stays `Red`; `Rgb(1, 2, 3)` and `Named { .. }` keep only the variant
/// identifier.
pub fn variant_name_of(debug: &str) -> String {
    let end = debug
        .find(|c: char| c == '(' || c == '{' || c.is_whitespace())
        .unwrap_or(debug.len());
    debug[..end].to_string()
}

/// Implements `LogValue` for plain types, optionally declaring the
/// capabilities they are assignable to.
///
/// ```rust,ignore
/// loggable!(Money, Order);
/// loggable!(Basket: dyn Auditable);
/// ```
#[macro_export]
macro_rules! loggable {
    ($ty:ty : $($cap:ty),+ $(,)?) => {
        impl $crate::LogValue for $ty {
            fn supertypes(&self) -> ::std::vec::Vec<$crate::TypeKey> {
                ::std::vec![$($crate::TypeKey::of::<$cap>()),+]
            }
        }
    };
    ($($ty:ty),+ $(,)?) => {
        $(impl $crate::LogValue for $ty {})+
    };
}

/// Implements `LogValue` and `VariantView` for enums, so they format as
/// `Type:Variant`.
#[macro_export]
macro_rules! loggable_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::VariantView for $ty {
                fn type_name(&self) -> &'static str {
                    $crate::simple_type_name(::std::any::type_name::<$ty>())
                }

                fn variant_name(&self) -> ::std::string::String {
                    $crate::value::variant_name_of(&::std::format!("{:?}", self))
                }
            }

            impl $crate::LogValue for $ty {
                fn as_variant(&self) -> ::std::option::Option<&dyn $crate::VariantView> {
                    ::std::option::Option::Some(self)
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Plain;
    impl LogValue for Plain {}

    trait Auditable {}

    #[derive(Debug)]
    struct Audited;
    crate::loggable!(Audited: dyn Auditable);

    #[test]
    fn test_simple_type_name() {
        assert_eq!(simple_type_name("alloc::vec::Vec<alloc::string::String>"), "Vec");
        assert_eq!(simple_type_name("i32"), "i32");
        assert_eq!(simple_type_name("dyn logval_core::value::CollectionView"), "CollectionView");
        assert_eq!(simple_type_name("[u8; 4]"), "[u8; 4]");
        assert_eq!(simple_type_name("&str"), "&str");
    }

    #[test]
    fn test_type_key_equality_ignores_name() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<&'static str>());
        assert_eq!(TypeKey::of::<Plain>().simple_name(), "Plain");
    }

    #[test]
    fn test_assignable_to_own_key_and_supertypes() {
        let value: &dyn LogValue = &Audited;
        assert!(value.is_assignable_to(TypeKey::of::<Audited>()));
        assert!(value.is_assignable_to(TypeKey::of::<dyn Auditable>()));
        assert!(!value.is_assignable_to(TypeKey::of::<dyn CollectionView>()));

        let plain: &dyn LogValue = &Plain;
        assert!(!plain.is_assignable_to(TypeKey::of::<dyn Auditable>()));
    }

    #[test]
    fn test_downcast_through_trait_object() {
        let value: &dyn LogValue = &Plain;
        assert!(value.is::<Plain>());
        assert!(value.downcast_ref::<Audited>().is_none());
        assert_eq!(value.type_key(), TypeKey::of::<Plain>());
    }

    #[test]
    fn test_variant_name_of() {
        assert_eq!(variant_name_of("Red"), "Red");
        assert_eq!(variant_name_of("Rgb(1, 2, 3)"), "Rgb");
        assert_eq!(variant_name_of("Named { x: 1 }"), "Named");
    }

    #[test]
    fn test_fallback_uses_debug() {
        assert_eq!(Plain.fallback(), "Plain");
    }
}
