//! `LogValue` implementations for standard library types.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::fmt::Debug;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::value::{
    simple_type_name, ArrayView, CollectionView, LogValue, MapView, Presence, TypeKey,
};

macro_rules! plain_values {
    ($($ty:ty),+ $(,)?) => {
        $(impl LogValue for $ty {})+
    };
}

plain_values!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
    String, &'static str, Box<str>, Arc<str>, Cow<'static, str>, Duration, io::Error,
);

impl<T: LogValue> LogValue for Option<T> {
    fn presence(&self) -> Presence<'_> {
        match self {
            Some(inner) => Presence::Inner(inner),
            None => Presence::Absent,
        }
    }
}

impl LogValue for Box<dyn LogValue> {
    fn declared_name() -> Option<&'static str> {
        None
    }

    fn presence(&self) -> Presence<'_> {
        Presence::Inner(self.as_ref())
    }
}

impl LogValue for Arc<dyn LogValue> {
    fn declared_name() -> Option<&'static str> {
        None
    }

    fn presence(&self) -> Presence<'_> {
        Presence::Inner(self.as_ref())
    }
}

/// Resolves the element a wrapper stands for; containers keep the wrapper
/// as their first element, so names come from what it wraps.
fn element_name(value: Option<&dyn LogValue>) -> Option<&'static str> {
    let mut current = value?;
    loop {
        match current.presence() {
            Presence::Present => return Some(current.simple_name()),
            Presence::Absent => return None,
            Presence::Inner(inner) => current = inner,
        }
    }
}

pub(crate) fn resolve_element_name(
    declared: Option<&'static str>,
    first: Option<&dyn LogValue>,
) -> &'static str {
    declared.or_else(|| element_name(first)).unwrap_or("?")
}

macro_rules! collection_view_body {
    ($ty:ident) => {
        fn len(&self) -> usize {
            $ty::len(self)
        }

        fn type_name(&self) -> &'static str {
            simple_type_name(std::any::type_name::<Self>())
        }

        fn declared_element(&self) -> Option<&'static str> {
            T::declared_name()
        }

        fn first(&self) -> Option<&dyn LogValue> {
            self.iter().next().map(|item| item as &dyn LogValue)
        }
    };
}

macro_rules! collection_values {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl<T: LogValue> CollectionView for $ty<T> {
                collection_view_body!($ty);
            }

            impl<T: LogValue> LogValue for $ty<T> {
                fn as_collection(&self) -> Option<&dyn CollectionView> {
                    Some(self)
                }
            }
        )+
    };
}

collection_values!(Vec, VecDeque, LinkedList, BTreeSet);

impl<T, S> CollectionView for HashSet<T, S>
where
    T: LogValue,
    S: std::hash::BuildHasher + Send + Sync + 'static,
{
    collection_view_body!(HashSet);
}

impl<T, S> LogValue for HashSet<T, S>
where
    T: LogValue,
    S: std::hash::BuildHasher + Send + Sync + 'static,
{
    fn as_collection(&self) -> Option<&dyn CollectionView> {
        Some(self)
    }
}

impl<K, V, S> MapView for HashMap<K, V, S>
where
    K: LogValue,
    V: LogValue,
    S: std::hash::BuildHasher + Send + Sync + 'static,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn type_name(&self) -> &'static str {
        simple_type_name(std::any::type_name::<Self>())
    }

    fn declared_key(&self) -> Option<&'static str> {
        K::declared_name()
    }

    fn declared_value(&self) -> Option<&'static str> {
        V::declared_name()
    }

    fn first_entry(&self) -> Option<(&dyn LogValue, &dyn LogValue)> {
        self.iter()
            .next()
            .map(|(k, v)| (k as &dyn LogValue, v as &dyn LogValue))
    }
}

impl<K, V, S> LogValue for HashMap<K, V, S>
where
    K: LogValue,
    V: LogValue,
    S: std::hash::BuildHasher + Send + Sync + 'static,
{
    fn as_map(&self) -> Option<&dyn MapView> {
        Some(self)
    }
}

impl<K: LogValue, V: LogValue> MapView for BTreeMap<K, V> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn type_name(&self) -> &'static str {
        simple_type_name(std::any::type_name::<Self>())
    }

    fn declared_key(&self) -> Option<&'static str> {
        K::declared_name()
    }

    fn declared_value(&self) -> Option<&'static str> {
        V::declared_name()
    }

    fn first_entry(&self) -> Option<(&dyn LogValue, &dyn LogValue)> {
        self.iter()
            .next()
            .map(|(k, v)| (k as &dyn LogValue, v as &dyn LogValue))
    }
}

impl<K: LogValue, V: LogValue> LogValue for BTreeMap<K, V> {
    fn as_map(&self) -> Option<&dyn MapView> {
        Some(self)
    }
}

impl<T: LogValue, const N: usize> ArrayView for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn element_name(&self) -> &'static str {
        resolve_element_name(T::declared_name(), self.first().map(|v| v as &dyn LogValue))
    }
}

impl<T: LogValue, const N: usize> LogValue for [T; N] {
    fn as_array(&self) -> Option<&dyn ArrayView> {
        Some(self)
    }
}

impl<T: LogValue> ArrayView for Box<[T]> {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn element_name(&self) -> &'static str {
        resolve_element_name(T::declared_name(), self.first().map(|v| v as &dyn LogValue))
    }
}

impl<T: LogValue> LogValue for Box<[T]> {
    fn as_array(&self) -> Option<&dyn ArrayView> {
        Some(self)
    }
}

fn read_key() -> TypeKey {
    TypeKey::of::<dyn Read>()
}

fn write_key() -> TypeKey {
    TypeKey::of::<dyn Write>()
}

macro_rules! stream_values {
    ($($ty:ty => [$($cap:ident),+]),+ $(,)?) => {
        $(
            impl LogValue for $ty {
                fn supertypes(&self) -> Vec<TypeKey> {
                    vec![$($cap()),+]
                }
            }
        )+
    };
}

stream_values!(
    File => [read_key, write_key],
    TcpStream => [read_key, write_key],
    io::Stdin => [read_key],
    io::Stdout => [write_key],
    io::Stderr => [write_key],
    io::Empty => [read_key],
    io::Sink => [write_key],
);

impl<R: Read + Debug + Send + Sync + 'static> LogValue for BufReader<R> {
    fn supertypes(&self) -> Vec<TypeKey> {
        vec![read_key()]
    }
}

impl<W: Write + Debug + Send + Sync + 'static> LogValue for BufWriter<W> {
    fn supertypes(&self) -> Vec<TypeKey> {
        vec![write_key()]
    }
}

impl<T: AsRef<[u8]> + Debug + Send + Sync + 'static> LogValue for Cursor<T> {
    fn supertypes(&self) -> Vec<TypeKey> {
        vec![read_key()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_presence() {
        let some: Option<i32> = Some(3);
        let none: Option<i32> = None;
        assert!(matches!(some.presence(), Presence::Inner(_)));
        assert!(matches!(none.presence(), Presence::Absent));
    }

    #[test]
    fn test_boxed_value_is_transparent() {
        let boxed: Box<dyn LogValue> = Box::new(5u8);
        match boxed.presence() {
            Presence::Inner(inner) => assert_eq!(inner.type_key(), TypeKey::of::<u8>()),
            _ => panic!("expected inner value"),
        }
        assert_eq!(<Box<dyn LogValue> as LogValue>::declared_name(), None);
    }

    #[test]
    fn test_collection_view_names() {
        let items = vec![1i64, 2, 3];
        let view = items.as_collection().unwrap();
        assert_eq!(view.len(), 3);
        assert_eq!(view.type_name(), "Vec");
        assert_eq!(view.declared_element(), Some("i64"));
    }

    #[test]
    fn test_erased_collection_uses_first_element() {
        let items: Vec<Box<dyn LogValue>> = vec![Box::new(String::from("a"))];
        let view = items.as_collection().unwrap();
        assert_eq!(view.declared_element(), None);
        assert_eq!(resolve_element_name(view.declared_element(), view.first()), "String");
    }

    #[test]
    fn test_array_view() {
        let bytes = [0u8; 16];
        let view = bytes.as_array().unwrap();
        assert_eq!(view.len(), 16);
        assert_eq!(view.element_name(), "u8");
    }

    #[test]
    fn test_streams_are_assignable_to_io_traits() {
        let sink: &dyn LogValue = &io::sink();
        assert!(sink.is_assignable_to(TypeKey::of::<dyn Write>()));
        assert!(!sink.is_assignable_to(TypeKey::of::<dyn Read>()));

        let cursor: &dyn LogValue = &Cursor::new(vec![1u8, 2, 3]);
        assert!(cursor.is_assignable_to(TypeKey::of::<dyn Read>()));
    }
}
