//! The `#[log_value]` provider declaration attribute.
//!
//! The attribute is inert at compile time: it hands the annotated function
//! back unchanged. Its arguments are read by `logval-build`, which scans the
//! crate source from `build.rs` and generates the provider tables.
//!
//! ```rust,ignore
//! #[log_value(exact(crate::Money), priority = 1)]
//! pub fn money(value: &crate::Money) -> String {
//!     format!("${}", value.amount)
//! }
//! ```
//!
//! Only the argument syntax is checked here. Shape problems (a `self`
//! receiver, wrong arity, wrong return type) are reported as build warnings by
//! discovery, which then skips the function.

use proc_macro::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Meta, Token};

const KNOWN_KEYS: &[&str] = &["exact", "assignable", "priority"];

/// Marks a function as a log-value provider.
///
/// Recognized arguments: `exact(Type, ...)`, `assignable(Type, ...)` and
/// `priority = <integer>` (default 0).
#[proc_macro_attribute]
pub fn log_value(attr: TokenStream, item: TokenStream) -> TokenStream {
    let item2 = proc_macro2::TokenStream::from(item);
    match check_args(attr.into()) {
        Ok(()) => item2.into(),
        Err(err) => {
            let compile_error = err.to_compile_error();
            quote!(#compile_error #item2).into()
        }
    }
}

fn check_args(attr: proc_macro2::TokenStream) -> syn::Result<()> {
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(attr)?;
    for meta in &metas {
        let path = meta.path();
        let known = KNOWN_KEYS.iter().any(|key| path.is_ident(key));
        if !known {
            return Err(syn::Error::new_spanned(
                path,
                "unknown log_value argument, expected `exact(..)`, `assignable(..)` or `priority = N`",
            ));
        }
        match meta {
            Meta::List(_) if path.is_ident("priority") => {
                return Err(syn::Error::new_spanned(meta, "expected `priority = <integer>`"));
            }
            Meta::NameValue(_) if !path.is_ident("priority") => {
                return Err(syn::Error::new_spanned(meta, "expected a parenthesized type list"));
            }
            Meta::Path(_) => {
                return Err(syn::Error::new_spanned(meta, "missing value"));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn test_accepts_full_declaration() {
        let args = quote!(exact(Money, crate::Order), assignable(dyn Audit), priority = -2);
        assert!(check_args(args).is_ok());
    }

    #[test]
    fn test_accepts_empty_arguments() {
        assert!(check_args(quote!()).is_ok());
    }

    #[test]
    fn test_rejects_unknown_key() {
        let err = check_args(quote!(exakt(Money))).unwrap_err();
        assert!(err.to_string().contains("unknown log_value argument"));
    }

    #[test]
    fn test_rejects_priority_list() {
        assert!(check_args(quote!(priority(3))).is_err());
    }

    #[test]
    fn test_rejects_bare_key() {
        assert!(check_args(quote!(exact)).is_err());
    }
}
