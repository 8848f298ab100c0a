//! Reading `#[log_value(...)]` declarations.

use quote::ToTokens;
use std::fmt;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ExprLit, ExprUnary, Lit, Meta, Token, Type, UnOp};

pub const ATTRIBUTE: &str = "log_value";

/// Arguments of one `#[log_value]` attribute.
#[derive(Clone, Default)]
pub struct ProviderArgs {
    pub exact: Vec<Type>,
    pub assignable: Vec<Type>,
    pub priority: i32,
}

fn type_list(types: &[Type]) -> Vec<String> {
    types
        .iter()
        .map(|ty| ty.to_token_stream().to_string())
        .collect()
}

impl fmt::Debug for ProviderArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderArgs")
            .field("exact", &type_list(&self.exact))
            .field("assignable", &type_list(&self.assignable))
            .field("priority", &self.priority)
            .finish()
    }
}

/// Finds the provider attribute; matches `log_value`, `logval_core::log_value`
/// and any other path ending in `log_value`.
pub fn find_attribute(attrs: &[Attribute]) -> Option<&Attribute> {
    attrs.iter().find(|attr| {
        attr.path()
            .segments
            .last()
            .is_some_and(|segment| segment.ident == ATTRIBUTE)
    })
}

pub fn parse_args(attr: &Attribute) -> Result<ProviderArgs, String> {
    let mut args = ProviderArgs::default();
    let metas = match &attr.meta {
        Meta::Path(_) => return Ok(args),
        Meta::NameValue(_) => return Err("expected `#[log_value(...)]`".to_string()),
        Meta::List(list) => Punctuated::<Meta, Token![,]>::parse_terminated
            .parse2(list.tokens.clone())
            .map_err(|e| e.to_string())?,
    };

    for meta in metas {
        let key = meta
            .path()
            .get_ident()
            .map(ToString::to_string)
            .unwrap_or_default();
        match (key.as_str(), meta) {
            ("exact", Meta::List(list)) => args.exact.extend(parse_types(list.tokens)?),
            ("assignable", Meta::List(list)) => {
                args.assignable.extend(parse_types(list.tokens)?)
            }
            ("priority", Meta::NameValue(nv)) => args.priority = parse_priority(&nv.value)?,
            (other, _) => return Err(format!("unsupported log_value argument `{other}`")),
        }
    }
    Ok(args)
}

fn parse_types(tokens: proc_macro2::TokenStream) -> Result<Vec<Type>, String> {
    Punctuated::<Type, Token![,]>::parse_terminated
        .parse2(tokens)
        .map(|types| types.into_iter().collect())
        .map_err(|e| format!("invalid target type: {e}"))
}

fn parse_priority(expr: &Expr) -> Result<i32, String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(int), ..
        }) => int.base10_parse::<i32>().map_err(|e| e.to_string()),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => parse_priority(expr).map(|value| -value),
        _ => Err("priority must be an integer literal".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(source: &str) -> Attribute {
        let item: syn::ItemFn = syn::parse_str(&format!("{source} fn f() {{}}")).unwrap();
        item.attrs.into_iter().next().unwrap()
    }

    #[test]
    fn test_full_declaration() {
        let args = parse_args(&attr(
            "#[log_value(exact(crate::Money, Order), assignable(dyn Audit), priority = 5)]",
        ))
        .unwrap();
        assert_eq!(args.exact.len(), 2);
        assert_eq!(args.assignable[0].to_token_stream().to_string(), "dyn Audit");
        assert_eq!(args.priority, 5);
    }

    #[test]
    fn test_negative_priority() {
        let args = parse_args(&attr("#[log_value(exact(A), priority = -3)]")).unwrap();
        assert_eq!(args.priority, -3);
    }

    #[test]
    fn test_bare_attribute_has_no_targets() {
        let args = parse_args(&attr("#[log_value]")).unwrap();
        assert!(args.exact.is_empty() && args.assignable.is_empty());
    }

    #[test]
    fn test_unknown_argument() {
        let err = parse_args(&attr("#[log_value(exakt(A))]")).unwrap_err();
        assert!(err.contains("exakt"));
    }

    #[test]
    fn test_qualified_attribute_is_found() {
        let item: syn::ItemFn =
            syn::parse_str("#[inline] #[logval_core::log_value(exact(A))] fn f() {}").unwrap();
        assert!(find_attribute(&item.attrs).is_some());
    }

    #[test]
    fn test_debug_prints_types() {
        let args = parse_args(&attr("#[log_value(exact(Vec<u8>), priority = 2)]")).unwrap();
        let debug = format!("{args:?}");
        assert!(debug.contains("Vec < u8 >"), "{debug}");
        assert!(debug.contains("priority: 2"));
    }
}
