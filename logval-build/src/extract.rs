//! Provider extraction from Rust AST.
//!
//! Walks one parsed file and collects:
//! - `#[log_value]` functions (free functions and associated functions of
//!   inherent impls), validated against the provider contract
//! - module declarations, so discovery can tell which files are compiled
//!   and reachable from the crate root
//!
//! Bodies of functions are never entered; items nested in them are not
//! reachable by path.

use proc_macro2::Span;
use quote::ToTokens;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use syn::punctuated::Punctuated;
use syn::visit::Visit;
use syn::visit_mut::VisitMut;
use syn::{
    Attribute, FnArg, ImplItem, ImplItemFn, Item, ItemFn, ItemImpl, ItemMod, PathSegment,
    ReturnType, Signature, Type, TypeParamBound, Visibility,
};
use thiserror::Error;

use crate::attr::{self, ProviderArgs};
use crate::cfg::{CfgContext, CfgState};
use crate::error::{LogvalError, LogvalResult};
use crate::Diagnostic;

/// Capability view a provider parameter can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Collection,
    Map,
    Array,
    Variant,
    Response,
}

impl ViewKind {
    pub fn from_trait_name(name: &str) -> Option<Self> {
        match name {
            "CollectionView" => Some(Self::Collection),
            "MapView" => Some(Self::Map),
            "ArrayView" => Some(Self::Array),
            "VariantView" => Some(Self::Variant),
            "ResponseView" => Some(Self::Response),
            _ => None,
        }
    }

    pub fn trait_name(self) -> &'static str {
        match self {
            Self::Collection => "CollectionView",
            Self::Map => "MapView",
            Self::Array => "ArrayView",
            Self::Variant => "VariantView",
            Self::Response => "ResponseView",
        }
    }

    /// Function name in `logval_core::adapt`.
    pub fn adapter(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Map => "map",
            Self::Array => "array",
            Self::Variant => "variant",
            Self::Response => "response",
        }
    }
}

/// Validated parameter shape of a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputShape {
    /// `&dyn LogValue`
    Erased,
    /// `&T`; the rendered `T`
    Concrete(String),
    /// `&dyn CollectionView` and friends
    View(ViewKind),
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Erased => write!(f, "&dyn LogValue"),
            Self::Concrete(ty) => write!(f, "&{ty}"),
            Self::View(kind) => write!(f, "&dyn {}", kind.trait_name()),
        }
    }
}

impl Serialize for InputShape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A provider that passed shape validation.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredProvider {
    /// Path the generated table calls, e.g. `crate::fmt::money` or
    /// `<crate::model::Money>::render`.
    pub path: String,
    pub file: PathBuf,
    pub line: usize,
    pub visibility: &'static str,
    /// Enclosing module, relative to the crate root.
    #[serde(skip)]
    pub module: Vec<String>,
    pub exact: Vec<String>,
    pub assignable: Vec<String>,
    pub priority: i32,
    /// Position in the global visiting order (sorted files, then source order).
    pub order: usize,
    pub input: InputShape,
}

/// Why a `#[log_value]` function was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("invalid #[log_value] arguments: {0}")]
    InvalidArguments(String),
    #[error("requires an instance: providers cannot take a `self` receiver")]
    RequiresInstance,
    #[error("declared in a trait impl; use a free function or an inherent associated function")]
    TraitImpl,
    #[error("not visible from the crate root; declare it `pub` or `pub(crate)`")]
    NotVisible,
    #[error("async functions cannot be providers")]
    Async,
    #[error("unsafe functions cannot be providers")]
    Unsafe,
    #[error("generic functions cannot be providers")]
    Generic,
    #[error("expected exactly one parameter, found {0}")]
    Arity(usize),
    #[error("the parameter must be a shared reference")]
    ParamNotReference,
    #[error("must return `String`")]
    ReturnNotString,
    #[error("declares no exact or assignable targets")]
    NoTargets,
    #[error("a `&{param}` parameter only accepts exact targets")]
    ConcreteWithAssignable { param: String },
    #[error("exact target `{target}` does not match parameter `&{param}`")]
    TargetMismatch { param: String, target: String },
    #[error("a `&dyn {view}` parameter cannot serve assignable target `{target}`")]
    ViewMismatch { view: &'static str, target: String },
    #[error("unsupported trait object parameter `&dyn {0}`")]
    UnsupportedDyn(String),
    #[error("target path `{0}` climbs above the crate root")]
    PathAboveRoot(String),
    #[error("module `{0}` is not declared from the crate root")]
    ModuleNotDeclared(String),
    #[error("only compiled under `cfg({0})`, which cannot be decided here")]
    Conditional(String),
    #[error("belongs to the binary target; providers must be reachable from `lib.rs`")]
    BinaryOnly,
}

/// A `mod` item (inline or out-of-line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModDecl {
    pub path: Vec<String>,
    /// `pub`, `pub(crate)` or `pub(in crate..)`
    pub exported: bool,
    pub cfg: CfgState,
}

/// Everything extracted from one file.
#[derive(Debug, Default)]
pub struct FileScan {
    pub providers: Vec<DiscoveredProvider>,
    pub diagnostics: Vec<Diagnostic>,
    pub modules: Vec<ModDecl>,
}

/// Renders a type as compact source text (`crate::a::Money`, `Vec<u8>`).
pub fn render_type(ty: &Type) -> String {
    compact(ty.to_token_stream().to_string())
}

fn compact(tokens: String) -> String {
    tokens
        .replace(" :: ", "::")
        .replace(":: ", "::")
        .replace(" ::", "::")
        .replace(" < ", "<")
        .replace("< ", "<")
        .replace(" <", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&")
}

fn visibility_str(v: &Visibility) -> &'static str {
    match v {
        Visibility::Public(_) => "pub",
        Visibility::Restricted(r) => {
            if r.path.is_ident("crate") {
                "pub(crate)"
            } else if r.path.is_ident("super") {
                "pub(super)"
            } else if r.path.is_ident("self") {
                "pub(self)"
            } else if r.path.segments.first().is_some_and(|s| s.ident == "crate") {
                "pub(in crate)"
            } else {
                "pub(restricted)"
            }
        }
        Visibility::Inherited => "private",
    }
}

/// Visible from anywhere in the crate.
fn is_exported(v: &Visibility) -> bool {
    matches!(visibility_str(v), "pub" | "pub(crate)" | "pub(in crate)")
}

/// Rewrites `self::` and `super::` prefixes against the declaring module.
struct PathResolver<'a> {
    module: &'a [String],
    error: Option<String>,
}

impl VisitMut for PathResolver<'_> {
    fn visit_path_mut(&mut self, path: &mut syn::Path) {
        if path.leading_colon.is_none() {
            if let Err(original) = resolve_relative(path, self.module) {
                if self.error.is_none() {
                    self.error = Some(original);
                }
            }
        }
        syn::visit_mut::visit_path_mut(self, path);
    }
}

fn resolve_relative(path: &mut syn::Path, module: &[String]) -> Result<(), String> {
    let first = match path.segments.first() {
        Some(segment) if segment.ident == "self" || segment.ident == "super" => segment,
        _ => return Ok(()),
    };
    let mut base: Vec<String> = module.to_vec();
    let mut skip = 0;
    if first.ident == "self" {
        skip = 1;
    }
    for segment in path.segments.iter().skip(skip) {
        if segment.ident != "super" {
            break;
        }
        if base.pop().is_none() {
            return Err(path.to_token_stream().to_string());
        }
        skip += 1;
    }

    let span = Span::call_site();
    let mut segments: Punctuated<PathSegment, syn::Token![::]> = Punctuated::new();
    segments.push(PathSegment::from(syn::Ident::new("crate", span)));
    for name in &base {
        segments.push(PathSegment::from(syn::Ident::new(name, span)));
    }
    for segment in path.segments.iter().skip(skip) {
        segments.push(segment.clone());
    }
    path.segments = segments;
    Ok(())
}

/// Resolves a target type as seen from the crate root.
pub fn resolve_type(ty: &Type, module: &[String]) -> Result<Type, Rejection> {
    let mut resolved = ty.clone();
    let mut resolver = PathResolver {
        module,
        error: None,
    };
    resolver.visit_type_mut(&mut resolved);
    match resolver.error {
        Some(original) => Err(Rejection::PathAboveRoot(compact(original))),
        None => Ok(resolved),
    }
}

/// Last path segment with its generic arguments: `Money`, `Vec<u8>`.
fn type_signature(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path
            .path
            .segments
            .last()
            .map(|segment| compact(segment.to_token_stream().to_string()))
            .unwrap_or_default(),
        Type::Paren(paren) => type_signature(&paren.elem),
        Type::Group(group) => type_signature(&group.elem),
        other => render_type(other),
    }
}

fn is_string(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => {
            let segments: Vec<String> = type_path
                .path
                .segments
                .iter()
                .map(|s| s.ident.to_string())
                .collect();
            let last_plain = type_path
                .path
                .segments
                .last()
                .is_some_and(|s| s.arguments.is_none());
            last_plain
                && matches!(
                    segments.iter().map(String::as_str).collect::<Vec<_>>().as_slice(),
                    ["String"] | ["std", "string", "String"] | ["alloc", "string", "String"]
                )
        }
        _ => false,
    }
}

/// Name of the principal trait of a `dyn` type.
fn trait_object_name(ty: &Type) -> Option<String> {
    let Type::TraitObject(object) = ty else {
        return None;
    };
    object.bounds.iter().find_map(|bound| match bound {
        TypeParamBound::Trait(trait_bound) => trait_bound
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    })
}

fn classify_input(sig: &Signature) -> Result<(InputShape, Type), Rejection> {
    if sig.inputs.iter().any(|arg| matches!(arg, FnArg::Receiver(_))) {
        return Err(Rejection::RequiresInstance);
    }
    if sig.inputs.len() != 1 {
        return Err(Rejection::Arity(sig.inputs.len()));
    }
    let Some(FnArg::Typed(param)) = sig.inputs.first() else {
        return Err(Rejection::Arity(0));
    };
    let Type::Reference(reference) = param.ty.as_ref() else {
        return Err(Rejection::ParamNotReference);
    };
    if reference.mutability.is_some() {
        return Err(Rejection::ParamNotReference);
    }
    let elem = reference.elem.as_ref().clone();
    let shape = match trait_object_name(&elem) {
        Some(name) if name == "LogValue" => InputShape::Erased,
        Some(name) => match ViewKind::from_trait_name(&name) {
            Some(kind) => InputShape::View(kind),
            None => return Err(Rejection::UnsupportedDyn(name)),
        },
        None => InputShape::Concrete(render_type(&elem)),
    };
    Ok((shape, elem))
}

/// Checks the target lists against the parameter shape.
fn check_targets(
    shape: &InputShape,
    param: &Type,
    exact: &[Type],
    assignable: &[Type],
) -> Result<(), Rejection> {
    if exact.is_empty() && assignable.is_empty() {
        return Err(Rejection::NoTargets);
    }
    match shape {
        InputShape::Erased => Ok(()),
        InputShape::Concrete(rendered) => {
            if !assignable.is_empty() {
                return Err(Rejection::ConcreteWithAssignable {
                    param: rendered.clone(),
                });
            }
            let expected = type_signature(param);
            match exact.iter().find(|target| type_signature(target) != expected) {
                Some(target) => Err(Rejection::TargetMismatch {
                    param: rendered.clone(),
                    target: render_type(target),
                }),
                None => Ok(()),
            }
        }
        InputShape::View(kind) => {
            match assignable
                .iter()
                .find(|target| trait_object_name(target).as_deref() != Some(kind.trait_name()))
            {
                Some(target) => Err(Rejection::ViewMismatch {
                    view: kind.trait_name(),
                    target: render_type(target),
                }),
                None => Ok(()),
            }
        }
    }
}

/// Where a candidate function sits.
struct Site<'a> {
    name: String,
    sig: &'a Signature,
    vis: &'a Visibility,
    attrs: &'a [Attribute],
    impl_type: Option<&'a Type>,
    trait_impl: bool,
    impl_generic: bool,
    cfg: CfgState,
}

struct ProviderExtractor<'a> {
    file: &'a Path,
    cfg: &'a CfgContext,
    current_mod: Vec<String>,
    scan: FileScan,
}

impl<'a> ProviderExtractor<'a> {
    fn new(file: &'a Path, file_module: Vec<String>, cfg: &'a CfgContext) -> Self {
        Self {
            file,
            cfg,
            current_mod: file_module,
            scan: FileScan::default(),
        }
    }

    fn module_path(&self) -> Vec<String> {
        self.current_mod.clone()
    }

    fn call_path(&self, name: &str, impl_type: Option<&Type>) -> Result<String, Rejection> {
        let mut module = vec!["crate".to_string()];
        module.extend(self.current_mod.iter().cloned());
        match impl_type {
            None => {
                module.push(name.to_string());
                Ok(module.join("::"))
            }
            Some(Type::Path(type_path)) if type_path.qself.is_none() => {
                let rooted = type_path.path.leading_colon.is_some()
                    || type_path.path.segments.first().is_some_and(|s| {
                        s.ident == "crate" || s.ident == "self" || s.ident == "super"
                    });
                let ty = if rooted {
                    render_type(&resolve_type(&Type::Path(type_path.clone()), &self.current_mod)?)
                } else {
                    format!("{}::{}", module.join("::"), render_type(&Type::Path(type_path.clone())))
                };
                Ok(format!("<{ty}>::{name}"))
            }
            Some(other) => Err(Rejection::UnsupportedDyn(render_type(other))),
        }
    }

    fn validate(&self, site: &Site<'_>, args: &ProviderArgs) -> Result<DiscoveredProvider, Rejection> {
        let sig = site.sig;
        if sig.inputs.iter().any(|arg| matches!(arg, FnArg::Receiver(_))) {
            return Err(Rejection::RequiresInstance);
        }
        if site.trait_impl {
            return Err(Rejection::TraitImpl);
        }
        if !is_exported(site.vis) && !self.current_mod.is_empty() {
            return Err(Rejection::NotVisible);
        }
        if sig.asyncness.is_some() {
            return Err(Rejection::Async);
        }
        if sig.unsafety.is_some() {
            return Err(Rejection::Unsafe);
        }
        if site.impl_generic || !sig.generics.params.is_empty() {
            return Err(Rejection::Generic);
        }
        let (shape, param) = classify_input(sig)?;
        match &sig.output {
            ReturnType::Type(_, ty) if is_string(ty) => {}
            _ => return Err(Rejection::ReturnNotString),
        }
        check_targets(&shape, &param, &args.exact, &args.assignable)?;

        let module = self.module_path();
        let exact = args
            .exact
            .iter()
            .map(|ty| resolve_type(ty, &module).map(|t| render_type(&t)))
            .collect::<Result<Vec<_>, _>>()?;
        let assignable = args
            .assignable
            .iter()
            .map(|ty| resolve_type(ty, &module).map(|t| render_type(&t)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DiscoveredProvider {
            path: self.call_path(&site.name, site.impl_type)?,
            file: self.file.to_path_buf(),
            line: sig.ident.span().start().line,
            visibility: visibility_str(site.vis),
            module,
            exact,
            assignable,
            priority: args.priority,
            order: 0,
            input: shape,
        })
    }

    fn record(&mut self, site: Site<'_>) {
        let Some(attribute) = attr::find_attribute(site.attrs) else {
            return;
        };
        let outcome = match &site.cfg {
            CfgState::Disabled => return,
            CfgState::Conditional(predicate) => Err(Rejection::Conditional(predicate.clone())),
            CfgState::Enabled => attr::parse_args(attribute)
                .map_err(Rejection::InvalidArguments)
                .and_then(|args| self.validate(&site, &args)),
        };
        match outcome {
            Ok(provider) => self.scan.providers.push(provider),
            Err(rejection) => {
                let provider = self
                    .call_path(&site.name, site.impl_type)
                    .unwrap_or_else(|_| site.name.clone());
                self.scan.diagnostics.push(Diagnostic {
                    file: self.file.to_path_buf(),
                    line: Some(site.sig.ident.span().start().line),
                    provider: Some(provider),
                    message: rejection.to_string(),
                });
            }
        }
    }
}

impl<'ast> Visit<'ast> for ProviderExtractor<'_> {
    fn visit_item(&mut self, item: &'ast Item) {
        match item {
            Item::Mod(ItemMod {
                attrs,
                vis,
                ident,
                content,
                ..
            }) => {
                let mut path = self.current_mod.clone();
                path.push(ident.to_string());
                let cfg = self.cfg.state(attrs);
                let disabled = cfg == CfgState::Disabled;
                self.scan.modules.push(ModDecl {
                    path,
                    exported: is_exported(vis),
                    cfg,
                });
                if let (Some((_, items)), false) = (content, disabled) {
                    self.current_mod.push(ident.to_string());
                    for i in items {
                        self.visit_item(i);
                    }
                    self.current_mod.pop();
                }
            }

            Item::Fn(ItemFn { sig, vis, attrs, .. }) => {
                self.record(Site {
                    name: sig.ident.to_string(),
                    sig,
                    vis,
                    attrs,
                    impl_type: None,
                    trait_impl: false,
                    impl_generic: false,
                    cfg: self.cfg.state(attrs),
                });
            }

            Item::Impl(ItemImpl {
                attrs: impl_attrs,
                generics,
                trait_,
                self_ty,
                items,
                ..
            }) => {
                let impl_cfg = self.cfg.state(impl_attrs);
                if impl_cfg == CfgState::Disabled {
                    return;
                }
                for impl_item in items {
                    if let ImplItem::Fn(ImplItemFn { sig, vis, attrs, .. }) = impl_item {
                        let cfg = match self.cfg.state(attrs) {
                            CfgState::Enabled => impl_cfg.clone(),
                            own => own,
                        };
                        self.record(Site {
                            name: sig.ident.to_string(),
                            sig,
                            vis,
                            attrs,
                            impl_type: Some(self_ty.as_ref()),
                            trait_impl: trait_.is_some(),
                            impl_generic: !generics.params.is_empty(),
                            cfg,
                        });
                    }
                }
            }

            _ => {}
        }
    }
}

/// Extracts providers and module declarations from one file.
///
/// `module` is the file's module path from [`crate::scan::module_path`].
/// Items switched off under `cfg` are skipped; items whose `cfg` cannot be
/// decided are reported.
/// Returns a recoverable [`LogvalError::Parse`] when the file is not valid Rust.
pub fn extract_providers(
    path: &Path,
    module: Vec<String>,
    content: &str,
    cfg: &CfgContext,
) -> LogvalResult<FileScan> {
    let ast = syn::parse_file(content).map_err(|e| LogvalError::from_syn(path, &e))?;
    let mut extractor = ProviderExtractor::new(path, module, cfg);
    extractor.visit_file(&ast);
    Ok(extractor.scan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(module: &[&str], source: &str) -> FileScan {
        let module = module.iter().map(|s| s.to_string()).collect();
        extract_providers(Path::new("src/test.rs"), module, source, &CfgContext::unknown()).unwrap()
    }

    fn messages(scan: &FileScan) -> Vec<String> {
        scan.diagnostics.iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn test_free_function_provider() {
        let result = scan(
            &["fmt"],
            r#"
            #[log_value(exact(crate::Money), priority = 2)]
            pub fn money(value: &Money) -> String { String::new() }
            "#,
        );
        assert!(result.diagnostics.is_empty(), "{:?}", messages(&result));
        let provider = &result.providers[0];
        assert_eq!(provider.path, "crate::fmt::money");
        assert_eq!(provider.exact, vec!["crate::Money"]);
        assert_eq!(provider.priority, 2);
        assert_eq!(provider.input, InputShape::Concrete("Money".to_string()));
        assert_eq!(provider.line, 3);
    }

    #[test]
    fn test_instance_method_is_rejected() {
        let result = scan(
            &[],
            r#"
            pub struct Fmt;
            impl Fmt {
                #[log_value(exact(Money))]
                pub fn money(&self, value: &Money) -> String { String::new() }
            }
            "#,
        );
        assert!(result.providers.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].message.contains("requires an instance"));
        assert_eq!(result.diagnostics[0].provider.as_deref(), Some("<crate::Fmt>::money"));
    }

    #[test]
    fn test_associated_function_provider() {
        let result = scan(
            &["model"],
            r#"
            impl Money {
                #[log_value(exact(self::Money))]
                pub(crate) fn render(value: &Money) -> String { String::new() }
            }
            "#,
        );
        assert!(result.diagnostics.is_empty(), "{:?}", messages(&result));
        assert_eq!(result.providers[0].path, "<crate::model::Money>::render");
        assert_eq!(result.providers[0].exact, vec!["crate::model::Money"]);
    }

    #[test]
    fn test_trait_impl_is_rejected() {
        let result = scan(
            &[],
            r#"
            impl Render for Fmt {
                #[log_value(exact(Money))]
                fn money(value: &Money) -> String { String::new() }
            }
            "#,
        );
        assert!(messages(&result)[0].contains("trait impl"));
    }

    #[test]
    fn test_shape_rejections() {
        let result = scan(
            &["fmt"],
            r#"
            #[log_value(exact(A))]
            fn private(value: &A) -> String { String::new() }
            #[log_value(exact(A))]
            pub async fn later(value: &A) -> String { String::new() }
            #[log_value(exact(A))]
            pub fn generic<T>(value: &A) -> String { String::new() }
            #[log_value(exact(A))]
            pub fn two(value: &A, other: &A) -> String { String::new() }
            #[log_value(exact(A))]
            pub fn owned(value: A) -> String { String::new() }
            #[log_value(exact(A))]
            pub fn text(value: &A) -> &'static str { "" }
            #[log_value]
            pub fn nothing(value: &A) -> String { String::new() }
            #[log_value(exact(B))]
            pub fn mismatch(value: &A) -> String { String::new() }
            #[log_value(assignable(dyn Audit))]
            pub fn concrete_cap(value: &A) -> String { String::new() }
            #[log_value(assignable(dyn Audit))]
            pub fn view_cap(value: &dyn CollectionView) -> String { String::new() }
            #[log_value(exact(A))]
            pub fn odd(value: &dyn Display) -> String { String::new() }
            "#,
        );
        assert!(result.providers.is_empty());
        let messages = messages(&result);
        assert_eq!(messages.len(), 11);
        assert!(messages[0].contains("not visible"));
        assert!(messages[1].contains("async"));
        assert!(messages[2].contains("generic"));
        assert!(messages[3].contains("exactly one parameter, found 2"));
        assert!(messages[4].contains("shared reference"));
        assert!(messages[5].contains("must return `String`"));
        assert!(messages[6].contains("no exact or assignable targets"));
        assert!(messages[7].contains("does not match"));
        assert!(messages[8].contains("only accepts exact targets"));
        assert!(messages[9].contains("cannot serve assignable target"));
        assert!(messages[10].contains("unsupported trait object"));
    }

    #[test]
    fn test_private_function_in_root_file_is_visible() {
        let result = scan(
            &[],
            r#"
            #[log_value(exact(Money))]
            fn money(value: &Money) -> String { String::new() }
            "#,
        );
        assert_eq!(result.providers.len(), 1);
        assert_eq!(result.providers[0].visibility, "private");
    }

    #[test]
    fn test_view_and_erased_shapes() {
        let result = scan(
            &[],
            r#"
            #[log_value(assignable(dyn logval_core::CollectionView))]
            pub fn items(value: &dyn CollectionView) -> String { String::new() }
            #[log_value(exact(Money), assignable(dyn self::Audit))]
            pub fn any(value: &dyn LogValue) -> std::string::String { String::new() }
            "#,
        );
        assert!(result.diagnostics.is_empty(), "{:?}", messages(&result));
        assert_eq!(result.providers[0].input, InputShape::View(ViewKind::Collection));
        assert_eq!(result.providers[1].input, InputShape::Erased);
        assert_eq!(result.providers[1].assignable, vec!["dyn crate::Audit"]);
    }

    #[test]
    fn test_cfg_test_module_is_skipped_and_recorded() {
        let result = scan(
            &[],
            r#"
            mod fmt;
            pub mod model { pub mod inner {} }
            #[cfg(test)]
            mod tests {
                #[log_value(exact(A))]
                pub fn helper(value: &A) -> String { String::new() }
            }
            "#,
        );
        assert!(result.providers.is_empty());
        let paths: Vec<_> = result.modules.iter().map(|m| m.path.join("::")).collect();
        assert_eq!(paths, vec!["fmt", "model", "model::inner", "tests"]);
        assert_eq!(result.modules[3].cfg, CfgState::Disabled);
        assert_eq!(result.modules[0].cfg, CfgState::Enabled);
        assert!(!result.modules[0].exported);
        assert!(result.modules[2].exported);
    }

    #[test]
    fn test_cfg_combinations_on_items() {
        let source = r#"
            #[cfg(all(test, not(feature = "x")))]
            #[log_value(exact(A))]
            pub fn only_tests(value: &A) -> String { String::new() }
            #[cfg(any(test, feature = "x"))]
            #[log_value(exact(B))]
            pub fn with_x(value: &B) -> String { String::new() }
            #[cfg(not(test))]
            #[log_value(exact(C))]
            pub fn always(value: &C) -> String { String::new() }
            #[cfg(feature = "y")]
            impl D {
                #[log_value(exact(D))]
                pub fn render(value: &D) -> String { String::new() }
            }
        "#;
        let path = Path::new("src/lib.rs");

        let on = extract_providers(path, vec![], source, &CfgContext::with_features(["x"])).unwrap();
        let paths: Vec<_> = on.providers.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["crate::with_x", "crate::always"]);
        assert!(on.diagnostics.is_empty(), "{:?}", messages(&on));

        let off = extract_providers(path, vec![], source, &CfgContext::with_features(["y"])).unwrap();
        let paths: Vec<_> = off.providers.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["crate::always", "<crate::D>::render"]);

        let unknown = scan(&[], source);
        let paths: Vec<_> = unknown.providers.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["crate::always"]);
        let reported: Vec<_> = unknown
            .diagnostics
            .iter()
            .filter_map(|d| d.provider.as_deref())
            .collect();
        assert_eq!(reported, vec!["crate::with_x", "<crate::D>::render"]);
        assert!(messages(&unknown).iter().all(|m| m.contains("cannot be decided")));
    }

    #[test]
    fn test_feature_gated_inline_module_is_recorded() {
        let result = scan(
            &[],
            r#"
            #[cfg(feature = "extra")]
            pub mod extra {
                #[log_value(exact(A))]
                pub fn a(value: &A) -> String { String::new() }
            }
            "#,
        );
        assert!(matches!(result.modules[0].cfg, CfgState::Conditional(_)));
        assert_eq!(result.providers[0].path, "crate::extra::a");
    }

    #[test]
    fn test_super_path_resolution() {
        let result = scan(
            &["a", "b"],
            r#"
            #[log_value(exact(super::Money))]
            pub fn money(value: &Money) -> String { String::new() }
            "#,
        );
        assert_eq!(result.providers[0].exact, vec!["crate::a::Money"]);

        let result = scan(
            &[],
            r#"
            #[log_value(exact(super::Money))]
            pub fn money(value: &Money) -> String { String::new() }
            "#,
        );
        assert!(messages(&result)[0].contains("climbs above the crate root"));
    }

    #[test]
    fn test_parse_failure_is_recoverable() {
        let err = extract_providers(
            Path::new("src/a.rs"),
            vec![],
            "pub fn broken( {",
            &CfgContext::unknown(),
        )
        .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_render_type_is_compact() {
        let ty: Type = syn::parse_str("std :: collections :: HashMap < String , u8 >").unwrap();
        assert_eq!(render_type(&ty), "std::collections::HashMap<String, u8>");
        let ty: Type = syn::parse_str("&'static str").unwrap();
        assert_eq!(render_type(&ty), "&'static str");
    }
}
