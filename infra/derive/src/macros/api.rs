use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{Attribute, Data, DeriveInput, ItemFn, Lit, LitStr, Meta};

const DEFAULT_RENAME: &str = "snake_case";

/// Expands `#[api_model]` for structs and enums.
pub fn expand_api_model(args: TokenStream, input: DeriveInput) -> TokenStream {
    if let Data::Union(_) = input.data {
        return syn::Error::new_spanned(&input.ident, "api_model does not support unions")
            .to_compile_error();
    }

    let args = match ModelArgs::parse(args) {
        Ok(args) => args,
        Err(err) => return err,
    };
    let serde_meta = match SerdeMeta::collect(&input.attrs) {
        Ok(meta) => meta,
        Err(err) => return err.to_compile_error(),
    };
    let derives = derived_trait_names(&input.attrs);
    let is_enum = matches!(input.data, Data::Enum(_));

    let derive_attr = derive_attr(&derives);
    let rename_attr = match rename_attr(args.rename_all, &serde_meta) {
        Ok(attr) => attr,
        Err(err) => return err,
    };
    let deny_attr = match deny_unknown_attr(args.deny_unknown_fields, is_enum, &serde_meta, &input)
    {
        Ok(attr) => attr,
        Err(err) => return err,
    };

    quote! {
        #derive_attr
        #rename_attr
        #deny_attr
        #input
    }
}

/// Expands `#[api_handler]`: forwards the arguments to `utoipa::path`.
pub fn expand_api_handler(args: TokenStream, input: ItemFn) -> TokenStream {
    let ItemFn { attrs, vis, sig, block } = input;

    quote! {
        #(#attrs)*
        #[allow(clippy::unused_async)]
        #[::utoipa::path(#args)]
        #vis #sig #block
    }
}

#[derive(Default)]
struct ModelArgs {
    rename_all: Option<LitStr>,
    deny_unknown_fields: Option<bool>,
}

impl ModelArgs {
    fn parse(args: TokenStream) -> Result<Self, TokenStream> {
        let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
        let metas = parser.parse2(args).map_err(|err| err.to_compile_error())?;

        let mut parsed = Self::default();
        for meta in metas {
            let Meta::NameValue(name_value) = meta else {
                return Err(syn::Error::new_spanned(
                    meta,
                    "Expected name-value arguments like `rename_all = \"...\"`",
                )
                .to_compile_error());
            };

            let duplicate = || {
                syn::Error::new_spanned(&name_value, "Duplicate argument").to_compile_error()
            };

            if name_value.path.is_ident("rename_all") {
                if parsed.rename_all.is_some() {
                    return Err(duplicate());
                }
                parsed.rename_all = Some(literal_str(&name_value)?);
            } else if name_value.path.is_ident("deny_unknown_fields") {
                if parsed.deny_unknown_fields.is_some() {
                    return Err(duplicate());
                }
                parsed.deny_unknown_fields = Some(literal_bool(&name_value)?);
            } else {
                return Err(syn::Error::new_spanned(
                    &name_value.path,
                    "Unsupported argument; expected rename_all or deny_unknown_fields",
                )
                .to_compile_error());
            }
        }

        Ok(parsed)
    }
}

fn literal_of(name_value: &syn::MetaNameValue) -> Option<&Lit> {
    match &name_value.value {
        syn::Expr::Lit(expr_lit) => Some(&expr_lit.lit),
        _ => None,
    }
}

fn literal_str(name_value: &syn::MetaNameValue) -> Result<LitStr, TokenStream> {
    match literal_of(name_value) {
        Some(Lit::Str(lit)) => Ok(lit.clone()),
        _ => Err(syn::Error::new_spanned(&name_value.value, "expected a string literal")
            .to_compile_error()),
    }
}

fn literal_bool(name_value: &syn::MetaNameValue) -> Result<bool, TokenStream> {
    match literal_of(name_value) {
        Some(Lit::Bool(lit)) => Ok(lit.value),
        _ => Err(syn::Error::new_spanned(&name_value.value, "expected a boolean literal")
            .to_compile_error()),
    }
}

/// Container-level serde settings already present on the item.
struct SerdeMeta {
    rename_all: Option<LitStr>,
    deny_unknown_fields: bool,
}

impl SerdeMeta {
    fn collect(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut meta_info = Self { rename_all: None, deny_unknown_fields: false };

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    meta_info.rename_all = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("deny_unknown_fields") {
                    meta_info.deny_unknown_fields = true;
                } else if meta.input.peek(syn::Token![=]) {
                    let _: syn::Expr = meta.value()?.parse()?;
                }
                Ok(())
            })?;
        }

        Ok(meta_info)
    }
}

fn derive_attr(derives: &FxHashSet<String>) -> TokenStream {
    let wanted = [
        ("Debug", quote! { Debug }),
        ("Serialize", quote! { ::serde::Serialize }),
        ("Deserialize", quote! { ::serde::Deserialize }),
        ("ToSchema", quote! { ::utoipa::ToSchema }),
    ];
    let tokens: Vec<_> = wanted
        .into_iter()
        .filter(|(name, _)| !derives.contains(*name))
        .map(|(_, tokens)| tokens)
        .collect();

    if tokens.is_empty() { quote! {} } else { quote! { #[derive(#(#tokens),*)] } }
}

fn rename_attr(rename_all: Option<LitStr>, serde_meta: &SerdeMeta) -> Result<TokenStream, TokenStream> {
    let value =
        rename_all.unwrap_or_else(|| LitStr::new(DEFAULT_RENAME, proc_macro2::Span::call_site()));

    match &serde_meta.rename_all {
        Some(existing) if existing.value() != value.value() => Err(syn::Error::new_spanned(
            existing,
            "Conflicting serde rename_all; remove it or set api_model(rename_all = \"...\") to match",
        )
        .to_compile_error()),
        Some(_) => Ok(quote! {}),
        None => Ok(quote! { #[serde(rename_all = #value)] }),
    }
}

fn deny_unknown_attr(
    requested: Option<bool>,
    is_enum: bool,
    serde_meta: &SerdeMeta,
    input: &DeriveInput,
) -> Result<TokenStream, TokenStream> {
    let deny = requested.unwrap_or(!is_enum);

    if serde_meta.deny_unknown_fields {
        if !deny {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "deny_unknown_fields is already set via serde; remove it before disabling",
            )
            .to_compile_error());
        }
        return Ok(quote! {});
    }

    Ok(if deny { quote! { #[serde(deny_unknown_fields)] } } else { quote! {} })
}

pub(crate) fn derived_trait_names(attrs: &[Attribute]) -> FxHashSet<String> {
    let mut traits = FxHashSet::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                traits.insert(segment.ident.to_string());
            }
            Ok(())
        });
    }

    traits
}
