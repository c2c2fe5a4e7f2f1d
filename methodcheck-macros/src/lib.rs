//! Methodcheck Macros
//!
//! Procedural macros for member registration.
//!
//! ## Macros
//!
//! - `#[methodcheck::member]` - Register a free function as a member of a type

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{FnArg, ItemFn, parse_macro_input};

// ============================================================================
// Attribute Parsing Helpers
// ============================================================================

mod attr {
    use syn::meta::ParseNestedMeta;

    /// Get the attribute name as a string
    pub fn name(meta: &ParseNestedMeta) -> String {
        meta.path
            .get_ident()
            .map(|i| i.to_string())
            .unwrap_or_default()
    }

    /// Parse a string literal attribute: `attr = "value"`
    pub fn string(meta: &ParseNestedMeta) -> syn::Result<String> {
        let value: syn::LitStr = meta.value()?.parse()?;
        Ok(value.value())
    }

    /// Create an unknown attribute error
    pub fn unknown(meta: &ParseNestedMeta, name: &str) -> syn::Error {
        meta.error(format!("unknown attribute: {}", name))
    }
}

/// Register a function as a member of an owner type
///
/// # Example
///
/// ```ignore
/// #[methodcheck::member(owner = "Practice")]
/// fn solveTrainProblem(a: f64, b: f64, c: f64) -> f64 { ... }
///
/// // Lookup name differs from the Rust identifier, not publicly invocable
/// #[methodcheck::member(owner = "Practice", name = "area", visibility = "private")]
/// fn area_of_rect(w: i32, h: i32) -> i32 { ... }
/// ```
#[proc_macro_attribute]
pub fn member(args: TokenStream, item: TokenStream) -> TokenStream {
    let args = TokenStream2::from(args);
    let func = parse_macro_input!(item as ItemFn);

    member_impl(args, func)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn member_impl(args: TokenStream2, func: ItemFn) -> Result<TokenStream2, syn::Error> {
    validate_signature(&func)?;

    let config = parse_member_config(args)?;

    let fn_name = &func.sig.ident;
    let builder_name = format_ident!("_methodcheck_member_{}", fn_name);
    let name = config.name.unwrap_or_else(|| fn_name.to_string());
    let owner = config
        .owner
        .map(|owner| quote! { #owner })
        .unwrap_or(quote! { module_path!() });
    let visibility = match config.visibility.as_deref() {
        Some("private") => quote! { ::methodcheck::Visibility::Private },
        _ => quote! { ::methodcheck::Visibility::Public },
    };

    Ok(quote! {
        #func

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #builder_name() -> ::methodcheck::Member {
            ::methodcheck::Member::from_fn(#name, #fn_name)
        }

        ::methodcheck::internal::inventory::submit! {
            ::methodcheck::MemberDef {
                owner: #owner,
                name: #name,
                visibility: #visibility,
                build: #builder_name,
                file: file!(),
                line: line!(),
            }
        }
    })
}

#[derive(Default)]
struct MemberConfig {
    owner: Option<String>,
    name: Option<String>,
    visibility: Option<String>,
}

fn parse_member_config(args: TokenStream2) -> Result<MemberConfig, syn::Error> {
    let mut config = MemberConfig::default();

    if args.is_empty() {
        return Ok(config);
    }

    let parser = syn::meta::parser(|meta| {
        let name = attr::name(&meta);
        match name.as_str() {
            "owner" => config.owner = Some(attr::string(&meta)?),
            "name" => {
                let value = attr::string(&meta)?;
                if value.trim().is_empty() {
                    return Err(meta.error("member name must not be empty"));
                }
                config.name = Some(value);
            }
            "visibility" => {
                let value = attr::string(&meta)?;
                if value != "public" && value != "private" {
                    return Err(meta.error("visibility must be \"public\" or \"private\""));
                }
                config.visibility = Some(value);
            }
            _ => return Err(attr::unknown(&meta, &name)),
        }
        Ok(())
    });

    syn::parse::Parser::parse2(parser, args)?;

    Ok(config)
}

fn validate_signature(func: &ItemFn) -> syn::Result<()> {
    if func.sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            func.sig.asyncness,
            "methodcheck: members must be synchronous functions",
        ));
    }
    if !func.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig.generics,
            "methodcheck: members must not be generic",
        ));
    }
    if let Some(receiver) = func
        .sig
        .inputs
        .iter()
        .find(|arg| matches!(arg, FnArg::Receiver(_)))
    {
        return Err(syn::Error::new_spanned(
            receiver,
            "methodcheck: members must be free functions, not methods",
        ));
    }
    if func.sig.inputs.len() > 8 {
        return Err(syn::Error::new_spanned(
            &func.sig.inputs,
            "methodcheck: members take at most 8 parameters",
        ));
    }
    Ok(())
}
