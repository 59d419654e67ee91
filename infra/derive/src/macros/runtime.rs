use proc_macro2::TokenStream;
use quote::quote;
use syn::{Error, Ident, ItemFn, ReturnType, Type};

/// Expands `#[flock_runtime::main]` / `#[flock_runtime::main(profile)]`.
///
/// The body runs on a runtime built from the chosen `RuntimeConfig` profile; failing to
/// build it is returned through `main`'s own `Result`.
pub fn expand_main(args: TokenStream, input: ItemFn) -> TokenStream {
    if input.sig.asyncness.is_none() {
        return Error::new_spanned(input.sig.fn_token, "#[flock_runtime::main] needs an async fn")
            .to_compile_error();
    }
    if !input.sig.inputs.is_empty() {
        return Error::new_spanned(&input.sig.inputs, "main takes no arguments").to_compile_error();
    }
    if !returns_result(&input.sig.output) {
        return Error::new_spanned(
            &input.sig.ident,
            "#[flock_runtime::main] needs a function returning a Result",
        )
        .to_compile_error();
    }

    let profile = match profile(args) {
        Ok(profile) => profile,
        Err(err) => return err.to_compile_error(),
    };

    let ItemFn { attrs, vis, sig, block } = input;
    let (name, output) = (&sig.ident, &sig.output);

    quote! {
        #(#attrs)*
        #vis fn #name() #output {
            let runtime = ::flock_runtime::build_runtime(&::flock_runtime::RuntimeConfig::#profile())?;
            runtime.block_on(async move #block)
        }
    }
}

fn profile(args: TokenStream) -> Result<Ident, Error> {
    if args.is_empty() {
        return Ok(Ident::new("default", proc_macro2::Span::call_site()));
    }

    let ident: Ident = syn::parse2(args)?;
    match ident.to_string().as_str() {
        "server" | "compact" | "default" => Ok(ident),
        _ => Err(Error::new_spanned(ident, "unknown runtime profile, expected server, compact or default")),
    }
}

fn returns_result(output: &ReturnType) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    let Type::Path(path) = &**ty else {
        return false;
    };
    path.path.segments.last().is_some_and(|seg| seg.ident == "Result")
}
