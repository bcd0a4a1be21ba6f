use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Turn a function into a test that runs with logging enabled, inject an
/// example contest, and log the test's name if it fails.
///
/// With an argument, e.g. `#[audit_test(three_candidates)]`, the test may
/// take a `Contest` and a `ContestBallots`, which are filled in from
/// `crate::model::examples::three_candidates()`. Without one, the test takes
/// no parameters.
#[proc_macro_attribute]
pub fn audit_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);
    let fixture = parse_macro_input!(args as Option<Ident>);

    // Work out what to pass in, and reject invalid function signatures.
    let test_args = match check_sig(&item_fn.sig, fixture.is_some()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the inner function so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let inner_name = format_ident!("{}_inner", name);
    item_fn.sig.ident = inner_name.clone();

    let setup = fixture
        .map(|fixture| {
            quote! {
                #[allow(unused_variables)]
                let (contest, ballots) = crate::model::examples::#fixture();
            }
        })
        .unwrap_or_default();

    quote! {
        #[test]
        fn #name() {
            /// The test itself.
            #item_fn

            log4rs_test_utils::test_logging::init_logging_once_for(["raire_audit"], None, None);

            #setup

            // Run the test, catching any panics so the failure is logged
            // alongside whatever the search logged.
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
                #inner_name(#(#test_args),*)
            }));

            // If the test panicked, re-raise the panic.
            if let Err(cause) = result {
                ::log::error!("Test {} failed", stringify!(#name));
                std::panic::resume_unwind(cause);
            }
        }
    }
    .into()
}

/// Ensure the wrapped test is synchronous, and map each parameter to the
/// fixture value it should receive.
fn check_sig(sig: &Signature, has_fixture: bool) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_some() {
        return Err(syn::Error::new(sig.span(), "Test must not be `async`"));
    }

    let mut has_contest = false;
    let mut has_ballots = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if !has_fixture {
            return Err(syn::Error::new(
                input.span(),
                "Name a fixture, e.g. `#[audit_test(three_candidates)]`, to take parameters",
            ));
        }
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    if let Some(type_ident) = type_path.path.segments.last().map(|s| &s.ident) {
                        if type_ident == "Contest" {
                            if has_contest {
                                return Err(syn::Error::new(
                                    input.span(),
                                    "Test cannot accept more than one `Contest`",
                                ));
                            }
                            has_contest = true;
                            args.push(quote! { contest });
                            continue;
                        } else if type_ident == "ContestBallots" {
                            if has_ballots {
                                return Err(syn::Error::new(
                                    input.span(),
                                    "Test cannot accept more than one `ContestBallots`",
                                ));
                            }
                            has_ballots = true;
                            args.push(quote! { ballots });
                            continue;
                        }
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `contest_ident: Contest` or `ballots_ident: ContestBallots`",
        ));
    }

    Ok(args)
}
