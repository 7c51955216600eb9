#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]

mod entry;

#[allow(unused_extern_crates)]
extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;

#[proc_macro_attribute]
pub fn test(args: TokenStream, item: TokenStream) -> TokenStream {
    entry::test(args, item)
}

#[proc_macro]
/// Builds an `assert_cmd` command for the `recipes` binary, pointed at the test
/// backend (`rsclient`) and an isolated session store (`session_path`).
pub fn cli_recipes(_input: TokenStream) -> TokenStream {
    let code = quote! {
        {
        let mut recipes = Command::cargo_bin("recipes").expect("recipes binary was not built");
        recipes.env("RECIPES_URL", rsclient.get_url());
        recipes.env("RECIPES_SESSION_PATH", &session_path);
        recipes.env_remove("RECIPES_TOKEN");
        recipes
        }
    };

    code.into()
}
