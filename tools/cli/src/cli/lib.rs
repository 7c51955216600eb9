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

#[macro_use]
extern crate tracing;

use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;

use recipes_client::RecipesClient;
use recipes_proto::constants::{SESSION_KEY_AUTH_TOKEN, SESSION_KEY_IS_ADMIN};
use recipes_proto::v1::Recipe;
use serde::Serialize;

use crate::frontend::TerminalFrontend;
use crate::page::{Page, PageError};
use crate::register::{RegisterForm, RegisterPage};
use crate::session::SessionContext;

include!("../opt/recipes.rs");

pub mod common;
pub mod forms;
pub mod frontend;
pub mod ingredient;
pub mod mirror;
pub mod page;
pub mod recipe;
pub mod register;
pub mod session;
pub mod tracker;

impl RegisterOpt {
    pub async fn exec(
        &self,
        opt: &RecipesClientParser,
        client: &RecipesClient,
    ) -> Result<(), PageError> {
        let (password, repeat_password) = match &self.password {
            Some(password) => {
                trace!("User provided password directly, don't need to prompt.");
                (password.clone(), password.clone())
            }
            None => match password_prompt() {
                Some(pair) => pair,
                None => {
                    let e = PageError::Validation("All fields must be filled".to_string());
                    eprintln!("{}", e);
                    return Err(e);
                }
            },
        };

        let form = RegisterForm {
            username: self.username.clone(),
            email: self.email.clone(),
            password,
            repeat_password,
        };

        let page = RegisterPage::new(client, TerminalFrontend::new(opt.output_mode));
        page.register(&form).await
    }
}

#[derive(Debug, Serialize)]
struct SessionSummary {
    logged_in: bool,
    is_admin: bool,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "logged in: {}", self.logged_in)?;
        write!(f, "admin: {}", self.is_admin)
    }
}

impl SessionOpt {
    pub fn exec(&self, opt: &RecipesClientParser) -> Result<(), PageError> {
        let store = opt.session_store();
        match self {
            SessionOpt::Show => {
                let ctx = SessionContext::load(store.as_ref()).inspect_err(|e| eprintln!("{}", e))?;
                let summary = SessionSummary {
                    logged_in: ctx.is_logged_in(),
                    is_admin: ctx.is_admin,
                };
                match opt.output_mode {
                    OutputMode::Json => match serde_json::to_string(&summary) {
                        Ok(s) => println!("{}", s),
                        Err(e) => error!(?e, "unable to encode session summary"),
                    },
                    OutputMode::Text => println!("{}", summary),
                }
                Ok(())
            }
            SessionOpt::Set { token, admin } => {
                if opt.token.is_some() {
                    warn!("--token is set, the stored session will not be used by this invocation");
                }
                store
                    .set(SESSION_KEY_AUTH_TOKEN, token)
                    .and_then(|_| {
                        store.set(SESSION_KEY_IS_ADMIN, if *admin { "true" } else { "false" })
                    })
                    .inspect_err(|e| eprintln!("{}", e))?;
                info!("session token stored");
                Ok(())
            }
        }
    }
}

impl RecipesClientParser {
    pub fn debug(&self) -> bool {
        self.debug
    }

    fn connect(&self) -> Result<RecipesClient, PageError> {
        self.to_client().map_err(|e| {
            eprintln!("Unable to configure the client - {}", e);
            PageError::Fetch {
                message: "Unable to configure the client".to_string(),
                source: Some(e),
            }
        })
    }

    async fn run(&self) -> Result<(), PageError> {
        let client = match &self.commands {
            RecipesClientOpt::Version => {
                println!("recipes {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            RecipesClientOpt::Session { commands } => return commands.exec(self),
            _ => self.connect()?,
        };

        match &self.commands {
            RecipesClientOpt::Recipe { commands } => commands.exec(self, &client).await,
            RecipesClientOpt::Ingredient { commands } => commands.exec(self, &client).await,
            RecipesClientOpt::Register(ropt) => ropt.exec(self, &client).await,
            RecipesClientOpt::Logout => {
                let frontend = TerminalFrontend::new(self.output_mode);
                let page: Page<Recipe, _> = Page::new(&client, self.session_store(), frontend)
                    .await
                    .inspect_err(|e| eprintln!("{}", e))?;
                page.logout().await
            }
            // Handled above, neither needs a client.
            RecipesClientOpt::Session { .. } | RecipesClientOpt::Version => Ok(()),
        }
    }

    pub async fn exec(&self) -> ExitCode {
        match self.run().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                debug!(?e, "command failed");
                ExitCode::FAILURE
            }
        }
    }
}

/// Prompt for a new password and its confirmation. Mismatches are left for
/// the registration page to report.
pub(crate) fn password_prompt() -> Option<(String, String)> {
    let password = rpassword::prompt_password("Enter password: ")
        .map_err(|e| error!("Failed to create password prompt -- {:?}", e))
        .ok()?;
    let repeat_password = rpassword::prompt_password("Retype the password to confirm: ")
        .map_err(|e| error!("Failed to create password prompt -- {:?}", e))
        .ok()?;
    Some((password, repeat_password))
}
