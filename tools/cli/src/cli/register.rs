use recipes_client::{RecipesClient, StatusCode};
use recipes_proto::v1::RegisterRequest;

use crate::frontend::{Destination, Frontend};
use crate::page::{run_command, PageError};
use crate::tracker::{CommandKind, CommandTracker};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub repeat_password: String,
}

impl RegisterForm {
    /// The request to send, or why the form can't be sent.
    pub fn to_request(&self) -> Result<RegisterRequest, PageError> {
        let username = self.username.trim();
        let email = self.email.trim();
        let password = self.password.trim();
        let repeat_password = self.repeat_password.trim();

        if username.is_empty() || email.is_empty() || password.is_empty() || repeat_password.is_empty()
        {
            return Err(PageError::Validation(
                "All fields must be filled".to_string(),
            ));
        }
        if password != repeat_password {
            return Err(PageError::Validation("Passwords must match".to_string()));
        }

        Ok(RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

/// The registration page. It never reads or writes the session.
pub struct RegisterPage<'a, F: Frontend> {
    client: &'a RecipesClient,
    tracker: CommandTracker,
    frontend: F,
}

impl<'a, F: Frontend> RegisterPage<'a, F> {
    pub fn new(client: &'a RecipesClient, frontend: F) -> Self {
        RegisterPage {
            client,
            tracker: CommandTracker::new(),
            frontend,
        }
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<(), PageError> {
        run_command(&self.tracker, &self.frontend, CommandKind::Register, async {
            let request = form.to_request()?;

            let status = self.client.register(&request).await.map_err(|e| {
                error!(?e, "An error has occurred during registration");
                PageError::Register("An unexpected error has occurred. Please try again".to_string())
            })?;

            match status {
                StatusCode::CREATED => {
                    info!(username = %request.username, "account registered");
                    self.frontend.navigate(Destination::Login);
                    Ok(())
                }
                StatusCode::CONFLICT => Err(PageError::Register(
                    "Username and/or email already exists".to_string(),
                )),
                other => {
                    warn!(status = %other, "registration refused");
                    Err(PageError::Register(
                        "Registration failed. Try again, please".to_string(),
                    ))
                }
            }
        })
        .await
    }
}
