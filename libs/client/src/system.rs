use recipes_proto::constants::uri;
use recipes_proto::v1::RegisterRequest;

use crate::{ClientError, RecipesClient, StatusCode};

impl RecipesClient {
    /// Register a new account. Registration is never authenticated, and the
    /// status is returned as is because 201 and 409 mean different things to
    /// the caller. Only transport failures are errors here.
    pub async fn register(&self, request: &RegisterRequest) -> Result<StatusCode, ClientError> {
        self.perform_simple_post_request(uri::REGISTER, request)
            .await
    }

    /// End the session on the backend. The token held by this client is only
    /// dropped once the backend has agreed.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.perform_empty_post_request(uri::LOGOUT).await?;
        self.clear_token().await;
        Ok(())
    }
}
