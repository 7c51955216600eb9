#![deny(warnings)]
use recipes_client::{ClientError, RecipesClient, StatusCode};
use recipes_proto::v1::{EntityId, RegisterRequest};
use recipes_testkit::{BackendHandle, TEST_EMAIL, TEST_PASSWORD, TEST_TOKEN, TEST_USERNAME};

#[recipes_testkit::test]
async fn test_server_recipe_list_anonymous(rsclient: RecipesClient, backend: BackendHandle) {
    backend.insert_recipe("Pancakes", "Mix and fry");
    backend.insert_recipe("Soup", "Boil");

    let recipes = rsclient.recipe_list().await.expect("failed to list recipes");
    let names: Vec<_> = recipes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Pancakes", "Soup"]);

    let reqs = backend.requests();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].method, "GET");
    assert_eq!(reqs[0].path, "/recipes");
    assert!(reqs[0].bearer.is_none());
}

#[recipes_testkit::test(recipes = vec![("Toast", "Heat bread")])]
async fn test_server_seeded_recipes(rsclient: RecipesClient, _backend: BackendHandle) {
    let recipes = rsclient.recipe_list().await.expect("failed to list recipes");
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0].to_string(), "Toast: Heat bread");
}

#[recipes_testkit::test]
async fn test_server_recipe_create_requires_token(rsclient: RecipesClient, backend: BackendHandle) {
    let res = rsclient.recipe_create("Pancakes", "Mix and fry").await;
    assert_eq!(
        res.as_ref().err().and_then(ClientError::status),
        Some(StatusCode::UNAUTHORIZED)
    );
    assert!(backend.recipes().is_empty());

    rsclient.set_token(TEST_TOKEN.to_string()).await;
    rsclient
        .recipe_create("Pancakes", "Mix and fry")
        .await
        .expect("failed to create recipe");

    let stored = backend.recipes();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].instructions, "Mix and fry");

    let last = backend.requests().pop().expect("no request journalled");
    assert_eq!(last.bearer.as_deref(), Some(TEST_TOKEN));
}

#[recipes_testkit::test]
async fn test_server_recipe_update_and_delete(rsclient: RecipesClient, backend: BackendHandle) {
    rsclient.set_token(TEST_TOKEN.to_string()).await;
    let id = backend.insert_recipe("Soup", "Boil");

    rsclient
        .recipe_update(&id, "Soup", "Simmer gently")
        .await
        .expect("failed to update recipe");
    assert_eq!(backend.recipes()[0].instructions, "Simmer gently");
    assert_eq!(backend.count("PUT", &format!("/recipes/{}", id)), 1);

    rsclient
        .recipe_delete(&id)
        .await
        .expect("failed to delete recipe");
    assert!(backend.recipes().is_empty());

    let missing = rsclient.recipe_delete(&EntityId::from(9999)).await;
    assert_eq!(
        missing.as_ref().err().and_then(ClientError::status),
        Some(StatusCode::NOT_FOUND)
    );
}

#[recipes_testkit::test]
async fn test_server_backend_message_is_surfaced(rsclient: RecipesClient, backend: BackendHandle) {
    rsclient.set_token(TEST_TOKEN.to_string()).await;
    backend.fail("POST", "/ingredients", 400);

    let err = rsclient
        .ingredient_create("Salt")
        .await
        .expect_err("injected failure was ignored");
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.backend_message(), Some("Injected failure"));

    backend.clear_faults();
    rsclient
        .ingredient_create("Salt")
        .await
        .expect("failed to create ingredient");
    let ingredients = rsclient
        .ingredient_list()
        .await
        .expect("failed to list ingredients");
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0].to_string(), "Salt");

    rsclient
        .ingredient_delete(&ingredients[0].id)
        .await
        .expect("failed to delete ingredient");
    assert!(backend.ingredients().is_empty());
}

#[recipes_testkit::test]
async fn test_server_invalid_token_rejected(rsclient: RecipesClient, _backend: BackendHandle) {
    rsclient.set_token("not-a-real-token".to_string()).await;
    let err = rsclient
        .ingredient_list()
        .await
        .expect_err("invalid token was accepted");
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
}

#[recipes_testkit::test(users = vec![(TEST_USERNAME, TEST_EMAIL)])]
async fn test_server_register_statuses(rsclient: RecipesClient, backend: BackendHandle) {
    let fresh = RegisterRequest {
        username: "new_user".to_string(),
        email: "new_user@example.com".to_string(),
        password: TEST_PASSWORD.to_string(),
    };
    let status = rsclient.register(&fresh).await.expect("register failed");
    assert_eq!(status, StatusCode::CREATED);

    let dup = RegisterRequest {
        username: TEST_USERNAME.to_string(),
        email: "other@example.com".to_string(),
        password: TEST_PASSWORD.to_string(),
    };
    let status = rsclient.register(&dup).await.expect("register failed");
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(backend.usernames(), vec![TEST_USERNAME, "new_user"]);
    // Registration never sends credentials, even when a token is held.
    assert!(backend.requests().iter().all(|r| r.bearer.is_none()));
}

#[recipes_testkit::test]
async fn test_server_logout(rsclient: RecipesClient, backend: BackendHandle) {
    rsclient.set_token(TEST_TOKEN.to_string()).await;
    rsclient.logout().await.expect("logout failed");
    assert!(rsclient.get_token().await.is_none());
    assert!(!backend.token_valid(TEST_TOKEN));

    // A second logout with the same token is rejected, and the token held by
    // the client survives the failure.
    rsclient.set_token(TEST_TOKEN.to_string()).await;
    let err = rsclient.logout().await.expect_err("logout was accepted");
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(rsclient.get_token().await.as_deref(), Some(TEST_TOKEN));
}
