#![deny(warnings)]
use std::path::Path;
use std::process::Output;

use assert_cmd::Command;
use recipes_client::RecipesClient;
use recipes_testkit::{cli_recipes, BackendHandle, TEST_PASSWORD, TEST_TOKEN};
use tempfile::tempdir;

/// Run the `recipes` binary against the test backend.
fn run(rsclient: &RecipesClient, session_path: &str, args: &[&str]) -> Output {
    println!("running recipes {}", args.join(" "));
    let mut recipes = cli_recipes!();
    recipes.args(args);
    let output = recipes.output().expect("failed to run recipes");
    println!("{:?}", output);
    output
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[recipes_testkit::test]
async fn test_cli_recipe_lifecycle(rsclient: RecipesClient, backend: BackendHandle) {
    let dir = tempdir().expect("failed to create tempdir");
    let session_path = dir.path().join("session").display().to_string();

    // we have to spawn in another thread so the backend keeps running
    tokio::task::spawn_blocking(move || {
        let out = run(&rsclient, &session_path, &["session", "set", TEST_TOKEN]);
        assert!(out.status.success());

        let out = run(&rsclient, &session_path, &["recipe", "add", "Soup", "Boil water"]);
        assert!(out.status.success());
        assert_eq!(stdout(&out), "Soup: Boil water\n");

        let out = run(&rsclient, &session_path, &["recipe", "add", "Pancakes", "Fry"]);
        assert!(out.status.success());

        let out = run(&rsclient, &session_path, &["recipe", "list", "-o", "json"]);
        assert!(out.status.success());
        let listed: serde_json::Value =
            serde_json::from_str(&stdout(&out)).expect("list output is not json");
        assert_eq!(listed.as_array().map(Vec::len), Some(2));

        // Only the filtered view is left on screen.
        let out = run(&rsclient, &session_path, &["recipe", "search", "SOUP"]);
        assert!(out.status.success());
        assert_eq!(stdout(&out), "Soup: Boil water\n");

        let out = run(
            &rsclient,
            &session_path,
            &["recipe", "update", "Soup", "Simmer gently"],
        );
        assert!(out.status.success());
        assert!(stdout(&out).contains("Soup: Simmer gently"));

        let out = run(&rsclient, &session_path, &["recipe", "delete", "Soup"]);
        assert!(out.status.success());
        assert_eq!(stdout(&out), "Pancakes: Fry\n");

        let out = run(&rsclient, &session_path, &["recipe", "delete", "Soup"]);
        assert!(!out.status.success());
        assert!(stderr(&out).contains("Recipe not found"));
    })
    .await
    .expect("cli run failed");

    let names: Vec<_> = backend.recipes().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Pancakes"]);
}

#[recipes_testkit::test]
async fn test_cli_add_needs_session(rsclient: RecipesClient, backend: BackendHandle) {
    let dir = tempdir().expect("failed to create tempdir");
    let session_path = dir.path().join("session").display().to_string();

    tokio::task::spawn_blocking(move || {
        let out = run(&rsclient, &session_path, &["ingredient", "add", "Salt"]);
        assert!(!out.status.success());
        assert!(stderr(&out).contains("You must be logged in to add an ingredient"));
    })
    .await
    .expect("cli run failed");

    assert_eq!(backend.count_method("POST"), 0);
}

#[recipes_testkit::test]
async fn test_cli_token_override(rsclient: RecipesClient, backend: BackendHandle) {
    let dir = tempdir().expect("failed to create tempdir");
    let session_path = dir.path().join("session").display().to_string();
    let check_path = session_path.clone();

    tokio::task::spawn_blocking(move || {
        let out = run(
            &rsclient,
            &session_path,
            &["--token", TEST_TOKEN, "ingredient", "add", "Salt"],
        );
        assert!(out.status.success());
        assert_eq!(stdout(&out), "Salt\n");
    })
    .await
    .expect("cli run failed");

    assert_eq!(backend.ingredients().len(), 1);
    // A token on the command line never reaches the session store.
    assert!(!Path::new(&check_path).exists());
}

#[recipes_testkit::test]
async fn test_cli_session_and_logout(rsclient: RecipesClient, backend: BackendHandle) {
    let dir = tempdir().expect("failed to create tempdir");
    let session_path = dir.path().join("session").display().to_string();

    tokio::task::spawn_blocking(move || {
        let out = run(
            &rsclient,
            &session_path,
            &["session", "set", TEST_TOKEN, "--admin"],
        );
        assert!(out.status.success());

        let out = run(&rsclient, &session_path, &["session", "show", "-o", "json"]);
        assert!(out.status.success());
        assert_eq!(stdout(&out).trim(), r#"{"logged_in":true,"is_admin":true}"#);

        let out = run(&rsclient, &session_path, &["logout"]);
        assert!(out.status.success());
        assert!(stderr(&out).contains("Please log in to continue."));

        let out = run(&rsclient, &session_path, &["session", "show"]);
        assert!(out.status.success());
        assert_eq!(stdout(&out), "logged in: false\nadmin: false\n");

        // Nothing left to log out of.
        let out = run(&rsclient, &session_path, &["logout"]);
        assert!(!out.status.success());
        assert!(stderr(&out).contains("Error logging out"));
    })
    .await
    .expect("cli run failed");

    assert!(!backend.token_valid(TEST_TOKEN));
    assert_eq!(backend.count("POST", "/logout"), 1);
}

#[recipes_testkit::test]
async fn test_cli_register(rsclient: RecipesClient, backend: BackendHandle) {
    let dir = tempdir().expect("failed to create tempdir");
    let session_path = dir.path().join("session").display().to_string();

    tokio::task::spawn_blocking(move || {
        let mut recipes = cli_recipes!();
        recipes
            .env("RECIPES_PASSWORD", TEST_PASSWORD)
            .args(["register", "alice", "alice@example.com"]);
        let out = recipes.output().expect("failed to run recipes");
        assert!(out.status.success());

        let mut recipes = cli_recipes!();
        recipes
            .env("RECIPES_PASSWORD", TEST_PASSWORD)
            .args(["register", "alice", "other@example.com"]);
        let out = recipes.output().expect("failed to run recipes");
        assert!(!out.status.success());
        assert!(stderr(&out).contains("Username and/or email already exists"));
    })
    .await
    .expect("cli run failed");

    assert_eq!(backend.usernames(), vec!["alice"]);
    assert!(backend.requests().iter().all(|r| r.bearer.is_none()));
}

#[recipes_testkit::test]
async fn test_cli_version(rsclient: RecipesClient, backend: BackendHandle) {
    let dir = tempdir().expect("failed to create tempdir");
    let session_path = dir.path().join("session").display().to_string();

    tokio::task::spawn_blocking(move || {
        let out = run(&rsclient, &session_path, &["version"]);
        assert!(out.status.success());
        assert!(stdout(&out).starts_with("recipes "));
    })
    .await
    .expect("cli run failed");

    assert!(backend.requests().is_empty());
}
