//! An in-memory stand-in for the recipe management backend. It implements the
//! REST surface the client consumes, journals every request it sees and can
//! be told to fail specific routes.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use recipes_proto::constants::uri;
use recipes_proto::v1::{
    EntityId, ErrorMessage, Ingredient, IngredientFields, Recipe, RecipeFields, RegisterRequest,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::TEST_TOKEN;

/// Seed data for a fresh backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Bearer tokens the backend accepts.
    pub tokens: Vec<String>,
    /// `(name, instructions)`
    pub recipes: Vec<(&'static str, &'static str)>,
    pub ingredients: Vec<&'static str>,
    /// `(username, email)` of accounts that already exist.
    pub users: Vec<(&'static str, &'static str)>,
}

impl BackendConfig {
    pub fn new_for_test() -> Self {
        BackendConfig {
            tokens: vec![TEST_TOKEN.to_string()],
            recipes: Vec::new(),
            ingredients: Vec::new(),
            users: Vec::new(),
        }
    }
}

/// One request as the backend received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub method: String,
    pub path: String,
    pub bearer: Option<String>,
}

#[derive(Debug, Default)]
struct BackendState {
    next_id: i64,
    recipes: Vec<Recipe>,
    ingredients: Vec<Ingredient>,
    users: Vec<(String, String)>,
    tokens: BTreeSet<String>,
    journal: Vec<RequestRecord>,
    faults: BTreeMap<(String, String), (StatusCode, Option<&'static str>)>,
}

impl BackendState {
    fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId::Number(self.next_id)
    }

    fn insert_recipe(&mut self, name: &str, instructions: &str) -> Recipe {
        let recipe = Recipe {
            id: self.allocate_id(),
            name: name.to_string(),
            instructions: instructions.to_string(),
        };
        self.recipes.push(recipe.clone());
        recipe
    }

    fn insert_ingredient(&mut self, name: &str) -> Ingredient {
        let ingredient = Ingredient {
            id: self.allocate_id(),
            name: name.to_string(),
        };
        self.ingredients.push(ingredient.clone());
        ingredient
    }

    fn caller(&self, headers: &HeaderMap) -> Caller {
        match bearer(headers) {
            None => Caller::Anonymous,
            Some(token) if self.tokens.contains(&token) => Caller::Authenticated,
            Some(_) => Caller::Invalid,
        }
    }
}

type Shared = Arc<Mutex<BackendState>>;

enum Caller {
    Anonymous,
    Authenticated,
    Invalid,
}

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn message(status: StatusCode, msg: &str) -> Response {
    (
        status,
        Json(ErrorMessage {
            message: Some(msg.to_string()),
        }),
    )
        .into_response()
}

fn unauthorized() -> Response {
    message(StatusCode::UNAUTHORIZED, "Unauthorized")
}

async fn journal_layer(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let record = RequestRecord {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        bearer: bearer(request.headers()),
    };
    trace!(?record, "fake backend received request");

    let fault = {
        let mut guard = lock(&state);
        let fault = guard
            .faults
            .get(&(record.method.clone(), record.path.clone()))
            .copied();
        guard.journal.push(record);
        fault
    };

    match fault {
        Some((status, Some(msg))) => message(status, msg),
        Some((status, None)) => status.into_response(),
        None => next.run(request).await,
    }
}

async fn recipe_list(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let guard = lock(&state);
    match guard.caller(&headers) {
        Caller::Invalid => unauthorized(),
        _ => Json(guard.recipes.clone()).into_response(),
    }
}

async fn recipe_create(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(fields): Json<RecipeFields>,
) -> Response {
    let mut guard = lock(&state);
    if !matches!(guard.caller(&headers), Caller::Authenticated) {
        return unauthorized();
    }
    if fields.name.trim().is_empty() || fields.instructions.trim().is_empty() {
        return message(StatusCode::BAD_REQUEST, "Recipe name and instructions are required");
    }
    let recipe = guard.insert_recipe(&fields.name, &fields.instructions);
    (StatusCode::CREATED, Json(recipe)).into_response()
}

async fn recipe_update(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(fields): Json<RecipeFields>,
) -> Response {
    let mut guard = lock(&state);
    if matches!(guard.caller(&headers), Caller::Invalid) {
        return unauthorized();
    }
    match guard.recipes.iter_mut().find(|r| r.id.to_string() == id) {
        Some(recipe) => {
            recipe.name = fields.name;
            recipe.instructions = fields.instructions;
            Json(recipe.clone()).into_response()
        }
        None => message(StatusCode::NOT_FOUND, "Recipe not found"),
    }
}

async fn recipe_delete(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut guard = lock(&state);
    if matches!(guard.caller(&headers), Caller::Invalid) {
        return unauthorized();
    }
    let before = guard.recipes.len();
    guard.recipes.retain(|r| r.id.to_string() != id);
    if guard.recipes.len() == before {
        message(StatusCode::NOT_FOUND, "Recipe not found")
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn ingredient_list(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let guard = lock(&state);
    match guard.caller(&headers) {
        Caller::Invalid => unauthorized(),
        _ => Json(guard.ingredients.clone()).into_response(),
    }
}

async fn ingredient_create(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(fields): Json<IngredientFields>,
) -> Response {
    let mut guard = lock(&state);
    if !matches!(guard.caller(&headers), Caller::Authenticated) {
        return unauthorized();
    }
    if fields.name.trim().is_empty() {
        return message(StatusCode::BAD_REQUEST, "Ingredient name is required");
    }
    if guard.ingredients.iter().any(|i| i.name == fields.name) {
        return message(StatusCode::CONFLICT, "Ingredient already exists");
    }
    let ingredient = guard.insert_ingredient(&fields.name);
    (StatusCode::CREATED, Json(ingredient)).into_response()
}

async fn ingredient_delete(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut guard = lock(&state);
    if matches!(guard.caller(&headers), Caller::Invalid) {
        return unauthorized();
    }
    let before = guard.ingredients.len();
    guard.ingredients.retain(|i| i.id.to_string() != id);
    if guard.ingredients.len() == before {
        message(StatusCode::NOT_FOUND, "Ingredient not found")
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn register(State(state): State<Shared>, Json(req): Json<RegisterRequest>) -> Response {
    let mut guard = lock(&state);
    if req.username.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return message(StatusCode::BAD_REQUEST, "All fields are required");
    }
    if guard
        .users
        .iter()
        .any(|(u, e)| *u == req.username || *e == req.email)
    {
        return message(StatusCode::CONFLICT, "Username or email already exists");
    }
    guard.users.push((req.username, req.email));
    StatusCode::CREATED.into_response()
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut guard = lock(&state);
    match bearer(&headers) {
        Some(token) if guard.tokens.remove(&token) => StatusCode::OK.into_response(),
        _ => unauthorized(),
    }
}

/// A running fake backend. Clones share the same backend.
#[derive(Debug, Clone)]
pub struct BackendHandle {
    state: Shared,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    task: Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl BackendHandle {
    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RequestRecord> {
        lock(&self.state).journal.clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        lock(&self.state)
            .journal
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Count of requests with this method, on any path.
    pub fn count_method(&self, method: &str) -> usize {
        lock(&self.state)
            .journal
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    /// Answer every `method path` request with `status` and a json error
    /// message until cleared.
    pub fn fail(&self, method: &str, path: &str, status: u16) {
        self.inject(method, path, status, Some("Injected failure"));
    }

    /// As [`BackendHandle::fail`], but the response has no body.
    pub fn fail_without_body(&self, method: &str, path: &str, status: u16) {
        self.inject(method, path, status, None);
    }

    fn inject(&self, method: &str, path: &str, status: u16, body: Option<&'static str>) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        lock(&self.state)
            .faults
            .insert((method.to_string(), path.to_string()), (status, body));
    }

    pub fn clear_faults(&self) {
        lock(&self.state).faults.clear();
    }

    pub fn recipes(&self) -> Vec<Recipe> {
        lock(&self.state).recipes.clone()
    }

    pub fn ingredients(&self) -> Vec<Ingredient> {
        lock(&self.state).ingredients.clone()
    }

    pub fn usernames(&self) -> Vec<String> {
        lock(&self.state)
            .users
            .iter()
            .map(|(u, _)| u.clone())
            .collect()
    }

    pub fn insert_recipe(&self, name: &str, instructions: &str) -> EntityId {
        lock(&self.state).insert_recipe(name, instructions).id
    }

    pub fn insert_ingredient(&self, name: &str) -> EntityId {
        lock(&self.state).insert_ingredient(name).id
    }

    /// Accept another bearer token from now on.
    pub fn add_token(&self, token: &str) {
        lock(&self.state).tokens.insert(token.to_string());
    }

    pub fn token_valid(&self, token: &str) -> bool {
        lock(&self.state).tokens.contains(token)
    }

    pub async fn shutdown(&self) {
        let tx = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = tx {
            let _ = tx.send(());
        }
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(?e, "fake backend task failed");
            }
        }
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route(uri::RECIPES, get(recipe_list).post(recipe_create))
        .route("/recipes/:id", put(recipe_update).delete(recipe_delete))
        .route(uri::INGREDIENTS, get(ingredient_list).post(ingredient_create))
        .route("/ingredients/:id", delete(ingredient_delete))
        .route(uri::REGISTER, post(register))
        .route(uri::LOGOUT, post(logout))
        .layer(from_fn_with_state(state.clone(), journal_layer))
        .with_state(state)
}

pub(crate) fn start_backend(config: BackendConfig, listener: TcpListener) -> BackendHandle {
    let mut state = BackendState::default();
    state.tokens.extend(config.tokens);
    for (name, instructions) in config.recipes {
        state.insert_recipe(name, instructions);
    }
    for name in config.ingredients {
        state.insert_ingredient(name);
    }
    state.users.extend(
        config
            .users
            .into_iter()
            .map(|(u, e)| (u.to_string(), e.to_string())),
    );

    let state: Shared = Arc::new(Mutex::new(state));
    let app = router(state.clone());

    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = rx.await;
        });
        if let Err(e) = server.await {
            error!(?e, "fake backend stopped unexpectedly");
        }
    });

    BackendHandle {
        state,
        shutdown: Arc::new(Mutex::new(Some(tx))),
        task: Arc::new(tokio::sync::Mutex::new(Some(task))),
    }
}
