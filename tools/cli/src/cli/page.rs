//! Page controllers. A page owns the local copy of one collection and turns
//! user commands into backend requests, re-rendering after every change.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use recipes_client::{ClientError, RecipesClient};
use recipes_proto::v1::{EntityId, Searchable};
use thiserror::Error;

use crate::forms::{EditablePageEntity, PageEntity};
use crate::frontend::{Destination, Frontend};
use crate::mirror::LocalMirror;
use crate::session::{SessionContext, SessionError, SessionStore};
use crate::tracker::{CommandKind, CommandTracker};

/// Why a command did not complete. The display text is what the user is told.
#[derive(Debug, Error)]
pub enum PageError {
    /// A required field was blank or inconsistent. Nothing was sent.
    #[error("{0}")]
    Validation(String),
    /// The command needs a session token and there is none. Nothing was sent.
    #[error("{0}")]
    NotLoggedIn(String),
    #[error("{message}")]
    Fetch {
        message: String,
        #[source]
        source: Option<ClientError>,
    },
    /// The backend refused a create.
    #[error("{message}")]
    BackendRejected {
        message: String,
        #[source]
        source: ClientError,
    },
    #[error("{0}")]
    NotFound(String),
    /// The same command is still in flight.
    #[error("{0}")]
    Busy(String),
    #[error("{0}")]
    Register(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl PageError {
    pub(crate) fn fetch(message: String, source: ClientError) -> Self {
        PageError::Fetch {
            message,
            source: Some(source),
        }
    }
}

/// Runs `body` as a `kind` command. Refuses to start while another `kind`
/// command is in flight, and alerts the user if the command fails.
pub(crate) async fn run_command<T, F, Fut>(
    tracker: &CommandTracker,
    frontend: &F,
    kind: CommandKind,
    body: Fut,
) -> Result<T, PageError>
where
    F: Frontend,
    Fut: Future<Output = Result<T, PageError>>,
{
    let result = match tracker.begin(kind) {
        Some(ticket) => {
            let result = body.await;
            if result.is_ok() {
                ticket.succeed();
            }
            result
        }
        None => Err(PageError::Busy(format!(
            "{} {} request is already in progress",
            kind.article(),
            kind
        ))),
    };

    if let Err(e) = &result {
        match e {
            PageError::Validation(_) | PageError::NotLoggedIn(_) | PageError::Busy(_) => {
                info!(command = %kind, "{}", e)
            }
            _ => error!(command = %kind, ?e, "command failed"),
        }
        frontend.alert(&e.to_string());
    }
    result
}

pub struct Page<E: PageEntity, F: Frontend> {
    /// This page's own session with the backend. The token never leaks to
    /// other pages built from the same client.
    client: RecipesClient,
    store: Arc<dyn SessionStore>,
    session: RwLock<SessionContext>,
    mirror: tokio::sync::RwLock<LocalMirror<E>>,
    tracker: CommandTracker,
    frontend: F,
}

impl<E: PageEntity, F: Frontend> Page<E, F> {
    /// Reads the session once and hands its token to a fresh session of
    /// `client`. The mirror starts empty until [`Page::load`].
    pub async fn new(
        client: &RecipesClient,
        store: Arc<dyn SessionStore>,
        frontend: F,
    ) -> Result<Self, PageError> {
        let session = SessionContext::load(store.as_ref())?;
        let client = client.new_session().map_err(|e| PageError::Fetch {
            message: "Unable to configure the client".to_string(),
            source: Some(e),
        })?;
        if let Some(token) = &session.token {
            client.set_token(token.clone()).await;
        }
        debug!(
            kind = E::KIND,
            logged_in = session.is_logged_in(),
            is_admin = session.is_admin,
            "page ready"
        );

        Ok(Page {
            client,
            store,
            session: RwLock::new(session),
            mirror: tokio::sync::RwLock::new(LocalMirror::new()),
            tracker: CommandTracker::new(),
            frontend,
        })
    }

    pub fn session(&self) -> SessionContext {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn tracker(&self) -> &CommandTracker {
        &self.tracker
    }

    /// A copy of the records as last fetched.
    pub async fn records(&self) -> Vec<E> {
        self.mirror.read().await.records().to_vec()
    }

    fn fetch_failed(source: ClientError) -> PageError {
        PageError::fetch(format!("Error fetching {}s", E::KIND), source)
    }

    /// Fetch the whole collection, replace the mirror with it and render it.
    /// Names held by more than one record are flagged, lookups by such a name
    /// use the first record in backend order.
    async fn sync(&self) -> Result<Vec<E>, ClientError> {
        let records = self.client.collection_list::<E>().await?;
        debug!(kind = E::KIND, count = records.len(), "mirror replaced");
        let mut mirror = self.mirror.write().await;
        mirror.replace(records.clone());
        for (name, count) in mirror.duplicate_names() {
            warn!(
                kind = E::KIND,
                %name,
                count,
                "name is not unique, using the first match"
            );
        }
        self.frontend.render(mirror.records());
        Ok(records)
    }

    /// Re-fetch and find the first record named exactly `name`.
    async fn resolve(&self, name: &str) -> Result<EntityId, PageError> {
        self.sync().await.map_err(Self::fetch_failed)?;

        let mirror = self.mirror.read().await;
        match mirror.lookup(name).and_then(<[EntityId]>::first) {
            Some(first) => Ok(first.clone()),
            None => Err(PageError::NotFound(format!("{} not found", E::LABEL))),
        }
    }

    /// Initial fetch of the collection.
    pub async fn load(&self) -> Result<Vec<E>, PageError> {
        run_command(&self.tracker, &self.frontend, CommandKind::Load, async {
            self.sync().await.map_err(Self::fetch_failed)
        })
        .await
    }

    /// Create a record from `form`. The form is cleared only once the
    /// backend has accepted it.
    pub async fn add(&self, form: &mut E::Fields) -> Result<(), PageError> {
        run_command(&self.tracker, &self.frontend, CommandKind::Add, async {
            let fields =
                E::trimmed(form).ok_or_else(|| PageError::Validation(E::MISSING_ON_ADD.to_string()))?;

            if !self.session().is_logged_in() {
                return Err(PageError::NotLoggedIn(format!(
                    "You must be logged in to add {} {}",
                    E::ARTICLE,
                    E::KIND
                )));
            }

            self.client
                .collection_create::<E>(&fields)
                .await
                .map_err(|e| match e {
                    ClientError::Http(..) => PageError::BackendRejected {
                        message: e
                            .backend_message()
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("Failed to add {}", E::KIND)),
                        source: e,
                    },
                    _ => PageError::fetch(format!("Error adding {}", E::KIND), e),
                })?;

            *form = E::Fields::default();
            self.sync().await.map_err(Self::fetch_failed)?;
            Ok(())
        })
        .await
    }

    /// Delete the first record named `name`. `name` is cleared on success.
    pub async fn delete(&self, name: &mut String) -> Result<(), PageError> {
        run_command(&self.tracker, &self.frontend, CommandKind::Delete, async {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(PageError::Validation(E::MISSING_ON_DELETE.to_string()));
            }

            let id = self.resolve(trimmed).await?;
            self.client
                .collection_delete::<E>(&id)
                .await
                .map_err(|e| PageError::fetch(format!("Error deleting {}", E::KIND), e))?;

            name.clear();
            self.sync().await.map_err(Self::fetch_failed)?;
            Ok(())
        })
        .await
    }

    /// End the session on the backend. Local session state is only dropped
    /// once the backend agrees.
    pub async fn logout(&self) -> Result<(), PageError> {
        run_command(&self.tracker, &self.frontend, CommandKind::Logout, async {
            if !self.session().is_logged_in() {
                return Err(PageError::NotLoggedIn("Error logging out".to_string()));
            }

            self.client
                .logout()
                .await
                .map_err(|e| PageError::fetch("Error logging out".to_string(), e))?;

            self.store.clear()?;
            *self.session.write().unwrap_or_else(PoisonError::into_inner) =
                SessionContext::default();
            info!("session ended");
            self.frontend.navigate(Destination::Login);
            Ok(())
        })
        .await
    }
}

impl<E: EditablePageEntity, F: Frontend> Page<E, F> {
    /// Replace the record named in `form` with the contents of `form`.
    pub async fn update(&self, form: &mut E::Fields) -> Result<(), PageError> {
        run_command(&self.tracker, &self.frontend, CommandKind::Update, async {
            let fields = E::trimmed(form)
                .ok_or_else(|| PageError::Validation(E::MISSING_ON_UPDATE.to_string()))?;

            let id = self.resolve(E::form_name(&fields)).await?;
            self.client
                .collection_update::<E>(&id, &fields)
                .await
                .map_err(|e| PageError::fetch(format!("Error updating {}", E::KIND), e))?;

            *form = E::Fields::default();
            self.sync().await.map_err(Self::fetch_failed)?;
            Ok(())
        })
        .await
    }
}

impl<E: PageEntity + Searchable, F: Frontend> Page<E, F> {
    /// Re-fetch, then show only the records whose name contains `term`
    /// ignoring case. The mirror keeps the full collection.
    pub async fn search(&self, term: &str) -> Result<Vec<E>, PageError> {
        run_command(&self.tracker, &self.frontend, CommandKind::Search, async {
            let term = term.trim().to_lowercase();
            let all = self
                .sync()
                .await
                .map_err(|e| PageError::fetch(format!("Error searching {}s", E::KIND), e))?;

            let found: Vec<E> = all
                .into_iter()
                .filter(|r| r.name().to_lowercase().contains(&term))
                .collect();
            debug!(kind = E::KIND, %term, count = found.len(), "search filtered");
            self.frontend.render(&found);
            Ok(found)
        })
        .await
    }
}
