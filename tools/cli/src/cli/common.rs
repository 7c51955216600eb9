use std::sync::Arc;

use recipes_client::{ClientError, RecipesClient, RecipesClientBuilder};
use recipes_proto::constants::{
    CLIENT_SESSION_CACHE, DEFAULT_CLIENT_CONFIG_PATH, DEFAULT_CLIENT_CONFIG_PATH_HOME,
};

use crate::session::{FileSessionStore, MemorySessionStore, SessionStore};
use crate::RecipesClientParser;

impl RecipesClientParser {
    /// System config, then user config, then whatever was passed on the
    /// command line or environment.
    pub fn to_client(&self) -> Result<RecipesClient, ClientError> {
        let config_path: String = shellexpand::tilde(DEFAULT_CLIENT_CONFIG_PATH_HOME).into_owned();

        let client_builder = RecipesClientBuilder::new()
            .read_options_from_optional_config(DEFAULT_CLIENT_CONFIG_PATH)
            .map_err(|e| {
                error!(
                    "Failed to parse config ({:?}) -- {:?}",
                    DEFAULT_CLIENT_CONFIG_PATH, e
                );
                e
            })
            .and_then(|cb| {
                cb.read_options_from_optional_config(&config_path)
                    .map_err(|e| {
                        error!("Failed to parse config ({:?}) -- {:?}", config_path, e);
                        e
                    })
            })?;
        debug!(
            "Successfully loaded configuration, looked in {} and {} - client builder state: {:?}",
            DEFAULT_CLIENT_CONFIG_PATH, DEFAULT_CLIENT_CONFIG_PATH_HOME, &client_builder
        );

        let client_builder = match &self.addr {
            Some(a) => client_builder.address(a.to_string()),
            None => client_builder,
        };

        let client_builder = match self.connect_timeout {
            Some(secs) => client_builder.connect_timeout(secs),
            None => client_builder,
        };

        let ca_path: Option<&str> = self.ca_path.as_ref().and_then(|p| p.to_str());
        let client_builder = match ca_path {
            Some(p) => {
                debug!("Adding trusted CA cert {:?}", p);
                client_builder.add_root_certificate_filepath(p).map_err(|e| {
                    error!("Failed to add ca certificate -- {:?}", e);
                    e
                })?
            }
            None => client_builder,
        };

        client_builder.build().map_err(|e| {
            error!("Failed to build client instance -- {:?}", e);
            e
        })
    }

    pub fn session_path(&self) -> String {
        match self.session_path.clone() {
            None => CLIENT_SESSION_CACHE.to_string(),
            Some(val) => val,
        }
    }

    /// A `--token` gives a throwaway session that never touches disk.
    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        match &self.token {
            Some(token) => {
                debug!("Using the session token supplied on the command line");
                Arc::new(MemorySessionStore::with_token(token))
            }
            None => {
                let path = self.session_path();
                debug!("Using the session store at {}", path);
                Arc::new(FileSessionStore::new(&path))
            }
        }
    }
}
