//! Because consistency is great!
//!
pub mod uri;

/// The backend the client talks to when nothing else has been configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";

pub const APPLICATION_JSON: &str = "application/json";

/// The "system" path for the client config
pub const DEFAULT_CLIENT_CONFIG_PATH: &str = "/etc/recipes/config";
/// The user-owned path for the client config
pub const DEFAULT_CLIENT_CONFIG_PATH_HOME: &str = "~/.config/recipes";

/// The default location of the `recipes` CLI session store.
pub const CLIENT_SESSION_CACHE: &str = "~/.cache/recipes_session";

// IF YOU CHANGE THESE VALUES EXISTING SESSION STORES CAN NO LONGER BE READ
/// Session storage key holding the bearer credential.
pub const SESSION_KEY_AUTH_TOKEN: &str = "auth-token";
/// Session storage key holding the admin flag, which is only set when the value is `"true"`.
pub const SESSION_KEY_IS_ADMIN: &str = "is-admin";
