use clap::{Args, Subcommand};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// The CLI output mode, either text or json, falls back to text if you ask for something other than text/json
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

impl From<OutputMode> for clap::builder::OsStr {
    fn from(output_mode: OutputMode) -> Self {
        match output_mode {
            OutputMode::Text => "text".into(),
            OutputMode::Json => "json".into(),
        }
    }
}

impl std::str::FromStr for OutputMode {
    type Err = String;
    fn from_str(s: &str) -> Result<OutputMode, std::string::String> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputMode::Text),
            "json" => Ok(OutputMode::Json),
            _ => Ok(OutputMode::Text),
        }
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum RecipeOpt {
    /// List every recipe
    #[clap(name = "list")]
    List,
    /// Show recipes whose name contains the term, ignoring case
    #[clap(name = "search")]
    Search { term: String },
    /// Add a new recipe. Requires a session token.
    #[clap(name = "add")]
    Add { name: String, instructions: String },
    /// Replace the instructions of the recipe with this name
    #[clap(name = "update")]
    Update { name: String, instructions: String },
    /// Delete the recipe with this name
    #[clap(name = "delete")]
    Delete { name: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum IngredientOpt {
    /// List every ingredient
    #[clap(name = "list")]
    List,
    /// Add a new ingredient. Requires a session token.
    #[clap(name = "add")]
    Add { name: String },
    /// Delete the ingredient with this name
    #[clap(name = "delete")]
    Delete { name: String },
}

#[derive(Debug, Args, Clone)]
pub struct RegisterOpt {
    pub username: String,
    pub email: String,
    /// Use this password instead of prompting. It is used for both the
    /// password and its confirmation.
    #[clap(
        long = "password",
        env = "RECIPES_PASSWORD",
        hide = true,
        hide_env_values = true
    )]
    pub password: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum SessionOpt {
    /// Show whether a session token is stored, and whether it is an admin session
    #[clap(name = "show")]
    Show,
    /// Store a token that was issued elsewhere
    #[clap(name = "set")]
    Set {
        token: String,
        /// Mark the session as an administrator session
        #[clap(long)]
        admin: bool,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum RecipesClientOpt {
    /// View and manage recipes
    Recipe {
        #[clap(subcommand)]
        commands: RecipeOpt,
    },
    /// View and manage ingredients
    Ingredient {
        #[clap(subcommand)]
        commands: IngredientOpt,
    },
    /// Create a new account. Passwords are prompted for.
    Register(RegisterOpt),
    /// End the current session on the backend and forget it locally
    Logout,
    /// Inspect or seed the local session store
    Session {
        #[clap(subcommand)]
        commands: SessionOpt,
    },
    /// Print the program version and exit
    Version,
}

#[derive(Debug, clap::Parser, Clone)]
#[clap(about = "Recipe Management Client Utility")]
pub struct RecipesClientParser {
    #[clap(subcommand)]
    pub commands: RecipesClientOpt,

    /// Enable debugging of the recipes tool
    #[clap(short, long, env = "RECIPES_DEBUG", global = true)]
    pub debug: bool,
    /// The URL of the recipe management backend
    #[clap(short = 'H', long = "url", env = "RECIPES_URL", global = true,
    value_parser = clap::builder::NonEmptyStringValueParser::new())]
    pub addr: Option<String>,
    /// Path to a CA certificate file
    #[clap(
        value_parser,
        short = 'C',
        long = "ca",
        env = "RECIPES_CA_PATH",
        global = true
    )]
    pub ca_path: Option<PathBuf>,
    /// Seconds to wait on the backend before giving up
    #[clap(long = "connect-timeout", env = "RECIPES_CONNECT_TIMEOUT", global = true)]
    pub connect_timeout: Option<u64>,
    /// Output format
    #[clap(short, long = "output", env = "RECIPES_OUTPUT", global = true, default_value=OutputMode::default())]
    pub output_mode: OutputMode,
    /// Use this bearer token for this invocation only. The session store is
    /// neither read nor written.
    #[clap(
        long = "token",
        env = "RECIPES_TOKEN",
        hide_env_values = true,
        global = true,
        value_parser = clap::builder::NonEmptyStringValueParser::new())]
    pub token: Option<String>,
    /// Path to the session store, defaults to ~/.cache/recipes_session
    #[clap(
        long = "session-path",
        env = "RECIPES_SESSION_PATH",
        global = true,
        value_parser = clap::builder::NonEmptyStringValueParser::new())]
    pub session_path: Option<String>,
}
