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

use std::fmt::{Display, Formatter};
use std::fs::File;
#[cfg(target_family = "unix")] // not needed for windows builds
use std::fs::{metadata, Metadata};
use std::io::{ErrorKind, Read};
#[cfg(target_family = "unix")] // not needed for windows builds
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::time::Duration;

use recipes_proto::constants::{APPLICATION_JSON, DEFAULT_BASE_URL};
use recipes_proto::v1::ErrorMessage;
use reqwest::header::CONTENT_TYPE;
pub use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::error::Error as SerdeJsonError;
use tokio::sync::RwLock;
use url::Url;

mod collection;
mod ingredient;
mod recipe;
mod system;

#[derive(Debug)]
pub enum ClientError {
    /// The backend answered with a non-success status. Carries the decoded
    /// error body (if it had the expected shape) and the raw body text.
    Http(reqwest::StatusCode, Option<ErrorMessage>, String),
    Transport(reqwest::Error),
    JsonDecode(reqwest::Error, String),
    JsonEncode(SerdeJsonError),
    ConfigParseIssue(String),
    CertParseIssue(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http(status, _, _) => Some(*status),
            _ => None,
        }
    }

    /// The human readable message the backend attached to a failure, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ClientError::Http(_, Some(em), _) => em.message.as_deref(),
            _ => None,
        }
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(status, Some(ErrorMessage { message: Some(m) }), _) => {
                write!(f, "backend returned {} - {}", status, m)
            }
            ClientError::Http(status, _, _) => write!(f, "backend returned {}", status),
            ClientError::Transport(e) => write!(f, "transport failure - {}", e),
            ClientError::JsonDecode(e, dest) => write!(f, "invalid response from {} - {}", dest, e),
            ClientError::JsonEncode(e) => write!(f, "unable to encode request - {}", e),
            ClientError::ConfigParseIssue(e) => write!(f, "invalid client configuration - {}", e),
            ClientError::CertParseIssue(e) => write!(f, "invalid ca certificate - {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Transport(e) | ClientError::JsonDecode(e, _) => Some(e),
            ClientError::JsonEncode(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct RecipesClientConfig {
    pub uri: Option<String>,
    pub verify_ca: Option<bool>,
    pub ca_path: Option<String>,
    pub connect_timeout: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RecipesClientBuilder {
    address: Option<String>,
    verify_ca: bool,
    ca: Option<reqwest::Certificate>,
    connect_timeout: Option<u64>,
    use_system_proxies: bool,
}

impl Default for RecipesClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RecipesClientBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.address {
            Some(value) => writeln!(f, "address: {}", value)?,
            None => writeln!(f, "address: unset")?,
        }
        writeln!(f, "verify_ca: {}", self.verify_ca)?;
        match &self.ca {
            Some(value) => writeln!(f, "ca: {:#?}", value)?,
            None => writeln!(f, "ca: unset")?,
        }
        match self.connect_timeout {
            Some(value) => writeln!(f, "connect_timeout: {}", value)?,
            None => writeln!(f, "connect_timeout: unset")?,
        }
        writeln!(f, "use_system_proxies: {}", self.use_system_proxies)
    }
}

#[derive(Debug)]
pub struct RecipesClient {
    pub(crate) client: reqwest::Client,
    pub(crate) addr: String,
    pub(crate) origin: Url,
    pub(crate) builder: RecipesClientBuilder,
    pub(crate) bearer_token: RwLock<Option<String>>,
}

#[cfg(target_family = "unix")]
fn read_file_metadata<P: AsRef<Path>>(path: &P) -> Result<Metadata, ()> {
    metadata(path).map_err(|e| {
        error!(
            "Unable to read metadata for {} - {:?}",
            path.as_ref().to_str().unwrap_or("Alert: invalid path"),
            e
        );
    })
}

impl RecipesClientBuilder {
    pub fn new() -> Self {
        RecipesClientBuilder {
            address: None,
            verify_ca: true,
            ca: None,
            connect_timeout: None,
            use_system_proxies: true,
        }
    }

    fn parse_certificate(ca_path: &str) -> Result<reqwest::Certificate, ClientError> {
        let mut buf = Vec::new();

        #[cfg(target_family = "unix")]
        {
            let path = Path::new(ca_path);
            let ca_meta = read_file_metadata(&path).map_err(|e| {
                error!("{:?}", e);
                ClientError::ConfigParseIssue(format!("{:?}", e))
            })?;

            trace!("mode={:o}", ca_meta.mode());
            if (ca_meta.mode() & 0o7133) != 0 {
                warn!("permissions on {} are NOT secure. 0644 is a secure default. Should not be setuid, executable or allow group/other writes.", ca_path);
            }
        }

        let mut f = File::open(ca_path).map_err(|e| {
            error!("{:?}", e);
            ClientError::ConfigParseIssue(format!("{:?}", e))
        })?;
        f.read_to_end(&mut buf).map_err(|e| {
            error!("{:?}", e);
            ClientError::ConfigParseIssue(format!("{:?}", e))
        })?;
        reqwest::Certificate::from_pem(&buf).map_err(|e| {
            error!("{:?}", e);
            ClientError::CertParseIssue(format!("{:?}", e))
        })
    }

    fn apply_config_options(self, rcc: RecipesClientConfig) -> Result<Self, ClientError> {
        let RecipesClientBuilder {
            address,
            verify_ca,
            ca,
            connect_timeout,
            use_system_proxies,
        } = self;
        // Anything the config file doesn't mention keeps its current value.
        let address = match rcc.uri {
            Some(uri) => Some(uri),
            None => {
                debug!("No URI in config supplied to apply_config_options");
                address
            }
        };
        let verify_ca = rcc.verify_ca.unwrap_or(verify_ca);
        let ca = match rcc.ca_path {
            Some(ca_path) => Some(Self::parse_certificate(ca_path.as_str())?),
            None => ca,
        };
        let connect_timeout = rcc.connect_timeout.or(connect_timeout);

        Ok(RecipesClientBuilder {
            address,
            verify_ca,
            ca,
            connect_timeout,
            use_system_proxies,
        })
    }

    pub fn read_options_from_optional_config<P: AsRef<Path> + std::fmt::Debug>(
        self,
        config_path: P,
    ) -> Result<Self, ClientError> {
        debug!("Attempting to load configuration from {:#?}", &config_path);

        // Check exists first, some overlay filesystems report a missing file as
        // a directory when opened.
        if !config_path.as_ref().exists() {
            debug!("{:?} does not exist", config_path);
            return Ok(self);
        };

        let mut f = match File::open(&config_path) {
            Ok(f) => {
                debug!("Successfully opened configuration file {:#?}", &config_path);
                f
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::NotFound => {
                        debug!(
                            "Configuration file {:#?} not found, skipping.",
                            &config_path
                        );
                    }
                    ErrorKind::PermissionDenied => {
                        warn!(
                            "Permission denied loading configuration file {:#?}, skipping.",
                            &config_path
                        );
                    }
                    _ => {
                        debug!(
                            "Unable to open config file {:#?} [{:?}], skipping ...",
                            &config_path, e
                        );
                    }
                };
                return Ok(self);
            }
        };

        let mut contents = String::new();
        f.read_to_string(&mut contents).map_err(|e| {
            error!("{:?}", e);
            ClientError::ConfigParseIssue(format!("{:?}", e))
        })?;

        let config: RecipesClientConfig = toml::from_str(contents.as_str()).map_err(|e| {
            error!("{:?}", e);
            ClientError::ConfigParseIssue(format!("{:?}", e))
        })?;

        self.apply_config_options(config)
    }

    pub fn address(self, address: String) -> Self {
        RecipesClientBuilder {
            address: Some(address),
            ..self
        }
    }

    pub fn danger_accept_invalid_certs(self, accept_invalid_certs: bool) -> Self {
        RecipesClientBuilder {
            // Flipped, the builder stores what we verify.
            verify_ca: !accept_invalid_certs,
            ..self
        }
    }

    pub fn connect_timeout(self, secs: u64) -> Self {
        RecipesClientBuilder {
            connect_timeout: Some(secs),
            ..self
        }
    }

    pub fn no_proxy(self) -> Self {
        RecipesClientBuilder {
            use_system_proxies: false,
            ..self
        }
    }

    pub fn add_root_certificate_filepath(self, ca_path: &str) -> Result<Self, ClientError> {
        let ca = Self::parse_certificate(ca_path)?;

        Ok(RecipesClientBuilder {
            ca: Some(ca),
            ..self
        })
    }

    fn display_warnings(&self, origin: &Url) {
        if !self.verify_ca {
            warn!("verify_ca set to false in client configuration - this may allow network interception of tokens!");
        }

        let loopback = matches!(
            origin.host_str(),
            Some("localhost") | Some("127.0.0.1") | Some("[::1]")
        );
        if origin.scheme() != "https" && !loopback {
            warn!("Address does not start with 'https://' - this may allow network interception of tokens!");
        }
    }

    /// Generates a useragent header based on the package name and version
    pub fn user_agent() -> &'static str {
        static APP_USER_AGENT: &str =
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
        APP_USER_AGENT
    }

    /// Build the client ready for usage.
    pub fn build(self) -> Result<RecipesClient, ClientError> {
        let address = match &self.address {
            Some(a) => a.trim_end_matches('/').to_string(),
            None => {
                debug!("No address configured, using {}", DEFAULT_BASE_URL);
                DEFAULT_BASE_URL.to_string()
            }
        };

        let uri = Url::parse(&address).map_err(|e| {
            error!(?e, "Unable to parse address {}", address);
            ClientError::ConfigParseIssue(format!("invalid address {} - {:?}", address, e))
        })?;

        let origin = Url::parse(&uri.origin().ascii_serialization()).map_err(|e| {
            error!(?e, "Address {} has no usable origin", address);
            ClientError::ConfigParseIssue(format!("invalid origin for {} - {:?}", address, e))
        })?;

        self.display_warnings(&origin);

        let client_builder = reqwest::Client::builder()
            .user_agent(RecipesClientBuilder::user_agent())
            .danger_accept_invalid_certs(!self.verify_ca);

        let client_builder = match self.use_system_proxies {
            true => client_builder,
            false => client_builder.no_proxy(),
        };

        let client_builder = match &self.ca {
            Some(cert) => client_builder.add_root_certificate(cert.clone()),
            None => client_builder,
        };

        let client_builder = match &self.connect_timeout {
            Some(secs) => client_builder
                .connect_timeout(Duration::from_secs(*secs))
                .timeout(Duration::from_secs(*secs)),
            None => client_builder,
        };

        let client = client_builder.build().map_err(ClientError::Transport)?;

        Ok(RecipesClient {
            client,
            addr: address,
            builder: self,
            bearer_token: RwLock::new(None),
            origin,
        })
    }
}

impl RecipesClient {
    pub fn get_origin(&self) -> &Url {
        &self.origin
    }

    pub fn get_url(&self) -> &str {
        self.addr.as_str()
    }

    pub(crate) fn make_url(&self, dest: &str) -> String {
        format!("{}{}", self.get_url(), dest)
    }

    pub async fn set_token(&self, new_token: String) {
        let mut tguard = self.bearer_token.write().await;
        *tguard = Some(new_token);
    }

    pub async fn get_token(&self) -> Option<String> {
        let tguard = self.bearer_token.read().await;
        (*tguard).as_ref().cloned()
    }

    pub async fn clear_token(&self) {
        let mut tguard = self.bearer_token.write().await;
        *tguard = None;
    }

    /// A client with the same settings but its own, empty, token slot.
    pub fn new_session(&self) -> Result<Self, ClientError> {
        // Copy our builder, and then just process it.
        let builder = self.builder.clone();
        builder.build()
    }

    /// Attach the bearer token to the request, but only if we hold one.
    async fn with_bearer(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let tguard = self.bearer_token.read().await;
        if let Some(token) = &(*tguard) {
            request.bearer_auth(token)
        } else {
            request
        }
    }

    /// Send the request, rejecting anything that isn't a 2xx.
    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        dest: &str,
    ) -> Result<reqwest::Response, ClientError> {
        debug!(%method, %dest, "sending request");

        let response = request.send().await.map_err(|e| {
            error!(?e, %method, %dest, "transport failure");
            ClientError::Transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            trace!(%method, %dest, %status, "request succeeded");
            return Ok(response);
        }

        // Errors are best effort decoded, the body may be anything.
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorMessage>(&body).ok();
        warn!(%method, %dest, %status, ?body, "backend rejected request");
        Err(ClientError::Http(status, message, body))
    }

    pub(crate) async fn perform_get_request<T: DeserializeOwned>(
        &self,
        dest: &str,
    ) -> Result<T, ClientError> {
        let response = self.client.get(self.make_url(dest));
        let response = self.with_bearer(response).await;

        let response = self.dispatch(response, "GET", dest).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::JsonDecode(e, dest.to_string()))
    }

    pub(crate) async fn perform_post_request<R: Serialize>(
        &self,
        dest: &str,
        request: &R,
    ) -> Result<(), ClientError> {
        let req_string = serde_json::to_string(request).map_err(ClientError::JsonEncode)?;

        let response = self
            .client
            .post(self.make_url(dest))
            .body(req_string)
            .header(CONTENT_TYPE, APPLICATION_JSON);
        let response = self.with_bearer(response).await;

        self.dispatch(response, "POST", dest).await.map(|_| ())
    }

    /// A post with no body at all, for endpoints that act on the session itself.
    pub(crate) async fn perform_empty_post_request(&self, dest: &str) -> Result<(), ClientError> {
        let response = self.client.post(self.make_url(dest));
        let response = self.with_bearer(response).await;

        self.dispatch(response, "POST", dest).await.map(|_| ())
    }

    pub(crate) async fn perform_put_request<R: Serialize>(
        &self,
        dest: &str,
        request: &R,
    ) -> Result<(), ClientError> {
        let req_string = serde_json::to_string(request).map_err(ClientError::JsonEncode)?;

        let response = self
            .client
            .put(self.make_url(dest))
            .body(req_string)
            .header(CONTENT_TYPE, APPLICATION_JSON);
        let response = self.with_bearer(response).await;

        self.dispatch(response, "PUT", dest).await.map(|_| ())
    }

    pub(crate) async fn perform_delete_request(&self, dest: &str) -> Result<(), ClientError> {
        let response = self.client.delete(self.make_url(dest));
        let response = self.with_bearer(response).await;

        self.dispatch(response, "DELETE", dest).await.map(|_| ())
    }

    /// A post that never carries credentials and hands back whatever status
    /// the backend chose, since the caller has to branch on it.
    pub(crate) async fn perform_simple_post_request<R: Serialize>(
        &self,
        dest: &str,
        request: &R,
    ) -> Result<StatusCode, ClientError> {
        let req_string = serde_json::to_string(request).map_err(ClientError::JsonEncode)?;

        debug!(method = "POST", %dest, "sending unauthenticated request");
        let response = self
            .client
            .post(self.make_url(dest))
            .body(req_string)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .send()
            .await
            .map_err(|e| {
                error!(?e, %dest, "transport failure");
                ClientError::Transport(e)
            })?;

        Ok(response.status())
    }
}
