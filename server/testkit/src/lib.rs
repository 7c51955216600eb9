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

use std::sync::atomic::{AtomicU16, Ordering};

use recipes_client::{RecipesClient, RecipesClientBuilder};
use tokio::net::TcpListener;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod backend;

pub use crate::backend::{BackendConfig, BackendHandle, RequestRecord};

/// Accepted by every fresh backend.
pub const TEST_TOKEN: &str = "integration-test-token";

pub const TEST_USERNAME: &str = "krab_test_user";
pub const TEST_EMAIL: &str = "krab@example.com";
pub const TEST_PASSWORD: &str = "eicieY7ahchaoCh0eeTa";

pub static PORT_ALLOC: AtomicU16 = AtomicU16::new(18180);

pub use recipes_testkit_macros::{cli_recipes, test};

/// Route tracing output through the test harness so it only shows for failures.
pub fn test_init() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// allowed because the use of this function is behind a test gate
#[allow(dead_code)]
pub async fn setup_async_test(config: BackendConfig) -> (RecipesClient, BackendHandle) {
    test_init();

    let mut counter = 0;
    let (listener, port) = loop {
        let possible_port = PORT_ALLOC.fetch_add(1, Ordering::SeqCst);
        match TcpListener::bind(("127.0.0.1", possible_port)).await {
            Ok(listener) => break (listener, possible_port),
            Err(e) => {
                trace!(?e, "port {} unavailable", possible_port);
            }
        }
        counter += 1;
        #[allow(clippy::panic)]
        if counter >= 10 {
            error!("Unable to allocate port!");
            panic!();
        }
    };

    let addr = format!("http://127.0.0.1:{}", port);
    let backend = backend::start_backend(config, listener);
    trace!("fake backend listening on {}", addr);

    #[allow(clippy::panic)]
    let rsclient = match RecipesClientBuilder::new()
        .address(addr)
        .no_proxy()
        .connect_timeout(10)
        .build()
    {
        Ok(val) => val,
        Err(_) => panic!("failed to build client"),
    };

    (rsclient, backend)
}
