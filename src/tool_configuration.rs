//! Shared resources of a mash run.

use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

/// The user agent to use for the reqwest client
pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Timeout for a single download, in seconds
const DOWNLOAD_TIMEOUT: u64 = 5 * 60;

/// Global configuration for a run
#[derive(Clone, Debug)]
pub struct Configuration {
    /// The download client used for rosdep sources and rosdistro files
    pub client: ClientWithMiddleware,
}

impl Configuration {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest_client()?,
        })
    }
}

/// Create a reqwest client that retries transient failures
pub fn reqwest_client() -> Result<ClientWithMiddleware, reqwest::Error> {
    Ok(reqwest_middleware::ClientBuilder::new(
        reqwest::Client::builder()
            .pool_max_idle_per_host(20)
            .user_agent(APP_USER_AGENT)
            .timeout(std::time::Duration::from_secs(DOWNLOAD_TIMEOUT))
            .build()?,
    )
    .with(RetryTransientMiddleware::new_with_policy(
        ExponentialBackoff::builder().build_with_max_retries(3),
    ))
    .build())
}
