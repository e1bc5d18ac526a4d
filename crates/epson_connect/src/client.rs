use std::sync::Arc;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::auth::context::AuthContext;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::printer::Printer;
use crate::scanner::Scanner;

/// Entry point for the SDK. Owns the one [`AuthContext`]; the printer and
/// scanner views it hands out all share it by reference.
#[derive(Debug)]
pub struct Client {
    auth: Arc<AuthContext>,
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        if config.printer_email.is_empty() {
            return Err(Error::Client("printer email can not be empty".to_string()));
        }
        if config.client_id.is_empty() {
            return Err(Error::Client("client id can not be empty".to_string()));
        }
        if config.client_secret.is_empty() {
            return Err(Error::Client("client secret can not be empty".to_string()));
        }

        let http_client = Self::build_http_client()?;
        let retry_client = Arc::new(Self::build_retry_client(http_client));

        Ok(Client {
            auth: Arc::new(AuthContext::new(retry_client, config)),
        })
    }

    fn build_http_client() -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder().build()?)
    }

    fn build_retry_client(client: reqwest::Client) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }

    /// Performs the first grant exchange eagerly so that the subject id is
    /// known before any device-scoped call.
    pub async fn initialize(&self) -> Result<()> {
        self.auth.ensure_authenticated().await
    }

    /// Revokes the device registration. Terminal: no further authenticated
    /// call should be attempted on this instance afterwards.
    pub async fn deauthenticate(&self) -> Result<()> {
        self.auth.deauthenticate().await
    }

    pub fn printer(&self) -> Printer {
        Printer::new(Arc::clone(&self.auth))
    }

    pub fn scanner(&self) -> Scanner {
        Scanner::new(Arc::clone(&self.auth))
    }

    pub fn auth_context(&self) -> Arc<AuthContext> {
        Arc::clone(&self.auth)
    }
}
