pub mod imap;
pub mod keyring;

use crate::config::ImapConfig;
use crate::core::email::Email;
use crate::error::FetchError;

/// Where `email fetch` pulls messages from.
pub trait MailSource {
    fn fetch(&self) -> Result<Vec<Email>, FetchError>;
}

/// IMAP-over-TLS mail source with credentials from the system keyring.
#[derive(Debug, Clone)]
pub struct ImapSource {
    pub host: String,
    pub folder: String,
}

impl ImapSource {
    /// `None` when no host is configured.
    pub fn from_config(config: &ImapConfig) -> Option<Self> {
        let host = config.host.trim();
        if host.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_string(),
            folder: config.folder.clone(),
        })
    }

    async fn fetch_async(&self) -> Result<Vec<Email>, FetchError> {
        let (username, password) = keyring::load_credentials(&self.host)
            .await?
            .ok_or_else(|| {
                FetchError::Credentials(format!(
                    "no credentials stored for {}; run 'taskmail login' first",
                    keyring::server_key(&self.host)
                ))
            })?;
        imap::fetch_emails(&self.host, &username, &password, &self.folder).await
    }
}

/// Drive an async mail operation to completion on a private current-thread runtime.
pub fn block_on<T>(
    fut: impl std::future::Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| FetchError::Connection(format!("Failed to start runtime: {}", e)))?;
    runtime.block_on(fut)
}

impl MailSource for ImapSource {
    fn fetch(&self) -> Result<Vec<Email>, FetchError> {
        log::info!("fetching mail from {} ({})", self.host, self.folder);
        block_on(self.fetch_async())
    }
}
