use std::collections::HashMap;

use crate::error::FetchError;

pub(crate) const SERVICE_NAME: &str = "taskmail";

/// Keyring lookup key for a mail server.
pub fn server_key(host: &str) -> String {
    format!("imap://{}", host)
}

fn attributes(server: &str) -> HashMap<&str, &str> {
    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("server", server);
    attrs
}

/// Store IMAP credentials in the system keyring via Secret Service.
pub async fn store_credentials(
    host: &str,
    username: &str,
    password: &str,
) -> Result<(), FetchError> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| FetchError::Credentials(format!("Failed to connect to keyring: {}", e)))?;

    let server = server_key(host);
    let secret = format!("{}:{}", username, password);
    keyring
        .create_item(
            &format!("taskmail IMAP ({})", host),
            &attributes(&server),
            secret.as_bytes(),
            true,
        )
        .await
        .map_err(|e| FetchError::Credentials(format!("Failed to store credentials: {}", e)))?;

    log::info!("stored IMAP credentials for {}", host);
    Ok(())
}

/// Load IMAP credentials from the system keyring as `(username, password)`.
pub async fn load_credentials(host: &str) -> Result<Option<(String, String)>, FetchError> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| FetchError::Credentials(format!("Failed to connect to keyring: {}", e)))?;

    let server = server_key(host);
    let items = keyring
        .search_items(&attributes(&server))
        .await
        .map_err(|e| FetchError::Credentials(format!("Failed to search keyring: {}", e)))?;

    let Some(item) = items.first() else {
        return Ok(None);
    };
    let secret_bytes = item
        .secret()
        .await
        .map_err(|e| FetchError::Credentials(format!("Failed to read secret: {}", e)))?;
    let secret = String::from_utf8(secret_bytes.to_vec())
        .map_err(|e| FetchError::Credentials(format!("Invalid UTF-8 in secret: {}", e)))?;
    Ok(secret
        .split_once(':')
        .map(|(user, pass)| (user.to_string(), pass.to_string())))
}
