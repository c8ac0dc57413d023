//! Google Drive backed object store.
//!
//! Credentials live in a config directory:
//!
//! - `token.json`: an OAuth user token (`token`, `refresh_token`,
//!   `token_uri`, `client_id`, `client_secret`), as written by the usual
//!   installed-app consent flow.
//! - `credentials.json`: the OAuth client (`installed` or `web` section),
//!   consulted when the token file does not carry the client itself.
//!
//! When a refresh token is present the access token is refreshed before
//! each call and written back to `token.json`.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{
    Response, Url,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, SnapshotError};

use super::ObjectStore;

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DEFAULT_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

#[derive(Debug, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

pub struct DriveStore {
    token_path: PathBuf,
    credentials_path: PathBuf,
    api_base: String,
    upload_base: String,
    client: reqwest::Client,
}

impl DriveStore {
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        let config_dir = config_dir.as_ref();
        Self {
            token_path: config_dir.join("token.json"),
            credentials_path: config_dir.join("credentials.json"),
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the store at other endpoints (a proxy or a test server).
    pub fn with_endpoints(mut self, api_base: &str, upload_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self
    }

    async fn load_token(&self) -> Result<StoredToken> {
        let raw = tokio::fs::read_to_string(&self.token_path)
            .await
            .map_err(|err| {
                SnapshotError::Credentials(format!("{}: {err}", self.token_path.display()))
            })?;
        serde_json::from_str(&raw).map_err(|err| {
            SnapshotError::Credentials(format!("{}: {err}", self.token_path.display()))
        })
    }

    async fn client_secret(&self) -> Result<ClientSecret> {
        let raw = tokio::fs::read_to_string(&self.credentials_path)
            .await
            .map_err(|err| {
                SnapshotError::Credentials(format!("{}: {err}", self.credentials_path.display()))
            })?;
        let secrets: ClientSecrets = serde_json::from_str(&raw).map_err(|err| {
            SnapshotError::Credentials(format!("{}: {err}", self.credentials_path.display()))
        })?;
        secrets.installed.or(secrets.web).ok_or_else(|| {
            SnapshotError::Credentials(format!(
                "{}: no installed or web client",
                self.credentials_path.display()
            ))
        })
    }

    async fn access_token(&self) -> Result<String> {
        let mut token = self.load_token().await?;
        let Some(refresh_token) = token.refresh_token.clone() else {
            return token.token.ok_or_else(|| {
                SnapshotError::Credentials("token file holds no access token".to_string())
            });
        };

        let (client_id, client_secret, token_uri) =
            match (token.client_id.clone(), token.client_secret.clone()) {
                (Some(id), Some(secret)) => (id, secret, token.token_uri.clone()),
                _ => {
                    let client = self.client_secret().await?;
                    let uri = token.token_uri.clone().or(client.token_uri);
                    (client.client_id, client.client_secret, uri)
                }
            };
        let token_uri = token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        let response = self
            .client
            .post(&token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await?;
        let refreshed: RefreshResponse = checked(response)
            .await
            .map_err(|err| SnapshotError::Credentials(format!("token refresh failed: {err}")))?
            .json()
            .await?;

        token.token = Some(refreshed.access_token.clone());
        match serde_json::to_string_pretty(&token) {
            Ok(raw) => {
                if let Err(err) = tokio::fs::write(&self.token_path, raw).await {
                    tracing::warn!("failed to persist refreshed token: {err}");
                }
            }
            Err(err) => tracing::warn!("failed to serialize refreshed token: {err}"),
        }

        Ok(refreshed.access_token)
    }

    async fn bearer(&self) -> Result<HeaderValue> {
        let token = self.access_token().await?;
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            SnapshotError::Credentials("access token is not a valid header".to_string())
        })
    }
}

/// `<base>/files/<file_id>`, with the id percent-encoded as one path segment.
fn file_url(base: &str, file_id: &str) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|err| SnapshotError::Config(format!("invalid endpoint {base}: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| SnapshotError::Config(format!("invalid endpoint {base}")))?
        .pop_if_empty()
        .extend(["files", file_id]);
    Ok(url)
}

/// Turn a non-success response into a [`SnapshotError::Remote`] carrying the body.
async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SnapshotError::Remote(format!("{status}: {}", body.trim())))
}

#[async_trait]
impl ObjectStore for DriveStore {
    fn name(&self) -> &'static str {
        "drive"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>> {
        let url = file_url(&self.api_base, file_id)?;
        let response = self
            .client
            .get(url)
            .query(&[("alt", "media")])
            .header(AUTHORIZATION, self.bearer().await?)
            .send()
            .await?;
        let bytes = checked(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn replace(&self, file_id: &str, data: Vec<u8>) -> Result<()> {
        let url = file_url(&self.upload_base, file_id)?;
        let response = self
            .client
            .patch(url)
            .query(&[("uploadType", "media")])
            .header(AUTHORIZATION, self.bearer().await?)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_token_file_is_a_credentials_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DriveStore::new(dir.path());

        let err = store.fetch("file-id").await.unwrap_err();
        assert!(matches!(err, SnapshotError::Credentials(_)), "{err}");
    }

    #[tokio::test]
    async fn static_token_is_used_without_refresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("token.json"),
            r#"{"token": "abc", "scopes": ["https://www.googleapis.com/auth/drive.file"]}"#,
        )
        .unwrap();
        let store = DriveStore::new(dir.path());

        assert_eq!(store.access_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn refresh_without_client_is_a_credentials_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("token.json"),
            r#"{"token": "abc", "refresh_token": "r"}"#,
        )
        .unwrap();
        let store = DriveStore::new(dir.path());

        let err = store.access_token().await.unwrap_err();
        assert!(matches!(err, SnapshotError::Credentials(_)), "{err}");
    }

    #[test]
    fn file_ids_are_one_encoded_segment() {
        let url = file_url("https://example.test/drive/v3/", "a/b?c%").unwrap();
        assert_eq!(url.as_str(), "https://example.test/drive/v3/files/a%2Fb%3Fc%25");
    }

    #[test]
    fn unknown_token_fields_are_preserved() {
        let token: StoredToken =
            serde_json::from_str(r#"{"token": "abc", "expiry": "2025-01-01T00:00:00Z"}"#).unwrap();
        let raw = serde_json::to_string(&token).unwrap();
        assert!(raw.contains("expiry"));
    }
}
