//! Hosted storage API object store
//!
//! `{url}/storage/v1/object/{bucket}/{key}` for writes and deletes, public
//! objects under `/object/public/`, signed URLs from `/object/sign/`.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use super::{encode_key, ObjectStore};
use crate::domain::{DomainError, DomainResult};
use crate::repository::rest::{check_status, RestClient};

/// Default lifetime of a signed download URL, in seconds
pub const DEFAULT_SIGNED_URL_TTL: u64 = 3600;

#[derive(Deserialize)]
struct SignedUrl {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

pub struct RestObjectStore {
    http: reqwest::Client,
    client: RestClient,
    bucket: String,
    signed_url_ttl: Option<u64>,
}

impl RestObjectStore {
    /// `signed_url_ttl` of `None` serves public URLs only
    pub fn new(client: RestClient, bucket: &str, signed_url_ttl: Option<u64>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client,
            bucket: bucket.to_string(),
            signed_url_ttl,
        }
    }

    fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.client.base_url())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/object/{}/{}", self.storage_url(), self.bucket, encode_key(key))
    }
}

#[async_trait]
impl ObjectStore for RestObjectStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> DomainResult<String> {
        let mut headers = self.client.auth_headers()?;
        let content_type = HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        headers.insert(CONTENT_TYPE, content_type);
        headers.insert("x-upsert", HeaderValue::from_static("false"));

        let resp = self
            .http
            .post(self.object_url(key))
            .headers(headers)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        check_status(resp).await.map_err(into_storage)?;
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> DomainResult<()> {
        let resp = self
            .http
            .delete(self.object_url(key))
            .headers(self.client.auth_headers()?)
            .send()
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        check_status(resp).await.map_err(into_storage)?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.storage_url(),
            self.bucket,
            encode_key(key)
        )
    }

    async fn signed_url(&self, key: &str) -> DomainResult<String> {
        let Some(ttl) = self.signed_url_ttl else {
            return Ok(self.public_url(key));
        };

        let url = format!(
            "{}/object/sign/{}/{}",
            self.storage_url(),
            self.bucket,
            encode_key(key)
        );
        let resp = self
            .http
            .post(url)
            .headers(self.client.auth_headers()?)
            .json(&json!({ "expiresIn": ttl }))
            .send()
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        let signed: SignedUrl = check_status(resp)
            .await
            .map_err(into_storage)?
            .json()
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        Ok(format!("{}{}", self.storage_url(), signed.signed_url))
    }
}

fn into_storage(e: DomainError) -> DomainError {
    match e {
        DomainError::Backend(msg) => DomainError::Storage(msg),
        other => other,
    }
}
