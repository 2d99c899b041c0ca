//! PostgREST Client
//!
//! Thin wrapper over the hosted backend's `/rest/v1/{table}` endpoints.
//! Filters are passed as query pairs in PostgREST syntax (`eq.`, `ilike.`).

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;

use crate::domain::{DomainError, DomainResult};

/// A single query pair, e.g. `("area_id", "eq.<uuid>")`
pub type Filter = (&'static str, String);

/// `eq.` filter value
pub fn eq(value: impl Display) -> String {
    format!("eq.{}", value)
}

/// Case-insensitive substring filter value
pub fn ilike_contains(value: &str) -> String {
    let escaped = value
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("ilike.*{}*", escaped)
}

#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// `apikey` plus bearer auth, as the hosted gateway expects
    pub fn auth_headers(&self) -> DomainResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| DomainError::Config(format!("invalid api key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| DomainError::Config(format!("invalid api key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    fn write_headers(&self, prefer: &'static str) -> DomainResult<HeaderMap> {
        let mut headers = self.auth_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("prefer", HeaderValue::from_static(prefer));
        Ok(headers)
    }

    /// `GET` rows matching every filter
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<&str>,
    ) -> DomainResult<Vec<T>> {
        let mut query: Vec<(&str, String)> = vec![("select", "*".to_string())];
        query.extend(filters.iter().cloned());
        if let Some(order) = order {
            query.push(("order", order.to_string()));
        }

        let resp = self
            .http
            .get(self.table_url(table))
            .headers(self.auth_headers()?)
            .query(&query)
            .send()
            .await?;
        read_json(resp).await
    }

    /// First row matching the filters, if any
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter],
    ) -> DomainResult<Option<T>> {
        let mut rows: Vec<T> = self.select(table, filters, None).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    /// `POST` one row and return the stored representation
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> DomainResult<T> {
        let resp = self
            .http
            .post(self.table_url(table))
            .headers(self.write_headers("return=representation")?)
            .json(body)
            .send()
            .await?;
        first_row(read_json(resp).await?, table)
    }

    /// `PATCH` matching rows; returns how many were changed
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        table: &str,
        filters: &[Filter],
        body: &B,
    ) -> DomainResult<usize> {
        let resp = self
            .http
            .patch(self.table_url(table))
            .headers(self.write_headers("return=representation")?)
            .query(filters)
            .json(body)
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = read_json(resp).await?;
        Ok(rows.len())
    }

    /// `POST` with merge on the given conflict columns
    pub async fn upsert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        on_conflict: &str,
        body: &B,
    ) -> DomainResult<T> {
        let resp = self
            .http
            .post(self.table_url(table))
            .headers(self.write_headers("return=representation,resolution=merge-duplicates")?)
            .query(&[("on_conflict", on_conflict)])
            .json(body)
            .send()
            .await?;
        first_row(read_json(resp).await?, table)
    }

    /// `DELETE` matching rows
    pub async fn delete(&self, table: &str, filters: &[Filter]) -> DomainResult<()> {
        if filters.is_empty() {
            return Err(DomainError::Backend(format!("refusing unfiltered delete on {}", table)));
        }
        let resp = self
            .http
            .delete(self.table_url(table))
            .headers(self.auth_headers()?)
            .query(filters)
            .send()
            .await?;
        check_status(resp).await.map(|_| ())
    }
}

fn first_row<T>(mut rows: Vec<T>, table: &str) -> DomainResult<T> {
    if rows.is_empty() {
        Err(DomainError::Backend(format!("{}: no row returned", table)))
    } else {
        Ok(rows.remove(0))
    }
}

/// Turn a non-2xx response into a Backend error carrying the server message
pub(crate) async fn check_status(resp: Response) -> DomainResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(DomainError::Backend(error_message(status, &body)))
}

pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("request failed with status {}", status))
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> DomainResult<T> {
    let resp = check_status(resp).await?;
    Ok(resp.json::<T>().await?)
}
