use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{LinkMapping, LinkTable, LinkTableError};

/// Postgres unique_violation, as surfaced by PostgREST.
const UNIQUE_VIOLATION: &str = "23505";

/// Link table served by Supabase's PostgREST endpoint.
pub struct SupabaseLinks {
    table_url: Url,
    api_key: String,
    client: Client,
}

#[derive(Deserialize)]
struct PathRow {
    path: String,
}

#[derive(Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

impl SupabaseLinks {
    pub fn new(
        client: Client,
        base_url: &Url,
        table: &str,
        api_key: &str,
    ) -> Result<Self, LinkTableError> {
        let mut table_url = base_url.clone();
        table_url
            .path_segments_mut()
            .map_err(|_| LinkTableError::InvalidUrl(base_url.to_string()))?
            .pop_if_empty()
            .extend(["rest", "v1", table]);
        Ok(Self {
            table_url,
            api_key: api_key.to_string(),
            client,
        })
    }

    async fn rejection(resp: Response) -> (StatusCode, PostgrestError) {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let error = serde_json::from_str(&body).unwrap_or(PostgrestError {
            code: None,
            message: body,
        });
        (status, error)
    }
}

#[async_trait]
impl LinkTable for SupabaseLinks {
    async fn insert(&self, link: &LinkMapping) -> Result<(), LinkTableError> {
        let resp = self
            .client
            .post(self.table_url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(link)
            .send()
            .await
            .map_err(|e| LinkTableError::Transport(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(());
        }

        let (status, error) = Self::rejection(resp).await;
        if status == StatusCode::CONFLICT || error.code.as_deref() == Some(UNIQUE_VIOLATION) {
            return Err(LinkTableError::Conflict(link.id.clone()));
        }
        Err(LinkTableError::Rejected {
            status: status.as_u16(),
            message: error.message,
        })
    }

    async fn select_one(&self, id: &str) -> Result<Option<LinkMapping>, LinkTableError> {
        let filter = format!("eq.{id}");
        let resp = self
            .client
            .get(self.table_url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("select", "path"), ("id", filter.as_str())])
            .send()
            .await
            .map_err(|e| LinkTableError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let (status, error) = Self::rejection(resp).await;
            return Err(LinkTableError::Rejected {
                status: status.as_u16(),
                message: error.message,
            });
        }

        let mut rows: Vec<PathRow> = resp
            .json()
            .await
            .map_err(|e| LinkTableError::Transport(e.to_string()))?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop().map(|row| LinkMapping {
                id: id.to_string(),
                path: row.path,
            })),
            n => Err(LinkTableError::Rejected {
                status: StatusCode::NOT_ACCEPTABLE.as_u16(),
                message: format!("expected at most one row for id '{id}', got {n}"),
            }),
        }
    }
}
