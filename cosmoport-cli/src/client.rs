//! HTTP client for the Cosmoport `/rest/ships` API.

use crate::CliResult;
use cosmoport_core::{PageRequest, Ship, ShipFilter, ShipInput};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Error payload returned by the server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Reqwest-backed ship registry client.
pub struct ShipClient {
    http: Client,
    base_url: String,
}

impl ShipClient {
    /// Build a client for the server at `server_url`.
    pub fn new(server_url: &str) -> CliResult<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            base_url: normalize_server_url(server_url)?,
        })
    }

    fn ships_url(&self) -> String {
        format!("{}/rest/ships", self.base_url)
    }

    fn ship_url(&self, id: i64) -> String {
        format!("{}/rest/ships/{id}", self.base_url)
    }

    /// Fetch one page of ships matching `filter`.
    pub async fn list(&self, filter: &ShipFilter, paging: &PageRequest) -> CliResult<Vec<Ship>> {
        let response = self
            .http
            .get(self.ships_url())
            .query(filter)
            .query(paging)
            .send()
            .await?;
        decode(response).await
    }

    /// Count ships matching `filter`.
    pub async fn count(&self, filter: &ShipFilter) -> CliResult<u64> {
        let response = self
            .http
            .get(format!("{}/count", self.ships_url()))
            .query(filter)
            .send()
            .await?;
        decode(response).await
    }

    /// Fetch a ship by id.
    pub async fn get(&self, id: i64) -> CliResult<Ship> {
        let response = self.http.get(self.ship_url(id)).send().await?;
        decode(response).await
    }

    /// Register a new ship.
    pub async fn create(&self, input: &ShipInput) -> CliResult<Ship> {
        let response = self.http.post(self.ships_url()).json(input).send().await?;
        decode(response).await
    }

    /// Apply a partial update to a ship.
    pub async fn update(&self, id: i64, patch: &ShipInput) -> CliResult<Ship> {
        let response = self.http.post(self.ship_url(id)).json(patch).send().await?;
        decode(response).await
    }

    /// Delete a ship.
    pub async fn delete(&self, id: i64) -> CliResult<()> {
        let response = self.http.delete(self.ship_url(id)).send().await?;
        check(response).await?;
        Ok(())
    }
}

/// Normalize the server URL for consistent API requests.
fn normalize_server_url(server_url: &str) -> CliResult<String> {
    let trimmed = server_url.trim();
    if trimmed.is_empty() {
        return Err("server url is required".into());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Turn non-success responses into errors carrying the server's message.
async fn check(response: Response) -> CliResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|error| error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    Err(format!("server returned {status}: {message}").into())
}

async fn decode<T: DeserializeOwned>(response: Response) -> CliResult<T> {
    let response = check(response).await?;
    Ok(response.json::<T>().await?)
}
