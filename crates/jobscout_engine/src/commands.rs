use std::time::Duration;

use jobscout_logging::{scout_debug, scout_info};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::endpoint::endpoint;
use crate::payload::BulkPayload;
use crate::{BulkResponse, CommandError};

const SCRAPE_PATH: &str = "scrape";
const DISCONNECT_PATH: &str = "disconnect";

#[derive(Debug, Clone)]
pub struct CommandSettings {
    /// Base of the streaming endpoints (`/scrape/{id}`, `/disconnect/{id}`).
    pub base_url: String,
    /// Base of the single-response endpoint (`/scrape`).
    pub bulk_base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// The bulk call returns only after every source was scraped.
    pub bulk_timeout: Duration,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/jobs".to_string(),
            bulk_base_url: "http://localhost:8080/api/sequential/jobs".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            bulk_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    keywords: &'a str,
}

/// One-shot request/response calls to the scraping service.
#[async_trait::async_trait]
pub trait CommandClient: Send + Sync {
    /// Asks the service to start a job whose events go to `session_id`'s channel.
    async fn submit(&self, session_id: &str, keywords: &str) -> Result<(), CommandError>;
    /// Releases the server side of a session.
    async fn release(&self, session_id: &str) -> Result<(), CommandError>;
    /// Runs a whole job and returns every result in one response.
    async fn scrape_bulk(&self, keywords: &str) -> Result<BulkResponse, CommandError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestCommandClient {
    settings: CommandSettings,
    client: reqwest::Client,
}

impl ReqwestCommandClient {
    pub fn new(settings: CommandSettings) -> Result<Self, CommandError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| CommandError::Network(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn json_body(keywords: &str) -> Result<String, CommandError> {
        serde_json::to_string(&ScrapeRequest { keywords })
            .map_err(|err| CommandError::InvalidResponse(err.to_string()))
    }
}

#[async_trait::async_trait]
impl CommandClient for ReqwestCommandClient {
    async fn submit(&self, session_id: &str, keywords: &str) -> Result<(), CommandError> {
        let url = endpoint(&self.settings.base_url, &[SCRAPE_PATH, session_id])
            .map_err(CommandError::InvalidUrl)?;
        scout_info!("POST {}", url);
        let response = self
            .client
            .post(url)
            .timeout(self.settings.request_timeout)
            .header(CONTENT_TYPE, "application/json")
            .body(Self::json_body(keywords)?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response.status())
    }

    async fn release(&self, session_id: &str) -> Result<(), CommandError> {
        let url = endpoint(&self.settings.base_url, &[DISCONNECT_PATH, session_id])
            .map_err(CommandError::InvalidUrl)?;
        scout_debug!("DELETE {}", url);
        let response = self
            .client
            .delete(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response.status())
    }

    async fn scrape_bulk(&self, keywords: &str) -> Result<BulkResponse, CommandError> {
        let url = endpoint(&self.settings.bulk_base_url, &[SCRAPE_PATH])
            .map_err(CommandError::InvalidUrl)?;
        scout_info!("POST {}", url);
        let response = self
            .client
            .post(url)
            .timeout(self.settings.bulk_timeout)
            .header(CONTENT_TYPE, "application/json")
            .body(Self::json_body(keywords)?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response.status())?;

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let payload: BulkPayload = serde_json::from_slice(&body)
            .map_err(|err| CommandError::InvalidResponse(err.to_string()))?;
        payload
            .into_response()
            .map_err(CommandError::InvalidResponse)
    }
}

fn ensure_success(status: reqwest::StatusCode) -> Result<(), CommandError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(CommandError::HttpStatus(status.as_u16()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> CommandError {
    if err.is_timeout() {
        return CommandError::Timeout;
    }
    CommandError::Network(err.to_string())
}
