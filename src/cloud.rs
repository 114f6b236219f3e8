//! Fermyon Cloud REST client

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("Cloud request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("expected code {expected}, got {actual}")]
    UnexpectedStatus { expected: u16, actual: u16 },

    #[error("no app found with name {0}")]
    AppNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppDomain {
    pub name: String,
}

/// A deployed app as listed by the cloud API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub domain: Option<AppDomain>,
}

impl App {
    /// Public URL, preferring a custom domain over the generated subdomain
    pub fn url(&self) -> String {
        match (&self.domain, &self.subdomain) {
            (Some(domain), _) if !domain.name.is_empty() => format!("https://{}", domain.name),
            (_, Some(subdomain)) => format!("https://{}", subdomain),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetAppsResponse {
    items: Vec<App>,
}

/// Authenticated client, constructed once per invocation and passed explicitly
pub struct CloudClient {
    base: String,
    token: String,
    http: Client,
}

impl CloudClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, CloudError> {
        let http = Client::builder()
            .user_agent(concat!("spin-actions/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn get_all_apps(&self) -> Result<Vec<App>, CloudError> {
        let url = format!("{}/api/apps", self.base);
        debug!(%url, "Listing apps");

        let response = self.http.get(&url).bearer_auth(&self.token).send()?;
        expect_status(response.status(), StatusCode::OK)?;

        let body: GetAppsResponse = response.json()?;
        Ok(body.items)
    }

    pub fn get_app_by_name(&self, name: &str) -> Result<App, CloudError> {
        self.get_all_apps()?
            .into_iter()
            .find(|app| app.name == name)
            .ok_or_else(|| CloudError::AppNotFound(name.to_string()))
    }

    pub fn get_app_id_by_name(&self, name: &str) -> Result<String, CloudError> {
        self.get_app_by_name(name).map(|app| app.id)
    }

    pub fn delete_app_by_id(&self, id: &str) -> Result<(), CloudError> {
        let url = format!("{}/api/apps/{}", self.base, id);
        debug!(%url, "Deleting app");

        let response = self.http.delete(&url).bearer_auth(&self.token).send()?;
        expect_status(response.status(), StatusCode::NO_CONTENT)
    }

    pub fn delete_app_by_name(&self, name: &str) -> Result<(), CloudError> {
        let id = self.get_app_id_by_name(name)?;
        self.delete_app_by_id(&id)
    }
}

fn expect_status(actual: StatusCode, expected: StatusCode) -> Result<(), CloudError> {
    if actual == expected {
        Ok(())
    } else {
        Err(CloudError::UnexpectedStatus {
            expected: expected.as_u16(),
            actual: actual.as_u16(),
        })
    }
}
