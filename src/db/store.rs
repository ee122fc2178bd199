

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::AppConfig;


#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Store rejected query (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Store does not support {0}")]
    Unsupported(String),
}


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ResultFormat {
    #[default]
    Json,
    Csv,
}

impl ResultFormat {
    pub fn sparql_media_type(self) -> &'static str {
        match self {
            Self::Json => "application/sparql-results+json",
            Self::Csv => "text/csv",
        }
    }
}


#[async_trait]
pub trait QueryStore: Send + Sync {

    async fn sparql(&self, query: &str, format: ResultFormat) -> Result<String, StoreError>;

    async fn statement(&self, statement: &str, format: ResultFormat) -> Result<String, StoreError>;

    fn endpoint(&self) -> &str;
}


#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    format: ResultFormat,
}


pub struct HttpQueryStore {
    client: Client,
    sparql_url: String,
    statement_url: Option<String>,
    credentials: Option<(String, String)>,
}

impl HttpQueryStore {

    pub fn new(
        sparql_url: impl Into<String>,
        statement_url: Option<String>,
        credentials: Option<(String, String)>,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let sparql_url = sparql_url.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        info!(
            "HttpQueryStore created (sparql={}, statement={})",
            sparql_url,
            statement_url.as_deref().unwrap_or("none")
        );

        Ok(Self {
            client,
            sparql_url,
            statement_url,
            credentials,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let credentials = config
            .store_user
            .clone()
            .zip(config.store_password.clone());
        Self::new(
            config.store_sparql_url.clone(),
            config.store_statement_url.clone(),
            credentials,
            config.store_timeout,
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, Some(password)),
            None => request,
        }
    }

    async fn read_body(response: reqwest::Response) -> Result<String, StoreError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl QueryStore for HttpQueryStore {
    async fn sparql(&self, query: &str, format: ResultFormat) -> Result<String, StoreError> {
        debug!("SPARQL request ({} chars, format={})", query.len(), format);

        let request = self
            .client
            .post(&self.sparql_url)
            .header(ACCEPT, format.sparql_media_type())
            .form(&[("query", query)]);

        let response = self.authorize(request).send().await?;
        Self::read_body(response).await
    }

    async fn statement(&self, statement: &str, format: ResultFormat) -> Result<String, StoreError> {
        let url = self
            .statement_url
            .as_deref()
            .ok_or_else(|| StoreError::Unsupported("native statements (no statement endpoint configured)".to_string()))?;

        debug!("Statement request ({} chars, format={})", statement.len(), format);

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(&StatementRequest { statement, format });

        let response = self.authorize(request).send().await?;
        Self::read_body(response).await
    }

    fn endpoint(&self) -> &str {
        &self.sparql_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_creation() {
        let store = HttpQueryStore::new("http://localhost:7200/sparql", None, None, 5);
        assert!(store.is_ok());
        assert_eq!(store.unwrap().endpoint(), "http://localhost:7200/sparql");
    }

    #[test]
    fn test_from_config_pairs_credentials() {
        let config = AppConfig {
            store_user: Some("SYSTEM".to_string()),
            store_password: Some("secret".to_string()),
            ..Default::default()
        };
        let store = HttpQueryStore::from_config(&config).unwrap();
        assert_eq!(
            store.credentials,
            Some(("SYSTEM".to_string(), "secret".to_string()))
        );
    }

    #[tokio::test]
    async fn test_statement_without_endpoint_is_unsupported() {
        let store = HttpQueryStore::new("http://localhost:7200/sparql", None, None, 5).unwrap();
        let err = store.statement("SELECT 1 FROM DUMMY", ResultFormat::Json).await.unwrap_err();
        assert!(matches!(err, StoreError::Unsupported(_)));
    }

    #[test]
    fn test_result_format_parse() {
        assert_eq!("CSV".parse::<ResultFormat>().unwrap(), ResultFormat::Csv);
        assert_eq!(ResultFormat::default(), ResultFormat::Json);
        assert!("xml".parse::<ResultFormat>().is_err());
        assert_eq!(ResultFormat::Csv.sparql_media_type(), "text/csv");
    }
}
