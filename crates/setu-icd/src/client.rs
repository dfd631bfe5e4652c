use moka::future::Cache;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::IcdConfig;
use crate::error::IcdError;

/// Tokens are refreshed this long before their reported expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Request timeout for all outbound ICD calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

/// One linearization search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// MMS code, e.g. `MG26`.
    pub code: String,
    /// Entity title. May carry the API's match markup.
    pub title: String,
    /// Entity URI, when present.
    pub entity_id: Option<String>,
}

/// Client for the WHO ICD-11 API.
///
/// Holds one OAuth2 access token at a time and refreshes it shortly before
/// expiry. Entity and search responses are cached with a TTL.
pub struct IcdClient {
    http: reqwest::Client,
    config: IcdConfig,
    token: RwLock<Option<CachedToken>>,
    entities: Cache<String, Option<Arc<Value>>>,
    searches: Cache<String, Arc<Vec<SearchHit>>>,
}

impl std::fmt::Debug for IcdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcdClient")
            .field("enabled", &self.config.enabled)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl IcdClient {
    /// Creates a client from configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in practice).
    #[must_use]
    pub fn new(config: IcdConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        let ttl = Duration::from_secs(config.cache_ttl_secs);
        let entities = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(ttl)
            .build();
        let searches = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            http,
            config,
            token: RwLock::new(None),
            entities,
            searches,
        }
    }

    /// Whether outbound calls are configured at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Returns a valid access token, fetching a new one when needed.
    pub async fn access_token(&self) -> Result<String, IcdError> {
        if !self.config.enabled {
            return Err(IcdError::Disabled);
        }

        {
            let guard = self.token.read().await;
            if let Some(cached) = guard.as_ref()
                && cached.is_fresh()
            {
                return Ok(cached.token.clone());
            }
        }

        let mut guard = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = guard.as_ref()
            && cached.is_fresh()
        {
            return Ok(cached.token.clone());
        }

        tracing::debug!("Requesting new ICD access token");
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", "icdapi_access"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IcdError::TokenEndpoint {
                status: response.status().as_u16(),
            });
        }

        let token: TokenResponse = response.json().await?;
        let cached = CachedToken {
            token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        };
        *guard = Some(cached);
        Ok(token.access_token)
    }

    /// Resolves an ICD entity by its id or MMS code.
    ///
    /// Returns `Ok(None)` when the API does not know the entity; the miss is
    /// cached like a hit.
    pub async fn resolve_entity(&self, entity_id: &str) -> Result<Option<Value>, IcdError> {
        if !self.config.enabled {
            return Err(IcdError::Disabled);
        }

        if let Some(cached) = self.entities.get(entity_id).await {
            return Ok(cached.map(|v| (*v).clone()));
        }

        let url = format!("{}/entity/{entity_id}", self.config.base_url);
        let token = self.access_token().await?;
        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .header("API-Version", &self.config.api_version)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en")
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            self.entities.insert(entity_id.to_string(), None).await;
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(IcdError::Api {
                status: response.status().as_u16(),
                url,
            });
        }

        let entity: Value = response.json().await?;
        self.entities
            .insert(entity_id.to_string(), Some(Arc::new(entity.clone())))
            .await;
        tracing::debug!(entity_id, "Resolved ICD entity");
        Ok(Some(entity))
    }

    /// Searches the MMS linearization with flexisearch.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, IcdError> {
        if !self.config.enabled {
            return Err(IcdError::Disabled);
        }

        if let Some(cached) = self.searches.get(query).await {
            return Ok((*cached).clone());
        }

        let url = format!(
            "{}/release/11/{}/{}/search",
            self.config.base_url, self.config.release, self.config.linearization
        );
        let token = self.access_token().await?;
        let response = self
            .http
            .get(&url)
            .query(&[("q", query), ("useFlexisearch", "true")])
            .bearer_auth(&token)
            .header("API-Version", &self.config.api_version)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IcdError::Api {
                status: response.status().as_u16(),
                url,
            });
        }

        let body: Value = response.json().await?;
        let hits = parse_search_response(&body)?;
        tracing::debug!(query, results = hits.len(), "ICD search completed");
        self.searches
            .insert(query.to_string(), Arc::new(hits.clone()))
            .await;
        Ok(hits)
    }
}

fn parse_search_response(body: &Value) -> Result<Vec<SearchHit>, IcdError> {
    let Some(entities) = body.get("destinationEntities") else {
        return Err(IcdError::unexpected("missing destinationEntities"));
    };
    let Some(entities) = entities.as_array() else {
        return Err(IcdError::unexpected("destinationEntities is not an array"));
    };

    let hits = entities
        .iter()
        .filter_map(|entity| {
            let code = entity.get("theCode").and_then(text_of)?;
            let title = entity.get("title").and_then(text_of).unwrap_or_default();
            let entity_id = entity.get("id").and_then(text_of);
            Some(SearchHit {
                code,
                title,
                entity_id,
            })
        })
        .collect();
    Ok(hits)
}

/// Extracts text from a plain string or a `{"@value": ...}` language object.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("@value")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        _ => None,
    }
}

/// Title of a resolved entity, in either response shape.
#[must_use]
pub fn entity_title(entity: &Value) -> Option<String> {
    entity.get("title").and_then(text_of)
}

/// Definition of a resolved entity, when present.
#[must_use]
pub fn entity_definition(entity: &Value) -> Option<String> {
    entity.get("definition").and_then(text_of)
}
