use serde::Deserialize;

/// Configuration for the WHO ICD-11 API client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IcdConfig {
    /// Whether outbound ICD calls are made at all.
    pub enabled: bool,
    /// Base URL of the ICD API.
    pub base_url: String,
    /// OAuth2 token endpoint.
    pub token_url: String,
    /// OAuth2 client credentials issued by WHO.
    pub client_id: String,
    pub client_secret: String,
    /// Value of the `API-Version` header.
    pub api_version: String,
    /// MMS release used for linearization search.
    pub release: String,
    /// Linearization name, `mms` for Mortality and Morbidity Statistics.
    pub linearization: String,
    /// TTL for cached entities and search results, in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum cached entries per cache.
    pub cache_capacity: u64,
}

impl Default for IcdConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://id.who.int/icd".to_string(),
            token_url: "https://icdaccessmanagement.who.int/connect/token".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            api_version: "v2".to_string(),
            release: "2023-01".to_string(),
            linearization: "mms".to_string(),
            cache_ttl_secs: 3600,
            cache_capacity: 500,
        }
    }
}

impl IcdConfig {
    /// Checks that an enabled client has credentials to work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && (self.client_id.is_empty() || self.client_secret.is_empty()) {
            return Err(
                "icd.client_id and icd.client_secret are required when icd.enabled is true"
                    .to_string(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IcdConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.api_version, "v2");
        assert_eq!(config.linearization, "mms");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enabled_requires_credentials() {
        let config = IcdConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = IcdConfig {
            enabled: true,
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: IcdConfig =
            serde_json::from_str(r#"{"enabled": true, "client_id": "abc"}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.release, "2023-01");
    }
}
