use crate::config::{ApiConfig, CognitoConfig, VaultConfig};

/// Settings shared by every action.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub cognito: CognitoConfig,
    /// Declared for a real tokenization backend; the simulated one ignores it.
    pub vault: Option<VaultConfig>,
    pub api: Option<ApiConfig>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(cognito: CognitoConfig) -> Self {
        Self {
            cognito,
            vault: None,
            api: None,
        }
    }

    #[must_use]
    pub fn with_vault(mut self, vault: Option<VaultConfig>) -> Self {
        self.vault = vault;
        self
    }

    #[must_use]
    pub fn with_api(mut self, api: Option<ApiConfig>) -> Self {
        self.api = api;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResponseType;

    #[test]
    fn test_global_args() {
        let cognito = CognitoConfig {
            user_pool_id: "us-east-1_Pool".to_string(),
            user_pool_client_id: "client".to_string(),
            domain: "auth.example.com".to_string(),
            redirect_uri: "https://app.example.com/cb".to_string(),
            response_type: ResponseType::Code,
            scope: "openid".to_string(),
            endpoint: None,
        };

        let args = GlobalArgs::new(cognito.clone());
        assert_eq!(args.cognito, cognito);
        assert!(args.vault.is_none());

        let args = args.with_api(Some(ApiConfig {
            base_url: "https://api.example.com".to_string(),
        }));
        assert_eq!(
            args.api.map(|api| api.base_url),
            Some("https://api.example.com".to_string())
        );
    }
}
