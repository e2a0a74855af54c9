//! Environment-sourced configuration for the identity provider. Every value is
//! required and has no default: a missing or empty variable is reported as
//! [`ConfigError::Missing`] naming the variable, before any client is built.
//! The VGS and API settings are loaded the same way but nothing in the login
//! flow consumes them.

use std::{env, fmt, str::FromStr};
use thiserror::Error;
use url::Url;

pub const USER_POOL_ID: &str = "OTPGATE_COGNITO_USER_POOL_ID";
pub const USER_POOL_CLIENT_ID: &str = "OTPGATE_COGNITO_USER_POOL_CLIENT_ID";
pub const DOMAIN: &str = "OTPGATE_COGNITO_DOMAIN";
pub const REDIRECT_URI: &str = "OTPGATE_COGNITO_REDIRECT_URI";
pub const RESPONSE_TYPE: &str = "OTPGATE_COGNITO_RESPONSE_TYPE";
pub const SCOPE: &str = "OTPGATE_COGNITO_SCOPE";
pub const ENDPOINT: &str = "OTPGATE_COGNITO_ENDPOINT";
pub const VGS_VAULT_ID: &str = "OTPGATE_VGS_VAULT_ID";
pub const VGS_ENVIRONMENT: &str = "OTPGATE_VGS_ENVIRONMENT";
pub const API_BASE_URL: &str = "OTPGATE_API_BASE_URL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration {variable}: {reason}")]
    Invalid {
        variable: &'static str,
        reason: String,
    },
}

/// OAuth response type requested from the hosted UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Code,
    Token,
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "code" => Ok(Self::Code),
            "token" => Ok(Self::Token),
            other => Err(format!("unsupported response type '{other}'")),
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code => f.write_str("code"),
            Self::Token => f.write_str("token"),
        }
    }
}

/// Cognito user pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognitoConfig {
    pub user_pool_id: String,
    pub user_pool_client_id: String,
    /// Hosted UI domain, with or without a scheme.
    pub domain: String,
    pub redirect_uri: String,
    pub response_type: ResponseType,
    /// Space-delimited OAuth scopes.
    pub scope: String,
    /// Overrides the regional `cognito-idp` endpoint (local emulators, tests).
    pub endpoint: Option<String>,
}

impl CognitoConfig {
    /// Loads the configuration from the process environment.
    /// # Errors
    /// Returns [`ConfigError::Missing`] for the first absent or empty variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, keyed by environment variable name.
    /// # Errors
    /// Returns [`ConfigError::Missing`] for the first absent or empty value and
    /// [`ConfigError::Invalid`] for an unsupported response type or pool id.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let response_type = required(&lookup, RESPONSE_TYPE)?
            .parse::<ResponseType>()
            .map_err(|reason| ConfigError::Invalid {
                variable: RESPONSE_TYPE,
                reason,
            })?;

        let config = Self {
            user_pool_id: required(&lookup, USER_POOL_ID)?,
            user_pool_client_id: required(&lookup, USER_POOL_CLIENT_ID)?,
            domain: required(&lookup, DOMAIN)?,
            redirect_uri: required(&lookup, REDIRECT_URI)?,
            response_type,
            scope: required(&lookup, SCOPE)?,
            endpoint: optional(&lookup, ENDPOINT),
        };

        // fail here rather than on the first request
        config.region()?;

        Ok(config)
    }

    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scope.split_whitespace().collect()
    }

    /// AWS region encoded in the pool id (`us-east-1_AbC` -> `us-east-1`).
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the pool id has no region prefix.
    pub fn region(&self) -> Result<&str, ConfigError> {
        match self.user_pool_id.split_once('_') {
            Some((region, id)) if !region.is_empty() && !id.is_empty() => Ok(region),
            _ => Err(ConfigError::Invalid {
                variable: USER_POOL_ID,
                reason: format!("'{}' is not of the form <region>_<id>", self.user_pool_id),
            }),
        }
    }

    /// Identity provider API endpoint.
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the region cannot be derived.
    pub fn endpoint(&self) -> Result<String, ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }

        Ok(format!("https://cognito-idp.{}.amazonaws.com/", self.region()?))
    }

    /// Hosted UI authorize URL built from the OAuth settings.
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the domain is not a valid host.
    pub fn authorize_url(&self, state: Option<&str>) -> Result<Url, ConfigError> {
        let base = if self.domain.starts_with("http://") || self.domain.starts_with("https://") {
            self.domain.clone()
        } else {
            format!("https://{}", self.domain.trim_end_matches('/'))
        };

        let mut url = Url::parse(&base).map_err(|e| ConfigError::Invalid {
            variable: DOMAIN,
            reason: e.to_string(),
        })?;

        url.set_path("/oauth2/authorize");

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", &self.response_type.to_string())
                .append_pair("client_id", &self.user_pool_client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("scope", &self.scopes().join(" "));

            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }

        Ok(url)
    }
}

/// VGS vault settings, declared for a real tokenization backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub vault_id: String,
    pub environment: String,
}

impl VaultConfig {
    /// # Errors
    /// Returns [`ConfigError::Missing`] for the first absent or empty variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// # Errors
    /// Returns [`ConfigError::Missing`] for the first absent or empty value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            vault_id: required(&lookup, VGS_VAULT_ID)?,
            environment: required(&lookup, VGS_ENVIRONMENT)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    /// # Errors
    /// Returns [`ConfigError::Missing`] if the variable is absent or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// # Errors
    /// Returns [`ConfigError::Missing`] if the value is absent or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            base_url: required(&lookup, API_BASE_URL)?,
        })
    }
}

fn optional<F>(lookup: &F, key: &'static str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or(ConfigError::Missing(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cognito_vars() -> Vec<(&'static str, Option<&'static str>)> {
        vec![
            (USER_POOL_ID, Some("us-east-1_AbCdEf123")),
            (USER_POOL_CLIENT_ID, Some("client-123")),
            (DOMAIN, Some("otpgate.auth.us-east-1.amazoncognito.com")),
            (REDIRECT_URI, Some("http://localhost:5173/")),
            (RESPONSE_TYPE, Some("code")),
            (SCOPE, Some("openid email profile")),
            (ENDPOINT, None),
        ]
    }

    #[test]
    fn test_cognito_from_env() {
        temp_env::with_vars(cognito_vars(), || {
            let config = CognitoConfig::from_env().unwrap();
            assert_eq!(config.user_pool_id, "us-east-1_AbCdEf123");
            assert_eq!(config.user_pool_client_id, "client-123");
            assert_eq!(config.response_type, ResponseType::Code);
            assert_eq!(config.scopes(), vec!["openid", "email", "profile"]);
            assert_eq!(config.region().unwrap(), "us-east-1");
            assert_eq!(
                config.endpoint().unwrap(),
                "https://cognito-idp.us-east-1.amazonaws.com/"
            );
        });
    }

    #[test]
    fn test_each_missing_variable_is_named() {
        let required = [
            USER_POOL_ID,
            USER_POOL_CLIENT_ID,
            DOMAIN,
            REDIRECT_URI,
            RESPONSE_TYPE,
            SCOPE,
        ];

        for missing in required {
            let mut vars = cognito_vars();
            for (key, value) in &mut vars {
                if *key == missing {
                    *value = None;
                }
            }

            temp_env::with_vars(vars, || {
                assert_eq!(
                    CognitoConfig::from_env(),
                    Err(ConfigError::Missing(missing))
                );
            });
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars = cognito_vars();
        vars[1] = (USER_POOL_CLIENT_ID, Some("  "));

        temp_env::with_vars(vars, || {
            let err = CognitoConfig::from_env().unwrap_err();
            assert_eq!(err, ConfigError::Missing(USER_POOL_CLIENT_ID));
            assert_eq!(
                err.to_string(),
                "Missing required configuration: OTPGATE_COGNITO_USER_POOL_CLIENT_ID"
            );
        });
    }

    #[test]
    fn test_invalid_response_type() {
        let mut vars = cognito_vars();
        vars[4] = (RESPONSE_TYPE, Some("id_token"));

        temp_env::with_vars(vars, || {
            assert!(matches!(
                CognitoConfig::from_env(),
                Err(ConfigError::Invalid {
                    variable: RESPONSE_TYPE,
                    ..
                })
            ));
        });
    }

    #[test]
    fn test_pool_id_without_region() {
        let mut vars = cognito_vars();
        vars[0] = (USER_POOL_ID, Some("AbCdEf123"));

        temp_env::with_vars(vars, || {
            assert!(matches!(
                CognitoConfig::from_env(),
                Err(ConfigError::Invalid {
                    variable: USER_POOL_ID,
                    ..
                })
            ));
        });
    }

    #[test]
    fn test_endpoint_override() {
        let mut vars = cognito_vars();
        vars[6] = (ENDPOINT, Some("http://127.0.0.1:9229/"));

        temp_env::with_vars(vars, || {
            let config = CognitoConfig::from_env().unwrap();
            assert_eq!(config.endpoint().unwrap(), "http://127.0.0.1:9229/");
        });
    }

    #[test]
    fn test_authorize_url() {
        let config = temp_env::with_vars(cognito_vars(), CognitoConfig::from_env).unwrap();
        let url = config.authorize_url(Some("xyz")).unwrap();

        assert_eq!(url.host_str(), Some("otpgate.auth.us-east-1.amazoncognito.com"));
        assert_eq!(url.path(), "/oauth2/authorize");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&("client_id".to_string(), "client-123".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "http://localhost:5173/".to_string()
        )));
        assert!(pairs.contains(&("scope".to_string(), "openid email profile".to_string())));
        assert!(pairs.contains(&("state".to_string(), "xyz".to_string())));
    }

    #[test]
    fn test_vault_and_api_config() {
        temp_env::with_vars(
            [
                (VGS_VAULT_ID, Some("tntabc123")),
                (VGS_ENVIRONMENT, Some("sandbox")),
                (API_BASE_URL, None),
            ],
            || {
                let vault = VaultConfig::from_env().unwrap();
                assert_eq!(vault.vault_id, "tntabc123");
                assert_eq!(vault.environment, "sandbox");
                assert_eq!(
                    ApiConfig::from_env(),
                    Err(ConfigError::Missing(API_BASE_URL))
                );
            },
        );
    }
}
