//! OAuth provider configuration.

use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};

use super::Flow;
use crate::error::AuthError;
use crate::models::Provider;

/// OAuth provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub provider: Provider,
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
    pub login_redirect_url: RedirectUrl,
    pub register_redirect_url: RedirectUrl,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Build the config for `provider`, deriving callback URLs from `public_url`.
    pub fn new(
        provider: Provider,
        client_id: &str,
        client_secret: &str,
        public_url: &str,
    ) -> Result<Self, AuthError> {
        let (auth_url, token_url, scopes): (&str, &str, &[&str]) = match provider {
            Provider::Discord => (
                "https://discord.com/oauth2/authorize",
                "https://discord.com/api/oauth2/token",
                &["identify", "email"],
            ),
            Provider::Github => (
                "https://github.com/login/oauth/authorize",
                "https://github.com/login/oauth/access_token",
                &["user:email", "read:user"],
            ),
            Provider::Google => (
                "https://accounts.google.com/o/oauth2/v2/auth",
                "https://oauth2.googleapis.com/token",
                &["openid", "email", "profile"],
            ),
            Provider::Local => {
                return Err(AuthError::Configuration(
                    "the local provider has no OAuth endpoints".to_string(),
                ))
            }
        };

        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(AuthError::Configuration(format!(
                "{provider} client id and secret must be set"
            )));
        }

        let redirect = |flow: Flow| {
            let url = format!(
                "{}/auth/{provider}/{flow}/callback",
                public_url.trim_end_matches('/')
            );
            RedirectUrl::new(url)
                .map_err(|e| AuthError::Configuration(format!("invalid {provider} redirect: {e}")))
        };

        Ok(Self {
            provider,
            client_id: ClientId::new(client_id.to_string()),
            client_secret: ClientSecret::new(client_secret.to_string()),
            auth_url: AuthUrl::new(auth_url.to_string())
                .map_err(|e| AuthError::Configuration(e.to_string()))?,
            token_url: TokenUrl::new(token_url.to_string())
                .map_err(|e| AuthError::Configuration(e.to_string()))?,
            login_redirect_url: redirect(Flow::Login)?,
            register_redirect_url: redirect(Flow::Register)?,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn redirect_url(&self, flow: Flow) -> &RedirectUrl {
        match flow {
            Flow::Login => &self.login_redirect_url,
            Flow::Register => &self.register_redirect_url,
        }
    }
}
