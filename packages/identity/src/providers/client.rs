//! # Authorization Code + PKCE client shared by every provider
//!
//! [`ProviderClient`] wraps an [`OAuthConfig`] and implements [`OAuthClient`]
//! with the `oauth2` crate:
//!
//! - [`authorize`](OAuthClient::authorize) requests the provider's scopes with a
//!   random PKCE S256 challenge and CSRF state, targeting the redirect URI of the
//!   requested [`Flow`].
//! - [`exchange_code`](OAuthClient::exchange_code) trades the code and PKCE
//!   verifier for an access token (same redirect URI), then delegates the profile
//!   fetch to the provider module ([`super::discord`], [`super::github`],
//!   [`super::google`]).
//!
//! All provider-side failures surface as [`AuthError::Provider`].

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthorizationCode, CsrfToken, EndpointNotSet, EndpointSet, PkceCodeChallenge,
    PkceCodeVerifier, Scope, TokenResponse,
};

use super::config::OAuthConfig;
use super::{discord, github, google, AuthorizationRequest, Flow, OAuthClient, OAuthProfile};
use crate::error::AuthError;
use crate::models::Provider;

/// User agent sent to provider APIs.
pub(crate) const USER_AGENT: &str = "Snapgram";

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// OAuth handler for one provider.
pub struct ProviderClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl ProviderClient {
    pub fn new(config: OAuthConfig) -> Result<Self, AuthError> {
        // Token endpoints must not follow redirects.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AuthError::Configuration(format!("http client: {e}")))?;
        Ok(Self { config, http })
    }

    fn create_client(&self, flow: Flow) -> ConfiguredClient {
        BasicClient::new(self.config.client_id.clone())
            .set_client_secret(self.config.client_secret.clone())
            .set_auth_uri(self.config.auth_url.clone())
            .set_token_uri(self.config.token_url.clone())
            .set_redirect_uri(self.config.redirect_url(flow).clone())
    }
}

#[async_trait]
impl OAuthClient for ProviderClient {
    fn provider(&self) -> Provider {
        self.config.provider
    }

    fn authorize(&self, flow: Flow) -> AuthorizationRequest {
        let client = self.create_client(flow);
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.config.scopes.iter().cloned().map(Scope::new))
            .set_pkce_challenge(pkce_challenge)
            .url();

        AuthorizationRequest {
            url: auth_url.to_string(),
            csrf_state: csrf_state.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        }
    }

    async fn exchange_code(
        &self,
        flow: Flow,
        code: &str,
        pkce_verifier: String,
    ) -> Result<OAuthProfile, AuthError> {
        let client = self.create_client(flow);

        let token_result = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&self.http)
            .await
            .map_err(|e| AuthError::Provider(format!("token exchange failed: {e}")))?;

        let access_token = token_result.access_token().secret();

        match self.config.provider {
            Provider::Discord => discord::fetch_profile(&self.http, access_token).await,
            Provider::Github => github::fetch_profile(&self.http, access_token).await,
            Provider::Google => google::fetch_profile(&self.http, access_token).await,
            Provider::Local => Err(AuthError::Configuration(
                "the local provider has no OAuth client".to_string(),
            )),
        }
    }
}

/// Map a reqwest failure to a provider error.
pub(crate) fn provider_error(e: reqwest::Error) -> AuthError {
    AuthError::Provider(e.to_string())
}
