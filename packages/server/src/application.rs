use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use identity::auth::SessionCodec;
use identity::providers::{OAuthClient, OAuthConfig, ProviderClient, ProviderRegistry};
use identity::store::{IdentityStore, PgIdentityStore};
use identity::{db, AuthError, Provider};

use crate::routes::{router, AppState, Redirects};
use crate::settings::Settings;

/// Build one OAuth client per third-party provider. Every provider must be
/// configured; a missing client id or secret stops startup.
fn provider_registry(
    settings: &Settings,
    store: Arc<dyn IdentityStore>,
) -> Result<ProviderRegistry, AuthError> {
    let mut registry = ProviderRegistry::new();
    for (provider, app) in [
        (Provider::Discord, &settings.discord),
        (Provider::Github, &settings.github),
        (Provider::Google, &settings.google),
    ] {
        let config = OAuthConfig::new(provider, &app.id, &app.secret, &settings.auth.public)?;
        let client: Arc<dyn OAuthClient> = Arc::new(ProviderClient::new(config)?);
        registry.register(client, store.clone())?;
    }
    Ok(registry)
}

/// Connect, migrate and serve until the listener fails.
pub async fn launch(settings: Settings) -> anyhow::Result<()> {
    let key = Key::try_from(settings.session.key()?.as_slice())?;

    let pool = db::connect(&settings.database.url(), settings.database.connections).await?;
    db::migrate(&pool).await?;

    let session_store = PostgresStore::new(pool.clone());
    session_store.migrate().await?;

    let store: Arc<dyn IdentityStore> = Arc::new(PgIdentityStore::new(pool));
    let providers = provider_registry(&settings, store.clone())?;
    tracing::info!(
        providers = ?providers.providers().collect::<Vec<_>>(),
        "OAuth providers configured"
    );
    let codec = SessionCodec::new(store.clone()).with_ttl(settings.session.ttl()?);
    let idle_expiry = Expiry::OnInactivity(codec.ttl().try_into()?);

    let state = AppState::new(
        store,
        codec,
        providers,
        Redirects {
            success: settings.auth.success.clone(),
            failure: settings.auth.failure.clone(),
        },
    );

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(settings.session.secure)
        .with_same_site(SameSite::Lax)
        .with_signed(key)
        .with_expiry(idle_expiry);

    let app = router(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = settings.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
