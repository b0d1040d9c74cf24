use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

use domain::services::{NotificationEngine, NotificationStore, ProviderRegistry};
use persistence::PgNotificationStore;
use shared::jwt::JwtConfig;

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id, HstsPolicy,
};
use crate::routes::{
    advisor, billing, email_notifications, health, notification_engine, notifications,
    preferences, sync_account,
};
use crate::services::{AccountSyncService, EmailService, StripeClient};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub engine: Arc<NotificationEngine>,
    pub email: EmailService,
    /// `None` when no Stripe secret key is configured.
    pub stripe: Option<StripeClient>,
    pub account_sync: AccountSyncService,
    /// `None` when no JWT secret is configured; bearer routes answer 503.
    pub jwt: Option<Arc<JwtConfig>>,
}

impl AppState {
    /// State backed by PostgreSQL for both the engine and the routes.
    pub fn new(config: Config, pool: PgPool) -> Self {
        let store: Arc<dyn NotificationStore> = Arc::new(PgNotificationStore::new(pool.clone()));
        Self::with_store(config, pool, store)
    }

    /// State whose notification engine reads and writes through `store`.
    pub fn with_store(config: Config, pool: PgPool, store: Arc<dyn NotificationStore>) -> Self {
        let email = EmailService::new(config.email.clone());
        let engine = Arc::new(NotificationEngine::new(store, Arc::new(email.clone())));

        let jwt = if config.jwt.is_configured() {
            match JwtConfig::with_leeway(
                &config.jwt.secret,
                Some(config.jwt.audience.clone()),
                config.jwt.leeway_secs,
            ) {
                Ok(jwt) => Some(Arc::new(jwt)),
                Err(e) => {
                    warn!(error = %e, "Invalid JWT configuration, bearer endpoints disabled");
                    None
                }
            }
        } else {
            warn!("JWT secret not configured, bearer endpoints disabled");
            None
        };

        Self {
            stripe: StripeClient::from_config(&config.stripe),
            account_sync: AccountSyncService::new(pool.clone(), ProviderRegistry::default()),
            pool,
            config: Arc::new(config),
            engine,
            email,
            jwt,
        }
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    router(AppState::new(config, pool))
}

/// Builds the full router around an existing state.
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    // Empty origin list allows any origin (development)
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Function-style endpoints called by the web client and schedulers
    let function_routes = Router::new()
        .route(
            "/notification-engine",
            post(notification_engine::run_notification_engine),
        )
        .route(
            "/send-email-notification",
            post(email_notifications::send_email_notification),
        )
        .route(
            "/create-checkout-session",
            post(billing::create_checkout_session),
        )
        .route("/create-portal-session", post(billing::create_portal_session))
        .route("/stripe-webhook", post(billing::stripe_webhook))
        .route("/sync-account", post(sync_account::sync_account))
        .route("/ai-financial-advisor", post(advisor::financial_advice));

    // Bearer-authenticated notification API
    let api_routes = Router::new()
        .route(
            "/api/v1/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/v1/notifications/summary",
            get(notifications::notification_summary),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(notifications::mark_read),
        )
        .route(
            "/api/v1/notifications/:notification_id/dismiss",
            post(notifications::dismiss),
        )
        .route(
            "/api/v1/notification-preferences",
            get(preferences::get_preferences).patch(preferences::update_preferences),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(function_routes)
        .merge(api_routes)
        .merge(public_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            HstsPolicy(config.security.hsts_enabled),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
