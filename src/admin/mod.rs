//! The back-office HTTP screen.

pub mod handlers;
pub mod render;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};

use crate::config::Settings;
use crate::db::Database;
use crate::error::AppError;
use crate::listing::clamp_per_page;
use crate::operator::{self, Operator};
use crate::token::TokenKeeper;

pub const SESSION_COOKIE: &str = "admin_session";

/// Shared by every request. Holds no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub tokens: Arc<TokenKeeper>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: Arc<Database>, settings: Settings) -> anyhow::Result<Self> {
        let tokens = TokenKeeper::from_settings(
            &db,
            settings.token_secret.as_deref(),
            settings.token_lifetime_secs,
        )?;
        Ok(Self {
            db,
            tokens: Arc::new(tokens),
            settings: Arc::new(settings),
        })
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Operator, AppError> {
        let key = presented_key(headers);
        operator::authenticate(&self.settings.operators, key.as_deref())
    }

    /// The operator's page-size preference, falling back to the configured default.
    pub fn per_page_for(&self, operator: &Operator) -> anyhow::Result<u32> {
        let stored = self.db.get_option(&per_page_option(operator))?;
        Ok(stored
            .and_then(|v| v.parse::<u32>().ok())
            .map(clamp_per_page)
            .unwrap_or(self.settings.default_per_page))
    }
}

pub fn per_page_option(operator: &Operator) -> String {
    format!("submissions_per_page:{}", operator.session())
}

/// Key from the session cookie, or from an `Authorization: Bearer` header.
fn presented_key(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|v| v.trim().to_string())
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/submissions",
            get(handlers::list_page).post(handlers::submit_action),
        )
        .route("/submissions/screen-options", post(handlers::screen_options))
        .route("/submissions/:id", get(handlers::detail_page))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/health", get(handlers::health))
        .with_state(state)
}

pub async fn serve(state: AppState, bind: SocketAddr) -> anyhow::Result<()> {
    if state.settings.operators.is_empty() {
        tracing::warn!("No operators configured; every request will be refused");
    }

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}

/// Error returned from handlers. Known failures map to their status codes;
/// anything else is logged and shown as a generic 500 page.
#[derive(Debug)]
pub struct AdminError(anyhow::Error);

impl<E> From<E> for AdminError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        if let Some(err) = self.0.downcast_ref::<AppError>()
            && err.is_fatal_rejection()
        {
            tracing::warn!("Request rejected: {err}");
        }

        let (status, title, message) = match self.0.downcast_ref::<AppError>() {
            Some(AppError::Unauthenticated) => {
                let page = render::login_page(Some("Please sign in to continue."));
                return (StatusCode::UNAUTHORIZED, Html(page)).into_response();
            }
            Some(err @ AppError::SecurityCheckFailed) => (
                StatusCode::FORBIDDEN,
                "Security check failed",
                format!("{err}. The link you followed has expired; go back and try again."),
            ),
            Some(err @ AppError::Forbidden(_)) => {
                (StatusCode::FORBIDDEN, "Not allowed", format!("{err}."))
            }
            Some(err @ AppError::SubmissionNotFound(_)) => {
                (StatusCode::NOT_FOUND, "Not found", err.to_string())
            }
            Some(err @ AppError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "Invalid request", err.to_string())
            }
            _ => {
                tracing::error!("Request failed: {:#}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "The request could not be completed.".to_string(),
                )
            }
        };

        (status, Html(render::error_page(title, &message))).into_response()
    }
}
