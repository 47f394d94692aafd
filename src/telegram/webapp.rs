use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Deserialize;
use teloxide::types::{Update, UpdateKind};
use teloxide::Bot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use url::Url;

use crate::core::config;
use crate::storage::db::{self, DbPool, NewUser};
use crate::telegram::bot::{booking_greeting, send_booking_invitation};

// ============================================================================
// СОСТОЯНИЕ ПРИЛОЖЕНИЯ
// ============================================================================

/// Shared state для всех endpoints
#[derive(Clone)]
pub struct WebAppState {
    pub db: DbPool,
    pub bot: Bot,
    pub web_app_url: Url,
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Handler-level failures, mapped straight to a status code plus a
/// human-readable plain-text body (mirroring `http.Error` semantics the
/// front-end already expects).
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotImplemented,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotImplemented => {
                (StatusCode::NOT_IMPLEMENTED, "Not yet implemented".to_string()).into_response()
            }
            ApiError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
            }
        }
    }
}

// ============================================================================
// РОУТЕР
// ============================================================================

/// Создает роутер для backend API
///
/// Exact-path routing only; unmatched paths fall through to axum's 404.
/// CORS is permissive and short-circuits preflight before any route logic,
/// so OPTIONS succeeds even on routes that reject their real method.
pub fn create_router(db: DbPool, bot: Bot, web_app_url: Url) -> Router {
    let state = WebAppState { db, bot, web_app_url };

    // CORS для Mini App
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", any(health_check))
        .route("/api/bot", any(bot_webhook))
        .route("/api/send-webapp", any(send_webapp))
        .route("/api/users", any(not_implemented))
        .route("/api/appointments", any(not_implemented))
        .route("/api/services", get(handle_get_services))
        .route("/api/masters", get(handle_get_masters))
        .layer(TimeoutLayer::new(config::network::request_timeout()))
        .layer(cors)
        .with_state(state)
}

/// Запускает веб-сервер backend API
///
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn run_server(port: u16, db: DbPool, bot: Bot, web_app_url: Url) -> anyhow::Result<()> {
    let app = create_router(db, bot, web_app_url);

    let addr = format!("0.0.0.0:{}", port);
    log::info!("🌐 Starting API server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on ctrl-c or SIGTERM so in-flight requests can drain.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => log::warn!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    log::info!("Shutdown signal received");
}

// ============================================================================
// API HANDLERS
// ============================================================================

/// Liveness probe: fixed literal, no dependency checks.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// POST /api/bot - приём webhook-обновлений от Telegram
///
/// Linear flow: decode the update, persist the sender (best-effort), send
/// the greeting with the mini-app button. The user-upsert failure is the
/// single intentionally swallowed error in this service; persistence must
/// never block the greeting.
async fn bot_webhook(
    State(state): State<WebAppState>,
    method: Method,
    body: String,
) -> Result<StatusCode, ApiError> {
    if method != Method::POST {
        return Err(ApiError::NotImplemented);
    }

    let update: Update =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let UpdateKind::Message(message) = update.kind else {
        return Err(ApiError::BadRequest(
            "Обновление бота не содержит сообщения".to_string(),
        ));
    };

    let Some(sender) = message.from.clone() else {
        return Err(ApiError::BadRequest(
            "Обновление бота не содержит сообщения".to_string(),
        ));
    };

    let new_user = NewUser {
        id: i64::try_from(sender.id.0).unwrap_or(0),
        username: sender.username.clone(),
        first_name: sender.first_name.clone(),
        last_name: sender.last_name.clone(),
        language_code: sender.language_code.clone(),
    };

    if let Err(e) = db::upsert_user(&state.db, &new_user).await {
        log::error!("Failed to persist user {}: {}", new_user.id, e);
    } else {
        log::info!("User {} saved", new_user.id);
    }

    let greeting = booking_greeting(&sender.first_name, sender.last_name.as_deref());

    send_booking_invitation(&state.bot, message.chat.id, &greeting, state.web_app_url.clone())
        .await
        .map_err(|e| ApiError::Internal(format!("Не удалось отправить сообщение: {e}")))?;

    Ok(StatusCode::OK)
}

/// Placeholder for pushing the mini-app invitation outside the webhook flow.
async fn send_webapp() -> impl IntoResponse {
    (StatusCode::OK, "Отправка приглашений выполняется через /api/bot")
}

/// Declared routes without real logic yet (/api/users, /api/appointments).
async fn not_implemented() -> ApiError {
    ApiError::NotImplemented
}

/// Store failures answer a fixed generic body; the cause stays in the
/// server log only.
fn query_error(e: sqlx::Error) -> ApiError {
    log::error!("Database query failed: {}", e);
    ApiError::Internal("Ошибка при выполнении запроса к базе данных".to_string())
}

/// Query parameters for GET /api/services
#[derive(Debug, Deserialize)]
struct ServicesQuery {
    master_id: Option<String>,
}

/// GET /api/services - список услуг, опционально по мастеру
///
/// `master_id` is parsed here so a bad parameter answers 400 before any
/// store round trip.
async fn handle_get_services(
    State(state): State<WebAppState>,
    Query(query): Query<ServicesQuery>,
) -> Result<Json<Vec<db::Service>>, ApiError> {
    let services = match query.master_id.as_deref() {
        None => db::list_services(&state.db).await,
        Some(raw) => {
            let master_id: i32 = raw
                .parse()
                .map_err(|_| ApiError::BadRequest("Некорректный master_id".to_string()))?;
            db::list_services_by_master(&state.db, master_id).await
        }
    }
    .map_err(query_error)?;

    Ok(Json(services))
}

/// GET /api/masters - список мастеров
async fn handle_get_masters(
    State(state): State<WebAppState>,
) -> Result<Json<Vec<db::Master>>, ApiError> {
    let masters = db::list_masters(&state.db).await.map_err(query_error)?;

    Ok(Json(masters))
}
