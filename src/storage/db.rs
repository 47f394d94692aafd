use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::core::{config, AppResult};

pub type DbPool = PgPool;

/// Структура, представляющая пользователя в базе данных.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    /// Telegram ID пользователя
    pub id: i64,
    /// Имя пользователя (username) в Telegram, если доступно
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    /// Код языка клиента Telegram, например "ru"
    pub language_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Профиль отправителя, извлечённый из webhook-обновления.
///
/// Insert-only payload: `created_at` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

/// Структура услуги.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Service {
    pub id: i32,
    pub name: String,
    pub price: f64,
    /// Продолжительность услуги в минутах
    pub duration: i32,
}

/// Структура мастера.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Master {
    pub id: i32,
    pub name: String,
    /// Опыт работы в годах
    pub experience: i32,
}

/// Структура записи. Declared shape only: the booking flow lives in the
/// mini-app front-end and this service has no read/write operation for it
/// yet (`/api/appointments` answers 501).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Appointment {
    pub id: i32,
    pub user_id: i64,
    pub service_id: i32,
    pub appointment_time: DateTime<Utc>,
}

/// Create the shared database connection pool.
///
/// Connects eagerly, pings the store once, and brings the schema up to date
/// via embedded migrations. Startup cannot proceed if the connect or ping
/// fails; a migration failure is logged and tolerated, matching the
/// migrate-on-create policy used elsewhere in the deployment.
///
/// # Errors
/// Returns `AppError::Database` if the pool cannot be built or the liveness
/// check fails.
pub async fn create_pool(database_url: &str) -> AppResult<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config::database::MAX_CONNECTIONS)
        .acquire_timeout(config::database::acquire_timeout())
        .connect(database_url)
        .await?;

    // Fail fast if the store is unreachable.
    sqlx::query("SELECT 1").execute(&pool).await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        log::warn!("Failed to migrate schema: {}", e);
    }

    log::info!("Database connection established");
    Ok(pool)
}

/// Unfiltered scan of the services relation. Row order is store-defined.
///
/// # Errors
/// Returns `sqlx::Error` on connectivity or decode failure; partial results
/// are never returned.
pub async fn list_services(pool: &DbPool) -> Result<Vec<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>("SELECT id, name, price, duration FROM services")
        .fetch_all(pool)
        .await
}

/// Services offered by a single master.
///
/// # Errors
/// Returns `sqlx::Error` on connectivity or decode failure.
pub async fn list_services_by_master(pool: &DbPool, master_id: i32) -> Result<Vec<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>("SELECT id, name, price, duration FROM services WHERE master_id = $1")
        .bind(master_id)
        .fetch_all(pool)
        .await
}

/// Unfiltered scan of the masters relation.
///
/// # Errors
/// Returns `sqlx::Error` on connectivity or decode failure.
pub async fn list_masters(pool: &DbPool) -> Result<Vec<Master>, sqlx::Error> {
    sqlx::query_as::<_, Master>("SELECT id, name, experience FROM masters")
        .fetch_all(pool)
        .await
}

/// Insert a user on first contact.
///
/// Idempotent: a row with the same id is left untouched, including when the
/// incoming profile fields differ. The caller decides whether a failure here
/// matters — the webhook flow intentionally discards it.
///
/// # Errors
/// Returns `sqlx::Error` if the insert cannot be executed.
pub async fn upsert_user(pool: &DbPool, user: &NewUser) -> Result<(), sqlx::Error> {
    sqlx::query(UPSERT_USER_SQL)
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.language_code)
        .execute(pool)
        .await?;

    Ok(())
}

/// Insert-or-ignore keyed on the Telegram id. Deliberately no `DO UPDATE`:
/// the first-written profile fields win on repeat contact.
const UPSERT_USER_SQL: &str =
    "INSERT INTO users (id, username, first_name, last_name, language_code, created_at) \
     VALUES ($1, $2, $3, $4, $5, NOW()) \
     ON CONFLICT (id) DO NOTHING";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn upsert_user_statement_is_insert_or_ignore() {
        assert!(UPSERT_USER_SQL.contains("ON CONFLICT (id) DO NOTHING"));
        assert!(!UPSERT_USER_SQL.contains("DO UPDATE"));
    }

    /// Run against a real store with
    /// `DATABASE_URL=... cargo test -- --ignored`.
    #[tokio::test]
    #[ignore = "requires a live Postgres at DATABASE_URL"]
    async fn upsert_user_keeps_first_written_row() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for live test");
        let pool = create_pool(&url).await.expect("connect");

        let id = 920_000_001_i64;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .expect("cleanup");

        let first = NewUser {
            id,
            username: Some("anna".to_string()),
            first_name: "Анна".to_string(),
            last_name: None,
            language_code: Some("ru".to_string()),
        };
        upsert_user(&pool, &first).await.expect("first insert");

        let second = NewUser {
            first_name: "Ирина".to_string(),
            username: Some("ira".to_string()),
            ..first.clone()
        };
        upsert_user(&pool, &second).await.expect("repeat insert");

        let stored: User = sqlx::query_as(
            "SELECT id, username, first_name, last_name, language_code, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&pool)
        .await
        .expect("fetch");

        assert_eq!(stored.first_name, "Анна");
        assert_eq!(stored.username.as_deref(), Some("anna"));
    }
}
