use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::database::schema::CURRENT_SCHEMA;
use crate::db::create_user;
use crate::error::AppError;

/// Columns added when the coach-board feature landed. Databases created
/// before then lack them, and SQLite only grows tables column by column.
const REPORT_COLUMNS: [(&str, &str); 5] = [
    ("report_flag", "BOOLEAN NOT NULL DEFAULT FALSE"),
    ("injury_name", "TEXT"),
    ("participation_status", "TEXT"),
    ("return_est", "TEXT"),
    ("progress_note", "TEXT"),
];

/// Full startup bootstrap: base schema, additive upgrades, admin seed.
#[instrument(skip(pool))]
pub async fn initialize_database(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    ensure_schema(pool).await?;
    add_report_columns(pool).await?;
    seed_admin_user(pool).await?;
    Ok(())
}

/// Applies the canonical DDL. Every statement is CREATE TABLE IF NOT
/// EXISTS, so this is safe to run on every startup.
#[instrument(skip(pool))]
pub async fn ensure_schema(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    info!("Applying base schema");
    sqlx::raw_sql(CURRENT_SCHEMA).execute(pool).await?;
    Ok(())
}

/// Adds the coach-board columns to a pre-report kartes table. Returns
/// whether anything changed.
#[instrument(skip(pool))]
pub async fn add_report_columns(pool: &Pool<Sqlite>) -> Result<bool, AppError> {
    let existing: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('kartes')")
        .fetch_all(pool)
        .await?;

    let mut changed = false;
    for (name, declaration) in REPORT_COLUMNS {
        if existing.iter().any(|column| column == name) {
            continue;
        }
        // Column names come from the const table above, never from input.
        let statement = format!("ALTER TABLE kartes ADD COLUMN {} {}", name, declaration);
        sqlx::query(&statement).execute(pool).await?;
        info!(column = name, "Added report column to kartes");
        changed = true;
    }

    Ok(changed)
}

/// Creates the initial admin account when the users table is empty of one.
/// The password comes from ADMIN_PASSWORD; the fallback only exists so a
/// fresh local database is reachable at all.
#[instrument(skip(pool))]
pub async fn seed_admin_user(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
        .bind("admin")
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(value) if !value.is_empty() => value,
        _ => {
            warn!("ADMIN_PASSWORD not set, seeding admin with the default password");
            "password".to_string()
        }
    };

    create_user(pool, "admin", &password, "admin").await?;
    info!("Seeded initial admin user");
    Ok(())
}
