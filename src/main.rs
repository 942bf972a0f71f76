#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod database;
mod db;
mod env;
mod error;
mod models;
mod options;
mod report;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use api::{
    api_add_player, api_coach_board, api_coach_login, api_create_karte, api_create_user,
    api_delete_karte, api_delete_player, api_delete_user, api_get_karte, api_get_players,
    api_get_users, api_latest_karte, api_login, api_logout, api_me, api_me_unauthorized,
    api_options, api_player_summary, api_rename_player, api_report, api_search_kartes,
    api_update_karte, health,
};
use auth::unauthorized_api;
use database::initialize_database;
use db::clean_expired_sessions;
use rocket::{Build, Rocket, tokio};
use telemetry::TelemetryFairing;
use telemetry::init_tracing;

use sqlx::SqlitePool;
use tracing::{error, info, warn};

#[launch]
async fn rocket() -> _ {
    init_tracing();

    if let Err(e) = env::load_environment() {
        warn!("Failed to load environment files: {}", e);
    }

    let database_url = std::env::var("DATABASE_URL").unwrap_or_default();

    let pool = SqlitePool::connect(&database_url)
        .await
        .expect("Failed to connect to SQLite database");

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    info!("Bootstrapping database...");
    match initialize_database(&pool).await {
        Ok(()) => info!("Database bootstrap completed"),
        Err(e) => {
            error!("Failed to bootstrap database: {}", e);
            panic!("Database bootstrap failed: {}", e);
        }
    }

    init_rocket(pool).await
}

pub async fn init_rocket(pool: SqlitePool) -> Rocket<Build> {
    info!("Starting karte tracker");

    rocket::build()
        .manage(pool)
        .mount(
            "/api",
            routes![
                api_login,
                api_logout,
                api_me,
                api_me_unauthorized,
                api_coach_login,
                api_coach_board,
                api_search_kartes,
                api_create_karte,
                api_get_karte,
                api_update_karte,
                api_delete_karte,
                api_get_players,
                api_add_player,
                api_rename_player,
                api_delete_player,
                api_player_summary,
                api_latest_karte,
                api_report,
                api_options,
                api_get_users,
                api_create_user,
                api_delete_user,
            ],
        )
        .register("/api", catchers![unauthorized_api])
        .mount("/api", routes![health])
        .attach(TelemetryFairing)
}
