pub mod test_db {
    use crate::database::ensure_schema;
    use crate::db::{add_player, create_karte, create_user, get_players};
    use crate::error::AppError;
    use crate::models::KarteForm;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;

    pub static STANDARD_PASSWORD: &str = "password123";

    pub struct TestUser {
        pub username: String,
        pub role: String,
        pub password: String,
    }

    pub struct TestKarte {
        pub player: Option<String>,
        pub form: KarteForm,
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        players: Vec<String>,
        kartes: Vec<TestKarte>,
    }

    /// Minimal karte payload; fill in the rest with struct update syntax.
    pub fn karte_form(date: &str, category: Option<&str>) -> KarteForm {
        KarteForm {
            date: date.to_string(),
            time_loss_category: category.map(String::from),
            ..Default::default()
        }
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn trainer(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role: "trainer".to_string(),
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn admin(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role: "admin".to_string(),
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn player(mut self, name: &str) -> Self {
            self.players.push(name.to_string());
            self
        }

        pub fn karte(mut self, player: &str, form: KarteForm) -> Self {
            self.kartes.push(TestKarte {
                player: Some(player.to_string()),
                form,
            });
            self
        }

        pub fn unassigned_karte(mut self, form: KarteForm) -> Self {
            self.kartes.push(TestKarte { player: None, form });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            // One connection, or every pooled connection would see its own
            // private in-memory database.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?;

            ensure_schema(&pool).await?;

            let mut user_ids: HashMap<String, i64> = HashMap::new();
            let mut player_ids: HashMap<String, i64> = HashMap::new();

            for user in &self.users {
                let user_id = create_user(&pool, &user.username, &user.password, &user.role)
                    .await?
                    .ok_or_else(|| {
                        AppError::Validation(format!("Duplicate test user {}", user.username))
                    })?;
                user_ids.insert(user.username.clone(), user_id);
            }

            for name in &self.players {
                if !add_player(&pool, name).await? {
                    return Err(AppError::Validation(format!("Duplicate test player {}", name)));
                }
            }
            for player in get_players(&pool).await? {
                player_ids.insert(player.name.clone(), player.id);
            }

            let mut karte_ids: Vec<i64> = Vec::new();
            for karte in &self.kartes {
                let mut form = karte.form.clone();
                if let Some(player) = &karte.player {
                    form.player_id = Some(*player_ids.get(player).ok_or_else(|| {
                        AppError::Validation(format!("Unknown test player {}", player))
                    })?);
                }
                karte_ids.push(create_karte(&pool, &form).await?);
            }

            Ok(TestDb {
                pool,
                user_ids,
                player_ids,
                karte_ids,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        user_ids: HashMap<String, i64>,
        player_ids: HashMap<String, i64>,
        /// Ids in the order the kartes were declared on the builder.
        pub karte_ids: Vec<i64>,
    }

    impl TestDb {
        pub fn user_id(&self, username: &str) -> Option<i64> {
            self.user_ids.get(username).copied()
        }

        pub fn player_id(&self, name: &str) -> Option<i64> {
            self.player_ids.get(name).copied()
        }
    }
}

pub mod test_client {
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::json;

    use crate::api::LoginResponse;

    use super::test_db::{STANDARD_PASSWORD, TestDb, TestDbBuilder, karte_form};

    /// Two staff accounts, two players, a handful of kartes. Enough for
    /// most route tests without building a bespoke database.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .trainer("trainer_user")
            .admin("admin_user")
            .player("山田太郎")
            .player("佐藤次郎")
            .karte("山田太郎", karte_form("2024-04-01", Some("NEW/RE-INJURY")))
            .karte("山田太郎", karte_form("2024-04-08", Some("TIME LOSS")))
            .karte("佐藤次郎", karte_form("2024-04-05", Some("NON TIME LOSS")))
            .build()
            .await
            .expect("Failed to build standard test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = crate::init_rocket(test_db.pool.clone()).await;
        let client = Client::tracked(rocket)
            .await
            .expect("Failed to build test client");
        (client, test_db)
    }

    /// Logs in through the real route; the tracked client keeps the
    /// session cookie for subsequent requests.
    pub async fn login_test_user(client: &Client, username: &str) {
        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": username,
                    "password": STANDARD_PASSWORD
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();
        assert!(login_response.success, "Login failed for {}", username);
    }
}
