#[cfg(test)]
mod tests {
    use crate::api::{LoginResponse, MutationResponse, UserData};
    use crate::models::KarteForm;
    use crate::test::utils::test_client::{
        create_standard_test_db, login_test_user, setup_test_client,
    };
    use crate::test::utils::test_db::{TestDbBuilder, karte_form};
    use rocket::http::{ContentType, Cookie, Status};
    use serde_json::{Value, json};
    use serial_test::serial;

    #[rocket::async_test]
    async fn test_login_api() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": "trainer_user",
                    "password": "password123"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();

        assert!(login_response.success);
        assert!(login_response.user.is_some());
        assert_eq!(login_response.user.unwrap().username, "trainer_user");

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": "trainer_user",
                    "password": "wrong_password"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();

        assert!(!login_response.success);
        assert!(login_response.error.is_some());
    }

    #[rocket::async_test]
    async fn test_auth_required_apis() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let endpoints = vec![
            "/api/me",
            "/api/kartes",
            "/api/players",
            "/api/report",
            "/api/options",
            "/api/coach/board",
            "/api/admin/users",
        ];

        for endpoint in endpoints {
            let response = client.get(endpoint).dispatch().await;
            assert_eq!(
                response.status(),
                Status::Unauthorized,
                "Endpoint {} did not require authentication",
                endpoint
            );
        }
    }

    #[rocket::async_test]
    async fn test_api_session_security() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let forged_cookie = Cookie::build(("session_token", "fake_token")).build();

        let response = client
            .get("/api/me")
            .private_cookie(forged_cookie)
            .dispatch()
            .await;

        assert_eq!(
            response.status(),
            Status::Unauthorized,
            "Forged session token was accepted"
        );

        login_test_user(&client, "trainer_user").await;

        let response = client.get("/api/me").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let me: UserData = serde_json::from_str(&body).unwrap();
        assert_eq!(me.username, "trainer_user");
        assert_eq!(me.role, "trainer");
    }

    #[rocket::async_test]
    async fn test_logout_invalidates_session() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "trainer_user").await;
        assert_eq!(client.get("/api/me").dispatch().await.status(), Status::Ok);

        let response = client.post("/api/logout").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get("/api/me").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn test_karte_crud_flow() {
        let test_db = create_standard_test_db().await;
        let player_id = test_db.player_id("山田太郎").unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "trainer_user").await;

        // Create
        let response = client
            .post("/api/kartes")
            .header(ContentType::JSON)
            .body(
                json!({
                    "player_id": player_id,
                    "date": "2024-05-01",
                    "subjective": "右膝の痛み",
                    "assessment": "MCL損傷の疑い",
                    "objective": "",
                    "time_loss_category": "NEW/RE-INJURY",
                    "injury_site": "膝"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let created: MutationResponse = serde_json::from_str(&body).unwrap();
        assert!(created.success);
        let karte_id = created.id.expect("Create should return the new id");

        // Fetch detail: full SOAP text, empty string normalized away
        let response = client
            .get(format!("/api/kartes/{}", karte_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let karte: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(karte["subjective"], "右膝の痛み");
        assert_eq!(karte["objective"], Value::Null);
        assert_eq!(karte["player_name"], "山田太郎");

        // Search: list rows carry assessment, the detail stays behind
        let response = client.get("/api/kartes?keyword=MCL").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let rows: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(karte_id));
        assert_eq!(rows[0]["assessment"], "MCL損傷の疑い");
        assert!(rows[0].get("subjective").is_none());

        // Update replaces the row
        let response = client
            .put(format!("/api/kartes/{}", karte_id))
            .header(ContentType::JSON)
            .body(
                json!({
                    "player_id": player_id,
                    "date": "2024-05-02",
                    "time_loss_category": "TIME LOSS"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let updated: MutationResponse =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(updated.success);

        let response = client
            .get(format!("/api/kartes/{}", karte_id))
            .dispatch()
            .await;
        let karte: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(karte["date"], "2024-05-02");
        assert_eq!(karte["subjective"], Value::Null);

        // Delete
        let response = client
            .delete(format!("/api/kartes/{}", karte_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client
            .get(format!("/api/kartes/{}", karte_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_create_karte_requires_player() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "trainer_user").await;

        let response = client
            .post("/api/kartes")
            .header(ContentType::JSON)
            .body(json!({"date": "2024-05-01"}).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body: MutationResponse =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(!body.success);
    }

    #[rocket::async_test]
    async fn test_player_master_flow() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "trainer_user").await;

        let response = client
            .post("/api/players")
            .header(ContentType::JSON)
            .body(json!({"name": "鈴木三郎"}).to_string())
            .dispatch()
            .await;
        let body: MutationResponse =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(body.success);

        // Duplicate registration is reported, not erred
        let response = client
            .post("/api/players")
            .header(ContentType::JSON)
            .body(json!({"name": "鈴木三郎"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: MutationResponse =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(!body.success);

        let response = client.get("/api/players").dispatch().await;
        let players: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        let names: Vec<&str> = players
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"鈴木三郎"));
    }

    #[rocket::async_test]
    async fn test_coach_board_via_trainer_session() {
        let test_db = TestDbBuilder::new()
            .trainer("trainer_user")
            .player("山田太郎")
            .player("佐藤次郎")
            .player("田中五郎")
            .karte("山田太郎", karte_form("2024-01-01", Some("NEW/RE-INJURY")))
            .karte(
                "山田太郎",
                KarteForm {
                    report_flag: true,
                    participation_status: Some("IN".to_string()),
                    ..karte_form("2024-01-15", Some("RETURN TO PLAY"))
                },
            )
            .karte(
                "佐藤次郎",
                KarteForm {
                    report_flag: true,
                    participation_status: Some("OUT".to_string()),
                    ..karte_form("2024-01-10", Some("TIME LOSS"))
                },
            )
            .karte(
                "田中五郎",
                KarteForm {
                    report_flag: true,
                    participation_status: Some("GTD".to_string()),
                    ..karte_form("2024-01-12", Some("TIME LOSS"))
                },
            )
            .build()
            .await
            .expect("Failed to build test database");

        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, "trainer_user").await;

        let response = client.get("/api/coach/board").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let board: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        let board = board.as_array().unwrap();

        let order: Vec<&str> = board
            .iter()
            .map(|r| r["participation_status"].as_str().unwrap())
            .collect();
        assert_eq!(order, vec!["OUT", "GTD", "IN"]);

        // 山田太郎: injured 2024-01-01, reported 2024-01-15.
        let yamada = board
            .iter()
            .find(|r| r["player_name"] == "山田太郎")
            .unwrap();
        assert_eq!(yamada["elapsed_days"], "Day 14 (W3D0)");

        // No NEW/RE-INJURY history: no elapsed-time claim.
        let sato = board
            .iter()
            .find(|r| r["player_name"] == "佐藤次郎")
            .unwrap();
        assert_eq!(sato["elapsed_days"], "-");
    }

    #[rocket::async_test]
    #[serial]
    async fn test_coach_login_grants_board_only() {
        temp_env::async_with_vars([("COACH_PASSWORD", Some("pirates"))], async {
            let test_db = create_standard_test_db().await;
            let (client, _) = setup_test_client(test_db).await;

            // Wrong password: no cookie, no board
            let response = client
                .post("/api/coach/login")
                .header(ContentType::JSON)
                .body(json!({"password": "wrong"}).to_string())
                .dispatch()
                .await;
            let body: MutationResponse =
                serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
            assert!(!body.success);

            let response = client.get("/api/coach/board").dispatch().await;
            assert_eq!(response.status(), Status::Unauthorized);

            // Right password unlocks the board and nothing else
            let response = client
                .post("/api/coach/login")
                .header(ContentType::JSON)
                .body(json!({"password": "pirates"}).to_string())
                .dispatch()
                .await;
            let body: MutationResponse =
                serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
            assert!(body.success);

            let response = client.get("/api/coach/board").dispatch().await;
            assert_eq!(response.status(), Status::Ok);

            let response = client.get("/api/kartes").dispatch().await;
            assert_eq!(response.status(), Status::Unauthorized);
        })
        .await;
    }

    #[rocket::async_test]
    async fn test_admin_user_management() {
        let test_db = create_standard_test_db().await;
        let admin_id = test_db.user_id("admin_user").unwrap();
        let (client, _) = setup_test_client(test_db).await;

        // Trainers are locked out of user management
        login_test_user(&client, "trainer_user").await;
        let response = client.get("/api/admin/users").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        login_test_user(&client, "admin_user").await;
        let response = client.get("/api/admin/users").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client
            .post("/api/admin/users")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": "new_trainer",
                    "password": "long_enough_password",
                    "role": "trainer"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        let body: MutationResponse =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(body.success);

        // Duplicate username is an expected outcome
        let response = client
            .post("/api/admin/users")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": "new_trainer",
                    "password": "long_enough_password",
                    "role": "trainer"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        let body: MutationResponse =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(!body.success);

        // Self-deletion is rejected
        let response = client
            .delete(format!("/api/admin/users/{}", admin_id))
            .dispatch()
            .await;
        let body: MutationResponse =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(!body.success);
    }

    #[rocket::async_test]
    async fn test_options_registry() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "trainer_user").await;

        let response = client.get("/api/options").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        let categories: Vec<&str> = body["time_loss_categories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            categories,
            vec!["NON TIME LOSS", "NEW/RE-INJURY", "TIME LOSS", "RETURN TO PLAY"]
        );

        let statuses: Vec<&str> = body["participation_statuses"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(statuses, vec!["IN", "RESTRICTION", "OUT", "GTD"]);

        assert_eq!(body["pulldowns"].as_array().unwrap().len(), 9);
    }

    #[rocket::async_test]
    async fn test_latest_karte_endpoint() {
        let test_db = create_standard_test_db().await;
        let yamada = test_db.player_id("山田太郎").unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "trainer_user").await;

        let response = client
            .get(format!("/api/players/{}/latest_karte", yamada))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let karte: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(karte["date"], "2024-04-08");

        let response = client
            .get("/api/players/9999/latest_karte")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_player_summary_endpoint() {
        let test_db = create_standard_test_db().await;
        let yamada = test_db.player_id("山田太郎").unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "trainer_user").await;

        let response = client
            .get(format!("/api/players/{}/summary", yamada))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(body["player"]["name"], "山田太郎");
        assert_eq!(body["summary"]["total_kartes"], 2);
        assert_eq!(body["summary"]["time_loss_count"], 1);

        let response = client.get("/api/players/9999/summary").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
