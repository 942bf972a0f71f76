use rocket::State;
use rocket::http::{Cookie, SameSite, Status};
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{COACH_COOKIE, CoachAccess, Permission, SESSION_COOKIE, User, UserSession};
use crate::db::{
    add_player, authenticate_user, coach_reports, create_karte, create_user, create_user_session,
    delete_karte, delete_player, delete_user, get_karte, get_latest_karte_by_player, get_player,
    get_players, get_users, injury_report_rows, invalidate_session, latest_injury_date,
    player_summary, search_kartes, time_loss_counts, update_karte, update_player_name,
};
use crate::models::{
    CategoryCount, CategoryGroup, CoachReport, Karte, KarteFilter, KarteForm, KarteListRow, Player,
    PlayerSummary, SiteCount,
};
use crate::options;
use crate::report::{elapsed_days_label, group_by_category, rank_reports, summarize_sites};
use crate::validation::{
    AppErrorExt, JsonValidateExt, RecoverReadExt, ToValidationResponse, ValidationResponse,
};

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    username: String,
    #[validate(length(min = 1, message = "password is required"))]
    password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: Option<UserData>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserData {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.to_string(),
        }
    }
}

/// Shared response for create/update/delete calls. Store failures surface
/// here as success=false, never as an unhandled error.
#[derive(Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub id: Option<i64>,
    pub error: Option<String>,
}

impl MutationResponse {
    fn ok(id: Option<i64>) -> Self {
        Self {
            success: true,
            id,
            error: None,
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(message.to_string()),
        }
    }
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<LoginResponse>, Custom<Json<ValidationResponse>>> {
    use chrono::Utc;

    let validated = login.validate_custom()?;

    match authenticate_user(db, &validated.username, &validated.password)
        .await
        .validate_custom()?
    {
        Some(user) => {
            let token = UserSession::generate_token();
            let expires_at = Utc::now() + chrono::Duration::hours(1);

            create_user_session(db, user.id, &token, expires_at.naive_utc())
                .await
                .validate_custom()?;

            let cookie = Cookie::build((SESSION_COOKIE, token))
                .same_site(SameSite::Lax)
                .http_only(true)
                .max_age(rocket::time::Duration::hours(1));
            cookies.add_private(cookie);

            Ok(Json(LoginResponse {
                success: true,
                user: Some(UserData::from(user)),
                error: None,
            }))
        }
        None => Ok(Json(LoginResponse {
            success: false,
            user: None,
            error: Some("Invalid username or password".to_string()),
        })),
    }
}

#[post("/logout")]
pub async fn api_logout(
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Status {
    let token = cookies
        .get_private(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        let _ = invalidate_session(db, &token).await;
    }

    cookies.remove_private(Cookie::build(SESSION_COOKIE));
    cookies.remove_private(Cookie::build(COACH_COOKIE));

    Status::Ok
}

#[get("/me")]
pub async fn api_me(user: User) -> Json<UserData> {
    Json(UserData::from(user))
}

#[get("/me", rank = 2)]
pub async fn api_me_unauthorized() -> Status {
    Status::Unauthorized
}

#[derive(Deserialize, Validate)]
pub struct CoachLoginRequest {
    #[validate(length(min = 1, message = "password is required"))]
    password: String,
}

/// Shared-password gate for coaches. On success the browser gets a cookie
/// that unlocks the board and nothing else.
#[post("/coach/login", data = "<login>")]
pub async fn api_coach_login(
    login: Json<CoachLoginRequest>,
    cookies: &rocket::http::CookieJar<'_>,
) -> Result<Json<MutationResponse>, Custom<Json<ValidationResponse>>> {
    let validated = login.validate_custom()?;

    let expected = match std::env::var("COACH_PASSWORD") {
        Ok(value) if !value.is_empty() => value,
        _ => {
            tracing::warn!("COACH_PASSWORD not set, coach login disabled");
            return Ok(Json(MutationResponse::failed("Coach login is disabled")));
        }
    };

    if validated.password != expected {
        return Ok(Json(MutationResponse::failed("Wrong password")));
    }

    let cookie = Cookie::build((COACH_COOKIE, "granted"))
        .same_site(SameSite::Lax)
        .http_only(true)
        .max_age(rocket::time::Duration::hours(12));
    cookies.add_private(cookie);

    Ok(Json(MutationResponse::ok(None)))
}

#[get("/coach/board")]
pub async fn api_coach_board(
    _access: CoachAccess,
    db: &State<Pool<Sqlite>>,
) -> Json<Vec<CoachReport>> {
    let mut reports = coach_reports(db).await.or_empty("Fetching coach board");

    for report in reports.iter_mut() {
        let Some(player_id) = report.player_id else {
            continue;
        };
        match latest_injury_date(db, player_id, &report.date).await {
            Ok(Some(injury_date)) => {
                if let Some(label) = elapsed_days_label(&injury_date, &report.date) {
                    report.elapsed_days = label;
                }
            }
            Ok(None) => {}
            Err(err) => err.log_and_record("Elapsed-days lookup"),
        }
    }

    rank_reports(&mut reports);

    Json(reports)
}

#[get("/kartes?<filter..>")]
pub async fn api_search_kartes(
    filter: KarteFilter,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<KarteListRow>>, Status> {
    user.require_permission(Permission::ViewKartes)?;

    Ok(Json(
        search_kartes(db, &filter)
            .await
            .or_empty("Searching kartes"),
    ))
}

#[post("/kartes", data = "<karte>")]
pub async fn api_create_karte(
    karte: Json<KarteForm>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MutationResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::EditKartes)
        .map_err(|status| status.to_validation_response())?;

    let validated = karte.validate_custom()?;

    if validated.player_id.is_none() {
        return Ok(Json(MutationResponse::failed("player is required")));
    }

    match create_karte(db, &validated).await {
        Ok(id) => Ok(Json(MutationResponse::ok(Some(id)))),
        Err(err) => {
            err.log_and_record("Creating karte");
            Ok(Json(MutationResponse::failed("Karte was not created")))
        }
    }
}

#[get("/kartes/<id>")]
pub async fn api_get_karte(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Karte>, Status> {
    user.require_permission(Permission::ViewKartes)?;

    match get_karte(db, id).await {
        Ok(karte) => Ok(Json(karte)),
        Err(err) => Err(err.to_status_with_log("Fetching karte")),
    }
}

#[put("/kartes/<id>", data = "<karte>")]
pub async fn api_update_karte(
    id: i64,
    karte: Json<KarteForm>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MutationResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::EditKartes)
        .map_err(|status| status.to_validation_response())?;

    let validated = karte.validate_custom()?;

    // Replace-on-update: confirm the row exists, then write the whole row.
    get_karte(db, id).await.validate_custom()?;

    match update_karte(db, id, &validated).await {
        Ok(()) => Ok(Json(MutationResponse::ok(Some(id)))),
        Err(err) => {
            err.log_and_record("Updating karte");
            Ok(Json(MutationResponse::failed("Karte was not updated")))
        }
    }
}

#[delete("/kartes/<id>")]
pub async fn api_delete_karte(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MutationResponse>, Status> {
    user.require_permission(Permission::EditKartes)?;

    match delete_karte(db, id).await {
        Ok(()) => Ok(Json(MutationResponse::ok(Some(id)))),
        Err(err) => {
            err.log_and_record("Deleting karte");
            Ok(Json(MutationResponse::failed("Karte was not deleted")))
        }
    }
}

#[get("/players")]
pub async fn api_get_players(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Player>>, Status> {
    user.require_permission(Permission::ViewKartes)?;

    Ok(Json(get_players(db).await.or_empty("Listing players")))
}

#[derive(Deserialize, Validate)]
pub struct PlayerRequest {
    #[validate(length(min = 1, message = "name is required"))]
    name: String,
}

#[post("/players", data = "<player>")]
pub async fn api_add_player(
    player: Json<PlayerRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MutationResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManagePlayers)
        .map_err(|status| status.to_validation_response())?;

    let validated = player.validate_custom()?;
    let name = validated.name.trim();
    if name.is_empty() {
        return Ok(Json(MutationResponse::failed("name is required")));
    }

    match add_player(db, name).await {
        Ok(true) => Ok(Json(MutationResponse::ok(None))),
        Ok(false) => Ok(Json(MutationResponse::failed(
            "Player is already registered",
        ))),
        Err(err) => {
            err.log_and_record("Registering player");
            Ok(Json(MutationResponse::failed("Player was not registered")))
        }
    }
}

#[put("/players/<id>", data = "<player>")]
pub async fn api_rename_player(
    id: i64,
    player: Json<PlayerRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MutationResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManagePlayers)
        .map_err(|status| status.to_validation_response())?;

    let validated = player.validate_custom()?;
    let name = validated.name.trim();
    if name.is_empty() {
        return Ok(Json(MutationResponse::failed("name is required")));
    }

    match update_player_name(db, id, name).await {
        Ok(true) => Ok(Json(MutationResponse::ok(Some(id)))),
        Ok(false) => Ok(Json(MutationResponse::failed(
            "Another player already has that name",
        ))),
        Err(err) => {
            err.log_and_record("Renaming player");
            Ok(Json(MutationResponse::failed("Player was not renamed")))
        }
    }
}

#[delete("/players/<id>")]
pub async fn api_delete_player(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MutationResponse>, Status> {
    user.require_permission(Permission::ManagePlayers)?;

    match delete_player(db, id).await {
        Ok(()) => Ok(Json(MutationResponse::ok(Some(id)))),
        Err(err) => {
            err.log_and_record("Deleting player");
            Ok(Json(MutationResponse::failed("Player was not deleted")))
        }
    }
}

#[derive(Serialize)]
pub struct PlayerSummaryResponse {
    pub player: Player,
    pub summary: PlayerSummary,
}

#[get("/players/<id>/summary")]
pub async fn api_player_summary(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<PlayerSummaryResponse>, Status> {
    user.require_permission(Permission::ViewReports)?;

    let player = get_player(db, id)
        .await
        .map_err(|err| err.to_status_with_log("Fetching player for summary"))?;

    let summary = player_summary(db, id)
        .await
        .map_err(|err| err.to_status_with_log("Building player summary"))?;

    Ok(Json(PlayerSummaryResponse { player, summary }))
}

#[get("/players/<id>/latest_karte")]
pub async fn api_latest_karte(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Karte>, Status> {
    user.require_permission(Permission::ViewKartes)?;

    match get_latest_karte_by_player(db, id).await {
        Ok(Some(karte)) => Ok(Json(karte)),
        Ok(None) => Err(Status::NotFound),
        Err(err) => Err(err.to_status_with_log("Fetching latest karte")),
    }
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub category_counts: Vec<CategoryCount>,
    pub site_counts: Vec<SiteCount>,
    pub groups: Vec<CategoryGroup>,
}

#[get("/report")]
pub async fn api_report(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ReportResponse>, Status> {
    user.require_permission(Permission::ViewReports)?;

    let category_counts = time_loss_counts(db)
        .await
        .or_empty("Counting time-loss categories");
    let rows = injury_report_rows(db)
        .await
        .or_empty("Fetching injury report rows");

    Ok(Json(ReportResponse {
        category_counts,
        site_counts: summarize_sites(&rows),
        groups: group_by_category(&rows),
    }))
}

#[derive(Serialize)]
pub struct PulldownOptions {
    pub field: &'static str,
    pub label: &'static str,
    pub options: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct OptionsResponse {
    pub time_loss_categories: Vec<&'static str>,
    pub participation_statuses: Vec<&'static str>,
    pub pulldowns: Vec<PulldownOptions>,
}

#[get("/options")]
pub async fn api_options(_user: User) -> Json<OptionsResponse> {
    Json(OptionsResponse {
        time_loss_categories: options::TIME_LOSS_OPTIONS.to_vec(),
        participation_statuses: options::PARTICIPATION_STATUS_OPTIONS.to_vec(),
        pulldowns: options::PULLDOWNS
            .iter()
            .map(|pulldown| PulldownOptions {
                field: pulldown.field,
                label: pulldown.label,
                options: pulldown.options.to_vec(),
            })
            .collect(),
    })
}

#[get("/admin/users")]
pub async fn api_get_users(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<UserData>>, Status> {
    user.require_permission(Permission::ManageUsers)?;

    let users = get_users(db)
        .await
        .map_err(|err| err.to_status_with_log("Listing users"))?;

    Ok(Json(users.into_iter().map(UserData::from).collect()))
}

#[derive(Deserialize, Validate, Clone)]
pub struct UserCreateRequest {
    #[validate(length(min = 1, message = "username is required"))]
    username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    password: String,
    role: String,
}

#[post("/admin/users", data = "<registration>")]
pub async fn api_create_user(
    registration: Json<UserCreateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MutationResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageUsers)
        .map_err(|status| status.to_validation_response())?;

    let validated = registration.validate_custom()?;

    if crate::auth::Role::from_str(&validated.role).is_err() {
        return Ok(Json(MutationResponse::failed("Unknown role")));
    }

    match create_user(db, &validated.username, &validated.password, &validated.role)
        .await
        .validate_custom()?
    {
        Some(id) => Ok(Json(MutationResponse::ok(Some(id)))),
        None => Ok(Json(MutationResponse::failed("Username already exists"))),
    }
}

#[delete("/admin/users/<id>")]
pub async fn api_delete_user(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MutationResponse>, Status> {
    user.require_permission(Permission::ManageUsers)?;

    if id == user.id {
        return Ok(Json(MutationResponse::failed(
            "You cannot delete your own account",
        )));
    }

    match delete_user(db, id).await {
        Ok(()) => Ok(Json(MutationResponse::ok(Some(id)))),
        Err(err) => {
            err.log_and_record("Deleting user");
            Ok(Json(MutationResponse::failed("User was not deleted")))
        }
    }
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
