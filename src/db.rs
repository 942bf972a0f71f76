use chrono::{NaiveDateTime, Utc};
use sqlx::{Pool, QueryBuilder, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUser, DbUserSession, User, UserSession};
use crate::error::AppError;
use crate::models::{
    CategoryCount, CoachReport, DbCategoryCount, DbCoachReport, DbInjuryReportRow, DbKarte,
    DbKarteHistoryRow, DbKarteListRow, DbPlayer, InjuryReportRow, Karte, KarteFilter, KarteForm,
    KarteListRow, Player, PlayerSummary, non_empty,
};
use crate::options;

// --- users ---

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>("SELECT id, username, role FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument]
pub async fn get_users(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
    info!("Getting all users");
    let rows = sqlx::query_as::<_, DbUser>("SELECT id, username, role FROM users ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(User::from).collect())
}

/// Checks credentials and returns the user on success. A wrong password,
/// an unknown username and a bcrypt failure all come back as None.
#[instrument(skip_all, fields(username))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");
    let row = sqlx::query_as::<_, (i64, String, String, String)>(
        "SELECT id, username, password, role FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((id, username, password_hash, role)) => {
            match bcrypt::verify(password, &password_hash) {
                Ok(true) => Ok(Some(User::from(DbUser {
                    id: Some(id),
                    username: Some(username),
                    role: Some(role),
                }))),
                _ => Ok(None),
            }
        }
        _ => Ok(None),
    }
}

/// Returns the new user's id, or None when the username is already taken.
/// A duplicate username is an expected condition, not an error.
#[instrument(skip_all, fields(username, role))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
    role: &str,
) -> Result<Option<i64>, AppError> {
    info!("Creating new user");

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let res = sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, ?)")
        .bind(username)
        .bind(hashed_password)
        .bind(role)
        .execute(pool)
        .await;

    match res {
        Ok(done) => Ok(Some(done.last_insert_rowid())),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            info!(username = %username, "Username already exists, user not created");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

#[instrument]
pub async fn delete_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Deleting user");
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM user_sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

// --- sessions ---

#[instrument(skip(pool, token))]
pub async fn create_user_session(
    pool: &Pool<Sqlite>,
    user_id: i64,
    token: &str,
    expires_at: NaiveDateTime,
) -> Result<i64, AppError> {
    info!("Creating user session");

    let res = sqlx::query("INSERT INTO user_sessions (user_id, token, expires_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, token))]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<UserSession, AppError> {
    info!("Getting session by token");

    let session = sqlx::query_as::<_, DbUserSession>(
        "SELECT id, user_id, token, created_at, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match session {
        Some(session) => Ok(UserSession::from(session)),
        _ => Err(AppError::Authentication(
            "Invalid session token".to_string(),
        )),
    }
}

#[instrument(skip(pool, token))]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Invalidating session");

    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired sessions");

    let now = Utc::now().naive_utc();

    let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

// --- players ---

#[instrument]
pub async fn get_players(pool: &Pool<Sqlite>) -> Result<Vec<Player>, AppError> {
    info!("Getting all players");
    let rows = sqlx::query_as::<_, DbPlayer>("SELECT id, name FROM players ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Player::from).collect())
}

#[instrument]
pub async fn get_player(pool: &Pool<Sqlite>, player_id: i64) -> Result<Player, AppError> {
    info!("Fetching player by ID");
    let row = sqlx::query_as::<_, DbPlayer>("SELECT id, name FROM players WHERE id = ?")
        .bind(player_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(player) => Ok(Player::from(player)),
        _ => Err(AppError::NotFound(format!(
            "Player with id {} not found in database",
            player_id
        ))),
    }
}

/// Returns false when the name is already registered.
#[instrument]
pub async fn add_player(pool: &Pool<Sqlite>, name: &str) -> Result<bool, AppError> {
    info!("Registering player");
    let res = sqlx::query("INSERT INTO players (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await;

    match res {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            info!(name = %name, "Player already registered");
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}

/// Returns false when the new name collides with another player.
#[instrument]
pub async fn update_player_name(
    pool: &Pool<Sqlite>,
    player_id: i64,
    new_name: &str,
) -> Result<bool, AppError> {
    info!("Renaming player");
    let res = sqlx::query("UPDATE players SET name = ? WHERE id = ?")
        .bind(new_name)
        .bind(player_id)
        .execute(pool)
        .await;

    match res {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Removes the player and every karte referencing it. Both deletes run in
/// one transaction so a failure part-way leaves neither orphaned kartes
/// nor a half-deleted player.
#[instrument]
pub async fn delete_player(pool: &Pool<Sqlite>, player_id: i64) -> Result<(), AppError> {
    info!("Deleting player and their kartes");
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM kartes WHERE player_id = ?")
        .bind(player_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM players WHERE id = ?")
        .bind(player_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

// --- kartes ---

const KARTE_LIST_SELECT: &str = "SELECT k.id, k.date, p.name AS player_name, k.trainer_note, \
     k.assessment, k.time_loss_category, k.diagnosis_flag, k.report_flag \
     FROM kartes k LEFT JOIN players p ON k.player_id = p.id WHERE 1=1";

/// Filtered karte search. Every supplied filter is ANDed in; absent or
/// empty values add nothing. All values travel as bound parameters.
#[instrument(skip(pool))]
pub async fn search_kartes(
    pool: &Pool<Sqlite>,
    filter: &KarteFilter,
) -> Result<Vec<KarteListRow>, AppError> {
    info!("Searching kartes");

    let mut query = QueryBuilder::<Sqlite>::new(KARTE_LIST_SELECT);

    if let Some(player_id) = filter.player_id {
        query.push(" AND k.player_id = ");
        query.push_bind(player_id);
    }
    if let Some(start_date) = non_empty(&filter.start_date) {
        query.push(" AND k.date >= ");
        query.push_bind(start_date.to_string());
    }
    if let Some(end_date) = non_empty(&filter.end_date) {
        query.push(" AND k.date <= ");
        query.push_bind(end_date.to_string());
    }
    match non_empty(&filter.time_loss_category) {
        // TIME_LOSS_ONLY is a derived filter, not a stored category.
        Some(options::FILTER_TIME_LOSS_ONLY) => {
            query.push(" AND (k.time_loss_category = ");
            query.push_bind(options::TIME_LOSS_LOSS);
            query.push(" OR k.time_loss_category = ");
            query.push_bind(options::TIME_LOSS_RETURN);
            query.push(")");
        }
        Some(options::FILTER_ALL) | None => {}
        Some(category) => {
            query.push(" AND k.time_loss_category = ");
            query.push_bind(category.to_string());
        }
    }
    if let Some(keyword) = non_empty(&filter.keyword) {
        let pattern = format!("%{}%", keyword);
        query.push(" AND (");
        let mut fields = query.separated(" OR ");
        for column in [
            "k.subjective",
            "k.objective",
            "k.assessment",
            "k.plan",
            "k.trainer_note",
        ] {
            fields.push(column);
            fields.push_unseparated(" LIKE ");
            fields.push_bind_unseparated(pattern.clone());
        }
        query.push(")");
    }
    query.push(" ORDER BY k.date DESC");

    let rows = query
        .build_query_as::<DbKarteListRow>()
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(KarteListRow::from).collect())
}

#[instrument(skip(pool, form))]
pub async fn create_karte(pool: &Pool<Sqlite>, form: &KarteForm) -> Result<i64, AppError> {
    info!("Creating karte");

    let res = sqlx::query(
        "INSERT INTO kartes (player_id, date, trainer_note, time_loss_category, diagnosis_flag, \
         subjective, objective, assessment, plan, activity, timing, age, status, mechanism, \
         injury_type, injury_site, position, onset_style, report_flag, injury_name, \
         participation_status, return_est, progress_note) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(form.player_id)
    .bind(&form.date)
    .bind(non_empty(&form.trainer_note))
    .bind(non_empty(&form.time_loss_category))
    .bind(form.diagnosis_flag)
    .bind(non_empty(&form.subjective))
    .bind(non_empty(&form.objective))
    .bind(non_empty(&form.assessment))
    .bind(non_empty(&form.plan))
    .bind(non_empty(&form.activity))
    .bind(non_empty(&form.timing))
    .bind(non_empty(&form.age))
    .bind(non_empty(&form.status))
    .bind(non_empty(&form.mechanism))
    .bind(non_empty(&form.injury_type))
    .bind(non_empty(&form.injury_site))
    .bind(non_empty(&form.position))
    .bind(non_empty(&form.onset_style))
    .bind(form.report_flag)
    .bind(non_empty(&form.injury_name))
    .bind(non_empty(&form.participation_status))
    .bind(non_empty(&form.return_est))
    .bind(non_empty(&form.progress_note))
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

/// Full-row replace. Fields absent from the form become NULL; kartes are
/// never partially merged.
#[instrument(skip(pool, form))]
pub async fn update_karte(
    pool: &Pool<Sqlite>,
    karte_id: i64,
    form: &KarteForm,
) -> Result<(), AppError> {
    info!("Updating karte");

    sqlx::query(
        "UPDATE kartes SET player_id = ?, date = ?, trainer_note = ?, time_loss_category = ?, \
         diagnosis_flag = ?, subjective = ?, objective = ?, assessment = ?, plan = ?, \
         activity = ?, timing = ?, age = ?, status = ?, mechanism = ?, injury_type = ?, \
         injury_site = ?, position = ?, onset_style = ?, report_flag = ?, injury_name = ?, \
         participation_status = ?, return_est = ?, progress_note = ? \
         WHERE id = ?",
    )
    .bind(form.player_id)
    .bind(&form.date)
    .bind(non_empty(&form.trainer_note))
    .bind(non_empty(&form.time_loss_category))
    .bind(form.diagnosis_flag)
    .bind(non_empty(&form.subjective))
    .bind(non_empty(&form.objective))
    .bind(non_empty(&form.assessment))
    .bind(non_empty(&form.plan))
    .bind(non_empty(&form.activity))
    .bind(non_empty(&form.timing))
    .bind(non_empty(&form.age))
    .bind(non_empty(&form.status))
    .bind(non_empty(&form.mechanism))
    .bind(non_empty(&form.injury_type))
    .bind(non_empty(&form.injury_site))
    .bind(non_empty(&form.position))
    .bind(non_empty(&form.onset_style))
    .bind(form.report_flag)
    .bind(non_empty(&form.injury_name))
    .bind(non_empty(&form.participation_status))
    .bind(non_empty(&form.return_est))
    .bind(non_empty(&form.progress_note))
    .bind(karte_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument]
pub async fn get_karte(pool: &Pool<Sqlite>, karte_id: i64) -> Result<Karte, AppError> {
    info!("Fetching karte by ID");
    let row = sqlx::query_as::<_, DbKarte>(
        "SELECT k.*, p.name AS player_name FROM kartes k \
         LEFT JOIN players p ON k.player_id = p.id WHERE k.id = ?",
    )
    .bind(karte_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(karte) => Ok(Karte::from(karte)),
        _ => Err(AppError::NotFound(format!(
            "Karte with id {} not found in database",
            karte_id
        ))),
    }
}

/// The player's most recent karte, used to prefill a copied entry.
#[instrument]
pub async fn get_latest_karte_by_player(
    pool: &Pool<Sqlite>,
    player_id: i64,
) -> Result<Option<Karte>, AppError> {
    info!("Fetching latest karte for player");
    let row = sqlx::query_as::<_, DbKarte>(
        "SELECT k.*, p.name AS player_name FROM kartes k \
         LEFT JOIN players p ON k.player_id = p.id \
         WHERE k.player_id = ? ORDER BY k.date DESC, k.id DESC LIMIT 1",
    )
    .bind(player_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Karte::from))
}

#[instrument]
pub async fn delete_karte(pool: &Pool<Sqlite>, karte_id: i64) -> Result<(), AppError> {
    info!("Deleting karte");
    sqlx::query("DELETE FROM kartes WHERE id = ?")
        .bind(karte_id)
        .execute(pool)
        .await?;

    Ok(())
}

// --- reports ---

#[instrument]
pub async fn time_loss_counts(pool: &Pool<Sqlite>) -> Result<Vec<CategoryCount>, AppError> {
    info!("Counting kartes per time-loss category");
    let rows = sqlx::query_as::<_, DbCategoryCount>(
        "SELECT time_loss_category, COUNT(id) AS count FROM kartes \
         WHERE time_loss_category IN (?, ?, ?) GROUP BY time_loss_category",
    )
    .bind(options::TIME_LOSS_LOSS)
    .bind(options::TIME_LOSS_NEW_INJURY)
    .bind(options::TIME_LOSS_RETURN)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CategoryCount::from).collect())
}

/// Aggregated (category, site, type) counts over the time-loss-relevant
/// rows. Rows without a site are excluded here, on purpose: the report
/// ranks real sites and never invents an "unknown" bucket.
#[instrument]
pub async fn injury_report_rows(pool: &Pool<Sqlite>) -> Result<Vec<InjuryReportRow>, AppError> {
    info!("Fetching injury report rows");
    let rows = sqlx::query_as::<_, DbInjuryReportRow>(
        "SELECT time_loss_category, injury_site, injury_type, COUNT(id) AS count FROM kartes \
         WHERE time_loss_category IN (?, ?, ?) \
         AND injury_site IS NOT NULL AND injury_site != '' \
         GROUP BY time_loss_category, injury_site, injury_type",
    )
    .bind(options::TIME_LOSS_LOSS)
    .bind(options::TIME_LOSS_NEW_INJURY)
    .bind(options::TIME_LOSS_RETURN)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(InjuryReportRow::from).collect())
}

#[instrument]
pub async fn player_summary(
    pool: &Pool<Sqlite>,
    player_id: i64,
) -> Result<PlayerSummary, AppError> {
    info!("Building player summary");

    let total_kartes: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM kartes WHERE player_id = ?")
        .bind(player_id)
        .fetch_one(pool)
        .await?;

    let (time_loss_count, return_to_play_count): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(CASE WHEN time_loss_category = ? THEN 1 END), \
         COUNT(CASE WHEN time_loss_category = ? THEN 1 END) \
         FROM kartes WHERE player_id = ?",
    )
    .bind(options::TIME_LOSS_LOSS)
    .bind(options::TIME_LOSS_RETURN)
    .bind(player_id)
    .fetch_one(pool)
    .await?;

    let history = sqlx::query_as::<_, DbKarteHistoryRow>(
        "SELECT date, injury_site, injury_type, assessment, time_loss_category \
         FROM kartes WHERE player_id = ? ORDER BY date DESC LIMIT 10",
    )
    .bind(player_id)
    .fetch_all(pool)
    .await?;

    Ok(PlayerSummary {
        total_kartes,
        time_loss_count,
        return_to_play_count,
        history: history.into_iter().map(Into::into).collect(),
    })
}

/// The latest reportable karte per player: max(date), tiebroken by
/// max(id). Non-reportable rows never appear, and players without a
/// reportable karte have no line on the board.
#[instrument]
pub async fn coach_reports(pool: &Pool<Sqlite>) -> Result<Vec<CoachReport>, AppError> {
    info!("Fetching coach reports");
    let rows = sqlx::query_as::<_, DbCoachReport>(
        "SELECT k.id AS karte_id, k.player_id, p.name AS player_name, k.date, \
         k.injury_name, k.participation_status, k.return_est, k.progress_note, \
         k.time_loss_category \
         FROM kartes k LEFT JOIN players p ON k.player_id = p.id \
         WHERE k.report_flag = 1 AND k.id = ( \
             SELECT k2.id FROM kartes k2 \
             WHERE k2.player_id = k.player_id AND k2.report_flag = 1 \
             ORDER BY k2.date DESC, k2.id DESC LIMIT 1) \
         ORDER BY k.player_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CoachReport::from).collect())
}

/// Date of the player's most recent NEW/RE-INJURY entry on or before the
/// given date. The exact category string is the only injury-onset signal.
#[instrument]
pub async fn latest_injury_date(
    pool: &Pool<Sqlite>,
    player_id: i64,
    on_or_before: &str,
) -> Result<Option<String>, AppError> {
    info!("Looking up latest injury date");
    let date: Option<String> = sqlx::query_scalar(
        "SELECT date FROM kartes \
         WHERE player_id = ? AND time_loss_category = ? AND date <= ? \
         ORDER BY date DESC LIMIT 1",
    )
    .bind(player_id)
    .bind(options::TIME_LOSS_NEW_INJURY)
    .bind(on_or_before)
    .fetch_optional(pool)
    .await?;

    Ok(date)
}
