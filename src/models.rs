use rocket::FromForm;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Empty strings from forms carry no information; treat them as absent.
/// Used both for write-path sanitizing and for filter values.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Serialize, Clone)]
pub struct Player {
    pub id: i64,
    pub name: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbPlayer {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl From<DbPlayer> for Player {
    fn from(player: DbPlayer) -> Self {
        Self {
            id: player.id.unwrap_or_default(),
            name: player.name.unwrap_or_default(),
        }
    }
}

/// A full karte row, player name joined in. Nullable columns stay `Option`
/// so the empty-string-to-NULL normalization survives a round trip.
#[derive(Serialize, Clone)]
pub struct Karte {
    pub id: i64,
    pub player_id: Option<i64>,
    pub player_name: Option<String>,
    pub date: String,
    pub trainer_note: Option<String>,
    pub time_loss_category: Option<String>,
    pub diagnosis_flag: bool,
    pub subjective: Option<String>,
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
    pub activity: Option<String>,
    pub timing: Option<String>,
    pub age: Option<String>,
    pub status: Option<String>,
    pub mechanism: Option<String>,
    pub injury_type: Option<String>,
    pub injury_site: Option<String>,
    pub position: Option<String>,
    pub onset_style: Option<String>,
    pub report_flag: bool,
    pub injury_name: Option<String>,
    pub participation_status: Option<String>,
    pub return_est: Option<String>,
    pub progress_note: Option<String>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbKarte {
    pub id: Option<i64>,
    pub player_id: Option<i64>,
    pub player_name: Option<String>,
    pub date: Option<String>,
    pub trainer_note: Option<String>,
    pub time_loss_category: Option<String>,
    pub diagnosis_flag: Option<bool>,
    pub subjective: Option<String>,
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
    pub activity: Option<String>,
    pub timing: Option<String>,
    pub age: Option<String>,
    pub status: Option<String>,
    pub mechanism: Option<String>,
    pub injury_type: Option<String>,
    pub injury_site: Option<String>,
    pub position: Option<String>,
    pub onset_style: Option<String>,
    pub report_flag: Option<bool>,
    pub injury_name: Option<String>,
    pub participation_status: Option<String>,
    pub return_est: Option<String>,
    pub progress_note: Option<String>,
}

impl From<DbKarte> for Karte {
    fn from(db: DbKarte) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            player_id: db.player_id,
            player_name: db.player_name,
            date: db.date.unwrap_or_default(),
            trainer_note: db.trainer_note,
            time_loss_category: db.time_loss_category,
            diagnosis_flag: db.diagnosis_flag.unwrap_or_default(),
            subjective: db.subjective,
            objective: db.objective,
            assessment: db.assessment,
            plan: db.plan,
            activity: db.activity,
            timing: db.timing,
            age: db.age,
            status: db.status,
            mechanism: db.mechanism,
            injury_type: db.injury_type,
            injury_site: db.injury_site,
            position: db.position,
            onset_style: db.onset_style,
            report_flag: db.report_flag.unwrap_or_default(),
            injury_name: db.injury_name,
            participation_status: db.participation_status,
            return_est: db.return_est,
            progress_note: db.progress_note,
        }
    }
}

/// Search-result row. Deliberately thin: of the SOAP text only the
/// assessment travels with the list, the rest needs a by-id fetch.
#[derive(Serialize, Clone)]
pub struct KarteListRow {
    pub id: i64,
    pub date: String,
    pub player_name: Option<String>,
    pub trainer_note: Option<String>,
    pub assessment: Option<String>,
    pub time_loss_category: Option<String>,
    pub diagnosis_flag: bool,
    pub report_flag: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbKarteListRow {
    pub id: Option<i64>,
    pub date: Option<String>,
    pub player_name: Option<String>,
    pub trainer_note: Option<String>,
    pub assessment: Option<String>,
    pub time_loss_category: Option<String>,
    pub diagnosis_flag: Option<bool>,
    pub report_flag: Option<bool>,
}

impl From<DbKarteListRow> for KarteListRow {
    fn from(db: DbKarteListRow) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            date: db.date.unwrap_or_default(),
            player_name: db.player_name,
            trainer_note: db.trainer_note,
            assessment: db.assessment,
            time_loss_category: db.time_loss_category,
            diagnosis_flag: db.diagnosis_flag.unwrap_or_default(),
            report_flag: db.report_flag.unwrap_or_default(),
        }
    }
}

/// Write payload for karte create/update. Updates replace the whole row,
/// so the same struct serves both paths.
#[derive(Deserialize, Validate, Clone, Default, Debug)]
pub struct KarteForm {
    pub player_id: Option<i64>,
    #[validate(length(min = 1, message = "date is required"))]
    pub date: String,
    pub trainer_note: Option<String>,
    pub time_loss_category: Option<String>,
    #[serde(default)]
    pub diagnosis_flag: bool,
    pub subjective: Option<String>,
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
    pub activity: Option<String>,
    pub timing: Option<String>,
    pub age: Option<String>,
    pub status: Option<String>,
    pub mechanism: Option<String>,
    pub injury_type: Option<String>,
    pub injury_site: Option<String>,
    pub position: Option<String>,
    pub onset_style: Option<String>,
    #[serde(default)]
    pub report_flag: bool,
    pub injury_name: Option<String>,
    pub participation_status: Option<String>,
    pub return_est: Option<String>,
    pub progress_note: Option<String>,
}

/// Karte search filters. Absent or empty values impose no constraint;
/// an unparseable player_id falls back to None for the same reason.
#[derive(FromForm, Default, Debug, Clone)]
pub struct KarteFilter {
    pub player_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub keyword: Option<String>,
    pub time_loss_category: Option<String>,
}

#[derive(Serialize, Clone)]
pub struct CategoryCount {
    pub time_loss_category: String,
    pub count: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbCategoryCount {
    pub time_loss_category: Option<String>,
    pub count: Option<i64>,
}

impl From<DbCategoryCount> for CategoryCount {
    fn from(db: DbCategoryCount) -> Self {
        Self {
            time_loss_category: db.time_loss_category.unwrap_or_default(),
            count: db.count.unwrap_or_default(),
        }
    }
}

/// One aggregated injury-report row: (category, site, type) -> count.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct InjuryReportRow {
    pub time_loss_category: String,
    pub injury_site: String,
    pub injury_type: Option<String>,
    pub count: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbInjuryReportRow {
    pub time_loss_category: Option<String>,
    pub injury_site: Option<String>,
    pub injury_type: Option<String>,
    pub count: Option<i64>,
}

impl From<DbInjuryReportRow> for InjuryReportRow {
    fn from(db: DbInjuryReportRow) -> Self {
        Self {
            time_loss_category: db.time_loss_category.unwrap_or_default(),
            injury_site: db.injury_site.unwrap_or_default(),
            injury_type: db.injury_type,
            count: db.count.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SiteCount {
    pub injury_site: String,
    pub count: i64,
}

#[derive(Serialize, Clone)]
pub struct CategoryGroup {
    pub time_loss_category: String,
    pub rows: Vec<InjuryReportRow>,
}

/// One line of the coach board. `elapsed_days` starts out as "-" and is
/// filled in when a preceding NEW/RE-INJURY entry exists for the player.
#[derive(Serialize, Clone, Debug)]
pub struct CoachReport {
    pub karte_id: i64,
    pub player_id: Option<i64>,
    pub player_name: Option<String>,
    pub date: String,
    pub injury_name: Option<String>,
    pub participation_status: Option<String>,
    pub return_est: Option<String>,
    pub progress_note: Option<String>,
    pub time_loss_category: Option<String>,
    pub elapsed_days: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbCoachReport {
    pub karte_id: Option<i64>,
    pub player_id: Option<i64>,
    pub player_name: Option<String>,
    pub date: Option<String>,
    pub injury_name: Option<String>,
    pub participation_status: Option<String>,
    pub return_est: Option<String>,
    pub progress_note: Option<String>,
    pub time_loss_category: Option<String>,
}

impl From<DbCoachReport> for CoachReport {
    fn from(db: DbCoachReport) -> Self {
        Self {
            karte_id: db.karte_id.unwrap_or_default(),
            player_id: db.player_id,
            player_name: db.player_name,
            date: db.date.unwrap_or_default(),
            injury_name: db.injury_name,
            participation_status: db.participation_status,
            return_est: db.return_est,
            progress_note: db.progress_note,
            time_loss_category: db.time_loss_category,
            elapsed_days: "-".to_string(),
        }
    }
}

#[derive(Serialize, Clone)]
pub struct KarteHistoryRow {
    pub date: String,
    pub injury_site: Option<String>,
    pub injury_type: Option<String>,
    pub assessment: Option<String>,
    pub time_loss_category: Option<String>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbKarteHistoryRow {
    pub date: Option<String>,
    pub injury_site: Option<String>,
    pub injury_type: Option<String>,
    pub assessment: Option<String>,
    pub time_loss_category: Option<String>,
}

impl From<DbKarteHistoryRow> for KarteHistoryRow {
    fn from(db: DbKarteHistoryRow) -> Self {
        Self {
            date: db.date.unwrap_or_default(),
            injury_site: db.injury_site,
            injury_type: db.injury_type,
            assessment: db.assessment,
            time_loss_category: db.time_loss_category,
        }
    }
}

#[derive(Serialize, Clone)]
pub struct PlayerSummary {
    pub total_kartes: i64,
    pub time_loss_count: i64,
    pub return_to_play_count: i64,
    pub history: Vec<KarteHistoryRow>,
}
