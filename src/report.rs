//! Pure report computations: injury-site ranking, category grouping, and
//! the coach-board ordering with its elapsed-days annotation. Everything
//! here is plain data in, plain data out; the store queries live in `db`.

use chrono::NaiveDate;

use crate::models::{CategoryGroup, CoachReport, InjuryReportRow, SiteCount};
use crate::options;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Clinical display priority: worst availability first. Unknown or missing
/// statuses sink to the bottom rather than erroring.
pub fn participation_priority(status: Option<&str>) -> u8 {
    match status {
        Some(options::STATUS_OUT) => 1,
        Some(options::STATUS_GTD) => 2,
        Some(options::STATUS_RESTRICTION) => 3,
        Some(options::STATUS_IN) => 4,
        _ => 99,
    }
}

/// Orders the board by participation priority. The sort is stable, so rows
/// sharing a status keep the order the store returned them in.
pub fn rank_reports(reports: &mut [CoachReport]) {
    reports.sort_by_key(|report| participation_priority(report.participation_status.as_deref()));
}

/// "Day 14 (W3D0)": days since injury, with a 1-indexed week and 0-indexed
/// day-within-week. None when either date fails to parse.
pub fn elapsed_days_label(injury_date: &str, report_date: &str) -> Option<String> {
    let injury = NaiveDate::parse_from_str(injury_date, DATE_FORMAT).ok()?;
    let current = NaiveDate::parse_from_str(report_date, DATE_FORMAT).ok()?;
    let diff = (current - injury).num_days();
    Some(format!("Day {} (W{}D{})", diff, diff / 7 + 1, diff % 7))
}

/// Per-site totals, descending by count. Ties keep first-seen order. Rows
/// with an empty site are skipped outright, never bucketed under "unknown".
pub fn summarize_sites(rows: &[InjuryReportRow]) -> Vec<SiteCount> {
    let mut totals: Vec<SiteCount> = Vec::new();

    for row in rows {
        if row.injury_site.is_empty() {
            continue;
        }
        match totals.iter_mut().find(|t| t.injury_site == row.injury_site) {
            Some(total) => total.count += row.count,
            None => totals.push(SiteCount {
                injury_site: row.injury_site.clone(),
                count: row.count,
            }),
        }
    }

    totals.sort_by(|a, b| b.count.cmp(&a.count));
    totals
}

/// Buckets report rows by time-loss category. Group order is first-seen,
/// row order within a group is the query-result order.
pub fn group_by_category(rows: &[InjuryReportRow]) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();

    for row in rows {
        match groups
            .iter_mut()
            .find(|g| g.time_loss_category == row.time_loss_category)
        {
            Some(group) => group.rows.push(row.clone()),
            None => groups.push(CategoryGroup {
                time_loss_category: row.time_loss_category.clone(),
                rows: vec![row.clone()],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_row(category: &str, site: &str, count: i64) -> InjuryReportRow {
        InjuryReportRow {
            time_loss_category: category.to_string(),
            injury_site: site.to_string(),
            injury_type: Some("骨折".to_string()),
            count,
        }
    }

    fn board_row(player: &str, status: Option<&str>) -> CoachReport {
        CoachReport {
            karte_id: 0,
            player_id: Some(1),
            player_name: Some(player.to_string()),
            date: "2024-05-01".to_string(),
            injury_name: None,
            participation_status: status.map(String::from),
            return_est: None,
            progress_note: None,
            time_loss_category: None,
            elapsed_days: "-".to_string(),
        }
    }

    #[test]
    fn priority_follows_clinical_order() {
        assert_eq!(participation_priority(Some("OUT")), 1);
        assert_eq!(participation_priority(Some("GTD")), 2);
        assert_eq!(participation_priority(Some("RESTRICTION")), 3);
        assert_eq!(participation_priority(Some("IN")), 4);
        assert_eq!(participation_priority(Some("SOMETHING ELSE")), 99);
        assert_eq!(participation_priority(None), 99);
    }

    #[test]
    fn ranking_is_stable_for_equal_statuses() {
        let mut reports = vec![
            board_row("first_in", Some("IN")),
            board_row("out", Some("OUT")),
            board_row("restriction", Some("RESTRICTION")),
            board_row("gtd", Some("GTD")),
            board_row("second_in", Some("IN")),
        ];

        rank_reports(&mut reports);

        let order: Vec<&str> = reports
            .iter()
            .map(|r| r.player_name.as_deref().unwrap())
            .collect();
        assert_eq!(
            order,
            vec!["out", "gtd", "restriction", "first_in", "second_in"]
        );
    }

    #[test]
    fn unknown_status_sorts_last() {
        let mut reports = vec![
            board_row("mystery", Some("MAYBE")),
            board_row("missing", None),
            board_row("playing", Some("IN")),
        ];

        rank_reports(&mut reports);

        assert_eq!(reports[0].player_name.as_deref(), Some("playing"));
    }

    #[test]
    fn elapsed_label_two_weeks() {
        assert_eq!(
            elapsed_days_label("2024-01-01", "2024-01-15").as_deref(),
            Some("Day 14 (W3D0)")
        );
    }

    #[test]
    fn elapsed_label_same_day() {
        assert_eq!(
            elapsed_days_label("2024-01-01", "2024-01-01").as_deref(),
            Some("Day 0 (W1D0)")
        );
    }

    #[test]
    fn elapsed_label_mid_week() {
        assert_eq!(
            elapsed_days_label("2024-03-10", "2024-03-20").as_deref(),
            Some("Day 10 (W2D3)")
        );
    }

    #[test]
    fn elapsed_label_rejects_malformed_dates() {
        assert_eq!(elapsed_days_label("not-a-date", "2024-01-15"), None);
        assert_eq!(elapsed_days_label("2024-01-01", ""), None);
    }

    #[test]
    fn site_totals_sum_and_sort_descending() {
        let rows = vec![
            report_row("TIME LOSS", "膝", 2),
            report_row("NEW/RE-INJURY", "足関節", 4),
            report_row("RETURN TO PLAY", "膝", 3),
        ];

        let sites = summarize_sites(&rows);

        assert_eq!(
            sites,
            vec![
                SiteCount {
                    injury_site: "膝".to_string(),
                    count: 5
                },
                SiteCount {
                    injury_site: "足関節".to_string(),
                    count: 4
                },
            ]
        );
    }

    #[test]
    fn empty_sites_are_excluded_not_bucketed() {
        let rows = vec![
            report_row("TIME LOSS", "", 7),
            report_row("TIME LOSS", "肩", 1),
        ];

        let sites = summarize_sites(&rows);

        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].injury_site, "肩");
        let total: i64 = sites.iter().map(|s| s.count).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn site_ties_keep_first_seen_order() {
        let rows = vec![
            report_row("TIME LOSS", "肩", 2),
            report_row("TIME LOSS", "肘", 2),
        ];

        let sites = summarize_sites(&rows);

        assert_eq!(sites[0].injury_site, "肩");
        assert_eq!(sites[1].injury_site, "肘");
    }

    #[test]
    fn grouping_preserves_row_and_group_order() {
        let rows = vec![
            report_row("TIME LOSS", "膝", 1),
            report_row("NEW/RE-INJURY", "肩", 2),
            report_row("TIME LOSS", "肘", 3),
        ];

        let groups = group_by_category(&rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].time_loss_category, "TIME LOSS");
        assert_eq!(groups[0].rows.len(), 2);
        assert_eq!(groups[0].rows[1].injury_site, "肘");
        assert_eq!(groups[1].time_loss_category, "NEW/RE-INJURY");
        assert_eq!(groups[1].rows.len(), 1);
    }
}
