//! Plan-based usage quotas
//!
//! FREE accounts get 1 signature per ISO week (Monday start), PREMIUM
//! accounts get 50 per calendar month. The quota is advisory by default:
//! callers surface the numbers but the export itself is never blocked.
//! A config switch turns registration into a hard gate instead.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Subscription plan tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    pub fn max_signatures(self) -> i64 {
        match self {
            Plan::Free => 1,
            Plan::Premium => 50,
        }
    }

    pub fn period(self) -> QuotaPeriod {
        match self {
            Plan::Free => QuotaPeriod::Week,
            Plan::Premium => QuotaPeriod::Month,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "FREE",
            Plan::Premium => "PREMIUM",
        }
    }

    /// Parse the stored plan column. Unknown values fall back to FREE so a
    /// bad row never grants extra quota.
    pub fn from_db(value: &str) -> Self {
        match value {
            "PREMIUM" => Plan::Premium,
            _ => Plan::Free,
        }
    }
}

/// Accounting window attached to a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaPeriod {
    Week,
    Month,
}

/// Quota standing reported to the caller. Field names match the original
/// wire format consumed by the signing UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub can_sign: bool,
    pub remaining: i64,
    pub signatures_count: i64,
    pub max_signatures: i64,
    pub plan: Plan,
    pub period: QuotaPeriod,
}

impl QuotaStatus {
    /// Evaluate standing from a usage count taken over the plan's current
    /// period window.
    pub fn evaluate(plan: Plan, signatures_count: i64) -> Self {
        let max_signatures = plan.max_signatures();
        Self {
            can_sign: signatures_count < max_signatures,
            remaining: (max_signatures - signatures_count).max(0),
            signatures_count,
            max_signatures,
            plan,
            period: plan.period(),
        }
    }
}

/// Half-open accounting window `[start, end)` for the plan at `now`.
///
/// FREE weeks run Monday 00:00 UTC through the following Monday; PREMIUM
/// months run from the first of the calendar month to the first of the
/// next.
pub fn period_window(plan: Plan, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    match plan.period() {
        QuotaPeriod::Week => {
            let monday = today.week(Weekday::Mon).first_day();
            let start = start_of_day(monday);
            (start, start + Duration::days(7))
        }
        QuotaPeriod::Month => {
            let first = today.with_day(1).expect("day 1 is always valid");
            let next = first_of_next_month(first);
            (start_of_day(first), start_of_day(next))
        }
    }
}

/// Period label stored on each usage row: `YYYYMMWW` with the ISO week
/// number, as the original store recorded it.
pub fn week_label(now: DateTime<Utc>) -> String {
    format!(
        "{:04}{:02}{:02}",
        now.year(),
        now.month(),
        now.iso_week().week()
    )
}

/// Month label stored on each usage row: `YYYY-MM`.
pub fn month_label(now: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", now.year(), now.month())
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
}

fn first_of_next_month(first: NaiveDate) -> NaiveDate {
    if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1).expect("january 1 is always valid")
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
            .expect("first of month is always valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn free_week_starts_monday() {
        // 2026-08-27 is a Thursday; its week starts Monday the 24th.
        let (start, end) = period_window(Plan::Free, utc(2026, 8, 27, 15));
        assert_eq!(start, utc(2026, 8, 24, 0));
        assert_eq!(end, utc(2026, 8, 31, 0));
    }

    #[test]
    fn premium_month_spans_calendar_month() {
        let (start, end) = period_window(Plan::Premium, utc(2026, 8, 27, 15));
        assert_eq!(start, utc(2026, 8, 1, 0));
        assert_eq!(end, utc(2026, 9, 1, 0));
    }

    #[test]
    fn premium_december_rolls_into_next_year() {
        let (start, end) = period_window(Plan::Premium, utc(2025, 12, 31, 23));
        assert_eq!(start, utc(2025, 12, 1, 0));
        assert_eq!(end, utc(2026, 1, 1, 0));
    }

    #[test]
    fn evaluate_free_quota() {
        let fresh = QuotaStatus::evaluate(Plan::Free, 0);
        assert!(fresh.can_sign);
        assert_eq!(fresh.remaining, 1);
        assert_eq!(fresh.max_signatures, 1);
        assert_eq!(fresh.period, QuotaPeriod::Week);

        let spent = QuotaStatus::evaluate(Plan::Free, 1);
        assert!(!spent.can_sign);
        assert_eq!(spent.remaining, 0);
    }

    #[test]
    fn evaluate_clamps_negative_remaining() {
        let over = QuotaStatus::evaluate(Plan::Premium, 60);
        assert!(!over.can_sign);
        assert_eq!(over.remaining, 0);
        assert_eq!(over.signatures_count, 60);
    }

    #[test]
    fn labels_match_original_format() {
        let now = utc(2026, 8, 27, 12);
        assert_eq!(week_label(now), "20260835");
        assert_eq!(month_label(now), "2026-08");
    }

    #[test]
    fn status_serializes_with_original_field_names() {
        let status = QuotaStatus::evaluate(Plan::Free, 0);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["canSign"], true);
        assert_eq!(json["maxSignatures"], 1);
        assert_eq!(json["plan"], "FREE");
        assert_eq!(json["period"], "week");
    }
}
