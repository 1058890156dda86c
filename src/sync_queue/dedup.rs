//! Dedup key construction.

use chrono::{DateTime, Utc};

use super::SyncType;

/// Segment used in place of a case id for tenant/global-scope jobs.
pub const GLOBAL_SCOPE: &str = "global";

/// Truncation unit for the dedup time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketGranularity {
    /// UTC calendar date, `YYYYMMDD`
    Day,
    /// UTC date and hour, `YYYYMMDDHH`
    Hour,
}

impl BucketGranularity {
    /// Render the bucket containing `at`.
    pub fn bucket(&self, at: DateTime<Utc>) -> String {
        match self {
            BucketGranularity::Day => at.format("%Y%m%d").to_string(),
            BucketGranularity::Hour => at.format("%Y%m%d%H").to_string(),
        }
    }
}

/// Build `"{sync_type}:{case_id or 'global'}:{bucket}"`.
///
/// Pure function of its inputs; requests that map to the same key belong to the
/// same scheduling window and collapse to one queued job.
pub fn build_dedup_key(
    sync_type: SyncType,
    case_id: Option<&str>,
    scheduled_at: DateTime<Utc>,
) -> String {
    let bucket = sync_type.bucket_granularity().bucket(scheduled_at);
    format!(
        "{}:{}:{}",
        sync_type.as_str(),
        case_id.unwrap_or(GLOBAL_SCOPE),
        bucket
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn same_inputs_give_same_key() {
        let scheduled_at = at("2025-06-30T08:45:12Z");
        let first = build_dedup_key(SyncType::Progress, Some("case-1"), scheduled_at);
        let second = build_dedup_key(SyncType::Progress, Some("case-1"), scheduled_at);
        assert_eq!(first, second);
    }

    #[test]
    fn general_sync_buckets_by_day() {
        let early = build_dedup_key(SyncType::General, Some("c"), at("2025-01-15T01:00:00Z"));
        let late = build_dedup_key(SyncType::General, Some("c"), at("2025-01-15T23:00:00Z"));
        assert_eq!(early, late);
        assert_eq!(early, "general:c:20250115");
    }

    #[test]
    fn full_sync_buckets_by_hour() {
        let early = build_dedup_key(SyncType::Full, Some("c"), at("2025-01-15T01:00:00Z"));
        let late = build_dedup_key(SyncType::Full, Some("c"), at("2025-01-15T23:00:00Z"));
        assert_ne!(early, late);
    }

    #[test]
    fn session_renewal_buckets_by_day() {
        let key = build_dedup_key(
            SyncType::WmonidRenewal,
            Some("session-9"),
            at("2025-02-01T17:30:00Z"),
        );
        assert_eq!(key, "wmonid_renewal:session-9:20250201");
    }

    #[test]
    fn missing_case_uses_global_segment() {
        let key = build_dedup_key(SyncType::Progress, None, at("2025-01-15T01:00:00Z"));
        assert_eq!(key, "progress:global:2025011501");
        assert_eq!(key.split(':').nth(1), Some(GLOBAL_SCOPE));
    }

    #[test]
    fn manual_full_refresh_scenario() {
        let first = build_dedup_key(SyncType::Full, Some("case-A"), at("2025-03-01T10:15:00Z"));
        let second = build_dedup_key(SyncType::Full, Some("case-A"), at("2025-03-01T10:59:00Z"));
        let third = build_dedup_key(SyncType::Full, Some("case-A"), at("2025-03-01T11:01:00Z"));

        assert_eq!(first, "full:case-A:2025030110");
        assert_eq!(second, first);
        assert_eq!(third, "full:case-A:2025030111");
    }

    #[test]
    fn bucket_is_computed_in_utc() {
        // 2025-01-15 08:30 in Seoul is 2025-01-14 23:30 UTC
        let seoul = FixedOffset::east_opt(9 * 3600).unwrap();
        let local = seoul.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap();
        let key = build_dedup_key(SyncType::General, Some("c"), local.with_timezone(&Utc));
        assert_eq!(key, "general:c:20250114");
    }
}
