use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use uuid::Uuid;

use crate::domain::lead::{Lead, LeadSource, LeadStatus};
use crate::domain::Timestamp;

/// Active filter state of the lead list
///
/// Every set dimension must match (AND). An unset dimension passes
/// everything. Date bounds are calendar days in the viewer's timezone and
/// are inclusive on both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilters {
    pub status: Option<LeadStatus>,
    pub owner_id: Option<Uuid>,
    pub source: Option<LeadSource>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl LeadFilters {
    /// Returns true if no dimension is set
    pub fn is_empty(&self) -> bool {
        *self == LeadFilters::default()
    }

    /// Sets `status`, or clears it if it is already the active one
    pub fn toggle_status(&mut self, status: LeadStatus) {
        self.status = if self.status == Some(status) {
            None
        } else {
            Some(status)
        };
    }

    /// Checks a single lead against every set dimension
    pub fn matches_in<Tz: TimeZone>(&self, lead: &Lead, tz: &Tz) -> bool {
        if self.status.is_some_and(|status| lead.status() != status) {
            return false;
        }
        if self.owner_id.is_some() && lead.owner_id() != self.owner_id {
            return false;
        }
        if self.source.is_some() && lead.source() != self.source {
            return false;
        }
        within_days(lead.created_at(), self.from_date, self.to_date, tz)
    }
}

/// Date-range check on a creation timestamp
///
/// A timestamp that failed to parse is never excluded: hiding a corrupt
/// record would make it unreachable from the list.
fn within_days<Tz: TimeZone>(
    created_at: &Timestamp,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    tz: &Tz,
) -> bool {
    let Some(at) = created_at.as_datetime() else {
        return true;
    };
    let local = at.with_timezone(tz).naive_local();

    if let Some(from) = from {
        if local < from.and_time(NaiveTime::MIN) {
            return false;
        }
    }
    if let Some(end) = to.and_then(|to| to.and_hms_milli_opt(23, 59, 59, 999)) {
        if local > end {
            return false;
        }
    }
    true
}

/// Computes the visible subset of `leads` in the viewer's local timezone
///
/// Order is inherited from `leads`; nothing is re-sorted.
pub fn compute_visible_leads<'a>(leads: &'a [Lead], filters: &LeadFilters) -> Vec<&'a Lead> {
    visible_leads_in(leads, filters, &Local)
}

/// Computes the visible subset of `leads`, reading calendar days in `tz`
pub fn visible_leads_in<'a, Tz: TimeZone>(
    leads: &'a [Lead],
    filters: &LeadFilters,
    tz: &Tz,
) -> Vec<&'a Lead> {
    leads
        .iter()
        .filter(|lead| filters.matches_in(lead, tz))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lead::Phone;
    use chrono::{DateTime, FixedOffset, Utc};

    fn istanbul() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn lead_at(
        status: LeadStatus,
        source: Option<LeadSource>,
        owner: Option<Uuid>,
        created_at: Timestamp,
    ) -> Lead {
        Lead::from_persistence(
            Uuid::new_v4(),
            "Lead".to_string(),
            Phone::from_persistence(Uuid::new_v4().to_string()),
            None,
            source,
            status,
            None,
            None,
            owner,
            created_at.clone(),
            created_at,
        )
    }

    fn at(rfc3339: &str) -> Timestamp {
        Timestamp::from(DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc))
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_filters_pass_everything_in_order() {
        let leads = vec![
            lead_at(LeadStatus::New, None, None, at("2024-01-03T10:00:00Z")),
            lead_at(LeadStatus::Hot, None, None, at("2024-01-02T10:00:00Z")),
            lead_at(LeadStatus::Sale, None, None, at("2024-01-01T10:00:00Z")),
        ];

        let visible = visible_leads_in(&leads, &LeadFilters::default(), &istanbul());
        let ids: Vec<Uuid> = visible.iter().map(|l| l.id()).collect();
        let expected: Vec<Uuid> = leads.iter().map(|l| l.id()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn dimensions_combine_with_and() {
        let owner = Uuid::new_v4();
        let leads = vec![
            lead_at(LeadStatus::Hot, Some(LeadSource::Referral), Some(owner), at("2024-01-01T10:00:00Z")),
            lead_at(LeadStatus::Hot, Some(LeadSource::DirectCall), Some(owner), at("2024-01-01T10:00:00Z")),
            lead_at(LeadStatus::New, Some(LeadSource::Referral), Some(owner), at("2024-01-01T10:00:00Z")),
            lead_at(LeadStatus::Hot, Some(LeadSource::Referral), None, at("2024-01-01T10:00:00Z")),
        ];
        let filters = LeadFilters {
            status: Some(LeadStatus::Hot),
            owner_id: Some(owner),
            source: Some(LeadSource::Referral),
            ..Default::default()
        };

        let visible = visible_leads_in(&leads, &filters, &istanbul());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id(), leads[0].id());
    }

    #[test]
    fn single_day_range_is_inclusive_of_whole_local_day() {
        let leads = vec![
            // 00:00:00 local on Jan 1
            lead_at(LeadStatus::Hot, None, None, at("2023-12-31T21:00:00Z")),
            // 23:59:59.999 local on Jan 1
            lead_at(LeadStatus::Hot, None, None, at("2024-01-01T20:59:59.999Z")),
            // one millisecond before Jan 1 local
            lead_at(LeadStatus::Hot, None, None, at("2023-12-31T20:59:59.999Z")),
            // first instant of Jan 2 local
            lead_at(LeadStatus::Hot, None, None, at("2024-01-01T21:00:00Z")),
        ];
        let filters = LeadFilters {
            from_date: Some(day(2024, 1, 1)),
            to_date: Some(day(2024, 1, 1)),
            ..Default::default()
        };

        let visible = visible_leads_in(&leads, &filters, &istanbul());
        let ids: Vec<Uuid> = visible.iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec![leads[0].id(), leads[1].id()]);
    }

    #[test]
    fn bounds_are_independent() {
        let leads = vec![
            lead_at(LeadStatus::New, None, None, at("2024-03-10T09:00:00Z")),
            lead_at(LeadStatus::New, None, None, at("2024-01-10T09:00:00Z")),
        ];

        let from_only = LeadFilters {
            from_date: Some(day(2024, 2, 1)),
            ..Default::default()
        };
        assert_eq!(visible_leads_in(&leads, &from_only, &istanbul()).len(), 1);

        let to_only = LeadFilters {
            to_date: Some(day(2024, 2, 1)),
            ..Default::default()
        };
        let visible = visible_leads_in(&leads, &to_only, &istanbul());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id(), leads[1].id());
    }

    #[test]
    fn malformed_created_at_is_not_excluded_by_dates() {
        let leads = vec![lead_at(
            LeadStatus::Hot,
            None,
            None,
            Timestamp::Malformed("garbage".to_string()),
        )];
        let filters = LeadFilters {
            from_date: Some(day(2024, 1, 1)),
            to_date: Some(day(2024, 1, 1)),
            ..Default::default()
        };
        assert_eq!(visible_leads_in(&leads, &filters, &istanbul()).len(), 1);

        let other_status = LeadFilters {
            status: Some(LeadStatus::Sale),
            ..filters
        };
        assert!(visible_leads_in(&leads, &other_status, &istanbul()).is_empty());
    }

    #[test]
    fn removing_a_filter_never_shrinks_the_view() {
        let owner = Uuid::new_v4();
        let leads = vec![
            lead_at(LeadStatus::Hot, Some(LeadSource::FacebookAd), Some(owner), at("2024-01-01T10:00:00Z")),
            lead_at(LeadStatus::Hot, Some(LeadSource::OldData), None, at("2024-02-01T10:00:00Z")),
            lead_at(LeadStatus::New, Some(LeadSource::FacebookAd), Some(owner), at("2024-01-05T10:00:00Z")),
            lead_at(LeadStatus::Sale, None, Some(owner), Timestamp::Malformed("x".into())),
        ];
        let full = LeadFilters {
            status: Some(LeadStatus::Hot),
            owner_id: Some(owner),
            source: Some(LeadSource::FacebookAd),
            from_date: Some(day(2024, 1, 1)),
            to_date: Some(day(2024, 1, 31)),
        };
        let base = visible_leads_in(&leads, &full, &istanbul()).len();

        let relaxed = [
            LeadFilters { status: None, ..full.clone() },
            LeadFilters { owner_id: None, ..full.clone() },
            LeadFilters { source: None, ..full.clone() },
            LeadFilters { from_date: None, ..full.clone() },
            LeadFilters { to_date: None, ..full.clone() },
        ];
        for filters in relaxed {
            assert!(visible_leads_in(&leads, &filters, &istanbul()).len() >= base);
        }
    }

    #[test]
    fn toggle_status_sets_then_clears() {
        let mut filters = LeadFilters::default();
        filters.toggle_status(LeadStatus::Hot);
        assert_eq!(filters.status, Some(LeadStatus::Hot));

        filters.toggle_status(LeadStatus::Sale);
        assert_eq!(filters.status, Some(LeadStatus::Sale));

        filters.toggle_status(LeadStatus::Sale);
        assert!(filters.is_empty());
    }
}
