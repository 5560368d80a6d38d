use chrono::{NaiveDate, TimeZone};
use uuid::Uuid;

use crate::domain::{Lead, LeadSource, LeadStatus};
use crate::query::{compute_visible_leads, visible_leads_in, BulkSelection, DateRange, LeadFilters, QuickRange};

/// Filter state and bulk selection of the lead list
///
/// Every filter change clears the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadView {
    filters: LeadFilters,
    selection: BulkSelection,
}

impl LeadView {
    pub fn filters(&self) -> &LeadFilters {
        &self.filters
    }

    pub fn selection(&self) -> &BulkSelection {
        &self.selection
    }

    /// Replaces the whole filter set
    pub fn set_filters(&mut self, filters: LeadFilters) {
        self.filters = filters;
        self.selection.clear();
    }

    pub fn set_status(&mut self, status: Option<LeadStatus>) {
        self.filters.status = status;
        self.selection.clear();
    }

    pub fn set_owner(&mut self, owner_id: Option<Uuid>) {
        self.filters.owner_id = owner_id;
        self.selection.clear();
    }

    pub fn set_source(&mut self, source: Option<LeadSource>) {
        self.filters.source = source;
        self.selection.clear();
    }

    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.apply_range(DateRange { from, to });
    }

    pub fn apply_range(&mut self, range: DateRange) {
        self.filters.from_date = range.from;
        self.filters.to_date = range.to;
        self.selection.clear();
    }

    /// Applies a quick range on the viewer's local calendar
    pub fn apply_quick_range(&mut self, range: QuickRange) {
        self.apply_range(range.range_now());
    }

    /// Status shortcut: sets the status, or clears it when already active
    pub fn toggle_status(&mut self, status: LeadStatus) {
        self.filters.toggle_status(status);
        self.selection.clear();
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(LeadFilters::default());
    }

    pub fn toggle_selected(&mut self, lead_id: Uuid) {
        self.selection.toggle(lead_id);
    }

    /// Selects every visible lead, or none if all already are
    pub fn toggle_all(&mut self, visible: &[&Lead]) {
        self.selection.toggle_all(visible);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Drops filters and selection together
    pub fn reset(&mut self) {
        *self = LeadView::default();
    }

    /// Leads passing the current filters, on the local calendar
    pub fn visible<'a>(&self, leads: &'a [Lead]) -> Vec<&'a Lead> {
        compute_visible_leads(leads, &self.filters)
    }

    pub fn visible_in<'a, Tz: TimeZone>(&self, leads: &'a [Lead], tz: &Tz) -> Vec<&'a Lead> {
        visible_leads_in(leads, &self.filters, tz)
    }
}
