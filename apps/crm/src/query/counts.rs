use std::collections::BTreeMap;

use crate::domain::lead::{Lead, LeadStatus};

/// Lead counts per pipeline status
///
/// Base buckets partition the leads: they always sum to the number of
/// leads counted. The "sold" bucket is an overlay on top of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCounts {
    by_status: BTreeMap<LeadStatus, usize>,
    won: usize,
    total: usize,
}

impl StatusCounts {
    /// Returns the count of one status
    pub fn get(&self, status: LeadStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Leads in the won status, shown under [`LeadStatus::WON_ALIAS`]
    pub fn won(&self) -> usize {
        self.won
    }

    /// Number of leads counted
    pub fn total(&self) -> usize {
        self.total
    }

    /// Looks a bucket up by its display label, alias included
    pub fn by_label(&self, label: &str) -> Option<usize> {
        if label == LeadStatus::WON_ALIAS {
            return Some(self.won);
        }
        label.parse::<LeadStatus>().ok().map(|status| self.get(status))
    }

    /// Iterates the base buckets in display order
    pub fn iter(&self) -> impl Iterator<Item = (LeadStatus, usize)> + '_ {
        self.by_status.iter().map(|(status, count)| (*status, *count))
    }
}

/// Counts leads per status
///
/// Every status starts at zero so empty columns still show up.
pub fn compute_status_counts(leads: &[Lead]) -> StatusCounts {
    let mut by_status: BTreeMap<LeadStatus, usize> =
        LeadStatus::ALL.iter().map(|status| (*status, 0)).collect();
    let mut won = 0;

    for lead in leads {
        *by_status.entry(lead.status()).or_insert(0) += 1;
        if lead.status() == LeadStatus::WON {
            won += 1;
        }
    }

    StatusCounts {
        by_status,
        won,
        total: leads.len(),
    }
}
