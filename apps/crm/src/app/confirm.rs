use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::app::errors::CrmError;

/// Handle for a destructive action awaiting confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfirmationToken(Uuid);

impl ConfirmationToken {
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The effect a token unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    /// Delete a lead together with its notes
    DeleteLead(Uuid),
    /// Delete a profile that owns no leads
    DeleteUser(Uuid),
}

#[derive(Debug, Clone)]
struct Pending {
    action: PendingAction,
    requested_by: Uuid,
    requested_at: DateTime<Utc>,
}

/// Outstanding confirmations of the session
///
/// A token is redeemable once, only by the actor who requested it, and only
/// within the ttl.
#[derive(Debug)]
pub struct ConfirmationLedger {
    ttl: Duration,
    pending: HashMap<ConfirmationToken, Pending>,
}

impl ConfirmationLedger {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: HashMap::new(),
        }
    }

    /// Records a pending action and hands out its token
    pub fn issue(&mut self, actor: Uuid, action: PendingAction, now: DateTime<Utc>) -> ConfirmationToken {
        self.purge_expired(now);

        let token = ConfirmationToken(Uuid::new_v4());
        self.pending.insert(
            token,
            Pending {
                action,
                requested_by: actor,
                requested_at: now,
            },
        );
        token
    }

    /// Redeems a token, removing it from the ledger
    ///
    /// A token presented by another actor stays pending for its owner.
    pub fn redeem(
        &mut self,
        token: ConfirmationToken,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PendingAction, CrmError> {
        self.purge_expired(now);

        match self.pending.get(&token) {
            Some(pending) if pending.requested_by == actor => {}
            _ => return Err(CrmError::InvalidConfirmation),
        }
        self.pending
            .remove(&token)
            .map(|pending| pending.action)
            .ok_or(CrmError::InvalidConfirmation)
    }

    /// Drops a pending action without performing it
    pub fn cancel(&mut self, token: ConfirmationToken, actor: Uuid) -> Result<PendingAction, CrmError> {
        match self.pending.get(&token) {
            Some(pending) if pending.requested_by == actor => self
                .pending
                .remove(&token)
                .map(|pending| pending.action)
                .ok_or(CrmError::InvalidConfirmation),
            _ => Err(CrmError::InvalidConfirmation),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forgets every pending action, used at logout
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.pending.retain(|_, pending| !is_expired(pending.requested_at, now, ttl));
    }
}

fn is_expired(requested_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    // a clock that went backwards never expires a token
    now.signed_duration_since(requested_at)
        .to_std()
        .map(|age| age > ttl)
        .unwrap_or(false)
}
