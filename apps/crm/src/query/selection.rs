use uuid::Uuid;

use crate::domain::lead::Lead;

/// Leads ticked for a bulk action
///
/// Kept in tick order. The view clears it whenever a filter changes so a
/// bulk action never reaches a lead the user can no longer see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSelection {
    ids: Vec<Uuid>,
}

impl BulkSelection {
    /// Ticks or unticks one lead
    pub fn toggle(&mut self, id: Uuid) {
        if let Some(pos) = self.ids.iter().position(|selected| *selected == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id);
        }
    }

    /// Selects every visible lead, or clears the selection if all of them
    /// already are
    pub fn toggle_all(&mut self, visible: &[&Lead]) {
        if self.covers(visible) {
            self.ids.clear();
        } else {
            self.ids = visible.iter().map(|lead| lead.id()).collect();
        }
    }

    /// Returns true if `visible` is non-empty and fully selected
    pub fn covers(&self, visible: &[&Lead]) -> bool {
        !visible.is_empty()
            && self.ids.len() == visible.len()
            && visible.iter().all(|lead| self.contains(lead.id()))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
