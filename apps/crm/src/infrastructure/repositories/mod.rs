// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod memory;
pub mod postgres_lead_repository;
pub mod postgres_note_repository;
pub mod postgres_profile_repository;

pub use memory::InMemoryStore;
pub use postgres_lead_repository::PostgresLeadRepository;
pub use postgres_note_repository::PostgresNoteRepository;
pub use postgres_profile_repository::PostgresProfileRepository;

use std::str::FromStr;

/// Parses a nullable literal column; blank text counts as unset
///
/// An unrecognised literal is logged and also read as unset, so a legacy
/// value does not cost the row.
fn parse_optional<T>(value: Option<String>) -> Option<T>
where
    T: FromStr<Err = String>,
{
    match value.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(literal) => match literal.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Ignoring unknown literal: {}", e);
                None
            }
        },
    }
}

/// Maps loaded rows onto domain records, skipping the ones that do not fit
///
/// A single corrupt row is logged and left out rather than failing the
/// whole collection.
fn readable_rows<R, T>(rows: Vec<R>, collection: &str) -> Vec<T>
where
    T: TryFrom<R, Error = String>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(collection, "Skipping unreadable row: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lead::{Language, LeadStage};

    #[test]
    fn blank_literal_is_none() {
        assert_eq!(parse_optional::<Language>(None), None);
        assert_eq!(parse_optional::<Language>(Some("  ".into())), None);
    }

    #[test]
    fn known_literal_parses() {
        assert_eq!(parse_optional::<LeadStage>(Some("Çok Pahalı".into())), Some(LeadStage::TooExpensive));
    }

    #[test]
    fn unknown_literal_reads_as_unset() {
        assert_eq!(parse_optional::<Language>(Some("XX".into())), None);
    }

    struct Raw(i32);
    #[derive(Debug, PartialEq)]
    struct Positive(i32);

    impl TryFrom<Raw> for Positive {
        type Error = String;

        fn try_from(raw: Raw) -> Result<Self, Self::Error> {
            if raw.0 > 0 {
                Ok(Positive(raw.0))
            } else {
                Err(format!("{} is not positive", raw.0))
            }
        }
    }

    #[test]
    fn unreadable_rows_are_skipped_in_order() {
        let kept: Vec<Positive> = readable_rows(vec![Raw(3), Raw(-1), Raw(7)], "numbers");
        assert_eq!(kept, vec![Positive(3), Positive(7)]);
    }
}
