use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Display;

use chrono::{Local, NaiveDate, TimeZone};
use uuid::Uuid;

use crate::app::errors::CrmError;
use crate::domain::{Lead, Note, Profile};

/// Column delimiter, fixed for every export
pub const DELIMITER: char = ';';

/// Joins the notes of one lead inside the notes cell
pub const NOTE_SEPARATOR: &str = " | ";

/// Header row
pub const HEADERS: [&str; 12] = [
    "ID",
    "İsim",
    "Dil",
    "Telefon",
    "Kaynak",
    "Oluşturulma Tarihi",
    "Güncelleme Tarihi",
    "Durum",
    "Aşama",
    "Lead Sahibi",
    "Teklif",
    "Notlar",
];

/// Quotes a cell if it holds a delimiter, a quote or a line break
///
/// Inner quotes are doubled. Commas are quoted as well so the file stays
/// readable by comma-configured spreadsheets.
pub fn escape_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['"', ',', DELIMITER, '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Name of the downloaded file, stamped with the export date
pub fn export_file_name(date: NaiveDate) -> String {
    format!("leads_{}.csv", date.format("%Y-%m-%d"))
}

/// Encodes the visible leads, formatting note times in the local timezone
pub fn export_csv(
    visible: &[&Lead],
    profiles: &[Profile],
    notes: &[Note],
) -> Result<Vec<u8>, CrmError> {
    export_csv_in(visible, profiles, notes, &Local)
}

/// Encodes the visible leads, formatting note times in `tz`
///
/// # Returns
/// * `Ok(Vec<u8>)` - UTF-8 text: one header row plus one row per lead
/// * `Err(CrmError::EmptyResult)` - If there is nothing to export
pub fn export_csv_in<Tz>(
    visible: &[&Lead],
    profiles: &[Profile],
    notes: &[Note],
    tz: &Tz,
) -> Result<Vec<u8>, CrmError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if visible.is_empty() {
        return Err(CrmError::EmptyResult);
    }

    let owners: HashMap<Uuid, &str> = profiles
        .iter()
        .map(|profile| (profile.id, profile.username.as_str()))
        .collect();

    let mut notes_by_lead: HashMap<Uuid, Vec<&Note>> = HashMap::new();
    for note in notes {
        notes_by_lead.entry(note.lead_id()).or_default().push(note);
    }

    let mut lines = Vec::with_capacity(visible.len() + 1);
    lines.push(join_row(HEADERS.iter().map(|title| title.to_string())));

    for lead in visible {
        let history = notes_by_lead
            .get_mut(&lead.id())
            .map(|lead_notes| {
                lead_notes.sort_by(|a, b| {
                    b.created_at().as_datetime().cmp(&a.created_at().as_datetime())
                });
                lead_notes
                    .iter()
                    .map(|note| format!("{} - {}", note.created_at().display_in(tz), note.text()))
                    .collect::<Vec<_>>()
                    .join(NOTE_SEPARATOR)
            })
            .unwrap_or_default();

        let owner = lead
            .owner_id()
            .and_then(|id| owners.get(&id))
            .copied()
            .unwrap_or_default();

        lines.push(join_row([
            lead.id().to_string(),
            lead.name().to_string(),
            lead.language().map(|l| l.to_string()).unwrap_or_default(),
            lead.phone().to_string(),
            lead.source().map(|s| s.to_string()).unwrap_or_default(),
            lead.created_at().to_string(),
            lead.updated_at().to_string(),
            lead.status().to_string(),
            lead.stage().map(|s| s.to_string()).unwrap_or_default(),
            owner.to_string(),
            lead.quote().unwrap_or_default().to_string(),
            history,
        ]));
    }

    tracing::debug!(rows = visible.len(), "encoded lead export");
    Ok(lines.join("\n").into_bytes())
}

fn join_row(cells: impl IntoIterator<Item = String>) -> String {
    cells
        .into_iter()
        .map(|cell| escape_cell(&cell).into_owned())
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}
