// Export encoder
// Serializes the filtered lead view to spreadsheet-compatible text

pub mod csv;

pub use csv::{export_csv, export_csv_in, export_file_name};
