//! Attendee roster CSV parsing.
//!
//! Expected columns, in order: first_name, last_name, email, company_name,
//! title, table_no, role. The header row is skipped. Short rows are padded
//! with empty fields rather than rejected; `table_no` parses leniently.

use crate::models::attendee::NewAttendee;

#[derive(Debug, Clone)]
pub struct AttendeeCsvRow {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company_name: String,
    pub title: String,
    pub table_no: i32,
    pub role: String,
}

impl AttendeeCsvRow {
    /// Converts the row into insertable attendee data for an event.
    pub fn into_new_attendee(self, event_id: i32, qr_code: String) -> NewAttendee {
        NewAttendee {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            event_id,
            qr_code,
            company_name: self.company_name,
            title: self.title,
            table_no: self.table_no,
            role: self.role,
            attendance: false,
        }
    }
}

pub fn parse_attendee_rows(data: &[u8]) -> Result<Vec<AttendeeCsvRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
        rows.push(AttendeeCsvRow {
            first_name: field(0),
            last_name: field(1),
            email: field(2),
            company_name: field(3),
            title: field(4),
            table_no: parse_table_no(record.get(5).unwrap_or("")),
            role: field(6),
        });
    }
    Ok(rows)
}

/// Table numbers in uploaded rosters are frequently blank or free-text;
/// anything that is not a plain integer becomes 0, never an error.
pub fn parse_table_no(value: &str) -> i32 {
    value.trim().parse().unwrap_or(0)
}
