//! vCard 3.0 records for contact QR codes.
//!
//! Fields are formatted verbatim in the order they are added; nothing is
//! validated or escaped beyond the line breaks inside address labels.
use std::fmt;

use chrono::{DateTime, Utc};

/// Builder for a vCard 3.0 text record.
///
/// # Example
///
/// ```rust
/// use qrsvg::vcard::VCard;
///
/// let mut card = VCard::new("Forest", "Gump");
/// card.add_email("f@example.com");
///
/// let text = card.to_string();
/// assert!(text.starts_with("BEGIN:VCARD\nVERSION:3.0\nN:Gump;Forest"));
/// assert!(text.ends_with("END:VCARD"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VCard {
    fields: Vec<String>,
}

impl VCard {
    pub fn new(name: &str, surname: &str) -> Self {
        Self {
            fields: vec![
                format!("N:{};{}", surname, name),
                format!("FN:{} {}", name, surname),
            ],
        }
    }

    pub fn add_organization(&mut self, organization: &str) -> &mut Self {
        self.push(format!("ORG:{}", organization))
    }

    pub fn add_title(&mut self, title: &str) -> &mut Self {
        self.push(format!("TITLE:{}", title))
    }

    pub fn add_work_phone(&mut self, number: &str) -> &mut Self {
        self.push(format!("TEL;TYPE=WORK,VOICE:{}", number))
    }

    pub fn add_home_phone(&mut self, number: &str) -> &mut Self {
        self.push(format!("TEL;TYPE=HOME,VOICE:{}", number))
    }

    /// Adds an `ADR` entry and its printable `LABEL`.
    pub fn add_work_address(&mut self, address: &Address) -> &mut Self {
        self.push_address("WORK", address)
    }

    /// Adds an `ADR` entry and its printable `LABEL`.
    pub fn add_home_address(&mut self, address: &Address) -> &mut Self {
        self.push_address("HOME", address)
    }

    pub fn add_email(&mut self, email: &str) -> &mut Self {
        self.push(format!("EMAIL;TYPE=PREF,INTERNET:{}", email))
    }

    pub fn add_url(&mut self, website: &str) -> &mut Self {
        self.push(format!("URL:{}", website))
    }

    pub fn add_note(&mut self, note: &str) -> &mut Self {
        self.push(format!("NOTE:{}", note))
    }

    /// The accumulated field lines, without header and trailer.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Renders the record with `REV` pinned to `revision`.
    pub fn to_string_at(&self, revision: DateTime<Utc>) -> String {
        let start = ["BEGIN:VCARD".to_string(), "VERSION:3.0".to_string()];
        let end = [
            format!("REV:{}", revision.format("%Y%m%dT%H%M%SZ")),
            "END:VCARD".to_string(),
        ];
        start
            .iter()
            .chain(self.fields.iter())
            .chain(end.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, field: String) -> &mut Self {
        self.fields.push(field);
        self
    }

    fn push_address(&mut self, kind: &str, a: &Address) -> &mut Self {
        self.fields.push(format!(
            "ADR;TYPE={}:;;{};{};{};{};{}",
            kind, a.street, a.city, a.state, a.zip_code, a.country
        ));
        self.fields.push(format!(
            "LABEL;TYPE={}:{}\\n{}, {} {}\\n{}",
            kind, a.street, a.city, a.state, a.zip_code, a.country
        ));
        self
    }
}

impl fmt::Display for VCard {
    /// Renders the record with `REV` set to the current UTC time.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_at(Utc::now()))
    }
}

/// A postal address as used by `ADR` and `LABEL`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}
