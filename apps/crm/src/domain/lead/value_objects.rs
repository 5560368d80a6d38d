use serde::{Deserialize, Serialize};
use std::fmt;

literal_enum! {
    /// Pipeline state of a lead
    ///
    /// Declaration order is the display order of the status columns.
    pub enum LeadStatus {
        New => "Yeni",
        NoAnswer => "Cevapsız",
        Hot => "Sıcak",
        Sale => "Satış",
        Cancelled => "İptal",
        Foreign => "Yabancı",
        Local => "Türk",
        WillThinkItOver => "Düşünüp Geri Dönüş Sağlayacak",
        InContact => "İletişimde",
        OutsideCity => "İstanbul Dışı",
        GaveUp => "Vazgeçti",
        AppointmentGiven => "Randevu Verilen",
        AppointmentAttended => "Randevu Gelen",
        AppointmentMissed => "Randevu Gelmeyen",
        WrongApplication => "Yanlış Başvuru",
    }
}

impl LeadStatus {
    /// The status that counts as a closed sale
    pub const WON: LeadStatus = LeadStatus::Sale;

    /// Display label of the derived "sold" bucket
    ///
    /// Presentation only: no lead is ever stored with this label.
    pub const WON_ALIAS: &'static str = "Satıldı";
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

literal_enum! {
    /// Acquisition channel of a lead
    pub enum LeadSource {
        FacebookAd => "Facebook Reklam",
        DirectCall => "Direk Arama",
        Referral => "Referans",
        InstagramMessage => "Direk Mesaj-Instagram",
        OldData => "Eski Data",
    }
}

literal_enum! {
    /// Disqualification or location reason, independent of status
    pub enum LeadStage {
        TooFar => "Çok Uzak",
        TooExpensive => "Çok Pahalı",
        SisliTooFar => "Şişli Uzak",
        Other => "Diğer",
    }
}

literal_enum! {
    /// Language the lead prefers to be contacted in
    pub enum Language {
        Tr => "TR",
        En => "EN",
        De => "DE",
        Fr => "FR",
        Ar => "AR",
    }
}

/// Phone number value object
///
/// # Invariants
/// - Contains no whitespace (all whitespace is stripped on input)
/// - Is never empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Creates a phone number from user input
    ///
    /// # Example
    /// ```
    /// use leaddesk_crm::domain::lead::Phone;
    ///
    /// let phone = Phone::new(" 0555 123 45 67 ").expect("valid phone");
    /// assert_eq!(phone.as_str(), "05551234567");
    /// assert!(Phone::new("   ").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, String> {
        let normalized = Self::normalize(raw.as_ref());
        if normalized.is_empty() {
            return Err("Phone cannot be empty".to_string());
        }
        Ok(Phone(normalized))
    }

    /// Strips every whitespace character
    pub fn normalize(raw: &str) -> String {
        raw.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Rebuilds a phone read back from the store without validation
    pub fn from_persistence(value: String) -> Self {
        Phone(value)
    }

    /// Returns the phone number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
