//! Form state for the flap update and the transforms applied on every edit.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shared::{domain::Initials, error::FieldError, protocol::UpdateModelRequest};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    length: String,
    drawn_by: Initials,
    checked_by: Initials,
    approved: Initials,
    date: String,
}

impl Default for FormInput {
    fn default() -> Self {
        Self::for_date(Utc::now().date_naive())
    }
}

impl FormInput {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            length: String::new(),
            drawn_by: Initials::default(),
            checked_by: Initials::default(),
            approved: Initials::default(),
            date: date.format(DATE_FORMAT).to_string(),
        }
    }

    pub fn length(&self) -> &str {
        &self.length
    }

    pub fn drawn_by(&self) -> &Initials {
        &self.drawn_by
    }

    pub fn checked_by(&self) -> &Initials {
        &self.checked_by
    }

    pub fn approved(&self) -> &Initials {
        &self.approved
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    /// Stored as typed; parsed only when a request is built.
    pub fn set_length(&mut self, raw: impl Into<String>) {
        self.length = raw.into();
    }

    pub fn set_drawn_by(&mut self, raw: &str) {
        self.drawn_by = Initials::new(raw);
    }

    pub fn set_checked_by(&mut self, raw: &str) {
        self.checked_by = Initials::new(raw);
    }

    pub fn set_approved(&mut self, raw: &str) {
        self.approved = Initials::new(raw);
    }

    pub fn set_date(&mut self, raw: impl Into<String>) {
        self.date = raw.into();
    }

    pub fn parsed_length(&self) -> Result<f64, FieldError> {
        self.length
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| FieldError::invalid_length(&self.length))
    }

    pub fn has_valid_length(&self) -> bool {
        self.parsed_length().is_ok()
    }

    /// The calendar date as midnight UTC.
    pub fn parsed_date(&self) -> Result<DateTime<Utc>, FieldError> {
        NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT)
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
            .map_err(|_| FieldError::invalid_date(&self.date))
    }

    pub fn to_request(&self) -> Result<UpdateModelRequest, FieldError> {
        Ok(UpdateModelRequest {
            length: self.parsed_length()?,
            drawn_by: self.drawn_by.clone(),
            checked_by: self.checked_by.clone(),
            approved: self.approved.clone(),
            date: self.parsed_date()?,
        })
    }
}
