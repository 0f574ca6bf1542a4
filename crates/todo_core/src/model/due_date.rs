use crate::error::AppError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::{Date, Month};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DueDate(Date);

impl DueDate {
    pub fn from_calendar(year: i32, month: u8, day: u8) -> Result<Self, AppError> {
        let month = Month::try_from(month)
            .map_err(|_| AppError::invalid_input(format!("invalid month {month} in due date")))?;
        Date::from_calendar_date(year, month, day)
            .map(Self)
            .map_err(|err| AppError::invalid_input(format!("invalid due date: {err}")))
    }

    pub(crate) fn date(&self) -> Date {
        self.0
    }

    /// Parses optional user input, mapping blank text to `None`.
    pub fn parse_optional(raw: &str) -> Result<Option<Self>, AppError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some)
    }
}

impl FromStr for DueDate {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.contains('/') {
            let [day, month, year] = split_fields(trimmed, '/')?;
            Self::from_calendar(parse_field(year)?, parse_field(month)?, parse_field(day)?)
        } else if trimmed.contains('-') {
            let [year, month, day] = split_fields(trimmed, '-')?;
            Self::from_calendar(parse_field(year)?, parse_field(month)?, parse_field(day)?)
        } else {
            Err(malformed(trimmed))
        }
    }
}

fn split_fields(raw: &str, separator: char) -> Result<[&str; 3], AppError> {
    let mut parts = raw.split(separator);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c), None) => Ok([a, b, c]),
        _ => Err(malformed(raw)),
    }
}

fn parse_field<T: FromStr>(field: &str) -> Result<T, AppError> {
    if field.is_empty() || !field.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(malformed(field));
    }
    field.parse().map_err(|_| malformed(field))
}

fn malformed(raw: &str) -> AppError {
    AppError::invalid_input(format!(
        "due date '{raw}' must be YYYY-MM-DD or DD/MM/YYYY"
    ))
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self.date();
        write!(
            f,
            "{:02}/{:02}/{:04}",
            date.day(),
            u8::from(date.month()),
            date.year()
        )
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|err: AppError| serde::de::Error::custom(err.message()))
    }
}

/// `null`, a missing key and `""` all deserialize to `None`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<DueDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(value) => DueDate::parse_optional(&value)
            .map_err(|err| serde::de::Error::custom(err.message())),
        None => Ok(None),
    }
}

/// Explicit `null` becomes `Some(None)`; a missing key stays `None`.
pub fn deserialize_patch<'de, D>(deserializer: D) -> Result<Option<Option<DueDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional(deserializer).map(Some)
}
