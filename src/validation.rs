//! Field validators and the password generator.
//!
//! Every check here runs before a request is built. A failing check yields a
//! [`ValidationError`] naming the field, and nothing is sent to the server.

use crate::error::ValidationError;
use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub const MIN_PASSWORD_LEN: usize = 8;

pub const TEMPERATURE_F: (f64, f64) = (95.0, 105.0);
pub const PULSE_BPM: (f64, f64) = (40.0, 180.0);
pub const RESPIRATORY_RATE: (f64, f64) = (12.0, 30.0);
pub const OXYGEN_SATURATION: (f64, f64) = (75.0, 100.0);

fn blood_pressure_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+/[0-9]+$").expect("blood pressure pattern"))
}

fn patient_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ET-[0-9]{4}-[0-9]{6}$").expect("patient id pattern"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"))
}

/// Today's date in local time, falling back to UTC when the offset is unknown.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

pub fn is_valid_phone(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate_phone(field: &str, value: &str) -> Result<(), ValidationError> {
    if is_valid_phone(value) {
        Ok(())
    } else {
        Err(ValidationError::Phone {
            field: field.to_string(),
        })
    }
}

pub fn validate_email(field: &str, value: &str) -> Result<(), ValidationError> {
    if email_re().is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::Email {
            field: field.to_string(),
        })
    }
}

pub fn validate_password(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ValidationError::TooShort {
            field: field.to_string(),
            min: MIN_PASSWORD_LEN,
        })
    }
}

/// Checks that a password and its confirmation are identical.
pub fn validate_confirmation(
    field: &str,
    value: &str,
    other_field: &str,
    other: &str,
) -> Result<(), ValidationError> {
    if value == other {
        Ok(())
    } else {
        Err(ValidationError::Mismatch {
            field: field.to_string(),
            other: other_field.to_string(),
        })
    }
}

pub fn parse_number(field: &str, value: &str) -> Result<f64, ValidationError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ValidationError::NotANumber {
            field: field.to_string(),
        })
}

/// Parses `value` and checks it lies in the inclusive range `[min, max]`.
pub fn validate_range(field: &str, value: &str, min: f64, max: f64) -> Result<f64, ValidationError> {
    let n = parse_number(field, value)?;
    if n < min || n > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(n)
}

pub fn validate_positive(field: &str, value: &str) -> Result<f64, ValidationError> {
    let n = parse_number(field, value)?;
    if n <= 0.0 {
        return Err(ValidationError::NotPositive {
            field: field.to_string(),
        });
    }
    Ok(n)
}

pub fn validate_blood_pressure(field: &str, value: &str) -> Result<(), ValidationError> {
    if blood_pressure_re().is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::BloodPressure {
            field: field.to_string(),
        })
    }
}

pub fn validate_patient_id(field: &str, value: &str) -> Result<(), ValidationError> {
    if patient_id_re().is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::PatientId {
            field: field.to_string(),
        })
    }
}

pub fn parse_date(field: &str, value: &str) -> Result<Date, ValidationError> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::BadDate {
            field: field.to_string(),
        }
    })
}

/// Accepts today or any later date.
pub fn validate_not_past(field: &str, value: &str, today: Date) -> Result<Date, ValidationError> {
    let date = parse_date(field, value)?;
    if date < today {
        return Err(ValidationError::DateInPast {
            field: field.to_string(),
        });
    }
    Ok(date)
}

/// Accepts only dates strictly earlier than today (dates of birth).
pub fn validate_before_today(
    field: &str,
    value: &str,
    today: Date,
) -> Result<Date, ValidationError> {
    let date = parse_date(field, value)?;
    if date >= today {
        return Err(ValidationError::DateNotBeforeToday {
            field: field.to_string(),
        });
    }
    Ok(date)
}

/// Capitalised role name used as the literal part of generated passwords.
pub fn password_prefix(role: &str) -> String {
    let mut chars = role.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => "Hospital".to_string(),
    }
}

/// Produces `<Prefix>@<4-6 digits>` passwords.
///
/// Remembers the previous output so two consecutive calls never hand back the
/// same password.
#[derive(Debug, Default)]
pub struct PasswordGenerator {
    last: Option<String>,
}

impl PasswordGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&mut self, prefix: &str) -> String {
        self.generate_with(prefix, &mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng>(&mut self, prefix: &str, rng: &mut R) -> String {
        loop {
            let len = rng.gen_range(4..=6);
            let digits: String = (0..len)
                .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
                .collect();
            let candidate = format!("{prefix}@{digits}");
            if self.last.as_deref() != Some(candidate.as_str()) {
                self.last = Some(candidate.clone());
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn phone_requires_exactly_ten_digits() {
        assert!(is_valid_phone("1234567890"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("12345678901"));
        assert!(!is_valid_phone("12345abcde"));
        assert!(validate_phone("Phone", "12345").is_err());
    }

    #[test]
    fn temperature_range_is_inclusive() {
        let (min, max) = TEMPERATURE_F;
        assert_eq!(validate_range("Temperature", "100", min, max), Ok(100.0));
        assert_eq!(validate_range("Temperature", "95", min, max), Ok(95.0));
        assert!(validate_range("Temperature", "106", min, max).is_err());
        assert!(matches!(
            validate_range("Temperature", "warm", min, max),
            Err(ValidationError::NotANumber { .. })
        ));
    }

    #[test]
    fn vital_ranges_reject_out_of_bounds_values() {
        assert!(validate_range("Pulse", "39", PULSE_BPM.0, PULSE_BPM.1).is_err());
        assert!(validate_range("Pulse", "180", PULSE_BPM.0, PULSE_BPM.1).is_ok());
        assert!(validate_range("Rate", "31", RESPIRATORY_RATE.0, RESPIRATORY_RATE.1).is_err());
        assert!(validate_range("SpO2", "74", OXYGEN_SATURATION.0, OXYGEN_SATURATION.1).is_err());
        assert!(validate_positive("Height", "0").is_err());
        assert!(validate_positive("Weight", "72.5").is_ok());
    }

    #[test]
    fn blood_pressure_needs_a_slash() {
        assert!(validate_blood_pressure("Blood pressure", "120/80").is_ok());
        assert!(validate_blood_pressure("Blood pressure", "12080").is_err());
        assert!(validate_blood_pressure("Blood pressure", "120/").is_err());
        assert!(validate_blood_pressure("Blood pressure", "١٢٠/٨٠").is_err());
    }

    #[test]
    fn patient_id_format() {
        assert!(validate_patient_id("Patient ID", "ET-2024-000123").is_ok());
        assert!(validate_patient_id("Patient ID", "ET-24-000123").is_err());
        assert!(validate_patient_id("Patient ID", "et-2024-000123").is_err());
        assert!(validate_patient_id("Patient ID", "ET-٢٠٢٤-000123").is_err());
    }

    #[test]
    fn date_checks_are_relative_to_today() {
        let today = date!(2024 - 06 - 15);
        assert!(validate_not_past("Date", "2024-06-15", today).is_ok());
        assert!(validate_not_past("Date", "2024-06-14", today).is_err());
        assert!(validate_before_today("Date of birth", "2024-06-14", today).is_ok());
        assert!(validate_before_today("Date of birth", "2024-06-15", today).is_err());
        assert!(matches!(
            parse_date("Date", "15/06/2024"),
            Err(ValidationError::BadDate { .. })
        ));
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("Password", "short").is_err());
        assert!(validate_password("Password", "longenough").is_ok());
        assert!(validate_confirmation("Confirm", "abc", "Password", "abd").is_err());
        assert!(validate_email("Email", "nurse@hospital.et").is_ok());
        assert!(validate_email("Email", "nurse@hospital").is_err());
    }

    #[test]
    fn generated_passwords_differ_only_in_digit_suffix() {
        let mut generator = PasswordGenerator::new();
        let prefix = password_prefix("doctor");
        let first = generator.generate(&prefix);
        let second = generator.generate(&prefix);

        assert_ne!(first, second);
        for password in [&first, &second] {
            let suffix = password.strip_prefix("Doctor@").expect("prefix kept");
            assert!((4..=6).contains(&suffix.len()));
            assert!(suffix.bytes().all(|b| b.is_ascii_digit()));
            assert!(validate_password("Password", password).is_ok());
        }
    }

    #[test]
    fn prefix_falls_back_for_empty_role() {
        assert_eq!(password_prefix(""), "Hospital");
        assert_eq!(password_prefix("CARD"), "Card");
    }
}
