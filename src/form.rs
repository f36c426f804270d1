//! Schema-driven form state.
//!
//! A [`FormSchema`] lists the fields of one create/edit form together with
//! the rule each value must pass. [`FormState`] holds what the user typed,
//! tracks focus, validates locally and turns the values into a request
//! [`Body`]. Rendering lives in `components::form_view`.

use crate::api::{Body, FilePart};
use crate::error::ValidationError;
use crate::validation::{self, PasswordGenerator};
use serde_json::{Map, Number, Value};
use std::path::PathBuf;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    /// Masked when rendered. Never pre-filled when editing.
    Secret,
    Number,
    /// `YYYY-MM-DD`.
    Date,
    /// One of a fixed list; cycled with the arrow keys.
    Choice(&'static [&'static str]),
    /// Path to a local image, sent as a multipart file part.
    Image,
    /// Not editable; always submitted with this value.
    Fixed(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    Phone,
    Email,
    Password,
    Range(f64, f64),
    Positive,
    BloodPressure,
    PatientId,
    NotPast,
    BeforeToday,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// JSON key sent to the server.
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub rule: Option<Rule>,
    /// Set on confirmation fields: the key whose value this one must equal.
    /// Confirmation fields are never submitted.
    pub confirms: Option<&'static str>,
}

impl FieldSpec {
    fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: true,
            rule: None,
            confirms: None,
        }
    }

    pub fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    pub fn secret(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Secret).rule(Rule::Password)
    }

    pub fn number(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Number)
    }

    pub fn date(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Date)
    }

    pub fn choice(key: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self::new(key, label, FieldKind::Choice(options))
    }

    pub fn image(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Image).optional()
    }

    pub fn fixed(key: &'static str, value: &'static str) -> Self {
        Self::new(key, key, FieldKind::Fixed(value))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn confirms(mut self, other: &'static str) -> Self {
        self.confirms = Some(other);
        self.rule = None;
        self
    }

    pub fn is_editable(&self) -> bool {
        !matches!(self.kind, FieldKind::Fixed(_))
    }
}

/// Where a generated password takes its literal part from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PasswordPrefix {
    /// The current value of another field, usually the role.
    Field(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    pub fields: Vec<FieldSpec>,
    pub password_prefix: Option<PasswordPrefix>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            password_prefix: None,
        }
    }

    /// Enables the password generator for this form.
    pub fn generate_passwords(mut self, prefix: PasswordPrefix) -> Self {
        self.password_prefix = Some(prefix);
        self
    }
}

pub struct FormState {
    schema: FormSchema,
    values: Vec<String>,
    options: Vec<Vec<String>>,
    focus: usize,
    editing: Option<String>,
    generator: PasswordGenerator,
}

impl FormState {
    pub fn new(schema: FormSchema) -> Self {
        let options = schema
            .fields
            .iter()
            .map(|field| match field.kind {
                FieldKind::Choice(options) => options.iter().map(|s| s.to_string()).collect(),
                _ => Vec::new(),
            })
            .collect();
        let mut form = Self {
            values: Vec::new(),
            options,
            focus: 0,
            editing: None,
            generator: PasswordGenerator::new(),
            schema,
        };
        form.reset();
        form
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.schema.fields
    }

    pub fn has_password_generator(&self) -> bool {
        self.schema.password_prefix.is_some()
    }

    fn default_value(field: &FieldSpec, options: &[String]) -> String {
        match field.kind {
            FieldKind::Fixed(value) => value.to_string(),
            FieldKind::Choice(_) => options.first().cloned().unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Clears every value and leaves edit mode.
    pub fn reset(&mut self) {
        self.values = self
            .schema
            .fields
            .iter()
            .zip(&self.options)
            .map(|(field, options)| Self::default_value(field, options))
            .collect();
        self.editing = None;
        self.focus = self.first_editable().unwrap_or(0);
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.schema.fields.iter().position(|f| f.key == key)
    }

    pub fn value(&self, key: &str) -> &str {
        self.position(key)
            .map(|i| self.values[i].as_str())
            .unwrap_or("")
    }

    pub fn value_at(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if let Some(i) = self.position(key) {
            self.values[i] = value.into();
        }
    }

    /// Replaces the options of a choice field, e.g. with free slots fetched
    /// from the server. Keeps the current value if it is still offered.
    pub fn set_options(&mut self, key: &str, options: Vec<String>) {
        if let Some(i) = self.position(key) {
            if !options.contains(&self.values[i]) {
                self.values[i] = options.first().cloned().unwrap_or_default();
            }
            self.options[i] = options;
        }
    }

    pub fn options(&self, key: &str) -> &[String] {
        self.position(key)
            .map(|i| self.options[i].as_slice())
            .unwrap_or(&[])
    }

    /// Id of the record being edited, or `None` when creating.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Fills the form from an existing record. Secret fields stay empty and
    /// become optional; leaving them blank keeps the stored password.
    pub fn populate(&mut self, id: &str, values: Vec<(&'static str, String)>) {
        self.reset();
        for (key, value) in values {
            let Some(i) = self.position(key) else {
                continue;
            };
            match self.schema.fields[i].kind {
                FieldKind::Secret | FieldKind::Fixed(_) => {}
                _ => self.values[i] = value,
            }
        }
        self.editing = Some(id.to_string());
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused_field(&self) -> Option<&FieldSpec> {
        self.schema.fields.get(self.focus)
    }

    fn first_editable(&self) -> Option<usize> {
        self.schema.fields.iter().position(FieldSpec::is_editable)
    }

    pub fn focus_next(&mut self) {
        let n = self.schema.fields.len();
        for step in 1..=n {
            let i = (self.focus + step) % n;
            if self.schema.fields[i].is_editable() {
                self.focus = i;
                return;
            }
        }
    }

    pub fn focus_previous(&mut self) {
        let n = self.schema.fields.len();
        for step in 1..=n {
            let i = (self.focus + n - step) % n;
            if self.schema.fields[i].is_editable() {
                self.focus = i;
                return;
            }
        }
    }

    pub fn push_char(&mut self, c: char) {
        let Some(field) = self.schema.fields.get(self.focus) else {
            return;
        };
        match field.kind {
            FieldKind::Choice(_) | FieldKind::Fixed(_) => {}
            FieldKind::Number if !(c.is_ascii_digit() || c == '.' || c == '-') => {}
            _ => self.values[self.focus].push(c),
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.schema.fields.get(self.focus) {
            if !matches!(field.kind, FieldKind::Choice(_) | FieldKind::Fixed(_)) {
                self.values[self.focus].pop();
            }
        }
    }

    /// Moves a focused choice field to its next (or previous) option.
    pub fn cycle_choice(&mut self, forward: bool) {
        let options = &self.options[self.focus];
        if options.is_empty() {
            return;
        }
        let current = options
            .iter()
            .position(|o| *o == self.values[self.focus])
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % options.len()
        } else {
            (current + options.len() - 1) % options.len()
        };
        self.values[self.focus] = options[next].clone();
    }

    /// Generates a fresh password and writes it into every secret field, so
    /// the password and its confirmation always match.
    pub fn generate_password(&mut self) -> Option<String> {
        let prefix = match self.schema.password_prefix? {
            PasswordPrefix::Field(key) => validation::password_prefix(self.value(key)),
        };
        let password = self.generator.generate(&prefix);
        for (field, value) in self.schema.fields.iter().zip(self.values.iter_mut()) {
            if field.kind == FieldKind::Secret {
                *value = password.clone();
            }
        }
        Some(password)
    }

    fn check_field(&self, index: usize, today: Date) -> Result<(), ValidationError> {
        let field = &self.schema.fields[index];
        let value = self.values[index].trim();
        let label = field.label;

        if value.is_empty() {
            // A blank secret keeps the stored password when editing, unless
            // it confirms a password that was just typed.
            let keeps_stored = field.kind == FieldKind::Secret
                && self.editing.is_some()
                && field
                    .confirms
                    .map_or(true, |other| self.value(other).trim().is_empty());
            let optional = !field.required || keeps_stored;
            if optional {
                return Ok(());
            }
            return Err(ValidationError::Required {
                field: label.to_string(),
            });
        }

        if let Some(other) = field.confirms {
            let other_label = self
                .position(other)
                .map(|i| self.schema.fields[i].label)
                .unwrap_or(other);
            return validation::validate_confirmation(label, value, other_label, self.value(other));
        }

        match field.kind {
            FieldKind::Choice(_) if !self.options[index].iter().any(|o| o == value) => {
                return Err(ValidationError::NotAChoice {
                    field: label.to_string(),
                    allowed: self.options[index].join(", "),
                });
            }
            FieldKind::Number => {
                validation::parse_number(label, value)?;
            }
            FieldKind::Date => {
                validation::parse_date(label, value)?;
            }
            _ => {}
        }

        match field.rule {
            None => Ok(()),
            Some(Rule::Phone) => validation::validate_phone(label, value),
            Some(Rule::Email) => validation::validate_email(label, value),
            Some(Rule::Password) => validation::validate_password(label, value),
            Some(Rule::Range(min, max)) => validation::validate_range(label, value, min, max).map(drop),
            Some(Rule::Positive) => validation::validate_positive(label, value).map(drop),
            Some(Rule::BloodPressure) => validation::validate_blood_pressure(label, value),
            Some(Rule::PatientId) => validation::validate_patient_id(label, value),
            Some(Rule::NotPast) => validation::validate_not_past(label, value, today).map(drop),
            Some(Rule::BeforeToday) => {
                validation::validate_before_today(label, value, today).map(drop)
            }
        }
    }

    /// Runs every field check in order and returns the first failure.
    pub fn validate(&self, today: Date) -> Result<(), ValidationError> {
        (0..self.schema.fields.len()).try_for_each(|i| self.check_field(i, today))
    }

    /// Validates and builds the request body.
    ///
    /// The body is JSON unless an image path is set, in which case it is
    /// multipart. Confirmation fields and blank optional fields are left out.
    pub fn to_body(&self, today: Date) -> Result<Body, ValidationError> {
        self.validate(today)?;

        let mut json = Map::new();
        let mut text_fields = Vec::new();
        let mut file = None;

        for (field, raw) in self.schema.fields.iter().zip(&self.values) {
            let value = raw.trim();
            if field.confirms.is_some() || value.is_empty() {
                continue;
            }
            match field.kind {
                FieldKind::Image => {
                    file = Some(FilePart {
                        field: field.key.to_string(),
                        path: PathBuf::from(value),
                    });
                }
                FieldKind::Number => {
                    let number = value
                        .parse::<f64>()
                        .ok()
                        .and_then(Number::from_f64)
                        .map(Value::Number)
                        .unwrap_or_else(|| Value::String(value.to_string()));
                    json.insert(field.key.to_string(), number);
                    text_fields.push((field.key.to_string(), value.to_string()));
                }
                _ => {
                    json.insert(field.key.to_string(), Value::String(value.to_string()));
                    text_fields.push((field.key.to_string(), value.to_string()));
                }
            }
        }

        Ok(match file {
            Some(file) => Body::Multipart {
                fields: text_fields,
                file: Some(file),
            },
            None => Body::Json(Value::Object(json)),
        })
    }
}
