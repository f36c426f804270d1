//! Data models for Medidash.
//!
//! Every type mirrors one JSON collection of the hospital API. Fields are
//! camelCase on the wire, ids may arrive as `id` or `_id`, and missing fields
//! fall back to defaults so a partial record still loads.

use crate::mailbox::MailItem;
use crate::resource::{RecordStatus, Resource};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accepts `98.6`, `"98.6"` or nothing.
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

/// Formats a number the way a user would type it: `72` rather than `72.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Trims an ISO timestamp down to its date.
pub fn short_date(value: &str) -> String {
    value.get(..10).unwrap_or(value).to_string()
}

/// A staff account: admins, doctors and helpers (nurses, pharmacists,
/// laboratorists, card office).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaffUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub department: String,
    pub status: RecordStatus,
    pub image: String,
    pub created_at: String,
}

impl StaffUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl Resource for StaffUser {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.full_name(), self.email.clone()]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.full_name(),
            self.email.clone(),
            self.phone.clone(),
            self.role.clone(),
            self.department.clone(),
            self.status().unwrap_or_default().to_string(),
        ]
    }

    fn form_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("firstName", self.first_name.clone()),
            ("lastName", self.last_name.clone()),
            ("email", self.email.clone()),
            ("phone", self.phone.clone()),
            ("role", self.role.clone()),
            ("department", self.department.clone()),
        ]
    }

    /// Accounts without an explicit status are active.
    fn status(&self) -> Option<RecordStatus> {
        Some(match &self.status {
            RecordStatus::Unset => RecordStatus::Activated,
            other => other.clone(),
        })
    }

    fn set_status(&mut self, status: RecordStatus) {
        self.status = status;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Appointment {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub date: String,
    pub time: String,
    pub reason: String,
    pub status: RecordStatus,
}

impl Resource for Appointment {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.patient_name.clone(), self.phone.clone()]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.patient_name.clone(),
            self.phone.clone(),
            self.department.clone(),
            short_date(&self.date),
            self.time.clone(),
            self.status.to_string(),
        ]
    }

    fn form_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("patientName", self.patient_name.clone()),
            ("email", self.email.clone()),
            ("phone", self.phone.clone()),
            ("department", self.department.clone()),
            ("date", short_date(&self.date)),
            ("time", self.time.clone()),
            ("reason", self.reason.clone()),
        ]
    }

    fn status(&self) -> Option<RecordStatus> {
        Some(match &self.status {
            RecordStatus::Unset => RecordStatus::Pending,
            other => other.clone(),
        })
    }

    fn set_status(&mut self, status: RecordStatus) {
        self.status = status;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VitalSigns {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub date_of_birth: String,
    #[serde(deserialize_with = "number_or_string")]
    pub temperature: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub pulse: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub respiratory_rate: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub oxygen_saturation: f64,
    pub blood_pressure: String,
    #[serde(deserialize_with = "number_or_string")]
    pub height: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub weight: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub bmi: f64,
    pub date: String,
}

impl Resource for VitalSigns {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.patient_id.clone(), self.patient_name.clone()]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.patient_id.clone(),
            self.patient_name.clone(),
            format_number(self.temperature),
            format_number(self.pulse),
            self.blood_pressure.clone(),
            format_number(self.oxygen_saturation),
            short_date(&self.date),
        ]
    }

    fn form_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("patientId", self.patient_id.clone()),
            ("patientName", self.patient_name.clone()),
            ("dateOfBirth", short_date(&self.date_of_birth)),
            ("temperature", format_number(self.temperature)),
            ("pulse", format_number(self.pulse)),
            ("respiratoryRate", format_number(self.respiratory_rate)),
            ("oxygenSaturation", format_number(self.oxygen_saturation)),
            ("bloodPressure", self.blood_pressure.clone()),
            ("height", format_number(self.height)),
            ("weight", format_number(self.weight)),
            ("bmi", format_number(self.bmi)),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestRequest {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub test_type: String,
    pub notes: String,
    pub requested_by: String,
    pub status: RecordStatus,
    pub date: String,
}

impl Resource for TestRequest {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.patient_id.clone(), self.patient_name.clone()]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.patient_id.clone(),
            self.patient_name.clone(),
            self.test_type.clone(),
            self.requested_by.clone(),
            self.status.to_string(),
            short_date(&self.date),
        ]
    }

    fn form_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("patientId", self.patient_id.clone()),
            ("patientName", self.patient_name.clone()),
            ("testType", self.test_type.clone()),
            ("notes", self.notes.clone()),
        ]
    }

    fn status(&self) -> Option<RecordStatus> {
        Some(match &self.status {
            RecordStatus::Unset => RecordStatus::Pending,
            other => other.clone(),
        })
    }

    fn set_status(&mut self, status: RecordStatus) {
        self.status = status;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestResult {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub test_type: String,
    pub result: String,
    pub remarks: String,
    pub technician: String,
    pub date: String,
}

impl Resource for TestResult {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.patient_id.clone(), self.patient_name.clone()]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.patient_id.clone(),
            self.patient_name.clone(),
            self.test_type.clone(),
            self.result.clone(),
            short_date(&self.date),
        ]
    }

    fn form_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("patientId", self.patient_id.clone()),
            ("patientName", self.patient_name.clone()),
            ("testType", self.test_type.clone()),
            ("result", self.result.clone()),
            ("remarks", self.remarks.clone()),
        ]
    }
}

/// A medication referral from a doctor to the pharmacy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Referral {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub medicine: String,
    pub dosage: String,
    pub instructions: String,
    pub doctor: String,
    pub status: RecordStatus,
    pub date: String,
}

impl Resource for Referral {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.patient_name.clone(), self.medicine.clone()]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.patient_id.clone(),
            self.patient_name.clone(),
            self.medicine.clone(),
            self.dosage.clone(),
            self.status.to_string(),
            short_date(&self.date),
        ]
    }

    fn form_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("patientId", self.patient_id.clone()),
            ("patientName", self.patient_name.clone()),
            ("medicine", self.medicine.clone()),
            ("dosage", self.dosage.clone()),
            ("instructions", self.instructions.clone()),
        ]
    }

    fn status(&self) -> Option<RecordStatus> {
        Some(match &self.status {
            RecordStatus::Unset => RecordStatus::Pending,
            other => other.clone(),
        })
    }

    fn set_status(&mut self, status: RecordStatus) {
        self.status = status;
    }
}

/// An online payment started through the payment gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Payment {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(deserialize_with = "number_or_string")]
    pub amount: f64,
    pub description: String,
    pub tx_ref: String,
    pub status: RecordStatus,
    pub date: String,
}

impl Resource for Payment {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.email.clone(), self.description.clone()]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.email.clone(),
            format_number(self.amount),
            self.description.clone(),
            self.tx_ref.clone(),
            self.status.to_string(),
            short_date(&self.date),
        ]
    }
}

/// A lab fee recorded by the card office.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabPayment {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub tests: String,
    #[serde(deserialize_with = "number_or_string")]
    pub amount: f64,
    pub status: RecordStatus,
    pub date: String,
}

impl Resource for LabPayment {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.patient_id.clone(), self.patient_name.clone()]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.patient_id.clone(),
            self.patient_name.clone(),
            self.tests.clone(),
            format_number(self.amount),
            self.status.to_string(),
            short_date(&self.date),
        ]
    }

    fn form_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("patientId", self.patient_id.clone()),
            ("patientName", self.patient_name.clone()),
            ("tests", self.tests.clone()),
            ("amount", format_number(self.amount)),
        ]
    }

    fn status(&self) -> Option<RecordStatus> {
        Some(match &self.status {
            RecordStatus::Unset => RecordStatus::Pending,
            other => other.clone(),
        })
    }

    fn set_status(&mut self, status: RecordStatus) {
        self.status = status;
    }
}

/// A receipt line for a cash or card payment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentDetail {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub reason: String,
    pub method: String,
    #[serde(deserialize_with = "number_or_string")]
    pub amount: f64,
    pub date: String,
}

impl Resource for PaymentDetail {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.patient_id.clone(), self.patient_name.clone()]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.patient_id.clone(),
            self.patient_name.clone(),
            self.reason.clone(),
            self.method.clone(),
            format_number(self.amount),
            short_date(&self.date),
        ]
    }

    fn form_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("patientId", self.patient_id.clone()),
            ("patientName", self.patient_name.clone()),
            ("reason", self.reason.clone()),
            ("method", self.method.clone()),
            ("amount", format_number(self.amount)),
        ]
    }
}

/// Pharmacy stock item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralMedicine {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(deserialize_with = "number_or_string")]
    pub quantity: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub unit_price: f64,
    pub expiry_date: String,
}

impl Resource for GeneralMedicine {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.name.clone(), self.category.clone()]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.category.clone(),
            format_number(self.quantity),
            format_number(self.unit_price),
            short_date(&self.expiry_date),
        ]
    }

    fn form_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("category", self.category.clone()),
            ("quantity", format_number(self.quantity)),
            ("unitPrice", format_number(self.unit_price)),
            ("expiryDate", short_date(&self.expiry_date)),
        ]
    }
}

/// A medicine prescribed to one patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecificMedicine {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub name: String,
    pub dosage: String,
    pub prescribed_by: String,
    pub status: RecordStatus,
    pub date: String,
}

impl Resource for SpecificMedicine {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.patient_name.clone(), self.name.clone()]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.patient_id.clone(),
            self.patient_name.clone(),
            self.name.clone(),
            self.dosage.clone(),
            self.status.to_string(),
        ]
    }

    fn form_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("patientId", self.patient_id.clone()),
            ("patientName", self.patient_name.clone()),
            ("name", self.name.clone()),
            ("dosage", self.dosage.clone()),
        ]
    }

    fn status(&self) -> Option<RecordStatus> {
        Some(match &self.status {
            RecordStatus::Unset => RecordStatus::Pending,
            other => other.clone(),
        })
    }

    fn set_status(&mut self, status: RecordStatus) {
        self.status = status;
    }
}

/// Staff-to-staff message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    #[serde(alias = "_id")]
    pub id: String,
    pub sender_name: String,
    pub sender_email: String,
    pub recipient_role: String,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub date: String,
}

impl MailItem for Message {
    fn id(&self) -> &str {
        &self.id
    }
    fn is_read(&self) -> bool {
        self.is_read
    }
    fn mark_read(&mut self) {
        self.is_read = true;
    }
    fn sender(&self) -> String {
        if self.sender_name.is_empty() {
            self.sender_email.clone()
        } else {
            self.sender_name.clone()
        }
    }
    fn summary(&self) -> String {
        if self.subject.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.subject, self.message)
        }
    }
    fn date(&self) -> String {
        short_date(&self.date)
    }
}

/// Feedback left by a patient or visitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Feedback {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub is_read: bool,
    pub date: String,
}

impl MailItem for Feedback {
    fn id(&self) -> &str {
        &self.id
    }
    fn is_read(&self) -> bool {
        self.is_read
    }
    fn mark_read(&mut self) {
        self.is_read = true;
    }
    fn sender(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
    fn summary(&self) -> String {
        self.message.clone()
    }
    fn date(&self) -> String {
        short_date(&self.date)
    }
}

/// System notification scoped to a role or department.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Notification {
    #[serde(alias = "_id")]
    pub id: String,
    pub message: String,
    pub department: String,
    pub role: String,
    pub is_read: bool,
    pub date: String,
}

impl MailItem for Notification {
    fn id(&self) -> &str {
        &self.id
    }
    fn is_read(&self) -> bool {
        self.is_read
    }
    fn mark_read(&mut self) {
        self.is_read = true;
    }
    fn sender(&self) -> String {
        if self.department.is_empty() {
            self.role.clone()
        } else {
            self.department.clone()
        }
    }
    fn summary(&self) -> String {
        self.message.clone()
    }
    fn date(&self) -> String {
        short_date(&self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vital_signs_accept_numbers_as_strings() {
        let vitals: VitalSigns = serde_json::from_value(json!({
            "_id": "v1",
            "patientId": "ET-2024-000001",
            "temperature": "98.6",
            "pulse": 72,
            "bloodPressure": "120/80"
        }))
        .unwrap();
        assert_eq!(vitals.id, "v1");
        assert_eq!(vitals.temperature, 98.6);
        assert_eq!(vitals.pulse, 72.0);
        assert_eq!(vitals.height, 0.0);
    }

    #[test]
    fn staff_without_status_counts_as_active() {
        let user: StaffUser = serde_json::from_value(json!({"id": "1"})).unwrap();
        assert_eq!(user.status(), Some(RecordStatus::Activated));
    }

    #[test]
    fn status_serializes_as_plain_string() {
        let appointment = Appointment {
            id: "a1".into(),
            status: RecordStatus::Completed,
            ..Default::default()
        };
        let value = serde_json::to_value(&appointment).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["patientName"], "");
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(format_number(72.0), "72");
        assert_eq!(format_number(98.6), "98.6");
        assert_eq!(short_date("2024-06-15T08:30:00.000Z"), "2024-06-15");
        assert_eq!(short_date("today"), "today");
    }
}
