//! Table columns, forms and capabilities for every dashboard section.

use crate::api::encode_component;
use crate::form::{FieldSpec, FormSchema, PasswordPrefix, Rule};
use crate::resource::{Capabilities, ResourceSchema};
use crate::validation::{OXYGEN_SATURATION, PULSE_BPM, RESPIRATORY_RATE, TEMPERATURE_F};

pub const DEPARTMENTS: &[&str] = &[
    "general",
    "cardiology",
    "pediatrics",
    "gynecology",
    "orthopedics",
    "neurology",
    "dermatology",
    "ophthalmology",
    "dental",
    "emergency",
];

pub const HELPER_ROLES: &[&str] = &["nurse", "pharmacist", "laboratorist", "card"];

const TEST_TYPES: &[&str] = &[
    "Complete blood count",
    "Blood glucose",
    "Urinalysis",
    "Stool examination",
    "Liver function",
    "Kidney function",
    "X-ray",
    "Ultrasound",
];

const PAYMENT_METHODS: &[&str] = &["cash", "card", "mobile money", "insurance"];

const STAFF_COLUMNS: &[&str] = &["Name", "Email", "Phone", "Role", "Department", "Status"];

fn person_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("firstName", "First name"),
        FieldSpec::text("lastName", "Last name"),
        FieldSpec::text("email", "Email").rule(Rule::Email),
        FieldSpec::text("phone", "Phone").rule(Rule::Phone),
    ]
}

fn password_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::secret("password", "Password"),
        FieldSpec::secret("confirmPassword", "Confirm password").confirms("password"),
    ]
}

fn staff_form(role: FieldSpec, department: Option<FieldSpec>) -> FormSchema {
    let mut fields = person_fields();
    fields.push(role);
    fields.extend(department);
    fields.extend(password_fields());
    fields.push(FieldSpec::image("image", "Photo (path)"));
    FormSchema::new(fields).generate_passwords(PasswordPrefix::Field("role"))
}

fn patient_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("patientId", "Patient ID").rule(Rule::PatientId),
        FieldSpec::text("patientName", "Patient name"),
    ]
}

pub fn admins() -> ResourceSchema {
    ResourceSchema::new("Admins", "Admin", "/users")
        .list_from("/users/role/admin")
        .columns(STAFF_COLUMNS)
        .form(staff_form(FieldSpec::fixed("role", "admin"), None))
        .caps(Capabilities::FULL.with_toggle())
}

pub fn doctors() -> ResourceSchema {
    ResourceSchema::new("Doctors", "Doctor", "/doctors")
        .columns(STAFF_COLUMNS)
        .form(staff_form(
            FieldSpec::fixed("role", "doctor"),
            Some(FieldSpec::choice("department", "Department", DEPARTMENTS)),
        ))
        .caps(Capabilities::FULL.with_toggle())
}

/// Nurses, pharmacists, laboratorists and card office staff.
pub fn helpers(caps: Capabilities) -> ResourceSchema {
    ResourceSchema::new("Helpers", "Helper", "/users")
        .columns(STAFF_COLUMNS)
        .form(staff_form(
            FieldSpec::choice("role", "Role", HELPER_ROLES),
            None,
        ))
        .caps(caps)
}

fn appointment_fields(time: FieldSpec) -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("patientName", "Patient name"),
        FieldSpec::text("email", "Email").rule(Rule::Email).optional(),
        FieldSpec::text("phone", "Phone").rule(Rule::Phone),
        FieldSpec::choice("department", "Department", DEPARTMENTS),
        FieldSpec::date("date", "Date (YYYY-MM-DD)").rule(Rule::NotPast),
        time,
        FieldSpec::text("reason", "Reason").optional(),
    ]
}

/// Appointments, optionally narrowed to one department.
pub fn appointments(department: Option<&str>, caps: Capabilities) -> ResourceSchema {
    let schema = ResourceSchema::new("Appointments", "Appointment", "/appointments")
        .columns(&["Patient", "Phone", "Department", "Date", "Time", "Status"])
        .form(FormSchema::new(appointment_fields(FieldSpec::text(
            "time",
            "Time (HH:MM)",
        ))))
        .caps(caps);
    match department {
        Some(department) => {
            schema.list_from(format!("/appointments?department={}", encode_component(department)))
        }
        None => schema,
    }
}

/// Public booking form. Time slots are filled in from the server.
pub fn booking_form() -> FormSchema {
    FormSchema::new(appointment_fields(FieldSpec::choice("time", "Time slot", &[])))
}

pub fn vital_signs(caps: Capabilities) -> ResourceSchema {
    let mut fields = patient_fields();
    fields.extend([
        FieldSpec::date("dateOfBirth", "Date of birth").rule(Rule::BeforeToday),
        FieldSpec::number("temperature", "Temperature (°F)")
            .rule(Rule::Range(TEMPERATURE_F.0, TEMPERATURE_F.1)),
        FieldSpec::number("pulse", "Pulse (bpm)").rule(Rule::Range(PULSE_BPM.0, PULSE_BPM.1)),
        FieldSpec::number("respiratoryRate", "Respiratory rate")
            .rule(Rule::Range(RESPIRATORY_RATE.0, RESPIRATORY_RATE.1)),
        FieldSpec::number("oxygenSaturation", "Oxygen saturation (%)")
            .rule(Rule::Range(OXYGEN_SATURATION.0, OXYGEN_SATURATION.1)),
        FieldSpec::text("bloodPressure", "Blood pressure").rule(Rule::BloodPressure),
        FieldSpec::number("height", "Height (cm)").rule(Rule::Positive),
        FieldSpec::number("weight", "Weight (kg)").rule(Rule::Positive),
        FieldSpec::number("bmi", "BMI").rule(Rule::Positive).optional(),
    ]);
    ResourceSchema::new("Vital Signs", "Vital signs record", "/vitalsigns")
        .columns(&["Patient ID", "Name", "Temp", "Pulse", "BP", "SpO2", "Date"])
        .form(FormSchema::new(fields))
        .caps(caps)
}

pub fn test_requests(caps: Capabilities) -> ResourceSchema {
    let mut fields = patient_fields();
    fields.extend([
        FieldSpec::choice("testType", "Test", TEST_TYPES),
        FieldSpec::text("notes", "Notes").optional(),
    ]);
    ResourceSchema::new("Test Requests", "Test request", "/patient-test-requests")
        .columns(&["Patient ID", "Name", "Test", "Requested by", "Status", "Date"])
        .form(FormSchema::new(fields))
        .caps(caps)
}

pub fn test_results(caps: Capabilities) -> ResourceSchema {
    let mut fields = patient_fields();
    fields.extend([
        FieldSpec::choice("testType", "Test", TEST_TYPES),
        FieldSpec::text("result", "Result"),
        FieldSpec::text("remarks", "Remarks").optional(),
    ]);
    ResourceSchema::new("Test Results", "Test result", "/test-results")
        .columns(&["Patient ID", "Name", "Test", "Result", "Date"])
        .form(FormSchema::new(fields))
        .caps(caps)
}

pub fn referrals(caps: Capabilities) -> ResourceSchema {
    let mut fields = patient_fields();
    fields.extend([
        FieldSpec::text("medicine", "Medicine"),
        FieldSpec::text("dosage", "Dosage"),
        FieldSpec::text("instructions", "Instructions").optional(),
    ]);
    ResourceSchema::new("Referrals", "Referral", "/patientreferrals")
        .columns(&["Patient ID", "Name", "Medicine", "Dosage", "Status", "Date"])
        .form(FormSchema::new(fields))
        .caps(caps)
}

pub fn payments() -> ResourceSchema {
    ResourceSchema::new("Payments", "Payment", "/payments")
        .columns(&["Email", "Amount", "Description", "Reference", "Status", "Date"])
        .caps(Capabilities::READ_ONLY.with_delete())
}

pub fn payment_details(caps: Capabilities) -> ResourceSchema {
    let mut fields = patient_fields();
    fields.extend([
        FieldSpec::text("reason", "Reason"),
        FieldSpec::choice("method", "Method", PAYMENT_METHODS),
        FieldSpec::number("amount", "Amount (ETB)").rule(Rule::Positive),
    ]);
    ResourceSchema::new("Payment Details", "Payment detail", "/paymentdetails")
        .columns(&["Patient ID", "Name", "Reason", "Method", "Amount", "Date"])
        .form(FormSchema::new(fields))
        .caps(caps)
}

pub fn lab_payments(caps: Capabilities) -> ResourceSchema {
    let mut fields = patient_fields();
    fields.extend([
        FieldSpec::text("tests", "Tests"),
        FieldSpec::number("amount", "Amount (ETB)").rule(Rule::Positive),
    ]);
    ResourceSchema::new("Lab Payments", "Lab payment", "/labpaymentdata")
        .columns(&["Patient ID", "Name", "Tests", "Amount", "Status", "Date"])
        .form(FormSchema::new(fields))
        .caps(caps)
}

pub fn general_medicines() -> ResourceSchema {
    ResourceSchema::new("General Medicines", "Medicine", "/general-medicines")
        .columns(&["Name", "Category", "Quantity", "Unit price", "Expiry"])
        .form(FormSchema::new(vec![
            FieldSpec::text("name", "Name"),
            FieldSpec::text("category", "Category"),
            FieldSpec::number("quantity", "Quantity").rule(Rule::Positive),
            FieldSpec::number("unitPrice", "Unit price (ETB)").rule(Rule::Positive),
            FieldSpec::date("expiryDate", "Expiry date").rule(Rule::NotPast),
        ]))
        .caps(Capabilities::FULL)
}

pub fn specific_medicines(caps: Capabilities) -> ResourceSchema {
    let mut fields = patient_fields();
    fields.extend([
        FieldSpec::text("name", "Medicine"),
        FieldSpec::text("dosage", "Dosage"),
    ]);
    ResourceSchema::new("Specific Medicines", "Medicine", "/specific-medicines")
        .columns(&["Patient ID", "Name", "Medicine", "Dosage", "Status"])
        .form(FormSchema::new(fields))
        .caps(caps)
}

/// Patient self-registration.
pub fn signup_form() -> FormSchema {
    let mut fields = person_fields();
    fields.extend(password_fields());
    fields.push(FieldSpec::fixed("role", "user"));
    FormSchema::new(fields)
}

pub fn reset_password_form() -> FormSchema {
    let mut fields = vec![
        FieldSpec::text("email", "Email").rule(Rule::Email),
        FieldSpec::text("token", "Reset code"),
    ];
    fields.extend(password_fields());
    FormSchema::new(fields)
}

pub fn message_form() -> FormSchema {
    FormSchema::new(vec![
        FieldSpec::choice(
            "recipientRole",
            "To",
            &["admin", "doctor", "nurse", "pharmacist", "laboratorist", "card"],
        ),
        FieldSpec::text("subject", "Subject").optional(),
        FieldSpec::text("message", "Message"),
    ])
}

pub fn feedback_form() -> FormSchema {
    FormSchema::new(vec![
        FieldSpec::text("name", "Name"),
        FieldSpec::text("email", "Email").rule(Rule::Email),
        FieldSpec::text("message", "Feedback"),
    ])
}

pub fn payment_form() -> FormSchema {
    FormSchema::new(vec![
        FieldSpec::number("amount", "Amount (ETB)").rule(Rule::Positive),
        FieldSpec::text("description", "Description"),
        FieldSpec::text("email", "Email").rule(Rule::Email),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormState;
    use time::macros::date;

    #[test]
    fn doctor_appointments_are_scoped_to_department() {
        let schema = appointments(Some("general"), Capabilities::READ_ONLY.with_toggle());
        assert_eq!(schema.list_endpoint, "/appointments?department=general");
        assert_eq!(schema.endpoint, "/appointments");
        assert_eq!(schema.record_path("a1"), "/appointments/a1");
    }

    #[test]
    fn admin_list_comes_from_role_endpoint() {
        let schema = admins();
        assert_eq!(schema.list_endpoint, "/users/role/admin");
        assert_eq!(schema.endpoint, "/users");
    }

    #[test]
    fn every_form_column_count_matches_rows() {
        use crate::models::*;
        use crate::resource::Resource;
        assert_eq!(doctors().columns.len(), StaffUser::default().row().len());
        assert_eq!(
            appointments(None, Capabilities::FULL).columns.len(),
            Appointment::default().row().len()
        );
        assert_eq!(
            vital_signs(Capabilities::FULL).columns.len(),
            VitalSigns::default().row().len()
        );
        assert_eq!(
            test_requests(Capabilities::FULL).columns.len(),
            TestRequest::default().row().len()
        );
        assert_eq!(
            test_results(Capabilities::FULL).columns.len(),
            TestResult::default().row().len()
        );
        assert_eq!(
            referrals(Capabilities::FULL).columns.len(),
            Referral::default().row().len()
        );
        assert_eq!(payments().columns.len(), Payment::default().row().len());
        assert_eq!(
            payment_details(Capabilities::FULL).columns.len(),
            PaymentDetail::default().row().len()
        );
        assert_eq!(
            lab_payments(Capabilities::FULL).columns.len(),
            LabPayment::default().row().len()
        );
        assert_eq!(
            general_medicines().columns.len(),
            GeneralMedicine::default().row().len()
        );
        assert_eq!(
            specific_medicines(Capabilities::FULL).columns.len(),
            SpecificMedicine::default().row().len()
        );
    }

    #[test]
    fn vital_signs_form_rejects_fever_out_of_range() {
        let schema = vital_signs(Capabilities::FULL).form.unwrap();
        let mut form = FormState::new(schema);
        for (key, value) in [
            ("patientId", "ET-2024-000001"),
            ("patientName", "Almaz Bekele"),
            ("dateOfBirth", "1990-01-01"),
            ("temperature", "106"),
            ("pulse", "72"),
            ("respiratoryRate", "16"),
            ("oxygenSaturation", "98"),
            ("bloodPressure", "120/80"),
            ("height", "165"),
            ("weight", "60"),
        ] {
            form.set(key, value);
        }
        let today = date!(2024 - 06 - 15);
        assert!(form.validate(today).is_err());
        form.set("temperature", "100");
        assert!(form.validate(today).is_ok());
    }

    #[test]
    fn helper_passwords_use_the_chosen_role() {
        let mut form = FormState::new(helpers(Capabilities::FULL).form.unwrap());
        form.set("role", "laboratorist");
        let password = form.generate_password().unwrap();
        assert!(password.starts_with("Laboratorist@"));
        assert_eq!(form.value("confirmPassword"), password);
    }
}
