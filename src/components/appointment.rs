//! Public appointment booking and lookup by email.

use super::form_view::{FormEvent, FormView};
use super::{
    help_line, paint_background, render_header, Component, Ctx, Navigation, BORDER, DANGER,
    INPUT_BG, MUTED, PANEL_BG, TEXT, TITLE,
};
use crate::api::{self, encode_component, ApiClient};
use crate::error::ApiError;
use crate::form::{FieldSpec, FormSchema, Rule};
use crate::models::Appointment;
use crate::resource::{Capabilities, Resource};
use crate::router::Route;
use crate::schemas;
use crate::tui::Frame;
use crate::validation::{parse_date, today};
use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::{prelude::*, widgets::*};
use serde_json::Value;
use tracing::warn;

/// Free time slots for one department and day.
pub fn available_slots(api: &ApiClient, department: &str, date: &str) -> Result<Vec<String>, ApiError> {
    let path = format!(
        "/appointments/available-slots?department={}&date={}",
        encode_component(department),
        encode_component(date)
    );
    let items = api::unwrap_list(api.get(&path)?).unwrap_or_default();
    Ok(items
        .iter()
        .filter_map(|slot| match slot {
            Value::String(time) => Some(time.clone()),
            other => other.get("time").and_then(Value::as_str).map(str::to_string),
        })
        .collect())
}

pub struct BookAppointment {
    form: FormView,
    /// Department and date the time choices were last fetched for.
    slots_for: Option<(String, String)>,
}

impl BookAppointment {
    pub fn new() -> Self {
        Self {
            form: FormView::new("Book an Appointment", schemas::booking_form()),
            slots_for: None,
        }
    }

    /// Re-fetches the time choices once the department or a complete date
    /// changes.
    fn refresh_slots(&mut self, ctx: &mut Ctx) {
        let department = self.form.state.value("department").to_string();
        let date = self.form.state.value("date").trim().to_string();
        if parse_date("date", &date).is_err() {
            return;
        }
        let key = (department, date);
        if self.slots_for.as_ref() == Some(&key) {
            return;
        }
        let slots = match available_slots(ctx.api, &key.0, &key.1) {
            Ok(slots) => slots,
            Err(e) => {
                warn!(error = %e, "could not load time slots");
                ctx.toasts.error(format!("Could not load time slots: {e}"));
                Vec::new()
            }
        };
        if slots.is_empty() {
            ctx.toasts.info("No free time slots for that day");
        }
        self.form.state.set_options("time", slots);
        self.slots_for = Some(key);
    }

    fn book(&mut self, ctx: &mut Ctx) {
        let body = match self.form.submit(today()) {
            Ok(body) => body,
            Err(e) => {
                ctx.toasts.error(e.to_string());
                return;
            }
        };
        match ctx.api.post_body("/appointments", body) {
            Ok(_) => {
                ctx.toasts.success(format!(
                    "Appointment booked for {} at {}",
                    self.form.state.value("date"),
                    self.form.state.value("time")
                ));
                self.form.state.reset();
                self.slots_for = None;
            }
            Err(e) => ctx.toasts.error(e.to_string()),
        }
    }
}

impl Component for BookAppointment {
    fn on_mount(&mut self, ctx: &mut Ctx) -> Result<()> {
        if let Some(session) = ctx.session {
            self.form.state.set("patientName", session.user.display_name());
            self.form.state.set("email", session.user.email.clone());
        }
        Ok(())
    }

    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        match self.form.handle_key(key) {
            FormEvent::Submit => self.book(ctx),
            FormEvent::Cancel => return Ok(Some(Navigation::To(Route::Landing))),
            FormEvent::None | FormEvent::Copy(_) => self.refresh_slots(ctx),
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        self.form.render_screen(frame, "📅 BOOK AN APPOINTMENT");
    }
}

pub struct AppointmentLookup {
    form: FormView,
    results: Option<Vec<Appointment>>,
    columns: Vec<&'static str>,
}

impl AppointmentLookup {
    pub fn new() -> Self {
        let schema = FormSchema::new(vec![FieldSpec::text("email", "Email").rule(Rule::Email)]);
        Self {
            form: FormView::new("Find my appointments", schema),
            results: None,
            columns: schemas::appointments(None, Capabilities::READ_ONLY).columns,
        }
    }

    fn search(&mut self, ctx: &mut Ctx) {
        if let Err(e) = self.form.submit(today()) {
            ctx.toasts.error(e.to_string());
            return;
        }
        let path = format!(
            "/appointments?email={}",
            encode_component(self.form.state.value("email").trim())
        );
        match ctx.api.get(&path) {
            Ok(response) => {
                let appointments: Vec<Appointment> = api::unwrap_list(response)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|value| serde_json::from_value(value).ok())
                    .collect();
                if appointments.is_empty() {
                    ctx.toasts.info("No appointments found for that email");
                }
                self.results = Some(appointments);
            }
            Err(e) => ctx.toasts.error(e.to_string()),
        }
    }
}

impl Component for AppointmentLookup {
    fn on_mount(&mut self, ctx: &mut Ctx) -> Result<()> {
        if let Some(session) = ctx.session {
            self.form.state.set("email", session.user.email.clone());
        }
        Ok(())
    }

    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        match self.form.handle_key(key) {
            FormEvent::Submit => self.search(ctx),
            FormEvent::Cancel => return Ok(Some(Navigation::To(Route::Landing))),
            FormEvent::None | FormEvent::Copy(_) => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        paint_background(frame);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(8),
                Constraint::Min(6),
                Constraint::Length(1),
            ])
            .margin(1)
            .split(frame.area());
        render_header(frame, layout[0], "📅 MY APPOINTMENTS");
        self.form.render(frame, layout[1], true);

        let block = Block::default()
            .title(" Appointments ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER))
            .style(Style::default().bg(PANEL_BG));

        match &self.results {
            None => {
                let hint = Paragraph::new("Enter your email and press Enter")
                    .style(Style::default().fg(MUTED))
                    .alignment(Alignment::Center)
                    .block(block);
                frame.render_widget(hint, layout[2]);
            }
            Some(results) if results.is_empty() => {
                let empty = Paragraph::new("No appointments found")
                    .style(Style::default().fg(DANGER))
                    .alignment(Alignment::Center)
                    .block(block);
                frame.render_widget(empty, layout[2]);
            }
            Some(results) => {
                let header = Row::new(
                    self.columns
                        .iter()
                        .map(|h| Cell::from(*h).style(Style::default().fg(TITLE))),
                )
                .style(Style::default().bg(INPUT_BG))
                .bottom_margin(1);
                let rows = results
                    .iter()
                    .map(|a| Row::new(a.row().into_iter().map(Cell::from)));
                let count = self.columns.len() as u32;
                let widths: Vec<Constraint> =
                    (0..count).map(|_| Constraint::Ratio(1, count)).collect();
                let table = Table::new(rows, widths)
                    .header(header)
                    .style(Style::default().fg(TEXT))
                    .block(block);
                frame.render_widget(table, layout[2]);
            }
        }
        frame.render_widget(help_line("Enter: Search | Esc: Back"), layout[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::{Body, Method};
    use crate::config::Config;
    use crate::toast::Toasts;
    use crossterm::event::{KeyCode, KeyModifiers};
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn slots_accept_strings_and_objects() {
        let mock = MockTransport::new();
        mock.respond(json!({"availableSlots": ["09:00", {"time": "09:30"}, 5]}));
        let slots = available_slots(&mock.client(), "general", "2030-01-02").unwrap();
        assert_eq!(slots, ["09:00", "09:30"]);
        assert_eq!(
            mock.requests()[0].path,
            "/appointments/available-slots?department=general&date=2030-01-02"
        );
    }

    #[test]
    fn completing_the_date_loads_slots_then_books() {
        let mock = MockTransport::new();
        mock.respond(json!(["10:00", "10:30"]));
        mock.respond(json!({"message": "Appointment created"}));
        let api = mock.client();
        let config = Config::default();
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: None,
            toasts: &mut toasts,
            config: &config,
        };
        let mut booking = BookAppointment::new();
        booking.form.state.set("patientName", "Almaz Bekele");
        booking.form.state.set("phone", "0911223344");
        booking.form.state.set("date", "2099-03-0");
        // Typing the last digit completes the date.
        for _ in 0..4 {
            booking.handle_input(key(KeyCode::Tab), &mut ctx).unwrap();
        }
        booking.handle_input(key(KeyCode::Char('1')), &mut ctx).unwrap();

        assert_eq!(booking.form.state.options("time"), ["10:00", "10:30"]);
        assert_eq!(booking.form.state.value("time"), "10:00");

        booking.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, Method::Post);
        let Body::Json(body) = &requests[1].body else {
            panic!("expected json");
        };
        assert_eq!(body["time"], "10:00");
        assert_eq!(body["department"], "general");
        assert_eq!(booking.form.state.value("patientName"), "");
    }

    #[test]
    fn lookup_lists_appointments_for_email() {
        let mock = MockTransport::new();
        mock.respond(json!({"appointments": [{"_id": "a1", "patientName": "Almaz", "time": "09:00"}]}));
        let api = mock.client();
        let config = Config::default();
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: None,
            toasts: &mut toasts,
            config: &config,
        };
        let mut lookup = AppointmentLookup::new();
        lookup.form.state.set("email", "almaz@mail.et");
        lookup.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();

        assert_eq!(mock.requests()[0].path, "/appointments?email=almaz%40mail.et");
        assert_eq!(lookup.results.as_ref().map(Vec::len), Some(1));
    }
}
