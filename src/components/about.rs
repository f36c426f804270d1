//! About-us page with a feedback form.

use super::form_view::{FormEvent, FormView};
use super::{paint_background, render_header, Component, Ctx, Navigation, BORDER, LINK, PANEL_BG, TEXT, TITLE};
use crate::api::Body;
use crate::mailbox::Mailbox;
use crate::models::Feedback;
use crate::router::Route;
use crate::schemas;
use crate::tui::Frame;
use crate::validation::today;
use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::{prelude::*, widgets::*};

const ABOUT: &[&str] = &[
    "We are a general hospital serving the community with outpatient,",
    "inpatient, laboratory and pharmacy services under one roof.",
    "",
    "Departments: general medicine, cardiology, pediatrics, gynecology,",
    "orthopedics, neurology, dermatology, ophthalmology, dental and",
    "emergency care.",
    "",
    "Book an appointment from the main menu, or leave us a note using",
    "the feedback form. Every message is read by our administration.",
];

pub struct AboutUs {
    feedback: Mailbox<Feedback>,
    form: FormView,
}

impl AboutUs {
    pub fn new() -> Self {
        Self {
            feedback: Mailbox::new("Feedback", "/feedback"),
            form: FormView::new("Send us feedback", schemas::feedback_form()),
        }
    }
}

impl Component for AboutUs {
    fn on_mount(&mut self, ctx: &mut Ctx) -> Result<()> {
        if let Some(session) = ctx.session {
            self.form.state.set("name", session.user.display_name());
            self.form.state.set("email", session.user.email.clone());
        }
        Ok(())
    }

    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        match self.form.handle_key(key) {
            FormEvent::Submit => {
                let body = match self.form.submit(today()) {
                    Ok(Body::Json(body)) => body,
                    Ok(_) => return Ok(None),
                    Err(e) => {
                        ctx.toasts.error(e.to_string());
                        return Ok(None);
                    }
                };
                match self.feedback.compose(ctx.api, body) {
                    Ok(()) => {
                        ctx.toasts.success("Thank you for your feedback!");
                        self.form.state.reset();
                    }
                    Err(e) => ctx.toasts.error(e.to_string()),
                }
            }
            FormEvent::Cancel => return Ok(Some(Navigation::To(Route::Landing))),
            FormEvent::None | FormEvent::Copy(_) => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        paint_background(frame);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(12)])
            .margin(1)
            .split(frame.area());
        render_header(frame, layout[0], "🏥 ABOUT US");

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .spacing(2)
            .split(layout[1]);

        let mut lines: Vec<Line> = vec![Line::from(Span::styled(
            "Caring for you, every day",
            Style::default().fg(LINK).add_modifier(Modifier::BOLD),
        ))];
        lines.push(Line::from(""));
        lines.extend(
            ABOUT
                .iter()
                .map(|line| Line::from(Span::styled(*line, Style::default().fg(TEXT)))),
        );
        let about = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(Span::styled(" Who we are ", Style::default().fg(TITLE)))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER))
                .padding(Padding::uniform(1))
                .style(Style::default().bg(PANEL_BG)),
        );
        frame.render_widget(about, columns[0]);
        self.form.render(frame, columns[1], true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::config::Config;
    use crate::session::test_session;
    use crate::toast::{ToastKind, Toasts};
    use crossterm::event::{KeyCode, KeyModifiers};
    use serde_json::json;

    #[test]
    fn signed_in_feedback_is_prefilled_and_sent() {
        let mock = MockTransport::new();
        mock.respond(json!({"message": "saved"}));
        let api = mock.client();
        let config = Config::default();
        let session = test_session("user", "");
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: Some(&session),
            toasts: &mut toasts,
            config: &config,
        };
        let mut about = AboutUs::new();
        about.on_mount(&mut ctx).unwrap();
        about.form.state.set("message", "Friendly staff");

        about
            .handle_input(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), &mut ctx)
            .unwrap();

        let request = &mock.requests()[0];
        assert_eq!(request.path, "/feedback");
        assert_eq!(
            request.body,
            Body::Json(json!({
                "name": "Abebe Kebede",
                "email": "user@hospital.et",
                "message": "Friendly staff"
            }))
        );
        assert_eq!(toasts.items()[0].kind, ToastKind::Success);
        assert_eq!(about.form.state.value("message"), "");
    }
}
