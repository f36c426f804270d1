//! Payment form, checkout wait and the success/failure result screens.

use super::form_view::{FormEvent, FormView};
use super::{
    button, help_line, paint_background, render_header, Component, Ctx, Navigation, Panel,
    PanelEvent, DANGER, FOCUS, IDLE, LINK, PANEL_BG, SUCCESS, TEXT,
};
use crate::api::Body;
use crate::payment::{new_tx_ref, PaymentFlow, PaymentRequest, PaymentState};
use crate::router::{landing_route, Route};
use crate::schemas;
use crate::session::Session;
use crate::tui::Frame;
use crate::utils::copy_to_clipboard;
use crate::validation::today;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use serde_json::Value;
use std::time::{Duration, Instant};

pub struct PaymentPanel {
    form: FormView,
    flow: PaymentFlow,
}

impl PaymentPanel {
    pub fn new(email: Option<&str>) -> Self {
        let mut form = FormView::new("Make a Payment", schemas::payment_form());
        if let Some(email) = email {
            form.state.set("email", email);
        }
        Self {
            form,
            flow: PaymentFlow::new(Duration::from_secs(5), Duration::from_secs(600)),
        }
    }

    fn request(&mut self, ctx: &mut Ctx) -> Option<PaymentRequest> {
        let body = match self.form.submit(today()) {
            Ok(Body::Json(body)) => body,
            Ok(_) => return None,
            Err(e) => {
                ctx.toasts.error(e.to_string());
                return None;
            }
        };
        let text = |key: &str| body.get(key).and_then(Value::as_str).unwrap_or("").to_string();
        Some(PaymentRequest {
            amount: body.get("amount").and_then(Value::as_f64).unwrap_or(0.0),
            description: text("description"),
            email: text("email"),
            tx_ref: new_tx_ref(),
        })
    }

    fn start(&mut self, ctx: &mut Ctx) -> Option<Navigation> {
        let request = self.request(ctx)?;
        self.flow = PaymentFlow::new(
            ctx.config.payment_poll_interval(),
            ctx.config.payment_timeout(),
        );
        match self.flow.initiate(ctx.api, request) {
            PaymentState::Pending { checkout_url, .. } => {
                match copy_to_clipboard(checkout_url) {
                    Ok(()) => ctx
                        .toasts
                        .info("Checkout link copied. Finish the payment in your browser."),
                    Err(e) => ctx.toasts.error(format!("Could not copy checkout link: {e}")),
                }
                None
            }
            PaymentState::Failed { reason } => {
                ctx.toasts.error(reason.clone());
                Some(Navigation::To(Route::PaymentFailure))
            }
            _ => None,
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let lines = match self.flow.state() {
            PaymentState::Pending {
                checkout_url,
                started,
                ..
            } => vec![
                Line::from(Span::styled(
                    "Complete the payment at:",
                    Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    checkout_url.clone(),
                    Style::default().fg(LINK).add_modifier(Modifier::UNDERLINED),
                )),
                Line::from(Span::styled(
                    format!(
                        "Waiting for confirmation ({}s)... Esc: stop waiting",
                        Instant::now().saturating_duration_since(*started).as_secs()
                    ),
                    Style::default().fg(FOCUS),
                )),
            ],
            PaymentState::Initiated { .. } => vec![Line::from(Span::styled(
                "Creating payment...",
                Style::default().fg(IDLE),
            ))],
            PaymentState::Confirmed { tx_ref } => vec![Line::from(Span::styled(
                format!("Payment {tx_ref} confirmed"),
                Style::default().fg(SUCCESS),
            ))],
            PaymentState::Failed { reason } => vec![Line::from(Span::styled(
                reason.clone(),
                Style::default().fg(DANGER),
            ))],
            PaymentState::Idle => vec![Line::from(Span::styled(
                "Payments are processed by the hosted checkout.",
                Style::default().fg(IDLE),
            ))],
        };
        let status = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(IDLE))
                    .style(Style::default().bg(PANEL_BG)),
            );
        frame.render_widget(status, area);
    }
}

impl Panel for PaymentPanel {
    fn title(&self) -> &str {
        "Payment"
    }

    fn load(&mut self, _ctx: &mut Ctx) {}

    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<PanelEvent> {
        if matches!(self.flow.state(), PaymentState::Pending { .. }) {
            if key.code == KeyCode::Esc {
                self.flow.reset();
                ctx.toasts.info("Stopped waiting for the payment");
            }
            return Ok(PanelEvent::Consumed);
        }
        match self.form.handle_key(key) {
            FormEvent::Submit => {
                if let Some(navigation) = self.start(ctx) {
                    return Ok(PanelEvent::Navigate(navigation));
                }
            }
            FormEvent::Cancel => return Ok(PanelEvent::Ignored),
            FormEvent::None | FormEvent::Copy(_) => {}
        }
        Ok(PanelEvent::Consumed)
    }

    fn on_tick(&mut self, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        if !matches!(self.flow.state(), PaymentState::Pending { .. }) {
            return Ok(None);
        }
        let navigation = match self.flow.poll(ctx.api) {
            PaymentState::Confirmed { .. } => Some(Navigation::To(Route::PaymentSuccess)),
            PaymentState::Failed { reason } => {
                ctx.toasts.error(reason.clone());
                Some(Navigation::To(Route::PaymentFailure))
            }
            _ => None,
        };
        Ok(navigation)
    }

    fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(12), Constraint::Length(5)])
            .split(area);
        self.form.render(frame, layout[0], focused);
        self.render_status(frame, layout[1]);
    }
}

/// `/payment` for patients: the payment panel on its own screen.
pub struct PaymentScreen {
    panel: PaymentPanel,
}

impl PaymentScreen {
    pub fn new(session: Option<&Session>) -> Self {
        Self {
            panel: PaymentPanel::new(session.map(|s| s.user.email.as_str())),
        }
    }
}

impl Component for PaymentScreen {
    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        match self.panel.handle_input(key, ctx)? {
            PanelEvent::Navigate(navigation) => Ok(Some(navigation)),
            PanelEvent::Ignored if key.code == KeyCode::Esc => {
                Ok(Some(Navigation::To(landing_route(ctx.session))))
            }
            _ => Ok(None),
        }
    }

    fn on_tick(&mut self, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        self.panel.on_tick(ctx)
    }

    fn render(&self, frame: &mut Frame) {
        paint_background(frame);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(17),
                Constraint::Length(1),
            ])
            .margin(1)
            .split(frame.area());
        render_header(frame, layout[0], "💳 PAYMENT");
        self.panel.render(frame, layout[1], true);
        frame.render_widget(help_line("Esc: Back"), layout[2]);
    }
}

/// `/payment/success` and `/payment/failure`.
pub struct PaymentResult {
    success: bool,
}

impl PaymentResult {
    pub fn success() -> Self {
        Self { success: true }
    }

    pub fn failure() -> Self {
        Self { success: false }
    }
}

impl Component for PaymentResult {
    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => Ok(Some(Navigation::To(landing_route(ctx.session)))),
            _ => Ok(None),
        }
    }

    fn render(&self, frame: &mut Frame) {
        paint_background(frame);
        let (title, message, color) = if self.success {
            (
                "✔ PAYMENT SUCCESSFUL",
                "Your payment has been confirmed. Thank you!",
                SUCCESS,
            )
        } else {
            (
                "✘ PAYMENT FAILED",
                "The payment could not be completed. No charge was confirmed.",
                DANGER,
            )
        };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(2),
            ])
            .margin(2)
            .split(frame.area());
        render_header(frame, layout[0], title);
        let message = Paragraph::new(message)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, layout[1]);
        frame.render_widget(button("Continue", true, color), layout[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::config::Config;
    use crate::session::test_session;
    use crate::toast::Toasts;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(panel: &mut PaymentPanel, ctx: &mut Ctx, text: &str) {
        for c in text.chars() {
            panel.handle_input(key(KeyCode::Char(c)), ctx).unwrap();
        }
    }

    #[test]
    fn submitting_waits_for_verification() {
        let mock = MockTransport::new();
        mock.respond(json!({"checkout_url": "https://checkout.example/1"}));
        mock.respond(json!({"status": "success"}));
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
        let mut screen = PaymentScreen::new(Some(&session));
        assert_eq!(screen.panel.form.state.value("email"), "user@hospital.et");

        type_text(&mut screen.panel, &mut ctx, "150");
        screen.panel.handle_input(key(KeyCode::Tab), &mut ctx).unwrap();
        type_text(&mut screen.panel, &mut ctx, "Card fee");
        let nav = screen.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();

        assert_eq!(nav, None);
        assert!(matches!(screen.panel.flow.state(), PaymentState::Pending { .. }));
        let Body::Json(body) = &mock.requests()[0].body else {
            panic!("expected json");
        };
        assert_eq!(body["amount"], 150.0);
        assert!(body["tx_ref"].as_str().unwrap().starts_with("tx-"));

        let nav = screen.on_tick(&mut ctx).unwrap();
        assert_eq!(nav, Some(Navigation::To(Route::PaymentSuccess)));
    }

    #[test]
    fn rejected_payment_goes_to_failure() {
        let mock = MockTransport::new();
        mock.fail(400, "Invalid amount");
        let api = mock.client();
        let config = Config::default();
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: None,
            toasts: &mut toasts,
            config: &config,
        };
        let mut panel = PaymentPanel::new(Some("a@b.et"));
        type_text(&mut panel, &mut ctx, "10");
        panel.handle_input(key(KeyCode::Tab), &mut ctx).unwrap();
        type_text(&mut panel, &mut ctx, "Lab");

        let event = panel.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();

        assert_eq!(
            event,
            PanelEvent::Navigate(Navigation::To(Route::PaymentFailure))
        );
        assert_eq!(toasts.items()[0].message, "Invalid amount");
    }

    #[test]
    fn result_screen_returns_to_landing() {
        let mock = MockTransport::new();
        let api = mock.client();
        let config = Config::default();
        let session = test_session("card", "");
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: Some(&session),
            toasts: &mut toasts,
            config: &config,
        };
        let mut screen = PaymentResult::success();
        assert_eq!(
            screen.handle_input(key(KeyCode::Enter), &mut ctx).unwrap(),
            Some(Navigation::To(Route::AddHelperForm))
        );
    }
}
