//! Sign-in screen.

use super::landing::{banner, slogan};
use super::{button, help_line, paint_background, Component, Ctx, Navigation, DANGER, FOCUS, IDLE, INPUT_BG, LINK, SUCCESS, TEXT};
use crate::auth::{self, Credentials};
use crate::router::Route;
use crate::tui::Frame;
use crate::utils::mask;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use std::time::{Duration, Instant};

const EMAIL: usize = 0;
const PASSWORD: usize = 1;
const SIGN_IN: usize = 2;
const FORGOT: usize = 3;
const SIGN_UP: usize = 4;
const BACK: usize = 5;
const FOCUS_COUNT: usize = 6;

#[derive(Debug, Default)]
pub struct Login {
    email: String,
    password: String,
    selected_index: usize,
    error_message: Option<String>,
    /// When the error appeared; it hides itself after five seconds.
    error_message_time: Option<Instant>,
}

impl Login {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_error_message(&mut self) {
        self.error_message = None;
        self.error_message_time = None;
    }

    fn set_error_message(&mut self, message: String) {
        self.error_message = Some(message);
        self.error_message_time = Some(Instant::now());
    }

    fn check_error_timeout(&mut self) {
        if let Some(time) = self.error_message_time {
            if time.elapsed() >= Duration::from_secs(5) {
                self.clear_error_message();
            }
        }
    }

    fn attempt_login(&mut self, ctx: &mut Ctx) -> Option<Navigation> {
        if self.email.trim().is_empty() {
            self.set_error_message("Email cannot be empty.".to_string());
            return None;
        }
        if self.password.is_empty() {
            self.set_error_message("Password cannot be empty.".to_string());
            return None;
        }
        let credentials = Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        };
        match auth::login(ctx.api, &credentials) {
            Ok(session) => {
                ctx.toasts
                    .success(format!("Welcome, {}", session.user.display_name()));
                self.password.clear();
                Some(Navigation::LoggedIn(session))
            }
            Err(e) => {
                self.password.clear();
                ctx.toasts.error(e.to_string());
                self.set_error_message(e.to_string());
                None
            }
        }
    }
}

impl Component for Login {
    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        self.check_error_timeout();
        match key.code {
            KeyCode::Char(c) if self.selected_index <= PASSWORD => {
                if self.selected_index == EMAIL {
                    self.email.push(c);
                } else {
                    self.password.push(c);
                }
                self.clear_error_message();
            }
            KeyCode::Backspace => {
                if self.selected_index == EMAIL {
                    self.email.pop();
                } else if self.selected_index == PASSWORD {
                    self.password.pop();
                }
                self.clear_error_message();
            }
            KeyCode::Tab | KeyCode::Down => {
                self.selected_index = (self.selected_index + 1) % FOCUS_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.selected_index = (self.selected_index + FOCUS_COUNT - 1) % FOCUS_COUNT;
            }
            KeyCode::Enter => {
                return Ok(match self.selected_index {
                    FORGOT => Some(Navigation::To(Route::ForgotPassword)),
                    SIGN_UP => Some(Navigation::To(Route::Signup)),
                    BACK => Some(Navigation::To(Route::Landing)),
                    _ => self.attempt_login(ctx),
                });
            }
            KeyCode::Esc => return Ok(Some(Navigation::To(Route::Landing))),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        paint_background(frame);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7), // Banner
                Constraint::Length(1), // Slogan
                Constraint::Length(1), // Spacing
                Constraint::Length(1), // Subtitle
                Constraint::Length(1), // Spacing
                Constraint::Length(3), // Email
                Constraint::Length(3), // Password
                Constraint::Length(2), // Error
                Constraint::Length(1), // Sign in
                Constraint::Length(1), // Links
                Constraint::Min(0),
                Constraint::Length(1), // Help
            ])
            .margin(1)
            .split(frame.area());

        frame.render_widget(banner(), layout[0]);
        frame.render_widget(slogan(), layout[1]);

        let subtitle = Paragraph::new(Span::styled(
            "Sign in to continue",
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        frame.render_widget(subtitle, layout[3]);

        let input = |label: &'static str, value: String, focused: bool| {
            let color = if focused { FOCUS } else { IDLE };
            Paragraph::new(value)
                .style(Style::default().fg(TEXT).bg(INPUT_BG))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .title(Span::styled(label, Style::default().fg(color)))
                        .border_style(Style::default().fg(color)),
                )
        };
        let column = |area: Rect| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(25),
                    Constraint::Percentage(50),
                    Constraint::Percentage(25),
                ])
                .split(area)[1]
        };

        frame.render_widget(
            input(" Email ", self.email.clone(), self.selected_index == EMAIL),
            column(layout[5]),
        );
        frame.render_widget(
            input(" Password ", mask(&self.password), self.selected_index == PASSWORD),
            column(layout[6]),
        );

        if let Some(error) = &self.error_message {
            let error = Paragraph::new(error.as_str())
                .style(Style::default().fg(DANGER))
                .alignment(Alignment::Center);
            frame.render_widget(error, layout[7]);
        }

        frame.render_widget(
            button("Sign In", self.selected_index == SIGN_IN, SUCCESS),
            layout[8],
        );

        let links = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(34),
                Constraint::Percentage(33),
                Constraint::Percentage(33),
            ])
            .split(layout[9]);
        frame.render_widget(
            button("Forgot password?", self.selected_index == FORGOT, LINK),
            links[0],
        );
        frame.render_widget(
            button("Create account", self.selected_index == SIGN_UP, LINK),
            links[1],
        );
        frame.render_widget(button("Back", self.selected_index == BACK, DANGER), links[2]);

        frame.render_widget(
            help_line("Tab/↑↓: Move | Enter: Select | Esc: Back"),
            layout[11],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::config::Config;
    use crate::toast::Toasts;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_into(login: &mut Login, ctx: &mut Ctx, text: &str) {
        for c in text.chars() {
            login.handle_input(key(KeyCode::Char(c)), ctx).unwrap();
        }
    }

    #[test]
    fn successful_login_hands_over_the_session() {
        let mock = MockTransport::new();
        mock.respond(json!({"token": "jwt", "user": {"role": "nurse", "email": "n@h.et"}}));
        let api = mock.client();
        let config = Config::default();
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: None,
            toasts: &mut toasts,
            config: &config,
        };
        let mut login = Login::new();
        type_into(&mut login, &mut ctx, "n@h.et");
        login.handle_input(key(KeyCode::Tab), &mut ctx).unwrap();
        type_into(&mut login, &mut ctx, "Nurse@1234");

        let nav = login.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();

        let Some(Navigation::LoggedIn(session)) = nav else {
            panic!("expected a session, got {nav:?}");
        };
        assert_eq!(session.token, "jwt");
        assert!(login.password.is_empty());
    }

    #[test]
    fn empty_fields_are_rejected_locally() {
        let mock = MockTransport::new();
        let api = mock.client();
        let config = Config::default();
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: None,
            toasts: &mut toasts,
            config: &config,
        };
        let mut login = Login::new();
        assert_eq!(login.handle_input(key(KeyCode::Enter), &mut ctx).unwrap(), None);
        assert_eq!(login.error_message.as_deref(), Some("Email cannot be empty."));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn failed_login_shows_server_message() {
        let mock = MockTransport::new();
        mock.fail(401, "Invalid credentials");
        let api = mock.client();
        let config = Config::default();
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: None,
            toasts: &mut toasts,
            config: &config,
        };
        let mut login = Login::new();
        type_into(&mut login, &mut ctx, "a@b.et");
        login.handle_input(key(KeyCode::Tab), &mut ctx).unwrap();
        type_into(&mut login, &mut ctx, "wrong");
        login.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();
        assert_eq!(login.error_message.as_deref(), Some("Invalid credentials"));
        assert_eq!(toasts.items().len(), 1);
    }
}
