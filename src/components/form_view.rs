//! Keyboard-driven rendering of a [`FormState`].

use super::{help_line, paint_background, render_header, BG, DANGER, FOCUS, IDLE, INPUT_BG, PANEL_BG, TEXT};
use crate::api::Body;
use crate::error::ValidationError;
use crate::form::{FieldKind, FormSchema, FormState};
use crate::tui::Frame;
use crate::utils::mask;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{prelude::*, widgets::*};
use time::Date;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    None,
    Submit,
    Cancel,
    /// Ctrl+Y: copy this password to the clipboard.
    Copy(String),
}

const FIELD_HEIGHT: u16 = 3;

pub struct FormView {
    pub state: FormState,
    pub title: String,
    /// Inline message for the last failed validation.
    error: Option<String>,
}

impl FormView {
    pub fn new(title: impl Into<String>, schema: FormSchema) -> Self {
        Self {
            state: FormState::new(schema),
            title: title.into(),
            error: None,
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('g') if ctrl => {
                self.state.generate_password();
            }
            KeyCode::Char('y') if ctrl => {
                let password = self.state.value("password");
                if !password.is_empty() {
                    return FormEvent::Copy(password.to_string());
                }
            }
            KeyCode::Char(c) => {
                self.state.push_char(c);
                self.error = None;
            }
            KeyCode::Backspace => {
                self.state.pop_char();
                self.error = None;
            }
            KeyCode::Tab | KeyCode::Down => self.state.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.state.focus_previous(),
            KeyCode::Left => self.state.cycle_choice(false),
            KeyCode::Right => self.state.cycle_choice(true),
            KeyCode::Enter => return FormEvent::Submit,
            KeyCode::Esc => return FormEvent::Cancel,
            _ => {}
        }
        FormEvent::None
    }

    /// Validates and builds the body. A failure is kept for inline display
    /// and returned so the caller can raise a toast.
    pub fn submit(&mut self, today: Date) -> Result<Body, ValidationError> {
        match self.state.to_body(today) {
            Ok(body) => {
                self.error = None;
                Ok(body)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn display_value(&self, index: usize) -> String {
        let field = &self.state.fields()[index];
        let value = self.state.value_at(index);
        match field.kind {
            FieldKind::Secret => mask(value),
            FieldKind::Choice(_) if self.state.options(field.key).is_empty() => {
                "(none available)".to_string()
            }
            FieldKind::Choice(_) => format!("◄ {value} ►"),
            _ => value.to_string(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(if focused { FOCUS } else { IDLE }))
            .style(Style::default().bg(PANEL_BG));
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(FIELD_HEIGHT),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .margin(1)
            .split(inner);

        let editable: Vec<usize> = (0..self.state.fields().len())
            .filter(|&i| self.state.fields()[i].is_editable())
            .collect();
        let visible = (layout[0].height / FIELD_HEIGHT).max(1) as usize;
        let focus_pos = editable
            .iter()
            .position(|&i| i == self.state.focus())
            .unwrap_or(0);
        let first = focus_pos.saturating_sub(visible.saturating_sub(1));
        let shown: Vec<usize> = editable.into_iter().skip(first).take(visible).collect();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                shown
                    .iter()
                    .map(|_| Constraint::Length(FIELD_HEIGHT))
                    .collect::<Vec<_>>(),
            )
            .split(layout[0]);

        for (slot, &index) in shown.iter().enumerate() {
            let field = &self.state.fields()[index];
            let is_focused = focused && index == self.state.focus();
            let color = if is_focused { FOCUS } else { IDLE };
            let label = if field.required {
                format!(" {} ", field.label)
            } else {
                format!(" {} (optional) ", field.label)
            };
            let input = Paragraph::new(self.display_value(index))
                .style(Style::default().fg(TEXT).bg(INPUT_BG))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .title(Span::styled(label, Style::default().fg(color)))
                        .border_style(Style::default().fg(color))
                        .style(Style::default().bg(INPUT_BG)),
                );
            frame.render_widget(input, rows[slot]);
        }

        if let Some(error) = &self.error {
            let error = Paragraph::new(format!("⚠ {error}"))
                .style(Style::default().fg(DANGER).add_modifier(Modifier::BOLD).bg(BG))
                .alignment(Alignment::Center);
            frame.render_widget(error, layout[1]);
        }

        let mut help = String::from("Tab/↑↓: Field");
        if matches!(
            self.state.focused_field().map(|f| f.kind),
            Some(FieldKind::Choice(_))
        ) {
            help.push_str(" | ←→: Choice");
        }
        help.push_str(" | Enter: Save | Esc: Cancel");
        if self.state.has_password_generator() {
            help.push_str(" | Ctrl+G: Generate password | Ctrl+Y: Copy");
        }
        frame.render_widget(help_line(&help), layout[2]);
    }

    /// Full-screen layout used by the public form screens.
    pub fn render_screen(&self, frame: &mut Frame, heading: &str) {
        paint_background(frame);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(10)])
            .margin(1)
            .split(frame.area());
        render_header(frame, layout[0], heading);
        let column = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(15),
                Constraint::Percentage(70),
                Constraint::Percentage(15),
            ])
            .split(layout[1]);
        self.render(frame, column[1], true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldSpec, PasswordPrefix};
    use time::macros::date;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn view() -> FormView {
        FormView::new(
            "Add Admin",
            FormSchema::new(vec![
                FieldSpec::text("firstName", "First name"),
                FieldSpec::fixed("role", "admin"),
                FieldSpec::secret("password", "Password"),
                FieldSpec::secret("confirmPassword", "Confirm").confirms("password"),
            ])
            .generate_passwords(PasswordPrefix::Field("role")),
        )
    }

    #[test]
    fn typing_goes_to_the_focused_field() {
        let mut view = view();
        for c in "Sara".chars() {
            view.handle_key(key(KeyCode::Char(c)));
        }
        view.handle_key(key(KeyCode::Backspace));
        assert_eq!(view.state.value("firstName"), "Sar");
    }

    #[test]
    fn ctrl_g_fills_passwords_and_ctrl_y_copies() {
        let mut view = view();
        assert_eq!(view.handle_key(ctrl('y')), FormEvent::None);
        view.handle_key(ctrl('g'));
        let password = view.state.value("password").to_string();
        assert!(password.starts_with("Admin@"));
        assert_eq!(view.state.value("firstName"), "");
        assert_eq!(view.handle_key(ctrl('y')), FormEvent::Copy(password));
    }

    #[test]
    fn failed_submit_keeps_inline_error() {
        let mut view = view();
        assert_eq!(view.handle_key(key(KeyCode::Enter)), FormEvent::Submit);
        assert!(view.submit(date!(2024 - 06 - 15)).is_err());
        assert!(view.error.is_some());
        view.handle_key(key(KeyCode::Char('A')));
        assert!(view.error.is_none());
    }
}
