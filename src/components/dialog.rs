//! Yes/No confirmation and blocking alert popups.

use super::{DANGER, IDLE, SUCCESS, TEXT, TITLE};
use crate::tui::Frame;
use crate::utils::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};

#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    title: String,
    message: String,
    /// 0: Yes, 1: No
    selected: usize,
}

impl ConfirmDialog {
    /// Opens with "No" selected.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            selected: 1,
        }
    }

    /// `Some(true)` on confirm, `Some(false)` on cancel, `None` while open.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<bool> {
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                self.selected = 1 - self.selected;
                None
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(false),
            KeyCode::Enter => Some(self.selected == 0),
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let dialog_area = centered_rect(44, 8, frame.area());
        frame.render_widget(Clear, dialog_area);

        let dialog_block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(Style::default().fg(TITLE).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(IDLE))
            .style(Style::default().bg(Color::Rgb(30, 30, 46)));
        frame.render_widget(dialog_block.clone(), dialog_area);

        let content = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(dialog_block.inner(dialog_area));

        let message = Paragraph::new(self.message.clone())
            .style(Style::default().fg(TEXT).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, content[0]);

        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(content[1]);
        frame.render_widget(super::button("Yes", self.selected == 0, SUCCESS), buttons[0]);
        frame.render_widget(super::button("No", self.selected == 1, DANGER), buttons[1]);
    }
}

/// Modal message that blocks all input until dismissed with Enter.
pub fn render_alert(frame: &mut Frame, title: &str, message: &str) {
    let area = centered_rect(52, 9, frame.area());
    frame.render_widget(Clear, area);
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Press Enter to continue", Style::default().fg(IDLE))),
    ];
    let alert = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(format!(" {title} "))
                .title_style(Style::default().fg(DANGER).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(DANGER))
                .style(Style::default().bg(Color::Rgb(30, 30, 46))),
        );
    frame.render_widget(alert, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn enter_defaults_to_no() {
        let mut dialog = ConfirmDialog::new("Delete", "Delete this record?");
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), Some(false));
        dialog.handle_key(key(KeyCode::Left));
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), Some(true));
        assert_eq!(dialog.handle_key(key(KeyCode::Up)), None);
    }
}
