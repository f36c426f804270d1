//! Public landing menu.

use super::dialog::ConfirmDialog;
use super::{help_line, paint_background, Component, Ctx, Navigation, BORDER, FOCUS, IDLE, LINK, PANEL_BG, TEXT};
use crate::router::{landing_route, Route};
use crate::tui::Frame;
use crate::utils::centered_rect;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};

const BANNER: &[&str] = &[
    "███╗   ███╗███████╗██████╗ ██╗██████╗  █████╗ ███████╗██╗  ██╗",
    "████╗ ████║██╔════╝██╔══██╗██║██╔══██╗██╔══██╗██╔════╝██║  ██║",
    "██╔████╔██║█████╗  ██║  ██║██║██║  ██║███████║███████╗███████║",
    "██║╚██╔╝██║██╔══╝  ██║  ██║██║██║  ██║██╔══██║╚════██║██╔══██║",
    "██║ ╚═╝ ██║███████╗██████╔╝██║██████╔╝██║  ██║███████║██║  ██║",
    "╚═╝     ╚═╝╚══════╝╚═════╝ ╚═╝╚═════╝ ╚═╝  ╚═╝╚══════╝╚═╝  ╚═╝",
];

pub fn banner() -> Paragraph<'static> {
    Paragraph::new(Text::from(
        BANNER.iter().map(|line| Line::from(*line)).collect::<Vec<_>>(),
    ))
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::Cyan))
}

pub fn slogan() -> Paragraph<'static> {
    Paragraph::new(Span::styled(
        "Hospital administration from your terminal",
        Style::default()
            .fg(LINK)
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Book,
    Lookup,
    Dashboard,
    Login,
    Signup,
    About,
    Logout,
    Exit,
}

impl Entry {
    fn label(self) -> &'static str {
        match self {
            Entry::Book => "Book an Appointment",
            Entry::Lookup => "Find My Appointments",
            Entry::Dashboard => "Go to Dashboard",
            Entry::Login => "Staff & Patient Login",
            Entry::Signup => "Create an Account",
            Entry::About => "About Us",
            Entry::Logout => "Logout",
            Entry::Exit => "Exit",
        }
    }
}

pub struct Landing {
    /// Name of the signed-in user, captured on mount.
    signed_in: Option<String>,
    state: ListState,
    exit_dialog: Option<ConfirmDialog>,
}

impl Landing {
    pub fn new() -> Self {
        let mut state = ListState::default();
        state.select(Some(0));
        Self {
            signed_in: None,
            state,
            exit_dialog: None,
        }
    }

    fn entries(&self) -> Vec<Entry> {
        let mut entries = vec![Entry::Book, Entry::Lookup];
        if self.signed_in.is_some() {
            entries.extend([Entry::Dashboard, Entry::Logout]);
        } else {
            entries.extend([Entry::Login, Entry::Signup]);
        }
        entries.extend([Entry::About, Entry::Exit]);
        entries
    }

    fn activate(&mut self, entry: Entry, ctx: &Ctx) -> Option<Navigation> {
        let route = match entry {
            Entry::Book => Route::Appointment,
            Entry::Lookup => Route::AppointmentLookup,
            Entry::Dashboard => landing_route(ctx.session),
            Entry::Login => Route::Login,
            Entry::Signup => Route::Signup,
            Entry::About => Route::AboutUs,
            Entry::Logout => return Some(Navigation::Logout),
            Entry::Exit => {
                self.exit_dialog = Some(ConfirmDialog::new(
                    "Confirm Exit",
                    "Are you sure you want to quit?",
                ));
                return None;
            }
        };
        Some(Navigation::To(route))
    }
}

impl Component for Landing {
    fn on_mount(&mut self, ctx: &mut Ctx) -> Result<()> {
        self.signed_in = ctx.session.map(|s| s.user.display_name());
        Ok(())
    }

    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        if let Some(dialog) = self.exit_dialog.as_mut() {
            return Ok(match dialog.handle_key(key) {
                Some(true) => Some(Navigation::Quit),
                Some(false) => {
                    self.exit_dialog = None;
                    None
                }
                None => None,
            });
        }

        let entries = self.entries();
        let selected = self.state.selected().unwrap_or(0).min(entries.len() - 1);
        match key.code {
            KeyCode::Down | KeyCode::Tab => self.state.select(Some((selected + 1) % entries.len())),
            KeyCode::Up | KeyCode::BackTab => {
                self.state
                    .select(Some((selected + entries.len() - 1) % entries.len()))
            }
            KeyCode::Enter => return Ok(self.activate(entries[selected], ctx)),
            KeyCode::Esc | KeyCode::Char('q') => return Ok(self.activate(Entry::Exit, ctx)),
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
                Constraint::Length(1), // Greeting
                Constraint::Min(10),   // Menu
                Constraint::Length(1), // Help
            ])
            .margin(1)
            .split(frame.area());

        frame.render_widget(banner(), layout[0]);
        frame.render_widget(slogan(), layout[1]);

        if let Some(name) = &self.signed_in {
            let greeting = Paragraph::new(Line::from(vec![
                Span::styled("Signed in as ", Style::default().fg(IDLE)),
                Span::styled(name.clone(), Style::default().fg(LINK).add_modifier(Modifier::BOLD)),
            ]))
            .alignment(Alignment::Center);
            frame.render_widget(greeting, layout[2]);
        }

        let entries = self.entries();
        let selected = self.state.selected().unwrap_or(0);
        let items: Vec<ListItem> = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                if idx == selected {
                    ListItem::new(format!(" ► {}", entry.label()))
                        .style(Style::default().fg(FOCUS).add_modifier(Modifier::BOLD))
                } else {
                    ListItem::new(format!("   {}", entry.label())).style(Style::default().fg(TEXT))
                }
            })
            .collect();

        let menu_area = centered_rect(40, entries.len() as u16 + 4, layout[3]);
        let menu = List::new(items).block(
            Block::default()
                .title(" Welcome ")
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER))
                .padding(Padding::new(1, 1, 1, 0))
                .style(Style::default().bg(PANEL_BG)),
        );
        frame.render_widget(menu, menu_area);
        frame.render_widget(help_line("↑↓: Move | Enter: Select | Esc: Exit"), layout[4]);

        if let Some(dialog) = &self.exit_dialog {
            dialog.render(frame);
        }
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

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn signed_in_users_see_their_dashboard() {
        let mock = MockTransport::new();
        let api = mock.client();
        let config = Config::default();
        let session = test_session("pharmacist", "");
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: Some(&session),
            toasts: &mut toasts,
            config: &config,
        };
        let mut landing = Landing::new();
        landing.on_mount(&mut ctx).unwrap();

        landing.handle_input(key(KeyCode::Down), &mut ctx).unwrap();
        landing.handle_input(key(KeyCode::Down), &mut ctx).unwrap();
        assert_eq!(
            landing.handle_input(key(KeyCode::Enter), &mut ctx).unwrap(),
            Some(Navigation::To(Route::Pharmacist))
        );
    }

    #[test]
    fn exit_asks_first() {
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
        let mut landing = Landing::new();
        assert_eq!(landing.handle_input(key(KeyCode::Esc), &mut ctx).unwrap(), None);
        assert_eq!(
            landing.handle_input(key(KeyCode::Char('y')), &mut ctx).unwrap(),
            Some(Navigation::Quit)
        );
    }
}
