use super::dialog::ConfirmDialog;
use super::form_view::{FormEvent, FormView};
use super::{help_line, Ctx, Panel, PanelEvent, BORDER, DANGER, FOCUS, IDLE, MUTED, PANEL_BG, TEXT, TITLE};
use crate::api::Body;
use crate::form::FormSchema;
use crate::mailbox::{MailItem, Mailbox};
use crate::tui::Frame;
use crate::validation::today;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use serde_json::Value;

enum Mode {
    List,
    Reading,
    Compose,
    ConfirmDelete { id: String, dialog: ConfirmDialog },
}

/// Inbox panel: unread items are bold with a dot, Enter opens and marks
/// read.
pub struct MailboxView<M: MailItem> {
    mailbox: Mailbox<M>,
    state: ListState,
    mode: Mode,
    compose: Option<FormView>,
    load_error: Option<String>,
}

impl<M: MailItem> MailboxView<M> {
    pub fn new(mailbox: Mailbox<M>) -> Self {
        Self {
            mailbox,
            state: ListState::default(),
            mode: Mode::List,
            compose: None,
            load_error: None,
        }
    }

    /// Enables `c` to write a new entry with this form.
    pub fn with_compose(mut self, title: &str, form: FormSchema) -> Self {
        self.compose = Some(FormView::new(title, form));
        self
    }

    fn selected(&self) -> Option<&M> {
        self.state
            .selected()
            .and_then(|i| self.mailbox.items().get(i))
    }

    fn clamp_selection(&mut self) {
        let len = self.mailbox.items().len();
        if len == 0 {
            self.state.select(None);
        } else {
            self.state
                .select(Some(self.state.selected().unwrap_or(0).min(len - 1)));
        }
    }

    fn step(&mut self, forward: bool) {
        let len = self.mailbox.items().len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().unwrap_or(0);
        let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
        self.state.select(Some(next));
    }

    fn open_selected(&mut self, ctx: &mut Ctx) {
        let Some(id) = self.selected().map(|m| m.id().to_string()) else {
            return;
        };
        if let Err(e) = self.mailbox.mark_read(ctx.api, &id) {
            ctx.toasts.error(format!("Could not mark as read: {e}"));
        }
        self.mode = Mode::Reading;
    }

    fn send(&mut self, ctx: &mut Ctx) {
        let Some(form) = self.compose.as_mut() else {
            return;
        };
        let mut body = match form.submit(today()) {
            Ok(Body::Json(value)) => value,
            Ok(_) => {
                ctx.toasts.error("Attachments are not supported here");
                return;
            }
            Err(e) => {
                ctx.toasts.error(e.to_string());
                return;
            }
        };
        if let (Some(session), Value::Object(map)) = (ctx.session, &mut body) {
            map.insert("senderName".into(), session.user.display_name().into());
            map.insert("senderEmail".into(), session.user.email.clone().into());
            map.insert("senderRole".into(), session.user.role.clone().into());
        }
        match self.mailbox.compose(ctx.api, body) {
            Ok(()) => {
                ctx.toasts.success(format!("{} sent", self.mailbox.title.trim_end_matches('s')));
                form.state.reset();
                self.clamp_selection();
                self.mode = Mode::List;
            }
            Err(e) => ctx.toasts.error(e.to_string()),
        }
    }

    fn render_list(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let items: Vec<ListItem> = self
            .mailbox
            .items()
            .iter()
            .map(|item| {
                let (marker, style) = if item.is_read() {
                    ("  ", Style::default().fg(MUTED))
                } else {
                    ("● ", Style::default().fg(TEXT).add_modifier(Modifier::BOLD))
                };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(FOCUS)),
                    Span::styled(format!("{:<12} ", item.date()), Style::default().fg(IDLE)),
                    Span::styled(format!("{:<24} ", item.sender()), style),
                    Span::styled(item.summary(), style),
                ]))
            })
            .collect();

        let title = format!(
            " {} ({} unread) ",
            self.mailbox.title,
            self.mailbox.unread()
        );
        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .title_alignment(Alignment::Center)
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(if focused { IDLE } else { BORDER }))
                    .style(Style::default().bg(PANEL_BG)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Rgb(40, 40, 65))
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(if focused { "► " } else { "  " });
        frame.render_stateful_widget(list, area, &mut self.state.clone());
    }

    fn render_reading(&self, frame: &mut Frame, area: Rect) {
        let Some(item) = self.selected() else {
            return;
        };
        let text = vec![
            Line::from(vec![
                Span::styled("From: ", Style::default().fg(IDLE)),
                Span::styled(item.sender(), Style::default().fg(TEXT)),
            ]),
            Line::from(vec![
                Span::styled("Date: ", Style::default().fg(IDLE)),
                Span::styled(item.date(), Style::default().fg(TEXT)),
            ]),
            Line::from(""),
            Line::from(Span::styled(item.summary(), Style::default().fg(TEXT))),
        ];
        let reading = Paragraph::new(text).wrap(Wrap { trim: false }).block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", self.mailbox.title),
                    Style::default().fg(TITLE),
                ))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(FOCUS))
                .style(Style::default().bg(PANEL_BG)),
        );
        frame.render_widget(Clear, area);
        frame.render_widget(reading, area);
    }
}

impl<M: MailItem> Panel for MailboxView<M> {
    fn title(&self) -> &str {
        self.mailbox.title
    }

    fn load(&mut self, ctx: &mut Ctx) {
        match self.mailbox.load(ctx.api) {
            Ok(_) => self.load_error = None,
            Err(e) => {
                ctx.toasts.error(format!(
                    "Failed to load {}: {e}",
                    self.mailbox.title.to_lowercase()
                ));
                self.load_error = Some(e.to_string());
            }
        }
        self.clamp_selection();
    }

    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<PanelEvent> {
        match &mut self.mode {
            Mode::Reading => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.mode = Mode::List;
                }
            }
            Mode::Compose => {
                let event = match self.compose.as_mut() {
                    Some(form) => form.handle_key(key),
                    None => FormEvent::Cancel,
                };
                match event {
                    FormEvent::Submit => self.send(ctx),
                    FormEvent::Cancel => self.mode = Mode::List,
                    FormEvent::None | FormEvent::Copy(_) => {}
                }
            }
            Mode::ConfirmDelete { id, dialog } => match dialog.handle_key(key) {
                Some(true) => {
                    let id = id.clone();
                    match self.mailbox.delete(ctx.api, &id) {
                        Ok(()) => ctx.toasts.success("Deleted"),
                        Err(e) => ctx.toasts.error(e.to_string()),
                    }
                    self.clamp_selection();
                    self.mode = Mode::List;
                }
                Some(false) => self.mode = Mode::List,
                None => {}
            },
            Mode::List => match key.code {
                KeyCode::Down | KeyCode::Char('j') => self.step(true),
                KeyCode::Up | KeyCode::Char('k') => self.step(false),
                KeyCode::Enter => self.open_selected(ctx),
                KeyCode::Char('a') => {
                    if let Err(e) = self.mailbox.mark_all_read(ctx.api) {
                        ctx.toasts.error(format!("Could not mark all as read: {e}"));
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(id) = self.selected().map(|m| m.id().to_string()) {
                        self.mode = Mode::ConfirmDelete {
                            id,
                            dialog: ConfirmDialog::new("Delete", "Delete this item?"),
                        };
                    }
                }
                KeyCode::Char('c') if self.compose.is_some() => {
                    if let Some(form) = self.compose.as_mut() {
                        form.clear_error();
                    }
                    self.mode = Mode::Compose;
                }
                KeyCode::Char('r') | KeyCode::Char('R') => self.load(ctx),
                _ => return Ok(PanelEvent::Ignored),
            },
        }
        Ok(PanelEvent::Consumed)
    }

    fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        if let (Mode::Compose, Some(form)) = (&self.mode, &self.compose) {
            form.render(frame, area, focused);
            return;
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_list(frame, layout[0], focused);
        if let Some(error) = &self.load_error {
            let error = Paragraph::new(format!("⚠ {error}"))
                .style(Style::default().fg(DANGER))
                .alignment(Alignment::Center);
            frame.render_widget(error, layout[1]);
        }
        let mut help = String::from("↑↓: Select | Enter: Open | a: Mark all read | d: Delete | r: Refresh");
        if self.compose.is_some() {
            help.push_str(" | c: Compose");
        }
        frame.render_widget(help_line(&help), layout[2]);

        match &self.mode {
            Mode::Reading => self.render_reading(frame, layout[0].inner(Margin::new(4, 2))),
            Mode::ConfirmDelete { dialog, .. } => dialog.render(frame),
            _ => {}
        }
    }

    fn badge(&self) -> Option<usize> {
        Some(self.mailbox.unread())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::Method;
    use crate::config::Config;
    use crate::models::{Message, Notification};
    use crate::schemas;
    use crate::session::test_session;
    use crate::toast::Toasts;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn enter_marks_read_and_updates_badge() {
        let mock = MockTransport::new();
        mock.respond(json!([
            {"_id": "n1", "message": "Result ready", "isRead": false},
            {"_id": "n2", "message": "Shift", "isRead": false},
        ]));
        mock.respond(json!({"message": "ok"}));
        let api = mock.client();
        let config = Config::default();
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: None,
            toasts: &mut toasts,
            config: &config,
        };
        let mut view = MailboxView::new(Mailbox::<Notification>::new("Notifications", "/notifications"));
        view.load(&mut ctx);
        assert_eq!(view.badge(), Some(2));

        view.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();

        assert_eq!(view.badge(), Some(1));
        assert!(matches!(view.mode, Mode::Reading));
    }

    #[test]
    fn compose_adds_sender_from_session() {
        let mock = MockTransport::new();
        mock.respond(json!([]));
        mock.respond(json!({"_id": "m1", "message": "Hello", "isRead": false}));
        let api = mock.client();
        let config = Config::default();
        let session = test_session("doctor", "general");
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: Some(&session),
            toasts: &mut toasts,
            config: &config,
        };
        let mut view = MailboxView::new(Mailbox::<Message>::new("Messages", "/messages"))
            .with_compose("New message", schemas::message_form());
        view.load(&mut ctx);

        view.handle_input(key(KeyCode::Char('c')), &mut ctx).unwrap();
        view.handle_input(key(KeyCode::Tab), &mut ctx).unwrap();
        view.handle_input(key(KeyCode::Tab), &mut ctx).unwrap();
        for c in "Hello".chars() {
            view.handle_input(key(KeyCode::Char(c)), &mut ctx).unwrap();
        }
        view.handle_input(key(KeyCode::Enter), &mut ctx).unwrap();

        let post = mock.requests().pop().unwrap();
        assert_eq!(post.method, Method::Post);
        let Body::Json(body) = post.body else {
            panic!("expected json body");
        };
        assert_eq!(body["message"], "Hello");
        assert_eq!(body["recipientRole"], "admin");
        assert_eq!(body["senderEmail"], session.user.email.as_str());
        assert_eq!(view.mailbox.items().len(), 1);
        assert!(matches!(view.mode, Mode::List));
    }
}
