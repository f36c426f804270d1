//! Table, search box, form and delete confirmation for one resource.

use super::dialog::ConfirmDialog;
use super::form_view::{FormEvent, FormView};
use super::{help_line, Ctx, Panel, PanelEvent, BORDER, DANGER, FOCUS, IDLE, INPUT_BG, MUTED, PANEL_BG, TEXT, TITLE};
use crate::resource::{Resource, ResourceController, ResourceSchema};
use crate::tui::Frame;
use crate::utils::copy_to_clipboard;
use crate::validation::today;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};

enum Mode {
    List,
    Search,
    Details,
    Form,
    ConfirmDelete { id: String, dialog: ConfirmDialog },
}

pub struct ResourceView<R: Resource> {
    controller: ResourceController<R>,
    state: TableState,
    mode: Mode,
    form: Option<FormView>,
    /// The panel is only a create form; the table is never shown.
    form_only: bool,
    load_error: Option<String>,
}

impl<R: Resource> ResourceView<R> {
    pub fn new(schema: ResourceSchema) -> Self {
        let form = schema
            .form
            .clone()
            .map(|form| FormView::new(format!("Add {}", schema.noun), form));
        Self {
            controller: ResourceController::new(schema),
            state: TableState::default(),
            mode: Mode::List,
            form,
            form_only: false,
            load_error: None,
        }
    }

    /// Opens straight into the create form and stays there after each save.
    pub fn form_only(mut self) -> Self {
        if self.form.is_some() {
            self.form_only = true;
            self.mode = Mode::Form;
        }
        self
    }

    fn selected(&self) -> Option<&R> {
        self.state
            .selected()
            .and_then(|i| self.controller.filtered().get(i))
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.filtered().len();
        if len == 0 {
            self.state.select(None);
        } else {
            let i = self.state.selected().unwrap_or(0).min(len - 1);
            self.state.select(Some(i));
        }
    }

    fn select_next(&mut self) {
        let len = self.controller.filtered().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    fn select_previous(&mut self) {
        let len = self.controller.filtered().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn open_form(&mut self, record: Option<R>) {
        let noun = self.controller.schema.noun;
        let Some(form) = self.form.as_mut() else {
            return;
        };
        form.clear_error();
        match record {
            Some(record) => {
                form.title = format!("Edit {noun}");
                form.state.populate(record.id(), record.form_values());
            }
            None => {
                form.title = format!("Add {noun}");
                form.state.reset();
            }
        }
        self.mode = Mode::Form;
    }

    fn close_form(&mut self) {
        if self.form_only {
            if let Some(form) = self.form.as_mut() {
                form.state.reset();
            }
        } else {
            self.mode = Mode::List;
        }
    }

    fn submit(&mut self, ctx: &mut Ctx) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let body = match form.submit(today()) {
            Ok(body) => body,
            Err(e) => {
                ctx.toasts.error(e.to_string());
                return;
            }
        };
        let result = match form.state.editing().map(str::to_string) {
            Some(id) => self.controller.update(ctx.api, &id, body),
            None => self.controller.create(ctx.api, body),
        };
        match result {
            Ok(message) => {
                ctx.toasts.success(message);
                self.clamp_selection();
                self.close_form();
            }
            Err(e) => ctx.toasts.error(e.to_string()),
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent, ctx: &mut Ctx) -> PanelEvent {
        let Some(form) = self.form.as_mut() else {
            self.mode = Mode::List;
            return PanelEvent::Consumed;
        };
        match form.handle_key(key) {
            FormEvent::None => {}
            FormEvent::Submit => self.submit(ctx),
            FormEvent::Cancel if self.form_only => return PanelEvent::Ignored,
            FormEvent::Cancel => self.close_form(),
            FormEvent::Copy(password) => match copy_to_clipboard(&password) {
                Ok(()) => ctx.toasts.info("Password copied to clipboard"),
                Err(e) => ctx.toasts.error(format!("Could not copy password: {e}")),
            },
        }
        PanelEvent::Consumed
    }

    fn handle_list_key(&mut self, key: KeyEvent, ctx: &mut Ctx) -> PanelEvent {
        let caps = self.controller.schema.caps;
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Enter if self.selected().is_some() => self.mode = Mode::Details,
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('r') | KeyCode::Char('R') => self.load(ctx),
            KeyCode::Char('n') if caps.create && self.form.is_some() => self.open_form(None),
            KeyCode::Char('e') if caps.edit && self.form.is_some() => {
                if let Some(record) = self.selected().cloned() {
                    self.open_form(Some(record));
                }
            }
            KeyCode::Char('d') if caps.delete => {
                if let Some(id) = self.selected().map(|r| r.id().to_string()) {
                    let noun = self.controller.schema.noun;
                    self.mode = Mode::ConfirmDelete {
                        id,
                        dialog: ConfirmDialog::new(
                            format!("Delete {noun}"),
                            format!("Delete this {}?", noun.to_lowercase()),
                        ),
                    };
                }
            }
            KeyCode::Char('t') if caps.toggle => {
                if let Some(id) = self.selected().map(|r| r.id().to_string()) {
                    match self.controller.toggle_status(ctx.api, &id) {
                        Ok(message) => ctx.toasts.success(message),
                        Err(e) => ctx.toasts.error(e.to_string()),
                    }
                }
            }
            _ => return PanelEvent::Ignored,
        }
        PanelEvent::Consumed
    }

    fn help(&self) -> String {
        let caps = self.controller.schema.caps;
        let mut help = vec!["↑↓: Select", "Enter: Details", "/: Search", "r: Refresh"];
        if caps.create && self.form.is_some() {
            help.push("n: New");
        }
        if caps.edit && self.form.is_some() {
            help.push("e: Edit");
        }
        if caps.delete {
            help.push("d: Delete");
        }
        if caps.toggle {
            help.push("t: Toggle status");
        }
        help.join(" | ")
    }

    fn render_search(&self, frame: &mut Frame, area: Rect) {
        let searching = matches!(self.mode, Mode::Search);
        let color = if searching { FOCUS } else { IDLE };
        let text = if self.controller.query().is_empty() && !searching {
            Span::styled("Press / to search", Style::default().fg(MUTED))
        } else {
            Span::styled(self.controller.query().to_string(), Style::default().fg(TEXT))
        };
        let search = Paragraph::new(Line::from(text)).block(
            Block::default()
                .title(Span::styled(" Search ", Style::default().fg(color)))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(INPUT_BG)),
        );
        frame.render_widget(search, area);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let schema = &self.controller.schema;
        let header_cells = schema
            .columns
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(TITLE)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(INPUT_BG))
            .height(1)
            .bottom_margin(1);

        let rows = self
            .controller
            .filtered()
            .iter()
            .map(|record| Row::new(record.row().into_iter().map(Cell::from)).height(1));

        let count = schema.columns.len().max(1) as u32;
        let widths: Vec<Constraint> = (0..count).map(|_| Constraint::Ratio(1, count)).collect();

        let title = format!(
            " {} ({}/{}) ",
            schema.title,
            self.controller.filtered().len(),
            self.controller.records().len()
        );
        let highlight = if focused {
            Style::default()
                .bg(Color::Rgb(40, 40, 65))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .bg(Color::Rgb(30, 30, 45))
                .add_modifier(Modifier::BOLD)
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .title(title)
                    .title_alignment(Alignment::Center)
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(if focused { IDLE } else { BORDER }))
                    .style(Style::default().bg(PANEL_BG)),
            )
            .style(Style::default().fg(TEXT))
            .row_highlight_style(highlight)
            .highlight_symbol(if focused { "► " } else { "  " });

        frame.render_stateful_widget(table, area, &mut self.state.clone());
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let Some(record) = self.selected() else {
            return;
        };
        let lines: Vec<Line> = self
            .controller
            .schema
            .columns
            .iter()
            .zip(record.row())
            .map(|(column, value)| {
                Line::from(vec![
                    Span::styled(format!("{column}: "), Style::default().fg(IDLE)),
                    Span::styled(value, Style::default().fg(TEXT)),
                ])
            })
            .collect();
        let details = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(format!(" {} details ", self.controller.schema.noun))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(FOCUS))
                .style(Style::default().bg(PANEL_BG)),
        );
        frame.render_widget(Clear, area);
        frame.render_widget(details, area);
    }
}

impl<R: Resource> Panel for ResourceView<R> {
    fn title(&self) -> &str {
        self.controller.schema.title
    }

    fn load(&mut self, ctx: &mut Ctx) {
        if self.form_only {
            return;
        }
        match self.controller.load(ctx.api) {
            Ok(_) => self.load_error = None,
            Err(e) => {
                ctx.toasts.error(format!(
                    "Failed to load {}: {e}",
                    self.controller.schema.title.to_lowercase()
                ));
                self.load_error = Some(e.to_string());
            }
        }
        self.clamp_selection();
    }

    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<PanelEvent> {
        let event = match &mut self.mode {
            Mode::Form => self.handle_form_key(key, ctx),
            Mode::ConfirmDelete { id, dialog } => {
                match dialog.handle_key(key) {
                    Some(true) => {
                        let id = id.clone();
                        match self.controller.delete(ctx.api, &id) {
                            Ok(message) => ctx.toasts.success(message),
                            Err(e) => ctx.toasts.error(e.to_string()),
                        }
                        self.clamp_selection();
                        self.mode = Mode::List;
                    }
                    Some(false) => self.mode = Mode::List,
                    None => {}
                }
                PanelEvent::Consumed
            }
            Mode::Search => {
                let mut query = self.controller.query().to_string();
                match key.code {
                    KeyCode::Char(c) => query.push(c),
                    KeyCode::Backspace => {
                        query.pop();
                    }
                    KeyCode::Esc => {
                        query.clear();
                        self.mode = Mode::List;
                    }
                    KeyCode::Enter | KeyCode::Down | KeyCode::Tab => self.mode = Mode::List,
                    _ => {}
                }
                self.controller.set_query(&query);
                self.clamp_selection();
                PanelEvent::Consumed
            }
            Mode::Details => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.mode = Mode::List;
                }
                PanelEvent::Consumed
            }
            Mode::List => self.handle_list_key(key, ctx),
        };
        Ok(event)
    }

    fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        if self.form_only || matches!(self.mode, Mode::Form) {
            if let Some(form) = &self.form {
                form.render(frame, area, focused);
                return;
            }
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search
                Constraint::Min(5),    // Table
                Constraint::Length(1), // Status
                Constraint::Length(1), // Help
            ])
            .split(area);

        self.render_search(frame, layout[0]);
        self.render_table(frame, layout[1], focused && matches!(self.mode, Mode::List));

        let status = if let Some(error) = &self.load_error {
            Some(format!("⚠ {error}"))
        } else if self.controller.is_stale() {
            Some("⚠ List may be out of date. Press r to refresh.".to_string())
        } else {
            None
        };
        if let Some(status) = status {
            let status = Paragraph::new(status)
                .style(Style::default().fg(DANGER))
                .alignment(Alignment::Center);
            frame.render_widget(status, layout[2]);
        }
        frame.render_widget(help_line(&self.help()), layout[3]);

        match &self.mode {
            Mode::Details => {
                let inner = layout[1].inner(Margin::new(4, 2));
                self.render_details(frame, inner);
            }
            Mode::ConfirmDelete { dialog, .. } => dialog.render(frame),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::Method;
    use crate::config::Config;
    use crate::models::StaffUser;
    use crate::schemas;
    use crate::toast::{ToastKind, Toasts};
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn doctors(mock: &MockTransport) -> ResourceView<StaffUser> {
        mock.respond(json!([
            {"_id": "d1", "firstName": "Hana", "lastName": "Girma", "email": "hana@h.et", "status": "activated"},
            {"_id": "d2", "firstName": "Dawit", "lastName": "Alemu", "email": "dawit@h.et", "status": "activated"},
        ]));
        let mut view = ResourceView::new(schemas::doctors());
        let api = mock.client();
        let config = Config::default();
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: None,
            toasts: &mut toasts,
            config: &config,
        };
        view.load(&mut ctx);
        view
    }

    fn press(view: &mut ResourceView<StaffUser>, mock: &MockTransport, toasts: &mut Toasts, codes: &[KeyCode]) {
        let api = mock.client();
        let config = Config::default();
        let mut ctx = Ctx {
            api: &api,
            session: None,
            toasts,
            config: &config,
        };
        for code in codes {
            view.handle_input(key(*code), &mut ctx).unwrap();
        }
    }

    #[test]
    fn search_narrows_the_table() {
        let mock = MockTransport::new();
        let mut view = doctors(&mock);
        let mut toasts = Toasts::new();
        press(
            &mut view,
            &mock,
            &mut toasts,
            &[KeyCode::Char('/'), KeyCode::Char('d'), KeyCode::Char('a'), KeyCode::Enter],
        );
        assert_eq!(view.controller.filtered().len(), 1);
        assert_eq!(view.selected().unwrap().id, "d2");
    }

    #[test]
    fn invalid_form_never_reaches_the_server() {
        let mock = MockTransport::new();
        let mut view = doctors(&mock);
        let mut toasts = Toasts::new();
        press(&mut view, &mock, &mut toasts, &[KeyCode::Char('n'), KeyCode::Enter]);
        assert_eq!(mock.requests().len(), 1);
        assert_eq!(toasts.items()[0].kind, ToastKind::Error);
        assert!(matches!(view.mode, Mode::Form));
    }

    #[test]
    fn confirmed_delete_removes_the_selected_record() {
        let mock = MockTransport::new();
        let mut view = doctors(&mock);
        mock.respond(json!({"message": "deleted"}));
        let mut toasts = Toasts::new();
        press(
            &mut view,
            &mock,
            &mut toasts,
            &[KeyCode::Char('d'), KeyCode::Char('y')],
        );
        let last = mock.requests().pop().unwrap();
        assert_eq!(last.method, Method::Delete);
        assert_eq!(last.path, "/doctors/d1");
        assert_eq!(view.controller.records().len(), 1);
        assert_eq!(toasts.items()[0].message, "Doctor deleted successfully");
    }

    #[test]
    fn declined_delete_sends_nothing() {
        let mock = MockTransport::new();
        let mut view = doctors(&mock);
        let mut toasts = Toasts::new();
        press(&mut view, &mock, &mut toasts, &[KeyCode::Char('d'), KeyCode::Enter]);
        assert_eq!(mock.requests().len(), 1);
        assert!(matches!(view.mode, Mode::List));
    }

    #[test]
    fn edit_prefills_without_password() {
        let mock = MockTransport::new();
        let mut view = doctors(&mock);
        let mut toasts = Toasts::new();
        press(&mut view, &mock, &mut toasts, &[KeyCode::Down, KeyCode::Char('e')]);
        let form = view.form.as_ref().unwrap();
        assert_eq!(form.state.editing(), Some("d2"));
        assert_eq!(form.state.value("email"), "dawit@h.et");
        assert_eq!(form.state.value("password"), "");
    }

    #[test]
    fn read_only_sections_ignore_mutation_keys() {
        let mock = MockTransport::new();
        mock.respond(json!([]));
        let mut view: ResourceView<crate::models::Payment> = ResourceView::new(schemas::payments());
        let api = mock.client();
        let config = Config::default();
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: None,
            toasts: &mut toasts,
            config: &config,
        };
        view.load(&mut ctx);
        assert_eq!(
            view.handle_input(key(KeyCode::Char('n')), &mut ctx).unwrap(),
            PanelEvent::Ignored
        );
    }
}
