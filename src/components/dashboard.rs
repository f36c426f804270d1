//! Role dashboards: a sidebar of sections and the selected section's panel.

use super::dialog::ConfirmDialog;
use super::mailbox_view::MailboxView;
use super::payment_view::PaymentPanel;
use super::resource_view::ResourceView;
use super::{
    help_line, paint_background, Component, Ctx, Navigation, Panel, PanelEvent, BORDER, FOCUS,
    IDLE, LINK, PANEL_BG, SUCCESS, TEXT, TITLE,
};
use crate::api::encode_component;
use crate::mailbox::{MailItem, Mailbox};
use crate::models::{
    Appointment, Feedback, GeneralMedicine, LabPayment, Message, Notification, Payment,
    PaymentDetail, Referral, SpecificMedicine, StaffUser, TestRequest, TestResult, VitalSigns,
};
use crate::resource::{Capabilities, Resource, ResourceSchema};
use crate::router::Route;
use crate::schemas;
use crate::session::{Session, UserProfile};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Sidebar,
    Content,
}

/// `/admin/payment-details` style slug for a section title.
fn slug(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

fn resource<R: Resource>(schema: ResourceSchema) -> Box<dyn Panel> {
    Box::new(ResourceView::<R>::new(schema))
}

fn inbox<M: MailItem>(mailbox: Mailbox<M>) -> Box<dyn Panel> {
    Box::new(MailboxView::new(mailbox))
}

fn notifications(user: &UserProfile) -> Box<dyn Panel> {
    inbox(
        Mailbox::<Notification>::new("Notifications", "/notifications").list_from(format!(
            "/notifications/{}/{}",
            encode_component(&user.role),
            encode_component(&user.email)
        )),
    )
}

fn messages() -> Box<dyn Panel> {
    Box::new(
        MailboxView::new(Mailbox::<Message>::new("Messages", "/messages"))
            .with_compose("New Message", schemas::message_form()),
    )
}

fn helper_form() -> Box<dyn Panel> {
    Box::new(ResourceView::<StaffUser>::new(schemas::helpers(Capabilities::FULL)).form_only())
}

fn payment(user: &UserProfile) -> Box<dyn Panel> {
    Box::new(PaymentPanel::new(Some(&user.email)))
}

fn admin_panels(user: &UserProfile) -> Vec<Box<dyn Panel>> {
    vec![
        resource::<StaffUser>(schemas::admins()),
        resource::<StaffUser>(schemas::doctors()),
        resource::<StaffUser>(schemas::helpers(Capabilities::FULL.with_toggle())),
        resource::<Payment>(schemas::payments()),
        resource::<PaymentDetail>(schemas::payment_details(
            Capabilities::READ_ONLY.with_delete(),
        )),
        inbox(Mailbox::<Feedback>::new("Feedback", "/feedback")),
        messages(),
        notifications(user),
    ]
}

fn doctor_panels(user: &UserProfile, department: &str) -> Vec<Box<dyn Panel>> {
    vec![
        resource::<Appointment>(schemas::appointments(
            Some(department),
            Capabilities::READ_ONLY.with_toggle(),
        )),
        resource::<VitalSigns>(schemas::vital_signs(Capabilities::READ_ONLY)),
        resource::<TestRequest>(schemas::test_requests(Capabilities::READ_ONLY.with_create())),
        resource::<TestResult>(schemas::test_results(Capabilities::READ_ONLY)),
        resource::<Referral>(schemas::referrals(Capabilities::READ_ONLY.with_create())),
        resource::<SpecificMedicine>(schemas::specific_medicines(
            Capabilities::READ_ONLY.with_create(),
        )),
        messages(),
        notifications(user),
    ]
}

/// Nurses and card office staff on `/UsersDashboard`.
fn ward_panels(user: &UserProfile) -> Vec<Box<dyn Panel>> {
    vec![
        resource::<VitalSigns>(schemas::vital_signs(Capabilities::FULL)),
        resource::<Appointment>(schemas::appointments(None, Capabilities::FULL.with_toggle())),
        resource::<LabPayment>(schemas::lab_payments(Capabilities::FULL)),
        notifications(user),
        payment(user),
    ]
}

fn card_panels(user: &UserProfile) -> Vec<Box<dyn Panel>> {
    vec![
        helper_form(),
        resource::<LabPayment>(schemas::lab_payments(Capabilities::FULL)),
        resource::<PaymentDetail>(schemas::payment_details(Capabilities::FULL)),
        notifications(user),
    ]
}

fn pharmacist_panels(user: &UserProfile) -> Vec<Box<dyn Panel>> {
    vec![
        resource::<GeneralMedicine>(schemas::general_medicines()),
        resource::<SpecificMedicine>(schemas::specific_medicines(
            Capabilities::READ_ONLY.with_toggle(),
        )),
        resource::<Referral>(schemas::referrals(Capabilities::READ_ONLY.with_toggle())),
        notifications(user),
    ]
}

fn laboratorist_panels(user: &UserProfile) -> Vec<Box<dyn Panel>> {
    vec![
        resource::<TestRequest>(schemas::test_requests(Capabilities::READ_ONLY.with_toggle())),
        resource::<TestResult>(schemas::test_results(Capabilities::FULL)),
        resource::<LabPayment>(schemas::lab_payments(Capabilities::READ_ONLY.with_toggle())),
        notifications(user),
    ]
}

pub struct Dashboard {
    title: String,
    user: UserProfile,
    panels: Vec<Box<dyn Panel>>,
    loaded: Vec<bool>,
    selected: usize,
    focus: Focus,
    /// Index of the notifications panel, whose unread count is in the header.
    notifications: Option<usize>,
    /// Requested `/admin/<section>` that matched no section.
    unknown_section: Option<String>,
    logout_dialog: Option<ConfirmDialog>,
}

impl Dashboard {
    pub fn for_route(route: &Route, session: Option<&Session>) -> Self {
        let user = session.map(|s| s.user.clone()).unwrap_or_default();
        let (title, panels) = match route {
            Route::Admin { .. } => ("ADMIN DASHBOARD".to_string(), admin_panels(&user)),
            Route::Doctors { department } => (
                format!("DOCTOR DASHBOARD · {}", department.to_uppercase()),
                doctor_panels(&user, department),
            ),
            Route::AddHelperForm => ("CARD OFFICE".to_string(), card_panels(&user)),
            Route::Pharmacist => ("PHARMACY".to_string(), pharmacist_panels(&user)),
            Route::Laboratorist => ("LABORATORY".to_string(), laboratorist_panels(&user)),
            _ => ("WARD DASHBOARD".to_string(), ward_panels(&user)),
        };

        let mut dashboard = Self {
            title,
            user,
            loaded: vec![false; panels.len()],
            notifications: panels.iter().position(|p| p.title() == "Notifications"),
            panels,
            selected: 0,
            focus: Focus::Sidebar,
            unknown_section: None,
            logout_dialog: None,
        };

        match route {
            Route::Admin {
                section: Some(section),
            } => match dashboard.panels.iter().position(|p| slug(p.title()) == *section) {
                Some(index) => {
                    dashboard.selected = index;
                    dashboard.focus = Focus::Content;
                }
                None => dashboard.unknown_section = Some(section.clone()),
            },
            Route::AddHelperForm => dashboard.focus = Focus::Content,
            _ => {}
        }
        dashboard
    }

    fn ensure_loaded(&mut self, index: usize, ctx: &mut Ctx) {
        if !self.loaded[index] {
            debug!(section = self.panels[index].title(), "loading section");
            self.panels[index].load(ctx);
            self.loaded[index] = true;
        }
    }

    fn select(&mut self, index: usize, ctx: &mut Ctx) {
        self.selected = index;
        self.ensure_loaded(index, ctx);
    }

    fn unread(&self) -> usize {
        self.notifications
            .and_then(|i| self.panels[i].badge())
            .unwrap_or(0)
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent, ctx: &mut Ctx) {
        let len = self.panels.len();
        match key.code {
            KeyCode::Down => self.select((self.selected + 1) % len, ctx),
            KeyCode::Up => self.select((self.selected + len - 1) % len, ctx),
            KeyCode::Enter | KeyCode::Right | KeyCode::Tab => self.focus = Focus::Content,
            KeyCode::Esc => {
                self.logout_dialog = Some(ConfirmDialog::new(
                    "Logout",
                    "Are you sure you want to log out?",
                ))
            }
            _ => {}
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER))
            .style(Style::default().bg(Color::Rgb(24, 24, 40)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(inner);

        let title = Paragraph::new(Line::from(Span::styled(
            format!(" 🏥 {}", self.title),
            Style::default().fg(TITLE).add_modifier(Modifier::BOLD),
        )));
        frame.render_widget(title, halves[0]);

        let unread = self.unread();
        let bell_style = if unread > 0 {
            Style::default().fg(FOCUS).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(IDLE)
        };
        let user = Paragraph::new(Line::from(vec![
            Span::styled(
                self.user.display_name(),
                Style::default().fg(LINK).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" ({}) ", self.user.role), Style::default().fg(IDLE)),
            Span::styled(format!("🔔 {unread} "), bell_style),
        ]))
        .alignment(Alignment::Right);
        frame.render_widget(user, halves[1]);
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Sidebar;
        let items: Vec<ListItem> = self
            .panels
            .iter()
            .enumerate()
            .map(|(idx, panel)| {
                let style = if idx == self.selected {
                    let color = if focused { FOCUS } else { SUCCESS };
                    Style::default().fg(color).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(TEXT)
                };
                let prefix = if idx == self.selected { " ► " } else { "   " };
                let mut spans = vec![Span::styled(format!("{prefix}{}", panel.title()), style)];
                if let Some(n) = panel.badge().filter(|n| *n > 0) {
                    spans.push(Span::styled(
                        format!(" ({n})"),
                        Style::default().fg(FOCUS).add_modifier(Modifier::BOLD),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let sidebar = List::new(items).block(
            Block::default()
                .title(" Sections ")
                .title_style(Style::default().fg(TITLE).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(if focused { FOCUS } else { IDLE }))
                .style(Style::default().bg(PANEL_BG)),
        );
        frame.render_widget(sidebar, area);
    }
}

impl Component for Dashboard {
    fn on_mount(&mut self, ctx: &mut Ctx) -> Result<()> {
        if let Some(section) = &self.unknown_section {
            ctx.toasts.info(format!("Unknown section \"{section}\""));
        }
        self.ensure_loaded(self.selected, ctx);
        if let Some(index) = self.notifications {
            self.ensure_loaded(index, ctx);
        }
        Ok(())
    }

    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        if let Some(dialog) = self.logout_dialog.as_mut() {
            match dialog.handle_key(key) {
                Some(true) => {
                    self.logout_dialog = None;
                    return Ok(Some(Navigation::Logout));
                }
                Some(false) => self.logout_dialog = None,
                None => {}
            }
            return Ok(None);
        }

        if self.focus == Focus::Sidebar {
            self.handle_sidebar_key(key, ctx);
            return Ok(None);
        }

        match self.panels[self.selected].handle_input(key, ctx)? {
            PanelEvent::Navigate(navigation) => return Ok(Some(navigation)),
            PanelEvent::Ignored => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Left | KeyCode::BackTab) {
                    self.focus = Focus::Sidebar;
                }
            }
            PanelEvent::Consumed => {}
        }
        Ok(None)
    }

    fn on_tick(&mut self, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        for panel in &mut self.panels {
            if let Some(navigation) = panel.on_tick(ctx)? {
                return Ok(Some(navigation));
            }
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        paint_background(frame);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_header(frame, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(26), Constraint::Min(40)])
            .spacing(1)
            .split(layout[1]);

        self.render_sidebar(frame, body[0]);
        self.panels[self.selected].render(frame, body[1], self.focus == Focus::Content);

        let help = match self.focus {
            Focus::Sidebar => "↑↓: Section | Enter/→: Open | Esc: Logout | Ctrl+Q: Quit",
            Focus::Content => "Esc/←: Sections | Ctrl+Q: Quit",
        };
        frame.render_widget(help_line(help), layout[2]);

        if let Some(dialog) = &self.logout_dialog {
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
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn titles(dashboard: &Dashboard) -> Vec<&str> {
        dashboard.panels.iter().map(|p| p.title()).collect()
    }

    #[test]
    fn sections_follow_the_role() {
        let admin = test_session("admin", "");
        let dashboard = Dashboard::for_route(&Route::Admin { section: None }, Some(&admin));
        assert_eq!(
            titles(&dashboard),
            [
                "Admins",
                "Doctors",
                "Helpers",
                "Payments",
                "Payment Details",
                "Feedback",
                "Messages",
                "Notifications"
            ]
        );

        let pharmacist = test_session("pharmacist", "");
        let dashboard = Dashboard::for_route(&Route::Pharmacist, Some(&pharmacist));
        assert_eq!(
            titles(&dashboard),
            ["General Medicines", "Specific Medicines", "Referrals", "Notifications"]
        );

        let nurse = test_session("nurse", "");
        let dashboard = Dashboard::for_route(&Route::UsersDashboard, Some(&nurse));
        assert_eq!(titles(&dashboard).last(), Some(&"Payment"));
    }

    #[test]
    fn admin_section_is_preselected() {
        let admin = test_session("admin", "");
        let route = Route::parse("/admin/payment-details").unwrap();
        let dashboard = Dashboard::for_route(&route, Some(&admin));
        assert_eq!(dashboard.panels[dashboard.selected].title(), "Payment Details");
        assert_eq!(dashboard.focus, Focus::Content);
    }

    #[test]
    fn mount_loads_section_and_notification_count() {
        let mock = MockTransport::new();
        mock.respond(json!([]));
        mock.respond(json!([
            {"_id": "n1", "message": "New result", "isRead": false},
            {"_id": "n2", "message": "Old", "isRead": true},
        ]));
        let api = mock.client();
        let config = Config::default();
        let session = test_session("laboratorist", "");
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: Some(&session),
            toasts: &mut toasts,
            config: &config,
        };
        let mut dashboard = Dashboard::for_route(&Route::Laboratorist, Some(&session));

        dashboard.on_mount(&mut ctx).unwrap();

        let paths: Vec<String> = mock.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            [
                "/patient-test-requests",
                "/notifications/laboratorist/laboratorist%40hospital.et"
            ]
        );
        assert_eq!(dashboard.unread(), 1);
    }

    #[test]
    fn logout_requires_confirmation() {
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
        let mut dashboard = Dashboard::for_route(&Route::Pharmacist, Some(&session));

        assert_eq!(dashboard.handle_input(key(KeyCode::Esc), &mut ctx).unwrap(), None);
        assert_eq!(dashboard.handle_input(key(KeyCode::Enter), &mut ctx).unwrap(), None);
        assert!(dashboard.logout_dialog.is_none());

        dashboard.handle_input(key(KeyCode::Esc), &mut ctx).unwrap();
        assert_eq!(
            dashboard.handle_input(key(KeyCode::Char('y')), &mut ctx).unwrap(),
            Some(Navigation::Logout)
        );
    }
}
