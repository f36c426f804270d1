use crate::api::ApiClient;
use crate::config::Config;
use crate::router::Route;
use crate::session::Session;
use crate::toast::Toasts;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

pub mod about;
pub mod appointment;
pub mod dashboard;
pub mod dialog;
pub mod form_view;
pub mod landing;
pub mod login;
pub mod mailbox_view;
pub mod password_reset;
pub mod payment_view;
pub mod resource_view;
pub mod signup;

pub const BG: Color = Color::Rgb(16, 16, 28);
pub const PANEL_BG: Color = Color::Rgb(22, 22, 35);
pub const INPUT_BG: Color = Color::Rgb(26, 26, 36);
pub const BORDER: Color = Color::Rgb(75, 75, 120);
pub const TITLE: Color = Color::Rgb(230, 230, 250);
pub const TEXT: Color = Color::Rgb(220, 220, 240);
pub const MUTED: Color = Color::Rgb(140, 140, 170);
pub const IDLE: Color = Color::Rgb(140, 140, 200);
pub const FOCUS: Color = Color::Rgb(250, 250, 110);
pub const SUCCESS: Color = Color::Rgb(140, 219, 140);
pub const DANGER: Color = Color::Rgb(255, 100, 100);
pub const LINK: Color = Color::Rgb(129, 199, 245);

/// What a screen can ask the app to do after handling a key or a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    To(Route),
    LoggedIn(Session),
    Logout,
    Quit,
}

/// Shared state a screen may use while handling input.
pub struct Ctx<'a> {
    pub api: &'a ApiClient,
    pub session: Option<&'a Session>,
    pub toasts: &'a mut Toasts,
    pub config: &'a Config,
}

pub trait Component {
    /// Runs once after the guard admits the route.
    fn on_mount(&mut self, _ctx: &mut Ctx) -> Result<()> {
        Ok(())
    }

    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>>;

    fn on_tick(&mut self, _ctx: &mut Ctx) -> Result<Option<Navigation>> {
        Ok(None)
    }

    fn render(&self, frame: &mut Frame);
}

/// Result of a dashboard panel handling a key.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Consumed,
    /// The panel had no use for the key; the dashboard may act on it.
    Ignored,
    Navigate(Navigation),
}

/// One section of a role dashboard.
pub trait Panel {
    fn title(&self) -> &str;

    /// Fetches the panel's data. Called when the section is opened.
    fn load(&mut self, ctx: &mut Ctx);

    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<PanelEvent>;

    fn on_tick(&mut self, _ctx: &mut Ctx) -> Result<Option<Navigation>> {
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect, focused: bool);

    /// Unread count shown next to the section name.
    fn badge(&self) -> Option<usize> {
        None
    }
}

/// Builds the screen for a route the guard has already admitted.
pub fn mount(route: &Route, session: Option<&Session>) -> Box<dyn Component> {
    match route {
        Route::Landing => Box::new(landing::Landing::new()),
        Route::Login => Box::new(login::Login::new()),
        Route::Signup => Box::new(signup::Signup::new()),
        Route::ForgotPassword => Box::new(password_reset::ForgotPassword::new()),
        Route::ResetPassword => Box::new(password_reset::ResetPassword::new()),
        Route::AboutUs => Box::new(about::AboutUs::new()),
        Route::Appointment => Box::new(appointment::BookAppointment::new()),
        Route::AppointmentLookup => Box::new(appointment::AppointmentLookup::new()),
        Route::Payment => Box::new(payment_view::PaymentScreen::new(session)),
        Route::PaymentSuccess => Box::new(payment_view::PaymentResult::success()),
        Route::PaymentFailure => Box::new(payment_view::PaymentResult::failure()),
        Route::Admin { .. }
        | Route::UsersDashboard
        | Route::AddHelperForm
        | Route::Doctors { .. }
        | Route::Pharmacist
        | Route::Laboratorist => Box::new(dashboard::Dashboard::for_route(route, session)),
    }
}

/// Fills the whole frame with the background colour.
pub fn paint_background(frame: &mut Frame) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(BG)), area);
}

/// Bold centred title over a bottom border.
pub fn render_header(frame: &mut Frame, area: Rect, title: &str) {
    let header = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER))
        .style(Style::default().bg(BG));
    frame.render_widget(header, area);
    let title = Paragraph::new(title.to_string())
        .style(
            Style::default()
                .fg(TITLE)
                .add_modifier(Modifier::BOLD)
                .bg(BG),
        )
        .alignment(Alignment::Center);
    frame.render_widget(title, area);
}

/// `► Label ◄` when focused, padded label otherwise.
pub fn button(label: &str, focused: bool, color: Color) -> Paragraph<'static> {
    let (text, style) = if focused {
        (
            format!("► {label} ◄"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )
    } else {
        (format!("  {label}  "), Style::default().fg(Color::Rgb(180, 180, 200)))
    };
    Paragraph::new(text).style(style).alignment(Alignment::Center)
}

pub fn help_line(text: &str) -> Paragraph<'static> {
    Paragraph::new(text.to_string())
        .style(Style::default().fg(MUTED).bg(BG))
        .alignment(Alignment::Center)
}
