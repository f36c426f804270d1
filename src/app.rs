//! Application state and the main loop.
//!
//! `App` owns the API client, the session and its store, and the screen for
//! the current route. Every route change goes through [`App::navigate`],
//! which asks the guard first and only then mounts the screen.

use crate::api::ApiClient;
use crate::components::dialog::render_alert;
use crate::components::{self, Component, Ctx, Navigation};
use crate::config::Config;
use crate::router::{self, landing_route, Access, Route};
use crate::session::{Session, SessionStore};
use crate::toast::Toasts;
use crate::tui::{self, Frame, Tui};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

pub struct App {
    route: Route,
    screen: Box<dyn Component>,
    api: ApiClient,
    store: Box<dyn SessionStore>,
    session: Option<Session>,
    toasts: Toasts,
    /// Blocking message shown after a denied navigation. Enter dismisses it
    /// and continues to the login screen.
    alert: Option<String>,
    config: Config,
    pub should_quit: bool,
}

impl App {
    pub fn new(api: ApiClient, store: Box<dyn SessionStore>, config: Config) -> Self {
        Self {
            route: Route::Landing,
            screen: components::mount(&Route::Landing, None),
            api,
            store,
            session: None,
            toasts: Toasts::new(),
            alert: None,
            config,
            should_quit: false,
        }
    }

    /// Picks up the session saved by a previous run, if any.
    pub fn restore_session(&mut self) -> Result<()> {
        if let Some(session) = self.store.load()? {
            info!(email = %session.user.email, role = %session.user.role, "restored session");
            self.api.set_token(Some(session.token.clone()));
            self.session = Some(session);
        }
        Ok(())
    }

    pub fn run(&mut self, tui: &mut Tui) -> Result<()> {
        self.navigate(Route::Landing);
        self.expire_rejected_session();
        while !self.should_quit {
            tui.draw(|frame| self.render(frame))?;
            match tui.next_event()? {
                tui::Event::Key(key) => self.handle_key(key)?,
                tui::Event::Tick => self.tick()?,
            }
        }
        Ok(())
    }

    /// Runs the guard for `route` and mounts its screen when admitted.
    pub fn navigate(&mut self, route: Route) {
        match router::authorize(&route, self.session.as_ref()) {
            Access::Granted => self.mount(route),
            Access::Unauthenticated => {
                info!(%route, "sign-in required");
                self.toasts.info("Please sign in to continue");
                self.mount(Route::Login);
            }
            Access::Denied { role } => {
                warn!(%route, %role, "navigation denied");
                self.alert = Some(format!(
                    "Signed in as '{role}', you cannot open {route}. Please sign in with a permitted account."
                ));
            }
        }
    }

    fn mount(&mut self, route: Route) {
        self.screen = components::mount(&route, self.session.as_ref());
        self.route = route;
        let mut ctx = Ctx {
            api: &self.api,
            session: self.session.as_ref(),
            toasts: &mut self.toasts,
            config: &self.config,
        };
        if let Err(e) = self.screen.on_mount(&mut ctx) {
            warn!(route = %self.route, error = %e, "screen failed to load");
            ctx.toasts.error(format!("Failed to load: {e}"));
        }
    }

    /// Drops the session after the server refused its token, then asks the
    /// user to sign in again.
    fn expire_rejected_session(&mut self) {
        if !self.api.take_session_rejected() || self.session.is_none() {
            return;
        }
        warn!("session token rejected by the server");
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear stored session");
        }
        self.api.set_token(None);
        self.session = None;
        self.toasts
            .error("Your session has expired. Please sign in again.");
        self.mount(Route::Login);
    }

    fn apply(&mut self, navigation: Navigation) {
        match navigation {
            Navigation::To(route) => self.navigate(route),
            Navigation::LoggedIn(session) => {
                if let Err(e) = self.store.save(&session) {
                    warn!(error = %e, "failed to persist session");
                    self.toasts
                        .error("Signed in, but the session could not be saved");
                }
                self.api.set_token(Some(session.token.clone()));
                let route = landing_route(Some(&session));
                self.session = Some(session);
                self.navigate(route);
            }
            Navigation::Logout => {
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "failed to clear stored session");
                }
                self.api.set_token(None);
                self.session = None;
                info!("signed out");
                self.toasts.info("Signed out");
                self.navigate(Route::Landing);
            }
            Navigation::Quit => self.should_quit = true,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Global keybinding: Ctrl+Q to quit
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        if self.alert.is_some() {
            if key.code == KeyCode::Enter {
                self.alert = None;
                self.mount(Route::Login);
            }
            return Ok(());
        }

        let mut ctx = Ctx {
            api: &self.api,
            session: self.session.as_ref(),
            toasts: &mut self.toasts,
            config: &self.config,
        };
        if let Some(navigation) = self.screen.handle_input(key, &mut ctx)? {
            self.apply(navigation);
        }
        self.expire_rejected_session();
        Ok(())
    }

    pub fn tick(&mut self) -> Result<()> {
        self.toasts.prune();
        if self.alert.is_some() {
            return Ok(());
        }
        let mut ctx = Ctx {
            api: &self.api,
            session: self.session.as_ref(),
            toasts: &mut self.toasts,
            config: &self.config,
        };
        if let Some(navigation) = self.screen.on_tick(&mut ctx)? {
            self.apply(navigation);
        }
        self.expire_rejected_session();
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        self.screen.render(frame);
        self.toasts.render(frame);
        if let Some(message) = &self.alert {
            render_alert(frame, "Access denied", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::session::{test_session, MemorySessionStore};

    fn app(mock: &MockTransport) -> App {
        App::new(
            mock.client(),
            Box::new(MemorySessionStore::new()),
            Config::default(),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn protected_route_without_session_goes_to_login() {
        let mock = MockTransport::new();
        let mut app = app(&mock);
        app.navigate(Route::Admin { section: None });
        assert_eq!(&app.route, &Route::Login);
        assert!(app.alert.is_none());
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn login_persists_session_and_lands_by_role() {
        let mock = MockTransport::new();
        let mut app = app(&mock);
        app.apply(Navigation::LoggedIn(test_session("doctor", "general")));

        assert_eq!(
            &app.route,
            &Route::Doctors {
                department: "general".to_string()
            }
        );
        assert_eq!(app.api.token(), Some("token-doctor"));
        let stored = app.store.load().unwrap().unwrap();
        assert_eq!(stored.user.role, "doctor");
    }

    #[test]
    fn wrong_role_shows_blocking_alert_then_login() {
        let mock = MockTransport::new();
        let mut app = app(&mock);
        app.session = Some(test_session("nurse", ""));
        app.navigate(Route::Pharmacist);

        assert!(app.alert.is_some());
        assert_eq!(&app.route, &Route::Landing);

        // Other keys are swallowed while the alert is up.
        app.handle_key(key(KeyCode::Down)).unwrap();
        assert!(app.alert.is_some());

        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.alert.is_none());
        assert_eq!(&app.route, &Route::Login);
    }

    #[test]
    fn logout_clears_everything() {
        let mock = MockTransport::new();
        let session = test_session("admin", "");
        let mut app = App::new(
            mock.client(),
            Box::new(MemorySessionStore::with_session(session)),
            Config::default(),
        );
        app.restore_session().unwrap();
        assert_eq!(app.api.token(), Some("token-admin"));

        app.apply(Navigation::Logout);

        assert!(app.session.is_none());
        assert_eq!(app.api.token(), None);
        assert!(app.store.load().unwrap().is_none());
        assert_eq!(&app.route, &Route::Landing);
    }

    #[test]
    fn rejected_token_ends_the_session() {
        let mock = MockTransport::new();
        let session = test_session("pharmacist", "");
        let mut app = App::new(
            mock.client(),
            Box::new(MemorySessionStore::with_session(session)),
            Config::default(),
        );
        app.restore_session().unwrap();
        app.navigate(Route::Pharmacist);
        assert_eq!(&app.route, &Route::Pharmacist);

        // Reload the open section; the server no longer accepts the token.
        mock.fail(401, "jwt expired");
        app.handle_key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE))
            .unwrap();
        app.handle_key(key(KeyCode::Char('r'))).unwrap();

        assert_eq!(&app.route, &Route::Login);
        assert!(app.session.is_none());
        assert_eq!(app.api.token(), None);
        assert!(app.store.load().unwrap().is_none());
    }

    #[test]
    fn ctrl_q_quits_from_anywhere() {
        let mock = MockTransport::new();
        let mut app = app(&mock);
        app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(app.should_quit);
    }
}
