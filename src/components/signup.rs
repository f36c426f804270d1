//! Patient self-registration.

use super::form_view::{FormEvent, FormView};
use super::{Component, Ctx, Navigation};
use crate::auth;
use crate::router::Route;
use crate::schemas;
use crate::tui::Frame;
use crate::validation::today;
use anyhow::Result;
use crossterm::event::KeyEvent;

pub struct Signup {
    form: FormView,
}

impl Signup {
    pub fn new() -> Self {
        Self {
            form: FormView::new("Create an Account", schemas::signup_form()),
        }
    }
}

impl Component for Signup {
    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        match self.form.handle_key(key) {
            FormEvent::Submit => {
                let body = match self.form.submit(today()) {
                    Ok(body) => body,
                    Err(e) => {
                        ctx.toasts.error(e.to_string());
                        return Ok(None);
                    }
                };
                match auth::signup(ctx.api, body) {
                    Ok(message) => {
                        ctx.toasts.success(message);
                        return Ok(Some(Navigation::To(Route::Login)));
                    }
                    Err(e) => ctx.toasts.error(e.to_string()),
                }
            }
            FormEvent::Cancel => return Ok(Some(Navigation::To(Route::Landing))),
            FormEvent::None | FormEvent::Copy(_) => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        self.form.render_screen(frame, "📝 SIGN UP");
    }
}
