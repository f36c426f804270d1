//! Forgot-password request and reset-with-code screens.

use super::form_view::{FormEvent, FormView};
use super::{Component, Ctx, Navigation};
use crate::auth;
use crate::form::{FieldSpec, FormSchema, Rule};
use crate::router::Route;
use crate::schemas;
use crate::tui::Frame;
use crate::validation::today;
use anyhow::Result;
use crossterm::event::KeyEvent;

pub struct ForgotPassword {
    form: FormView,
}

impl ForgotPassword {
    pub fn new() -> Self {
        let schema = FormSchema::new(vec![FieldSpec::text("email", "Email").rule(Rule::Email)]);
        Self {
            form: FormView::new("Reset your password", schema),
        }
    }
}

impl Component for ForgotPassword {
    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        match self.form.handle_key(key) {
            FormEvent::Submit => {
                if let Err(e) = self.form.submit(today()) {
                    ctx.toasts.error(e.to_string());
                    return Ok(None);
                }
                match auth::forgot_password(ctx.api, self.form.state.value("email")) {
                    Ok(message) => {
                        ctx.toasts.success(message);
                        return Ok(Some(Navigation::To(Route::ResetPassword)));
                    }
                    Err(e) => ctx.toasts.error(e.to_string()),
                }
            }
            FormEvent::Cancel => return Ok(Some(Navigation::To(Route::Login))),
            FormEvent::None | FormEvent::Copy(_) => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        self.form.render_screen(frame, "🔑 FORGOT PASSWORD");
    }
}

pub struct ResetPassword {
    form: FormView,
}

impl ResetPassword {
    pub fn new() -> Self {
        Self {
            form: FormView::new("Enter the code from your email", schemas::reset_password_form()),
        }
    }
}

impl Component for ResetPassword {
    fn handle_input(&mut self, key: KeyEvent, ctx: &mut Ctx) -> Result<Option<Navigation>> {
        match self.form.handle_key(key) {
            FormEvent::Submit => {
                if let Err(e) = self.form.submit(today()) {
                    ctx.toasts.error(e.to_string());
                    return Ok(None);
                }
                let state = &self.form.state;
                match auth::reset_password(
                    ctx.api,
                    state.value("email"),
                    state.value("token"),
                    state.value("password"),
                ) {
                    Ok(message) => {
                        ctx.toasts.success(message);
                        return Ok(Some(Navigation::To(Route::Login)));
                    }
                    Err(e) => ctx.toasts.error(e.to_string()),
                }
            }
            FormEvent::Cancel => return Ok(Some(Navigation::To(Route::Login))),
            FormEvent::None | FormEvent::Copy(_) => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        self.form.render_screen(frame, "🔑 RESET PASSWORD");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::Body;
    use crate::config::Config;
    use crate::toast::Toasts;
    use crossterm::event::{KeyCode, KeyModifiers};
    use serde_json::json;

    fn enter() -> KeyEvent {
        KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)
    }

    #[test]
    fn forgot_then_reset() {
        let mock = MockTransport::new();
        mock.respond(json!({"message": "Code sent"}));
        mock.respond(json!({"message": "Password updated"}));
        let api = mock.client();
        let config = Config::default();
        let mut toasts = Toasts::new();
        let mut ctx = Ctx {
            api: &api,
            session: None,
            toasts: &mut toasts,
            config: &config,
        };

        let mut forgot = ForgotPassword::new();
        forgot.form.state.set("email", "hana@h.et");
        assert_eq!(
            forgot.handle_input(enter(), &mut ctx).unwrap(),
            Some(Navigation::To(Route::ResetPassword))
        );

        let mut reset = ResetPassword::new();
        for (key, value) in [
            ("email", "hana@h.et"),
            ("token", "483920"),
            ("password", "NewPass@1"),
            ("confirmPassword", "NewPass@1"),
        ] {
            reset.form.state.set(key, value);
        }
        assert_eq!(
            reset.handle_input(enter(), &mut ctx).unwrap(),
            Some(Navigation::To(Route::Login))
        );
        assert_eq!(
            mock.requests()[1].body,
            Body::Json(json!({"email": "hana@h.et", "token": "483920", "password": "NewPass@1"}))
        );
    }

    #[test]
    fn mismatched_passwords_stay_local() {
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
        let mut reset = ResetPassword::new();
        for (key, value) in [
            ("email", "hana@h.et"),
            ("token", "483920"),
            ("password", "NewPass@1"),
            ("confirmPassword", "NewPass@2"),
        ] {
            reset.form.state.set(key, value);
        }
        assert_eq!(reset.handle_input(enter(), &mut ctx).unwrap(), None);
        assert!(mock.requests().is_empty());
    }
}
