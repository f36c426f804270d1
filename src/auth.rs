//! Sign-in, sign-up and password recovery against `/auth`.

use crate::api::{ApiClient, Body};
use crate::error::ApiError;
use crate::session::{Session, UserProfile};
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Server-provided confirmation text, or `fallback` when there is none.
fn message_or(response: &Value, fallback: &str) -> String {
    response
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Reads `{token, user}` from a login response, either at the top level or
/// under `data`.
fn session_from(response: &Value) -> Result<Session, ApiError> {
    let payload = match response.get("data") {
        Some(data) if data.get("token").is_some() => data,
        _ => response,
    };
    let token = payload
        .get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Decode("login response did not include a token".to_string()))?;
    let user = payload
        .get("user")
        .cloned()
        .map(serde_json::from_value::<UserProfile>)
        .transpose()
        .map_err(|e| ApiError::Decode(e.to_string()))?
        .unwrap_or_default();
    Ok(Session {
        token: token.to_string(),
        user,
    })
}

pub fn login(api: &ApiClient, credentials: &Credentials) -> Result<Session, ApiError> {
    let response = api.post(
        "/auth/login",
        json!({
            "email": credentials.email.trim(),
            "password": credentials.password,
        }),
    )?;
    let session = session_from(&response)?;
    info!(email = %session.user.email, role = %session.user.role, "signed in");
    Ok(session)
}

/// Registers a patient account. The body comes from the sign-up form and
/// already carries `role: user`.
pub fn signup(api: &ApiClient, body: Body) -> Result<String, ApiError> {
    let response = api.post_body("/auth/signup", body)?;
    Ok(message_or(&response, "Account created. Please sign in."))
}

pub fn forgot_password(api: &ApiClient, email: &str) -> Result<String, ApiError> {
    let response = api.post("/auth/forgot-password", json!({ "email": email.trim() }))?;
    Ok(message_or(&response, "A reset code has been sent to your email."))
}

pub fn reset_password(
    api: &ApiClient,
    email: &str,
    token: &str,
    password: &str,
) -> Result<String, ApiError> {
    let response = api.post(
        "/auth/reset-password",
        json!({ "email": email.trim(), "token": token.trim(), "password": password }),
    )?;
    Ok(message_or(&response, "Password updated. Please sign in."))
}
