//! Signed-cookie session auth, gating the HTTP and WebSocket surface behind
//! a single shared `app_password` the way a self-hosted single-tenant app
//! typically does. Absent `app_password` in configuration, auth is a no-op.

use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use poem::http::StatusCode;
use poem::{Endpoint, IntoResponse, Middleware, Request};
use sha2::Sha256;

use crate::api::models::{AuthStatusDto, LoginResponse};

pub const SESSION_COOKIE: &str = "novelforge_session";

type HmacSha256 = Hmac<Sha256>;

/// Signs `expires_at` (unix seconds) with `secret_key`, producing a
/// `payload.signature` cookie value.
pub fn sign_session(secret_key: &str, expires_at: i64) -> String {
    let payload = expires_at.to_string();
    let sig = sign(secret_key, &payload);
    format!("{payload}.{sig}")
}

fn sign(secret_key: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes()).expect("hmac accepts any key length");
    mac.update(payload.as_bytes());
    base64::prelude::BASE64_URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

fn verify_session(secret_key: &str, value: &str) -> bool {
    let Some((payload, sig)) = value.split_once('.') else {
        return false;
    };
    let Ok(expires_at) = payload.parse::<i64>() else {
        return false;
    };
    if expires_at < Utc::now().timestamp() {
        return false;
    }
    let expected = sign(secret_key, payload);
    expected == sig
}

/// Gates every non-exempt path behind the signed session cookie. A no-op
/// when `app_password` is unset, matching the login endpoint's own check.
pub struct SessionAuth {
    pub secret_key: String,
    pub app_password: Option<String>,
}

impl<E: Endpoint> Middleware<E> for SessionAuth {
    type Output = SessionAuthEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        SessionAuthEndpoint {
            ep,
            secret_key: self.secret_key.clone(),
            app_password: self.app_password.clone(),
        }
    }
}

pub struct SessionAuthEndpoint<E> {
    ep: E,
    secret_key: String,
    app_password: Option<String>,
}

impl<E: Endpoint> Endpoint for SessionAuthEndpoint<E> {
    type Output = poem::Response;

    async fn call(&self, req: Request) -> poem::Result<Self::Output> {
        let Some(app_password) = self.app_password.as_deref() else {
            return Ok(self.ep.call(req).await?.into_response());
        };
        if app_password.is_empty() || is_exempt(req.uri().path()) {
            return Ok(self.ep.call(req).await?.into_response());
        }

        let authenticated = read_cookie(&req, SESSION_COOKIE)
            .map(|v| verify_session(&self.secret_key, &v))
            .unwrap_or(false);
        if !authenticated {
            return Err(poem::Error::from_string("not authenticated", StatusCode::UNAUTHORIZED));
        }
        Ok(self.ep.call(req).await?.into_response())
    }
}

fn read_cookie(req: &Request, name: &str) -> Option<String> {
    let header = req.headers().get(poem::http::header::COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

pub fn is_exempt(path: &str) -> bool {
    path.starts_with("/api/auth/")
        || path.starts_with("/health")
        || path.starts_with("/ui")
        || path.starts_with("/spec")
}

pub struct AuthApi {
    pub state: std::sync::Arc<crate::api::AppState>,
}

#[poem_openapi::OpenApi]
impl AuthApi {
    #[oai(path = "/api/auth/login", method = "post")]
    async fn login(
        &self,
        body: poem_openapi::payload::Json<crate::api::models::LoginRequest>,
        cookie_jar: &poem::web::cookie::CookieJar,
    ) -> LoginResponse {
        let Some(app_password) = self.state.config.app_password.as_deref() else {
            return LoginResponse::Ok(poem_openapi::payload::Json(AuthStatusDto {
                authenticated: true,
                auth_required: false,
            }));
        };
        if app_password.is_empty() || body.0.password != app_password {
            return LoginResponse::Unauthorized(poem_openapi::payload::Json(
                "incorrect password".into(),
            ));
        }

        let value = session_cookie_value(&self.state.config.secret_key, self.state.config.session_expire_hours);
        let mut cookie = poem::web::cookie::Cookie::new_with_str(SESSION_COOKIE, value);
        cookie.set_http_only(true);
        cookie.set_path("/");
        cookie_jar.add(cookie);

        LoginResponse::Ok(poem_openapi::payload::Json(AuthStatusDto {
            authenticated: true,
            auth_required: true,
        }))
    }

    #[oai(path = "/api/auth/logout", method = "post")]
    async fn logout(&self) -> poem_openapi::payload::PlainText<String> {
        poem_openapi::payload::PlainText("logged out".to_string())
    }

    #[oai(path = "/api/auth/status", method = "get")]
    async fn status(&self) -> crate::api::models::AuthStatusResponse {
        crate::api::models::AuthStatusResponse::Ok(poem_openapi::payload::Json(AuthStatusDto {
            authenticated: true,
            auth_required: self.state.config.app_password.is_some(),
        }))
    }
}

/// Builds the `Set-Cookie` value for a freshly authenticated session.
pub fn session_cookie_value(secret_key: &str, expire_hours: i64) -> String {
    let expires_at = Utc::now().timestamp() + expire_hours.max(1) * 3600;
    sign_session(secret_key, expires_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_session_round_trips() {
        let key = "s3cr3t";
        let value = sign_session(key, Utc::now().timestamp() + 3600);
        assert!(verify_session(key, &value));
    }

    #[test]
    fn expired_session_rejected() {
        let key = "s3cr3t";
        let value = sign_session(key, Utc::now().timestamp() - 10);
        assert!(!verify_session(key, &value));
    }

    #[test]
    fn tampered_signature_rejected() {
        let key = "s3cr3t";
        let value = sign_session(key, Utc::now().timestamp() + 3600);
        let (payload, _) = value.split_once('.').unwrap();
        let forged = format!("{payload}.deadbeef");
        assert!(!verify_session(key, &forged));
    }

    #[test]
    fn wrong_key_rejected() {
        let value = sign_session("key-a", Utc::now().timestamp() + 3600);
        assert!(!verify_session("key-b", &value));
    }
}
