//! Signed-cookie sessions.
//!
//! The whole session (identity plus pending flash messages) lives in one
//! cookie: `base64url(json).base64url(hmac_sha256(base64url(json)))`.
//! Cookies that fail the signature check or don't parse are ignored and the
//! request proceeds anonymously.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use cookie::{Cookie, SameSite};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "feedback_session";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub flashes: Vec<String>,
}

/// Signing key and cookie attributes shared by every request.
#[derive(Clone)]
pub struct SessionKey {
    mac: HmacSha256,
    secure: bool,
}

impl SessionKey {
    pub fn new(secret: &[u8], secure: bool) -> Result<Self, AppError> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| AppError::Crypto(format!("Invalid session key: {}", e)))?;

        Ok(SessionKey { mac, secure })
    }

    pub fn encode(&self, data: &SessionData) -> Result<String, AppError> {
        let json = serde_json::to_vec(data)
            .map_err(|e| AppError::Internal(format!("Session encoding failed: {}", e)))?;
        let payload = base64_simd::URL_SAFE_NO_PAD.encode_to_string(&json);

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            payload,
            base64_simd::URL_SAFE_NO_PAD.encode_to_string(signature.as_slice())
        ))
    }

    pub fn decode(&self, value: &str) -> Option<SessionData> {
        let (payload, signature) = value.split_once('.')?;
        let signature = base64_simd::URL_SAFE_NO_PAD.decode_to_vec(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let json = base64_simd::URL_SAFE_NO_PAD.decode_to_vec(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }
}

/// The request-scoped session. Returned from a handler as a response part,
/// it writes itself back only if something changed.
#[derive(Clone)]
pub struct Session {
    data: SessionData,
    key: SessionKey,
    dirty: bool,
}

impl Session {
    pub fn from_headers(key: &SessionKey, headers: &HeaderMap) -> Self {
        let data = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .and_then(|cookie| key.decode(cookie.value()))
            .unwrap_or_default();

        Session {
            data,
            key: key.clone(),
            dirty: false,
        }
    }

    /// The logged-in username, if any.
    pub fn username(&self) -> Option<&str> {
        self.data.username.as_deref()
    }

    pub fn login(&mut self, username: &str) {
        self.data.username = Some(username.to_string());
        self.dirty = true;
    }

    pub fn clear(&mut self) {
        self.data = SessionData::default();
        self.dirty = true;
    }

    pub fn flash(&mut self, message: impl Into<String>) {
        self.data.flashes.push(message.into());
        self.dirty = true;
    }

    /// Drain pending flash messages for display.
    pub fn take_flashes(&mut self) -> Vec<String> {
        if self.data.flashes.is_empty() {
            return Vec::new();
        }
        self.dirty = true;
        std::mem::take(&mut self.data.flashes)
    }

    fn set_cookie(&self) -> Result<Cookie<'static>, AppError> {
        let mut cookie = Cookie::build((SESSION_COOKIE, String::new()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.key.secure)
            .build();

        if self.data == SessionData::default() {
            cookie.make_removal();
        } else {
            cookie.set_value(self.key.encode(&self.data)?);
        }

        Ok(cookie)
    }
}

impl<S> FromRequestParts<S> for Session
where
    SessionKey: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let key = SessionKey::from_ref(state);
        Ok(Session::from_headers(&key, &parts.headers))
    }
}

impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if !self.dirty {
            return Ok(res);
        }

        match self.set_cookie() {
            Ok(cookie) => match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    res.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => tracing::error!("❌ Session cookie is not a valid header: {}", e),
            },
            Err(e) => tracing::error!("❌ Failed to write session: {}", e),
        }

        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn key() -> SessionKey {
        SessionKey::new(b"0123456789abcdef0123456789abcdef", false).unwrap()
    }

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_signed_value_is_read_back() {
        let data = SessionData {
            username: Some("alice".to_string()),
            flashes: vec!["alice has registered".to_string()],
        };
        let value = key().encode(&data).unwrap();

        assert_eq!(key().decode(&value), Some(data));
    }

    #[test]
    fn test_tampered_or_foreign_cookie_is_ignored() {
        let value = key()
            .encode(&SessionData {
                username: Some("alice".to_string()),
                flashes: Vec::new(),
            })
            .unwrap();
        let (_, signature) = value.split_once('.').unwrap();
        let forged_payload = base64_simd::URL_SAFE_NO_PAD.encode_to_string(br#"{"username":"root"}"#);

        assert!(key().decode(&format!("{}.{}", forged_payload, signature)).is_none());
        assert!(key().decode("garbage").is_none());

        let other = SessionKey::new(b"another-secret-another-secret-xx", false).unwrap();
        assert!(other.decode(&value).is_none());
    }

    #[test]
    fn test_session_from_cookie_header() {
        let value = key()
            .encode(&SessionData {
                username: Some("alice".to_string()),
                flashes: Vec::new(),
            })
            .unwrap();

        let session = Session::from_headers(&key(), &headers_with(&format!("theme=dark; {}={}", SESSION_COOKIE, value)));
        assert_eq!(session.username(), Some("alice"));

        let anonymous = Session::from_headers(&key(), &HeaderMap::new());
        assert_eq!(anonymous.username(), None);
    }

    #[test]
    fn test_flashes_drain_once() {
        let mut session = Session::from_headers(&key(), &HeaderMap::new());
        session.flash("one");
        session.flash("two");

        assert_eq!(session.take_flashes(), vec!["one", "two"]);
        assert!(session.take_flashes().is_empty());
    }

    #[test]
    fn test_only_modified_sessions_set_cookie() {
        let untouched = Session::from_headers(&key(), &HeaderMap::new());
        let response = (untouched, "ok").into_response();
        assert!(response.headers().get(SET_COOKIE).is_none());

        let mut session = Session::from_headers(&key(), &HeaderMap::new());
        session.login("alice");
        let response = (session, "ok").into_response();
        let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
        assert!(set_cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_cleared_session_removes_cookie() {
        let mut session = Session::from_headers(&key(), &HeaderMap::new());
        session.login("alice");
        session.clear();

        let response = (session, "ok").into_response();
        let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
