use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;

use super::AppState;
use crate::models::Session;

/// Session of the visitor: `token`/`userId` cookies, else the configured session.
pub(crate) struct UserSession(pub(crate) Session);

fn cookie_session(parts: &Parts) -> Session {
    let mut session = Session::default();
    for header in parts.headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for pair in raw.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let value = urlencoding::decode(value.trim())
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.trim().to_string());
            if value.is_empty() {
                continue;
            }
            match name.trim() {
                "token" => session.token = Some(value),
                "userId" => session.user_id = Some(value),
                _ => {}
            }
        }
    }
    session
}

impl FromRequestParts<AppState> for UserSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let from_cookies = cookie_session(parts);
        if from_cookies.is_empty() {
            Ok(UserSession(state.config.session.clone()))
        } else {
            Ok(UserSession(from_cookies))
        }
    }
}
