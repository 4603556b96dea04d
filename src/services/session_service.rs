use std::collections::HashSet;
use std::sync::RwLock;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Reads the claims of a JWT issued by the job API. The signature is not
/// checked here; the API does that on every request.
fn read_claims(token: &str) -> Result<Option<SessionClaims>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims = HashSet::new();
    validation.validate_aud = false;
    validation.validate_exp = true;
    validation.leeway = 0;

    match decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => Ok(Some(data.claims)),
        Err(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => {
            Err(Error::Unauthorized("Session token has expired".to_string()))
        }
        Err(err) => {
            debug!(error = %err, "Session token is not a readable JWT, keeping it opaque");
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    #[serde(skip)]
    token: String,
    pub subject: Option<String>,
    pub role: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: Option<JsonValue>,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { subject: Option<String> },
    LoggedOut,
}

/// Single owner of the signed-in user's token. Collaborators ask it for the
/// bearer token and subscribe to its events instead of reading storage.
#[derive(Debug)]
pub struct SessionContext {
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            current: RwLock::new(None),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn login(&self, token: &str, user: Option<JsonValue>) -> Result<Session> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Unauthorized("Session token is empty".to_string()));
        }

        let claims = read_claims(token)?.unwrap_or_default();
        let session = Session {
            token: token.to_string(),
            subject: claims.sub,
            role: claims.role,
            expires_at: claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single()),
            user,
        };

        *self.current.write().expect("session lock poisoned") = Some(session.clone());
        info!(subject = ?session.subject, "Session started");
        let _ = self.events.send(SessionEvent::LoggedIn {
            subject: session.subject.clone(),
        });
        Ok(session)
    }

    /// Ends the session. Returns whether there was one.
    pub fn logout(&self) -> bool {
        let previous = self.current.write().expect("session lock poisoned").take();
        if previous.is_none() {
            return false;
        }
        info!("Session ended");
        let _ = self.events.send(SessionEvent::LoggedOut);
        true
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().expect("session lock poisoned").clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }

    /// Token to send upstream. An expired session is ended on the spot.
    pub fn bearer(&self) -> Option<String> {
        let expired = {
            let guard = self.current.read().expect("session lock poisoned");
            match guard.as_ref() {
                None => return None,
                Some(session) if !session.is_expired(Utc::now()) => {
                    return Some(session.token.clone())
                }
                Some(_) => true,
            }
        };
        if expired {
            debug!("Session token expired");
            self.logout();
        }
        None
    }
}

/// Token from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
