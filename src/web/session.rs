//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix cookie session so handlers only deal with who is logged in and which
//! messages should be shown on the next page.

use actix_session::{Session, SessionInsertError};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::models::{Role, Student, Teacher};

pub(crate) const IDENTITY_KEY: &str = "identity";
pub(crate) const FLASH_KEY: &str = "flash";

/// Most messages kept between renders. Older ones are dropped first.
pub const MAX_PENDING_FLASHES: usize = 4;

/// Who the current session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub role: Role,
    /// Row id of the student or teacher. The admin has no row.
    pub user_id: Option<i32>,
    pub name: String,
}

impl Identity {
    pub fn student(student: &Student) -> Self {
        Self {
            role: Role::Student,
            user_id: Some(student.id),
            name: student.name.clone(),
        }
    }

    pub fn teacher(teacher: &Teacher) -> Self {
        Self {
            role: Role::Teacher,
            user_id: Some(teacher.id),
            name: teacher.name.clone(),
        }
    }

    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            user_id: None,
            name: "Admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Error => "error",
        }
    }
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Starts a session for `identity`, replacing whatever was there before.
    pub fn log_in(&self, identity: &Identity) -> Result<(), SessionInsertError> {
        self.0.clear();
        self.0.renew();
        self.0.insert(IDENTITY_KEY, identity)
    }

    /// The logged-in identity, or `None` for an anonymous visitor.
    ///
    /// A cookie that no longer deserializes is treated as anonymous.
    pub fn identity(&self) -> Option<Identity> {
        match self.0.get::<Identity>(IDENTITY_KEY) {
            Ok(identity) => identity,
            Err(error) => {
                tracing::warn!(%error, "discarding unreadable session identity");
                None
            }
        }
    }

    /// The identity, if it belongs to `role`.
    pub fn identity_as(&self, role: Role) -> Option<Identity> {
        self.identity().filter(|identity| identity.role == role)
    }

    /// Forgets the identity and any pending messages.
    pub fn log_out(&self) {
        self.0.clear();
        self.0.renew();
    }

    /// Queues a message for the next rendered page.
    ///
    /// Repeats of a pending message are folded, and at most [`MAX_PENDING_FLASHES`] are kept.
    pub fn flash(&self, level: FlashLevel, message: impl Into<String>) {
        let flash = Flash {
            level,
            message: message.into(),
        };
        let mut flashes = self.pending_flashes();
        flashes.retain(|pending| *pending != flash);
        flashes.push(flash);
        if flashes.len() > MAX_PENDING_FLASHES {
            flashes.drain(..flashes.len() - MAX_PENDING_FLASHES);
        }

        if let Err(error) = self.0.insert(FLASH_KEY, flashes) {
            tracing::warn!(%error, "failed to store flash message");
        }
    }

    /// Removes and returns every queued message.
    pub fn take_flashes(&self) -> Vec<Flash> {
        let flashes = self.pending_flashes();
        if !flashes.is_empty() {
            self.0.remove(FLASH_KEY);
        }
        flashes
    }

    fn pending_flashes(&self) -> Vec<Flash> {
        self.0
            .get::<Vec<Flash>>(FLASH_KEY)
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
