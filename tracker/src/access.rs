//! Bearer-token authentication and role checks for request handlers

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use thiserror::Error;
use tracing::{debug, info};

pub type Uid = String;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Token missing")]
    TokenMissing,

    #[error("Invalid token")]
    InvalidToken,

    #[error("{} access required", .0.title())]
    RoleRequired(Role),
}

impl AccessError {
    /// Every access failure is reported as forbidden
    pub fn http_status(&self) -> u16 {
        403
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Display, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    #[display(fmt = "earthling")]
    Earthling,
    #[display(fmt = "astronaut")]
    Astronaut,
    #[display(fmt = "admin")]
    Admin,
}

impl Role {
    pub fn title(&self) -> &'static str {
        match self {
            Role::Earthling => "Earthling",
            Role::Astronaut => "Astronaut",
            Role::Admin => "Admin",
        }
    }
}

/// A verified caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: Uid,
}

/// Verifies bearer tokens, backed by an external identity provider
pub trait IdentityProvider: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AccessError>;
}

/// Persistent role assignments, backed by an external store
pub trait RoleStore: Send + Sync {
    fn role(&self, uid: &str) -> Option<Role>;
    fn set_role(&self, uid: &str, role: Role);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub role: Role,
}

impl Session {
    pub fn uid(&self) -> &str {
        &self.identity.uid
    }
}

#[derive(Clone)]
pub struct Gatekeeper {
    identities: Arc<dyn IdentityProvider>,
    roles: Arc<dyn RoleStore>,
}

impl Gatekeeper {
    pub fn new(identities: Arc<dyn IdentityProvider>, roles: Arc<dyn RoleStore>) -> Self {
        Gatekeeper { identities, roles }
    }

    /// Users seen for the first time are stored as earthlings
    pub fn authenticate(&self, token: Option<&str>) -> Result<Session, AccessError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AccessError::TokenMissing)?;
        let identity = self.identities.verify(token).map_err(|e| {
            debug!(error = %e, "Token verification failed");
            AccessError::InvalidToken
        })?;
        let role = match self.roles.role(&identity.uid) {
            Some(role) => role,
            None => {
                info!(uid = %identity.uid, "Assigning default role");
                self.roles.set_role(&identity.uid, Role::default());
                Role::default()
            }
        };
        Ok(Session { identity, role })
    }

    /// Admins pass every role check
    pub fn require(&self, session: &Session, role: Role) -> Result<(), AccessError> {
        if session.role == role || session.role == Role::Admin {
            Ok(())
        } else {
            Err(AccessError::RoleRequired(role))
        }
    }

    pub fn authorize(&self, token: Option<&str>, role: Role) -> Result<Session, AccessError> {
        let session = self.authenticate(token)?;
        self.require(&session, role)?;
        Ok(session)
    }
}

/// Token to uid table
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    tokens: Mutex<HashMap<String, Uid>>,
}

impl InMemoryIdentityProvider {
    pub fn issue(&self, token: impl Into<String>, uid: impl Into<Uid>) {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), uid.into());
    }

    pub fn revoke(&self, token: &str) {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn verify(&self, token: &str) -> Result<Identity, AccessError> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .map(|uid| Identity { uid: uid.clone() })
            .ok_or(AccessError::InvalidToken)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    roles: Mutex<HashMap<Uid, Role>>,
}

impl RoleStore for InMemoryRoleStore {
    fn role(&self, uid: &str) -> Option<Role> {
        self.roles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uid)
            .copied()
    }

    fn set_role(&self, uid: &str, role: Role) {
        self.roles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uid.to_owned(), role);
    }
}
