//! Who is using the app: nobody, a guest, or a signed-in account.

pub mod provider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::AuthError;

pub use provider::LocalIdentityProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityKind {
    Anonymous,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub kind: IdentityKind,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn anonymous(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: IdentityKind::Anonymous,
            display_name: None,
            email: None,
        }
    }

    pub fn authenticated(
        id: impl Into<String>,
        display_name: Option<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: IdentityKind::Authenticated,
            display_name,
            email,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.kind == IdentityKind::Anonymous
    }

    /// Label shown in the header.
    pub fn label(&self) -> &str {
        match self.kind {
            IdentityKind::Anonymous => "Guest session",
            IdentityKind::Authenticated => self
                .display_name
                .as_deref()
                .or(self.email.as_deref())
                .unwrap_or(&self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRequest {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, request: SignInRequest) -> Result<Identity, AuthError>;

    async fn sign_in_anonymously(&self) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Identity changes, starting with the current one.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}
