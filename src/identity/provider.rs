use async_trait::async_trait;
use tokio::sync::watch;

use super::{Identity, IdentityProvider, SignInRequest};
use crate::database::models::next_item_id;
use crate::error::AuthError;

/// In-process identity provider. Sign-in trusts the account details it is
/// given; every change is published on a watch channel.
pub struct LocalIdentityProvider {
    current: watch::Sender<Option<Identity>>,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    fn publish(&self, identity: Option<Identity>) {
        self.current.send_replace(identity);
    }
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self, request: SignInRequest) -> Result<Identity, AuthError> {
        let id = request.id.trim();
        if id.is_empty() {
            return Err(AuthError::new("auth/invalid-credential", "account id is empty"));
        }
        if let Some(email) = request.email.as_deref() {
            if !email.contains('@') {
                return Err(AuthError::new(
                    "auth/invalid-email",
                    format!("'{email}' is not an email address"),
                ));
            }
        }
        if let Some(current) = self.current() {
            if !current.is_anonymous() && current.id != id {
                return Err(AuthError::new(
                    "auth/credential-already-in-use",
                    "another account is signed in",
                ));
            }
        }

        let identity = Identity::authenticated(id, request.display_name, request.email);
        tracing::info!(user = %identity.id, "signed in");
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in_anonymously(&self) -> Result<Identity, AuthError> {
        if let Some(current) = self.current() {
            return Ok(current);
        }
        let identity = Identity::anonymous(format!("guest-{}", next_item_id()));
        tracing::info!(user = %identity.id, "guest session started");
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        tracing::info!("signed out");
        self.publish(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str) -> SignInRequest {
        SignInRequest {
            id: id.into(),
            display_name: Some("Ana".into()),
            email: Some("ana@example.com".into()),
        }
    }

    #[tokio::test]
    async fn guest_can_upgrade_to_an_account() {
        let provider = LocalIdentityProvider::new();
        let mut rx = provider.subscribe();

        let guest = provider.sign_in_anonymously().await.unwrap();
        assert!(guest.is_anonymous());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&guest));

        let user = provider.sign_in(request("ana")).await.unwrap();
        assert_eq!(user.label(), "Ana");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().map(|i| i.id.as_str()), Some("ana"));
    }

    #[tokio::test]
    async fn second_account_is_rejected_while_signed_in() {
        let provider = LocalIdentityProvider::new();
        provider.sign_in(request("ana")).await.unwrap();
        let err = provider.sign_in(request("bo")).await.unwrap_err();
        assert_eq!(err.code, "auth/credential-already-in-use");
    }

    #[tokio::test]
    async fn empty_id_is_an_invalid_credential() {
        let provider = LocalIdentityProvider::new();
        let err = provider.sign_in(request("  ")).await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid sign-in details.");
        assert_eq!(provider.current(), None);
    }
}
