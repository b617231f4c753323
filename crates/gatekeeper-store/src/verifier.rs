//! Credential verification.

use gatekeeper_common::{Result, User};

/// Decides whether a password is valid for a stored user.
///
/// The session service only ever asks this trait; swapping the demo
/// verifier for real password hashing does not touch the session logic.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialVerifier: Send + Sync {
    /// Returns `true` when `password` is accepted for `user`.
    fn verify(&self, user: &User, password: &str) -> bool;

    /// Records credentials for a newly registered user.
    fn enroll(&self, _user: &User, _password: &str) -> Result<()> {
        Ok(())
    }
}

/// Demo verifier: every user shares one password.
#[derive(Debug, Clone)]
pub struct SharedPasswordVerifier {
    password: String,
}

impl SharedPasswordVerifier {
    /// Creates a verifier accepting `password` for every user.
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl Default for SharedPasswordVerifier {
    fn default() -> Self {
        Self::new("password")
    }
}

impl CredentialVerifier for SharedPasswordVerifier {
    fn verify(&self, _user: &User, password: &str) -> bool {
        password == self.password
    }
}
