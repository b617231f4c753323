//! User list and active session.
//!
//! [`AuthService`] owns both behind one lock. Every mutation builds the next
//! state, persists the user list and the session, and only then swaps the
//! in-memory state, so readers never observe a user list and session that
//! disagree.

use crate::backend::{JsonStoreExt, KeyValueStore, SESSION_KEY, USERS_KEY};
use crate::seed::demo_users;
use crate::verifier::CredentialVerifier;
use gatekeeper_common::{GatekeeperError, Result, Role, User, UserId};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of an authorize/deauthorize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationChange {
    /// The flag flipped and the new state was persisted.
    Updated,
    /// The user already had the requested flag.
    Unchanged,
    /// No user with that id exists.
    UnknownUser,
}

#[derive(Debug, Default)]
struct AuthState {
    users: Vec<User>,
    session: Option<User>,
    ready: bool,
}

/// Login, registration and authorization over a [`KeyValueStore`].
pub struct AuthService {
    store: Arc<dyn KeyValueStore>,
    verifier: Arc<dyn CredentialVerifier>,
    seed_demo_users: bool,
    state: RwLock<AuthState>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("AuthService")
            .field("store", &self.store)
            .field("users", &state.users.len())
            .field("session", &state.session.as_ref().map(|u| u.id))
            .field("ready", &state.ready)
            .finish()
    }
}

impl AuthService {
    /// Creates a service; call [`AuthService::init`] before use.
    pub fn new(store: Arc<dyn KeyValueStore>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            store,
            verifier,
            seed_demo_users: true,
            state: RwLock::new(AuthState::default()),
        }
    }

    /// Controls whether an empty store receives the demo users.
    pub fn with_seed_demo_users(mut self, seed: bool) -> Self {
        self.seed_demo_users = seed;
        self
    }

    /// Loads users, seeding them if needed, and restores the last session.
    pub fn init(&self) -> Result<()> {
        let mut state = self.state.write();

        let users = match self.store.load_json::<Vec<User>>(USERS_KEY)? {
            Some(users) => users,
            None if self.seed_demo_users => {
                let users = demo_users();
                self.store.store_json(USERS_KEY, &users)?;
                info!(count = users.len(), "Seeded demo users");
                users
            }
            None => Vec::new(),
        };

        let session = self.restore_session(&users)?;

        info!(
            users = users.len(),
            session = session.as_ref().map(|u| u.username.as_str()),
            "Auth service initialized"
        );

        *state = AuthState {
            users,
            session,
            ready: true,
        };
        Ok(())
    }

    fn restore_session(&self, users: &[User]) -> Result<Option<User>> {
        let stored = match self.store.load_json::<User>(SESSION_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session");
                self.store.remove(SESSION_KEY)?;
                return Ok(None);
            }
        };

        let Some(stored) = stored else {
            return Ok(None);
        };

        match users.iter().find(|u| u.id == stored.id) {
            Some(canonical) => {
                if *canonical != stored {
                    self.store.store_json(SESSION_KEY, canonical)?;
                }
                debug!(user = %canonical.username, "Restored session");
                Ok(Some(canonical.clone()))
            }
            None => {
                warn!(user_id = %stored.id, "Session refers to a missing user, removing it");
                self.store.remove(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    /// Persists the current state and marks the service unusable.
    pub fn shutdown(&self) -> Result<()> {
        let mut state = self.state.write();
        if !state.ready {
            return Ok(());
        }

        self.persist(&state.users, state.session.as_ref())?;
        state.ready = false;
        info!("Auth service shut down");
        Ok(())
    }

    /// Whether [`AuthService::init`] has run and no shutdown followed.
    pub fn is_ready(&self) -> bool {
        self.state.read().ready
    }

    /// Signs a user in and makes them the active session.
    pub fn login(&self, email: &str, password: &str) -> Result<User> {
        let mut state = self.state.write();
        Self::ensure_ready(&state)?;

        let user = self.check_credentials(&state, email, password)?;

        self.store.store_json(SESSION_KEY, &user)?;
        state.session = Some(user.clone());

        info!(user = %user.username, "User logged in");
        Ok(user)
    }

    /// Checks credentials without touching the active session.
    pub fn verify_credentials(&self, email: &str, password: &str) -> Result<User> {
        let state = self.state.read();
        Self::ensure_ready(&state)?;
        self.check_credentials(&state, email, password)
    }

    fn check_credentials(&self, state: &AuthState, email: &str, password: &str) -> Result<User> {
        let email = email.trim();
        state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .filter(|u| self.verifier.verify(u, password))
            .cloned()
            .ok_or_else(|| {
                warn!(email, "Rejected credentials");
                GatekeeperError::auth("Invalid email or password")
            })
    }

    /// Creates a regular, unauthorized user and signs them in.
    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let username = username.trim().trim_start_matches('@');
        let email = email.trim();

        if username.is_empty() {
            return Err(GatekeeperError::validation_field("Username is required", "username"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(GatekeeperError::validation_field(
                "A valid email is required",
                "email",
            ));
        }
        if password.is_empty() {
            return Err(GatekeeperError::validation_field("Password is required", "password"));
        }

        let mut state = self.state.write();
        Self::ensure_ready(&state)?;

        if state.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(GatekeeperError::duplicate_registration(email));
        }
        // Chat senders are resolved by username, so it must be unique too.
        if state
            .users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username))
        {
            return Err(GatekeeperError::validation_field(
                "Username is already taken",
                "username",
            ));
        }

        let next_id = state.users.iter().map(|u| u.id.0).max().unwrap_or(0) + 1;
        let user = User::new(UserId(next_id), username, email);
        self.verifier.enroll(&user, password)?;

        let mut users = state.users.clone();
        users.push(user.clone());
        self.persist(&users, Some(&user))?;

        state.users = users;
        state.session = Some(user.clone());

        info!(user = %user.username, id = %user.id, "User registered");
        Ok(user)
    }

    /// Clears the active session.
    pub fn logout(&self) -> Result<()> {
        let mut state = self.state.write();
        Self::ensure_ready(&state)?;

        self.store.remove(SESSION_KEY)?;
        if let Some(user) = state.session.take() {
            info!(user = %user.username, "User logged out");
        }
        Ok(())
    }

    /// Grants access to restricted commands. Unknown ids are a no-op.
    pub fn authorize(&self, user_id: UserId) -> Result<AuthorizationChange> {
        self.set_authorization(user_id, true)
    }

    /// Revokes access to restricted commands. Unknown ids are a no-op.
    pub fn deauthorize(&self, user_id: UserId) -> Result<AuthorizationChange> {
        self.set_authorization(user_id, false)
    }

    /// [`AuthService::authorize`] on behalf of `actor`, who must be an admin.
    pub fn authorize_by(&self, actor: &User, user_id: UserId) -> Result<AuthorizationChange> {
        self.ensure_admin(actor)?;
        self.authorize(user_id)
    }

    /// [`AuthService::deauthorize`] on behalf of `actor`, who must be an admin.
    pub fn deauthorize_by(&self, actor: &User, user_id: UserId) -> Result<AuthorizationChange> {
        self.ensure_admin(actor)?;
        self.deauthorize(user_id)
    }

    fn set_authorization(&self, user_id: UserId, authorized: bool) -> Result<AuthorizationChange> {
        let mut state = self.state.write();
        Self::ensure_ready(&state)?;

        let Some(index) = state.users.iter().position(|u| u.id == user_id) else {
            debug!(%user_id, "Authorization change for unknown user ignored");
            return Ok(AuthorizationChange::UnknownUser);
        };

        if state.users[index].is_authorized == authorized {
            return Ok(AuthorizationChange::Unchanged);
        }

        let mut users = state.users.clone();
        users[index].is_authorized = authorized;
        let updated = users[index].clone();

        let session = match &state.session {
            Some(current) if current.id == user_id => Some(updated.clone()),
            other => other.clone(),
        };

        self.persist(&users, session.as_ref())?;
        state.users = users;
        state.session = session;

        info!(user = %updated.username, authorized, "Authorization changed");
        Ok(AuthorizationChange::Updated)
    }

    fn ensure_admin(&self, actor: &User) -> Result<()> {
        // Trust the stored role, not the caller's copy.
        let is_admin = self
            .state
            .read()
            .users
            .iter()
            .any(|u| u.id == actor.id && u.role == Role::Admin);

        if is_admin {
            Ok(())
        } else {
            warn!(actor = %actor.username, "Non-admin attempted user management");
            Err(GatekeeperError::auth("Administrator privileges required"))
        }
    }

    fn ensure_ready(state: &AuthState) -> Result<()> {
        if state.ready {
            Ok(())
        } else {
            Err(GatekeeperError::new("Auth service is not initialized"))
        }
    }

    fn persist(&self, users: &[User], session: Option<&User>) -> Result<()> {
        self.store.store_json(USERS_KEY, users)?;
        match session {
            Some(user) => self.store.store_json(SESSION_KEY, user),
            None => self.store.remove(SESSION_KEY),
        }
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.state.read().session.clone()
    }

    /// Snapshot of all users, ordered by id.
    pub fn users(&self) -> Vec<User> {
        let mut users = self.state.read().users.clone();
        users.sort_by_key(|u| u.id);
        users
    }

    /// Looks up a user by id.
    pub fn find_user(&self, user_id: UserId) -> Option<User> {
        self.state
            .read()
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
    }

    /// Looks up a user by username, ignoring case and a leading `@`.
    pub fn find_by_username(&self, username: &str) -> Option<User> {
        let wanted = username.trim().trim_start_matches('@');
        self.state
            .read()
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(wanted))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use crate::verifier::{MockCredentialVerifier, SharedPasswordVerifier};
    use gatekeeper_common::test_utils::user_fixtures;

    fn service_with(store: Arc<MemoryStore>) -> AuthService {
        let service = AuthService::new(store, Arc::new(SharedPasswordVerifier::default()));
        service.init().unwrap();
        service
    }

    fn service() -> AuthService {
        service_with(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_init_seeds_empty_store() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store.clone());

        assert_eq!(service.users().len(), 3);
        assert!(store.get(USERS_KEY).unwrap().is_some());
        assert!(service.current_user().is_none());
    }

    #[test]
    fn test_init_without_seed() {
        let service = AuthService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SharedPasswordVerifier::default()),
        )
        .with_seed_demo_users(false);
        service.init().unwrap();

        assert!(service.users().is_empty());
    }

    #[test]
    fn test_operations_require_init() {
        let service = AuthService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SharedPasswordVerifier::default()),
        );

        assert!(!service.is_ready());
        assert!(service.login("admin@example.com", "password").is_err());
        assert!(service.authorize(UserId(3)).is_err());
    }

    #[test]
    fn test_login_uses_verifier() {
        let mut verifier = MockCredentialVerifier::new();
        verifier
            .expect_verify()
            .withf(|user, password| user.username == "user1" && password == "letmein")
            .times(1)
            .return_const(true);

        let service = AuthService::new(Arc::new(MemoryStore::new()), Arc::new(verifier));
        service.init().unwrap();

        let user = service.login("user1@example.com", "letmein").unwrap();
        assert_eq!(user, user_fixtures::authorized_user());
    }

    #[test]
    fn test_login_unknown_email_skips_verifier() {
        let mut verifier = MockCredentialVerifier::new();
        verifier.expect_verify().never();

        let service = AuthService::new(Arc::new(MemoryStore::new()), Arc::new(verifier));
        service.init().unwrap();

        let err = service.login("nobody@example.com", "password").unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn test_verify_credentials_leaves_session_alone() {
        let service = service();

        let admin = service
            .verify_credentials("admin@example.com", "password")
            .unwrap();
        assert!(admin.is_admin());
        assert!(service.current_user().is_none());
    }

    #[test]
    fn test_authorize_updates_session_copy() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store.clone());
        service.login("user2@example.com", "password").unwrap();

        assert_eq!(
            service.authorize(UserId(3)).unwrap(),
            AuthorizationChange::Updated
        );

        let session = service.current_user().unwrap();
        assert!(session.is_authorized);

        let persisted: User = store.load_json(SESSION_KEY).unwrap().unwrap();
        assert!(persisted.is_authorized);
    }

    #[test]
    fn test_authorize_is_idempotent() {
        let service = service();

        assert_eq!(
            service.authorize(UserId(2)).unwrap(),
            AuthorizationChange::Unchanged
        );
        assert!(service.find_user(UserId(2)).unwrap().is_authorized);
    }

    #[test]
    fn test_admin_gate_checks_stored_role() {
        let service = service();

        let mut forged = user_fixtures::authorized_user();
        forged.role = Role::Admin;

        let err = service.authorize_by(&forged, UserId(3)).unwrap_err();
        assert!(err.is_auth());
        assert!(!service.find_user(UserId(3)).unwrap().is_authorized);

        assert_eq!(
            service
                .authorize_by(&user_fixtures::admin(), UserId(3))
                .unwrap(),
            AuthorizationChange::Updated
        );
    }

    #[test]
    fn test_register_assigns_next_id() {
        let service = service();

        let user = service.register("newbie", "new@example.com", "pw").unwrap();
        assert_eq!(user.id, UserId(4));
        assert_eq!(user.role, Role::User);
        assert!(!user.is_authorized);
        assert_eq!(service.current_user(), Some(user));
    }

    #[test]
    fn test_register_validation() {
        let service = service();

        assert!(service.register("", "a@b.c", "pw").is_err());
        assert!(service.register("x", "not-an-email", "pw").is_err());
        assert!(service.register("x", "a@b.c", "").is_err());
        assert_eq!(service.users().len(), 3);
    }

    #[test]
    fn test_find_by_username() {
        let service = service();

        assert_eq!(
            service.find_by_username("@Admin"),
            Some(user_fixtures::admin())
        );
        assert!(service.find_by_username("ghost").is_none());
    }

    #[test]
    fn test_shutdown_then_operations_fail() {
        let service = service();
        service.shutdown().unwrap();
        service.shutdown().unwrap();

        assert!(service.logout().is_err());
    }
}
