//! Demo user set written into an empty store.

use gatekeeper_common::{Role, User, UserId};

/// The three demo accounts: an authorized admin, an authorized user and a
/// user waiting for authorization.
pub fn demo_users() -> Vec<User> {
    vec![
        User {
            id: UserId(1),
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
            is_authorized: true,
        },
        User {
            id: UserId(2),
            username: "user1".to_string(),
            email: "user1@example.com".to_string(),
            role: Role::User,
            is_authorized: true,
        },
        User {
            id: UserId(3),
            username: "user2".to_string(),
            email: "user2@example.com".to_string(),
            role: Role::User,
            is_authorized: false,
        },
    ]
}
