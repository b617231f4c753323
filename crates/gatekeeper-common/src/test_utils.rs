//! Test utilities and shared test helpers for the Gatekeeper workspace.
//!
//! This module provides common fixtures and helper functions that can be used
//! across all crates in the workspace for unit and integration testing.

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// User fixtures mirroring the demo seed data.
pub mod user_fixtures {
    use crate::{Role, User, UserId};

    /// The seeded administrator.
    pub fn admin() -> User {
        User {
            id: UserId(1),
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
            is_authorized: true,
        }
    }

    /// A regular user that has been authorized.
    pub fn authorized_user() -> User {
        User {
            id: UserId(2),
            username: "user1".to_string(),
            email: "user1@example.com".to_string(),
            role: Role::User,
            is_authorized: true,
        }
    }

    /// A regular user still waiting for authorization.
    pub fn unauthorized_user() -> User {
        User {
            id: UserId(3),
            username: "user2".to_string(),
            email: "user2@example.com".to_string(),
            role: Role::User,
            is_authorized: false,
        }
    }
}

/// Configuration-related test utilities.
pub mod config_fixtures {
    /// Create a minimal valid test configuration as YAML string.
    pub fn minimal_config_yaml() -> &'static str {
        r#"
bot:
  token: "test_token"

storage:
  backend: memory
"#
    }

    /// Create a full test configuration as YAML string.
    pub fn full_config_yaml() -> &'static str {
        concat!(
            "bot:\n",
            "  token: \"test_token_full\"\n",
            "  prefix: \"/\"\n",
            "  typing_delay_ms: 0\n",
            "\n",
            "auth:\n",
            "  demo_password: \"hunter2\"\n",
            "  seed_demo_users: true\n",
            "\n",
            "storage:\n",
            "  backend: file\n",
            "  data_dir: \"./data\"\n",
            "\n",
            "downloads:\n",
            "  tick_interval_ms: 250\n",
            "  min_step: 5\n",
            "  max_step: 15\n",
            "  single_step_delay_ms: 1500\n",
            "\n",
            "logging:\n",
            "  level: \"debug\"\n",
            "  format: compact\n",
            "  include_spans: false\n",
            "  include_targets: true\n"
        )
    }
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use proptest::prelude::*;

    /// Strategy for tokens shaped like commands (`/` plus lowercase letters).
    pub fn command_token_strategy() -> impl Strategy<Value = String> {
        r"/[a-z]{1,12}".prop_map(|s| s.to_string())
    }

    /// Strategy for free-form parameter text with irregular spacing.
    pub fn params_strategy() -> impl Strategy<Value = String> {
        r"[ a-zA-Z]{0,24}".prop_map(|s| s.to_string())
    }
}
