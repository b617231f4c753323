//! Integration tests for gatekeeper-common crate.

use chrono::{TimeZone, Utc};
use gatekeeper_common::{
    format_timestamp, mask_secret, truncate_string, ChatId, GatekeeperError, Role, User, UserId,
};

#[test]
fn test_chat_id_display() {
    let chat_id = ChatId(123456789);
    assert_eq!(format!("{}", chat_id), "123456789");
}

#[test]
fn test_user_id_display() {
    let user_id = UserId(987654321);
    assert_eq!(format!("{}", user_id), "987654321");
}

#[test]
fn test_new_user_is_unauthorized_regular_user() {
    let user = User::new(UserId(4), "newcomer", "new@example.com");
    assert_eq!(user.role, Role::User);
    assert!(!user.is_authorized);
    assert!(!user.is_admin());
}

#[test]
fn test_user_json_round_trip_keeps_role() {
    let json = r#"{"id":1,"username":"admin","email":"admin@example.com","role":"admin","isAuthorized":true}"#;
    let user: User = serde_json::from_str(json).unwrap();
    assert_eq!(user.role, Role::Admin);
    assert!(user.is_authorized);
}

#[test]
fn test_format_timestamp() {
    let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let formatted = format_timestamp(timestamp);
    assert_eq!(formatted, "2024-01-01 12:00:00 UTC");
}

#[test]
fn test_truncate_and_mask() {
    assert_eq!(truncate_string("Short", 20), "Short");
    assert_eq!(mask_secret("0123456789abcdef", 4), "0123...");
}

#[test]
fn test_yaml_error_converts_to_config_error() {
    let err = serde_yaml::from_str::<serde_yaml::Value>("key: [unclosed").unwrap_err();
    let converted: GatekeeperError = err.into();
    assert!(matches!(converted, GatekeeperError::Config { .. }));
}
