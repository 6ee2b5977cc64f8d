use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = UserId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = SubscriptionId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
    assert_eq!(SubscriptionId::from(uuid), id);
}

#[test]
fn test_typed_id_ordering_follows_creation() {
    let first = NotificationBatchId::new();
    let second = NotificationBatchId::new();
    assert!(first <= second);
}

#[test]
fn test_typed_id_parse_round_trip() {
    let id = CategoryId::new();
    let parsed = CategoryId::from_str(&id.to_string()).unwrap();
    assert_eq!(parsed, id);
    assert!(CategoryId::from_str("not-a-uuid").is_err());
}

#[test]
fn test_typed_id_serializes_transparently() {
    let uuid = Uuid::new_v4();
    let id = UserId::from_uuid(uuid);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));
}
