use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = BranchId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
    assert_eq!(BranchId::from(uuid), id);
}

#[test]
fn test_typed_id_new_is_time_ordered() {
    let first = CompanyId::new();
    let second = CompanyId::new();
    assert_eq!(first.into_inner().get_version_num(), 7);
    assert!(first <= second);
}

#[test]
fn test_typed_id_display() {
    let uuid = Uuid::new_v4();
    let id = EmployeeId::from_uuid(uuid);
    assert_eq!(format!("{id}"), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = UserId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
    assert!(UserId::from_str("BKKJKT0001").is_err());
}

#[test]
fn test_typed_id_serializes_transparently() {
    let uuid = Uuid::new_v4();
    let json = serde_json::to_string(&CompanyId::from_uuid(uuid)).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));
}
