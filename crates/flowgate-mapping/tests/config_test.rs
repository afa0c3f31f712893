// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mapping tables built from JSON configuration and applied to parsed
//! upstream responses.

use flowgate_mapping::{MappingEntryConfig, MappingError, MappingTable};
use flowgate_tree::TreeNode;
use serde_json::{Value, json};

fn table_from(config: Value) -> Result<MappingTable, MappingError> {
    let entries: Vec<MappingEntryConfig> =
        serde_json::from_value(config).expect("config should deserialize");
    MappingTable::from_config(&entries)
}

#[test]
fn test_configured_table_shapes_upstream_response() {
    let table = table_from(json!([
        {"from": {"path": "data.user", "key": "name", "type": "string"},
         "to": {"path": "customer", "key": "displayName"}, "converter": "uppercase"},
        {"from": {"path": "data.user", "key": "id", "type": "integer"},
         "to": {"path": "customer", "key": "id"}},
        {"from": {"path": "data.user.flags", "key": "vip", "type": "boolean"},
         "to": {"path": "customer.flags", "key": "vip"}},
        {"from": {"path": "data.totals", "key": "amount", "type": "float"},
         "to": {"path": "billing", "key": "amount"}}
    ]))
    .unwrap();

    let upstream = TreeNode::parse(
        br#"{"data": {"user": {"id": 12, "name": "ada", "flags": {"vip": true}},
                      "totals": {"amount": 99.5}}}"#,
    )
    .unwrap();

    let shaped = Value::from(table.apply(&upstream));
    assert_eq!(
        shaped,
        json!({
            "customer": {"displayName": "ADA", "id": 12, "flags": {"vip": true}},
            "billing": {"amount": 99.5}
        })
    );
}

#[test]
fn test_unknown_source_type_is_rejected() {
    let err = table_from(json!([
        {"from": {"path": "user", "key": "born", "type": "date"},
         "to": {"path": "profile", "key": "born"}}
    ]))
    .unwrap_err();

    assert_eq!(err, MappingError::UnknownType("date".to_string()));
    assert!(err.to_string().contains("date"));
}

#[test]
fn test_unknown_target_type_is_rejected() {
    let err = table_from(json!([
        {"from": {"path": "user", "key": "id"},
         "to": {"key": "id", "type": "uuid"}}
    ]))
    .unwrap_err();

    assert_eq!(err, MappingError::UnknownType("uuid".to_string()));
}

#[test]
fn test_unknown_converter_is_rejected() {
    let err = table_from(json!([
        {"from": {"path": "user", "key": "id"},
         "to": {"key": "id"}, "converter": "rot13"}
    ]))
    .unwrap_err();

    assert_eq!(err, MappingError::UnknownConverter("rot13".to_string()));
}

#[test]
fn test_empty_table_yields_empty_object() {
    let table = table_from(json!([])).unwrap();
    let shaped = table.apply(&TreeNode::parse(br#"{"a": 1}"#).unwrap());
    assert_eq!(shaped.to_compact_string(), "{}");
}
