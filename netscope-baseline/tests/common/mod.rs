//! Shared fixtures for netscope-baseline integration tests

#![allow(dead_code)]

use netscope_baseline::Record;
use serde_json::{Value, json};

pub fn record(value: Value) -> Record {
    serde_json::from_value(value).expect("fixture must be a flat JSON object")
}

pub fn interfaces_before() -> Vec<Record> {
    vec![
        record(json!({"interface": "Gi0/1", "link_status": "up", "mtu": 1500})),
        record(json!({"interface": "Gi0/2", "link_status": "up", "mtu": 1500})),
        record(json!({"interface": "Gi0/3", "link_status": "down", "mtu": 1500})),
    ]
}

pub fn interfaces_after() -> Vec<Record> {
    vec![
        record(json!({"interface": "Gi0/1", "link_status": "down", "mtu": 1500})),
        record(json!({"interface": "Gi0/2", "link_status": "up", "mtu": 9000, "description": "uplink"})),
        record(json!({"interface": "Gi0/4", "link_status": "up", "mtu": 1500})),
    ]
}
