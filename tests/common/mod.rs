//! Shared fixtures for the integration tests

#![allow(dead_code)]

use rowguard::mapping::{AccessorRegistry, EntityMapping};
use rowguard::validation::{AccessorError, Value};
use rowguard::ValidationPipeline;
use serde_json::json;

pub const EMAIL_QUERY: &str = "SELECT 1 FROM users WHERE email = ?";
pub const PARENT_QUERY: &str = "SELECT 1 FROM users WHERE id = ?";

pub const USER_MAPPING: &str = r#"{
    "entity": "user",
    "fields": [
        {"column": "id", "auto_generated": true},
        {"column": "email"},
        {"column": "name"},
        {"column": "status", "default": "active"},
        {"column": "parentId", "required": false}
    ],
    "unique_keys": [
        {"subject": "Email", "query": "SELECT 1 FROM users WHERE email = ?", "columns": ["email"]}
    ],
    "references": [
        {"subject": "Parent", "query": "SELECT 1 FROM users WHERE id = ?", "columns": ["parentId"]}
    ]
}"#;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub email: String,
    pub name: String,
    pub status: Option<String>,
    pub parent_id: Option<i64>,
}

impl User {
    pub fn new(email: &str, name: &str) -> Self {
        Self {
            email: email.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }
}

fn optional_int(value: Option<i64>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

fn expect_string(value: Value) -> Result<String, AccessorError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(AccessorError::type_mismatch(
            "string",
            rowguard::validation::type_name(&other),
        )),
    }
}

pub fn user_registry() -> AccessorRegistry<User> {
    let mut registry = AccessorRegistry::new();
    registry
        .register(
            "id",
            |u: &User| Ok(optional_int(u.id)),
            |u: &mut User, v| {
                u.id = v.as_i64();
                Ok(())
            },
        )
        .register(
            "email",
            |u: &User| Ok(json!(u.email)),
            |u: &mut User, v| {
                u.email = expect_string(v)?;
                Ok(())
            },
        )
        .register(
            "name",
            |u: &User| Ok(json!(u.name)),
            |u: &mut User, v| {
                u.name = expect_string(v)?;
                Ok(())
            },
        )
        .register(
            "status",
            |u: &User| Ok(u.status.clone().map(Value::String).unwrap_or(Value::Null)),
            |u: &mut User, v| {
                u.status = Some(expect_string(v)?);
                Ok(())
            },
        )
        .register(
            "parentId",
            |u: &User| Ok(optional_int(u.parent_id)),
            |u: &mut User, v| {
                u.parent_id = v.as_i64();
                Ok(())
            },
        );
    registry
}

pub fn user_pipeline() -> ValidationPipeline<User> {
    EntityMapping::from_json(USER_MAPPING)
        .unwrap()
        .bind(&user_registry())
        .unwrap()
}

/// (field key, message) pairs of a failed result
pub fn violation_pairs(result: rowguard::ValidationResult) -> Vec<(String, String)> {
    let err = result.expect_err("expected violations");
    let violations = err
        .violations()
        .unwrap_or_else(|| panic!("expected violations, got fault: {}", err));
    violations
        .iter()
        .map(|e| (e.field_key().to_string(), e.message().to_string()))
        .collect()
}
