//! Validation Invariant Tests
//!
//! - Required-field validation is exhaustive and ordered
//! - Defaults are written into empty fields
//! - Auto-generated fields are never read, defaulted or bound before insert
//! - Existence outcomes follow the must-exist / must-not-exist truth table
//! - Composite keys report under the "generic" field key

mod common;

use common::*;
use proptest::prelude::*;
use rowguard::mapping::EntityMapping;
use rowguard::memory::MemoryExecutor;
use rowguard::validation::{
    AccessorError, ErrorCode, ExistenceQuery, ExistenceRule, ExistenceValidator, FieldAccessor,
    FieldMetadata, RequiredFieldValidator, ValidationMode, Value,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

/// A record of N optional text slots, one accessor per slot.
fn slot_fields(n: usize) -> Vec<FieldAccessor<Vec<Option<String>>>> {
    (0..n)
        .map(|i| {
            FieldAccessor::new(
                FieldMetadata::new(format!("field{}", i)),
                move |r: &Vec<Option<String>>| {
                    Ok(r[i].clone().map(Value::String).unwrap_or(Value::Null))
                },
                move |r: &mut Vec<Option<String>>, v| {
                    r[i] = v.as_str().map(str::to_string);
                    Ok(())
                },
            )
        })
        .collect()
}

struct Person {
    name: String,
    age: Option<i64>,
}

fn person_validator() -> RequiredFieldValidator<Person> {
    let name = FieldAccessor::new(
        FieldMetadata::new("name"),
        |p: &Person| Ok(json!(p.name)),
        |p: &mut Person, v| {
            p.name = v.as_str().unwrap_or_default().to_string();
            Ok(())
        },
    );
    let age = FieldAccessor::new(
        FieldMetadata::new("age"),
        |p: &Person| Ok(p.age.map(Value::from).unwrap_or(Value::Null)),
        |p: &mut Person, v| {
            p.age = v.as_i64();
            Ok(())
        },
    );
    RequiredFieldValidator::new("person", vec![name, age])
}

// =============================================================================
// Required Field Tests
// =============================================================================

proptest! {
    /// N empty fields without defaults yield exactly N violations, in order.
    #[test]
    fn prop_required_validation_is_exhaustive(slots in prop::collection::vec(
        prop_oneof![
            Just(None),
            Just(Some(String::new())),
            Just(Some("  ".to_string())),
            "[a-z]{1,8}".prop_map(Some),
        ],
        0..12,
    )) {
        let validator = RequiredFieldValidator::new("slots", slot_fields(slots.len()));
        let expected: Vec<String> = slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_deref().map_or(true, |t| t.trim().is_empty()))
            .map(|(i, _)| format!("field{}", i))
            .collect();

        let mut record = slots.clone();
        let result = validator.validate(&mut record, ValidationMode::AllFields);

        if expected.is_empty() {
            prop_assert!(result.is_ok());
        } else {
            let keys: Vec<String> = violation_pairs(result).into_iter().map(|(k, _)| k).collect();
            prop_assert_eq!(keys, expected);
        }
    }
}

/// Scenario: `{name: "", age: 30}` reports only the name.
#[test]
fn test_empty_name_is_the_only_violation() {
    let validator = person_validator();
    let mut person = Person {
        name: String::new(),
        age: Some(30),
    };

    let pairs = violation_pairs(validator.validate(&mut person, ValidationMode::AllFields));
    assert_eq!(pairs, vec![("name".to_string(), "Name required.".to_string())]);
}

/// Zero is a value, not an empty field.
#[test]
fn test_zero_is_not_empty() {
    let validator = person_validator();
    let mut person = Person {
        name: "Ann".into(),
        age: Some(0),
    };
    assert!(validator.validate(&mut person, ValidationMode::AllFields).is_ok());
}

/// Empty status ends the call set to the declared default.
#[test]
fn test_default_substitution() {
    let pipeline = user_pipeline();
    let mut user = User::new("a@b.com", "Ann");

    assert!(pipeline.validate_fields(&mut user).is_err()); // id is empty
    assert_eq!(user.status.as_deref(), Some("active"));

    let mut executor = MemoryExecutor::new();
    let mut user = User::new("a@b.com", "Ann");
    assert!(pipeline.validate_for_insert(&mut executor, &mut user).is_ok());
    assert_eq!(user.status.as_deref(), Some("active"));
}

/// A default that the writer rejects becomes a required-field violation.
#[test]
fn test_default_write_failure_degrades_to_violation() {
    let field = FieldAccessor::new(
        FieldMetadata::new("score").with_default(json!(10)),
        |_: &Person| Ok(Value::Null),
        |_: &mut Person, _| Err(AccessorError::ReadOnly),
    );
    let validator = RequiredFieldValidator::new("person", vec![field]);
    let mut person = Person {
        name: "x".into(),
        age: None,
    };

    let err = validator
        .validate(&mut person, ValidationMode::AllFields)
        .unwrap_err();
    assert!(!err.is_fault());
    let v = err.violations().unwrap();
    assert_eq!(v.as_slice()[0].message(), "Score required.");
    assert_eq!(v.as_slice()[0].code(), ErrorCode::DmFieldRequired);
}

// =============================================================================
// Auto-Generated Field Tests
// =============================================================================

/// Before insert the auto-generated id is never read or written.
#[test]
fn test_insert_never_touches_auto_generated_fields() {
    let reads = Arc::new(AtomicUsize::new(0));
    let writes = Arc::new(AtomicUsize::new(0));
    let (r, w) = (Arc::clone(&reads), Arc::clone(&writes));

    let id = FieldAccessor::new(
        FieldMetadata::new("id").auto_generated().with_default(json!(1)),
        move |_: &User| {
            r.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        },
        move |_: &mut User, _| {
            w.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    );
    let email = FieldAccessor::read_only(FieldMetadata::new("email"), |u: &User| Ok(json!(u.email)));

    let pipeline = rowguard::ValidationPipeline::new(RequiredFieldValidator::new(
        "user",
        vec![id.clone(), email.clone()],
    ))
    .with_unique_key(ExistenceValidator::new(
        ExistenceQuery::new(EMAIL_QUERY, vec![email]).unwrap(),
        "Email",
    ))
    .with_unique_key(ExistenceValidator::new(
        ExistenceQuery::new("SELECT 1 FROM users WHERE id = ?", vec![id]).unwrap(),
        "User",
    ));

    let mut executor = MemoryExecutor::new();
    let mut user = User::new("a@b.com", "Ann");
    assert!(pipeline.validate_for_insert(&mut executor, &mut user).is_ok());

    assert_eq!(reads.load(Ordering::SeqCst), 0);
    assert_eq!(writes.load(Ordering::SeqCst), 0);
    let executed = executor.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].params, vec![json!("a@b.com")]);
}

/// A composite key with a surrogate part is never probed.
#[test]
fn test_composite_key_with_auto_generated_part_is_skipped() {
    let id = FieldAccessor::read_only(FieldMetadata::new("id").auto_generated(), |u: &User| {
        Ok(json!(u.id))
    });
    let email = FieldAccessor::read_only(FieldMetadata::new("email"), |u: &User| Ok(json!(u.email)));
    let guard = ExistenceValidator::new(
        ExistenceQuery::new("SELECT 1 FROM users WHERE id = ? AND email = ?", vec![id, email])
            .unwrap(),
        "User",
    );

    let mut executor = MemoryExecutor::new();
    for rule in [ExistenceRule::MustExist, ExistenceRule::MustNotExist] {
        assert!(guard
            .validate_existence(&mut executor, &User::default(), rule)
            .is_ok());
    }
    assert!(executor.executed().is_empty());
}

// =============================================================================
// Existence Tests
// =============================================================================

proptest! {
    /// Violation iff (must not exist and exists) or (must exist and missing).
    #[test]
    fn prop_existence_truth_table(exists in any::<bool>(), must_not_exist in any::<bool>()) {
        let email = FieldAccessor::read_only(FieldMetadata::new("email"), |u: &User| Ok(json!(u.email)));
        let guard = ExistenceValidator::new(
            ExistenceQuery::new(EMAIL_QUERY, vec![email]).unwrap(),
            "Email",
        );
        let mut executor = MemoryExecutor::new();
        if exists {
            executor.insert_row(EMAIL_QUERY, vec![json!("a@b.com")]);
        }

        let result = guard.validate_existence(
            &mut executor,
            &User::new("a@b.com", "Ann"),
            ExistenceRule::from_must_not_exist(must_not_exist),
        );

        match (must_not_exist, exists) {
            (true, true) => {
                prop_assert_eq!(
                    violation_pairs(result),
                    vec![("email".to_string(), "Email exists.".to_string())]
                );
            }
            (false, false) => {
                prop_assert_eq!(
                    violation_pairs(result),
                    vec![("email".to_string(), "Email does not exist.".to_string())]
                );
            }
            _ => {
                prop_assert!(result.is_ok());
            }
        }
        prop_assert_eq!(executor.open_handles(), 0);
    }
}

/// Two or more key fields report under "generic".
#[test]
fn test_composite_key_attribution() {
    const QUERY: &str = "SELECT 1 FROM users WHERE email = ? AND name = ?";
    let email = FieldAccessor::read_only(FieldMetadata::new("email"), |u: &User| Ok(json!(u.email)));
    let name = FieldAccessor::read_only(FieldMetadata::new("name"), |u: &User| Ok(json!(u.name)));
    let guard = ExistenceValidator::new(ExistenceQuery::new(QUERY, vec![email, name]).unwrap(), "User");

    let mut executor = MemoryExecutor::new();
    executor.insert_row(QUERY, vec![json!("a@b.com"), json!("Ann")]);

    let pairs = violation_pairs(guard.validate_existence(
        &mut executor,
        &User::new("a@b.com", "Ann"),
        ExistenceRule::MustNotExist,
    ));
    assert_eq!(pairs, vec![("generic".to_string(), "User exists.".to_string())]);
}

// =============================================================================
// Pipeline Scenarios
// =============================================================================

/// Unique email insert passes, then fails once the row exists.
#[test]
fn test_unique_email_insert() {
    let pipeline = user_pipeline();
    let mut executor = MemoryExecutor::new();

    let mut user = User::new("a@b.com", "Ann");
    assert!(pipeline.validate_for_insert(&mut executor, &mut user).is_ok());

    executor.insert_row(EMAIL_QUERY, vec![json!("a@b.com")]);

    let mut user = User::new("a@b.com", "Ann");
    let pairs = violation_pairs(pipeline.validate_for_insert(&mut executor, &mut user));
    assert_eq!(pairs, vec![("email".to_string(), "Email exists.".to_string())]);
}

/// A missing parent row is reported against parentId.
#[test]
fn test_reference_to_missing_parent() {
    let pipeline = user_pipeline();
    let mut executor = MemoryExecutor::new();
    let user = User {
        parent_id: Some(999),
        ..User::new("a@b.com", "Ann")
    };

    let pairs = violation_pairs(pipeline.validate_reference(&mut executor, &user));
    assert_eq!(
        pairs,
        vec![("parentId".to_string(), "Parent does not exist.".to_string())]
    );

    executor.insert_row(PARENT_QUERY, vec![json!(999)]);
    assert!(pipeline.validate_reference(&mut executor, &user).is_ok());
}

/// Required-field violations and existence violations are concatenated.
#[test]
fn test_insert_reports_union_of_steps() {
    let pipeline = user_pipeline();
    let mut executor = MemoryExecutor::new();
    executor.insert_row(EMAIL_QUERY, vec![json!("a@b.com")]);

    let mut user = User::new("a@b.com", "");
    let pairs = violation_pairs(pipeline.validate_for_insert(&mut executor, &mut user));
    assert_eq!(
        pairs,
        vec![
            ("name".to_string(), "Name required.".to_string()),
            ("email".to_string(), "Email exists.".to_string()),
        ]
    );
}

/// An empty key field is reported once and never bound into the probe.
#[test]
fn test_insert_does_not_probe_with_empty_key() {
    let pipeline = user_pipeline();
    let mut executor = MemoryExecutor::new();

    let mut user = User::new("  ", "Ann");
    let pairs = violation_pairs(pipeline.validate_for_insert(&mut executor, &mut user));
    assert_eq!(pairs, vec![("email".to_string(), "Email required.".to_string())]);
    assert!(executor.executed().is_empty());
}

// =============================================================================
// Optional Key Tests
// =============================================================================

const NAME_QUERY: &str = "SELECT 1 FROM users WHERE name = ?";

/// A unique key on an optional column with an empty value is never probed.
#[test]
fn test_empty_optional_unique_key_is_not_bound() {
    let mapping = EntityMapping::from_json(&format!(
        r#"{{
            "entity": "user",
            "fields": [{{"column": "email"}}, {{"column": "name", "required": false}}],
            "unique_keys": [{{"subject": "Name", "query": "{}", "columns": ["name"]}}]
        }}"#,
        NAME_QUERY
    ))
    .unwrap();
    let pipeline = mapping.bind(&user_registry()).unwrap();

    let mut executor = MemoryExecutor::new();
    executor.insert_row(NAME_QUERY, vec![json!("")]);

    let mut user = User::new("a@b.com", "");
    assert!(pipeline.validate_for_insert(&mut executor, &mut user).is_ok());
    assert!(executor.executed().is_empty());
    assert_eq!(pipeline.metrics().existence_skips(), 1);

    let mut user = User::new("a@b.com", "  ");
    assert!(pipeline.validate_for_insert(&mut executor, &mut user).is_ok());
    assert!(executor.executed().is_empty());
}

/// A user without a parent references nothing and passes.
#[test]
fn test_null_parent_reference_passes() {
    let pipeline = user_pipeline();
    let mut executor = MemoryExecutor::new();
    let user = User::new("a@b.com", "Ann");
    assert!(user.parent_id.is_none());

    assert!(pipeline.validate_reference(&mut executor, &user).is_ok());
    assert!(executor.executed().is_empty());
    assert_eq!(pipeline.metrics().existence_skips(), 1);
    assert_eq!(pipeline.metrics().passes(), 1);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

/// One pipeline shared by several threads, each with its own executor.
#[test]
fn test_pipeline_is_shareable_across_threads() {
    let pipeline = user_pipeline();

    std::thread::scope(|s| {
        for t in 0..4 {
            let pipeline = &pipeline;
            s.spawn(move || {
                let mut executor = MemoryExecutor::new();
                for i in 0..25 {
                    let mut user = User::new(&format!("u{}-{}@b.com", t, i), "Ann");
                    assert!(pipeline.validate_for_insert(&mut executor, &mut user).is_ok());
                }
            });
        }
    });

    assert_eq!(pipeline.metrics().passes(), 100);
    assert_eq!(pipeline.metrics().existence_checks(), 100);
}
