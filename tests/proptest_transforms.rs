//! Property-based tests using proptest
//!
//! These tests verify the payload transforms applied before writes, realm
//! path resolution and JSON path extraction using randomized inputs.

use proptest::prelude::*;
use serde_json::{Map, Value};
use tidc::idc::auth::realm_path;
use tidc::resource::json::{
    default_to_empty_string, delete_deep_by_key_suffix, extract_json_value, ENCRYPTED_SUFFIX,
};

/// Object keys, some of them marked as encrypted
fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z][a-zA-Z0-9_]{0,12}",
        "[a-zA-Z][a-zA-Z0-9_]{0,12}".prop_map(|k| format!("{}-encrypted", k)),
        Just("-encrypted".to_string()),
    ]
}

/// Arbitrary JSON documents up to a few levels deep
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-z0-9 ]{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(arb_key(), inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

fn has_key_with_suffix(value: &Value, suffix: &str) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k.ends_with(suffix) || has_key_with_suffix(v, suffix)),
        Value::Array(items) => items.iter().any(|v| has_key_with_suffix(v, suffix)),
        _ => false,
    }
}

proptest! {
    #[test]
    fn stripping_removes_every_encrypted_key(mut doc in arb_json()) {
        delete_deep_by_key_suffix(&mut doc, ENCRYPTED_SUFFIX);
        prop_assert!(!has_key_with_suffix(&doc, ENCRYPTED_SUFFIX));
    }

    #[test]
    fn stripping_is_idempotent(doc in arb_json()) {
        let mut once = doc.clone();
        delete_deep_by_key_suffix(&mut once, ENCRYPTED_SUFFIX);
        let mut twice = once.clone();
        delete_deep_by_key_suffix(&mut twice, ENCRYPTED_SUFFIX);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn stripping_keeps_clean_documents_untouched(doc in arb_json()) {
        prop_assume!(!has_key_with_suffix(&doc, ENCRYPTED_SUFFIX));
        let mut stripped = doc.clone();
        delete_deep_by_key_suffix(&mut stripped, ENCRYPTED_SUFFIX);
        prop_assert_eq!(stripped, doc);
    }

    #[test]
    fn stripping_keeps_other_top_level_keys(doc in arb_json()) {
        let mut stripped = doc.clone();
        delete_deep_by_key_suffix(&mut stripped, ENCRYPTED_SUFFIX);
        if let (Value::Object(before), Value::Object(after)) = (&doc, &stripped) {
            for key in before.keys().filter(|k| !k.ends_with(ENCRYPTED_SUFFIX)) {
                prop_assert!(after.contains_key(key));
            }
        }
    }

    #[test]
    fn redirect_default_only_fills_absent_key(
        present in any::<bool>(),
        existing in "[a-z:/.]{0,24}",
    ) {
        let mut doc = serde_json::json!({"_id": "google"});
        if present {
            doc["redirectAfterFormPostURI"] = Value::String(existing.clone());
        }
        default_to_empty_string(&mut doc, "redirectAfterFormPostURI");
        let expected = if present { existing } else { String::new() };
        prop_assert_eq!(doc["redirectAfterFormPostURI"].as_str(), Some(expected.as_str()));
    }
}

mod realm_path_tests {
    use super::*;

    proptest! {
        #[test]
        fn each_segment_becomes_a_nested_realm(
            segments in prop::collection::vec("[a-z][a-z0-9-]{0,10}", 0..4)
        ) {
            let realm = segments.join("/");
            let path = realm_path(&realm);

            prop_assert!(path.starts_with("/realms/root"));
            prop_assert_eq!(path.matches("/realms/").count(), segments.len() + 1);
            for segment in &segments {
                let needle = format!("/realms/{}", segment);
                prop_assert!(path.contains(&needle));
            }
        }

        #[test]
        fn leading_slash_is_ignored(segment in "[a-z][a-z0-9]{0,10}") {
            prop_assert_eq!(realm_path(&format!("/{}", segment)), realm_path(&segment));
        }

        #[test]
        fn resolved_paths_are_stable(segment in "[a-z][a-z0-9]{0,10}") {
            let once = realm_path(&segment);
            prop_assert_eq!(realm_path(&once), once.clone());
        }
    }

    #[test]
    fn root_realm() {
        assert_eq!(realm_path("/"), "/realms/root");
        assert_eq!(realm_path("alpha"), "/realms/root/realms/alpha");
    }
}

mod extract_tests {
    use super::*;

    proptest! {
        #[test]
        fn string_fields_are_returned_verbatim(id in "[a-z][a-z0-9-]{0,20}") {
            let item = serde_json::json!({"_id": id.clone(), "_type": {"_id": "googleConfig"}});
            prop_assert_eq!(extract_json_value(&item, "_id"), id);
            prop_assert_eq!(extract_json_value(&item, "_type._id"), "googleConfig");
        }

        #[test]
        fn missing_paths_render_as_dash(key in "[a-z]{1,10}") {
            let item = serde_json::json!({"present": 1});
            prop_assume!(key != "present");
            prop_assert_eq!(extract_json_value(&item, &key), "-");
        }
    }
}
