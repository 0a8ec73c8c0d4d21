//! Entity shapes shared by every resource
//!
//! Remote entities are open-ended field bags. Each typed skeleton keeps its
//! known fields statically typed and carries everything else in an `extra`
//! side-map that is written back verbatim.

use crate::idc::auth::Session;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name written into export metadata
pub const EXPORT_TOOL: &str = "tidc";

/// Generic entity: identifier, revision and pass-through fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Type reference carried by realm-config entities (`_type`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<bool>,
}

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,
    #[serde(default)]
    pub result_count: Option<i64>,
    /// Present and non-empty while more pages exist
    #[serde(default)]
    pub paged_results_cookie: Option<String>,
    #[serde(default)]
    pub total_paged_results_policy: Option<String>,
    #[serde(default)]
    pub total_paged_results: Option<i64>,
    #[serde(default)]
    pub remaining_paged_results: Option<i64>,
}

impl<T> PagedResult<T> {
    /// Continuation cookie, if another page exists
    pub fn next_cookie(&self) -> Option<&str> {
        self.paged_results_cookie
            .as_deref()
            .filter(|cookie| !cookie.is_empty())
    }
}

/// `{items: [...]}` list wrapper used by the WS-Federation admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseItems<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Provenance block written at the head of every export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMeta {
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_am_version: Option<String>,
    pub exported_by: String,
    pub export_date: String,
    pub export_tool: String,
    pub export_tool_version: String,
}

impl ExportMeta {
    pub fn new(session: &Session) -> Self {
        Self {
            origin: session.host().to_string(),
            origin_am_version: None,
            exported_by: std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_else(|_| "unknown".to_string()),
            export_date: chrono::Utc::now().to_rfc3339(),
            export_tool: EXPORT_TOOL.to_string(),
            export_tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idc::auth::Credentials;
    use serde_json::json;

    #[test]
    fn test_skeleton_round_trips_unknown_fields() {
        let raw = json!({
            "_id": "thing",
            "_rev": "12",
            "nested": {"a": [1, 2, {"b": null}]},
            "flag": true
        });
        let skeleton: Skeleton = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(skeleton.id.as_deref(), Some("thing"));
        assert_eq!(skeleton.extra.len(), 2);
        assert_eq!(serde_json::to_value(&skeleton).unwrap(), raw);
    }

    #[test]
    fn test_next_cookie_ignores_empty_and_null() {
        let page: PagedResult<Skeleton> =
            serde_json::from_value(json!({"result": [], "pagedResultsCookie": ""})).unwrap();
        assert_eq!(page.next_cookie(), None);

        let page: PagedResult<Skeleton> =
            serde_json::from_value(json!({"result": [], "pagedResultsCookie": null})).unwrap();
        assert_eq!(page.next_cookie(), None);

        let page: PagedResult<Skeleton> =
            serde_json::from_value(json!({"result": [{"_id": "x"}], "pagedResultsCookie": "c1"}))
                .unwrap();
        assert_eq!(page.next_cookie(), Some("c1"));
        assert_eq!(page.result.len(), 1);
    }

    fn decode_page<T: serde::de::DeserializeOwned>(raw: Value) -> PagedResult<T> {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_paged_result_decodes_for_any_item_type() {
        #[derive(Debug, Deserialize)]
        struct NoDefault {
            #[serde(rename = "_id")]
            id: String,
        }

        let page: PagedResult<NoDefault> = decode_page(json!({"result": [{"_id": "a"}]}));
        assert_eq!(page.result[0].id, "a");

        let page: PagedResult<NoDefault> = decode_page(json!({"pagedResultsCookie": "c1"}));
        assert!(page.result.is_empty());
        assert_eq!(page.next_cookie(), Some("c1"));
    }

    #[test]
    fn test_export_meta_origin() {
        let session =
            Session::new("https://tenant.example.com/am", "alpha", Credentials::anonymous()).unwrap();
        let meta = ExportMeta::new(&session);
        assert_eq!(meta.origin, "https://tenant.example.com/am");
        assert_eq!(meta.export_tool, EXPORT_TOOL);
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.export_date).is_ok());
    }
}
