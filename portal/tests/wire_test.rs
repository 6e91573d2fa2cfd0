//! Fixture tests for the wire formats the console consumes: list pages,
//! budget payloads and the address-bar query string.

use chrono::{Duration, TimeZone, Utc};
use portal::casing::{camelize_keys, snakify_keys};
use portal::{
    ExpiryThreshold, ExpiryThresholdEvaluator, MemoryStore, PageResult, QueryParamCodec,
    RegisteredLearner, SortFieldMap, TableState, TimeBoundedEntity,
};

// ---------------------------------------------------------------------------
// Registered learners page
// ---------------------------------------------------------------------------

#[test]
fn test_registered_learners_page_normalizes() {
    let json = r#"{
        "count": 3,
        "results": [
            {
                "enterprise_customer_user_id": 1,
                "lms_user_id": 101,
                "user_email": "ada@example.com",
                "lms_user_created": "2023-11-20T14:05:00Z"
            },
            {
                "enterprise_customer_user_id": 2,
                "lms_user_id": null,
                "user_email": "alan@example.com",
                "lms_user_created": null
            },
            {
                "user_email": "grace@example.com"
            }
        ]
    }"#;

    let raw: serde_json::Value = serde_json::from_str(json).unwrap();
    let page: PageResult<RegisteredLearner> = PageResult::from_wire(raw, 2).unwrap();
    assert_eq!(page.item_count, 3);
    assert_eq!(page.page_count, 2);
    assert_eq!(page.results.len(), 3);
    assert_eq!(page.results[0].lms_user_id, Some(101));
    assert_eq!(
        page.results[0].lms_user_created,
        Some(Utc.with_ymd_and_hms(2023, 11, 20, 14, 5, 0).unwrap())
    );
    assert_eq!(page.results[1].lms_user_id, None);
    assert_eq!(page.results[2].enterprise_customer_user_id, None);

    // Normalized results serialize back to the wire shape.
    let internal = serde_json::to_value(&page.results[0]).unwrap();
    let wire = snakify_keys(internal);
    assert_eq!(wire["user_email"], "ada@example.com");
    assert_eq!(camelize_keys(wire)["userEmail"], "ada@example.com");
}

// ---------------------------------------------------------------------------
// Budgets
// ---------------------------------------------------------------------------

#[test]
fn test_budget_payload_evaluates() {
    let json = r#"[
        { "id": "budget-expired", "end": "2024-05-31T00:00:00Z" },
        { "id": "budget-active", "end_timestamp": "2024-06-20T00:00:00+00:00" },
        { "id": "budget-later", "endTimestamp": "2024-12-01T00:00:00Z" }
    ]"#;
    let budgets: Vec<TimeBoundedEntity> = serde_json::from_str(json).unwrap();
    assert_eq!(budgets.len(), 3);

    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let evaluator = ExpiryThresholdEvaluator::new("ent-1", MemoryStore::new());
    let notice = evaluator.evaluate(&budgets, now).unwrap();
    assert_eq!(notice.entity_id, "budget-active");
    assert_eq!(notice.threshold, ExpiryThreshold::Near);
    assert!(notice.has_non_expired);
    assert!(notice.open_modal && notice.open_alert);
}

#[test]
fn test_entity_parse_rejects_bad_timestamp() {
    assert!(TimeBoundedEntity::parse("a", "next tuesday").is_err());
    let entity = TimeBoundedEntity::parse("a", "2024-06-03T00:00:00Z").unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    assert_eq!(entity.end - now, Duration::days(2));
}

// ---------------------------------------------------------------------------
// Query string <-> table state
// ---------------------------------------------------------------------------

#[test]
fn test_table_state_to_url_and_back() {
    let codec = QueryParamCodec::default();
    let state = TableState::new(4, 50)
        .with_sort("lmsUserCreated", true)
        .with_filter("group_uuid", "g-9");
    let options = SortFieldMap::registered_learners().page_options(&state);

    let query = codec.encode(&options, "?tab=learners");
    assert!(query.starts_with("tab=learners&page=5"), "{query}");
    assert!(QueryParamCodec::needs_navigation(&query, "?tab=learners"));

    let decoded = codec.decode(&query);
    assert_eq!(decoded, options);
    assert_eq!(decoded.ordering_param().as_deref(), Some("-lms_user_created"));
}
