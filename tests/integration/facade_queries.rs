use crate::integration::test_utils::{client, Call, MockTransport};
use futures::TryStreamExt;
use notion_typed::query::TimestampKind;
use notion_typed::{FilterNode, QueryOptions, SortDirection, SortSpec, StatusGroupCondition};
use serde_json::json;

fn status_equals(option: &str) -> serde_json::Value {
    json!({ "property": "Status", "status": { "equals": option } })
}

#[tokio::test]
async fn test_query_rewrites_filter_and_sort_names() {
    let transport = MockTransport::with_results(2, 10);
    let client = client(transport.clone());

    let options = QueryOptions::new()
        .filter(FilterNode::and(vec![
            FilterNode::property("estimate", "number", json!({ "greater_than": 2 })),
            FilterNode::property("legacy", "checkbox", json!({ "equals": true })),
            FilterNode::timestamp(TimestampKind::CreatedTime, json!({ "past_week": {} })),
        ]))
        .sort(SortSpec::property("due", SortDirection::Descending))
        .sort(SortSpec::timestamp(
            TimestampKind::LastEditedTime,
            SortDirection::Ascending,
        ))
        .page_size(10);

    let result = client.query_database("tasks", options).await.unwrap();
    assert_eq!(result.items.len(), 2);
    assert!(!result.has_more);

    assert_eq!(
        transport.calls(),
        vec![Call::Query {
            database_id: "db-tasks".to_string(),
            body: json!({
                "filter": { "and": [
                    { "property": "Estimate (h)", "number": { "greater_than": 2 } },
                    { "property": "legacy", "checkbox": { "equals": true } },
                    { "timestamp": "created_time", "created_time": { "past_week": {} } }
                ] },
                "sorts": [
                    { "property": "Due date", "direction": "descending" },
                    { "timestamp": "last_edited_time", "direction": "ascending" }
                ],
                "page_size": 10
            }),
        }]
    );
}

#[tokio::test]
async fn test_status_group_expands_before_transport() {
    let transport = MockTransport::with_results(0, 10);
    let client = client(transport.clone());

    let options = QueryOptions::new().filter(FilterNode::status_group(
        "status",
        StatusGroupCondition::Equals("Complete".to_string()),
    ));
    client.query_database("tasks", options).await.unwrap();

    let bodies = transport.query_bodies();
    assert_eq!(
        bodies[0]["filter"],
        json!({ "or": [status_equals("Done"), status_equals("Shipped")] })
    );
}

#[tokio::test]
async fn test_single_option_group_collapses_to_leaf() {
    let transport = MockTransport::with_results(0, 10);
    let client = client(transport.clone());

    let filter = FilterNode::from_json(&json!({
        "property": "status",
        "status_group": { "equals": "In progress" }
    }))
    .unwrap();
    client
        .query_database("tasks", QueryOptions::new().filter(filter))
        .await
        .unwrap();

    assert_eq!(transport.query_bodies()[0]["filter"], status_equals("In progress"));
}

#[tokio::test]
async fn test_unsatisfiable_filter_skips_transport() {
    let transport = MockTransport::with_results(5, 10);
    let client = client(transport.clone());
    let abandoned = || {
        FilterNode::status_group(
            "status",
            StatusGroupCondition::Equals("Abandoned".to_string()),
        )
    };

    let single = client
        .query_database("tasks", QueryOptions::new().filter(abandoned()))
        .await
        .unwrap();
    assert!(single.items.is_empty());
    assert!(!single.has_more);
    assert!(single.next_cursor.is_none());

    let all = client
        .query_database_all(
            "tasks",
            QueryOptions::new().filter(FilterNode::and(vec![
                FilterNode::property("estimate", "number", json!({ "equals": 1 })),
                abandoned(),
            ])),
        )
        .await
        .unwrap();
    assert!(all.is_empty());

    let streamed: Vec<_> = client
        .query_database_iter("tasks", QueryOptions::new().filter(abandoned()))
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert!(streamed.is_empty());

    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_unsatisfiable_branch_dropped_from_or() {
    let transport = MockTransport::with_results(0, 10);
    let client = client(transport.clone());

    let options = QueryOptions::new().filter(FilterNode::or(vec![
        FilterNode::status_group("status", StatusGroupCondition::Equals("Abandoned".to_string())),
        FilterNode::property("priority", "select", json!({ "equals": "High" })),
    ]));
    client.query_database("tasks", options).await.unwrap();

    assert_eq!(
        transport.query_bodies()[0]["filter"],
        json!({ "property": "Priority", "select": { "equals": "High" } })
    );
}

#[tokio::test]
async fn test_empty_or_skips_transport() {
    let transport = MockTransport::with_results(5, 10);
    let client = client(transport.clone());

    let result = client
        .query_database("tasks", QueryOptions::new().filter(FilterNode::or(Vec::new())))
        .await
        .unwrap();

    assert!(result.items.is_empty());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_all_matches_manual_cursor_walk() {
    let transport = MockTransport::with_results(23, 10);
    let client = client(transport.clone());

    let all = client
        .query_database_all("tasks", QueryOptions::new().page_size(10))
        .await
        .unwrap();
    assert_eq!(transport.query_bodies().len(), 3);

    let mut manual = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let mut options = QueryOptions::new().page_size(10);
        options.cursor = cursor.clone();
        let page = client.query_database("tasks", options).await.unwrap();
        manual.extend(page.items);
        if !page.has_more {
            break;
        }
        cursor = page.next_cursor;
    }

    assert_eq!(all.len(), 23);
    assert_eq!(all, manual);
    assert_eq!(all[0].id, "page-1");
    assert_eq!(all[22].id, "page-23");
}

#[tokio::test]
async fn test_stream_stops_fetching_when_dropped() {
    let transport = MockTransport::with_results(50, 10);
    let client = client(transport.clone());

    let mut stream = client
        .query_database_iter("tasks", QueryOptions::new().page_size(10))
        .unwrap();
    assert!(transport.calls().is_empty());

    let mut taken = Vec::new();
    while taken.len() < 15 {
        match stream.try_next().await.unwrap() {
            Some(record) => taken.push(record.id),
            None => break,
        }
    }
    drop(stream);

    assert_eq!(taken.len(), 15);
    assert_eq!(taken[14], "page-15");
    // ceil(15 / 10) pages
    assert_eq!(transport.query_bodies().len(), 2);
}

#[tokio::test]
async fn test_page_size_defaults_and_caps() {
    let transport = MockTransport::with_results(0, 10);
    let client = client(transport.clone()).with_default_page_size(25);

    client
        .query_database("tasks", QueryOptions::new())
        .await
        .unwrap();
    client
        .query_database("tasks", QueryOptions::new().page_size(500))
        .await
        .unwrap();

    let bodies = transport.query_bodies();
    assert_eq!(bodies[0], json!({ "page_size": 25 }));
    assert_eq!(bodies[1], json!({ "page_size": 100 }));
}

#[tokio::test]
async fn test_query_unknown_database_fails_without_call() {
    let transport = MockTransport::new();
    let client = client(transport.clone());

    assert!(client
        .query_database("projects", QueryOptions::new())
        .await
        .is_err());
    assert!(client
        .query_database_iter("projects", QueryOptions::new())
        .is_err());
    assert!(transport.calls().is_empty());
}
