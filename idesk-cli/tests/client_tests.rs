//! Client tests against a live idesk-api router
//!
//! Each test binds the real router to an ephemeral port over the in-memory
//! store, so requests go through reqwest and hyper end to end.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use idesk_api::{build_router, AppState};
use idesk_cli::client::{ApiClient, ClientError, ReportQuery};
use idesk_cli::MismatchBoard;
use idesk_common::api::StatusPatch;
use idesk_common::bson::{doc, Document};
use idesk_common::report::Branch;
use idesk_common::store::{FieldUpdate, MemoryTaskStore, TaskFilter, TaskStore, TaskStream};
use idesk_common::{Error, Result, TaskRecord};

async fn serve_store(store: Arc<dyn TaskStore>) -> ApiClient {
    let app = build_router(AppState::new(store, chrono_tz::America::New_York));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ApiClient::new(format!("http://{}/", addr)).unwrap()
}

async fn serve(docs: Vec<Document>) -> (ApiClient, Arc<MemoryTaskStore>) {
    let store = Arc::new(MemoryTaskStore::with_documents(docs));
    (serve_store(store.clone()).await, store)
}

fn many_mismatches(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| {
            let round = if i % 2 == 0 { "panel" } else { "Final Round" };
            doc! {
                "_id": format!("t-{i:04}"),
                "subject": format!("Interview Support - Candidate {i} - Zoë Ångström"),
                "Candidate Name": format!("Candidate {i}"),
                "actualRound": round,
            }
        })
        .collect()
}

#[tokio::test]
async fn test_mismatch_feed_decodes_every_record_in_order() {
    let (client, _) = serve(many_mismatches(300)).await;

    let records: Vec<_> = client
        .mismatches()
        .await
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
        .await;

    assert_eq!(records.len(), 150);
    assert_eq!(records[0].id(), Some("t-0000"));
    assert_eq!(records[149].id(), Some("t-0298"));
    assert!(records.iter().all(|r| r.current_round() == Some("Panel")));
    assert!(records[1].subject().unwrap().ends_with("Zoë Ångström"));
}

#[tokio::test]
async fn test_bulk_fix_updates_server_and_board() {
    let (client, store) = serve(many_mismatches(6)).await;

    let mut board = MismatchBoard::new();
    let mut feed = client.mismatches().await.unwrap();
    while let Some(record) = feed.next().await {
        board.push(record.unwrap());
    }
    assert_eq!(board.len(), 3);

    let ids = board.ids();
    let count = board.fix_rounds(&client, &ids, "Loop Round").await.unwrap();
    assert_eq!(count, 3);

    for id in &ids {
        assert_eq!(store.get(id).await.unwrap().actual_round(), Some("Loop Round"));
        assert_eq!(board.get(id).unwrap().current_round(), Some("Loop Round"));
    }

    // Fixed tasks leave the feed on the next fetch
    let remaining = client.mismatches().await.unwrap().count().await;
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_clear_round_removes_override() {
    let (client, store) = serve(many_mismatches(2)).await;

    let mut board = MismatchBoard::new();
    board.clear_round(&client, "t-0000").await.unwrap();

    let task = store.get("t-0000").await.unwrap();
    assert_eq!(task.actual_round(), None);
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let (client, _) = serve(vec![]).await;

    let patch = StatusPatch {
        id: Some("t-1".to_string()),
        ids: None,
        status: None,
    };
    match client.patch_status(&patch).await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Missing status");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_validation_feed_with_date_filter() {
    let (client, _) = serve(vec![
        doc! { "_id": "v-1", "receivedDateTime": "2026-01-26T14:00:00Z", "status": "Pending" },
        doc! { "_id": "v-2", "receivedDateTime": "2026-01-27T09:00:00Z", "status": "Pending" },
    ])
    .await;

    let ids: Vec<String> = client
        .validations(Some("2026-01-26"))
        .await
        .unwrap()
        .map(|v| v.unwrap()["_id"].as_str().unwrap().to_string())
        .collect()
        .await;
    assert_eq!(ids, vec!["v-1"]);
}

#[tokio::test]
async fn test_report_round_trips_through_client() {
    let (client, _) = serve(vec![
        doc! { "sender": "ahm.desk@example.com", "status": "Completed", "actualRound": "Screening" },
        doc! { "sender": "hq@example.com", "status": "Pending" },
    ])
    .await;

    let report = client.report(&ReportQuery::default()).await.unwrap();
    assert_eq!(report.total(), 2);

    let ahm = report.branch(Branch::Ahmedabad).unwrap();
    assert_eq!(ahm.by_status.get("Completed"), Some(&1));
    assert_eq!(ahm.by_round.get("Screening"), Some(&1));
    assert_eq!(report.branch(Branch::Other).unwrap().total, 1);
}

/// Store whose cursor fails after one mismatch
struct CursorDiesAfterOne;

#[async_trait]
impl TaskStore for CursorDiesAfterOne {
    async fn stream(&self, _filter: TaskFilter) -> Result<TaskStream> {
        let items = vec![
            Ok(TaskRecord::new(doc! { "_id": "a", "actualRound": "Panel" })),
            Err(Error::Internal("cursor died".to_string())),
            Ok(TaskRecord::new(doc! { "_id": "b", "actualRound": "Panel" })),
        ];
        Ok(stream::iter(items).boxed())
    }

    async fn update_one(&self, _id: &str, _update: FieldUpdate) -> Result<u64> {
        Ok(0)
    }

    async fn update_many(&self, _ids: &[String], _update: FieldUpdate) -> Result<u64> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_aborted_feed_surfaces_error() {
    let client = serve_store(Arc::new(CursorDiesAfterOne)).await;

    let items: Vec<_> = client.mismatches().await.unwrap().collect().await;

    assert!(
        matches!(items.last(), Some(Err(ClientError::Http(_)))),
        "truncated feed must end in an error"
    );
    for record in items.iter().filter_map(|item| item.as_ref().ok()) {
        assert_eq!(record.id(), Some("a"));
    }
}
