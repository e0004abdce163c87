//! GitLab client requests against a local server.

use activity_sync::collect::{CommitWindow, GitLabClient, RepositorySpec, commit_events};
use axum::{Json, Router, extract::Query, extract::State, routing::get};
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Queries = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn branches() -> Json<Value> {
    Json(json!([{ "name": "main" }]))
}

async fn commits(
    State(queries): State<Queries>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    queries.lock().unwrap().push(query);
    Json(json!({
        "author_email": "a@x",
        "created_at": "2024-05-10T14:30:00+02:00"
    }))
}

async fn serve() -> (String, Queries) {
    let queries = Queries::default();
    let app = Router::new()
        .route("/api/v4/projects/:id/repository/branches", get(branches))
        .route("/api/v4/projects/:id/repository/commits", get(commits))
        .with_state(queries.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), queries)
}

#[tokio::test]
async fn test_commit_query_spans_the_collection_day() {
    let (host, queries) = serve().await;
    let spec = RepositorySpec::parse(&format!("{};42;Dev", host), ";").unwrap();
    let yesterday = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

    let client = GitLabClient::new(Some("glpat-123")).unwrap();
    let repositories = client
        .collect(&[spec], CommitWindow::ending(yesterday, 1))
        .await
        .unwrap();

    let queries = queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0]["ref_name"], "main");
    assert_eq!(queries[0]["since"], "2024-05-10");
    assert_eq!(queries[0]["until"], "2024-05-11");

    let events = commit_events(&repositories);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].date, yesterday);
    assert_eq!(events[0].activity, "Dev");
}
