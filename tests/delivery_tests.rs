//! HTTP delivery retry behavior against a local server.

use activity_sync::{DeliveryRetryPolicy, EventSink, HttpEventSink, IncomingEvent, SyncError};
use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone)]
struct Endpoint {
    hits: Arc<AtomicUsize>,
    /// Requests answered with 500 before the endpoint starts accepting.
    failures: usize,
}

async fn accept(
    State(endpoint): State<Endpoint>,
    Json(events): Json<Vec<IncomingEvent>>,
) -> StatusCode {
    let hit = endpoint.hits.fetch_add(1, Ordering::SeqCst);
    if hit < endpoint.failures || events.is_empty() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn serve(failures: usize) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route("/activities", post(accept)).with_state(Endpoint {
        hits: hits.clone(),
        failures,
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/activities", addr), hits)
}

fn events() -> Vec<IncomingEvent> {
    vec![IncomingEvent::for_email(
        "a@x",
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        "Dev",
    )]
}

fn policy(max_attempts: u32) -> DeliveryRetryPolicy {
    DeliveryRetryPolicy {
        max_attempts,
        delay: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_delivers_first_time() {
    let (url, hits) = serve(0).await;
    HttpEventSink::new(&url, policy(3)).deliver(&events()).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retries_until_accepted() {
    let (url, hits) = serve(2).await;
    HttpEventSink::new(&url, policy(3)).deliver(&events()).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let (url, hits) = serve(usize::MAX).await;
    let err = HttpEventSink::new(&url, policy(3))
        .deliver(&events())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Delivery(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}
