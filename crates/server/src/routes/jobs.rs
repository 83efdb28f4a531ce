// crates/server/src/routes/jobs.rs
//! Job observation endpoints.
//!
//! - GET /jobs/:id — Block until the job finishes, respond with its terminal record
//! - GET /jobs/:id/progress — SSE stream of progress values until the job finishes
//!
//! Both handlers lean on axum's cancellation behavior: a client that
//! disconnects drops the handler future, which stops the poller behind it.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use tokio_stream::StreamExt;

use jobwatch_core::{await_completion, JobId, ProgressRecord, ProgressStream};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs/{id}", get(job_result))
        .route("/jobs/{id}/progress", get(job_progress))
}

/// GET /api/jobs/:id — render-blocking completion path.
///
/// A job with no record at all gets a 404 up front (the caller picked a bad
/// or expired id); anything else waits for the terminal record. The wait has
/// no server-side deadline; the client's disconnect is the timeout.
async fn job_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProgressRecord>> {
    let job = JobId::new(id);

    match state.store.read(&job).await {
        Ok(None) => return Err(ApiError::JobNotFound(job)),
        Ok(Some(_)) => {}
        // A wobbly medium is not a verdict on the job; let the wait below
        // retry through it.
        Err(e) if e.is_transient() => {}
        Err(e) => return Err(e.into()),
    }

    let record = await_completion(state.store.clone(), &job, &state.config).await?;
    tracing::info!(job = %job, "job finished, responding with terminal record");
    Ok(Json(record))
}

/// GET /api/jobs/:id/progress — SSE stream of progress values.
///
/// One `progress` event per observed value, the integer as the event data.
/// The stream closes after the terminal value. A job with no record keeps
/// the stream open and silent until the record appears or the client leaves.
/// On a fatal store error the stream closes with no further events.
async fn job_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let job = JobId::new(id);
    tracing::debug!(job = %job, "progress subscription opened");

    let updates = ProgressStream::open(state.store.clone(), job.clone(), &state.config);

    let stream = async_stream::stream! {
        let mut updates = updates;
        let job = job;
        while let Some(item) = updates.next().await {
            match item {
                Ok(value) => {
                    yield Ok(Event::default().event("progress").data(value.to_string()));
                }
                Err(e) => {
                    tracing::error!(job = %job, error = %e, "progress stream failed, closing");
                    break;
                }
            }
        }
        tracing::debug!(job = %job, "progress subscription closed");
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use jobwatch_core::{FileProgressStore, WatchConfig};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(dir: &TempDir) -> Arc<AppState> {
        let config = WatchConfig::new(Duration::from_millis(20))
            .with_stream_interval(Duration::from_millis(20));
        AppState::new(Arc::new(FileProgressStore::new(dir.path())), config)
    }

    fn app(state: Arc<AppState>) -> axum::Router {
        crate::routes::api_routes(state)
    }

    fn write_record(dir: &TempDir, job: &str, body: &str) {
        std::fs::write(dir.path().join(format!("{job}.json")), body).unwrap();
    }

    /// Overwrite a record the way a well-behaved producer does: write a
    /// sibling file, then rename over the old one, so no poll can observe a
    /// half-written document.
    fn replace_record(path: &std::path::Path, body: &str) {
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body).unwrap();
        std::fs::rename(&tmp, path).unwrap();
    }

    #[tokio::test]
    async fn unknown_job_is_404() {
        let dir = TempDir::new().unwrap();
        let response = app(test_state(&dir))
            .oneshot(
                Request::builder()
                    .uri("/api/jobs/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn finished_job_responds_immediately_with_its_record() {
        let dir = TempDir::new().unwrap();
        write_record(&dir, "abc123", r#"{"progress":100,"result":{"img":"x.png"}}"#);

        let response = app(test_state(&dir))
            .oneshot(
                Request::builder()
                    .uri("/api/jobs/abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let record: ProgressRecord = serde_json::from_slice(&body).unwrap();
        assert!(record.is_terminal());
        assert_eq!(record.result.unwrap().img, "x.png");
    }

    #[tokio::test]
    async fn running_job_blocks_until_the_producer_finishes_it() {
        let dir = TempDir::new().unwrap();
        write_record(&dir, "abc123", r#"{"progress":40}"#);
        let state = test_state(&dir);

        let path = dir.path().join("abc123.json");
        let producer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            replace_record(&path, r#"{"progress":100,"result":{"img":"x.png"}}"#);
        });

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/api/jobs/abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        producer.await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let record: ProgressRecord = serde_json::from_slice(&body).unwrap();
        assert_eq!(record.progress, 100);
    }

    #[tokio::test]
    async fn malformed_record_is_a_500() {
        let dir = TempDir::new().unwrap();
        write_record(&dir, "abc123", "{not json");

        let response = app(test_state(&dir))
            .oneshot(
                Request::builder()
                    .uri("/api/jobs/abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn progress_stream_emits_events_then_closes() {
        let dir = TempDir::new().unwrap();
        write_record(&dir, "abc123", r#"{"progress":100,"result":{"img":"x.png"}}"#);

        let response = app(test_state(&dir))
            .oneshot(
                Request::builder()
                    .uri("/api/jobs/abc123/progress")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("text/event-stream")
        );

        // The record is already terminal, so the stream emits 100 and ends;
        // reading the body to completion proves the close.
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("event: progress"), "body was: {text}");
        assert!(text.contains("data: 100"), "body was: {text}");
    }

    #[tokio::test]
    async fn progress_stream_orders_intermediate_values() {
        let dir = TempDir::new().unwrap();
        write_record(&dir, "abc123", r#"{"progress":10}"#);
        let state = test_state(&dir);

        let path = dir.path().join("abc123.json");
        let producer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            replace_record(&path, r#"{"progress":55}"#);
            tokio::time::sleep(Duration::from_millis(50)).await;
            replace_record(&path, r#"{"progress":100,"result":{"img":"x.png"}}"#);
        });

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/api/jobs/abc123/progress")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        producer.await.unwrap();

        let text = String::from_utf8(body.to_vec()).unwrap();
        let values: Vec<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("data: "))
            .collect();
        assert_eq!(values.last(), Some(&"100"), "body was: {text}");
        // Emissions arrive in observation order; duplicates are fine.
        let parsed: Vec<u8> = values.iter().map(|v| v.parse().unwrap()).collect();
        assert!(parsed.windows(2).all(|w| w[0] <= w[1]), "body was: {text}");
    }
}
