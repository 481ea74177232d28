//! API Server Module
//!
//! This module implements the HTTP surface over the batch pipeline. It is a
//! thin transport binding: handlers translate JSON bodies into domain
//! requests, hand them to the orchestrator or store, and wrap the answers
//! in a `{"success": ...}` envelope.
//!
//! Endpoints:
//! - `POST /batches`: validate and start a batch, returns the request id
//! - `GET /batches/:id`: fetch the persisted batch document
//! - `GET /batches/:id/progress`: live progress snapshot from the tracker
//! - `POST /batches/:id/cancel`: request cancellation of a running batch
//! - `GET /tokens/search?q=`: substring search over stored batches

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::batch::{BatchOrchestrator, BatchStatus, BatchTracker};
use crate::config::ApiConfig;
use crate::store::ResultStore;
use crate::types::{BatchRequest, BatchResult, TokenMetadata};

/// Shared application state that is accessible across all request handlers
///
/// - `orchestrator`: starts batches and owns the treasury identity
/// - `tracker`: progress and cancellation registry
/// - `store`: persisted batch documents
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BatchOrchestrator>,
    pub tracker: BatchTracker,
    pub store: Arc<dyn ResultStore>,
}

/// The main API server struct
pub struct Server {
    config: ApiConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: ApiConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind the configured address and serve requests until shutdown.
    pub async fn start(self) -> anyhow::Result<()> {
        let app = router(self.state);

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Build the API router over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/batches", post(submit_batch))
        .route("/batches/:id", get(fetch_batch))
        .route("/batches/:id/progress", get(batch_progress))
        .route("/batches/:id/cancel", post(cancel_batch))
        .route("/tokens/search", get(search_tokens))
        .with_state(state)
}

/// Body of `POST /batches`
///
/// Amounts are lamports. The treasury is never part of the request; the
/// server fills it in from the configured signer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBatchRequest {
    wallet_count: u32,
    amount_per_wallet: u64,
    #[serde(default)]
    inter_wallet_delay_ms: u64,
    token_name: String,
    token_symbol: String,
    #[serde(default)]
    token_description: String,
    #[serde(default)]
    image_ref: Option<String>,
    #[serde(default)]
    twitter_link: Option<String>,
    #[serde(default)]
    website_link: Option<String>,
    #[serde(default)]
    telegram_link: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBatchResponse {
    success: bool,
    request_id: Uuid,
}

#[derive(Debug, Serialize)]
struct FetchBatchResponse {
    success: bool,
    batch: BatchResult,
}

#[derive(Debug, Serialize)]
struct ProgressResponse {
    success: bool,
    progress: BatchStatus,
}

#[derive(Debug, Serialize)]
struct CancelResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    success: bool,
    results: Vec<BatchResult>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error,
        }),
    )
        .into_response()
}

/// Handles `POST /batches`
///
/// Validation failures come back as 400 immediately; an accepted batch
/// runs in the background and is observed through the progress endpoint.
async fn submit_batch(
    State(state): State<AppState>,
    Json(body): Json<SubmitBatchRequest>,
) -> Response {
    let request = BatchRequest {
        wallet_count: body.wallet_count,
        amount_per_wallet: body.amount_per_wallet,
        inter_wallet_delay_ms: body.inter_wallet_delay_ms,
        metadata: TokenMetadata {
            name: body.token_name,
            symbol: body.token_symbol,
            description: body.token_description,
            image_ref: body.image_ref,
            twitter: body.twitter_link,
            website: body.website_link,
            telegram: body.telegram_link,
        },
        funding_account: state.orchestrator.funding_account(),
    };

    match state.orchestrator.submit(request).await {
        Ok(request_id) => (
            StatusCode::ACCEPTED,
            Json(SubmitBatchResponse {
                success: true,
                request_id,
            }),
        )
            .into_response(),
        Err(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
    }
}

/// Handles `GET /batches/:id`. The persisted document is present once the
/// batch has finalized.
async fn fetch_batch(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.find_by_id(&id).await {
        Ok(Some(batch)) => (
            StatusCode::OK,
            Json(FetchBatchResponse {
                success: true,
                batch,
            }),
        )
            .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("no batch with id {}", id)),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Handles `GET /batches/:id/progress`
async fn batch_progress(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return error_response(StatusCode::BAD_REQUEST, "invalid batch id".to_string());
    };

    match state.tracker.status(id).await {
        Some(progress) => (
            StatusCode::OK,
            Json(ProgressResponse {
                success: true,
                progress,
            }),
        )
            .into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("no batch with id {}", id)),
    }
}

/// Handles `POST /batches/:id/cancel`
///
/// A cancellation only succeeds while the batch is still running; a batch
/// that already reached a terminal phase reports a conflict.
async fn cancel_batch(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return error_response(StatusCode::BAD_REQUEST, "invalid batch id".to_string());
    };

    if state.tracker.cancel(id).await {
        (StatusCode::OK, Json(CancelResponse { success: true })).into_response()
    } else if state.tracker.status(id).await.is_some() {
        error_response(
            StatusCode::CONFLICT,
            format!("batch {} already completed", id),
        )
    } else {
        error_response(StatusCode::NOT_FOUND, format!("no batch with id {}", id))
    }
}

/// Handles `GET /tokens/search?q=`
async fn search_tokens(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    match state.store.search(&params.q).await {
        Ok(results) => (
            StatusCode::OK,
            Json(SearchResponse {
                success: true,
                results,
            }),
        )
            .into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchTracker;
    use crate::chain::ChainGateway;
    use crate::config::{BatchConfig, LaunchConfig};
    use crate::launch::{LaunchInvoker, LaunchService};
    use crate::testing::{MemoryResultStore, MockChainGateway, MockLaunchService};
    use crate::wallet::KeypairSigner;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use solana_sdk::signature::Keypair;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let gateway = Arc::new(MockChainGateway::new());
        let service = Arc::new(MockLaunchService::new("https://launch.test"));
        let store = Arc::new(MemoryResultStore::new());
        let tracker = BatchTracker::new();
        let signer = Arc::new(KeypairSigner::from_keypair(Keypair::new()));

        let launch_config = LaunchConfig {
            endpoint: "http://127.0.0.1:0/create".to_string(),
            token_url_base: "https://launch.test".to_string(),
            attempts: 2,
            attempt_timeout_ms: 500,
            retry_delay_ms: 1,
        };
        let batch_config = BatchConfig {
            max_wallets: 20,
            inter_wallet_delay_floor_ms: 0,
            settle_delay_ms: 0,
            settle_delay_floor_ms: 0,
            max_duration_ms: 0,
        };

        let orchestrator = Arc::new(BatchOrchestrator::new(
            gateway as Arc<dyn ChainGateway>,
            signer,
            LaunchInvoker::from_config(service as Arc<dyn LaunchService>, &launch_config),
            Arc::clone(&store) as Arc<dyn ResultStore>,
            tracker.clone(),
            batch_config,
            false,
        ));

        AppState {
            orchestrator,
            tracker,
            store,
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn submit_request(wallet_count: u32) -> Request<Body> {
        let body = json!({
            "walletCount": wallet_count,
            "amountPerWallet": 35_000_000u64,
            "interWalletDelayMs": 0,
            "tokenName": "Example Token",
            "tokenSymbol": "XMPL",
            "tokenDescription": "a test token",
        });
        Request::builder()
            .method("POST")
            .uri("/batches")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_submission_returns_bad_request() {
        let app = router(test_state());

        let response = app.oneshot(submit_request(0)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("wallet count"));
    }

    #[tokio::test]
    async fn test_submit_progress_and_fetch_flow() {
        let app = router(test_state());

        // Submit a batch.
        let response = app.clone().oneshot(submit_request(2)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        let id = body["requestId"].as_str().unwrap().to_string();

        // Poll progress until the background task finalizes it.
        let mut phase = String::new();
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let response = app
                .clone()
                .oneshot(get_request(&format!("/batches/{}/progress", id)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            phase = body["progress"]["phase"].as_str().unwrap().to_string();
            if phase == "finalized" {
                assert_eq!(body["progress"]["total"], json!(2));
                assert_eq!(body["progress"]["current"], json!(2));
                break;
            }
        }
        assert_eq!(phase, "finalized");

        // The persisted document is now fetchable.
        let response = app
            .clone()
            .oneshot(get_request(&format!("/batches/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["batch"]["wallets"].as_array().unwrap().len(), 2);
        assert_eq!(body["batch"]["symbol"], json!("XMPL"));

        // And searchable by symbol substring.
        let response = app
            .clone()
            .oneshot(get_request("/tokens/search?q=xmpl"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["results"].as_array().unwrap().len(), 1);

        // Cancelling a completed batch is a conflict, not a success.
        let cancel = Request::builder()
            .method("POST")
            .uri(format!("/batches/{}/cancel", id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(cancel).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_unknown_batch_returns_not_found() {
        let app = router(test_state());
        let missing = Uuid::new_v4();

        let response = app
            .clone()
            .oneshot(get_request(&format!("/batches/{}/progress", missing)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(get_request(&format!("/batches/{}", missing)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let cancel = Request::builder()
            .method("POST")
            .uri(format!("/batches/{}/cancel", missing))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(cancel).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_with_empty_store() {
        let app = router(test_state());

        let response = app.oneshot(get_request("/tokens/search?q=anything")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["results"], json!([]));
    }
}
