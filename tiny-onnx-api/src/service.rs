//! HTTP routes serving predictions from a loaded model.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tiny_onnx::Evaluator;
use tracing::{error, info, warn};

use crate::middleware::v1::{PredictRequest, PredictResponse};

pub fn router(evaluator: Arc<Evaluator>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .with_state(evaluator)
}

pub async fn health_check() -> (StatusCode, Json<()>) {
    (StatusCode::OK, Json(()))
}

pub async fn predict(
    State(evaluator): State<Arc<Evaluator>>,
    Json(req): Json<PredictRequest>,
) -> Response {
    info!("Received /predict request");

    if req.input.is_empty() {
        warn!("Rejecting empty input array");
        return (StatusCode::BAD_REQUEST, "Input array cannot be empty").into_response();
    }

    match tokio::task::spawn_blocking(move || evaluator.run(&req.input)).await {
        Ok(Ok(prediction)) => {
            info!("Prediction result: {:?}", prediction);
            Json(PredictResponse { prediction }).into_response()
        }
        Ok(Err(e)) => {
            error!("Prediction failed: {e:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Prediction error: {e:#}"),
            )
                .into_response()
        }
        Err(e) => {
            error!("Prediction task failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Prediction error: {e}"),
            )
                .into_response()
        }
    }
}

/// Serves the routes on `addr` until ctrl-c is received.
pub async fn serve(addr: SocketAddr, evaluator: Arc<Evaluator>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(evaluator))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for shutdown signal: {e}");
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use tiny_onnx::{
        builder::{make_graph, make_model, make_node, make_tensor, make_tensor_value_info, Dim},
        pb::tensor_proto::DataType,
        MulModelSpec,
    };

    use super::*;

    fn evaluator() -> Arc<Evaluator> {
        Arc::new(Evaluator::from_proto(&MulModelSpec::default().build().unwrap()).unwrap())
    }

    /// A `Mul` by a length-3 constant, which cannot broadcast against a length-2 input.
    fn three_wide_evaluator() -> Arc<Evaluator> {
        let graph = make_graph(
            vec![make_node("Mul", &["input", "scale"], &["output"])],
            "three-wide",
            vec![make_tensor_value_info("input", DataType::Float, &[Dim::Unknown])],
            vec![make_tensor_value_info("output", DataType::Float, &[Dim::Unknown])],
            vec![make_tensor("scale", DataType::Float, &[3], &[1.0, 2.0, 3.0]).unwrap()],
        );
        Arc::new(Evaluator::from_proto(&make_model(graph, "tests")).unwrap())
    }

    /// Serves `router(evaluator)` on an ephemeral port and returns its base url.
    async fn spawn_server(evaluator: Arc<Evaluator>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(evaluator)).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn call(input: Vec<f32>) -> (StatusCode, Vec<u8>) {
        let resp = predict(State(evaluator()), Json(PredictRequest { input })).await;
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_predict_doubles_input() {
        let (status, body) = call(vec![3.0, 0.0, -1.5]).await;
        assert_eq!(status, StatusCode::OK);
        let resp: PredictResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.prediction, vec![6.0, 0.0, -3.0]);
    }

    #[tokio::test]
    async fn test_predict_rejects_empty_input() {
        let (status, body) = call(vec![]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Input array cannot be empty");
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, Json(())) = health_check().await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_predict_reports_evaluation_failure() {
        let resp = predict(
            State(three_wide_evaluator()),
            Json(PredictRequest {
                input: vec![1.0, 2.0],
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("Prediction error: "), "{text}");
    }

    #[tokio::test]
    async fn test_routes_over_http() {
        let base = spawn_server(evaluator()).await;
        let client = reqwest::Client::new();

        let health = client.get(format!("{base}/health")).send().await.unwrap();
        assert_eq!(health.status(), reqwest::StatusCode::OK);
        assert_eq!(health.text().await.unwrap(), "null");

        let resp = client
            .post(format!("{base}/predict"))
            .json(&PredictRequest {
                input: vec![3.0, 0.0, -1.5],
            })
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let resp: PredictResponse = resp.json().await.unwrap();
        assert_eq!(resp.prediction, vec![6.0, 0.0, -3.0]);

        let resp = client
            .post(format!("{base}/predict"))
            .json(&PredictRequest { input: vec![] })
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(resp.text().await.unwrap(), "Input array cannot be empty");

        let resp = client
            .get(format!("{base}/predict"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

        let resp = client
            .post(format!("{base}/predict"))
            .header("content-type", "application/json")
            .body(r#"{"values":[1.0]}"#)
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn test_evaluation_failure_over_http() {
        let base = spawn_server(three_wide_evaluator()).await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/predict"))
            .json(&PredictRequest {
                input: vec![1.0, 2.0],
            })
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.text().await.unwrap().starts_with("Prediction error: "));
    }

    #[test]
    fn test_response_wire_format() {
        let json = serde_json::to_string(&PredictResponse {
            prediction: vec![2.0],
        })
        .unwrap();
        assert_eq!(json, r#"{"prediction":[2.0]}"#);
        let req: PredictRequest = serde_json::from_str(r#"{"input":[1.5]}"#).unwrap();
        assert_eq!(req.input, vec![1.5]);
    }
}
