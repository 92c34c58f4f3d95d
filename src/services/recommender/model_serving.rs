//! Client for the TensorFlow-Serving style prediction endpoint

use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::{PredictResponse, ServingInputs, ServingRequest, CONTEXT_WIDTH},
    services::recommender::Recommender,
};

#[derive(Clone)]
pub struct ModelServingClient {
    http_client: HttpClient,
    predict_url: String,
}

impl ModelServingClient {
    pub fn new(predict_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            predict_url,
        })
    }
}

#[async_trait::async_trait]
impl Recommender for ModelServingClient {
    async fn predict(
        &self,
        context_ids: [i64; CONTEXT_WIDTH],
        context_ratings: [i64; CONTEXT_WIDTH],
    ) -> AppResult<Vec<i64>> {
        let body = ServingRequest {
            inputs: ServingInputs {
                context_id: context_ids,
                context_rating: context_ratings,
            },
        };

        let response = self
            .http_client
            .post(&self.predict_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url = %self.predict_url, "Prediction request failed");
                AppError::PredictionFailed(format!("request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                "Prediction service returned an error"
            );
            return Err(AppError::PredictionFailed(format!(
                "service returned status {}: {}",
                status, body
            )));
        }

        let predictions: PredictResponse = response.json().await.map_err(|e| {
            AppError::PredictionFailed(format!("unexpected response shape: {}", e))
        })?;

        let candidates = predictions.outputs.recommendation_ids;

        tracing::info!(
            candidates = candidates.len(),
            recommender = self.name(),
            "Prediction received"
        );

        Ok(candidates)
    }

    fn name(&self) -> &'static str {
        "model_serving"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    const CONTEXT: [i64; CONTEXT_WIDTH] = [3, 7, 0, 0, 0, 0, 0, 0, 0, 0];
    const RATINGS: [i64; CONTEXT_WIDTH] = [5, 2, 0, 0, 0, 0, 0, 0, 0, 0];

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/predict", addr)
    }

    fn client(url: String) -> ModelServingClient {
        ModelServingClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_predict_sends_fixed_request_shape() {
        // Echoes back the non-padding context ids offset by 100
        let router = Router::new().route(
            "/predict",
            post(|Json(body): Json<ServingRequest>| async move {
                assert_eq!(body.inputs.context_rating, RATINGS);
                let ids: Vec<i64> = body
                    .inputs
                    .context_id
                    .iter()
                    .filter(|id| **id != 0)
                    .map(|id| id + 100)
                    .collect();
                Json(json!({ "outputs": { "recommendation_ids": ids } }))
            }),
        );

        let candidates = client(serve(router).await)
            .predict(CONTEXT, RATINGS)
            .await
            .unwrap();

        assert_eq!(candidates, vec![103, 107]);
    }

    #[tokio::test]
    async fn test_error_status_is_prediction_failure() {
        let router = Router::new().route(
            "/predict",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
        );

        let result = client(serve(router).await).predict(CONTEXT, RATINGS).await;

        match result {
            Err(AppError::PredictionFailed(msg)) => assert!(msg.contains("model not loaded")),
            other => panic!("expected PredictionFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_field_is_prediction_failure() {
        let router = Router::new().route(
            "/predict",
            post(|| async { Json::<Value>(json!({ "outputs": { "scores": [0.5] } })) }),
        );

        let result = client(serve(router).await).predict(CONTEXT, RATINGS).await;
        assert!(matches!(result, Err(AppError::PredictionFailed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_prediction_failure() {
        let result = client("http://127.0.0.1:1/predict".to_string())
            .predict(CONTEXT, RATINGS)
            .await;
        assert!(matches!(result, Err(AppError::PredictionFailed(_))));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let router = Router::new().route(
            "/predict",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json::<Value>(json!({ "outputs": { "recommendation_ids": [1] } }))
            }),
        );

        let url = serve(router).await;
        let client = ModelServingClient::new(url, Duration::from_millis(100)).unwrap();

        let result = client.predict(CONTEXT, RATINGS).await;
        assert!(matches!(result, Err(AppError::PredictionFailed(_))));
    }
}
