//! HTTP front (axum): message form, predict/encode JSON API, health.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::classifier::{SpamDetector, Threshold, Verdict};
use crate::encode::EncodedBatch;
use crate::error::Error;

pub struct App {
    pub detector: SpamDetector,
    /// Used when a request carries no threshold.
    pub threshold: Threshold,
}

/// Shared app state: detector loaded once at startup.
pub type AppState = Arc<App>;

/// Body of POST /predict
#[derive(Deserialize)]
pub struct PredictRequest {
    pub message: String,
    #[serde(default)]
    pub threshold: Option<f32>,
}

/// Body of POST /encode
#[derive(Deserialize)]
pub struct EncodeRequest {
    pub messages: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Error mapped to a JSON response.
pub enum ApiError {
    Classifier(Error),
    /// Body that the `Json` extractor refused.
    Body(JsonRejection),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Classifier(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        Self::Body(r)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Body(r) => (r.status(), r.body_text()),
            ApiError::Classifier(
                e @ (Error::EmptyMessage | Error::EmptyBatch | Error::InvalidConfig(_)),
            ) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Classifier(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/predict", post(predict_handler))
        .route("/encode", post(encode_handler))
        .route("/health", get(health))
        .with_state(state)
}

/// POST /predict {message, threshold?} -> {label, probability, message}
pub async fn predict_handler(
    State(app): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Verdict>, ApiError> {
    let Json(req) = body?;
    let threshold = match req.threshold {
        Some(t) => Threshold::new(t)?,
        None => app.threshold,
    };
    let verdict = app.detector.detect(&req.message, threshold)?;
    tracing::info!(
        label = %verdict.label,
        probability = verdict.probability,
        threshold = threshold.get(),
        "prediction served"
    );
    Ok(Json(verdict))
}

/// POST /encode {messages} -> {max_len, rows}
pub async fn encode_handler(
    State(app): State<AppState>,
    body: Result<Json<EncodeRequest>, JsonRejection>,
) -> Result<Json<EncodedBatch>, ApiError> {
    let Json(req) = body?;
    Ok(Json(app.detector.encode(&req.messages)?))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET / -> static HTML form.
pub async fn index_page() -> Html<&'static str> {
    const HTML: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>SMS Spam Classifier</title>
  <style>
    body { font-family: system-ui, sans-serif; max-width: 640px; margin: 2rem auto; padding: 0 1rem; }
    textarea { width: 100%; height: 9rem; font-size: 1rem; box-sizing: border-box; }
    button { margin-top: 0.5rem; padding: 0.5rem 1rem; font-size: 1rem; cursor: pointer; }
    .spam { color: #b00020; }
    .ham { color: #1b7f3b; }
    .note { color: #666; }
  </style>
</head>
<body>
  <h1>SMS Spam Classifier</h1>
  <p>Enter your SMS message to find out whether it is SPAM or HAM.</p>
  <form id="form">
    <textarea id="message" placeholder="SMS message"></textarea>
    <label>SPAM threshold <input type="range" id="threshold" min="0" max="1" step="0.01" value="0.5">
      <span id="threshold-value">0.50</span></label><br>
    <button type="submit">Predict</button>
  </form>
  <div id="result"></div>
  <script>
    const form = document.getElementById('form');
    const message = document.getElementById('message');
    const threshold = document.getElementById('threshold');
    const thresholdValue = document.getElementById('threshold-value');
    const result = document.getElementById('result');
    threshold.addEventListener('input', () => {
      thresholdValue.textContent = Number(threshold.value).toFixed(2);
    });
    const line = (cls, text) => {
      const p = document.createElement('p');
      p.className = cls;
      p.textContent = text;
      return p;
    };
    form.addEventListener('submit', async (e) => {
      e.preventDefault();
      result.replaceChildren();
      if (!message.value.trim()) {
        result.append(line('note', 'Please enter a message to predict.'));
        return;
      }
      try {
        const r = await fetch('/predict', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ message: message.value, threshold: Number(threshold.value) }),
        });
        const body = await r.json();
        if (!r.ok) {
          result.append(line('note', body.error));
          return;
        }
        result.append(
          line(body.label === 'SPAM' ? 'spam' : 'ham', 'Prediction: ' + body.label),
          line('', 'Probability of being SPAM: ' + (body.probability * 100).toFixed(2) + '%'),
          line('note', 'Evaluated message:'),
          line('', body.message),
        );
      } catch (err) {
        result.append(line('note', 'Error: ' + err));
      }
    });
  </script>
</body>
</html>
"#;
    Html(HTML)
}
