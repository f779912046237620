//! Web surface: an HTML form at `/`, a JSON API at `/api/analyze` and a
//! `/health` probe.
//!
//! The detector is loaded once before the server starts and shared read-only
//! across requests. If loading failed the server still comes up and answers
//! every analysis with "Model not available".

use crate::validate::{validate_url, INVALID_URL_MESSAGE};
use crate::verdict::{self, VerdictBody};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use phishlens::{Analysis, Detector, ModelError};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const MODEL_MISSING_MESSAGE: &str =
    "Model files not found. Please train the model first by running 'phishlens train'";

/// Shared request state.
#[derive(Clone)]
pub struct AppState {
    detector: Option<Arc<Detector>>,
    unavailable: Option<Arc<str>>,
    top: usize,
}

impl AppState {
    pub fn new(detector: Result<Detector, ModelError>, top: usize) -> Self {
        match detector {
            Ok(d) => Self {
                detector: Some(Arc::new(d)),
                unavailable: None,
                top,
            },
            Err(e) => {
                warn!(error = %e, "model not available, serving without it");
                Self {
                    detector: None,
                    unavailable: Some(e.to_string().into()),
                    top,
                }
            }
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.detector.is_some()
    }
}

/// Outcome of one analysis request, before rendering.
enum Outcome {
    Analyzed(Analysis),
    Invalid(String),
    Failed(String),
    NoModel,
}

fn analyze(state: &AppState, url: &str) -> Outcome {
    let Some(detector) = &state.detector else {
        return Outcome::NoModel;
    };
    if let Err(e) = validate_url(url) {
        return Outcome::Invalid(e.to_string());
    }
    match detector.analyze(url) {
        Ok(a) => Outcome::Analyzed(a),
        Err(e) => {
            warn!(url, error = %e, "analysis failed");
            Outcome::Failed(format!("Error analyzing URL: {e}"))
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/analyze", post(api_analyze))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, model_loaded = state.model_loaded(), "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("server stopped");
    Ok(())
}

// ── JSON API ──

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    url: String,
    top: Option<usize>,
}

async fn api_analyze(State(state): State<AppState>, Json(req): Json<AnalyzeRequest>) -> Response {
    let top = req.top.unwrap_or(state.top);
    match analyze(&state, &req.url) {
        Outcome::Analyzed(a) => Json(VerdictBody::new(&a, Some(top))).into_response(),
        Outcome::Invalid(reason) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": INVALID_URL_MESSAGE, "reason": reason })),
        )
            .into_response(),
        Outcome::Failed(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response(),
        Outcome::NoModel => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "Model not available",
                "reason": state.unavailable.as_deref(),
            })),
        )
            .into_response(),
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model_loaded": state.model_loaded(),
    }))
}

// ── HTML form ──

#[derive(Debug, Default, Deserialize)]
struct FormQuery {
    url: Option<String>,
    details: Option<String>,
}

async fn index(State(state): State<AppState>, Query(q): Query<FormQuery>) -> Html<String> {
    let url = q.url.as_deref().filter(|u| !u.trim().is_empty());
    let details = q.details.as_deref() == Some("on");

    let result = if state.detector.is_none() {
        error_box(MODEL_MISSING_MESSAGE)
    } else {
        match url.map(|u| analyze(&state, u)) {
            None => String::new(),
            Some(Outcome::Analyzed(a)) => result_box(&a, details, state.top),
            Some(Outcome::Invalid(_)) => error_box(INVALID_URL_MESSAGE),
            Some(Outcome::Failed(message)) => error_box(&message),
            Some(Outcome::NoModel) => error_box(MODEL_MISSING_MESSAGE),
        }
    };

    Html(render_page(url.unwrap_or(""), details, &result))
}

fn result_box(a: &Analysis, details: bool, top: usize) -> String {
    let (class, icon) = if a.is_phishing() {
        ("suspicious", "&#x26A0;&#xFE0F;")
    } else {
        ("legitimate", "&#x2705;")
    };
    let mut html = format!(
        "<h3>Analysis Result</h3>\n<div class=\"alert {class}\">{icon} {}</div>\n",
        escape_html(&verdict::headline(a))
    );
    if details {
        html.push_str("<h3>URL Features Analysis</h3>\n<ul>\n");
        for c in a.top(top) {
            html.push_str(&format!("<li>{}</li>\n", escape_html(&verdict::detail_line(c))));
        }
        html.push_str("</ul>\n");
    }
    html
}

fn error_box(message: &str) -> String {
    format!("<div class=\"alert error\">{}</div>\n", escape_html(message))
}

fn render_page(url: &str, details: bool, result: &str) -> String {
    let checked = if details { " checked" } else { "" };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>URL Phishing Detector</title>
<style>
body {{ font-family: sans-serif; max-width: 46rem; margin: 2rem auto; padding: 0 1rem; }}
input[type=text] {{ width: 100%; padding: .5rem; }}
.alert {{ margin-top: 1rem; padding: .75rem 1rem; border-radius: .25rem; }}
.legitimate {{ background: #e6f4ea; }}
.suspicious, .error {{ background: #fce8e6; }}
</style>
</head>
<body>
<h1>&#x1F512; URL Phishing Detector</h1>
<p>This application uses machine learning to detect whether a URL is legitimate or potentially phishing.
Enter a URL below to analyze it.</p>
<form method="get" action="/">
<label for="url">Enter URL to analyze:</label>
<input type="text" id="url" name="url" placeholder="https://example.com" value="{url}">
<label><input type="checkbox" name="details" value="on"{checked}> Show URL Analysis Details</label>
<button type="submit">Analyze</button>
</form>
{result}
<details>
<summary>About this detector</summary>
<p>This phishing URL detector uses a Random Forest classifier trained on various URL features including:</p>
<ul>
<li>URL length and structure</li>
<li>Domain name characteristics</li>
<li>Special character frequency</li>
<li>Security indicators (HTTP/HTTPS)</li>
<li>And more...</li>
</ul>
<p>Note: While this tool can help identify suspicious URLs, it should not be the only method used to determine if a URL is safe.
Always exercise caution when clicking on unknown links.</p>
</details>
</body>
</html>
"#,
        url = escape_html(url),
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_include;
    use phishlens::dataset::toy_dataset;
    use phishlens::{extract, ForestParams};
    use std::net::SocketAddr;
    use tokio::sync::oneshot;

    fn toy_detector() -> Detector {
        let examples: Vec<_> = toy_dataset()
            .iter()
            .map(|ex| (extract(&ex.url), ex.label))
            .collect();
        let artifact = phishlens::train(&examples, &ForestParams::default()).unwrap();
        Detector::from_artifact(artifact).unwrap()
    }

    async fn spawn(state: AppState) -> (SocketAddr, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            serve(listener, state, async move {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });
        (addr, tx)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let (addr, _stop) = spawn(AppState::new(Ok(toy_detector()), 5)).await;
        let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_json_include!(actual: body, expected: json!({"status": "ok", "model_loaded": true}));
    }

    #[tokio::test]
    async fn test_api_analyze() {
        let (addr, _stop) = spawn(AppState::new(Ok(toy_detector()), 5)).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("http://{addr}/api/analyze"))
            .json(&json!({"url": "https://www.google.com"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_json_include!(
            actual: body.clone(),
            expected: json!({
                "url": "https://www.google.com",
                "label": "legitimate",
                "phishing": false,
            })
        );
        assert_eq!(body["top_features"].as_array().unwrap().len(), 5);

        let resp = client
            .post(format!("http://{addr}/api/analyze"))
            .json(&json!({"url": "http://login.banking-secure.com", "top": 3}))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_json_include!(actual: body.clone(), expected: json!({"label": "phishing", "phishing": true}));
        assert_eq!(body["top_features"].as_array().unwrap().len(), 3);
        assert!(body["message"].as_str().unwrap().contains("appears to be suspicious"));
    }

    #[tokio::test]
    async fn test_api_rejects_invalid_url() {
        let (addr, _stop) = spawn(AppState::new(Ok(toy_detector()), 5)).await;
        let resp = reqwest::Client::new()
            .post(format!("http://{addr}/api/analyze"))
            .json(&json!({"url": "not a url"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_json_include!(actual: body, expected: json!({"error": INVALID_URL_MESSAGE}));
    }

    #[tokio::test]
    async fn test_padded_url_is_rejected_everywhere() {
        let state = AppState::new(Ok(toy_detector()), 5);
        assert!(matches!(
            analyze(&state, "  https://www.google.com"),
            Outcome::Invalid(_)
        ));

        let (addr, _stop) = spawn(state).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("http://{addr}/api/analyze"))
            .json(&json!({"url": "  https://www.google.com"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_json_include!(
            actual: body,
            expected: json!({"error": INVALID_URL_MESSAGE, "reason": "URL contains whitespace"})
        );

        let page = client
            .get(format!("http://{addr}/"))
            .query(&[("url", "https://www.google.com ")])
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(page.contains(INVALID_URL_MESSAGE));
        assert!(!page.contains("Analysis Result"));
    }

    #[tokio::test]
    async fn test_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(Detector::load(dir.path()), 5);
        assert!(!state.model_loaded());
        let (addr, _stop) = spawn(state).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("http://{addr}/api/analyze"))
            .json(&json!({"url": "https://www.google.com"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 503);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_json_include!(actual: body, expected: json!({"error": "Model not available"}));

        let health: serde_json::Value = client
            .get(format!("http://{addr}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["model_loaded"], false);

        let page = client
            .get(format!("http://{addr}/"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(page.contains("Model files not found"));
    }

    #[tokio::test]
    async fn test_form_renders_result_and_details() {
        let (addr, _stop) = spawn(AppState::new(Ok(toy_detector()), 5)).await;
        let client = reqwest::Client::new();

        let page = client
            .get(format!("http://{addr}/"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(page.contains("Enter URL to analyze"));
        assert!(page.contains("About this detector"));
        assert!(!page.contains("Analysis Result"));

        let page = client
            .get(format!("http://{addr}/"))
            .query(&[("url", "http://login.banking-secure.com"), ("details", "on")])
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(page.contains("This URL appears to be suspicious (Confidence: "));
        assert!(page.contains("URL Features Analysis"));
        assert_eq!(page.matches("(importance: ").count(), 5);
    }

    #[tokio::test]
    async fn test_form_escapes_input() {
        let (addr, _stop) = spawn(AppState::new(Ok(toy_detector()), 5)).await;
        let page = reqwest::Client::new()
            .get(format!("http://{addr}/"))
            .query(&[("url", "<script>alert(1)</script>")])
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(page.contains(INVALID_URL_MESSAGE));
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_graceful_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve(
            listener,
            AppState::new(Ok(toy_detector()), 5),
            async move {
                let _ = rx.await;
            },
        ));
        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
