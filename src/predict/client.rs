//! Blocking client for a Hugging Face Gradio Space.
//!
//! Each prediction is a two-step call: `POST …/call/<api>` queues the job and
//! returns an event id, `GET …/call/<api>/<event_id>` streams server-sent
//! events until the job completes or fails.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use super::{BatchPrediction, PredictError, Predictor, PredictorProvider};
use crate::config::Settings;

/// Connected Space. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct GradioClient {
    http: Client,
    base_url: String,
    api_prefix: String,
    api_name: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpaceConfig {
    #[serde(default)]
    api_prefix: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueuedCall {
    event_id: String,
}

impl GradioClient {
    /// Resolve the Space, fetch its config and keep the HTTP client for reuse.
    pub fn connect(settings: &Settings) -> Result<Self, PredictError> {
        let base_url = resolve_space_url(&settings.endpoint);
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs.get()))
            .build()
            .map_err(|e| PredictError::Connect {
                endpoint: base_url.clone(),
                message: format!("failed to create HTTP client: {e}"),
            })?;

        let mut client = GradioClient {
            http,
            base_url,
            api_prefix: String::new(),
            api_name: settings.api_name.trim_start_matches('/').to_string(),
            token: settings.hf_token.clone(),
        };

        let config_url = format!("{}/config", client.base_url);
        let response = client
            .authorized(client.http.get(&config_url))
            .send()
            .map_err(|e| PredictError::Connect {
                endpoint: client.base_url.clone(),
                message: e.to_string(),
            })?;
        let config: SpaceConfig = check_status(response)
            .and_then(|r| r.json().map_err(PredictError::from))
            .map_err(|e| PredictError::Connect {
                endpoint: client.base_url.clone(),
                message: e.to_string(),
            })?;

        client.api_prefix = config
            .api_prefix
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string();
        log::info!(
            "connected to {} (gradio {}, api {}{}/call/{})",
            client.base_url,
            config.version.as_deref().unwrap_or("unknown"),
            client.base_url,
            client.api_prefix,
            client.api_name
        );
        Ok(client)
    }

    fn call_url(&self) -> String {
        format!("{}{}/call/{}", self.base_url, self.api_prefix, self.api_name)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl Predictor for GradioClient {
    fn predict_batch(&self, names: &[String]) -> Result<BatchPrediction, PredictError> {
        let call_url = self.call_url();

        let queued: QueuedCall = check_status(
            self.authorized(self.http.post(&call_url))
                .json(&json!({ "data": [names] }))
                .send()?,
        )?
        .json()?;

        let stream = check_status(
            self.authorized(self.http.get(format!("{call_url}/{}", queued.event_id)))
                .send()?,
        )?
        .text()?;

        let output = parse_event_stream(&stream)?;
        parse_prediction(&output)
    }
}

/// Owned, lazily connected client.
///
/// The first [`PredictorProvider::predictor`] call connects; later calls
/// reuse the same client until the handle is dropped.
#[derive(Debug)]
pub struct InferenceHandle {
    settings: Settings,
    client: OnceLock<Arc<GradioClient>>,
}

impl InferenceHandle {
    pub fn new(settings: Settings) -> Self {
        InferenceHandle {
            settings,
            client: OnceLock::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.get().is_some()
    }

    fn get_or_connect(&self) -> Result<Arc<GradioClient>, PredictError> {
        if let Some(client) = self.client.get() {
            return Ok(Arc::clone(client));
        }
        let client = Arc::new(GradioClient::connect(&self.settings)?);
        // A concurrent connect may have stored its client first; keep that one.
        Ok(Arc::clone(self.client.get_or_init(|| client)))
    }
}

impl PredictorProvider for InferenceHandle {
    fn predictor(&self) -> Result<Arc<dyn Predictor>, PredictError> {
        let client: Arc<dyn Predictor> = self.get_or_connect()?;
        Ok(client)
    }
}

fn check_status(response: Response) -> Result<Response, PredictError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(PredictError::Status {
        status: status.as_u16(),
        body: body.chars().take(500).collect(),
    })
}

/// Turn a Space id (`owner/space_name`) into its direct URL.
///
/// Full `http(s)://` URLs are used as given, minus a trailing slash.
pub fn resolve_space_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.trim_end_matches('/').to_string();
    }
    let subdomain: String = endpoint
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '/' | '_' | '.' => '-',
            other => other,
        })
        .collect();
    format!("https://{subdomain}.hf.space")
}

/// Extract the payload of the `complete` event from a server-sent event stream.
pub fn parse_event_stream(stream: &str) -> Result<JsonValue, PredictError> {
    let mut event = "";
    for line in stream.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
        } else if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            match event {
                "complete" => {
                    return serde_json::from_str(data).map_err(|e| {
                        PredictError::MalformedResponse(format!("complete event is not JSON: {e}"))
                    });
                }
                "error" => {
                    let message = match data {
                        "" | "null" => "unknown error".to_string(),
                        other => other.trim_matches('"').to_string(),
                    };
                    return Err(PredictError::Remote(message));
                }
                _ => {}
            }
        }
    }
    Err(PredictError::MalformedResponse(
        "event stream ended without a result".into(),
    ))
}

/// Read `[labels, confidences, ...]` from the endpoint output.
pub fn parse_prediction(output: &JsonValue) -> Result<BatchPrediction, PredictError> {
    let outputs = output
        .as_array()
        .ok_or_else(|| PredictError::MalformedResponse("output is not an array".into()))?;
    let (labels, confidences) = match outputs.as_slice() {
        [labels, confidences, ..] => (labels, confidences),
        _ => {
            return Err(PredictError::MalformedResponse(format!(
                "expected 2 outputs, got {}",
                outputs.len()
            )));
        }
    };

    let labels = json_list(labels, "labels")?
        .iter()
        .map(|v| match v {
            JsonValue::String(s) => s.clone(),
            JsonValue::Null => String::new(),
            other => other.to_string(),
        })
        .collect();

    let confidences = json_list(confidences, "confidences")?
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let parsed = match v {
                JsonValue::Number(n) => n.as_f64(),
                JsonValue::String(s) => s.trim().parse().ok(),
                _ => None,
            };
            parsed.ok_or_else(|| {
                PredictError::MalformedResponse(format!("confidence #{i} is not a number: {v}"))
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    Ok(BatchPrediction {
        labels,
        confidences,
    })
}

fn json_list<'a>(value: &'a JsonValue, what: &str) -> Result<&'a Vec<JsonValue>, PredictError> {
    value
        .as_array()
        .ok_or_else(|| PredictError::MalformedResponse(format!("{what} output is not a list")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_id_resolves_to_hf_space_url() {
        assert_eq!(
            resolve_space_url("marselferrys/indo_name-gender-prediction"),
            "https://marselferrys-indo-name-gender-prediction.hf.space"
        );
        assert_eq!(
            resolve_space_url("http://127.0.0.1:7860/"),
            "http://127.0.0.1:7860"
        );
    }

    #[test]
    fn complete_event_payload_is_returned() {
        let stream = "event: generating\ndata: null\n\n\
                      event: complete\ndata: [[\"M\",\"F\"],[0.91,\"0.75\"]]\n\n";
        let output = parse_event_stream(stream).unwrap();
        let prediction = parse_prediction(&output).unwrap();

        assert_eq!(prediction.labels, ["M", "F"]);
        assert_eq!(prediction.confidences, [0.91, 0.75]);
    }

    #[test]
    fn error_event_becomes_remote_error() {
        let err = parse_event_stream("event: error\ndata: null\n\n").unwrap_err();
        assert!(matches!(err, PredictError::Remote(ref m) if m == "unknown error"));

        let err = parse_event_stream("event: error\ndata: \"queue full\"\n").unwrap_err();
        assert!(matches!(err, PredictError::Remote(ref m) if m == "queue full"));
    }

    #[test]
    fn stream_without_result_is_malformed() {
        let err = parse_event_stream("event: heartbeat\ndata: null\n").unwrap_err();
        assert!(matches!(err, PredictError::MalformedResponse(_)));
    }

    #[test]
    fn prediction_needs_two_lists_of_the_right_kind() {
        assert!(parse_prediction(&json!([["M"]])).is_err());
        assert!(parse_prediction(&json!(["M", [0.5]])).is_err());
        assert!(parse_prediction(&json!([["M"], ["high"]])).is_err());
    }

    #[test]
    fn unequal_lists_are_passed_through_for_the_caller_to_reject() {
        let prediction = parse_prediction(&json!([["M", "F"], [0.5]])).unwrap();
        assert_eq!(prediction.labels.len(), 2);
        assert_eq!(prediction.confidences.len(), 1);
    }
}
