//! Blocking client for the Gemini `generateContent` endpoint.

use crate::prompt::build_prompt;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use slides_core::normalize::missing_marker;
use slides_core::{Config, ContentGenerator, Error, Result};
use std::collections::HashSet;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Generation method a model must support to be usable.
const GENERATE_CONTENT: &str = "generateContent";

/// Client for generating slide markdown with Gemini.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GeminiClient {
    /// Create a client from the process configuration.
    ///
    /// Fails with [`Error::MissingApiKey`] before any request is made when no
    /// key is configured. Lists available models if the configuration asks
    /// for it; a listing failure is only logged.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        // No request timeout: a slow generation blocks until it returns.
        let http = Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| Error::RemoteService(format!("failed to build HTTP client: {}", e)))?;

        let client = Self {
            http,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        };

        if config.list_models {
            match client.list_models() {
                Ok(models) => {
                    for model in models.iter().filter(|m| m.supports_generate_content()) {
                        log::info!("Found model: {}", model.name);
                    }
                }
                Err(e) => log::warn!("Could not list Gemini models: {}", e),
            }
        }

        log::info!("Successfully initialized Gemini service ({})", client.model);
        Ok(client)
    }

    /// The model used for generation.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `content` with the slide instruction and return the model's text.
    pub fn process_content(&self, content: &str) -> Result<String> {
        let prompt = build_prompt(content);
        let url = format!(
            "{}/v1beta/models/{}:{}",
            self.api_base, self.model, GENERATE_CONTENT
        );
        log::debug!(
            "Requesting {} with a {}-byte prompt",
            self.model,
            prompt.len()
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let result = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .map_err(|e| Error::RemoteService(e.to_string()))
            .and_then(read_body::<GenerateContentResponse>)
            .and_then(GenerateContentResponse::into_text);

        match result {
            Ok(text) => {
                log::debug!("Received {} bytes of markdown", text.len());
                Ok(text)
            }
            Err(e) => {
                log::error!("{}", e);
                Err(e)
            }
        }
    }

    /// List the models visible to this API key, following pagination.
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/v1beta/models", self.api_base);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let mut request = self.http.get(&url).header(API_KEY_HEADER, &self.api_key);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListModelsResponse = request
                .send()
                .map_err(|e| Error::RemoteService(e.to_string()))
                .and_then(read_body)?;

            models.extend(page.models);
            match page.next_page_token {
                Some(token) if token.is_empty() => break,
                Some(token) if !seen_tokens.insert(token.clone()) => {
                    log::warn!("Model listing repeated page token '{}', stopping", token);
                    break;
                }
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(models)
    }

    /// Loose shape check on a raw model response.
    ///
    /// True only if the response is non-empty and contains every structural
    /// marker somewhere.
    pub fn validate_response(&self, response: &str) -> bool {
        !response.is_empty() && missing_marker(response).is_none()
    }
}

impl ContentGenerator for GeminiClient {
    fn generate(&self, text: &str) -> Result<String> {
        self.process_content(text)
    }
}

/// Decode a JSON body, turning API errors into [`Error::RemoteService`].
fn read_body<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| Error::RemoteService(format!("failed to read response: {}", e)))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(Error::RemoteService(format!(
            "HTTP {}: {}",
            status.as_u16(),
            message
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| Error::RemoteService(format!("invalid response body: {}", e)))
}

/// A model as reported by the models endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-1.5-flash`.
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Whether the model can be used with `generateContent`.
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_CONTENT)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(Error::RemoteService(format!(
                "response contained no content: {}",
                reason
            )));
        };

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        if parts.is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "empty candidate".to_string());
            return Err(Error::RemoteService(format!(
                "response contained no content: {}",
                reason
            )));
        }

        Ok(parts.into_iter().filter_map(|p| p.text).collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::runtime::Runtime;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DECK: &str = "# Hello\n## Slide1\n- point\n---\n## Thank You\n- bye\n";
    const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

    /// The mock server runs on its own runtime; the blocking client is
    /// called from the test thread.
    fn start_server() -> (Runtime, MockServer) {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        (rt, server)
    }

    fn client_for(server: &MockServer) -> GeminiClient {
        let config = Config::default()
            .with_api_key("test-key")
            .with_api_base(server.uri());
        GeminiClient::new(&config).unwrap()
    }

    fn text_response(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
    }

    #[test]
    fn test_missing_api_key_fails_before_request() {
        let result = GeminiClient::new(&Config::default());
        assert!(matches!(result, Err(Error::MissingApiKey)));
    }

    #[test]
    fn test_process_content_returns_markdown() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .and(header("x-goog-api-key", "test-key"))
                .and(body_string_contains("Hello World"))
                .respond_with(text_response(DECK))
                .mount(&server),
        );

        let client = client_for(&server);
        let markdown = client.generate("Hello World").unwrap();
        assert_eq!(markdown, DECK);
        assert!(client.validate_response(&markdown));
    }

    #[test]
    fn test_process_content_joins_parts() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "candidates": [{
                        "content": { "parts": [{ "text": "# Hello\n" }, { "text": "## Slide\n" }] }
                    }]
                })))
                .mount(&server),
        );

        let client = client_for(&server);
        assert_eq!(client.generate("x").unwrap(), "# Hello\n## Slide\n");
    }

    #[test]
    fn test_empty_text_is_returned() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .respond_with(text_response(""))
                .mount(&server),
        );

        let client = client_for(&server);
        let markdown = client.generate("x").unwrap();
        assert_eq!(markdown, "");
        assert!(!client.validate_response(&markdown));
    }

    #[test]
    fn test_api_error_is_remote_service_error() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                    "error": {
                        "code": 429,
                        "message": "Resource has been exhausted (e.g. check quota).",
                        "status": "RESOURCE_EXHAUSTED"
                    }
                })))
                .mount(&server),
        );

        let client = client_for(&server);
        match client.generate("x") {
            Err(Error::RemoteService(message)) => {
                assert!(message.contains("429"));
                assert!(message.contains("Resource has been exhausted"));
            }
            other => panic!("expected remote service error, got {:?}", other),
        }

        // No retry.
        let requests = rt.block_on(server.received_requests()).unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn test_blocked_prompt_is_error() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "promptFeedback": { "blockReason": "SAFETY" }
                })))
                .mount(&server),
        );

        let client = client_for(&server);
        match client.generate("x") {
            Err(Error::RemoteService(message)) => assert!(message.contains("SAFETY")),
            other => panic!("expected remote service error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_server_is_error() {
        let config = Config::default()
            .with_api_key("test-key")
            .with_api_base("http://127.0.0.1:1");
        let client = GeminiClient::new(&config).unwrap();
        assert!(matches!(client.generate("x"), Err(Error::RemoteService(_))));
    }

    #[test]
    fn test_list_models_follows_pages() {
        let (rt, server) = start_server();
        rt.block_on(async {
            Mock::given(method("GET"))
                .and(path("/v1beta/models"))
                .and(query_param("pageToken", "next"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "models": [{
                        "name": "models/embedding-001",
                        "supportedGenerationMethods": ["embedContent"]
                    }]
                })))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/v1beta/models"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "models": [{
                        "name": "models/gemini-1.5-flash",
                        "displayName": "Gemini 1.5 Flash",
                        "supportedGenerationMethods": ["generateContent", "countTokens"]
                    }],
                    "nextPageToken": "next"
                })))
                .mount(&server)
                .await;
        });

        let client = client_for(&server);
        let models = client.list_models().unwrap();
        assert_eq!(models.len(), 2);
        assert!(models[0].supports_generate_content());
        assert!(!models[1].supports_generate_content());
    }

    #[test]
    fn test_list_models_stops_on_repeated_token() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("GET"))
                .and(path("/v1beta/models"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "models": [{ "name": "models/gemini-1.5-flash" }],
                    "nextPageToken": "same"
                })))
                .mount(&server),
        );

        let client = client_for(&server);
        let models = client.list_models().unwrap();
        assert_eq!(models.len(), 2);

        let requests = rt.block_on(server.received_requests()).unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn test_list_models_failure_does_not_fail_init() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("GET"))
                .and(path("/v1beta/models"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server),
        );

        let config = Config::default()
            .with_api_key("test-key")
            .with_api_base(server.uri())
            .with_list_models(true);
        assert!(GeminiClient::new(&config).is_ok());
    }

    #[test]
    fn test_validate_response_is_containment_only() {
        let client = GeminiClient::new(&Config::default().with_api_key("k")).unwrap();
        assert!(client.validate_response("- a --- ## b"));
        assert!(!client.validate_response(""));
        assert!(!client.validate_response("# Title\n## Slide\n- a\n"));
    }
}
