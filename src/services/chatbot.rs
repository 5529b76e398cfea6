//! Site assistant backed by the Gemini generative language API
//!
//! Every request carries a system prompt that keeps answers on the
//! inventory and library features, followed by the recent exchanges of the
//! session and the new message.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::activity::ActivityService;
use crate::{
    config::ChatbotConfig,
    error::{AppError, AppResult},
    models::{
        activity::NewActivity,
        chat::{ChatExchange, ChatReply, ChatRequest, ChatSession},
        UserClaims,
    },
    repository::Repository,
};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

const SYSTEM_PROMPT: &str = r#"
You are the assistant of an internal asset management and digital library website.

Main features of the website:
1. User management: users, roles (Admin, Moderator, User) and account status
2. Asset management: asset records, uploads, distribution status and CSV export
3. Device borrowing: lending devices to employees, returns and stock levels
4. Digital library: storing and sharing documents, images, videos and audio
5. Dashboard: usage statistics, charts and system health
6. Authentication: registration, email verification, login and settings

Rules:
- Only answer questions about this website and its features.
- Do not answer questions on other topics such as politics, religion, entertainment or news.
- When a question is off topic, politely decline and point the user back to the website features.
- Focus on explaining how to use features, troubleshooting and guidance.

Polite refusal:
"Sorry, I can only help with questions about the asset management and digital library website. Is there anything about its features I can help you with?"
"#;

const SYSTEM_ACKNOWLEDGEMENT: &str = "Understood. I will only help users with questions about the asset management and digital library website.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One turn of the conversation sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    fn user(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: text.to_string() }],
        }
    }

    fn model(text: &str) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part { text: text.to_string() }],
        }
    }
}

/// Full conversation for one generation: system turns, history, new message
pub fn build_contents(history: &[ChatExchange], message: &str) -> Vec<Content> {
    let mut contents = Vec::with_capacity(history.len() * 2 + 3);
    contents.push(Content::user(SYSTEM_PROMPT.trim()));
    contents.push(Content::model(SYSTEM_ACKNOWLEDGEMENT));
    for exchange in history {
        contents.push(Content::user(&exchange.message));
        contents.push(Content::model(&exchange.response));
    }
    contents.push(Content::user(message));
    contents
}

/// Text generation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn generate(&self, contents: Vec<Content>) -> AppResult<String>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: &'a [Content],
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// HTTP client of the `generateContent` endpoint
pub struct GeminiClient {
    http: reqwest::Client,
    config: ChatbotConfig,
}

impl GeminiClient {
    pub fn new(config: ChatbotConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    async fn generate(&self, contents: Vec<Content>) -> AppResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::Unavailable("Gemini API key not configured".to_string()))?;

        let body = GenerateRequest {
            contents: &contents,
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
                temperature: self.config.temperature,
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Chat model request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Chat model returned an error: {}", detail);
            return Err(AppError::ExternalService(format!(
                "Chat model returned status {}",
                status
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid chat model response: {}", e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::ExternalService(
                "Chat model returned an empty response".to_string(),
            ));
        }
        Ok(text)
    }
}

#[derive(Clone)]
pub struct ChatbotService {
    repository: Repository,
    model: Arc<dyn ChatModel>,
    activity: ActivityService,
    history_window: i64,
}

impl ChatbotService {
    pub fn new(
        repository: Repository,
        model: Arc<dyn ChatModel>,
        activity: ActivityService,
        history_window: i64,
    ) -> Self {
        Self {
            repository,
            model,
            activity,
            history_window,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_configured()
    }

    /// Answer a message in the context of its session and store the exchange
    pub async fn send_message(&self, actor: &UserClaims, req: &ChatRequest) -> AppResult<ChatReply> {
        let message = req.message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("Message is required".to_string()));
        }
        if !self.model.is_configured() {
            return Err(AppError::Unavailable("Gemini API key not configured".to_string()));
        }

        let session = req.session();
        let history = self
            .repository
            .chat
            .history(actor.user_id, Some(session), self.history_window)
            .await?;

        let response = self.model.generate(build_contents(&history, message)).await?;

        self.repository
            .chat
            .insert(actor.user_id, session, message, &response)
            .await?;
        self.activity
            .record(NewActivity::new(actor.user_id, "Chat message sent", "chat"))
            .await;

        Ok(ChatReply {
            success: true,
            message: message.to_string(),
            response,
            session_id: session.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub async fn history(
        &self,
        actor: &UserClaims,
        session_id: Option<&str>,
        limit: Option<i64>,
    ) -> AppResult<Vec<ChatExchange>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, 500);
        self.repository
            .chat
            .history(actor.user_id, session_id, limit)
            .await
    }

    pub async fn sessions(&self, actor: &UserClaims) -> AppResult<Vec<ChatSession>> {
        self.repository.chat.sessions(actor.user_id).await
    }

    pub async fn clear(&self, actor: &UserClaims, session_id: Option<&str>) -> AppResult<u64> {
        let removed = self.repository.chat.clear(actor.user_id, session_id).await?;
        self.activity
            .record(NewActivity::new(actor.user_id, "Chat history cleared", "chat"))
            .await;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn exchange(message: &str, response: &str) -> ChatExchange {
        ChatExchange {
            id: 1,
            user_id: 1,
            session_id: "default".to_string(),
            message: message.to_string(),
            response: response.to_string(),
            created_at: Utc::now(),
        }
    }

    fn client(base_url: &str, api_key: Option<&str>) -> GeminiClient {
        GeminiClient::new(ChatbotConfig {
            api_key: api_key.map(str::to_string),
            base_url: base_url.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_contents_start_with_system_turns() {
        let history = vec![exchange("How do I upload?", "Use the upload page.")];
        let contents = build_contents(&history, "And delete?");

        assert_eq!(contents.len(), 5);
        assert_eq!(contents[0].role, "user");
        assert!(contents[0].parts[0].text.contains("Only answer questions"));
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[2], Content::user("How do I upload?"));
        assert_eq!(contents[3], Content::model("Use the upload page."));
        assert_eq!(contents[4], Content::user("And delete?"));
    }

    #[tokio::test]
    async fn test_gemini_client_sends_generation_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash-001:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": { "maxOutputTokens": 800 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    { "content": { "role": "model", "parts": [{ "text": "Open the " }, { "text": "Library page." }] } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server.uri(), Some("test-key"))
            .generate(build_contents(&[], "Where are documents?"))
            .await
            .unwrap();
        assert_eq!(reply, "Open the Library page.");
    }

    #[tokio::test]
    async fn test_gemini_client_maps_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = client(&server.uri(), Some("test-key"))
            .generate(build_contents(&[], "hi"))
            .await;
        assert!(matches!(result, Err(AppError::ExternalService(_))));
    }

    #[tokio::test]
    async fn test_gemini_client_rejects_empty_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let result = client(&server.uri(), Some("test-key"))
            .generate(build_contents(&[], "hi"))
            .await;
        assert!(matches!(result, Err(AppError::ExternalService(_))));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unavailable() {
        let gemini = client("http://127.0.0.1:9", None);
        assert!(!gemini.is_configured());
        let result = gemini.generate(build_contents(&[], "hi")).await;
        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_mock_model_receives_full_context() {
        let mut model = MockChatModel::new();
        model
            .expect_generate()
            .withf(|contents| contents.len() == 3 && contents[2].parts[0].text == "ping")
            .times(1)
            .returning(|_| Ok("pong".to_string()));

        let reply = model.generate(build_contents(&[], "ping")).await.unwrap();
        assert_eq!(reply, "pong");
    }
}
