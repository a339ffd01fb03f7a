//! Model Router: sends the two-turn recipe prompt to Azure OpenAI (or a mock) and returns
//! the generated text.

use crate::error::ProviderError;
use recipe_core::{ChatTurn, Prompt, ProviderSettings};
use serde::{Deserialize, Serialize};

const MOCK_LABEL: &str = "mock";

/// Completion capability the gateway depends on.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// Model label recorded in trace records.
    fn label(&self) -> &str;

    /// Submits the prompt once and returns the generated text.
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError>;
}

#[derive(Serialize)]
struct CompletionRequest {
    messages: Vec<ChatTurn>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Azure OpenAI chat-completions client for one deployment.
pub struct ModelRouter {
    client: reqwest::Client,
    url: String,
    api_key: String,
    deployment: String,
    temperature: f32,
    max_tokens: u32,
}

impl ModelRouter {
    pub fn new(settings: &ProviderSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    pub fn with_client(client: reqwest::Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            url: completions_url(settings),
            api_key: settings.api_key.clone(),
            deployment: settings.deployment_name.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn completions_url(settings: &ProviderSettings) -> String {
    let base = settings
        .base_url
        .clone()
        .unwrap_or_else(|| format!("https://{}.openai.azure.com", settings.instance_name));
    format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        base.trim_end_matches('/'),
        settings.deployment_name,
        settings.api_version
    )
}

#[async_trait::async_trait]
impl ChatModel for ModelRouter {
    fn label(&self) -> &str {
        &self.deployment
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let body = CompletionRequest {
            messages: prompt.messages(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(
            target: "recipe::llm",
            deployment = %self.deployment,
            prompt_len = prompt.user.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), detail));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::Malformed("response contained no message content".into()))
    }
}

/// Offline model: returns a deterministic recipe-shaped reply built from the prompt.
#[derive(Clone, Debug, Default)]
pub struct MockModel;

impl MockModel {
    pub fn new() -> Self {
        Self
    }

    fn mock_generate(&self, prompt: &Prompt) -> String {
        let preview = prompt
            .user
            .chars()
            .take(80)
            .chain(if prompt.user.chars().count() > 80 { "…" } else { "" }.chars())
            .collect::<String>();
        format!(
            "[Generated – Mock LLM]\n\nYou asked: {}\n\nIngredients:\n- 200 g pasta\n- 2 cloves garlic\n- 3 tbsp olive oil\n\nSteps:\n1. Boil the pasta in salted water.\n2. Warm the garlic in the oil.\n3. Toss together and serve.\n\nTimes: 5 min prep, 12 min cook\nServings: 2\nDifficulty: easy",
            preview
        )
    }
}

#[async_trait::async_trait]
impl ChatModel for MockModel {
    fn label(&self) -> &str {
        MOCK_LABEL
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        Ok(self.mock_generate(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_core::{build_prompt, SYSTEM_INSTRUCTION};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: Option<String>) -> ProviderSettings {
        ProviderSettings {
            api_key: "secret".to_string(),
            instance_name: "my-instance".to_string(),
            deployment_name: "gpt-4o".to_string(),
            api_version: "2024-02-15-preview".to_string(),
            base_url,
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    async fn router_for(status: u16, body: serde_json::Value) -> (MockServer, ModelRouter) {
        router_responding(ResponseTemplate::new(status).set_body_json(body)).await
    }

    async fn router_responding(template: ResponseTemplate) -> (MockServer, ModelRouter) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o/chat/completions"))
            .and(query_param("api-version", "2024-02-15-preview"))
            .and(header("api-key", "secret"))
            .respond_with(template)
            .mount(&server)
            .await;
        let router = ModelRouter::new(&settings(Some(server.uri())));
        (server, router)
    }

    #[test]
    fn default_url_targets_the_azure_instance() {
        let router = ModelRouter::new(&settings(None));
        assert_eq!(
            router.url(),
            "https://my-instance.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-15-preview"
        );
        assert_eq!(router.label(), "gpt-4o");
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let (server, router) = router_for(
            200,
            serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "Spaghetti aglio e olio" } }]
            }),
        )
        .await;

        let reply = router.complete(&build_prompt("Give me a pasta recipe")).await.unwrap();
        assert_eq!(reply, "Spaghetti aglio e olio");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let sent: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(sent["messages"][0]["role"], "system");
        assert_eq!(sent["messages"][0]["content"], SYSTEM_INSTRUCTION);
        assert_eq!(sent["messages"][1]["role"], "user");
        assert_eq!(sent["messages"][1]["content"], "Give me a pasta recipe");
        assert_eq!(sent["max_tokens"], 1000);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let (_server, router) =
            router_for(401, serde_json::json!({ "error": { "code": "401" } })).await;
        let err = router.complete(&build_prompt("hi")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth { status: 401, .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn forbidden_maps_to_auth_error() {
        let (_server, router) =
            router_for(403, serde_json::json!({ "error": { "code": "403" } })).await;
        let err = router.complete(&build_prompt("hi")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth { status: 403, .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn server_error_maps_to_http_error() {
        let (_server, router) =
            router_responding(ResponseTemplate::new(503).set_body_string("upstream busy")).await;
        let err = router.complete(&build_prompt("hi")).await.unwrap_err();
        match err {
            ProviderError::Http { status, detail } => {
                assert_eq!(status, 503);
                assert_eq!(detail, "upstream busy");
            }
            other => panic!("expected Http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn throttling_maps_to_rate_limited() {
        let (_server, router) =
            router_for(429, serde_json::json!({ "error": { "code": "429" } })).await;
        let err = router.complete(&build_prompt("hi")).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let (_server, router) = router_for(200, serde_json::json!({ "choices": [] })).await;
        let err = router.complete(&build_prompt("hi")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn non_json_success_body_is_malformed() {
        let (_server, router) =
            router_responding(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
                .await;
        let err = router.complete(&build_prompt("hi")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn unreachable_provider_is_network_error() {
        let router = ModelRouter::new(&settings(Some("http://127.0.0.1:9".to_string())));
        let err = router.complete(&build_prompt("hi")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn mock_model_echoes_prompt_preview() {
        let model = MockModel::new();
        let reply = model.complete(&build_prompt("Give me a pasta recipe")).await.unwrap();
        assert!(reply.contains("Give me a pasta recipe"));
        assert!(reply.contains("Ingredients"));
        assert_eq!(model.label(), "mock");
    }
}
