use async_trait::async_trait;
use reqwest::Url;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::api::types::{ChatRequest, ErrorBody, PromptRequest, TextRequest};
use crate::api::{
    ApiError, ChatReply, CopingStrategies, EmotionPrediction, GeneratedImage, WellnessApi,
};
use crate::config::Config;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    chat_path: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let base_url = config.api_url.trim_end_matches('/').to_string();
        // Reject a bad origin up front rather than on the first request
        Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url,
            chat_path: config.chat_path.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("-> POST {}", url);

        let response = self.http.post(url.clone()).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            warn!("POST {} failed with {}: {}", url, status, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!("<- {} {}", status, text);
        Ok(serde_json::from_str(&text)?)
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, ApiError> {
        debug!("-> GET {}", url);

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("GET {} failed with {}: {}", url, status, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        debug!("<- {} ({} bytes)", status, bytes.len());
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl WellnessApi for ApiClient {
    async fn predict_emotion(&self, text: &str) -> Result<EmotionPrediction, ApiError> {
        self.post_json("/predict", &TextRequest { text }).await
    }

    async fn generate_coping_strategies(&self, text: &str) -> Result<CopingStrategies, ApiError> {
        self.post_json("/generate-coping", &TextRequest { text }).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ApiError> {
        self.post_json("/generate-image", &PromptRequest { prompt }).await
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        // The backend hands out absolute links; anything else is relative to it
        let url = match Url::parse(url) {
            Ok(url) => url,
            Err(_) => self.endpoint(url)?,
        };
        self.get_bytes(url).await
    }

    async fn send_chat_message(&self, message: &str) -> Result<ChatReply, ApiError> {
        self.post_json(&self.chat_path, &ChatRequest { message }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(api_url: String) -> ApiClient {
        ApiClient::new(&Config {
            api_url,
            ..Config::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn posts_documented_bodies_to_documented_paths() {
        let router = Router::new()
            .route(
                "/predict",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({ "text": body["text"], "emotion": "joy", "confidence": 0.8 }))
                }),
            )
            .route(
                "/generate-coping",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({ "strategies": [format!("about {}", body["text"].as_str().unwrap_or(""))] }))
                }),
            )
            .route(
                "/generate-image",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({ "image_url": format!("https://img.test/{}", body["prompt"].as_str().unwrap_or("")) }))
                }),
            )
            .route(
                "/chat",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({ "reply": format!("echo: {}", body["message"].as_str().unwrap_or("")) }))
                }),
            );
        let client = client_for(spawn_backend(router).await);

        let prediction = client.predict_emotion("so happy").await.unwrap();
        assert_eq!(prediction.emotion, "joy");
        assert_eq!(prediction.confidence, Some(0.8));

        let coping = client.generate_coping_strategies("work").await.unwrap();
        assert_eq!(coping.strategies, vec!["about work"]);

        let image = client.generate_image("lake").await.unwrap();
        assert_eq!(image.image_url, "https://img.test/lake");

        let reply = client.send_chat_message("hi").await.unwrap();
        assert_eq!(reply.reply.as_deref(), Some("echo: hi"));
    }

    #[tokio::test]
    async fn non_success_status_carries_backend_error_message() {
        let router = Router::new().route(
            "/predict",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Text is empty" })),
                )
            }),
        );
        let client = client_for(spawn_backend(router).await);

        match client.predict_emotion("").await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Text is empty");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let router = Router::new().route("/generate-image", post(|| async { "not json" }));
        let client = client_for(spawn_backend(router).await);

        assert!(matches!(
            client.generate_image("sea").await,
            Err(ApiError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{addr}"));
        assert!(matches!(
            client.send_chat_message("hello").await,
            Err(ApiError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn chat_path_is_configurable_and_base_may_have_a_prefix() {
        let router = Router::new().route(
            "/api/v1/talk",
            post(|| async { Json(json!({ "reply": "prefixed" })) }),
        );
        let base = spawn_backend(router).await;
        let client = ApiClient::new(&Config {
            api_url: format!("{base}/api/"),
            chat_path: "v1/talk".into(),
            ..Config::default()
        })
        .unwrap();

        let reply = client.send_chat_message("hi").await.unwrap();
        assert_eq!(reply.text_or("fallback"), "prefixed");
    }

    #[tokio::test]
    async fn fetches_image_bytes_from_absolute_or_relative_links() {
        let router = Router::new()
            .route("/images/calm.png", get(|| async { vec![0x89u8, b'P', b'N', b'G'] }))
            .route("/images/missing.png", get(|| async { StatusCode::NOT_FOUND }));
        let base = spawn_backend(router).await;
        let client = client_for(base.clone());

        let absolute = client
            .fetch_image(&format!("{base}/images/calm.png"))
            .await
            .unwrap();
        assert_eq!(absolute, [0x89, b'P', b'N', b'G']);

        let relative = client.fetch_image("/images/calm.png").await.unwrap();
        assert_eq!(relative, absolute);

        assert!(matches!(
            client.fetch_image("/images/missing.png").await,
            Err(ApiError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let result = ApiClient::new(&Config {
            api_url: "http://".into(),
            ..Config::default()
        });
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }
}
