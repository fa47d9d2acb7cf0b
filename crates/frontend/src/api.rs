use pinmap_shared::error::BackendError;
use pinmap_shared::models::{LoginRequest, NewPin, Pin, RegisterRequest, UserResponse};
use pinmap_shared::pins::PinBackend;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Body of a non-2xx answer from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Build an API URL from the page origin and a path such as `/pins`.
pub fn build_api_url(origin: &str, path: &str) -> String {
    format!("{}{}", origin.trim_end_matches('/'), path)
}

/// Human message for a failed response, preferring the server's own wording.
pub fn status_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => format!("request failed with status {}", status),
        Err(_) => body.trim().to_string(),
    }
}

fn page_origin() -> Option<String> {
    // Same origin in production; the backend serves the built frontend.
    web_sys::window()?.location().origin().ok()
}

/// The REST backend behind the map, reached over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpPinBackend {
    origin: String,
    client: reqwest::Client,
}

impl HttpPinBackend {
    pub fn new(origin: impl Into<String>) -> Self {
        HttpPinBackend {
            origin: origin.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Backend at the page origin. Without one every request fails with
    /// [`BackendError::Transport`].
    pub fn same_origin() -> Self {
        let origin = page_origin().unwrap_or_else(|| {
            tracing::warn!("page origin unavailable, API requests will fail");
            String::new()
        });
        Self::new(origin)
    }

    fn url(&self, path: &str) -> Result<String, BackendError> {
        if self.origin.is_empty() {
            return Err(BackendError::Transport(
                "no page origin to reach the API".to_string(),
            ));
        }
        Ok(build_api_url(&self.origin, path))
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: status_message(status.as_u16(), &body),
            });
        }
        resp.json().await.map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, BackendError> {
        let resp = self
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<UserResponse, BackendError> {
        self.post("/users/login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<UserResponse, BackendError> {
        self.post("/users/register", request).await
    }
}

impl PinBackend for HttpPinBackend {
    async fn list_pins(&self) -> Result<Vec<Pin>, BackendError> {
        let resp = self
            .client
            .get(self.url("/pins")?)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn create_pin(&self, pin: &NewPin) -> Result<Pin, BackendError> {
        self.post("/pins", pin).await
    }
}
