//! Route handlers for the auth gate, the chat relay and the static UI.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Json};
use copydesk_core::{verify_password, AuthRequest, CallerMessage, ImageUpload, Message, RelayError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, ServerError};
use crate::AppState;

const INDEX_HTML: &str = include_str!("../assets/index.html");
const APP_JS: &str = include_str!("../assets/app.js");
const APP_CSS: &str = include_str!("../assets/app.css");

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

/// JSON body of a text-only chat request. Messages are forwarded as sent.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<CallerMessage>,
}

pub(crate) async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub(crate) async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(crate) async fn app_js_handler() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/javascript; charset=utf-8")], APP_JS)
}

pub(crate) async fn app_css_handler() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/css; charset=utf-8")], APP_CSS)
}

/// Handler for the /api/auth POST endpoint.
///
/// Every failure, including an unreadable body, gets the same 401.
pub(crate) async fn auth_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let request: AuthRequest = serde_json::from_slice(&body).unwrap_or_default();

    if verify_password(request.password.as_deref(), state.chat_password.as_deref()) {
        log::info!("Chat unlocked");
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(ServerError::Unauthorized)
    }
}

/// Handler for the /api/chat POST endpoint.
///
/// Multipart bodies take the image path, anything else is read as a JSON
/// message list.
pub(crate) async fn chat_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<Message>> {
    state.relay.ensure_configured()?;

    let reply = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ServerError::unreadable_body(e.status(), e.body_text()))?;
        let (image, history) = read_image_form(multipart).await?;
        let image = image.ok_or(RelayError::NoImage)?;
        state.relay.relay_image(&image, history).await?
    } else {
        let body = Bytes::from_request(request, &state)
            .await
            .map_err(|e| ServerError::unreadable_body(e.status(), e.body_text()))?;
        let chat: ChatRequest = serde_json::from_slice(&body).map_err(RelayError::from)?;
        state.relay.relay_text(chat.messages).await?
    };

    Ok(Json(reply))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Pull the `image` file and the JSON-encoded `messages` history out of a form.
async fn read_image_form(mut multipart: Multipart) -> Result<(Option<ImageUpload>, Vec<Message>)> {
    let mut image = None;
    let mut history = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::unreadable_body(e.status(), e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let mime_type = field.content_type().unwrap_or_default().to_string();
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::unreadable_body(e.status(), e.body_text()))?;
                let mut upload = ImageUpload::new(mime_type, bytes);
                upload.file_name = file_name;
                image = Some(upload);
            }
            Some("messages") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ServerError::unreadable_body(e.status(), e.body_text()))?;
                if !raw.trim().is_empty() {
                    history = serde_json::from_str(&raw).map_err(RelayError::from)?;
                }
            }
            other => log::debug!("Ignoring form field {:?}", other),
        }
    }

    Ok((image, history))
}
