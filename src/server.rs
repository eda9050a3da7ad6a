//! HTTP endpoints Slack delivers events and button clicks to.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::error::{self, VerificationError};
use crate::identity::IdentityTracker;
use crate::onboarding::ONBOARDING_CALLBACK_ID;
use crate::slack::types::ActionForm;
use crate::slack::verify::{verify_request, verify_token};
use crate::slack::{ActionPayload, EventEnvelope, SlackApi, SlackEvent, SlackWebClient};
use crate::workflow::WorkflowHandler;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<WorkflowHandler>,
    pub verification_token: SecretString,
    /// When set, request signatures are verified as well as tokens.
    pub signing_secret: Option<SecretString>,
}

/// Build the Axum router with the Slack endpoints.
pub fn bot_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/slack/events", post(handle_events))
        .route("/slack/actions", post(handle_actions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load configuration from the environment and serve until the process stops.
pub async fn run() -> error::Result<()> {
    let config = BotConfig::from_env()?;
    serve(config).await
}

/// Wire both Slack accounts into the workflow and serve the bot on
/// `config.port`.
///
/// The operator's identity is looked up in the background once the listener
/// is bound; until then nobody counts as the operator.
pub async fn serve(config: BotConfig) -> error::Result<()> {
    let bot: Arc<dyn SlackApi> = Arc::new(
        SlackWebClient::new(config.bot_token.clone()).with_base_url(&config.api_base_url),
    );
    let operator: Arc<dyn SlackApi> = Arc::new(
        SlackWebClient::new(config.auth_token.clone()).with_base_url(&config.api_base_url),
    );

    let identities = IdentityTracker::new();
    let workflow = Arc::new(WorkflowHandler::new(
        Arc::clone(&identities),
        bot,
        Arc::clone(&operator),
    ));

    let app = bot_routes(AppState {
        workflow,
        verification_token: config.verification_token.clone(),
        signing_secret: config.signing_secret.clone(),
    });

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        port = config.port,
        signed = config.signing_secret.is_some(),
        "Bot listening"
    );

    tokio::spawn(async move {
        if let Ok(user_id) = identities
            .discover_authorized_identity(operator.as_ref())
            .await
        {
            info!(user = %user_id, "Operator identified");
        }
    });

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "emojibot"
    }))
}

// ── Events API ──────────────────────────────────────────────────────────

/// POST /slack/events
///
/// Answers the `url_verification` handshake and acknowledges event
/// callbacks immediately, running the reaction in the background.
async fn handle_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = check_signature(&state, &headers, &body) {
        return reject(e);
    }

    let envelope: EventEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Malformed event body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if let Err(e) = verify_token(&state.verification_token, &envelope.token) {
        return reject(e);
    }

    match envelope.kind.as_str() {
        "url_verification" => {
            let challenge = envelope.challenge.unwrap_or_default();
            Json(serde_json::json!({ "challenge": challenge })).into_response()
        }
        "event_callback" => {
            let Some(raw) = envelope.event else {
                warn!("event_callback without an event");
                return StatusCode::BAD_REQUEST.into_response();
            };
            match serde_json::from_value::<SlackEvent>(raw) {
                Ok(event) => {
                    // Slack gets its 200 now; the task logs its own failures.
                    let _task = state.workflow.spawn_event(event);
                }
                Err(e) => warn!(error = %e, "Unreadable event; acknowledging anyway"),
            }
            StatusCode::OK.into_response()
        }
        other => {
            debug!(kind = %other, "Ignoring envelope type");
            StatusCode::OK.into_response()
        }
    }
}

// ── Interactive messages ────────────────────────────────────────────────

/// POST /slack/actions
///
/// The response body replaces the message whose button was clicked.
async fn handle_actions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = check_signature(&state, &headers, &body) {
        return reject(e);
    }

    let form: ActionForm = match serde_urlencoded::from_bytes(&body) {
        Ok(form) => form,
        Err(e) => {
            warn!(error = %e, "Malformed action form");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let payload: ActionPayload = match serde_json::from_str(&form.payload) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Malformed action payload");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if let Err(e) = verify_token(&state.verification_token, &payload.token) {
        return reject(e);
    }

    if payload.callback_id != ONBOARDING_CALLBACK_ID {
        debug!(callback_id = %payload.callback_id, "No handler for callback");
        return StatusCode::NOT_FOUND.into_response();
    }

    // The moderation task, if any, keeps running after the handle is dropped.
    let (replacement, _task) = state.workflow.on_emoji_action(&payload).await;
    Json(replacement).into_response()
}

fn check_signature(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), VerificationError> {
    match &state.signing_secret {
        Some(secret) => verify_request(secret, headers, body, chrono::Utc::now().timestamp()),
        None => Ok(()),
    }
}

fn reject(error: VerificationError) -> Response {
    warn!(error = %error, "Rejected unverified Slack request");
    StatusCode::UNAUTHORIZED.into_response()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::error::{Error, SlackError};
    use crate::identity::IdentityTracker;
    use crate::slack::verify::{SIGNATURE_HEADER, TIMESTAMP_HEADER, sign};
    use crate::slack::{Attachment, AuthIdentity, SlackApi};

    /// Slack account that accepts everything and records nothing.
    struct Quiet;

    #[async_trait]
    impl SlackApi for Quiet {
        async fn post_message(
            &self,
            _channel: &str,
            _text: &str,
            _attachments: Option<&[Attachment]>,
        ) -> Result<(), SlackError> {
            Ok(())
        }
        async fn open_direct_message(&self, user_id: &str) -> Result<String, SlackError> {
            Ok(format!("D-{user_id}"))
        }
        async fn remove_user_from_channel(
            &self,
            _channel: &str,
            _user_id: &str,
        ) -> Result<(), SlackError> {
            Ok(())
        }
        async fn leave_channel(&self, _channel: &str) -> Result<(), SlackError> {
            Ok(())
        }
        async fn test_auth(&self) -> Result<AuthIdentity, SlackError> {
            Ok(AuthIdentity {
                user_id: "U9".into(),
                user: None,
                team: None,
            })
        }
    }

    fn app(signing_secret: Option<&str>) -> Router {
        let workflow = Arc::new(WorkflowHandler::new(
            IdentityTracker::new(),
            Arc::new(Quiet),
            Arc::new(Quiet),
        ));
        bot_routes(AppState {
            workflow,
            verification_token: SecretString::from("verify"),
            signing_secret: signing_secret.map(SecretString::from),
        })
    }

    fn action_body(payload: &Value) -> String {
        serde_urlencoded::to_string([("payload", payload.to_string())]).unwrap()
    }

    fn emoji_action(token: &str, value: &str) -> Value {
        json!({
            "token": token,
            "callback_id": "emoji",
            "user": {"id": "U1", "name": "alice"},
            "actions": [{"name": value, "type": "button", "value": value}],
            "original_message": {"text": "", "attachments": [{"text": "Do you like emoji?"}]}
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    fn post(uri: &str, content_type: &str, body: String) -> Request<Body> {
        Request::post(uri)
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_ok() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(None), request).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn url_verification_echoes_challenge() {
        let body = json!({"type": "url_verification", "token": "verify", "challenge": "abc123"});
        let (status, body) = send(
            app(None),
            post("/slack/events", "application/json", body.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({"challenge": "abc123"}));
    }

    #[tokio::test]
    async fn wrong_event_token_rejected() {
        let body = json!({"type": "url_verification", "token": "nope", "challenge": "abc"});
        let (status, _) = send(
            app(None),
            post("/slack/events", "application/json", body.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_event_body_is_bad_request() {
        let (status, _) = send(
            app(None),
            post("/slack/events", "application/json", "{not json".to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unsupported_event_acknowledged() {
        let body = json!({
            "type": "event_callback",
            "token": "verify",
            "event": {"type": "message", "text": "hello"}
        });
        let (status, _) = send(
            app(None),
            post("/slack/events", "application/json", body.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn action_returns_replacement() {
        let body = action_body(&emoji_action("verify", "yes"));
        let (status, body) = send(
            app(None),
            post("/slack/actions", "application/x-www-form-urlencoded", body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({"text": "Good choice, alice :relieved:"}));
    }

    #[tokio::test]
    async fn wrong_action_token_rejected() {
        let body = action_body(&emoji_action("nope", "yes"));
        let (status, _) = send(
            app(None),
            post("/slack/actions", "application/x-www-form-urlencoded", body),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_callback_not_found() {
        let mut payload = emoji_action("verify", "yes");
        payload["callback_id"] = json!("weather");
        let (status, _) = send(
            app(None),
            post(
                "/slack/actions",
                "application/x-www-form-urlencoded",
                action_body(&payload),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn action_without_payload_field_is_bad_request() {
        let (status, _) = send(
            app(None),
            post(
                "/slack/actions",
                "application/x-www-form-urlencoded",
                "text=hello".to_string(),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signed_request_accepted_when_secret_configured() {
        let body = json!({"type": "url_verification", "token": "verify", "challenge": "c"})
            .to_string();
        let now = chrono::Utc::now().timestamp();
        let signature = sign(&SecretString::from("shh"), now, body.as_bytes()).unwrap();

        let request = Request::post("/slack/events")
            .header("content-type", "application/json")
            .header(TIMESTAMP_HEADER, now.to_string())
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body))
            .unwrap();
        let (status, _) = send(app(Some("shh")), request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unsigned_request_rejected_when_secret_configured() {
        let body = json!({"type": "url_verification", "token": "verify", "challenge": "c"});
        let (status, _) = send(
            app(Some("shh")),
            post("/slack/events", "application/json", body.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn serve_reports_port_already_in_use() {
        let taken = TcpListener::bind(("0.0.0.0", 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let config = BotConfig {
            verification_token: SecretString::from("verify"),
            bot_token: SecretString::from("xoxb"),
            auth_token: SecretString::from("xoxp"),
            signing_secret: None,
            api_base_url: "http://127.0.0.1:9".to_string(),
            port,
        };

        let err = serve(config).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::AddrInUse));
    }
}
