use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::handlers::{error_response, internal_error, HandlerError};
use crate::models::{AuthRequest, SiteRecord};
use crate::supabase::{AuthOutcome, SaveOutcome, SupabaseClient};
use crate::AppState;

const KNOWN_ACTIONS: [&str; 4] = ["signup", "login", "save", "load"];

/// POST /api/auth
///
/// One endpoint, four actions, dispatched on the body's `action` tag:
/// - signup / login: forward credentials to the identity provider;
///   provider rejection surfaces as 400 with its message.
/// - save: resolve the bearer token to a user id, then upsert the site
///   record keyed on that id.
/// - load: same token resolution; `{"site": null}` when nothing is saved.
pub async fn handle_auth(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    let Some(client) = SupabaseClient::from_config(&state.config) else {
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error",
        ));
    };

    match body.get("action").and_then(Value::as_str) {
        Some(action) if KNOWN_ACTIONS.contains(&action) => {}
        _ => return Err(error_response(StatusCode::BAD_REQUEST, "Unknown action")),
    }

    let request: AuthRequest = serde_json::from_value(body)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("Invalid request: {}", e)))?;

    match request {
        AuthRequest::Signup { email, password } => {
            credentials_response(client.signup(&email, &password).await)
        }
        AuthRequest::Login { email, password } => {
            credentials_response(client.login(&email, &password).await)
        }
        AuthRequest::Save {
            token,
            form_data,
            generated_html,
            story_copy,
            site_id,
            site_url,
        } => {
            let user_id = resolve_user(&client, &token).await?;
            let record = SiteRecord {
                user_id,
                form_data,
                generated_html,
                story_copy,
                site_id,
                site_url,
                updated_at: Utc::now().to_rfc3339(),
            };
            match client
                .upsert_site(&token, &record)
                .await
                .map_err(internal_error)?
            {
                SaveOutcome::Saved => Ok((StatusCode::OK, Json(json!({ "success": true })))),
                SaveOutcome::StoreError(text) => {
                    Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, text))
                }
            }
        }
        AuthRequest::Load { token } => {
            let user_id = resolve_user(&client, &token).await?;
            let site = client
                .find_site(&user_id, &token)
                .await
                .map_err(internal_error)?;
            Ok((StatusCode::OK, Json(json!({ "site": site }))))
        }
    }
}

fn credentials_response(
    outcome: anyhow::Result<AuthOutcome>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    match outcome.map_err(internal_error)? {
        AuthOutcome::Success { user, session } => Ok((
            StatusCode::OK,
            Json(json!({ "user": user, "session": session })),
        )),
        AuthOutcome::Rejected(message) => Err(error_response(StatusCode::BAD_REQUEST, message)),
    }
}

async fn resolve_user(client: &SupabaseClient, token: &str) -> Result<String, HandlerError> {
    match client.get_user_id(token).await {
        Ok(Some(id)) => Ok(id),
        Ok(None) => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Not authenticated",
        )),
        Err(e) => Err(internal_error(e)),
    }
}
