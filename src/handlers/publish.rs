use axum::{extract::State, http::StatusCode, Json};
use tracing::error;

use crate::handlers::{error_response, HandlerError};
use crate::models::{PublishRequest, PublishResponse};
use crate::netlify::NetlifyClient;
use crate::publisher::{self, NameAllocPolicy, PollPolicy};
use crate::AppState;

/// POST /api/deploy-site
///
/// Allocate (or reuse) a hosting site, deploy the HTML as its single file,
/// then wait a bounded time for the deploy to go live. The returned URL is
/// the live one when the deploy settles in time, the provisional site URL
/// otherwise.
pub async fn deploy_site(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> Result<(StatusCode, Json<PublishResponse>), HandlerError> {
    if request.html.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "No content provided"));
    }

    let Some(provider) = NetlifyClient::from_config(&state.config) else {
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error",
        ));
    };

    let alloc_policy = NameAllocPolicy {
        max_attempts: state.config.name_alloc_max_attempts,
    };
    let poll_policy = PollPolicy {
        interval: state.config.deploy_poll_interval,
        max_attempts: state.config.deploy_poll_max_attempts,
    };

    let outcome = publisher::publish(
        &provider,
        &request.html,
        request.site_name.as_deref(),
        request.site_id.as_deref(),
        alloc_policy,
        poll_policy,
    )
    .await
    .map_err(|e| {
        error!("Publish failed: {:#}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
    })?;

    Ok((
        StatusCode::OK,
        Json(PublishResponse {
            success: true,
            site_id: outcome.site_id,
            url: outcome.url,
            deploy_id: outcome.deploy_id,
        }),
    ))
}
