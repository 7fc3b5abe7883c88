use crate::{
    AppState,
    types::{AppError, CreateCrewRequest, CreateCrewResponse, CrewListResponse, Result},
};
use axum::{Json, extract::FromRequest, extract::State};
use tracing::{error, info, warn};

/// JSON body whose rejections become 422 responses with a `detail` message.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ValidatedJson<T>(pub T);

/// Run a crew with the caller's memory context
#[utoipa::path(
    post,
    path = "/v1/create_crew/",
    request_body = CreateCrewRequest,
    responses(
        (status = 200, description = "Crew finished", body = CreateCrewResponse),
        (status = 400, description = "Unknown crew"),
        (status = 403, description = "Missing or invalid bearer token"),
        (status = 422, description = "Malformed request body"),
        (status = 500, description = "Server misconfiguration or upstream failure")
    ),
    tag = "crews",
    security(("bearer" = []))
)]
pub async fn create_crew(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCrewRequest>,
) -> Result<Json<CreateCrewResponse>> {
    payload.validate()?;

    info!(
        crew = %payload.crew_name,
        user = %payload.user_id,
        session = %payload.session_id,
        "Received crew request"
    );

    let result = state
        .executor()
        .execute_crew(
            &payload.crew_name,
            &payload.message,
            &payload.user_id,
            &payload.session_id,
            payload.history_limit,
            payload.graph_overrides(),
        )
        .await;

    match result {
        Ok(output) => {
            info!(
                crew = %payload.crew_name,
                user = %payload.user_id,
                session = %payload.session_id,
                "Crew request completed"
            );
            Ok(Json(CreateCrewResponse {
                status: "success".to_string(),
                message: format!(
                    "Crew '{}' executed successfully with Zep memory!",
                    payload.crew_name
                ),
                result: output,
            }))
        }
        Err(AppError::InvalidInput(msg)) => {
            warn!(crew = %payload.crew_name, "Rejected crew request: {}", msg);
            Err(AppError::InvalidInput(msg))
        }
        Err(e) => {
            error!(
                crew = %payload.crew_name,
                user = %payload.user_id,
                session = %payload.session_id,
                kind = e.kind(),
                "Crew request failed: {}",
                e
            );
            Err(AppError::Internal(format!(
                "Internal error while processing crew '{}': {}: {}",
                payload.crew_name,
                e.kind(),
                e
            )))
        }
    }
}

/// Names of the crews that can be run
#[utoipa::path(
    get,
    path = "/v1/crews",
    responses(
        (status = 200, description = "Registered crews", body = CrewListResponse),
        (status = 403, description = "Missing or invalid bearer token")
    ),
    tag = "crews",
    security(("bearer" = []))
)]
pub async fn list_crews(State(state): State<AppState>) -> Json<CrewListResponse> {
    Json(CrewListResponse {
        crews: state.crews.names(),
    })
}
