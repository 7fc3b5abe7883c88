use crate::api::handlers::{crews, health};
use crate::auth::middleware::auth_middleware;
use crate::types::{
    CreateCrewRequest, CreateCrewResponse, CrewListResponse, HealthResponse, Reranker,
    SearchScope,
};
use crate::utils::config::Config;
use crate::AppState;
use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(health::health_check, crews::create_crew, crews::list_crews),
    components(schemas(
        CreateCrewRequest,
        CreateCrewResponse,
        CrewListResponse,
        HealthResponse,
        SearchScope,
        Reranker,
        crate::crews::CrewOutput,
        crate::crews::TaskOutput,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "crews", description = "Crew execution with conversational memory"),
        (name = "health", description = "Service status")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI document carrying the configured title and version.
pub fn api_doc(config: &Config) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = config.server.title.clone();
    doc.info.version = config.server.version.clone();
    doc
}

async fn openapi_json(State(state): State<AppState>) -> Json<utoipa::openapi::OpenApi> {
    Json(api_doc(&state.config))
}

pub fn create_router(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .route("/create_crew/", post(crews::create_crew))
        .route("/create_crew", post(crews::create_crew))
        .route("/crews", get(crews::list_crews))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .nest("/v1", protected_routes);

    if state.config.server.docs_enabled {
        router = router.route("/openapi.json", get(openapi_json));

        #[cfg(feature = "swagger-ui")]
        {
            router = router.merge(
                utoipa_swagger_ui::SwaggerUi::new("/docs")
                    .url("/docs/openapi.json", api_doc(&state.config)),
            );
        }
    }

    router
}
