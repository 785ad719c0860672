use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

const DOCS_PATH: &str = "/docs";
const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Swagger UI for the room API, backed by the generated OpenAPI document.
pub fn router() -> Router<SharedState> {
    SwaggerUi::new(DOCS_PATH)
        .url(OPENAPI_PATH, ApiDoc::openapi())
        .into()
}
