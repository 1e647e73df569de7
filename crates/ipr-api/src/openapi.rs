//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("role:user_id:secret")
                        .description(Some(
                            "Bearer token `{role}:{user_id}:{secret}`. The secret is set via the AUTH_TOKEN env var.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI document for the registry API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "IPR Registry API",
        version = "0.1.0",
        description = "Registry of energy-infrastructure entries, each stamped with a reference code of the form `IPR/{PARTICULARS}/{CLIENT}/{CAPACITY}MW/{STATE}/{SITE}/{FY}{SERIAL}/{FY_SEQ}`.\n\nAuthentication: `Authorization: Bearer {role}:{user_id}:{secret}`. All `/v1/*` endpoints require authentication. Health probes and `/metrics` are unauthenticated.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // ── Entries ──────────────────────────────────────────────────────
        crate::routes::entries::create_entry,
        crate::routes::entries::list_entries,
        crate::routes::entries::entry_stats,
        crate::routes::entries::get_entry,
        crate::routes::entries::update_entry,
        crate::routes::entries::delete_entry,
        crate::routes::entries::entry_audit,
        // ── Options ──────────────────────────────────────────────────────
        crate::routes::options::options_for_category,
        crate::routes::options::list_all_options,
        crate::routes::options::add_option,
        crate::routes::options::update_option,
        crate::routes::options::deactivate_option,
        crate::routes::options::delete_option,
        // ── Financial year & change stream ───────────────────────────────
        crate::routes::fy::current_fy,
        crate::routes::events::stream_events,
    ),
    components(
        schemas(
            ipr_core::Entry,
            ipr_core::EntryInput,
            ipr_core::EntryPatch,
            ipr_core::DropdownOption,
            ipr_core::OptionPatch,
            ipr_core::Category,
            ipr_core::EntryField,
            ipr_core::Role,
            ipr_core::Actor,
            crate::lifecycle::EntryPage,
            crate::lifecycle::PaginationMeta,
            crate::lifecycle::EntryStats,
            crate::audit::AuditRecord,
            crate::audit::AuditAction,
            crate::events::ChangeEvent,
            crate::events::Topic,
            crate::routes::options::AddOptionRequest,
            crate::routes::fy::CurrentFyResponse,
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "entries", description = "Entry creation, listing, statistics, admin edits, soft delete, and audit trail"),
        (name = "options", description = "Controlled vocabularies for PARTICULARS, CLIENT_CODE, SITE_NAME, and STATE_NAME"),
        (name = "financial-year", description = "April to March financial year used in reference codes"),
        (name = "events", description = "Server-sent change stream"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json - Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates_successfully() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "IPR Registry API");
        assert_eq!(spec.info.version, "0.1.0");
    }

    #[test]
    fn test_openapi_spec_has_entry_paths() {
        let spec = ApiDoc::openapi();
        for path in [
            "/v1/entries",
            "/v1/entries/stats",
            "/v1/entries/{id}",
            "/v1/entries/{id}/audit",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_openapi_spec_has_option_paths() {
        let spec = ApiDoc::openapi();
        for path in [
            "/v1/options",
            "/v1/options/{category}",
            "/v1/options/{id}",
            "/v1/options/{id}/deactivate",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_openapi_spec_has_bearer_scheme() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components present");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_openapi_serializes() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("/v1/fy/current"));
        assert!(json.contains("/v1/events"));
    }
}
