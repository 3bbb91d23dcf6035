//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use vigil_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vigil API",
        version = "0.1.0",
        description = "Dead man's switch video escrow. Owners upload a video and check in periodically; missed deadlines release the video at a public link until it expires."
    ),
    paths(
        handlers::video_upload::upload_video,
        handlers::video_get::get_video,
        handlers::check_in::check_in,
        handlers::check_in::list_check_ins,
        handlers::storage::get_storage_usage,
        handlers::push_token::set_push_token,
        handlers::delivery::deliver_video,
    ),
    components(
        schemas(
            models::VideoResponse,
            models::VideoStatus,
            models::CheckIn,
            models::CheckInAction,
            models::CheckInRequest,
            models::CheckInResponse,
            models::StorageQuotaCheck,
            handlers::push_token::PushTokenRequest,
            vigil_infra::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "videos", description = "Video upload and owner views"),
        (name = "check-ins", description = "Check-ins that keep a video from being distributed"),
        (name = "storage", description = "Storage quota and usage"),
        (name = "users", description = "Per-user settings"),
        (name = "delivery", description = "Public delivery of distributed videos")
    )
)]
pub struct ApiDoc;
