//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::auth::{AuthResponse, LoginRequest, SignupRequest, UserResponse};
use crate::web::chatbot::{ChatQueryRequest, ChatQueryResponse};
use crate::web::entries::{
    CreateEntryRequest, EntryResponse, MeetingPayload, PatchEntryRequest, SummaryResponse,
    TaskPayload,
};
use crate::web::stories::{GenerateStoryRequest, StoryResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::me_handler,
        crate::web::auth::logout_handler,
        crate::web::entries::create_entry_handler,
        crate::web::entries::list_entries_handler,
        crate::web::entries::get_entry_handler,
        crate::web::entries::update_entry_handler,
        crate::web::entries::patch_entry_handler,
        crate::web::entries::delete_entry_handler,
        crate::web::entries::regenerate_summary_handler,
        crate::web::stories::generate_story_handler,
        crate::web::stories::list_stories_handler,
        crate::web::stories::get_story_handler,
        crate::web::stories::delete_story_handler,
        crate::web::chatbot::chatbot_query_handler,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            AuthResponse,
            UserResponse,
            MeetingPayload,
            TaskPayload,
            CreateEntryRequest,
            PatchEntryRequest,
            EntryResponse,
            SummaryResponse,
            GenerateStoryRequest,
            StoryResponse,
            ChatQueryRequest,
            ChatQueryResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Life Calendar API", description = "Daily entries, AI summaries, period stories and the chatbot query surface.")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("opaque")
                        .build(),
                ),
            );
        }
    }
}
