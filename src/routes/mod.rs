pub mod applications;
pub mod creator;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Applications
        .route(
            "/api/v1/applications",
            get(applications::list).post(applications::create),
        )
        .route(
            "/api/v1/applications/status/{status}",
            get(applications::list_by_status),
        )
        .route(
            "/api/v1/applications/{id}",
            get(applications::get)
                .put(applications::update)
                .delete(applications::delete),
        )
        .route(
            "/api/v1/applications/{id}/progress",
            put(applications::save_progress),
        )
        .route(
            "/api/v1/applications/{id}/submit",
            put(applications::submit),
        )
}

pub fn creator_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/v1/creator/concept", post(creator::submit_concept))
        .route("/api/v1/creator/proposal", post(creator::submit_proposal))
        .route(
            "/api/v1/creator/community-proposal",
            post(creator::submit_community_proposal),
        )
        .route(
            "/api/v1/creator/upload/{record_id}/{field_name}",
            post(creator::upload_file),
        )
        .route(
            "/api/v1/creator/reports/concept-papers",
            get(creator::concept_paper_report),
        )
}
