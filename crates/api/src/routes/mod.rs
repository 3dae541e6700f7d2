pub mod health;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{conversion, memberships, roster, submissions};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// POST   /me/conversions/submission                      convert own submission (talent)
/// POST   /me/conversions/scan                            scan and convert (talent)
/// GET    /me/conversions                                 conversion history (talent)
///
/// GET    /studios/{studio_id}/roster                     list roster (studio)
/// POST   /studios/{studio_id}/roster                     create entry (studio)
/// POST   /studios/{studio_id}/roster/import              bulk import (studio)
/// PUT    /roster/{entry_id}                              edit entry (studio)
/// POST   /roster/{entry_id}/productions                  associate production (studio)
///
/// POST   /codes/{code}/submissions                       guest submission (public)
/// POST   /submissions/{id}/review                        approve / reject (studio)
///
/// GET    /productions/{production_id}/memberships        list members (studio)
/// POST   /productions/{production_id}/memberships        assign member (studio)
/// DELETE /productions/{production_id}/memberships/{talent_id}  remove member (studio)
/// ```
pub fn api_routes() -> Router<AppState> {
    let me_routes = Router::new()
        .route("/conversions", get(conversion::history))
        .route("/conversions/submission", post(conversion::convert_submission))
        .route("/conversions/scan", post(conversion::scan));

    let studio_routes = Router::new()
        .route("/{studio_id}/roster", get(roster::list).post(roster::create))
        .route("/{studio_id}/roster/import", post(roster::import));

    let roster_routes = Router::new()
        .route("/{entry_id}", put(roster::update))
        .route("/{entry_id}/productions", post(roster::add_production));

    let production_routes = Router::new()
        .route(
            "/{production_id}/memberships",
            get(memberships::list).post(memberships::create),
        )
        .route(
            "/{production_id}/memberships/{talent_id}",
            delete(memberships::delete),
        );

    Router::new()
        .nest("/me", me_routes)
        .nest("/studios", studio_routes)
        .nest("/roster", roster_routes)
        .route("/codes/{code}/submissions", post(submissions::submit))
        .route("/submissions/{id}/review", post(submissions::review))
        .nest("/productions", production_routes)
}
