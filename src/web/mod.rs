pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::database::store::RelationshipStore;
use crate::services::RelationshipService;
use routes::{health, relationship};

/// Full HTTP surface over one relationship service.
pub fn build_router<S: RelationshipStore>(service: RelationshipService<S>) -> Router {
    let relationship_routes = Router::new()
        .route("/add-friend", post(relationship::add_friend_handler::<S>))
        .route("/add-subscriber", post(relationship::add_subscriber_handler::<S>))
        .route("/add-block", post(relationship::add_block_handler::<S>))
        .route("/list-friend", get(relationship::list_friend_handler::<S>))
        .route(
            "/list-common-friends",
            get(relationship::list_common_friends_handler::<S>),
        )
        .route(
            "/list-email-can-receive-update",
            get(relationship::recipients_handler::<S>),
        );

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/user/relationship", relationship_routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(service)
}
