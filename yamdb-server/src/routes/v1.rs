use axum::{
    Router, middleware,
    routing::{get, post},
};

use yamdb_core::api::routes::v1;

use crate::handlers::{auth, reviews, taxonomy, titles, users};
use crate::infra::app_state::AppState;
use crate::infra::middleware::optional_auth_middleware;

/// Create all v1 API routes
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Public signup and token exchange
        .route(v1::auth::SIGNUP, post(auth::signup_handler))
        .route(v1::auth::TOKEN, post(auth::token_handler))
        .merge(create_user_routes())
        .merge(create_catalog_routes())
        .merge(create_review_routes())
        .route_layer(middleware::from_fn_with_state(
            state,
            optional_auth_middleware,
        ))
}

fn create_user_routes() -> Router<AppState> {
    Router::new()
        .route(
            v1::users::COLLECTION,
            get(users::list_users_handler).post(users::create_user_handler),
        )
        .route(
            v1::users::CURRENT,
            get(users::me_handler).patch(users::update_me_handler),
        )
        .route(
            v1::users::ITEM,
            get(users::get_user_handler)
                .patch(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
}

fn create_catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            v1::categories::COLLECTION,
            get(taxonomy::list_categories_handler).post(taxonomy::create_category_handler),
        )
        .route(
            v1::categories::ITEM,
            axum::routing::delete(taxonomy::delete_category_handler),
        )
        .route(
            v1::genres::COLLECTION,
            get(taxonomy::list_genres_handler).post(taxonomy::create_genre_handler),
        )
        .route(
            v1::genres::ITEM,
            axum::routing::delete(taxonomy::delete_genre_handler),
        )
        .route(
            v1::titles::COLLECTION,
            get(titles::list_titles_handler).post(titles::create_title_handler),
        )
        .route(
            v1::titles::ITEM,
            get(titles::get_title_handler)
                .patch(titles::patch_title_handler)
                .put(titles::put_title_handler)
                .delete(titles::delete_title_handler),
        )
}

fn create_review_routes() -> Router<AppState> {
    use v1::titles::reviews as paths;

    Router::new()
        .route(
            paths::COLLECTION,
            get(reviews::list_reviews_handler).post(reviews::create_review_handler),
        )
        .route(
            paths::ITEM,
            get(reviews::get_review_handler)
                .patch(reviews::patch_review_handler)
                .put(reviews::put_review_handler)
                .delete(reviews::delete_review_handler),
        )
        .route(
            paths::comments::COLLECTION,
            get(reviews::list_comments_handler).post(reviews::create_comment_handler),
        )
        .route(
            paths::comments::ITEM,
            get(reviews::get_comment_handler)
                .patch(reviews::patch_comment_handler)
                .put(reviews::put_comment_handler)
                .delete(reviews::delete_comment_handler),
        )
}
