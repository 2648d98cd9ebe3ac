//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};

use crate::{
    AppState, endpoints,
    error::DetailMessage,
    logging::logging_middleware,
    product::get_product_by_code_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, update_transaction_endpoint,
    },
    transaction_detail::{add_detail_endpoint, delete_detail_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION_DETAILS, post(add_detail_endpoint))
        .route(endpoints::TRANSACTION_DETAIL, delete(delete_detail_endpoint))
        .route(endpoints::PRODUCT_BY_CODE, get(get_product_by_code_endpoint))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(DetailMessage::new("Not Found"))).into_response()
}
