use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/dashboard", get(handlers::index))
        .route("/list", get(handlers::list_page))
        .route("/add", get(handlers::add_page).post(handlers::add_plant_form))
        .route("/plants/:id/toggle", post(handlers::toggle_form))
        .route("/growth", get(handlers::growth_page))
        .route("/tasks", get(handlers::tasks_page).post(handlers::create_task))
        .route("/tasks/:id/complete", post(handlers::complete_task))
        .route("/products", get(handlers::products_page))
        .route("/cart/add/:id", post(handlers::cart_add))
        .route("/cart/:id/quantity", post(handlers::cart_quantity))
        .route("/cart/:id/remove", post(handlers::cart_remove))
        .route("/checkout", post(handlers::checkout_form))
        .route("/my-orders", get(handlers::orders_page))
        .route("/my-orders/:id", get(handlers::order_detail))
        .route("/my-orders/:id/status", post(handlers::order_status))
        .route("/profile", get(handlers::profile_page).post(handlers::update_profile))
        .route("/signup", get(handlers::signup_page).post(handlers::signup))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .route("/api/plants", get(handlers::api_list_plants).post(handlers::api_add_plant))
        .route("/api/plants/:id/toggle", post(handlers::api_toggle))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/session", get(handlers::api_session))
        .route("/api/cart", get(handlers::api_cart))
        .route("/api/orders", get(handlers::api_orders))
        .with_state(state)
}
