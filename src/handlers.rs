use crate::commerce::{checkout, filter_products, now, progress_steps};
use crate::errors::AppError;
use crate::models::{
    CartItem, CustomerInfo, GrowthResponse, LoginRequest, NewPlantRequest, NewTask, Order,
    OrderStatus, Plant, PlantStatus, ProductCategory, ProfileUpdate, ToggleRequest,
};
use crate::plants::today;
use crate::session::{AuthState, RegistrationForm};
use crate::state::AppState;
use crate::stats::build_growth;
use crate::storage::persist_data;
use crate::ui;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let plants = state.plants.lock().await.snapshot();
    let auth = state.session.state().await;
    Html(ui::render_dashboard(&build_growth(&plants), &auth))
}

pub async fn list_page(State(state): State<AppState>) -> Html<String> {
    let plants = state.plants.lock().await.snapshot();
    let auth = state.session.state().await;
    Html(ui::render_plant_list(&plants, today(), &auth))
}

pub async fn add_page(State(state): State<AppState>) -> Html<String> {
    let auth = state.session.state().await;
    Html(ui::render_add_plant(None, &auth))
}

pub async fn add_plant_form(
    State(state): State<AppState>,
    Form(payload): Form<NewPlantRequest>,
) -> Result<Response, AppError> {
    match add_plant(&state, payload).await {
        Ok(_) => Ok(Redirect::to("/list").into_response()),
        Err(err) if err.status == StatusCode::BAD_REQUEST => {
            let auth = state.session.state().await;
            let page = ui::render_add_plant(Some(&err.message), &auth);
            Ok((StatusCode::BAD_REQUEST, Html(page)).into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn toggle_form(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(payload): Form<ToggleRequest>,
) -> Result<Redirect, AppError> {
    toggle_plant(&state, id, payload).await?;
    Ok(Redirect::to("/list"))
}

pub async fn api_list_plants(State(state): State<AppState>) -> Json<Vec<Plant>> {
    let plants = state.plants.lock().await.snapshot();
    Json(plants.as_ref().clone())
}

pub async fn api_add_plant(
    State(state): State<AppState>,
    Json(payload): Json<NewPlantRequest>,
) -> Result<(StatusCode, Json<Plant>), AppError> {
    let plant = add_plant(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(plant)))
}

pub async fn api_toggle(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<PlantStatus>, AppError> {
    Ok(Json(toggle_plant(&state, id, payload).await?))
}

async fn add_plant(state: &AppState, payload: NewPlantRequest) -> Result<Plant, AppError> {
    let mut plants = state.plants.lock().await;
    let plant = plants.add(&payload.name, &payload.kind, payload.image, today())?;
    persist_data(&state.data_path, &plants.to_data()).await?;
    info!("added plant {} ({})", plant.name, plant.id);
    Ok(plant)
}

async fn toggle_plant(
    state: &AppState,
    id: u64,
    payload: ToggleRequest,
) -> Result<PlantStatus, AppError> {
    let mut plants = state.plants.lock().await;
    let status = plants.toggle_status(id, payload.field, today())?;
    persist_data(&state.data_path, &plants.to_data()).await?;
    Ok(status)
}

pub async fn get_stats(State(state): State<AppState>) -> Json<GrowthResponse> {
    let plants = state.plants.lock().await.snapshot();
    Json(build_growth(&plants))
}

pub async fn growth_page(State(state): State<AppState>) -> Html<String> {
    let plants = state.plants.lock().await.snapshot();
    let auth = state.session.state().await;
    Html(ui::render_growth(&build_growth(&plants), &auth))
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

pub async fn tasks_page(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Response, AppError> {
    let auth = state.session.state().await;
    let Some(user) = signed_in_user(&state, &auth).await else {
        return Ok(Redirect::to("/login").into_response());
    };

    let selected = {
        let mut selected = state.selected_date.lock().await;
        if let Some(raw) = query.date.as_deref() {
            match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(day) => selected.set(day),
                Err(err) => warn!("ignoring invalid date '{raw}': {err}"),
            }
        }
        selected.get()
    };

    let mut tasks = state.tasks.lock().await;
    let api = state.session.api();
    tasks.fetch_user_tasks(api, &user.id).await;
    tasks.fetch_calendar_tasks(api, &user.id).await;

    let due = tasks.tasks_due_on(&selected.to_string());
    let all = tasks.tasks();
    Ok(Html(ui::render_tasks(selected, &due, &all, &auth)).into_response())
}

pub async fn create_task(
    State(state): State<AppState>,
    Form(payload): Form<NewTask>,
) -> Result<Redirect, AppError> {
    let auth = state.session.state().await;
    let Some(user) = signed_in_user(&state, &auth).await else {
        return Ok(Redirect::to("/login"));
    };
    let mut tasks = state.tasks.lock().await;
    tasks.add_task(state.session.api(), &user.id, &payload).await;
    Ok(Redirect::to("/tasks"))
}

pub async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Redirect, AppError> {
    let mut tasks = state.tasks.lock().await;
    tasks.mark_task_complete(state.session.api(), &task_id).await;
    Ok(Redirect::to("/tasks"))
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

pub async fn products_page(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Html<String>, AppError> {
    let category = parse_category(query.category.as_deref())?;
    let products = filter_products(&state.catalog, category);
    let cart = state.cart.lock().await.clone();
    let auth = state.session.state().await;
    Ok(Html(ui::render_products(&products, category, &cart, None, &auth)))
}

fn parse_category(raw: Option<&str>) -> Result<Option<ProductCategory>, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(AppError::bad_request),
    }
}

pub async fn cart_add(
    State(state): State<AppState>,
    Path(product_id): Path<u32>,
) -> Result<Redirect, AppError> {
    let product = state
        .catalog
        .iter()
        .find(|product| product.id == product_id)
        .ok_or_else(|| AppError::not_found(format!("no product with id {product_id}")))?;
    state.cart.lock().await.add(product);
    Ok(Redirect::to("/products"))
}

#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: u32,
}

pub async fn cart_quantity(
    State(state): State<AppState>,
    Path(product_id): Path<u32>,
    Form(payload): Form<QuantityForm>,
) -> Redirect {
    state
        .cart
        .lock()
        .await
        .update_quantity(product_id, payload.quantity);
    Redirect::to("/products")
}

pub async fn cart_remove(State(state): State<AppState>, Path(product_id): Path<u32>) -> Redirect {
    state.cart.lock().await.remove(product_id);
    Redirect::to("/products")
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: u64,
    pub item_count: u64,
}

pub async fn api_cart(State(state): State<AppState>) -> Json<CartView> {
    let cart = state.cart.lock().await;
    Json(CartView {
        items: cart.items().to_vec(),
        total: cart.total(),
        item_count: cart.item_count(),
    })
}

pub async fn checkout_form(
    State(state): State<AppState>,
    Form(customer): Form<CustomerInfo>,
) -> Result<Response, AppError> {
    let result = {
        let mut cart = state.cart.lock().await;
        checkout(&mut cart, &customer, now())
    };

    match result {
        Ok(order) => {
            info!("placed order {} for {}", order.id, order.total);
            state.orders.lock().await.push(order);
            Ok(Redirect::to("/my-orders").into_response())
        }
        Err(err) => {
            let cart = state.cart.lock().await.clone();
            let auth = state.session.state().await;
            let page = ui::render_products(
                &state.catalog,
                None,
                &cart,
                Some(&err.to_string()),
                &auth,
            );
            Ok((StatusCode::BAD_REQUEST, Html(page)).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

pub async fn orders_page(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Html<String>, AppError> {
    let filter = match query.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(value) => Some(value.parse::<OrderStatus>().map_err(AppError::bad_request)?),
    };
    let (orders, counts) = {
        let book = state.orders.lock().await;
        let counts = OrderStatus::ALL.map(|status| (status, book.count(status)));
        (book.filter(filter), counts)
    };
    let auth = state.session.state().await;
    Ok(Html(ui::render_orders(&orders, filter, &counts, &auth)))
}

pub async fn order_detail(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let order = state
        .orders
        .lock()
        .await
        .find(&order_id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("no order with id {order_id}")))?;
    let auth = state.session.state().await;
    let steps = progress_steps(order.status);
    Ok(Html(ui::render_order_detail(&order, &steps, &auth)))
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusForm {
    pub status: OrderStatus,
}

pub async fn order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Form(payload): Form<OrderStatusForm>,
) -> Result<Redirect, AppError> {
    state
        .orders
        .lock()
        .await
        .update_status(&order_id, payload.status)
        .ok_or_else(|| AppError::not_found(format!("no order with id {order_id}")))?;
    Ok(Redirect::to("/my-orders"))
}

pub async fn api_orders(State(state): State<AppState>) -> Json<Vec<Order>> {
    Json(state.orders.lock().await.list().to_vec())
}

pub async fn profile_page(State(state): State<AppState>) -> Response {
    let auth = state.session.state().await;
    match (&auth.profile, signed_in_user(&state, &auth).await) {
        (Some(profile), Some(_)) => Html(ui::render_profile(profile, &auth)).into_response(),
        _ => Redirect::to("/login").into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, rename = "favoritePlants")]
    pub favorite_plants: Option<String>,
}

impl From<ProfileForm> for ProfileUpdate {
    fn from(form: ProfileForm) -> Self {
        ProfileUpdate {
            name: form.name,
            bio: form.bio,
            location: form.location,
            avatar: form.avatar,
            favorite_plants: form
                .favorite_plants
                .map(|raw| raw.split(',').map(|plant| plant.to_string()).collect()),
        }
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    Form(form): Form<ProfileForm>,
) -> Redirect {
    let update = ProfileUpdate::from(form);
    if state.session.update_profile(&update).await.is_none() {
        return Redirect::to("/login");
    }
    Redirect::to("/profile")
}

pub async fn signup_page(State(state): State<AppState>) -> Html<String> {
    let auth = state.session.state().await;
    Html(ui::render_signup(None, &auth))
}

pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> Response {
    let result = match form.validate() {
        Ok(request) => state
            .session
            .register(&request)
            .await
            .map_err(|err| err.to_string()),
        Err(message) => Err(message),
    };

    match result {
        Ok(_) => Redirect::to("/").into_response(),
        Err(message) => {
            let auth = state.session.state().await;
            let page = ui::render_signup(Some(&message), &auth);
            (StatusCode::BAD_REQUEST, Html(page)).into_response()
        }
    }
}

pub async fn login_page(State(state): State<AppState>) -> Html<String> {
    let auth = state.session.state().await;
    Html(ui::render_login(None, &auth))
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginRequest>) -> Response {
    if form.email.trim().is_empty() || form.password.is_empty() {
        let auth = state.session.state().await;
        let page = ui::render_login(Some("Email and password are required"), &auth);
        return (StatusCode::BAD_REQUEST, Html(page)).into_response();
    }

    match state.session.login(form.email.trim(), &form.password).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(err) => {
            let auth = state.session.state().await;
            let page = ui::render_login(Some(&err.to_string()), &auth);
            (StatusCode::UNAUTHORIZED, Html(page)).into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>) -> Redirect {
    state.session.logout().await;
    Redirect::to("/login")
}

pub async fn api_session(State(state): State<AppState>) -> Json<AuthState> {
    Json(state.session.state().await)
}

/// The signed-in user, provided a token is still stored.
async fn signed_in_user(
    state: &AppState,
    auth: &AuthState,
) -> Option<crate::models::User> {
    if !state.session.api().is_authenticated().await {
        return None;
    }
    auth.user.clone()
}
