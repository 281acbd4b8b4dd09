use crate::commerce::{format_rupiah, Cart, ProgressStep};
use crate::models::{
    GrowthResponse, Order, OrderStatus, Plant, Product, ProductCategory, ProfileData,
    StatusField, Task,
};
use crate::plants::status_on;
use crate::session::AuthState;
use chrono::NaiveDate;
use std::fmt::Write;

pub fn render_dashboard(growth: &GrowthResponse, auth: &AuthState) -> String {
    let summary = &growth.summary;
    let greeting = match &auth.user {
        Some(user) => format!("Welcome back, {}", escape(&user.name)),
        None => "Welcome to Gardenary".to_string(),
    };
    let body = format!(
        r#"<h1>{greeting}</h1>
<p class="muted">{date}</p>
<div class="stats">
  <div class="stat"><span>{plants}</span>Plants</div>
  <div class="stat"><span>{watered}</span>Watered today</div>
  <div class="stat"><span>{fertilized}</span>Fertilized today</div>
  <div class="stat"><span>{harvested}</span>Harvested today</div>
</div>
<p><a class="button" href="/list">Your plants</a> <a class="button" href="/add">Add a plant</a></p>"#,
        date = summary.date,
        plants = summary.plant_count,
        watered = summary.watered_today,
        fertilized = summary.fertilized_today,
        harvested = summary.harvested_today,
    );
    layout("Dashboard", auth, &body)
}

pub fn render_plant_list(plants: &[Plant], today: NaiveDate, auth: &AuthState) -> String {
    let mut rows = String::new();
    for plant in plants {
        let status = status_on(plant, today);
        let mut toggles = String::new();
        for field in StatusField::ALL {
            let checked = if status.get(field) { "&#10003;" } else { "&nbsp;" };
            let _ = write!(
                toggles,
                r#"<td><form method="post" action="/plants/{id}/toggle"><input type="hidden" name="field" value="{name}"><button class="check" title="{name}">{checked}</button></form></td>"#,
                id = plant.id,
                name = field.as_str(),
            );
        }
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{} days</td>{toggles}</tr>",
            escape(&plant.name),
            escape(&plant.kind),
            plant.age,
        );
    }
    if plants.is_empty() {
        rows.push_str(r#"<tr><td colspan="6" class="muted">No plants yet.</td></tr>"#);
    }

    let body = format!(
        r#"<h1>Your plants</h1>
<table>
  <tr><th>Name</th><th>Type</th><th>Age</th><th>Watered</th><th>Fertilized</th><th>Harvested</th></tr>
  {rows}
</table>"#
    );
    layout("Your plants", auth, &body)
}

pub fn render_add_plant(error: Option<&str>, auth: &AuthState) -> String {
    let body = format!(
        r#"<h1>Add a plant</h1>
{error}
<form method="post" action="/add" class="stack">
  <label>Name <input name="name" required></label>
  <label>Type
    <select name="type">
      <option>Vegetable</option><option>Herb</option><option>Fruit</option><option>Flower</option>
    </select>
  </label>
  <label>Image URL <input name="image"></label>
  <button class="button">Save</button>
</form>"#,
        error = alert(error),
    );
    layout("Add a plant", auth, &body)
}

pub fn render_growth(growth: &GrowthResponse, auth: &AuthState) -> String {
    let max = growth
        .last_7_days
        .iter()
        .map(|day| day.watered.max(day.fertilized).max(day.harvested))
        .max()
        .unwrap_or(0)
        .max(1);

    let mut bars = String::new();
    for day in &growth.last_7_days {
        let _ = write!(
            bars,
            r#"<div class="bar-row"><span>{date}</span>{w}{f}{h}</div>"#,
            date = day.date,
            w = bar("watered", day.watered, max),
            f = bar("fertilized", day.fertilized, max),
            h = bar("harvested", day.harvested, max),
        );
    }

    let mut weeks = String::new();
    for week in &growth.weekly_totals {
        let _ = write!(
            weeks,
            "<tr><td>{}</td><td>{} – {}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            week.week, week.start_date, week.end_date, week.watered, week.fertilized, week.harvested,
        );
    }

    let body = format!(
        r#"<h1>Growth</h1>
<h2>Last 7 days</h2>
<div class="bars">{bars}</div>
<h2>Weekly care</h2>
<table>
  <tr><th>Week</th><th>Range</th><th>Watered</th><th>Fertilized</th><th>Harvested</th></tr>
  {weeks}
</table>"#
    );
    layout("Growth", auth, &body)
}

fn bar(class: &str, value: u32, max: u32) -> String {
    let width = value * 100 / max;
    format!(r#"<i class="{class}" style="width:{width}%" title="{class}: {value}"></i>"#)
}

pub fn render_tasks(selected: NaiveDate, due: &[Task], all: &[Task], auth: &AuthState) -> String {
    let body = format!(
        r#"<h1>Tasks</h1>
<form method="get" action="/tasks"><input type="date" name="date" value="{selected}"> <button class="button">Show</button></form>
<h2>Due on {selected}</h2>
{due}
<h2>All tasks</h2>
{all}
<h2>New task</h2>
<form method="post" action="/tasks" class="stack">
  <label>Plant <input name="plantId" required></label>
  <label>Type <input name="type" value="water" required></label>
  <label>Description <input name="description" required></label>
  <label>Due <input type="date" name="dueDate" value="{selected}" required></label>
  <button class="button">Add task</button>
</form>"#,
        due = task_list(due),
        all = task_list(all),
    );
    layout("Tasks", auth, &body)
}

fn task_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return r#"<p class="muted">Nothing here.</p>"#.to_string();
    }
    let mut out = String::from("<ul>");
    for task in tasks {
        let action = if task.completed {
            "<em>done</em>".to_string()
        } else {
            format!(
                r#"<form method="post" action="/tasks/{}/complete" class="inline"><button class="check">Complete</button></form>"#,
                path_segment(&task.id)
            )
        };
        let _ = write!(
            out,
            "<li><strong>{}</strong> {} <span class=\"muted\">{}</span> {action}</li>",
            escape(&task.kind),
            escape(&task.description),
            escape(&task.due_date),
        );
    }
    out.push_str("</ul>");
    out
}

pub fn render_products(
    products: &[Product],
    category: Option<ProductCategory>,
    cart: &Cart,
    error: Option<&str>,
    auth: &AuthState,
) -> String {
    let mut filters = String::from(r#"<a href="/products">all</a>"#);
    for option in ProductCategory::ALL {
        let marker = if Some(option) == category { " class=\"active\"" } else { "" };
        let _ = write!(
            filters,
            r#" <a{marker} href="/products?category={name}">{name}</a>"#,
            name = option.as_str()
        );
    }

    let mut cards = String::new();
    for product in products {
        let _ = write!(
            cards,
            r#"<div class="card"><h3>{name}</h3><p>{description}</p><p><strong>{price}</strong> <span class="muted">stock {stock}</span></p><form method="post" action="/cart/add/{id}"><button class="button">Add to cart</button></form></div>"#,
            name = escape(&product.name),
            description = escape(&product.description),
            price = format_rupiah(product.price),
            stock = product.stock,
            id = product.id,
        );
    }

    let mut lines = String::new();
    for item in cart.items() {
        let _ = write!(
            lines,
            r#"<tr><td>{name}</td><td><form method="post" action="/cart/{id}/quantity" class="inline"><input type="number" min="0" name="quantity" value="{qty}"><button class="check">Update</button></form></td><td>{subtotal}</td><td><form method="post" action="/cart/{id}/remove" class="inline"><button class="check">Remove</button></form></td></tr>"#,
            name = escape(&item.product.name),
            id = item.product.id,
            qty = item.quantity,
            subtotal = format_rupiah(item.product.price * u64::from(item.quantity)),
        );
    }

    let cart_section = if cart.is_empty() {
        r#"<p class="muted">Your cart is empty</p>"#.to_string()
    } else {
        format!(
            r#"<table><tr><th>Item</th><th>Qty</th><th>Subtotal</th><th></th></tr>{lines}</table>
<p>Total: <strong>{total}</strong></p>
<form method="post" action="/checkout" class="stack">
  <label>Name <input name="name"></label>
  <label>Email <input name="email" type="email"></label>
  <label>Address <input name="address"></label>
  <label>Phone <input name="phone"></label>
  <button class="button">Place order</button>
</form>"#,
            total = format_rupiah(cart.total()),
        )
    };

    let body = format!(
        r#"<h1>Shop</h1>
<p class="filters">{filters}</p>
<div class="grid">{cards}</div>
<h2>Cart ({count})</h2>
{error}
{cart_section}"#,
        count = cart.item_count(),
        error = alert(error),
    );
    layout("Shop", auth, &body)
}

pub fn render_orders(
    orders: &[Order],
    filter: Option<OrderStatus>,
    counts: &[(OrderStatus, usize)],
    auth: &AuthState,
) -> String {
    let mut filters = String::from(r#"<a href="/my-orders">all</a>"#);
    for (status, count) in counts {
        let marker = if Some(*status) == filter { " class=\"active\"" } else { "" };
        let _ = write!(
            filters,
            r#" <a{marker} href="/my-orders?status={status}">{status} <span class="muted">{count}</span></a>"#
        );
    }

    let mut rows = String::new();
    for order in orders {
        let items = order
            .items
            .iter()
            .map(|item| format!("{} × {}", escape(&item.product.name), item.quantity))
            .collect::<Vec<_>>()
            .join(", ");
        let mut options = String::new();
        for status in OrderStatus::ALL {
            let selected = if status == order.status { " selected" } else { "" };
            let _ = write!(options, "<option{selected}>{status}</option>");
        }
        let _ = write!(
            rows,
            r#"<tr><td><a href="/my-orders/{path}">{id}</a></td><td>{date}</td><td>{items}</td><td>{total}</td><td><form method="post" action="/my-orders/{path}/status" class="inline"><select name="status">{options}</select><button class="check">Set</button></form></td></tr>"#,
            id = escape(&order.id),
            path = path_segment(&order.id),
            date = escape(&order.date),
            total = format_rupiah(order.total),
        );
    }
    if orders.is_empty() {
        rows.push_str(r#"<tr><td colspan="5" class="muted">No orders yet.</td></tr>"#);
    }

    let body = format!(
        r#"<h1>My orders</h1>
<p class="filters">{filters}</p>
<table><tr><th>Order</th><th>Date</th><th>Items</th><th>Total</th><th>Status</th></tr>{rows}</table>"#
    );
    layout("My orders", auth, &body)
}

pub fn render_order_detail(order: &Order, steps: &[ProgressStep], auth: &AuthState) -> String {
    let mut progress = String::new();
    for step in steps {
        let class = match (step.current, step.completed) {
            (true, _) => "step current",
            (false, true) => "step done",
            (false, false) => "step",
        };
        let _ = write!(progress, r#"<li class="{class}">{}</li>"#, step.status);
    }

    let mut lines = String::new();
    for item in &order.items {
        let _ = write!(
            lines,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&item.product.name),
            item.quantity,
            format_rupiah(item.product.price * u64::from(item.quantity)),
        );
    }

    let customer = &order.customer_info;
    let body = format!(
        r#"<h1>Order {id}</h1>
<p>Placed {date} · <strong>{status}</strong></p>
<ol class="progress">{progress}</ol>
<table><tr><th>Item</th><th>Qty</th><th>Subtotal</th></tr>{lines}</table>
<p>Total: <strong>{total}</strong></p>
<h2>Ship to</h2>
<p>{name}<br>{address}<br>{email} · {phone}</p>
<p><a href="/my-orders">Back to orders</a></p>"#,
        id = escape(&order.id),
        date = escape(&order.date),
        status = order.status,
        total = format_rupiah(order.total),
        name = escape(&customer.name),
        address = escape(&customer.address),
        email = escape(&customer.email),
        phone = escape(&customer.phone),
    );
    layout("Order detail", auth, &body)
}

pub fn render_profile(profile: &ProfileData, auth: &AuthState) -> String {
    let favorites = profile
        .favorite_plants
        .iter()
        .map(|plant| escape(plant))
        .collect::<Vec<_>>()
        .join(", ");
    let body = format!(
        r#"<h1>{name}</h1>
<p class="muted">{email} · {location} · joined {joined}</p>
<p>{bio}</p>
<div class="stats">
  <div class="stat"><span>{owned}</span>Plants owned</div>
  <div class="stat"><span>{harvested}</span>Harvested</div>
  <div class="stat"><span>{score}</span>Garden score</div>
</div>
<p>Favorite plants: {favorites}</p>
<h2>Edit profile</h2>
<form method="post" action="/profile" class="stack">
  <label>Name <input name="name" value="{name}"></label>
  <label>Location <input name="location" value="{location}"></label>
  <label>Avatar URL <input name="avatar" value="{avatar}"></label>
  <label>Bio <textarea name="bio">{bio}</textarea></label>
  <label>Favorite plants <input name="favoritePlants" value="{favorites}"></label>
  <button class="button">Save</button>
</form>"#,
        name = escape(&profile.name),
        email = escape(&profile.email),
        location = escape(profile.location.as_deref().unwrap_or("")),
        joined = escape(&profile.join_date),
        bio = escape(&profile.bio),
        avatar = escape(profile.avatar.as_deref().unwrap_or("")),
        owned = profile.plants_owned,
        harvested = profile.plants_harvested,
        score = profile.garden_score,
    );
    layout("Profile", auth, &body)
}

pub fn render_signup(error: Option<&str>, auth: &AuthState) -> String {
    let body = format!(
        r#"<h1>Create your Gardenary account</h1>
{error}
<form method="post" action="/signup" class="stack">
  <label>Name <input name="name"></label>
  <label>Email <input name="email" type="email"></label>
  <label>City <input name="city"></label>
  <label>Birth date <input name="birth_date" type="date"></label>
  <label>Password <input name="password" type="password"></label>
  <label>Confirm password <input name="confirm_password" type="password"></label>
  <label><input type="checkbox" name="agreed"> I agree to the terms</label>
  <button class="button">Sign up</button>
</form>
<p>Already registered? <a href="/login">Log in</a></p>"#,
        error = alert(error),
    );
    layout("Sign up", auth, &body)
}

pub fn render_login(error: Option<&str>, auth: &AuthState) -> String {
    let body = format!(
        r#"<h1>Log in</h1>
{error}
<form method="post" action="/login" class="stack">
  <label>Email <input name="email" type="email"></label>
  <label>Password <input name="password" type="password"></label>
  <button class="button">Log in</button>
</form>
<p>Don't have an account? <a href="/signup">Sign up</a></p>"#,
        error = alert(error),
    );
    layout("Log in", auth, &body)
}

fn alert(message: Option<&str>) -> String {
    message
        .map(|text| format!(r#"<p class="alert">{}</p>"#, escape(text)))
        .unwrap_or_default()
}

fn layout(title: &str, auth: &AuthState, body: &str) -> String {
    let account = if auth.is_authenticated {
        r#"<a href="/profile">Profile</a><form method="post" action="/logout" class="inline"><button class="link">Log out</button></form>"#
    } else {
        r#"<a href="/login">Log in</a><a href="/signup">Sign up</a>"#
    };
    LAYOUT_HTML
        .replace("{{TITLE}}", &escape(title))
        .replace("{{ACCOUNT}}", account)
        .replace("{{BODY}}", body)
}

/// Percent-encodes `value` for use as one path segment inside an attribute.
fn path_segment(value: &str) -> String {
    escape(&urlencoding::encode(value))
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} · Gardenary</title>
  <style>
    :root {
      --bg: #f0fdf4;
      --ink: #14532d;
      --accent: #166534;
      --card: #ffffff;
    }

    body {
      margin: 0;
      display: flex;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
    }

    nav {
      width: 12rem;
      padding: 1rem;
      background: #ecfccb;
      display: flex;
      flex-direction: column;
      gap: 0.5rem;
    }

    nav a, .link {
      color: var(--ink);
      text-decoration: none;
      background: none;
      border: 0;
      padding: 0;
      font: inherit;
      cursor: pointer;
      text-align: left;
    }

    main {
      flex: 1;
      padding: 2rem;
    }

    table {
      border-collapse: collapse;
      background: var(--card);
    }

    th, td {
      padding: 0.4rem 0.8rem;
      border-bottom: 1px solid #d9f99d;
    }

    .button {
      background: var(--accent);
      color: #fff;
      border: 0;
      border-radius: 6px;
      padding: 0.5rem 1rem;
      text-decoration: none;
      cursor: pointer;
    }

    .check {
      min-width: 2rem;
      cursor: pointer;
    }

    .stack {
      display: grid;
      gap: 0.6rem;
      max-width: 24rem;
    }

    .inline {
      display: inline;
    }

    .stats, .grid {
      display: flex;
      flex-wrap: wrap;
      gap: 1rem;
    }

    .stat, .card {
      background: var(--card);
      border-radius: 10px;
      padding: 1rem;
      min-width: 9rem;
    }

    .stat span {
      display: block;
      font-size: 1.8rem;
      font-weight: 600;
    }

    .progress {
      display: flex;
      gap: 1rem;
      list-style: none;
      padding: 0;
    }

    .step {
      color: #9ca3af;
    }

    .step.done {
      color: var(--accent);
    }

    .step.current {
      color: var(--accent);
      font-weight: 700;
    }

    .bar-row {
      display: grid;
      grid-template-columns: 7rem 1fr 1fr 1fr;
      gap: 0.3rem;
      align-items: center;
    }

    .bar-row i {
      display: block;
      height: 0.8rem;
      border-radius: 4px;
    }

    .watered { background: #38bdf8; }
    .fertilized { background: #a16207; }
    .harvested { background: #f97316; }
    .muted { color: #4d7c0f; }
    .alert { color: #b91c1c; }
    .active { font-weight: 700; }
  </style>
</head>
<body>
  <nav>
    <a href="/"><strong>Gardenary</strong></a>
    <a href="/list">Your plants</a>
    <a href="/add">Add plant</a>
    <a href="/growth">Growth</a>
    <a href="/tasks">Tasks</a>
    <a href="/products">Shop</a>
    <a href="/my-orders">My orders</a>
    {{ACCOUNT}}
  </nav>
  <main>
{{BODY}}
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plants::new_plant;

    #[test]
    fn escape_handles_markup() {
        assert_eq!(escape(r#"<b>"Mint" & 'Basil'</b>"#), "&lt;b&gt;&quot;Mint&quot; &amp; &#39;Basil&#39;&lt;/b&gt;");
    }

    #[test]
    fn plant_list_escapes_names_and_links_toggles() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let plant = new_plant(3, "<Mint>", "Herb", None, today);
        let html = render_plant_list(&[plant], today, &AuthState::default());
        assert!(html.contains("&lt;Mint&gt;"));
        assert!(html.contains(r#"action="/plants/3/toggle""#));
        assert!(html.contains(r#"value="harvested""#));
    }

    #[test]
    fn layout_switches_account_links() {
        let anonymous = render_login(None, &AuthState::default());
        assert!(anonymous.contains(r#"href="/signup""#));

        let signed_in = AuthState {
            is_authenticated: true,
            ..AuthState::default()
        };
        let html = render_add_plant(Some("Name required"), &signed_in);
        assert!(html.contains(r#"action="/logout""#));
        assert!(html.contains("Name required"));
    }

    #[test]
    fn task_ids_are_percent_encoded_in_form_actions() {
        let task = Task {
            id: "a/b?c".into(),
            user_id: "u1".into(),
            plant_id: "p1".into(),
            kind: "water".into(),
            description: "Water the basil".into(),
            due_date: "2026-01-05".into(),
            completed: false,
        };
        let html = task_list(&[task]);
        assert!(html.contains(r#"action="/tasks/a%2Fb%3Fc/complete""#));
    }

    #[test]
    fn order_pages_show_counts_and_progress() {
        let order = Order {
            id: "ORD-2026-000001".into(),
            items: Vec::new(),
            total: 25_000,
            date: "2026-01-05T10:00:00.000Z".into(),
            status: OrderStatus::Shipped,
            customer_info: crate::models::CustomerInfo {
                name: "Sari".into(),
                email: "sari@example.com".into(),
                address: "Jl. Merdeka 1".into(),
                phone: "0812".into(),
            },
        };
        let counts = OrderStatus::ALL.map(|status| (status, usize::from(status == OrderStatus::Shipped)));
        let list = render_orders(std::slice::from_ref(&order), None, &counts, &AuthState::default());
        assert!(list.contains(r#"href="/my-orders/ORD-2026-000001""#));
        assert!(list.contains(r#"shipped <span class="muted">1</span>"#));

        let steps = crate::commerce::progress_steps(order.status);
        let detail = render_order_detail(&order, &steps, &AuthState::default());
        assert!(detail.contains(r#"<li class="step done">processing</li>"#));
        assert!(detail.contains(r#"<li class="step current">shipped</li>"#));
        assert!(detail.contains(r#"<li class="step">delivered</li>"#));
        assert!(detail.contains("Rp 25.000"));
    }
}
