//! Shop catalog, cart and the in-memory order book.

use crate::errors::CheckoutError;
use crate::models::{CartItem, CustomerInfo, Order, OrderStatus, Product, ProductCategory};
use chrono::{DateTime, Datelike, Local, SecondsFormat};

pub fn default_catalog() -> Vec<Product> {
    vec![
        product(1, "Tomato Seeds", 25_000, "Tomato seeds for the vegetable bed", ProductCategory::Seeds, 50),
        product(2, "Garden Shovel", 75_000, "Steel garden shovel", ProductCategory::Tools, 25),
        product(3, "Organic Fertilizer", 45_000, "Organic fertilizer", ProductCategory::Fertilizer, 30),
        product(4, "Ceramic Pot", 35_000, "Ceramic pot for indoor plants", ProductCategory::Pots, 20),
    ]
}

fn product(
    id: u32,
    name: &str,
    price: u64,
    description: &str,
    category: ProductCategory,
    stock: u32,
) -> Product {
    Product {
        id,
        name: name.to_string(),
        price,
        description: description.to_string(),
        category,
        stock,
    }
}

/// `None` means every category.
pub fn filter_products(products: &[Product], category: Option<ProductCategory>) -> Vec<Product> {
    products
        .iter()
        .filter(|product| category.is_none_or(|wanted| product.category == wanted))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add(&mut self, product: &Product) {
        match self.items.iter_mut().find(|item| item.product.id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.items.push(CartItem {
                product: product.clone(),
                quantity: 1,
            }),
        }
    }

    pub fn remove(&mut self, product_id: u32) {
        self.items.retain(|item| item.product.id != product_id);
    }

    /// Zero removes the line.
    pub fn update_quantity(&mut self, product_id: u32, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|item| item.product.id == product_id) {
            item.quantity = quantity;
        }
    }

    pub fn total(&self) -> u64 {
        self.items
            .iter()
            .map(|item| item.product.price * u64::from(item.quantity))
            .sum()
    }

    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    fn take(&mut self) -> Vec<CartItem> {
        std::mem::take(&mut self.items)
    }
}

/// Turns the cart into a pending order and empties it.
pub fn checkout(
    cart: &mut Cart,
    customer: &CustomerInfo,
    now: DateTime<Local>,
) -> Result<Order, CheckoutError> {
    let fields = [
        &customer.name,
        &customer.email,
        &customer.address,
        &customer.phone,
    ];
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err(CheckoutError::MissingCustomerInfo);
    }
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let total = cart.total();
    let millis = now.timestamp_millis().rem_euclid(1_000_000);
    Ok(Order {
        id: format!("ORD-{}-{:06}", now.year(), millis),
        items: cart.take(),
        total,
        date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        status: OrderStatus::Pending,
        customer_info: customer.clone(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: Vec<Order>,
}

impl OrderBook {
    pub fn push(&mut self, order: Order) {
        self.orders.push(order);
    }

    pub fn list(&self) -> &[Order] {
        &self.orders
    }

    pub fn filter(&self, status: Option<OrderStatus>) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|order| status.is_none_or(|wanted| order.status == wanted))
            .cloned()
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    pub fn count(&self, status: OrderStatus) -> usize {
        self.orders.iter().filter(|order| order.status == status).count()
    }

    pub fn update_status(&mut self, id: &str, status: OrderStatus) -> Option<&Order> {
        let order = self.orders.iter_mut().find(|order| order.id == id)?;
        order.status = status;
        Some(order)
    }
}

/// Delivery stages shown on an order's detail page, in order.
pub const PROGRESS_STEPS: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStep {
    pub status: OrderStatus,
    pub completed: bool,
    pub current: bool,
}

/// A cancelled order has no completed steps.
pub fn progress_steps(status: OrderStatus) -> Vec<ProgressStep> {
    let reached = PROGRESS_STEPS.iter().position(|step| *step == status);
    PROGRESS_STEPS
        .iter()
        .enumerate()
        .map(|(index, step)| ProgressStep {
            status: *step,
            completed: reached.is_some_and(|current| index <= current),
            current: reached == Some(index),
        })
        .collect()
}

/// `25000` becomes `Rp 25.000`.
pub fn format_rupiah(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("Rp {grouped}")
}

pub fn now() -> DateTime<Local> {
    Local::now()
}
