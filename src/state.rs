use crate::commerce::{Cart, OrderBook};
use crate::models::{AppData, Product};
use crate::plants::PlantStore;
use crate::session::Session;
use crate::tasks::{SelectedDate, TaskStore};
use chrono::NaiveDate;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

/// Context handed to every handler. Each store is locked on its own.
#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub plants: Arc<Mutex<PlantStore>>,
    pub tasks: Arc<Mutex<TaskStore>>,
    pub selected_date: Arc<Mutex<SelectedDate>>,
    pub session: Arc<Session>,
    pub catalog: Arc<Vec<Product>>,
    pub cart: Arc<Mutex<Cart>>,
    pub orders: Arc<Mutex<OrderBook>>,
}

impl AppState {
    pub fn new(
        data_path: PathBuf,
        data: AppData,
        session: Arc<Session>,
        catalog: Vec<Product>,
        today: NaiveDate,
    ) -> Self {
        Self {
            data_path,
            plants: Arc::new(Mutex::new(PlantStore::new(data.plants))),
            tasks: Arc::new(Mutex::new(TaskStore::default())),
            selected_date: Arc::new(Mutex::new(SelectedDate::new(today))),
            session,
            catalog: Arc::new(catalog),
            cart: Arc::new(Mutex::new(Cart::default())),
            orders: Arc::new(Mutex::new(OrderBook::default())),
        }
    }
}
