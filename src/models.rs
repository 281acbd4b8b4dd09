use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PlantStatus {
    pub watered: bool,
    pub fertilized: bool,
    pub harvested: bool,
}

impl PlantStatus {
    pub fn get(&self, field: StatusField) -> bool {
        match field {
            StatusField::Watered => self.watered,
            StatusField::Fertilized => self.fertilized,
            StatusField::Harvested => self.harvested,
        }
    }

    pub fn flipped(mut self, field: StatusField) -> Self {
        match field {
            StatusField::Watered => self.watered = !self.watered,
            StatusField::Fertilized => self.fertilized = !self.fertilized,
            StatusField::Harvested => self.harvested = !self.harvested,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusField {
    Watered,
    Fertilized,
    Harvested,
}

impl StatusField {
    pub const ALL: [StatusField; 3] = [Self::Watered, Self::Fertilized, Self::Harvested];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Watered => "watered",
            Self::Fertilized => "fertilized",
            Self::Harvested => "harvested",
        }
    }
}

impl FromStr for StatusField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "watered" => Ok(Self::Watered),
            "fertilized" => Ok(Self::Fertilized),
            "harvested" => Ok(Self::Harvested),
            other => Err(format!("unknown status field '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plant {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub age: u32,
    pub planted_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub status: BTreeMap<String, PlantStatus>,
}

/// Everything written to the data file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub plants: Vec<Plant>,
}

#[derive(Debug, Deserialize)]
pub struct NewPlantRequest {
    pub name: String,
    #[serde(rename = "type", default = "default_plant_kind")]
    pub kind: String,
    #[serde(default)]
    pub image: Option<String>,
}

fn default_plant_kind() -> String {
    "Vegetable".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub field: StatusField,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub plant_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub due_date: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub plant_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub due_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

/// Response wrapper used by every remote endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedTask {
    pub task: Task,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CalendarTasks {
    pub tasks: BTreeMap<String, Vec<Task>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub join_date: String,
    #[serde(default)]
    pub plants_owned: u32,
    #[serde(default)]
    pub plants_harvested: u32,
    #[serde(default)]
    pub garden_score: u32,
    #[serde(default)]
    pub favorite_plants: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub favorite_plants: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Seeds,
    Tools,
    Fertilizer,
    Pots,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 4] = [Self::Seeds, Self::Tools, Self::Fertilizer, Self::Pots];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seeds => "seeds",
            Self::Tools => "tools",
            Self::Fertilizer => "fertilizer",
            Self::Pots => "pots",
        }
    }
}

impl FromStr for ProductCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value.trim())
            .ok_or_else(|| format!("unknown category '{value}'"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub price: u64,
    pub description: String,
    pub category: ProductCategory,
    pub stock: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim())
            .ok_or_else(|| format!("unknown order status '{value}'"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub items: Vec<CartItem>,
    pub total: u64,
    pub date: String,
    pub status: OrderStatus,
    pub customer_info: CustomerInfo,
}

#[derive(Debug, Serialize)]
pub struct DailyCarePoint {
    pub date: String,
    pub watered: u32,
    pub fertilized: u32,
    pub harvested: u32,
}

#[derive(Debug, Serialize)]
pub struct WeeklyCarePoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub watered: u32,
    pub fertilized: u32,
    pub harvested: u32,
}

#[derive(Debug, Serialize)]
pub struct GardenSummary {
    pub date: String,
    pub plant_count: usize,
    pub watered_today: u32,
    pub fertilized_today: u32,
    pub harvested_today: u32,
}

#[derive(Debug, Serialize)]
pub struct GrowthResponse {
    pub summary: GardenSummary,
    pub last_7_days: Vec<DailyCarePoint>,
    pub weekly_totals: Vec<WeeklyCarePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_without_data_deserializes() {
        let envelope: ApiEnvelope<User> =
            serde_json::from_str(r#"{"status":"error","message":"bad credentials"}"#).unwrap();
        assert!(!envelope.is_success());
        assert_eq!(envelope.message, "bad credentials");
        assert!(envelope.data.is_none());
    }

    #[test]
    fn task_uses_camel_case_on_the_wire() {
        let task = Task {
            id: "t1".into(),
            user_id: "u1".into(),
            plant_id: "p1".into(),
            kind: "water".into(),
            description: "Water the basil".into(),
            due_date: "2026-01-05".into(),
            completed: false,
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["plantId"], "p1");
        assert_eq!(value["dueDate"], "2026-01-05");
        assert_eq!(value["type"], "water");
    }

    #[test]
    fn flipping_a_status_touches_one_flag() {
        let status = PlantStatus {
            watered: true,
            fertilized: false,
            harvested: false,
        };
        let flipped = status.flipped(StatusField::Fertilized);
        assert!(flipped.watered);
        assert!(flipped.fertilized);
        assert!(!flipped.harvested);
        assert_eq!(flipped.flipped(StatusField::Fertilized), status);
    }

    #[test]
    fn status_field_parses_form_values() {
        assert_eq!("harvested".parse::<StatusField>(), Ok(StatusField::Harvested));
        assert!("pruned".parse::<StatusField>().is_err());
    }
}
