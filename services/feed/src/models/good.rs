use serde::{Deserialize, Serialize};

/// Shop item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Good {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub sale_count: i64,
}
