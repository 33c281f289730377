use serde::{Deserialize, Serialize};

use super::user::Author;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub author: Author,
    pub create_time: i64,
    pub digg_count: i64,
    pub comment_count: i64,
    pub share_count: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}
