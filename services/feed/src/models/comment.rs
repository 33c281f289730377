use serde::{Deserialize, Serialize};

use super::user::Author;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub user: Author,
    pub create_time: i64,
    pub digg_count: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply_comment: Vec<Comment>,
}
