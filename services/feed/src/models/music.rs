//! Music entries: the compact form listed in a user's collection and the
//! detailed form embedded in a video

use serde::{Deserialize, Serialize};

use super::video::Media;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Music {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub cover: String,
    pub play_url: String,
    pub duration: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MusicInfo {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub cover_medium: Media,
    pub cover_thumb: Media,
    pub play_url: Media,
    pub duration: i32,
    pub owner_id: String,
    pub owner_nickname: String,
    pub is_original: bool,
}
