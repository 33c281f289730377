//! Video models for the API service

use serde::{Deserialize, Serialize};

use super::{music::MusicInfo, user::Author};

/// Opaque media reference; URLs are passed through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Media {
    pub uri: String,
    pub url_list: Vec<String>,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlayAddr {
    pub uri: String,
    pub url_list: Vec<String>,
    pub width: i32,
    pub height: i32,
    pub data_size: i64,
    pub file_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VideoMedia {
    pub play_addr: PlayAddr,
    pub cover: Media,
    pub width: i32,
    pub height: i32,
    pub ratio: String,
    pub duration: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Statistics {
    pub admire_count: i64,
    pub comment_count: i64,
    pub digg_count: i64,
    pub collect_count: i64,
    pub play_count: i64,
    pub share_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoStatus {
    pub is_delete: bool,
    pub allow_share: bool,
    pub is_prohibited: bool,
    pub in_reviewing: bool,
    pub private_status: i32,
}

impl Default for VideoStatus {
    fn default() -> Self {
        Self {
            is_delete: false,
            allow_share: true,
            is_prohibited: false,
            in_reviewing: false,
            private_status: 0,
        }
    }
}

/// Fully assembled video as returned by every video listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Video {
    pub aweme_id: String,
    pub desc: String,
    pub create_time: i64,
    pub duration: i32,
    #[serde(rename = "type")]
    pub video_type: String,
    pub author_user_id: String,
    pub share_url: String,
    pub is_top: bool,
    pub prevent_download: bool,
    pub music: MusicInfo,
    pub video: VideoMedia,
    pub statistics: Statistics,
    pub status: VideoStatus,
    pub author: Author,
}
