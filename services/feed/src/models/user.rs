//! User-facing author profile, shared by videos, comments, posts and
//! friend lists

use serde::{Deserialize, Serialize};

pub const AVATAR_SMALL: i32 = 168;
pub const AVATAR_LARGE: i32 = 300;

/// One avatar variant. An absent avatar has an empty `url_list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Avatar {
    pub uri: String,
    pub url_list: Vec<String>,
    pub width: i32,
    pub height: i32,
}

impl Avatar {
    pub fn empty(size: i32) -> Self {
        Self {
            uri: String::new(),
            url_list: Vec::new(),
            width: size,
            height: size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub uid: String,
    pub nickname: String,
    pub gender: i32,
    pub signature: String,
    pub unique_id: String,
    pub ip_location: String,
    pub avatar_168x168: Avatar,
    pub avatar_300x300: Avatar,
    pub follower_count: i64,
    pub following_count: i64,
    pub total_favorited: i64,
    pub aweme_count: i64,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            uid: String::new(),
            nickname: String::new(),
            gender: 0,
            signature: String::new(),
            unique_id: String::new(),
            ip_location: String::new(),
            avatar_168x168: Avatar::empty(AVATAR_SMALL),
            avatar_300x300: Avatar::empty(AVATAR_LARGE),
            follower_count: 0,
            following_count: 0,
            total_favorited: 0,
            aweme_count: 0,
        }
    }
}
