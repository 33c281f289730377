//! Flat rows produced by a single query, before nested assembly
//!
//! Columns coming from LEFT JOINs are optional: a video without a
//! statistics row still yields a row, with `None` counts.

use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct VideoRow {
    pub id: i64,
    pub aweme_id: String,
    pub video_desc: String,
    pub create_time: i64,
    pub duration: i32,
    pub video_type: String,
    pub author_user_id: String,
    pub share_url: String,
    pub is_top: bool,
    pub prevent_download: bool,

    pub author_uid: Option<String>,
    pub author_nickname: Option<String>,
    pub author_gender: Option<i32>,
    pub author_signature: Option<String>,
    pub author_unique_id: Option<String>,
    pub author_ip_location: Option<String>,
    pub author_follower_count: Option<i64>,
    pub author_following_count: Option<i64>,
    pub author_total_favorited: Option<i64>,
    pub author_aweme_count: Option<i64>,

    pub comment_count: Option<i64>,
    pub digg_count: Option<i64>,
    pub collect_count: Option<i64>,
    pub share_count: Option<i64>,
    pub play_count: Option<i64>,
    pub admire_count: Option<i64>,

    pub is_delete: Option<bool>,
    pub allow_share: Option<bool>,
    pub is_prohibited: Option<bool>,
    pub in_reviewing: Option<bool>,
    pub private_status: Option<i32>,
}

impl VideoRow {
    /// The joined author columns, if the author exists
    pub fn author(&self) -> Option<UserRow> {
        let uid = self.author_uid.clone()?;
        Some(UserRow {
            uid,
            nickname: self.author_nickname.clone().unwrap_or_default(),
            gender: self.author_gender.unwrap_or_default(),
            signature: self.author_signature.clone().unwrap_or_default(),
            unique_id: self.author_unique_id.clone().unwrap_or_default(),
            ip_location: self.author_ip_location.clone().unwrap_or_default(),
            follower_count: self.author_follower_count.unwrap_or_default(),
            following_count: self.author_following_count.unwrap_or_default(),
            total_favorited: self.author_total_favorited.unwrap_or_default(),
            aweme_count: self.author_aweme_count.unwrap_or_default(),
        })
    }

    /// Copy an author's columns into this row, as the users join would
    pub fn with_author(mut self, author: &UserRow) -> Self {
        self.author_uid = Some(author.uid.clone());
        self.author_nickname = Some(author.nickname.clone());
        self.author_gender = Some(author.gender);
        self.author_signature = Some(author.signature.clone());
        self.author_unique_id = Some(author.unique_id.clone());
        self.author_ip_location = Some(author.ip_location.clone());
        self.author_follower_count = Some(author.follower_count);
        self.author_following_count = Some(author.following_count);
        self.author_total_favorited = Some(author.total_favorited);
        self.author_aweme_count = Some(author.aweme_count);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct UserRow {
    pub uid: String,
    pub nickname: String,
    pub gender: i32,
    pub signature: String,
    pub unique_id: String,
    pub ip_location: String,
    pub follower_count: i64,
    pub following_count: i64,
    pub total_favorited: i64,
    pub aweme_count: i64,
}

pub const AVATAR_SMALL_TYPE: &str = "avatar_168x168";
pub const AVATAR_LARGE_TYPE: &str = "avatar_300x300";

/// One row of `cover_urls`
#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct AvatarRow {
    pub cover_type: String,
    pub uri: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct MediaRow {
    pub uri: String,
    pub url: String,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct PlayAddrRow {
    pub uri: String,
    pub url: String,
    pub width: i32,
    pub height: i32,
    pub data_size: i64,
    pub file_hash: String,
}

#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct MusicRow {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub play_url: String,
    pub duration: i32,
    pub owner_id: String,
    pub owner_nickname: String,
    pub is_original: bool,
}

#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct CommentRow {
    pub comment_id: String,
    pub text: String,
    pub create_time: i64,
    pub digg_count: i64,
    pub user_uid: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub post_id: String,
    pub post_text: String,
    pub create_time: i64,
    pub digg_count: i64,
    pub comment_count: i64,
    pub share_count: i64,
    pub author_uid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct GoodRow {
    pub good_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub sale_count: i64,
}
