//! Data sources the feed is served from
//!
//! [`DataSource`] is the query interface the paginate routine consumes. It
//! is implemented by [`postgres::PgDataSource`] over the relational store
//! and by [`fixture::FixtureSource`] over static JSON files; callers never
//! know which one they hold.

use async_trait::async_trait;
use common::{error::DataSourceResult, pagination::PageWindow};

pub mod fixture;
pub mod postgres;
pub mod rows;

use rows::{
    AvatarRow, CommentRow, GoodRow, MediaRow, MusicRow, PlayAddrRow, PostRow, UserRow, VideoRow,
};

/// Stored `video_type` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoType {
    Recommend,
    Long,
    Private,
}

impl VideoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoType::Recommend => "recommend-video",
            VideoType::Long => "long-video",
            VideoType::Private => "private-video",
        }
    }
}

/// Which videos a listing covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoFilter {
    /// Every video of one type
    Feed(VideoType),
    /// Private videos uploaded by the given user
    PrivateOf(String),
    LikedBy(String),
    CollectedBy(String),
    /// Videos in the given user's watch history
    WatchedBy(String),
    AuthoredBy(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    /// Every user other than the given one
    FriendsOf(String),
}

/// Query interface over one backing store
///
/// Row queries return at most `window.count` rows starting at
/// `window.offset`, in the kind's stable order:
/// - videos: `create_time DESC, aweme_id ASC`
/// - comments: `create_time DESC, comment_id ASC` (top-level only)
/// - posts: `create_time DESC, post_id ASC`
/// - goods: `sale_count DESC, good_id ASC`
/// - users: `nickname ASC, uid ASC`
/// - music: `title ASC, id ASC`
///
/// Side lookups report "no rows" as `None` or an empty list, never as an
/// error.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_videos(
        &self,
        filter: &VideoFilter,
        window: PageWindow,
    ) -> DataSourceResult<Vec<VideoRow>>;

    async fn count_videos(&self, filter: &VideoFilter) -> DataSourceResult<i64>;

    /// Top-level comments on the video with the given aweme id
    async fn fetch_comments(
        &self,
        aweme_id: &str,
        window: PageWindow,
    ) -> DataSourceResult<Vec<CommentRow>>;

    async fn count_comments(&self, aweme_id: &str) -> DataSourceResult<i64>;

    async fn fetch_posts(&self, window: PageWindow) -> DataSourceResult<Vec<PostRow>>;

    async fn count_posts(&self) -> DataSourceResult<i64>;

    async fn fetch_goods(&self, window: PageWindow) -> DataSourceResult<Vec<GoodRow>>;

    async fn count_goods(&self) -> DataSourceResult<i64>;

    async fn fetch_users(
        &self,
        filter: &UserFilter,
        window: PageWindow,
    ) -> DataSourceResult<Vec<UserRow>>;

    async fn count_users(&self, filter: &UserFilter) -> DataSourceResult<i64>;

    /// Music collected by the given user
    async fn fetch_collected_music(
        &self,
        uid: &str,
        window: PageWindow,
    ) -> DataSourceResult<Vec<MusicRow>>;

    async fn count_collected_music(&self, uid: &str) -> DataSourceResult<i64>;

    async fn find_user(&self, uid: &str) -> DataSourceResult<Option<UserRow>>;

    /// Avatar rows of a user, any subset of the two sizes
    async fn avatars(&self, uid: &str) -> DataSourceResult<Vec<AvatarRow>>;

    async fn video_cover(&self, video_id: i64) -> DataSourceResult<Option<MediaRow>>;

    async fn video_play_addr(&self, video_id: i64) -> DataSourceResult<Option<PlayAddrRow>>;

    async fn video_music(&self, video_id: i64) -> DataSourceResult<Option<MusicRow>>;

    async fn post_images(&self, post_id: i64) -> DataSourceResult<Vec<String>>;

    /// Direct replies to a comment, newest first
    async fn comment_replies(&self, comment_id: &str) -> DataSourceResult<Vec<CommentRow>>;

    async fn health_check(&self) -> DataSourceResult<bool>;
}
