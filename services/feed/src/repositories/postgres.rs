//! PostgreSQL data source
//!
//! Every statement runs under the configured per-query bound; an elapsed
//! bound surfaces as `DataSourceError::Timeout`.

use async_trait::async_trait;
use common::{
    database::{bounded, health_check},
    error::DataSourceResult,
    pagination::PageWindow,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::debug;

use super::{
    DataSource, UserFilter, VideoFilter, VideoType,
    rows::{
        AvatarRow, CommentRow, GoodRow, MediaRow, MusicRow, PlayAddrRow, PostRow, UserRow,
        VideoRow,
    },
};

const VIDEO_SELECT: &str = r#"
    SELECT v.id, v.aweme_id, v.video_desc, v.create_time, v.duration, v.video_type,
           v.author_user_id, v.share_url, v.is_top, v.prevent_download,
           u.uid AS author_uid, u.nickname AS author_nickname, u.gender AS author_gender,
           u.signature AS author_signature, u.unique_id AS author_unique_id,
           u.ip_location AS author_ip_location, u.follower_count AS author_follower_count,
           u.following_count AS author_following_count,
           u.total_favorited AS author_total_favorited, u.aweme_count AS author_aweme_count,
           vs.comment_count, vs.digg_count, vs.collect_count, vs.share_count,
           vs.play_count, vs.admire_count,
           st.is_delete, st.allow_share, st.is_prohibited, st.in_reviewing, st.private_status
    FROM videos v
    LEFT JOIN users u ON v.author_user_id = u.uid
    LEFT JOIN video_statistics vs ON v.id = vs.video_id
    LEFT JOIN video_status st ON v.id = st.video_id
"#;

const USER_COLUMNS: &str = r#"
    uid, nickname, gender, signature, unique_id, ip_location,
    follower_count, following_count, total_favorited, aweme_count
"#;

const COMMENT_COLUMNS: &str =
    "c.comment_id, c.text, c.create_time, c.digg_count, c.user_uid, c.parent_id";

const MUSIC_COLUMNS: &str = r#"
    m.id, m.title, m.author, m.cover_url, m.play_url, m.duration,
    m.owner_id, m.owner_nickname, m.is_original
"#;

/// Data source backed by the relational store
#[derive(Clone)]
pub struct PgDataSource {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgDataSource {
    /// Create a new PostgreSQL data source
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

fn push_video_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &VideoFilter) {
    match filter {
        VideoFilter::Feed(video_type) => {
            builder
                .push(" WHERE v.video_type = ")
                .push_bind(video_type.as_str());
        }
        VideoFilter::PrivateOf(uid) => {
            builder
                .push(" WHERE v.video_type = ")
                .push_bind(VideoType::Private.as_str())
                .push(" AND v.author_user_id = ")
                .push_bind(uid.clone());
        }
        VideoFilter::AuthoredBy(uid) => {
            builder
                .push(" WHERE v.author_user_id = ")
                .push_bind(uid.clone());
        }
        VideoFilter::LikedBy(uid) => push_relation(builder, "user_like_videos", uid),
        VideoFilter::CollectedBy(uid) => push_relation(builder, "user_collect_videos", uid),
        VideoFilter::WatchedBy(uid) => push_relation(builder, "user_history_videos", uid),
    }
}

// EXISTS keeps one row per video however the relation table is keyed
fn push_relation(builder: &mut QueryBuilder<'_, Postgres>, table: &'static str, uid: &str) {
    builder
        .push(" WHERE EXISTS (SELECT 1 FROM ")
        .push(table)
        .push(" r WHERE r.video_id = v.id AND r.user_uid = ")
        .push_bind(uid.to_string())
        .push(")");
}

fn push_window(builder: &mut QueryBuilder<'_, Postgres>, window: PageWindow) {
    builder
        .push(" LIMIT ")
        .push_bind(window.count)
        .push(" OFFSET ")
        .push_bind(window.offset);
}

#[async_trait]
impl DataSource for PgDataSource {
    async fn fetch_videos(
        &self,
        filter: &VideoFilter,
        window: PageWindow,
    ) -> DataSourceResult<Vec<VideoRow>> {
        debug!("Fetching videos {:?} at {:?}", filter, window);

        let mut builder = QueryBuilder::<Postgres>::new(VIDEO_SELECT);
        push_video_filter(&mut builder, filter);
        builder.push(" ORDER BY v.create_time DESC, v.aweme_id ASC");
        push_window(&mut builder, window);

        bounded(
            self.query_timeout,
            builder.build_query_as::<VideoRow>().fetch_all(&self.pool),
        )
        .await
    }

    async fn count_videos(&self, filter: &VideoFilter) -> DataSourceResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM videos v");
        push_video_filter(&mut builder, filter);

        bounded(
            self.query_timeout,
            builder.build_query_scalar::<i64>().fetch_one(&self.pool),
        )
        .await
    }

    async fn fetch_comments(
        &self,
        aweme_id: &str,
        window: PageWindow,
    ) -> DataSourceResult<Vec<CommentRow>> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            JOIN videos v ON c.video_id = v.id
            WHERE v.aweme_id = $1 AND c.parent_id IS NULL
            ORDER BY c.create_time DESC, c.comment_id ASC
            LIMIT $2 OFFSET $3
            "#
        );

        bounded(
            self.query_timeout,
            sqlx::query_as::<_, CommentRow>(&sql)
                .bind(aweme_id)
                .bind(window.count)
                .bind(window.offset)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn count_comments(&self, aweme_id: &str) -> DataSourceResult<i64> {
        bounded(
            self.query_timeout,
            sqlx::query_scalar(
                r#"
                SELECT COUNT(*)
                FROM comments c
                JOIN videos v ON c.video_id = v.id
                WHERE v.aweme_id = $1 AND c.parent_id IS NULL
                "#,
            )
            .bind(aweme_id)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn fetch_posts(&self, window: PageWindow) -> DataSourceResult<Vec<PostRow>> {
        bounded(
            self.query_timeout,
            sqlx::query_as::<_, PostRow>(
                r#"
                SELECT p.id, p.post_id, p.post_text, p.create_time, p.digg_count,
                       p.comment_count, p.share_count, u.uid AS author_uid
                FROM posts p
                LEFT JOIN users u ON p.author_id = u.id
                ORDER BY p.create_time DESC, p.post_id ASC
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(window.count)
            .bind(window.offset)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn count_posts(&self) -> DataSourceResult<i64> {
        bounded(
            self.query_timeout,
            sqlx::query_scalar("SELECT COUNT(*) FROM posts").fetch_one(&self.pool),
        )
        .await
    }

    async fn fetch_goods(&self, window: PageWindow) -> DataSourceResult<Vec<GoodRow>> {
        bounded(
            self.query_timeout,
            sqlx::query_as::<_, GoodRow>(
                r#"
                SELECT good_id, title, description, price, image, sale_count
                FROM goods
                ORDER BY sale_count DESC, good_id ASC
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(window.count)
            .bind(window.offset)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn count_goods(&self) -> DataSourceResult<i64> {
        bounded(
            self.query_timeout,
            sqlx::query_scalar("SELECT COUNT(*) FROM goods").fetch_one(&self.pool),
        )
        .await
    }

    async fn fetch_users(
        &self,
        filter: &UserFilter,
        window: PageWindow,
    ) -> DataSourceResult<Vec<UserRow>> {
        let UserFilter::FriendsOf(uid) = filter;
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE uid <> $1
            ORDER BY nickname ASC, uid ASC
            LIMIT $2 OFFSET $3
            "#
        );

        bounded(
            self.query_timeout,
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(uid)
                .bind(window.count)
                .bind(window.offset)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn count_users(&self, filter: &UserFilter) -> DataSourceResult<i64> {
        let UserFilter::FriendsOf(uid) = filter;

        bounded(
            self.query_timeout,
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE uid <> $1")
                .bind(uid)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn fetch_collected_music(
        &self,
        uid: &str,
        window: PageWindow,
    ) -> DataSourceResult<Vec<MusicRow>> {
        let sql = format!(
            r#"
            SELECT {MUSIC_COLUMNS}
            FROM music m
            JOIN user_collect_music ucm ON ucm.music_id = m.id
            WHERE ucm.user_uid = $1
            ORDER BY m.title ASC, m.id ASC
            LIMIT $2 OFFSET $3
            "#
        );

        bounded(
            self.query_timeout,
            sqlx::query_as::<_, MusicRow>(&sql)
                .bind(uid)
                .bind(window.count)
                .bind(window.offset)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn count_collected_music(&self, uid: &str) -> DataSourceResult<i64> {
        bounded(
            self.query_timeout,
            sqlx::query_scalar("SELECT COUNT(*) FROM user_collect_music WHERE user_uid = $1")
                .bind(uid)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn find_user(&self, uid: &str) -> DataSourceResult<Option<UserRow>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE uid = $1");

        bounded(
            self.query_timeout,
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(uid)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn avatars(&self, uid: &str) -> DataSourceResult<Vec<AvatarRow>> {
        bounded(
            self.query_timeout,
            sqlx::query_as::<_, AvatarRow>(
                r#"
                SELECT cover_type, uri, url
                FROM cover_urls
                WHERE user_uid = $1
                  AND cover_type IN ('avatar_168x168', 'avatar_300x300')
                ORDER BY id
                "#,
            )
            .bind(uid)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn video_cover(&self, video_id: i64) -> DataSourceResult<Option<MediaRow>> {
        bounded(
            self.query_timeout,
            sqlx::query_as::<_, MediaRow>(
                r#"
                SELECT uri, url, width, height
                FROM video_covers
                WHERE video_id = $1
                ORDER BY id
                LIMIT 1
                "#,
            )
            .bind(video_id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn video_play_addr(&self, video_id: i64) -> DataSourceResult<Option<PlayAddrRow>> {
        bounded(
            self.query_timeout,
            sqlx::query_as::<_, PlayAddrRow>(
                r#"
                SELECT uri, url, width, height, data_size, file_hash
                FROM video_play_addresses
                WHERE video_id = $1
                ORDER BY id
                LIMIT 1
                "#,
            )
            .bind(video_id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn video_music(&self, video_id: i64) -> DataSourceResult<Option<MusicRow>> {
        let sql = format!(
            r#"
            SELECT {MUSIC_COLUMNS}
            FROM music m
            JOIN videos v ON v.music_id = m.id
            WHERE v.id = $1
            "#
        );

        bounded(
            self.query_timeout,
            sqlx::query_as::<_, MusicRow>(&sql)
                .bind(video_id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn post_images(&self, post_id: i64) -> DataSourceResult<Vec<String>> {
        bounded(
            self.query_timeout,
            sqlx::query_scalar("SELECT image_url FROM post_images WHERE post_id = $1 ORDER BY id")
                .bind(post_id)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn comment_replies(&self, comment_id: &str) -> DataSourceResult<Vec<CommentRow>> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            WHERE c.parent_id = $1
            ORDER BY c.create_time DESC, c.comment_id ASC
            "#
        );

        bounded(
            self.query_timeout,
            sqlx::query_as::<_, CommentRow>(&sql)
                .bind(comment_id)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn health_check(&self) -> DataSourceResult<bool> {
        health_check(&self.pool).await
    }
}
