//! Resource descriptors and the generic paginate routine
//!
//! Each listing is one [`Resource`]: how to fetch a window of raw rows,
//! how to count the full matching set and how to turn one row into a
//! response record. [`paginate`] drives any of them the same way.

use async_trait::async_trait;
use common::{
    error::DataSourceResult,
    pagination::{Page, PageRequest, PageWindow},
};
use futures::future::try_join_all;
use tracing::warn;

use crate::{
    assembly,
    models::{comment::Comment, good::Good, music::Music, post::Post, user::Author, video::Video},
    repositories::{
        DataSource, UserFilter, VideoFilter,
        rows::{AvatarRow, CommentRow, GoodRow, MusicRow, PostRow, UserRow, VideoRow},
    },
};

/// One paginated listing over a data source
#[async_trait]
pub trait Resource: Send + Sync {
    type Filter: Send + Sync;
    type Row: Send;
    type Item: Send;

    /// Name used in logs
    const KIND: &'static str;

    async fn fetch(
        &self,
        source: &dyn DataSource,
        filter: &Self::Filter,
        window: PageWindow,
    ) -> DataSourceResult<Vec<Self::Row>>;

    async fn count(&self, source: &dyn DataSource, filter: &Self::Filter) -> DataSourceResult<i64>;

    /// Build the response record, running whatever side-lookups it needs
    async fn assemble(
        &self,
        source: &dyn DataSource,
        row: Self::Row,
    ) -> DataSourceResult<Self::Item>;
}

/// Fetch one page of `resource` with its total
///
/// The row fetch and the count run concurrently. A failed count is not
/// fatal: the total falls back to the rows seen so far. The reported
/// total is never smaller than `offset + rows` when rows were returned.
/// Records are assembled concurrently and keep the fetch order.
pub async fn paginate<R: Resource>(
    resource: &R,
    source: &dyn DataSource,
    filter: &R::Filter,
    request: PageRequest,
) -> DataSourceResult<Page<R::Item>> {
    let window = request.window();
    let (rows, counted) = tokio::join!(
        resource.fetch(source, filter, window),
        resource.count(source, filter)
    );
    let rows = rows?;

    let seen = if rows.is_empty() {
        0
    } else {
        window
            .offset
            .saturating_add(i64::try_from(rows.len()).unwrap_or(i64::MAX))
    };
    let total = match counted {
        Ok(total) => total.max(seen),
        Err(e) => {
            warn!(
                "Counting {} failed, reporting {} as total: {}",
                R::KIND,
                seen,
                e
            );
            seen
        }
    };

    let items = try_join_all(rows.into_iter().map(|row| resource.assemble(source, row))).await?;

    Ok(Page::new(request.page_no, total, items))
}

async fn avatars_of(
    source: &dyn DataSource,
    uid: Option<&str>,
) -> DataSourceResult<Vec<AvatarRow>> {
    match uid {
        Some(uid) if !uid.is_empty() => source.avatars(uid).await,
        _ => Ok(Vec::new()),
    }
}

async fn profile_rows(
    source: &dyn DataSource,
    uid: Option<&str>,
) -> DataSourceResult<(Option<UserRow>, Vec<AvatarRow>)> {
    match uid {
        Some(uid) if !uid.is_empty() => {
            tokio::try_join!(source.find_user(uid), source.avatars(uid))
        }
        _ => Ok((None, Vec::new())),
    }
}

/// The assembled profile of `uid`, if the user exists
pub async fn profile(source: &dyn DataSource, uid: &str) -> DataSourceResult<Option<Author>> {
    let (user, avatars) = profile_rows(source, Some(uid)).await?;
    Ok(user.map(|user| assembly::author(Some(&user), &avatars)))
}

pub struct Videos;

#[async_trait]
impl Resource for Videos {
    type Filter = VideoFilter;
    type Row = VideoRow;
    type Item = Video;

    const KIND: &'static str = "videos";

    async fn fetch(
        &self,
        source: &dyn DataSource,
        filter: &VideoFilter,
        window: PageWindow,
    ) -> DataSourceResult<Vec<VideoRow>> {
        source.fetch_videos(filter, window).await
    }

    async fn count(&self, source: &dyn DataSource, filter: &VideoFilter) -> DataSourceResult<i64> {
        source.count_videos(filter).await
    }

    async fn assemble(&self, source: &dyn DataSource, row: VideoRow) -> DataSourceResult<Video> {
        let (avatars, cover, play, track) = tokio::try_join!(
            avatars_of(source, row.author_uid.as_deref()),
            source.video_cover(row.id),
            source.video_play_addr(row.id),
            source.video_music(row.id),
        )?;

        Ok(assembly::video(row, &avatars, cover, play, track))
    }
}

/// Top-level comments on one video, each with its direct replies
pub struct Comments;

impl Comments {
    async fn reply(&self, source: &dyn DataSource, row: CommentRow) -> DataSourceResult<Comment> {
        let (user, avatars) = profile_rows(source, Some(row.user_uid.as_str())).await?;
        Ok(assembly::comment(row, user.as_ref(), &avatars, Vec::new()))
    }
}

#[async_trait]
impl Resource for Comments {
    /// aweme id of the video
    type Filter = String;
    type Row = CommentRow;
    type Item = Comment;

    const KIND: &'static str = "comments";

    async fn fetch(
        &self,
        source: &dyn DataSource,
        aweme_id: &String,
        window: PageWindow,
    ) -> DataSourceResult<Vec<CommentRow>> {
        source.fetch_comments(aweme_id, window).await
    }

    async fn count(&self, source: &dyn DataSource, aweme_id: &String) -> DataSourceResult<i64> {
        source.count_comments(aweme_id).await
    }

    async fn assemble(
        &self,
        source: &dyn DataSource,
        row: CommentRow,
    ) -> DataSourceResult<Comment> {
        let ((user, avatars), reply_rows) = tokio::try_join!(
            profile_rows(source, Some(row.user_uid.as_str())),
            source.comment_replies(&row.comment_id),
        )?;

        let replies =
            try_join_all(reply_rows.into_iter().map(|reply| self.reply(source, reply))).await?;

        Ok(assembly::comment(row, user.as_ref(), &avatars, replies))
    }
}

pub struct Posts;

#[async_trait]
impl Resource for Posts {
    type Filter = ();
    type Row = PostRow;
    type Item = Post;

    const KIND: &'static str = "posts";

    async fn fetch(
        &self,
        source: &dyn DataSource,
        _: &(),
        window: PageWindow,
    ) -> DataSourceResult<Vec<PostRow>> {
        source.fetch_posts(window).await
    }

    async fn count(&self, source: &dyn DataSource, _: &()) -> DataSourceResult<i64> {
        source.count_posts().await
    }

    async fn assemble(&self, source: &dyn DataSource, row: PostRow) -> DataSourceResult<Post> {
        let ((user, avatars), images) = tokio::try_join!(
            profile_rows(source, row.author_uid.as_deref()),
            source.post_images(row.id),
        )?;

        Ok(assembly::post(row, user.as_ref(), &avatars, images))
    }
}

pub struct Goods;

#[async_trait]
impl Resource for Goods {
    type Filter = ();
    type Row = GoodRow;
    type Item = Good;

    const KIND: &'static str = "goods";

    async fn fetch(
        &self,
        source: &dyn DataSource,
        _: &(),
        window: PageWindow,
    ) -> DataSourceResult<Vec<GoodRow>> {
        source.fetch_goods(window).await
    }

    async fn count(&self, source: &dyn DataSource, _: &()) -> DataSourceResult<i64> {
        source.count_goods().await
    }

    async fn assemble(&self, _: &dyn DataSource, row: GoodRow) -> DataSourceResult<Good> {
        Ok(assembly::good(row))
    }
}

pub struct Users;

#[async_trait]
impl Resource for Users {
    type Filter = UserFilter;
    type Row = UserRow;
    type Item = Author;

    const KIND: &'static str = "users";

    async fn fetch(
        &self,
        source: &dyn DataSource,
        filter: &UserFilter,
        window: PageWindow,
    ) -> DataSourceResult<Vec<UserRow>> {
        source.fetch_users(filter, window).await
    }

    async fn count(&self, source: &dyn DataSource, filter: &UserFilter) -> DataSourceResult<i64> {
        source.count_users(filter).await
    }

    async fn assemble(&self, source: &dyn DataSource, row: UserRow) -> DataSourceResult<Author> {
        let avatars = source.avatars(&row.uid).await?;
        Ok(assembly::author(Some(&row), &avatars))
    }
}

/// Music collected by one user
pub struct CollectedMusic;

#[async_trait]
impl Resource for CollectedMusic {
    /// uid of the collector
    type Filter = String;
    type Row = MusicRow;
    type Item = Music;

    const KIND: &'static str = "collected music";

    async fn fetch(
        &self,
        source: &dyn DataSource,
        uid: &String,
        window: PageWindow,
    ) -> DataSourceResult<Vec<MusicRow>> {
        source.fetch_collected_music(uid, window).await
    }

    async fn count(&self, source: &dyn DataSource, uid: &String) -> DataSourceResult<i64> {
        source.count_collected_music(uid).await
    }

    async fn assemble(&self, _: &dyn DataSource, row: MusicRow) -> DataSourceResult<Music> {
        Ok(assembly::music(row))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        models::{
            comment::Comment as CommentDoc,
            good::Good as GoodDoc,
            user::Author as AuthorDoc,
            video::Video as VideoDoc,
        },
        repositories::{
            VideoType,
            fixture::{FixtureDocuments, FixtureSource, FixtureTables},
            rows::{MediaRow, PlayAddrRow},
        },
    };
    use common::error::DataSourceError;
    use std::{collections::HashMap, time::Duration};

    pub(crate) fn goods(n: usize) -> Vec<GoodDoc> {
        (0..n)
            .map(|i| GoodDoc {
                id: format!("g{:02}", i),
                title: format!("item {}", i),
                sale_count: i64::try_from(i).unwrap() * 10,
                ..GoodDoc::default()
            })
            .collect()
    }

    pub(crate) fn videos(n: usize) -> Vec<VideoDoc> {
        (0..n)
            .map(|i| VideoDoc {
                aweme_id: format!("v{:04}", i),
                create_time: 1_700_000_000 + i64::try_from(i).unwrap(),
                video_type: VideoType::Recommend.as_str().to_string(),
                author_user_id: "u1".to_string(),
                author: AuthorDoc {
                    uid: "u1".to_string(),
                    nickname: "alice".to_string(),
                    ..AuthorDoc::default()
                },
                ..VideoDoc::default()
            })
            .collect()
    }

    pub(crate) fn fixture(documents: FixtureDocuments) -> FixtureSource {
        FixtureSource::from_tables(FixtureTables::from_documents(documents))
    }

    /// Fixture-backed source with injectable failures
    struct Flaky {
        inner: FixtureSource,
        fail_count: bool,
        fail_cover: bool,
    }

    fn timeout() -> DataSourceError {
        DataSourceError::Timeout(Duration::from_millis(5))
    }

    #[async_trait]
    impl DataSource for Flaky {
        async fn fetch_videos(
            &self,
            filter: &VideoFilter,
            window: PageWindow,
        ) -> DataSourceResult<Vec<VideoRow>> {
            self.inner.fetch_videos(filter, window).await
        }

        async fn count_videos(&self, filter: &VideoFilter) -> DataSourceResult<i64> {
            if self.fail_count {
                return Err(timeout());
            }
            self.inner.count_videos(filter).await
        }

        async fn fetch_comments(
            &self,
            aweme_id: &str,
            window: PageWindow,
        ) -> DataSourceResult<Vec<CommentRow>> {
            self.inner.fetch_comments(aweme_id, window).await
        }

        async fn count_comments(&self, aweme_id: &str) -> DataSourceResult<i64> {
            self.inner.count_comments(aweme_id).await
        }

        async fn fetch_posts(&self, window: PageWindow) -> DataSourceResult<Vec<PostRow>> {
            self.inner.fetch_posts(window).await
        }

        async fn count_posts(&self) -> DataSourceResult<i64> {
            self.inner.count_posts().await
        }

        async fn fetch_goods(&self, window: PageWindow) -> DataSourceResult<Vec<GoodRow>> {
            self.inner.fetch_goods(window).await
        }

        async fn count_goods(&self) -> DataSourceResult<i64> {
            if self.fail_count {
                return Err(timeout());
            }
            self.inner.count_goods().await
        }

        async fn fetch_users(
            &self,
            filter: &UserFilter,
            window: PageWindow,
        ) -> DataSourceResult<Vec<UserRow>> {
            self.inner.fetch_users(filter, window).await
        }

        async fn count_users(&self, filter: &UserFilter) -> DataSourceResult<i64> {
            self.inner.count_users(filter).await
        }

        async fn fetch_collected_music(
            &self,
            uid: &str,
            window: PageWindow,
        ) -> DataSourceResult<Vec<MusicRow>> {
            self.inner.fetch_collected_music(uid, window).await
        }

        async fn count_collected_music(&self, uid: &str) -> DataSourceResult<i64> {
            self.inner.count_collected_music(uid).await
        }

        async fn find_user(&self, uid: &str) -> DataSourceResult<Option<UserRow>> {
            self.inner.find_user(uid).await
        }

        async fn avatars(&self, uid: &str) -> DataSourceResult<Vec<AvatarRow>> {
            self.inner.avatars(uid).await
        }

        async fn video_cover(&self, video_id: i64) -> DataSourceResult<Option<MediaRow>> {
            if self.fail_cover {
                return Err(timeout());
            }
            self.inner.video_cover(video_id).await
        }

        async fn video_play_addr(&self, video_id: i64) -> DataSourceResult<Option<PlayAddrRow>> {
            self.inner.video_play_addr(video_id).await
        }

        async fn video_music(&self, video_id: i64) -> DataSourceResult<Option<MusicRow>> {
            self.inner.video_music(video_id).await
        }

        async fn post_images(&self, post_id: i64) -> DataSourceResult<Vec<String>> {
            self.inner.post_images(post_id).await
        }

        async fn comment_replies(&self, comment_id: &str) -> DataSourceResult<Vec<CommentRow>> {
            self.inner.comment_replies(comment_id).await
        }

        async fn health_check(&self) -> DataSourceResult<bool> {
            self.inner.health_check().await
        }
    }

    #[tokio::test]
    async fn second_page_is_truncated() {
        let source = fixture(FixtureDocuments {
            goods: goods(12),
            ..FixtureDocuments::default()
        });

        let page = paginate(&Goods, &source, &(), PageRequest::new(1, 10))
            .await
            .unwrap();

        assert_eq!(page.page_no, Some(1));
        assert_eq!(page.total, 12);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].id, "g00");
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_with_true_total() {
        let source = fixture(FixtureDocuments {
            goods: goods(12),
            ..FixtureDocuments::default()
        });

        let page = paginate(&Goods, &source, &(), PageRequest::new(5, 10))
            .await
            .unwrap();

        assert_eq!(page.total, 12);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn count_covers_every_window() {
        let source = fixture(FixtureDocuments {
            goods: goods(23),
            ..FixtureDocuments::default()
        });

        for page_no in 0..4 {
            for page_size in [1, 5, 10, 30] {
                let page = paginate(&Goods, &source, &(), PageRequest::new(page_no, page_size))
                    .await
                    .unwrap();
                assert!(page.total >= i64::try_from(page.items.len()).unwrap());
                assert!(page.items.len() <= usize::try_from(page_size).unwrap());
            }
        }
    }

    #[tokio::test]
    async fn recommended_feed_end_to_end() {
        let source = fixture(FixtureDocuments {
            videos: videos(844),
            ..FixtureDocuments::default()
        });

        let page = paginate(
            &Videos,
            &source,
            &VideoFilter::Feed(VideoType::Recommend),
            PageRequest::new(0, 10),
        )
        .await
        .unwrap();

        assert_eq!(page.total, 844);
        assert_eq!(page.items.len(), 10);
        assert!(
            page.items
                .windows(2)
                .all(|pair| pair[0].create_time > pair[1].create_time)
        );
        assert_eq!(page.items[0].aweme_id, "v0843");
        assert_eq!(page.items[0].author.nickname, "alice");
    }

    #[tokio::test]
    async fn failed_count_falls_back_to_rows_seen() {
        let source = Flaky {
            inner: fixture(FixtureDocuments {
                goods: goods(12),
                ..FixtureDocuments::default()
            }),
            fail_count: true,
            fail_cover: false,
        };

        let page = paginate(&Goods, &source, &(), PageRequest::new(1, 10))
            .await
            .unwrap();

        assert_eq!(page.total, 12);
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn side_lookup_failure_fails_the_page() {
        let source = Flaky {
            inner: fixture(FixtureDocuments {
                videos: videos(3),
                ..FixtureDocuments::default()
            }),
            fail_count: false,
            fail_cover: true,
        };

        let result = paginate(
            &Videos,
            &source,
            &VideoFilter::Feed(VideoType::Recommend),
            PageRequest::default(),
        )
        .await;

        assert!(matches!(result, Err(DataSourceError::Timeout(_))));
    }

    #[tokio::test]
    async fn comments_carry_their_replies() {
        let reply = CommentDoc {
            id: "c1-r".to_string(),
            text: "agreed".to_string(),
            user: AuthorDoc {
                uid: "u2".to_string(),
                nickname: "bob".to_string(),
                ..AuthorDoc::default()
            },
            create_time: 9,
            ..CommentDoc::default()
        };
        let top = CommentDoc {
            id: "c1".to_string(),
            text: "first".to_string(),
            create_time: 5,
            reply_comment: vec![reply],
            ..CommentDoc::default()
        };
        let source = fixture(FixtureDocuments {
            comments: HashMap::from([("v0001".to_string(), vec![top])]),
            ..FixtureDocuments::default()
        });

        let page = paginate(
            &Comments,
            &source,
            &"v0001".to_string(),
            PageRequest::default(),
        )
        .await
        .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].reply_comment.len(), 1);
        assert_eq!(page.items[0].reply_comment[0].user.nickname, "bob");
    }

    #[tokio::test]
    async fn profile_of_unknown_user_is_none() {
        let source = fixture(FixtureDocuments {
            videos: videos(1),
            ..FixtureDocuments::default()
        });

        assert!(profile(&source, "nobody").await.unwrap().is_none());
        let alice = profile(&source, "u1").await.unwrap().unwrap();
        assert_eq!(alice.nickname, "alice");
    }
}
