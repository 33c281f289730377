//! Static JSON fixture data source
//!
//! The fixture directory holds one document per collection, written in
//! the same JSON shapes the API returns:
//!
//! | file | shape |
//! |---|---|
//! | `videos.json` | `[Video]` |
//! | `users.json` | `[Author]` |
//! | `posts.json` | `[Post]` |
//! | `goods.json` | `[Good]` |
//! | `comments.json` | `{ "<aweme_id>": [Comment] }` |
//! | `music.json` | `[Music]` |
//! | `relations.json` | `{ likes, history, collects, collected_music }` keyed by user uid |
//!
//! Documents are read once, on first use, and decomposed into the same
//! raw rows the relational store yields so both sources share one
//! assembler. A missing file is an empty collection. Comment ids are
//! unique across all threads, as in the relational store; a repeated id
//! is dropped with a warning.

use async_trait::async_trait;
use common::{
    error::{DataSourceError, DataSourceResult},
    pagination::PageWindow,
};
use serde::{Deserialize, de::DeserializeOwned};
use std::{
    collections::{HashMap, HashSet},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{
    DataSource, UserFilter, VideoFilter, VideoType,
    rows::{
        AVATAR_LARGE_TYPE, AVATAR_SMALL_TYPE, AvatarRow, CommentRow, GoodRow, MediaRow, MusicRow,
        PlayAddrRow, PostRow, UserRow, VideoRow,
    },
};
use crate::models::{
    comment::Comment,
    good::Good,
    music::{Music, MusicInfo},
    post::Post,
    user::{Author, Avatar},
    video::{Media, PlayAddr, Video},
};

/// Per-user relation sets, keyed by user uid
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Relations {
    /// aweme ids liked by each user
    pub likes: HashMap<String, HashSet<String>>,
    /// aweme ids in each user's watch history
    pub history: HashMap<String, HashSet<String>>,
    /// aweme ids collected by each user
    pub collects: HashMap<String, HashSet<String>>,
    /// music ids collected by each user
    pub collected_music: HashMap<String, HashSet<i64>>,
}

/// Parsed fixture documents, before decomposition
#[derive(Debug, Clone, Default)]
pub struct FixtureDocuments {
    pub videos: Vec<Video>,
    pub users: Vec<Author>,
    pub posts: Vec<Post>,
    pub goods: Vec<Good>,
    pub comments: HashMap<String, Vec<Comment>>,
    pub music: Vec<Music>,
    pub relations: Relations,
}

impl FixtureDocuments {
    /// Read every collection from `dir`
    pub async fn load(dir: &Path) -> DataSourceResult<Self> {
        Ok(Self {
            videos: read_collection(dir, "videos.json").await?,
            users: read_collection(dir, "users.json").await?,
            posts: read_collection(dir, "posts.json").await?,
            goods: read_collection(dir, "goods.json").await?,
            comments: read_collection(dir, "comments.json").await?,
            music: read_collection(dir, "music.json").await?,
            relations: read_collection(dir, "relations.json").await?,
        })
    }
}

async fn read_collection<T>(dir: &Path, name: &str) -> DataSourceResult<T>
where
    T: DeserializeOwned + Default,
{
    let path = dir.join(name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|source| DataSourceError::FixtureFormat { path, source }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Fixture {} not found, serving it as empty", path.display());
            Ok(T::default())
        }
        Err(source) => Err(DataSourceError::FixtureIo { path, source }),
    }
}

/// Immutable in-memory tables, each already in its listing order
#[derive(Debug, Default)]
pub struct FixtureTables {
    videos: Vec<VideoRow>,
    covers: HashMap<i64, MediaRow>,
    play_addrs: HashMap<i64, PlayAddrRow>,
    video_music: HashMap<i64, MusicRow>,
    users: Vec<UserRow>,
    avatars: HashMap<String, Vec<AvatarRow>>,
    comments: HashMap<String, Vec<CommentRow>>,
    replies: HashMap<String, Vec<CommentRow>>,
    posts: Vec<PostRow>,
    post_images: HashMap<i64, Vec<String>>,
    goods: Vec<GoodRow>,
    music: Vec<MusicRow>,
    relations: Relations,
}

impl FixtureTables {
    /// Decompose documents into raw rows and side tables
    ///
    /// Surrogate ids for videos and posts are their 1-based position in
    /// the document. Authors embedded in videos, comments and posts join
    /// the user table unless `users.json` already lists them.
    pub fn from_documents(documents: FixtureDocuments) -> Self {
        let FixtureDocuments {
            videos,
            users,
            posts,
            goods,
            comments,
            music,
            relations,
        } = documents;

        let mut tables = Self {
            relations,
            ..Self::default()
        };
        let mut known_users = HashSet::new();
        let mut known_music = HashSet::new();

        for user in &users {
            tables.register_user(&mut known_users, user);
        }

        for entry in &music {
            if known_music.insert(entry.id) {
                tables.music.push(music_row(entry));
            }
        }

        for (index, video) in videos.iter().enumerate() {
            let id = surrogate_id(index);
            tables.register_user(&mut known_users, &video.author);

            let mut row = video_row(id, video);
            if let Some(author) = tables.users.iter().find(|u| u.uid == video.author_user_id) {
                row = row.with_author(author);
            }
            tables.videos.push(row);

            if let Some(cover) = media_row(&video.video.cover) {
                tables.covers.insert(id, cover);
            }
            if let Some(play) = play_addr_row(&video.video.play_addr) {
                tables.play_addrs.insert(id, play);
            }
            if let Some(track) = music_info_row(&video.music) {
                if known_music.insert(track.id) {
                    tables.music.push(track.clone());
                }
                tables.video_music.insert(id, track);
            }
        }

        // Threads in aweme id order so a duplicate comment id always
        // resolves to the same thread.
        let mut threads: Vec<_> = comments.iter().collect();
        threads.sort_by(|a, b| a.0.cmp(b.0));
        let mut known_comments = HashSet::new();
        for (aweme_id, thread) in threads {
            let mut top_level = Vec::with_capacity(thread.len());
            for comment in thread {
                if tables.register_comment(&mut known_users, &mut known_comments, comment, None) {
                    top_level.push(comment_row(comment, None));
                }
            }
            sort_comments(&mut top_level);
            tables.comments.insert(aweme_id.clone(), top_level);
        }

        for (index, post) in posts.iter().enumerate() {
            let id = surrogate_id(index);
            tables.register_user(&mut known_users, &post.author);
            tables.posts.push(post_row(id, post));
            if !post.images.is_empty() {
                tables.post_images.insert(id, post.images.clone());
            }
        }

        tables.goods = goods.iter().map(good_row).collect();

        tables.videos.sort_by(|a, b| {
            b.create_time
                .cmp(&a.create_time)
                .then_with(|| a.aweme_id.cmp(&b.aweme_id))
        });
        tables.users.sort_by(|a, b| {
            a.nickname
                .cmp(&b.nickname)
                .then_with(|| a.uid.cmp(&b.uid))
        });
        tables.posts.sort_by(|a, b| {
            b.create_time
                .cmp(&a.create_time)
                .then_with(|| a.post_id.cmp(&b.post_id))
        });
        tables.goods.sort_by(|a, b| {
            b.sale_count
                .cmp(&a.sale_count)
                .then_with(|| a.good_id.cmp(&b.good_id))
        });
        tables
            .music
            .sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        for replies in tables.replies.values_mut() {
            sort_comments(replies);
        }

        tables
    }

    fn register_user(&mut self, known: &mut HashSet<String>, author: &Author) {
        if author.uid.is_empty() || !known.insert(author.uid.clone()) {
            return;
        }

        let avatars: Vec<AvatarRow> = [
            (AVATAR_SMALL_TYPE, &author.avatar_168x168),
            (AVATAR_LARGE_TYPE, &author.avatar_300x300),
        ]
        .into_iter()
        .filter_map(|(cover_type, avatar)| avatar_row(cover_type, avatar))
        .collect();

        if !avatars.is_empty() {
            self.avatars.insert(author.uid.clone(), avatars);
        }
        self.users.push(user_row(author));
    }

    /// Register a comment and its reply subtree
    ///
    /// Comment ids are unique across every thread. A comment whose id was
    /// already registered is skipped along with its replies and `false`
    /// is returned.
    fn register_comment(
        &mut self,
        known_users: &mut HashSet<String>,
        known_comments: &mut HashSet<String>,
        comment: &Comment,
        parent: Option<&str>,
    ) -> bool {
        if !known_comments.insert(comment.id.clone()) {
            warn!("Skipping duplicate comment id {}", comment.id);
            return false;
        }

        self.register_user(known_users, &comment.user);
        if let Some(parent) = parent {
            self.replies
                .entry(parent.to_string())
                .or_default()
                .push(comment_row(comment, Some(parent)));
        }
        for reply in &comment.reply_comment {
            self.register_comment(known_users, known_comments, reply, Some(&comment.id));
        }
        true
    }

    fn matching_videos(&self, filter: &VideoFilter) -> Vec<&VideoRow> {
        self.videos
            .iter()
            .filter(|row| self.video_matches(filter, row))
            .collect()
    }

    fn video_matches(&self, filter: &VideoFilter, row: &VideoRow) -> bool {
        let related = |sets: &HashMap<String, HashSet<String>>, uid: &str| {
            sets.get(uid)
                .is_some_and(|ids| ids.contains(&row.aweme_id))
        };

        match filter {
            VideoFilter::Feed(video_type) => row.video_type == video_type.as_str(),
            VideoFilter::PrivateOf(uid) => {
                row.video_type == VideoType::Private.as_str() && row.author_user_id == *uid
            }
            VideoFilter::AuthoredBy(uid) => row.author_user_id == *uid,
            VideoFilter::LikedBy(uid) => related(&self.relations.likes, uid),
            VideoFilter::CollectedBy(uid) => related(&self.relations.collects, uid),
            VideoFilter::WatchedBy(uid) => related(&self.relations.history, uid),
        }
    }

    fn matching_users(&self, filter: &UserFilter) -> Vec<&UserRow> {
        let UserFilter::FriendsOf(uid) = filter;
        self.users.iter().filter(|row| row.uid != *uid).collect()
    }

    fn collected_music(&self, uid: &str) -> Vec<&MusicRow> {
        match self.relations.collected_music.get(uid) {
            Some(ids) => self.music.iter().filter(|m| ids.contains(&m.id)).collect(),
            None => Vec::new(),
        }
    }

    fn top_level_comments(&self, aweme_id: &str) -> &[CommentRow] {
        self.comments
            .get(aweme_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn surrogate_id(index: usize) -> i64 {
    i64::try_from(index).map_or(i64::MAX, |i| i.saturating_add(1))
}

fn count_of(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

fn sort_comments(rows: &mut [CommentRow]) {
    rows.sort_by(|a, b| {
        b.create_time
            .cmp(&a.create_time)
            .then_with(|| a.comment_id.cmp(&b.comment_id))
    });
}

fn first_url(urls: &[String]) -> String {
    urls.first().cloned().unwrap_or_default()
}

fn user_row(author: &Author) -> UserRow {
    UserRow {
        uid: author.uid.clone(),
        nickname: author.nickname.clone(),
        gender: author.gender,
        signature: author.signature.clone(),
        unique_id: author.unique_id.clone(),
        ip_location: author.ip_location.clone(),
        follower_count: author.follower_count,
        following_count: author.following_count,
        total_favorited: author.total_favorited,
        aweme_count: author.aweme_count,
    }
}

fn avatar_row(cover_type: &str, avatar: &Avatar) -> Option<AvatarRow> {
    if avatar.uri.is_empty() && avatar.url_list.is_empty() {
        return None;
    }
    Some(AvatarRow {
        cover_type: cover_type.to_string(),
        uri: avatar.uri.clone(),
        url: first_url(&avatar.url_list),
    })
}

fn video_row(id: i64, video: &Video) -> VideoRow {
    VideoRow {
        id,
        aweme_id: video.aweme_id.clone(),
        video_desc: video.desc.clone(),
        create_time: video.create_time,
        duration: video.duration,
        video_type: video.video_type.clone(),
        author_user_id: video.author_user_id.clone(),
        share_url: video.share_url.clone(),
        is_top: video.is_top,
        prevent_download: video.prevent_download,
        comment_count: Some(video.statistics.comment_count),
        digg_count: Some(video.statistics.digg_count),
        collect_count: Some(video.statistics.collect_count),
        share_count: Some(video.statistics.share_count),
        play_count: Some(video.statistics.play_count),
        admire_count: Some(video.statistics.admire_count),
        is_delete: Some(video.status.is_delete),
        allow_share: Some(video.status.allow_share),
        is_prohibited: Some(video.status.is_prohibited),
        in_reviewing: Some(video.status.in_reviewing),
        private_status: Some(video.status.private_status),
        ..VideoRow::default()
    }
}

fn media_row(media: &Media) -> Option<MediaRow> {
    if media.uri.is_empty() && media.url_list.is_empty() {
        return None;
    }
    Some(MediaRow {
        uri: media.uri.clone(),
        url: first_url(&media.url_list),
        width: media.width,
        height: media.height,
    })
}

fn play_addr_row(play: &PlayAddr) -> Option<PlayAddrRow> {
    if play.uri.is_empty() && play.url_list.is_empty() {
        return None;
    }
    Some(PlayAddrRow {
        uri: play.uri.clone(),
        url: first_url(&play.url_list),
        width: play.width,
        height: play.height,
        data_size: play.data_size,
        file_hash: play.file_hash.clone(),
    })
}

fn music_info_row(info: &MusicInfo) -> Option<MusicRow> {
    if info.id == 0 && info.title.is_empty() {
        return None;
    }
    Some(MusicRow {
        id: info.id,
        title: info.title.clone(),
        author: info.author.clone(),
        cover_url: first_url(&info.cover_medium.url_list),
        play_url: first_url(&info.play_url.url_list),
        duration: info.duration,
        owner_id: info.owner_id.clone(),
        owner_nickname: info.owner_nickname.clone(),
        is_original: info.is_original,
    })
}

fn music_row(music: &Music) -> MusicRow {
    MusicRow {
        id: music.id,
        title: music.title.clone(),
        author: music.artist.clone(),
        cover_url: music.cover.clone(),
        play_url: music.play_url.clone(),
        duration: music.duration,
        ..MusicRow::default()
    }
}

fn comment_row(comment: &Comment, parent: Option<&str>) -> CommentRow {
    CommentRow {
        comment_id: comment.id.clone(),
        text: comment.text.clone(),
        create_time: comment.create_time,
        digg_count: comment.digg_count,
        user_uid: comment.user.uid.clone(),
        parent_id: parent.map(str::to_string),
    }
}

fn post_row(id: i64, post: &Post) -> PostRow {
    PostRow {
        id,
        post_id: post.id.clone(),
        post_text: post.text.clone(),
        create_time: post.create_time,
        digg_count: post.digg_count,
        comment_count: post.comment_count,
        share_count: post.share_count,
        author_uid: Some(post.author.uid.clone()).filter(|uid| !uid.is_empty()),
    }
}

fn good_row(good: &Good) -> GoodRow {
    GoodRow {
        good_id: good.id.clone(),
        title: good.title.clone(),
        description: good.description.clone(),
        price: good.price,
        image: good.image.clone(),
        sale_count: good.sale_count,
    }
}

/// Data source over a directory of fixture documents
pub struct FixtureSource {
    dir: PathBuf,
    tables: OnceCell<FixtureTables>,
}

impl FixtureSource {
    /// Source reading from `dir` on first use
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tables: OnceCell::new(),
        }
    }

    /// Source over tables that are already decomposed
    pub fn from_tables(tables: FixtureTables) -> Self {
        Self {
            dir: PathBuf::new(),
            tables: OnceCell::new_with(Some(tables)),
        }
    }

    async fn tables(&self) -> DataSourceResult<&FixtureTables> {
        self.tables
            .get_or_try_init(|| async {
                let documents = FixtureDocuments::load(&self.dir).await?;
                let tables = FixtureTables::from_documents(documents);
                info!(
                    "Loaded fixtures from {}: {} videos, {} users, {} posts, {} goods",
                    self.dir.display(),
                    tables.videos.len(),
                    tables.users.len(),
                    tables.posts.len(),
                    tables.goods.len()
                );
                Ok::<_, DataSourceError>(tables)
            })
            .await
    }
}

fn window_of<T: Clone>(rows: &[T], window: PageWindow) -> Vec<T> {
    window.slice(rows).to_vec()
}

fn window_of_refs<T: Clone>(rows: &[&T], window: PageWindow) -> Vec<T> {
    window.slice(rows).iter().map(|row| (*row).clone()).collect()
}

#[async_trait]
impl DataSource for FixtureSource {
    async fn fetch_videos(
        &self,
        filter: &VideoFilter,
        window: PageWindow,
    ) -> DataSourceResult<Vec<VideoRow>> {
        let tables = self.tables().await?;
        Ok(window_of_refs(&tables.matching_videos(filter), window))
    }

    async fn count_videos(&self, filter: &VideoFilter) -> DataSourceResult<i64> {
        let tables = self.tables().await?;
        Ok(count_of(tables.matching_videos(filter).len()))
    }

    async fn fetch_comments(
        &self,
        aweme_id: &str,
        window: PageWindow,
    ) -> DataSourceResult<Vec<CommentRow>> {
        let tables = self.tables().await?;
        Ok(window_of(tables.top_level_comments(aweme_id), window))
    }

    async fn count_comments(&self, aweme_id: &str) -> DataSourceResult<i64> {
        let tables = self.tables().await?;
        Ok(count_of(tables.top_level_comments(aweme_id).len()))
    }

    async fn fetch_posts(&self, window: PageWindow) -> DataSourceResult<Vec<PostRow>> {
        let tables = self.tables().await?;
        Ok(window_of(&tables.posts, window))
    }

    async fn count_posts(&self) -> DataSourceResult<i64> {
        Ok(count_of(self.tables().await?.posts.len()))
    }

    async fn fetch_goods(&self, window: PageWindow) -> DataSourceResult<Vec<GoodRow>> {
        let tables = self.tables().await?;
        Ok(window_of(&tables.goods, window))
    }

    async fn count_goods(&self) -> DataSourceResult<i64> {
        Ok(count_of(self.tables().await?.goods.len()))
    }

    async fn fetch_users(
        &self,
        filter: &UserFilter,
        window: PageWindow,
    ) -> DataSourceResult<Vec<UserRow>> {
        let tables = self.tables().await?;
        Ok(window_of_refs(&tables.matching_users(filter), window))
    }

    async fn count_users(&self, filter: &UserFilter) -> DataSourceResult<i64> {
        let tables = self.tables().await?;
        Ok(count_of(tables.matching_users(filter).len()))
    }

    async fn fetch_collected_music(
        &self,
        uid: &str,
        window: PageWindow,
    ) -> DataSourceResult<Vec<MusicRow>> {
        let tables = self.tables().await?;
        Ok(window_of_refs(&tables.collected_music(uid), window))
    }

    async fn count_collected_music(&self, uid: &str) -> DataSourceResult<i64> {
        let tables = self.tables().await?;
        Ok(count_of(tables.collected_music(uid).len()))
    }

    async fn find_user(&self, uid: &str) -> DataSourceResult<Option<UserRow>> {
        let tables = self.tables().await?;
        Ok(tables.users.iter().find(|row| row.uid == uid).cloned())
    }

    async fn avatars(&self, uid: &str) -> DataSourceResult<Vec<AvatarRow>> {
        let tables = self.tables().await?;
        Ok(tables.avatars.get(uid).cloned().unwrap_or_default())
    }

    async fn video_cover(&self, video_id: i64) -> DataSourceResult<Option<MediaRow>> {
        Ok(self.tables().await?.covers.get(&video_id).cloned())
    }

    async fn video_play_addr(&self, video_id: i64) -> DataSourceResult<Option<PlayAddrRow>> {
        Ok(self.tables().await?.play_addrs.get(&video_id).cloned())
    }

    async fn video_music(&self, video_id: i64) -> DataSourceResult<Option<MusicRow>> {
        Ok(self.tables().await?.video_music.get(&video_id).cloned())
    }

    async fn post_images(&self, post_id: i64) -> DataSourceResult<Vec<String>> {
        let tables = self.tables().await?;
        Ok(tables.post_images.get(&post_id).cloned().unwrap_or_default())
    }

    async fn comment_replies(&self, comment_id: &str) -> DataSourceResult<Vec<CommentRow>> {
        let tables = self.tables().await?;
        Ok(tables.replies.get(comment_id).cloned().unwrap_or_default())
    }

    async fn health_check(&self) -> DataSourceResult<bool> {
        self.tables().await.map(|_| true)
    }
}
