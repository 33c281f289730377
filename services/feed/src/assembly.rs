//! Mapping of raw rows plus side-lookup results into response records
//!
//! Every function here is pure. An absent lookup yields an empty but
//! well-formed sub-object: empty `url_list`, zero counts, default status.

use crate::{
    models::{
        comment::Comment,
        good::Good,
        music::{Music, MusicInfo},
        post::Post,
        user::{AVATAR_LARGE, AVATAR_SMALL, Author, Avatar},
        video::{Media, PlayAddr, Statistics, Video, VideoMedia, VideoStatus},
    },
    repositories::rows::{
        AVATAR_LARGE_TYPE, AVATAR_SMALL_TYPE, AvatarRow, CommentRow, GoodRow, MediaRow, MusicRow,
        PlayAddrRow, PostRow, UserRow, VideoRow,
    },
};

/// Rendition label reported for every video
pub const DEFAULT_RATIO: &str = "540p";

fn url_list(url: &str) -> Vec<String> {
    if url.is_empty() {
        Vec::new()
    } else {
        vec![url.to_string()]
    }
}

/// The avatar of `cover_type` among `rows`, or an empty one of `size`
pub fn avatar(rows: &[AvatarRow], cover_type: &str, size: i32) -> Avatar {
    match rows.iter().find(|row| row.cover_type == cover_type) {
        Some(row) => Avatar {
            uri: row.uri.clone(),
            url_list: url_list(&row.url),
            width: size,
            height: size,
        },
        None => Avatar::empty(size),
    }
}

pub fn author(user: Option<&UserRow>, avatars: &[AvatarRow]) -> Author {
    let mut author = match user {
        Some(user) => Author {
            uid: user.uid.clone(),
            nickname: user.nickname.clone(),
            gender: user.gender,
            signature: user.signature.clone(),
            unique_id: user.unique_id.clone(),
            ip_location: user.ip_location.clone(),
            follower_count: user.follower_count,
            following_count: user.following_count,
            total_favorited: user.total_favorited,
            aweme_count: user.aweme_count,
            ..Author::default()
        },
        None => Author::default(),
    };

    author.avatar_168x168 = avatar(avatars, AVATAR_SMALL_TYPE, AVATAR_SMALL);
    author.avatar_300x300 = avatar(avatars, AVATAR_LARGE_TYPE, AVATAR_LARGE);
    author
}

fn media(row: Option<MediaRow>) -> Media {
    row.map(|row| Media {
        uri: row.uri,
        url_list: url_list(&row.url),
        width: row.width,
        height: row.height,
    })
    .unwrap_or_default()
}

fn play_addr(row: Option<PlayAddrRow>) -> PlayAddr {
    row.map(|row| PlayAddr {
        uri: row.uri,
        url_list: url_list(&row.url),
        width: row.width,
        height: row.height,
        data_size: row.data_size,
        file_hash: row.file_hash,
    })
    .unwrap_or_default()
}

/// Detailed music entry embedded in a video
pub fn music_track(row: Option<MusicRow>) -> MusicInfo {
    let Some(row) = row else {
        return MusicInfo::default();
    };

    let cover = Media {
        url_list: url_list(&row.cover_url),
        ..Media::default()
    };

    MusicInfo {
        id: row.id,
        title: row.title,
        author: row.author,
        cover_medium: cover.clone(),
        cover_thumb: cover,
        play_url: Media {
            url_list: url_list(&row.play_url),
            ..Media::default()
        },
        duration: row.duration,
        owner_id: row.owner_id,
        owner_nickname: row.owner_nickname,
        is_original: row.is_original,
    }
}

/// Compact music entry listed in a user's collection
pub fn music(row: MusicRow) -> Music {
    Music {
        id: row.id,
        title: row.title,
        artist: row.author,
        cover: row.cover_url,
        play_url: row.play_url,
        duration: row.duration,
    }
}

pub fn video(
    row: VideoRow,
    avatars: &[AvatarRow],
    cover: Option<MediaRow>,
    play: Option<PlayAddrRow>,
    track: Option<MusicRow>,
) -> Video {
    let mut uploader = author(row.author().as_ref(), avatars);
    if uploader.uid.is_empty() {
        uploader.uid = row.author_user_id.clone();
    }

    let play_addr = play_addr(play);
    let status_defaults = VideoStatus::default();

    Video {
        statistics: Statistics {
            admire_count: row.admire_count.unwrap_or_default(),
            comment_count: row.comment_count.unwrap_or_default(),
            digg_count: row.digg_count.unwrap_or_default(),
            collect_count: row.collect_count.unwrap_or_default(),
            play_count: row.play_count.unwrap_or_default(),
            share_count: row.share_count.unwrap_or_default(),
        },
        status: VideoStatus {
            is_delete: row.is_delete.unwrap_or(status_defaults.is_delete),
            allow_share: row.allow_share.unwrap_or(status_defaults.allow_share),
            is_prohibited: row.is_prohibited.unwrap_or(status_defaults.is_prohibited),
            in_reviewing: row.in_reviewing.unwrap_or(status_defaults.in_reviewing),
            private_status: row.private_status.unwrap_or(status_defaults.private_status),
        },
        video: VideoMedia {
            width: play_addr.width,
            height: play_addr.height,
            play_addr,
            cover: media(cover),
            ratio: DEFAULT_RATIO.to_string(),
            duration: row.duration,
        },
        music: music_track(track),
        author: uploader,
        aweme_id: row.aweme_id,
        desc: row.video_desc,
        create_time: row.create_time,
        duration: row.duration,
        video_type: row.video_type,
        author_user_id: row.author_user_id,
        share_url: row.share_url,
        is_top: row.is_top,
        prevent_download: row.prevent_download,
    }
}

pub fn comment(
    row: CommentRow,
    user: Option<&UserRow>,
    avatars: &[AvatarRow],
    replies: Vec<Comment>,
) -> Comment {
    let mut commenter = author(user, avatars);
    if commenter.uid.is_empty() {
        commenter.uid = row.user_uid;
    }

    Comment {
        id: row.comment_id,
        text: row.text,
        user: commenter,
        create_time: row.create_time,
        digg_count: row.digg_count,
        reply_comment: replies,
    }
}

pub fn post(
    row: PostRow,
    user: Option<&UserRow>,
    avatars: &[AvatarRow],
    images: Vec<String>,
) -> Post {
    Post {
        id: row.post_id,
        text: row.post_text,
        author: author(user, avatars),
        create_time: row.create_time,
        digg_count: row.digg_count,
        comment_count: row.comment_count,
        share_count: row.share_count,
        images,
    }
}

pub fn good(row: GoodRow) -> Good {
    Good {
        id: row.good_id,
        title: row.title,
        description: row.description,
        price: row.price,
        image: row.image,
        sale_count: row.sale_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserRow {
        UserRow {
            uid: "u1".to_string(),
            nickname: "alice".to_string(),
            follower_count: 12,
            ..UserRow::default()
        }
    }

    #[test]
    fn missing_avatar_is_empty_not_absent() {
        let author = author(Some(&user()), &[]);

        assert_eq!(author.nickname, "alice");
        assert!(author.avatar_168x168.url_list.is_empty());
        assert_eq!(author.avatar_168x168.width, AVATAR_SMALL);
        assert_eq!(author.avatar_300x300.height, AVATAR_LARGE);

        let json = serde_json::to_value(&author).unwrap();
        assert_eq!(json["avatar_168x168"]["url_list"], serde_json::json!([]));
    }

    #[test]
    fn avatar_picks_matching_size() {
        let rows = vec![AvatarRow {
            cover_type: AVATAR_LARGE_TYPE.to_string(),
            uri: "big".to_string(),
            url: "http://img/big.png".to_string(),
        }];
        let author = author(Some(&user()), &rows);

        assert_eq!(author.avatar_300x300.url_list, ["http://img/big.png"]);
        assert!(author.avatar_168x168.url_list.is_empty());
    }

    #[test]
    fn bare_video_row_assembles_with_defaults() {
        let row = VideoRow {
            id: 1,
            aweme_id: "7260749400622894336".to_string(),
            author_user_id: "u9".to_string(),
            duration: 15,
            ..VideoRow::default()
        };

        let video = video(row, &[], None, None, None);

        assert_eq!(video.author.uid, "u9");
        assert!(video.video.cover.url_list.is_empty());
        assert!(video.video.play_addr.url_list.is_empty());
        assert_eq!(video.video.duration, 15);
        assert_eq!(video.video.ratio, DEFAULT_RATIO);
        assert_eq!(video.statistics, Statistics::default());
        assert!(video.status.allow_share);
        assert_eq!(video.music, MusicInfo::default());
    }

    #[test]
    fn video_takes_joined_columns_and_lookups() {
        let row = VideoRow {
            id: 3,
            aweme_id: "a".to_string(),
            digg_count: Some(40),
            allow_share: Some(false),
            ..VideoRow::default()
        }
        .with_author(&user());
        let play = PlayAddrRow {
            uri: "v".to_string(),
            url: "http://cdn/v.mp4".to_string(),
            width: 1080,
            height: 1920,
            data_size: 2048,
            file_hash: "h".to_string(),
        };
        let track = MusicRow {
            id: 5,
            title: "theme".to_string(),
            play_url: "http://cdn/theme.mp3".to_string(),
            ..MusicRow::default()
        };

        let video = video(row, &[], None, Some(play), Some(track));

        assert_eq!(video.author.nickname, "alice");
        assert_eq!(video.author.follower_count, 12);
        assert_eq!(video.statistics.digg_count, 40);
        assert!(!video.status.allow_share);
        assert_eq!(video.video.width, 1080);
        assert_eq!(video.video.play_addr.url_list, ["http://cdn/v.mp4"]);
        assert_eq!(video.music.play_url.url_list, ["http://cdn/theme.mp3"]);
        assert!(video.music.cover_medium.url_list.is_empty());
    }

    #[test]
    fn comment_keeps_uid_of_unknown_user() {
        let row = CommentRow {
            comment_id: "c1".to_string(),
            user_uid: "ghost".to_string(),
            ..CommentRow::default()
        };

        let comment = comment(row, None, &[], Vec::new());

        assert_eq!(comment.user.uid, "ghost");
        assert!(comment.reply_comment.is_empty());
    }

    #[test]
    fn collected_music_maps_author_to_artist() {
        let music = music(MusicRow {
            id: 2,
            author: "band".to_string(),
            ..MusicRow::default()
        });
        assert_eq!(music.artist, "band");
    }
}
