//! Feed service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use common::pagination::Page;
use serde_json::json;
use std::path::Path;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    error::{ApiError, ApiResult},
    middleware::{CurrentUser, current_user_middleware},
    models::{
        CollectResponse, Envelope, PageQuery, comment::Comment, good::Good, post::Post,
        user::Author, video::Video,
    },
    repositories::{UserFilter, VideoFilter, VideoType},
    resources::{CollectedMusic, Comments, Goods, Posts, Users, Videos, paginate, profile},
    state::AppState,
};

type Reply<T> = ApiResult<Json<Envelope<T>>>;

/// Create the router for the feed service
pub fn create_router(state: AppState, file_dir: &Path) -> Router {
    let api_routes = Router::new()
        .route("/api/video/recommended", get(recommended_videos))
        .route("/api/video/long/recommended", get(long_videos))
        .route("/api/video/comments", get(video_comments))
        .route("/api/video/private", get(private_videos))
        .route("/api/video/like", get(liked_videos))
        .route("/api/video/my", get(my_videos))
        .route("/api/video/history", get(watch_history))
        .route("/api/user/collect", get(collections))
        .route("/api/user/video_list", get(user_videos))
        .route("/api/user/panel", get(user_panel))
        .route("/api/user/friends", get(friends))
        .route("/api/post/recommended", get(recommended_posts))
        .route("/api/shop/recommended", get(recommended_goods))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            current_user_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .merge(api_routes)
        .nest_service("/api/file", ServeDir::new(file_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = match state.source.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            false
        }
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "ok" } else { "unavailable" },
            "service": "feed"
        })),
    )
}

async fn video_page(
    state: &AppState,
    filter: VideoFilter,
    query: &PageQuery,
) -> Reply<Page<Video>> {
    let page = paginate(&Videos, state.source.as_ref(), &filter, query.page_request()).await?;
    Ok(Json(Envelope::success(page)))
}

pub async fn recommended_videos(
    State(state): State<AppState>,
    query: PageQuery,
) -> Reply<Page<Video>> {
    video_page(&state, VideoFilter::Feed(VideoType::Recommend), &query).await
}

pub async fn long_videos(
    State(state): State<AppState>,
    query: PageQuery,
) -> Reply<Page<Video>> {
    video_page(&state, VideoFilter::Feed(VideoType::Long), &query).await
}

pub async fn private_videos(
    State(state): State<AppState>,
    user: CurrentUser,
    query: PageQuery,
) -> Reply<Page<Video>> {
    video_page(&state, VideoFilter::PrivateOf(user.uid), &query).await
}

pub async fn liked_videos(
    State(state): State<AppState>,
    user: CurrentUser,
    query: PageQuery,
) -> Reply<Page<Video>> {
    video_page(&state, VideoFilter::LikedBy(user.uid), &query).await
}

pub async fn my_videos(
    State(state): State<AppState>,
    user: CurrentUser,
    query: PageQuery,
) -> Reply<Page<Video>> {
    video_page(&state, VideoFilter::AuthoredBy(user.uid), &query).await
}

pub async fn watch_history(
    State(state): State<AppState>,
    user: CurrentUser,
    query: PageQuery,
) -> Reply<Page<Video>> {
    video_page(&state, VideoFilter::WatchedBy(user.uid), &query).await
}

/// Videos uploaded by the user named in `id`
pub async fn user_videos(
    State(state): State<AppState>,
    query: PageQuery,
) -> Reply<Page<Video>> {
    let uid = query.required_id()?.to_string();
    video_page(&state, VideoFilter::AuthoredBy(uid), &query).await
}

/// Top-level comments on the video named in `id`
pub async fn video_comments(
    State(state): State<AppState>,
    query: PageQuery,
) -> Reply<Page<Comment>> {
    let aweme_id = query.required_id()?.to_string();
    let page = paginate(
        &Comments,
        state.source.as_ref(),
        &aweme_id,
        query.page_request(),
    )
    .await?;
    Ok(Json(Envelope::success(page)))
}

/// Collected videos and collected music, paged together
pub async fn collections(
    State(state): State<AppState>,
    user: CurrentUser,
    query: PageQuery,
) -> Reply<CollectResponse> {
    let request = query.page_request();
    let source = state.source.as_ref();
    let filter = VideoFilter::CollectedBy(user.uid.clone());

    let (video, music) = tokio::try_join!(
        paginate(&Videos, source, &filter, request),
        paginate(&CollectedMusic, source, &user.uid, request),
    )?;

    Ok(Json(Envelope::success(CollectResponse { video, music })))
}

pub async fn user_panel(State(state): State<AppState>, user: CurrentUser) -> Reply<Author> {
    let author = profile(state.source.as_ref(), &user.uid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", user.uid)))?;
    Ok(Json(Envelope::success(author)))
}

/// Every other user; the page carries no page number
pub async fn friends(
    State(state): State<AppState>,
    user: CurrentUser,
    query: PageQuery,
) -> Reply<Page<Author>> {
    let page = paginate(
        &Users,
        state.source.as_ref(),
        &UserFilter::FriendsOf(user.uid),
        query.page_request(),
    )
    .await?;
    Ok(Json(Envelope::success(page.without_page_no())))
}

pub async fn recommended_posts(
    State(state): State<AppState>,
    query: PageQuery,
) -> Reply<Page<Post>> {
    let page = paginate(&Posts, state.source.as_ref(), &(), query.page_request()).await?;
    Ok(Json(Envelope::success(page)))
}

pub async fn recommended_goods(
    State(state): State<AppState>,
    query: PageQuery,
) -> Reply<Page<Good>> {
    let page = paginate(&Goods, state.source.as_ref(), &(), query.page_request()).await?;
    Ok(Json(Envelope::success(page)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        middleware::Authenticator,
        models::user::Author as AuthorDoc,
        repositories::fixture::{FixtureDocuments, Relations},
        resources::tests::{fixture, goods, videos},
    };
    use axum::{body::Body, http::Request};
    use serde_json::Value;
    use std::{collections::HashSet, sync::Arc};
    use tower::ServiceExt;

    fn documents() -> FixtureDocuments {
        let mut relations = Relations::default();
        relations.likes.insert(
            "u1".to_string(),
            HashSet::from(["v0003".to_string(), "v0007".to_string()]),
        );

        FixtureDocuments {
            videos: videos(25),
            goods: goods(12),
            users: vec![
                AuthorDoc {
                    uid: "u2".to_string(),
                    nickname: "bob".to_string(),
                    ..AuthorDoc::default()
                },
                AuthorDoc {
                    uid: "u3".to_string(),
                    nickname: "carol".to_string(),
                    ..AuthorDoc::default()
                },
            ],
            relations,
            ..FixtureDocuments::default()
        }
    }

    fn app(default_user: Option<&str>) -> Router {
        let state = AppState::new(
            Arc::new(fixture(documents())),
            Authenticator::new(None, default_user.map(str::to_string)),
        );
        create_router(state, Path::new("public/data"))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn recommended_videos_page() {
        let (status, body) = get(app(None), "/api/video/recommended?pageNo=2&pageSize=10").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 200);
        assert_eq!(body["msg"], "");
        assert_eq!(body["data"]["pageNo"], 2);
        assert_eq!(body["data"]["total"], 25);
        assert_eq!(body["data"]["list"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn malformed_page_params_use_defaults() {
        let (status, body) = get(app(None), "/api/shop/recommended?pageNo=x&pageSize=lots").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["pageNo"], 0);
        assert_eq!(body["data"]["total"], 12);
        assert_eq!(body["data"]["list"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn repeated_page_param_still_answers_with_envelope() {
        let (status, body) = get(app(None), "/api/shop/recommended?pageNo=1&pageNo=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 200);
        assert_eq!(body["data"]["pageNo"], 0);
        assert_eq!(body["data"]["total"], 12);
    }

    #[tokio::test]
    async fn repeated_id_is_a_validation_failure() {
        let (status, body) = get(app(None), "/api/video/comments?id=a&id=b").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn missing_id_is_a_validation_failure() {
        let (status, body) = get(app(None), "/api/video/comments?pageNo=0").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn comments_of_unknown_video_are_empty() {
        let (status, body) = get(app(None), "/api/video/comments?id=nope").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 0);
        assert_eq!(body["data"]["list"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn user_routes_need_a_current_user() {
        let (status, body) = get(app(None), "/api/video/like").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn liked_videos_of_default_user() {
        let (status, body) = get(app(Some("u1")), "/api/video/like").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 2);
        assert_eq!(body["data"]["list"][0]["aweme_id"], "v0007");
    }

    #[tokio::test]
    async fn friends_omit_page_number() {
        let (status, body) = get(app(Some("u2")), "/api/user/friends").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].get("pageNo").is_none());
        let names: Vec<&str> = body["data"]["list"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["nickname"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["alice", "carol"]);
    }

    #[tokio::test]
    async fn panel_of_unknown_user_is_not_found() {
        let (status, body) = get(app(Some("ghost")), "/api/user/panel").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);
    }

    #[tokio::test]
    async fn panel_of_known_user() {
        let (status, body) = get(app(Some("u3")), "/api/user/panel").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["nickname"], "carol");
        assert_eq!(body["data"]["avatar_168x168"]["url_list"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn collect_pages_videos_and_music() {
        let (status, body) = get(app(Some("u1")), "/api/user/collect").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["video"]["total"], 0);
        assert_eq!(body["data"]["music"]["total"], 0);
    }

    #[tokio::test]
    async fn user_video_list_by_id() {
        let (status, body) = get(app(None), "/api/user/video_list?id=u1&pageSize=3").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 25);
        assert_eq!(body["data"]["list"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = get(app(None), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn empty_source_still_answers() {
        let state = AppState::new(
            Arc::new(fixture(FixtureDocuments::default())),
            Authenticator::new(None, None),
        );
        let app = create_router(state, Path::new("public/data"));

        let (status, body) = get(app, "/api/post/recommended").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 0);
    }
}
