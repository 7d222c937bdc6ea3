use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use axum_extra::extract::Query;
use serde::Deserialize;

use super::{Error, Querier, Result, Staff};

use crate::{
    content::{
        Category, CategoryInput, Page, Post, PostFilter, PostImage, PostImageInput, PostInput,
        Series, SeriesInput,
    },
    state::AppState,
    storage::Store,
};

/// 配置后台管理路由，全部要求管理员令牌。
///
/// 路由包括：
/// - `GET/POST /admin/posts`，`GET/PUT/DELETE /admin/posts/{id}`
/// - `GET/POST /admin/posts/{id}/images`，`DELETE /admin/images/{id}`
/// - `GET/POST /admin/categories`，`PUT/DELETE /admin/categories/{id}`
/// - `GET/POST /admin/series`，`PUT/DELETE /admin/series/{id}`
pub fn setup_route<S>() -> Router<AppState<S>>
where
    S: Store + Clone + 'static,
{
    Router::new()
        .route("/admin/posts", get(post_list::<S>).post(create_post::<S>))
        .route(
            "/admin/posts/{id}",
            get(post::<S>).put(update_post::<S>).delete(delete_post::<S>),
        )
        .route(
            "/admin/posts/{id}/images",
            get(image_list::<S>).post(add_image::<S>),
        )
        .route("/admin/images/{id}", delete(delete_image::<S>))
        .route(
            "/admin/categories",
            get(category_list::<S>).post(create_category::<S>),
        )
        .route(
            "/admin/categories/{id}",
            put(update_category::<S>).delete(delete_category::<S>),
        )
        .route(
            "/admin/series",
            get(series_list::<S>).post(create_series::<S>),
        )
        .route(
            "/admin/series/{id}",
            put(update_series::<S>).delete(delete_series::<S>),
        )
}

/// 后台文章列表的筛选参数
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostListParams {
    /// 标题包含的文本，不区分大小写
    search: String,
    is_published: Option<bool>,
    series: Option<String>,
    category: Option<String>,
}

/// 分类、系列列表的搜索参数
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    search: String,
}

fn title_matches(title: &str, search: &str) -> bool {
    let search = search.trim();
    search.is_empty() || title.to_lowercase().contains(&search.to_lowercase())
}

fn deleted(found: bool) -> Result<StatusCode> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found())
    }
}

/// 后台文章列表，包含草稿和定时发布的文章
async fn post_list<S: Querier>(
    _: Staff,
    State(app): State<AppState<S>>,
    Query(params): Query<PostListParams>,
) -> Result<Json<Vec<Post>>> {
    let filter = PostFilter {
        series: params.series,
        category: params.category,
        ..PostFilter::new(false)
    };

    let posts = app
        .store()
        .posts(&filter, Page::default())
        .await?
        .into_iter()
        .filter(|p| params.is_published.is_none_or(|v| p.is_published == v))
        .filter(|p| title_matches(&p.title, &params.search))
        .collect();

    Ok(Json(posts))
}

async fn post<S: Querier>(
    _: Staff,
    State(app): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<Json<Post>> {
    let post = app.store().post_by_id(id).await?.ok_or_else(Error::not_found)?;
    Ok(Json(post))
}

/// 保存后在后台通知站点地图更新，不阻塞响应
fn ping_after_save<S>(app: &AppState<S>, previous: Option<Post>, saved: &Post) {
    if !app.pinger().enabled() {
        return;
    }

    let pinger = app.pinger().clone();
    let saved = saved.clone();
    tokio::spawn(async move { pinger.post_saved(previous.as_ref(), &saved).await });
}

async fn create_post<S: Store>(
    _: Staff,
    State(app): State<AppState<S>>,
    Json(input): Json<PostInput>,
) -> Result<(StatusCode, Json<Post>)> {
    let input = input.normalize()?;
    let post = app.store().create_post(&input).await?;
    tracing::info!(id = post.id, slug = %post.slug, "post created");

    ping_after_save(&app, None, &post);
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post<S: Store>(
    _: Staff,
    State(app): State<AppState<S>>,
    Path(id): Path<i64>,
    Json(input): Json<PostInput>,
) -> Result<Json<Post>> {
    let input = input.normalize()?;
    let previous = app.store().post_by_id(id).await?.ok_or_else(Error::not_found)?;
    let post = app
        .store()
        .update_post(id, &input)
        .await?
        .ok_or_else(Error::not_found)?;
    tracing::info!(id = post.id, slug = %post.slug, "post updated");

    ping_after_save(&app, Some(previous), &post);
    Ok(Json(post))
}

async fn delete_post<S: Store>(
    _: Staff,
    State(app): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    deleted(app.store().delete_post(id).await?)
}

/// 文章的全部图片，包括不在图集中的
async fn image_list<S: Querier>(
    _: Staff,
    State(app): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<PostImage>>> {
    if app.store().post_by_id(id).await?.is_none() {
        return Err(Error::not_found());
    }
    let mut images = app.store().post_images(id).await?;
    PostImage::sort(&mut images);
    Ok(Json(images))
}

async fn add_image<S: Store>(
    _: Staff,
    State(app): State<AppState<S>>,
    Path(id): Path<i64>,
    Json(input): Json<PostImageInput>,
) -> Result<(StatusCode, Json<PostImage>)> {
    let input = input.normalize()?;
    let image = app
        .store()
        .add_image(id, &input)
        .await?
        .ok_or_else(Error::not_found)?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn delete_image<S: Store>(
    _: Staff,
    State(app): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    deleted(app.store().delete_image(id).await?)
}

async fn category_list<S: Querier>(
    _: Staff,
    State(app): State<AppState<S>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Category>>> {
    let mut categories = app.store().categories().await?;
    categories.retain(|c| title_matches(&c.title, &params.search));
    Ok(Json(categories))
}

async fn create_category<S: Store>(
    _: Staff,
    State(app): State<AppState<S>>,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = app.store().create_category(&input.normalize()?).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category<S: Store>(
    _: Staff,
    State(app): State<AppState<S>>,
    Path(id): Path<i64>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    app.store()
        .update_category(id, &input.normalize()?)
        .await?
        .map(Json)
        .ok_or_else(Error::not_found)
}

async fn delete_category<S: Store>(
    _: Staff,
    State(app): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    deleted(app.store().delete_category(id).await?)
}

async fn series_list<S: Querier>(
    _: Staff,
    State(app): State<AppState<S>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Series>>> {
    let mut series = app.store().series_list().await?;
    series.retain(|s| title_matches(&s.title, &params.search));
    Ok(Json(series))
}

async fn create_series<S: Store>(
    _: Staff,
    State(app): State<AppState<S>>,
    Json(input): Json<SeriesInput>,
) -> Result<(StatusCode, Json<Series>)> {
    let series = app.store().create_series(&input.normalize()?).await?;
    Ok((StatusCode::CREATED, Json(series)))
}

async fn update_series<S: Store>(
    _: Staff,
    State(app): State<AppState<S>>,
    Path(id): Path<i64>,
    Json(input): Json<SeriesInput>,
) -> Result<Json<Series>> {
    app.store()
        .update_series(id, &input.normalize()?)
        .await?
        .map(Json)
        .ok_or_else(Error::not_found)
}

async fn delete_series<S: Store>(
    _: Staff,
    State(app): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    deleted(app.store().delete_series(id).await?)
}
