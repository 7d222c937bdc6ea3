use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::Query;
use serde::Deserialize;

use super::{Error, Querier, Result};

use crate::{
    content::{Category, Page, Post, PostArchive, Series, TagUsage},
    context::{
        CategoryContext, Context, PostContext, PostsContext, PostsQuery, SeriesContext,
        TagContext, Viewer,
    },
    state::AppState,
};

/// 配置公开的页面上下文路由。
///
/// 路由包括：
/// - `GET /`、`/latest`、`/featured`：文章列表
/// - `GET /archive`、`/{year}`、`/{year}/{month}`：归档
/// - `GET /{year}/{month}/{day}/{slug}`：单篇文章
/// - `GET /categories`、`/series`、`/tags` 及其详情和按日期筛选的列表
pub fn setup_route<S>() -> Router<AppState<S>>
where
    S: Querier + Clone + 'static,
{
    Router::new()
        .route("/", get(post_index::<S>))
        .route("/latest", get(latest::<S>))
        .route("/featured", get(featured::<S>))
        .route("/archive", get(archive::<S>))
        .route("/{year}", get(year_archive::<S>))
        .route("/{year}/{month}", get(month_archive::<S>))
        .route("/{year}/{month}/{day}/{slug}", get(post_detail::<S>))
        .route("/categories", get(category_index::<S>))
        .route("/categories/{slug}", get(category_detail::<S>))
        .route("/categories/{slug}/{year}", get(category_year::<S>))
        .route("/categories/{slug}/{year}/{month}", get(category_month::<S>))
        .route("/series", get(series_index::<S>))
        .route("/series/{slug}", get(series_detail::<S>))
        .route("/series/{slug}/{year}", get(series_year::<S>))
        .route("/series/{slug}/{year}/{month}", get(series_month::<S>))
        .route("/tags", get(tag_index::<S>))
        .route("/tags/{tag}", get(tag_detail::<S>))
        .route("/tags/{tag}/{year}", get(tag_year::<S>))
        .route("/tags/{tag}/{year}/{month}", get(tag_month::<S>))
}

/// 四位数字的年份，否则视为不存在
pub(crate) fn parse_year(s: &str) -> Result<i32> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::not_found());
    }
    s.parse().map_err(|_| Error::not_found())
}

/// `01` 到 `12`
pub(crate) fn parse_month(s: &str) -> Result<u32> {
    match two_digits(s) {
        Some(month @ 1..=12) => Ok(month),
        _ => Err(Error::not_found()),
    }
}

/// 两位数字的日期，不存在的日期由查询自然返回空
pub(crate) fn parse_day(s: &str) -> Result<u32> {
    two_digits(s).ok_or_else(Error::not_found)
}

fn two_digits(s: &str) -> Option<u32> {
    if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// 文章列表的查询参数
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ListParams {
    start_post: usize,
    max_posts: Option<usize>,
    featured: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            start_post: 1,
            max_posts: None,
            featured: false,
        }
    }
}

impl ListParams {
    fn page(&self) -> Page {
        Page::new(self.start_post, self.max_posts)
    }
}

async fn post_index<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Query(params): Query<ListParams>,
) -> Result<Json<PostsContext>> {
    let query = PostsQuery {
        featured: params.featured,
        page: params.page(),
        ..Default::default()
    };
    Context::new(app.store(), viewer).posts(query).await.map(Json)
}

/// 最新的三篇文章
async fn latest<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
) -> Result<Json<PostsContext>> {
    let query = PostsQuery {
        page: Page::latest(3),
        ..Default::default()
    };
    Context::new(app.store(), viewer).posts(query).await.map(Json)
}

async fn featured<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Post>>> {
    Context::new(app.store(), viewer)
        .featured(params.page())
        .await
        .map(Json)
}

async fn archive<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
) -> Result<Json<PostArchive>> {
    Context::new(app.store(), viewer)
        .archive(None, None)
        .await
        .map(Json)
}

async fn year_archive<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path(year): Path<String>,
) -> Result<Json<PostArchive>> {
    let year = parse_year(&year)?;
    Context::new(app.store(), viewer)
        .archive(Some(year), None)
        .await
        .map(Json)
}

async fn month_archive<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path((year, month)): Path<(String, String)>,
) -> Result<Json<PostArchive>> {
    let (year, month) = (parse_year(&year)?, parse_month(&month)?);
    Context::new(app.store(), viewer)
        .archive(Some(year), Some(month))
        .await
        .map(Json)
}

/// 根据日期和 slug 获取单篇文章。
///
/// 文章不存在或对当前访问者不可见时返回 [`Error::not_found`]。
async fn post_detail<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path((year, month, day, slug)): Path<(String, String, String, String)>,
) -> Result<Json<PostContext>> {
    let (year, month, day) = (parse_year(&year)?, parse_month(&month)?, parse_day(&day)?);
    Context::new(app.store(), viewer)
        .post(year, month, day, &slug, &app.settings().comments)
        .await
        .map(Json)
}

async fn category_index<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
) -> Result<Json<Vec<Category>>> {
    Context::new(app.store(), viewer).categories().await.map(Json)
}

async fn category_detail<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryContext>> {
    Context::new(app.store(), viewer)
        .category(&slug)
        .await
        .map(Json)
}

async fn category_year<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path((slug, year)): Path<(String, String)>,
) -> Result<Json<PostsContext>> {
    let query = PostsQuery {
        year: Some(parse_year(&year)?),
        category: Some(slug),
        ..Default::default()
    };
    Context::new(app.store(), viewer).posts(query).await.map(Json)
}

async fn category_month<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path((slug, year, month)): Path<(String, String, String)>,
) -> Result<Json<PostsContext>> {
    let query = PostsQuery {
        year: Some(parse_year(&year)?),
        month: Some(parse_month(&month)?),
        category: Some(slug),
        ..Default::default()
    };
    Context::new(app.store(), viewer).posts(query).await.map(Json)
}

async fn series_index<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
) -> Result<Json<Vec<Series>>> {
    Context::new(app.store(), viewer).series_list().await.map(Json)
}

async fn series_detail<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path(slug): Path<String>,
) -> Result<Json<SeriesContext>> {
    Context::new(app.store(), viewer)
        .series(&slug)
        .await
        .map(Json)
}

async fn series_year<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path((slug, year)): Path<(String, String)>,
) -> Result<Json<PostsContext>> {
    let query = PostsQuery {
        year: Some(parse_year(&year)?),
        series: Some(slug),
        ..Default::default()
    };
    Context::new(app.store(), viewer).posts(query).await.map(Json)
}

async fn series_month<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path((slug, year, month)): Path<(String, String, String)>,
) -> Result<Json<PostsContext>> {
    let query = PostsQuery {
        year: Some(parse_year(&year)?),
        month: Some(parse_month(&month)?),
        series: Some(slug),
        ..Default::default()
    };
    Context::new(app.store(), viewer).posts(query).await.map(Json)
}

/// 获取使用中的标签及文章数。
async fn tag_index<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
) -> Result<Json<Vec<TagUsage>>> {
    Context::new(app.store(), viewer).tags().await.map(Json)
}

async fn tag_detail<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path(tag): Path<String>,
) -> Result<Json<TagContext>> {
    Context::new(app.store(), viewer).tag(&tag).await.map(Json)
}

async fn tag_year<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path((tag, year)): Path<(String, String)>,
) -> Result<Json<PostsContext>> {
    let query = PostsQuery {
        year: Some(parse_year(&year)?),
        tag: Some(tag),
        ..Default::default()
    };
    Context::new(app.store(), viewer).posts(query).await.map(Json)
}

async fn tag_month<S: Querier>(
    viewer: Viewer,
    State(app): State<AppState<S>>,
    Path((tag, year, month)): Path<(String, String, String)>,
) -> Result<Json<PostsContext>> {
    let query = PostsQuery {
        year: Some(parse_year(&year)?),
        month: Some(parse_month(&month)?),
        tag: Some(tag),
        ..Default::default()
    };
    Context::new(app.store(), viewer).posts(query).await.map(Json)
}
