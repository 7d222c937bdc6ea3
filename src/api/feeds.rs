use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use super::{Querier, Result};

use crate::{
    content::{Page, PostFilter},
    state::AppState,
    syndication,
};

/// 配置订阅源与站点地图路由，挂在站点根路径下。
pub fn setup_route<S>() -> Router<AppState<S>>
where
    S: Querier + Clone + 'static,
{
    Router::new()
        .route("/rss", get(rss::<S>))
        .route("/sitemap.xml", get(sitemap::<S>))
}

/// 已发布文章的 Atom 订阅源
async fn rss<S: Querier>(State(app): State<AppState<S>>) -> Result<impl IntoResponse> {
    let posts = app
        .store()
        .posts(&PostFilter::published(), Page::default())
        .await?;
    let xml = syndication::post_feed(app.settings(), &posts)?;

    Ok(([(CONTENT_TYPE, "application/atom+xml; charset=utf-8")], xml))
}

async fn sitemap<S: Querier>(State(app): State<AppState<S>>) -> Result<impl IntoResponse> {
    let store = app.store();
    let posts = store
        .posts(&PostFilter::published(), Page::default())
        .await?;
    let categories = store.categories().await?;
    let series = store.series_list().await?;
    let xml = syndication::sitemap(app.settings(), &posts, &categories, &series);

    Ok(([(CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}
