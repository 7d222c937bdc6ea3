mod admin;
mod feeds;
mod query;
mod viewer;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::instrument;

pub use self::viewer::Staff;

use crate::{
    error::{Error, Result},
    state::AppState,
    storage::{Querier, Store},
};

/// 设置应用的路由。
///
/// 将 `/api` 下的页面上下文接口和后台接口组合在一起，
/// 订阅源与站点地图挂在根路径，并绑定应用状态。
pub fn setup_route<S>(app: AppState<S>) -> Router
where
    S: Store + Clone + 'static,
{
    Router::new()
        .nest(
            "/api",
            query::setup_route::<S>().merge(admin::setup_route::<S>()),
        )
        .merge(feeds::setup_route::<S>())
        .with_state(app)
}

/// 启动 HTTP 服务，并使用给定的路由处理请求。
///
/// 在 `listen` 上监听 TCP 连接，并打印启动日志。
#[instrument(name = "http server", skip_all)]
pub async fn run_server_with_router(listen: &str, router: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;

    tracing::info!("listening on {}", listen);

    axum::serve(listener, router).await?;
    Ok(())
}

/// 启动 HTTP 服务，自动设置路由和中间件。
///
/// 1. 生成路由
/// 2. 添加日志和追踪中间件
/// 3. 启动服务器
pub async fn run_server<S>(app: AppState<S>) -> Result<()>
where
    S: Store + Clone + 'static,
{
    let listen = app.settings().listen.clone();
    let router = setup_route(app);
    let router = add_middlewares(router);
    run_server_with_router(&listen, router).await
}

/// 为路由添加中间件，包括请求追踪和失败日志记录。
///
/// 日志记录会在请求失败时输出错误信息。
fn add_middlewares(router: Router) -> Router {
    fn log_failure(
        err: tower_http::classify::ServerErrorsFailureClass,
        _latency: std::time::Duration,
        _span: &tracing::Span,
    ) {
        tracing::error!(error = %err, "request failed");
    }

    router.layer(
        TraceLayer::new_for_http()
            .on_failure(log_failure)
            .on_request(|_req: &_, _span: &tracing::Span| {
                // 空实现，关闭请求日志
            }),
    )
}
