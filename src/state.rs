use std::sync::Arc;

use crate::{config::Settings, ping::SitemapPinger};

/// 应用程序上下文
///
/// [`AppState`] 封装了存储、配置和站点地图推送器，提供统一访问入口。
/// 存储类型 `S` 可以是数据库连接池，也可以是内存存储。
#[derive(Clone)]
pub struct AppState<S> {
    store: S,
    settings: Arc<Settings>,
    pinger: SitemapPinger,
}

impl<S> AppState<S> {
    /// 创建一个新的 [`AppState`] 实例
    pub fn new(store: S, settings: Settings) -> Self {
        let pinger = SitemapPinger::new(&settings);

        Self {
            store,
            settings: Arc::new(settings),
            pinger,
        }
    }

    /// 获取存储对象
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pinger(&self) -> &SitemapPinger {
        &self.pinger
    }

    /// 校验后台令牌
    ///
    /// 未配置令牌时任何请求都不具有管理权限。
    pub fn is_staff_token(&self, token: &str) -> bool {
        self.settings
            .staff_token
            .as_deref()
            .is_some_and(|expected| expected == token)
    }
}
