use std::{env, fs};

use serde::Deserialize;

use crate::error::Result;

/// 服务配置
///
/// 先读取 `BLOGYALL_CONFIG` 指向的 TOML 文件（可选），再用环境变量覆盖。
/// 默认值与原有博客设置一致：`debug` 开启，站点地图推送与评论策略关闭。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 监听地址
    pub listen: String,
    /// 未设置时使用内存存储
    pub database_url: Option<String>,
    /// 后台令牌，未设置时没有任何请求具有管理权限
    pub staff_token: Option<String>,
    /// 站点根地址，用于生成订阅和站点地图中的绝对链接
    pub site_url: String,
    pub debug: bool,
    /// 发布文章时通知 Google 重新抓取站点地图
    pub ping_google: bool,
    pub feed: FeedSettings,
    pub comments: CommentSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
            database_url: None,
            staff_token: None,
            site_url: "http://localhost:3000".to_string(),
            debug: true,
            ping_google: false,
            feed: FeedSettings::default(),
            comments: CommentSettings::default(),
        }
    }
}

/// 订阅源配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            link: "/".to_string(),
            description: "Blog".to_string(),
        }
    }
}

/// 评论策略配置，时间单位为天
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentSettings {
    pub email_notification: bool,
    pub auto_moderate: bool,
    pub moderate_after: Option<i64>,
    pub auto_close: bool,
    pub close_after: Option<i64>,
}

impl CommentSettings {
    /// 负数天数按 0 处理
    fn clamp_days(&mut self) {
        for (key, days) in [
            ("moderate_after", &mut self.moderate_after),
            ("close_after", &mut self.close_after),
        ] {
            if let Some(d) = (*days).filter(|d| *d < 0) {
                tracing::warn!(key, days = d, "negative comment threshold, using 0");
                *days = Some(0);
            }
        }
    }
}

impl Settings {
    /// 从 TOML 文本解析
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut settings: Self = toml::from_str(content)?;
        settings.comments.clamp_days();
        Ok(settings)
    }

    /// 读取配置文件并应用环境变量
    pub fn load() -> Result<Self> {
        let mut settings = match env::var("BLOGYALL_CONFIG") {
            Ok(path) => {
                tracing::info!(%path, "loading config file");
                Self::from_toml(&fs::read_to_string(&path)?)?
            }
            Err(_) => Self::default(),
        };
        settings.apply_env(|key| env::var(key).ok());
        Ok(settings)
    }

    /// 用环境变量覆盖配置项
    ///
    /// - `DATABASE_URL`
    /// - `BLOGYALL_LISTEN`
    /// - `BLOGYALL_STAFF_TOKEN`
    /// - `BLOGYALL_SITE_URL`
    /// - `BLOGYALL_DEBUG`
    /// - `BLOGYALL_PING_GOOGLE`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(listen) = lookup("BLOGYALL_LISTEN") {
            self.listen = listen;
        }
        if let Some(token) = lookup("BLOGYALL_STAFF_TOKEN") {
            self.staff_token = Some(token);
        }
        if let Some(site_url) = lookup("BLOGYALL_SITE_URL") {
            self.site_url = site_url;
        }
        if let Some(debug) = lookup("BLOGYALL_DEBUG").and_then(|v| parse_flag("BLOGYALL_DEBUG", &v)) {
            self.debug = debug;
        }
        if let Some(ping) =
            lookup("BLOGYALL_PING_GOOGLE").and_then(|v| parse_flag("BLOGYALL_PING_GOOGLE", &v))
        {
            self.ping_google = ping;
        }

        self.staff_token = self.staff_token.take().filter(|t| !t.is_empty());
        self.database_url = self.database_url.take().filter(|u| !u.is_empty());
    }

    /// 站点地址拼接路径
    pub fn absolute_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.site_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_flag(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!(key, value = other, "ignoring invalid boolean");
            None
        }
    }
}
