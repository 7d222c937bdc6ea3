use chrono::{DateTime, Local};

use crate::{config::Settings, content::Post};

const GOOGLE_PING_URL: &str = "https://www.google.com/webmasters/tools/ping";

/// 文章发布后通知 Google 重新抓取站点地图
#[derive(Clone)]
pub struct SitemapPinger {
    client: reqwest::Client,
    enabled: bool,
    sitemap_url: String,
}

impl SitemapPinger {
    /// 仅在 `ping_google` 开启且 `debug` 关闭时生效
    pub fn new(settings: &Settings) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .unwrap_or_default();

        Self {
            client,
            enabled: settings.ping_google && !settings.debug,
            sitemap_url: settings.absolute_url("/sitemap.xml"),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// 是否需要通知
    ///
    /// 文章已发布且发布时间已到，并且是新文章或之前的版本未发布。
    pub fn should_ping(previous: Option<&Post>, saved: &Post, now: DateTime<Local>) -> bool {
        if !saved.is_published || saved.publish_date > now {
            return false;
        }
        previous.is_none_or(|p| !p.is_published)
    }

    /// 保存文章后调用，失败只记录日志
    pub async fn post_saved(&self, previous: Option<&Post>, saved: &Post) {
        if !self.enabled || !Self::should_ping(previous, saved, Local::now()) {
            return;
        }

        let result = self
            .client
            .get(GOOGLE_PING_URL)
            .query(&[("sitemap", self.sitemap_url.as_str())])
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        match result {
            Ok(_) => tracing::info!(sitemap = %self.sitemap_url, "sitemap ping sent"),
            Err(e) => tracing::warn!(%e, "sitemap ping failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::content::fixtures::{local, sample_post};

    #[test]
    fn test_new_published_post_pings() {
        let post = sample_post(1, "a", local(2021, 3, 1));
        assert!(SitemapPinger::should_ping(None, &post, Local::now()));
    }

    #[test]
    fn test_draft_or_future_post_does_not_ping() {
        let mut draft = sample_post(1, "a", local(2021, 3, 1));
        draft.is_published = false;
        assert!(!SitemapPinger::should_ping(None, &draft, Local::now()));

        let future = sample_post(2, "b", Local::now() + Duration::days(1));
        assert!(!SitemapPinger::should_ping(None, &future, Local::now()));
    }

    #[test]
    fn test_only_first_publication_pings() {
        let mut previous = sample_post(1, "a", local(2021, 3, 1));
        let saved = previous.clone();
        assert!(!SitemapPinger::should_ping(Some(&previous), &saved, Local::now()));

        previous.is_published = false;
        assert!(SitemapPinger::should_ping(Some(&previous), &saved, Local::now()));
    }

    #[test]
    fn test_disabled_in_debug() {
        let settings = Settings {
            ping_google: true,
            ..Default::default()
        };
        assert!(!SitemapPinger::new(&settings).enabled());

        let settings = Settings {
            ping_google: true,
            debug: false,
            ..Default::default()
        };
        let pinger = SitemapPinger::new(&settings);
        assert!(pinger.enabled());
        assert_eq!(pinger.sitemap_url, "http://localhost:3000/sitemap.xml");
    }
}
