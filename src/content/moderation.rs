use chrono::{DateTime, Local, TimeDelta};
use serde::Serialize;

use super::Post;
use crate::config::CommentSettings;

/// 评论状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    /// 正常接收评论
    Open,
    /// 新评论需要审核后才公开
    Moderated,
    /// 不再接收评论
    Closed,
}

/// 评论策略
///
/// 评论本身由外部系统保存，这里只根据文章和配置给出决定。
#[derive(Debug, Clone, Serialize)]
pub struct CommentPolicy {
    pub status: CommentStatus,
    pub email_notification: bool,
}

impl CommentPolicy {
    /// 规则：
    /// - `allow_comments` 为 false，或开启自动关闭且超过 `close_after` 天 → [`CommentStatus::Closed`]
    /// - 开启自动审核且超过 `moderate_after` 天 → [`CommentStatus::Moderated`]
    /// - 其他 → [`CommentStatus::Open`]
    pub fn evaluate(settings: &CommentSettings, post: &Post, now: DateTime<Local>) -> Self {
        // 天数超出可表示范围时视为未到期
        let older_than = |days: Option<i64>| {
            days.and_then(TimeDelta::try_days)
                .and_then(|age| post.publish_date.checked_add_signed(age))
                .is_some_and(|deadline| deadline <= now)
        };

        let status = if !post.allow_comments
            || (settings.auto_close && older_than(settings.close_after))
        {
            CommentStatus::Closed
        } else if settings.auto_moderate && older_than(settings.moderate_after) {
            CommentStatus::Moderated
        } else {
            CommentStatus::Open
        };

        Self {
            status,
            email_notification: settings.email_notification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures::{local, sample_post};

    fn settings() -> CommentSettings {
        CommentSettings {
            email_notification: true,
            auto_moderate: true,
            moderate_after: Some(7),
            auto_close: true,
            close_after: Some(30),
        }
    }

    #[test]
    fn test_defaults_leave_comments_open() {
        let post = sample_post(1, "a", local(2020, 1, 1));
        let policy = CommentPolicy::evaluate(&CommentSettings::default(), &post, local(2024, 1, 1));
        assert_eq!(policy.status, CommentStatus::Open);
        assert!(!policy.email_notification);
    }

    #[test]
    fn test_disabled_comments_are_closed() {
        let mut post = sample_post(1, "a", local(2024, 1, 1));
        post.allow_comments = false;
        let policy = CommentPolicy::evaluate(&settings(), &post, local(2024, 1, 1));
        assert_eq!(policy.status, CommentStatus::Closed);
    }

    #[test]
    fn test_age_thresholds() {
        let post = sample_post(1, "a", local(2024, 1, 1));
        let s = settings();

        assert_eq!(
            CommentPolicy::evaluate(&s, &post, local(2024, 1, 3)).status,
            CommentStatus::Open
        );
        assert_eq!(
            CommentPolicy::evaluate(&s, &post, local(2024, 1, 10)).status,
            CommentStatus::Moderated
        );
        assert_eq!(
            CommentPolicy::evaluate(&s, &post, local(2024, 3, 1)).status,
            CommentStatus::Closed
        );
    }

    #[test]
    fn test_huge_threshold_never_expires() {
        let post = sample_post(1, "a", local(2024, 1, 1));
        let s = CommentSettings {
            auto_close: true,
            close_after: Some(i64::MAX),
            auto_moderate: true,
            moderate_after: Some(i64::MAX / 86_400),
            ..Default::default()
        };
        assert_eq!(
            CommentPolicy::evaluate(&s, &post, local(2025, 1, 1)).status,
            CommentStatus::Open
        );
    }

    #[test]
    fn test_threshold_without_flag_is_ignored() {
        let post = sample_post(1, "a", local(2024, 1, 1));
        let s = CommentSettings {
            auto_close: false,
            close_after: Some(1),
            ..Default::default()
        };
        assert_eq!(
            CommentPolicy::evaluate(&s, &post, local(2025, 1, 1)).status,
            CommentStatus::Open
        );
    }
}
