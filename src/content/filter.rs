use chrono::{DateTime, Datelike, Local};

use super::Post;

/// 文章查询条件
///
/// 各条件依次收窄结果：
///
/// 1. 可见性：`require_published` 时只保留已发布且发布时间不晚于当前时间的文章
/// 2. 推荐
/// 3. 日期：年；设置年后才按月；设置月后才按日
/// 4. 分类
/// 5. 系列
/// 6. 标签
/// 7. slug
///
/// 空字符串视为未设置。结果按 `publish_date` 倒序排列，条件不匹配时返回空集合。
#[derive(Debug, Clone, PartialEq)]
pub struct PostFilter {
    pub require_published: bool,
    pub require_featured: bool,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub category: Option<String>,
    pub series: Option<String>,
    pub tag: Option<String>,
    pub slug: Option<String>,
}

impl PostFilter {
    pub fn new(require_published: bool) -> Self {
        Self {
            require_published,
            require_featured: false,
            year: None,
            month: None,
            day: None,
            category: None,
            series: None,
            tag: None,
            slug: None,
        }
    }

    /// 公开可见的文章
    pub fn published() -> Self {
        Self::new(true)
    }

    pub fn featured(mut self) -> Self {
        self.require_featured = true;
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    pub fn category(mut self, slug: impl Into<String>) -> Self {
        self.category = Some(slug.into());
        self
    }

    pub fn series(mut self, slug: impl Into<String>) -> Self {
        self.series = Some(slug.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// 实际生效的年份
    pub fn effective_year(&self) -> Option<i32> {
        self.year
    }

    /// 实际生效的月份，未设置年份时忽略
    pub fn effective_month(&self) -> Option<u32> {
        self.effective_year().and(self.month)
    }

    /// 实际生效的日，未设置月份时忽略
    pub fn effective_day(&self) -> Option<u32> {
        self.effective_month().and(self.day)
    }

    pub fn category_slug(&self) -> Option<&str> {
        non_empty(&self.category)
    }

    pub fn series_slug(&self) -> Option<&str> {
        non_empty(&self.series)
    }

    pub fn tag_name(&self) -> Option<&str> {
        non_empty(&self.tag)
    }

    pub fn post_slug(&self) -> Option<&str> {
        non_empty(&self.slug)
    }

    /// 判断单篇文章是否满足条件
    pub fn matches(&self, post: &Post, now: DateTime<Local>) -> bool {
        if self.require_published && !post.is_live_at(now) {
            return false;
        }
        if self.require_featured && !post.is_featured {
            return false;
        }

        let day = post.publish_day();
        if self.effective_year().is_some_and(|y| day.year() != y) {
            return false;
        }
        if self.effective_month().is_some_and(|m| day.month() != m) {
            return false;
        }
        if self.effective_day().is_some_and(|d| day.day() != d) {
            return false;
        }

        if let Some(slug) = self.category_slug() {
            if !post.categories.iter().any(|c| c.slug == slug) {
                return false;
            }
        }
        if let Some(slug) = self.series_slug() {
            if post.series.as_ref().is_none_or(|s| s.slug != slug) {
                return false;
            }
        }
        if let Some(tag) = self.tag_name() {
            if !post.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(slug) = self.post_slug() {
            if post.slug != slug {
                return false;
            }
        }

        true
    }

    /// 在内存中筛选并按 `publish_date` 倒序排列
    ///
    /// 发布时间相同的文章保持输入顺序。
    pub fn apply<'a, I>(&self, posts: I, now: DateTime<Local>) -> Vec<Post>
    where
        I: IntoIterator<Item = &'a Post>,
    {
        let mut result: Vec<Post> = posts
            .into_iter()
            .filter(|p| self.matches(p, now))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
        result
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
