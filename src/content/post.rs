use std::cmp::Ordering;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};

use super::{
    CategoryRef, SeriesRef, parse_tag_input,
    taxonomy::{SLUG_MAX_LEN, TITLE_MAX_LEN, check_length},
};
use crate::error::{ApiError, Result};

/// 博客文章
///
/// `slug` 在同一发布日内唯一，发布日取 `publish_date` 的本地日期。
/// 序列化时额外输出 `display_title`、`path` 和 `categories_string`。
#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    /// 作者名称
    pub author: String,
    pub publish_date: DateTime<Local>,
    pub last_modified: DateTime<Local>,
    pub is_published: bool,
    pub is_featured: bool,
    pub allow_comments: bool,
    pub tags: Vec<String>,
    pub categories: Vec<CategoryRef>,
    pub series: Option<SeriesRef>,
    pub meta_keywords: String,
    /// 摘要，同时作为页面的 meta description
    pub summary: String,
    pub content: String,
    pub created_on: DateTime<Local>,
    pub updated_on: DateTime<Local>,
}

impl Post {
    /// 发布日（本地日期）
    pub fn publish_day(&self) -> NaiveDate {
        self.publish_date.date_naive()
    }

    /// 已发布且发布时间不晚于 `now`
    pub fn is_live_at(&self, now: DateTime<Local>) -> bool {
        self.is_published && self.publish_date <= now
    }

    /// 草稿在标题后追加 `(DRAFT)`
    pub fn display_title(&self) -> String {
        if self.is_published {
            self.title.clone()
        } else {
            format!("{} (DRAFT)", self.title)
        }
    }

    /// 以 `, ` 连接的分类标题
    pub fn categories_string(&self) -> String {
        self.categories
            .iter()
            .map(|c| c.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 文章详情路径，形如 `/2021/03/01/hello-world/`
    pub fn absolute_path(&self) -> String {
        post_path(self.publish_date, &self.slug)
    }

    pub fn to_ref(&self) -> PostRef {
        PostRef::new(self.title.clone(), self.slug.clone(), self.publish_date)
    }
}

impl Serialize for Post {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Post", 20)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("title", &self.title)?;
        s.serialize_field("display_title", &self.display_title())?;
        s.serialize_field("slug", &self.slug)?;
        s.serialize_field("path", &self.absolute_path())?;
        s.serialize_field("author", &self.author)?;
        s.serialize_field("publish_date", &self.publish_date)?;
        s.serialize_field("last_modified", &self.last_modified)?;
        s.serialize_field("is_published", &self.is_published)?;
        s.serialize_field("is_featured", &self.is_featured)?;
        s.serialize_field("allow_comments", &self.allow_comments)?;
        s.serialize_field("tags", &self.tags)?;
        s.serialize_field("categories", &self.categories)?;
        s.serialize_field("categories_string", &self.categories_string())?;
        s.serialize_field("series", &self.series)?;
        s.serialize_field("meta_keywords", &self.meta_keywords)?;
        s.serialize_field("summary", &self.summary)?;
        s.serialize_field("content", &self.content)?;
        s.serialize_field("created_on", &self.created_on)?;
        s.serialize_field("updated_on", &self.updated_on)?;
        s.end()
    }
}

fn post_path(publish_date: DateTime<Local>, slug: &str) -> String {
    format!("/{}/{}/", publish_date.date_naive().format("%Y/%m/%d"), slug)
}

/// 上一篇 / 下一篇导航使用的文章引用
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRef {
    pub title: String,
    pub slug: String,
    pub publish_date: DateTime<Local>,
    pub path: String,
}

impl PostRef {
    pub fn new(title: String, slug: String, publish_date: DateTime<Local>) -> Self {
        let path = post_path(publish_date, &slug);
        Self {
            title,
            slug,
            publish_date,
            path,
        }
    }
}

fn default_true() -> bool {
    true
}

/// 后台提交的文章表单
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    /// 为空时由标题生成
    #[serde(default)]
    pub slug: String,
    pub author: String,
    #[serde(default = "Local::now")]
    pub publish_date: DateTime<Local>,
    #[serde(default = "Local::now")]
    pub last_modified: DateTime<Local>,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub allow_comments: bool,
    /// 原始标签文本，见 [`parse_tag_input`]
    #[serde(default)]
    pub tags: String,
    /// 分类 slug 列表
    #[serde(default)]
    pub categories: Vec<String>,
    /// 系列 slug
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub meta_keywords: String,
    pub summary: String,
    pub content: String,
}

impl PostInput {
    /// 校验必填字段并补全 slug
    pub fn normalize(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(ApiError::Invalid("title is required".into()).into());
        }
        if self.author.trim().is_empty() {
            return Err(ApiError::Invalid("author is required".into()).into());
        }
        if self.summary.trim().is_empty() {
            return Err(ApiError::Invalid("summary is required".into()).into());
        }
        if self.content.trim().is_empty() {
            return Err(ApiError::Invalid("content is required".into()).into());
        }

        self.slug = if self.slug.trim().is_empty() {
            slug::slugify(&self.title)
        } else {
            slug::slugify(self.slug.trim())
        };
        if self.slug.is_empty() {
            return Err(ApiError::Invalid("slug is empty".into()).into());
        }
        check_length("title", &self.title, TITLE_MAX_LEN)?;
        check_length("slug", &self.slug, SLUG_MAX_LEN)?;
        check_length("meta_keywords", &self.meta_keywords, TITLE_MAX_LEN)?;

        self.series = self.series.filter(|s| !s.trim().is_empty());
        self.categories.retain(|c| !c.trim().is_empty());
        self.categories.sort();
        self.categories.dedup();

        Ok(self)
    }

    pub fn publish_day(&self) -> NaiveDate {
        self.publish_date.date_naive()
    }

    pub fn tag_list(&self) -> Vec<String> {
        parse_tag_input(&self.tags)
    }
}

/// 文章图片
///
/// 只有设置了 `gallery_position` 的图片会出现在文章图集中，其余仅作为附件。
#[derive(Debug, Clone, Serialize)]
pub struct PostImage {
    pub id: i64,
    pub post_id: i64,
    pub title: String,
    pub summary: String,
    /// 存储路径
    pub image: String,
    pub gallery_position: Option<i32>,
}

impl PostImage {
    pub fn in_gallery(&self) -> bool {
        self.gallery_position.is_some()
    }

    /// 图片存储路径：`apps/blogyall/images/{发布日}/{slug}/{文件名}`
    pub fn upload_path(post: &Post, file_name: &str) -> String {
        [
            "apps",
            "blogyall",
            "images",
            &post.publish_day().format("%Y-%m-%d").to_string(),
            &post.slug,
            file_name,
        ]
        .join("/")
    }

    /// 按 (`gallery_position`, `title`) 排序，未设置位置的排在最后
    pub fn sort(images: &mut [PostImage]) {
        images.sort_by(|a, b| {
            let position = match (a.gallery_position, b.gallery_position) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            position.then_with(|| a.title.cmp(&b.title))
        });
    }

    /// 过滤出图集图片，并保持排序
    pub fn gallery(mut images: Vec<PostImage>) -> Vec<PostImage> {
        images.retain(PostImage::in_gallery);
        Self::sort(&mut images);
        images
    }
}

/// 后台提交的图片表单
#[derive(Debug, Clone, Deserialize)]
pub struct PostImageInput {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// 原始文件名
    pub file_name: String,
    #[serde(default)]
    pub gallery_position: Option<i32>,
}

impl PostImageInput {
    pub fn normalize(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(ApiError::Invalid("title is required".into()).into());
        }
        check_length("title", &self.title, TITLE_MAX_LEN)?;
        if self.file_name.is_empty() || self.file_name.contains('/') {
            return Err(ApiError::Invalid("invalid file name".into()).into());
        }
        if matches!(self.gallery_position, Some(p) if p < 0) {
            return Err(ApiError::Invalid("gallery position must not be negative".into()).into());
        }
        Ok(self)
    }
}
