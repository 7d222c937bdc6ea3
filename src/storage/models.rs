use chrono::{DateTime, Local};
use sqlx::types::Json;

use crate::content::{CategoryRef, Post, PostImage, PostRef, SeriesRef};

/// 文章查询结果行
///
/// 分类和系列以 JSON 聚合在同一行中返回。
#[derive(Debug, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub author: String,
    pub publish_date: DateTime<Local>,
    pub last_modified: DateTime<Local>,
    pub is_published: bool,
    pub is_featured: bool,
    pub allow_comments: bool,
    pub tags: Vec<String>,
    pub meta_keywords: String,
    pub summary: String,
    pub content: String,
    pub created_on: DateTime<Local>,
    pub updated_on: DateTime<Local>,

    pub categories: Json<Vec<CategoryRef>>,
    pub series: Option<Json<SeriesRef>>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            slug: row.slug,
            author: row.author,
            publish_date: row.publish_date,
            last_modified: row.last_modified,
            is_published: row.is_published,
            is_featured: row.is_featured,
            allow_comments: row.allow_comments,
            tags: row.tags,
            categories: row.categories.0,
            series: row.series.map(|s| s.0),
            meta_keywords: row.meta_keywords,
            summary: row.summary,
            content: row.content,
            created_on: row.created_on,
            updated_on: row.updated_on,
        }
    }
}

/// 图片查询结果行
#[derive(Debug, sqlx::FromRow)]
pub struct PostImageRow {
    pub id: i64,
    pub post_id: i64,
    pub title: String,
    pub summary: String,
    pub image: String,
    pub gallery_position: Option<i32>,
}

impl From<PostImageRow> for PostImage {
    fn from(row: PostImageRow) -> Self {
        PostImage {
            id: row.id,
            post_id: row.post_id,
            title: row.title,
            summary: row.summary,
            image: row.image,
            gallery_position: row.gallery_position,
        }
    }
}

/// 上一篇 / 下一篇查询结果行
#[derive(Debug, sqlx::FromRow)]
pub struct PostRefRow {
    pub title: String,
    pub slug: String,
    pub publish_date: DateTime<Local>,
}

impl From<PostRefRow> for PostRef {
    fn from(row: PostRefRow) -> Self {
        PostRef::new(row.title, row.slug, row.publish_date)
    }
}
