use chrono::{DateTime, Local};
use sqlx::{Postgres, QueryBuilder};

use super::{
    DBPool,
    models::{PostImageRow, PostRefRow, PostRow},
};
use crate::{
    content::{Category, Page, Post, PostFilter, PostImage, PostRef, Series, TagUsage},
    error::Result,
};

/// 相邻文章的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 发布时间更早的一篇
    Previous,
    /// 发布时间更晚的一篇
    Next,
}

/// 用于查询博客数据
///
/// 所有查询都是只读的，条件不匹配时返回空集合或 `None`。
pub trait Querier: Send + Sync {
    /// 按 [`PostFilter`] 查询文章，按发布时间倒序，再按 [`Page`] 切片
    fn posts(
        &self,
        filter: &PostFilter,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Post>>> + Send;

    /// 按 id 查询文章，不考虑可见性
    fn post_by_id(&self, id: i64) -> impl Future<Output = Result<Option<Post>>> + Send;

    /// 文章的全部图片，按 (`gallery_position`, `title`) 排序
    fn post_images(&self, post_id: i64) -> impl Future<Output = Result<Vec<PostImage>>> + Send;

    /// 已公开文章中与 `post` 相邻的一篇
    fn adjacent_post(
        &self,
        post: &Post,
        direction: Direction,
    ) -> impl Future<Output = Result<Option<PostRef>>> + Send;

    /// 全部分类，按标题排序
    fn categories(&self) -> impl Future<Output = Result<Vec<Category>>> + Send;

    fn category(&self, slug: &str) -> impl Future<Output = Result<Option<Category>>> + Send;

    /// 全部系列，按创建时间倒序
    fn series_list(&self) -> impl Future<Output = Result<Vec<Series>>> + Send;

    fn series(&self, slug: &str) -> impl Future<Output = Result<Option<Series>>> + Send;

    /// 使用中的标签及文章数，按名称排序
    fn tags(&self, require_published: bool) -> impl Future<Output = Result<Vec<TagUsage>>> + Send;
}

pub(super) const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.slug, p.author, p.publish_date, p.last_modified,
           p.is_published, p.is_featured, p.allow_comments, p.tags,
           p.meta_keywords, p.summary, p.content, p.created_on, p.updated_on,
           COALESCE(
               (SELECT jsonb_agg(jsonb_build_object('slug', c.slug, 'title', c.title) ORDER BY c.title)
                FROM post_categories pc
                INNER JOIN categories c ON c.id = pc.category_id
                WHERE pc.post_id = p.id),
               '[]'::jsonb
           ) AS categories,
           CASE WHEN s.id IS NULL THEN NULL
                ELSE jsonb_build_object('slug', s.slug, 'title', s.title)
           END AS series
    FROM posts p
    LEFT JOIN series s ON s.id = p.series_id
    "#;

/// 将 [`PostFilter`] 转换为 WHERE 子句
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter, now: DateTime<Local>) {
    builder.push(" WHERE TRUE");

    if filter.require_published {
        builder
            .push(" AND p.is_published AND p.publish_date <= ")
            .push_bind(now);
    }
    if filter.require_featured {
        builder.push(" AND p.is_featured");
    }

    if let Some(year) = filter.effective_year() {
        builder
            .push(" AND EXTRACT(YEAR FROM p.publish_day) = ")
            .push_bind(year);
    }
    if let Some(month) = filter.effective_month() {
        builder
            .push(" AND EXTRACT(MONTH FROM p.publish_day) = ")
            .push_bind(month as i32);
    }
    if let Some(day) = filter.effective_day() {
        builder
            .push(" AND EXTRACT(DAY FROM p.publish_day) = ")
            .push_bind(day as i32);
    }

    if let Some(slug) = filter.category_slug() {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM post_categories pc \
                 INNER JOIN categories c ON c.id = pc.category_id \
                 WHERE pc.post_id = p.id AND c.slug = ",
            )
            .push_bind(slug.to_string())
            .push(")");
    }
    if let Some(slug) = filter.series_slug() {
        builder.push(" AND s.slug = ").push_bind(slug.to_string());
    }
    if let Some(tag) = filter.tag_name() {
        builder
            .push(" AND ")
            .push_bind(tag.to_string())
            .push(" = ANY(p.tags)");
    }
    if let Some(slug) = filter.post_slug() {
        builder.push(" AND p.slug = ").push_bind(slug.to_string());
    }
}

impl Querier for DBPool {
    async fn posts(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>> {
        let Some((limit, offset)) = page.sql_window() else {
            return Ok(Vec::new());
        };
        if limit == Some(0) {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new(POST_SELECT);
        push_filter(&mut builder, filter, Local::now());

        builder.push(" ORDER BY p.publish_date DESC, p.id ");
        if let Some(limit) = limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        builder.push(" OFFSET ").push_bind(offset);

        let rows = builder.build_query_as::<PostRow>().fetch_all(self).await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn post_by_id(&self, id: i64) -> Result<Option<Post>> {
        let mut builder = QueryBuilder::<Postgres>::new(POST_SELECT);
        builder.push(" WHERE p.id = ").push_bind(id);

        let row = builder
            .build_query_as::<PostRow>()
            .fetch_optional(self)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn post_images(&self, post_id: i64) -> Result<Vec<PostImage>> {
        let rows = sqlx::query_as::<_, PostImageRow>(
            r#"
            SELECT id, post_id, title, summary, image, gallery_position
            FROM post_images
            WHERE post_id = $1
            ORDER BY gallery_position ASC NULLS LAST, title
            "#,
        )
        .bind(post_id)
        .fetch_all(self)
        .await?;

        Ok(rows.into_iter().map(PostImage::from).collect())
    }

    async fn adjacent_post(&self, post: &Post, direction: Direction) -> Result<Option<PostRef>> {
        // 发布时间相同时按 id 区分先后
        let sql = match direction {
            Direction::Previous => {
                r#"
                SELECT title, slug, publish_date
                FROM posts
                WHERE is_published AND publish_date < $1 AND (publish_date, id) < ($2, $3)
                ORDER BY publish_date DESC, id DESC
                LIMIT 1
                "#
            }
            Direction::Next => {
                r#"
                SELECT title, slug, publish_date
                FROM posts
                WHERE is_published AND publish_date < $1 AND (publish_date, id) > ($2, $3)
                ORDER BY publish_date ASC, id ASC
                LIMIT 1
                "#
            }
        };

        let row = sqlx::query_as::<_, PostRefRow>(sql)
            .bind(Local::now())
            .bind(post.publish_date)
            .bind(post.id)
            .fetch_optional(self)
            .await?;
        Ok(row.map(PostRef::from))
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>(
            r#"
            SELECT id, title, slug, summary
            FROM categories
            ORDER BY title
            "#,
        )
        .fetch_all(self)
        .await?)
    }

    async fn category(&self, slug: &str) -> Result<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, title, slug, summary FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self)
        .await?)
    }

    async fn series_list(&self) -> Result<Vec<Series>> {
        Ok(sqlx::query_as::<_, Series>(
            r#"
            SELECT id, title, slug, summary, preface, created_on
            FROM series
            ORDER BY created_on DESC
            "#,
        )
        .fetch_all(self)
        .await?)
    }

    async fn series(&self, slug: &str) -> Result<Option<Series>> {
        Ok(sqlx::query_as::<_, Series>(
            "SELECT id, title, slug, summary, preface, created_on FROM series WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self)
        .await?)
    }

    async fn tags(&self, require_published: bool) -> Result<Vec<TagUsage>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT t.name AS name, COUNT(*) AS count
            FROM posts p
            CROSS JOIN LATERAL UNNEST(p.tags) AS t(name)
            "#,
        );
        if require_published {
            builder
                .push(" WHERE p.is_published AND p.publish_date <= ")
                .push_bind(Local::now());
        }
        builder.push(" GROUP BY t.name ORDER BY t.name");

        Ok(builder.build_query_as::<TagUsage>().fetch_all(self).await?)
    }
}
