use chrono::Local;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::{
    DBPool, Querier,
    models::{PostImageRow, PostRow},
    querier::POST_SELECT,
};
use crate::{
    content::{
        Category, CategoryInput, Post, PostImage, PostImageInput, PostInput, Series, SeriesInput,
    },
    error::{ApiError, Error, Result},
};

/// 提供博客数据的写入接口
///
/// 每个操作只写入一行（及其关联表），在存储自身的事务中完成。
/// 不存在的记录返回 `None` / `false`，违反唯一约束返回 [`ApiError::Conflict`]。
pub trait Store: Querier {
    /// 新建文章
    fn create_post(&self, input: &PostInput) -> impl Future<Output = Result<Post>> + Send;

    /// 更新文章
    fn update_post(
        &self,
        id: i64,
        input: &PostInput,
    ) -> impl Future<Output = Result<Option<Post>>> + Send;

    /// 删除文章，同时删除其图片
    fn delete_post(&self, id: i64) -> impl Future<Output = Result<bool>> + Send;

    /// 为文章添加图片
    fn add_image(
        &self,
        post_id: i64,
        input: &PostImageInput,
    ) -> impl Future<Output = Result<Option<PostImage>>> + Send;

    fn delete_image(&self, id: i64) -> impl Future<Output = Result<bool>> + Send;

    fn create_category(&self, input: &CategoryInput)
    -> impl Future<Output = Result<Category>> + Send;

    fn update_category(
        &self,
        id: i64,
        input: &CategoryInput,
    ) -> impl Future<Output = Result<Option<Category>>> + Send;

    /// 删除分类，文章与该分类的关联一并删除
    fn delete_category(&self, id: i64) -> impl Future<Output = Result<bool>> + Send;

    fn create_series(&self, input: &SeriesInput) -> impl Future<Output = Result<Series>> + Send;

    fn update_series(
        &self,
        id: i64,
        input: &SeriesInput,
    ) -> impl Future<Output = Result<Option<Series>>> + Send;

    /// 删除系列，其中的文章不再属于任何系列
    fn delete_series(&self, id: i64) -> impl Future<Output = Result<bool>> + Send;
}

/// 将唯一约束冲突转换为 [`ApiError::Conflict`]
fn map_conflict(e: sqlx::Error, message: &str) -> Error {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict(message.to_string()).into()
        }
        e => e.into(),
    }
}

const POST_SLUG_CONFLICT: &str = "a post with this slug already exists on that day";

/// 解析表单中的系列和分类 slug
async fn resolve_refs(
    conn: &mut PgConnection,
    input: &PostInput,
) -> Result<(Option<i64>, Vec<i64>)> {
    let series_id = match &input.series {
        Some(slug) => Some(
            sqlx::query_scalar::<_, i64>("SELECT id FROM series WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| ApiError::Invalid(format!("unknown series: {}", slug)))?,
        ),
        None => None,
    };

    let category_ids: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, slug FROM categories WHERE slug = ANY($1)")
            .bind(&input.categories)
            .fetch_all(&mut *conn)
            .await?;
    if let Some(missing) = input
        .categories
        .iter()
        .find(|slug| !category_ids.iter().any(|(_, s)| s == *slug))
    {
        return Err(ApiError::Invalid(format!("unknown category: {}", missing)).into());
    }

    Ok((series_id, category_ids.into_iter().map(|(id, _)| id).collect()))
}

async fn replace_categories(conn: &mut PgConnection, post_id: i64, ids: &[i64]) -> Result<()> {
    sqlx::query("DELETE FROM post_categories WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    if !ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO post_categories (post_id, category_id)
            SELECT $1, UNNEST($2::BIGINT[])
            "#,
        )
        .bind(post_id)
        .bind(ids)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_post(conn: &mut PgConnection, id: i64) -> Result<Option<Post>> {
    let mut builder = QueryBuilder::<Postgres>::new(POST_SELECT);
    builder.push(" WHERE p.id = ").push_bind(id);

    let row = builder
        .build_query_as::<PostRow>()
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(Post::from))
}

impl Store for DBPool {
    async fn create_post(&self, input: &PostInput) -> Result<Post> {
        let mut tx = self.begin().await?;
        let (series_id, category_ids) = resolve_refs(&mut tx, input).await?;

        let now = Local::now();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts
                (title, slug, author, publish_date, publish_day, last_modified,
                 is_published, is_featured, allow_comments, tags, series_id,
                 meta_keywords, summary, content, created_on, updated_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
            RETURNING id
            "#,
        )
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.author)
        .bind(input.publish_date)
        .bind(input.publish_day())
        .bind(input.last_modified)
        .bind(input.is_published)
        .bind(input.is_featured)
        .bind(input.allow_comments)
        .bind(input.tag_list())
        .bind(series_id)
        .bind(&input.meta_keywords)
        .bind(&input.summary)
        .bind(&input.content)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_conflict(e, POST_SLUG_CONFLICT))?;

        replace_categories(&mut tx, id, &category_ids).await?;
        let post = fetch_post(&mut tx, id).await?;
        tx.commit().await?;

        post.ok_or_else(Error::not_found)
    }

    async fn update_post(&self, id: i64, input: &PostInput) -> Result<Option<Post>> {
        let mut tx = self.begin().await?;
        let (series_id, category_ids) = resolve_refs(&mut tx, input).await?;

        let updated = sqlx::query(
            r#"
            UPDATE posts SET
                title = $2,
                slug = $3,
                author = $4,
                publish_date = $5,
                publish_day = $6,
                last_modified = $7,
                is_published = $8,
                is_featured = $9,
                allow_comments = $10,
                tags = $11,
                series_id = $12,
                meta_keywords = $13,
                summary = $14,
                content = $15,
                updated_on = $16
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.author)
        .bind(input.publish_date)
        .bind(input.publish_day())
        .bind(input.last_modified)
        .bind(input.is_published)
        .bind(input.is_featured)
        .bind(input.allow_comments)
        .bind(input.tag_list())
        .bind(series_id)
        .bind(&input.meta_keywords)
        .bind(&input.summary)
        .bind(&input.content)
        .bind(Local::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_conflict(e, POST_SLUG_CONFLICT))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        replace_categories(&mut tx, id, &category_ids).await?;
        let post = fetch_post(&mut tx, id).await?;
        tx.commit().await?;
        Ok(post)
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_image(&self, post_id: i64, input: &PostImageInput) -> Result<Option<PostImage>> {
        let Some(post) = self.post_by_id(post_id).await? else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, PostImageRow>(
            r#"
            INSERT INTO post_images (post_id, title, summary, image, gallery_position)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id, title, summary, image, gallery_position
            "#,
        )
        .bind(post_id)
        .bind(&input.title)
        .bind(&input.summary)
        .bind(PostImage::upload_path(&post, &input.file_name))
        .bind(input.gallery_position)
        .fetch_one(self)
        .await?;

        Ok(Some(row.into()))
    }

    async fn delete_image(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM post_images WHERE id = $1")
            .bind(id)
            .execute(self)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_category(&self, input: &CategoryInput) -> Result<Category> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (title, slug, summary)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, summary
            "#,
        )
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.summary)
        .fetch_one(self)
        .await
        .map_err(|e| map_conflict(e, "category slug already exists"))
    }

    async fn update_category(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET title = $2, slug = $3, summary = $4
            WHERE id = $1
            RETURNING id, title, slug, summary
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.summary)
        .fetch_optional(self)
        .await
        .map_err(|e| map_conflict(e, "category slug already exists"))
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_series(&self, input: &SeriesInput) -> Result<Series> {
        sqlx::query_as::<_, Series>(
            r#"
            INSERT INTO series (title, slug, summary, preface, created_on)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, slug, summary, preface, created_on
            "#,
        )
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.summary)
        .bind(&input.preface)
        .bind(input.created_on)
        .fetch_one(self)
        .await
        .map_err(|e| map_conflict(e, "series slug already exists"))
    }

    async fn update_series(&self, id: i64, input: &SeriesInput) -> Result<Option<Series>> {
        sqlx::query_as::<_, Series>(
            r#"
            UPDATE series SET title = $2, slug = $3, summary = $4, preface = $5, created_on = $6
            WHERE id = $1
            RETURNING id, title, slug, summary, preface, created_on
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.summary)
        .bind(&input.preface)
        .bind(input.created_on)
        .fetch_optional(self)
        .await
        .map_err(|e| map_conflict(e, "series slug already exists"))
    }

    async fn delete_series(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM series WHERE id = $1")
            .bind(id)
            .execute(self)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
