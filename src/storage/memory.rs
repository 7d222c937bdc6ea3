//! 内存存储，未配置数据库时使用，数据在进程重启后丢失。

use std::{collections::BTreeMap, sync::Arc};

use chrono::Local;
use tokio::sync::RwLock;

use super::{Direction, Querier, Store};
use crate::{
    content::{
        Category, CategoryInput, CategoryRef, Page, Post, PostFilter, PostImage, PostImageInput,
        PostInput, PostRef, Series, SeriesInput, SeriesRef, TagUsage,
    },
    error::{ApiError, Result},
};

/// 文章记录，分类与系列以 id 引用，读取时再解析
#[derive(Debug, Clone)]
struct PostRecord {
    post: Post,
    category_ids: Vec<i64>,
    series_id: Option<i64>,
}

#[derive(Debug, Default)]
struct Tables {
    posts: Vec<PostRecord>,
    categories: Vec<Category>,
    series: Vec<Series>,
    images: Vec<PostImage>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn resolve(&self, record: &PostRecord) -> Post {
        let mut post = record.post.clone();

        let mut categories: Vec<CategoryRef> = self
            .categories
            .iter()
            .filter(|c| record.category_ids.contains(&c.id))
            .map(Category::to_ref)
            .collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        post.categories = categories;

        post.series = record
            .series_id
            .and_then(|id| self.series.iter().find(|s| s.id == id))
            .map(Series::to_ref);
        post
    }

    fn all_posts(&self) -> Vec<Post> {
        self.posts.iter().map(|r| self.resolve(r)).collect()
    }

    fn find_post(&self, id: i64) -> Option<Post> {
        self.posts
            .iter()
            .find(|r| r.post.id == id)
            .map(|r| self.resolve(r))
    }

    /// 解析表单中的系列和分类 slug
    fn resolve_refs(&self, input: &PostInput) -> Result<(Option<i64>, Vec<i64>)> {
        let series_id = match &input.series {
            Some(slug) => Some(
                self.series
                    .iter()
                    .find(|s| &s.slug == slug)
                    .map(|s| s.id)
                    .ok_or_else(|| ApiError::Invalid(format!("unknown series: {}", slug)))?,
            ),
            None => None,
        };

        let category_ids = input
            .categories
            .iter()
            .map(|slug| {
                self.categories
                    .iter()
                    .find(|c| &c.slug == slug)
                    .map(|c| c.id)
                    .ok_or_else(|| ApiError::Invalid(format!("unknown category: {}", slug)))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((series_id, category_ids))
    }

    /// 同一发布日内 slug 唯一
    fn check_post_slug(&self, input: &PostInput, except: Option<i64>) -> Result<()> {
        let taken = self.posts.iter().any(|r| {
            Some(r.post.id) != except
                && r.post.slug == input.slug
                && r.post.publish_day() == input.publish_day()
        });
        if taken {
            return Err(ApiError::Conflict(
                "a post with this slug already exists on that day".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

fn post_from_input(id: i64, input: &PostInput, created_on: chrono::DateTime<Local>) -> Post {
    Post {
        id,
        title: input.title.clone(),
        slug: input.slug.clone(),
        author: input.author.clone(),
        publish_date: input.publish_date,
        last_modified: input.last_modified,
        is_published: input.is_published,
        is_featured: input.is_featured,
        allow_comments: input.allow_comments,
        tags: input.tag_list(),
        categories: Vec::new(),
        series: None,
        meta_keywords: input.meta_keywords.clone(),
        summary: input.summary.clone(),
        content: input.content.clone(),
        created_on,
        updated_on: Local::now(),
    }
}

/// 基于 [`RwLock`] 的内存存储
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Querier for MemoryStore {
    async fn posts(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        let posts = tables.all_posts();
        Ok(page.apply(filter.apply(&posts, Local::now())))
    }

    async fn post_by_id(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.tables.read().await.find_post(id))
    }

    async fn post_images(&self, post_id: i64) -> Result<Vec<PostImage>> {
        let tables = self.tables.read().await;
        let mut images: Vec<PostImage> = tables
            .images
            .iter()
            .filter(|i| i.post_id == post_id)
            .cloned()
            .collect();
        PostImage::sort(&mut images);
        Ok(images)
    }

    async fn adjacent_post(&self, post: &Post, direction: Direction) -> Result<Option<PostRef>> {
        let tables = self.tables.read().await;
        let now = Local::now();
        let candidates = tables
            .posts
            .iter()
            .map(|r| &r.post)
            .filter(|p| p.is_published && p.publish_date < now);

        // 发布时间相同时按 id 区分先后
        let key = (post.publish_date, post.id);
        let found = match direction {
            Direction::Previous => candidates
                .filter(|p| (p.publish_date, p.id) < key)
                .max_by_key(|p| (p.publish_date, p.id)),
            Direction::Next => candidates
                .filter(|p| (p.publish_date, p.id) > key)
                .min_by_key(|p| (p.publish_date, p.id)),
        };
        Ok(found.map(Post::to_ref))
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.tables.read().await.categories.clone();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn category(&self, slug: &str) -> Result<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn series_list(&self) -> Result<Vec<Series>> {
        let mut series = self.tables.read().await.series.clone();
        series.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        Ok(series)
    }

    async fn series(&self, slug: &str) -> Result<Option<Series>> {
        let tables = self.tables.read().await;
        Ok(tables.series.iter().find(|s| s.slug == slug).cloned())
    }

    async fn tags(&self, require_published: bool) -> Result<Vec<TagUsage>> {
        let tables = self.tables.read().await;
        let now = Local::now();

        let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
        for record in &tables.posts {
            if require_published && !record.post.is_live_at(now) {
                continue;
            }
            for tag in &record.post.tags {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }

        let usage = counts
            .into_iter()
            .map(|(name, count)| TagUsage {
                name: name.to_string(),
                count,
            })
            .collect();
        Ok(usage)
    }
}

impl Store for MemoryStore {
    async fn create_post(&self, input: &PostInput) -> Result<Post> {
        let mut tables = self.tables.write().await;
        let (series_id, category_ids) = tables.resolve_refs(input)?;
        tables.check_post_slug(input, None)?;

        let id = tables.next_id();
        let record = PostRecord {
            post: post_from_input(id, input, Local::now()),
            category_ids,
            series_id,
        };
        let post = tables.resolve(&record);
        tables.posts.push(record);
        Ok(post)
    }

    async fn update_post(&self, id: i64, input: &PostInput) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables.posts.iter().position(|r| r.post.id == id) else {
            return Ok(None);
        };
        let (series_id, category_ids) = tables.resolve_refs(input)?;
        tables.check_post_slug(input, Some(id))?;

        let created_on = tables.posts[index].post.created_on;
        let record = PostRecord {
            post: post_from_input(id, input, created_on),
            category_ids,
            series_id,
        };
        let post = tables.resolve(&record);
        tables.posts[index] = record;
        Ok(Some(post))
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|r| r.post.id != id);
        tables.images.retain(|i| i.post_id != id);
        Ok(tables.posts.len() < before)
    }

    async fn add_image(&self, post_id: i64, input: &PostImageInput) -> Result<Option<PostImage>> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.find_post(post_id) else {
            return Ok(None);
        };

        let image = PostImage {
            id: tables.next_id(),
            post_id,
            title: input.title.clone(),
            summary: input.summary.clone(),
            image: PostImage::upload_path(&post, &input.file_name),
            gallery_position: input.gallery_position,
        };
        tables.images.push(image.clone());
        Ok(Some(image))
    }

    async fn delete_image(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.images.len();
        tables.images.retain(|i| i.id != id);
        Ok(tables.images.len() < before)
    }

    async fn create_category(&self, input: &CategoryInput) -> Result<Category> {
        let mut tables = self.tables.write().await;
        if tables.categories.iter().any(|c| c.slug == input.slug) {
            return Err(ApiError::Conflict("category slug already exists".to_string()).into());
        }

        let category = Category {
            id: tables.next_id(),
            title: input.title.clone(),
            slug: input.slug.clone(),
            summary: input.summary.clone(),
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>> {
        let mut tables = self.tables.write().await;
        if tables
            .categories
            .iter()
            .any(|c| c.id != id && c.slug == input.slug)
        {
            return Err(ApiError::Conflict("category slug already exists".to_string()).into());
        }

        let Some(category) = tables.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        category.title = input.title.clone();
        category.slug = input.slug.clone();
        category.summary = input.summary.clone();
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        for record in &mut tables.posts {
            record.category_ids.retain(|c| *c != id);
        }
        Ok(tables.categories.len() < before)
    }

    async fn create_series(&self, input: &SeriesInput) -> Result<Series> {
        let mut tables = self.tables.write().await;
        if tables.series.iter().any(|s| s.slug == input.slug) {
            return Err(ApiError::Conflict("series slug already exists".to_string()).into());
        }

        let series = Series {
            id: tables.next_id(),
            title: input.title.clone(),
            slug: input.slug.clone(),
            summary: input.summary.clone(),
            preface: input.preface.clone(),
            created_on: input.created_on,
        };
        tables.series.push(series.clone());
        Ok(series)
    }

    async fn update_series(&self, id: i64, input: &SeriesInput) -> Result<Option<Series>> {
        let mut tables = self.tables.write().await;
        if tables
            .series
            .iter()
            .any(|s| s.id != id && s.slug == input.slug)
        {
            return Err(ApiError::Conflict("series slug already exists".to_string()).into());
        }

        let Some(series) = tables.series.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        series.title = input.title.clone();
        series.slug = input.slug.clone();
        series.summary = input.summary.clone();
        series.preface = input.preface.clone();
        series.created_on = input.created_on;
        Ok(Some(series.clone()))
    }

    async fn delete_series(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.series.len();
        tables.series.retain(|s| s.id != id);
        for record in &mut tables.posts {
            if record.series_id == Some(id) {
                record.series_id = None;
            }
        }
        Ok(tables.series.len() < before)
    }
}
