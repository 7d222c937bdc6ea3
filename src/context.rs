//! 页面上下文组装
//!
//! 根据访问者是否为管理员决定可见性：管理员可以看到草稿和定时发布的文章，
//! 其他访问者只能看到已发布且发布时间已到的文章。

use chrono::Local;
use serde::Serialize;

use crate::{
    config::CommentSettings,
    content::{
        Category, CommentPolicy, Page, Post, PostArchive, PostFilter, PostImage, PostRef, Series,
        TagUsage,
    },
    error::{Error, Result},
    storage::{Direction, Querier},
};

/// 访问者身份
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    pub is_staff: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self { is_staff: false }
    }

    pub fn staff() -> Self {
        Self { is_staff: true }
    }

    /// 非管理员只能看到已发布的文章
    pub fn require_published(&self) -> bool {
        !self.is_staff
    }

    pub fn filter(&self) -> PostFilter {
        PostFilter::new(self.require_published())
    }
}

/// 文章列表查询参数
#[derive(Debug, Clone, Default)]
pub struct PostsQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub category: Option<String>,
    pub series: Option<String>,
    pub tag: Option<String>,
    pub featured: bool,
    pub page: Page,
}

/// 文章列表上下文
#[derive(Debug, Serialize)]
pub struct PostsContext {
    pub posts: Vec<Post>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// 文章详情上下文
#[derive(Debug, Serialize)]
pub struct PostContext {
    pub post: Post,
    /// 图集图片
    pub gallery: Vec<PostImage>,
    pub previous: Option<PostRef>,
    pub next: Option<PostRef>,
    pub comments: CommentPolicy,
}

#[derive(Debug, Serialize)]
pub struct CategoryContext {
    pub category: Category,
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct SeriesContext {
    pub series: Series,
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct TagContext {
    pub tag: TagUsage,
    pub posts: Vec<Post>,
}

/// 绑定了存储和访问者的上下文构造器
pub struct Context<'a, Q> {
    querier: &'a Q,
    viewer: Viewer,
}

impl<'a, Q: Querier> Context<'a, Q> {
    pub fn new(querier: &'a Q, viewer: Viewer) -> Self {
        Self { querier, viewer }
    }

    /// 文章列表
    ///
    /// 指定的分类或系列不存在时返回 NotFound。
    pub async fn posts(&self, query: PostsQuery) -> Result<PostsContext> {
        let category = match query.category.as_deref().filter(|s| !s.is_empty()) {
            Some(slug) => Some(self.querier.category(slug).await?.ok_or_else(Error::not_found)?),
            None => None,
        };
        let series = match query.series.as_deref().filter(|s| !s.is_empty()) {
            Some(slug) => Some(self.querier.series(slug).await?.ok_or_else(Error::not_found)?),
            None => None,
        };

        let filter = PostFilter {
            require_featured: query.featured,
            year: query.year,
            month: query.month,
            category: query.category,
            series: query.series,
            tag: query.tag.clone(),
            ..self.viewer.filter()
        };
        let posts = self.querier.posts(&filter, query.page).await?;

        Ok(PostsContext {
            posts,
            year: filter.effective_year(),
            month: filter.effective_month(),
            category,
            series,
            tag: query.tag.filter(|t| !t.is_empty()),
        })
    }

    /// 推荐文章
    pub async fn featured(&self, page: Page) -> Result<Vec<Post>> {
        self.querier.posts(&self.viewer.filter().featured(), page).await
    }

    /// 按日期和 slug 获取单篇文章
    ///
    /// 文章不存在与对当前访问者不可见一律返回 NotFound。
    pub async fn post(
        &self,
        year: i32,
        month: u32,
        day: u32,
        slug: &str,
        comments: &CommentSettings,
    ) -> Result<PostContext> {
        let filter = self.viewer.filter().year(year).month(month).day(day).slug(slug);
        let post = self
            .querier
            .posts(&filter, Page::latest(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(Error::not_found)?;

        let gallery = PostImage::gallery(self.querier.post_images(post.id).await?);
        let previous = self.querier.adjacent_post(&post, Direction::Previous).await?;
        let next = self.querier.adjacent_post(&post, Direction::Next).await?;
        let comments = CommentPolicy::evaluate(comments, &post, Local::now());

        Ok(PostContext {
            post,
            gallery,
            previous,
            next,
            comments,
        })
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.querier.categories().await
    }

    pub async fn category(&self, slug: &str) -> Result<CategoryContext> {
        let category = self
            .querier
            .category(slug)
            .await?
            .ok_or_else(Error::not_found)?;
        let posts = self
            .querier
            .posts(&self.viewer.filter().category(slug), Page::default())
            .await?;
        Ok(CategoryContext { category, posts })
    }

    pub async fn series_list(&self) -> Result<Vec<Series>> {
        self.querier.series_list().await
    }

    pub async fn series(&self, slug: &str) -> Result<SeriesContext> {
        let series = self
            .querier
            .series(slug)
            .await?
            .ok_or_else(Error::not_found)?;
        let posts = self
            .querier
            .posts(&self.viewer.filter().series(slug), Page::default())
            .await?;
        Ok(SeriesContext { series, posts })
    }

    pub async fn tags(&self) -> Result<Vec<TagUsage>> {
        self.querier.tags(self.viewer.require_published()).await
    }

    /// 标签详情，没有可见文章使用该标签时返回 NotFound
    pub async fn tag(&self, name: &str) -> Result<TagContext> {
        let tag = self
            .tags()
            .await?
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(Error::not_found)?;
        let posts = self
            .querier
            .posts(&self.viewer.filter().tag(name), Page::default())
            .await?;
        Ok(TagContext { tag, posts })
    }

    /// 文章归档，可按年、月缩小范围
    pub async fn archive(&self, year: Option<i32>, month: Option<u32>) -> Result<PostArchive> {
        let filter = PostFilter {
            year,
            month,
            ..self.viewer.filter()
        };
        let posts = self.querier.posts(&filter, Page::default()).await?;
        Ok(PostArchive::from_posts(posts))
    }
}
