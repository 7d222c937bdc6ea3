use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// 分类，平铺结构，无层级
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: String,
}

impl Category {
    pub fn absolute_path(&self) -> String {
        format!("/categories/{}/", self.slug)
    }

    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            slug: self.slug.clone(),
            title: self.title.clone(),
        }
    }
}

/// 文章中引用的分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub slug: String,
    pub title: String,
}

/// 文章系列，一篇文章最多属于一个系列
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Series {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub preface: String,
    pub created_on: DateTime<Local>,
}

impl Series {
    pub fn absolute_path(&self) -> String {
        format!("/series/{}/", self.slug)
    }

    pub fn to_ref(&self) -> SeriesRef {
        SeriesRef {
            slug: self.slug.clone(),
            title: self.title.clone(),
        }
    }
}

/// 文章中引用的系列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRef {
    pub slug: String,
    pub title: String,
}

/// 后台提交的分类表单
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
}

impl CategoryInput {
    pub fn normalize(mut self) -> Result<Self> {
        (self.title, self.slug) = title_and_slug(self.title, self.slug, CATEGORY_TITLE_MAX_LEN)?;
        Ok(self)
    }
}

/// 后台提交的系列表单
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesInput {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub preface: String,
    #[serde(default = "Local::now")]
    pub created_on: DateTime<Local>,
}

impl SeriesInput {
    pub fn normalize(mut self) -> Result<Self> {
        (self.title, self.slug) = title_and_slug(self.title, self.slug, TITLE_MAX_LEN)?;
        Ok(self)
    }
}

/// slug 的最大长度，与数据库列宽一致
pub(super) const SLUG_MAX_LEN: usize = 50;
pub(super) const TITLE_MAX_LEN: usize = 255;
const CATEGORY_TITLE_MAX_LEN: usize = 100;

/// 按字符数检查长度，超出时返回 [`ApiError::Invalid`]
pub(super) fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(ApiError::Invalid(format!("{} is longer than {} characters", field, max)).into());
    }
    Ok(())
}

/// 标题必填，slug 为空时由标题生成
fn title_and_slug(title: String, slug: String, title_max: usize) -> Result<(String, String)> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Invalid("title is required".into()).into());
    }
    check_length("title", &title, title_max)?;

    let slug = match slug.trim() {
        "" => slug::slugify(&title),
        s => slug::slugify(s),
    };
    if slug.is_empty() {
        return Err(ApiError::Invalid("slug is empty".into()).into());
    }
    check_length("slug", &slug, SLUG_MAX_LEN)?;

    Ok((title, slug))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_input_prepopulates_slug() {
        let input = CategoryInput {
            title: "Rust Notes & Tips".to_string(),
            slug: String::new(),
            summary: String::new(),
        }
        .normalize()
        .expect("校验失败");

        assert_eq!(input.slug, "rust-notes-tips");
    }

    #[test]
    fn test_series_input_keeps_given_slug() {
        let input = SeriesInput {
            title: "Writing a Parser".to_string(),
            slug: "parser".to_string(),
            summary: String::new(),
            preface: String::new(),
            created_on: Local::now(),
        }
        .normalize()
        .expect("校验失败");

        assert_eq!(input.slug, "parser");
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let input = CategoryInput {
            title: "   ".to_string(),
            slug: "x".to_string(),
            summary: String::new(),
        };
        assert!(input.normalize().is_err());
    }

    #[test]
    fn test_lengths_match_column_widths() {
        let long_title = CategoryInput {
            title: "x".repeat(101),
            slug: "x".to_string(),
            summary: String::new(),
        };
        assert!(long_title.normalize().is_err());

        // 由标题生成的 slug 超过 50 个字符
        let long_slug = CategoryInput {
            title: "word ".repeat(12),
            slug: String::new(),
            summary: String::new(),
        };
        assert!(long_slug.normalize().is_err_and(|e| matches!(
            e,
            crate::error::Error::ApiError(ApiError::Invalid(_))
        )));

        let fits = CategoryInput {
            title: "é".repeat(100),
            slug: "x".repeat(50),
            summary: String::new(),
        };
        assert!(fits.normalize().is_ok());
    }
}
