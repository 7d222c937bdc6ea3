use chrono::{DateTime, Local, TimeZone};

use super::Post;

/// 已发布、无分类无标签的文章
pub(crate) fn sample_post(id: i64, slug: &str, publish_date: DateTime<Local>) -> Post {
    Post {
        id,
        title: format!("Post {}", id),
        slug: slug.to_string(),
        author: "alice".to_string(),
        publish_date,
        last_modified: publish_date,
        is_published: true,
        is_featured: false,
        allow_comments: true,
        tags: Vec::new(),
        categories: Vec::new(),
        series: None,
        meta_keywords: String::new(),
        summary: "summary".to_string(),
        content: "content".to_string(),
        created_on: publish_date,
        updated_on: publish_date,
    }
}

pub(crate) fn local(year: i32, month: u32, day: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("本地时间不明确")
}
