//! 订阅源与站点地图

use atom_syndication::{Entry, Feed, Link};
use chrono::{DateTime, Local};

use crate::{
    config::Settings,
    content::{Category, Post, Series},
    error::Result,
};

/// 生成已发布文章的 Atom 订阅源
///
/// 每个条目包含标题、正文与最后修改时间。
pub fn post_feed(settings: &Settings, posts: &[Post]) -> Result<String> {
    let home_page = settings.absolute_url(&settings.feed.link);
    let updated = posts
        .iter()
        .map(|p| p.last_modified)
        .max()
        .unwrap_or_else(Local::now);

    let feed = Feed {
        entries: posts.iter().map(|p| feed_entry(settings, p)).collect(),
        title: settings.feed.title.clone().into(),
        id: home_page.clone(),
        updated: updated.fixed_offset(),
        subtitle: Some(settings.feed.description.clone().into()),
        links: vec![alternate_link(home_page)],
        ..Default::default()
    };

    let buffer = feed.write_to(Vec::new())?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn feed_entry(settings: &Settings, post: &Post) -> Entry {
    let url = settings.absolute_url(&post.absolute_path());
    Entry {
        id: url.clone(),
        title: post.title.clone().into(),
        updated: post.last_modified.fixed_offset(),
        links: vec![alternate_link(url)],
        summary: Some(post.content.clone().into()),
        published: Some(post.publish_date.fixed_offset()),
        ..Default::default()
    }
}

fn alternate_link(href: String) -> Link {
    Link {
        href,
        rel: "alternate".to_string(),
        ..Default::default()
    }
}

/// 生成站点地图
///
/// 包含已发布文章（`lastmod` 为最后修改时间）、全部分类与全部系列（`lastmod` 为创建时间）。
pub fn sitemap(settings: &Settings, posts: &[Post], categories: &[Category], series: &[Series]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    for post in posts {
        push_url(&mut xml, &settings.absolute_url(&post.absolute_path()), Some(post.last_modified));
    }
    for category in categories {
        push_url(&mut xml, &settings.absolute_url(&category.absolute_path()), None);
    }
    for s in series {
        push_url(&mut xml, &settings.absolute_url(&s.absolute_path()), Some(s.created_on));
    }

    xml.push_str("</urlset>\n");
    xml
}

fn push_url(xml: &mut String, loc: &str, lastmod: Option<DateTime<Local>>) {
    xml.push_str("  <url>\n    <loc>");
    xml.push_str(&escape(loc));
    xml.push_str("</loc>\n");
    if let Some(lastmod) = lastmod {
        xml.push_str("    <lastmod>");
        xml.push_str(&lastmod.format("%Y-%m-%d").to_string());
        xml.push_str("</lastmod>\n");
    }
    xml.push_str("  </url>\n");
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
