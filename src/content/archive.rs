use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use super::Post;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// 月份数字转英文名，超出 1..=12 时返回 `None`
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}

/// 文章归档
///
/// 按发布日期分为 年 → 月 → 日 三层，每层均按倒序排列，
/// 同一天内的文章保持输入顺序。
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PostArchive {
    years: Vec<ArchiveYear>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveYear {
    pub year: i32,
    pub months: Vec<ArchiveMonth>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveMonth {
    pub month: u32,
    pub name: &'static str,
    pub days: Vec<ArchiveDay>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveDay {
    pub day: u32,
    pub posts: Vec<Post>,
}

type Buckets = BTreeMap<i32, BTreeMap<u32, BTreeMap<u32, Vec<Post>>>>;

impl PostArchive {
    /// 先按 (年, 月, 日) 分桶，再逐层倒序展开
    pub fn from_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let mut buckets = Buckets::new();
        for post in posts {
            let day = post.publish_day();
            buckets
                .entry(day.year())
                .or_default()
                .entry(day.month())
                .or_default()
                .entry(day.day())
                .or_default()
                .push(post);
        }

        let years = buckets
            .into_iter()
            .rev()
            .map(|(year, months)| ArchiveYear {
                year,
                months: months
                    .into_iter()
                    .rev()
                    .map(|(month, days)| ArchiveMonth {
                        month,
                        name: month_name(month).unwrap_or_default(),
                        days: days
                            .into_iter()
                            .rev()
                            .map(|(day, posts)| ArchiveDay { day, posts })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self { years }
    }

    pub fn years(&self) -> &[ArchiveYear] {
        &self.years
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// 归档中的文章总数
    pub fn post_count(&self) -> usize {
        self.years
            .iter()
            .flat_map(|y| &y.months)
            .flat_map(|m| &m.days)
            .map(|d| d.posts.len())
            .sum()
    }
}
