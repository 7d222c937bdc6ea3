use serde::Deserialize;

/// 文章列表切片
///
/// `start_post` 从 1 开始，`max_posts` 为结束位置（不是数量），
/// 等价于 `[start_post - 1 .. max_posts]`。越界时返回较短或空的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Page {
    pub start_post: usize,
    pub max_posts: Option<usize>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            start_post: 1,
            max_posts: None,
        }
    }
}

impl Page {
    pub fn new(start_post: usize, max_posts: Option<usize>) -> Self {
        Self {
            start_post,
            max_posts,
        }
    }

    /// 最新的 `n` 篇
    pub fn latest(n: usize) -> Self {
        Self::new(1, Some(n))
    }

    /// 起始下标，`start_post` 为 0 时按 1 处理
    pub fn offset(&self) -> usize {
        self.start_post.saturating_sub(1)
    }

    /// 最多返回的条数，`None` 表示不限
    pub fn limit(&self) -> Option<usize> {
        self.max_posts.map(|end| end.saturating_sub(self.offset()))
    }

    /// 数据库使用的 (`LIMIT`, `OFFSET`)
    ///
    /// 起始位置超出 `i64` 时返回 `None`，结果必然为空；条数超出时按 `i64::MAX` 处理。
    pub fn sql_window(&self) -> Option<(Option<i64>, i64)> {
        let offset = i64::try_from(self.offset()).ok()?;
        let limit = self.limit().map(|n| i64::try_from(n).unwrap_or(i64::MAX));
        Some((limit, offset))
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let limit = self.limit().unwrap_or(usize::MAX);
        items.into_iter().skip(self.offset()).take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_three_of_five() {
        let page = Page::new(1, Some(3));
        assert_eq!(page.apply(vec![1, 2, 3, 4, 5]), vec![1, 2, 3]);
    }

    #[test]
    fn test_open_ended() {
        let page = Page::new(3, None);
        assert_eq!(page.apply(vec![1, 2, 3, 4, 5]), vec![3, 4, 5]);
        assert_eq!(page.limit(), None);
    }

    #[test]
    fn test_window_in_the_middle() {
        let page = Page::new(2, Some(4));
        assert_eq!(page.offset(), 1);
        assert_eq!(page.limit(), Some(3));
        assert_eq!(page.apply(vec![1, 2, 3, 4, 5]), vec![2, 3, 4]);
    }

    #[test]
    fn test_out_of_range_is_short_or_empty() {
        assert_eq!(Page::new(4, Some(10)).apply(vec![1, 2, 3, 4, 5]), vec![4, 5]);
        assert!(Page::new(9, None).apply(vec![1, 2, 3]).is_empty());
        assert!(Page::new(4, Some(2)).apply(vec![1, 2, 3, 4, 5]).is_empty());
    }

    #[test]
    fn test_huge_bounds() {
        assert_eq!(Page::new(usize::MAX, None).sql_window(), None);
        assert!(Page::new(usize::MAX, None).apply(vec![1, 2, 3]).is_empty());
        assert_eq!(
            Page::new(1, Some(usize::MAX)).sql_window(),
            Some((Some(i64::MAX), 0))
        );
        assert_eq!(Page::new(2, Some(4)).sql_window(), Some((Some(3), 1)));
    }

    #[test]
    fn test_zero_start_is_treated_as_first() {
        assert_eq!(Page::new(0, Some(2)).apply(vec![1, 2, 3]), vec![1, 2]);
    }

    #[test]
    fn test_default_is_everything() {
        assert_eq!(Page::default().apply(vec![1, 2]), vec![1, 2]);
    }
}
