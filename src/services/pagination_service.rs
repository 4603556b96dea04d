use serde::{Serialize, Serializer};

use crate::models::filter::FilterChange;

pub const DEFAULT_VISIBLE_PAGES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl Serialize for PageItem {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PageItem::Page(page) => serializer.serialize_u32(*page),
            PageItem::Ellipsis => serializer.serialize_str("ellipsis"),
        }
    }
}

pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total
        .div_ceil(u64::from(page_size))
        .min(u64::from(u32::MAX)) as u32
}

/// Page buttons to render: first and last page, up to `visible_count` pages
/// around `current`, and an ellipsis over each gap.
pub fn compute_page_window(
    current: u32,
    page_size: u32,
    total: u64,
    visible_count: u32,
) -> Vec<PageItem> {
    let last = i64::from(total_pages(total, page_size));
    let mut pages = vec![PageItem::Page(1)];
    if last <= 1 {
        return pages;
    }

    let visible = i64::from(visible_count.max(1));
    let current = i64::from(current).clamp(1, last);

    let mut start = (current - visible / 2).max(2);
    let end = (start + visible - 1).min(last - 1);
    if end - start < visible - 1 {
        start = (end - visible + 1).max(2);
    }

    if start > 2 {
        pages.push(PageItem::Ellipsis);
    }
    pages.extend((start..=end).map(|page| PageItem::Page(page as u32)));
    if end < last - 1 {
        pages.push(PageItem::Ellipsis);
    }
    pages.push(PageItem::Page(last as u32));
    pages
}

/// One-based positions of the first and last item on `current`. `(0, 0)` when
/// the page holds nothing.
pub fn compute_range(current: u32, page_size: u32, total: u64) -> (u64, u64) {
    if total == 0 || page_size == 0 {
        return (0, 0);
    }
    let current = u64::from(current.max(1));
    let page_size = u64::from(page_size);
    let from = (current - 1) * page_size + 1;
    if from > total {
        return (0, 0);
    }
    let to = (current * page_size).min(total);
    (from, to)
}

pub fn go_to_page(page: u32, total_pages: u32) -> Option<FilterChange> {
    if page < 1 || page > total_pages {
        return None;
    }
    Some(FilterChange::Page(page))
}

/// Keeps the reader's position inside the listing after a page size change.
pub fn change_page_size(current: u32, total: u64, new_page_size: u32) -> u32 {
    current
        .min(total_pages(total, new_page_size))
        .max(1)
}

pub fn summary(total: u64, range: (u64, u64)) -> String {
    format!("{}-{} of {}", range.0, range.1, total)
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeView {
    pub from: u64,
    pub to: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationModel {
    pub current: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    pub pages: Vec<PageItem>,
    pub range: RangeView,
    pub summary: String,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PaginationModel {
    pub fn new(current: u32, page_size: u32, total: u64) -> Self {
        let total_pages = total_pages(total, page_size);
        let (from, to) = compute_range(current, page_size, total);
        Self {
            current,
            page_size,
            total,
            total_pages,
            pages: compute_page_window(current, page_size, total, DEFAULT_VISIBLE_PAGES),
            range: RangeView { from, to },
            summary: summary(total, (from, to)),
            has_previous: current > 1,
            has_next: current < total_pages,
        }
    }
}
