use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Page buttons rendered by the console when no explicit width is requested.
pub const DEFAULT_MAX_VISIBLE: u32 = 5;

/// Marker rendered between page 1 / the last page and the visible window.
pub const ELLIPSIS: &str = "…";

/// One slot in a rendered page bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    Page(u32),
    Ellipsis,
}

impl Serialize for PageToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageToken::Page(number) => serializer.serialize_u32(*number),
            PageToken::Ellipsis => serializer.serialize_str(ELLIPSIS),
        }
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageToken::Page(number) => write!(f, "{number}"),
            PageToken::Ellipsis => f.write_str(ELLIPSIS),
        }
    }
}

/// Computes the page bar for `current_page` out of `total_pages`.
///
/// At most `max_visible` consecutive pages are shown, centered on the current page. The first and
/// last page are always reachable; the gap between them and the window collapses into an
/// ellipsis only when it hides two or more pages, so a single hidden page is printed instead.
pub fn compute_window(current_page: u32, total_pages: u32, max_visible: u32) -> Vec<PageToken> {
    if total_pages == 0 {
        return Vec::new();
    }

    let max_visible = max_visible.max(1);
    let current = current_page.clamp(1, total_pages);

    if total_pages <= max_visible {
        return (1..=total_pages).map(PageToken::Page).collect();
    }

    let half = max_visible / 2;
    let (start, end) = if current <= half {
        (1, max_visible)
    } else if current + half >= total_pages {
        (total_pages - max_visible + 1, total_pages)
    } else {
        let start = current - half;
        (start, start + max_visible - 1)
    };

    let mut tokens = Vec::with_capacity(max_visible as usize + 4);

    if start > 1 {
        tokens.push(PageToken::Page(1));
        match start {
            2 => {}
            3 => tokens.push(PageToken::Page(2)),
            _ => tokens.push(PageToken::Ellipsis),
        }
    }

    tokens.extend((start..=end).map(PageToken::Page));

    if end < total_pages {
        let gap = total_pages - end;
        match gap {
            1 => {}
            2 => tokens.push(PageToken::Page(total_pages - 1)),
            _ => tokens.push(PageToken::Ellipsis),
        }
        tokens.push(PageToken::Page(total_pages));
    }

    tokens
}

/// Page selection as sent by the console. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Resolves the request against the number of stored items. A page past the end is pulled
    /// back to the last page so a re-fetch after deleting the final item still shows data.
    pub fn resolve(self, total_items: usize) -> PageSlice {
        let page_size = self.page_size.max(1);
        let total_pages = total_items.div_ceil(page_size as usize) as u32;
        let current_page = self.page.max(1).min(total_pages.max(1));
        let offset = (current_page as usize - 1) * page_size as usize;

        PageSlice {
            current_page,
            page_size,
            total_pages,
            total_items,
            offset,
        }
    }
}

/// Offset/limit window derived from a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_items: usize,
    pub offset: usize,
}

impl PageSlice {
    pub fn limit(&self) -> usize {
        self.page_size as usize
    }

    pub fn meta(&self, max_visible: u32) -> PaginationMeta {
        PaginationMeta {
            current_page: self.current_page,
            total_pages: self.total_pages,
            has_next_page: self.current_page < self.total_pages,
            has_prev_page: self.current_page > 1,
            total_items: self.total_items,
            limit: self.page_size,
            window: compute_window(self.current_page, self.total_pages, max_visible),
        }
    }
}

/// Pagination block shared by every admin list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub total_items: usize,
    pub limit: u32,
    pub window: Vec<PageToken>,
}

/// A page of items plus its pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Items cut from a collection, with the slice they were cut for.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub slice: PageSlice,
}

impl<T> Listing<T> {
    pub fn total_count(&self) -> usize {
        self.slice.total_items
    }

    pub fn into_page(self, max_visible: u32) -> Page<T> {
        Page {
            pagination: self.slice.meta(max_visible),
            items: self.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageToken::{Ellipsis, Page as P};

    #[test]
    fn small_totals_show_every_page() {
        assert_eq!(compute_window(1, 3, 5), vec![P(1), P(2), P(3)]);
        assert_eq!(compute_window(5, 5, 5), vec![P(1), P(2), P(3), P(4), P(5)]);
    }

    #[test]
    fn middle_pages_get_ellipses_on_both_sides() {
        assert_eq!(
            compute_window(7, 20, 5),
            vec![P(1), Ellipsis, P(5), P(6), P(7), P(8), P(9), Ellipsis, P(20)]
        );
    }

    #[test]
    fn window_is_pinned_at_the_start() {
        assert_eq!(
            compute_window(1, 20, 5),
            vec![P(1), P(2), P(3), P(4), P(5), Ellipsis, P(20)]
        );
        assert_eq!(
            compute_window(2, 20, 5),
            vec![P(1), P(2), P(3), P(4), P(5), Ellipsis, P(20)]
        );
    }

    #[test]
    fn window_is_pinned_at_the_end() {
        assert_eq!(
            compute_window(20, 20, 5),
            vec![P(1), Ellipsis, P(16), P(17), P(18), P(19), P(20)]
        );
    }

    #[test]
    fn single_hidden_page_is_printed_instead_of_an_ellipsis() {
        // window 3..=7 hides only page 2 on the left
        assert_eq!(
            compute_window(5, 20, 5),
            vec![P(1), P(2), P(3), P(4), P(5), P(6), P(7), Ellipsis, P(20)]
        );
        // window 14..=18 hides only page 19 on the right
        assert_eq!(
            compute_window(16, 20, 5),
            vec![P(1), Ellipsis, P(14), P(15), P(16), P(17), P(18), P(19), P(20)]
        );
    }

    #[test]
    fn adjacent_edges_need_no_filler() {
        assert_eq!(
            compute_window(4, 7, 5),
            vec![P(1), P(2), P(3), P(4), P(5), P(6), P(7)]
        );
    }

    #[test]
    fn degenerate_inputs_are_clamped() {
        assert!(compute_window(1, 0, 5).is_empty());
        assert_eq!(compute_window(0, 3, 5), vec![P(1), P(2), P(3)]);
        assert_eq!(
            compute_window(99, 10, 5),
            vec![P(1), Ellipsis, P(6), P(7), P(8), P(9), P(10)]
        );
        assert_eq!(compute_window(3, 10, 0), vec![P(1), P(2), P(3), Ellipsis, P(10)]);
    }

    #[test]
    fn even_width_keeps_exact_window_size() {
        let tokens = compute_window(10, 20, 4);
        let pages: Vec<_> = tokens
            .iter()
            .filter_map(|token| match token {
                P(n) if *n != 1 && *n != 20 => Some(*n),
                _ => None,
            })
            .collect();
        assert_eq!(pages, vec![8, 9, 10, 11]);
    }

    #[test]
    fn page_request_clamps_past_the_end() {
        let slice = PageRequest::new(9, 5).resolve(12);
        assert_eq!(slice.current_page, 3);
        assert_eq!(slice.total_pages, 3);
        assert_eq!(slice.offset, 10);

        let meta = slice.meta(DEFAULT_MAX_VISIBLE);
        assert!(!meta.has_next_page);
        assert!(meta.has_prev_page);
        assert_eq!(meta.total_items, 12);
    }

    #[test]
    fn empty_listing_reports_first_page() {
        let meta = PageRequest::new(1, 10).resolve(0).meta(DEFAULT_MAX_VISIBLE);
        assert_eq!(meta.current_page, 1);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_prev_page);
        assert!(meta.window.is_empty());
    }

    #[test]
    fn meta_serializes_with_console_field_names() {
        let meta = PageRequest::new(7, 1).resolve(20).meta(DEFAULT_MAX_VISIBLE);
        let json = serde_json::to_value(&meta).expect("serializes");
        assert_eq!(json["currentPage"], 7);
        assert_eq!(json["hasPrevPage"], true);
        assert_eq!(json["window"][1], "…");
        assert_eq!(json["window"][8], 20);
    }
}
