//! Page position, page size and the page-button window

use serde::{Deserialize, Serialize};

/// The allowed page sizes of a list, sorted and never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageSizes(Vec<u32>);

impl PageSizes {
    /// Build from configured sizes. Zeros are dropped; an empty result falls back to `[10]`.
    pub fn new(sizes: &[u32]) -> Self {
        let mut sizes: Vec<u32> = sizes.iter().copied().filter(|s| *s > 0).collect();
        sizes.sort_unstable();
        sizes.dedup();
        if sizes.is_empty() {
            sizes.push(10);
        }
        Self(sizes)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn contains(&self, limit: u32) -> bool {
        self.0.contains(&limit)
    }

    /// Closest allowed size; ties go to the smaller one
    pub fn snap(&self, limit: u32) -> u32 {
        let mut best = self.0[0];
        for &size in &self.0 {
            if size.abs_diff(limit) < best.abs_diff(limit) {
                best = size;
            }
        }
        best
    }
}

impl Default for PageSizes {
    fn default() -> Self {
        Self::new(&[10, 20, 50, 100])
    }
}

/// Page and page size of one list view. `page` is always at least 1.
#[derive(Debug, Clone)]
pub struct Pagination {
    page: u32,
    limit: u32,
    total_pages: Option<u32>,
    sizes: PageSizes,
}

impl Pagination {
    pub fn new(sizes: PageSizes, default_limit: u32) -> Self {
        let limit = sizes.snap(default_limit);
        Self {
            page: 1,
            limit,
            total_pages: None,
            sizes,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn sizes(&self) -> &PageSizes {
        &self.sizes
    }

    /// Move to page `n`, clamped to `1..=total_pages` when that is known.
    ///
    /// Returns `false` when the (clamped) target is the current page.
    pub fn go_to_page(&mut self, n: u32) -> bool {
        let mut target = n.max(1);
        if let Some(total) = self.total_pages {
            target = target.min(total.max(1));
        }
        if target == self.page {
            return false;
        }
        self.page = target;
        true
    }

    /// Change the page size and go back to page 1. Sizes outside the allowed
    /// set snap to the nearest allowed one.
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = self.sizes.snap(limit);
        self.page = 1;
    }

    pub fn reset_page(&mut self) {
        self.page = 1;
    }

    pub fn set_total_pages(&mut self, total_pages: Option<u32>) {
        self.total_pages = total_pages;
    }
}

/// One button of the pager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "page")]
pub enum PageSlot {
    Page(u32),
    Ellipsis,
}

/// Lay out pager buttons for `total` pages around `current`.
///
/// First and last pages are always present, ellipses count against
/// `max_visible`, and a gap of exactly one page is shown as that page.
/// Budgets below 5 are raised to 5.
pub fn page_window(total: u32, current: u32, max_visible: u32) -> Vec<PageSlot> {
    if total == 0 {
        return Vec::new();
    }
    let budget = max_visible.max(5);
    if total <= budget {
        return (1..=total).map(PageSlot::Page).collect();
    }

    let current = current.clamp(1, total);
    let window = budget - 4;
    let half = (window - 1) / 2;
    let start = current.saturating_sub(half);
    let end = start + window - 1;

    let mut slots = Vec::with_capacity(budget as usize);
    if start <= 3 {
        slots.extend((1..=budget - 2).map(PageSlot::Page));
        slots.push(PageSlot::Ellipsis);
        slots.push(PageSlot::Page(total));
    } else if end >= total - 2 {
        slots.push(PageSlot::Page(1));
        slots.push(PageSlot::Ellipsis);
        slots.extend((total - (budget - 3)..=total).map(PageSlot::Page));
    } else {
        slots.push(PageSlot::Page(1));
        slots.push(PageSlot::Ellipsis);
        slots.extend((start..=end).map(PageSlot::Page));
        slots.push(PageSlot::Ellipsis);
        slots.push(PageSlot::Page(total));
    }
    slots
}

/// Whether a data source reports its own page counts.
///
/// This is declared by each source, never sniffed from a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Responses carry `meta {page, limit, total, totalPages}`
    Authoritative,
    /// Page counts are estimated from how full each page is
    Inferred,
}

/// Pagination metadata as returned by an authoritative source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// What the view renders below the table, whichever mode produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub limit: u32,
    /// `true` when the counts are estimates
    pub inferred: bool,
}

impl PageDescriptor {
    pub fn from_meta(meta: &PageMeta, current_page: u32, limit: u32) -> Self {
        Self {
            current_page,
            total_pages: meta.total_pages.max(1),
            total_items: meta.total,
            limit,
            inferred: false,
        }
    }

    /// Placeholder before the first page arrives
    pub fn empty(limit: u32) -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_items: 0,
            limit,
            inferred: false,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(slots: &[PageSlot]) -> Vec<Option<u32>> {
        slots
            .iter()
            .map(|s| match s {
                PageSlot::Page(n) => Some(*n),
                PageSlot::Ellipsis => None,
            })
            .collect()
    }

    #[test]
    fn test_page_sizes_normalized() {
        let sizes = PageSizes::new(&[50, 10, 0, 20, 10]);
        assert_eq!(sizes.as_slice(), &[10, 20, 50]);
        assert_eq!(PageSizes::new(&[]).as_slice(), &[10]);
    }

    #[test]
    fn test_snap_to_nearest_size() {
        let sizes = PageSizes::default();
        assert_eq!(sizes.snap(20), 20);
        assert_eq!(sizes.snap(17), 20);
        assert_eq!(sizes.snap(15), 10);
        assert_eq!(sizes.snap(1000), 100);
        assert_eq!(sizes.snap(0), 10);
    }

    #[test]
    fn test_set_limit_always_resets_page() {
        let mut pagination = Pagination::new(PageSizes::default(), 10);
        for (page, limit) in [(5, 20), (1, 20), (9, 50), (3, 10)] {
            pagination.go_to_page(page);
            pagination.set_limit(limit);
            assert_eq!(pagination.page(), 1);
            assert_eq!(pagination.limit(), limit);
        }
    }

    #[test]
    fn test_go_to_page_clamps() {
        let mut pagination = Pagination::new(PageSizes::default(), 10);
        pagination.set_total_pages(Some(5));

        assert!(pagination.go_to_page(9));
        assert_eq!(pagination.page(), 5);

        assert!(pagination.go_to_page(0));
        assert_eq!(pagination.page(), 1);
    }

    #[test]
    fn test_go_to_same_page_is_noop() {
        let mut pagination = Pagination::new(PageSizes::default(), 10);
        pagination.set_total_pages(Some(3));
        assert!(pagination.go_to_page(3));
        assert!(!pagination.go_to_page(3));
        assert!(!pagination.go_to_page(42));
    }

    #[test]
    fn test_go_to_page_unbounded_when_total_unknown() {
        let mut pagination = Pagination::new(PageSizes::default(), 10);
        assert!(pagination.go_to_page(40));
        assert_eq!(pagination.page(), 40);
    }

    #[test]
    fn test_window_middle() {
        let slots = page_window(20, 10, 7);
        assert_eq!(
            pages(&slots),
            vec![Some(1), None, Some(9), Some(10), Some(11), None, Some(20)]
        );
    }

    #[test]
    fn test_window_middle_properties() {
        for current in 1..=20 {
            let slots = page_window(20, current, 7);
            assert!(slots.len() <= 7);
            assert_eq!(slots.first(), Some(&PageSlot::Page(1)));
            assert_eq!(slots.last(), Some(&PageSlot::Page(20)));
            assert!(slots.contains(&PageSlot::Page(current)));
            assert!(slots.iter().filter(|s| **s == PageSlot::Ellipsis).count() <= 2);

            let numbers: Vec<u32> = slots
                .iter()
                .filter_map(|s| match s {
                    PageSlot::Page(n) => Some(*n),
                    PageSlot::Ellipsis => None,
                })
                .collect();
            assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_window_near_edges() {
        assert_eq!(
            pages(&page_window(20, 1, 7)),
            vec![Some(1), Some(2), Some(3), Some(4), Some(5), None, Some(20)]
        );
        assert_eq!(
            pages(&page_window(20, 20, 7)),
            vec![Some(1), None, Some(16), Some(17), Some(18), Some(19), Some(20)]
        );
    }

    #[test]
    fn test_window_single_gap_shows_page() {
        // start would be 3: page 2 is shown instead of an ellipsis
        let slots = page_window(20, 4, 7);
        assert!(!pages(&slots)[..5].contains(&None));
    }

    #[test]
    fn test_window_small_totals() {
        assert!(page_window(0, 1, 7).is_empty());
        assert_eq!(pages(&page_window(1, 1, 7)), vec![Some(1)]);
        assert_eq!(page_window(7, 3, 7).len(), 7);
        assert_eq!(page_window(100, 50, 1).len(), 5);
    }

    #[test]
    fn test_descriptor_from_meta() {
        let meta = PageMeta {
            page: 2,
            limit: 10,
            total: 0,
            total_pages: 0,
        };
        let descriptor = PageDescriptor::from_meta(&meta, 1, 10);
        assert_eq!(descriptor.total_pages, 1);
        assert!(!descriptor.inferred);
        assert!(!descriptor.has_next());
    }

    #[test]
    fn test_meta_is_camel_case() {
        let meta: PageMeta =
            serde_json::from_str(r#"{"page":1,"limit":10,"total":31,"totalPages":4}"#).unwrap();
        assert_eq!(meta.total_pages, 4);
        assert_eq!(meta.total, 31);
    }
}
