//! Page counts for sources that do not report them
//!
//! Best-effort only. A full page means "at least one more page"; an
//! under-full page means "this is the last one". Estimates are corrected as
//! the operator pages through, never faster than one page per boundary.

use crate::pagination::PageDescriptor;

#[derive(Debug, Clone, Default)]
pub struct InferredPager {
    limit: u32,
    /// Furthest page seen with a full `limit` of rows
    furthest_full: u32,
    /// Furthest page seen with any rows
    furthest_viewed: u32,
    /// Last page and exact row count, once an under-full page has been seen
    end: Option<(u32, u64)>,
}

impl InferredPager {
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            ..Self::default()
        }
    }

    /// Forget everything. Called whenever filters or page size change.
    pub fn reset(&mut self, limit: u32) {
        *self = Self::new(limit);
    }

    /// Record that `page` returned `count` rows and produce the descriptor
    pub fn observe(&mut self, page: u32, count: usize) -> PageDescriptor {
        let page = page.max(1);
        let limit = u64::from(self.limit);
        let count = count as u64;

        if count >= limit {
            self.furthest_full = self.furthest_full.max(page);
            self.furthest_viewed = self.furthest_viewed.max(page);
            if matches!(self.end, Some((last, _)) if last <= page) {
                self.end = None;
            }
        } else if count == 0 && page > 1 {
            // Walked past the end: the previous page was the last one
            let last = page - 1;
            self.end = Some((last, u64::from(last) * limit));
            self.furthest_full = self.furthest_full.min(last);
        } else {
            self.furthest_viewed = self.furthest_viewed.max(page);
            self.end = Some((page, u64::from(page - 1) * limit + count));
            self.furthest_full = self.furthest_full.min(page - 1);
        }

        self.descriptor(page)
    }

    /// Current estimate for `current_page`
    pub fn descriptor(&self, current_page: u32) -> PageDescriptor {
        let limit = u64::from(self.limit);
        let (pages, items) = match self.end {
            Some((last, total)) => (last, total),
            None => {
                let pages = self.furthest_full + 1;
                (pages, u64::from(self.furthest_full) * limit + 1)
            }
        };

        let (total_pages, total_items) = if self.furthest_viewed > pages {
            let viewed = self.furthest_viewed;
            (viewed, u64::from(viewed - 1) * limit + 1)
        } else {
            (pages.max(1), items)
        };

        PageDescriptor {
            current_page,
            total_pages,
            total_items,
            limit: self.limit,
            inferred: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_then_short_page() {
        let mut pager = InferredPager::new(10);

        let first = pager.observe(1, 10);
        assert!(first.total_pages >= 2);
        assert!(first.inferred);

        let second = pager.observe(2, 4);
        assert_eq!(second.total_pages, 2);
        assert_eq!(second.total_items, 14);
        assert!(!second.has_next());
    }

    #[test]
    fn test_short_first_page_is_only_page() {
        let mut pager = InferredPager::new(10);
        let descriptor = pager.observe(1, 3);
        assert_eq!(descriptor.total_pages, 1);
        assert_eq!(descriptor.total_items, 3);
    }

    #[test]
    fn test_empty_first_page() {
        let mut pager = InferredPager::new(10);
        let descriptor = pager.observe(1, 0);
        assert_eq!(descriptor.total_pages, 1);
        assert_eq!(descriptor.total_items, 0);
    }

    #[test]
    fn test_estimate_grows_one_page_at_a_time() {
        let mut pager = InferredPager::new(10);
        assert_eq!(pager.observe(1, 10).total_pages, 2);
        assert_eq!(pager.observe(2, 10).total_pages, 3);
        assert_eq!(pager.observe(3, 10).total_pages, 4);
    }

    #[test]
    fn test_empty_page_retracts_estimate() {
        let mut pager = InferredPager::new(10);
        pager.observe(1, 10);
        pager.observe(2, 10);
        let descriptor = pager.observe(3, 0);
        assert_eq!(descriptor.total_pages, 2);
        assert_eq!(descriptor.total_items, 20);
    }

    #[test]
    fn test_never_below_furthest_viewed_page() {
        let mut pager = InferredPager::new(10);
        pager.observe(1, 10);
        pager.observe(2, 10);
        pager.observe(3, 10);
        // rows were deleted since page 3 was viewed
        let descriptor = pager.observe(2, 5);
        assert_eq!(descriptor.total_pages, 3);
    }

    #[test]
    fn test_full_page_past_known_end_reopens() {
        let mut pager = InferredPager::new(10);
        pager.observe(1, 4);
        // rows were added since
        let descriptor = pager.observe(1, 10);
        assert_eq!(descriptor.total_pages, 2);
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut pager = InferredPager::new(10);
        pager.observe(1, 10);
        pager.observe(2, 10);
        pager.reset(20);
        let descriptor = pager.observe(1, 5);
        assert_eq!(descriptor.total_pages, 1);
        assert_eq!(descriptor.limit, 20);
    }
}
