use crate::types::Page;

/// Page cursor for one query. The first page's `totalCount`, when present,
/// fixes the last page at `ceil(totalCount / pageSize)`; without it, paging
/// continues until a page comes back empty.
#[derive(Debug, Clone)]
pub struct Pagination {
    page: u32,
    page_size: u32,
    total_count: Option<u64>,
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total_count: None,
        }
    }

    /// Page number to request next (1-based).
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn last_page(&self) -> Option<u64> {
        self.total_count
            .map(|total| total.div_ceil(u64::from(self.page_size)))
    }

    /// Record the page just fetched. Returns `true` if another page should be
    /// requested, in which case the cursor has moved forward.
    pub fn advance(&mut self, fetched: &Page) -> bool {
        if self.total_count.is_none() {
            self.total_count = fetched.total_count;
        }
        if fetched.items.is_empty() {
            return false;
        }
        if let Some(last) = self.last_page() {
            if u64::from(self.page) >= last {
                return false;
            }
        }
        self.page += 1;
        true
    }
}
