//! Page arithmetic for paginated list views. Pages are 1-based.

/// Page size the content API applies when none is requested.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Page size used when a view needs a whole collection at once.
pub const FULL_LISTING_PAGE_SIZE: u32 = 5000;

/// Number of pages needed to show `total` items; an empty list still has one page.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 || total == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

pub fn previous_page(page: u32) -> u32 {
    page.saturating_sub(1).max(1)
}

pub fn next_page(page: u32, total_pages: u32) -> u32 {
    page.saturating_add(1).min(total_pages.max(1))
}

/// How many items a full server response for `page` should contain.
pub fn items_on_page(total: u64, page: u32, page_size: u32) -> u64 {
    let size = u64::from(page_size);
    let start = u64::from(page.max(1) - 1) * size;
    total.saturating_sub(start).min(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(30, 25), 2);
        assert_eq!(total_pages(25, 25), 1);
        assert_eq!(total_pages(26, 25), 2);
        assert_eq!(total_pages(0, 25), 1);
        assert_eq!(total_pages(10, 0), 1);
    }

    #[test]
    fn test_page_navigation_is_clamped() {
        assert_eq!(previous_page(1), 1);
        assert_eq!(previous_page(3), 2);
        assert_eq!(next_page(2, 2), 2);
        assert_eq!(next_page(1, 2), 2);
        assert_eq!(next_page(1, 0), 1);
    }

    #[test]
    fn test_items_on_page() {
        assert_eq!(items_on_page(30, 1, 25), 25);
        assert_eq!(items_on_page(30, 2, 25), 5);
        assert_eq!(items_on_page(30, 3, 25), 0);
    }
}
