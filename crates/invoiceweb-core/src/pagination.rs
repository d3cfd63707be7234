//! Client-side pagination

use serde::Serialize;
use std::ops::RangeInclusive;

/// Number of pages needed for `len` items
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    (len + page_size - 1) / page_size
}

/// Items of the 1-based `page`, clipped to bounds; empty past the last page
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// State of the pagination control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current: usize,
    pub page_count: usize,
}

impl Pagination {
    pub fn new(current: usize, total_items: usize, page_size: usize) -> Self {
        Self {
            current,
            page_count: page_count(total_items, page_size),
        }
    }

    /// Page buttons to render
    pub fn pages(&self) -> RangeInclusive<usize> {
        1..=self.page_count
    }

    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.page_count
    }

    pub fn previous(&self) -> usize {
        self.current.saturating_sub(1).max(1)
    }

    pub fn next(&self) -> usize {
        self.current.saturating_add(1).min(self.page_count.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_five_items_in_pages_of_ten() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(page_count(items.len(), 10), 3);
        assert_eq!(paginate(&items, 1, 10), &items[0..10]);
        assert_eq!(paginate(&items, 3, 10).len(), 5);
        assert!(paginate(&items, 4, 10).is_empty());
    }

    #[test]
    fn test_page_lengths_and_reconstruction() {
        for len in 0..40usize {
            let items: Vec<usize> = (0..len).collect();
            for size in 1..12usize {
                let pages = page_count(len, size);
                let mut rebuilt = Vec::new();
                for page in 1..=pages + 2 {
                    let slice = paginate(&items, page, size);
                    let expected = size.min(len.saturating_sub((page - 1) * size));
                    assert_eq!(slice.len(), expected, "len={len} size={size} page={page}");
                    rebuilt.extend_from_slice(slice);
                }
                assert_eq!(rebuilt, items);
            }
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        let items = [1, 2, 3];
        assert!(paginate(&items, 0, 10).is_empty());
        assert!(paginate(&items, 1, 0).is_empty());
        assert!(paginate::<u8>(&[], 1, 10).is_empty());
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
    }

    #[test]
    fn test_pagination_control() {
        let p = Pagination::new(1, 25, 10);
        assert_eq!(p.pages().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(!p.has_previous());
        assert!(p.has_next());
        assert_eq!(p.previous(), 1);
        assert_eq!(p.next(), 2);

        let last = Pagination::new(3, 25, 10);
        assert!(last.has_previous());
        assert!(!last.has_next());
        assert_eq!(last.next(), 3);
    }

    #[test]
    fn test_page_beyond_range_stays_in_bounds() {
        let p = Pagination { current: usize::MAX, page_count: 3 };
        assert!(p.has_previous());
        assert!(!p.has_next());
        assert_eq!(p.next(), 3);
        assert_eq!(p.previous(), usize::MAX - 1);
    }
}
