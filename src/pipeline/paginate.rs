/// The 1-indexed `page` of `items`, `page_size` at a time.
///
/// Pure indexing: page 0, a zero page size, or a page past the end all give
/// an empty slice. Clamping the page number is up to the caller.
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

/// Number of pages needed to show `len` items
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Keep `page` within `1..=total`; an empty result still has page 1
pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_pages_in_order() {
        let items: Vec<u32> = (1..=14).collect();
        assert_eq!(paginate(&items, 1, 6), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(paginate(&items, 2, 6), &[7, 8, 9, 10, 11, 12]);
        assert_eq!(paginate(&items, 3, 6), &[13, 14]);
        assert!(paginate(&items, 4, 6).is_empty());
    }

    #[test]
    fn degenerate_inputs_give_empty_pages() {
        let items = [1, 2, 3];
        assert!(paginate(&items, 0, 2).is_empty());
        assert!(paginate(&items, 1, 0).is_empty());
        assert!(paginate::<u8>(&[], 1, 6).is_empty());
        assert!(paginate(&items, usize::MAX, usize::MAX).is_empty());
    }

    #[test]
    fn page_counts() {
        assert_eq!(total_pages(0, 6), 0);
        assert_eq!(total_pages(6, 6), 1);
        assert_eq!(total_pages(7, 6), 2);
        assert_eq!(total_pages(5, 0), 0);
        assert_eq!(total_pages(usize::MAX, 2), usize::MAX / 2 + 1);
        assert_eq!(total_pages(usize::MAX, usize::MAX), 1);
    }

    #[test]
    fn clamping() {
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(2, 3), 2);
        assert_eq!(clamp_page(9, 3), 3);
        assert_eq!(clamp_page(4, 0), 1);
    }
}
