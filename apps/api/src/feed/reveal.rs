//! Incremental reveal of an already-sorted feed.
//!
//! The sorted list is computed once per listing-set generation. The
//! controller only decides how long a prefix of it is visible: one page at
//! first, then one more page each time the viewport sentinel comes close to
//! the end. A reset (new filter, search or city) is the only transition that
//! shrinks the revealed prefix.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealController {
    total: usize,
    page_size: usize,
    revealed: usize,
    current_page: usize,
    is_loading_more: bool,
    generation: u64,
}

/// A reveal step handed out by `on_sentinel`, valid only for the generation
/// it was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReveal {
    generation: u64,
    target_page: usize,
}

impl RevealController {
    pub fn new(total: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            total,
            page_size,
            revealed: page_size.min(total),
            current_page: 1,
            is_loading_more: false,
            generation: 0,
        }
    }

    /// The upstream listing set changed: start over from the first page.
    pub fn reset(&mut self, total: usize) {
        self.total = total;
        self.revealed = self.page_size.min(total);
        self.current_page = 1;
        self.is_loading_more = false;
        self.generation += 1;
    }

    /// The viewport sentinel crossed its boundary.
    ///
    /// Returns `None` while a reveal is already in flight or when nothing is
    /// left to reveal.
    pub fn on_sentinel(&mut self) -> Option<PendingReveal> {
        if self.is_loading_more || !self.has_more() {
            return None;
        }
        self.is_loading_more = true;
        Some(PendingReveal {
            generation: self.generation,
            target_page: self.current_page + 1,
        })
    }

    /// Applies a pending step. Steps issued before the last reset are dropped.
    pub fn complete(&mut self, pending: PendingReveal) -> bool {
        if pending.generation != self.generation {
            return false;
        }
        self.revealed = pending
            .target_page
            .saturating_mul(self.page_size)
            .min(self.total)
            .max(self.revealed);
        self.current_page = pending.target_page;
        self.is_loading_more = false;
        true
    }

    /// Reveals synchronously until `page` is reached or the list is exhausted.
    pub fn advance_to(&mut self, page: usize) {
        while self.current_page < page {
            match self.on_sentinel() {
                Some(pending) => {
                    self.complete(pending);
                }
                None => break,
            }
        }
    }

    /// The revealed prefix of `items`.
    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.revealed.min(items.len())]
    }

    pub fn has_more(&self) -> bool {
        self.revealed < self.total
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevealWindow {
    pub page: usize,
    pub revealed: usize,
    pub total: usize,
    pub has_more: bool,
}

/// Stateless view of the controller: what page `page` of the sorted `items`
/// shows, and the visible prefix itself. Page 0 is treated as page 1.
pub fn reveal_window<T>(items: &[T], page: usize, page_size: usize) -> (RevealWindow, &[T]) {
    let mut controller = RevealController::new(items.len(), page_size);
    controller.advance_to(page.max(1));
    let window = RevealWindow {
        page: controller.current_page(),
        revealed: controller.revealed(),
        total: controller.total(),
        has_more: controller.has_more(),
    };
    (window, controller.visible(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twelve_items_reveal_five_ten_twelve() {
        let items: Vec<u32> = (0..12).collect();
        let mut c = RevealController::new(items.len(), 5);
        assert_eq!(c.visible(&items), &items[..5]);

        let step = c.on_sentinel().unwrap();
        assert!(c.complete(step));
        assert_eq!(c.revealed(), 10);
        assert_eq!(c.current_page(), 2);

        let step = c.on_sentinel().unwrap();
        assert!(c.complete(step));
        assert_eq!(c.revealed(), 12);
        assert!(!c.has_more());

        assert_eq!(c.on_sentinel(), None);
        assert_eq!(c.visible(&items), &items[..]);
    }

    #[test]
    fn test_second_signal_while_loading_is_noop() {
        let mut c = RevealController::new(20, 5);
        let step = c.on_sentinel().unwrap();
        assert!(c.is_loading_more);
        assert_eq!(c.on_sentinel(), None);
        assert!(c.complete(step));
        assert_eq!(c.revealed(), 10);
        assert!(!c.is_loading_more);
    }

    #[test]
    fn test_reset_is_only_shrinking_transition() {
        let mut c = RevealController::new(30, 5);
        c.advance_to(4);
        assert_eq!(c.revealed(), 20);

        c.reset(8);
        assert_eq!(c.revealed(), 5);
        assert_eq!(c.current_page(), 1);
        assert!(c.has_more());
    }

    #[test]
    fn test_stale_step_after_reset_is_discarded() {
        let mut c = RevealController::new(30, 5);
        let stale = c.on_sentinel().unwrap();
        c.reset(30);
        assert!(!c.complete(stale));
        assert_eq!(c.revealed(), 5);
        assert!(!c.is_loading_more);
    }

    #[test]
    fn test_short_list_starts_terminal() {
        let mut c = RevealController::new(3, 5);
        assert_eq!(c.revealed(), 3);
        assert!(!c.has_more());
        assert_eq!(c.on_sentinel(), None);
    }

    #[test]
    fn test_revealed_is_monotonic_prefix() {
        let items: Vec<u32> = (0..23).collect();
        let mut c = RevealController::new(items.len(), 5);
        let mut last = c.revealed();
        while let Some(step) = c.on_sentinel() {
            c.complete(step);
            let visible = c.visible(&items);
            assert_eq!(visible, &items[..visible.len()]);
            assert!(c.revealed() >= last);
            last = c.revealed();
        }
        assert_eq!(last, 23);
    }

    #[test]
    fn test_reveal_window() {
        let items: Vec<u32> = (0..12).collect();
        let (window, visible) = reveal_window(&items, 1, 5);
        assert_eq!(
            window,
            RevealWindow {
                page: 1,
                revealed: 5,
                total: 12,
                has_more: true
            }
        );
        assert_eq!(visible, &items[..5]);
        assert_eq!(reveal_window(&items, 2, 5).1, &items[..10]);
        let (last, visible) = reveal_window(&items, 3, 5);
        assert_eq!(last.revealed, 12);
        assert!(!last.has_more);
        assert_eq!(visible, &items[..]);
        // Past the end stays on the terminal page.
        assert_eq!(reveal_window(&items, 9, 5).0.page, 3);
        assert_eq!(reveal_window(&items, 0, 5).0.revealed, 5);
        assert_eq!(reveal_window::<u32>(&[], 1, 5).0.revealed, 0);
    }
}
