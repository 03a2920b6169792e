//! Client-side model of the like button.
//!
//! The HTTP service only exposes the toggle; this is the state machine a
//! client runs around it, kept next to the server contract it mirrors.

#![allow(dead_code)]

use crate::engagement::store::LikeState;

/// Client-side optimistic like button.
///
/// `begin` flips the displayed state immediately and blocks further toggles
/// until the request settles with `confirm` or `rollback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticLike {
    liked: bool,
    likes_count: i32,
    in_flight: Option<LikeState>,
}

impl OptimisticLike {
    pub fn new(liked: bool, likes_count: i32) -> Self {
        Self {
            liked,
            likes_count: likes_count.max(0),
            in_flight: None,
        }
    }

    /// Returns false, changing nothing, while a toggle is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.in_flight = Some(self.state());
        self.liked = !self.liked;
        self.likes_count = if self.liked {
            self.likes_count + 1
        } else {
            (self.likes_count - 1).max(0)
        };
        true
    }

    /// Adopts the server's view once the toggle succeeded.
    pub fn confirm(&mut self, server: LikeState) {
        self.liked = server.liked;
        self.likes_count = server.likes_count.max(0);
        self.in_flight = None;
    }

    /// Restores the state captured by `begin`.
    pub fn rollback(&mut self) {
        if let Some(snapshot) = self.in_flight.take() {
            self.liked = snapshot.liked;
            self.likes_count = snapshot.likes_count;
        }
    }

    pub fn state(&self) -> LikeState {
        LikeState {
            liked: self.liked,
            likes_count: self.likes_count,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimistic_like_confirm() {
        let mut button = OptimisticLike::new(false, 4);
        assert!(button.begin());
        assert_eq!(button.state(), LikeState { liked: true, likes_count: 5 });
        assert!(button.is_pending());

        button.confirm(LikeState { liked: true, likes_count: 7 });
        assert_eq!(button.state(), LikeState { liked: true, likes_count: 7 });
        assert!(!button.is_pending());
    }

    #[test]
    fn test_optimistic_like_rollback() {
        let mut button = OptimisticLike::new(true, 1);
        assert!(button.begin());
        assert_eq!(button.state(), LikeState { liked: false, likes_count: 0 });
        button.rollback();
        assert_eq!(button.state(), LikeState { liked: true, likes_count: 1 });
    }

    #[test]
    fn test_optimistic_like_blocks_double_click() {
        let mut button = OptimisticLike::new(false, 0);
        assert!(button.begin());
        assert!(!button.begin());
        assert_eq!(button.state(), LikeState { liked: true, likes_count: 1 });
    }

    #[test]
    fn test_optimistic_unlike_never_negative() {
        let mut button = OptimisticLike::new(true, 0);
        button.begin();
        assert_eq!(button.state().likes_count, 0);
    }
}
