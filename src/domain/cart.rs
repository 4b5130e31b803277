//! Per-user cart: copies staged for checkout.
//!
//! Carts are process-local and ephemeral. Contents are keyed by user id in
//! a `DashMap`, so two users never see each other's staged copies and
//! concurrent requests from the same user serialize on that user's entry.

use dashmap::DashMap;
use serde::Serialize;

/// One staged copy, with enough book context to render the cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    pub copy_id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub isbn: Option<String>,
}

/// Staging area for loans, keyed by user id.
#[derive(Debug, Default)]
pub struct CartStore {
    carts: DashMap<i32, Vec<CartItem>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a user's staged copies (empty if no cart exists).
    pub fn items(&self, user_id: i32) -> Vec<CartItem> {
        self.carts
            .get(&user_id)
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn len(&self, user_id: i32) -> usize {
        self.carts.get(&user_id).map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, user_id: i32) -> bool {
        self.len(user_id) == 0
    }

    pub fn contains_copy(&self, user_id: i32, copy_id: i32) -> bool {
        self.carts
            .get(&user_id)
            .map(|c| c.iter().any(|item| item.copy_id == copy_id))
            .unwrap_or(false)
    }

    /// Number of copies of one book currently staged by this user.
    pub fn staged_for_book(&self, user_id: i32, book_id: i32) -> usize {
        self.carts
            .get(&user_id)
            .map(|c| c.iter().filter(|item| item.book_id == book_id).count())
            .unwrap_or(0)
    }

    pub fn add(&self, user_id: i32, item: CartItem) {
        self.carts.entry(user_id).or_default().push(item);
    }

    /// Remove the first staged copy of the given book. No-op on an empty
    /// cart or when the book is not staged.
    pub fn remove_first_for_book(&self, user_id: i32, book_id: i32) -> Option<CartItem> {
        let mut cart = self.carts.get_mut(&user_id)?;
        let pos = cart.iter().position(|item| item.book_id == book_id)?;
        Some(cart.remove(pos))
    }

    pub fn clear(&self, user_id: i32) {
        self.carts.remove(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(copy_id: i32, book_id: i32) -> CartItem {
        CartItem {
            copy_id,
            book_id,
            book_title: format!("Book {}", book_id),
            isbn: None,
        }
    }

    #[test]
    fn carts_are_isolated_per_user() {
        let store = CartStore::new();
        store.add(1, item(10, 100));
        store.add(2, item(11, 100));

        assert_eq!(store.len(1), 1);
        assert_eq!(store.len(2), 1);
        assert!(store.contains_copy(1, 10));
        assert!(!store.contains_copy(1, 11));
    }

    #[test]
    fn remove_takes_first_match_only() {
        let store = CartStore::new();
        store.add(1, item(10, 100));
        store.add(1, item(11, 100));

        let removed = store.remove_first_for_book(1, 100).unwrap();
        assert_eq!(removed.copy_id, 10);
        assert_eq!(store.len(1), 1);
        assert!(store.contains_copy(1, 11));
    }

    #[test]
    fn remove_on_empty_cart_is_noop() {
        let store = CartStore::new();
        assert!(store.remove_first_for_book(7, 100).is_none());
        assert_eq!(store.len(7), 0);
    }

    #[test]
    fn clear_drops_the_cart() {
        let store = CartStore::new();
        store.add(1, item(10, 100));
        store.clear(1);
        assert!(store.is_empty(1));
    }

    #[test]
    fn staged_for_book_counts_per_title() {
        let store = CartStore::new();
        store.add(1, item(10, 100));
        store.add(1, item(11, 100));
        store.add(1, item(20, 200));
        assert_eq!(store.staged_for_book(1, 100), 2);
        assert_eq!(store.staged_for_book(1, 200), 1);
        assert_eq!(store.staged_for_book(1, 300), 0);
    }
}
