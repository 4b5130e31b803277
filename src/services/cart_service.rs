//! Cart admission rules: which copy, if any, gets staged for a user.

use crate::domain::{BookRepository, CartItem, CartStore, CopyRepository, DomainError};

/// Stage one copy of the given book in the user's cart.
///
/// Rejected when the user already stages as many copies of the book as
/// exist in total, or when no available copy remains that the user has not
/// already staged. The same copy row is never staged twice for one user.
pub async fn add_to_cart(
    book_repo: &dyn BookRepository,
    copy_repo: &dyn CopyRepository,
    carts: &CartStore,
    user_id: i32,
    book_id: i32,
) -> Result<CartItem, DomainError> {
    let book = book_repo
        .find_by_id(book_id)
        .await?
        .ok_or(DomainError::NotFound)?;

    let total_copies = copy_repo.find_by_book_id(book_id).await?.len();
    if carts.staged_for_book(user_id, book_id) >= total_copies {
        return Err(DomainError::Validation(
            "every copy of this book is already in your cart".to_owned(),
        ));
    }

    let available = copy_repo.list_available(book_id).await?;
    let copy = available
        .into_iter()
        .find(|c| !carts.contains_copy(user_id, c.id))
        .ok_or_else(|| {
            DomainError::Validation("no available copy of this book".to_owned())
        })?;

    let item = CartItem {
        copy_id: copy.id,
        book_id,
        book_title: book.title,
        isbn: copy.isbn,
    };
    carts.add(user_id, item.clone());

    tracing::info!(user_id, book_id, copy_id = item.copy_id, "copy staged in cart");

    Ok(item)
}

/// Unstage the first copy of the given book. No-op on an empty cart.
pub fn remove_from_cart(carts: &CartStore, user_id: i32, book_id: i32) -> Option<CartItem> {
    carts.remove_first_for_book(user_id, book_id)
}
