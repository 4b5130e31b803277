pub mod author;
pub mod book;
pub mod book_authors;
pub mod category;
pub mod copy;
pub mod loan;
pub mod loan_detail;
pub mod user;
pub mod user_type;

pub use book::Book;
