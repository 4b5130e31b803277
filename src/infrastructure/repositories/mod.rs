pub mod author_repository;
pub mod book_repository;
pub mod copy_repository;

pub use author_repository::SeaOrmAuthorRepository;
pub use book_repository::SeaOrmBookRepository;
pub use copy_repository::SeaOrmCopyRepository;
