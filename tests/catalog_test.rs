use lectern::db;
use lectern::domain::{
    AuthorRepository, BookFilter, BookRepository, CartStore, CopyRepository, CreateAuthorInput,
    CreateBookInput, CreateCopyInput, DomainError,
};
use lectern::infrastructure::{
    SeaOrmAuthorRepository, SeaOrmBookRepository, SeaOrmCopyRepository,
};
use lectern::services::cart_service;
use lectern::services::loan_service::{self, CheckoutInput};
use sea_orm::{DatabaseConnection, EntityTrait, Set};

async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

async fn create_test_user(db: &DatabaseConnection, email: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let user = lectern::models::user::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("$argon2id$dummy".to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("Reader".to_string()),
        user_code: Set("STTR000000000000TEST".to_string()),
        user_type_id: Set(1),
        joined_at: Set(now.clone()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    lectern::models::user::Entity::insert(user)
        .exec(db)
        .await
        .expect("Failed to create user")
        .last_insert_id
}

async fn create_book_with_copies(
    repo: &SeaOrmBookRepository,
    title: &str,
    copies: u32,
) -> i32 {
    let book = repo
        .create(CreateBookInput {
            title: title.to_string(),
            publication_year: Some(1965),
            description: None,
            cover_url: None,
            category_id: None,
            copies,
            author_ids: vec![],
        })
        .await
        .expect("Failed to create book");
    book.id.expect("book id missing")
}

#[tokio::test]
async fn create_book_registers_copies_and_author_links() {
    let db = setup_test_db().await;
    let book_repo = SeaOrmBookRepository::new(db.clone());
    let copy_repo = SeaOrmCopyRepository::new(db.clone());
    let author_repo = SeaOrmAuthorRepository::new(db.clone());

    let author = author_repo
        .create(CreateAuthorInput {
            full_name: "Frank Herbert".to_string(),
            nationality: Some("American".to_string()),
            biography: None,
        })
        .await
        .expect("Failed to create author");

    let book = book_repo
        .create(CreateBookInput {
            title: "Dune".to_string(),
            publication_year: Some(1965),
            description: Some("Desert planet politics".to_string()),
            cover_url: None,
            category_id: None,
            copies: 3,
            author_ids: vec![author.id],
        })
        .await
        .expect("Failed to create book");
    let book_id = book.id.unwrap();

    let copies = copy_repo
        .find_by_book_id(book_id)
        .await
        .expect("Failed to list copies");
    assert_eq!(copies.len(), 3);
    assert!(copies.iter().all(|c| c.is_active));
    assert!(copies.iter().all(|c| c.isbn.is_some()));

    let link = lectern::models::book_authors::Entity::find_by_id((book_id, author.id))
        .one(&db)
        .await
        .expect("query failed")
        .expect("author link missing");
    assert_eq!(link.role, "Writer");

    let detailed = book_repo
        .find_detailed(book_id)
        .await
        .expect("Failed to load details")
        .expect("book missing");
    assert_eq!(detailed.authors.as_deref(), Some("Frank Herbert"));
    assert_eq!(detailed.available_copies, Some(3));
}

#[tokio::test]
async fn availability_counts_active_unloaned_copies() {
    let db = setup_test_db().await;
    let book_repo = SeaOrmBookRepository::new(db.clone());
    let copy_repo = SeaOrmCopyRepository::new(db.clone());
    let carts = CartStore::new();
    let user_id = create_test_user(&db, "a@example.edu").await;

    let book_id = create_book_with_copies(&book_repo, "Dune", 3).await;
    assert_eq!(copy_repo.count_available(book_id).await.unwrap(), 3);

    // Check one copy out: availability drops to 2
    cart_service::add_to_cart(&book_repo, &copy_repo, &carts, user_id, book_id)
        .await
        .expect("add failed");
    let loan = loan_service::checkout(&db, &carts, user_id, CheckoutInput::default())
        .await
        .expect("checkout failed");
    assert_eq!(copy_repo.count_available(book_id).await.unwrap(), 2);

    // Return it: availability recovers
    loan_service::update_loan(
        &db,
        loan.id,
        lectern::services::loan_service::UpdateLoanInput {
            status: Some("returned".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("return failed");
    assert_eq!(copy_repo.count_available(book_id).await.unwrap(), 3);
}

#[tokio::test]
async fn adding_the_same_book_twice_stages_distinct_copies() {
    let db = setup_test_db().await;
    let book_repo = SeaOrmBookRepository::new(db.clone());
    let copy_repo = SeaOrmCopyRepository::new(db.clone());
    let carts = CartStore::new();
    let user_id = create_test_user(&db, "a@example.edu").await;

    let book_id = create_book_with_copies(&book_repo, "Dune", 2).await;

    let first = cart_service::add_to_cart(&book_repo, &copy_repo, &carts, user_id, book_id)
        .await
        .expect("first add failed");
    let second = cart_service::add_to_cart(&book_repo, &copy_repo, &carts, user_id, book_id)
        .await
        .expect("second add failed");

    assert_ne!(first.copy_id, second.copy_id);
    assert_eq!(carts.len(user_id), 2);

    // Both copies staged: a third add has nothing left to take
    let third = cart_service::add_to_cart(&book_repo, &copy_repo, &carts, user_id, book_id).await;
    assert!(matches!(third, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn add_to_cart_rejects_missing_book() {
    let db = setup_test_db().await;
    let book_repo = SeaOrmBookRepository::new(db.clone());
    let copy_repo = SeaOrmCopyRepository::new(db.clone());
    let carts = CartStore::new();

    let result = cart_service::add_to_cart(&book_repo, &copy_repo, &carts, 1, 999).await;
    assert!(matches!(result, Err(DomainError::NotFound)));
}

#[tokio::test]
async fn last_copy_checkout_blocks_other_users() {
    let db = setup_test_db().await;
    let book_repo = SeaOrmBookRepository::new(db.clone());
    let copy_repo = SeaOrmCopyRepository::new(db.clone());
    let carts = CartStore::new();
    let alice = create_test_user(&db, "alice@example.edu").await;
    let bob = create_test_user(&db, "bob@example.edu").await;

    // One copy in the whole library
    let book_id = create_book_with_copies(&book_repo, "Dune", 1).await;

    cart_service::add_to_cart(&book_repo, &copy_repo, &carts, alice, book_id)
        .await
        .expect("add failed");
    loan_service::checkout(&db, &carts, alice, CheckoutInput::default())
        .await
        .expect("checkout failed");

    // The copy is out: no available copy remains for anyone else
    let result = cart_service::add_to_cart(&book_repo, &copy_repo, &carts, bob, book_id).await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert_eq!(copy_repo.count_available(book_id).await.unwrap(), 0);
}

#[tokio::test]
async fn carts_do_not_leak_between_users() {
    let db = setup_test_db().await;
    let book_repo = SeaOrmBookRepository::new(db.clone());
    let copy_repo = SeaOrmCopyRepository::new(db.clone());
    let carts = CartStore::new();
    let alice = create_test_user(&db, "alice@example.edu").await;
    let bob = create_test_user(&db, "bob@example.edu").await;

    let book_id = create_book_with_copies(&book_repo, "Dune", 2).await;

    cart_service::add_to_cart(&book_repo, &copy_repo, &carts, alice, book_id)
        .await
        .expect("add failed");

    assert_eq!(carts.len(alice), 1);
    assert_eq!(carts.len(bob), 0);

    // Bob gets the other copy, not Alice's staged one
    let bobs = cart_service::add_to_cart(&book_repo, &copy_repo, &carts, bob, book_id)
        .await
        .expect("add failed");
    assert_ne!(bobs.copy_id, carts.items(alice)[0].copy_id);
}

#[tokio::test]
async fn search_is_case_insensitive_and_paginated() {
    let db = setup_test_db().await;
    let book_repo = SeaOrmBookRepository::new(db.clone());

    for title in [
        "The Fellowship of the Ring",
        "The Two Towers",
        "The Return of the King",
        "Ringworld",
        "The Ring of Solomon",
        "A Wizard of Earthsea",
        "Lord of the Rings: Appendices",
    ] {
        create_book_with_copies(&book_repo, title, 1).await;
    }

    let all_matches = book_repo
        .find_all(BookFilter {
            search: Some("ring".to_string()),
            page: 1,
            page_size: 30,
        })
        .await
        .expect("search failed");
    assert_eq!(all_matches.total, 4);
    assert!(all_matches
        .books
        .iter()
        .all(|b| b.title.to_lowercase().contains("ring")));

    // page_size 2, page 2: items 3-4 of the filtered set, id order
    let page2 = book_repo
        .find_all(BookFilter {
            search: Some("ring".to_string()),
            page: 2,
            page_size: 2,
        })
        .await
        .expect("search failed");
    assert_eq!(page2.books.len(), 2);
    assert_eq!(page2.books[0].title, "Ringworld");
    assert_eq!(page2.books[1].title, "Lord of the Rings: Appendices");
    assert_eq!(page2.total_pages, 2);

    // total_pages is a ceiling: 4 matches at page_size 3 is 2 pages
    let uneven = book_repo
        .find_all(BookFilter {
            search: Some("RING".to_string()),
            page: 1,
            page_size: 3,
        })
        .await
        .expect("search failed");
    assert_eq!(uneven.total, 4);
    assert_eq!(uneven.total_pages, 2);
}

#[tokio::test]
async fn registering_a_copy_requires_an_existing_book() {
    let db = setup_test_db().await;
    let book_repo = SeaOrmBookRepository::new(db.clone());
    let copy_repo = SeaOrmCopyRepository::new(db.clone());

    let result = copy_repo
        .create(CreateCopyInput {
            book_id: 42,
            isbn: None,
            publisher_name: None,
            shelf_location: None,
        })
        .await;
    assert!(matches!(result, Err(DomainError::NotFound)));

    let book_id = create_book_with_copies(&book_repo, "Dune", 0).await;
    let copy = copy_repo
        .create(CreateCopyInput {
            book_id,
            isbn: Some("978-0441172719".to_string()),
            publisher_name: Some("Ace Books".to_string()),
            shelf_location: Some("SF-12".to_string()),
        })
        .await
        .expect("create failed");
    assert!(copy.is_active);
    assert_eq!(copy_repo.count_available(book_id).await.unwrap(), 1);
}

#[tokio::test]
async fn author_listing_is_sorted_by_name() {
    let db = setup_test_db().await;
    let author_repo = SeaOrmAuthorRepository::new(db.clone());

    for name in ["Ursula K. Le Guin", "Frank Herbert", "Isaac Asimov"] {
        author_repo
            .create(CreateAuthorInput {
                full_name: name.to_string(),
                nationality: None,
                biography: None,
            })
            .await
            .expect("create failed");
    }

    let authors = author_repo.find_all().await.expect("list failed");
    let names: Vec<_> = authors.iter().map(|a| a.full_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Frank Herbert", "Isaac Asimov", "Ursula K. Le Guin"]
    );
}
