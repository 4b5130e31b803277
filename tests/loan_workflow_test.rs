use lectern::db;
use lectern::domain::{CartItem, CartStore, DomainError};
use lectern::services::loan_service::{self, CheckoutInput, LoanFilter, UpdateLoanInput};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    // In-memory SQLite for testing; migrations also insert the default
    // user types (1 = Student: 7 days / 3 copies, 2 = Librarian: 30 / 10)
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

async fn create_test_user(db: &DatabaseConnection, email: &str, user_type_id: i32) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let user = lectern::models::user::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("$argon2id$dummy".to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("Borrower".to_string()),
        user_code: Set("STTB000000000000TEST".to_string()),
        user_type_id: Set(user_type_id),
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

async fn create_test_book(db: &DatabaseConnection, title: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let book = lectern::models::book::ActiveModel {
        title: Set(title.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    lectern::models::book::Entity::insert(book)
        .exec(db)
        .await
        .expect("Failed to create book")
        .last_insert_id
}

async fn create_test_copy(db: &DatabaseConnection, book_id: i32) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let copy = lectern::models::copy::ActiveModel {
        book_id: Set(book_id),
        isbn: Set(Some("978-0000000000".to_string())),
        is_active: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    lectern::models::copy::Entity::insert(copy)
        .exec(db)
        .await
        .expect("Failed to create copy")
        .last_insert_id
}

fn stage(carts: &CartStore, user_id: i32, copy_id: i32, book_id: i32, title: &str) {
    carts.add(
        user_id,
        CartItem {
            copy_id,
            book_id,
            book_title: title.to_string(),
            isbn: None,
        },
    );
}

async fn fetch_copy(db: &DatabaseConnection, id: i32) -> lectern::models::copy::Model {
    lectern::models::copy::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("query failed")
        .expect("copy missing")
}

#[tokio::test]
async fn checkout_writes_one_detail_per_copy_and_deactivates() {
    let db = setup_test_db().await;
    let carts = CartStore::new();
    let user_id = create_test_user(&db, "a@example.edu", 1).await;
    let book_id = create_test_book(&db, "Dune").await;
    let copy_a = create_test_copy(&db, book_id).await;
    let copy_b = create_test_copy(&db, book_id).await;

    stage(&carts, user_id, copy_a, book_id, "Dune");
    stage(&carts, user_id, copy_b, book_id, "Dune");

    let loan = loan_service::checkout(&db, &carts, user_id, CheckoutInput::default())
        .await
        .expect("checkout failed");

    assert_eq!(loan.status, "active");
    assert_eq!(loan.renewals_count, 0);
    assert!(loan.actual_return_date.is_none());

    let details = lectern::models::loan_detail::Entity::find()
        .filter(lectern::models::loan_detail::Column::LoanId.eq(loan.id))
        .all(&db)
        .await
        .expect("query failed");

    // Two staged copies, exactly two detail rows, each covering one copy
    assert_eq!(details.len(), 2);
    for detail in &details {
        assert_eq!(detail.quantity, 1);
    }

    assert!(!fetch_copy(&db, copy_a).await.is_active);
    assert!(!fetch_copy(&db, copy_b).await.is_active);

    // Cart is cleared on commit
    assert!(carts.is_empty(user_id));
}

#[tokio::test]
async fn checkout_with_empty_cart_is_rejected() {
    let db = setup_test_db().await;
    let carts = CartStore::new();
    let user_id = create_test_user(&db, "a@example.edu", 1).await;

    let result = loan_service::checkout(&db, &carts, user_id, CheckoutInput::default()).await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn checkout_enforces_user_type_loan_limit() {
    let db = setup_test_db().await;
    let carts = CartStore::new();
    // Student user type allows 3 copies out at once
    let user_id = create_test_user(&db, "a@example.edu", 1).await;
    let book_id = create_test_book(&db, "Foundation").await;

    for _ in 0..4 {
        let copy_id = create_test_copy(&db, book_id).await;
        stage(&carts, user_id, copy_id, book_id, "Foundation");
    }

    let result = loan_service::checkout(&db, &carts, user_id, CheckoutInput::default()).await;
    assert!(matches!(result, Err(DomainError::Validation(_))));

    // Nothing was persisted
    let loans = lectern::models::loan::Entity::find()
        .count(&db)
        .await
        .expect("count failed");
    assert_eq!(loans, 0);
}

#[tokio::test]
async fn checkout_conflicts_when_copy_already_taken() {
    let db = setup_test_db().await;
    let carts = CartStore::new();
    let alice = create_test_user(&db, "alice@example.edu", 1).await;
    let bob = create_test_user(&db, "bob@example.edu", 1).await;
    let book_id = create_test_book(&db, "Dune").await;
    let copy_id = create_test_copy(&db, book_id).await;

    // Both users staged the same copy before either checked out
    stage(&carts, alice, copy_id, book_id, "Dune");
    stage(&carts, bob, copy_id, book_id, "Dune");

    loan_service::checkout(&db, &carts, alice, CheckoutInput::default())
        .await
        .expect("first checkout failed");

    let result = loan_service::checkout(&db, &carts, bob, CheckoutInput::default()).await;
    assert!(matches!(result, Err(DomainError::Conflict(_))));

    // The losing checkout rolled back: one loan, one detail row
    let loans = lectern::models::loan::Entity::find()
        .count(&db)
        .await
        .expect("count failed");
    assert_eq!(loans, 1);
    let details = lectern::models::loan_detail::Entity::find()
        .count(&db)
        .await
        .expect("count failed");
    assert_eq!(details, 1);
}

#[tokio::test]
async fn returning_a_loan_stamps_date_and_reactivates_copies() {
    let db = setup_test_db().await;
    let carts = CartStore::new();
    let user_id = create_test_user(&db, "a@example.edu", 1).await;
    let book_id = create_test_book(&db, "Dune").await;
    let copy_a = create_test_copy(&db, book_id).await;
    let copy_b = create_test_copy(&db, book_id).await;

    stage(&carts, user_id, copy_a, book_id, "Dune");
    stage(&carts, user_id, copy_b, book_id, "Dune");
    let loan = loan_service::checkout(&db, &carts, user_id, CheckoutInput::default())
        .await
        .expect("checkout failed");

    let updated = loan_service::update_loan(
        &db,
        loan.id,
        UpdateLoanInput {
            status: Some("returned".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("return failed");

    assert_eq!(updated.status, "returned");
    assert!(updated.actual_return_date.is_some());
    assert!(fetch_copy(&db, copy_a).await.is_active);
    assert!(fetch_copy(&db, copy_b).await.is_active);
}

#[tokio::test]
async fn non_return_status_change_leaves_copies_alone() {
    let db = setup_test_db().await;
    let carts = CartStore::new();
    let user_id = create_test_user(&db, "a@example.edu", 1).await;
    let book_id = create_test_book(&db, "Dune").await;
    let copy_id = create_test_copy(&db, book_id).await;

    stage(&carts, user_id, copy_id, book_id, "Dune");
    let loan = loan_service::checkout(&db, &carts, user_id, CheckoutInput::default())
        .await
        .expect("checkout failed");

    let updated = loan_service::update_loan(
        &db,
        loan.id,
        UpdateLoanInput {
            status: Some("overdue".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("update failed");

    // Label change only: no return stamp, copy stays out
    assert_eq!(updated.status, "overdue");
    assert!(updated.actual_return_date.is_none());
    assert!(!fetch_copy(&db, copy_id).await.is_active);
}

#[tokio::test]
async fn updating_a_missing_loan_is_not_found() {
    let db = setup_test_db().await;

    let result = loan_service::update_loan(
        &db,
        999,
        UpdateLoanInput {
            status: Some("returned".to_string()),
            ..Default::default()
        },
    )
    .await;

    assert!(matches!(result, Err(DomainError::NotFound)));
}

#[tokio::test]
async fn renewal_extends_due_date_until_the_limit() {
    let db = setup_test_db().await;
    let carts = CartStore::new();
    let user_id = create_test_user(&db, "a@example.edu", 1).await;
    let book_id = create_test_book(&db, "Dune").await;
    let copy_id = create_test_copy(&db, book_id).await;

    stage(&carts, user_id, copy_id, book_id, "Dune");
    let loan = loan_service::checkout(&db, &carts, user_id, CheckoutInput::default())
        .await
        .expect("checkout failed");

    let first = loan_service::renew_loan(&db, loan.id).await.expect("renew failed");
    assert_eq!(first.renewals_count, 1);
    assert_eq!(first.status, "renewed");
    assert!(first.expected_return_date > loan.expected_return_date);

    let second = loan_service::renew_loan(&db, loan.id).await.expect("renew failed");
    assert_eq!(second.renewals_count, 2);

    // max_renewals defaults to 2
    let third = loan_service::renew_loan(&db, loan.id).await;
    assert!(matches!(third, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn renewing_a_returned_loan_is_rejected() {
    let db = setup_test_db().await;
    let carts = CartStore::new();
    let user_id = create_test_user(&db, "a@example.edu", 1).await;
    let book_id = create_test_book(&db, "Dune").await;
    let copy_id = create_test_copy(&db, book_id).await;

    stage(&carts, user_id, copy_id, book_id, "Dune");
    let loan = loan_service::checkout(&db, &carts, user_id, CheckoutInput::default())
        .await
        .expect("checkout failed");

    loan_service::update_loan(
        &db,
        loan.id,
        UpdateLoanInput {
            status: Some("returned".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("return failed");

    let result = loan_service::renew_loan(&db, loan.id).await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn listing_filters_by_user_and_attaches_copies() {
    let db = setup_test_db().await;
    let carts = CartStore::new();
    let alice = create_test_user(&db, "alice@example.edu", 1).await;
    let bob = create_test_user(&db, "bob@example.edu", 1).await;
    let book_id = create_test_book(&db, "Dune").await;
    let copy_a = create_test_copy(&db, book_id).await;
    let copy_b = create_test_copy(&db, book_id).await;

    stage(&carts, alice, copy_a, book_id, "Dune");
    loan_service::checkout(&db, &carts, alice, CheckoutInput::default())
        .await
        .expect("checkout failed");
    stage(&carts, bob, copy_b, book_id, "Dune");
    loan_service::checkout(&db, &carts, bob, CheckoutInput::default())
        .await
        .expect("checkout failed");

    let all = loan_service::list_loans(&db, LoanFilter::default())
        .await
        .expect("list failed");
    assert_eq!(all.len(), 2);

    let alices = loan_service::list_loans(
        &db,
        LoanFilter {
            user_id: Some(alice),
            ..Default::default()
        },
    )
    .await
    .expect("list failed");
    assert_eq!(alices.len(), 1);
    assert_eq!(alices[0].user_id, alice);
    assert_eq!(alices[0].copies.len(), 1);
    assert_eq!(alices[0].copies[0].book_title, "Dune");
    assert_eq!(alices[0].borrower_name, "Test Borrower");
}
