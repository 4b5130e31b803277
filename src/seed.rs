use rand::Rng;
use sea_orm::*;

use crate::auth::{generate_user_code, hash_password};
use crate::models::{author, book, book_authors, category, copy, user};

/// Placeholder ISBN-13 for generated copies.
pub fn generate_isbn() -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..9).map(|_| rng.gen_range(0..10).to_string()).collect();
    format!("978-{}{}", body, rng.gen_range(0..10))
}

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();

    // 1. Users (user types are inserted by the migrations)
    let student_password =
        hash_password("student").map_err(|e| DbErr::Custom(format!("hash failed: {}", e)))?;
    let librarian_password =
        hash_password("librarian").map_err(|e| DbErr::Custom(format!("hash failed: {}", e)))?;

    let student = user::ActiveModel {
        email: Set("student@example.edu".to_owned()),
        password_hash: Set(student_password),
        first_name: Set("Sam".to_owned()),
        last_name: Set("Reader".to_owned()),
        user_code: Set(generate_user_code("Sam", "Reader")),
        user_type_id: Set(1),
        joined_at: Set(now.clone()),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };

    let librarian = user::ActiveModel {
        email: Set("librarian@example.edu".to_owned()),
        password_hash: Set(librarian_password),
        first_name: Set("Lena".to_owned()),
        last_name: Set("Stacks".to_owned()),
        user_code: Set(generate_user_code("Lena", "Stacks")),
        user_type_id: Set(2),
        joined_at: Set(now.clone()),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };

    for account in [student, librarian] {
        user::Entity::insert(account)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(user::Column::Email)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await?;
    }

    // 2. Categories
    let categories = vec!["Fiction", "Science", "History"];
    let mut category_ids = Vec::new();
    for name in categories {
        let row = category::ActiveModel {
            name: Set(name.to_owned()),
            ..Default::default()
        };
        let res = category::Entity::insert(row).exec(db).await?;
        category_ids.push(res.last_insert_id);
    }

    // 3. Authors
    let authors = vec![
        ("J.R.R. Tolkien", "British"),
        ("Frank Herbert", "American"),
        ("Isaac Asimov", "American"),
    ];
    let mut author_ids = Vec::new();
    for (name, nationality) in authors {
        let row = author::ActiveModel {
            full_name: Set(name.to_owned()),
            nationality: Set(Some(nationality.to_owned())),
            biography: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        let res = author::Entity::insert(row).exec(db).await?;
        author_ids.push(res.last_insert_id);
    }

    // 4. Books with copies and author links
    let books = vec![
        ("The Fellowship of the Ring", 1954, 0, 3),
        ("The Return of the King", 1955, 0, 2),
        ("Dune", 1965, 1, 1),
        ("Foundation", 1951, 2, 2),
    ];

    for (title, year, author_idx, copies) in books {
        let row = book::ActiveModel {
            title: Set(title.to_owned()),
            publication_year: Set(Some(year)),
            description: Set(None),
            cover_url: Set(None),
            category_id: Set(category_ids.first().copied()),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        let book_id = book::Entity::insert(row).exec(db).await?.last_insert_id;

        let link = book_authors::ActiveModel {
            book_id: Set(book_id),
            author_id: Set(author_ids[author_idx]),
            role: Set("Writer".to_owned()),
        };
        book_authors::Entity::insert(link).exec(db).await?;

        for _ in 0..copies {
            let copy_row = copy::ActiveModel {
                book_id: Set(book_id),
                isbn: Set(Some(generate_isbn())),
                publisher_name: Set(Some("Generic Publisher".to_owned())),
                shelf_location: Set(Some("Unshelved".to_owned())),
                is_active: Set(true),
                created_at: Set(now.clone()),
                updated_at: Set(now.clone()),
                ..Default::default()
            };
            copy::Entity::insert(copy_row).exec(db).await?;
        }
    }

    Ok(())
}
