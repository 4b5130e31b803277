//! Loan workflow: checkout from the cart, edit/return, renewal, listing.

use chrono::{Duration, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;

use crate::domain::{CartStore, DomainError};
use crate::models::book::Entity as Book;
use crate::models::copy::{self, Entity as Copy};
use crate::models::loan::{self, Entity as Loan};
use crate::models::loan_detail::{self, Entity as LoanDetail};
use crate::models::user::{self, Entity as User};
use crate::models::user_type::Entity as UserType;

/// One borrowed copy within an enriched loan view
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoanCopy {
    pub copy_id: i32,
    pub book_title: String,
    pub isbn: Option<String>,
}

/// Enriched loan with borrower and copy data
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoanWithDetails {
    pub id: i32,
    pub user_id: i32,
    pub borrower_name: String,
    pub status: String,
    pub loan_date: String,
    pub expected_return_date: String,
    pub actual_return_date: Option<String>,
    pub renewals_count: i32,
    pub max_renewals: i32,
    pub observations: Option<String>,
    pub copies: Vec<LoanCopy>,
}

/// Filter parameters for listing loans
#[derive(Debug, Default, Clone)]
pub struct LoanFilter {
    pub user_id: Option<i32>,
    pub status: Option<String>,
}

/// Checkout parameters beyond the cart contents
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub struct CheckoutInput {
    pub expected_return_date: Option<String>,
    pub observations: Option<String>,
}

/// Edit parameters for an existing loan
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub struct UpdateLoanInput {
    pub status: Option<String>,
    pub expected_return_date: Option<String>,
    pub observations: Option<String>,
}

/// Subquery selecting the ids of a user's open loans.
fn open_loan_ids_for_user(user_id: i32) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column((Loan, loan::Column::Id))
        .from(Loan)
        .and_where(Expr::col((Loan, loan::Column::UserId)).eq(user_id))
        .and_where(Expr::col((Loan, loan::Column::ActualReturnDate)).is_null())
        .and_where(Expr::col((Loan, loan::Column::Status)).ne("returned"))
        .to_owned()
}

/// Create a loan from the user's cart.
///
/// Inserts the loan header, flips every staged copy inactive and writes one
/// loan_detail per copy (quantity 1, since one row is one physical copy),
/// all inside a single transaction. Clears the cart on commit.
pub async fn checkout(
    db: &DatabaseConnection,
    carts: &CartStore,
    user_id: i32,
    input: CheckoutInput,
) -> Result<loan::Model, DomainError> {
    let (user, user_type) = User::find_by_id(user_id)
        .find_also_related(UserType)
        .one(db)
        .await?
        .ok_or(DomainError::Unauthorized)?;

    let items = carts.items(user_id);
    if items.is_empty() {
        return Err(DomainError::Validation("cart is empty".to_owned()));
    }

    // User-type policy: copies already out plus the cart must fit the limit
    let user_type = user_type.ok_or_else(|| {
        DomainError::Database(format!("user {} has no user type", user.id))
    })?;

    let copies_out = LoanDetail::find()
        .filter(loan_detail::Column::LoanId.in_subquery(open_loan_ids_for_user(user_id)))
        .count(db)
        .await?;

    if copies_out + items.len() as u64 > user_type.max_books as u64 {
        return Err(DomainError::Validation(format!(
            "loan limit exceeded: {} allows at most {} copies out",
            user_type.name, user_type.max_books
        )));
    }

    let now = Utc::now();
    let loan_date = now.to_rfc3339();
    let expected_return_date = match input.expected_return_date {
        Some(date) if !date.is_empty() => date,
        _ => (now + Duration::days(user_type.max_loan_days as i64)).to_rfc3339(),
    };

    let txn = db.begin().await?;

    let new_loan = loan::ActiveModel {
        user_id: Set(user_id),
        status: Set("active".to_owned()),
        loan_date: Set(loan_date.clone()),
        expected_return_date: Set(expected_return_date),
        actual_return_date: Set(None),
        renewals_count: Set(0),
        max_renewals: Set(2),
        observations: Set(input.observations),
        created_at: Set(loan_date.clone()),
        updated_at: Set(loan_date.clone()),
        ..Default::default()
    };

    let saved_loan = new_loan.insert(&txn).await?;

    for item in &items {
        // Re-check under the transaction: another checkout may have taken
        // this copy since it was staged
        let copy_row = Copy::find_by_id(item.copy_id)
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound)?;

        if !copy_row.is_active {
            return Err(DomainError::Conflict(format!(
                "copy {} of \"{}\" was checked out by another request",
                item.copy_id, item.book_title
            )));
        }

        let mut copy_active: copy::ActiveModel = copy_row.into();
        copy_active.is_active = Set(false);
        copy_active.updated_at = Set(loan_date.clone());
        copy_active.update(&txn).await?;

        let detail = loan_detail::ActiveModel {
            loan_id: Set(saved_loan.id),
            copy_id: Set(item.copy_id),
            quantity: Set(1),
            date_added: Set(loan_date.clone()),
            ..Default::default()
        };
        detail.insert(&txn).await?;
    }

    txn.commit().await?;
    carts.clear(user_id);

    tracing::info!(
        loan_id = saved_loan.id,
        user_id,
        copies = items.len(),
        "loan created"
    );

    Ok(saved_loan)
}

/// Edit a loan. A transition to "returned" stamps the actual return date
/// and reactivates every copy referenced by the loan's details; any other
/// status change is a label change only.
pub async fn update_loan(
    db: &DatabaseConnection,
    id: i32,
    input: UpdateLoanInput,
) -> Result<loan::Model, DomainError> {
    let loan = Loan::find_by_id(id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;

    let becoming_returned =
        input.status.as_deref() == Some("returned") && loan.status != "returned";

    let now = Utc::now().to_rfc3339();

    let txn = db.begin().await?;

    let mut loan_active: loan::ActiveModel = loan.clone().into();
    if let Some(status) = input.status {
        loan_active.status = Set(status);
    }
    if let Some(date) = input.expected_return_date {
        loan_active.expected_return_date = Set(date);
    }
    if let Some(observations) = input.observations {
        loan_active.observations = Set(Some(observations));
    }
    if becoming_returned {
        loan_active.actual_return_date = Set(Some(now.clone()));
    }
    loan_active.updated_at = Set(now.clone());

    let updated_loan = match loan_active.update(&txn).await {
        Ok(model) => model,
        Err(e) => {
            // Concurrent-update failure: re-verify existence before
            // reporting, matching the store-conflict taxonomy
            drop(txn);
            return if Loan::find_by_id(id).one(db).await?.is_none() {
                Err(DomainError::NotFound)
            } else {
                Err(DomainError::Conflict(e.to_string()))
            };
        }
    };

    if becoming_returned {
        let details = LoanDetail::find()
            .filter(loan_detail::Column::LoanId.eq(id))
            .all(&txn)
            .await?;

        for detail in details {
            let copy_row = Copy::find_by_id(detail.copy_id)
                .one(&txn)
                .await?
                .ok_or(DomainError::NotFound)?;

            let mut copy_active: copy::ActiveModel = copy_row.into();
            copy_active.is_active = Set(true);
            copy_active.updated_at = Set(now.clone());
            copy_active.update(&txn).await?;
        }

        tracing::info!(loan_id = id, "loan returned, copies reactivated");
    }

    txn.commit().await?;

    Ok(updated_loan)
}

/// Renew a loan: allowed while unreturned and below the renewal limit.
/// Extends the due date by the borrower's user-type loan window.
pub async fn renew_loan(db: &DatabaseConnection, id: i32) -> Result<loan::Model, DomainError> {
    let loan = Loan::find_by_id(id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;

    if !loan.is_open() {
        return Err(DomainError::Validation(
            "loan is already returned".to_owned(),
        ));
    }
    if loan.renewals_count >= loan.max_renewals {
        return Err(DomainError::Validation(format!(
            "renewal limit of {} reached",
            loan.max_renewals
        )));
    }

    let (_, user_type) = User::find_by_id(loan.user_id)
        .find_also_related(UserType)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;
    let max_loan_days = user_type.map(|t| t.max_loan_days).unwrap_or(7);

    let due = chrono::DateTime::parse_from_rfc3339(&loan.expected_return_date)
        .map_err(|e| DomainError::Database(format!("bad due date on loan {}: {}", id, e)))?;
    let extended = (due + Duration::days(max_loan_days as i64)).to_rfc3339();

    let now = Utc::now().to_rfc3339();
    let renewals = loan.renewals_count + 1;

    let mut loan_active: loan::ActiveModel = loan.into();
    loan_active.renewals_count = Set(renewals);
    loan_active.status = Set("renewed".to_owned());
    loan_active.expected_return_date = Set(extended);
    loan_active.updated_at = Set(now);

    let updated = loan_active.update(db).await?;

    tracing::info!(loan_id = id, renewals, "loan renewed");

    Ok(updated)
}

/// List loans with borrower names and borrowed copies attached.
pub async fn list_loans(
    db: &DatabaseConnection,
    filter: LoanFilter,
) -> Result<Vec<LoanWithDetails>, DomainError> {
    let mut query = Loan::find();

    if let Some(user_id) = filter.user_id {
        query = query.filter(loan::Column::UserId.eq(user_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(loan::Column::Status.eq(status));
    }

    let loans_with_users = query
        .order_by_desc(loan::Column::LoanDate)
        .find_also_related(User)
        .all(db)
        .await?;

    let loan_ids: Vec<i32> = loans_with_users.iter().map(|(l, _)| l.id).collect();
    let copies_by_loan = load_copies(db, &loan_ids).await?;

    Ok(loans_with_users
        .into_iter()
        .map(|(loan, user)| enrich(loan, user, &copies_by_loan))
        .collect())
}

/// Fetch a single loan with its borrower and copies.
pub async fn get_loan(db: &DatabaseConnection, id: i32) -> Result<LoanWithDetails, DomainError> {
    let (loan, user) = Loan::find_by_id(id)
        .find_also_related(User)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;

    let copies_by_loan = load_copies(db, &[loan.id]).await?;

    Ok(enrich(loan, user, &copies_by_loan))
}

async fn load_copies(
    db: &DatabaseConnection,
    loan_ids: &[i32],
) -> Result<HashMap<i32, Vec<LoanCopy>>, DomainError> {
    let mut copies_by_loan: HashMap<i32, Vec<LoanCopy>> = HashMap::new();

    if loan_ids.is_empty() {
        return Ok(copies_by_loan);
    }

    let details_with_copies = LoanDetail::find()
        .filter(loan_detail::Column::LoanId.is_in(loan_ids.to_vec()))
        .find_also_related(Copy)
        .all(db)
        .await?;

    let book_ids: Vec<i32> = details_with_copies
        .iter()
        .filter_map(|(_, c)| c.as_ref().map(|c| c.book_id))
        .collect();

    let mut title_by_book: HashMap<i32, String> = HashMap::new();
    if !book_ids.is_empty() {
        for book in Book::find()
            .filter(crate::models::book::Column::Id.is_in(book_ids))
            .all(db)
            .await?
        {
            title_by_book.insert(book.id, book.title);
        }
    }

    for (detail, copy_row) in details_with_copies {
        let Some(copy_row) = copy_row else { continue };
        let title = title_by_book
            .get(&copy_row.book_id)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_owned());
        copies_by_loan.entry(detail.loan_id).or_default().push(LoanCopy {
            copy_id: copy_row.id,
            book_title: title,
            isbn: copy_row.isbn,
        });
    }

    Ok(copies_by_loan)
}

fn enrich(
    loan: loan::Model,
    user: Option<user::Model>,
    copies_by_loan: &HashMap<i32, Vec<LoanCopy>>,
) -> LoanWithDetails {
    let borrower_name = user
        .map(|u| u.display_name())
        .unwrap_or_else(|| "Unknown".to_owned());

    LoanWithDetails {
        id: loan.id,
        user_id: loan.user_id,
        borrower_name,
        status: loan.status,
        loan_date: loan.loan_date,
        expected_return_date: loan.expected_return_date,
        actual_return_date: loan.actual_return_date,
        renewals_count: loan.renewals_count,
        max_renewals: loan.max_renewals,
        observations: loan.observations,
        copies: copies_by_loan.get(&loan.id).cloned().unwrap_or_default(),
    }
}
