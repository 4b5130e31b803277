use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::books::list_books,
        api::books::get_book,
        api::books::create_book,
        api::cart::add_to_cart,
        api::loan::create_loan,
        api::loan::update_loan,
        // Add other endpoints here as we document them
    ),
    tags(
        (name = "lectern", description = "Lectern catalog API")
    )
)]
pub struct ApiDoc;
