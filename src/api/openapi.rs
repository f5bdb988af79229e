//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "0.1.0",
        description = "Book catalog and loan management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "Library API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::create_book,
        books::get_book,
        books::list_books,
        books::update_book,
        books::delete_book,
        // Loans
        loans::create_loan,
        loans::get_loan,
        loans::return_loan,
        loans::list_loans,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookRequest,
            crate::models::book::BookFilter,
            crate::models::page::BookPage,
            // Loans
            crate::models::loan::CreateLoan,
            crate::models::loan::ReturnLoan,
            crate::models::loan::LoanStatus,
            crate::models::loan::LoanDetails,
            crate::models::loan::LoanFilter,
            crate::models::page::LoanPage,
            loans::LoanCreated,
            // Pagination
            crate::models::page::PageQuery,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "loans", description = "Loan management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
