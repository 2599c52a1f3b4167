//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, rentals, reservations, reviews, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Seoga API",
        version = "1.0.0",
        description = "Library circulation and catalog REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Users
        users::signup,
        users::login,
        users::me,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::toggle_like,
        books::liked_books,
        books::reserve_book,
        // Rentals
        rentals::create_rental,
        rentals::return_rental,
        rentals::list_my_rentals,
        rentals::current_rentals,
        rentals::overdue_rentals,
        rentals::my_penalty,
        rentals::rental_stats,
        // Reservations
        reservations::list_my_reservations,
        reservations::cancel_reservation,
        reservations::sweep_reservations,
        // Reviews
        reviews::list_reviews,
        reviews::create_review,
        reviews::update_review,
        reviews::delete_review,
    ),
    components(
        schemas(
            // Users
            crate::models::user::SignupRequest,
            crate::models::user::UserInfo,
            users::LoginRequest,
            users::LoginResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookStatus,
            crate::models::book::BookSummary,
            crate::models::book::BookDetails,
            crate::models::book::BookPage,
            crate::models::book::UpsertBook,
            books::LikeResponse,
            // Rentals
            crate::models::rental::Rental,
            crate::models::rental::RentalDetails,
            crate::models::rental::BorrowPenalty,
            crate::models::rental::RentalStats,
            rentals::CreateRentalRequest,
            rentals::ReturnResponse,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationStatus,
            crate::models::reservation::ReservationDetails,
            reservations::CancelResponse,
            reservations::SweepResponse,
            // Reviews
            crate::models::review::Review,
            crate::models::review::ReviewDetails,
            crate::models::review::ReviewPage,
            crate::models::review::CreateReview,
            crate::models::review::UpdateReview,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Accounts and authentication"),
        (name = "books", description = "Catalog search and maintenance"),
        (name = "rentals", description = "Borrowing and returning"),
        (name = "reservations", description = "Reservation queueing"),
        (name = "reviews", description = "Book reviews")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
