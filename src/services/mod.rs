//! Business logic services

pub mod books;
pub mod import;
pub mod rentals;
pub mod reservations;
pub mod reviews;
pub mod users;

use crate::{
    config::{AuthConfig, CirculationConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub books: books::BooksService,
    pub rentals: rentals::RentalsService,
    pub reservations: reservations::ReservationsService,
    pub reviews: reviews::ReviewsService,
    pub users: users::UsersService,
    pub import: import::ImportService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        circulation: CirculationConfig,
    ) -> Self {
        Self {
            books: books::BooksService::new(repository.clone()),
            rentals: rentals::RentalsService::new(repository.clone(), circulation.clone()),
            reservations: reservations::ReservationsService::new(
                repository.clone(),
                circulation,
            ),
            reviews: reviews::ReviewsService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), auth_config),
            import: import::ImportService::new(repository.clone()),
            repository,
        }
    }
}
