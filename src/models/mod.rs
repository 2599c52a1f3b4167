//! Domain models

pub mod book;
pub mod marc;
pub mod rental;
pub mod reservation;
pub mod review;
pub mod user;
