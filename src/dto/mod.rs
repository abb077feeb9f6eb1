pub mod auth;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;
