pub mod admin;
pub mod auth;
pub mod bookings;
pub mod contact;
pub mod extract;
pub mod health;
pub mod middleware;
pub mod payments;
pub mod services;
