//! Route modules organized by concern.

pub mod deliveries;
pub mod health;
pub mod rankings;
pub mod registrations;
pub mod votes;
