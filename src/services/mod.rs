pub mod artist;
pub mod availability;
pub mod booking;
pub mod conflict;
pub mod error;
pub mod genres;
pub mod show;
pub mod venue;
pub mod views;
