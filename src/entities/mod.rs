pub mod artist;
pub mod availability;
pub mod show;
pub mod venue;
