//! ExchangeBay: a small marketplace where users list items and send each other
//! email trade offers.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod images;
pub mod listings;
pub mod notifier;
pub mod state;
pub mod storage;
pub mod trades;
pub mod validation;
