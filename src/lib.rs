//! Offline-capable weather page host.
//!
//! An in-process cache worker sits between the page and the network: the app
//! shell is precached and served cache-first, weather API calls go
//! network-first with the last response kept for offline use.

pub mod app;
pub mod config;
pub mod events;
pub mod forecast;
pub mod geolocation;
pub mod install;
pub mod page;
pub mod render;
pub mod routes;
pub mod utils;
pub mod wmo;
pub mod worker;
