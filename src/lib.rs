//! upcat - UPC tagging for product image annotation
//!
//! Business logic behind a shelf-image annotation tool: annotators walk the
//! "Product" labels of an image and tag each with the UPC code of the item
//! it shows, picked from a personal worklist or from the product catalog.
//!
//! - [`catalog`] builds per-user worklists, catalog lookups and reference
//!   galleries once at startup
//! - [`navigation`] finds the previous/next product label
//! - [`tagging`] writes tags with replace semantics, optionally onto every
//!   overlapping label
//! - [`app::TaggerApp`] dispatches host events to [`handlers`]
//!
//! The annotation platform itself (storage, UI, membership) is reached
//! through the traits in [`services`].

pub mod app;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod handlers;
pub mod local;
pub mod model;
pub mod navigation;
pub mod services;
pub mod tagging;

#[cfg(test)]
mod testing;

pub use app::TaggerApp;
pub use error::AppError;
