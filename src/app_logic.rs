/*
 * This module provides the application logic layer, centered around
 * `GallerySession`, which owns the columns and the global image index and turns
 * `GalleryEvent`s into `GalleryCommand`s for whatever renders the gallery.
 * Session-level tests are in `handler_tests.rs`.
 */
pub mod gallery_events;
pub mod gallery_session;

#[cfg(test)]
mod handler_tests;

pub use gallery_events::{GalleryCommand, GalleryEvent};
pub use gallery_session::GallerySession;
