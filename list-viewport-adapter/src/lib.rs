//! Adapter utilities for the `list-viewport` crate.
//!
//! The `list-viewport` crate is UI-agnostic and focuses on the layout passes themselves. This
//! crate provides small, framework-neutral helpers commonly needed by adapters:
//!
//! - A controller that queues scroll intents between frames and restores saved state
//! - A resumable idle pre-layout cursor driven by the host's idle scheduler
//!
//! This crate is intentionally framework-agnostic (no ratatui/egui bindings).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod controller;
mod prelayout;

#[cfg(test)]
mod tests;

pub use controller::Controller;
pub use prelayout::{PrelayoutCursor, PrelayoutStatus};
