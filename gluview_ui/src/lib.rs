#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Terminal chart rendering over composed frames.
//!
//! Pure string production: the CLI decides where the lines go. Actual
//! readings draw as `●` joined by line segments (broken across gap
//! boundaries), the index-based projection as `○`, the time-aware
//! projection as `◌`, with a `┊` column at the actual→projected boundary.

pub mod chart;

pub use chart::{ChartLayout, render_frame};
