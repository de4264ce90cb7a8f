//! Pallet layout planner.
//!
//! Lays out homogeneous SKUs (boxes or cylinders) on a pallet in a centred grid,
//! choosing between a primary, a rotated and an overhanging layout, and reports
//! counts, envelope and utilisation per SKU.

pub mod api;
pub mod batch;
pub mod browse;
pub mod config;
pub mod export;
pub mod geometry;
pub mod model;
pub mod optimizer;
pub mod records;
pub mod summary;
pub mod types;
