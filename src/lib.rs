//! Toolbench
//!
//! Toolbench compares trade tool prices across suppliers, prices bulk orders with quantity
//! discounts and merges AI buying recommendations into each comparison.

pub mod bulk;
pub mod comparison;
pub mod export;
pub mod extract;
pub mod insights;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod remote;
pub mod render;
pub mod session;
pub mod suppliers;
