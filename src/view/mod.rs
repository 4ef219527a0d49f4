// Read-only projections used by the presentation layer

pub mod filter;

pub use filter::{project, CategoryFilter};
