pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;

// Layered boundaries: use cases over ports, adapters behind them
pub mod app;
pub mod infra;

// Domain data shapes shared across layers
pub mod domain;

// Pure projections for display
pub mod view;
