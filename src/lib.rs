pub mod config;
pub mod dataset;
pub mod grid;
pub mod indices;
pub mod model;
pub mod parallel;
pub mod point;
pub mod sweep;
pub mod time_utils;

pub use dataset::AtmosphereDataset;
pub use indices::DrivingParameters;
pub use sweep::run;

use thiserror::Error;

/// Crate-level error: every failure aborts the enclosing query.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("time input error: {0}")]
    Time(#[from] time_utils::TimeError),

    #[error("shape error: {0}")]
    Grid(#[from] grid::GridError),

    #[error("invalid point input: {0}")]
    InvalidPointInput(String),

    // Index-provider failures pass through unwrapped
    #[error(transparent)]
    Indices(#[from] indices::IndicesError),

    #[error("model error: {0}")]
    Model(#[from] model::ModelError),

    #[error("merge error: {0}")]
    Merge(#[from] dataset::MergeError),
}
