//! Low-dimensional projections of profile tables for visualization.

pub mod pca;

pub use pca::{pca, Projection};
