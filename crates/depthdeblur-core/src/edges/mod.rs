//! Gradient operators and salient-edge extraction.

pub mod gradient;
pub mod salient;

pub use gradient::{gradient_correlation, masked_cross_correlation, sobel_gradients};
pub use salient::{salient_edge_map, GradientField, SalientEdgeParams};
