pub mod config;
pub mod disparity;
pub mod pipeline;
