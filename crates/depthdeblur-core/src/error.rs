use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeblurError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Stereo views differ: {0}")]
    ViewMismatch(String),

    #[error("Invalid disparity algorithm: {0}")]
    InvalidDisparityAlgorithm(String),

    #[error("Invalid deconvolution method: {0}")]
    InvalidDeconvolutionMethod(String),

    #[error("Can not load kernel {path}: {reason}")]
    KernelLoad { path: PathBuf, reason: String },

    #[error("Degenerate kernel: {0}")]
    DegenerateKernel(String),

    #[error("Unknown region node {0}")]
    UnknownNode(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

pub type Result<T> = std::result::Result<T, DeblurError>;
