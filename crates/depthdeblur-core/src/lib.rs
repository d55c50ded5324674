pub mod consts;
pub mod deconv;
pub mod disparity;
pub mod edges;
pub mod error;
pub mod estimate;
pub mod filters;
pub mod fourier;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod psf;
pub mod region_tree;
