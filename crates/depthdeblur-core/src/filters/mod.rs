pub mod coherence;
pub mod gaussian_blur;
pub mod morphology;

pub use coherence::{coherence_filter, CoherenceParams};
pub use gaussian_blur::{gaussian_blur_array, gaussian_blur_window};
