/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Weight of the impulse term in the joint PSF objective.
pub const JOINT_PSF_GAMMA: f64 = 1.0;

/// A sibling kernel is reliable when its entropy exceeds the level mean by
/// less than this fraction of the mean.
pub const RELIABILITY_FACTOR: f32 = 0.2;

/// Downsampling ratio applied to the views before disparity estimation.
pub const DISPARITY_SAMPLE_RATIO: usize = 2;

/// Disparity value marking an occluded / unmatched pixel before filling.
pub const OCCLUDED: i32 = -1;

/// Side length of the Gaussian window used before shock filtering in
/// candidate scoring.
pub const SELECTION_SMOOTH_WINDOW: usize = 5;

/// Number of gradient orientation bins used for salient-edge thresholding.
pub const SALIENT_ORIENTATION_BINS: usize = 4;

/// Default kernel width in pixels.
pub const DEFAULT_PSF_WIDTH: usize = 35;

/// Default number of depth layers.
pub const DEFAULT_LAYERS: usize = 12;

/// Default maximum number of top-level regions.
pub const DEFAULT_MAX_TOP_LEVEL_NODES: usize = 3;

/// Default maximum disparity in full-resolution pixels.
pub const DEFAULT_MAX_DISPARITY: usize = 80;

/// Default matching window for block matching (odd).
pub const DEFAULT_BLOCK_SIZE: usize = 7;

/// Default semi-global penalty for disparity changes of one.
pub const DEFAULT_SGM_P1: f32 = 8.0;

/// Default semi-global penalty for larger disparity jumps.
pub const DEFAULT_SGM_P2: f32 = 32.0;

/// Default gradient-prior weight of the frequency-domain deconvolution.
pub const DEFAULT_FFT_WEIGHT: f32 = 2e-3;

/// Default gradient-prior weight of the IRLS deconvolution.
pub const DEFAULT_IRLS_WEIGHT: f32 = 2e-3;

/// Default hyper-Laplacian exponent of the IRLS gradient prior.
pub const DEFAULT_IRLS_EXPONENT: f32 = 0.8;

/// Default IRLS reweighting iterations.
pub const DEFAULT_IRLS_OUTER_ITERATIONS: usize = 3;

/// Default conjugate gradient iterations per IRLS reweighting step.
pub const DEFAULT_IRLS_CG_ITERATIONS: usize = 20;

/// Lower bound on gradient magnitude when computing IRLS weights.
pub const IRLS_GRADIENT_FLOOR: f32 = 1e-3;

/// Default coherence filter parameters.
pub const DEFAULT_COHERENCE_SIGMA: f32 = 1.5;
pub const DEFAULT_COHERENCE_STRUCTURE_SIGMA: f32 = 2.0;
pub const DEFAULT_COHERENCE_BLEND: f32 = 0.5;
pub const DEFAULT_COHERENCE_ITERATIONS: usize = 4;

/// Default salient-edge parameters.
pub const DEFAULT_SALIENT_BLUR_SIGMA: f32 = 1.0;
pub const DEFAULT_SALIENT_RATIO: f32 = 2.0;

/// IRLS data-term weight for pixels outside the region mask.
pub const IRLS_OUTSIDE_WEIGHT: f32 = 0.05;
