use crate::frame::{StereoImage, View};

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Reading,
    Disparity,
    RegionTree,
    KernelBootstrap,
    Propagation,
    Refinement,
    Deconvolution(View),
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading views"),
            Self::Disparity => write!(f, "Estimating disparity"),
            Self::RegionTree => write!(f, "Building regions"),
            Self::KernelBootstrap => write!(f, "Loading kernels"),
            Self::Propagation => write!(f, "Propagating kernels"),
            Self::Refinement => write!(f, "Refining kernels"),
            Self::Deconvolution(view) => write!(f, "Deconvolving {view}"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Deblurred stereo pair, same encoding and size as the input views.
#[derive(Clone, Debug)]
pub struct DeblurOutput {
    pub left: StereoImage,
    pub right: StereoImage,
}

/// Stage and item notifications from the deblurring pipeline.
///
/// Called from estimation and deconvolution workers concurrently, hence
/// `Send + Sync`. Every method defaults to doing nothing.
pub trait ProgressReporter: Send + Sync {
    /// `total_items` is the node or region count of the stage, when known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// `items_done` nodes or regions of the current stage are finished.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// Progress reporter that ignores every notification.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
