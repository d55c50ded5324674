use std::path::Path;
use std::sync::Arc;

use ndarray::Array2;
use tracing::info;

use crate::deconv::DeconvolutionConfig;
use crate::disparity::{estimate_disparity, DisparityConfig, DisparityMap};
use crate::error::{DeblurError, Result};
use crate::estimate::{
    blurred_gradients, composite_regions, deconvolve_regions, run_pass, EstimationContext,
    EstimationParams, Granularity, Pass, PassReport, RegionDeconvStore, RegionJob,
};
use crate::frame::{ColorFrame, Frame, StereoImage, View, ViewPair};
use crate::io::{kernel_path, load_kernel, load_stereo_image};
use crate::psf::{KernelBank, Psf};
use crate::region_tree::RegionTree;

use super::config::{normalize_layers, normalize_psf_width, DeblurConfig};
use super::types::{DeblurOutput, PipelineStage, ProgressReporter};

/// Region tree together with its kernels and the leaf latent cache.
struct Regions {
    tree: RegionTree,
    bank: KernelBank,
    latents: RegionDeconvStore,
}

/// Depth-aware deblurring of one stereo pair.
///
/// Stages are run in order: [`estimate_disparity`](Self::estimate_disparity),
/// [`build_region_tree`](Self::build_region_tree),
/// [`load_top_level_kernels`](Self::load_top_level_kernels) (or
/// [`set_top_level_kernel`](Self::set_top_level_kernel)),
/// [`estimate_kernels`](Self::estimate_kernels) and finally
/// [`deconvolve`](Self::deconvolve) / [`deconvolve_top_level`](Self::deconvolve_top_level).
pub struct DepthDeblur {
    views: ViewPair<StereoImage>,
    gray: ViewPair<Array2<f32>>,
    psf_width: usize,
    layers: usize,
    threads: usize,
    params: EstimationParams,
    regions: Option<Regions>,
}

impl DepthDeblur {
    pub fn new(left: StereoImage, right: StereoImage, config: &DeblurConfig) -> Result<Self> {
        if left.is_color() != right.is_color() {
            return Err(DeblurError::ViewMismatch(
                "one view is color, the other grayscale".into(),
            ));
        }
        if left.dim() != right.dim() {
            let (h, w) = right.dim();
            let (lh, lw) = left.dim();
            return Err(DeblurError::ViewMismatch(format!(
                "left is {lw}x{lh}, right is {w}x{h}"
            )));
        }
        let (h, w) = left.dim();
        if h == 0 || w == 0 {
            return Err(DeblurError::InvalidDimensions {
                width: w,
                height: h,
            });
        }

        let psf_width = normalize_psf_width(config.psf_width);
        let layers = normalize_layers(config.layers);
        if psf_width == 0 || layers == 0 {
            return Err(DeblurError::InvalidConfig(format!(
                "psf_width {} and layers {} leave nothing to estimate",
                config.psf_width, config.layers
            )));
        }
        if psf_width > h.min(w) {
            return Err(DeblurError::InvalidDimensions {
                width: w,
                height: h,
            });
        }

        let mut params = config.estimation_params();
        params.psf_width = psf_width;
        let gray = ViewPair::new(left.to_gray().data, right.to_gray().data);
        info!(width = w, height = h, psf_width, layers, color = left.is_color(), "Loaded stereo pair");

        Ok(Self {
            views: ViewPair::new(left, right),
            gray,
            psf_width,
            layers,
            threads: config.threads.max(1),
            params,
            regions: None,
        })
    }

    pub fn psf_width(&self) -> usize {
        self.psf_width
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    pub fn gray(&self) -> &ViewPair<Array2<f32>> {
        &self.gray
    }

    pub fn deconvolution(&self) -> &DeconvolutionConfig {
        &self.params.deconvolution
    }

    /// Quantized disparity maps of both views.
    pub fn estimate_disparity(&self, config: &DisparityConfig) -> Result<ViewPair<DisparityMap>> {
        let frames = self.gray.map(|g| Frame::new(g.clone(), 16));
        estimate_disparity(&frames, self.layers, config)
    }

    pub fn build_region_tree(
        &mut self,
        disparity: ViewPair<DisparityMap>,
        max_top_level_nodes: usize,
    ) -> Result<&RegionTree> {
        if disparity.left.dim() != self.gray.left.dim() {
            return Err(DeblurError::ViewMismatch(
                "disparity maps do not match the views".into(),
            ));
        }
        let tree = RegionTree::build(disparity, self.layers, max_top_level_nodes)?;
        let nodes = tree.len();
        let regions = self.regions.insert(Regions {
            tree,
            bank: KernelBank::new(nodes),
            latents: RegionDeconvStore::new(nodes),
        });
        Ok(&regions.tree)
    }

    fn regions(&self) -> Result<&Regions> {
        self.regions
            .as_ref()
            .ok_or_else(|| DeblurError::Pipeline("region tree has not been built".into()))
    }

    pub fn tree(&self) -> Result<&RegionTree> {
        Ok(&self.regions()?.tree)
    }

    pub fn kernel(&self, id: usize) -> Result<Psf> {
        self.regions()?.bank.psf(id)
    }

    pub fn kernel_entropy(&self, id: usize) -> Result<f32> {
        self.regions()?.bank.entropy(id)
    }

    /// Seed the `index`-th top-level region with a kernel.
    pub fn set_top_level_kernel(&self, index: usize, psf: Psf) -> Result<()> {
        let regions = self.regions()?;
        let id = *regions.tree.top_level_ids().get(index).ok_or_else(|| {
            DeblurError::Pipeline(format!("there is no top-level region {index}"))
        })?;
        regions.bank.set(id, psf)
    }

    /// Seed every top-level region from `<dir>/kernel<i>.png`.
    pub fn load_top_level_kernels(&self, dir: &Path) -> Result<()> {
        let count = self.tree()?.top_level_ids().len();
        for index in 0..count {
            let path = kernel_path(dir, index);
            let psf = load_kernel(&path)?;
            info!(index, path = %path.display(), width = psf.width(), "Loaded top-level kernel");
            self.set_top_level_kernel(index, psf)?;
        }
        Ok(())
    }

    /// Run the propagation and refinement passes.
    pub fn estimate_kernels(&self, reporter: &dyn ProgressReporter) -> Result<[PassReport; 2]> {
        let regions = self.regions()?;
        let gradients = self.gray.map(blurred_gradients);
        let ctx = EstimationContext {
            tree: &regions.tree,
            gray: &self.gray,
            blurred_gradients: &gradients,
            bank: &regions.bank,
            latents: &regions.latents,
            params: &self.params,
        };

        reporter.begin_stage(PipelineStage::Propagation, Some(regions.tree.len()));
        let propagation = run_pass(&ctx, Pass::Propagate, self.threads, reporter)?;
        reporter.finish_stage();

        reporter.begin_stage(PipelineStage::Refinement, Some(regions.tree.len()));
        let refinement = run_pass(&ctx, Pass::Refine, self.threads, reporter)?;
        reporter.finish_stage();

        Ok([propagation, refinement])
    }

    /// Deblur one view region by region at leaf granularity.
    pub fn deconvolve(&self, view: View, color: bool, reporter: &dyn ProgressReporter) -> Result<StereoImage> {
        self.deconvolve_at(Granularity::Leaf, view, color, reporter)
    }

    /// Deblur one view using only the top-level regions.
    pub fn deconvolve_top_level(
        &self,
        view: View,
        color: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<StereoImage> {
        self.deconvolve_at(Granularity::TopLevel, view, color, reporter)
    }

    pub fn deconvolve_at(
        &self,
        granularity: Granularity,
        view: View,
        color: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<StereoImage> {
        let regions = self.regions()?;
        let image = &self.views[view];
        let planes: Vec<&Array2<f32>> = match image {
            StereoImage::Color(_) if color => image.planes(),
            _ => vec![&self.gray[view]],
        };
        let plane_count = planes.len();
        let ids = granularity.region_ids(&regions.tree);

        let job = RegionJob {
            tree: &regions.tree,
            bank: &regions.bank,
            view,
            planes,
            deconvolution: &self.params.deconvolution,
            cache: Some(&regions.latents),
        };
        reporter.begin_stage(PipelineStage::Deconvolution(view), Some(ids.len()));
        let store = deconvolve_regions(&job, &ids, self.threads, reporter)?;
        let mut composite = composite_regions(&regions.tree, &store, &ids, view, plane_count)?;
        reporter.finish_stage();

        let depth = match image {
            StereoImage::Mono(f) => f.original_bit_depth,
            StereoImage::Color(c) => c.red.original_bit_depth,
        };
        if plane_count == 3 {
            let blue = composite.pop();
            let green = composite.pop();
            let red = composite.pop();
            if let (Some(r), Some(g), Some(b)) = (red, green, blue) {
                return Ok(StereoImage::Color(ColorFrame::from_channels([
                    Frame::new(r, depth),
                    Frame::new(g, depth),
                    Frame::new(b, depth),
                ])));
            }
        }
        let gray = composite
            .pop()
            .ok_or_else(|| DeblurError::Pipeline("deconvolution produced no planes".into()))?;
        Ok(StereoImage::Mono(Frame::new(gray, depth)))
    }
}

/// Run the full pipeline described by `config`.
pub fn run_pipeline(config: &DeblurConfig, reporter: Arc<dyn ProgressReporter>) -> Result<DeblurOutput> {
    config.validate()?;
    let color = config.output.color;

    reporter.begin_stage(PipelineStage::Reading, Some(2));
    let left = load_stereo_image(&config.left, color)?;
    reporter.advance(1);
    let right = load_stereo_image(&config.right, color)?;
    reporter.advance(2);
    reporter.finish_stage();

    let mut deblur = DepthDeblur::new(left, right, config)?;

    reporter.begin_stage(PipelineStage::Disparity, None);
    let disparity = deblur.estimate_disparity(&config.disparity)?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::RegionTree, None);
    let tree = deblur.build_region_tree(disparity, config.max_top_level_nodes)?;
    info!(regions = tree.len(), top_level = tree.top_level_ids().len(), "Region tree ready");
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::KernelBootstrap, None);
    deblur.load_top_level_kernels(&config.kernel_dir)?;
    reporter.finish_stage();

    deblur.estimate_kernels(reporter.as_ref())?;

    let granularity = config.output.granularity;
    let left = deblur.deconvolve_at(granularity, View::Left, color, reporter.as_ref())?;
    let right = deblur.deconvolve_at(granularity, View::Right, color, reporter.as_ref())?;
    info!(%granularity, "Deblurring complete");

    Ok(DeblurOutput { left, right })
}
