use std::path::Path;

use console::Style;
use depthdeblur_core::deconv::{DeconvolutionConfig, DeconvolutionMethod};
use depthdeblur_core::pipeline::config::{normalize_layers, normalize_psf_width};
use depthdeblur_core::pipeline::DeblurConfig;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_run_summary(config: &DeblurConfig, output_dir: &Path) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Depth Deblur"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(12)));
    println!();

    println!("  {:<14}{}", s.label.apply_to("Left"), s.path.apply_to(config.left.display()));
    println!("  {:<14}{}", s.label.apply_to("Right"), s.path.apply_to(config.right.display()));
    println!("  {:<14}{}", s.label.apply_to("Kernels"), s.path.apply_to(config.kernel_dir.display()));
    println!("  {:<14}{}", s.label.apply_to("Output"), s.path.apply_to(output_dir.display()));
    println!("  {:<14}{}", s.label.apply_to("Threads"), s.value.apply_to(config.threads));
    println!();

    // Regions
    let width = normalize_psf_width(config.psf_width);
    println!("  {}", s.header.apply_to("Regions"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Kernel"),
        s.value.apply_to(format!("{width}x{width}"))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Layers"),
        s.value.apply_to(normalize_layers(config.layers))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Top level"),
        s.value.apply_to(format!("<= {}", config.max_top_level_nodes))
    );
    println!();

    // Disparity
    println!("  {}", s.header.apply_to("Disparity"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(config.disparity.algorithm)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Range"),
        s.value.apply_to(format!("0..{} px", config.disparity.max_disparity))
    );
    println!();

    print_deconvolution_section(&s, &config.deconvolution);

    // Output
    println!("  {}", s.header.apply_to("Output"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Regions"),
        s.value.apply_to(config.output.granularity)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Channels"),
        s.value.apply_to(if config.output.color { "color" } else { "gray" })
    );
    println!();
}

fn print_deconvolution_section(s: &Styles, deconv: &DeconvolutionConfig) {
    println!("  {}", s.header.apply_to("Deconvolution"));
    for (label, method) in [("Selection", deconv.selection), ("Final", deconv.final_method)] {
        let detail = match method {
            DeconvolutionMethod::Fft => format!("weight {}", deconv.fft_weight),
            DeconvolutionMethod::Irls => format!(
                "{} x {} iterations",
                deconv.irls.outer_iterations, deconv.irls.cg_iterations
            ),
        };
        println!(
            "    {:<12}{} {}",
            s.label.apply_to(label),
            s.method.apply_to(method),
            s.label.apply_to(detail)
        );
    }
    println!();
}
