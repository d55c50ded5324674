pub mod image_io;

pub use image_io::{
    kernel_path, load_color_image, load_image, load_kernel, load_stereo_image, save_color_image,
    save_image, save_kernel, save_stereo_image,
};
