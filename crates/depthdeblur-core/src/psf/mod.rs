pub mod bank;
pub mod joint;
pub mod kernel;

pub use bank::KernelBank;
pub use joint::estimate_joint_psf;
pub use kernel::{kernel_entropy, Psf};
