use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R};

/// A single grayscale image.
/// Pixel values are f32 in [0.0, 1.0].
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Original bit depth before conversion (8 or 16)
    pub original_bit_depth: u8,
}

impl Frame {
    pub fn new(data: Array2<f32>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

/// Color image composed of separate channel frames.
#[derive(Clone, Debug)]
pub struct ColorFrame {
    pub red: Frame,
    pub green: Frame,
    pub blue: Frame,
}

impl ColorFrame {
    pub fn channels(&self) -> [&Frame; 3] {
        [&self.red, &self.green, &self.blue]
    }

    pub fn from_channels(channels: [Frame; 3]) -> Self {
        let [red, green, blue] = channels;
        Self { red, green, blue }
    }
}

/// ITU-R BT.601 luminance of a color frame.
pub fn luminance(color: &ColorFrame) -> Frame {
    let data = &color.red.data * LUMINANCE_R
        + &color.green.data * LUMINANCE_G
        + &color.blue.data * LUMINANCE_B;
    Frame::new(data, color.red.original_bit_depth)
}

/// One view of the stereo pair, either grayscale or color.
#[derive(Clone, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum StereoImage {
    Mono(Frame),
    Color(ColorFrame),
}

impl StereoImage {
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Self::Mono(f) => f.data.dim(),
            Self::Color(c) => c.red.data.dim(),
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Self::Color(_))
    }

    /// Grayscale version used by every estimation step.
    pub fn to_gray(&self) -> Frame {
        match self {
            Self::Mono(f) => f.clone(),
            Self::Color(c) => luminance(c),
        }
    }

    /// Channel planes in order (one for mono, R/G/B for color).
    pub fn planes(&self) -> Vec<&Array2<f32>> {
        match self {
            Self::Mono(f) => vec![&f.data],
            Self::Color(c) => c.channels().into_iter().map(|f| &f.data).collect(),
        }
    }
}

/// Which camera of the rectified stereo pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum View {
    Left,
    Right,
}

impl View {
    pub const BOTH: [View; 2] = [View::Left, View::Right];

    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// A value per view, indexable by [`View`].
#[derive(Clone, Debug, Default)]
pub struct ViewPair<T> {
    pub left: T,
    pub right: T,
}

impl<T> ViewPair<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn get(&self, view: View) -> &T {
        match view {
            View::Left => &self.left,
            View::Right => &self.right,
        }
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> ViewPair<U> {
        ViewPair {
            left: f(&self.left),
            right: f(&self.right),
        }
    }
}

impl<T> std::ops::Index<View> for ViewPair<T> {
    type Output = T;

    fn index(&self, view: View) -> &T {
        self.get(view)
    }
}
