use image::{GrayImage, Luma};
use imageproc::contrast::{ThresholdType, threshold as ip_threshold};

use crate::loader::LuminanceGrid;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Foreground/background mask over the working grid, derived from one
/// threshold. Foreground pixels hold [`FOREGROUND`], the rest [`BACKGROUND`].
#[derive(Debug, Clone)]
pub struct BinaryMask {
    pixels: GrayImage,
}

impl BinaryMask {
    /// Build a mask from a row-major predicate.
    pub fn from_fn(width: u32, height: u32, mut is_foreground: impl FnMut(u32, u32) -> bool) -> Self {
        let pixels = GrayImage::from_fn(width, height, |x, y| {
            if is_foreground(x, y) {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        });
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Foreground test that treats everything outside the grid as background.
    pub fn is_foreground(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return false;
        }
        self.pixels.get_pixel(x as u32, y as u32)[0] == FOREGROUND
    }

    pub fn foreground_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p[0] == FOREGROUND).count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.pixels
    }
}

/// Threshold the luminance grid: a pixel is foreground when its luminance is
/// strictly below `threshold`.
pub fn threshold_mask(grid: &LuminanceGrid, threshold: u8) -> BinaryMask {
    let pixels = match threshold.checked_sub(1) {
        // imageproc's inverted binary threshold: <= t -> 255, > t -> 0
        Some(inclusive) => ip_threshold(grid.as_image(), inclusive, ThresholdType::BinaryInverted),
        None => GrayImage::from_pixel(grid.width(), grid.height(), Luma([BACKGROUND])),
    };
    BinaryMask { pixels }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(w: u32, h: u32, value: u8) -> LuminanceGrid {
        LuminanceGrid::from_gray(GrayImage::from_pixel(w, h, Luma([value]))).unwrap()
    }

    mod threshold_mask {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn all_below_threshold_become_foreground() {
                let mask = threshold_mask(&grid(2, 2, 100), 128);
                assert_eq!(mask.foreground_count(), 4);
            }

            #[test]
            fn all_above_threshold_stay_background() {
                let mask = threshold_mask(&grid(2, 2, 200), 128);
                assert_eq!(mask.foreground_count(), 0);
            }

            #[test]
            fn exact_threshold_is_background() {
                let mask = threshold_mask(&grid(2, 2, 128), 128);
                assert_eq!(mask.foreground_count(), 0);
            }

            #[test]
            fn one_below_threshold_is_foreground() {
                let mask = threshold_mask(&grid(2, 2, 127), 128);
                assert_eq!(mask.foreground_count(), 4);
            }

            #[test]
            fn dimensions_preserved() {
                let mask = threshold_mask(&grid(5, 3, 100), 128);
                assert_eq!(mask.dimensions(), (5, 3));
            }

            #[test]
            fn mixed_values_per_pixel() {
                let mut input = GrayImage::new(2, 2);
                input.put_pixel(0, 0, Luma([127])); // thr-1
                input.put_pixel(1, 0, Luma([128])); // thr
                input.put_pixel(0, 1, Luma([129])); // thr+1
                input.put_pixel(1, 1, Luma([0]));
                let grid = LuminanceGrid::from_gray(input).unwrap();

                let mask = threshold_mask(&grid, 128);

                assert!(mask.is_foreground(0, 0));
                assert!(!mask.is_foreground(1, 0));
                assert!(!mask.is_foreground(0, 1));
                assert!(mask.is_foreground(1, 1));
            }

            #[test]
            fn threshold_zero_selects_nothing() {
                let mask = threshold_mask(&grid(3, 3, 0), 0);
                assert_eq!(mask.foreground_count(), 0);
            }

            #[test]
            fn threshold_255_selects_all_but_white() {
                let mut input = GrayImage::from_pixel(2, 1, Luma([254]));
                input.put_pixel(1, 0, Luma([255]));
                let mask = threshold_mask(&LuminanceGrid::from_gray(input).unwrap(), 255);
                assert!(mask.is_foreground(0, 0));
                assert!(!mask.is_foreground(1, 0));
            }

            #[test]
            fn outside_grid_is_background() {
                let mask = threshold_mask(&grid(2, 2, 0), 255);
                assert!(mask.is_foreground(0, 0));
                assert!(!mask.is_foreground(-1, 0));
                assert!(!mask.is_foreground(0, -1));
                assert!(!mask.is_foreground(2, 0));
                assert!(!mask.is_foreground(0, 2));
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                /// threshold_mask: output only ever holds the two mask values
                #[test]
                fn output_is_binary(
                    w in 1u32..20,
                    h in 1u32..20,
                    fill_value in proptest::num::u8::ANY,
                    threshold in proptest::num::u8::ANY
                ) {
                    let mask = threshold_mask(&grid(w, h, fill_value), threshold);

                    prop_assert_eq!(mask.dimensions(), (w, h));
                    for px in mask.as_image().pixels() {
                        prop_assert!(px[0] == FOREGROUND || px[0] == BACKGROUND);
                    }
                }

                /// threshold_mask: foreground exactly when value < threshold
                #[test]
                fn respects_threshold(
                    value in proptest::num::u8::ANY,
                    threshold in proptest::num::u8::ANY
                ) {
                    let mask = threshold_mask(&grid(1, 1, value), threshold);
                    prop_assert_eq!(mask.is_foreground(0, 0), value < threshold);
                }

                /// Raising the threshold never removes foreground pixels
                #[test]
                fn monotonic_in_threshold(
                    values in proptest::collection::vec(proptest::num::u8::ANY, 16),
                    low in proptest::num::u8::ANY,
                    high in proptest::num::u8::ANY
                ) {
                    let (low, high) = (low.min(high), low.max(high));
                    let image = GrayImage::from_fn(4, 4, |x, y| Luma([values[(y * 4 + x) as usize]]));
                    let grid = LuminanceGrid::from_gray(image).unwrap();
                    let a = threshold_mask(&grid, low);
                    let b = threshold_mask(&grid, high);
                    for y in 0..4 {
                        for x in 0..4 {
                            if a.is_foreground(x, y) {
                                prop_assert!(b.is_foreground(x, y));
                            }
                        }
                    }
                }
            }
        }
    }
}
