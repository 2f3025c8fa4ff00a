//! 64-bit DCT perceptual hash.

use image::imageops::FilterType;
use image::DynamicImage;
use rustdct::DctPlanner;
use slidecraft_core::{Error, Result};

/// Side of the grayscale sample the DCT runs over.
const SAMPLE_SIZE: usize = 32;
/// Side of the low-frequency block kept from the DCT.
const HASH_SIZE: usize = 8;

/// Perceptual hash; nearby values mean visually similar images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PerceptualHash(u64);

impl PerceptualHash {
    pub fn new(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    /// Decode encoded image bytes and hash them.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).map_err(|e| Error::ImageReadError(e.to_string()))?;
        Ok(Self::from_image(&image))
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        let gray = image
            .grayscale()
            .resize_exact(SAMPLE_SIZE as u32, SAMPLE_SIZE as u32, FilterType::Lanczos3)
            .to_luma8();
        let mut rows: Vec<f32> = gray.pixels().map(|p| p[0] as f32).collect();

        let mut planner = DctPlanner::new();
        let dct = planner.plan_dct2(SAMPLE_SIZE);
        for row in rows.chunks_exact_mut(SAMPLE_SIZE) {
            dct.process_dct2(row);
        }

        let mut columns = transpose(&rows);
        for column in columns.chunks_exact_mut(SAMPLE_SIZE) {
            dct.process_dct2(column);
        }

        // columns[x * SAMPLE_SIZE + y] holds frequency (y, x)
        let mut low = Vec::with_capacity(HASH_SIZE * HASH_SIZE);
        for y in 0..HASH_SIZE {
            for x in 0..HASH_SIZE {
                low.push(columns[x * SAMPLE_SIZE + y]);
            }
        }

        let median = median(&low);
        let bits = low
            .iter()
            .fold(0u64, |acc, &v| (acc << 1) | u64::from(v > median));
        Self(bits)
    }

    /// Number of differing bits.
    pub fn distance(&self, other: &PerceptualHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

fn transpose(square: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0; square.len()];
    for y in 0..SAMPLE_SIZE {
        for x in 0..SAMPLE_SIZE {
            out[x * SAMPLE_SIZE + y] = square[y * SAMPLE_SIZE + x];
        }
    }
    out
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
