/// Local Binary Patterns Histogram face model.
///
/// Each grayscale face is reduced to a grid of per-cell LBP code histograms
/// (radius 1, 8 neighbours, 256 bins per cell, each cell normalised to sum 1).
/// Prediction is nearest neighbour over all stored samples using the
/// symmetric chi-square distance, so smaller distances mean closer matches.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::atomic_file;
use crate::shared::frame::Frame;

const BINS_PER_CELL: usize = 256;

/// Neighbour offsets `(dx, dy)`, clockwise from the top-left pixel.
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

#[derive(Error, Debug)]
pub enum LbphModelError {
    #[error("failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt model {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode model: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write model {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LbphSample {
    pub identity: u32,
    pub histogram: Vec<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LbphModel {
    grid: u32,
    samples: Vec<LbphSample>,
}

impl LbphModel {
    pub fn new(grid: u32) -> Self {
        Self {
            grid: grid.max(1),
            samples: Vec::new(),
        }
    }

    pub fn grid(&self) -> u32 {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Adds a labelled face. Returns `false` if the face is too small to
    /// describe with this model's grid.
    pub fn add(&mut self, identity: u32, face: &Frame) -> bool {
        match histogram(face, self.grid) {
            Some(histogram) => {
                self.samples.push(LbphSample {
                    identity,
                    histogram,
                });
                true
            }
            None => false,
        }
    }

    /// Nearest stored identity and its distance, or `None` for an empty
    /// model or an undescribable face.
    pub fn predict(&self, face: &Frame) -> Option<(u32, f64)> {
        let query = histogram(face, self.grid)?;
        self.samples
            .iter()
            .filter(|s| s.histogram.len() == query.len())
            .map(|s| (s.identity, chi_square(&s.histogram, &query)))
            .fold(None, |best: Option<(u32, f64)>, (id, dist)| match best {
                Some((_, best_dist)) if best_dist <= dist => best,
                _ => Some((id, dist)),
            })
    }

    pub fn load(path: &Path) -> Result<Self, LbphModelError> {
        let json = fs::read_to_string(path).map_err(|e| LbphModelError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| LbphModelError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), LbphModelError> {
        let json = serde_json::to_vec(self).map_err(LbphModelError::Encode)?;
        atomic_file::write(path, &json).map_err(|e| LbphModelError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Spatial LBP histogram of a grayscale face.
///
/// Returns `None` for multi-channel input or when the LBP image is smaller
/// than one pixel per grid cell.
pub fn histogram(face: &Frame, grid: u32) -> Option<Vec<f32>> {
    let w = face.width() as usize;
    let h = face.height() as usize;
    let grid = grid as usize;
    if face.channels() != 1 || w < 3 || h < 3 {
        return None;
    }
    let (lbp_w, lbp_h) = (w - 2, h - 2);
    if lbp_w < grid || lbp_h < grid {
        return None;
    }

    let codes = lbp_codes(face.data(), w, h);
    let cell_w = lbp_w / grid;
    let cell_h = lbp_h / grid;
    let cell_pixels = (cell_w * cell_h) as f32;

    let mut hist = vec![0.0f32; grid * grid * BINS_PER_CELL];
    for gy in 0..grid {
        for gx in 0..grid {
            let base = (gy * grid + gx) * BINS_PER_CELL;
            for y in gy * cell_h..(gy + 1) * cell_h {
                for x in gx * cell_w..(gx + 1) * cell_w {
                    hist[base + codes[y * lbp_w + x] as usize] += 1.0;
                }
            }
            for bin in &mut hist[base..base + BINS_PER_CELL] {
                *bin /= cell_pixels;
            }
        }
    }
    Some(hist)
}

fn lbp_codes(data: &[u8], w: usize, h: usize) -> Vec<u8> {
    let mut codes = Vec::with_capacity((w - 2) * (h - 2));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = data[y * w + x];
            let mut code = 0u8;
            for (bit, (dx, dy)) in NEIGHBOURS.iter().enumerate() {
                let ny = (y as isize + dy) as usize;
                let nx = (x as isize + dx) as usize;
                if data[ny * w + nx] >= center {
                    code |= 1 << bit;
                }
            }
            codes.push(code);
        }
    }
    codes
}

/// Symmetric chi-square distance: `sum 2 (a - b)^2 / (a + b)`.
fn chi_square(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let sum = (x + y) as f64;
            if sum > f64::EPSILON {
                let diff = (x - y) as f64;
                2.0 * diff * diff / sum
            } else {
                0.0
            }
        })
        .sum()
}
