//! Column histogram over the lower half of the mask and per-half peak picking.

use lane_finder_core::BinaryMask;
use serde::{Deserialize, Serialize};

use crate::LaneSide;

/// Candidate lane base: the histogram column with the largest count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peak {
    pub column: usize,
    pub count: u32,
}

/// One peak per half of the mask; `None` when the half has no set pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanePeaks {
    pub left: Option<Peak>,
    pub right: Option<Peak>,
    /// Mask width the halves were derived from.
    pub width: usize,
}

impl LanePeaks {
    pub fn get(&self, side: LaneSide) -> Option<Peak> {
        match side {
            LaneSide::Left => self.left,
            LaneSide::Right => self.right,
        }
    }

    /// Starting column for the first window on `side`: the peak, or the
    /// midpoint of that half when the peak is invalid.
    pub fn seed(&self, side: LaneSide) -> usize {
        self.get(side)
            .map(|p| p.column)
            .unwrap_or_else(|| half_midpoint(self.width, side))
    }
}

/// Column range `[start, end)` searched for a lane on `side`.
pub fn half_columns(width: usize, side: LaneSide) -> (usize, usize) {
    let mid = width / 2;
    match side {
        LaneSide::Left => (0, mid),
        LaneSide::Right => (mid, width),
    }
}

pub fn half_midpoint(width: usize, side: LaneSide) -> usize {
    let (start, end) = half_columns(width, side);
    start + (end - start) / 2
}

/// Count set pixels per column in rows `[row_start, height)`.
pub fn column_histogram(mask: &BinaryMask, row_start: usize) -> Vec<u32> {
    let mut hist = vec![0u32; mask.width];
    for y in row_start.min(mask.height)..mask.height {
        for (count, &set) in hist.iter_mut().zip(mask.row(y)) {
            *count += set as u32;
        }
    }
    hist
}

/// Maximum of `hist[start..end]`, lowest column on ties; `None` if all zero.
fn peak_in(hist: &[u32], start: usize, end: usize) -> Option<Peak> {
    let mut best: Option<Peak> = None;
    for (column, &count) in hist.iter().enumerate().take(end).skip(start) {
        if count > best.map_or(0, |b| b.count) {
            best = Some(Peak { column, count });
        }
    }
    best
}

/// Lane bases from the bottom half of `mask`.
pub fn find_lane_peaks(mask: &BinaryMask) -> LanePeaks {
    let hist = column_histogram(mask, mask.height / 2);
    let (l0, l1) = half_columns(mask.width, LaneSide::Left);
    let (r0, r1) = half_columns(mask.width, LaneSide::Right);
    let peaks = LanePeaks {
        left: peak_in(&hist, l0, l1),
        right: peak_in(&hist, r0, r1),
        width: mask.width,
    };
    log::debug!("lane base peaks: left={:?} right={:?}", peaks.left, peaks.right);
    peaks
}
