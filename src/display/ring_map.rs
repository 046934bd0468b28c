/*
 *  display/ring_map.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Decimation of azimuth sample arrays onto the ring
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use crate::constants::{HEADING_BINS, HEADING_SPIKE};

/// Map an array of azimuth scores (assumed to span 0-360 degrees) onto
/// `ring_size` bins, normalized to 0.0..=1.0.
///
/// Each bin is the mean of `len / ring_size` consecutive samples. Samples
/// past `ring_size * (len / ring_size)` are dropped. The lower end of the
/// output range is raised by `clip_fraction` of the data range before
/// normalizing, so only the peak region survives.
///
/// Flat input, empty input, or fewer samples than bins all map to zeros.
pub fn map_to_ring(samples: &[f64], ring_size: usize, clip_fraction: f64) -> Vec<f64> {
    if ring_size == 0 {
        return Vec::new();
    }
    let divisions = samples.len() / ring_size;
    if divisions == 0 {
        return vec![0.0; ring_size];
    }

    let means: Vec<f64> = samples
        .chunks_exact(divisions)
        .take(ring_size)
        .map(|bin| bin.iter().sum::<f64>() / divisions as f64)
        .collect();

    let (min, max) = means.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![0.0; ring_size];
    }

    let floor = min + clip_fraction.clamp(0.0, 1.0) * range;
    means.iter().map(|&v| interp(v, floor, max)).collect()
}

/// Linear map of `v` from `lo..=hi` onto `0..=1`, clamped at both ends.
fn interp(v: f64, lo: f64, hi: f64) -> f64 {
    if v <= lo {
        return 0.0;
    }
    if v >= hi {
        return 1.0;
    }
    (v - lo) / (hi - lo)
}

/// Reflect a sample array across the N-S axis.
pub fn reverse(samples: &[f64]) -> Vec<f64> {
    samples.iter().rev().copied().collect()
}

/// Flip a sample array up/down for HUD viewing: each half is reversed in place.
pub fn hud_flip(samples: &[f64]) -> Vec<f64> {
    let half = samples.len() / 2;
    let (a, b) = samples.split_at(half);
    a.iter().rev().chain(b.iter().rev()).copied().collect()
}

/// Synthesize a sample array with a single spike at `heading` degrees,
/// in the same orientation the ring uses for compass display.
pub fn heading_samples(heading: f64) -> Vec<f64> {
    let mut data = vec![0.0; HEADING_BINS];
    let bin = (heading.rem_euclid(360.0) as usize).min(HEADING_BINS - 1);
    data[bin] = HEADING_SPIKE;
    hud_flip(&reverse(&data))
}
