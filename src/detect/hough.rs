//! Gradient-directed circle voting.
//!
//! Every Canny edge pixel casts votes along its Sobel gradient line (both
//! directions) at every distance in the radius search range. Accumulator peaks
//! are candidate centers; each center's radius is the best-supported distance
//! in the histogram of edge-pixel distances. Accepted circles are polished with
//! an algebraic least-squares circle fit over their supporting edge pixels.
//!
//! Votes from a sharp step edge scatter over a few neighbouring cells, so peaks
//! are searched on a 3×3 box sum of the accumulator rather than on single cells.
//!
//! Search window, as a function of image height `h`:
//! - radii in `[h/8, h/2]`
//! - minimum distance between accepted centers `h/2`

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use nalgebra::{DMatrix, DVector};

use crate::detect::{Circle, DetectorConfig};
use crate::math::solve_least_squares;

/// Upper bound on accumulator peaks examined per image.
const MAX_CENTER_CANDIDATES: usize = 64;

/// Box-sum half-width used before peak search (1 → 3×3).
const SMOOTH_RADIUS: usize = 1;

/// Centroid window half-width around a peak (2 → 5×5), covering the box sum's reach.
const CENTROID_RADIUS: usize = 2;

/// Half-width (px) of the band around a radius used for refinement inliers.
const REFINE_BAND: f64 = 2.0;

#[derive(Debug, Clone, Copy)]
struct EdgePoint {
    x: f64,
    y: f64,
    /// Unit gradient direction.
    dx: f64,
    dy: f64,
}

/// Detect circle candidates. An empty result means voting found nothing usable.
pub fn hough_circles(image: &GrayImage, config: &DetectorConfig) -> Vec<Circle> {
    let (width, height) = image.dimensions();
    let min_r = (height / 8).max(1) as usize;
    let max_r = (height / 2) as usize;
    let min_dist = (height / 2) as f64;
    if max_r <= min_r {
        return Vec::new();
    }

    let edges = collect_edge_points(image, config);
    if edges.len() < config.accumulator_threshold as usize {
        tracing::debug!(edges = edges.len(), "too few edge pixels for circle voting");
        return Vec::new();
    }

    let (w, h) = (width as usize, height as usize);
    let acc = vote(&edges, w, h, min_r, max_r);
    let smoothed = box_sum(&acc, w, h, SMOOTH_RADIUS);
    let peaks = accumulator_peaks(&smoothed, w, h, config.accumulator_threshold);

    let mut accepted: Vec<Circle> = Vec::new();
    for &idx in peaks.iter().take(MAX_CENTER_CANDIDATES) {
        let (cx, cy) = peak_centroid(&acc, w, h, idx, CENTROID_RADIUS);
        if accepted
            .iter()
            .any(|c| ((c.x - cx).powi(2) + (c.y - cy).powi(2)).sqrt() < min_dist)
        {
            continue;
        }
        let Some(circle) = best_radius(&edges, cx, cy, min_r, max_r, config) else {
            continue;
        };
        let circle = refine_circle(&edges, circle, min_r as f64, max_r as f64).unwrap_or(circle);
        accepted.push(circle);
    }

    tracing::debug!(
        edges = edges.len(),
        peaks = peaks.len(),
        accepted = accepted.len(),
        "circle voting finished"
    );
    accepted
}

fn collect_edge_points(image: &GrayImage, config: &DetectorConfig) -> Vec<EdgePoint> {
    let edge_map = canny(image, config.canny_low, config.canny_high);
    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);

    let mut out = Vec::new();
    for (x, y, px) in edge_map.enumerate_pixels() {
        if px[0] == 0 {
            continue;
        }
        let sx = gx.get_pixel(x, y)[0] as f64;
        let sy = gy.get_pixel(x, y)[0] as f64;
        let mag = (sx * sx + sy * sy).sqrt();
        if mag <= 0.0 {
            continue;
        }
        out.push(EdgePoint {
            x: x as f64,
            y: y as f64,
            dx: sx / mag,
            dy: sy / mag,
        });
    }
    out
}

/// Fill the center accumulator (row-major, one cell per pixel).
fn vote(edges: &[EdgePoint], width: usize, height: usize, min_r: usize, max_r: usize) -> Vec<u32> {
    let mut acc = vec![0u32; width * height];
    for e in edges {
        for sign in [1.0, -1.0] {
            let mut last = usize::MAX;
            for r in min_r..=max_r {
                let cx = (e.x + sign * r as f64 * e.dx).round();
                let cy = (e.y + sign * r as f64 * e.dy).round();
                // The ray only moves away from the frame once it has left it.
                if cx < 0.0 || cy < 0.0 || cx >= width as f64 || cy >= height as f64 {
                    break;
                }
                let idx = cy as usize * width + cx as usize;
                if idx != last {
                    acc[idx] += 1;
                    last = idx;
                }
            }
        }
    }
    acc
}

/// Sum of every cell's `(2·radius + 1)²` neighbourhood, clipped at the frame.
fn box_sum(acc: &[u32], width: usize, height: usize, radius: usize) -> Vec<u32> {
    // Separable: rows first, then columns.
    let mut rows = vec![0u32; acc.len()];
    for y in 0..height {
        let row = &acc[y * width..(y + 1) * width];
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            rows[y * width + x] = row[lo..=hi].iter().sum();
        }
    }

    let mut out = vec![0u32; acc.len()];
    for y in 0..height {
        let lo = y.saturating_sub(radius);
        let hi = (y + radius).min(height - 1);
        for x in 0..width {
            out[y * width + x] = (lo..=hi).map(|yy| rows[yy * width + x]).sum();
        }
    }
    out
}

/// Local maxima at or above `threshold`, strongest first.
///
/// A cell must beat its already-scanned neighbours strictly and the rest
/// non-strictly, so a plateau yields a single peak.
fn accumulator_peaks(acc: &[u32], width: usize, height: usize, threshold: u32) -> Vec<usize> {
    let mut peaks = Vec::new();
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let idx = y * width + x;
            let v = acc[idx];
            if v < threshold.max(1) {
                continue;
            }
            let before = [idx - width - 1, idx - width, idx - width + 1, idx - 1];
            let after = [idx + 1, idx + width - 1, idx + width, idx + width + 1];
            if before.iter().all(|&n| v > acc[n]) && after.iter().all(|&n| v >= acc[n]) {
                peaks.push(idx);
            }
        }
    }
    peaks.sort_by(|&a, &b| acc[b].cmp(&acc[a]).then(a.cmp(&b)));
    peaks
}

/// Vote-weighted centroid of the raw votes within `radius` cells of a peak.
fn peak_centroid(acc: &[u32], width: usize, height: usize, idx: usize, radius: usize) -> (f64, f64) {
    let px = idx % width;
    let py = idx / width;
    let (mut sw, mut sx, mut sy) = (0.0, 0.0, 0.0);
    for y in py.saturating_sub(radius)..=(py + radius).min(height - 1) {
        for x in px.saturating_sub(radius)..=(px + radius).min(width - 1) {
            let w = acc[y * width + x] as f64;
            sw += w;
            sx += w * x as f64;
            sy += w * y as f64;
        }
    }
    if sw > 0.0 {
        (sx / sw, sy / sw)
    } else {
        (px as f64, py as f64)
    }
}

/// Pick the radius with the most edge support around a fixed center.
///
/// Support at `r` counts edge pixels whose rounded distance is within one bin of
/// `r`. Ties go to the larger radius.
fn best_radius(
    edges: &[EdgePoint],
    cx: f64,
    cy: f64,
    min_r: usize,
    max_r: usize,
    config: &DetectorConfig,
) -> Option<Circle> {
    let mut hist = vec![0u32; max_r + 2];
    for e in edges {
        let d = ((e.x - cx).powi(2) + (e.y - cy).powi(2)).sqrt().round() as usize;
        if d + 1 >= min_r && d <= max_r + 1 {
            hist[d] += 1;
        }
    }

    let mut best: Option<(usize, u32)> = None;
    for r in min_r..=max_r {
        let support = hist[r - 1] + hist[r] + hist[r + 1];
        if best.is_none_or(|(_, s)| support >= s) {
            best = Some((r, support));
        }
    }
    let (r, support) = best?;

    let coverage = support as f64 / (2.0 * std::f64::consts::PI * r as f64);
    if support < config.accumulator_threshold || coverage < config.min_edge_coverage {
        return None;
    }
    Some(Circle {
        x: cx,
        y: cy,
        radius: r as f64,
    })
}

/// Algebraic (Kåsa) circle fit over edge pixels near the current circle.
///
/// Solves `u² + v² = D·u + E·v + F` in coordinates relative to the current
/// center. Returns `None` if the fit degenerates or leaves the search range.
fn refine_circle(edges: &[EdgePoint], circle: Circle, min_r: f64, max_r: f64) -> Option<Circle> {
    let mut current = circle;
    for _ in 0..3 {
        let inliers: Vec<(f64, f64)> = edges
            .iter()
            .map(|e| (e.x - current.x, e.y - current.y))
            .filter(|(u, v)| ((u * u + v * v).sqrt() - current.radius).abs() <= REFINE_BAND)
            .collect();
        if inliers.len() < 3 {
            return None;
        }

        let mut a = DMatrix::<f64>::zeros(inliers.len(), 3);
        let mut b = DVector::<f64>::zeros(inliers.len());
        for (i, &(u, v)) in inliers.iter().enumerate() {
            a[(i, 0)] = u;
            a[(i, 1)] = v;
            a[(i, 2)] = 1.0;
            b[i] = u * u + v * v;
        }
        let sol = solve_least_squares(&a, &b)?;
        let (du, dv) = (sol[0] / 2.0, sol[1] / 2.0);
        let r2 = sol[2] + du * du + dv * dv;
        if !(r2.is_finite() && r2 > 0.0) {
            return None;
        }
        let next = Circle {
            x: current.x + du,
            y: current.y + dv,
            radius: r2.sqrt(),
        };
        if next.radius < 0.5 * min_r || next.radius > 1.5 * max_r {
            return None;
        }
        let shift = (du * du + dv * dv).sqrt();
        current = next;
        if shift < 1e-3 {
            break;
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LimbLaw;
    use crate::synth::{DiskScene, render_disk};

    #[test]
    fn plateau_produces_single_peak() {
        // 5x5 grid with a flat 2-cell plateau in the middle row.
        let mut acc = vec![0u32; 25];
        acc[12] = 40;
        acc[13] = 40;
        let peaks = accumulator_peaks(&acc, 5, 5, 30);
        assert_eq!(peaks, vec![12]);
    }

    #[test]
    fn scattered_votes_peak_after_box_sum() {
        // A 3x3 patch of 10 votes: no single cell reaches 30, the neighbourhood does.
        let (w, h) = (7, 7);
        let mut acc = vec![0u32; w * h];
        for y in 2..=4 {
            for x in 2..=4 {
                acc[y * w + x] = 10;
            }
        }
        assert!(accumulator_peaks(&acc, w, h, 30).is_empty());

        let smoothed = box_sum(&acc, w, h, 1);
        assert_eq!(smoothed[3 * w + 3], 90);
        assert_eq!(smoothed[2 * w + 3], 60);
        assert_eq!(accumulator_peaks(&smoothed, w, h, 30), vec![3 * w + 3]);

        let (cx, cy) = peak_centroid(&acc, w, h, 3 * w + 3, 2);
        assert!((cx - 3.0).abs() < 1e-12 && (cy - 3.0).abs() < 1e-12);
    }

    #[test]
    fn refinement_recovers_subpixel_center() {
        let edges: Vec<EdgePoint> = (0..360)
            .map(|deg| {
                let t = (deg as f64).to_radians();
                EdgePoint {
                    x: 50.3 + 40.0 * t.cos(),
                    y: 61.7 + 40.0 * t.sin(),
                    dx: -t.cos(),
                    dy: -t.sin(),
                }
            })
            .collect();
        let rough = Circle {
            x: 51.0,
            y: 61.0,
            radius: 40.0,
        };
        let fine = refine_circle(&edges, rough, 10.0, 60.0).unwrap();
        assert!((fine.x - 50.3).abs() < 1e-6);
        assert!((fine.y - 61.7).abs() < 1e-6);
        assert!((fine.radius - 40.0).abs() < 1e-6);
    }

    #[test]
    fn voting_returns_one_dominant_circle() {
        let scene = DiskScene {
            radius: 60.0,
            law: LimbLaw::Linear { u: 0.0 },
            ..DiskScene::default()
        };
        let circles = hough_circles(&render_disk(&scene), &DetectorConfig::default());
        assert_eq!(circles.len(), 1, "{circles:?}");
        let c = circles[0];
        assert!((c.x - 128.0).abs() < 1.5 && (c.y - 128.0).abs() < 1.5, "{c:?}");
        assert!((c.radius - 60.0).abs() < 2.0, "{c:?}");
    }

    #[test]
    fn sharp_edged_disks_are_found_across_radii() {
        for radius in [40.0, 70.0, 90.0] {
            let scene = DiskScene {
                radius,
                law: LimbLaw::Linear { u: 0.0 },
                ..DiskScene::default()
            };
            let circles = hough_circles(&render_disk(&scene), &DetectorConfig::default());
            assert!(!circles.is_empty(), "no circle for r={radius}");
        }
    }
}
