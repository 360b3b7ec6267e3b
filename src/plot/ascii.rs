//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks of a fit in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - profile samples: `o`
//! - fitted law: `-` line
//! - residual strip (below the plot): `x` per sample, `.` on the zero line
//!
//! The x axis is always `μ ∈ [0, 1]` (limb on the left, disk center on the right).

use crate::domain::{FitResult, RadialProfile};
use crate::models::predict;

/// Render profile samples with an optional fitted law on top.
pub fn render_profile_plot(
    profile: &RadialProfile,
    fit: Option<&FitResult>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let curve = fit.map(|f| sample_curve(f, width));
    let points: Vec<(f64, f64)> = profile.points().collect();

    let (y_min, y_max) = y_range(&points, curve.as_deref()).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    if let Some(curve) = &curve {
        draw_curve(&mut grid, curve, y_min, y_max);
    }
    for &(mu, i) in &points {
        let x = map_x(mu, width);
        let y = map_y(i, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!("Plot: mu=[0.000, 1.000] | I=[{y_min:.3}, {y_max:.3}]"));
    if let Some(f) = fit {
        out.push_str(&format!(" | curve={}", f.model.name()));
    }
    out.push('\n');

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// Residuals of a fit against μ, on a symmetric axis around zero.
///
/// Returns an empty string when the fit does not line up with the profile.
pub fn render_residual_strip(profile: &RadialProfile, fit: &FitResult, width: usize, height: usize) -> String {
    if fit.residuals.len() != profile.len() || profile.is_empty() {
        return String::new();
    }
    let width = width.max(10);
    let height = height.max(3);

    let max_abs = fit
        .residuals
        .iter()
        .filter(|r| r.is_finite())
        .fold(0.0f64, |m, r| m.max(r.abs()));
    let span = max_abs.max(1e-12);

    let mut grid = vec![vec![' '; width]; height];
    let zero = map_y(0.0, -span, span, height);
    grid[zero].fill('.');
    for (&mu, &r) in profile.mu().iter().zip(&fit.residuals) {
        if r.is_finite() {
            grid[map_y(r, -span, span, height)][map_x(mu, width)] = 'x';
        }
    }

    let mut out = format!("Residuals: max|r|={max_abs:.4}\n");
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn sample_curve(fit: &FitResult, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let mu = i as f64 / (n as f64 - 1.0);
            (mu, predict(fit.model, mu, &fit.coefficients))
        })
        .filter(|(_, y)| y.is_finite())
        .collect()
}

fn y_range(points: &[(f64, f64)], curve: Option<&[(f64, f64)]>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for &(_, y) in points.iter().chain(curve.unwrap_or(&[])) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() && min_y == max_y {
        // Flat profile (uniform disk): centre it.
        Some((min_y - 0.5, max_y + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(mu: f64, width: usize) -> usize {
    let width = width.max(2);
    (mu.clamp(0.0, 1.0) * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(mu, y) in curve {
        let x = map_x(mu, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
