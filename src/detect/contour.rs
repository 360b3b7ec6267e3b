//! Threshold-and-contour fallback detector.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::contrast::otsu_level;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::detect::{Circle, DetectorConfig};
use crate::error::AppError;

const CONTAINS_EPS: f64 = 1e-7;

/// Otsu-threshold the image, take the largest outer boundary and return its
/// minimum enclosing circle.
pub fn contour_disk(image: &GrayImage, config: &DetectorConfig) -> Result<Circle, AppError> {
    let level = otsu_level(image);
    let binary = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });

    // A featureless frame thresholds to all-or-nothing; its border is not a disk.
    let foreground = binary.pixels().filter(|p| p[0] > 0).count();
    if foreground == 0 || foreground == (binary.width() * binary.height()) as usize {
        return Err(AppError::detection("No stellar disk detected in the image."));
    }

    // The largest outer border is never nested inside another component's hole.
    let contours = find_contours::<i32>(&binary);
    let largest = contours
        .iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer))
        .map(|c| {
            let pts: Vec<(f64, f64)> = c.points.iter().map(|p| (p.x as f64, p.y as f64)).collect();
            (polygon_area(&pts), pts)
        })
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, pts)| pts);

    let Some(points) = largest else {
        return Err(AppError::detection("No stellar disk detected in the image."));
    };

    let circle = min_enclosing_circle(&points)
        .ok_or_else(|| AppError::detection("No stellar disk detected in the image."))?;

    tracing::debug!(
        otsu = level,
        contours = contours.len(),
        boundary_points = points.len(),
        radius = circle.radius,
        "contour fallback candidate"
    );

    if circle.radius < config.min_fallback_radius {
        return Err(AppError::detection(format!(
            "Detected disk is too small (radius {:.1}px < {}px).",
            circle.radius, config.min_fallback_radius
        )));
    }
    Ok(circle)
}

/// Shoelace area of a closed polygon (absolute value).
pub fn polygon_area(points: &[(f64, f64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.0 * b.1 - b.0 * a.1)
        .sum();
    twice.abs() / 2.0
}

/// Smallest circle containing every point (Welzl, iterative form).
///
/// Points are shuffled with a fixed seed so the result is reproducible.
pub fn min_enclosing_circle(points: &[(f64, f64)]) -> Option<Circle> {
    let mut pts = points.to_vec();
    pts.shuffle(&mut StdRng::seed_from_u64(0));

    let first = *pts.first()?;
    let mut c = point_circle(first);
    for i in 1..pts.len() {
        if contains(&c, pts[i]) {
            continue;
        }
        c = point_circle(pts[i]);
        for j in 0..i {
            if contains(&c, pts[j]) {
                continue;
            }
            c = diameter_circle(pts[i], pts[j]);
            for k in 0..j {
                if !contains(&c, pts[k]) {
                    c = circumcircle(pts[i], pts[j], pts[k])
                        .unwrap_or_else(|| widest_pair_circle(pts[i], pts[j], pts[k]));
                }
            }
        }
    }
    Some(c)
}

fn point_circle(p: (f64, f64)) -> Circle {
    Circle {
        x: p.0,
        y: p.1,
        radius: 0.0,
    }
}

fn contains(c: &Circle, p: (f64, f64)) -> bool {
    ((p.0 - c.x).powi(2) + (p.1 - c.y).powi(2)).sqrt() <= c.radius + CONTAINS_EPS
}

fn diameter_circle(a: (f64, f64), b: (f64, f64)) -> Circle {
    Circle {
        x: (a.0 + b.0) / 2.0,
        y: (a.1 + b.1) / 2.0,
        radius: ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt() / 2.0,
    }
}

/// Circle through three points; `None` when they are collinear.
fn circumcircle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Option<Circle> {
    let (bx, by) = (b.0 - a.0, b.1 - a.1);
    let (cx, cy) = (c.0 - a.0, c.1 - a.1);
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() < 1e-12 {
        return None;
    }
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    Some(Circle {
        x: a.0 + ux,
        y: a.1 + uy,
        radius: (ux * ux + uy * uy).sqrt(),
    })
}

/// Collinear case: the diameter circle of the farthest-apart pair.
fn widest_pair_circle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Circle {
    [diameter_circle(a, b), diameter_circle(a, c), diameter_circle(b, c)]
        .into_iter()
        .max_by(|l, r| l.radius.total_cmp(&r.radius))
        .unwrap_or_else(|| diameter_circle(a, b))
}
