//! Oriented bounding boxes, optionally constrained to keep +Z as an axis.
//!
//! The Z-constrained box is the minimum-area rectangle of the points'
//! XY projection (convex hull plus one caliper pass per hull edge),
//! extruded over the Z range. Aligning a floor-snapped scan with its axes
//! puts the dominant walls parallel to X and Y.

use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::error::{TransformError, TransformResult};
use crate::pca::pca_from_points;

/// Which axes the box solver may choose freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObbConstraint {
    /// Free orientation from the points' principal axes.
    None,
    /// Keep +Z as the third axis; only rotate about Z.
    #[default]
    AxisZ,
}

/// An oriented bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedBox {
    /// Box center in world coordinates.
    pub center: Point3<f64>,
    /// Right-handed orthonormal box axes; `axes[0]` spans the longest
    /// horizontal side for Z-constrained boxes.
    pub axes: [Vector3<f64>; 3],
    /// Half-size along each axis.
    pub half_extents: Vector3<f64>,
}

impl OrientedBox {
    /// Full size along each axis.
    #[must_use]
    pub fn extents(&self) -> Vector3<f64> {
        self.half_extents * 2.0
    }
}

/// Compute an oriented bounding box of `points`.
///
/// # Errors
///
/// Returns `TransformError::InsufficientPoints` for an empty point set, or
/// for fewer than 3 points without a constraint.
///
/// # Example
///
/// ```
/// use mesh_transform::{ObbConstraint, oriented_bounding_box};
/// use nalgebra::Point3;
///
/// // A 4 x 1 rectangle rotated 30 degrees about Z
/// let (s, c) = 30f64.to_radians().sin_cos();
/// let points: Vec<_> = [(0.0, 0.0), (4.0, 0.0), (4.0, 1.0), (0.0, 1.0)]
///     .iter()
///     .map(|&(x, y)| Point3::new(c * x - s * y, s * x + c * y, 0.0))
///     .collect();
///
/// let obb = oriented_bounding_box(&points, ObbConstraint::AxisZ).unwrap();
/// assert!((obb.extents().x - 4.0).abs() < 1e-9);
/// assert!((obb.extents().y - 1.0).abs() < 1e-9);
/// assert!((obb.axes[0].x - c).abs() < 1e-9);
/// ```
pub fn oriented_bounding_box(
    points: &[Point3<f64>],
    constraint: ObbConstraint,
) -> TransformResult<OrientedBox> {
    if points.is_empty() {
        return Err(TransformError::InsufficientPoints {
            required: 1,
            actual: 0,
        });
    }

    let axes = match constraint {
        ObbConstraint::AxisZ => z_constrained_axes(points),
        ObbConstraint::None => {
            let pca = pca_from_points(points).ok_or(TransformError::InsufficientPoints {
                required: 3,
                actual: points.len(),
            })?;
            let x = pca.axes[0];
            let y = pca.axes[1];
            [x, y, x.cross(&y)]
        }
    };

    Ok(fit_box(points, axes))
}

/// Box extents and center for fixed axes.
fn fit_box(points: &[Point3<f64>], axes: [Vector3<f64>; 3]) -> OrientedBox {
    let mut min = Vector3::repeat(f64::INFINITY);
    let mut max = Vector3::repeat(f64::NEG_INFINITY);
    for p in points {
        let local = Vector3::new(
            axes[0].dot(&p.coords),
            axes[1].dot(&p.coords),
            axes[2].dot(&p.coords),
        );
        min = min.inf(&local);
        max = max.sup(&local);
    }

    let mid = (min + max) * 0.5;
    let center = Point3::from(axes[0] * mid.x + axes[1] * mid.y + axes[2] * mid.z);
    OrientedBox {
        center,
        axes,
        half_extents: (max - min) * 0.5,
    }
}

fn z_constrained_axes(points: &[Point3<f64>]) -> [Vector3<f64>; 3] {
    let projected: Vec<Point2<f64>> = points.iter().map(|p| Point2::new(p.x, p.y)).collect();
    let hull = convex_hull(projected);

    let mut best: Option<(f64, Vector2<f64>, f64, f64)> = None;
    for i in 0..hull.len() {
        let edge = hull[(i + 1) % hull.len()] - hull[i];
        let Some(dir) = edge.try_normalize(f64::EPSILON) else {
            continue;
        };
        let perp = Vector2::new(-dir.y, dir.x);

        let (mut lo_u, mut hi_u, mut lo_v, mut hi_v) = (
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
        );
        for p in &hull {
            let u = dir.dot(&p.coords);
            let v = perp.dot(&p.coords);
            lo_u = lo_u.min(u);
            hi_u = hi_u.max(u);
            lo_v = lo_v.min(v);
            hi_v = hi_v.max(v);
        }

        let (width, height) = (hi_u - lo_u, hi_v - lo_v);
        let area = width * height;
        if best.is_none_or(|(best_area, ..)| area < best_area) {
            best = Some((area, dir, width, height));
        }
    }

    let long_side = match best {
        Some((_, dir, width, height)) if height > width => Vector2::new(-dir.y, dir.x),
        Some((_, dir, ..)) => dir,
        None => Vector2::x(),
    };

    // Deterministic sign: X points into the +x half-plane (or +y when vertical)
    let long_side = if long_side.x < -f64::EPSILON
        || (long_side.x.abs() <= f64::EPSILON && long_side.y < 0.0)
    {
        -long_side
    } else {
        long_side
    };

    let x = Vector3::new(long_side.x, long_side.y, 0.0);
    let z = Vector3::z();
    [x, z.cross(&x), z]
}

/// Convex hull in counter-clockwise order (monotone chain), collinear points dropped.
fn convex_hull(mut points: Vec<Point2<f64>>) -> Vec<Point2<f64>> {
    points.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let cross = |o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>| (a - o).perp(&(b - o));

    let mut hull: Vec<Point2<f64>> = Vec::with_capacity(points.len() + 1);
    for p in &points {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in points.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}
