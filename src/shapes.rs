//! Shape functions: pure phase warps `m ∈ [0,1] → m′ ∈ [0,1]`.
//!
//! A shape describes how the phase of a keyframe interval flows from start
//! to end. Shapes are value-kind independent — they never see the animated
//! values, only the normalized position within the interval.

/// A 2D control point used by the quadratic and cubic shapes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlPoint {
    /// Time-axis offset in `[0, 1]`.
    pub x: f64,
    /// Value-axis offset in `[0, 1]`.
    pub y: f64,
}

impl ControlPoint {
    /// Creates a new control point.
    ///
    /// # Panics
    ///
    /// Debug builds assert `x`/`y` are finite: a non-finite shape parameter
    /// is a genuine programmer error (a malformed literal, an unchecked
    /// division), not a runtime condition the engine should degrade
    /// gracefully around.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        debug_assert!(x.is_finite() && y.is_finite(), "control point coordinates must be finite");
        Self { x, y }
    }
}

/// Shape-specific parameters carried by a keyframe.
///
/// A keyframe with unset parameters defaults to `Discrete`'s unit variant or
/// to all-zero control points, which degrades quadratic/cubic curves to a
/// flat warp rather than crashing (spec.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShapeParams {
    /// Control point for a quadratic shape (unused otherwise).
    pub quadratic: ControlPoint,
    /// First control point for a cubic shape (unused otherwise).
    pub cubic_first: ControlPoint,
    /// Second control point for a cubic shape (unused otherwise).
    pub cubic_second: ControlPoint,
}

/// The warp applied to the phase of a keyframe interval.
///
/// Numeric tags match the ABI-equivalent contract:
/// `discrete=0, linear=1, cosine=2, quadratic=3, cubic=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shape {
    /// No warp: stays at 0 until the boundary, then jumps to 1.
    Discrete,
    /// Identity warp.
    #[default]
    Linear,
    /// Raised-cosine warp.
    Cosine,
    /// Single-control-point Bezier warp.
    Quadratic,
    /// Two-control-point Bezier warp.
    Cubic,
}

impl Shape {
    /// Returns the ABI-equivalent numeric tag for this shape.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Discrete => 0,
            Self::Linear => 1,
            Self::Cosine => 2,
            Self::Quadratic => 3,
            Self::Cubic => 4,
        }
    }

    /// Warps a phase `m ∈ [0, 1]` into `m′ ∈ [0, 1]` according to this shape.
    #[must_use]
    pub fn warp(&self, m: f64, params: &ShapeParams) -> f64 {
        match self {
            // Strictly: 0 until the interval's end, then 1 at the boundary.
            Self::Discrete => {
                if m < 1.0 {
                    0.0
                } else {
                    1.0
                }
            },
            Self::Linear => m,
            Self::Cosine => (1.0 - (m * core::f64::consts::PI).cos()) / 2.0,
            Self::Quadratic => {
                let cp = params.quadratic;
                bezier_warp(m, 0.0, cp.x, 1.0, 0.0, cp.y, 1.0)
            },
            Self::Cubic => {
                let p1 = params.cubic_first;
                let p2 = params.cubic_second;
                cubic_bezier_warp(m, 0.0, p1.x, p2.x, 1.0, 0.0, p1.y, p2.y, 1.0)
            },
        }
    }
}

/// Solves a quadratic Bezier `x(t) = m` for `t` via Newton-Raphson, then
/// returns `y(t)`. `x0..x2`/`y0..y2` are the three control points of the
/// quadratic (endpoints fixed at `(0,0)` and `(1,1)`).
fn bezier_warp(m: f64, x0: f64, x1: f64, x2: f64, y0: f64, y1: f64, y2: f64) -> f64 {
    let component = |t: f64, p0: f64, p1: f64, p2: f64| {
        let mt = 1.0 - t;
        mt * mt * p0 + 2.0 * mt * t * p1 + t * t * p2
    };
    let derivative = |t: f64, p0: f64, p1: f64, p2: f64| 2.0 * (1.0 - t) * (p1 - p0) + 2.0 * t * (p2 - p1);

    let mut t = m;
    for _ in 0..8 {
        let x = component(t, x0, x1, x2);
        let dx = derivative(t, x0, x1, x2);
        if dx.abs() < 1e-10 {
            break;
        }
        t -= (x - m) / dx;
        t = t.clamp(0.0, 1.0);
    }
    component(t, y0, y1, y2)
}

/// Solves a cubic Bezier `x(t) = m` for `t` via Newton-Raphson, then returns
/// `y(t)`. Endpoints are fixed at `(0,0)` and `(1,1)`, matching the
/// teacher's `evaluate_bezier`/`bezier_component`/`bezier_derivative`.
#[allow(clippy::too_many_arguments)]
fn cubic_bezier_warp(
    m: f64, x0: f64, x1: f64, x2: f64, x3: f64, y0: f64, y1: f64, y2: f64, y3: f64,
) -> f64 {
    let component = |t: f64, p0: f64, p1: f64, p2: f64, p3: f64| {
        let mt = 1.0 - t;
        mt * mt * mt * p0 + 3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t * p3
    };
    let derivative = |t: f64, p0: f64, p1: f64, p2: f64, p3: f64| {
        let mt = 1.0 - t;
        3.0 * mt * mt * (p1 - p0) + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (p3 - p2)
    };

    let mut t = m;
    for _ in 0..8 {
        let x = component(t, x0, x1, x2, x3);
        let dx = derivative(t, x0, x1, x2, x3);
        if dx.abs() < 1e-10 {
            break;
        }
        t -= (x - m) / dx;
        t = t.clamp(0.0, 1.0);
    }
    component(t, y0, y1, y2, y3)
}
