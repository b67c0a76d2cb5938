//! Easing curves.
//!
//! An [`Easing`] maps elapsed integer milliseconds to eased milliseconds.
//! It combines a [`Shape`] (in, out, in-out) with a pure [`Curve`] and can be softened towards linear with a strength factor.
//!
//! # Example
//!
//! ```rust,ignore
//! use affinity::animation::Easing;
//!
//! let eased = Easing::STRONG_OUT.ease(250, 1000);
//! let softened = Easing::BACK_IN.with_strength(0.5);
//! ```

use std::f64::consts::PI;

/// Where the curve is applied within the normalized time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `f(t)`
    In,
    /// `1 - f(1 - t)`
    Out,
    /// `f` on the first half, mirrored `f` on the second half.
    InOut,
}

/// Pure curve functions on `t ∈ [0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    Linear,
    Quadratic,
    Cubic,
    Quartic,
    Quintic,
    /// `t³ + t² - t`, dips below zero before accelerating.
    Back,
    /// `t²(2t³ + t² - 4t + 2) · -sin(3.5πt)`, a decaying oscillation.
    Elastic,
}

impl Curve {
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Curve::Linear => t,
            Curve::Quadratic => t * t,
            Curve::Cubic => t * t * t,
            Curve::Quartic => {
                let t2 = t * t;
                t2 * t2
            }
            Curve::Quintic => {
                let t2 = t * t;
                t2 * t2 * t
            }
            Curve::Back => {
                let t2 = t * t;
                t2 * t + t2 - t
            }
            Curve::Elastic => {
                let t2 = t * t;
                let t3 = t2 * t;
                let scale = t2 * (2.0 * t3 + t2 - 4.0 * t + 2.0);
                let wave = -(t * 3.5 * PI).sin();
                scale * wave
            }
        }
    }
}

/// An easing function: a curve, the shape it is applied with, and a strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Easing {
    shape: Shape,
    curve: Curve,
    strength: f32,
}

impl Easing {
    pub const NONE: Easing = Easing::new(Shape::In, Curve::Linear);

    pub const REGULAR_IN: Easing = Easing::new(Shape::In, Curve::Quadratic);
    pub const REGULAR_OUT: Easing = Easing::new(Shape::Out, Curve::Quadratic);
    pub const REGULAR_IN_OUT: Easing = Easing::new(Shape::InOut, Curve::Quadratic);

    pub const STRONG_IN: Easing = Easing::new(Shape::In, Curve::Quintic);
    pub const STRONG_OUT: Easing = Easing::new(Shape::Out, Curve::Quintic);
    pub const STRONG_IN_OUT: Easing = Easing::new(Shape::InOut, Curve::Quintic);

    pub const BACK_IN: Easing = Easing::new(Shape::In, Curve::Back);
    pub const BACK_OUT: Easing = Easing::new(Shape::Out, Curve::Back);
    pub const BACK_IN_OUT: Easing = Easing::new(Shape::InOut, Curve::Back);

    pub const ELASTIC_IN: Easing = Easing::new(Shape::In, Curve::Elastic);
    pub const ELASTIC_OUT: Easing = Easing::new(Shape::Out, Curve::Elastic);
    pub const ELASTIC_IN_OUT: Easing = Easing::new(Shape::InOut, Curve::Elastic);

    /// Creates a full-strength easing.
    #[must_use]
    pub const fn new(shape: Shape, curve: Curve) -> Self {
        Self {
            shape,
            curve,
            strength: 1.0,
        }
    }

    /// Returns a copy blended towards linear: `1.0` is the full curve, `0.0` is linear.
    #[must_use]
    pub fn with_strength(self, strength: f32) -> Self {
        Self {
            strength: strength.clamp(0.0, 1.0),
            ..self
        }
    }

    #[inline]
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    #[must_use]
    pub fn curve(&self) -> Curve {
        self.curve
    }

    #[inline]
    #[must_use]
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Maps `time` to eased time. The endpoints are clamped: `time <= 0` or
    /// `duration <= 0` yields 0 and `time >= duration` yields `duration`.
    /// Back and elastic curves may leave `[0, duration]` in between.
    #[must_use]
    pub fn ease(&self, time: i32, duration: i32) -> i32 {
        if time <= 0 || duration <= 0 {
            return 0;
        }
        if time >= duration {
            return duration;
        }

        let t = f64::from(time) / f64::from(duration);
        let mut eased = self.ease_fraction(t);

        if self.strength < 1.0 {
            let s = f64::from(self.strength);
            eased = s * eased + (1.0 - s) * t;
        }

        (eased * f64::from(duration)).round() as i32
    }

    fn ease_fraction(&self, t: f64) -> f64 {
        match self.shape {
            Shape::In => self.curve.apply(t),
            Shape::Out => 1.0 - self.curve.apply(1.0 - t),
            Shape::InOut => {
                if t < 0.5 {
                    self.curve.apply(2.0 * t) / 2.0
                } else {
                    1.0 - self.curve.apply(2.0 - 2.0 * t) / 2.0
                }
            }
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::NONE
    }
}
