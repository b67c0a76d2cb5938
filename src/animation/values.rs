use glam::{Vec2, Vec3, Vec4};

/// Value types a [`Tween`](super::Tween) can blend between.
///
/// The type is checked when the tween is constructed, so an unsupported value
/// type is a compile error rather than a runtime lookup failure.
pub trait Interpolate: Copy + PartialEq + 'static {
    /// Blends `start` towards `end`. `fraction` is normally in `[0, 1]` but
    /// may leave that range for overshooting curves or constant change.
    fn interpolate(start: Self, end: Self, fraction: f32) -> Self;
}

/// Value types that also support addition, required by
/// [`ConstantChange`](super::ConstantChange).
///
/// `bool` deliberately does not implement this.
pub trait Accumulate: Interpolate {
    fn accumulate(self, delta: Self) -> Self;
}

impl Interpolate for f32 {
    #[inline]
    fn interpolate(start: Self, end: Self, fraction: f32) -> Self {
        start + (end - start) * fraction
    }
}

impl Accumulate for f32 {
    #[inline]
    fn accumulate(self, delta: Self) -> Self {
        self + delta
    }
}

impl Interpolate for i32 {
    /// The blended offset from `start` is truncated towards zero.
    #[inline]
    fn interpolate(start: Self, end: Self, fraction: f32) -> Self {
        let delta = (f64::from(end) - f64::from(start)) * f64::from(fraction);
        start.wrapping_add(delta as i32)
    }
}

impl Accumulate for i32 {
    #[inline]
    fn accumulate(self, delta: Self) -> Self {
        self.wrapping_add(delta)
    }
}

impl Interpolate for i64 {
    /// The blended offset from `start` is truncated towards zero.
    #[inline]
    fn interpolate(start: Self, end: Self, fraction: f32) -> Self {
        let delta = ((end as f64) - (start as f64)) * f64::from(fraction);
        start.wrapping_add(delta as i64)
    }
}

impl Accumulate for i64 {
    #[inline]
    fn accumulate(self, delta: Self) -> Self {
        self.wrapping_add(delta)
    }
}

impl Interpolate for bool {
    /// A step function switching at the halfway point.
    #[inline]
    fn interpolate(start: Self, end: Self, fraction: f32) -> Self {
        if fraction < 0.5 { start } else { end }
    }
}

impl Interpolate for Vec2 {
    #[inline]
    fn interpolate(start: Self, end: Self, fraction: f32) -> Self {
        start.lerp(end, fraction)
    }
}

impl Accumulate for Vec2 {
    #[inline]
    fn accumulate(self, delta: Self) -> Self {
        self + delta
    }
}

impl Interpolate for Vec3 {
    #[inline]
    fn interpolate(start: Self, end: Self, fraction: f32) -> Self {
        start.lerp(end, fraction)
    }
}

impl Accumulate for Vec3 {
    #[inline]
    fn accumulate(self, delta: Self) -> Self {
        self + delta
    }
}

/// RGBA colors, blended component-wise.
impl Interpolate for Vec4 {
    #[inline]
    fn interpolate(start: Self, end: Self, fraction: f32) -> Self {
        start.lerp(end, fraction)
    }
}

impl Accumulate for Vec4 {
    #[inline]
    fn accumulate(self, delta: Self) -> Self {
        self + delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_truncate_the_offset() {
        assert_eq!(i32::interpolate(0, 10, 0.55), 5);
        assert_eq!(i32::interpolate(10, 0, 0.55), 5);
        assert_eq!(i64::interpolate(0, 3, 0.999), 2);
        assert_eq!(i32::interpolate(-7, 93, 1.0), 93);
    }

    #[test]
    fn negative_ranges_truncate_towards_the_start() {
        assert_eq!(i32::interpolate(-7, 0, 0.5), -4);
        assert_eq!(i64::interpolate(-7, 0, 0.5), -4);
        assert_eq!(i32::interpolate(0, -7, 0.5), -3);
    }

    #[test]
    fn bool_switches_at_half() {
        assert!(!bool::interpolate(false, true, 0.49));
        assert!(bool::interpolate(false, true, 0.5));
    }

    #[test]
    fn color_blends_per_channel() {
        let c = Vec4::interpolate(Vec4::new(0.0, 1.0, 0.0, 1.0), Vec4::new(1.0, 0.0, 0.0, 0.0), 0.25);
        assert_eq!(c, Vec4::new(0.25, 0.75, 0.0, 0.75));
    }
}
