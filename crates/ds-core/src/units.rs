// ds-core/src/units.rs

use uom::si::f64::{Angle as UomAngle, AngularVelocity as UomAngularVelocity, Time as UomTime};

// Public canonical unit types (SI, f64)
pub type Angle = UomAngle;
pub type AngularVelocity = UomAngularVelocity;
pub type Time = UomTime;

#[inline]
pub fn deg(v: f64) -> Angle {
    use uom::si::angle::degree;
    Angle::new::<degree>(v)
}

#[inline]
pub fn rad(v: f64) -> Angle {
    use uom::si::angle::radian;
    Angle::new::<radian>(v)
}

#[inline]
pub fn deg_per_s(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::degree_per_second;
    AngularVelocity::new::<degree_per_second>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn as_deg(a: Angle) -> f64 {
    use uom::si::angle::degree;
    a.get::<degree>()
}

#[inline]
pub fn as_deg_per_s(w: AngularVelocity) -> f64 {
    use uom::si::angular_velocity::degree_per_second;
    w.get::<degree_per_second>()
}

#[inline]
pub fn as_s(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

/// Time to sweep `angle` at `rate`, ignoring sign.
///
/// Returns zero time for a non-positive rate.
pub fn sweep_time(angle: Angle, rate: AngularVelocity) -> Time {
    let rate = as_deg_per_s(rate);
    if rate <= 0.0 {
        return s(0.0);
    }
    s(as_deg(angle).abs() / rate)
}
