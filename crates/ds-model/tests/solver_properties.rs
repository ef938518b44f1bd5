//! Behavioral properties of the dome azimuth solver.

use ds_core::{hours_to_rad, map180, map360};
use ds_model::{
    AzimuthModel, CoordinateTransform, HorizontalPosition, MountGeometry, SphericalTransform,
    TelescopePointing,
};
use proptest::prelude::*;

fn moore(latitude: f64) -> MountGeometry {
    MountGeometry::new(latitude, 147.0, 0.0, 49.2, 0.0).expect("valid geometry")
}

proptest! {
    #[test]
    fn solution_is_a_compass_bearing(
        lat in prop_oneof![-89.9_f64..-0.01, 0.01_f64..89.9],
        ha in -12.0_f64..12.0,
        dec in -89.0_f64..89.0,
        iterations in 1_usize..20,
    ) {
        let model = AzimuthModel::new(moore(lat));
        let lst = hours_to_rad(7.25);
        let ra = ds_core::map24(7.25 - ha);
        let az = model.solve(&TelescopePointing::equatorial(ra, dec), lst, iterations);
        prop_assert!((0.0..360.0).contains(&az), "az = {}", az);
    }

    #[test]
    fn identical_inputs_identical_output(
        lat in -80.0_f64..80.0,
        ra in 0.0_f64..24.0,
        dec in -80.0_f64..80.0,
        lst in 0.0_f64..core::f64::consts::TAU,
    ) {
        let model = AzimuthModel::new(moore(lat));
        let p = TelescopePointing::equatorial(ra, dec);
        let a = model.solve(&p, lst, 5);
        let b = model.solve(&p, lst, 5);
        prop_assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn more_iterations_barely_move_the_answer() {
    // Offset to radius ratio 0.33; only pointings between the horizon and
    // 60 degrees, away from the dome zenith where azimuth is ill-conditioned.
    for lat in [-60.0, -27.797778, 20.0, 38.3334, 60.0] {
        let model = AzimuthModel::new(moore(lat));
        for ha_step in -11..=11 {
            let ha = f64::from(ha_step) + 0.25;
            for dec in [-60.0, -30.0, 0.0, 30.0, 60.0] {
                let lst = hours_to_rad(12.0);
                let pointing = TelescopePointing::equatorial(12.0 - ha, dec);
                let pos = SphericalTransform.resolve(&pointing, lat, lst);
                if !(0.0..=60.0).contains(&pos.alt_deg) {
                    continue;
                }
                let coarse = model.solve(&pointing, lst, 5);
                let fine = model.solve(&pointing, lst, 50);
                let diff = map180(fine - coarse).abs();
                assert!(
                    diff < 0.01,
                    "lat={lat} ha={ha} dec={dec}: 5 iters {coarse}, 50 iters {fine}"
                );
            }
        }
    }
}

#[test]
fn hemispheres_are_related_by_half_turn() {
    // Mirror geometry: same latitude magnitude, azimuth measured from the
    // opposite pole, and the tube on the mirrored side of the pier.
    let north = AzimuthModel::new(moore(38.3334));
    let south = AzimuthModel::new(moore(-38.3334));
    for ha in [-10.5, -6.0, -2.25, 1.5, 4.0, 11.0] {
        for az in [10.0, 90.0, 165.0, 200.0, 300.0] {
            for alt in [15.0, 40.0, 70.0] {
                let n = north.solve_horizontal(&HorizontalPosition::new(alt, az, ha), 10);
                let s = south.solve_horizontal(
                    &HorizontalPosition::new(alt, map360(az + 180.0), -ha),
                    10,
                );
                let diff = map180(s.degrees - map360(n.degrees + 180.0));
                assert!(diff.abs() < 1e-9, "ha={ha} az={az} alt={alt}: {n:?} vs {s:?}");
            }
        }
    }
}

#[test]
fn scenario_southern_meridian_at_moore() {
    // 38.33 N, R=147, L=49.2, telescope due south at 45 degrees altitude. The
    // dec axis is horizontal on the meridian, so the whole 49.2 offset is
    // lateral and the correction is about 26.7 degrees toward the tube side.
    let model = AzimuthModel::new(moore(38.3334));
    let rp = (147.0_f64.powi(2) - 49.2_f64.powi(2)).sqrt();
    let lateral = 49.2_f64.atan2(rp * 45f64.to_radians().cos()).to_degrees();

    let west_of_pier = model.solve(&TelescopePointing::horizontal(45.0, 180.0, -1e-6), 0.0, 10);
    let east_of_pier = model.solve(&TelescopePointing::horizontal(45.0, 180.0, 1e-6), 0.0, 10);

    assert!((west_of_pier - (180.0 + lateral)).abs() < 0.05, "{west_of_pier}");
    assert!((east_of_pier - (180.0 - lateral)).abs() < 0.05, "{east_of_pier}");
}

#[test]
fn small_offset_gives_small_correction() {
    let g = MountGeometry::new(38.3334, 147.0, 0.0, 4.92, 0.0).expect("valid geometry");
    let model = AzimuthModel::new(g);
    for ha in [-0.2, 0.2] {
        let az = model.solve(&TelescopePointing::horizontal(45.0, 180.0, ha), 0.0, 5);
        assert!((az - 180.0).abs() < 3.0, "ha={ha}: {az}");
    }
}

#[test]
fn equatorial_and_horizontal_pointings_agree() {
    let model = AzimuthModel::new(moore(38.3334));
    let lst = 2.1;
    let eq = TelescopePointing::equatorial(5.5, 22.0);
    let pos = SphericalTransform.resolve(&eq, 38.3334, lst);
    let from_eq = model.solve(&eq, lst, 10);
    let from_hz = model.solve(&TelescopePointing::Horizontal(pos), 123.0, 10);
    assert_eq!(from_eq, from_hz);
}

#[test]
fn equator_site_is_finite() {
    let g = MountGeometry::new(0.0, 1.75, 0.0, 0.65, 0.20).expect("valid geometry");
    let model = AzimuthModel::new(g);
    for ha in [-9.0, -3.0, 3.0, 9.0] {
        let sol = model.solve_horizontal(&HorizontalPosition::new(35.0, 80.0, ha), 5);
        assert!(sol.degrees.is_finite());
        assert!(!sol.fallback);
    }
}
