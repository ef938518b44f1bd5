//! One-shot solves and model sweeps.

use crate::clock::SystemSiderealClock;
use crate::error::{AppError, AppResult};
use crate::runtime::build_model;
use ds_config::schema::DomeSyncConfig;
use ds_control::SiderealClock;
use ds_core::map180;
use ds_model::{CoordinateTransform, SphericalTransform, TelescopePointing};
use serde::Serialize;

/// What to solve for.
#[derive(Debug, Clone, Copy)]
pub struct SolveRequest {
    pub pointing: TelescopePointing,
    /// Sidereal time in radians. `None` uses the system clock.
    pub lst_rad: Option<f64>,
    /// Overrides the configured iteration count.
    pub iterations: Option<usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SolveResponse {
    pub telescope_alt_deg: f64,
    pub telescope_az_deg: f64,
    pub ha_hours: f64,
    pub lst_rad: f64,
    pub dome_az_deg: f64,
    /// `dome - telescope`, wrapped to `[-180, 180)`.
    pub correction_deg: f64,
    pub fallback: bool,
}

pub fn solve(config: &DomeSyncConfig, request: &SolveRequest) -> AppResult<SolveResponse> {
    if !request.pointing.is_finite() {
        return Err(AppError::InvalidInput("pointing must be finite".to_string()));
    }
    let model = build_model(config)?;
    let lst_rad = match request.lst_rad {
        Some(lst) => lst,
        None => SystemSiderealClock::new(config.site_location.longitude_deg).lst_rad()?,
    };
    let iterations = request.iterations.unwrap_or(config.solver.iterations);

    let pos = SphericalTransform.resolve(
        &request.pointing,
        config.site_location.latitude_deg,
        lst_rad,
    );
    let solved = model.solve_horizontal(&pos, iterations);
    Ok(SolveResponse {
        telescope_alt_deg: pos.alt_deg,
        telescope_az_deg: pos.az_deg,
        ha_hours: pos.ha_hours,
        lst_rad,
        dome_az_deg: solved.degrees,
        correction_deg: map180(solved.degrees - pos.az_deg),
        fallback: solved.fallback,
    })
}

/// Grid of telescope altitudes and azimuths to tabulate.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOptions {
    pub alt_start_deg: f64,
    pub alt_end_deg: f64,
    pub alt_step_deg: f64,
    pub az_start_deg: f64,
    pub az_end_deg: f64,
    pub az_step_deg: f64,
}

impl Default for SweepOptions {
    /// Altitudes 25..90 by 20, azimuths 5..360 by 10.
    fn default() -> Self {
        Self {
            alt_start_deg: 25.0,
            alt_end_deg: 90.0,
            alt_step_deg: 20.0,
            az_start_deg: 5.0,
            az_end_deg: 360.0,
            az_step_deg: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SweepRow {
    pub alt_deg: f64,
    pub az_deg: f64,
    pub ha_hours: f64,
    pub dome_az_deg: f64,
    pub correction_deg: f64,
}

/// Largest grid a sweep will tabulate.
pub const MAX_SWEEP_ROWS: usize = 100_000;

/// Number of points in `[start, end)` at `step`, as a float so oversized
/// grids can be rejected before counting.
fn step_count(start: f64, end: f64, step: f64) -> f64 {
    ((end - start) / step).ceil().max(0.0)
}

fn steps(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = step_count(start, end, step) as usize;
    (0..count).map(move |i| start + step * i as f64)
}

fn check_axis(name: &str, start: f64, end: f64, step: f64) -> AppResult<f64> {
    if !start.is_finite() || !end.is_finite() {
        return Err(AppError::InvalidInput(format!("{name} bounds must be finite")));
    }
    if !step.is_finite() || step <= 0.0 {
        return Err(AppError::InvalidInput(format!("{name} step must be positive")));
    }
    Ok(step_count(start, end, step))
}

/// Tabulate the model over a half-open alt/az grid.
///
/// # Errors
///
/// Returns `InvalidInput` for non-finite bounds, a non-positive step, or a
/// grid larger than [`MAX_SWEEP_ROWS`].
pub fn sweep(config: &DomeSyncConfig, options: &SweepOptions) -> AppResult<Vec<SweepRow>> {
    let o = options;
    let alts = check_axis("altitude", o.alt_start_deg, o.alt_end_deg, o.alt_step_deg)?;
    let azs = check_axis("azimuth", o.az_start_deg, o.az_end_deg, o.az_step_deg)?;
    if alts * azs > MAX_SWEEP_ROWS as f64 {
        return Err(AppError::InvalidInput(format!(
            "sweep of {alts} x {azs} points exceeds {MAX_SWEEP_ROWS} rows"
        )));
    }
    let model = build_model(config)?;
    let lat = config.site_location.latitude_deg;

    let mut rows = Vec::with_capacity((alts * azs) as usize);
    for az in steps(o.az_start_deg, o.az_end_deg, o.az_step_deg) {
        for alt in steps(o.alt_start_deg, o.alt_end_deg, o.alt_step_deg) {
            let (pos, _dec) = SphericalTransform::from_alt_az(alt, az, lat);
            let solved = model.solve_horizontal(&pos, config.solver.iterations);
            rows.push(SweepRow {
                alt_deg: alt,
                az_deg: pos.az_deg,
                ha_hours: pos.ha_hours,
                dome_az_deg: solved.degrees,
                correction_deg: map180(solved.degrees - pos.az_deg),
            });
        }
    }
    tracing::debug!(rows = rows.len(), "model sweep complete");
    Ok(rows)
}
