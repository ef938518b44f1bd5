use clap::{Parser, Subcommand};
use ds_app::{AppError, AppResult, DomeSync, SolveRequest, SweepOptions, SweepRow};
use ds_control::{AzimuthSensor, CancelToken, DomeDevice, TickOutcome};
use ds_core::hours_to_rad;
use ds_model::TelescopePointing;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "domesync")]
#[command(about = "Keep a dome slit aligned with an off-center telescope", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate {
        /// Path to the YAML or JSON config
        config_path: PathBuf,
    },
    /// Solve the dome azimuth for one pointing
    Solve {
        /// Path to the YAML or JSON config
        config_path: PathBuf,
        /// Right ascension in hours
        #[arg(long, requires = "dec", conflicts_with_all = ["alt", "az"])]
        ra: Option<f64>,
        /// Declination in degrees
        #[arg(long, requires = "ra")]
        dec: Option<f64>,
        /// Telescope altitude in degrees
        #[arg(long, requires = "az")]
        alt: Option<f64>,
        /// Telescope azimuth in degrees
        #[arg(long, requires = "alt")]
        az: Option<f64>,
        /// Hour angle in hours (with --alt/--az, default 0)
        #[arg(long)]
        ha: Option<f64>,
        /// Local sidereal time in hours (defaults to now)
        #[arg(long)]
        lst: Option<f64>,
        /// Refinement passes (defaults to the config)
        #[arg(long)]
        iterations: Option<usize>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Tabulate dome azimuth against telescope azimuth over a grid
    Sweep {
        /// Path to the YAML or JSON config
        config_path: PathBuf,
        /// Altitude step in degrees
        #[arg(long, default_value_t = 20.0)]
        alt_step: f64,
        /// Azimuth step in degrees
        #[arg(long, default_value_t = 10.0)]
        az_step: f64,
        /// Output CSV file path (optional, defaults to a table on stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Track the telescope with the dome
    Track {
        /// Path to the YAML or JSON config
        config_path: PathBuf,
        /// Run a single tick and exit (for cron)
        #[arg(long)]
        once: bool,
        /// Stop after this many ticks
        #[arg(long, conflicts_with = "once")]
        max_ticks: Option<u64>,
    },
    /// Operate the dome through the sync facade
    Dome {
        /// Path to the YAML or JSON config
        config_path: PathBuf,
        #[command(subcommand)]
        action: DomeAction,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum DomeAction {
    /// Slew the dome to the model azimuth for the current pointing
    Slew,
    /// Abort a slew in progress
    Abort,
    /// Show azimuth, slit and flap state
    Status,
    OpenSlit,
    CloseSlit,
    OpenFlap,
    CloseFlap,
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Solve {
            config_path,
            ra,
            dec,
            alt,
            az,
            ha,
            lst,
            iterations,
            json,
        } => {
            let pointing = match (ra, dec, alt, az) {
                (Some(ra), Some(dec), _, _) => TelescopePointing::equatorial(ra, dec),
                (_, _, Some(alt), Some(az)) => {
                    TelescopePointing::horizontal(alt, az, ha.unwrap_or(0.0))
                }
                _ => {
                    return Err(AppError::InvalidInput(
                        "give either --ra/--dec or --alt/--az/--ha".to_string(),
                    ));
                }
            };
            let request = SolveRequest {
                pointing,
                lst_rad: lst.map(hours_to_rad),
                iterations,
            };
            cmd_solve(&config_path, &request, json)
        }
        Commands::Sweep {
            config_path,
            alt_step,
            az_step,
            output,
        } => cmd_sweep(&config_path, alt_step, az_step, output.as_deref()),
        Commands::Track {
            config_path,
            once,
            max_ticks,
        } => cmd_track(&config_path, if once { Some(1) } else { max_ticks }),
        Commands::Dome {
            config_path,
            action,
        } => cmd_dome(&config_path, action),
    }
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating config: {}", config_path.display());
    let config = ds_app::load_config(config_path)?;
    ds_app::build_geometry(&config)?;
    println!("✓ Config is valid");
    println!(
        "  Site: {:.4} deg latitude, {:.4} deg longitude",
        config.site_location.latitude_deg, config.site_location.longitude_deg
    );
    println!(
        "  Dome radius {}, dec axis length {}",
        config.geometry.dome_radius, config.geometry.dec_axis_length
    );
    Ok(())
}

fn cmd_solve(config_path: &Path, request: &SolveRequest, json: bool) -> AppResult<()> {
    let config = ds_app::load_config(config_path)?;
    let response = ds_app::solve(&config, request)?;

    if json {
        let text = serde_json::to_string_pretty(&response).map_err(std::io::Error::from)?;
        println!("{text}");
        return Ok(());
    }

    println!(
        "Telescope: alt {:.2} az {:.2} (HA {:+.3} h)",
        response.telescope_alt_deg, response.telescope_az_deg, response.ha_hours
    );
    println!("✓ Dome azimuth: {:.2}", response.dome_az_deg);
    println!("  Correction: {:+.2} deg", response.correction_deg);
    if response.fallback {
        println!("  (solver fell back to the telescope azimuth)");
    }
    Ok(())
}

fn write_sweep_csv(path: &Path, rows: &[SweepRow]) -> AppResult<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "alt_deg,az_deg,ha_hours,dome_az_deg,correction_deg")?;
    for r in rows {
        writeln!(
            file,
            "{},{},{},{},{}",
            r.alt_deg, r.az_deg, r.ha_hours, r.dome_az_deg, r.correction_deg
        )?;
    }
    Ok(())
}

fn cmd_sweep(
    config_path: &Path,
    alt_step: f64,
    az_step: f64,
    output: Option<&Path>,
) -> AppResult<()> {
    let config = ds_app::load_config(config_path)?;
    let options = SweepOptions {
        alt_step_deg: alt_step,
        az_step_deg: az_step,
        ..SweepOptions::default()
    };
    let rows = ds_app::sweep(&config, &options)?;

    if let Some(path) = output {
        write_sweep_csv(path, &rows)?;
        println!("✓ Wrote {} rows to {}", rows.len(), path.display());
        return Ok(());
    }

    println!("{:>7} {:>7} {:>8} {:>8}", "alt", "az", "dome", "corr");
    for r in &rows {
        println!(
            "{:>7.1} {:>7.1} {:>8.2} {:>+8.2}",
            r.alt_deg, r.az_deg, r.dome_az_deg, r.correction_deg
        );
    }
    Ok(())
}

/// Cancel `token` on Ctrl-C. The signal is awaited on a helper thread so the
/// tracking loop stays synchronous.
fn cancel_on_interrupt(token: CancelToken) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                tracing::warn!(error = %e, "Ctrl-C handling unavailable");
                return;
            }
        };
        runtime.block_on(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, releasing dome");
                token.cancel();
            }
        });
    });
}

fn cmd_track(config_path: &Path, max_ticks: Option<u64>) -> AppResult<()> {
    let config = ds_app::load_config(config_path)?;
    let mut controller = ds_app::build_controller(&config)?;
    cancel_on_interrupt(controller.cancel_token());

    if max_ticks == Some(1) {
        let outcome = controller.tick()?;
        controller.actuation_mut().make_safe();
        print_outcome(&outcome);
        return Ok(());
    }

    let poll = ds_app::poll_config(&config)?;
    println!(
        "Tracking every {:.1} s (Ctrl-C to stop)",
        poll.period.as_secs_f64()
    );
    let summary = controller.run(poll, max_ticks)?;
    if summary.cancelled {
        println!("✓ Tracking cancelled");
    } else {
        println!("✓ Tracking finished");
    }
    println!(
        "  Ticks: {}, actuations: {}, skipped: {}",
        summary.ticks, summary.actuations, summary.skipped
    );
    Ok(())
}

fn print_outcome(outcome: &TickOutcome) {
    match outcome {
        TickOutcome::InDeadband { target, deviation } => {
            println!("✓ Dome within tolerance (target {target:.2}, off by {deviation:+.2})");
        }
        TickOutcome::Slewed { target } => println!("✓ Slewing dome to {target:.2}"),
        TickOutcome::SlewInProgress => println!("✓ Dome still slewing"),
        TickOutcome::Drove {
            direction,
            duration,
            completed,
        } => {
            let verb = if *completed { "Drove" } else { "Interrupted drive" };
            println!(
                "✓ {verb} {:?} for {:.2} s",
                direction,
                duration.as_secs_f64()
            );
        }
        TickOutcome::Skipped(e) => println!("Skipped: {e}"),
    }
}

fn cmd_dome(config_path: &Path, action: DomeAction) -> AppResult<()> {
    let config = ds_app::load_config(config_path)?;
    let mut sync = DomeSync::from_config(&config)?;

    match action {
        DomeAction::Slew => {
            let target = sync.dome_target()?;
            sync.slew_to_az(target.degrees)?;
            println!("✓ Slewing {} to {:.2}", sync.name(), target.degrees);
        }
        DomeAction::Abort => {
            sync.abort_slew()?;
            println!("✓ Slew aborted");
        }
        DomeAction::Status => {
            println!("Dome: {}", sync.name());
            println!("  Azimuth: {:.2}", sync.az()?);
            println!("  Slewing: {}", sync.is_slewing()?);
            println!("  Slit open: {}", sync.is_slit_open()?);
            println!("  Flap open: {}", sync.is_flap_open()?);
            for (key, value) in sync.metadata()? {
                println!("  {key} = {value}");
            }
        }
        DomeAction::OpenSlit => {
            sync.open_slit()?;
            println!("✓ Slit opening");
        }
        DomeAction::CloseSlit => {
            sync.close_slit()?;
            println!("✓ Slit closing");
        }
        DomeAction::OpenFlap => {
            sync.open_flap()?;
            println!("✓ Flap opening");
        }
        DomeAction::CloseFlap => {
            sync.close_flap()?;
            println!("✓ Flap closing");
        }
    }
    Ok(())
}
