mod lut;

use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use relgen_release::{ReleasePlan, Sensor, Transport, release_variant, version_tag};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "relgen",
    version,
    about = "Amalgamated release generator for SHT sensor driver variants."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Assemble release bundles for the selected sensor × transport variants.
    Release(ReleaseArgs),
    /// Print the absolute-humidity lookup table as C source.
    AhLut(AhLutArgs),
}

#[derive(Debug, Parser)]
struct ReleaseArgs {
    /// Sensor model (shtc1, shtw2, sht3x) or "all".
    #[arg(long, default_value = "all")]
    sensor: String,

    /// Bus transport (hw_i2c, sw_i2c) or "all".
    #[arg(long, default_value = "all")]
    transport: String,

    /// Root of the driver source tree (default: current directory).
    #[arg(long, default_value = ".")]
    source_root: Utf8PathBuf,

    /// Directory receiving one bundle subdirectory per variant.
    #[arg(default_value = "release")]
    output_directory: Utf8PathBuf,
}

#[derive(Debug, Parser)]
struct AhLutArgs {
    /// Lowest temperature sampling point in °C.
    #[arg(long, default_value_t = -20, allow_negative_numbers = true)]
    t_lo: i32,

    /// Highest temperature sampling point in °C.
    #[arg(long, default_value_t = 70, allow_negative_numbers = true)]
    t_hi: i32,

    /// Temperature step between sampling points in °C.
    #[arg(long, default_value_t = 10)]
    step: i32,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Release(args) => cmd_release(args),
        Command::AhLut(args) => cmd_ah_lut(args),
    }
}

fn cmd_release(args: ReleaseArgs) -> anyhow::Result<()> {
    let sensors: Vec<Sensor> = if args.sensor == "all" {
        Sensor::ALL.to_vec()
    } else {
        vec![args.sensor.parse()?]
    };
    let transports: Vec<Transport> = if args.transport == "all" {
        Transport::ALL.to_vec()
    } else {
        vec![args.transport.parse()?]
    };

    let plan = ReleasePlan::standard();
    let tag = version_tag(&args.source_root);
    if tag.is_empty() {
        info!("no version tag found; outputs carry no version banner");
    } else {
        info!(tag = %tag, "using version tag");
    }

    for transport in &transports {
        for sensor in &sensors {
            let out_dir = args
                .output_directory
                .join(format!("{sensor}_{transport}"));
            let written = release_variant(
                &plan,
                &args.source_root,
                *sensor,
                *transport,
                &tag,
                &out_dir,
            )
            .with_context(|| format!("release {sensor} over {transport}"))?;
            info!(files = written.len(), out_dir = %out_dir, "wrote variant bundle");
        }
    }

    Ok(())
}

fn cmd_ah_lut(args: AhLutArgs) -> anyhow::Result<()> {
    if args.step <= 0 {
        bail!("--step must be positive");
    }
    if args.t_hi < args.t_lo + args.step {
        bail!("--t-hi must leave room for at least two sampling points above --t-lo");
    }

    let table = lut::gen_ah_lut(args.t_lo, args.t_hi, args.step);
    let roi_hi = args.t_hi.min(45);
    let error = lut::mean_abs_error(
        &table,
        f64::from(args.t_lo),
        f64::from(args.t_hi),
        args.t_lo..roi_hi,
        20..80,
    );

    println!("The average absolute error over the region of interest in 1°C steps is:");
    println!(
        "error avg(abs(ah(t,rh) - lookup(t,rh))) for T: {}..{roi_hi}, RH: 20..80",
        args.t_lo
    );
    println!("{error}");
    println!();
    println!("C Source:");
    println!();
    print!("{}", lut::render_c_source(args.t_lo, args.t_hi, &table));

    Ok(())
}
