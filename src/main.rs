// src/main.rs
//
// Command-line driver: load (or synthesise) a phase-field evolution, configure the plot
// and write an animation or a single frame.
//
// Outputs default to `runs/` and are not committed to version control. Next to every
// output a `<stem>.json` manifest records the shape, coordinate ranges and the full plot
// configuration used.
//
// Examples:
//
//   cargo run --release -- --p 6 --demo defects --which both --mode 2
//       -> hexatic defect pair, colour-mapped hexagons over a faded phase field (GIF).
//
//   cargo run --release -- --p 2 --demo spiral --complex --out runs/spiral.mp4
//       -> nematic spiral from complex samples, stitched to MP4 with ffmpeg.
//
//   cargo run --release -- --p 4 --input field.json --x 0,10 --y 0,5 --preview 12
//       -> single PNG of frame 12 of a field loaded from JSON.

use std::fs::create_dir_all;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patic_anim::color::Colormap;
use patic_anim::config::{Grouping, MarkerType, Mode, Which};
use patic_anim::demo_fields::Demo;
use patic_anim::grid::Axis;
use patic_anim::visualisation::RenderOptions;
use patic_anim::{AnimError, PAticAnimator, PhaseField};

#[derive(Parser, Debug)]
#[command(name = "patic-anim")]
#[command(about = "Animate the time evolution of a p-atic phase field")]
struct Cli {
    /// Degree of the p-atic order parameter
    #[arg(long, default_value = "2")]
    p: u32,

    /// Phase field JSON file: {"shape": [nt, ny, nx], "data": [...]} (angles in degrees)
    #[arg(long, conflicts_with = "demo")]
    input: Option<PathBuf>,

    /// Synthetic evolution to animate when no input is given
    #[arg(long)]
    demo: Option<Demo>,

    /// Frames, rows and columns of the demo field
    #[arg(long, default_value = "40")]
    nt: usize,
    #[arg(long, default_value = "64")]
    ny: usize,
    #[arg(long, default_value = "64")]
    nx: usize,

    /// Build the demo from complex order-parameter samples
    #[arg(long)]
    complex: bool,

    /// pf | op | both
    #[arg(long, default_value = "pf")]
    which: Which,

    /// separate | together
    #[arg(long, default_value = "together")]
    grouping: Grouping,

    /// 0 (solid markers), 1 (mapped markers), 2 (mapped markers over faded field)
    #[arg(long, default_value = "0")]
    mode: u8,

    /// patch | point | tick | "patch & point" | "patch & tick" | "point & tick" | all
    #[arg(long)]
    marker_type: Option<MarkerType>,

    /// Marker density along both axes, in (0, 1]
    #[arg(long)]
    density: Option<f64>,

    /// Marker size (pt^2)
    #[arg(long)]
    marker_size: Option<f64>,

    #[arg(long)]
    colormap: Option<Colormap>,

    /// Phase-field opacity in [0, 1]
    #[arg(long)]
    pf_alpha: Option<f64>,

    /// x-axis range as LO,HI
    #[arg(long, value_parser = parse_range, allow_hyphen_values = true)]
    x: Option<(f64, f64)>,

    /// y-axis range as LO,HI
    #[arg(long, value_parser = parse_range, allow_hyphen_values = true)]
    y: Option<(f64, f64)>,

    #[arg(long, default_value = "100")]
    dpi: f64,

    #[arg(long, default_value = "10")]
    fps: f64,

    /// Skip all text (axis labels, colour-bar ticks)
    #[arg(long)]
    no_labels: bool,

    /// Write this single frame as a PNG instead of animating
    #[arg(long)]
    preview: Option<usize>,

    /// Output path (.gif, .mp4, or .png with --preview)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn parse_range(s: &str) -> Result<(f64, f64), String> {
    let (lo, hi) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LO,HI, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("could not parse '{v}': {e}"))
    };
    Ok((parse(lo)?, parse(hi)?))
}

fn default_output(ext: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| std::time::Duration::from_secs(0));
    let base = PathBuf::from("runs");
    let stem = format!("patic_{}{:03}", now.as_secs(), now.subsec_millis());
    let mut path = base.join(format!("{stem}.{ext}"));
    for k in 1..1000 {
        if !path.exists() {
            break;
        }
        path = base.join(format!("{stem}_{k}.{ext}"));
    }
    path
}

fn run(cli: Cli) -> patic_anim::Result<()> {
    if !(cli.fps.is_finite() && cli.fps > 0.0) {
        return Err(AnimError::InvalidArgument(format!("fps must be positive (got {})", cli.fps)));
    }
    if !(cli.dpi.is_finite() && cli.dpi > 0.0) {
        return Err(AnimError::InvalidArgument(format!("dpi must be positive (got {})", cli.dpi)));
    }

    let field = match &cli.input {
        Some(path) => {
            info!("Loading phase field from: {}", path.display());
            PhaseField::from_json_file(path)?
        }
        None => {
            let demo = cli.demo.unwrap_or(Demo::Defects);
            info!(?demo, nt = cli.nt, ny = cli.ny, nx = cli.nx, complex = cli.complex, "generating demo field");
            if cli.complex {
                demo.complex_field(cli.p, cli.nt, cli.ny, cli.nx)?
            } else {
                demo.real_field(cli.p, cli.nt, cli.ny, cli.nx)?
            }
        }
    };

    let mut anim = PAticAnimator::new(cli.p)?;
    if let Some(x) = cli.x {
        anim.set_axis_range(x, Axis::X)?;
    }
    if let Some(y) = cli.y {
        anim.set_axis_range(y, Axis::Y)?;
    }
    anim.set_field(field);

    let cfg = anim.config_mut();
    cfg.set_which(cli.which);
    cfg.set_grouping(cli.grouping);
    cfg.set_mode(Mode::try_from(cli.mode)?);
    if let Some(t) = cli.marker_type {
        cfg.set_marker_type(t);
    }
    if let Some(d) = cli.density {
        cfg.set_marker_density(d, Axis::Both)?;
    }
    if let Some(s) = cli.marker_size {
        cfg.set_marker_size(s)?;
    }
    if let Some(c) = cli.colormap {
        cfg.set_colormap(c);
    }
    if let Some(a) = cli.pf_alpha {
        cfg.set_pf_transparency(a)?;
    }

    anim.set_render_options(RenderOptions {
        dpi: cli.dpi,
        labels: !cli.no_labels,
        frame_delay_ms: (1000.0 / cli.fps).round().max(1.0) as u32,
    });

    let out = cli
        .out
        .unwrap_or_else(|| default_output(if cli.preview.is_some() { "png" } else { "gif" }));
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }

    match cli.preview {
        Some(frame) => {
            anim.save_frame(Some(frame), &out)?;
            info!("Frame written to: {}", out.display());
        }
        None => anim.animate(&out)?,
    }

    let manifest_path = out.with_extension("json");
    anim.manifest(&out)?.write_json(&manifest_path)?;
    info!("Run manifest written to: {}", manifest_path.display());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patic_anim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
