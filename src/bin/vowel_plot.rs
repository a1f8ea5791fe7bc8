//! vowel-plot: draw a ten-vowel F2/F1 chart.
//!
//! Synthesizes a deterministic formant dataset, plots every token colored by
//! vowel, labels the vowel means and outlines a confidence ellipse per vowel on
//! reversed axes. The output format follows the file extension (`.svg` or
//! `.png`).
//!
//! Run: `cargo run --features cli --bin vowel-plot -- -o vowels.svg`

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use formant_viz::prelude::*;

/// Reference means (F1, F2 in Hz) for ten American English vowels.
const VOWELS: [(&str, f64, f64); 10] = [
    ("i", 270.0, 2290.0),
    ("ɪ", 390.0, 1990.0),
    ("e", 480.0, 2100.0),
    ("ɛ", 530.0, 1840.0),
    ("æ", 660.0, 1720.0),
    ("ɑ", 730.0, 1090.0),
    ("ɔ", 570.0, 840.0),
    ("o", 450.0, 900.0),
    ("ʊ", 440.0, 1020.0),
    ("u", 300.0, 870.0),
];

/// vowel-plot: F2/F1 vowel chart with means and confidence ellipses
#[derive(Parser, Debug)]
#[command(name = "vowel-plot")]
#[command(author = "PAIML Team")]
#[command(version)]
#[command(about = "Draw a ten-vowel F2/F1 chart with means and confidence ellipses", long_about = None)]
struct Cli {
    /// Output file; `.png` renders a raster, anything else SVG
    #[arg(short, long, default_value = "vowels.svg")]
    output: PathBuf,

    /// Tokens synthesized per vowel
    #[arg(short, long, default_value = "12")]
    samples: usize,

    /// Ellipse confidence level
    #[arg(short, long, default_value = "0.95")]
    level: f64,

    /// Canvas width in pixels
    #[arg(long, default_value = "900")]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value = "700")]
    height: u32,

    /// Restrict legend keys to these vowels (comma separated)
    #[arg(long, value_delimiter = ',')]
    breaks: Vec<String>,

    /// Hide the legend
    #[arg(long)]
    no_legend: bool,
}

/// Tokens spread around each mean on a golden-angle spiral, with a per-vowel
/// tilt so the ellipses differ in orientation.
fn synthesize(samples: usize) -> formant_viz::PlotResult<Dataset> {
    let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    let mut f1 = Vec::new();
    let mut f2 = Vec::new();
    let mut vowel = Vec::new();

    for (v, &(symbol, m1, m2)) in VOWELS.iter().enumerate() {
        let tilt = v as f64 * 0.35;
        for k in 0..samples {
            let theta = k as f64 * golden;
            let r = ((k as f64 + 0.5) / samples as f64).sqrt() * 1.6;
            f1.push(m1 + 35.0 * r * theta.cos());
            f2.push(m2 + 110.0 * r * (theta + tilt).sin());
            vowel.push(symbol);
        }
    }

    Dataset::builder()
        .numeric("F1", &f1)
        .numeric("F2", &f2)
        .categorical("vowel", &vowel)
        .build()?
        .with_canonical_order("vowel", VOWELS.iter().map(|v| v.0))
}

fn main() -> formant_viz::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let data = synthesize(cli.samples)?;
    let ellipses = stat_ellipse(&data, "vowel", "F2", "F1", cli.level, DEFAULT_SEGMENTS)?;
    let means = aggregate_dataset(&data, "vowel", &["F1", "F2"])?;
    info!(tokens = data.len(), vowels = VOWELS.len(), "dataset synthesized");

    let mut color = DiscreteScale::color().name("Vowel");
    if !cli.breaks.is_empty() {
        color = color.breaks(cli.breaks.iter().map(String::as_str));
    }

    let mut plot = GGPlot::new()
        .data(data)
        .aes(Aes::new().x("F2").y("F1").color("vowel"))
        .layer(
            Layer::new(Geom::polygon().alpha(0.15))
                .ellipses(&ellipses)
                .aes(Aes::new().fill("vowel"))
                .show_legend(false),
        )
        .geom(Geom::point().size(5.0).alpha(0.7))
        .layer(Layer::new(Geom::label()).data(means).aes(Aes::new().label("vowel")))
        .scale_x(PositionScale::reverse().name("F2 (Hz)"))
        .scale_y(PositionScale::reverse().name("F1 (Hz)"))
        .scale(color)
        .scale(DiscreteScale::fill().name("Vowel"))
        .theme(Theme::bw())
        .title("Vowel space")
        .dimensions(cli.width, cli.height);
    if cli.no_legend {
        plot = plot.legend_position(LegendPosition::None);
    }
    let plot = plot.build()?;

    let plan = plot.render_plan();
    for d in &plan.diagnostics {
        match d.layer {
            Some(layer) => warn!(layer, severity = ?d.severity, "{}", d.error),
            None => warn!(severity = ?d.severity, "{}", d.error),
        }
    }

    let is_png = cli.output.extension().is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if is_png {
        plot.write_png(&cli.output)?;
    } else {
        plot.write_svg(&cli.output)?;
    }
    info!(path = %cli.output.display(), primitives = plan.primitives.len(), "plot written");
    Ok(())
}
