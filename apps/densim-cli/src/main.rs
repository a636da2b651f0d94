use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use densim_assets::load_obj;
use densim_kernel::{CubeInstances, DENSITY_BUCKETS};
use densim_kernel::density::BUCKET_COUNT;
use densim_render::{MeshKind, RecordingBackend, RecordingProvider, SceneEntity, Sim, SimConfig, describe_plan};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "densim-cli", about = "CLI tool for densim: headless frames, configs and models")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file; missing fields take defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the config seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective config summary
    Info,
    /// Print the effective config as JSON
    Config,
    /// Run frames headless and report cube heights and bounces
    Simulate {
        /// Number of frames to render
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Milliseconds between frames
        #[arg(long, default_value = "16")]
        frame_ms: f64,
    },
    /// Histogram of the density grid colors
    Density,
    /// Print the plan recorded for a frame
    Frame {
        /// Print the plan of this frame (1-based)
        #[arg(short, long, default_value = "1")]
        frames: u32,
    },
    /// Parse an OBJ file and report its mesh
    Obj {
        path: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>, seed: Option<u64>) -> Result<SimConfig> {
    let mut config = match path {
        Some(path) => {
            SimConfig::from_json_file(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn ready_sim(config: SimConfig) -> Result<Sim<RecordingBackend>> {
    let mut sim = Sim::new(config);
    pollster::block_on(sim.init(RecordingProvider::new()));
    if !sim.is_ready() {
        bail!("simulation failed to initialize");
    }
    Ok(sim)
}

fn falling_cubes(sim: &Sim<RecordingBackend>) -> Option<&CubeInstances> {
    match sim.scene()?.entity(MeshKind::Cubes)? {
        SceneEntity::Cubes(cubes) => Some(cubes.cubes()),
        _ => None,
    }
}

/// Heights of the falling cubes, in instance order.
fn cube_heights(sim: &Sim<RecordingBackend>) -> Vec<f32> {
    falling_cubes(sim).map_or_else(Vec::new, |cubes| {
        cubes.group().transforms().iter().map(|m| m.w_axis.y).collect()
    })
}

fn density_histogram(sim: &Sim<RecordingBackend>) -> Option<[usize; BUCKET_COUNT]> {
    match sim.scene()?.entity(MeshKind::DensityCubes)? {
        SceneEntity::DensityCubes(grid) => Some(grid.cubes().histogram()),
        _ => None,
    }
}

fn bucket_label(index: usize) -> String {
    match DENSITY_BUCKETS.get(index) {
        Some((bound, _)) => format!("< {bound:.1}"),
        None => format!(">= {:.1}", DENSITY_BUCKETS[DENSITY_BUCKETS.len() - 1].0),
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_ref(), cli.seed)?;

    match cli.command {
        Commands::Info => {
            println!("densim-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("canvas: {}x{}", config.canvas.width, config.canvas.height);
            println!("seed: {}", config.seed);
            println!("cubes: {}", config.cube_count);
            println!("density cubes: {}", config.density_cube_count());
            println!("axis lines: {} x2", config.axis_line_count);
            println!("density points: {}", config.points_count);
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Simulate { frames, frame_ms } => {
            let mut sim = ready_sim(config)?;
            let start = cube_heights(&sim);
            for i in 0..frames {
                sim.render(f64::from(i) * frame_ms);
            }
            let end = cube_heights(&sim);
            let lowest = end.iter().copied().fold(f32::INFINITY, f32::min);
            let highest = end.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let bounces = falling_cubes(&sim).map_or(0, CubeInstances::bounces);
            println!("frames submitted: {}", sim.frames());
            println!("mean cube height: {:.4} -> {:.4}", mean(&start), mean(&end));
            println!("height range: {lowest:.4} .. {highest:.4}");
            println!("bounces: {bounces}");
        }
        Commands::Density => {
            let sim = ready_sim(config)?;
            let histogram = density_histogram(&sim).context("scene has no density grid")?;
            let total: usize = histogram.iter().sum();
            println!("density cubes: {total}");
            for (i, count) in histogram.iter().enumerate() {
                println!("  {:>7}: {count}", bucket_label(i));
            }
        }
        Commands::Frame { frames } => {
            if frames == 0 {
                bail!("--frames must be at least 1");
            }
            let mut sim = ready_sim(config)?;
            let frame_ms = 1000.0 / 60.0;
            for i in 0..frames {
                sim.render(f64::from(i) * frame_ms);
            }
            let plan = sim
                .backend()
                .and_then(|b| b.last_plan())
                .context("no frame was recorded")?;
            print!("{}", describe_plan(plan));
        }
        Commands::Obj { path } => {
            let parsed = load_obj(&path).with_context(|| format!("reading {}", path.display()))?;
            let mesh = parsed.into_mesh("model")?;
            println!("{}: {} vertices", path.display(), mesh.vertex_count());
            match mesh.index_count() {
                Some(n) => println!("indexed: {} triangles", n / 3),
                None => println!("not indexed"),
            }
        }
    }

    Ok(())
}
