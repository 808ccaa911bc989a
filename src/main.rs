use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Parser};
use image::imageops::FilterType;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use primitrace::{Model, SearchParams, Settings, ShapeType};

#[derive(Parser, Debug)]
#[command(name = "primitrace", version)]
#[command(about = "Approximate an image with geometric primitives")]
struct Args {
    /// input image
    #[arg(short, long)]
    input: PathBuf,

    /// output image (png or jpeg)
    #[arg(short, long)]
    output: PathBuf,

    /// number of shapes
    #[arg(short = 'n', long)]
    count: Option<u32>,

    /// 0=any 1=triangle 2=rect 3=ellipse 4=circle 5=rotatedrect 6=beziers
    /// 7=rotatedellipse 8=polygon
    #[arg(short, long)]
    mode: Option<u32>,

    /// shape opacity, 0 lets the search choose
    #[arg(short, long)]
    alpha: Option<u8>,

    /// working resolution (longest side)
    #[arg(long)]
    resize: Option<u32>,

    /// output resolution (longest side)
    #[arg(long)]
    size: Option<u32>,

    /// extra shapes per step
    #[arg(long)]
    rep: Option<u32>,

    /// seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// search workers (default: one per core)
    #[arg(short, long)]
    workers: Option<usize>,

    /// settings file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// more logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn settings(&self) -> Settings {
        let mut s = match &self.config {
            Some(path) => Settings::load_or_default(path),
            None => Settings::default(),
        };
        if let Some(v) = self.count {
            s.count = v;
        }
        if let Some(v) = self.mode {
            s.shape_type = ShapeType::from_mode(v);
        }
        if let Some(v) = self.alpha {
            s.alpha = v;
        }
        if let Some(v) = self.resize {
            s.resize = v;
        }
        if let Some(v) = self.size {
            s.output_size = v;
        }
        if let Some(v) = self.rep {
            s.repeat = v;
        }
        if let Some(v) = self.workers {
            s.workers = v;
        }
        if self.seed.is_some() {
            s.seed = self.seed;
        }
        s
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("primitrace={level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    // search workers run on the global pool; named threads show up in profiles
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let settings = args.settings();
    let params = SearchParams::from(&settings);

    let input = image::open(&args.input).map_err(primitrace::Error::from)?.to_rgba8();
    let target = if settings.resize > 0 && input.width().max(input.height()) > settings.resize {
        let (w, h) = input.dimensions();
        let scale = settings.resize as f32 / w.max(h) as f32;
        let nw = ((w as f32 * scale).round() as u32).max(1);
        let nh = ((h as f32 * scale).round() as u32).max(1);
        image::imageops::resize(&input, nw, nh, FilterType::CatmullRom)
    } else {
        input
    };

    let mut model = Model::new(target, settings.workers, settings.seed)?;
    info!(
        width = model.width(),
        height = model.height(),
        shapes = settings.count,
        mode = ?settings.shape_type,
        "starting, score {:.6}",
        model.score()
    );

    let start = Instant::now();
    for i in 1..=settings.count {
        let step_start = Instant::now();
        let evaluations = model.step(&params, settings.repeat);
        info!(
            "{}: t={:.3}s, score={:.6}, n={}, n/s={:.0}",
            i,
            start.elapsed().as_secs_f64(),
            model.score(),
            evaluations,
            evaluations as f64 / step_start.elapsed().as_secs_f64().max(1e-9)
        );
    }

    let longest = model.width().max(model.height());
    let scale = match settings.output_size {
        0 => 1.0,
        size => size as f32 / longest as f32,
    };
    let out = model.render(scale)?;
    out.save(&args.output).map_err(primitrace::Error::from)?;
    info!("wrote {} ({}x{})", args.output.display(), out.width(), out.height());
    Ok(())
}
