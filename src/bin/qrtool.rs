use clap::{Parser, Subcommand};
use image::imageops::{self, FilterType};
use image::GrayImage;
use rayon::prelude::*;
use rust_qr_scan::camera::ZoomState;
use rust_qr_scan::{
    CameraControl, DecodeResult, Frame, FrameSession, HintSet, MultiFormatAnalyzer, Rotation,
    SessionConfig, SessionEvent, StillImageDecoder,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "qrtool", version, about = "QR and barcode scanning tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a single image
    Decode {
        #[arg(long)]
        image: PathBuf,
        /// Hint preset: all, qr, 1d, 2d or default
        #[arg(long, default_value = "all")]
        hints: String,
    },
    /// Feed an image through a live session as a stream of camera frames
    Scan {
        #[arg(long)]
        image: PathBuf,
        /// Session configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Frames to generate before giving up
        #[arg(long, default_value_t = 30)]
        frames: usize,
        /// Intercept this many results before accepting one
        #[arg(long, default_value_t = 0)]
        intercept: usize,
    },
    /// Decode every image under a directory and report the reading rate
    Batch {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "all")]
        hints: String,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Decode { image, hints } => decode_cmd(&image, &hints),
        Command::Scan {
            image,
            config,
            frames,
            intercept,
        } => scan_cmd(&image, config.as_deref(), frames, intercept),
        Command::Batch { root, limit, hints } => batch_cmd(&root, limit, &hints),
    }
}

fn parse_hints(name: &str) -> Option<HintSet> {
    let hints = HintSet::from_preset(name);
    if hints.is_none() {
        eprintln!("Unknown hint preset: {name} (expected all, qr, 1d, 2d or default)");
    }
    hints
}

fn print_result(result: &DecodeResult) {
    println!("  {} {}", result.symbology(), result.text());
    for p in result.points() {
        println!("    point ({:.1}, {:.1})", p.x, p.y);
    }
}

fn decode_cmd(image: &Path, hints: &str) -> ExitCode {
    let Some(hints) = parse_hints(hints) else {
        return ExitCode::FAILURE;
    };

    let start = Instant::now();
    let result = StillImageDecoder::new().decode(image, &hints);
    println!("Image: {} ({:.2?})", image.display(), start.elapsed());
    match result {
        Some(result) => {
            print_result(&result);
            ExitCode::SUCCESS
        }
        None => {
            println!("  no code found");
            ExitCode::FAILURE
        }
    }
}

/// Camera whose zoom is read back by the frame generator
struct SimulatedLens {
    zoom: Arc<Mutex<ZoomState>>,
}

impl CameraControl for SimulatedLens {
    fn zoom_state(&self) -> Option<ZoomState> {
        Some(*self.zoom.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn set_zoom_ratio(&mut self, ratio: f32) {
        self.zoom.lock().unwrap_or_else(PoisonError::into_inner).ratio = ratio;
    }

    fn set_linear_zoom(&mut self, linear: f32) {
        self.zoom.lock().unwrap_or_else(PoisonError::into_inner).linear = linear;
    }
}

/// Centre crop of `scene` magnified by `ratio`, back at full size
fn zoomed_frame(scene: &GrayImage, ratio: f32) -> Option<Frame> {
    let (w, h) = scene.dimensions();
    let crop_w = ((w as f32 / ratio) as u32).clamp(1, w);
    let crop_h = ((h as f32 / ratio) as u32).clamp(1, h);
    let view = imageops::crop_imm(scene, (w - crop_w) / 2, (h - crop_h) / 2, crop_w, crop_h);
    let frame = imageops::resize(&view.to_image(), w, h, FilterType::Triangle);
    Frame::from_luma(frame.into_raw(), w as usize, h as usize, Rotation::Deg0).ok()
}

fn scan_cmd(image: &Path, config: Option<&Path>, frames: usize, intercept: usize) -> ExitCode {
    let config = match config.map(SessionConfig::from_toml_file).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let scene = match image::open(image) {
        Ok(scene) => scene.to_luma8(),
        Err(err) => {
            eprintln!("Failed to load image {}: {err}", image.display());
            return ExitCode::FAILURE;
        }
    };

    let zoom = Arc::new(Mutex::new(ZoomState {
        ratio: 1.0,
        min_ratio: 1.0,
        max_ratio: 4.0,
        linear: 0.0,
    }));
    let camera = SimulatedLens {
        zoom: Arc::clone(&zoom),
    };
    let analyzer = MultiFormatAnalyzer::new(config.decode.hints.clone());
    let (mut session, receiver) = FrameSession::new(config, analyzer, camera);
    session.subscribe(Arc::new(|event: &SessionEvent<'_>| match event {
        SessionEvent::ZoomRequested => println!("  [zoom in]"),
        SessionEvent::Reopened => println!("  [scanning resumed]"),
        _ => {}
    }));
    let handle = session.handle();

    let worker = thread::spawn(move || {
        session.start();
        let source = (0..frames).map_while(|_| {
            let ratio = zoom.lock().unwrap_or_else(PoisonError::into_inner).ratio;
            zoomed_frame(&scene, ratio)
        });
        session.run(source)
    });

    let mut remaining = intercept;
    let accepted = receiver.run(&mut |result: &DecodeResult| {
        print_result(result);
        if remaining > 0 {
            remaining -= 1;
            true
        } else {
            false
        }
    });
    handle.stop();

    let analysed = worker.join().unwrap_or(0);
    println!("Frames analysed: {analysed}");
    if accepted.is_some() {
        ExitCode::SUCCESS
    } else {
        println!("  no code accepted");
        ExitCode::FAILURE
    }
}

fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "bmp") {
                    images.push(path);
                }
            }
        }
    }

    images.sort();
    images
}

fn batch_cmd(root: &Path, limit: Option<usize>, hints: &str) -> ExitCode {
    let Some(hints) = parse_hints(hints) else {
        return ExitCode::FAILURE;
    };
    if !root.exists() {
        eprintln!("Directory not found: {}", root.display());
        return ExitCode::FAILURE;
    }

    let mut images = collect_images(root);
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    if images.is_empty() {
        println!("No images found under {}", root.display());
        return ExitCode::FAILURE;
    }

    let start = Instant::now();
    let outcomes: Vec<(PathBuf, Option<DecodeResult>)> = images
        .into_par_iter()
        .map_init(StillImageDecoder::new, |decoder, path| {
            let result = decoder.decode(path.as_path(), &hints);
            (path, result)
        })
        .collect();

    let mut hits = 0usize;
    for (path, result) in &outcomes {
        match result {
            Some(result) => {
                hits += 1;
                println!("  [hit] {} -> {}", path.display(), result);
            }
            None => println!("  [miss] {}", path.display()),
        }
    }

    let total = outcomes.len();
    let rate = hits as f64 / total as f64 * 100.0;
    println!("Reading rate: {hits}/{total} = {rate:.2}% ({:.2?})", start.elapsed());
    ExitCode::SUCCESS
}
