use std::ffi::OsString;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use autoenroll_core::catalog::identity_catalog::IdentityCatalog;
use autoenroll_core::detection::domain::face_detector::FaceDetector;
use autoenroll_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use autoenroll_core::enrollment::infrastructure::directory_enrollment_sink::DirectoryEnrollmentSink;
use autoenroll_core::pipeline::infrastructure::process_child_runner::ProcessChildRunner;
use autoenroll_core::pipeline::infrastructure::stdin_interrupt::StdinInterrupt;
use autoenroll_core::pipeline::interrupt_signal::{InterruptSignal, NeverInterrupt};
use autoenroll_core::pipeline::supervise_use_case::SuperviseUseCase;
use autoenroll_core::pipeline::track_faces_use_case::TrackFacesUseCase;
use autoenroll_core::pipeline::tracking_logger::StdoutTrackingLogger;
use autoenroll_core::pipeline::train_model_use_case::{TrainModelUseCase, TrainingOutcome};
use autoenroll_core::recognition::infrastructure::lbph_recognizer::LbphRecognizer;
use autoenroll_core::shared::clock::SystemClock;
use autoenroll_core::shared::config::EngineConfig;
use autoenroll_core::shared::constants::{
    EXIT_FAILURE, EXIT_STOPPED, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use autoenroll_core::shared::model_resolver;
use autoenroll_core::tracking::domain::decision_engine::DecisionEngine;
use autoenroll_core::tracking::domain::stability_policy::StabilityPolicy;
use autoenroll_core::tracking::domain::track_correlator::TrackCorrelator;
use autoenroll_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use autoenroll_core::video::infrastructure::image_file_reader::ImageFileReader;
use autoenroll_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Continuous face tracking with automatic enrollment of new faces.
#[derive(Parser)]
#[command(name = "autoenroll")]
struct Cli {
    /// JSON config file (default: per-user config file, then built-in defaults).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Track faces until a face is enrolled (exit 10) or you type `q` (exit 0).
    Track {
        /// Do not watch stdin for `q`.
        #[arg(long)]
        no_stdin: bool,
    },
    /// Retrain the recognition model from the enrollment directory.
    Train,
    /// Run the tracker in a loop, retraining after every enrollment.
    Supervise,
}

/// Per-run overrides of config file values.
#[derive(Args, Clone, Debug, Default, PartialEq)]
struct Overrides {
    /// Camera device, video file or stream URL.
    #[arg(long, global = true)]
    source: Option<String>,

    /// Directory with one sub-folder of face samples per identity.
    #[arg(long, global = true)]
    enrollment_dir: Option<PathBuf>,

    /// Recognition model file.
    #[arg(long, global = true)]
    model_path: Option<PathBuf>,

    /// Face detector ONNX model (downloaded to the cache when omitted).
    #[arg(long, global = true)]
    detector_model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, global = true)]
    detector_confidence: Option<f64>,

    /// Recognizer distance below which a face counts as known.
    #[arg(long, global = true)]
    confidence_threshold: Option<f64>,

    /// Max centroid movement in pixels between frames for the same face.
    #[arg(long, global = true)]
    max_track_distance: Option<f64>,

    /// Consecutive unrecognized frames before a face is enrolled.
    #[arg(long, global = true)]
    stability_frames: Option<u32>,

    /// LBPH cells per axis used when training.
    #[arg(long, global = true)]
    lbph_grid: Option<u32>,

    /// Seconds to wait before restarting the tracker.
    #[arg(long, global = true)]
    restart_delay_secs: Option<u64>,
}

impl Overrides {
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(v) = &self.source {
            config.source = v.clone();
        }
        if let Some(v) = &self.enrollment_dir {
            config.enrollment_dir = v.clone();
        }
        if let Some(v) = &self.model_path {
            config.model_path = v.clone();
        }
        if let Some(v) = &self.detector_model {
            config.detector_model = Some(v.clone());
        }
        if let Some(v) = self.detector_confidence {
            config.detector_confidence = v;
        }
        if let Some(v) = self.confidence_threshold {
            config.confidence_threshold = v;
        }
        if let Some(v) = self.max_track_distance {
            config.max_track_distance = v;
        }
        if let Some(v) = self.stability_frames {
            config.stability_frames = v;
        }
        if let Some(v) = self.lbph_grid {
            config.lbph_grid = v;
        }
        if let Some(v) = self.restart_delay_secs {
            config.restart_delay_secs = v;
        }
    }

    /// Command-line flags that reproduce these overrides in a child process.
    fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |flag: &str, value: Option<OsString>| {
            if let Some(value) = value {
                args.push(flag.into());
                args.push(value);
            }
        };
        push("--source", self.source.as_ref().map(Into::into));
        push(
            "--enrollment-dir",
            self.enrollment_dir.as_ref().map(Into::into),
        );
        push("--model-path", self.model_path.as_ref().map(Into::into));
        push(
            "--detector-model",
            self.detector_model.as_ref().map(Into::into),
        );
        push(
            "--detector-confidence",
            self.detector_confidence.map(|v| v.to_string().into()),
        );
        push(
            "--confidence-threshold",
            self.confidence_threshold.map(|v| v.to_string().into()),
        );
        push(
            "--max-track-distance",
            self.max_track_distance.map(|v| v.to_string().into()),
        );
        push(
            "--stability-frames",
            self.stability_frames.map(|v| v.to_string().into()),
        );
        push("--lbph-grid", self.lbph_grid.map(|v| v.to_string().into()));
        push(
            "--restart-delay-secs",
            self.restart_delay_secs.map(|v| v.to_string().into()),
        );
        args
    }
}

fn main() {
    env_logger::init();

    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(EXIT_FAILURE);
        }
    }
}

fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Track { no_stdin } => run_track(&config, !no_stdin),
        Command::Train => run_train(&config),
        Command::Supervise => run_supervise(&cli.config, &cli.overrides, &config),
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = EngineConfig::discover(cli.config.as_deref())?;
    cli.overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn run_track(config: &EngineConfig, watch_stdin: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let catalog = IdentityCatalog::load(&config.enrollment_dir)?;
    let recognizer = LbphRecognizer::load_or_untrained(&config.model_path)?;
    let detector = build_detector(config)?;

    let policy = StabilityPolicy::new(config.confidence_threshold, config.stability_frames);
    let interrupt: Box<dyn InterruptSignal> = if watch_stdin {
        eprintln!("Type 'q' and press Enter to stop.");
        Box::new(StdinInterrupt::spawn())
    } else {
        Box::new(NeverInterrupt)
    };

    let mut use_case = TrackFacesUseCase::new(
        Box::new(FfmpegFrameSource::new()),
        &config.source,
        detector,
        Box::new(recognizer),
        catalog,
        TrackCorrelator::new(config.max_track_distance, policy),
        DecisionEngine::new(policy, Box::new(SystemClock)),
        Box::new(DirectoryEnrollmentSink::new(
            &config.enrollment_dir,
            Box::new(ImageFileWriter::new()),
            Box::new(SystemClock),
        )),
        interrupt,
        Box::new(StdoutTrackingLogger::default()),
    );
    let outcome = use_case.execute()?;
    log::info!("Tracking ended: {outcome:?}");
    Ok(outcome.exit_code())
}

fn run_train(config: &EngineConfig) -> Result<i32, Box<dyn std::error::Error>> {
    let use_case = build_trainer(config);
    match use_case.execute()? {
        TrainingOutcome::Trained {
            samples,
            identities,
        } => log::info!("Model trained on {samples} samples of {identities} identities"),
        TrainingOutcome::NoSamples => log::warn!("Nothing to train on"),
    }
    Ok(EXIT_STOPPED)
}

fn run_supervise(
    config_path: &Option<PathBuf>,
    overrides: &Overrides,
    config: &EngineConfig,
) -> Result<i32, Box<dyn std::error::Error>> {
    let runner = ProcessChildRunner::current_exe(child_args(config_path, overrides))?;
    let mut use_case = SuperviseUseCase::new(
        Box::new(runner),
        Box::new(build_trainer(config)),
        Duration::from_secs(config.restart_delay_secs),
    );
    let outcome = use_case.execute()?;
    Ok(outcome.exit_code())
}

/// Arguments for the `track` child, carrying the same configuration.
fn child_args(config_path: &Option<PathBuf>, overrides: &Overrides) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["track".into()];
    if let Some(path) = config_path {
        args.push("--config".into());
        args.push(path.into());
    }
    args.extend(overrides.to_args());
    args
}

fn build_trainer(config: &EngineConfig) -> TrainModelUseCase {
    TrainModelUseCase::new(
        Box::new(ImageFileReader::new()),
        &config.enrollment_dir,
        &config.model_path,
        config.lbph_grid,
    )
}

fn build_detector(config: &EngineConfig) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        config.detector_model.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    Ok(Box::new(OnnxYoloDetector::new(
        &model_path,
        config.detector_confidence,
    )?))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprintln!("Downloading face detection model... {pct}%");
    } else {
        eprintln!("Downloading face detection model... {downloaded} bytes");
    }
}
