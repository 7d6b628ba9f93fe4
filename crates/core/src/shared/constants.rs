pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Recognizer distance below which a face counts as a known identity.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 90.0;

/// Max centroid displacement (pixels) between frames for the same track.
pub const DEFAULT_MAX_TRACK_DISTANCE: f64 = 75.0;

/// Consecutive unrecognized frames before a track triggers enrollment.
pub const DEFAULT_STABILITY_FRAMES: u32 = 20;

pub const DEFAULT_DETECTOR_CONFIDENCE: f64 = 0.5;

pub const DEFAULT_ENROLLMENT_DIR: &str = "known_faces";
pub const DEFAULT_MODEL_PATH: &str = "trainer.json";
pub const DEFAULT_SOURCE: &str = "/dev/video0";

/// LBPH cells per axis.
pub const DEFAULT_LBPH_GRID: u32 = 8;

pub const DEFAULT_RESTART_DELAY_SECS: u64 = 3;

/// Process exit codes shared by the tracker and the supervisor.
pub const EXIT_STOPPED: i32 = 0;
pub const EXIT_RETRAIN: i32 = 10;
pub const EXIT_FAILURE: i32 = 1;

pub const NEW_IDENTITY_PREFIX: &str = "person";
pub const SAMPLE_EXTENSION: &str = "png";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
