/// Centroid distance (pixels) under which a detection continues a track.
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 250.0;

/// Wider threshold used by one deployment of the tracker.
pub const WIDE_DISTANCE_THRESHOLD: f64 = 500.0;

pub const DEFAULT_REPORT_INTERVAL_MS: u64 = 1000;

pub const DEFAULT_DEVICE_ID: &str = "camera-0";

pub const QUIT_KEY: char = 'q';

pub const CONFIG_DIR_NAME: &str = "FaceTrack";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Overlay outline colour (RGB) and stroke width in pixels.
pub const OVERLAY_COLOR: [u8; 3] = [0, 255, 0];
pub const OVERLAY_THICKNESS: u32 = 2;
/// Pixel size of one dot in the track-id label glyphs.
pub const OVERLAY_LABEL_SCALE: u32 = 2;
