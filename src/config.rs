use std::path::PathBuf;
use std::time::Duration;

/// Configuration from environment
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Root directory for per-request workspaces
    pub work_dir: PathBuf,
    /// Background removal executable (rembg)
    pub rembg_path: PathBuf,
    /// Interpreter or executable for the effect stage
    pub effect_program: PathBuf,
    /// Script passed to `effect_program`; `None` runs the program directly
    pub effect_script: Option<PathBuf>,
    pub segment_timeout: Duration,
    pub effect_timeout: Duration,
    pub max_upload_bytes: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir().join("cutout-api")),
            rembg_path: std::env::var("REMBG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("rembg")),
            effect_program: std::env::var("EFFECT_PROGRAM")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("python3")),
            effect_script: match std::env::var("EFFECT_SCRIPT") {
                Ok(s) if s.is_empty() => None,
                Ok(s) => Some(PathBuf::from(s)),
                Err(_) => Some(PathBuf::from("process_image.py")),
            },
            segment_timeout: secs_from_env("SEGMENT_TIMEOUT_SECS", 120),
            effect_timeout: secs_from_env("EFFECT_TIMEOUT_SECS", 60),
            max_upload_bytes: std::env::var("MAX_UPLOAD_MB")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(20)
                * 1024
                * 1024,
        }
    }
}

fn secs_from_env(key: &str, default: u64) -> Duration {
    let secs = std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|s| *s > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}
