use crate::error::AppError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:5000";
pub const DEFAULT_PLATFORM_URL: &str = "https://t.me";
pub const SESSION_COOKIE: &str = "session";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// The dashboard answers a deploy only once the server is provisioned.
pub const DEPLOY_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Next poll while the bot service is up but its messaging connection is not.
pub const INITIALIZING_DELAY: Duration = Duration::from_secs(5);
/// Next poll while the server is still being provisioned (or reports an unknown state).
pub const PROVISIONING_DELAY: Duration = Duration::from_secs(10);
/// Next poll after a failed or rejected status request.
pub const FAILURE_DELAY: Duration = Duration::from_secs(10);

pub const ENV_URL: &str = "BOTDASH_URL";
pub const ENV_SESSION: &str = "BOTDASH_SESSION";
pub const ENV_PLATFORM_URL: &str = "BOTDASH_PLATFORM_URL";
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

/// Resolve the app data directory: ~/.botdash/
pub fn app_dir() -> Result<PathBuf, AppError> {
    let home = dirs::home_dir().ok_or(AppError::HomeDirNotFound)?;
    Ok(home.join(".botdash"))
}

/// ~/.botdash/.env
pub fn env_file() -> Result<PathBuf, AppError> {
    Ok(app_dir()?.join(".env"))
}

/// Load `~/.botdash/.env` and then `./.env` into the process environment.
///
/// Variables that are already set win over both files, and the user-level
/// file wins over the working-directory one. Missing files are not an error.
pub fn load_env() -> Result<(), AppError> {
    if let Ok(path) = env_file() {
        if path.exists() {
            dotenvy::from_path(&path)
                .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        }
    }
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(AppError::Config(format!(".env: {e}"))),
    }
}

/// Normalise a base URL so paths can be appended with a leading slash.
pub fn normalize_base_url(url: &str) -> Result<String, AppError> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::MissingParam("dashboard url".into()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(AppError::Config(format!(
            "dashboard url must start with http:// or https:// (got '{trimmed}')"
        )));
    }
    Ok(trimmed.to_string())
}
