//! Package metadata baked in by `build.rs`.

include!(concat!(env!("OUT_DIR"), "/app_metadata.rs"));

/// `User-Agent` sent to the task tracker.
pub fn user_agent() -> String {
    format!("{}/{}", APP_METADATA_NAME, APP_METADATA_VERSION)
}
