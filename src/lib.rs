pub mod channel;
pub mod config;
pub mod db;
pub mod ingest;
pub mod normalize;
pub mod scanner;
pub mod sink;
pub mod source;

/// Media file suffixes picked up by discovery
pub const MEDIA_EXTENSIONS: &[&str] = &[".shn", ".flac", ".mp3"];

/// Application name for XDG paths
pub const APP_NAME: &str = "livemusic";
