pub const APP_NAME: &str = "chefsync";

/// Config file looked up at the workspace root when `--config` is not given.
pub const CONFIG_FILENAME: &str = "chefsync.toml";

pub const MANIFEST_FILENAME: &str = "Cargo.toml";
pub const LOCK_FILENAME: &str = "Cargo.lock";
pub const BUILD_SCRIPT_FILENAME: &str = "build.rs";

pub const DEFAULT_OUTPUT_DIR: &str = "docker/build-tools/cargo-chef";
pub const DEFAULT_CHECKSUM_FILENAME: &str = "checksums.json";
pub const DEFAULT_SUMMARY_FILENAME: &str = "cargo-chef-summary.json";

/// Default resolver timeout in seconds.
pub const DEFAULT_RESOLVER_TIMEOUT_SECS: u64 = 600;

pub const LIB_PLACEHOLDER: &str = "pub fn placeholder() {}\n";
pub const BIN_PLACEHOLDER: &str = "fn main() {}\n";
