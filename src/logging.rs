#[cfg(feature = "file-log")]
use std::path::{Path, PathBuf};

pub const LOG_FILE_BASENAME: &str = "todo-list";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 10;
pub const LOG_ENV_VAR: &str = "TODO_LIST_LOG";

/// Picks the level spec: `TODO_LIST_LOG`, then `RUST_LOG`, then the build default.
/// Blank values are skipped.
pub fn resolve_log_spec(lookup: impl Fn(&str) -> Option<String>) -> String {
    let default_spec = if cfg!(debug_assertions) {
        "warn,todo_list_lib=debug"
    } else {
        "warn,todo_list_lib=info"
    };
    [LOG_ENV_VAR, "RUST_LOG"]
        .into_iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_spec.to_string())
}

/// Where and how verbosely the file logger writes.
#[cfg(feature = "file-log")]
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub spec: String,
    pub echo_to_stdout: bool,
}

#[cfg(feature = "file-log")]
impl LogConfig {
    /// Level spec from the environment; stdout echo only in debug builds.
    pub fn from_env(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            spec: resolve_log_spec(|name| std::env::var(name).ok()),
            echo_to_stdout: cfg!(debug_assertions),
        }
    }

    /// Installs the global logger and the panic hook. Can succeed once per process.
    ///
    /// Keep the returned handle alive for as long as logging is needed; dropping it
    /// flushes and stops the writer.
    pub fn start(&self) -> Result<flexi_logger::LoggerHandle, flexi_logger::FlexiLoggerError> {
        use flexi_logger::{
            detailed_format, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode,
        };

        std::fs::create_dir_all(&self.dir)?;

        let handle = Logger::try_with_str(&self.spec)?
            .log_to_file(
                FileSpec::default()
                    .directory(&self.dir)
                    .basename(LOG_FILE_BASENAME)
                    .suffix(LOG_FILE_SUFFIX),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .format_for_files(detailed_format)
            .rotate(
                Criterion::Size(LOG_ROTATE_SIZE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
            )
            .duplicate_to_stdout(if self.echo_to_stdout {
                Duplicate::Info
            } else {
                Duplicate::None
            })
            .start()?;

        install_panic_hook();
        log::info!(
            "logger started dir={} spec={} rotate_size_bytes={} keep_files={}",
            self.dir.display(),
            self.spec,
            LOG_ROTATE_SIZE_BYTES,
            LOG_ROTATE_KEEP_FILES
        );
        Ok(handle)
    }
}

/// File logging under `log_dir` with the level taken from the environment.
#[cfg(feature = "file-log")]
pub fn init_logging(
    log_dir: &Path,
) -> Result<flexi_logger::LoggerHandle, flexi_logger::FlexiLoggerError> {
    LogConfig::from_env(log_dir).start()
}

#[cfg(feature = "file-log")]
fn panic_message(
    payload: &dyn std::any::Any,
    location: Option<&std::panic::Location<'_>>,
) -> String {
    let payload = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>");
    let location = location
        .map(|loc| loc.to_string())
        .unwrap_or_else(|| "<unknown>".to_string());
    format!("panic: payload={payload} location={location}")
}

#[cfg(feature = "file-log")]
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info: &std::panic::PanicHookInfo<'_>| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!(
            "{}\nbacktrace:\n{backtrace}",
            panic_message(info.payload(), info.location())
        );
        default_hook(info);
    }));
}
