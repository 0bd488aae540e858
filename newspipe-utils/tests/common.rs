use std::sync::OnceLock;

use newspipe_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "newspipe-tests",
            log_dir: Some(std::env::temp_dir().join("newspipe-tests")),
            emit_stderr: true,
            format: LogFormat::from_env(),
            default_filter: "debug",
        };

        newspipe_common::observability::init_logging(config).unwrap_or_default()
    });
}
