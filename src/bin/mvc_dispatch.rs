use mvc_dispatch::logging::{init_logging_with_config, LogConfig};

fn main() {
    let mut log_config = LogConfig::from_env();
    if std::env::var("MVC_LOG_LEVEL").is_err() {
        log_config.log_level = "warn".to_string();
    }
    let guard = match init_logging_with_config(&log_config) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: {err:#}");
            None
        }
    };

    let result = mvc_dispatch::cli::run_cli();
    drop(guard);
    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
