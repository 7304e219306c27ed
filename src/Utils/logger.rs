use chrono::Local;
use log::info;
use simplelog::*;
use std::fs::File;

/// "debug", "info", "warn", "error", "off"/"none"; anything else is None
pub fn parse_loglevel(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" | "none" => Some(LevelFilter::Off),
        _ => None,
    }
}

/// name of the log file: an empty name is replaced by log_<date_time>.txt
fn log_file_name(log_file: &str) -> String {
    if log_file.is_empty() {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
        format!("log_{}.txt", date_and_time)
    } else {
        log_file.to_string()
    }
}

/// install the global logger: terminal output plus an optional log file.
/// Returns false if a logger was already installed or the file could not be created.
pub fn init_logger(loglevel: Option<String>, log_file: Option<String>) -> bool {
    let log_option = match loglevel {
        Some(level) => parse_loglevel(&level).unwrap_or_else(|| {
            eprintln!("unknown loglevel {}, using info", level);
            LevelFilter::Info
        }),
        None => LevelFilter::Info,
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_option,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(file) = log_file {
        let name = log_file_name(&file);
        match File::create(&name) {
            Ok(handle) => loggers.push(WriteLogger::new(log_option, Config::default(), handle)),
            Err(e) => {
                eprintln!("cannot create log file {}: {}", name, e);
                return false;
            }
        }
    }

    match CombinedLogger::init(loggers) {
        Ok(()) => {
            info!("logger started with level {}", log_option);
            true
        }
        Err(_) => false,
    }
}
