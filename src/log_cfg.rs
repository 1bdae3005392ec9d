use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::{init_config, Config, Handle};
use std::sync::Mutex;

lazy_static! {
    #[doc(hidden)]
    static ref HANDLE: Mutex<Option<Handle>> = Mutex::new(None);
}

fn build_config(level: LevelFilter) -> Config {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}",
        )))
        .build();
    Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .logger(Logger::builder().build("hyper", LevelFilter::Warn))
        .logger(Logger::builder().build("rusqlite", LevelFilter::Warn))
        .build(Root::builder().appender("stdout").build(level))
        .expect("Logging configuration is static and always valid.")
}

pub fn init_with_level(level: LevelFilter) {
    let config = build_config(level);
    let mut h = match HANDLE.lock() {
        Ok(h) => h,
        Err(e) => e.into_inner(),
    };
    if let Some(h) = h.as_ref() {
        h.set_config(config);
    } else {
        match init_config(config) {
            Ok(handle) => {
                h.replace(handle);
            }
            Err(e) => {
                eprintln!("Failed to initialize logger: {}", e);
            }
        }
    }
}

pub fn init_default() {
    init_with_level(LevelFilter::Info);
}
