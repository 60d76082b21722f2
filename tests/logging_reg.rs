//! Logger setup, in its own test binary so the global logger is installed once.

use instances::logging::setup_logger;
use log::LevelFilter;

#[test]
fn logging_reg() {
    setup_logger(2);
    if std::env::var("RUST_LOG").is_err() {
        assert_eq!(log::max_level(), LevelFilter::Debug);
    }
    log::debug!("logger installed");
}
