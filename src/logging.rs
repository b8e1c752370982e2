// Copied and edited based on https://github.com/estk/log4rs/pull/295

use std::path::Path;

use anyhow::Context;
use log::LevelFilter;
use log4rs::Handle;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            policy::compound::{
                roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy,
            },
            RollingFileAppender,
        },
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

pub fn init_logging(level: LevelFilter, file_path: &Path) -> anyhow::Result<Handle> {
    let archive_pattern = archive_pattern_for(file_path);
    // Pattern: https://docs.rs/log4rs/*/log4rs/append/rolling_file/policy/compound/roll/fixed_window/struct.FixedWindowRollerBuilder.html#method.build

    // Build a stderr logger. Levels are coloured so failures stand out in a long run
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{h({l:>5})} {m}{n}")))
        .build();

    // Create a policy to use with the file logging
    let trigger = SizeTrigger::new(2_097_152); // 2mb (2 * 1024 * 1024)
    let roller = FixedWindowRoller::builder()
        .build(&archive_pattern, 10) // Roll based on pattern and max 10 archive files
        .context("Failed to create FixedWindowRoller")?;
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    // Logging to log file. (with rolling)
    let log_file = RollingFileAppender::builder()
        // Pattern: https://docs.rs/log4rs/*/log4rs/encode/pattern/index.html
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {l} - {m}\n",
        )))
        .build(file_path, Box::new(policy))
        .with_context(|| format!("Failed to open log file {file_path:?}"))?;

    let config = Config::builder()
        .appender(Appender::builder().build("log_file", Box::new(log_file)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(
            Root::builder()
                .appender("log_file")
                .appender("stderr")
                .build(LevelFilter::Debug.max(level)),
        )
        .context("Failed to configure logging")?;

    let handle = log4rs::init_config(config).context("Failed to init_config")?;

    Ok(handle)
}

/// `log/mailer.log` rolls over to `log/mailer_{}.log`
fn archive_pattern_for(file_path: &Path) -> String {
    let stem = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mailer".to_string());
    let name = match file_path.extension() {
        Some(ext) => format!("{stem}_{{}}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{{}}"),
    };
    file_path.with_file_name(name).to_string_lossy().into_owned()
}
