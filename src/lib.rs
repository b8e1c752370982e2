mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mailer;
pub mod recipient;
pub mod template;

use anyhow::Context;
use log::{debug, error, info};

pub use cli::{Cli, LogLevel};
pub use config::Config;
pub use error::MailerError;
pub use mailer::{Dispatcher, MailTransport, SendOutcome, SmtpMailer, Summary};
pub use recipient::Recipient;
pub use template::Template;

/// Entry point used by the binary, reads the environment and mails over SMTP
pub async fn run(cli: Cli) -> anyhow::Result<Summary> {
    info!("{} v{} starting", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    let (env_path, explicit) = cli.get_env_path();
    config::load_env_file(&env_path, explicit)?;
    run_with_lookup(|key| std::env::var(key).ok()).await
}

/// Builds the config from `lookup` and mails over SMTP, nothing is read or sent if the config is invalid
pub async fn run_with_lookup<F>(lookup: F) -> anyhow::Result<Summary>
where
    F: Fn(&str) -> Option<String>,
{
    let config = Config::from_lookup(lookup)
        .map_err(MailerError::from)
        .inspect_err(|e| error!("{e}"))?;
    let transport = SmtpMailer::new(&config).inspect_err(|e| error!("{e}"))?;
    let result = execute(&config, transport)
        .await
        .context("Mail run aborted")?;
    Ok(result)
}

/// Runs one batch: recipients, template, verify, then one send per recipient
///
/// Only failures that stop the whole batch are returned as errors, per recipient
/// failures are logged and counted in the summary
pub async fn execute<T: MailTransport>(config: &Config, transport: T) -> Result<Summary, MailerError> {
    let csv_file = config
        .csv_file
        .as_deref()
        .ok_or(MailerError::MissingCsvPath)
        .inspect_err(|e| error!("{e}"))?;
    let recipients = recipient::load_recipients(csv_file)
        .await
        .inspect_err(|e| error!("{e}"))?;
    info!("Loaded {} recipients from {csv_file:?}", recipients.len());

    let template_file = config
        .template_file
        .as_deref()
        .ok_or(MailerError::MissingTemplatePath)
        .inspect_err(|e| error!("{e}"))?;
    let template = Template::load(template_file)
        .await
        .inspect_err(|e| error!("{e}"))?;
    debug!("Template {template_file:?} is {} bytes", template.as_str().len());

    let dispatcher = Dispatcher::new(transport, config);
    let outcomes = dispatcher.dispatch(&recipients, &template).await?;

    let summary = Summary::from_outcomes(&outcomes);
    if summary.failed == 0 {
        info!("Completed: {summary}");
    } else {
        error!("Completed with failures: {summary}");
        for outcome in outcomes.iter().filter(|o| !o.is_sent()) {
            debug!("Not delivered: {} <{}>", outcome.display_name, outcome.email);
        }
    }
    Ok(summary)
}
