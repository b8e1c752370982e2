mod smtp;

use std::fmt::Display;

use log::{debug, error, info};

pub use smtp::{build_message, SmtpMailer};

use crate::{
    config::Config,
    error::{MailerError, SendError},
    recipient::Recipient,
    template::Template,
};

/// The fields of one outgoing message before it is handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to_name: String,
    pub to_email: String,
    pub reply_to: String,
    pub subject: Option<String>,
    pub html: String,
    pub text: Option<String>,
}

/// Something that can deliver [`OutgoingEmail`]s
#[allow(async_fn_in_trait)]
pub trait MailTransport {
    /// Checks once that the server is reachable and accepts our credentials
    async fn verify(&self) -> Result<(), MailerError>;

    async fn send(&self, email: &OutgoingEmail) -> Result<(), SendError>;
}

impl<T: MailTransport> MailTransport for &T {
    async fn verify(&self) -> Result<(), MailerError> {
        (**self).verify().await
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), SendError> {
        (**self).send(email).await
    }
}

/// Result of trying to mail a single recipient
#[derive(Debug)]
pub struct SendOutcome {
    pub display_name: String,
    pub email: String,
    pub result: Result<(), SendError>,
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Summary {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[SendOutcome]) -> Self {
        let sent = outcomes.iter().filter(|o| o.is_sent()).count();
        Self {
            attempted: outcomes.len(),
            sent,
            failed: outcomes.len() - sent,
        }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} attempted, {} sent, {} failed",
            self.attempted, self.sent, self.failed
        )
    }
}

/// Sends the templated email to each recipient in turn over a single transport
pub struct Dispatcher<T> {
    transport: T,
    sender: String,
    subject: Option<String>,
    text: Option<String>,
}

impl<T: MailTransport> Dispatcher<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            transport,
            sender: config.smtp_user.clone(),
            subject: config.email_subject.clone(),
            text: config.email_text.clone(),
        }
    }

    pub async fn verify(&self) -> Result<(), MailerError> {
        debug!("Verifying smtp transport");
        match self.transport.verify().await {
            Ok(()) => {
                info!("verify: true");
                Ok(())
            }
            Err(e) => {
                error!("verify: false - {e}");
                Err(e)
            }
        }
    }

    pub fn compose(&self, recipient: &Recipient, template: &Template) -> OutgoingEmail {
        let name = recipient.display_name();
        OutgoingEmail {
            from: self.sender.clone(),
            to_name: name.to_string(),
            to_email: recipient.email.clone(),
            reply_to: self.sender.clone(),
            subject: self.subject.clone(),
            html: template.render(name),
            text: self.text.clone(),
        }
    }

    /// Never fails, the error is kept in the outcome so the caller can move on to the next recipient
    pub async fn send_one(&self, recipient: &Recipient, template: &Template) -> SendOutcome {
        let email = self.compose(recipient, template);
        let result = self.transport.send(&email).await;
        match &result {
            Ok(()) => info!("Email sent to {recipient} successfully"),
            Err(e) => error!("Error sending email to {recipient}: {e}"),
        }
        SendOutcome {
            display_name: email.to_name,
            email: email.to_email,
            result,
        }
    }

    pub async fn send_all(&self, recipients: &[Recipient], template: &Template) -> Vec<SendOutcome> {
        let mut result = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            result.push(self.send_one(recipient, template).await);
        }
        result
    }

    /// Verifies the transport then mails everyone, nothing is sent if verification fails
    pub async fn dispatch(
        &self,
        recipients: &[Recipient],
        template: &Template,
    ) -> Result<Vec<SendOutcome>, MailerError> {
        self.verify().await?;
        Ok(self.send_all(recipients, template).await)
    }
}
