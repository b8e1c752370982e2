use lettre::{
    message::{header::ContentType, Mailbox, MultiPart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use log::debug;

use super::{MailTransport, OutgoingEmail};
use crate::{
    config::Config,
    error::{MailerError, SendError},
};

/// SMTP transport shared by every send of a run
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &Config) -> Result<Self, MailerError> {
        debug!(
            "Creating smtp transport for {}:{} (secure: {})",
            config.smtp_host, config.smtp_port, config.smtp_secure
        );
        let tls_parameters =
            TlsParameters::new(config.smtp_host.clone()).map_err(MailerError::TransportSetup)?;
        // Not secure still upgrades with STARTTLS when the server offers it
        let tls = if config.smtp_secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };
        let credentials = Credentials::new(config.smtp_user.clone(), config.smtp_pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port)
            .tls(tls)
            .credentials(credentials)
            .build();
        Ok(Self { transport })
    }
}

impl MailTransport for SmtpMailer {
    async fn verify(&self) -> Result<(), MailerError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(MailerError::TransportVerificationFailed(
                "server did not accept the connection".to_string(),
            )),
            Err(e) => Err(MailerError::TransportVerificationFailed(e.to_string())),
        }
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), SendError> {
        let message = build_message(email)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;
        debug!(
            "Server accepted message for {:?}: {}",
            email.to_email,
            response.code()
        );
        Ok(())
    }
}

fn parse_address(address: &str) -> Result<Address, SendError> {
    address.parse().map_err(|source| SendError::Address {
        address: address.to_string(),
        source,
    })
}

/// Turns the outgoing fields into a MIME message, HTML only unless a text body is given
pub fn build_message(email: &OutgoingEmail) -> Result<Message, SendError> {
    let from = Mailbox::new(None, parse_address(&email.from)?);
    let reply_to = Mailbox::new(None, parse_address(&email.reply_to)?);
    let to_name = (!email.to_name.is_empty()).then(|| email.to_name.clone());
    let to = Mailbox::new(to_name, parse_address(&email.to_email)?);

    let mut builder = Message::builder().from(from).reply_to(reply_to).to(to);
    if let Some(subject) = &email.subject {
        builder = builder.subject(subject.as_str());
    }

    let message = match &email.text {
        Some(text) => builder.multipart(MultiPart::alternative_plain_html(
            text.clone(),
            email.html.clone(),
        ))?,
        None => builder
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())?,
    };
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outgoing() -> OutgoingEmail {
        OutgoingEmail {
            from: "me@acme.test".into(),
            to_name: "Jane Doe".into(),
            to_email: "jane@acme.test".into(),
            reply_to: "me@acme.test".into(),
            subject: Some("News".into()),
            html: "<p>Hi Jane Doe!</p>".into(),
            text: None,
        }
    }

    fn formatted(message: &Message) -> String {
        String::from_utf8(message.formatted()).unwrap()
    }

    #[test]
    fn html_message_headers() {
        // Arrange
        let email = outgoing();

        // Act
        let actual = formatted(&build_message(&email).unwrap());

        // Assert
        assert!(actual.contains("From: me@acme.test\r\n"));
        assert!(actual.contains("Reply-To: me@acme.test\r\n"));
        assert!(actual.contains("Jane Doe"));
        assert!(actual.contains("<jane@acme.test>"));
        assert!(actual.contains("Subject: News\r\n"));
        assert!(actual.contains("Content-Type: text/html; charset=utf-8\r\n"));
        assert!(actual.contains("<p>Hi Jane Doe!</p>"));
    }

    #[test]
    fn empty_name_sends_bare_address() {
        let email = OutgoingEmail {
            to_name: "".into(),
            to_email: "bob@x.test".into(),
            ..outgoing()
        };
        let actual = formatted(&build_message(&email).unwrap());
        assert!(actual.contains("To: bob@x.test\r\n"));
    }

    #[test]
    fn no_subject_header_without_subject() {
        let email = OutgoingEmail {
            subject: None,
            ..outgoing()
        };
        let actual = formatted(&build_message(&email).unwrap());
        assert!(!actual.contains("Subject:"));
    }

    #[test]
    fn text_alternative_is_multipart() {
        let email = OutgoingEmail {
            text: Some("Hi Jane Doe!".into()),
            ..outgoing()
        };
        let actual = formatted(&build_message(&email).unwrap());
        assert!(actual.contains("multipart/alternative"));
        assert!(actual.contains("text/plain"));
        assert!(actual.contains("text/html"));
    }

    #[test]
    fn invalid_recipient_address() {
        let email = OutgoingEmail {
            to_email: "not an address".into(),
            ..outgoing()
        };
        let actual = build_message(&email);
        assert!(matches!(actual, Err(SendError::Address { address, .. }) if address == "not an address"));
    }

    #[test]
    fn invalid_sender_address() {
        let email = OutgoingEmail {
            from: "smtp-login-name".into(),
            reply_to: "smtp-login-name".into(),
            ..outgoing()
        };
        assert!(matches!(
            build_message(&email),
            Err(SendError::Address { .. })
        ));
    }
}
