use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::AppConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, token: &str) -> anyhow::Result<()>;
}

/// Outbound SMTP gateway for transactional mail.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    base_url: String,
}

impl SmtpMailer {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp.host)
            .context("smtp relay")?
            .port(config.smtp.port)
            .credentials(Credentials::new(
                config.smtp.username.clone(),
                config.smtp.password.clone(),
            ))
            .build();
        let from = config
            .smtp
            .from
            .parse::<Mailbox>()
            .context("parse smtp from address")?;
        Ok(Self {
            transport,
            from,
            base_url: config.base_url.clone(),
        })
    }

    fn build_verification(&self, to: &str, token: &str) -> anyhow::Result<Message> {
        let link = verification_link(&self.base_url, token);
        let to = to.parse::<Mailbox>().context("parse recipient address")?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Welcome to PhoneBook")
            .multipart(MultiPart::alternative_plain_html(
                format!("To confirm your registration please open the link {link}"),
                format!("To confirm your registration please click on the <a href='{link}'>link</a>"),
            ))
            .context("build verification message")?;
        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification(&self, to: &str, token: &str) -> anyhow::Result<()> {
        let message = self.build_verification(to, token)?;
        self.transport.send(message).await.context("smtp send")?;
        Ok(())
    }
}

/// Link the recipient clicks to confirm the address. The token is embedded
/// as-is, directly after the route prefix.
pub fn verification_link(base_url: &str, token: &str) -> String {
    format!("{}/users/verify/{}", base_url.trim_end_matches('/'), token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn link_has_no_extra_separator_before_token() {
        let link = verification_link("http://localhost:3000", "abc123");
        assert_eq!(link, "http://localhost:3000/users/verify/abc123");
    }

    #[test]
    fn link_tolerates_trailing_slash_in_base_url() {
        let link = verification_link("https://phonebook.app/", "tok");
        assert_eq!(link, "https://phonebook.app/users/verify/tok");
    }

    #[tokio::test]
    async fn builds_verification_message() {
        let state = AppState::fake();
        let mailer = SmtpMailer::new(&state.config).expect("mailer from fake config");
        let message = mailer
            .build_verification("someone@example.com", "sometoken")
            .expect("message should build");
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("Welcome to PhoneBook"));
        assert!(raw.contains("someone@example.com"));
    }

    #[tokio::test]
    async fn rejects_unparseable_recipient() {
        let state = AppState::fake();
        let mailer = SmtpMailer::new(&state.config).expect("mailer from fake config");
        assert!(mailer.build_verification("not-an-address", "tok").is_err());
    }
}
