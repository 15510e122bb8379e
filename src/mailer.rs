use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use crate::config::SmtpConfig;

/// Outbound notification seam. Handlers only see this trait so tests can
/// substitute a fake.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation(&self, to_email: &str, confirm_url: &str) -> anyhow::Result<()>;
}

pub fn build_confirm_url(public_base_url: &str, token: &str) -> String {
    format!("{}/confirm/{}", public_base_url.trim_end_matches('/'), token)
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid from address: {e}"))?;

        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(creds)
            .port(config.port)
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_confirmation(&self, to_email: &str, confirm_url: &str) -> anyhow::Result<()> {
        let to: Mailbox = to_email
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid recipient address: {e}"))?;

        let text_body = format!(
            "Welcome!\n\n\
             Please confirm your email address by opening the link below:\n\n\
             {confirm_url}\n\n\
             If you did not create an account, you can ignore this message.\n"
        );
        let html_body = format!(
            "<p>Welcome!</p>\
             <p>Please confirm your email address by clicking the link below:</p>\
             <p><a href=\"{confirm_url}\">Confirm my email</a></p>\
             <p>If you did not create an account, you can ignore this message.</p>"
        );

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Confirm your email address")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        match self.transport.send(email).await {
            Ok(_) => {
                info!(to = %to_email, "confirmation email sent");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, to = %to_email, "smtp send failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_url_joins_base_and_token() {
        assert_eq!(
            build_confirm_url("http://localhost:8080", "abc.def.ghi"),
            "http://localhost:8080/confirm/abc.def.ghi"
        );
    }

    #[test]
    fn confirm_url_tolerates_trailing_slash() {
        assert_eq!(
            build_confirm_url("https://example.com/", "tok"),
            "https://example.com/confirm/tok"
        );
    }
}
