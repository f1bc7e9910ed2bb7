//! SMTP delivery of password-reset codes.
//!
//! Uses `lettre` over STARTTLS on port 587. Configured from `SMTP_HOST`,
//! `SMTP_USERNAME`, `SMTP_PASSWORD` and `EMAIL_FROM_NAME`; when no username
//! is set the server falls back to logging codes instead of mailing them.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use services::password_reset::{MailError, ResetMailer};
use util::config::AppConfig;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        username: &str,
        password: &str,
        from_name: &str,
    ) -> Result<Self, MailError> {
        let tls = TlsParameters::new(host.to_owned()).map_err(|e| MailError(e.to_string()))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| MailError(e.to_string()))?
            .port(587)
            .tls(Tls::Required(tls))
            .credentials(Credentials::new(username.to_owned(), password.to_owned()))
            .build();

        let from = format!("{from_name} <{username}>")
            .parse::<Mailbox>()
            .map_err(|e| MailError(format!("invalid sender address: {e}")))?;

        Ok(Self { transport, from })
    }

    /// `None` when SMTP credentials are not configured.
    pub fn from_config() -> Option<Result<Self, MailError>> {
        let cfg = AppConfig::global();
        if cfg.smtp_username.trim().is_empty() {
            return None;
        }
        Some(Self::new(
            &cfg.smtp_host,
            &cfg.smtp_username,
            &cfg.smtp_password,
            &cfg.email_from_name,
        ))
    }

    fn build_message(
        &self,
        to: Mailbox,
        code: &str,
        expires_in_minutes: i64,
    ) -> Result<Message, MailError> {
        let sender = self.from.name.clone().unwrap_or_default();
        let text = format!(
            "Hello,\n\n\
            Your password reset code is: {code}\n\n\
            The code expires in {expires_in_minutes} minutes and can only be used once.\n\n\
            If you did not request a password reset, you can ignore this email.\n\n\
            {sender}"
        );
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333;">
  <h2>Reset your password</h2>
  <p>Your password reset code is:</p>
  <p style="font-size: 28px; font-weight: bold; letter-spacing: 6px;">{code}</p>
  <p>The code expires in {expires_in_minutes} minutes and can only be used once.</p>
  <p style="color: #dc3545;">If you did not request a password reset, you can ignore this email.</p>
  <p>{sender}</p>
</body>
</html>"#
        );

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Your password reset code")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .map_err(|e| MailError(e.to_string()))
    }
}

#[async_trait]
impl ResetMailer for SmtpMailer {
    async fn send_reset_code(
        &self,
        to_email: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> Result<(), MailError> {
        let to = to_email
            .parse::<Mailbox>()
            .map_err(|e| MailError(format!("invalid recipient address: {e}")))?;
        let message = self.build_message(to, code, expires_in_minutes)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn message_carries_the_code_in_both_parts() {
        let mailer =
            SmtpMailer::new("smtp.example.com", "noreply@example.com", "secret", "Learnboard")
                .unwrap();
        let to: Mailbox = "parent@example.com".parse().unwrap();

        let message = mailer.build_message(to, "042917", 15).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Your password reset code"));
        assert!(raw.matches("042917").count() >= 2);
    }
}
