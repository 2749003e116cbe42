use axum::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use crate::config::MailConfig;

/// Outbound email dispatch: {to, subject, html body}.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(cfg.username.clone(), cfg.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)?
            .port(cfg.smtp_port)
            .credentials(creds)
            .build();
        Ok(Self {
            transport,
            from: format!("{} <{}>", cfg.from_name, cfg.from_address),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;
        self.transport.send(message).await?;
        debug!(%to, %subject, "email sent");
        Ok(())
    }
}

pub fn confirmation_email_body(base_url: &str, token: &str) -> String {
    format!(
        "Click the following link to confirm your email: {}/confirm?token={}",
        base_url.trim_end_matches('/'),
        token
    )
}
