use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox}, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::{
    config::SmtpConfig,
    error::{AppError, AppResult},
};

/// Outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email_to(&self, recipient: &str, subject: &str, body: &str) -> AppResult<()>;
}

/// Plain-text mail through an authenticated SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)?
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .timeout(Some(timeout))
            .build();
        Ok(Self {
            transport,
            from: cfg.from.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_email_to(&self, recipient: &str, subject: &str, body: &str) -> AppResult<()> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| AppError::Transport(format!("sender address: {e}")))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| AppError::Transport(format!("recipient address {recipient:?}: {e}")))?;
        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Transport(e.to_string()))?;

        // the transport timeout covers each SMTP command, this bounds the whole exchange
        tokio::time::timeout(self.timeout, self.transport.send(message))
            .await
            .map_err(|_| {
                AppError::Transport(format!("timed out after {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| AppError::Transport(e.to_string()))?;

        info!(recipient, subject, "email sent");
        Ok(())
    }
}

/// Used when no SMTP account is configured: the message goes to the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_email_to(&self, recipient: &str, subject: &str, body: &str) -> AppResult<()> {
        info!(recipient, subject, body, "email not sent (no SMTP configured)");
        Ok(())
    }
}

/// Background email queue. Sends run on their own tasks; the caller never
/// waits for or sees the outcome, failures are logged.
#[derive(Clone)]
pub struct Outbox {
    mailer: Arc<dyn Mailer>,
    tasks: TaskTracker,
}

impl Outbox {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self {
            mailer,
            tasks: TaskTracker::new(),
        }
    }

    pub fn dispatch(&self, recipient: String, subject: String, body: String) {
        let mailer = self.mailer.clone();
        self.tasks.spawn(async move {
            if let Err(e) = mailer.send_email_to(&recipient, &subject, &body).await {
                error!(error = %e, recipient = %recipient, "email dispatch failed");
            }
        });
    }

    /// Sends still in flight.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Stop accepting sends and wait up to `grace` for in-flight ones.
    /// Returns how many were abandoned.
    pub async fn drain(&self, grace: Duration) -> usize {
        self.tasks.close();
        let pending = self.pending();
        if pending == 0 {
            return 0;
        }
        info!(pending, "waiting for queued emails");
        if tokio::time::timeout(grace, self.tasks.wait()).await.is_err() {
            let dropped = self.pending();
            warn!(dropped, "shutting down with undelivered emails");
            return dropped;
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingMailer(Arc<AtomicUsize>);

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_email_to(&self, _r: &str, _s: &str, _b: &str) -> AppResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Transport("connection refused".into()))
        }
    }

    struct StuckMailer;

    #[async_trait]
    impl Mailer for StuckMailer {
        async fn send_email_to(&self, _r: &str, _s: &str, _b: &str) -> AppResult<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn dispatch_swallows_transport_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let outbox = Outbox::new(Arc::new(FailingMailer(calls.clone())));
        outbox.dispatch("a@b.com".into(), "s".into(), "b".into());
        assert_eq!(outbox.drain(Duration::from_secs(1)).await, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn drain_reports_sends_that_never_finish() {
        let outbox = Outbox::new(Arc::new(StuckMailer));
        outbox.dispatch("a@b.com".into(), "s".into(), "b".into());
        outbox.dispatch("c@d.com".into(), "s".into(), "b".into());
        assert_eq!(outbox.pending(), 2);
        assert_eq!(outbox.drain(Duration::from_millis(20)).await, 2);
    }

    #[tokio::test]
    async fn drain_with_nothing_queued_returns_immediately() {
        let outbox = Outbox::new(Arc::new(LogMailer));
        assert_eq!(outbox.drain(Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        LogMailer
            .send_email_to("a@b.com", "subject", "body")
            .await
            .expect("log mailer");
    }
}
