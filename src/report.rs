//! Summary report: HTML table of per-URL outcomes, delivered over SMTP.

use crate::config::Config;
use crate::model::NotificationOutcome;
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt::Write as _;

const SMTP_RELAY: &str = "smtp.gmail.com";
const SMTP_PORT: u16 = 587;

/// Subject line: error prefix iff any outcome failed, plus the count.
pub fn report_subject(outcomes: &[NotificationOutcome]) -> String {
    let prefix = if outcomes.iter().any(NotificationOutcome::is_failed) {
        "[error]"
    } else {
        "[completed]"
    };
    format!(
        "{prefix} index notification batch: {} urls",
        outcomes.len()
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render the HTML report body: one table row per outcome, success rows
/// tinted green and failures red, message cells preserving whitespace.
pub fn render_report(outcomes: &[NotificationOutcome]) -> String {
    let mut rows = String::new();
    for outcome in outcomes {
        let (row_bg, label_color, label) = if outcome.is_failed() {
            ("#ffeaea", "#c82333", "Failed")
        } else {
            ("#eafbea", "#218838", "Success")
        };
        let _ = write!(
            rows,
            "<tr style='background-color:{row_bg};'>\
             <td style='word-break:break-all;'>{url}</td>\
             <td style='font-weight:bold;color:{label_color};'>{label}</td>\
             <td>{status}</td>\
             <td><pre style='white-space:pre-wrap;margin:0;font-family:inherit;'>{message}</pre></td>\
             </tr>",
            url = escape_html(&outcome.url),
            status = outcome.http_status,
            message = escape_html(&outcome.message),
        );
    }

    format!(
        r#"<html>
  <head>
    <style>
      table.result-table {{
        border-collapse: separate;
        border-spacing: 0;
        width: 100%;
        font-family: 'Segoe UI', sans-serif;
        box-shadow: 0 2px 8px #eee;
        border-radius: 8px;
        overflow: hidden;
      }}
      .result-table th, .result-table td {{
        border: 1px solid #ccc;
        padding: 8px 12px;
        text-align: left;
      }}
      .result-table th {{
        background: #4f81bd;
        color: #fff;
        font-weight: bold;
      }}
    </style>
  </head>
  <body>
    <h2 style='font-family:Segoe UI,sans-serif;'>Index notification batch results</h2>
    <table class='result-table'>
      <tr>
        <th>URL</th><th>Result</th><th>HTTP status</th><th>Message</th>
      </tr>
      {rows}
    </table>
  </body>
</html>
"#
    )
}

/// Delivery seam for the summary report. The pipeline only ever logs a
/// delivery failure; it never affects the run result.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_report(&self, subject: &str, html_body: &str) -> Result<()>;
}

/// STARTTLS relay mailer with password login.
pub struct SmtpMailer {
    mail_from: String,
    mail_password: String,
    mail_to: String,
}

impl SmtpMailer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            mail_from: cfg.mail_from.clone(),
            mail_password: cfg.mail_password.clone(),
            mail_to: cfg.mail_to.clone(),
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_report(&self, subject: &str, html_body: &str) -> Result<()> {
        let from: Mailbox = self
            .mail_from
            .parse()
            .context("invalid sender address")?;
        let to: Mailbox = self.mail_to.parse().context("invalid recipient address")?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::mixed().singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body.to_string()),
                ),
            )
            .context("failed to build report message")?;

        let creds = Credentials::new(self.mail_from.clone(), self.mail_password.clone());
        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(SMTP_RELAY)
                .context("failed to create SMTP transport")?
                .port(SMTP_PORT)
                .credentials(creds)
                .build();

        mailer
            .send(email)
            .await
            .context("failed to send report email")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<NotificationOutcome> {
        vec![
            NotificationOutcome::success("https://blog.example/a", 200),
            NotificationOutcome::failed("https://blog.example/b", 403, "quota <exceeded>\nretry later"),
        ]
    }

    #[test]
    fn subject_flags_error_iff_any_failure() {
        let outcomes = sample();
        assert_eq!(
            report_subject(&outcomes),
            "[error] index notification batch: 2 urls"
        );

        let all_ok = vec![NotificationOutcome::success("https://blog.example/a", 200)];
        assert_eq!(
            report_subject(&all_ok),
            "[completed] index notification batch: 1 urls"
        );
    }

    #[test]
    fn report_has_one_row_per_outcome() {
        let html = render_report(&sample());
        assert!(html.contains("https://blog.example/a"));
        assert!(html.contains("https://blog.example/b"));
        assert!(html.contains("Success"));
        assert!(html.contains("Failed"));
        assert!(html.contains("<td>200</td>"));
        assert!(html.contains("<td>403</td>"));
    }

    #[test]
    fn message_is_escaped_and_whitespace_preserved() {
        let html = render_report(&sample());
        assert!(html.contains("quota &lt;exceeded&gt;\nretry later"));
        assert!(html.contains("white-space:pre-wrap"));
    }

    #[test]
    fn empty_run_still_renders_a_report() {
        let outcomes: Vec<NotificationOutcome> = vec![];
        assert_eq!(
            report_subject(&outcomes),
            "[completed] index notification batch: 0 urls"
        );
        let html = render_report(&outcomes);
        assert!(html.contains("result-table"));
    }
}
