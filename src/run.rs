//! The batch pipeline: mirror, select, notify, report. Strictly sequential.

use crate::blog::BlogClient;
use crate::config::Config;
use crate::db::{self, Pool};
use crate::indexing::IndexingSession;
use crate::model::{NotificationOutcome, TrackedUrl};
use crate::report::{self, Mailer};
use anyhow::Result;
use chrono::Utc;
use tracing::{info, instrument, warn};

/// Run one batch. Mirroring and selection errors abort the run; individual
/// notification failures are captured as outcomes; report delivery failures
/// are logged and swallowed.
#[instrument(skip_all)]
pub async fn execute(
    cfg: &Config,
    pool: &Pool,
    blog: &BlogClient,
    session: &IndexingSession,
    mailer: &dyn Mailer,
) -> Result<Vec<NotificationOutcome>> {
    mirror_blog_urls(pool, blog, &cfg.blog_id).await?;

    let pending = db::pending_urls(pool, i64::from(cfg.batch_size)).await?;
    info!(count = pending.len(), "selected pending urls");

    let mut outcomes = Vec::with_capacity(pending.len());
    for record in pending {
        if record.url.is_empty() {
            warn!(doc_id = %record.doc_id, "skipping record without a url");
            continue;
        }
        outcomes.push(notify_one(pool, session, &record).await?);
        // Unconditional pause between calls, failed or not, to respect the
        // indexing API's rate limits.
        tokio::time::sleep(cfg.notify_delay).await;
    }

    send_report(mailer, &outcomes).await;
    Ok(outcomes)
}

/// Mirror the blog's published post URLs into the store.
async fn mirror_blog_urls(pool: &Pool, blog: &BlogClient, blog_id: &str) -> Result<()> {
    let urls = blog.list_posts(blog_id).await?;
    info!(count = urls.len(), "mirroring blog urls into store");
    for url in urls {
        db::register_url(pool, &url, Utc::now()).await?;
    }
    Ok(())
}

/// One notification attempt. Only an exact 200 advances the marker; any
/// other status, and any transport error, leaves the record maximally due
/// for the next run. Store errors while advancing the marker propagate.
async fn notify_one(
    pool: &Pool,
    session: &IndexingSession,
    record: &TrackedUrl,
) -> Result<NotificationOutcome> {
    info!(url = %record.url, "sending indexing notification");
    match session.publish_update(&record.url).await {
        Ok((200, _body)) => {
            db::mark_sent(pool, &record.doc_id, Utc::now()).await?;
            info!(url = %record.url, status = 200, "indexing notification succeeded");
            Ok(NotificationOutcome::success(&record.url, 200))
        }
        Ok((status, body)) => {
            warn!(url = %record.url, status, body = %body, "indexing notification failed");
            Ok(NotificationOutcome::failed(&record.url, status, body))
        }
        Err(err) => {
            warn!(?err, url = %record.url, "indexing notification transport error");
            Ok(NotificationOutcome::failed(&record.url, 0, format!("{err:#}")))
        }
    }
}

async fn send_report(mailer: &dyn Mailer, outcomes: &[NotificationOutcome]) {
    let subject = report::report_subject(outcomes);
    let body = report::render_report(outcomes);
    match mailer.send_report(&subject, &body).await {
        Ok(()) => info!(%subject, "report email sent"),
        Err(err) => warn!(?err, %subject, "failed to send report email"),
    }
}
