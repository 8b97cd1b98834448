use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::models::UserDetail;

#[derive(Debug)]
pub struct ExpiryStats {
    pub cutoff: DateTime<Utc>,
    pub downgraded: usize,
}

/// Payments made before this instant no longer cover premium access
pub fn cutoff(now: DateTime<Utc>, period_days: i64) -> DateTime<Utc> {
    now - Duration::days(period_days)
}

/// Downgrades premium users whose newest payment is older than the period.
///
/// Admins and users made premium without a payment keep their flag.
pub async fn expire_lapsed_premium(
    pool: &PgPool,
    period_days: i64,
) -> Result<ExpiryStats, sqlx::Error> {
    let cutoff = cutoff(Utc::now(), period_days);

    let downgraded = UserDetail::expire_premium_paid_before(pool, cutoff).await?;
    for user_id in &downgraded {
        tracing::info!(user_id, "Premium access expired");
    }

    let stats = ExpiryStats {
        cutoff,
        downgraded: downgraded.len(),
    };
    tracing::info!(?stats, "Premium expiry job completed");

    Ok(stats)
}

/// Schedules the expiry sweep and starts the scheduler
pub async fn start(
    pool: PgPool,
    schedule: &str,
    period_days: i64,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _scheduler| {
        let pool = pool.clone();
        Box::pin(async move {
            if let Err(e) = expire_lapsed_premium(&pool, period_days).await {
                tracing::error!(error = %e, "Premium expiry job failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(schedule, period_days, "Premium expiry job scheduled");
    Ok(scheduler)
}
