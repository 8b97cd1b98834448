use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::models::{CardTemplate, Payment, UserDetail};

const RECENT_USERS: i64 = 3;
const RECENT_PAYMENTS: i64 = 3;
const RECENT_TEMPLATES: i64 = 2;
const MAX_ACTIVITY: usize = 10;
const ACTIVE_USER_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_payments: i64,
    pub total_revenue: f64,
    pub total_templates: i64,
    pub premium_users: i64,
    pub active_users: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    User,
    Payment,
    Template,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    pub time: String,
    pub timestamp: DateTime<Utc>,
}

#[tracing::instrument(skip(pool))]
pub async fn stats(pool: &PgPool) -> Result<DashboardStats, sqlx::Error> {
    let active_since = Utc::now() - Duration::days(ACTIVE_USER_DAYS);

    let (total_users, premium_users, active_users) = UserDetail::counts(pool, active_since).await?;
    let (total_payments, total_revenue) = Payment::totals(pool).await?;
    let total_templates = CardTemplate::count(pool).await?;

    Ok(DashboardStats {
        total_users,
        total_payments,
        total_revenue,
        total_templates,
        premium_users,
        active_users,
    })
}

/// Newest signups, payments and templates merged into one feed
#[tracing::instrument(skip(pool))]
pub async fn recent_activity(pool: &PgPool) -> Result<Vec<Activity>, sqlx::Error> {
    let now = Utc::now();
    let mut activities = Vec::new();

    for user in UserDetail::newest(pool, RECENT_USERS).await? {
        activities.push(Activity {
            id: format!("user-{}", user.user_id),
            kind: ActivityKind::User,
            message: format!("New user registered: {}", user.email),
            time: relative_time(user.created_at, now),
            timestamp: user.created_at,
        });
    }

    for entry in Payment::newest_with_users(pool, Some(RECENT_PAYMENTS)).await? {
        let payment = entry.payment;
        activities.push(Activity {
            id: format!("payment-{}", payment.payment_id),
            kind: ActivityKind::Payment,
            message: format!(
                "Payment received: ${} from {}",
                payment.amount, entry.user.username
            ),
            time: relative_time(payment.payment_date, now),
            timestamp: payment.payment_date,
        });
    }

    for template in CardTemplate::newest(pool, RECENT_TEMPLATES).await? {
        activities.push(Activity {
            id: format!("template-{}", template.template_id),
            kind: ActivityKind::Template,
            message: format!("New template \"{}\" added", template.title),
            time: relative_time(template.created_at, now),
            timestamp: template.created_at,
        });
    }

    Ok(merge_newest_first(activities))
}

fn merge_newest_first(mut activities: Vec<Activity>) -> Vec<Activity> {
    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activities.truncate(MAX_ACTIVITY);
    activities
}

/// "N seconds ago", "1 minute ago", "3 hours ago", "2 days ago"
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds().max(0);

    let plural = |n: i64, unit: &str| {
        if n > 1 {
            format!("{n} {unit}s ago")
        } else {
            format!("{n} {unit} ago")
        }
    };

    match seconds {
        s if s < 60 => format!("{s} seconds ago"),
        s if s < 3_600 => plural(s / 60, "minute"),
        s if s < 86_400 => plural(s / 3_600, "hour"),
        s => plural(s / 86_400, "day"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str, minutes_ago: i64, now: DateTime<Utc>) -> Activity {
        let timestamp = now - Duration::minutes(minutes_ago);
        Activity {
            id: id.to_string(),
            kind: ActivityKind::User,
            message: String::new(),
            time: relative_time(timestamp, now),
            timestamp,
        }
    }

    #[test]
    fn test_relative_time() {
        let now = Utc::now();

        assert_eq!(relative_time(now - Duration::seconds(5), now), "5 seconds ago");
        assert_eq!(relative_time(now - Duration::seconds(60), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::minutes(59), now), "59 minutes ago");
        assert_eq!(relative_time(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(relative_time(now - Duration::hours(23), now), "23 hours ago");
        assert_eq!(relative_time(now - Duration::days(1), now), "1 day ago");
        assert_eq!(relative_time(now - Duration::days(40), now), "40 days ago");
    }

    #[test]
    fn test_future_timestamps_clamp_to_zero() {
        let now = Utc::now();
        assert_eq!(relative_time(now + Duration::seconds(30), now), "0 seconds ago");
    }

    #[test]
    fn test_merge_orders_and_caps() {
        let now = Utc::now();
        let activities: Vec<Activity> = (0..12)
            .map(|i| activity(&format!("user-{i}"), (i * 7) % 12, now))
            .collect();

        let merged = merge_newest_first(activities);

        assert_eq!(merged.len(), 10);
        assert!(merged.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(merged[0].id, "user-0");
    }

    #[test]
    fn test_activity_serializes_type_field() {
        let now = Utc::now();
        let value = serde_json::to_value(activity("user-1", 2, now)).unwrap();

        assert_eq!(value["type"], "user");
        assert_eq!(value["time"], "2 minutes ago");
        assert!(value.get("kind").is_none());
    }
}
