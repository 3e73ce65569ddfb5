//! Per-day, per-provider word quota ledger.
//!
//! `biquge` is unmetered: it never blocks and records nothing, reporting a
//! large sentinel limit so callers treat it uniformly with metered providers.

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::domain::{Provider, QuotaUsage};

const UNMETERED_SENTINEL: i64 = 1_000_000_000;

#[derive(Clone)]
pub struct QuotaLedger {
    db: DatabaseConnection,
    default_limit: i64,
}

impl QuotaLedger {
    pub fn new(db: DatabaseConnection, default_limit: i64) -> Self {
        QuotaLedger { db, default_limit }
    }

    #[tracing::instrument(skip(self))]
    pub async fn can_download(&self, provider: Provider) -> anyhow::Result<bool> {
        if provider.is_unmetered() {
            return Ok(true);
        }
        let usage = self.get_usage(provider).await?;
        Ok(usage.downloaded < usage.limit)
    }

    /// Records `words` against today's usage for `provider`. Returns the new total,
    /// or 0 for unmetered providers (nothing is recorded).
    #[tracing::instrument(skip(self))]
    pub async fn record(&self, provider: Provider, words: i64) -> anyhow::Result<i64> {
        if provider.is_unmetered() || words <= 0 {
            return Ok(0);
        }
        let today = Utc::now().date_naive();
        let existing = entities::quota::Entity::find_by_id((today, provider.as_str().to_string()))
            .one(&self.db)
            .await?;

        let new_total = match existing {
            Some(row) => {
                let new_total = row.words_downloaded + words;
                let mut active: entities::quota::ActiveModel = row.into();
                active.words_downloaded = Set(new_total);
                active.update(&self.db).await?;
                new_total
            }
            None => {
                let active = entities::quota::ActiveModel {
                    quota_date: Set(today),
                    provider: Set(provider.as_str().to_string()),
                    words_downloaded: Set(words),
                    word_limit: Set(self.default_limit),
                };
                active.insert(&self.db).await?;
                words
            }
        };
        Ok(new_total)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_usage(&self, provider: Provider) -> anyhow::Result<QuotaUsage> {
        let today = Utc::now().date_naive();
        if provider.is_unmetered() {
            return Ok(QuotaUsage {
                date: today,
                provider: provider.as_str().to_string(),
                downloaded: 0,
                limit: UNMETERED_SENTINEL,
                remaining: UNMETERED_SENTINEL,
                percentage: 0.0,
            });
        }
        let row = entities::quota::Entity::find()
            .filter(entities::quota::Column::QuotaDate.eq(today))
            .filter(entities::quota::Column::Provider.eq(provider.as_str()))
            .one(&self.db)
            .await?;

        let (downloaded, limit) = match row {
            Some(r) => (r.words_downloaded, r.word_limit),
            None => (0, self.default_limit),
        };
        let remaining = (limit - downloaded).max(0);
        let percentage = if limit > 0 {
            (downloaded as f64 / limit as f64) * 100.0
        } else {
            0.0
        };
        Ok(QuotaUsage {
            date: today,
            provider: provider.as_str().to_string(),
            downloaded,
            limit,
            remaining,
            percentage,
        })
    }

    /// Seconds remaining until local midnight, when the daily counters reset.
    pub fn seconds_until_reset(&self) -> i64 {
        let now = Utc::now();
        let tomorrow_midnight = (now + Duration::days(1))
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("valid time")
            .and_utc();
        (tomorrow_midnight - now).num_seconds().max(0)
    }
}
