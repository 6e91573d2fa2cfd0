//! Budget and subscription expiry notices.
//!
//! Picks the entity whose end boundary matters most right now, buckets its
//! distance from `now` into an [`ExpiryThreshold`], and decides which notice
//! channels (modal, alert) to open given the persisted dismissals.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::store::DismissalStore;
use crate::types::TimeBoundedEntity;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Value written when a channel is dismissed.
const DISMISSED: &str = "true";

/// Proximity tiers, ordered nearest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryThreshold {
    Expired,
    Imminent,
    Near,
    Approaching,
    Far,
}

impl ExpiryThreshold {
    /// Every tier, nearest first.
    pub const ALL: [ExpiryThreshold; 5] = [
        ExpiryThreshold::Expired,
        ExpiryThreshold::Imminent,
        ExpiryThreshold::Near,
        ExpiryThreshold::Approaching,
        ExpiryThreshold::Far,
    ];

    /// Upper bound, in days until the end, covered by this tier.
    pub fn boundary_days(self) -> i64 {
        match self {
            ExpiryThreshold::Expired => 0,
            ExpiryThreshold::Imminent => 10,
            ExpiryThreshold::Near => 30,
            ExpiryThreshold::Approaching => 60,
            ExpiryThreshold::Far => 120,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExpiryThreshold::Expired => "expired",
            ExpiryThreshold::Imminent => "imminent",
            ExpiryThreshold::Near => "near",
            ExpiryThreshold::Approaching => "approaching",
            ExpiryThreshold::Far => "far",
        }
    }

    /// The tier with the smallest boundary at or above `days_until_end`.
    /// `None` when the end is further away than every boundary.
    pub fn classify(days_until_end: f64) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|tier| days_until_end <= tier.boundary_days() as f64)
    }
}

impl fmt::Display for ExpiryThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a notice is shown. Each channel is dismissed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeChannel {
    Modal,
    Alert,
}

impl NoticeChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeChannel::Modal => "modal",
            NoticeChannel::Alert => "alert",
        }
    }
}

/// Persistence key for a dismissed notice.
pub fn dismissal_key(channel: NoticeChannel, scope_id: &str, threshold: ExpiryThreshold) -> String {
    format!(
        "seen-budget-expiring-{}-{scope_id}-{}",
        channel.as_str(),
        threshold.as_str()
    )
}

/// Fractional days from `now` until `end`; negative once `end` has passed.
pub fn days_until(end: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (end - now).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// The entity to message about, and whether it came from the non-expired set.
///
/// Non-expired entities (`end >= now`) take priority so an already-expired
/// one cannot mask an upcoming expiry. Within the chosen set the entity
/// whose end is closest to `now` wins: the earliest end among non-expired
/// entities, the most recent end among expired ones. Ties go to the first
/// occurrence.
pub fn nearest_expiring(
    entities: &[TimeBoundedEntity],
    now: DateTime<Utc>,
) -> Option<(&TimeBoundedEntity, bool)> {
    let (non_expired, expired): (Vec<&TimeBoundedEntity>, Vec<&TimeBoundedEntity>) =
        entities.iter().partition(|e| e.end >= now);

    let has_non_expired = !non_expired.is_empty();
    let considered = if has_non_expired { non_expired } else { expired };

    let mut best: Option<&TimeBoundedEntity> = None;
    for entity in considered {
        let closer = match best {
            None => true,
            Some(current) => (entity.end - now).abs() < (current.end - now).abs(),
        };
        if closer {
            best = Some(entity);
        }
    }
    best.map(|entity| (entity, has_non_expired))
}

/// What to surface for a set of entities at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryNotice {
    pub entity_id: String,
    pub end: DateTime<Utc>,
    pub threshold: ExpiryThreshold,
    pub days_until_end: f64,
    /// The notice is about a still-active entity.
    pub has_non_expired: bool,
    pub open_modal: bool,
    pub open_alert: bool,
}

/// Computes expiry notices for one scope (e.g. an enterprise customer).
#[derive(Debug)]
pub struct ExpiryThresholdEvaluator<S> {
    scope_id: String,
    store: S,
}

impl<S: DismissalStore> ExpiryThresholdEvaluator<S> {
    pub fn new(scope_id: impl Into<String>, store: S) -> Self {
        Self {
            scope_id: scope_id.into(),
            store,
        }
    }

    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Evaluate `entities` at `now`. `None` when there is nothing to
    /// message about: no entities, or the nearest end is beyond every tier.
    pub fn evaluate(&self, entities: &[TimeBoundedEntity], now: DateTime<Utc>) -> Option<ExpiryNotice> {
        let (entity, has_non_expired) = nearest_expiring(entities, now)?;
        let days_until_end = days_until(entity.end, now);
        let threshold = ExpiryThreshold::classify(days_until_end)?;

        let notice = ExpiryNotice {
            entity_id: entity.id.clone(),
            end: entity.end,
            threshold,
            days_until_end,
            has_non_expired,
            open_modal: !self.is_dismissed(NoticeChannel::Modal, threshold),
            open_alert: !self.is_dismissed(NoticeChannel::Alert, threshold),
        };
        debug!(
            scope = %self.scope_id,
            entity = %notice.entity_id,
            threshold = %threshold,
            days = days_until_end,
            "expiry evaluated"
        );
        Some(notice)
    }

    pub fn is_dismissed(&self, channel: NoticeChannel, threshold: ExpiryThreshold) -> bool {
        self.store
            .get(&dismissal_key(channel, &self.scope_id, threshold))
            .is_some_and(|v| !v.is_empty())
    }

    /// Persist a dismissal. Set-once: returns `false` without writing when
    /// the channel was already dismissed for this tier.
    pub fn dismiss(&self, channel: NoticeChannel, threshold: ExpiryThreshold) -> Result<bool> {
        if self.is_dismissed(channel, threshold) {
            return Ok(false);
        }
        self.store
            .set(&dismissal_key(channel, &self.scope_id, threshold), DISMISSED)?;
        Ok(true)
    }
}

/// UI callbacks for the two notice channels.
pub trait ExpiryNotifier {
    fn modal_open(&self);
    fn modal_close(&self);
    fn alert_open(&self);
    fn alert_close(&self);
}

/// Drives an [`ExpiryNotifier`] from evaluator results and handles
/// dismissals for the current tier.
pub struct ExpiryMonitor<S, N> {
    evaluator: ExpiryThresholdEvaluator<S>,
    notifier: N,
    current: Option<ExpiryNotice>,
}

impl<S: DismissalStore, N: ExpiryNotifier> ExpiryMonitor<S, N> {
    pub fn new(evaluator: ExpiryThresholdEvaluator<S>, notifier: N) -> Self {
        Self {
            evaluator,
            notifier,
            current: None,
        }
    }

    /// Re-evaluate and open every channel that is not dismissed.
    pub fn refresh(&mut self, entities: &[TimeBoundedEntity], now: DateTime<Utc>) -> Option<&ExpiryNotice> {
        self.current = self.evaluator.evaluate(entities, now);
        if let Some(notice) = &self.current {
            if notice.open_modal {
                self.notifier.modal_open();
            }
            if notice.open_alert {
                self.notifier.alert_open();
            }
        }
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&ExpiryNotice> {
        self.current.as_ref()
    }

    pub fn evaluator(&self) -> &ExpiryThresholdEvaluator<S> {
        &self.evaluator
    }

    pub fn dismiss_modal(&mut self) -> Result<()> {
        self.dismiss(NoticeChannel::Modal)
    }

    pub fn dismiss_alert(&mut self) -> Result<()> {
        self.dismiss(NoticeChannel::Alert)
    }

    fn dismiss(&mut self, channel: NoticeChannel) -> Result<()> {
        let Some(notice) = self.current.as_mut() else {
            return Ok(());
        };
        self.evaluator.dismiss(channel, notice.threshold)?;
        match channel {
            NoticeChannel::Modal => {
                notice.open_modal = false;
                self.notifier.modal_close();
            }
            NoticeChannel::Alert => {
                notice.open_alert = false;
                self.notifier.alert_close();
            }
        }
        Ok(())
    }
}
