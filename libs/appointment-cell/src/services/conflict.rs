// libs/appointment-cell/src/services/conflict.rs
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use shared_config::ConflictScope;

use crate::models::{checked_end, Appointment, ConflictCheckResponse, SlotQuery, SuggestedSlot};

const SLOT_STEP_MINUTES: i64 = 30;
pub const DEFAULT_SEARCH_DAYS: i64 = 7;

/// Overlap detection over an in-memory appointment list. Every stored
/// appointment counts regardless of status.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetectionService {
    scope: ConflictScope,
}

impl ConflictDetectionService {
    pub fn new(scope: ConflictScope) -> Self {
        Self { scope }
    }

    /// Half-open intervals: touching ends do not overlap.
    pub fn appointments_overlap(
        &self,
        start1: DateTime<Utc>,
        end1: DateTime<Utc>,
        start2: DateTime<Utc>,
        end2: DateTime<Utc>,
    ) -> bool {
        start1 < end2 && end1 > start2
    }

    pub fn conflicting<'a>(
        &self,
        existing: &'a [Appointment],
        slot: &SlotQuery,
    ) -> Vec<&'a Appointment> {
        let slot_end = slot.end();
        existing
            .iter()
            .filter(|apt| self.in_scope(apt, slot))
            .filter(|apt| self.appointments_overlap(slot.start, slot_end, apt.datetime, apt.end_time()))
            .collect()
    }

    pub fn has_conflict(&self, existing: &[Appointment], slot: &SlotQuery) -> bool {
        !self.conflicting(existing, slot).is_empty()
    }

    pub fn check_conflicts(&self, existing: &[Appointment], slot: &SlotQuery) -> ConflictCheckResponse {
        debug!(
            "Checking conflicts for {} ({} min, provider {:?}, scope {})",
            slot.start, slot.duration_minutes, slot.provider_id, self.scope
        );

        let conflicting_appointments: Vec<Appointment> =
            self.conflicting(existing, slot).into_iter().cloned().collect();
        let has_conflict = !conflicting_appointments.is_empty();

        let suggested_alternative = if has_conflict {
            warn!(
                "Conflict detected at {} - {} conflicting appointments",
                slot.start,
                conflicting_appointments.len()
            );
            self.find_next_available_slot(
                existing,
                slot.provider_id,
                slot.start,
                slot.duration_minutes,
                DEFAULT_SEARCH_DAYS,
            )
        } else {
            None
        };

        ConflictCheckResponse {
            has_conflict,
            conflicting_appointments,
            suggested_alternative,
        }
    }

    /// Walks forward from `preferred_start` in 30-minute steps and returns
    /// the first slot without a conflict. The search stops early where the
    /// calendar runs out.
    pub fn find_next_available_slot(
        &self,
        existing: &[Appointment],
        provider_id: Option<i64>,
        preferred_start: DateTime<Utc>,
        duration_minutes: i64,
        max_search_days: i64,
    ) -> Option<SuggestedSlot> {
        if duration_minutes <= 0 {
            return None;
        }

        let search_end = Duration::try_days(max_search_days)
            .and_then(|window| preferred_start.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let step = Duration::minutes(SLOT_STEP_MINUTES);
        let mut current = preferred_start;

        while current < search_end {
            checked_end(current, duration_minutes)?;
            let slot = SlotQuery {
                start: current,
                duration_minutes,
                provider_id,
            };

            if !self.has_conflict(existing, &slot) {
                return Some(SuggestedSlot {
                    start_time: slot.start,
                    end_time: slot.end(),
                    provider_id,
                });
            }

            current = current.checked_add_signed(step)?;
        }

        None
    }

    fn in_scope(&self, existing: &Appointment, slot: &SlotQuery) -> bool {
        match self.scope {
            ConflictScope::Global => true,
            ConflictScope::Provider => existing.provider_id == slot.provider_id,
        }
    }
}
