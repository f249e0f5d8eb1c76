//! Reminder status derivation and notification timing.
//!
//! Status is never stored: it is recomputed from the due date on every read
//! unless the user has pinned one (completed, cancelled, ...).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Reminder, ReminderStatus};

/// Days ahead that still count as "upcoming soon"
pub const SOON_WINDOW_DAYS: i64 = 3;
/// Days overdue before a reminder counts as missed (extended rule only)
pub const MISSED_AFTER_DAYS: i64 = 7;

/// Threshold table used for computed statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusRule {
    /// Overdue for more than a week becomes missed
    #[default]
    Extended,
    /// Overdue has no upper bound; missed only via a manual status
    Basic,
}

/// Where a reminder's status comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    Computed { due: DateTime<Utc>, now: DateTime<Utc> },
    ManualOverride(ReminderStatus),
}

impl StatusSource {
    pub fn of(reminder: &Reminder, now: DateTime<Utc>) -> Self {
        match reminder.manual_status {
            Some(status) => StatusSource::ManualOverride(status),
            None => StatusSource::Computed { due: reminder.due_date, now },
        }
    }
}

/// Whole days from `now` until `due`, truncated toward zero
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (due - now).num_days()
}

pub fn resolve_status(source: StatusSource, rule: StatusRule) -> ReminderStatus {
    let (due, now) = match source {
        StatusSource::ManualOverride(status) => return status,
        StatusSource::Computed { due, now } => (due, now),
    };

    let days = days_until(due, now);
    match rule {
        StatusRule::Extended if days < -MISSED_AFTER_DAYS => ReminderStatus::Missed,
        _ if days < 0 => ReminderStatus::Overdue,
        _ if days == 0 => ReminderStatus::DueToday,
        _ if days <= SOON_WINDOW_DAYS => ReminderStatus::UpcomingSoon,
        _ => ReminderStatus::Upcoming,
    }
}

pub fn status_of(reminder: &Reminder, now: DateTime<Utc>, rule: StatusRule) -> ReminderStatus {
    resolve_status(StatusSource::of(reminder, now), rule)
}

/// A single pending notification for a reminder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub lead_days: u32,
    pub delay: std::time::Duration,
}

/// Delays from `now` until each of the reminder's lead-time notifications.
///
/// With no configured lead times the reminder fires at its due time. Lead
/// times whose trigger point has already passed are dropped, as are
/// inactive reminders and ones carrying a manual status.
pub fn notification_triggers(reminder: &Reminder, now: DateTime<Utc>) -> Vec<Trigger> {
    if !reminder.active || reminder.manual_status.is_some() {
        return Vec::new();
    }

    let leads: &[u32] = if reminder.notify_before_days.is_empty() {
        &[0]
    } else {
        &reminder.notify_before_days
    };

    let mut triggers: Vec<Trigger> = leads
        .iter()
        .filter_map(|&lead_days| {
            let at = Duration::try_days(i64::from(lead_days))
                .and_then(|lead| reminder.due_date.checked_sub_signed(lead))?;
            let delay = (at - now).to_std().ok()?;
            Some(Trigger { lead_days, delay })
        })
        .collect();
    triggers.sort_by_key(|t| t.delay);
    triggers.dedup_by_key(|t| t.lead_days);
    triggers
}

/// The next occurrence of a repeating reminder.
///
/// `None` when it does not repeat or the next due date falls outside the
/// representable calendar.
pub fn next_occurrence(reminder: &Reminder) -> Option<Reminder> {
    let interval = reminder.repeat_interval_days.filter(|d| *d > 0)?;
    let due_date = Duration::try_days(i64::from(interval))
        .and_then(|step| reminder.due_date.checked_add_signed(step))?;
    Some(Reminder {
        id: String::new(),
        due_date,
        manual_status: None,
        active: true,
        ..reminder.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn computed(days: i64) -> StatusSource {
        StatusSource::Computed {
            due: now() + Duration::days(days),
            now: now(),
        }
    }

    fn reminder(due_in_days: i64) -> Reminder {
        Reminder {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            vehicle_id: "v1".to_string(),
            reminder_type: "Oil change".to_string(),
            due_date: now() + Duration::days(due_in_days),
            odometer_threshold: None,
            notes: String::new(),
            active: true,
            repeat_interval_days: None,
            notify_before_days: Vec::new(),
            manual_status: None,
        }
    }

    #[test]
    fn extended_rule_thresholds() {
        let rule = StatusRule::Extended;
        assert_eq!(resolve_status(computed(-10), rule), ReminderStatus::Missed);
        assert_eq!(resolve_status(computed(-8), rule), ReminderStatus::Missed);
        assert_eq!(resolve_status(computed(-7), rule), ReminderStatus::Overdue);
        assert_eq!(resolve_status(computed(-1), rule), ReminderStatus::Overdue);
        assert_eq!(resolve_status(computed(0), rule), ReminderStatus::DueToday);
        assert_eq!(resolve_status(computed(1), rule), ReminderStatus::UpcomingSoon);
        assert_eq!(resolve_status(computed(3), rule), ReminderStatus::UpcomingSoon);
        assert_eq!(resolve_status(computed(4), rule), ReminderStatus::Upcoming);
    }

    #[test]
    fn basic_rule_never_misses() {
        let rule = StatusRule::Basic;
        assert_eq!(resolve_status(computed(-10), rule), ReminderStatus::Overdue);
        assert_eq!(resolve_status(computed(-400), rule), ReminderStatus::Overdue);
        assert_eq!(resolve_status(computed(2), rule), ReminderStatus::UpcomingSoon);
    }

    #[test]
    fn partial_days_truncate_toward_zero() {
        let source = StatusSource::Computed {
            due: now() - Duration::hours(20),
            now: now(),
        };
        assert_eq!(resolve_status(source, StatusRule::Extended), ReminderStatus::DueToday);
    }

    #[test]
    fn manual_override_wins() {
        let mut r = reminder(-30);
        r.manual_status = Some(ReminderStatus::Completed);
        assert_eq!(status_of(&r, now(), StatusRule::Extended), ReminderStatus::Completed);
        r.manual_status = Some(ReminderStatus::Cancelled);
        assert_eq!(status_of(&r, now(), StatusRule::Basic), ReminderStatus::Cancelled);
    }

    #[test]
    fn triggers_skip_past_lead_times() {
        let mut r = reminder(5);
        r.notify_before_days = vec![7, 3, 0];
        let triggers = notification_triggers(&r, now());
        let leads: Vec<u32> = triggers.iter().map(|t| t.lead_days).collect();
        assert_eq!(leads, vec![3, 0]);
        assert_eq!(triggers[0].delay, std::time::Duration::from_secs(2 * 86_400));
    }

    #[test]
    fn triggers_default_to_due_time() {
        let r = reminder(1);
        let triggers = notification_triggers(&r, now());
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].delay, std::time::Duration::from_secs(86_400));
    }

    #[test]
    fn inactive_or_pinned_reminders_do_not_fire() {
        let mut r = reminder(2);
        r.active = false;
        assert!(notification_triggers(&r, now()).is_empty());
        r.active = true;
        r.manual_status = Some(ReminderStatus::Cancelled);
        assert!(notification_triggers(&r, now()).is_empty());
    }

    #[test]
    fn repeating_reminder_rolls_forward() {
        let mut r = reminder(0);
        r.repeat_interval_days = Some(90);
        r.manual_status = Some(ReminderStatus::Completed);
        let next = next_occurrence(&r).expect("repeats");
        assert_eq!(next.due_date, r.due_date + Duration::days(90));
        assert!(next.id.is_empty());
        assert_eq!(next.manual_status, None);

        r.repeat_interval_days = None;
        assert!(next_occurrence(&r).is_none());
    }

    #[test]
    fn out_of_range_dates_are_dropped() {
        let mut r = reminder(5);
        r.notify_before_days = vec![4_000_000_000, 1];
        let leads: Vec<u32> = notification_triggers(&r, now()).iter().map(|t| t.lead_days).collect();
        assert_eq!(leads, vec![1]);

        r.repeat_interval_days = Some(4_000_000_000);
        assert!(next_occurrence(&r).is_none());
    }
}
