//! Local notifications and delayed reminder delivery.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::models::Reminder;
use crate::reminder::notification_triggers;

/// A delivered notification
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub channel: String,
    pub title: String,
    pub body: String,
}

/// Named channel that notifications are posted to.
///
/// The channel itself is registered on first post. Cloning shares the
/// underlying sender so timer tasks can post from any thread.
#[derive(Debug, Clone)]
pub struct NotificationChannel {
    name: String,
    sender: UnboundedSender<Notification>,
    created: Arc<OnceLock<()>>,
}

impl NotificationChannel {
    pub fn new(name: impl Into<String>) -> (Self, UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let channel = Self {
            name: name.into(),
            sender,
            created: Arc::new(OnceLock::new()),
        };
        (channel, receiver)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_created(&self) -> bool {
        self.created.get().is_some()
    }

    /// Post a notification. Failures are logged and dropped.
    pub fn post(&self, title: impl Into<String>, body: impl Into<String>) -> Option<Uuid> {
        self.created.get_or_init(|| {
            tracing::info!(channel = %self.name, "notification channel created");
        });

        let notification = Notification {
            id: Uuid::new_v4(),
            channel: self.name.clone(),
            title: title.into(),
            body: body.into(),
        };
        let id = notification.id;
        tracing::info!(channel = %self.name, %id, title = %notification.title, "notification posted");
        match self.sender.send(notification) {
            Ok(()) => Some(id),
            Err(e) => {
                tracing::warn!(channel = %self.name, error = %e, "notification dropped");
                None
            }
        }
    }
}

/// Spawns one-shot timers that post reminder notifications.
///
/// Timers are tracked per reminder id so an edit replaces the pending ones.
pub struct ReminderScheduler {
    handle: Handle,
    channel: NotificationChannel,
    pending: RefCell<HashMap<String, Vec<AbortHandle>>>,
}

fn notification_text(reminder: &Reminder, lead_days: u32) -> (String, String) {
    let title = format!("Reminder: {}", reminder.reminder_type);
    let due = reminder.due_date.format("%Y-%m-%d");
    let body = match lead_days {
        0 => format!("Due now ({})", due),
        1 => format!("Due tomorrow ({})", due),
        n => format!("Due in {} days ({})", n, due),
    };
    (title, body)
}

impl ReminderScheduler {
    pub fn new(handle: Handle, channel: NotificationChannel) -> Self {
        Self {
            handle,
            channel,
            pending: RefCell::new(HashMap::new()),
        }
    }

    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    /// Schedule every future trigger of `reminder`, replacing timers already
    /// pending for it. Returns how many timers were started.
    pub fn schedule(&self, reminder: &Reminder, now: DateTime<Utc>) -> usize {
        self.cancel(&reminder.id);
        self.forget_finished();

        let triggers = notification_triggers(reminder, now);
        let mut handles = Vec::with_capacity(triggers.len());
        for trigger in &triggers {
            let channel = self.channel.clone();
            let (title, body) = notification_text(reminder, trigger.lead_days);
            let delay = trigger.delay;
            tracing::debug!(
                reminder_id = %reminder.id,
                lead_days = trigger.lead_days,
                delay_secs = delay.as_secs(),
                "scheduling reminder notification"
            );
            let task = self.handle.spawn(async move {
                tokio::time::sleep(delay).await;
                channel.post(title, body);
            });
            handles.push(task.abort_handle());
        }
        if !handles.is_empty() {
            self.pending.borrow_mut().insert(reminder.id.clone(), handles);
        }
        triggers.len()
    }

    pub fn schedule_all<'a>(&self, reminders: impl IntoIterator<Item = &'a Reminder>, now: DateTime<Utc>) -> usize {
        reminders.into_iter().map(|r| self.schedule(r, now)).sum()
    }

    /// Drop pending timers for one reminder
    pub fn cancel(&self, reminder_id: &str) {
        if let Some(handles) = self.pending.borrow_mut().remove(reminder_id) {
            tracing::debug!(reminder_id, count = handles.len(), "cancelling reminder timers");
            handles.iter().for_each(AbortHandle::abort);
        }
    }

    /// Release handles of timers that already fired
    fn forget_finished(&self) {
        self.pending.borrow_mut().retain(|_, handles| {
            handles.retain(|h| !h.is_finished());
            !handles.is_empty()
        });
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .borrow()
            .values()
            .flatten()
            .filter(|h| !h.is_finished())
            .count()
    }

    pub fn stop(&self) {
        for (_, handles) in self.pending.borrow_mut().drain() {
            handles.iter().for_each(AbortHandle::abort);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reminder(due: DateTime<Utc>) -> Reminder {
        Reminder {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            vehicle_id: "v1".to_string(),
            reminder_type: "Inspection".to_string(),
            due_date: due,
            odometer_threshold: None,
            notes: String::new(),
            active: true,
            repeat_interval_days: None,
            notify_before_days: Vec::new(),
            manual_status: None,
        }
    }

    #[test]
    fn channel_is_created_on_first_post() {
        let (channel, mut rx) = NotificationChannel::new("maintenance");
        assert!(!channel.is_created());
        let first = channel.post("Title", "Body").unwrap();
        let second = channel.post("Title", "Body").unwrap();
        assert!(channel.is_created());
        assert_ne!(first, second);

        let delivered = rx.try_recv().unwrap();
        assert_eq!(delivered.id, first);
        assert_eq!(delivered.channel, "maintenance");
    }

    #[test]
    fn post_after_receiver_dropped_is_swallowed() {
        let (channel, rx) = NotificationChannel::new("maintenance");
        drop(rx);
        assert_eq!(channel.post("Title", "Body"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_posts_after_delay() {
        let (channel, mut rx) = NotificationChannel::new("maintenance");
        let scheduler = ReminderScheduler::new(Handle::current(), channel);
        let now = Utc::now();
        let mut r = reminder(now + Duration::days(2));
        r.notify_before_days = vec![1, 0];

        assert_eq!(scheduler.schedule(&r, now), 2);
        assert!(rx.try_recv().is_err());

        let first = rx.recv().await.unwrap();
        assert!(first.body.starts_with("Due tomorrow"));
        let second = rx.recv().await.unwrap();
        assert!(second.body.starts_with("Due now"));
    }

    #[tokio::test(start_paused = true)]
    async fn fired_timers_are_forgotten() {
        let (channel, mut rx) = NotificationChannel::new("maintenance");
        let scheduler = ReminderScheduler::new(Handle::current(), channel);
        let now = Utc::now();
        let mut first = reminder(now + Duration::hours(1));
        first.notify_before_days = vec![0];
        scheduler.schedule(&first, now);
        rx.recv().await.unwrap();
        tokio::task::yield_now().await;

        let mut second = reminder(now + Duration::days(5));
        second.id = "r2".to_string();
        second.notify_before_days = vec![1];
        scheduler.schedule(&second, now);

        let pending = scheduler.pending.borrow();
        assert!(!pending.contains_key("r1"));
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_pending_timers() {
        let (channel, mut rx) = NotificationChannel::new("maintenance");
        let scheduler = ReminderScheduler::new(Handle::current(), channel);
        let now = Utc::now();
        let mut r = reminder(now + Duration::days(3));
        r.notify_before_days = vec![2, 1];
        assert_eq!(scheduler.schedule(&r, now), 2);

        r.notify_before_days = vec![0];
        r.reminder_type = "Inspection (moved)".to_string();
        assert_eq!(scheduler.schedule(&r, now), 1);
        assert_eq!(scheduler.pending_count(), 1);

        let only = rx.recv().await.unwrap();
        assert_eq!(only.title, "Reminder: Inspection (moved)");
        assert!(only.body.starts_with("Due now"));

        scheduler.cancel(&r.id);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn past_reminders_schedule_nothing() {
        let (channel, _rx) = NotificationChannel::new("maintenance");
        let scheduler = ReminderScheduler::new(Handle::current(), channel);
        let now = Utc::now();
        assert_eq!(scheduler.schedule(&reminder(now - Duration::days(1)), now), 0);
    }
}
