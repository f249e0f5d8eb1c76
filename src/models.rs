use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub license_plate: String,
    pub mileage: i64,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    #[serde(default)]
    pub id: String,
    pub record_type: String,
    pub date: String, // YYYY-MM-DD, kept as text
    pub mileage: i64,
    pub cost: f64,
    #[serde(default)]
    pub notes: String,
    pub vehicle_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelLog {
    #[serde(default)]
    pub id: String,
    pub vehicle_id: String,
    pub amount: f64, // litres
    pub cost: f64,
    pub date: String,
    pub odometer: f64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderStatus {
    Overdue,
    DueToday,
    UpcomingSoon,
    Upcoming,
    Completed,
    Cancelled,
    Missed,
}

impl ReminderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReminderStatus::Overdue => "Overdue",
            ReminderStatus::DueToday => "Due today",
            ReminderStatus::UpcomingSoon => "Upcoming soon",
            ReminderStatus::Upcoming => "Upcoming",
            ReminderStatus::Completed => "Completed",
            ReminderStatus::Cancelled => "Cancelled",
            ReminderStatus::Missed => "Missed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub vehicle_id: String,
    pub reminder_type: String,
    pub due_date: DateTime<Utc>,
    pub odometer_threshold: Option<i64>,
    #[serde(default)]
    pub notes: String,
    pub active: bool,
    pub repeat_interval_days: Option<u32>,
    #[serde(default)]
    pub notify_before_days: Vec<u32>,
    pub manual_status: Option<ReminderStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub signed_in_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordReset {
    #[serde(default)]
    pub id: String, // the token
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// A point of interest returned by the nearby shop search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Poi {
    /// Street address assembled from `addr:*` tags, if any are present
    pub fn address(&self) -> Option<String> {
        let street = self.tags.get("addr:street")?;
        let number = self.tags.get("addr:housenumber");
        let city = self.tags.get("addr:city");
        let mut out = match number {
            Some(n) => format!("{} {}", n, street),
            None => street.clone(),
        };
        if let Some(city) = city {
            out.push_str(", ");
            out.push_str(city);
        }
        Some(out)
    }
}
