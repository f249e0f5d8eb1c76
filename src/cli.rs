use chrono::Utc;
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::auth::AuthError;
use crate::efficiency;
use crate::models::{FuelLog, MaintenanceRecord, Reminder, User, Vehicle};
use crate::poi::{self, PoiError, PoiQuery};
use crate::reminder;
use crate::repository::RepositoryError;
use crate::utils::{get_current_date_string, parse_date, parse_due_date};
use crate::validation::{self, FieldCheck};
use crate::viewmodel::AppContext;
use crate::viewmodel::garage::vehicle_row;

#[derive(Parser)]
#[command(name = "garagebook")]
#[command(about = "Vehicle maintenance log - services, fuel, reminders and nearby shops")]
#[command(version)]
pub struct Cli {
    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in to an existing account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Request or apply a password reset code
    ResetPassword {
        #[command(subcommand)]
        action: ResetAction,
    },
    /// Quickly add a vehicle
    AddVehicle {
        /// Display name, e.g. "Daily driver"
        name: String,
        #[arg(long)]
        make: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value = "")]
        plate: String,
        /// Current odometer reading in km
        #[arg(long, default_value_t = 0)]
        mileage: i64,
    },
    /// List your vehicles
    Vehicles,
    /// Log a maintenance event
    AddMaintenance {
        /// Vehicle name or id
        vehicle: String,
        /// Kind of work, e.g. "Oil change"
        record_type: String,
        #[arg(long)]
        cost: f64,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Odometer reading, defaults to the vehicle's mileage
        #[arg(long)]
        mileage: Option<i64>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Log a fuel fill-up
    AddFuel {
        /// Vehicle name or id
        vehicle: String,
        /// Litres added
        #[arg(long)]
        litres: f64,
        #[arg(long)]
        cost: f64,
        #[arg(long)]
        odometer: f64,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Show fuel efficiency for a vehicle
    Efficiency {
        /// Vehicle name or id
        vehicle: String,
    },
    /// Set a reminder
    AddReminder {
        /// Vehicle name or id
        vehicle: String,
        /// What is due, e.g. "MOT"
        reminder_type: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,
        /// Repeat every N days once completed
        #[arg(long)]
        repeat_days: Option<u32>,
        /// Comma-separated lead times in days, defaults to the configured ones
        #[arg(long)]
        notify_before: Option<String>,
        /// Also due at this odometer reading
        #[arg(long)]
        odometer: Option<i64>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List reminders with their current status
    Reminders,
    /// Search for repair shops around a location
    Shops {
        /// Defaults to the configured home location
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Search radius in metres
        #[arg(long)]
        radius: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum ResetAction {
    /// Issue a one-hour reset code
    Request {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with a reset code
    Apply {
        #[arg(long)]
        token: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    AuthError(#[from] AuthError),
    #[error("Failed to save: {0}")]
    RepositoryError(#[from] RepositoryError),
    #[error("Shop search failed: {0}")]
    PoiError(#[from] PoiError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("No vehicle named or with id '{0}'")]
    VehicleNotFound(String),
    #[error("Shop search is not available")]
    ShopSearchUnavailable,
}

fn check(result: FieldCheck) -> Result<(), CliError> {
    match result.message {
        Some(message) if !result.valid => Err(CliError::InvalidInput(message)),
        _ => Ok(()),
    }
}

fn date_or_today(date: Option<String>) -> Result<String, CliError> {
    match date {
        Some(d) => {
            parse_date(&d).map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", d, e)))?;
            Ok(d)
        }
        None => Ok(get_current_date_string()),
    }
}

/// Resolve a vehicle the signed-in user owns by id or case-insensitive name
fn find_vehicle(ctx: &AppContext, user: &User, key: &str) -> Result<Vehicle, CliError> {
    let vehicles = ctx.repos.vehicles.list_for(&user.id);
    vehicles
        .iter()
        .find(|v| v.id == key)
        .or_else(|| vehicles.iter().find(|v| v.name.eq_ignore_ascii_case(key)))
        .cloned()
        .ok_or_else(|| CliError::VehicleNotFound(key.to_string()))
}

/// Run one non-interactive command and return what to print
pub fn run(command: Commands, ctx: &AppContext) -> Result<String, CliError> {
    match command {
        Commands::Tui => Ok(String::new()),
        Commands::Signup {
            first_name,
            last_name,
            email,
            password,
        } => handle_signup(&first_name, &last_name, &email, &password, ctx),
        Commands::Login { email, password } => handle_login(&email, &password, ctx),
        Commands::Logout => handle_logout(ctx),
        Commands::Whoami => handle_whoami(ctx),
        Commands::ResetPassword { action } => handle_reset_password(action, ctx),
        Commands::AddVehicle {
            name,
            make,
            model,
            year,
            plate,
            mileage,
        } => handle_add_vehicle(
            Vehicle {
                id: String::new(),
                name,
                make,
                model,
                year,
                license_plate: plate,
                mileage,
                user_id: String::new(),
            },
            ctx,
        ),
        Commands::Vehicles => handle_vehicles(ctx),
        Commands::AddMaintenance {
            vehicle,
            record_type,
            cost,
            date,
            mileage,
            notes,
        } => handle_add_maintenance(&vehicle, record_type, cost, date, mileage, notes, ctx),
        Commands::AddFuel {
            vehicle,
            litres,
            cost,
            odometer,
            date,
            notes,
        } => handle_add_fuel(&vehicle, litres, cost, odometer, date, notes, ctx),
        Commands::Efficiency { vehicle } => handle_efficiency(&vehicle, ctx),
        Commands::AddReminder {
            vehicle,
            reminder_type,
            due,
            repeat_days,
            notify_before,
            odometer,
            notes,
        } => handle_add_reminder(
            &vehicle,
            ReminderInput {
                reminder_type,
                due,
                repeat_days,
                notify_before,
                odometer,
                notes,
            },
            ctx,
        ),
        Commands::Reminders => handle_reminders(ctx),
        Commands::Shops { lat, lon, radius } => handle_shops(lat, lon, radius, ctx),
    }
}

pub fn handle_signup(
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    ctx: &AppContext,
) -> Result<String, CliError> {
    check(validation::validate_name(first_name, "First name"))?;
    check(validation::validate_name(last_name, "Last name"))?;
    check(validation::validate_email(email))?;
    let user = ctx.auth.sign_up(first_name, last_name, email, password)?;
    Ok(format!("Account created, signed in as {}", user.email))
}

pub fn handle_login(email: &str, password: &str, ctx: &AppContext) -> Result<String, CliError> {
    let user = ctx.auth.sign_in(email, password)?;
    Ok(format!("Signed in as {}", user.email))
}

pub fn handle_logout(ctx: &AppContext) -> Result<String, CliError> {
    ctx.auth.sign_out()?;
    Ok("Signed out".to_string())
}

pub fn handle_whoami(ctx: &AppContext) -> Result<String, CliError> {
    let user = ctx.auth.require_user()?;
    Ok(format!("{} <{}>", user.display_name(), user.email))
}

/// Without a mail transport the reset code is printed to the terminal
pub fn handle_reset_password(action: ResetAction, ctx: &AppContext) -> Result<String, CliError> {
    match action {
        ResetAction::Request { email } => {
            let token = ctx.auth.request_password_reset(&email)?;
            Ok(match token {
                Some(token) => format!("Reset code for {}: {} (valid for one hour)", email, token),
                None => format!("If an account exists for {}, a reset code has been issued", email),
            })
        }
        ResetAction::Apply { token, password } => {
            ctx.auth.reset_password(&token, &password)?;
            Ok("Password updated, sign in with the new password".to_string())
        }
    }
}

pub fn handle_add_vehicle(mut vehicle: Vehicle, ctx: &AppContext) -> Result<String, CliError> {
    let user = ctx.auth.require_user()?;
    check(validation::validate_required(&vehicle.name, "Name"))?;
    check(validation::validate_required(&vehicle.make, "Make"))?;
    check(validation::validate_required(&vehicle.model, "Model"))?;
    if let Some(year) = vehicle.year {
        check(validation::validate_year(&year.to_string()))?;
    }
    check(validation::validate_whole_number(&vehicle.mileage.to_string(), "Mileage"))?;

    vehicle.user_id = user.id;
    vehicle.license_plate = vehicle.license_plate.trim().to_uppercase();
    let id = ctx.repos.vehicles.add(&vehicle)?;
    Ok(format!("Vehicle created successfully (ID: {})", id))
}

pub fn handle_vehicles(ctx: &AppContext) -> Result<String, CliError> {
    let user = ctx.auth.require_user()?;
    let mut vehicles = ctx.repos.vehicles.list_for(&user.id);
    if vehicles.is_empty() {
        return Ok("No vehicles yet".to_string());
    }
    vehicles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(vehicles
        .iter()
        .map(|v| format!("{}  {}", v.id, vehicle_row(v)))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn handle_add_maintenance(
    vehicle: &str,
    record_type: String,
    cost: f64,
    date: Option<String>,
    mileage: Option<i64>,
    notes: String,
    ctx: &AppContext,
) -> Result<String, CliError> {
    let user = ctx.auth.require_user()?;
    let mut vehicle = find_vehicle(ctx, &user, vehicle)?;
    check(validation::validate_required(&record_type, "Type"))?;
    check(validation::validate_amount(&cost.to_string(), "Cost"))?;
    let mileage = mileage.unwrap_or(vehicle.mileage);
    check(validation::validate_whole_number(&mileage.to_string(), "Mileage"))?;

    let record = MaintenanceRecord {
        id: String::new(),
        record_type,
        date: date_or_today(date)?,
        mileage,
        cost,
        notes,
        vehicle_id: vehicle.id.clone(),
    };
    let id = ctx.repos.maintenance.add(&record)?;

    if mileage > vehicle.mileage {
        vehicle.mileage = mileage;
        ctx.repos.vehicles.update(&vehicle)?;
    }
    Ok(format!("Maintenance record created successfully (ID: {})", id))
}

pub fn handle_add_fuel(
    vehicle: &str,
    litres: f64,
    cost: f64,
    odometer: f64,
    date: Option<String>,
    notes: String,
    ctx: &AppContext,
) -> Result<String, CliError> {
    let user = ctx.auth.require_user()?;
    let vehicle = find_vehicle(ctx, &user, vehicle)?;
    check(validation::validate_amount(&litres.to_string(), "Litres"))?;
    check(validation::validate_amount(&cost.to_string(), "Cost"))?;
    check(validation::validate_amount(&odometer.to_string(), "Odometer"))?;

    let log = FuelLog {
        id: String::new(),
        vehicle_id: vehicle.id,
        amount: litres,
        cost,
        date: date_or_today(date)?,
        odometer,
        notes,
    };
    let id = ctx.repos.fuel_logs.add(&log)?;
    Ok(format!("Fill-up logged successfully (ID: {})", id))
}

pub fn handle_efficiency(vehicle: &str, ctx: &AppContext) -> Result<String, CliError> {
    let user = ctx.auth.require_user()?;
    let vehicle = find_vehicle(ctx, &user, vehicle)?;
    let logs = ctx.repos.fuel_logs.list_for(&vehicle.id);
    let e = efficiency::calculate(&logs);
    if e.total_distance <= 0.0 {
        return Ok(format!("{}: not enough fill-ups to compute efficiency", vehicle.name));
    }
    Ok(format!(
        "{}: {:.2} km/L, {:.3} per km over {:.0} km ({} fill-ups)",
        vehicle.name,
        e.km_per_litre,
        e.cost_per_km,
        e.total_distance,
        logs.len()
    ))
}

/// Reminder fields as given on the command line
pub struct ReminderInput {
    pub reminder_type: String,
    pub due: String,
    pub repeat_days: Option<u32>,
    pub notify_before: Option<String>,
    pub odometer: Option<i64>,
    pub notes: String,
}

pub fn handle_add_reminder(vehicle: &str, input: ReminderInput, ctx: &AppContext) -> Result<String, CliError> {
    let user = ctx.auth.require_user()?;
    let vehicle = find_vehicle(ctx, &user, vehicle)?;
    check(validation::validate_required(&input.reminder_type, "Type"))?;
    let due_date = parse_due_date(&input.due)
        .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", input.due, e)))?;
    let notify_before_days = match input.notify_before {
        Some(days) => validation::parse_lead_days(&days).map_err(CliError::InvalidInput)?,
        None => ctx.reminders.default_lead_days.clone(),
    };
    if input.repeat_days.is_some_and(|d| d > validation::MAX_DAYS) {
        return Err(CliError::InvalidInput(format!(
            "Repeat interval cannot exceed {} days",
            validation::MAX_DAYS
        )));
    }

    let reminder = Reminder {
        id: String::new(),
        user_id: user.id,
        vehicle_id: vehicle.id,
        reminder_type: input.reminder_type,
        due_date,
        odometer_threshold: input.odometer,
        notes: input.notes,
        active: true,
        repeat_interval_days: input.repeat_days.filter(|d| *d > 0),
        notify_before_days,
        manual_status: None,
    };
    let id = ctx.repos.reminders.add(&reminder)?;
    let status = reminder::status_of(&reminder, Utc::now(), ctx.reminders.status_rule);
    Ok(format!("Reminder created successfully (ID: {}, {})", id, status.label()))
}

pub fn handle_reminders(ctx: &AppContext) -> Result<String, CliError> {
    let user = ctx.auth.require_user()?;
    let vehicles = ctx.repos.vehicles.list_for(&user.id);
    let mut reminders = ctx.repos.reminders.list_for(&user.id);
    if reminders.is_empty() {
        return Ok("No reminders set".to_string());
    }
    reminders.sort_by_key(|r| r.due_date);

    let now = Utc::now();
    Ok(reminders
        .iter()
        .map(|r| {
            let vehicle = vehicles
                .iter()
                .find(|v| v.id == r.vehicle_id)
                .map(|v| v.name.as_str())
                .unwrap_or("-");
            format!(
                "{}  {:<14} {:<16} {}",
                r.due_date.format("%Y-%m-%d"),
                reminder::status_of(r, now, ctx.reminders.status_rule).label(),
                r.reminder_type,
                vehicle
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn handle_shops(
    lat: Option<f64>,
    lon: Option<f64>,
    radius: Option<u32>,
    ctx: &AppContext,
) -> Result<String, CliError> {
    let (lat, lon) = match (lat, lon, ctx.shops.home()) {
        (Some(lat), Some(lon), _) => (lat, lon),
        (None, None, Some(home)) => home,
        _ => {
            return Err(CliError::InvalidInput(
                "Pass --lat and --lon, or set [shops] home_lat/home_lon in the config".to_string(),
            ));
        }
    };
    check(validation::validate_latitude(&lat.to_string()))?;
    check(validation::validate_longitude(&lon.to_string()))?;

    let finder = ctx.shop_finder.as_ref().ok_or(CliError::ShopSearchUnavailable)?;
    let query = PoiQuery::new(&ctx.shops.tag, radius.unwrap_or(ctx.shops.radius_m), lat, lon)?;
    let mut shops = finder.find(&query)?;
    if shops.is_empty() {
        return Ok(format!("No shops found within {} m", query.radius_m));
    }
    poi::sort_by_distance(&mut shops, lat, lon);
    Ok(shops
        .iter()
        .map(|s| {
            let address = s.address().map(|a| format!("  {}", a)).unwrap_or_default();
            format!("{:>6.2} km  {}{}", poi::distance_km(lat, lon, s.lat, s.lon), s.name, address)
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Duration;

    use super::*;
    use crate::models::Poi;
    use crate::poi::ShopFinder;
    use crate::viewmodel::testing;

    fn add_panda(ctx: &AppContext) -> String {
        handle_add_vehicle(
            Vehicle {
                id: String::new(),
                name: "Runabout".to_string(),
                make: "Fiat".to_string(),
                model: "Panda".to_string(),
                year: Some(2012),
                license_plate: " ab12 cde ".to_string(),
                mileage: 1000,
                user_id: String::new(),
            },
            ctx,
        )
        .unwrap()
    }

    #[test]
    fn commands_need_a_session() {
        let ctx = testing::context();
        let err = handle_vehicles(&ctx).unwrap_err();
        assert_eq!(err.to_string(), "Not signed in");
    }

    #[test]
    fn signup_then_whoami() {
        let ctx = testing::context();
        let out = handle_signup("Ada", "Lovelace", "ada@example.com", "Secret12!", &ctx).unwrap();
        assert_eq!(out, "Account created, signed in as ada@example.com");
        assert!(handle_whoami(&ctx).unwrap().contains("<ada@example.com>"));
        handle_logout(&ctx).unwrap();
        assert!(handle_whoami(&ctx).is_err());
    }

    #[test]
    fn signup_rejects_bad_email() {
        let ctx = testing::context();
        let err = handle_signup("Ada", "Lovelace", "not-an-email", "Secret12!", &ctx).unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[test]
    fn add_vehicle_normalizes_plate() {
        let (ctx, user) = testing::signed_in_context();
        let out = add_panda(&ctx);
        assert!(out.starts_with("Vehicle created successfully (ID: "));
        let vehicles = ctx.repos.vehicles.list_for(&user.id);
        assert_eq!(vehicles[0].license_plate, "AB12 CDE");
        assert_eq!(vehicles[0].user_id, user.id);
    }

    #[test]
    fn maintenance_bumps_odometer_and_finds_vehicle_by_name() {
        let (ctx, user) = testing::signed_in_context();
        add_panda(&ctx);
        handle_add_maintenance(
            "runabout",
            "Oil change".to_string(),
            89.5,
            Some("2024-05-01".to_string()),
            Some(1500),
            String::new(),
            &ctx,
        )
        .unwrap();
        let vehicle = &ctx.repos.vehicles.list_for(&user.id)[0];
        assert_eq!(vehicle.mileage, 1500);
        assert_eq!(ctx.repos.maintenance.list_for(&vehicle.id).len(), 1);
    }

    #[test]
    fn unknown_vehicle_is_reported() {
        let (ctx, _) = testing::signed_in_context();
        let err = handle_efficiency("Batmobile", &ctx).unwrap_err();
        assert_eq!(err.to_string(), "No vehicle named or with id 'Batmobile'");
    }

    #[test]
    fn bad_date_is_rejected() {
        let (ctx, _) = testing::signed_in_context();
        add_panda(&ctx);
        let err = handle_add_fuel("Runabout", 40.0, 60.0, 1000.0, Some("01/05/2024".into()), String::new(), &ctx)
            .unwrap_err();
        assert!(matches!(err, CliError::DateParseError(_)));
    }

    #[test]
    fn efficiency_after_two_fill_ups() {
        let (ctx, _) = testing::signed_in_context();
        add_panda(&ctx);
        assert_eq!(
            handle_efficiency("Runabout", &ctx).unwrap(),
            "Runabout: not enough fill-ups to compute efficiency"
        );
        handle_add_fuel("Runabout", 30.0, 45.0, 1000.0, None, String::new(), &ctx).unwrap();
        handle_add_fuel("Runabout", 40.0, 60.0, 1500.0, None, String::new(), &ctx).unwrap();
        assert_eq!(
            handle_efficiency("Runabout", &ctx).unwrap(),
            "Runabout: 12.50 km/L, 0.120 per km over 500 km (2 fill-ups)"
        );
    }

    #[test]
    fn reminders_use_configured_lead_days() {
        let (ctx, user) = testing::signed_in_context();
        add_panda(&ctx);
        let due = (Utc::now() + Duration::days(30)).format("%Y-%m-%d").to_string();
        let out = handle_add_reminder(
            "Runabout",
            ReminderInput {
                reminder_type: "MOT".to_string(),
                due,
                repeat_days: Some(0),
                notify_before: None,
                odometer: None,
                notes: String::new(),
            },
            &ctx,
        )
        .unwrap();
        assert!(out.ends_with(", Upcoming)"));

        let reminder = &ctx.repos.reminders.list_for(&user.id)[0];
        assert_eq!(reminder.notify_before_days, ctx.reminders.default_lead_days);
        assert_eq!(reminder.repeat_interval_days, None);

        let listing = handle_reminders(&ctx).unwrap();
        assert!(listing.contains("MOT"));
        assert!(listing.contains("Runabout"));
    }

    #[test]
    fn oversized_day_counts_are_rejected() {
        let (ctx, user) = testing::signed_in_context();
        add_panda(&ctx);
        let input = |repeat_days: Option<u32>, notify_before: Option<&str>| ReminderInput {
            reminder_type: "MOT".to_string(),
            due: "2031-01-01".to_string(),
            repeat_days,
            notify_before: notify_before.map(str::to_string),
            odometer: None,
            notes: String::new(),
        };

        let err = handle_add_reminder("Runabout", input(Some(4_000_000_000), None), &ctx).unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(m) if m == "Repeat interval cannot exceed 36500 days"));
        let err = handle_add_reminder("Runabout", input(None, Some("4000000000")), &ctx).unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(m) if m == "Lead time cannot exceed 36500 days"));
        assert!(ctx.repos.reminders.list_for(&user.id).is_empty());
    }

    #[test]
    fn reset_code_round_trip() {
        let (ctx, _) = testing::signed_in_context();
        let out = handle_reset_password(
            ResetAction::Request {
                email: "driver@example.com".to_string(),
            },
            &ctx,
        )
        .unwrap();
        let token = out
            .split(": ")
            .nth(1)
            .and_then(|rest| rest.split(' ').next())
            .unwrap()
            .to_string();
        handle_reset_password(
            ResetAction::Apply {
                token,
                password: "Changed34!".to_string(),
            },
            &ctx,
        )
        .unwrap();
        assert!(handle_login("driver@example.com", "Changed34!", &ctx).is_ok());
    }

    struct OneShop;

    impl ShopFinder for OneShop {
        fn find(&self, _query: &PoiQuery) -> Result<Vec<Poi>, PoiError> {
            Ok(vec![Poi {
                id: 7,
                name: "Corner Garage".to_string(),
                lat: 51.501,
                lon: -0.12,
                tags: BTreeMap::new(),
            }])
        }
    }

    #[test]
    fn shops_need_a_location() {
        let ctx = testing::context().with_shop_finder(Box::new(OneShop));
        assert!(matches!(handle_shops(None, None, None, &ctx), Err(CliError::InvalidInput(_))));
        let out = handle_shops(Some(51.5), Some(-0.12), None, &ctx).unwrap();
        assert!(out.contains("Corner Garage"));
    }

    #[test]
    fn shops_without_finder() {
        let ctx = testing::context();
        assert!(matches!(
            handle_shops(Some(51.5), Some(-0.12), Some(1000), &ctx),
            Err(CliError::ShopSearchUnavailable)
        ));
    }
}
