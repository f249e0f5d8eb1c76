use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use garagebook::database::DocumentStore;
use garagebook::notify::{NotificationChannel, ReminderScheduler};
use garagebook::poi::{BlockingPoiClient, PoiClient};
use garagebook::viewmodel::AppContext;
use garagebook::{
    Config, Database, Profile,
    cli::{self, Cli, Commands},
};

fn main() -> Result<()> {
    color_eyre::install()?;
    garagebook::logging::init_tracing();

    let cli = Cli::parse();

    // --dev keeps a separate config and database
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };
    let config = Config::load_with_profile(profile)?;

    let db_path = config.get_database_path();
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
    )?;
    let store: Rc<dyn DocumentStore> = Rc::new(db);

    // Timers and HTTP run here; the UI thread only blocks on shop searches
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let (channel, notifications) = NotificationChannel::new(config.reminders.channel_name.clone());
    let scheduler = ReminderScheduler::new(runtime.handle().clone(), channel.clone());
    let poi_client = PoiClient::new(
        config.shops.endpoint.clone(),
        Duration::from_secs(config.shops.timeout_secs),
    )?;

    let ctx = AppContext::new(store, &config)
        .with_shop_finder(Box::new(BlockingPoiClient::new(poi_client, runtime.handle().clone())))
        .with_notifications(channel, Some(scheduler));

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = garagebook::tui::App::new(config, ctx, Some(notifications));
            garagebook::tui::run_event_loop(app)?;
        }
        command => {
            let output = cli::run(command, &ctx)?;
            if !output.is_empty() {
                println!("{}", output);
            }
        }
    }

    Ok(())
}
