//! Prints the tasks stored in a Firestore database.
//!
//! Usage: `agenda [today|YYYY-MM-DD]`. Without argument, every task is printed.
//! The database is read from the `SECOND_BRAIN_*` environment variables (see `Settings::from_env`).
//! Set the RUST_LOG environment variable to display more info.

use chrono::NaiveDate;

use second_brain::calendar::selected_day;
use second_brain::config::Settings;
use second_brain::store::FirestoreClient;
use second_brain::utils::print_task_list;
use second_brain::TaskSync;

#[tokio::main]
async fn main() {
    env_logger::init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Invalid settings: {}", err);
            std::process::exit(2);
        },
    };
    let client = match FirestoreClient::from_settings(&settings) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("Unable to create a client: {}", err);
            std::process::exit(2);
        },
    };
    let sync = TaskSync::with_collection(client, &settings.collection);

    let result = match std::env::args().nth(1).as_deref() {
        None => sync.load_all().await,
        Some("today") => sync.load_day(selected_day(&chrono::Local::now())).await,
        Some(day) => match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            Ok(day) => sync.load_day(day).await,
            Err(err) => {
                eprintln!("Invalid day {:?}: {}", day, err);
                std::process::exit(2);
            },
        },
    };

    if let Err(err) = result {
        eprintln!("Unable to load tasks: {}", err);
        std::process::exit(1);
    }
    print_task_list(&sync.state(), &settings.default_filter);
}
