use attendance_portal::cli::{Cli, Command};
use attendance_portal::models::SectionKey;
use attendance_portal::settings::Settings;
use attendance_portal::{Result, create_default_manager, display, web};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("tracing init failed: {e}");
    }

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let mut manager = create_default_manager(&settings)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => actix_web::rt::System::new().block_on(web::serve(settings, manager)),
        Command::Migrate => {
            tracing::info!(database = %settings.database_url, "database is up to date");
            Ok(())
        }
        Command::Roster {
            sem,
            stream,
            division,
        } => display::show_roster(&mut manager, &SectionKey::new(sem, stream, division)),
        Command::Summary { email } => display::show_student_summary(&mut manager, &email),
    }
}
