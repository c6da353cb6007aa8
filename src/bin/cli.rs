use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};
use dotenvy::dotenv;

use timetabler::modules::timetable::service::SlotManager;
use timetabler_auth::create_access_token;
use timetabler_config::{JwtConfig, StoreBackend, StoreConfig, TimetableConfig};
use timetabler_models::{Role, fallback_subjects};
use timetabler_store::Stores;

#[derive(Parser)]
#[command(name = "timetabler-cli")]
#[command(about = "Timetabler CLI - Administrative tools for Timetabler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a bearer token signed with JWT_SECRET (development only)
    IssueToken {
        /// User id to put in the `sub` claim
        #[arg(short = 'u', long)]
        user_id: Option<String>,

        /// Display name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Admin, Teacher or Student
        #[arg(short = 'r', long)]
        role: Option<Role>,
    },
    /// Insert the bundled subject list for a year into the configured store
    SeedSubjects {
        /// Academic year, e.g. 2025
        #[arg(short = 'y', long)]
        year: Option<String>,
    },
    /// Print every teacher double booking for a year
    Audit {
        /// Academic year, e.g. 2025
        #[arg(short = 'y', long)]
        year: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::IssueToken {
            user_id,
            name,
            role,
        } => handle_issue_token(user_id, name, role),
        Commands::SeedSubjects { year } => handle_seed_subjects(year).await,
        Commands::Audit { year } => handle_audit(year).await,
    };

    if let Err(e) = result {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

fn prompt(value: Option<String>, label: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Input::new()
            .with_prompt(label)
            .interact_text()
            .with_context(|| format!("Failed to read {}", label.to_lowercase())),
    }
}

fn handle_issue_token(
    user_id: Option<String>,
    name: Option<String>,
    role: Option<Role>,
) -> anyhow::Result<()> {
    let user_id = prompt(user_id, "User id")?;
    let name = prompt(name, "Display name")?;
    let role = match role {
        Some(role) => role,
        None => {
            let choice = Select::new()
                .with_prompt("Role")
                .items(&Role::ALL.map(|role| role.as_str()))
                .default(0)
                .interact()
                .context("Failed to read role")?;
            Role::ALL[choice]
        }
    };

    let jwt_config = JwtConfig::from_env();
    let token = create_access_token(&user_id, &name, role, &jwt_config)
        .map_err(|e| anyhow::anyhow!("{}", e.error))?;

    println!("\n✅ Token for {} ({}), valid {}s:", name, role, jwt_config.access_token_expiry);
    println!("{}", token);
    Ok(())
}

async fn connect_stores() -> anyhow::Result<Stores> {
    let config = StoreConfig::from_env();
    if config.backend == StoreBackend::Memory {
        eprintln!("⚠️  STORE_BACKEND is memory; changes made here are lost when the CLI exits");
    }

    Stores::connect(&config)
        .await
        .context("Failed to connect to the document store")
}

async fn handle_seed_subjects(year: Option<String>) -> anyhow::Result<()> {
    let year = prompt(year, "Academic year")?;
    let stores = connect_stores().await?;

    let existing: Vec<String> = stores
        .subjects
        .list_by_year(&year)
        .await
        .context("Failed to read existing subjects")?
        .into_iter()
        .map(|subject| subject.name.to_lowercase())
        .collect();

    let mut created = 0;
    for subject in fallback_subjects(&year) {
        if existing.contains(&subject.name.to_lowercase()) {
            println!("   skipped {} (already present)", subject.name);
            continue;
        }
        stores
            .subjects
            .add(&subject)
            .await
            .with_context(|| format!("Failed to add {}", subject.name))?;
        created += 1;
    }

    println!("✅ Seeded {} subjects for {}", created, year);
    Ok(())
}

async fn handle_audit(year: Option<String>) -> anyhow::Result<()> {
    let year = prompt(year, "Academic year")?;
    let stores = connect_stores().await?;

    let manager = SlotManager::new(stores.schedules.clone(), &TimetableConfig::from_env());
    let reports = manager
        .audit(&year)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if reports.is_empty() {
        println!("✅ No double bookings in {}", year);
        return Ok(());
    }

    println!("❌ {} double booking(s) in {}:", reports.len(), year);
    for report in reports {
        println!("\n   {} on {} at {}", report.teacher, report.day, report.time);
        for booking in report.bookings {
            println!("     - {} ({}, slot {})", booking.class, booking.subject, booking.slot_id);
        }
    }
    Ok(())
}
