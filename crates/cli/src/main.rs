mod plan;
mod settings;

use anyhow::{bail, Result};
use api_client::HttpApi;
use api_shared::{
    AppearanceId, LocationId, LocationLevel, PrisonerId, PropertyId, PropertyStatusId, VisitorId,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use pims_core::{
    record_attendance, AttendanceFlag, EditSession, IntakeSession, Notice, RecordsApi,
    StatusChannel, SubmissionOutcome,
};
use plan::IntakePlan;
use settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pims")]
#[command(about = "PIMS property intake CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the backend is reachable
    Health,
    /// List locations at one level of the hierarchy
    Locations {
        /// Level to list (region, district, county, sub-county, parish, village)
        #[arg(long, default_value = "region")]
        level: LocationLevel,
        /// Parent location id; required below the region level
        #[arg(long)]
        parent: Option<LocationId>,
    },
    /// List the visitors registered for a prisoner
    Visitors {
        /// Prisoner id
        prisoner: PrisonerId,
        /// Filter by name, ID number or contact (optional)
        #[arg(long)]
        search: Option<String>,
    },
    /// List the items a visitor brought for a prisoner
    Items {
        /// Prisoner id
        prisoner: PrisonerId,
        /// Visitor id
        visitor: VisitorId,
    },
    /// Record property from a YAML intake plan
    Intake {
        /// Plan file
        #[arg(long)]
        plan: PathBuf,
    },
    /// Move a property to a new status, recording the audit entry
    ChangeStatus {
        /// Property id
        property: PropertyId,
        /// New status id
        status: PropertyStatusId,
        /// Reason for the change
        #[arg(long)]
        reason: String,
        /// Where the property went (optional)
        #[arg(long)]
        destination: Option<String>,
    },
    /// Delete a property record
    DeleteProperty {
        /// Property id
        property: PropertyId,
    },
    /// Mark a court appearance as attended
    MarkAttended {
        /// Appearance id
        appearance: AppearanceId,
        /// Note (optional)
        #[arg(long)]
        note: Option<String>,
    },
}

fn print_notice(status: &StatusChannel) {
    match status.snapshot().notice {
        Some(notice @ (Notice::Success(_) | Notice::Empty(_))) => println!("{notice}"),
        Some(notice) => eprintln!("{notice}"),
        None => {}
    }
}

async fn list_locations(
    api: &HttpApi,
    level: LocationLevel,
    parent: Option<LocationId>,
) -> Result<()> {
    if level.parent().is_some() && parent.is_none() {
        bail!("--parent is required when listing {}", level.plural());
    }
    let locations = api.list_locations(level, parent).await?.into_results();
    if locations.is_empty() {
        println!("No {} found.", level.plural());
    }
    for location in locations {
        println!("ID: {}, Name: {}", location.id, location.name);
    }
    Ok(())
}

async fn list_visitors(
    api: Arc<HttpApi>,
    prisoner: PrisonerId,
    search: Option<String>,
) -> Result<()> {
    let status = StatusChannel::new();
    let mut session = IntakeSession::new(api, status.clone());
    session.select_prisoner(prisoner).await;

    let query = search.unwrap_or_default();
    for visitor in session.form().visitors().search(&query) {
        println!(
            "ID: {}, Name: {}, Contact: {}",
            visitor.id,
            visitor.full_name(),
            visitor.contact.as_deref().unwrap_or("-")
        );
    }
    print_notice(&status);
    Ok(())
}

async fn list_items(api: Arc<HttpApi>, prisoner: PrisonerId, visitor: VisitorId) -> Result<()> {
    let status = StatusChannel::new();
    let mut session = IntakeSession::new(api, status.clone());
    session.select_prisoner(prisoner).await;
    if let Some(reason) = session.form().visitors().blocking_reason() {
        if session.form().visitors().visitors().is_empty() {
            bail!("{reason}");
        }
    }
    session.select_visitor(visitor).await?;

    for item in session.form().visitors().items() {
        let amount = item.amount.map(|a| a.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "ID: {}, Name: {}, Category: {}, Quantity: {}, Amount: {}",
            item.id, item.name, item.category, item.quantity, amount
        );
    }
    print_notice(&status);
    Ok(())
}

async fn intake(api: Arc<HttpApi>, settings: &Settings, path: PathBuf) -> Result<()> {
    let actor = settings.actor()?;
    let plan = IntakePlan::load(&path)?;
    let status = StatusChannel::new();
    let mut session = IntakeSession::new(api, status.clone());
    plan.fill(&mut session).await?;

    tracing::info!(items = plan.items.len(), %actor, "submitting intake plan");
    let outcome = session.submit(actor).await;
    print_notice(&status);
    match outcome? {
        SubmissionOutcome::Completed(created) => {
            for property in created {
                println!("Created property {} (bag {})", property.id, property.bag_no);
            }
            Ok(())
        }
        SubmissionOutcome::Partial(report) => {
            for saved in report.succeeded() {
                if let Ok(id) = &saved.result {
                    println!("Created property {id} (item {})", saved.position);
                }
            }
            bail!("{} item(s) were not saved", report.failed().count())
        }
    }
}

async fn change_status(
    api: Arc<HttpApi>,
    settings: &Settings,
    property: PropertyId,
    new_status: PropertyStatusId,
    reason: String,
    destination: Option<String>,
) -> Result<()> {
    let actor = settings.actor()?;
    let status = StatusChannel::new();
    let mut session = EditSession::load(api, property, status.clone()).await?;
    session.select_status(new_status, Utc::now())?;
    let Some(form) = session.status_change_mut() else {
        bail!("property {property} already has status {new_status}");
    };
    form.reason = reason;
    form.destination = destination.unwrap_or_default();

    let result = session.submit_status_change(actor).await;
    print_notice(&status);
    result?;
    Ok(())
}

async fn delete_property(api: Arc<HttpApi>, property: PropertyId) -> Result<()> {
    let status = StatusChannel::new();
    let session = EditSession::load(api, property, status.clone()).await?;
    let result = session.delete().await;
    print_notice(&status);
    result?;
    Ok(())
}

async fn mark_attended(
    api: &HttpApi,
    settings: &Settings,
    appearance: AppearanceId,
    note: Option<String>,
) -> Result<()> {
    let actor = settings.actor()?;
    let status = StatusChannel::new();
    let mut flag = AttendanceFlag::new(appearance);
    flag.toggle(true, Utc::now());
    if let Some(prompt) = flag.prompt_mut() {
        prompt.note = note.unwrap_or_default();
    }
    let result = record_attendance(api, &mut flag, actor, &status).await;
    print_notice(&status);
    let record = result?;
    println!("Attendance {} recorded for appearance {appearance}", record.id);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pims=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'pims --help' for commands");
        return Ok(());
    };

    let settings = Settings::from_env()?;
    let api = Arc::new(HttpApi::new(settings.client.clone())?);

    match command {
        Commands::Health => {
            let health = api.health().await?;
            println!("{}", health.message);
        }
        Commands::Locations { level, parent } => list_locations(&api, level, parent).await?,
        Commands::Visitors { prisoner, search } => list_visitors(api, prisoner, search).await?,
        Commands::Items { prisoner, visitor } => list_items(api, prisoner, visitor).await?,
        Commands::Intake { plan } => intake(api, &settings, plan).await?,
        Commands::ChangeStatus {
            property,
            status,
            reason,
            destination,
        } => change_status(api, &settings, property, status, reason, destination).await?,
        Commands::DeleteProperty { property } => delete_property(api, property).await?,
        Commands::MarkAttended { appearance, note } => {
            mark_attended(&api, &settings, appearance, note).await?
        }
    }

    Ok(())
}
