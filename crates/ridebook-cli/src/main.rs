//! Ridebook CLI: driver records and compliance documents from the terminal.
//!
//! Set RIDEBOOK_API_URL and RIDEBOOK_API_KEY (X-API-Key) or RIDEBOOK_TOKEN (Bearer).

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ridebook_api_client::ApiClient;
use ridebook_cli::{drain_feedback, init_tracing, read_document, StdinConfirmation};
use ridebook_core::models::{
    CreateDriverDto, DriverFilter, DriverStatus, FileType, UpdateDriverDto,
};
use ridebook_core::{ClientConfig, ValidationGate};
use ridebook_drivers::{
    AutoConfirm, Confirmation, DocumentUploadCoordinator, DriverRegistry,
    DriverWorkflowController, FeedbackPublisher, UploadOutcome,
};
use ridebook_storage::PresignedUploader;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ridebook", about = "Ridebook driver management CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Driver records and documents
    Drivers {
        #[command(subcommand)]
        sub: DriverCommands,
    },
}

#[derive(Subcommand)]
enum DriverCommands {
    /// List drivers, oldest first
    List {
        /// Name, email or license number substring
        #[arg(long)]
        search: Option<String>,
        /// Filter by status: active, inactive, suspended
        #[arg(long)]
        status: Option<DriverStatus>,
        /// Maximum number of drivers
        #[arg(long)]
        limit: Option<u32>,
        /// Offset for pagination
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Create a driver
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        license_number: String,
        #[arg(long)]
        license_class: Option<String>,
        /// License expiry date (YYYY-MM-DD)
        #[arg(long)]
        license_expiry: NaiveDate,
        #[arg(long)]
        status: Option<DriverStatus>,
    },
    /// Update fields of a driver; omitted fields are left unchanged
    Update {
        /// Driver UUID
        id: Uuid,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        license_number: Option<String>,
        #[arg(long)]
        license_class: Option<String>,
        /// License expiry date (YYYY-MM-DD)
        #[arg(long)]
        license_expiry: Option<NaiveDate>,
        #[arg(long)]
        status: Option<DriverStatus>,
    },
    /// Delete a driver after confirmation
    Delete {
        /// Driver UUID
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Upload a compliance document and attach it to the driver
    Upload {
        /// Driver UUID
        id: Uuid,
        /// Document field: license_document, insurance_document,
        /// identity_document, vehicle_registration_document
        #[arg(long)]
        field: String,
        /// Path to the file
        path: std::path::PathBuf,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn document_field(field: &str) -> anyhow::Result<&'static str> {
    FileType::from_field_id(field)
        .map(|file_type| file_type.field_id())
        .with_context(|| {
            let known: Vec<&str> = FileType::ALL.iter().map(FileType::field_id).collect();
            format!(
                "Unknown document field '{}'. Expected one of: {}",
                field,
                known.join(", ")
            )
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = ClientConfig::from_env().context(
        "Failed to load configuration. Set RIDEBOOK_API_URL and RIDEBOOK_API_KEY or RIDEBOOK_TOKEN",
    )?;

    let api = Arc::new(ApiClient::from_config(&config).context("Failed to create API client")?);
    let uploader =
        Arc::new(PresignedUploader::from_config(&config).context("Failed to create uploader")?);

    let confirmation: Arc<dyn Confirmation> = match &cli.command {
        Commands::Drivers {
            sub: DriverCommands::Delete { yes: true, .. },
        } => Arc::new(AutoConfirm(true)),
        _ => Arc::new(StdinConfirmation),
    };

    let (publisher, mut feedback) = FeedbackPublisher::channel();
    let controller = DriverWorkflowController::new(
        Arc::new(DriverRegistry::new(api.clone())),
        DocumentUploadCoordinator::new(api, uploader),
        ValidationGate::from_config(&config),
        confirmation,
        publisher,
    );

    let Commands::Drivers { sub } = cli.command;
    let result = run(&controller, sub).await;
    drain_feedback(&mut feedback);
    result
}

async fn run(controller: &DriverWorkflowController, command: DriverCommands) -> anyhow::Result<()> {
    match command {
        DriverCommands::List {
            search,
            status,
            limit,
            offset,
        } => {
            let filter = DriverFilter {
                search,
                status,
                limit,
                offset,
            };
            let drivers = controller.refresh(&filter).await?;
            print_json(&drivers)?;
        }
        DriverCommands::Create {
            first_name,
            last_name,
            email,
            phone,
            license_number,
            license_class,
            license_expiry,
            status,
        } => {
            let dto = CreateDriverDto {
                first_name,
                last_name,
                email,
                phone,
                license_number,
                license_class,
                license_expiry,
                status,
            };
            let driver = controller.submit_create(&dto).await?;
            print_json(&driver)?;
        }
        DriverCommands::Update {
            id,
            first_name,
            last_name,
            email,
            phone,
            license_number,
            license_class,
            license_expiry,
            status,
        } => {
            let dto = UpdateDriverDto {
                first_name,
                last_name,
                email,
                phone,
                license_number,
                license_class,
                license_expiry,
                status,
                documents: None,
            };
            let driver = controller.submit_update(id, &dto).await?;
            print_json(&driver)?;
        }
        DriverCommands::Delete { id, .. } => {
            let deleted = controller.request_delete(id).await?;
            print_json(&serde_json::json!({ "id": id, "deleted": deleted }))?;
        }
        DriverCommands::Upload { id, field, path } => {
            let field_id = document_field(&field)?;
            let file = read_document(&path).await?;
            match controller.upload_document(id, field_id, file).await? {
                UploadOutcome::Completed(driver) => print_json(&driver)?,
                // A single CLI invocation never starts a second attempt on the field.
                UploadOutcome::Superseded => anyhow::bail!("Upload was superseded"),
            }
        }
    }

    Ok(())
}
