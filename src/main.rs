mod availability;
mod calendar;
mod client;
mod commands;
mod config;
mod error;
mod models;
mod payment;
mod pricing;
mod schedule;
mod selection;
mod web;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use client::AdminResource;
use commands::AdminAction;
use models::CancelRequest;

/// courtbook: browse sports courts, pick slots and hand them off to payment.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print request/response details
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Path to config file
    #[arg(short = 'c', long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Override the API base URL from config
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Override the session token from config
    #[arg(long, global = true)]
    token: Option<String>,

    /// Override the session user id from config
    #[arg(long, global = true)]
    user_id: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List facility locations
    Locations,

    /// List sports offered at a location
    Sports {
        /// Location ID
        location: String,
    },

    /// Show the court schedule of a location
    Schedule {
        /// Location ID
        location: String,

        /// Day to start from (YYYY-MM-DD)
        #[arg(short = 'd', long)]
        date: Option<NaiveDate>,

        /// Sport name, e.g. "Futsal"
        #[arg(short = 's', long)]
        sport: Option<String>,
    },

    /// Print a two-month booking calendar
    Calendar {
        /// First month to show (YYYY-MM), defaults to the current month
        #[arg(short = 'm', long)]
        month: Option<String>,
    },

    /// Select slots, price them and print the payment link
    ///
    /// Examples:
    ///   quote 1 --slot 5:t19 --slot 5:t20          # two hours on field 5
    ///   quote 1 --slot 5:t19@2025-03-10 -m 3       # weekly pattern with membership 3
    Quote {
        /// Location ID
        location: String,

        /// Slot as <fieldId>:<timeId>[@YYYY-MM-DD]; repeat to select several.
        /// Repeating the same slot deselects it again.
        #[arg(long = "slot", required = true)]
        slots: Vec<String>,

        /// Schedule day the slots default to (YYYY-MM-DD)
        #[arg(short = 'd', long)]
        date: Option<NaiveDate>,

        /// Sport name
        #[arg(short = 's', long)]
        sport: Option<String>,

        /// Membership ID; selects whole weekly patterns at a discount
        #[arg(short = 'm', long)]
        membership: Option<String>,
    },

    /// Show your reservation history
    Bookings,

    /// Request cancellation (and refund) of a reservation
    Cancel {
        /// Reservation ID
        id: String,

        /// Why the reservation is cancelled
        #[arg(short = 'r', long)]
        reason: String,

        /// Bank for the refund transfer
        #[arg(long)]
        bank_name: Option<String>,

        /// Account number for the refund transfer
        #[arg(long)]
        account_number: Option<String>,

        /// Account holder name
        #[arg(long)]
        account_name: Option<String>,
    },

    /// Show your refund requests
    Refunds,

    /// Admin dashboard operations
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },

    /// Start the web UI
    Serve {
        /// Listen address, overrides [server] addr
        #[arg(short = 'a', long)]
        addr: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// List a resource (admin, locations, sports, fields, memberships, closed-fields)
    List { resource: AdminResource },

    /// Create a resource from a JSON body
    Create {
        resource: AdminResource,
        /// JSON object, e.g. '{"name": "GOR Senayan"}'
        #[arg(long)]
        data: String,
    },

    /// Update a resource by ID from a JSON body
    Update {
        resource: AdminResource,
        id: String,
        #[arg(long)]
        data: String,
    },

    /// Delete a resource by ID
    Delete { resource: AdminResource, id: String },

    /// List every reservation
    Reservations,

    /// List every refund request
    Refunds,

    /// Set the status of a refund request (e.g. approved, rejected)
    RefundStatus { id: String, status: String },
}

fn parse_body(data: &str) -> Result<serde_json::Value> {
    serde_json::from_str(data).with_context(|| format!("--data is not valid JSON: {data}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cfg = config::load_config(&cli.config)?.with_overrides(
        cli.api_url.as_deref(),
        cli.token.as_deref(),
        cli.user_id.as_deref(),
    );

    match cli.command {
        Command::Locations => commands::run_locations(&cfg).await?,
        Command::Sports { location } => commands::run_sports(&cfg, &location).await?,
        Command::Schedule {
            location,
            date,
            sport,
        } => commands::run_schedule(&cfg, &location, date, sport.as_deref()).await?,
        Command::Calendar { month } => commands::run_calendar(&cfg, month.as_deref())?,
        Command::Quote {
            location,
            slots,
            date,
            sport,
            membership,
        } => {
            commands::run_quote(
                &cfg,
                &location,
                date,
                sport.as_deref(),
                &slots,
                membership.as_deref(),
            )
            .await?
        }
        Command::Bookings => commands::run_bookings(&cfg).await?,
        Command::Cancel {
            id,
            reason,
            bank_name,
            account_number,
            account_name,
        } => {
            let req = CancelRequest {
                reason,
                bank_name,
                account_number,
                account_name,
            };
            commands::run_cancel(&cfg, &id, &req).await?
        }
        Command::Refunds => commands::run_refunds(&cfg, false).await?,
        Command::Admin { command } => match command {
            AdminCommand::List { resource } => {
                commands::run_admin(&cfg, resource, AdminAction::List).await?
            }
            AdminCommand::Create { resource, data } => {
                commands::run_admin(&cfg, resource, AdminAction::Create(parse_body(&data)?)).await?
            }
            AdminCommand::Update { resource, id, data } => {
                commands::run_admin(&cfg, resource, AdminAction::Update(id, parse_body(&data)?))
                    .await?
            }
            AdminCommand::Delete { resource, id } => {
                commands::run_admin(&cfg, resource, AdminAction::Delete(id)).await?
            }
            AdminCommand::Reservations => commands::run_admin_reservations(&cfg).await?,
            AdminCommand::Refunds => commands::run_refunds(&cfg, true).await?,
            AdminCommand::RefundStatus { id, status } => {
                commands::run_refund_status(&cfg, &id, &status).await?
            }
        },
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| cfg.server.addr.clone());
            web::serve(cfg, &addr).await?;
        }
    }

    Ok(())
}
