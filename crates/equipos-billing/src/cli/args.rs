use crate::cli::{commands::Commands, handlers};
use crate::config::EquiposConfig;
use crate::error::Result;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;

/// EQUIPOS billing - rental amounts, lifecycle and reports
#[derive(Parser, Debug)]
#[command(
    name = "equipos-billing",
    version,
    about = "Rental billing, lifecycle and reporting for heavy-equipment rentals",
    long_about = "Rental billing, lifecycle and reporting for heavy-equipment rentals.

RENTALS (SQLite store from database.url):
  equipos-billing amount '{\"horas\": 5, \"precio_por_hora\": 100}'
  equipos-billing register @alquiler.json
  equipos-billing edit <id> '{\"horas\": 3}'
  equipos-billing list --client C1 --pending

REPORTS (JSON dataset export):
  equipos-billing performance -d export.json --from 2025-01-01 --to 2025-01-31
  equipos-billing dashboard -d export.json --year 2025 --month 1
  equipos-billing statement -d export.json --client C1
  equipos-billing allocate -d export.json --client C1 --amount 5000 --write"
)]
pub struct Args {
    /// Configuration file (JSON, or TOML by extension)
    #[arg(short, long, global = true, env = "EQUIPOS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        if let Commands::GenConfig { toml } = self.command {
            return handlers::config::handle_gen_config(toml);
        }

        let config = EquiposConfig::load(self.config.as_deref())?;
        let ctx = handlers::Context {
            config,
            json: self.json,
        };

        match self.command {
            Commands::Amount { payload, original } => {
                handlers::rentals::handle_amount(&ctx, &payload, original.as_deref())
            }
            Commands::Register { payload } => {
                handlers::rentals::handle_register(&ctx, &payload).await
            }
            Commands::Edit { id, payload } => {
                handlers::rentals::handle_edit(&ctx, &id, &payload).await
            }
            Commands::Delete { id } => handlers::rentals::handle_delete(&ctx, &id).await,
            Commands::Show { id } => handlers::rentals::handle_show(&ctx, &id).await,
            Commands::List { filters } => handlers::rentals::handle_list(&ctx, filters).await,
            Commands::Pending { client } => {
                handlers::rentals::handle_pending(&ctx, &client).await
            }

            Commands::Performance {
                dataset,
                range,
                equipment,
            } => handlers::reports::handle_performance(&ctx, dataset, range, equipment),
            Commands::Dashboard {
                dataset,
                year,
                month,
                equipment,
                limit,
            } => handlers::reports::handle_dashboard(&ctx, dataset, year, month, equipment, limit),
            Commands::Operators {
                dataset,
                range,
                operator,
                equipment,
            } => handlers::reports::handle_operators(&ctx, dataset, range, operator, equipment),
            Commands::Statement {
                dataset,
                client,
                range,
            } => handlers::reports::handle_statement(&ctx, dataset, client, range),
            Commands::Debt {
                dataset,
                client,
                range,
            } => handlers::reports::handle_debt(&ctx, dataset, &client, range),

            Commands::Allocate {
                dataset,
                client,
                amount,
                fecha,
                account,
                comment,
                write,
            } => handlers::payments::handle_allocate(
                &ctx,
                dataset,
                handlers::payments::AllocateRequest {
                    client,
                    amount,
                    fecha,
                    account,
                    comment,
                    write,
                },
            ),

            Commands::GenConfig { toml } => handlers::config::handle_gen_config(toml),
        }
    }
}
