use clap::{Args as ClapArgs, Subcommand};
use std::path::PathBuf;

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute monto for a rental payload without saving it
    Amount {
        /// Proposed fields as JSON, `@file` or `-` for stdin
        payload: String,

        /// Stored record the edit falls back to (JSON, `@file` or `-`)
        #[arg(long)]
        original: Option<String>,
    },

    /// Register a new rental
    Register {
        /// Rental as JSON, `@file` or `-` for stdin
        payload: String,
    },

    /// Edit a stored rental; omitted fields keep their stored value
    Edit {
        /// Rental id (transaccion_id)
        id: String,

        /// Changed fields as JSON, `@file` or `-` for stdin
        payload: String,
    },

    /// Delete a rental
    Delete {
        /// Rental id (transaccion_id)
        id: String,
    },

    /// Show a single rental
    Show {
        /// Rental id (transaccion_id)
        id: String,
    },

    /// List stored rentals
    List {
        #[command(flatten)]
        filters: ListFilters,
    },

    /// Unpaid rentals of a client, oldest first
    Pending {
        /// Client id
        client: String,
    },

    /// Per-equipment billing, yield and margin over a date range
    Performance {
        #[command(flatten)]
        dataset: DatasetArg,

        #[command(flatten)]
        range: RequiredRange,

        /// Restrict to one equipment id
        #[arg(long)]
        equipment: Option<String>,
    },

    /// Month KPIs and recent rentals
    Dashboard {
        #[command(flatten)]
        dataset: DatasetArg,

        #[arg(long)]
        year: i32,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,

        /// Restrict to one equipment id
        #[arg(long)]
        equipment: Option<String>,

        /// Rows in the recent rentals list (defaults to app.recent_limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Operator payment totals
    Operators {
        #[command(flatten)]
        dataset: DatasetArg,

        #[command(flatten)]
        range: RequiredRange,

        #[arg(long)]
        operator: Option<String>,

        #[arg(long)]
        equipment: Option<String>,
    },

    /// Client account statement; all clients when --client is omitted
    Statement {
        #[command(flatten)]
        dataset: DatasetArg,

        #[arg(long)]
        client: Option<String>,

        #[command(flatten)]
        range: OptionalRange,
    },

    /// Billed, paid and balance of one client
    Debt {
        #[command(flatten)]
        dataset: DatasetArg,

        client: String,

        #[command(flatten)]
        range: OptionalRange,
    },

    /// Apply a general client payment to the oldest unpaid rentals
    Allocate {
        #[command(flatten)]
        dataset: DatasetArg,

        #[arg(long)]
        client: String,

        /// Payment amount
        #[arg(long)]
        amount: String,

        /// Payment date (YYYY-MM-DD), today when omitted
        #[arg(long, value_parser = parse_fecha)]
        fecha: Option<String>,

        #[arg(long)]
        account: Option<String>,

        #[arg(long)]
        comment: Option<String>,

        /// Write the updated dataset back to its file
        #[arg(long)]
        write: bool,
    },

    /// Print the default configuration
    GenConfig {
        /// Emit TOML instead of JSON
        #[arg(long)]
        toml: bool,
    },
}

#[derive(ClapArgs, Debug)]
pub struct DatasetArg {
    /// JSON export with alquileres, gastos, pagos_operadores, abonos and equipos
    #[arg(long, short = 'd', env = "EQUIPOS_DATASET")]
    pub dataset: PathBuf,
}

#[derive(ClapArgs, Debug)]
pub struct RequiredRange {
    /// First day included (YYYY-MM-DD)
    #[arg(long, value_parser = parse_fecha)]
    pub from: String,

    /// Last day included (YYYY-MM-DD)
    #[arg(long, value_parser = parse_fecha)]
    pub to: String,
}

#[derive(ClapArgs, Debug, Default)]
pub struct OptionalRange {
    /// First day included (YYYY-MM-DD)
    #[arg(long, value_parser = parse_fecha)]
    pub from: Option<String>,

    /// Last day included (YYYY-MM-DD)
    #[arg(long, value_parser = parse_fecha)]
    pub to: Option<String>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct ListFilters {
    #[command(flatten)]
    pub range: OptionalRange,

    #[arg(long)]
    pub equipment: Option<String>,

    #[arg(long)]
    pub client: Option<String>,

    #[arg(long)]
    pub operator: Option<String>,

    /// Only paid rentals
    #[arg(long, conflicts_with = "pending")]
    pub paid: bool,

    /// Only unpaid rentals
    #[arg(long)]
    pub pending: bool,
}

fn parse_fecha(raw: &str) -> Result<String, String> {
    equipos_common::dates::parse_date(raw)
        .map(equipos_common::dates::format_date)
        .ok_or_else(|| format!("expected a date as YYYY-MM-DD, got {:?}", raw))
}
