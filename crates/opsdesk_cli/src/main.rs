//! Command-line entry point for the opsdesk dashboard data layer.
//!
//! # Responsibility
//! - Seed a local SQLite snapshot from fixture JSON.
//! - Render each dashboard page as pretty JSON for inspection and scripting.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use opsdesk_core::config::{config_path, load_config};
use opsdesk_core::model::booking::BookingStatus;
use opsdesk_core::model::coupon::CouponState;
use opsdesk_core::model::payment::PaymentStatus;
use opsdesk_core::model::ticket::TicketStatus;
use opsdesk_core::service::booking_service::{BookingFilter, BookingService};
use opsdesk_core::service::coupon_service::CouponService;
use opsdesk_core::service::customer_service::CustomerService;
use opsdesk_core::service::dashboard_service::DashboardService;
use opsdesk_core::service::partner_service::PartnerService;
use opsdesk_core::service::payment_service::PaymentService;
use opsdesk_core::service::ticket_service::TicketService;
use opsdesk_core::store::fixtures::load_fixture;
use opsdesk_core::{
    init_logging, open_db, DashboardConfig, DocPath, HttpPaymentsSource, PageRequest,
    SearchTerm, ServiceContext, SqliteDocumentStore,
};
use serde::Serialize;
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "opsdesk")]
#[command(version)]
#[command(about = "Operations dashboard data for the home-services marketplace", long_about = None)]
struct Cli {
    /// Config file (defaults to $OPSDESK_CONFIG_PATH or ./opsdesk.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite snapshot, overriding `database_path` from the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Reference instant (RFC 3339) for month and state computations
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Free-text search over the visible columns
    #[arg(short, long, default_value = "")]
    search: String,

    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Rows per page (defaults to `page_size` from the config)
    #[arg(long)]
    page_size: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load fixture JSON (`{"collection": [{"id": ..., ...}]}`) into the snapshot
    Seed {
        fixture: PathBuf,
    },

    /// Bookings, newest first
    Bookings {
        /// Provider reference, e.g. `partners/p1`
        #[arg(long)]
        provider: Option<String>,
        /// Customer reference, e.g. `customer/c1`
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Customers, or one customer's detail with `--id`
    Customers {
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Partners with wallet, jobs and rating
    Partners {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Support tickets, newest first
    Tickets {
        #[arg(long)]
        status: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Coupons with computed state
    Coupons {
        /// disabled, scheduled, expired, exhausted or active
        #[arg(long)]
        state: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },

    /// KPI cards and the monthly bookings chart
    Kpis {
        #[arg(long, default_value_t = 6)]
        months: usize,
    },

    /// Payments from the payments endpoint
    Payments {
        #[arg(long)]
        status: Option<String>,
        /// Print the summary instead of a page of records
        #[arg(long)]
        summary: bool,
        #[arg(long, default_value_t = 6)]
        months: usize,
        #[command(flatten)]
        list: ListArgs,
    },
}

impl ListArgs {
    fn term(&self) -> SearchTerm {
        SearchTerm::new(&self.search)
    }

    fn page(&self, config: &DashboardConfig) -> PageRequest {
        PageRequest::new(self.page, self.page_size.unwrap_or(config.page_size))
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config_file = cli.config.clone().unwrap_or_else(config_path);
    let config = load_config(&config_file)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let now = cli.now.unwrap_or_else(Utc::now);
    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path.clone());
    let conn = open_db(&db_path)?;
    let store = SqliteDocumentStore::new(&conn);
    let ctx = ServiceContext::from_config(&store, &config);

    match cli.command {
        Command::Seed { fixture } => {
            let raw = std::fs::read_to_string(&fixture)?;
            let written = load_fixture(&store, &serde_json::from_str(&raw)?)?;
            info!(
                "event=cli_seed module=cli status=ok documents={} db={}",
                written,
                db_path.display()
            );
            print_json(&json!({
                "written": written,
                "collections": store.collection_counts()?,
            }))
        }
        Command::Bookings {
            provider,
            customer,
            status,
            list,
        } => {
            let filter = BookingFilter {
                provider: provider.as_deref().map(DocPath::parse).transpose()?,
                customer: customer.as_deref().map(DocPath::parse).transpose()?,
                ..BookingFilter::default()
            };
            let status = status.as_deref().map(BookingStatus::parse);
            let page = BookingService::new(ctx).list(
                &filter,
                &list.term(),
                status.as_ref(),
                list.page(&config),
            )?;
            print_json(&page)
        }
        Command::Customers { id, list } => {
            let service = CustomerService::new(ctx);
            match id {
                Some(id) => print_json(&service.detail(&customer_path(&id)?)?),
                None => print_json(&service.list(&list.term(), list.page(&config), now)?),
            }
        }
        Command::Partners { list } => {
            print_json(&PartnerService::new(ctx).list(&list.term(), list.page(&config))?)
        }
        Command::Tickets { status, list } => {
            let status = status.as_deref().map(TicketStatus::parse);
            print_json(&TicketService::new(ctx).list(
                status.as_ref(),
                &list.term(),
                list.page(&config),
            )?)
        }
        Command::Coupons { state, list } => {
            let state = match state.as_deref() {
                Some(raw) => Some(
                    CouponState::parse(raw).ok_or_else(|| format!("unknown coupon state `{raw}`"))?,
                ),
                None => None,
            };
            print_json(&CouponService::new(ctx).list(
                state,
                &list.term(),
                list.page(&config),
                now,
            )?)
        }
        Command::Kpis { months } => {
            let service = DashboardService::new(ctx);
            print_json(&json!({
                "kpis": service.kpis(now)?,
                "monthly_bookings": service.monthly_bookings(now, months)?,
            }))
        }
        Command::Payments {
            status,
            summary,
            months,
            list,
        } => {
            let base_url = config
                .payments_base_url
                .as_deref()
                .ok_or("payments_base_url is not configured")?;
            let source = HttpPaymentsSource::new(base_url, config.request_timeout())?;
            let service = PaymentService::new(&source);
            if summary {
                print_json(&service.summary(now, months)?)
            } else {
                let status = status.as_deref().map(PaymentStatus::parse);
                print_json(&service.list(status.as_ref(), &list.term(), list.page(&config))?)
            }
        }
    }
}

/// Accepts `c1` or `customer/c1`.
fn customer_path(raw: &str) -> CliResult<DocPath> {
    let path = if raw.contains('/') {
        DocPath::parse(raw)?
    } else {
        DocPath::new(opsdesk_core::model::customer::COLLECTION, raw)?
    };
    Ok(path)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
