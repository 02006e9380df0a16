use analytics::{AnalyticsEngine, AnomalyFlag, Cell, ReportTable, TierThresholds};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use configuration::{OutputFormat, ParseErrorPolicy, Settings};
use core_types::{PercentileMethod, RepeatDefinition};
use dataset::{LoadOptions, SalesTable, load_sales};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

mod render;

/// The main entry point for the retail reporting tool.
fn main() -> Result<()> {
    // Environment overrides may live in a .env file; it is optional.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut settings =
        configuration::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut settings);
    settings.validate()?;

    let _log_guard = configuration::logging::init(&settings.logging)?;

    // Execute the appropriate command
    match &cli.command {
        Commands::Report(command) => handle_report(command, &settings, cli.output.as_ref()),
        Commands::Validate => handle_validate(&settings, cli.output.as_ref()),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Analytical reports over a retail sales table.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file. Defaults to ./retail.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CSV file holding the sales table. Overrides `dataset.path`.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Output format. Overrides `output.format`.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Write the report to this file instead of standard output.
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    /// What to do with rows that fail to parse. Overrides `dataset.on_parse_error`.
    #[arg(long, value_enum, global = true)]
    on_parse_error: Option<ParseErrorPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one of the sales reports.
    #[command(subcommand)]
    Report(ReportCommand),
    /// Load the table, print a summary and every rejected row.
    Validate,
}

#[derive(Subcommand)]
enum ReportCommand {
    /// The branch and month with the highest month-over-month sales growth.
    BranchGrowth {
        /// List every branch and month instead of only the top one.
        #[arg(long)]
        all: bool,
    },
    /// The most profitable product line of each branch.
    ProductProfit {
        /// List every branch and product line.
        #[arg(long)]
        all: bool,
    },
    /// High / Medium / Low spend tiers by percentile rank.
    SpendTiers {
        #[arg(long, value_enum)]
        method: Option<PercentileArg>,
    },
    /// Transactions far from their product line's mean total.
    Anomalies {
        /// Standard deviations from the mean before a total is flagged.
        #[arg(long)]
        stddev_factor: Option<Decimal>,
        /// Only list flagged transactions.
        #[arg(long)]
        only_flagged: bool,
    },
    /// The most used payment method in each city.
    PaymentMethods,
    /// Sales by month and gender.
    GenderMonthly,
    /// The top product line of each customer type.
    CustomerTypePreference,
    /// Customers who purchased again.
    RepeatCustomers {
        /// Days within which a later purchase pairs with an earlier one.
        #[arg(long)]
        window_days: Option<i64>,
        #[arg(long, value_enum)]
        definition: Option<DefinitionArg>,
    },
    /// The biggest spenders.
    TopCustomers {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Sales by day of the week.
    WeekdayTrend,
    /// Every report above, with configured parameters.
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum PercentileArg {
    CumeDist,
    PercentRank,
}

impl From<PercentileArg> for PercentileMethod {
    fn from(arg: PercentileArg) -> Self {
        match arg {
            PercentileArg::CumeDist => PercentileMethod::CumeDist,
            PercentileArg::PercentRank => PercentileMethod::PercentRank,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DefinitionArg {
    /// Any two purchases within the window.
    Pairs,
    /// Any second purchase.
    Multiple,
}

impl From<DefinitionArg> for RepeatDefinition {
    fn from(arg: DefinitionArg) -> Self {
        match arg {
            DefinitionArg::Pairs => RepeatDefinition::PairsWithinWindow,
            DefinitionArg::Multiple => RepeatDefinition::MultiplePurchases,
        }
    }
}

impl Cli {
    /// Command-line flags win over the file and the environment.
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(data) = &self.data {
            settings.dataset.path = Some(data.clone());
        }
        if let Some(format) = self.format {
            settings.output.format = format;
        }
        if let Some(policy) = self.on_parse_error {
            settings.dataset.on_parse_error = policy;
        }

        let Commands::Report(command) = &self.command else {
            return;
        };
        let reports = &mut settings.reports;
        match command {
            ReportCommand::SpendTiers { method: Some(method) } => {
                reports.percentile_method = (*method).into();
            }
            ReportCommand::Anomalies {
                stddev_factor: Some(factor),
                ..
            } => reports.stddev_factor = *factor,
            ReportCommand::RepeatCustomers {
                window_days,
                definition,
            } => {
                if let Some(days) = window_days {
                    reports.repeat_window_days = *days;
                }
                if let Some(definition) = definition {
                    reports.repeat_definition = (*definition).into();
                }
            }
            ReportCommand::TopCustomers { limit: Some(limit) } => reports.top_customers = *limit,
            _ => {}
        }
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn load_table(settings: &Settings) -> Result<SalesTable> {
    let Some(path) = settings.dataset.path.as_deref() else {
        bail!("No dataset given: pass --data <csv> or set dataset.path in the configuration");
    };
    let options = LoadOptions::from_settings(&settings.dataset)?;
    load_sales(path, &options).with_context(|| format!("Failed to load {}", path.display()))
}

fn handle_report(command: &ReportCommand, settings: &Settings, output: Option<&PathBuf>) -> Result<()> {
    let table = load_table(settings)?;
    let engine = AnalyticsEngine::new(table.records());

    let reports = match command {
        ReportCommand::All => vec![
            branch_growth(&engine, false)?,
            product_profit(&engine, false)?,
            spend_tiers(&engine, settings)?,
            anomalies(&engine, settings, false)?,
            payment_methods(&engine),
            gender_monthly(&engine)?,
            customer_type_preference(&engine)?,
            repeat_customers(&engine, settings)?,
            top_customers(&engine, settings)?,
            weekday_trend(&engine)?,
        ],
        ReportCommand::BranchGrowth { all } => vec![branch_growth(&engine, *all)?],
        ReportCommand::ProductProfit { all } => vec![product_profit(&engine, *all)?],
        ReportCommand::SpendTiers { .. } => vec![spend_tiers(&engine, settings)?],
        ReportCommand::Anomalies { only_flagged, .. } => {
            vec![anomalies(&engine, settings, *only_flagged)?]
        }
        ReportCommand::PaymentMethods => vec![payment_methods(&engine)],
        ReportCommand::GenderMonthly => vec![gender_monthly(&engine)?],
        ReportCommand::CustomerTypePreference => vec![customer_type_preference(&engine)?],
        ReportCommand::RepeatCustomers { .. } => vec![repeat_customers(&engine, settings)?],
        ReportCommand::TopCustomers { .. } => vec![top_customers(&engine, settings)?],
        ReportCommand::WeekdayTrend => vec![weekday_trend(&engine)?],
    };

    tracing::info!(reports = reports.len(), rows = table.len(), "Reports computed");
    emit(&reports, settings.output.format, output)
}

fn handle_validate(settings: &Settings, output: Option<&PathBuf>) -> Result<()> {
    let table = load_table(settings)?;
    let summary = AnalyticsEngine::new(table.records()).summary()?;

    let rejected = ReportTable {
        title: "Rejected rows".to_string(),
        headers: vec!["Row".to_string(), "Line".to_string(), "Reason".to_string()],
        rows: table
            .rejected()
            .iter()
            .map(|r| {
                vec![
                    Cell::Count(r.row as u64),
                    r.line.map_or(Cell::Empty, Cell::Count),
                    Cell::Text(r.reason.clone()),
                ]
            })
            .collect(),
    };

    emit(
        &[ReportTable::new("Dataset summary", &[summary]), rejected],
        settings.output.format,
        output,
    )?;

    if !table.rejected().is_empty() {
        bail!("{} row(s) failed validation", table.rejected().len());
    }
    Ok(())
}

fn emit(reports: &[ReportTable], format: OutputFormat, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            render::write_reports(reports, format, &mut writer)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            render::write_reports(reports, format, &mut lock)?;
        }
    }
    Ok(())
}

// ==============================================================================
// Report Builders
// ==============================================================================

fn branch_growth(engine: &AnalyticsEngine<'_>, all: bool) -> Result<ReportTable> {
    let table = if all {
        ReportTable::new("Monthly sales growth by branch", &engine.branch_monthly_growth()?)
    } else {
        let top: Vec<_> = engine.top_branch_growth()?.into_iter().collect();
        ReportTable::new("Highest month-over-month branch growth", &top)
    };
    Ok(table)
}

fn product_profit(engine: &AnalyticsEngine<'_>, all: bool) -> Result<ReportTable> {
    let table = if all {
        ReportTable::new("Profit by branch and product line", &engine.product_line_profit()?)
    } else {
        ReportTable::new("Most profitable product line per branch", &engine.top_product_line_by_branch()?)
    };
    Ok(table)
}

fn spend_tiers(engine: &AnalyticsEngine<'_>, settings: &Settings) -> Result<ReportTable> {
    let thresholds = TierThresholds {
        high: settings.reports.high_tier_threshold,
        medium: settings.reports.medium_tier_threshold,
    };
    let rows = engine.spend_segments(thresholds, settings.reports.percentile_method)?;
    Ok(ReportTable::new("Customer spend tiers", &rows))
}

fn anomalies(engine: &AnalyticsEngine<'_>, settings: &Settings, only_flagged: bool) -> Result<ReportTable> {
    let mut rows = engine.anomalies(settings.reports.stddev_factor)?;
    if only_flagged {
        rows.retain(|r| r.flag != AnomalyFlag::Normal);
    }
    let title = format!(
        "Transaction anomalies (±{} std dev from product line mean)",
        settings.reports.stddev_factor
    );
    Ok(ReportTable::new(title, &rows))
}

fn payment_methods(engine: &AnalyticsEngine<'_>) -> ReportTable {
    ReportTable::new("Most popular payment method per city", &engine.payment_popularity())
}

fn gender_monthly(engine: &AnalyticsEngine<'_>) -> Result<ReportTable> {
    Ok(ReportTable::new("Monthly sales by gender", &engine.gender_monthly_sales()?))
}

fn customer_type_preference(engine: &AnalyticsEngine<'_>) -> Result<ReportTable> {
    Ok(ReportTable::new("Top product line per customer type", &engine.customer_type_preference()?))
}

fn repeat_customers(engine: &AnalyticsEngine<'_>, settings: &Settings) -> Result<ReportTable> {
    let rows = engine.repeat_customers(
        settings.reports.repeat_window_days,
        settings.reports.repeat_definition,
    )?;
    let title = match settings.reports.repeat_definition {
        RepeatDefinition::PairsWithinWindow => format!(
            "Repeat customers (purchases within {} days)",
            settings.reports.repeat_window_days
        ),
        RepeatDefinition::MultiplePurchases => "Repeat customers (two or more purchases)".to_string(),
    };
    Ok(ReportTable::new(title, &rows))
}

fn top_customers(engine: &AnalyticsEngine<'_>, settings: &Settings) -> Result<ReportTable> {
    let limit = settings.reports.top_customers;
    Ok(ReportTable::new(format!("Top {limit} customers by spend"), &engine.top_customers(limit)?))
}

fn weekday_trend(engine: &AnalyticsEngine<'_>) -> Result<ReportTable> {
    Ok(ReportTable::new("Sales by weekday", &engine.weekday_trend()?))
}
