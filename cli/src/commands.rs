//! Subcommands and their handlers.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use tracing::info;

use firefly_core::import::{import_categories, load_categories, ImportOptions};
use firefly_core::{AccountType, FireflyClient, Pagination, TransactionQuery, TransactionType};

use crate::display::{
    format_account_details, format_account_list, format_budget_list, format_category_list, format_import_plan,
    format_import_report, format_pagination, format_system_info, format_transaction_list,
};

#[derive(Subcommand)]
pub enum Command {
    /// Check that the server is reachable and the token is accepted
    Test,

    /// List accounts
    Accounts {
        /// Account type (asset, expense, revenue, liability, cash, all)
        #[arg(short = 't', long = "type")]
        account_type: Option<AccountType>,
    },

    /// Show one account
    Account {
        /// Account ID
        id: String,
    },

    /// List transactions
    #[command(alias = "txn")]
    Transactions {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Transaction type (withdrawal, deposit, transfer, ...)
        #[arg(short = 't', long = "type")]
        transaction_type: Option<TransactionType>,
        /// Page number
        #[arg(long)]
        page: Option<u32>,
        /// Results per page
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// List budgets
    Budgets,

    /// List categories
    Categories,

    /// Create categories from a file or a directory of .txt/.md files
    #[command(name = "import-categories")]
    ImportCategories {
        /// File or directory to read
        path: PathBuf,
        /// Show what would be imported without creating anything
        #[arg(long)]
        dry_run: bool,
        /// Skip names that already exist on the server
        #[arg(long)]
        skip_existing: bool,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn handle_command(client: &FireflyClient, command: Command) -> Result<()> {
    match command {
        Command::Test => test_connection(client).await,
        Command::Accounts { account_type } => {
            let resp = client.accounts(account_type).await.context("failed to list accounts")?;
            print_listing(format_account_list(&resp.data), resp.pagination());
            Ok(())
        }
        Command::Account { id } => {
            let account = client
                .account(&id)
                .await
                .with_context(|| format!("failed to fetch account {id}"))?;
            print!("{}", format_account_details(&account));
            Ok(())
        }
        Command::Transactions {
            start,
            end,
            transaction_type,
            page,
            limit,
        } => {
            if let (Some(start), Some(end)) = (start, end) {
                if start > end {
                    bail!("--start {start} is after --end {end}");
                }
            }
            let query = TransactionQuery {
                start,
                end,
                transaction_type,
                page,
                limit,
            };
            let resp = client
                .transactions(&query)
                .await
                .context("failed to list transactions")?;
            print_listing(format_transaction_list(&resp.data), resp.pagination());
            Ok(())
        }
        Command::Budgets => {
            let resp = client.budgets().await.context("failed to list budgets")?;
            print_listing(format_budget_list(&resp.data), resp.pagination());
            Ok(())
        }
        Command::Categories => {
            let categories = client.all_categories().await.context("failed to list categories")?;
            println!("{}", format_category_list(&categories).trim_end());
            Ok(())
        }
        Command::ImportCategories {
            path,
            dry_run,
            skip_existing,
            yes,
        } => {
            let options = ImportOptions { dry_run, skip_existing };
            import(client, path, options, yes).await
        }
    }
}

fn print_listing(table: String, pagination: Option<&Pagination>) {
    println!("{}", table.trim_end());
    if let Some(p) = pagination.filter(|p| p.total_pages > 1) {
        println!("{}", format_pagination(p));
    }
}

async fn test_connection(client: &FireflyClient) -> Result<()> {
    let url = &client.engine().settings().base_url;
    if !client.test_connection().await {
        bail!("could not connect to Firefly III at {url}");
    }
    let about = client.about().await.context("connected, but /about could not be read")?;
    println!("Connected to {url}");
    println!("{}", format_system_info(&about));
    Ok(())
}

async fn import(client: &FireflyClient, path: PathBuf, options: ImportOptions, yes: bool) -> Result<()> {
    let categories = load_categories(&path)?;
    if categories.is_empty() {
        println!("No categories found in {}.", path.display());
        return Ok(());
    }

    print!("{}", format_import_plan(&categories));

    if !options.dry_run && !yes && !confirm("Proceed? [y/N] ")? {
        println!("Import cancelled.");
        return Ok(());
    }

    info!(count = categories.len(), path = %path.display(), "importing categories");
    let report = import_categories(client, &categories, &options)
        .await
        .context("failed to read existing categories")?;

    if options.dry_run {
        println!("Dry run: nothing was created.");
    } else {
        print!("{}", format_import_report(&report));
    }

    if !report.is_clean() {
        bail!("{} of {} categories failed to import", report.failed.len(), report.total());
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
