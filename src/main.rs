//! Finance client CLI
//!
//! Command-line front end for the personal finance API: authentication,
//! transactions with URL-style filters, budgets, reports and the monthly
//! insight.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use finance_client::models::{
    BudgetScope, CategoryType, Credentials, InsightLanguage, InsightOutcome, NewBudget,
    NewTransaction, ReportType, Registration, TransactionPatch, TransactionQuery,
    TransactionType, TransferRequest, TrendInterval,
};
use finance_client::services::BootstrapOutcome;
use finance_client::{ApiError, AppState, ClientConfig};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "finance-client", version, about = "Personal finance API client")]
struct Cli {
    /// Month in YYYY-MM form; defaults to the current month
    #[arg(long, global = true)]
    month: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with FINANCE_API_EMAIL / FINANCE_API_USERNAME and FINANCE_API_PASSWORD
    Login,
    /// End the server session
    Logout,
    /// Show the current user
    Me,
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "FINANCE_API_PASSWORD")]
        password: String,
    },
    #[command(subcommand)]
    Transactions(TransactionCommand),
    #[command(subcommand)]
    Budgets(BudgetCommand),
    #[command(subcommand)]
    Reports(ReportCommand),
    /// List wallets
    Wallets {
        #[arg(long)]
        active: bool,
    },
    /// List categories
    Categories {
        /// expense or income
        #[arg(long = "type")]
        category_type: Option<String>,
    },
    /// Monthly summary, AI generated when available
    Insight {
        /// th or en
        #[arg(long, default_value = "th")]
        lang: String,
    },
}

#[derive(Subcommand, Debug)]
enum TransactionCommand {
    /// List transactions
    List {
        /// Filter as a query string, e.g. "from=2024-02-01&to=2024-02-29&type=expense"
        #[arg(long, default_value = "")]
        filter: String,
    },
    Get {
        id: i64,
    },
    /// Record an expense or income
    Create(CreateArgs),
    /// Change fields of an existing transaction
    Edit(EditArgs),
    Delete {
        id: i64,
    },
    /// Move money between two wallets
    Transfer {
        #[arg(long)]
        from_wallet: i64,
        #[arg(long)]
        to_wallet: i64,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        note: Option<String>,
    },
    /// Upload a receipt image and attach it to a transaction
    AttachReceipt {
        id: i64,
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// expense or income
    #[arg(long = "type", default_value = "expense")]
    tx_type: String,
    #[arg(long)]
    amount: Decimal,
    #[arg(long)]
    wallet: i64,
    #[arg(long)]
    category: Option<i64>,
    #[arg(long)]
    merchant: Option<String>,
    #[arg(long)]
    note: Option<String>,
    /// RFC 3339 timestamp or YYYY-MM-DD; defaults to now
    #[arg(long)]
    at: Option<String>,
}

impl CreateArgs {
    fn into_new_transaction(self, now: DateTime<Utc>) -> Result<NewTransaction> {
        Ok(NewTransaction {
            r#type: form_type(&self.tx_type)?,
            occurred_at: match &self.at {
                Some(at) => parse_occurred_at(at)?,
                None => now,
            },
            amount: positive_amount(self.amount)?,
            wallet_id: self.wallet,
            category_id: self.category,
            merchant: self.merchant,
            note: self.note,
            receipt_url: None,
        })
    }
}

#[derive(Args, Debug)]
struct EditArgs {
    id: i64,
    /// expense or income
    #[arg(long = "type")]
    tx_type: Option<String>,
    #[arg(long)]
    amount: Option<Decimal>,
    #[arg(long)]
    wallet: Option<i64>,
    #[arg(long, conflicts_with = "clear_category")]
    category: Option<i64>,
    /// Remove the category
    #[arg(long)]
    clear_category: bool,
    #[arg(long)]
    merchant: Option<String>,
    #[arg(long)]
    note: Option<String>,
    /// RFC 3339 timestamp or YYYY-MM-DD
    #[arg(long)]
    at: Option<String>,
    #[arg(long, conflicts_with = "clear_receipt")]
    receipt_url: Option<String>,
    /// Detach the receipt
    #[arg(long)]
    clear_receipt: bool,
}

impl EditArgs {
    fn into_patch(self) -> Result<TransactionPatch> {
        let category_id = if self.clear_category {
            Some(None)
        } else {
            self.category.map(Some)
        };
        let receipt_url = if self.clear_receipt {
            Some(None)
        } else {
            self.receipt_url.map(Some)
        };

        let patch = TransactionPatch {
            tx_type: self.tx_type.as_deref().map(form_type).transpose()?,
            occurred_at: self.at.as_deref().map(parse_occurred_at).transpose()?,
            amount: self.amount.map(positive_amount).transpose()?,
            wallet_id: self.wallet,
            category_id,
            merchant: self.merchant,
            note: self.note,
            receipt_url,
        };

        let unchanged = patch.tx_type.is_none()
            && patch.occurred_at.is_none()
            && patch.amount.is_none()
            && patch.wallet_id.is_none()
            && patch.category_id.is_none()
            && patch.merchant.is_none()
            && patch.note.is_none()
            && patch.receipt_url.is_none();
        if unchanged {
            bail!("Nothing to change for transaction #{}", self.id);
        }
        Ok(patch)
    }
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    List,
    Status,
    Create {
        #[arg(long)]
        limit: Decimal,
        /// Category id; omit for a total budget
        #[arg(long)]
        category: Option<i64>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    Summary,
    ByCategory {
        #[arg(long = "type", default_value = "expense")]
        report_type: String,
    },
    Trend {
        #[arg(long, default_value = "daily")]
        interval: String,
        #[arg(long = "type", default_value = "all")]
        report_type: String,
    },
    TopMerchants {
        #[arg(long = "type", default_value = "expense")]
        report_type: String,
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
    WalletBalances {
        /// YYYY-MM-DD
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config = ClientConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        ApiError::Config(e)
    })?;

    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("finance_client={},reqwest=warn", config.log_level).into()
        })
    };
    // Logs go to stderr so command output stays pipeable
    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    }

    info!("Environment: {}", config.environment);
    info!("API base URL: {}", config.base_url);

    let state = AppState::from_config(&config)?;
    let month = match cli.month {
        Some(month) => month,
        None => finance_client::period::MonthRange::current().month(),
    };

    // Registration needs no session
    if let Command::Register { username, email, password } = &cli.command {
        let created = state
            .auth
            .register(&Registration {
                username: username.clone(),
                email: email.clone(),
                password: password.clone(),
            })
            .await?;
        println!("Registered {} <{}> (id {})", created.username, created.email, created.id);
        return Ok(());
    }

    authenticate(&state, &config, matches!(cli.command, Command::Login)).await?;

    match cli.command {
        Command::Login | Command::Register { .. } => {}
        Command::Logout => {
            state.auth.logout().await?;
            println!("Logged out");
        }
        Command::Me => {
            let user = state.auth.me().await?;
            println!("{} <{}> (id {})", user.username, user.email, user.id);
            if let Some(currency) = user.base_currency() {
                println!("Base currency: {}", currency);
            }
        }
        Command::Transactions(command) => run_transactions(&state, command).await?,
        Command::Budgets(command) => run_budgets(&state, &month, command).await?,
        Command::Reports(command) => run_reports(&state, &month, command).await?,
        Command::Wallets { active } => {
            let wallets = if active {
                state.wallets.list_active().await?
            } else {
                state.wallets.list().await?
            };
            for wallet in wallets {
                println!(
                    "#{} {} [{}]{}",
                    wallet.id,
                    wallet.name,
                    wallet.currency_code().unwrap_or("-"),
                    if wallet.is_active() { "" } else { " (inactive)" }
                );
            }
        }
        Command::Categories { category_type } => {
            let category_type = category_type
                .as_deref()
                .map(CategoryType::from_str)
                .transpose()
                .map_err(anyhow::Error::msg)?;
            for category in state.categories.list(category_type).await? {
                println!("#{} {} ({})", category.id, category.name, category.r#type.as_str());
            }
        }
        Command::Insight { lang } => {
            let language = InsightLanguage::from_str(&lang).map_err(anyhow::Error::msg)?;
            let outcome = state.insights.monthly_insight(&month, language).await?;
            if let InsightOutcome::Fallback { reason, .. } = &outcome {
                warn!("Showing rule-based summary: {}", reason);
            }
            let insight = outcome.into_insight();
            println!("[{}] {}", insight.source.label(), insight.month);
            println!("{}", insight.text);
        }
    }

    Ok(())
}

/// Log in when credentials are configured, otherwise try the refresh cookie
async fn authenticate(state: &AppState, config: &ClientConfig, require_login: bool) -> Result<()> {
    let creds = &config.credentials;
    if creds.is_complete() {
        let password = creds.password.clone().unwrap_or_default();
        let credentials = match (&creds.email, &creds.username) {
            (Some(email), _) => Credentials::with_email(email.clone(), password),
            (None, Some(username)) => Credentials::with_username(username.clone(), password),
            (None, None) => bail!("Email or username is required"),
        };
        let user = state.auth.login(&credentials).await.map_err(|e| {
            error!("Login failed: {}", e.user_message());
            e
        })?;
        println!("Logged in as {}", user.username);
        return Ok(());
    }

    if require_login {
        bail!("Set FINANCE_API_PASSWORD and FINANCE_API_EMAIL or FINANCE_API_USERNAME to log in");
    }

    match state.auth.bootstrap().await {
        BootstrapOutcome::Authenticated(user) => {
            info!("Continuing session of {}", user.username);
            Ok(())
        }
        BootstrapOutcome::LoginRequired => {
            bail!("Not logged in. Run `finance-client login` with credentials configured")
        }
    }
}

async fn run_transactions(state: &AppState, command: TransactionCommand) -> Result<()> {
    match command {
        TransactionCommand::List { filter } => {
            let query = TransactionQuery::from_query(&filter);
            let page = state.transactions.list(&query).await?;
            for tx in &page.results {
                println!(
                    "#{} {} {} {} {}",
                    tx.id,
                    tx.occurred_at.format("%Y-%m-%d"),
                    tx.r#type.as_str(),
                    tx.amount,
                    tx.merchant
                );
            }
            println!(
                "Page {} of {} ({} total)",
                query.page,
                query.total_pages(page.count).max(1),
                page.count
            );
        }
        TransactionCommand::Get { id } => {
            let tx = state.transactions.get(id).await?;
            println!("{:#?}", tx);
        }
        TransactionCommand::Create(args) => {
            let payload = args.into_new_transaction(Utc::now())?;
            let tx = state.transactions.create(&payload).await?;
            println!("Created transaction #{} ({} {})", tx.id, tx.r#type.as_str(), tx.amount);
        }
        TransactionCommand::Edit(args) => {
            let id = args.id;
            let patch = args.into_patch()?;
            let tx = state.transactions.patch(id, &patch).await?;
            println!("Updated transaction #{}", tx.id);
        }
        TransactionCommand::Delete { id } => {
            state.transactions.delete(id).await?;
            println!("Deleted transaction #{}", id);
        }
        TransactionCommand::Transfer { from_wallet, to_wallet, amount, note } => {
            let result = state
                .transactions
                .transfer(&TransferRequest {
                    from_wallet_id: from_wallet,
                    to_wallet_id: to_wallet,
                    amount,
                    occurred_at: Utc::now(),
                    note,
                })
                .await?;
            println!(
                "Transfer {}: out #{} / in #{}",
                result.link_id, result.out_tx.id, result.in_tx.id
            );
        }
        TransactionCommand::AttachReceipt { id, file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("receipt");
            let tx = state.transactions.attach_receipt(id, file_name, bytes).await?;
            println!(
                "Receipt attached to #{}: {}",
                tx.id,
                tx.receipt_url.as_deref().unwrap_or("")
            );
        }
    }
    Ok(())
}

async fn run_budgets(state: &AppState, month: &str, command: BudgetCommand) -> Result<()> {
    match command {
        BudgetCommand::List => {
            for budget in state.budgets.list(month).await? {
                let name = budget
                    .category
                    .as_ref()
                    .map(|c| c.name.as_str())
                    .unwrap_or("Total");
                println!("#{} {} {} limit {}", budget.id, budget.month, name, budget.limit_base_amount);
            }
        }
        BudgetCommand::Status => {
            let status = state.budgets.status(month).await?;
            for item in &status.items {
                let flag = if item.is_over() {
                    " OVER"
                } else if item.is_near_limit() {
                    " near limit"
                } else {
                    ""
                };
                println!(
                    "{}: {} / {} ({}%){}",
                    item.title, item.spent, item.limit, item.percent_used, flag
                );
            }
        }
        BudgetCommand::Create { limit, category } => {
            let budget = state
                .budgets
                .create(&NewBudget {
                    month: month.to_string(),
                    scope: if category.is_some() { BudgetScope::Category } else { BudgetScope::Total },
                    limit_base_amount: limit,
                    category_id: category,
                })
                .await?;
            println!("Created budget #{}", budget.id);
        }
        BudgetCommand::Delete { id } => {
            state.budgets.delete(id).await?;
            println!("Deleted budget #{}", id);
        }
    }
    Ok(())
}

async fn run_reports(state: &AppState, month: &str, command: ReportCommand) -> Result<()> {
    match command {
        ReportCommand::Summary => {
            let summary = state.reports.summary(month).await?;
            println!("{:#?}", summary);
        }
        ReportCommand::ByCategory { report_type } => {
            let report = state.reports.by_category(month, parse_report_type(&report_type)?).await?;
            for row in &report.items {
                println!("{}: {}", row.category_name.as_deref().unwrap_or("Uncategorized"), row.total);
            }
        }
        ReportCommand::Trend { interval, report_type } => {
            let trend = state
                .reports
                .trend(month, parse_interval(&interval)?, parse_report_type(&report_type)?)
                .await?;
            for point in &trend.items {
                println!("{} income {} expense {}", point.day(), point.income, point.expense);
            }
        }
        ReportCommand::TopMerchants { report_type, limit } => {
            let report = state
                .reports
                .top_merchants(month, parse_report_type(&report_type)?, limit)
                .await?;
            for row in &report.items {
                println!("{}: {}", row.merchant, row.total);
            }
        }
        ReportCommand::WalletBalances { as_of } => {
            let report = state.reports.wallet_balances(as_of).await?;
            for row in &report.items {
                println!("{}: {} ({} in base)", row.wallet.name, row.balance, row.base_balance);
            }
            println!("Total: {}", report.total_base_balance);
        }
    }
    Ok(())
}

fn parse_report_type(s: &str) -> Result<ReportType> {
    match s.to_lowercase().as_str() {
        "expense" => Ok(ReportType::Expense),
        "income" => Ok(ReportType::Income),
        "all" => Ok(ReportType::All),
        _ => bail!("Invalid report type: {}", s),
    }
}

fn parse_interval(s: &str) -> Result<TrendInterval> {
    match s.to_lowercase().as_str() {
        "daily" => Ok(TrendInterval::Daily),
        "weekly" => Ok(TrendInterval::Weekly),
        "monthly" => Ok(TrendInterval::Monthly),
        _ => bail!("Invalid trend interval: {}", s),
    }
}

/// Only expenses and incomes are entered directly; transfers have their own command
fn form_type(s: &str) -> Result<TransactionType> {
    match TransactionType::from_str(s).map_err(anyhow::Error::msg)? {
        t @ (TransactionType::Expense | TransactionType::Income) => Ok(t),
        _ => bail!("Use `transactions transfer` to move money between wallets"),
    }
}

fn positive_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        bail!("Amount must be greater than 0");
    }
    Ok(amount)
}

/// RFC 3339 timestamp, or a bare date taken as midnight UTC
fn parse_occurred_at(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date {:?}, expected RFC 3339 or YYYY-MM-DD", s))?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("invalid date {:?}", s))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> TransactionCommand {
        let argv = ["finance-client", "transactions"].iter().chain(args).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Transactions(command) => command,
            other => panic!("unexpected command {:?}", other),
        }
    }

    fn create(args: &[&str]) -> Result<NewTransaction> {
        match parse(args) {
            TransactionCommand::Create(args) => {
                args.into_new_transaction(Utc.with_ymd_and_hms(2024, 2, 10, 12, 0, 0).unwrap())
            }
            other => panic!("expected create, got {:?}", other),
        }
    }

    fn edit(args: &[&str]) -> Result<TransactionPatch> {
        match parse(args) {
            TransactionCommand::Edit(args) => args.into_patch(),
            other => panic!("expected edit, got {:?}", other),
        }
    }

    #[test]
    fn test_create_builds_payload() {
        let tx = create(&[
            "create", "--type", "income", "--amount", "1500.50", "--wallet", "2",
            "--category", "4", "--merchant", "Acme", "--at", "2024-02-01",
        ])
        .unwrap();

        assert_eq!(tx.r#type, TransactionType::Income);
        assert_eq!(tx.amount, Decimal::new(150050, 2));
        assert_eq!(tx.wallet_id, 2);
        assert_eq!(tx.category_id, Some(4));
        assert_eq!(tx.merchant.as_deref(), Some("Acme"));
        assert_eq!(tx.note, None);
        assert_eq!(tx.occurred_at, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_create_defaults_to_expense_now() {
        let tx = create(&["create", "--amount", "80", "--wallet", "1"]).unwrap();
        assert_eq!(tx.r#type, TransactionType::Expense);
        assert_eq!(tx.occurred_at, Utc.with_ymd_and_hms(2024, 2, 10, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_create_rejects_bad_input() {
        assert!(create(&["create", "--amount", "0", "--wallet", "1"]).is_err());
        assert!(create(&["create", "--amount=-5", "--wallet", "1"]).is_err());
        assert!(create(&["create", "--type", "transfer_out", "--amount", "5", "--wallet", "1"]).is_err());
        assert!(create(&["create", "--amount", "5", "--wallet", "1", "--at", "yesterday"]).is_err());
    }

    #[test]
    fn test_edit_clear_flags_send_empty_values() {
        let patch = edit(&["edit", "7", "--clear-category", "--clear-receipt"]).unwrap();
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "category_id": null, "receipt_url": "" })
        );
    }

    #[test]
    fn test_edit_sets_only_given_fields() {
        let patch = edit(&[
            "edit", "7", "--type", "expense", "--amount", "42", "--note", "lunch",
            "--at", "2024-02-03T08:15:00+07:00",
        ])
        .unwrap();

        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({
                "type": "expense",
                "occurred_at": "2024-02-03T01:15:00Z",
                "amount": "42",
                "note": "lunch"
            })
        );
    }

    #[test]
    fn test_edit_requires_a_change() {
        assert!(edit(&["edit", "7"]).is_err());
    }

    #[test]
    fn test_edit_set_and_clear_conflict() {
        let argv = ["finance-client", "transactions", "edit", "7", "--category", "3", "--clear-category"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
