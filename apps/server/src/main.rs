use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use dailink_config::load as load_config;
use dailink_database::{
    CampaignRepository, CrmRepository, HscRun, HscRunRepository, LinkedInAccountRepository, User,
    UserRepository,
};
use dailink_gateway::{build_router, services::accounts::sync_mirror, AppState};
use dailink_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "dailink")]
#[command(about = "DAILINK LinkedIn outreach backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Print users, accounts, lists, campaigns and HSC runs
    DumpData,
    /// Give an existing user the admin role
    PromoteAdmin {
        #[arg(long)]
        email: String,
    },
    /// Refresh mirrored LinkedIn accounts from Unipile
    SyncAccounts,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(&config, services).await,
        Commands::DumpData => dump_data(&services).await,
        Commands::PromoteAdmin { email } => promote_admin(&services, &email).await,
        Commands::SyncAccounts => sync_accounts(&services).await,
    }
}

async fn run_server(
    config: &dailink_config::AppConfig,
    services: BackendServices,
) -> anyhow::Result<()> {
    info!("starting DAILINK backend");

    let state = AppState::new(
        services.db_pool,
        services.authenticator,
        services.unipile,
        services.assistant,
        services.hsc,
    );
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(dailink_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn dump_data(services: &BackendServices) -> anyhow::Result<()> {
    let pool = services.db_pool.clone();

    let users = UserRepository::new(pool.clone())
        .list_all()
        .await
        .context("failed to fetch users")?;
    println!("=== USERS ===");
    print_users(&users);

    let accounts = LinkedInAccountRepository::new(pool.clone())
        .list_all()
        .await
        .context("failed to fetch linkedin accounts")?;
    println!("\n=== LINKEDIN ACCOUNTS ===");
    if accounts.is_empty() {
        println!("No accounts found in database");
    } else {
        println!(
            "{:<5} {:<30} {:<8} {:<30} {:<15} {:<25}",
            "ID", "Account ID", "User", "Name", "Status", "Synced At"
        );
        println!("{}", "-".repeat(120));
        for account in accounts {
            println!(
                "{:<5} {:<30} {:<8} {:<30} {:<15} {:<25}",
                account.id,
                account.account_id,
                account.user_id,
                account.name,
                account.status,
                account.synced_at
            );
        }
    }

    let lists = CrmRepository::new(pool.clone())
        .list_all()
        .await
        .context("failed to fetch crm lists")?;
    println!("\n=== CRM LISTS ===");
    if lists.is_empty() {
        println!("No lists found in database");
    } else {
        println!(
            "{:<5} {:<28} {:<8} {:<30} {:<30} {:<10} {:<6}",
            "ID", "Public ID", "User", "Account ID", "Name", "Kind", "Items"
        );
        println!("{}", "-".repeat(125));
        for list in lists {
            println!(
                "{:<5} {:<28} {:<8} {:<30} {:<30} {:<10} {:<6}",
                list.id,
                list.public_id,
                list.user_id,
                list.account_id,
                list.name,
                list.kind.as_str(),
                list.item_count
            );
        }
    }

    let campaigns = CampaignRepository::new(pool.clone())
        .list_all()
        .await
        .context("failed to fetch campaigns")?;
    println!("\n=== CAMPAIGNS ===");
    if campaigns.is_empty() {
        println!("No campaigns found in database");
    } else {
        println!(
            "{:<5} {:<28} {:<8} {:<30} {:<30} {:<10} {:<28}",
            "ID", "Public ID", "User", "Account ID", "Name", "Status", "CRM List"
        );
        println!("{}", "-".repeat(145));
        for campaign in campaigns {
            println!(
                "{:<5} {:<28} {:<8} {:<30} {:<30} {:<10} {:<28}",
                campaign.id,
                campaign.public_id,
                campaign.user_id,
                campaign.account_id,
                campaign.name,
                campaign.status.as_str(),
                campaign.crm_list.as_deref().unwrap_or("NULL")
            );
        }
    }

    let runs = HscRunRepository::new(pool)
        .list_all()
        .await
        .context("failed to fetch hsc runs")?;
    println!("\n=== HSC RUNS ===");
    print_runs(&runs);

    Ok(())
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No users found in database");
        return;
    }
    println!(
        "{:<5} {:<28} {:<35} {:<8} {:<30}",
        "ID", "Public ID", "Email", "Role", "Selected Account"
    );
    println!("{}", "-".repeat(110));
    for user in users {
        println!(
            "{:<5} {:<28} {:<35} {:<8} {:<30}",
            user.id,
            user.public_id,
            user.email.as_deref().unwrap_or("NULL"),
            user.role.as_str(),
            user.selected_account_id.as_deref().unwrap_or("NULL")
        );
    }
}

fn print_runs(runs: &[HscRun]) {
    if runs.is_empty() {
        println!("No runs found in database");
        return;
    }
    println!(
        "{:<5} {:<28} {:<8} {:<30} {:<15} {:<9} {:<6} {:<40}",
        "ID", "Public ID", "User", "Name", "Stage", "Progress", "Pages", "Last Error"
    );
    println!("{}", "-".repeat(145));
    for run in runs {
        println!(
            "{:<5} {:<28} {:<8} {:<30} {:<15} {:<9} {:<6} {:<40}",
            run.id,
            run.public_id,
            run.user_id,
            run.name,
            run.stage.as_str(),
            run.progress,
            run.pages_processed,
            run.last_error.as_deref().unwrap_or("")
        );
    }
}

async fn promote_admin(services: &BackendServices, email: &str) -> anyhow::Result<()> {
    let users = UserRepository::new(services.db_pool.clone());
    let user = users
        .promote_by_email(email)
        .await
        .with_context(|| format!("failed to promote {email}"))?;

    info!(user = %user.public_id, "user promoted to admin");
    println!("{} is now an admin", user.email.as_deref().unwrap_or(email));
    Ok(())
}

async fn sync_accounts(services: &BackendServices) -> anyhow::Result<()> {
    let client = services
        .unipile
        .as_ref()
        .ok_or_else(|| anyhow!("unipile api key is not configured"))?;
    let accounts = LinkedInAccountRepository::new(services.db_pool.clone());

    let summary = sync_mirror(&accounts, client, None)
        .await
        .map_err(|err| anyhow!("account sync failed: {}", err.message))?;

    println!(
        "Synced accounts: {} updated, {} missing upstream",
        summary.updated, summary.missing
    );
    Ok(())
}
