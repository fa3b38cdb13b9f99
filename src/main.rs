use std::io::{self, BufRead, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::io::AsyncBufReadExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use workdesk::access::home_for;
use workdesk::api::ApiClient;
use workdesk::api::admin::AdminDraftStore;
use workdesk::api::types::{NewUser, ProfileUpdate, RegisterRequest, StartWorkRequest, UserUpdate};
use workdesk::auth::{FileSessionStore, Role, SessionStore};
use workdesk::autosave::{AutoSaver, DraftStore, SaveStatus};
use workdesk::config::{ClientConfig, ConfigError};
use workdesk::notify::NotificationSubscriber;
use workdesk::search::{SearchAction, SearchBox, SearchRequest, SearchResults, SearchScope, normalize_query};
use workdesk::session::WorkStatus;
use workdesk::session::countdown::{days_left_from, days_left_label, format_remaining};
use workdesk::site_config::{SiteConfigPatch, load_or_default};
use workdesk::workspace::{Workspace, WorkspaceState};
use workdesk::writer::WriteToken;
use workdesk::ClientError;

const FILE_POLL: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl CliError {
    fn user_message(&self) -> String {
        match self {
            Self::Client(error) => error.user_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "workdesk", about = "Data-entry work platform client")]
struct Cli {
    #[arg(long, env = "WORKDESK_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "WORKDESK_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

struct CliContext {
    config: ClientConfig,
    store: FileSessionStore,
    client: ApiClient,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in as a user.
    Login(LoginArgs),
    /// Log in as an administrator.
    AdminLogin(LoginArgs),
    Register(RegisterArgs),
    VerifyOtp {
        email: String,
        otp: String,
    },
    /// Show the agreement for a signing token and sign it.
    SignAgreement {
        token: String,
        #[arg(long)]
        signature: Option<String>,
    },
    Logout,
    Whoami,
    /// Work status, deadline countdown and review state.
    Dashboard,
    Work(WorkCommand),
    Profile(ProfileCommand),
    /// Your signed agreement.
    Agreement,
    /// Public site branding.
    SiteConfig,
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct LoginArgs {
    email: String,
    #[arg(long, env = "WORKDESK_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    mobile: String,
    #[arg(long)]
    alt_mobile: Option<String>,
    #[arg(long, env = "WORKDESK_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct WorkCommand {
    #[command(subcommand)]
    command: WorkSubcommand,
}

#[derive(Subcommand, Debug)]
enum WorkSubcommand {
    /// Start the 96 hour work window.
    Start(StartArgs),
    /// Print the saved draft.
    Draft,
    /// Save a local file as the draft.
    Save { file: PathBuf },
    /// Submit final work. Uses the saved draft unless a file is given.
    Submit {
        file: Option<PathBuf>,
        #[arg(long, short = 'y', default_value_t = false)]
        yes: bool,
    },
    /// Follow a local file and auto-save it until Ctrl-C.
    Edit { file: PathBuf },
    Pdfs,
    Download {
        pdf_id: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
struct StartArgs {
    #[arg(long)]
    project_link: String,
    #[arg(long, env = "WORKDESK_PROJECT_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        name: String,
        #[arg(long)]
        mobile: String,
        #[arg(long, default_value = "")]
        alt_mobile: String,
    },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Stats,
    /// List users.
    Users {
        #[arg(long, default_value_t = false)]
        detailed: bool,
    },
    User(AdminUserCommand),
    Penalize {
        user_id: String,
        #[arg(long)]
        reason: String,
    },
    RemovePenalty {
        user_id: String,
    },
    Password {
        user_id: String,
    },
    SendOtp {
        user_id: String,
    },
    SendAgreement {
        user_id: String,
    },
    /// Show a user's work.
    Work {
        user_id: String,
    },
    StartWork {
        user_id: String,
        #[command(flatten)]
        args: StartArgs,
    },
    /// Follow a local file and auto-save it into a user's work.
    EditWork {
        user_id: String,
        file: PathBuf,
    },
    Agreements(AdminAgreementCommand),
    SignedAgreements {
        id: Option<String>,
        #[arg(long, default_value_t = false, requires = "id")]
        send_pdf: bool,
    },
    Pdfs(AdminPdfCommand),
    /// Search once, or read queries from stdin when no query is given.
    Search {
        query: Option<String>,
        #[arg(long, value_enum, default_value_t = SearchScope::All)]
        scope: SearchScope,
        /// Quick lookup over users only.
        #[arg(long, default_value_t = false)]
        users_only: bool,
    },
    /// Run deadline and penalty automation now.
    Automation,
    SiteConfig(SiteConfigArgs),
    /// Stream work-started notifications until Ctrl-C.
    Notifications,
}

#[derive(Args, Debug)]
struct AdminUserCommand {
    #[command(subcommand)]
    command: AdminUserSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminUserSubcommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        alt_mobile: Option<String>,
        #[arg(long, env = "WORKDESK_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value_t = false)]
        admin: bool,
    },
    Update {
        user_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        #[arg(long)]
        alt_mobile: Option<String>,
    },
    Delete {
        user_id: String,
    },
}

#[derive(Args, Debug)]
struct AdminAgreementCommand {
    #[command(subcommand)]
    command: AdminAgreementSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminAgreementSubcommand {
    List,
    Create { file: PathBuf },
    Update { agreement_id: String, file: PathBuf },
    Delete { agreement_id: String },
}

#[derive(Args, Debug)]
struct AdminPdfCommand {
    #[command(subcommand)]
    command: AdminPdfSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminPdfSubcommand {
    List,
    Active,
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Toggle {
        pdf_id: String,
    },
    Delete {
        pdf_id: String,
    },
}

#[derive(Args, Debug)]
struct SiteConfigArgs {
    #[arg(long)]
    navbar_title: Option<String>,
    #[arg(long)]
    contact_number: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    email: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("workdesk=info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            debug!(?error, "command failed");
            eprintln!("error: {}", error.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url)?;
    }
    if let Some(session_file) = cli.session_file {
        config.session_file = session_file;
    }

    let store = FileSessionStore::new(config.session_file.clone());
    let client = ApiClient::new(&config)?.with_session(store.load()?);
    let ctx = CliContext { config, store, client };

    match cli.command {
        Command::Login(args) => run_login(&ctx, args, Role::User).await,
        Command::AdminLogin(args) => run_login(&ctx, args, Role::Admin).await,
        Command::Register(args) => run_register(&ctx, args).await,
        Command::VerifyOtp { email, otp } => {
            let ack = ctx.client.verify_otp(&email, &otp).await?;
            println!("{}", ack.message_or("Email verified. Check your inbox for the agreement link."));
            Ok(())
        }
        Command::SignAgreement { token, signature } => run_sign_agreement(&ctx, &token, signature).await,
        Command::Logout => {
            ctx.store.clear()?;
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => {
            print_whoami(&ctx);
            Ok(())
        }
        Command::Dashboard => run_dashboard(&ctx).await,
        Command::Work(work) => run_work(&ctx, work).await,
        Command::Profile(profile) => run_profile(&ctx, profile).await,
        Command::Agreement => {
            let agreement = ctx.client.my_agreement().await?;
            print_json(&agreement)
        }
        Command::SiteConfig => print_json(&load_or_default(&ctx.client).await),
        Command::Admin(admin) => run_admin(&ctx, admin).await,
    }
}

// =============================================================================
// ACCOUNT
// =============================================================================

async fn run_login(ctx: &CliContext, args: LoginArgs, role: Role) -> Result<(), CliError> {
    let session = match role {
        Role::User => ctx.client.login(&args.email, &args.password).await?,
        Role::Admin => ctx.client.admin_login(&args.email, &args.password).await?,
    };
    ctx.store.save(&session)?;
    println!("Logged in as {} ({})", session.user.name, session.role());
    println!("Home: {}", home_for(session.role()).path());
    Ok(())
}

async fn run_register(ctx: &CliContext, args: RegisterArgs) -> Result<(), CliError> {
    let request = RegisterRequest {
        name: args.name,
        email: args.email,
        mobile_number: args.mobile,
        alternative_mobile_number: args.alt_mobile,
        password: args.password,
    };
    let ack = ctx.client.register(&request).await?;
    println!("{}", ack.message_or("Registration received. Check your email for the OTP."));
    Ok(())
}

async fn run_sign_agreement(ctx: &CliContext, token: &str, signature: Option<String>) -> Result<(), CliError> {
    let agreement = ctx.client.fetch_agreement(Some(token)).await?;
    let Some(signature) = signature else {
        println!("{}", agreement.content);
        println!();
        println!("Re-run with --signature to sign.");
        return Ok(());
    };
    let session = ctx.client.sign_agreement(token, &signature).await?;
    ctx.store.save(&session)?;
    println!("Agreement signed. Logged in as {}", session.user.name);
    Ok(())
}

fn print_whoami(ctx: &CliContext) {
    match ctx.client.session() {
        Some(session) => println!("{} <{}> ({})", session.user.name, session.user.email, session.role()),
        None => println!("Not logged in"),
    }
}

async fn run_profile(ctx: &CliContext, profile: ProfileCommand) -> Result<(), CliError> {
    match profile.command {
        ProfileSubcommand::Show => print_json(&ctx.client.profile().await?),
        ProfileSubcommand::Update { name, mobile, alt_mobile } => {
            let update = ProfileUpdate { name, mobile_number: mobile, alternative_mobile_number: alt_mobile };
            ctx.client.update_profile(&update).await?;
            println!("Profile updated");
            Ok(())
        }
    }
}

// =============================================================================
// WORK
// =============================================================================

async fn run_dashboard(ctx: &CliContext) -> Result<(), CliError> {
    let dashboard = ctx.client.dashboard().await?;
    let snapshot = dashboard.snapshot(OffsetDateTime::now_utc());

    println!("Status:    {}", snapshot.status);
    if matches!(snapshot.status, WorkStatus::InProgress | WorkStatus::Penalized) {
        println!("Remaining: {}", format_remaining(Some(snapshot.time_remaining)));
        println!("Days left: {}", days_left_label(days_left_from(snapshot.time_remaining)));
    }
    if let Some(deadline) = snapshot.deadline {
        println!("Deadline:  {}", rfc3339(deadline));
    }
    if let Some(reason) = dashboard.user.penalized_reason.as_deref().filter(|_| dashboard.user.is_penalized) {
        println!("Penalty:   {reason}");
    }
    if snapshot.shows_review_hint() {
        if let Some(review_deadline) = snapshot.review_deadline {
            println!("Review by: {}", rfc3339(review_deadline));
        }
    }
    if let Some(last_saved) = dashboard.work.as_ref().and_then(|w| w.last_saved) {
        println!("Saved:     {}", rfc3339(last_saved));
    }
    Ok(())
}

async fn run_work(ctx: &CliContext, work: WorkCommand) -> Result<(), CliError> {
    match work.command {
        WorkSubcommand::Start(args) => {
            let request = StartWorkRequest { project_link: args.project_link, password: args.password };
            let ack = ctx.client.start_work(&request).await?;
            println!("{}", ack.message_or("Work started. You have 4 days to submit."));
            Ok(())
        }
        WorkSubcommand::Draft => {
            let draft = ctx.client.draft().await?;
            println!("{}", draft.map(|w| w.content).unwrap_or_default());
            Ok(())
        }
        WorkSubcommand::Save { file } => {
            let workspace = open_workspace(ctx).await?;
            workspace.edit(tokio::fs::read_to_string(&file).await?)?;
            match workspace.save().await? {
                Some(at) => println!("Saved at {}", rfc3339(at)),
                None => println!("Nothing to save"),
            }
            Ok(())
        }
        WorkSubcommand::Submit { file, yes } => {
            let workspace = open_workspace(ctx).await?;
            if let Some(file) = file {
                workspace.edit(tokio::fs::read_to_string(&file).await?)?;
            }
            let confirm = |prompt: &str| yes || ask(prompt);
            let receipt = workspace.submit(&confirm).await?;
            println!("{}", receipt.summary());
            Ok(())
        }
        WorkSubcommand::Edit { file } => run_work_edit(ctx, &file).await,
        WorkSubcommand::Pdfs => print_json(&ctx.client.work_pdfs().await?),
        WorkSubcommand::Download { pdf_id, out } => {
            let bytes = ctx.client.download_pdf(&pdf_id).await?;
            tokio::fs::write(&out, &bytes).await?;
            println!("Wrote {} bytes to {}", bytes.len(), out.display());
            Ok(())
        }
    }
}

async fn open_workspace(ctx: &CliContext) -> Result<Workspace, CliError> {
    Ok(Workspace::for_client(ctx.client.clone(), &ctx.config).await?)
}

async fn run_work_edit(ctx: &CliContext, file: &Path) -> Result<(), CliError> {
    let workspace = open_workspace(ctx).await?;
    print_workspace_state(&workspace.state());
    if !file.exists() {
        tokio::fs::write(file, workspace.html()).await?;
        info!(file = %file.display(), "wrote current draft");
    }

    let mut states = workspace.subscribe();
    let mut saves = workspace.save_status();
    let mut ticker = tokio::time::interval(FILE_POLL);
    let mut last = tokio::fs::read_to_string(file).await?;
    if last != workspace.html() && !workspace.state().read_only {
        workspace.edit(last.clone())?;
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                if let Some(content) = read_if_changed(file, &mut last).await? {
                    if let Err(error) = workspace.edit(content) {
                        eprintln!("{}", error.user_message());
                    }
                }
            }
            Ok(()) = states.changed() => print_workspace_state(&states.borrow_and_update()),
            Ok(()) = saves.changed() => print_save_status(&saves.borrow_and_update()),
        }
    }

    if !workspace.state().read_only {
        match workspace.save().await {
            Ok(Some(at)) => println!("Saved at {}", rfc3339(at)),
            Ok(None) => {}
            Err(error) => eprintln!("final save failed: {}", error.user_message()),
        }
    }
    Ok(())
}

async fn read_if_changed(file: &Path, last: &mut String) -> Result<Option<String>, CliError> {
    let content = tokio::fs::read_to_string(file).await?;
    if content == *last {
        return Ok(None);
    }
    last.clone_from(&content);
    Ok(Some(content))
}

fn print_workspace_state(state: &WorkspaceState) {
    let mut line = format!("[{}] {}", state.snapshot.status, state.countdown());
    if let Some(reason) = state.snapshot.read_only_reason() {
        line.push_str(" | read-only: ");
        line.push_str(reason);
    }
    println!("{line}");
}

fn print_save_status(status: &SaveStatus) {
    if status.saving {
        println!("Saving...");
    } else if let Some(error) = &status.last_error {
        println!("Save failed: {error}");
    } else if let Some(at) = status.last_saved {
        println!("Last saved: {}", rfc3339(at));
    }
}

// =============================================================================
// ADMIN
// =============================================================================

async fn run_admin(ctx: &CliContext, admin: AdminCommand) -> Result<(), CliError> {
    let client = &ctx.client;
    match admin.command {
        AdminSubcommand::Stats => print_json(&client.admin_stats().await?),
        AdminSubcommand::Users { detailed: true } => print_json(&client.detailed_user_data().await?),
        AdminSubcommand::Users { detailed: false } => {
            for user in client.list_users().await? {
                println!("{}  {:<24} {:<32} {}", user.id, user.name, user.email, user.status_badge());
            }
            Ok(())
        }
        AdminSubcommand::User(user) => run_admin_user(ctx, user).await,
        AdminSubcommand::Penalize { user_id, reason } => print_ack(client.penalize(&user_id, &reason).await?.message_or("User penalized")),
        AdminSubcommand::RemovePenalty { user_id } => {
            print_ack(client.remove_penalty(&user_id).await?.message_or("Penalty removed"))
        }
        AdminSubcommand::Password { user_id } => {
            println!("{}", client.user_password(&user_id).await?);
            Ok(())
        }
        AdminSubcommand::SendOtp { user_id } => print_ack(client.send_otp(&user_id).await?.message_or("OTP sent")),
        AdminSubcommand::SendAgreement { user_id } => {
            print_ack(client.send_agreement(&user_id).await?.message_or("Agreement link sent"))
        }
        AdminSubcommand::Work { user_id } => print_json(&client.user_work(&user_id).await?),
        AdminSubcommand::StartWork { user_id, args } => {
            let request = StartWorkRequest { project_link: args.project_link, password: args.password };
            print_ack(client.start_user_work(&user_id, &request).await?.message_or("Work started"))
        }
        AdminSubcommand::EditWork { user_id, file } => run_admin_edit_work(ctx, &user_id, &file).await,
        AdminSubcommand::Agreements(agreements) => run_admin_agreements(ctx, agreements).await,
        AdminSubcommand::SignedAgreements { id: None, .. } => {
            for signed in client.signed_agreements().await? {
                let version = signed.version().map_or_else(|| "-".to_owned(), |v| format!("v{v}"));
                let signed_at = signed.signed_at.map(rfc3339).unwrap_or_default();
                println!(
                    "{}  {:<24} {:<32} {version} {signed_at}",
                    signed.id,
                    signed.signer_name().unwrap_or("-"),
                    signed.signer_email().unwrap_or("-")
                );
            }
            Ok(())
        }
        AdminSubcommand::SignedAgreements { id: Some(id), send_pdf } => {
            if send_pdf {
                return print_ack(client.send_signed_agreement_pdf(&id).await?.message_or("PDF sent"));
            }
            print_json(&client.signed_agreement(&id).await?)
        }
        AdminSubcommand::Pdfs(pdfs) => run_admin_pdfs(ctx, pdfs).await,
        AdminSubcommand::Search { query: None, scope, .. } => run_interactive_search(ctx, scope).await,
        AdminSubcommand::Search { query: Some(query), scope, users_only } => {
            let Some(query) = normalize_query(&query) else {
                return Err(ClientError::Validation("Type at least 2 characters to search".to_owned()).into());
            };
            if users_only {
                return print_json(&client.search_users(&query).await?);
            }
            for line in result_lines(&query, client.universal_search(&query, scope).await?, scope) {
                println!("{line}");
            }
            Ok(())
        }
        AdminSubcommand::Automation => print_ack(client.trigger_automation().await?.message_or("Automation triggered")),
        AdminSubcommand::SiteConfig(args) => {
            let patch = SiteConfigPatch {
                navbar_title: args.navbar_title,
                footer_contact_number: args.contact_number,
                footer_address: args.address,
                footer_email: args.email,
            };
            let current = client.admin_site_config().await?;
            if patch.is_empty() {
                return print_json(&current);
            }
            print_json(&client.update_site_config(&current.patched(&patch)).await?)
        }
        AdminSubcommand::Notifications => run_notifications(ctx).await,
    }
}

async fn run_admin_user(ctx: &CliContext, user: AdminUserCommand) -> Result<(), CliError> {
    match user.command {
        AdminUserSubcommand::Create { name, email, mobile, alt_mobile, password, admin } => {
            let user = NewUser {
                name,
                email,
                mobile_number: mobile,
                alternative_mobile_number: alt_mobile,
                password,
                role: if admin { Role::Admin } else { Role::User },
            };
            print_ack(ctx.client.create_user(&user).await?.message_or("User created"))
        }
        AdminUserSubcommand::Update { user_id, name, email, mobile, alt_mobile } => {
            let update = UserUpdate {
                name,
                email,
                mobile_number: mobile,
                alternative_mobile_number: alt_mobile,
                role: None,
            };
            print_ack(ctx.client.update_user(&user_id, &update).await?.message_or("User updated"))
        }
        AdminUserSubcommand::Delete { user_id } => {
            print_ack(ctx.client.delete_user(&user_id).await?.message_or("User deleted"))
        }
    }
}

async fn run_admin_agreements(ctx: &CliContext, agreements: AdminAgreementCommand) -> Result<(), CliError> {
    match agreements.command {
        AdminAgreementSubcommand::List => print_json(&ctx.client.agreements().await?),
        AdminAgreementSubcommand::Create { file } => {
            let content = tokio::fs::read_to_string(&file).await?;
            print_ack(ctx.client.create_agreement(&content).await?.message_or("Agreement created"))
        }
        AdminAgreementSubcommand::Update { agreement_id, file } => {
            let content = tokio::fs::read_to_string(&file).await?;
            print_ack(ctx.client.update_agreement(&agreement_id, &content).await?.message_or("Agreement updated"))
        }
        AdminAgreementSubcommand::Delete { agreement_id } => {
            print_ack(ctx.client.delete_agreement(&agreement_id).await?.message_or("Agreement deleted"))
        }
    }
}

async fn run_admin_pdfs(ctx: &CliContext, pdfs: AdminPdfCommand) -> Result<(), CliError> {
    let client = &ctx.client;
    match pdfs.command {
        AdminPdfSubcommand::List => {
            for pdf in client.admin_pdfs().await? {
                let state = if pdf.is_active { "active" } else { "inactive" };
                println!("{}  {:<32} {:>10}  {state}", pdf.id, pdf.title, pdf.size_label());
            }
            Ok(())
        }
        AdminPdfSubcommand::Active => print_json(&client.active_pdfs().await?),
        AdminPdfSubcommand::Upload { file, title, description } => {
            print_ack(client.upload_pdf(&file, &title, &description).await?.message_or("PDF uploaded"))
        }
        AdminPdfSubcommand::Toggle { pdf_id } => {
            let current = client.admin_pdfs().await?.into_iter().find(|p| p.id == pdf_id);
            let Some(pdf) = current else {
                return Err(ClientError::Validation(format!("No PDF with id {pdf_id}")).into());
            };
            print_ack(client.toggle_pdf(&pdf.id, pdf.is_active).await?.message_or("PDF updated"))
        }
        AdminPdfSubcommand::Delete { pdf_id } => print_ack(client.delete_pdf(&pdf_id).await?.message_or("PDF deleted")),
    }
}

async fn run_admin_edit_work(ctx: &CliContext, user_id: &str, file: &Path) -> Result<(), CliError> {
    let current = ctx.client.user_work_for_edit(user_id).await?;
    let content = current.work.map(|w| w.content).unwrap_or_default();
    if !file.exists() {
        tokio::fs::write(file, &content).await?;
    }
    if let Some(user) = &current.user {
        println!("Editing work of {} <{}>", user.name, user.email);
    }

    let store: Arc<dyn DraftStore> = Arc::new(AdminDraftStore::new(ctx.client.clone(), user_id));
    let mut last = content.clone();
    let saver = AutoSaver::spawn(store, WriteToken::new(), ctx.config.autosave_interval, content, true);
    let mut saves = saver.subscribe();
    let mut ticker = tokio::time::interval(FILE_POLL);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                if let Some(content) = read_if_changed(file, &mut last).await? {
                    saver.changed(content);
                }
            }
            Ok(()) = saves.changed() => print_save_status(&saves.borrow_and_update()),
        }
    }

    match saver.save_now().await {
        Ok(Some(at)) => println!("Saved at {}", rfc3339(at)),
        Ok(None) => {}
        Err(error) => eprintln!("final save failed: {}", error.user_message()),
    }
    Ok(())
}

/// Each stdin line replaces the query; a search goes out once typing pauses.
async fn run_interactive_search(ctx: &CliContext, scope: SearchScope) -> Result<(), CliError> {
    let mut search = SearchBox::new(ctx.config.search_debounce);
    search.set_scope(scope, Instant::now());
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        let due = search.due();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if search.set_query(line, Instant::now()) == SearchAction::Clear {
                    println!("(cleared)");
                }
            }
            () = tokio::time::sleep_until(due.unwrap_or_else(Instant::now)), if due.is_some() => {
                if let SearchAction::Issue(request) = search.poll(Instant::now()) {
                    for line in search_lines(&ctx.client, &request).await {
                        println!("{line}");
                    }
                }
            }
        }
    }
    Ok(())
}

/// Output for one interactive search. A failed request becomes an error
/// line so the session keeps reading queries.
async fn search_lines(client: &ApiClient, request: &SearchRequest) -> Vec<String> {
    debug!(query = %request.query, scope = ?request.scope, "searching");
    match client.universal_search(&request.query, request.scope).await {
        Ok(results) => result_lines(&request.query, results, request.scope),
        Err(error) => vec![format!("error: {}", error.user_message())],
    }
}

fn result_lines(query: &str, results: SearchResults, scope: SearchScope) -> Vec<String> {
    if results.is_empty() {
        return vec![format!("No results found for \"{query}\"")];
    }
    results
        .into_results(scope)
        .into_iter()
        .map(|result| format!("{:?}  {}  {} | {}", result.kind(), result.id(), result.title(), result.detail()))
        .collect()
}

async fn run_notifications(ctx: &CliContext) -> Result<(), CliError> {
    let subscriber = NotificationSubscriber::spawn(ctx.client.base_url(), ctx.client.session())?;
    let mut events = subscriber.subscribe();
    let mut status = subscriber.watch_status();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => println!(
                    "{}  {} <{}> started work: {}",
                    rfc3339(event.timestamp),
                    event.user_name,
                    event.user_email,
                    event.project_link
                ),
                Err(RecvError::Lagged(missed)) => eprintln!("missed {missed} notifications"),
                Err(RecvError::Closed) => break,
            },
            Ok(()) = status.changed() => eprintln!("connection: {:?}", *status.borrow_and_update()),
        }
    }
    Ok(())
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn print_ack(message: &str) -> Result<(), CliError> {
    println!("{message}");
    Ok(())
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

fn ask(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
