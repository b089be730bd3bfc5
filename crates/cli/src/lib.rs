use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use vcscore_directory::logo::fallback_avatar;
use vcscore_directory::{
    CompanyRecord, DirectoryConfig, DirectoryLoader, DirectorySession, LoadOutcome, LoadReport,
    LogoResolver, PageState, SourceLocation,
};
use vcscore_protocol::serialize_json_pretty;

pub mod http_api;
pub mod server_security;
pub mod sheet;
pub mod store;

const DEFAULT_BIND: &str = "127.0.0.1:3001";
const DEFAULT_STORE: &str = "src/data/companies.json";

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    print_stdout(&serialize_json_pretty(value)?)
}

#[derive(Parser)]
#[command(name = "vcscore")]
#[command(about = "Score-ordered directory of venture-capital firms", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./vcscore.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Emit JSON on stdout (implies --quiet)
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the top of the directory, one page at a time
    List(ListArgs),

    /// Case-insensitive name search over the whole directory
    Search(SearchArgs),

    /// Show one firm and its portfolio
    Show(ShowArgs),

    /// Resolve display logos for firm names
    Logo(LogoArgs),

    /// Serve the admin companies API (GET/POST /api/companies)
    Serve(ServeArgs),

    /// Fetch the published score sheet and save it as JSON
    #[command(name = "fetch-sheet")]
    FetchSheet(FetchSheetArgs),

    /// Print the /vcs/<id> route of every firm in a saved sheet
    Routes(RoutesArgs),

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct ListArgs {
    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: usize,
}

#[derive(Args)]
struct SearchArgs {
    term: String,
}

#[derive(Args)]
struct ShowArgs {
    /// Firm slug, e.g. "andreessen-horowitz"
    id: String,

    /// Probe the logo service when the record has no logo of its own
    #[arg(long)]
    resolve_logo: bool,
}

#[derive(Args)]
struct LogoArgs {
    names: Vec<String>,

    /// Drop the logo cache (memory and file) before resolving
    #[arg(long)]
    clear_cache: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: String,

    /// Flat JSON file backing the API
    #[arg(long, default_value = DEFAULT_STORE)]
    store: PathBuf,

    /// Bearer token for writes (falls back to VCSCORE_ADMIN_TOKEN)
    #[arg(long)]
    auth_token: Option<String>,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,
}

#[derive(Args)]
struct FetchSheetArgs {
    /// Published CSV URL or local CSV path
    #[arg(long, default_value = sheet::DEFAULT_SHEET_URL)]
    source: String,

    #[arg(long, default_value = sheet::DEFAULT_SHEET_OUTPUT)]
    out: PathBuf,
}

#[derive(Args)]
struct RoutesArgs {
    /// Saved sheet JSON
    #[arg(long, default_value = sheet::DEFAULT_SHEET_OUTPUT)]
    from: PathBuf,
}

#[derive(Serialize)]
struct ListOutput {
    state: PageState,
    report: LoadReport,
    companies: Vec<CompanyRecord>,
}

#[derive(Serialize)]
struct LogoOutput {
    name: String,
    logo: String,
    generated: bool,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config =
        DirectoryConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::List(args) => run_list(args, &config, cli.json).await?,
        Commands::Search(args) => run_search(args, &config, cli.json).await?,
        Commands::Show(args) => run_show(args, &config, cli.json).await?,
        Commands::Logo(args) => run_logo(args, &config, cli.json).await?,
        Commands::Serve(args) => serve(args).await?,
        Commands::FetchSheet(args) => run_fetch_sheet(args, cli.json).await?,
        Commands::Routes(args) => run_routes(args, cli.json).await?,
        Commands::Config => print_stdout(&toml_or_json(&config, cli.json)?)?,
    }

    Ok(())
}

async fn load_session(config: &DirectoryConfig) -> Result<(DirectorySession, LoadReport)> {
    let session = DirectorySession::new(DirectoryLoader::from_config(config), config.page_size);
    match session.load().await {
        LoadOutcome::Applied(report) => Ok((session, report)),
        LoadOutcome::Failed | LoadOutcome::Stale => {
            let state = session.state().await;
            anyhow::bail!(state
                .error
                .unwrap_or_else(|| vcscore_directory::LOAD_FAILED.to_string()))
        }
    }
}

async fn run_list(args: ListArgs, config: &DirectoryConfig, json: bool) -> Result<()> {
    let (session, report) = load_session(config).await?;
    for _ in 1..args.pages.max(1) {
        if session.load_more().await == 0 {
            break;
        }
    }

    let companies = session.visible().await;
    let state = session.state().await;
    if json {
        return print_json(&ListOutput {
            state,
            report,
            companies,
        });
    }

    for (rank, company) in companies.iter().enumerate() {
        print_company_line(rank + 1, company)?;
    }
    print_stdout(&format!(
        "Showing {} of {} firms{}",
        state.loaded_count,
        state.total_count,
        if state.has_more {
            " (use --pages to load more)"
        } else {
            ""
        }
    ))
}

async fn run_search(args: SearchArgs, config: &DirectoryConfig, json: bool) -> Result<()> {
    let (session, _) = load_session(config).await?;
    let hits = session.search(&args.term).await;
    if json {
        return print_json(&hits);
    }
    if hits.is_empty() {
        return print_stdout(&format!("No firms found matching \"{}\"", args.term));
    }
    for (rank, company) in hits.iter().enumerate() {
        print_company_line(rank + 1, company)?;
    }
    Ok(())
}

async fn run_show(args: ShowArgs, config: &DirectoryConfig, json: bool) -> Result<()> {
    let (session, _) = load_session(config).await?;
    let Some(mut company) = session.controller().await.find(&args.id).cloned() else {
        anyhow::bail!("No firm with id \"{}\"", args.id)
    };

    // seed records carry a generated avatar until a real logo is found
    let generated = company
        .logo_url
        .as_deref()
        .map_or(true, |url| url.starts_with("data:"));
    if args.resolve_logo && generated {
        let resolver = LogoResolver::from_config(config.logo.clone());
        company.logo_url = Some(resolver.resolve(&company.name).await);
    } else if company.logo_url.is_none() {
        company.logo_url = Some(fallback_avatar(&company.name, &config.logo.palette));
    }

    if json {
        return print_json(&company);
    }
    print_stdout(&format!("{} ({})", company.name, company.route()))?;
    print_stdout(&format!("Score: {}", company.score))?;
    if let Some(logo) = &company.logo_url {
        print_stdout(&format!("Logo: {logo}"))?;
    }
    if company.portfolio.is_empty() {
        return print_stdout("No portfolio information available.");
    }
    print_stdout("Portfolio:")?;
    for entry in &company.portfolio {
        print_stdout(&format!(
            "  - {} | {} | {}",
            entry.name, entry.announcement_date, entry.investment_type
        ))?;
    }
    Ok(())
}

async fn run_logo(args: LogoArgs, config: &DirectoryConfig, json: bool) -> Result<()> {
    let resolver = Arc::new(LogoResolver::from_config(config.logo.clone()));
    if args.clear_cache {
        resolver.clear_cache();
        log::info!("Logo cache cleared");
    }

    let resolved = resolver.resolve_batch(&args.names).await;
    let output: Vec<LogoOutput> = resolved
        .into_iter()
        .map(|(name, logo)| {
            let generated = logo.is_none();
            let logo = logo.unwrap_or_else(|| fallback_avatar(&name, &config.logo.palette));
            LogoOutput {
                name,
                logo,
                generated,
            }
        })
        .collect();

    if json {
        return print_json(&output);
    }
    for item in &output {
        let marker = if item.generated { " (generated)" } else { "" };
        print_stdout(&format!("{}: {}{marker}", item.name, item.logo))?;
    }
    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    server_security::admin_bind_addrs(&args.bind, args.public).await?;
    let token = server_security::AdminToken::from_sources(
        args.auth_token.clone(),
        std::env::var(server_security::ADMIN_TOKEN_ENV).ok(),
    )?;

    let state = Arc::new(http_api::AdminState {
        store: store::CompanyStore::new(&args.store),
        token,
    });
    let app = http_api::router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!(
        "API Server running on {base_url}{}",
        http_api::COMPANIES_ROUTE
    ))?;
    print_stdout(&format!("Store: {}", args.store.display()))?;
    print_stdout(&format!(
        "Writes require header 'Authorization: Bearer ${}'",
        server_security::ADMIN_TOKEN_ENV
    ))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_fetch_sheet(args: FetchSheetArgs, json: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let entries = sheet::fetch_sheet(&client, &SourceLocation::parse(&args.source)).await;
    if entries.is_empty() {
        anyhow::bail!("No VC rows fetched from {}", args.source)
    }
    sheet::write_sheet(&entries, &args.out).await?;
    log::info!(
        "Successfully fetched and saved {} VCs to {}",
        entries.len(),
        args.out.display()
    );

    if json {
        return print_json(&entries);
    }
    print_stdout(&format!("Saved {} VCs to {}", entries.len(), args.out.display()))
}

async fn run_routes(args: RoutesArgs, json: bool) -> Result<()> {
    let entries = sheet::read_sheet(&args.from).await?;
    let routes = sheet::routes(&entries);
    if json {
        return print_json(&routes);
    }
    for route in routes {
        print_stdout(&route)?;
    }
    Ok(())
}

fn print_company_line(rank: usize, company: &CompanyRecord) -> Result<()> {
    let portfolio = match company.portfolio.len() {
        0 => String::new(),
        n => format!("  [{n} portfolio]"),
    };
    print_stdout(&format!(
        "{rank:>4}. {:>5}  {}{portfolio}",
        company.score, company.name
    ))
}

fn toml_or_json(config: &DirectoryConfig, json: bool) -> Result<String> {
    if json {
        return serialize_json_pretty(config);
    }
    toml::to_string_pretty(config).context("Failed to render config as TOML")
}
