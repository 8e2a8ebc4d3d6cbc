//! WordPress Content Audit CLI - Inventory and audit WordPress sites

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use wordpress_content_audit::{
    ContentReport, Error, LinkChecker, ReportStore, Result, Site, aggregate_content,
    analyzers::{
        accessibility::analyze_accessibility, performance::measure_performance,
        security::analyze_security, seo::audit_seo, theme_plugin::analyze_theme_plugin,
        users::enumerate_users,
    },
    output::{OutputFormat, Render, output_json, output_report},
    server::{AppState, serve},
    write_csv,
};

/// WordPress content auditor - inventories content and runs site audits
#[derive(Parser, Debug)]
#[command(name = "wordpress-content-audit")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inventory pages, posts, custom types, media and archives
    Content {
        #[command(flatten)]
        site: SiteArgs,
        #[command(flatten)]
        output: OutputArgs,
        /// Save the report in the report store
        #[arg(long)]
        save: bool,
        /// Also write the report as CSV to this file
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Score on-page SEO for every page and published post
    Seo {
        #[command(flatten)]
        site: SiteArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Check the homepage for common accessibility problems
    Accessibility {
        #[command(flatten)]
        site: SiteArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Inspect security headers and certificate expiry
    Security {
        #[command(flatten)]
        site: SiteArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Detect themes and plugins from asset URLs
    ThemePlugin {
        #[command(flatten)]
        site: SiteArgs,
        /// Page to scan instead of the homepage (repeatable)
        #[arg(long = "page", value_name = "URL")]
        pages: Vec<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List users exposed by the REST API
    Users {
        #[command(flatten)]
        site: SiteArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Time a homepage request
    Performance {
        #[command(flatten)]
        site: SiteArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Inventory the site, then HEAD every item link
    Broken {
        #[command(flatten)]
        site: SiteArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Manage saved reports
    Reports {
        #[command(subcommand)]
        action: ReportsAction,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Run the JSON HTTP API
    Serve {
        /// Address to bind
        #[arg(long, env = "HOST", default_value = "127.0.0.1")]
        host: IpAddr,
        /// Port to bind
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,
        /// Allow auditing private/internal IP addresses
        #[arg(long = "allow-private")]
        allow_private: bool,
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Subcommand, Debug)]
enum ReportsAction {
    /// List saved reports for a domain, newest first
    List {
        domain: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print a saved report as JSON
    Show { domain: String, filename: String },
    /// Delete a saved report
    Delete { domain: String, filename: String },
    /// Export a saved content report as CSV
    Export {
        domain: String,
        filename: String,
        /// Output file (stdout if omitted)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct SiteArgs {
    /// URL of the WordPress site
    url: String,

    /// HTTP basic auth username
    #[arg(short = 'u', long, env = "WP_AUDIT_USERNAME")]
    username: Option<String>,

    /// HTTP basic auth password
    #[arg(short = 'p', long, env = "WP_AUDIT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Allow scanning private/internal IP addresses (localhost, 192.168.x.x, etc.)
    #[arg(long = "allow-private")]
    allow_private: bool,
}

impl SiteArgs {
    async fn site(&self) -> Result<Site> {
        Site::builder(&self.url)
            .credentials(self.username.clone(), self.password.clone())
            .allow_private(self.allow_private)
            .build()
            .await
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output format
    #[arg(short = 'o', long = "output", default_value = "human", value_enum)]
    output_format: OutputFormatArg,
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// Directory holding saved reports
    #[arg(long, env = "WP_AUDIT_REPORTS_DIR", default_value = "reports")]
    reports_dir: PathBuf,
}

/// Output format argument
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
    None,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::None => OutputFormat::None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = match cli.command {
        Command::Serve { .. } => "wordpress_content_audit=info,tower_http=info",
        _ => "warn",
    };
    init_tracing(default_filter);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays machine-readable
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Content {
            site,
            output,
            save,
            csv,
            store,
        } => {
            let format = start(&output);
            let site = site.site().await?;
            let report = aggregate_content(&site).await;
            if save {
                let filename = ReportStore::open(&store.reports_dir)?.save(site.domain(), &report)?;
                eprintln!("Saved report {}", filename);
            }
            if let Some(path) = csv {
                write_csv_file(&report, &path)?;
            }
            print(&report, format)
        }
        Command::Seo { site, output } => {
            let format = start(&output);
            print(audit_seo(&site.site().await?).await?.as_slice(), format)
        }
        Command::Accessibility { site, output } => {
            let format = start(&output);
            print(&analyze_accessibility(&site.site().await?).await?, format)
        }
        Command::Security { site, output } => {
            let format = start(&output);
            print(&analyze_security(&site.site().await?).await?, format)
        }
        Command::ThemePlugin {
            site,
            pages,
            output,
        } => {
            let format = start(&output);
            print(&analyze_theme_plugin(&site.site().await?, &pages).await, format)
        }
        Command::Users { site, output } => {
            let format = start(&output);
            print(enumerate_users(&site.site().await?).await?.as_slice(), format)
        }
        Command::Performance { site, output } => {
            let format = start(&output);
            print(&measure_performance(&site.site().await?).await?, format)
        }
        Command::Broken { site, output } => {
            let format = start(&output);
            let site = site.site().await?;
            let report = aggregate_content(&site).await;
            let broken = LinkChecker::new(site.allow_private())?
                .find_broken(&report.groups)
                .await;
            print(broken.as_slice(), format)
        }
        Command::Reports { action, store } => {
            run_reports(action, &ReportStore::open(&store.reports_dir)?)
        }
        Command::Serve {
            host,
            port,
            allow_private,
            store,
        } => {
            print_banner();
            let state = AppState::new(ReportStore::open(&store.reports_dir)?, allow_private);
            serve(SocketAddr::new(host, port), state).await
        }
    }
}

fn run_reports(action: ReportsAction, store: &ReportStore) -> Result<()> {
    match action {
        ReportsAction::List { domain, output } => {
            let format = start(&output);
            print(store.list(&domain)?.as_slice(), format)
        }
        ReportsAction::Show { domain, filename } => {
            let report = load_report(store, &domain, &filename)?;
            output_json(&report, &mut io::stdout().lock())
        }
        ReportsAction::Delete { domain, filename } => {
            if store.delete(&domain, &filename)? {
                eprintln!("Deleted {}", filename);
                Ok(())
            } else {
                Err(not_found(&domain, &filename))
            }
        }
        ReportsAction::Export {
            domain,
            filename,
            out,
        } => {
            let report: ContentReport =
                serde_json::from_value(load_report(store, &domain, &filename)?)?;
            match out {
                Some(path) => write_csv_file(&report, &path),
                None => write_csv(&report.groups, &mut io::stdout().lock()),
            }
        }
    }
}

fn load_report(store: &ReportStore, domain: &str, filename: &str) -> Result<serde_json::Value> {
    store
        .load(domain, filename)?
        .ok_or_else(|| not_found(domain, filename))
}

fn not_found(domain: &str, filename: &str) -> Error {
    Error::Storage(io::Error::new(
        io::ErrorKind::NotFound,
        format!("no saved report {}/{}", domain, filename),
    ))
}

fn write_csv_file(report: &ContentReport, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(Error::OutputFailed)?;
    write_csv(&report.groups, &mut BufWriter::new(file))
}

/// Resolve the output format, printing the banner for human output
fn start(output: &OutputArgs) -> OutputFormat {
    if matches!(output.output_format, OutputFormatArg::Human) {
        print_banner();
    }
    output.output_format.into()
}

fn print<T: Render + serde::Serialize + ?Sized>(report: &T, format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    output_report(report, format, &mut writer)
}

fn print_banner() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    println!("WordPress Content Audit v{}", VERSION);
    println!("by Robert F. Ecker <robert@robdotec.com>");
    println!();
}
