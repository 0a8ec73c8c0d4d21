use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tidc::config::{Config, OutputFormat};
use tidc::idc::auth::{Credentials, Session};
use tidc::idc::client::IdcClient;
use tidc::idc::http::{format_idc_error, IdcHttpClient};
use tidc::idc::IdcError;
use tidc::ops::variables::{self, ExpressionType, VariablesExport};
use tidc::ops::{social_idp, wsfed};
use tidc::progress::TracingProgress;
use tidc::resource::json::extract_json_value;
use tidc::VERSION;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command line client for identity cloud administration
#[derive(Parser, Debug)]
#[command(name = "tidc", version = VERSION, about, long_about = None)]
struct Args {
    /// Tenant URL including the deployment path (e.g. https://tenant.example.com/am)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Realm to operate in
    #[arg(short, long, global = true)]
    realm: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Transport retry strategy: nothing, network or everything
    #[arg(long, global = true)]
    retry: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    output: Option<OutputArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputArg {
    Json,
    Yaml,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Json => OutputFormat::Json,
            OutputArg::Yaml => OutputFormat::Yaml,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Environment variables
    #[command(subcommand)]
    Variable(VariableCommand),
    /// Social identity providers
    #[command(subcommand)]
    Idp(IdpCommand),
    /// WS-Federation admin
    #[command(subcommand)]
    Wsfed(WsfedCommand),
    /// Persistent settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum VariableCommand {
    /// List all variables
    List,
    /// Show one variable
    Get { id: String },
    /// Export one or all variables
    Export {
        /// Variable id; all variables when omitted
        id: Option<String>,
        /// Keep values base64 encoded
        #[arg(long)]
        no_decode: bool,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Import one or all variables from an export file
    Import {
        /// Variable id; all variables when omitted
        #[arg(short, long)]
        id: Option<String>,
        file: PathBuf,
        /// Number of concurrent writes (sequential when omitted)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Create a new variable
    Create {
        id: String,
        value: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Expression type (string, int, bool, ...)
        #[arg(short = 't', long = "type", default_value = "string")]
        expression_type: String,
    },
    /// Delete a variable
    Delete { id: String },
    /// Set the description of a variable
    Describe { id: String, description: String },
}

#[derive(Subcommand, Debug)]
enum IdpCommand {
    /// List provider types
    Types,
    /// List providers, optionally of one type
    List {
        #[arg(short = 't', long = "type")]
        provider_type: Option<String>,
    },
    /// Show one provider
    Get {
        id: String,
        #[arg(short = 't', long = "type")]
        provider_type: Option<String>,
    },
    /// Export one or all providers
    Export {
        id: Option<String>,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Import one or all providers from an export file
    Import {
        #[arg(short, long)]
        id: Option<String>,
        file: PathBuf,
    },
    /// Delete a provider
    Delete {
        id: String,
        #[arg(short = 't', long = "type")]
        provider_type: String,
    },
}

#[derive(Subcommand, Debug)]
enum WsfedCommand {
    SpConnections,
    FederationInfo,
    VirtualHosts,
    Adapters,
    /// Replicate configuration to the cluster
    Replicate,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the stored configuration
    Show,
    /// Store a setting (host, realm, retry, output)
    Set { key: String, value: String },
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tidc {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("tidc").join("tidc.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tidc").join("tidc.log");
    }
    PathBuf::from("tidc.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        match err.downcast_ref::<IdcError>() {
            Some(idc) => {
                tracing::error!("{}", idc.chain_display());
                eprintln!("Error: {}", idc.message());
                eprintln!("  {}", format_idc_error(idc));
                for (idx, item) in idc.errors().iter().enumerate() {
                    eprintln!("  [{}] {}", idx + 1, item.chain_display());
                }
            }
            None => eprintln!("Error: {err:?}"),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load();
    let output = config.effective_output(args.output.map(Into::into));

    let command = match args.command {
        Command::Config(cmd) => return run_config(&mut config, cmd, output),
        other => other,
    };

    let client = connect(&config, &args.host, &args.realm, &args.retry)?;

    match command {
        Command::Variable(cmd) => run_variable(&client, cmd, output).await,
        Command::Idp(cmd) => run_idp(&client, cmd, output).await,
        Command::Wsfed(cmd) => run_wsfed(&client, cmd, output).await,
        Command::Config(_) => Ok(()),
    }
}

fn connect(
    config: &Config,
    host: &Option<String>,
    realm: &Option<String>,
    retry: &Option<String>,
) -> Result<IdcClient> {
    let host = config.effective_host(host.as_deref()).context(
        "No tenant configured. Set TIDC_HOST, use --host or run `tidc config set host <url>`",
    )?;
    let realm = config.effective_realm(realm.as_deref());
    let retry = config.effective_retry(retry.as_deref())?;

    tracing::info!("Using host: {}, realm: {}, retry: {}", host, realm, retry.as_str());

    let session = Session::new(&host, &realm, Credentials::from_env())?;
    let http = IdcHttpClient::new()
        .map_err(IdcError::from)?
        .with_retry(retry);

    Ok(IdcClient::with_http(session, http).with_progress(Arc::new(TracingProgress::new())))
}

async fn run_variable(client: &IdcClient, cmd: VariableCommand, output: OutputFormat) -> Result<()> {
    match cmd {
        VariableCommand::List => {
            let list = variables::read_variables(client).await?;
            print_rows(&list, &["_id", "expressionType", "description"])
        }
        VariableCommand::Get { id } => print(&variables::read_variable(client, &id).await?, output),
        VariableCommand::Export { id, no_decode, file } => {
            let export = match id {
                Some(id) => variables::export_variable(client, &id, no_decode).await?,
                None => variables::export_variables(client, no_decode).await?,
            };
            write_export(&export, file.as_deref(), output)
        }
        VariableCommand::Import {
            id,
            file,
            concurrency,
        } => {
            let data: VariablesExport = read_import(&file)?;
            let imported = match (id, concurrency) {
                (Some(id), _) => vec![variables::import_variable(client, &id, &data).await?],
                (None, Some(limit)) => {
                    variables::import_variables_concurrent(client, &data, limit).await?
                }
                (None, None) => variables::import_variables(client, &data).await?,
            };
            eprintln!("Imported {} variables.", imported.len());
            Ok(())
        }
        VariableCommand::Create {
            id,
            value,
            description,
            expression_type,
        } => {
            let expression_type = ExpressionType::parse(&expression_type)
                .with_context(|| format!("Unknown expression type '{}'", expression_type))?;
            let created = variables::create_variable(
                client,
                &id,
                &value,
                description.as_deref(),
                expression_type,
            )
            .await?;
            print(&created, output)
        }
        VariableCommand::Delete { id } => {
            print(&variables::delete_variable(client, &id).await?, output)
        }
        VariableCommand::Describe { id, description } => print(
            &variables::update_variable_description(client, &id, &description).await?,
            output,
        ),
    }
}

async fn run_idp(client: &IdcClient, cmd: IdpCommand, output: OutputFormat) -> Result<()> {
    match cmd {
        IdpCommand::Types => {
            let types = social_idp::read_provider_types(client).await?;
            print_rows(&types, &["_id", "name"])
        }
        IdpCommand::List { provider_type } => {
            let providers = match provider_type {
                Some(t) => social_idp::read_providers_by_type(client, &t).await?,
                None => social_idp::read_providers(client).await?,
            };
            print_rows(&providers, &["_id", "_type._id", "enabled"])
        }
        IdpCommand::Get { id, provider_type } => {
            let provider = match provider_type {
                Some(t) => social_idp::read_provider(client, &t, &id).await?,
                None => social_idp::find_provider(client, &id).await?,
            };
            print(&provider, output)
        }
        IdpCommand::Export { id, file } => {
            let export = match id {
                Some(id) => social_idp::export_provider(client, &id).await?,
                None => social_idp::export_providers(client).await?,
            };
            write_export(&export, file.as_deref(), output)
        }
        IdpCommand::Import { id, file } => {
            let data: social_idp::SocialIdpExport = read_import(&file)?;
            let count = match id {
                Some(id) => social_idp::import_provider(client, &id, &data).await.map(|_| 1)?,
                None => social_idp::import_providers(client, &data).await?.len(),
            };
            eprintln!("Imported {} providers.", count);
            Ok(())
        }
        IdpCommand::Delete { id, provider_type } => print(
            &social_idp::delete_provider(client, &provider_type, &id).await?,
            output,
        ),
    }
}

async fn run_wsfed(client: &IdcClient, cmd: WsfedCommand, output: OutputFormat) -> Result<()> {
    match cmd {
        WsfedCommand::SpConnections => {
            let connections = wsfed::read_sp_connections(client).await?;
            print_rows(&connections, &["id", "name", "entityId", "active"])
        }
        WsfedCommand::FederationInfo => print(&wsfed::read_federation_info(client).await?, output),
        WsfedCommand::VirtualHosts => print(&wsfed::read_virtual_host_names(client).await?, output),
        WsfedCommand::Adapters => {
            let adapters = wsfed::read_idp_adapters(client).await?;
            print_rows(&adapters, &["id", "name", "pluginDescriptorRef.id"])
        }
        WsfedCommand::Replicate => print(&wsfed::replicate(client).await?, output),
    }
}

fn run_config(config: &mut Config, cmd: ConfigCommand, output: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            if let Some(path) = Config::config_path() {
                eprintln!("# {}", path.display());
            }
            print(config, output)
        }
        ConfigCommand::Set { key, value } => {
            config.set(&key, &value)?;
            eprintln!("Set {} = {}", key, value);
            Ok(())
        }
    }
}

fn render<T: Serialize>(value: &T, output: OutputFormat) -> Result<String> {
    Ok(match output {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    })
}

fn print<T: Serialize>(value: &T, output: OutputFormat) -> Result<()> {
    println!("{}", render(value, output)?);
    Ok(())
}

/// Print one tab-separated row per item
fn print_rows<T: Serialize>(items: &[T], columns: &[&str]) -> Result<()> {
    println!("{}", columns.join("\t"));
    for item in items {
        let value: Value = serde_json::to_value(item)?;
        let row: Vec<String> = columns
            .iter()
            .map(|path| extract_json_value(&value, path))
            .collect();
        println!("{}", row.join("\t"));
    }
    Ok(())
}

fn write_export<T: Serialize>(export: &T, file: Option<&Path>, output: OutputFormat) -> Result<()> {
    let content = render(export, output)?;
    match file {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Exported to {}", path.display());
            Ok(())
        }
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

/// Read an export file, JSON or YAML
fn read_import<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}
