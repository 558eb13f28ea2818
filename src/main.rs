use bucket_browser::{
    AppState, BrowserController, Config, Credentials, Persistence, SessionState, create_app,
    browser::{
        DirectoryDestination, DownloadOutcome, FixedDestination, SaveDialog, SortDirection, SortKey,
        SortState, navigator,
    },
    types::Prefix,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Host API defaults
const HOST: &str = "127.0.0.1";
const PORT: u16 = 3000;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// bucket-browser: browse and transfer objects in S3-compatible storage
#[derive(Parser, Debug)]
#[command(name = "bucket-browser")]
#[command(about = "Browse buckets and move files to and from S3-compatible object storage", long_about = None)]
struct Cli {
    /// Path to an optional JSON or YAML configuration file
    #[arg(short, long, env = "CONFIG_PATH", global = true)]
    config: Option<PathBuf>,

    /// Service endpoint, e.g. https://<account>.r2.cloudflarestorage.com
    #[arg(long, env = "S3_ENDPOINT", global = true)]
    endpoint: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", global = true)]
    access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true, global = true)]
    secret_access_key: Option<String>,

    /// Open this bucket directly after login
    #[arg(long, env = "S3_BUCKET", global = true)]
    bucket: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the local host API
    Serve {
        #[arg(long, env = "HOST", default_value = HOST)]
        host: String,
        #[arg(short, long, env = "PORT", default_value_t = PORT)]
        port: u16,
    },
    /// List buckets
    Buckets,
    /// List one folder level of a bucket
    Ls {
        bucket: String,
        #[arg(default_value = "")]
        prefix: String,
        #[arg(long, value_enum)]
        sort: Option<SortColumn>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
        /// Case-insensitive substring filter on keys
        #[arg(long)]
        search: Option<String>,
    },
    /// Upload a local file into a folder
    Put {
        bucket: String,
        file: PathBuf,
        #[arg(long, default_value = "")]
        prefix: String,
    },
    /// Download an object
    Get {
        bucket: String,
        key: String,
        /// Defaults to the object's file name in the working directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete an object
    Rm { bucket: String, key: String },
    /// Check credentials by listing buckets
    Login {
        /// Remember these credentials; without it any saved ones are forgotten
        #[arg(long)]
        remember: bool,
    },
    /// Forget saved credentials
    Forget,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortColumn {
    Name,
    Size,
    Modified,
}

impl From<SortColumn> for SortKey {
    fn from(column: SortColumn) -> Self {
        match column {
            SortColumn::Name => SortKey::Name,
            SortColumn::Size => SortKey::Size,
            SortColumn::Modified => SortKey::LastModified,
        }
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so listings on stdout stay pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)?;
            tracing::info!("Loaded configuration from {}", path.display());
            config
        }
        None => Config::default(),
    };

    let gateway = config.gateway();
    let store = config.credential_store()?;

    match cli.command {
        Command::Serve { ref host, port } => {
            let app_state = AppState::new(gateway, store);
            let app = create_app(app_state, config.api_token.clone());

            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Host API listening on {}", listener.local_addr()?);
            if config.api_token.is_none() {
                tracing::warn!("No api_token configured; the host API accepts any local caller");
            }

            axum::serve(listener, app).await?;
            Ok(())
        }
        Command::Forget => {
            BrowserController::new(gateway, store).forget_credentials()?;
            println!("Saved credentials removed");
            Ok(())
        }
        ref command => {
            let controller = BrowserController::new(gateway, store);
            let credentials = resolve_credentials(&cli, &controller)?;
            execute(&controller, credentials, command).await
        }
    }
}

/// Flags and env first, then whatever was remembered
fn resolve_credentials(cli: &Cli, controller: &BrowserController) -> CliResult<Credentials> {
    let saved = controller.saved_credentials().unwrap_or_default();
    let pick = |flag: &Option<String>, remembered: &str| {
        flag.clone()
            .or_else(|| Some(remembered.to_string()).filter(|value| !value.is_empty()))
    };

    let endpoint = pick(&cli.endpoint, &saved.endpoint)
        .ok_or("No endpoint given; use --endpoint or S3_ENDPOINT")?;
    let access_key_id = pick(&cli.access_key_id, &saved.access_key_id)
        .ok_or("No access key id given; use --access-key-id or AWS_ACCESS_KEY_ID")?;
    let secret_access_key = pick(&cli.secret_access_key, &saved.secret_access_key)
        .ok_or("No secret access key given; use --secret-access-key or AWS_SECRET_ACCESS_KEY")?;

    let credentials = Credentials::new(endpoint, access_key_id, secret_access_key);
    Ok(match cli.bucket.clone().or(saved.bucket_name) {
        Some(bucket) => credentials.with_bucket(bucket),
        None => credentials,
    })
}

async fn execute(
    controller: &BrowserController,
    credentials: Credentials,
    command: &Command,
) -> CliResult<()> {
    match command {
        Command::Buckets => {
            let mut credentials = credentials;
            credentials.bucket_name = None;
            controller.login(credentials, Persistence::Leave).await;
            let state = settled(controller).await?;
            for bucket in &state.buckets {
                match bucket.creation_date {
                    Some(created) => println!("{}  {}", created.format("%Y-%m-%d %H:%M:%S"), bucket.name),
                    None => println!("{:>19}  {}", "", bucket.name),
                }
            }
        }
        Command::Ls {
            bucket,
            prefix,
            sort,
            desc,
            search,
        } => {
            open(controller, credentials, bucket, prefix).await?;

            if let Some(column) = sort {
                let direction = if *desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                };
                // Drives the column toggle until it lands on the requested order
                let target = SortState::new((*column).into(), direction);
                while controller.snapshot().await.sort != target {
                    controller.sort_by(target.key).await;
                }
            }
            if let Some(term) = search {
                controller.set_search_term(term).await;
            }

            print_listing(&controller.snapshot().await);
        }
        Command::Put {
            bucket,
            file,
            prefix,
        } => {
            open(controller, credentials, bucket, prefix).await?;
            let key = controller.upload(file).await?;
            println!("upload: {} to {}/{}", file.display(), bucket, key);
        }
        Command::Get {
            bucket,
            key,
            output,
        } => {
            open(controller, credentials, bucket, "").await?;

            let dialog: Box<dyn SaveDialog> = match output {
                Some(path) => Box::new(FixedDestination(Some(path.clone()))),
                None => Box::new(DirectoryDestination(PathBuf::from("."))),
            };

            match controller.download(key, dialog.as_ref()).await? {
                DownloadOutcome::Completed { path, bytes } => {
                    println!("download: {}/{} to {} ({} bytes)", bucket, key, path.display(), bytes)
                }
                DownloadOutcome::Canceled => println!("download: {} has no file name; pass --output", key),
            }
        }
        Command::Rm { bucket, key } => {
            open(controller, credentials, bucket, "").await?;
            controller.delete(key).await?;
            println!("delete: {}/{}", bucket, key);
        }
        Command::Login { remember } => {
            let persistence = if *remember {
                Persistence::Save
            } else {
                Persistence::Clear
            };
            let hint = credentials.key_hint();
            controller.login(credentials, persistence).await;
            let state = settled(controller).await?;
            match state.current_bucket {
                Some(bucket) => println!("Logged in as {} (bucket {})", hint, bucket),
                None => println!("Logged in as {} ({} buckets)", hint, state.buckets.len()),
            }
        }
        Command::Serve { .. } | Command::Forget => unreachable!("handled before credentials are resolved"),
    }

    Ok(())
}

/// Log in straight into `bucket` and list `prefix`
async fn open(
    controller: &BrowserController,
    credentials: Credentials,
    bucket: &str,
    prefix: &str,
) -> CliResult<()> {
    controller
        .login(credentials.with_bucket(bucket), Persistence::Leave)
        .await;
    settled(controller).await?;

    let prefix = Prefix::directory(prefix);
    if !prefix.is_root() {
        controller.open_prefix(prefix).await;
        settled(controller).await?;
    }
    Ok(())
}

async fn settled(controller: &BrowserController) -> CliResult<SessionState> {
    let state = controller.snapshot().await;
    match state.error {
        Some(message) => Err(message.into()),
        None => Ok(state),
    }
}

fn print_listing(state: &SessionState) {
    // The search term narrows files only; folders always show
    for folder in &state.folders {
        println!("{:>19}  {:>12}  {}/", "", "PRE", folder.label(&state.current_path));
    }

    for file in state.visible_files() {
        println!(
            "{}  {:>12}  {}",
            file.last_modified.format("%Y-%m-%d %H:%M:%S"),
            file.size,
            navigator::file_label(&state.current_path, &file)
        );
    }
}
