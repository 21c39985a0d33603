use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{info, span, Level};
use tracing_subscriber::EnvFilter;

use obsfs::{
    config::StorageConfig,
    facade,
    model::{fs::ReadStream, s3::SignMethod},
    registry::DriverRegistry,
    FileInfo, Filesystem, Visibility, WriteOptions,
};

#[derive(Parser)]
#[command(name = "obsfs", version, about = "Filesystem operations against object storage disks")]
struct Cli {
    /// Storage configuration file
    #[arg(short, long, default_value = "obsfs.toml")]
    config: PathBuf,

    /// Disk to operate on; the configured default when omitted
    #[arg(short, long)]
    disk: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a local file, or stdin with `-`
    Put {
        path: String,
        source: String,
        #[arg(long)]
        public: bool,
        #[arg(long)]
        mimetype: Option<String>,
    },
    /// Print an object to stdout
    Cat { path: String },
    /// Download an object to a local file
    Get { path: String, target: PathBuf },
    Ls {
        #[arg(default_value = "")]
        directory: String,
        #[arg(short, long)]
        recursive: bool,
    },
    Rm { path: String },
    Rmdir { directory: String },
    Mkdir { directory: String },
    Cp { from: String, to: String },
    Mv { from: String, to: String },
    Stat { path: String },
    Exists { path: String },
    /// Public URL, through the CDN domain when one is configured
    Url { path: String },
    /// Pre-signed URL valid for `--expires` seconds
    Sign {
        path: String,
        #[arg(long, default_value_t = 3600)]
        expires: u64,
        #[arg(long, default_value = "GET")]
        method: SignMethod,
    },
    Chmod { path: String, visibility: Visibility },
    Visibility { path: String },
}

fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_string())
}

fn print_info(info: &FileInfo) {
    println!(
        "{:<4} {:>12} {:<25} {:<24} {}",
        info.kind,
        info.size.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
        format_timestamp(info.timestamp),
        info.mimetype.as_deref().unwrap_or("-"),
        info.path
    );
}

fn run(disk: Arc<dyn Filesystem>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Put {
            path,
            source,
            public,
            mimetype,
        } => {
            let mut options = WriteOptions::default();
            if public {
                options = options.with_visibility(Visibility::PublicRead);
            }
            if let Some(mimetype) = mimetype {
                options = options.with_mimetype(&mimetype);
            }

            let info = if source == "-" {
                disk.write_stream(&path, &mut io::stdin().lock(), &options)?
            } else {
                let mut file =
                    File::open(&source).with_context(|| format!("failed to open {}", source))?;
                disk.write_stream(&path, &mut file, &options)?
            };
            print_info(&info);
        }
        Command::Cat { path } => {
            let ReadStream { mut stream, .. } = disk.read_stream(&path)?;
            let mut stdout = io::stdout().lock();
            io::copy(&mut stream, &mut stdout)?;
            stdout.flush()?;
        }
        Command::Get { path, target } => {
            let read = disk.read(&path)?;
            std::fs::write(&target, &read.contents)
                .with_context(|| format!("failed to write {}", target.display()))?;
            print_info(&read.info);
        }
        Command::Ls {
            directory,
            recursive,
        } => {
            for info in disk.list_contents(&directory, recursive)? {
                print_info(&info);
            }
        }
        Command::Rm { path } => disk.delete(&path)?,
        Command::Rmdir { directory } => disk.delete_dir(&directory)?,
        Command::Mkdir { directory } => {
            let info = disk.create_dir(&directory, &WriteOptions::default())?;
            print_info(&info);
        }
        Command::Cp { from, to } => disk.copy(&from, &to)?,
        Command::Mv { from, to } => disk.rename(&from, &to)?,
        Command::Stat { path } => print_info(&disk.get_metadata(&path)?),
        Command::Exists { path } => {
            let exists = disk.has(&path)?;
            println!("{}", exists);
            if !exists {
                std::process::exit(1);
            }
        }
        Command::Url { path } => println!("{}", disk.get_url(&path)),
        Command::Sign {
            path,
            expires,
            method,
        } => println!(
            "{}",
            disk.sign_url(&path, Duration::from_secs(expires), method)?
        ),
        Command::Chmod { path, visibility } => {
            println!("{}", disk.set_visibility(&path, visibility)?)
        }
        Command::Visibility { path } => println!("{}", disk.get_visibility(&path)?),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let cli = Cli::parse();
    info!(config = %cli.config.display(), disk = ?cli.disk, "args");

    let config = StorageConfig::load(&cli.config)?;

    // the SDK futures are polled from a blocking thread while the runtime
    // drives their connections
    tokio::task::spawn_blocking(move || {
        let storage = facade::Storage::from_config(&config, &DriverRegistry::with_defaults())?;
        facade::init(storage)?;

        let disk = match &cli.disk {
            Some(name) => facade::disk(name)?,
            None => facade::default_disk()?,
        };

        run(disk, cli.command)
    })
    .await?
}
