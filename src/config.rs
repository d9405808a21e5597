use crate::{
    dispatch::Targets,
    store::{
        DeviceStore,
        InMemoryStore,
        SledStore,
    },
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    fs,
    path::PathBuf,
};
use tracing::warn;
use url::Url;

pub const DEFAULT_DESTINATION: &str = "https://leveledcv.com";
pub const DEFAULT_DISTRACTION: &str = "https://www.youtube.com/embed/dQw4w9WgXcQ";
pub const DATA_DIR_NAME: &str = ".card-gate";
const STORE_DIR_NAME: &str = "store";
const LOG_DIR_NAME: &str = "logs";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreConfig {
    Sled { path: PathBuf },
    Ephemeral,
}

impl StoreConfig {
    /// Opens the configured store. A sled database that cannot be opened
    /// (held by another client, unreadable directory) degrades to process
    /// memory so play continues from first-time defaults.
    pub fn open(&self) -> DeviceStore {
        match self {
            StoreConfig::Sled { path } => match SledStore::open(path) {
                Ok(store) => DeviceStore::Sled(store),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "store unavailable; playing from memory");
                    DeviceStore::Memory(InMemoryStore::new())
                }
            },
            StoreConfig::Ephemeral => DeviceStore::Memory(InMemoryStore::new()),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub targets: Targets,
    pub log_dir: PathBuf,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Play(AppConfig),
    Status(AppConfig),
    Help,
}

impl AppConfig {
    /// Create the directories the configuration points at.
    pub fn ensure_structure(&self) -> Result<()> {
        fs::create_dir_all(&self.log_dir).wrap_err_with(|| {
            format!("Failed to create log directory {}", self.log_dir.display())
        })?;
        if let StoreConfig::Sled { path } = &self.store {
            fs::create_dir_all(path).wrap_err_with(|| {
                format!("Failed to create store directory {}", path.display())
            })?;
        }
        Ok(())
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(DATA_DIR_NAME))
}

fn resolve_dir(dir: Option<String>, default_leaf: &str) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(&raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => Ok(default_data_dir()?.join(default_leaf)),
    }
}

fn parse_url(flag: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).wrap_err_with(|| format!("{flag} is not a valid URL: {raw}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(eyre!("{flag} must be an http(s) URL, got {raw}"));
    }
    Ok(url)
}

fn set_once(slot: &mut Option<String>, flag: &str, value: Option<String>) -> Result<()> {
    let value = value.ok_or_else(|| eyre!("{flag} requires an argument"))?;
    if slot.is_some() {
        return Err(eyre!("{flag} may only be specified once"));
    }
    *slot = Some(value);
    Ok(())
}

/// Parses the command line (without the program name).
pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut store_dir: Option<String> = None;
    let mut ephemeral = false;
    let mut destination: Option<String> = None;
    let mut distraction: Option<String> = None;
    let mut log_dir: Option<String> = None;
    let mut status = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--store-dir" => set_once(&mut store_dir, "--store-dir", args.next())?,
            "--ephemeral" => {
                if ephemeral {
                    return Err(eyre!("--ephemeral may only be specified once"));
                }
                ephemeral = true;
            }
            "--destination" => set_once(&mut destination, "--destination", args.next())?,
            "--distraction" => set_once(&mut distraction, "--distraction", args.next())?,
            "--log-dir" => set_once(&mut log_dir, "--log-dir", args.next())?,
            "--status" => status = true,
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    if ephemeral && store_dir.is_some() {
        return Err(eyre!("--store-dir and --ephemeral are mutually exclusive"));
    }
    if ephemeral && status {
        return Err(eyre!("--status reads the persistent store; it cannot be combined with --ephemeral"));
    }

    let store = if ephemeral {
        StoreConfig::Ephemeral
    } else {
        StoreConfig::Sled {
            path: resolve_dir(store_dir, STORE_DIR_NAME)?,
        }
    };
    let targets = Targets::new(
        parse_url(
            "--destination",
            destination.as_deref().unwrap_or(DEFAULT_DESTINATION),
        )?,
        parse_url(
            "--distraction",
            distraction.as_deref().unwrap_or(DEFAULT_DISTRACTION),
        )?,
    );
    let config = AppConfig {
        store,
        targets,
        log_dir: resolve_dir(log_dir, LOG_DIR_NAME)?,
    };

    Ok(if status {
        Command::Status(config)
    } else {
        Command::Play(config)
    })
}
