use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use typed_prefs::config::Config;
use typed_prefs::{
    AccessMode, BulkWrite, FjallBackend, FjallProvider, JsonSerializer, Preferences,
    PreferencesBuilder, Value, ValueKind, subscriber,
};

type Prefs = Preferences<FjallBackend, Option<JsonSerializer>>;

/// Value kinds accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    String,
    Int,
    Long,
    Float,
    Bool,
    /// Comma-separated list of strings.
    StringSet,
}

impl From<Kind> for ValueKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::String => ValueKind::String,
            Kind::Int => ValueKind::Int,
            Kind::Long => ValueKind::Long,
            Kind::Float => ValueKind::Float,
            Kind::Bool => ValueKind::Bool,
            Kind::StringSet => ValueKind::StringSet,
        }
    }
}

/// Kinds accepted by `put-all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BulkKind {
    String,
    Int,
    Long,
    Float,
    Bool,
    StringSet,
    /// JSON values stored as objects.
    Object,
    /// Parse every value as JSON and pick the kind from the first entry.
    Auto,
}

#[derive(Parser)]
#[command(name = "typed-prefs")]
#[command(about = "Typed key-value preferences backed by fjall")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Store path (overrides the configuration file)
    #[arg(long, global = true, env = "TYPED_PREFS_PATH")]
    path: Option<PathBuf>,

    /// Namespace to open (overrides the configuration file)
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Open the namespace in shared mode
    #[arg(long, global = true)]
    shared: bool,

    /// Disable object storage
    #[arg(long, global = true)]
    no_objects: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a sample set of values on first run, print them on later runs
    Demo {
        /// Forget the saved sample and clear the namespace
        #[arg(long)]
        reset: bool,
    },

    /// Print the value stored under a key
    Get {
        key: String,

        #[arg(short, long, value_enum, default_value = "string")]
        kind: Kind,
    },

    /// Store a value under a key
    Set {
        key: String,

        value: String,

        #[arg(short, long, value_enum, default_value = "string")]
        kind: Kind,
    },

    /// Print the JSON object stored under a key
    GetObject { key: String },

    /// Store a JSON object under a key
    SetObject { key: String, json: String },

    /// Store several key=value pairs in one atomic batch
    PutAll {
        #[arg(short, long, value_enum, default_value = "auto")]
        kind: BulkKind,

        /// Entries as key=value
        #[arg(required = true, value_parser = parse_entry)]
        entries: Vec<(String, String)>,
    },

    /// Remove a key
    Remove { key: String },

    /// Remove every key in the namespace
    Clear {
        /// Block until the clear is synced to disk
        #[arg(long)]
        wait: bool,
    },

    /// Report whether a key is present
    Contains { key: String },

    /// List all keys
    List,
}

/// The object saved by `demo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    name: String,
    age: String,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Profile {{ name: '{}', age: '{}' }}", self.name, self.age)
    }
}

const SAVED_FLAG: &str = "isDataSaved";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(path) = cli.path {
        config.store.path = path;
    }
    if let Some(namespace) = cli.namespace {
        config.store.namespace = namespace;
    }
    if cli.shared {
        config.store.mode = AccessMode::Shared;
    }
    if cli.no_objects {
        config.store.object_support = false;
    }

    subscriber::init(&config.logging)?;

    tracing::debug!(
        path = %config.store.path.display(),
        namespace = %config.store.namespace,
        "opening store"
    );
    let prefs = PreferencesBuilder::new(FjallProvider::new(&config.store.path))
        .having_namespace(config.store.namespace.clone())
        .using_access_mode(config.store.mode)
        .with_optional_object_support(config.store.object_support)
        .build()
        .with_context(|| format!("failed to open store at {}", config.store.path.display()))?;

    match cli.command {
        Commands::Demo { reset } => {
            if reset {
                prefs.remove_data(SAVED_FLAG);
                prefs.remove_all().wait()?;
                println!("Cleared namespace '{}'", prefs.namespace());
            } else if prefs.fetch_boolean(SAVED_FLAG)? {
                print_demo(&prefs)?;
            } else {
                prefs.save_string("String", "this is saved String");
                prefs.save_long("Long", 100);
                prefs.save_float("Float", 1000.1);
                prefs.save_integer("Integer", 10);
                prefs
                    .save_object(
                        "Object",
                        &Profile {
                            name: "object name".to_string(),
                            age: "99".to_string(),
                        },
                    )
                    .map_err(object_error)?;

                print_demo(&prefs)?;

                prefs.save_boolean(SAVED_FLAG, true);
            }
            Ok(())
        }
        Commands::Get { key, kind } => {
            if !prefs.contains(&key)? {
                eprintln!("Key '{}' not found", key);
                std::process::exit(1);
            }
            match kind {
                Kind::String => println!("{}", prefs.fetch_string(&key)?.unwrap_or_default()),
                Kind::Int => println!("{}", prefs.fetch_integer(&key)?),
                Kind::Long => println!("{}", prefs.fetch_long(&key)?),
                Kind::Float => println!("{}", prefs.fetch_float(&key)?),
                Kind::Bool => println!("{}", prefs.fetch_boolean(&key)?),
                Kind::StringSet => {
                    for item in prefs.fetch_string_set(&key)? {
                        println!("{}", item);
                    }
                }
            }
            Ok(())
        }
        Commands::Set { key, value, kind } => {
            let saved = match kind {
                Kind::String => prefs.save_string(&key, &value),
                Kind::Int => prefs.save_integer(&key, parse_scalar(&key, &value, kind)?),
                Kind::Long => prefs.save_long(&key, parse_scalar(&key, &value, kind)?),
                Kind::Float => prefs.save_float(&key, parse_scalar(&key, &value, kind)?),
                Kind::Bool => prefs.save_boolean(&key, parse_scalar(&key, &value, kind)?),
                Kind::StringSet => prefs.save_string_set(&key, split_set(&value)),
            };
            report_commit(saved)?;
            println!("Set '{}' ({})", key, ValueKind::from(kind));
            Ok(())
        }
        Commands::GetObject { key } => {
            let object = prefs
                .fetch_object::<serde_json::Value>(&key)
                .map_err(object_error)?;
            match object {
                Some(value) => {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(())
                }
                None => {
                    eprintln!("Key '{}' not found", key);
                    std::process::exit(1);
                }
            }
        }
        Commands::SetObject { key, json } => {
            let value: serde_json::Value =
                serde_json::from_str(&json).context("value is not valid JSON")?;
            report_commit(prefs.save_object(&key, &value).map_err(object_error)?)?;
            println!("Set '{}' (object)", key);
            Ok(())
        }
        Commands::PutAll { kind, entries } => {
            let count = entries.len();
            let write = bulk_write(kind, entries)?;
            report_commit(prefs.put_all(write).map_err(object_error)?)?;
            println!("Stored {} entries", count);
            Ok(())
        }
        Commands::Remove { key } => {
            report_commit(prefs.remove_data(&key))?;
            println!("Removed '{}'", key);
            Ok(())
        }
        Commands::Clear { wait } => {
            let handle = prefs.remove_all();
            if wait {
                handle.wait()?;
                println!("Cleared namespace '{}'", prefs.namespace());
            } else {
                println!("Cleared namespace '{}' (sync pending)", prefs.namespace());
            }
            Ok(())
        }
        Commands::Contains { key } => {
            println!("{}", prefs.contains(&key)?);
            Ok(())
        }
        Commands::List => {
            let keys = prefs.keys()?;
            if keys.is_empty() {
                println!("No keys found");
            }
            for key in keys {
                println!("{}", key);
            }
            Ok(())
        }
    }
}

fn print_demo(prefs: &Prefs) -> anyhow::Result<()> {
    println!("{}: {}", SAVED_FLAG, prefs.fetch_boolean(SAVED_FLAG)?);
    println!("Integer: {}", prefs.fetch_integer("Integer")?);
    println!("Long: {}", prefs.fetch_long("Long")?);
    println!("Float: {}", prefs.fetch_float("Float")?);
    println!(
        "String: {}",
        prefs.fetch_string("String")?.unwrap_or_default()
    );
    match prefs.fetch_object::<Profile>("Object").map_err(object_error)? {
        Some(profile) => println!("Object: {}", profile),
        None => println!("Object: <none>"),
    }
    Ok(())
}

fn object_error(e: typed_prefs::Error) -> anyhow::Error {
    if e.is_capability_missing() {
        anyhow!("object storage is disabled for this store (--no-objects or store.object_support = false)")
    } else {
        e.into()
    }
}

fn report_commit(saved: bool) -> anyhow::Result<()> {
    if !saved {
        bail!("the store did not accept the write");
    }
    Ok(())
}

fn parse_entry(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

fn parse_scalar<T>(key: &str, value: &str, kind: Kind) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().with_context(|| {
        format!(
            "'{}' is not a valid {} for '{}'",
            value,
            ValueKind::from(kind),
            key
        )
    })
}

fn split_set(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn bulk_write(kind: BulkKind, entries: Vec<(String, String)>) -> anyhow::Result<BulkWrite> {
    fn collect<V>(
        entries: Vec<(String, String)>,
        mut parse: impl FnMut(&str, &str) -> anyhow::Result<V>,
    ) -> anyhow::Result<BTreeMap<String, V>> {
        entries
            .into_iter()
            .map(|(k, v)| {
                let parsed = parse(&k, &v)?;
                Ok((k, parsed))
            })
            .collect()
    }

    Ok(match kind {
        BulkKind::String => BulkWrite::String(collect(entries, |_, v| Ok(v.to_string()))?),
        BulkKind::Int => BulkWrite::Int(collect(entries, |k, v| parse_scalar(k, v, Kind::Int))?),
        BulkKind::Long => {
            BulkWrite::Long(collect(entries, |k, v| parse_scalar(k, v, Kind::Long))?)
        }
        BulkKind::Float => {
            BulkWrite::Float(collect(entries, |k, v| parse_scalar(k, v, Kind::Float))?)
        }
        BulkKind::Bool => {
            BulkWrite::Bool(collect(entries, |k, v| parse_scalar(k, v, Kind::Bool))?)
        }
        BulkKind::StringSet => BulkWrite::StringSet(collect(entries, |_, v| Ok(split_set(v)))?),
        BulkKind::Object => BulkWrite::Serializable(collect(entries, |k, v| {
            serde_json::from_str(v).with_context(|| format!("'{}' is not valid JSON", k))
        })?),
        BulkKind::Auto => BulkWrite::infer(collect(entries, |k, v| {
            let json: serde_json::Value =
                serde_json::from_str(v).with_context(|| format!("'{}' is not valid JSON", k))?;
            Ok(to_value(json))
        })?)?,
    })
}

/// Map JSON onto the dynamic value model: integers become longs, other
/// numbers floats, arrays sets, and maps objects.
fn to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Long(i),
            None => Value::Float(n.as_f64().unwrap_or_default() as f32),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Set(items.into_iter().map(to_value).collect()),
        object @ serde_json::Value::Object(_) => Value::Object(object),
    }
}
