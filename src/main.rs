use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use swift_store::config::ConnectionArgs;
use swift_store::{Container, ListOptions, Object, ObjectStore, SwiftConfig};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

/// Command-line client for Swift object storage.
#[derive(Parser, Debug)]
#[command(author, version, about = "Swift object storage client")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a container's or an object's headers and metadata
    Stat {
        container: String,
        object: Option<String>,
    },
    /// List objects of a container
    List {
        container: String,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        delimiter: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Upload a local file, creating the container if needed
    Upload {
        container: String,
        file: PathBuf,
        /// Object name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
        /// Make a newly created container publicly readable
        #[arg(long)]
        public: bool,
    },
    /// Download an object's content
    Download {
        container: String,
        object: String,
        /// Destination file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Copy an object server-side
    Copy {
        container: String,
        object: String,
        destination: String,
        /// Destination object name (defaults to the source name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete an object, or a container with everything in it
    Delete {
        container: String,
        object: Option<String>,
    },
    /// Print the public URL of an object
    Url { container: String, object: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // --- Parse config ---
    let cli = Cli::parse();
    let config = SwiftConfig::from_env_and_args(cli.connection)?;
    tracing::debug!("Using storage endpoint {}", config.storage_url);

    let mut store = ObjectStore::from_config(&config)?;

    match cli.command {
        Command::Stat { container, object } => {
            let container = find_container(&mut store, &container).await?;
            match object {
                Some(name) => {
                    let object = find_object(&store, &container, &name).await?;
                    print_object(&object);
                }
                None => print_container(&container),
            }
        }
        Command::List {
            container,
            prefix,
            delimiter,
            limit,
        } => {
            let container = find_container(&mut store, &container).await?;
            let options = ListOptions {
                prefix,
                delimiter,
                limit,
                ..ListOptions::default()
            };
            for object in store.get_objects(&container, options).await? {
                println!(
                    "{:>12}  {:<24}  {}",
                    object.content_length().map(|l| l.to_string()).unwrap_or_default(),
                    object.content_type().unwrap_or("-"),
                    object.name()
                );
            }
        }
        Command::Upload {
            container,
            file,
            name,
            public,
        } => {
            let container = match store.get_container(&container).await? {
                Some(existing) => existing,
                None => store.create_container(&container, !public).await?,
            };
            let name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .with_context(|| format!("cannot derive an object name from {:?}", file))?,
            };

            let mut object = store.create_object(&container, &name).await?;
            object.set_local_file(&file).await?;
            store.update_object(&mut object).await?;
            tracing::info!("Uploaded {:?} to {}", file, object.path());
        }
        Command::Download {
            container,
            object,
            output,
        } => {
            let container = find_container(&mut store, &container).await?;
            let object = find_object(&store, &container, &object).await?;
            let content = store.get_object_content(&object, Default::default()).await?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &content)
                        .await
                        .with_context(|| format!("writing {:?}", path))?;
                    tracing::info!("Saved {} ({} bytes) to {:?}", object.path(), content.len(), path);
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&content).await?;
                    stdout.flush().await?;
                }
            }
        }
        Command::Copy {
            container,
            object,
            destination,
            name,
        } => {
            let source = find_container(&mut store, &container).await?;
            let object = find_object(&store, &source, &object).await?;
            let destination = find_container(&mut store, &destination).await?;

            match store.copy_object(&object, &destination, name.as_deref()).await? {
                Some(copied) => println!("{}", copied.path()),
                None => anyhow::bail!("copy of {} reported success but is not readable", object.path()),
            }
        }
        Command::Delete { container, object } => {
            let container = find_container(&mut store, &container).await?;
            match object {
                Some(name) => {
                    store.delete_object(&Object::new(container, name)).await?;
                }
                None => {
                    store.delete_container(&container).await?;
                }
            }
        }
        Command::Url { container, object } => {
            let container = find_container(&mut store, &container).await?;
            println!("{}", store.object_url(&Object::new(container, object))?);
        }
    }

    Ok(())
}

async fn find_container(store: &mut ObjectStore, name: &str) -> Result<Arc<Container>> {
    store
        .get_container(name)
        .await?
        .ok_or_else(|| anyhow!("container `{}` not found", name))
}

async fn find_object(store: &ObjectStore, container: &Arc<Container>, name: &str) -> Result<Object> {
    store
        .get_object(container, name)
        .await?
        .ok_or_else(|| anyhow!("object `{}/{}` not found", container.name(), name))
}

fn print_container(container: &Container) {
    println!("Container: {}", container.name());
    println!("Visibility: {}", if container.is_public() { "public" } else { "private" });
    if let Some(count) = container.object_count() {
        println!("Objects: {}", count);
    }
    if let Some(bytes) = container.bytes_used() {
        println!("Bytes: {}", bytes);
    }
    print!("{}", container.metadata());
}

fn print_object(object: &Object) {
    println!("Object: {}", object.path());
    if let Some(content_type) = object.content_type() {
        println!("Content-Type: {}", content_type);
    }
    if let Some(length) = object.content_length() {
        println!("Content-Length: {}", length);
    }
    if let Some(etag) = object.etag() {
        println!("ETag: {}", etag);
    }
    if let Some(modified) = object.last_modified() {
        println!("Last-Modified: {}", modified.to_rfc2822());
    }
    print!("{}", object.metadata());
}
