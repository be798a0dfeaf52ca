//! Command-line client for docshare.

use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};
use docshare::auth::models::Principal;
use docshare::auth::session::{complete_sign_in, SessionStore};
use docshare::config::AppConfig;
use docshare::demo_seeder::demo_principal;
use docshare::export::format::{write_export, ExportFormat};
use docshare::export::share::link_payload;
use docshare::export::text::plain_text;
use docshare::rendering::content::format_timestamp;
use docshare::service::setup::connect;

#[derive(Parser, Debug)]
#[command(name = "docshare")]
#[command(about = "Create, share, cache and export documents")]
struct Args {
    /// User id returned by the identity provider.
    #[arg(long, global = true)]
    uid: Option<String>,

    /// Email returned by the identity provider.
    #[arg(long, global = true)]
    email: Option<String>,

    /// Configuration file (defaults to ./docshare.toml when present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the documents you own.
    List,
    /// Show a document.
    Open { id: String },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    Update {
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    Delete { id: String },
    /// Grant `view` or `edit` access to a registered user.
    Share {
        id: String,
        email: String,
        level: String,
    },
    /// Remove a user's access.
    Revoke { id: String, email: String },
    /// Manage local copies.
    #[command(subcommand)]
    Offline(OfflineCommand),
    /// Search your documents by title and content.
    Search { query: String },
    /// Export a document as PDF or Word (.docx).
    Export {
        id: String,
        #[arg(long, default_value = "pdf")]
        format: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Print a shareable deep link.
    Link { id: String },
}

#[derive(Subcommand, Debug)]
enum OfflineCommand {
    Save { id: String },
    Remove { id: String },
    List,
    Show { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let services = connect(&config).await?;
    let session = SessionStore::new();

    // Offline commands read the local cache only and need no identity
    if let Command::Offline(
        cmd @ (OfflineCommand::Remove { .. } | OfflineCommand::List | OfflineCommand::Show { .. }),
    ) = &args.command
    {
        return run_offline(&services.documents, cmd).await;
    }

    let principal = resolve_principal(&args, &config)?;
    complete_sign_in(&session, services.users.as_ref(), principal).await?;
    let me = session.require()?;
    let docs = &services.documents;

    match args.command {
        Command::List => {
            let owned = docs.list_owned(&me).await?;
            let offline = docs.offline_status(&owned).await?;
            if owned.is_empty() {
                println!("No documents yet.");
            }
            for doc in &owned {
                let marker = if offline.get(&doc.document_id).copied().unwrap_or(false) {
                    "[offline]"
                } else {
                    ""
                };
                println!(
                    "{}  {}  {} {}",
                    doc.document_id,
                    format_timestamp(doc.timestamp),
                    doc.title,
                    marker
                );
            }
        }
        Command::Open { id } => {
            let opened = docs.open(&me, &id).await?;
            println!("{} ({})", opened.document.title, opened.permission);
            println!("Owner: {}", opened.document.owner_email);
            println!("Updated: {}", format_timestamp(opened.document.timestamp));
            println!();
            println!("{}", plain_text(&opened.document.content));
        }
        Command::Create { title, content } => {
            let doc = docs.create(&me, &title, &content).await?;
            println!("Created {}", doc.document_id);
        }
        Command::Update { id, title, content } => {
            docs.update(&me, &id, &title, &content).await?;
            println!("Updated {}", id);
        }
        Command::Delete { id } => {
            let remaining = docs.delete(&me, &id).await?;
            println!("Deleted {} ({} documents left)", id, remaining.len());
        }
        Command::Share { id, email, level } => {
            let doc = docs.share(&me, &id, &email, &level).await?;
            println!("{}", serde_json::to_string_pretty(&doc.shared_with)?);
        }
        Command::Revoke { id, email } => {
            let doc = docs.revoke(&me, &id, &email).await?;
            println!("{}", serde_json::to_string_pretty(&doc.shared_with)?);
        }
        Command::Offline(OfflineCommand::Save { id }) => {
            let entry = docs.save_offline(&me, &id).await?;
            println!("Saved '{}' offline", entry.title);
        }
        Command::Offline(cmd) => run_offline(docs, &cmd).await?,
        Command::Search { query } => {
            let hits = docs.search(&me, &query).await?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        Command::Export { id, format, out } => {
            let Some(format) = ExportFormat::from_str_ci(&format) else {
                bail!("Unknown export format '{}'. Expected: pdf, word", format);
            };
            let opened = docs.open(&me, &id).await?;
            let path = write_export(&out, &opened.document, format)?;
            println!("{}", path.display());
        }
        Command::Link { id } => {
            let opened = docs.open(&me, &id).await?;
            let payload = link_payload(&opened.document);
            println!("{}", payload.text.unwrap_or_default());
        }
    }

    Ok(())
}

async fn run_offline(
    docs: &docshare::service::documents::DocumentService,
    cmd: &OfflineCommand,
) -> anyhow::Result<()> {
    match cmd {
        OfflineCommand::Save { .. } => bail!("saving offline requires a signed-in user"),
        OfflineCommand::Remove { id } => {
            if docs.remove_offline(id).await? {
                println!("Removed offline copy of {}", id);
            } else {
                println!("{} was not saved offline", id);
            }
        }
        OfflineCommand::List => {
            for entry in docs.list_offline().await? {
                println!("{}  {}", entry.document_id, entry.title);
            }
        }
        OfflineCommand::Show { id } => {
            let entry = docs.offline_copy(id).await?;
            println!("{}", entry.title);
            println!();
            println!("{}", plain_text(&entry.content));
        }
    }
    Ok(())
}

fn resolve_principal(args: &Args, config: &AppConfig) -> anyhow::Result<Principal> {
    match (&args.uid, &args.email) {
        (Some(uid), Some(email)) => Ok(Principal::new(uid, email)),
        (None, None) if config.demo_mode => Ok(demo_principal()),
        _ => bail!("No signed-in user: pass both --uid and --email"),
    }
}
