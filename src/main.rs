//! linkshelf command-line entry point.
//!
//! Every subcommand works against the same SQLite database the HTTP server
//! uses, so bookmarks can be managed with or without `linkshelf serve`.

use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use linkshelf::app::App;
use linkshelf::server;
use linkshelf::services::reader_mode::collapse_whitespace;
use linkshelf::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use linkshelf::types::bookmark::{Bookmark, BookmarkPatch, NewBookmark, SearchQuery};
use linkshelf::types::settings::ServerSettings;

#[derive(Parser)]
#[command(name = "linkshelf", version, about = "Self-hosted bookmark shelf")]
struct Cli {
    /// Directory holding the database and downloaded videos.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file to use instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bookmark a URL
    Add {
        url: String,
        #[arg(short = 'i', long)]
        title: Option<String>,
        #[arg(short, long)]
        excerpt: Option<String>,
        #[arg(short, long, num_args = 1..)]
        tags: Vec<String>,
        /// Save without fetching the page
        #[arg(short, long)]
        offline: bool,
    },
    /// Update one or more saved bookmarks
    Update(UpdateArgs),
    /// Delete bookmarks by index
    Delete {
        #[arg(required = true)]
        indices: Vec<String>,
    },
    /// List bookmarks
    Print {
        #[arg(short, long, default_value = "")]
        keyword: String,
        #[arg(short, long, num_args = 1..)]
        tags: Vec<String>,
        /// Include the extracted text
        #[arg(long)]
        content: bool,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List tags with their bookmark counts
    Tags,
    /// Run the web interface and API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manage login accounts
    #[command(subcommand)]
    Account(AccountCommand),
    /// Show or edit the settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct UpdateArgs {
    #[arg(required = true)]
    indices: Vec<String>,
    #[arg(long, default_value = "")]
    url: String,
    #[arg(short = 'i', long, default_value = "")]
    title: String,
    #[arg(short, long, default_value = "")]
    excerpt: String,
    /// Tags to set; `-name` removes a tag when merging
    #[arg(short, long, num_args = 1.., allow_hyphen_values = true)]
    tags: Vec<String>,
    /// Do not fetch the pages again
    #[arg(short, long)]
    offline: bool,
    /// Only replace fields that were given
    #[arg(long)]
    dont_overwrite: bool,
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Create an account
    Add {
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// List accounts, optionally filtered by a keyword
    List { keyword: Option<String> },
    /// Delete accounts by username
    Delete {
        #[arg(required = true)]
        usernames: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings
    Show,
    /// Set one setting, e.g. `port 9000` or `video_hosts '["youtube.com"]'`
    Set { key: String, value: String },
    /// Restore the default settings
    Reset,
}

fn init_tracing(filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_settings(cli: &Cli, engine: &mut SettingsEngine) -> Result<ServerSettings, Box<dyn Error>> {
    let mut settings = engine.load()?;
    SettingsEngine::apply_env_overrides(&mut settings)?;
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }
    Ok(settings)
}

fn print_bookmark(book: &Bookmark, with_content: bool) {
    println!("{}. {}", book.id, book.title);
    println!("   {}", book.url);
    if !book.excerpt.is_empty() {
        println!("   {}", book.excerpt);
    }
    let tags = book.tag_names();
    if !tags.is_empty() {
        println!("   #{}", tags.join(" #"));
    }
    if with_content && !book.content.is_empty() {
        println!("\n{}\n", book.content);
    }
    println!();
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut engine = SettingsEngine::new(cli.config.clone());
    let settings = load_settings(&cli, &mut engine)?;
    init_tracing(&settings.log_filter);

    if let Command::Config(command) = &cli.command {
        match command {
            ConfigCommand::Show => println!("{}", serde_json::to_string_pretty(&settings)?),
            ConfigCommand::Set { key, value } => {
                let value: serde_json::Value = serde_json::from_str(value)
                    .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
                engine.set_value(key, value)?;
                println!("Saved {}", engine.get_config_path().display());
            }
            ConfigCommand::Reset => {
                engine.reset()?;
                println!("Saved {}", engine.get_config_path().display());
            }
        }
        return Ok(());
    }

    let app = App::new(settings)?;

    match cli.command {
        Command::Add { url, title, excerpt, tags, offline } => {
            let request = NewBookmark {
                url,
                title: collapse_whitespace(&title.unwrap_or_default()),
                excerpt: collapse_whitespace(&excerpt.unwrap_or_default()),
                tags: tags.iter().map(|t| t.trim().to_string()).collect(),
            };
            let book = app.lifecycle.create(request, offline).await?;
            print_bookmark(&book, false);
        }
        Command::Update(args) => {
            let patch = BookmarkPatch {
                url: args.url,
                title: collapse_whitespace(&args.title),
                excerpt: collapse_whitespace(&args.excerpt),
                tags: args.tags.iter().map(|t| t.trim().to_string()).collect(),
            };
            let books = app
                .lifecycle
                .update(&args.indices, &patch, args.offline, !args.dont_overwrite)
                .await?;
            for book in &books {
                print_bookmark(book, false);
            }
        }
        Command::Delete { indices } => {
            let ids = app.lifecycle.delete(&indices)?;
            println!("Deleted {} bookmark(s)", ids.len());
        }
        Command::Print { keyword, tags, content, json } => {
            let query = SearchQuery { keyword, tags, with_content: content };
            let books = app.search.search(&query)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&books)?);
            } else {
                for book in &books {
                    print_bookmark(book, content);
                }
            }
        }
        Command::Tags => {
            for tag in app.store.get_tags()? {
                println!("{} ({})", tag.name, tag.n_bookmarks);
            }
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(app.settings.port);
            server::serve(Arc::new(app), port).await?;
        }
        Command::Account(AccountCommand::Add { username, password }) => {
            let account = app.accounts.create_account(&username, &password)?;
            println!("Created account {} ({})", account.username, account.id);
        }
        Command::Account(AccountCommand::List { keyword }) => {
            for account in app.accounts.get_accounts(keyword.as_deref().unwrap_or(""), false)? {
                println!("{}. {}", account.id, account.username);
            }
        }
        Command::Account(AccountCommand::Delete { usernames }) => {
            let deleted = app.accounts.delete_accounts(&usernames)?;
            println!("Deleted {} account(s)", deleted);
        }
        Command::Config(_) => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
