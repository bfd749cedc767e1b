use std::path::PathBuf;

use clap::{Parser, Subcommand};
use portfolio_store::api::ApiOptions;
use portfolio_store::config::Config;
use portfolio_store::engine::resolver::Resolved;
use portfolio_store::engine::AssetNamespace;
use portfolio_store::{sdk, AssetStore};
use serde::Serialize;

#[derive(Parser)]
#[command(author, version, about = "Portfolio content and image store", long_about = None)]
struct Cli {
    /// Overrides PORTFOLIO_DATA_DIR.
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Force the in-process mock backend.
    #[arg(long, global = true, conflicts_with = "remote")]
    mock: bool,

    /// Force the remote HTTP backend.
    #[arg(long, global = true)]
    remote: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Compress and store an image, printing its virtual path.
    Upload {
        file: PathBuf,
        #[arg(long)]
        profile: bool,
        /// Name to derive the stored filename from instead of the file's own.
        #[arg(long)]
        name: Option<String>,
    },
    /// Resolve a path to a stored image.
    Resolve { path: String },
    /// List stored images, newest first.
    Images {
        #[arg(long)]
        profile: bool,
    },
    /// Sign in to the remote backend.
    Login { email: String, password: String },
    Logout,
    #[command(subcommand)]
    Blog(BlogCommands),
    #[command(subcommand)]
    Projects(ProjectCommands),
    Home,
    About,
    Contact,
}

#[derive(Subcommand, Clone)]
enum BlogCommands {
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        author: Option<String>,
    },
    Get { id: u64 },
    Search { query: String },
    Delete { id: u64 },
}

#[derive(Subcommand, Clone)]
enum ProjectCommands {
    List {
        #[arg(long)]
        tag: Option<String>,
    },
    Get { id: u64 },
    Delete { id: u64 },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir;
    }
    let portfolio = sdk::open(config)?;
    if cli.mock || cli.remote {
        portfolio.gateway.configure(ApiOptions {
            use_mock_api: Some(cli.mock),
        });
    }
    let api = &portfolio.gateway;

    match cli.command {
        Commands::Upload { file, profile, name } => {
            let bytes = tokio::fs::read(&file).await?;
            let original = name.unwrap_or_else(|| {
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let path = if profile {
                portfolio.resolver.store_profile_image(bytes, &original).await?
            } else {
                portfolio
                    .resolver
                    .store(bytes, &original, AssetNamespace::Images, Default::default())
                    .await?
            };
            println!("{}", path);
        }
        Commands::Resolve { path } => match portfolio.resolver.resolve(&path).await? {
            Resolved::Local(asset) => println!("{} ({} bytes encoded)", asset.mime_type(), asset.len()),
            Resolved::Missing => anyhow::bail!("{} is not in the local store", path),
            Resolved::PassThrough(src) => println!("external: {}", src),
        },
        Commands::Images { profile } => {
            let namespace = if profile {
                AssetNamespace::ProfileImage
            } else {
                AssetNamespace::Images
            };
            for entry in portfolio.assets.list_namespace(namespace).await? {
                println!("{}\t{}\t{}", entry.path, entry.written_at, entry.encoded_len);
            }
        }
        Commands::Login { email, password } => {
            let user = portfolio.auth.sign_in(&email, &password).await?;
            println!("Signed in as {}", user.email);
        }
        Commands::Logout => {
            portfolio.auth.sign_out();
            println!("OK");
        }
        Commands::Blog(cmd) => match cmd {
            BlogCommands::List { category, author } => {
                let posts = match (category, author) {
                    (Some(c), _) => api.get_blog_posts_by_category(&c).await?,
                    (None, Some(a)) => api.get_blog_posts_by_author(&a).await?,
                    (None, None) => api.get_blog_posts().await?,
                };
                print_json(&posts)?;
            }
            BlogCommands::Get { id } => print_json(&api.get_blog_post(id).await?)?,
            BlogCommands::Search { query } => print_json(&api.search_blog_posts(&query).await?)?,
            BlogCommands::Delete { id } => {
                api.delete_blog_post(id).await?;
                println!("OK");
            }
        },
        Commands::Projects(cmd) => match cmd {
            ProjectCommands::List { tag } => {
                let projects = match tag {
                    Some(t) => api.get_projects_by_tag(&t).await?,
                    None => api.get_projects().await?,
                };
                print_json(&projects)?;
            }
            ProjectCommands::Get { id } => print_json(&api.get_project(id).await?)?,
            ProjectCommands::Delete { id } => {
                api.delete_project(id).await?;
                println!("OK");
            }
        },
        Commands::Home => print_json(&api.get_home_content().await?)?,
        Commands::About => print_json(&api.get_about_content().await?)?,
        Commands::Contact => print_json(&api.get_contact_info().await?)?,
    }

    Ok(())
}
