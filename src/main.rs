use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use gobin::commands::{self, Config, ConfigOverrides, GoInstaller};
use gobin::runtime::RealRuntime;

/// gobin - Go command manager
///
/// Find, install and update commands built with `go install`.
///
/// Examples:
///   gobin search gopls     # Find commands named gopls
///   gobin install gopls    # Install the only match
///   gobin list             # Show installed commands and available updates
///   gobin update           # Install every available update
///   gobin uninstall gopls  # Remove an installed command
#[derive(Parser, Debug)]
#[command(author, version = env!("GOBIN_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding installed commands (defaults to GOBIN, GOPATH/bin, ~/go/bin)
    #[arg(long, value_name = "PATH", global = true)]
    gobin: Option<PathBuf>,

    /// deps.dev package API base URL
    #[arg(long, value_name = "URL", global = true)]
    catalog_api_url: Option<String>,

    /// deps.dev search URL
    #[arg(long, value_name = "URL", global = true)]
    catalog_search_url: Option<String>,

    /// pkg.go.dev base URL
    #[arg(long, value_name = "URL", global = true)]
    index_url: Option<String>,

    /// Duplicate a request that has not answered after this many milliseconds
    #[arg(long, value_name = "MS", global = true)]
    hedge_after_ms: Option<u64>,

    /// Number of search results to request
    #[arg(long, value_name = "N", global = true)]
    limit: Option<usize>,

    /// Timeout of a single request attempt in seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout_secs: Option<u64>,

    /// Number of lookups to run at once
    #[arg(long, short = 'j', value_name = "N", global = true)]
    jobs: Option<usize>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Search for commands whose path ends with NAME
    Search(SearchArgs),

    /// Install the command whose path ends with NAME
    Install(InstallArgs),

    /// List installed commands and available updates
    List(ListArgs),

    /// Update installed commands
    Update(UpdateArgs),

    /// Remove an installed command
    #[command(alias = "remove", alias = "rm")]
    Uninstall(UninstallArgs),
}

#[derive(clap::Args, Debug)]
struct SearchArgs {
    #[arg(value_name = "NAME")]
    name: String,
}

#[derive(clap::Args, Debug)]
struct InstallArgs {
    /// Command name or full package path
    #[arg(value_name = "NAME")]
    name: String,
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    /// List Go executables in DIR instead of the installed store
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct UpdateArgs {
    /// Only update commands whose name ends with NAME
    #[arg(value_name = "NAME")]
    name: Option<String>,
}

#[derive(clap::Args, Debug)]
struct UninstallArgs {
    /// Command name or full package path
    #[arg(value_name = "NAME")]
    name: String,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            gobin: self.gobin.clone(),
            catalog_api_url: self.catalog_api_url.clone(),
            catalog_search_url: self.catalog_search_url.clone(),
            index_url: self.index_url.clone(),
            hedge_after_ms: self.hedge_after_ms,
            limit: self.limit,
            timeout_secs: self.timeout_secs,
            jobs: self.jobs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = Arc::new(RealRuntime);
    let config = Config::load(runtime.as_ref(), cli.overrides())?;
    let mut out = std::io::stdout();

    match cli.command {
        Commands::Search(args) => {
            let resolver = commands::build_resolver(&config, runtime, None)?;
            commands::search(&resolver, &args.name, &mut out).await?
        }
        Commands::Install(args) => {
            let resolver = commands::build_resolver(&config, runtime, None)?;
            let installer = GoInstaller::new(&config.gobin);
            commands::install(&resolver, &installer, &args.name, &mut out).await?
        }
        Commands::List(args) => {
            let resolver = commands::build_resolver(&config, runtime, args.dir.as_deref())?;
            commands::list(&resolver, &mut out).await?
        }
        Commands::Update(args) => {
            let resolver = commands::build_resolver(&config, runtime, None)?;
            let installer = GoInstaller::new(&config.gobin);
            commands::update(&resolver, &installer, args.name.as_deref(), &mut out).await?
        }
        Commands::Uninstall(args) => {
            commands::uninstall(runtime.as_ref(), &config.gobin, &args.name, &mut out)?
        }
    }
    Ok(())
}
