use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use storefront_catalog::app::{self, events::UserEvent, filtering, state::AppState};
use storefront_catalog::config::{self, AppConfig};
use storefront_catalog::core::{JsonSnapshotSource, TreeGenerator};

#[derive(Parser)]
#[command(name = "storefront-catalog")]
#[command(about = "Browse and search a storefront catalog snapshot", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Catalog snapshot (JSON with `folders` and `items`); defaults to the last one used
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Config file path (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the folder tree
    Tree {
        /// Only print the subtree below this folder
        #[arg(long)]
        folder: Option<String>,
    },

    /// Print the path from the root down to a folder
    Path {
        #[arg(long)]
        folder: String,
    },

    /// Print matching items as JSON lines
    Search {
        /// Free-text query matched by edit distance
        #[arg(short, long, conflicts_with_all = ["folder", "supplier"])]
        query: Option<String>,

        /// Restrict to a folder (and its subfolders unless disabled in the config)
        #[arg(long, conflicts_with = "supplier")]
        folder: Option<String>,

        /// Restrict to a supplier
        #[arg(long)]
        supplier: Option<String>,

        /// Item fields to search; repeat for several
        #[arg(long = "key")]
        keys: Vec<String>,

        /// Re-sort by the configured field instead of keeping ranking order
        #[arg(long)]
        sorted: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(config::settings::get_config_file_path);
    let app_config = match config::settings::load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            AppConfig::default()
        }
    };

    let snapshot = args
        .snapshot
        .clone()
        .or_else(|| app_config.last_snapshot.clone())
        .context("No catalog snapshot given and none remembered; pass --snapshot")?;

    let mut initial_state = AppState::new(app_config);
    initial_state.config_path = config_path;
    let state = Arc::new(Mutex::new(initial_state));

    // Nothing renders in the CLI; updates are drained and dropped.
    let (proxy, mut events) = tokio::sync::mpsc::unbounded_channel::<UserEvent>();

    let source = JsonSnapshotSource::new(&snapshot);
    app::commands::load_catalog(&proxy, &state, &source)
        .with_context(|| format!("Failed to load {}", source.path().display()))?;

    {
        let mut s = state.lock().unwrap_or_else(|p| p.into_inner());
        if s.config.last_snapshot.as_ref() != Some(&snapshot) {
            s.config.last_snapshot = Some(snapshot.clone());
            if let Some(path) = s.config_path.clone() {
                if let Err(e) = config::settings::save_config(&s.config, Some(&path)) {
                    tracing::warn!("Failed to remember snapshot path: {}", e);
                }
            }
        }
    }

    match args.command {
        Commands::Tree { folder } => {
            let s = state.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(error) = &s.tree_error {
                anyhow::bail!("Folder tree unavailable: {error}");
            }
            match folder {
                None => print!(
                    "{}",
                    TreeGenerator::generate_tree(&s.folder_tree, &s.config.root_label)
                ),
                Some(id) => {
                    let node = s
                        .folder_tree
                        .sub_tree(Some(id.as_str()))
                        .with_context(|| format!("Folder {id} not found"))?;
                    print!("{}", TreeGenerator::generate_sub_tree(node));
                }
            }
        }
        Commands::Path { folder } => {
            let s = state.lock().unwrap_or_else(|p| p.into_inner());
            for id in s.folder_tree.folder_path(Some(folder.as_str())) {
                println!(
                    "{}\t{}",
                    id.as_deref().unwrap_or("-"),
                    s.folder_label(id.as_deref())
                );
            }
        }
        Commands::Search {
            query,
            folder,
            supplier,
            keys,
            sorted,
        } => {
            // Each selection replaces the whole filter, so clap allows only one.
            match (query, folder, supplier) {
                (Some(query), _, _) => app::commands::set_search(&proxy, &state, &query),
                (_, Some(folder), _) => {
                    app::commands::select_folder(&proxy, &state, Some(&folder))
                }
                (_, _, Some(supplier)) => {
                    app::commands::select_supplier(&proxy, &state, Some(&supplier))
                }
                (None, None, None) => {}
            }

            let mut s = state.lock().unwrap_or_else(|p| p.into_inner());
            if !keys.is_empty() {
                s.item_filter.search_keys = keys;
            }
            if !sorted {
                s.config.sort_field = None;
            }
            filtering::apply_filters(&mut s);

            for item in s.filtered_items.values() {
                println!("{}", serde_json::to_string(item)?);
            }
            tracing::info!(
                shown = s.filtered_items.len(),
                total = s.items.len(),
                "Search finished"
            );
        }
    }

    while events.try_recv().is_ok() {}
    Ok(())
}
