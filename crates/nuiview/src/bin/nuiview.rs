//! Command line previewer: builds a layout or skin file and prints what the
//! preview would show.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use futures_lite::future;
use nuiview::core::logging;
use nuiview::core::profiling::{ProfilingBackend, init_profiling};
use nuiview::ui::{LayoutWriter, Widget, WidgetClassRegistry};
use nuiview::{PreviewConfig, PreviewContent, PreviewDocument, PreviewService, ReloadStatus, TaskPool};

#[derive(Debug, Parser)]
#[command(name = "nuiview", version, about = "Preview NUI layout and skin files")]
struct Args {
    /// Project root containing the modules.
    project: PathBuf,

    /// Layout (`.ui`) or skin (`.skin`) file to preview.
    file: PathBuf,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the built layout back as JSON.
    #[arg(long)]
    write: bool,

    /// Serve profiling data to puffin_viewer.
    #[arg(long)]
    profile: bool,

    /// Keep running and rebuild when project files change.
    #[cfg(feature = "hot-reload")]
    #[arg(long)]
    watch: bool,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    if args.profile {
        init_profiling(ProfilingBackend::PuffinHttp);
    }

    let config = match &args.config {
        Some(path) => PreviewConfig::from_path(path)?,
        None => PreviewConfig::default(),
    };

    let pool = TaskPool::default_threads().context("Failed to start task pool")?;
    let service = Arc::new(PreviewService::open(&args.project, config));
    let file = if args.file.is_absolute() {
        args.file.clone()
    } else {
        args.project.join(&args.file)
    };
    let document = Arc::new(PreviewDocument::new(service.clone(), &file));

    preview(&document, &pool, args.write)?;

    #[cfg(feature = "hot-reload")]
    if args.watch {
        watch(&service, &document, &pool, &args.project, args.write)?;
    }

    pool.shutdown();
    Ok(())
}

fn preview(document: &Arc<PreviewDocument>, pool: &TaskPool, write: bool) -> anyhow::Result<()> {
    let path = document.path();
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let status = future::block_on(document.reload_on(pool, text));
    if status == ReloadStatus::Failed
        && let Some(overlay) = document.overlay()
    {
        bail!("{}", overlay);
    }

    print_report(document, write)
}

fn print_report(document: &PreviewDocument, write: bool) -> anyhow::Result<()> {
    let registry = document.registry();

    document.with_content(|content| -> anyhow::Result<()> {
        match content {
            Some(PreviewContent::Layout(root)) => {
                print_outline(&registry, root.as_ref(), 0);
                if write {
                    let json = LayoutWriter::new(&registry)
                        .to_string_pretty(root.as_ref())
                        .context("Root widget has no registered class")?;
                    println!("{}", json);
                }
            }
            Some(PreviewContent::Skin(skin)) => {
                let mut families: Vec<_> = skin.families().into_iter().collect();
                families.sort_unstable();
                println!(
                    "skin {} ({} fragments, families: {})",
                    skin.name(),
                    skin.fragment_count(),
                    families.join(", ")
                );
            }
            None => println!("(empty)"),
        }
        Ok(())
    })?;

    if let Some(skin) = document.effective_skin() {
        println!("skin: {}", skin.name());
    }

    for diagnostic in &document.diagnostics().entries {
        println!("warning: {}: {}", diagnostic.path, diagnostic.message);
    }

    for name in document.missing_types() {
        println!("unknown widget type: {}", name);
    }
    let modules = document.required_modules();
    if !modules.is_empty() {
        println!("build these modules to preview all widgets: {}", modules.join(", "));
    }

    Ok(())
}

fn print_outline(registry: &WidgetClassRegistry, widget: &dyn Widget, depth: usize) {
    let name = registry.key_of(widget).unwrap_or_else(|| widget.debug_name());
    match widget.id() {
        Some(id) => println!("{:indent$}{} #{}", "", name, id, indent = depth * 2),
        None => println!("{:indent$}{}", "", name, indent = depth * 2),
    }

    if let Some(layout) = widget.as_layout() {
        for child in layout.children() {
            print_outline(registry, child.widget.as_ref(), depth + 1);
        }
    }
}

#[cfg(feature = "hot-reload")]
fn watch(
    service: &Arc<PreviewService>,
    document: &Arc<PreviewDocument>,
    pool: &TaskPool,
    root: &std::path::Path,
    write: bool,
) -> anyhow::Result<()> {
    use std::time::Duration;

    let mut watcher = nuiview::assets::ProjectWatcher::new()?;
    watcher.watch_directory(root)?;
    tracing::info!("Watching {} for changes", root.display());

    loop {
        let changes = service.poll_changes(&mut watcher);
        if changes.manifests_changed {
            future::block_on(service.refresh_modules(pool));
        }
        if changes.paths.iter().any(|p| same_file(p, document.path())) || changes.manifests_changed {
            if let Err(err) = preview(document, pool, write) {
                eprintln!("error: {:#}", err);
            }
        }
        std::thread::sleep(Duration::from_millis(200));
    }
}

#[cfg(feature = "hot-reload")]
fn same_file(a: &std::path::Path, b: &std::path::Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
