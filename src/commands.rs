use crate::BuildArgs;
use anyhow::Context;
use proggraph::config::{write_config, ProggraphConfig};
use proggraph::export::{self, EdgeColors, ExportFormat};
use proggraph::ignore::IgnoreFilter;
use proggraph::ui::{self, BatchProgress, ProgressMessage, Spinner};
use proggraph::{build_graph_with, Analysis, BuildOptions, Language, ProgramGraph};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

/// Defaults, then the config file, then command-line flags
fn resolve_options(
    config: &ProggraphConfig,
    file: &Path,
    args: &BuildArgs,
) -> anyhow::Result<BuildOptions> {
    let detected = match &args.language {
        Some(name) => Some(name.parse::<Language>()?),
        None => config.language.or_else(|| Language::from_path(file)),
    };
    let Some(language) = detected else {
        anyhow::bail!(
            "cannot infer the language of {} (use --language)",
            file.display()
        );
    };

    let mut options = config.build_options(language);
    options.language = language;
    if let Some(policy) = &args.on_error {
        options.on_error = policy.parse()?;
    }
    if let Some(names) = &args.analyses {
        options.analyses = names
            .iter()
            .map(|name| name.parse::<Analysis>())
            .collect::<Result<_, _>>()?;
    }
    if args.sibling_edges {
        options.sibling_edges = true;
    }
    Ok(options)
}

fn resolve_format(config: &ProggraphConfig, format: Option<&str>) -> anyhow::Result<ExportFormat> {
    match format {
        Some(name) => Ok(name.parse()?),
        None => Ok(config.export.format.unwrap_or_default()),
    }
}

fn load_graph(file: &Path, options: &BuildOptions, tokens_only: bool) -> anyhow::Result<ProgramGraph> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let graph = build_graph_with(&source, options)
        .with_context(|| format!("failed to build graph for {}", file.display()))?;
    Ok(if tokens_only { graph.tokens_only() } else { graph })
}

fn write_to_file(
    graph: &ProgramGraph,
    path: &Path,
    format: ExportFormat,
    colors: &EdgeColors,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut out = BufWriter::new(
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
    );
    export::write_graph(graph, &mut out, format, colors)?;
    out.flush()?;
    Ok(())
}

pub fn run_build(
    config: &ProggraphConfig,
    file: &Path,
    args: &BuildArgs,
    format: Option<&str>,
    output: Option<&Path>,
    tokens_only: bool,
) -> anyhow::Result<()> {
    let options = resolve_options(config, file, args)?;
    let format = resolve_format(config, format)?;
    let colors = config.edge_colors()?;
    let tokens_only = tokens_only || config.export.tokens_only.unwrap_or(false);

    tracing::info!("Building {} graph for {}", options.language, file.display());
    let started = Instant::now();
    let spinner = Spinner::new(&format!("Building {}", file.display()));
    let graph = load_graph(file, &options, tokens_only);
    spinner.finish_and_clear();
    let graph = graph?;

    match output {
        Some(path) => {
            write_to_file(&graph, path, format, &colors)?;
            ui::success(&format!(
                "Wrote {} ({} nodes, {} edges)",
                path.display(),
                graph.len(),
                graph.edge_count()
            ));
            ui::timing(&format!("{:.2?}", started.elapsed()));
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            export::write_graph(&graph, &mut out, format, &colors)?;
            out.flush()?;
        }
    }
    Ok(())
}

pub fn run_stats(
    config: &ProggraphConfig,
    file: &Path,
    args: &BuildArgs,
    json: bool,
) -> anyhow::Result<()> {
    let options = resolve_options(config, file, args)?;
    let graph = load_graph(file, &options, false)?;
    let stats = graph.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    ui::header(&format!("{} ({})", file.display(), stats.language));
    ui::section("Counts");
    println!("{}", ui::edge_table(&stats));
    Ok(())
}

/// Python and Java files under `root`, minus ignored paths
fn collect_sources(root: &Path, excludes: &[String]) -> Vec<PathBuf> {
    let filter = IgnoreFilter::new(root, excludes);
    let mut files: Vec<PathBuf> = ignore::WalkBuilder::new(root)
        .hidden(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !filter.is_ignored(entry.path(), is_dir)
        })
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| Language::from_path(path).is_some())
        .collect();
    files.sort();
    files
}

struct BatchJob<'a> {
    config: &'a ProggraphConfig,
    args: &'a BuildArgs,
    root: &'a Path,
    out_dir: &'a Path,
    format: ExportFormat,
    colors: &'a EdgeColors,
    tokens_only: bool,
}

impl BatchJob<'_> {
    /// Output path mirrors the source tree: `pkg/mod.py` -> `pkg/mod.py.dot`
    fn output_path(&self, file: &Path) -> PathBuf {
        let relative = file.strip_prefix(self.root).unwrap_or(file);
        let mut name = relative.as_os_str().to_owned();
        name.push(".");
        name.push(self.format.extension());
        self.out_dir.join(name)
    }

    fn run(&self, file: &Path) -> anyhow::Result<(usize, usize)> {
        let options = resolve_options(self.config, file, self.args)?;
        let graph = load_graph(file, &options, self.tokens_only)?;
        write_to_file(&graph, &self.output_path(file), self.format, self.colors)?;
        Ok((graph.len(), graph.edge_count()))
    }
}

pub fn run_batch(
    config: &ProggraphConfig,
    root: &Path,
    out_dir: &Path,
    args: &BuildArgs,
    format: Option<&str>,
    jobs: Option<usize>,
) -> anyhow::Result<()> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }
    let colors = config.edge_colors()?;
    let job = BatchJob {
        config,
        args,
        root,
        out_dir,
        format: resolve_format(config, format)?,
        colors: &colors,
        tokens_only: config.export.tokens_only.unwrap_or(false),
    };
    let workers = jobs
        .or(config.batch.jobs)
        .unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
        .max(1);

    let files = collect_sources(root, &config.batch.exclude);
    if files.is_empty() {
        ui::warn(&format!("No Python or Java files under {}", root.display()));
        return Ok(());
    }
    std::fs::create_dir_all(out_dir)?;

    ui::header(&format!("Building {} graphs with {} workers", files.len(), workers));
    ui::info("Output", &out_dir.display().to_string());
    tracing::info!("Batch over {} ({} files)", root.display(), files.len());

    let total = files.len();
    let started = Instant::now();
    let (progress, tx) = BatchProgress::new(total);
    let (work_tx, work_rx) = crossbeam::channel::unbounded::<PathBuf>();
    for file in files {
        work_tx.send(file)?;
    }
    drop(work_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let work_rx = work_rx.clone();
            let tx = tx.clone();
            let job = &job;
            scope.spawn(move || {
                for file in work_rx {
                    let display = file.strip_prefix(root).unwrap_or(&file).display().to_string();
                    let msg = match job.run(&file) {
                        Ok((nodes, edges)) => ProgressMessage::Built {
                            file: display,
                            nodes,
                            edges,
                        },
                        Err(e) => ProgressMessage::Failed {
                            file: display,
                            error: format!("{:#}", e),
                        },
                    };
                    if tx.send(msg).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(tx);

    let summary = progress.finish(started.elapsed());
    if !summary.failures.is_empty() {
        ui::section("Failures");
        for (file, error) in &summary.failures {
            ui::error(&format!("{}: {}", file, ui::dim(error)));
        }
        ui::warn(&format!("{} of {} files failed", summary.failures.len(), total));
    }
    Ok(())
}

pub fn run_init(path: &Path, force: bool) -> anyhow::Result<()> {
    write_config(path, &ProggraphConfig::starter(), force)?;
    ui::success(&format!("Wrote {}", path.display()));
    ui::summary_row("Edit it to change the defaults of", "build, stats and batch");
    Ok(())
}
