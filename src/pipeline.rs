//! Run orchestration
//!
//! One run analyses every repository directory under a common parent. Each
//! repository gets its own [`RepoAnalysis`], so visited sets and header maps
//! never leak from one repository into another, whether repositories are
//! processed one after the other or on parallel workers.

use crate::api::{self, CommandLookup};
use crate::catalog::SyscallCatalog;
use crate::config::HunterConfig;
use crate::error::{HunterError, Result};
use crate::headers::HeaderResolver;
use crate::hunter::SyscallHunter;
use crate::inventory;
use crate::locator::OccurrenceLocator;
use crate::mapper::SyscallHeaderMapper;
use crate::report::{ArtifactWriter, RepoReport};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Per-repository analysis state
#[derive(Debug)]
pub struct RepoAnalysis<'a> {
    config: &'a HunterConfig,
    resolver: HeaderResolver,
    mapper: SyscallHeaderMapper,
    hunter: SyscallHunter,
}

impl<'a> RepoAnalysis<'a> {
    pub fn new(config: &'a HunterConfig, catalog: &SyscallCatalog) -> Result<Self> {
        Ok(Self {
            config,
            resolver: HeaderResolver::new(&config.include_root)
                .follow_local_includes(config.follow_local_includes),
            mapper: SyscallHeaderMapper::new(catalog, config.match_mode)?,
            hunter: SyscallHunter::new(catalog)?,
        })
    }

    /// Analyse the repository at `path`
    pub fn run(mut self, name: &str, path: &Path) -> Result<RepoReport> {
        if !path.is_dir() {
            return Err(HunterError::RepositoryNotFound(path.to_path_buf()));
        }
        tracing::info!("Analysing repository {}", path.display());

        let mut report = RepoReport::new(name, path);
        let sources = inventory::find_sources(path);
        if sources.is_empty() {
            tracing::warn!("No C/C++ files found in {}", path.display());
        }

        if self.config.api.enabled {
            if let Some(cmd) = &self.config.api.lookup_cmd {
                let lookup = CommandLookup::new(cmd, self.config.api.target_version.clone());
                report.api = Some(api::query_repository(&lookup, &sources));
            }
        }

        report.headers = self.resolver.resolve(&sources);

        tracing::info!(
            "Finding which syscall is found in which header ({:?} match)...",
            self.mapper.mode()
        );
        report.syscall_headers = self.mapper.map_headers(&report.headers.resolved);

        let paths: Vec<&Path> = sources.iter().map(|s| s.path.as_path()).collect();
        for syscall in report.syscall_headers.keys() {
            let locator = OccurrenceLocator::new(syscall)?;
            let found = locator.locate_all(paths.iter().copied());
            if !found.is_empty() {
                report.line_numbers.insert(syscall.clone(), found);
            }
        }

        for source in &sources {
            let found = self.hunter.hunt_file(&source.path);
            tracing::debug!(
                "[OK] System calls found in {} ({}): {}",
                source.path.display(),
                source.language.as_str(),
                found.len()
            );
            report.syscalls_per_file.insert(source.path.clone(), found);
        }

        report.sources = sources.into_iter().collect();
        Ok(report)
    }
}

/// Clear the output directory, or create it if needed
pub fn prepare_output_dir(output: &Path) -> Result<()> {
    if output.exists() {
        fs::remove_dir_all(output).map_err(|e| HunterError::write(output, e))?;
        fs::create_dir_all(output).map_err(|e| HunterError::write(output, e))?;
        tracing::info!("Directory '{}' cleared and recreated", output.display());
    } else {
        fs::create_dir_all(output).map_err(|e| HunterError::write(output, e))?;
        tracing::info!("Directory '{}' created", output.display());
    }
    Ok(())
}

/// Names of the immediate subdirectories of `parent`, sorted
pub fn list_repositories(parent: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(parent).map_err(|e| HunterError::read(parent, e))?;
    let mut repos: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    repos.sort();

    if repos.is_empty() {
        return Err(HunterError::NoRepositories(parent.to_path_buf()));
    }
    Ok(repos)
}

/// Load the catalog the configuration points at
///
/// With `builtin_catalog` set, a missing table file falls back to the
/// built-in x86_64 table.
pub fn load_catalog(config: &HunterConfig) -> Result<SyscallCatalog> {
    match SyscallCatalog::from_file(&config.catalog) {
        Err(HunterError::CatalogNotFound(path)) if config.builtin_catalog => {
            tracing::info!(
                "Catalog {} not found, using the built-in x86_64 table",
                path.display()
            );
            Ok(SyscallCatalog::builtin())
        }
        other => other,
    }
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<RepoReport>,
    /// Repositories that failed, with the reason
    pub failures: Vec<(String, String)>,
    pub elapsed: Duration,
}

/// Analyse one repository and write its artifacts
pub fn process_repository(
    config: &HunterConfig,
    catalog: &SyscallCatalog,
    name: &str,
) -> Result<RepoReport> {
    let path: PathBuf = config.repositories.join(name);
    let report = RepoAnalysis::new(config, catalog)?.run(name, &path)?;

    let writer = ArtifactWriter::create(&config.output, name)?;
    writer.write_all(&report, config.echo, config.dev_echo)?;
    tracing::info!("Results for {} saved in {}", name, writer.dir().display());
    Ok(report)
}

/// Analyse every repository the configuration names
pub fn run(config: &HunterConfig) -> Result<RunSummary> {
    let start = Instant::now();
    config.validate()?;

    let catalog = load_catalog(config)?;
    prepare_output_dir(&config.output)?;
    let repos = list_repositories(&config.repositories)?;
    tracing::info!("Repositories to analyse: {}", repos.join(", "));

    let outcomes: Vec<(String, Result<RepoReport>)> = if config.parallel {
        run_parallel(config, &catalog, &repos)?
    } else {
        repos
            .iter()
            .map(|name| (name.clone(), process_repository(config, &catalog, name)))
            .collect()
    };

    let mut summary = RunSummary::default();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(report) => summary.reports.push(report),
            Err(e) => {
                tracing::error!("Analysis of {} failed: {}", name, e);
                summary.failures.push((name, e.to_string()));
            }
        }
    }
    summary.elapsed = start.elapsed();
    Ok(summary)
}

/// Number of workers for `jobs` repositories, capped at the CPU count
pub fn worker_count(jobs: usize) -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or_else(|_| {
            tracing::warn!("Failed to detect CPU count, defaulting to 1 worker");
            1
        });
    cpus.min(jobs).max(1)
}

/// Fixed pool of scoped workers pulling repository names from a channel
///
/// Workers share only read-only state. Outcomes come back in the order of
/// `repos`; a repository whose worker panicked is reported as failed.
fn run_parallel(
    config: &HunterConfig,
    catalog: &SyscallCatalog,
    repos: &[String],
) -> Result<Vec<(String, Result<RepoReport>)>> {
    let workers = worker_count(repos.len());
    tracing::info!("Analysing {} repositories on {} workers", repos.len(), workers);

    let (job_tx, job_rx) = crossbeam::channel::unbounded::<(usize, &String)>();
    for job in repos.iter().enumerate() {
        if job_tx.send(job).is_err() {
            break;
        }
    }
    drop(job_tx);

    let (done_tx, done_rx) = crossbeam::channel::unbounded();
    crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let jobs = job_rx.clone();
                let done = done_tx.clone();
                scope.spawn(move |_| {
                    for (idx, name) in jobs.iter() {
                        let outcome = process_repository(config, catalog, name);
                        if done.send((idx, outcome)).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("An analysis worker panicked");
            }
        }
    })
    .map_err(|_| HunterError::WorkerPanicked("worker scope".to_string()))?;
    drop(done_tx);

    let mut outcomes: Vec<Option<Result<RepoReport>>> = repos.iter().map(|_| None).collect();
    for (idx, outcome) in done_rx.iter() {
        outcomes[idx] = Some(outcome);
    }
    Ok(repos
        .iter()
        .zip(outcomes)
        .map(|(name, outcome)| {
            let outcome =
                outcome.unwrap_or_else(|| Err(HunterError::WorkerPanicked(name.clone())));
            (name.clone(), outcome)
        })
        .collect())
}
