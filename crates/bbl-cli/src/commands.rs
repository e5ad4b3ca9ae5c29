use std::path::{Path, PathBuf};

use anyhow::Context;
use bbl_archive::{ArchiveReader, DecodeEnd, DecodeOptions};
use bbl_package::{plan_migration, ImportReport, JsonFileStateStore, Library, StateStore};
use bbl_store::FsBlobStore;
use colored::Colorize;
use tracing::debug;

use crate::cli::*;
use crate::config::CliConfig;

type LocalLibrary = Library<FsBlobStore, JsonFileStateStore>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    debug!(data_dir = %config.data_dir.display(), "using data directory");

    match cli.command {
        Command::Subjects => cmd_subjects(&config),
        Command::Topics(args) => cmd_topics(&config, args),
        Command::Record(args) => cmd_record(&config, args),
        Command::Remove(args) => cmd_remove(&config, args),
        Command::Promote(args) => cmd_promote(&config, args),
        Command::Export(args) => cmd_export(&config, args),
        Command::Import(args) => cmd_import(&config, args),
        Command::Inspect(args) => cmd_inspect(&config, args),
        Command::Migrate => cmd_migrate(&config),
    }
}

fn open_library(config: &CliConfig) -> anyhow::Result<LocalLibrary> {
    let store = FsBlobStore::open(config.media_dir())
        .with_context(|| format!("opening media store in {}", config.media_dir().display()))?;
    let persist = JsonFileStateStore::new(config.state_path());
    Ok(Library::open(store, persist, config.package.clone())?)
}

fn cmd_subjects(config: &CliConfig) -> anyhow::Result<()> {
    let library = open_library(config)?;
    let state = library.state();
    if state.subjects.is_empty() {
        println!("No subjects.");
        return Ok(());
    }
    for subject in &state.subjects {
        let recorded = state.teacher_topics_for(&subject.id).count();
        println!(
            "{}  {}  ({} topics, {} recorded)",
            subject.id.yellow().bold(),
            subject.title,
            subject.topics.len(),
            recorded
        );
    }
    Ok(())
}

fn cmd_topics(config: &CliConfig, args: TopicsArgs) -> anyhow::Result<()> {
    let library = open_library(config)?;
    let mut shown = 0;
    for (index, topic) in library.state().teacher_topics.iter().enumerate() {
        if args.subject.as_deref().is_some_and(|s| s != topic.subject) {
            continue;
        }
        let media = match &topic.media {
            Some(m) if m.media_key.is_some() => m.media_kind.cyan().to_string(),
            Some(_) => "unresolved".red().to_string(),
            None => "-".dimmed().to_string(),
        };
        println!(
            "[{}] {}  {}  {}  {}",
            index,
            topic.subject.yellow(),
            topic.title.bold(),
            media,
            topic.created.format("%Y-%m-%d").to_string().dimmed()
        );
        shown += 1;
    }
    if shown == 0 {
        println!("No teacher topics.");
    }
    Ok(())
}

fn cmd_record(config: &CliConfig, args: RecordArgs) -> anyhow::Result<()> {
    let payload = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let size = payload.len();
    let mut library = open_library(config)?;
    let id = library.record_topic(&args.subject, &args.title, &args.kind, payload)?;
    println!(
        "{} Recorded {} ({} bytes) as {}",
        "✓".green().bold(),
        args.file.display(),
        size,
        id.yellow()
    );
    Ok(())
}

fn cmd_remove(config: &CliConfig, args: RemoveArgs) -> anyhow::Result<()> {
    let mut library = open_library(config)?;
    let removed = library.remove_teacher_topic(args.index, args.delete_media)?;
    let media = if args.delete_media { " and its media" } else { "" };
    println!("{} Removed {}{}", "✓".green().bold(), removed.title.bold(), media);
    Ok(())
}

fn cmd_promote(config: &CliConfig, args: PromoteArgs) -> anyhow::Result<()> {
    let mut library = open_library(config)?;
    library.promote_teacher_topic(args.index)?;
    let topic = &library.state().teacher_topics[args.index];
    println!(
        "{} Added {} to subject {}",
        "✓".green().bold(),
        topic.title.bold(),
        topic.subject.yellow()
    );
    Ok(())
}

fn cmd_export(config: &CliConfig, args: ExportArgs) -> anyhow::Result<()> {
    let library = open_library(config)?;
    let package = library.export_subject(&args.subject)?;
    let out = output_path(args.out, &package.file_name);
    std::fs::write(&out, &package.bytes).with_context(|| format!("writing {}", out.display()))?;

    println!(
        "{} Exported {} to {}",
        "✓".green().bold(),
        args.subject.yellow(),
        out.display().to_string().bold()
    );
    println!("  Size: {} bytes", package.bytes.len());
    println!("  Media: {}", package.media_count);
    for key in &package.skipped_media {
        println!("  {} missing media {}", "!".yellow(), key);
    }
    Ok(())
}

fn output_path(out: Option<PathBuf>, file_name: &str) -> PathBuf {
    match out {
        Some(dir) if dir.is_dir() => dir.join(file_name),
        Some(path) => path,
        None => PathBuf::from(file_name),
    }
}

fn cmd_import(config: &CliConfig, args: ImportArgs) -> anyhow::Result<()> {
    let mut library = open_library(config)?;
    let report = library.import_file(&args.file)?;
    print_report(&args.file, &report);
    Ok(())
}

fn print_report(file: &Path, report: &ImportReport) {
    println!(
        "{} Imported {} into {}",
        "✓".green().bold(),
        file.display(),
        report.subject_id.yellow().bold()
    );
    println!("  Topics: {}", report.topics_added);
    println!("  Teacher topics: {}", report.teacher_topics_added);
    if report.media_supported {
        println!("  Media: {}", report.media_imported);
        for path in &report.media_skipped {
            println!("  {} missing from archive: {}", "!".yellow(), path);
        }
    } else {
        println!("  Media: {}", "not included in JSON packages".yellow());
    }
}

fn cmd_inspect(config: &CliConfig, args: InspectArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.archive)
        .with_context(|| format!("reading {}", args.archive.display()))?;
    let options = DecodeOptions {
        verify_checksums: args.verify || config.package.verify_checksums,
    };
    let reader = ArchiveReader::with_options(&bytes, options);
    for entry in reader.entries() {
        println!("{:>10}  {}", entry.size(), entry.name);
    }
    let end = match reader.end() {
        DecodeEnd::Terminator => "complete".green(),
        DecodeEnd::EndOfInput => "no end marker".yellow(),
        DecodeEnd::Truncated => "truncated".red(),
        DecodeEnd::BadChecksum => "bad header checksum".red(),
    };
    println!("{} entries, {} bytes, {}", reader.len(), bytes.len(), end);
    Ok(())
}

fn cmd_migrate(config: &CliConfig) -> anyhow::Result<()> {
    let persist = JsonFileStateStore::new(config.state_path());
    let mut state = persist.load()?;
    let plan = plan_migration(&state.teacher_topics);
    for failure in &plan.failures {
        println!("  {} {}: {}", "✗".red(), failure.topic_id, failure.reason);
    }
    if plan.is_empty() {
        println!("{} Nothing to migrate.", "✓".green().bold());
        return Ok(());
    }

    let store = FsBlobStore::open(config.media_dir())?;
    let report = plan.apply(&mut state.teacher_topics, &store);
    if report.migrated > 0 {
        persist.save(&state)?;
    }
    println!("{} Migrated {} recordings", "✓".green().bold(), report.migrated);
    if report.failed > 0 {
        println!("  {} left inline", report.failed);
    }
    Ok(())
}
