use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bbl",
    about = "Bluebird Learn content packages: export, import and inspect subjects",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the configuration file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List subjects in the catalog
    Subjects,
    /// List teacher topics
    Topics(TopicsArgs),
    /// Record a teacher topic from a media file
    Record(RecordArgs),
    /// Remove a teacher topic
    Remove(RemoveArgs),
    /// Copy a teacher topic into the catalog
    Promote(PromoteArgs),
    /// Export a subject as a package archive
    Export(ExportArgs),
    /// Import a .tar package or a .json subject document
    Import(ImportArgs),
    /// List the entries of a package archive
    Inspect(InspectArgs),
    /// Move legacy inline media into the blob store
    Migrate,
}

#[derive(Args)]
pub struct TopicsArgs {
    /// Only topics of this subject
    #[arg(short, long)]
    pub subject: Option<String>,
}

#[derive(Args)]
pub struct RecordArgs {
    pub file: PathBuf,
    #[arg(short, long)]
    pub subject: String,
    #[arg(short, long, default_value = "")]
    pub title: String,
    #[arg(short, long, default_value = "audio")]
    pub kind: String,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub index: usize,
    #[arg(long)]
    pub delete_media: bool,
}

#[derive(Args)]
pub struct PromoteArgs {
    pub index: usize,
}

#[derive(Args)]
pub struct ExportArgs {
    pub subject: String,
    /// Output file or directory (defaults to the generated file name)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct InspectArgs {
    pub archive: PathBuf,
    /// Stop at the first header with a bad checksum
    #[arg(long)]
    pub verify: bool,
}
