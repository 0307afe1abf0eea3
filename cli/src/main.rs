//! manuscript CLI - export manuscript projects to text, HTML, RTF and DOCX

mod raster;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use manuscript::{ExportFormat, Manuscript, Profile, Project, ProjectSource, ZipPackager};

use raster::HttpMapRasterizer;

#[derive(Parser)]
#[command(name = "manuscript")]
#[command(version)]
#[command(about = "Export manuscript projects to text, HTML, RTF and DOCX", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a project with a profile
    Export {
        /// Project file (JSON)
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Export profile (JSON); the standard profile if not specified
        #[arg(short, long, value_name = "PROFILE")]
        profile: Option<PathBuf>,

        /// Output file (derived from the project name if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format, overriding the profile
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Do not use the network
        #[arg(long)]
        offline: bool,

        /// Do not rasterize maps
        #[arg(long)]
        no_raster: bool,

        /// Static map URL template with {lat} {lon} {zoom} {width} {height} {marker}
        #[arg(long, value_name = "URL", env = "MANUSCRIPT_TILE_URL")]
        tile_url: Option<String>,
    },

    /// Print a preview of an export as JSON
    Preview {
        /// Project file (JSON)
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Export profile (JSON)
        #[arg(short, long, value_name = "PROFILE")]
        profile: Option<PathBuf>,

        /// Output format, overriding the profile
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Print the standard profile for a format as JSON
    Profile {
        /// Output format
        #[arg(short, long, value_enum, default_value = "txt")]
        format: FormatArg,
    },

    /// Show project information
    Info {
        /// Project file (JSON)
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Plain text
    Txt,
    /// Self-contained HTML
    Html,
    /// Rich Text Format
    Rtf,
    /// Word document
    Docx,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Txt => ExportFormat::Txt,
            FormatArg::Html => ExportFormat::Html,
            FormatArg::Rtf => ExportFormat::Rtf,
            FormatArg::Docx => ExportFormat::Docx,
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export {
            project,
            profile,
            output,
            format,
            offline,
            no_raster,
            tile_url,
        } => {
            cmd_export(
                &project,
                profile.as_deref(),
                output.as_deref(),
                format,
                offline,
                no_raster,
                tile_url,
            )
            .await
        }
        Commands::Preview {
            project,
            profile,
            format,
        } => cmd_preview(&project, profile.as_deref(), format).await,
        Commands::Profile { format } => cmd_profile(format),
        Commands::Info { project } => cmd_info(&project),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_profile(
    path: Option<&Path>,
    format: Option<FormatArg>,
) -> Result<Profile, manuscript::Error> {
    let profile = match path {
        Some(path) => Profile::load(path)?,
        None => Profile::for_format(format.map(Into::into).unwrap_or_default()),
    };
    Ok(match format {
        Some(format) => profile.with_format(format.into()),
        None => profile,
    })
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

async fn cmd_export(
    project_path: &Path,
    profile_path: Option<&Path>,
    output: Option<&Path>,
    format: Option<FormatArg>,
    offline: bool,
    no_raster: bool,
    tile_url: Option<String>,
) -> CliResult {
    let pb = spinner("Loading project...");
    let project = Project::load(project_path)?;
    let profile = load_profile(profile_path, format)?;

    let output_path = output.map(Path::to_path_buf).unwrap_or_else(|| {
        let stem = project_path.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}.{}", stem, profile.format.extension()))
    });

    let mut builder = Manuscript::new(profile);
    if offline {
        builder = builder.offline();
    }
    if no_raster {
        builder = builder.no_raster();
    }
    match tile_url {
        Some(url) if !offline && !no_raster => {
            builder = builder.with_rasterizer(Box::new(HttpMapRasterizer::new(url)));
        }
        Some(_) => log::debug!("Map rasterization disabled, ignoring tile URL"),
        None => {}
    }

    pb.set_message(format!("Exporting as {}...", builder.profile().format));
    let result = builder.export_async(&project).await?;

    pb.set_message("Writing output...");
    result.write_to(&output_path, &ZipPackager::new())?;
    pb.finish_and_clear();

    let stats = &result.stats;
    println!("{} {}", "Saved to".green(), output_path.display());
    println!("  {} {} texts", "├─".dimmed(), stats.text_count);
    println!("  {} {} objects", "├─".dimmed(), stats.object_count);
    println!("  {} {} words", "├─".dimmed(), stats.word_count);
    println!("  {} {} images", "└─".dimmed(), stats.image_count);
    if stats.raster_failures > 0 {
        println!(
            "{} {} map images could not be rasterized",
            "Warning:".yellow().bold(),
            stats.raster_failures
        );
    }

    Ok(())
}

async fn cmd_preview(
    project_path: &Path,
    profile_path: Option<&Path>,
    format: Option<FormatArg>,
) -> CliResult {
    let project = Project::load(project_path)?;
    let profile = load_profile(profile_path, format)?;

    let preview = Manuscript::new(profile)
        .offline()
        .preview_async(&project)
        .await?;
    println!("{}", preview.to_json()?);

    Ok(())
}

fn cmd_profile(format: FormatArg) -> CliResult {
    let profile = Profile::for_format(format.into());
    println!("{}", profile.to_json()?);
    Ok(())
}

fn cmd_info(project_path: &Path) -> CliResult {
    let project = Project::load(project_path)?;
    let info = project.info();

    println!("{}", "Project Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), project_path.display());
    println!("{}: {}", "Name".bold(), info.name);
    if let Some(ref author) = info.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(collection) = project.active_collection() {
        println!("{}: {}", "Collection".bold(), collection.name);
    }

    println!();
    println!("{}", "Corpus".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let texts = project.corpus_texts();
    let words: usize = texts
        .iter()
        .map(|t| t.delta.plain_text().split_whitespace().count())
        .sum();
    let checked_texts = texts.iter().filter(|t| t.checked).count();
    let objects = project.objects();
    let checked_objects = objects.iter().filter(|o| o.checked).count();

    println!("{}: {} ({} checked)", "Texts".bold(), texts.len(), checked_texts);
    println!("{}: {} ({} checked)", "Objects".bold(), objects.len(), checked_objects);
    println!("{}: {}", "Formats".bold(), project.formats.len());
    println!("{}: {}", "Words".bold(), words);

    if let Err(e) = project.validate() {
        println!();
        println!("{} {}", "Warning:".yellow().bold(), e);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "manuscript".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Manuscript export tool");
    println!();
    println!("License: MIT");
}
