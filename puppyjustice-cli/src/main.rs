use clap::{Parser, Subcommand};
use log::*;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use puppyjustice::catalog::{Catalog, ClipProbe, FfprobeProbe};
use puppyjustice::timeline::{JsonSink, Sink};
use puppyjustice::transcript::{Case, Transcript};
use puppyjustice::{speaker, subtitle};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{0}")]
    General(String),
    #[error("Puppyjustice error: {0}")]
    Puppyjustice(puppyjustice::Error),
}

impl From<puppyjustice::Error> for CliError {
    fn from(e: puppyjustice::Error) -> Self {
        CliError::Puppyjustice(e)
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    cmd: ArgCmd,
}

#[derive(Parser, Debug)]
struct CatalogOpt {
    /// Directory with one subdirectory of clips per resource
    #[clap(long, default_value = "resources")]
    resources: PathBuf,

    /// JSON manifest of clip durations, used instead of probing `--resources`
    #[clap(long)]
    manifest: Option<PathBuf>,

    #[clap(long, default_value = "ffprobe")]
    ffprobe: String,
}

#[derive(Parser, Debug)]
struct BuildCmd {
    #[clap(long)]
    case: PathBuf,

    #[clap(long)]
    transcript: PathBuf,

    /// Defaults to the transcript's title
    #[clap(long)]
    title: Option<String>,

    #[clap(flatten)]
    catalog: CatalogOpt,

    /// TOML config file
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(long)]
    seed: Option<u64>,

    /// Where to write the timeline JSON
    #[clap(long)]
    out_path: PathBuf,

    /// Also write captions here
    #[clap(long)]
    captions_path: Option<PathBuf>,

    #[clap(long)]
    print_stats: bool,
}

#[derive(Parser, Debug)]
struct SubtitlesCmd {
    #[clap(long)]
    transcript: PathBuf,

    #[clap(long)]
    config: Option<PathBuf>,

    /// Defaults to stdout
    #[clap(long)]
    out_path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ChaptersCmd {
    #[clap(long)]
    transcript: PathBuf,

    #[clap(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CheckCaseCmd {
    case: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ArgCmd {
    Build(BuildCmd),
    Subtitles(SubtitlesCmd),
    Chapters(ChaptersCmd),
    Catalog(CatalogOpt),
    CheckCase(CheckCaseCmd),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| CliError::General(format!("Failed to read `{}`: {}", path.display(), e)))?;
    serde_json::from_str(&body)
        .map_err(|e| CliError::General(format!("Failed to parse `{}`: {}", path.display(), e)))
}

fn load_config(path: Option<&PathBuf>) -> Result<puppyjustice::Config, CliError> {
    let config = match path {
        Some(path) => {
            let config_string = std::fs::read_to_string(path)
                .map_err(|e| CliError::General(format!("Failed to read config file: {}", e)))?;
            toml::from_str(&config_string).map_err(|e: toml::de::Error| {
                CliError::General(format!("Failed to parse config file: {}", e))
            })?
        }
        None => puppyjustice::Config::default(),
    };

    config.validate()?;
    Ok(config)
}

fn load_catalog(opt: &CatalogOpt) -> Result<Catalog, CliError> {
    let catalog = match &opt.manifest {
        Some(manifest) => Catalog::from_manifest(manifest)?,
        None => {
            let probe = FfprobeProbe {
                binary: opt.ffprobe.clone(),
            };
            Catalog::load_dir(&opt.resources, &probe)?
        }
    };
    if !catalog.has_resource(puppyjustice::catalog::MISC_RESOURCE) {
        warn!("Catalog has no filler clips; every build will fail");
    }
    Ok(catalog)
}

fn cmd_build(opt: &BuildCmd) -> Result<(), CliError> {
    let config = load_config(opt.config.as_ref())?;
    let case: Case = read_json(&opt.case)?;
    let transcript: Transcript = read_json(&opt.transcript)?;
    let catalog = load_catalog(&opt.catalog)?;

    if !speaker::can_handle_case(&case) {
        warn!("Not every justice on this case has a clip pool");
    }

    let seed = match opt.seed {
        Some(seed) => seed,
        None => {
            let seed: u64 = rand::random();
            info!("Random seed chosen as: {}", seed);
            seed
        }
    };

    let title = opt.title.as_deref().unwrap_or(&transcript.title);
    let mut build =
        puppyjustice::build_video(title, &case, &transcript, &catalog, &config, seed)?;

    if let Some(ending) = build.timeline.ending.as_mut() {
        if ending.path.is_file() && opt.catalog.manifest.is_none() {
            let probe = FfprobeProbe {
                binary: opt.catalog.ffprobe.clone(),
            };
            match probe.duration(&ending.path) {
                Ok(duration) => ending.duration = Some(duration),
                Err(e) => warn!("Could not probe ending clip: {}", e),
            }
        }
    }

    JsonSink { pretty: true }.emit(&build.timeline, &opt.out_path)?;

    if let Some(captions_path) = &opt.captions_path {
        write_captions(&transcript, &config, captions_path)?;
    }

    if opt.print_stats {
        let stats = serde_json::to_string_pretty(&build.stats)
            .map_err(|e| CliError::General(e.to_string()))?;
        println!("{}", stats);
    }
    Ok(())
}

fn write_captions(
    transcript: &Transcript,
    config: &puppyjustice::Config,
    path: &Path,
) -> Result<(), CliError> {
    let captions = subtitle::transcript_captions(transcript, config);
    let file = File::create(path)
        .map_err(|e| CliError::General(format!("Failed to create `{}`: {}", path.display(), e)))?;
    let mut out = BufWriter::new(file);
    subtitle::write_captions(&captions, config, &mut out)?;
    out.flush()
        .map_err(|e| CliError::General(format!("Failed to write `{}`: {}", path.display(), e)))?;
    info!("Wrote {} captions to `{}`", captions.len(), path.display());
    Ok(())
}

fn cmd_subtitles(opt: &SubtitlesCmd) -> Result<(), CliError> {
    let config = load_config(opt.config.as_ref())?;
    let transcript: Transcript = read_json(&opt.transcript)?;

    match &opt.out_path {
        Some(path) => write_captions(&transcript, &config, path),
        None => {
            let captions = subtitle::transcript_captions(&transcript, &config);
            let stdout = std::io::stdout();
            subtitle::write_captions(&captions, &config, &mut stdout.lock())?;
            Ok(())
        }
    }
}

fn cmd_chapters(opt: &ChaptersCmd) -> Result<(), CliError> {
    let config = load_config(opt.config.as_ref())?;
    let transcript: Transcript = read_json(&opt.transcript)?;
    for line in subtitle::section_chapters(&transcript, &config) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_catalog(opt: &CatalogOpt) -> Result<(), CliError> {
    let catalog = load_catalog(opt)?;

    let longest_name = catalog
        .resources()
        .map(|(r, _)| r.len())
        .max()
        .unwrap_or(0)
        .max("Resource".len());

    println!(
        "{:<longest_name$} {:>5} {:>9} {:>8} {:>8}",
        "Resource",
        "Clips",
        "Total",
        "Longest",
        "Shortest",
        longest_name = longest_name,
    );

    for (resource, clips) in catalog.resources() {
        let total: f64 = clips.iter().map(|c| c.duration).sum();
        // Pools are sorted longest first
        let longest = clips.first().map(|c| c.duration).unwrap_or(0.0);
        let shortest = clips.last().map(|c| c.duration).unwrap_or(0.0);
        println!(
            "{:<longest_name$} {:>5} {:>9.2} {:>8.2} {:>8.2}",
            resource,
            clips.len(),
            total,
            longest,
            shortest,
            longest_name = longest_name,
        );
    }
    Ok(())
}

fn cmd_check_case(opt: &CheckCaseCmd) -> Result<(), CliError> {
    let mut unhandled = 0;
    for path in &opt.case {
        let case: Case = read_json(path)?;
        if speaker::can_handle_case(&case) {
            println!("{}: ok", path.display());
        } else {
            println!("{}: unknown justices", path.display());
            unhandled += 1;
        }
    }

    if unhandled > 0 {
        return Err(CliError::General(format!(
            "{} of {} cases can't be handled",
            unhandled,
            opt.case.len()
        )));
    }
    Ok(())
}

fn main() {
    pretty_env_logger::init();

    let args = Args::parse();

    let result = match args.cmd {
        ArgCmd::Build(opt) => cmd_build(&opt),
        ArgCmd::Subtitles(opt) => cmd_subtitles(&opt),
        ArgCmd::Chapters(opt) => cmd_chapters(&opt),
        ArgCmd::Catalog(opt) => cmd_catalog(&opt),
        ArgCmd::CheckCase(opt) => cmd_check_case(&opt),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
