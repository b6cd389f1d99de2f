use anyhow::Context;
use clap::{Parser, Subcommand};
use eqconvert_core::chart::Viewport;
use eqconvert_core::client::{Backend, HttpBackend, UploadFile};
use eqconvert_core::protocol::TargetFormat;
use eqconvert_core::session::Session;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "eqconvert",
    about = "Preview parametric EQ definitions and convert them to APO, AUPreset and RME TotalMix formats"
)]
struct Args {
    /// Backend base URL, including the API version prefix.
    #[arg(long, default_value_t = default_backend_url())]
    backend_url: String,

    #[command(subcommand)]
    command: Command,
}

fn default_backend_url() -> String {
    std::env::var("EQCONVERT_BACKEND_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8000/v1".to_string())
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the speakers known to the backend
    Speakers,
    /// List speaker brands
    Brands,
    /// List the predefined EQs available for a speaker
    Eqdata {
        speaker: String,
    },
    /// Upload EQ files and print the per-file outcome
    Upload {
        #[arg(required = true, value_name = "PATH")]
        files: Vec<PathBuf>,
    },
    /// Print chart specs (JSON) for an EQ selection
    Preview {
        #[command(flatten)]
        selection: Selection,

        /// Available viewport width in pixels
        #[arg(long, default_value_t = 1280)]
        viewport_width: u32,

        /// Available viewport height in pixels
        #[arg(long, default_value_t = 720)]
        viewport_height: u32,
    },
    /// Convert a selection to a target format and write the artifacts
    Convert {
        #[command(flatten)]
        selection: Selection,

        /// apo, aupreset, rme_totalmix_channel or rme_totalmix_room
        #[arg(long)]
        format: String,

        /// Directory the converted files are written to
        #[arg(long, default_value = ".", value_name = "DIR")]
        out_dir: PathBuf,

        /// Also print the indented preview of each artifact
        #[arg(long, default_value_t = false)]
        show: bool,
    },
}

#[derive(clap::Args, Debug)]
struct Selection {
    /// EQ files to upload as the working set
    #[arg(long, value_name = "PATH", num_args = 1.., conflicts_with_all = ["speaker", "eq"])]
    upload: Vec<PathBuf>,

    /// Speaker name (together with --eq)
    #[arg(long, requires = "eq")]
    speaker: Option<String>,

    /// EQ name within the speaker (together with --speaker)
    #[arg(long, requires = "speaker")]
    eq: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let client = HttpBackend::new(&args.backend_url)?;

    match args.command {
        Command::Speakers => {
            for speaker in client.speakers().await? {
                println!("{speaker}");
            }
        }
        Command::Brands => {
            for brand in client.brands().await? {
                println!("{brand}");
            }
        }
        Command::Eqdata { speaker } => {
            let eqs = client.speaker_eqdata(&speaker).await?;
            if eqs.is_empty() {
                eprintln!("no EQs found for {speaker:?}");
            }
            for eq in eqs {
                match eq.display_name.as_deref() {
                    Some(display) if display != eq.name => println!("{} ({display})", eq.name),
                    _ => println!("{}", eq.name),
                }
            }
        }
        Command::Upload { files } => {
            let mut session = Session::new(client);
            let report = session.upload(read_upload_files(&files)?).await?;
            for item in &report.items {
                match &item.message {
                    None => println!("ok: {}", item.name),
                    Some(message) => println!("ko: {} ({message})", item.name),
                }
            }
        }
        Command::Preview {
            selection,
            viewport_width,
            viewport_height,
        } => {
            let mut session = Session::new(client);
            populate(&mut session, &selection).await?;
            let viewport = Viewport {
                width: viewport_width,
                height: viewport_height,
            };
            let previews = session.chart_previews(viewport).await?;
            anyhow::ensure!(!previews.is_empty(), "no preview could be fetched");
            for preview in &previews {
                println!("# {}", preview.name);
                println!("{}", serde_json::to_string_pretty(&preview.stages)?);
                println!("{}", serde_json::to_string_pretty(&preview.response)?);
            }
        }
        Command::Convert {
            selection,
            format,
            out_dir,
            show,
        } => {
            let format: TargetFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let mut session = Session::new(client);
            populate(&mut session, &selection).await?;
            let conversions = session.convert(format).await?;
            anyhow::ensure!(!conversions.is_empty(), "no entry could be converted");
            for conversion in &conversions {
                let path = out_dir.join(&conversion.rendered.filename);
                std::fs::write(&path, &conversion.rendered.payload)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("{} -> {}", conversion.name, path.display());
                if show {
                    println!("{}", conversion.rendered.display_html);
                }
            }
        }
    }

    Ok(())
}

/// Install the selected EQs into the session: either an upload batch or a
/// single speaker EQ.
async fn populate(session: &mut Session<HttpBackend>, selection: &Selection) -> anyhow::Result<()> {
    if !selection.upload.is_empty() {
        let report = session.upload(read_upload_files(&selection.upload)?).await?;
        for item in report.items.iter().filter(|i| !i.accepted) {
            eprintln!(
                "rejected: {} ({})",
                item.name,
                item.message.as_deref().unwrap_or("unknown reason")
            );
        }
        anyhow::ensure!(
            report.accepted_count() > 0,
            "the backend accepted none of the uploaded files"
        );
        return Ok(());
    }
    match (&selection.speaker, &selection.eq) {
        (Some(speaker), Some(eq)) => {
            session.select_speaker_eq(speaker, eq).await?;
            Ok(())
        }
        _ => anyhow::bail!("select EQs with --upload or with --speaker and --eq"),
    }
}

fn read_upload_files(paths: &[PathBuf]) -> anyhow::Result<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        files.push(UploadFile {
            filename: file_name_of(path),
            bytes,
        });
    }
    Ok(files)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
