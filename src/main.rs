use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tagbump::cancel::CancelToken;
use tagbump::cli::{run_update, RunOptions, UpdateOutcome};
use tagbump::config::{self, Credentials};
use tagbump::domain::{MatchPattern, UpdateRequest};
use tagbump::git::Git2Repository;
use tagbump::{ui, TagBumpError};

#[derive(clap::Parser)]
#[command(
    name = "tagbump",
    version,
    about = "Bump an image tag in a git-tracked config file, commit and push"
)]
#[command(group(
    clap::ArgGroup::new("match")
        .required(true)
        .args(["pattern", "kustomize_image"])
))]
struct Args {
    #[arg(long, help = "URL of the git repository to update")]
    repo: String,

    #[arg(long, help = "Path of the file to update, relative to the repository root")]
    file: String,

    #[arg(long, help = "New tag to write")]
    tag: String,

    #[arg(
        long,
        help = "Regex with three capture groups: prefix, tag, suffix"
    )]
    pattern: Option<String>,

    #[arg(long, help = "Retag this image in a kustomization images list")]
    kustomize_image: Option<String>,

    #[arg(long, help = "Commit locally and print the new content without pushing")]
    dry_run: bool,

    #[arg(long, help = "Force-push even if the remote branch moved")]
    force: bool,

    #[arg(long, help = "Remote to push to (default from config: origin)")]
    remote: Option<String>,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(args.verbose);

    match run(&args) {
        Ok(outcome) => {
            ui::display_outcome(&outcome, &args.file, &args.tag);
            ExitCode::SUCCESS
        }
        Err(e) => match e.downcast_ref::<TagBumpError>() {
            Some(err) => {
                ui::display_error(err);
                ExitCode::from(err.exit_code() as u8)
            }
            None => {
                eprintln!("ERROR: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tagbump=debug" } else { "tagbump=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<UpdateOutcome> {
    let config = config::load_config(args.config.as_deref())?;

    if config::load_env_file(Path::new(config::ENV_FILE_NAME))? {
        tracing::debug!(file = config::ENV_FILE_NAME, "loaded environment file");
    }

    // Credentials are a startup requirement, checked before any request is built
    let credentials = Credentials::resolve(&config.credentials)?;

    let pattern = match (&args.pattern, &args.kustomize_image) {
        (Some(pattern), _) => MatchPattern::new(pattern)?,
        (None, Some(image)) => MatchPattern::kustomize_image(image)?,
        (None, None) => return Err(TagBumpError::config("Either --pattern or --kustomize-image is required").into()),
    };

    let request = UpdateRequest::new(&args.repo, &args.file, pattern, &args.tag)?
        .with_dry_run(args.dry_run);

    let mut options = RunOptions::from_config(&config);
    if args.force {
        options.force = true;
    }
    if let Some(remote) = &args.remote {
        options.remote = remote.clone();
    }

    let cancel = match config.network.timeout_secs {
        0 => CancelToken::new(),
        secs => CancelToken::with_timeout(Duration::from_secs(secs)),
    };
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || on_interrupt.cancel())
        .context("Failed to install Ctrl-C handler")?;

    if request.dry_run() {
        ui::display_status("Dry run: the remote will not be modified");
    }

    let repo = Git2Repository::new(credentials);
    Ok(run_update(&repo, &request, &options, &cancel)?)
}
