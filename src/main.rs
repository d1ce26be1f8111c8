use anyhow::Result;
use clap::Parser;

use relver::config::{self, Config};
use relver::context::BuildContext;
use relver::history::{GithubHistoryClient, HistoryClient, LocalGitHistory};
use relver::output::docker::docker_info;
use relver::output::oci::oci_info;
use relver::output::OutputSink;
use relver::release::{resolve_release, ReleaseOutcome, ReleaseRequest};
use relver::semver::resolve_build_version;
use relver::ui;

#[derive(clap::Parser)]
#[command(
    name = "relver",
    about = "Compute CI build versions and mint release tags from conventional commits"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, help = "Seed version when no release exists yet (e.g. 0.1.0)")]
    base_version: Option<String>,

    #[arg(
        long = "branch-mapping",
        help = "branch:label mapping, repeatable (e.g. main:edge)"
    )]
    branch_mappings: Vec<String>,

    #[arg(long, help = "Prefix for pre-release identifiers")]
    prerelease_prefix: Option<String>,

    #[arg(long, help = "Prefix carried by release tag names")]
    tag_prefix: Option<String>,

    #[arg(long, help = "Branch on which release tags are created")]
    releases_branch: Option<String>,

    #[arg(long, help = "Bump patch even when no qualifying commits are found")]
    force_patch_increment: bool,

    #[arg(long, help = "Container image name for docker tag derivation")]
    docker_image: Option<String>,

    #[arg(long, help = "Platform suffix appended to derived docker tags")]
    docker_platform_suffix: Option<String>,

    #[arg(long, help = "Write the resolved semVer to this file")]
    version_file: Option<String>,

    #[arg(long, env = "GITHUB_SHA", help = "Commit sha of the build")]
    sha: String,

    #[arg(long = "ref", env = "GITHUB_REF", default_value = "", help = "Ref of the build")]
    git_ref: String,

    #[arg(long, env = "GITHUB_RUN_NUMBER", default_value_t = 0, help = "CI run number")]
    run_number: u64,

    #[arg(long, env = "GITHUB_EVENT_NAME", default_value = "", help = "CI event kind")]
    event_name: String,

    #[arg(long, env = "GITHUB_REPOSITORY", default_value = "", help = "owner/name of the repository")]
    repository: String,

    #[arg(long, env = "GITHUB_TOKEN", default_value = "", hide_env_values = true, help = "API token")]
    github_token: String,

    #[arg(
        long,
        env = "GITHUB_API_URL",
        default_value = "https://api.github.com",
        help = "API base URL"
    )]
    api_url: String,

    #[arg(long, help = "Read history from the local checkout instead of the API")]
    local: bool,
}

fn merge_config(args: &Args) -> Result<Config> {
    let mut config = config::load_config(args.config.as_deref())?;

    if let Some(base_version) = &args.base_version {
        config.base_version = base_version.clone();
    }
    if !args.branch_mappings.is_empty() {
        config.branch_mappings = config::parse_branch_mappings(&args.branch_mappings)?;
    }
    if let Some(prefix) = &args.prerelease_prefix {
        config.prerelease_prefix = prefix.clone();
    }
    if let Some(prefix) = &args.tag_prefix {
        config.tag_prefix = prefix.clone();
    }
    if let Some(branch) = &args.releases_branch {
        config.releases_branch = branch.clone();
    }
    if args.force_patch_increment {
        config.force_patch_increment_if_no_changes = true;
    }
    if let Some(image) = &args.docker_image {
        config.docker_image = image.clone();
    }
    if let Some(suffix) = &args.docker_platform_suffix {
        config.docker_platform_suffix = suffix.clone();
    }
    if let Some(path) = &args.version_file {
        config.version_file = path.clone();
    }

    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = merge_config(&args)?;

    let ctx = BuildContext {
        sha: args.sha.clone(),
        git_ref: args.git_ref.clone(),
        run_number: args.run_number,
        event_name: args.event_name.clone(),
    };

    // Pick the history client. Without a token or a local checkout there
    // is nothing to consult: release creation is skipped and the seed
    // version carries the build.
    let history: Option<Box<dyn HistoryClient>> = if args.local {
        Some(Box::new(LocalGitHistory::discover(".")?))
    } else if !args.github_token.is_empty() {
        Some(Box::new(GithubHistoryClient::new(
            &args.api_url,
            &args.repository,
            &args.github_token,
        )?))
    } else {
        ui::display_info("API token is missing. Skipping release creation...");
        None
    };

    let outcome: ReleaseOutcome = match &history {
        Some(client) => resolve_release(
            client.as_ref(),
            &ReleaseRequest {
                sha: &ctx.sha,
                git_ref: &ctx.git_ref,
                releases_branch: &config.releases_branch,
                base_version: &config.base_version,
                force_patch_if_no_changes: config.force_patch_increment_if_no_changes,
                tag_prefix: &config.tag_prefix,
            },
        )?,
        None => ReleaseOutcome::baseline(&config.base_version)?,
    };

    let version = resolve_build_version(
        &outcome.base_version(),
        &config.branch_mappings,
        &config.prerelease_prefix,
        &ctx,
    )?;

    let sink = OutputSink::from_env();

    if let Some(created) = outcome.created_tag {
        sink.emit("release_tag", &created.to_string())?;
    }
    sink.emit("release_previousTag", &outcome.previous_tag.to_string())?;
    sink.emit_object("ver", &version)?;
    sink.emit_object("oci", &oci_info(&version, &ctx))?;

    if !config.docker_image.is_empty() {
        let releases = match &history {
            Some(client) => Some(client.list_releases()?),
            None => None,
        };
        let docker = docker_info(
            &config.docker_image,
            &version,
            &config.docker_platform_suffix,
            &ctx,
            releases.as_deref(),
        );
        sink.emit_object("docker", &docker)?;
    }

    if !config.version_file.is_empty() {
        std::fs::write(&config.version_file, &version.sem_ver)?;
        ui::display_success(&format!("Wrote semver to {}", config.version_file));
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        ui::display_error(&e.to_string());
        std::process::exit(1);
    }
}
