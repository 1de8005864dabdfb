//! crosspost - compose once, post to several social platforms
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow, bail};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crosspost::analysis::{self, estimate_engagement_boost};
use crosspost::api::Poster;
use crosspost::api::http::ReqwestClient;
use crosspost::api::twitter::TwitterPoster;
use crosspost::auth::{CredentialStore, EnvCredentials, FallbackCredentials};
use crosspost::{
    AuthenticityScorer, Config, Database, DispatchCoordinator, DispatchSummary, Draft, MediaRef,
    PlatformId, PostValidator, cancellation, constraints_for, parse_platforms,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match parse_args(std::env::args().skip(1).collect())? {
        Command::Analyze(opts) => analyze_cli(&opts),
        Command::Score(opts) => score_cli(&opts),
        Command::Check(opts) => check_cli(&opts),
        Command::Post(opts) => post_cli(&opts).await,
        Command::DraftSave(opts) => draft_save(&opts),
        Command::DraftList => draft_list(),
        Command::DraftPost { id, sequential } => draft_post(&id, sequential).await,
        Command::DraftDelete { id } => draft_delete(&id),
        Command::History { limit } => history_cli(limit),
        Command::Login { platform, token } => login(platform, token),
        Command::Logout { platform } => logout(platform),
        Command::Accounts => list_accounts(),
        Command::Platforms => list_platforms(),
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
    }
}

/// CLI commands
#[derive(Debug, PartialEq)]
enum Command {
    Analyze(Options),
    Score(Options),
    Check(Options),
    Post(Options),
    DraftSave(Options),
    DraftList,
    DraftPost { id: String, sequential: bool },
    DraftDelete { id: String },
    History { limit: usize },
    Login { platform: PlatformId, token: Option<String> },
    Logout { platform: PlatformId },
    Accounts,
    Platforms,
    Help,
    Version,
}

/// Text plus the flags shared by the composing commands
#[derive(Debug, Default, PartialEq)]
struct Options {
    text: String,
    platforms: Vec<PlatformId>,
    media: Vec<MediaRef>,
    sequential: bool,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self> {
        let mut opts = Self::default();
        let mut words = Vec::new();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--to" | "-t" => {
                    let list = args
                        .get(i + 1)
                        .ok_or_else(|| anyhow!("--to needs a comma-separated platform list"))?;
                    let parsed = parse_platforms(list);
                    if parsed.is_empty() {
                        bail!("No known platform in '{list}'\nRun 'crosspost platforms' for the list");
                    }
                    for platform in parsed {
                        if !opts.platforms.contains(&platform) {
                            opts.platforms.push(platform);
                        }
                    }
                    i += 2;
                }
                "--media" | "-m" => {
                    let spec = args
                        .get(i + 1)
                        .ok_or_else(|| anyhow!("--media needs a path[:image|video]"))?;
                    let media = MediaRef::parse(spec)
                        .ok_or_else(|| anyhow!("Invalid media '{spec}', expected path[:image|video]"))?;
                    opts.media.push(media);
                    i += 2;
                }
                "--sequential" => {
                    opts.sequential = true;
                    i += 1;
                }
                word => {
                    words.push(word.to_string());
                    i += 1;
                }
            }
        }
        opts.text = words.join(" ");
        Ok(opts)
    }

    /// Targets given on the command line, or the configured defaults
    fn targets(&self, config: &Config) -> Vec<PlatformId> {
        if self.platforms.is_empty() {
            config.default_targets()
        } else {
            self.platforms.clone()
        }
    }

    fn to_draft(&self, config: &Config) -> Draft {
        let mut draft = Draft::new(self.text.clone()).with_platforms(self.targets(config));
        for media in &self.media {
            draft.attach(media.clone());
        }
        draft
    }
}

fn parse_platform(arg: Option<&String>) -> Result<PlatformId> {
    let arg = arg.ok_or_else(|| anyhow!("Missing platform (e.g. twitter)"))?;
    arg.parse::<PlatformId>()
        .map_err(|e| anyhow!("{e}\nRun 'crosspost platforms' for the list"))
}

fn parse_args(args: Vec<String>) -> Result<Command> {
    let Some(command) = args.first() else {
        return Ok(Command::Help);
    };
    let rest = &args[1..];

    match command.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),

        "analyze" => Ok(Command::Analyze(Options::parse(rest)?)),
        "score" => Ok(Command::Score(Options::parse(rest)?)),
        "check" => Ok(Command::Check(Options::parse(rest)?)),
        "post" => Ok(Command::Post(Options::parse(rest)?)),

        "draft" => match rest.first().map(String::as_str) {
            Some("save") => Ok(Command::DraftSave(Options::parse(&rest[1..])?)),
            Some("list" | "ls") | None => Ok(Command::DraftList),
            Some("post") => {
                let id = rest
                    .get(1)
                    .ok_or_else(|| anyhow!("Missing draft id"))?
                    .clone();
                let sequential = rest.iter().any(|a| a == "--sequential");
                Ok(Command::DraftPost { id, sequential })
            }
            Some("delete" | "rm") => {
                let id = rest
                    .get(1)
                    .ok_or_else(|| anyhow!("Missing draft id"))?
                    .clone();
                Ok(Command::DraftDelete { id })
            }
            Some(other) => Err(anyhow!(
                "Unknown draft command: {other}\nRun 'crosspost --help' for usage"
            )),
        },

        "history" => {
            let limit = rest
                .iter()
                .position(|a| a == "--limit" || a == "-l")
                .and_then(|i| rest.get(i + 1))
                .and_then(|s| s.parse().ok())
                .unwrap_or(20);
            Ok(Command::History { limit })
        }

        "login" => Ok(Command::Login {
            platform: parse_platform(rest.first())?,
            token: rest.get(1).cloned(),
        }),
        "logout" => Ok(Command::Logout {
            platform: parse_platform(rest.first())?,
        }),
        "accounts" => Ok(Command::Accounts),
        "platforms" => Ok(Command::Platforms),

        other => Err(anyhow!(
            "Unknown command: {other}\nRun 'crosspost --help' for usage"
        )),
    }
}

fn print_help() {
    let config_path = crosspost::paths::config_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"crosspost - compose once, post to several social platforms

USAGE:
    crosspost [COMMAND]

COMMANDS:
    analyze <text> [--to <platforms>]        Hashtags, mentions, links, emojis, limits
    score <text>                             Authenticity score (0-100, advisory)
    check <text> [OPTIONS]                   Validate for each target platform
    post <text> [OPTIONS]                    Validate and post (Ctrl-C cancels)

    draft save <text> [OPTIONS]              Save a draft
    draft list                               List saved drafts
    draft post <id> [--sequential]           Post a saved draft (id prefix works)
    draft delete <id>                        Delete a saved draft

    history [--limit <n>]                    Recent dispatch outcomes (default: 20)

    login <platform> [token]                 Store a bearer token (reads stdin if omitted)
    logout <platform>                        Forget a stored token
    accounts                                 Platforms with a token available
    platforms                                Platform limits and media rules

OPTIONS:
    -t, --to <platforms>                     Comma-separated platforms (default: config)
    -m, --media <path[:image|video]>         Attach media (repeatable)
        --sequential                         Post to one platform at a time
    -h, --help                               Show this help message
    -v, --version                            Show version information

EXAMPLES:
    crosspost check "Wir feiern heute! 🎉 #launch" --to twitter,instagram
    crosspost post "Hello world, this is us" --to twitter
    crosspost post "New photo" --to instagram --media ~/pics/cat.jpg

ENVIRONMENT:
    CROSSPOST_<PLATFORM>_TOKEN               Token used when none is stored
    CROSSPOST_HOME                           Data directory override
    RUST_LOG                                 Log filter (default: warn)

CONFIG:
    {}
"#,
        config_path
    );
}

fn print_version() {
    println!("crosspost {}", crosspost::VERSION);
}

fn analyze_cli(opts: &Options) -> Result<()> {
    let config = Config::load()?;
    let result = analysis::analyze(&opts.text);

    println!("Hashtags:  {}", format_list(&result.hashtags));
    println!("Mentions:  {}", result.mention_count);
    println!("Links:     {}", result.link_count);
    println!("Emojis:    {}", result.emoji_count);
    println!("Words:     {}", analysis::count_words(&opts.text));
    println!("Boost:     {:.1}", estimate_engagement_boost(&opts.text));
    println!();

    for meta in analysis::platform_metadata(&opts.text, &opts.targets(&config)) {
        let marker = if meta.fits() { "✓" } else { "✗" };
        println!(
            "  {} {:<10} {:>5} / {:<5} ({} left)",
            marker,
            meta.platform.name(),
            meta.characters,
            meta.max_characters,
            meta.remaining
        );
    }

    Ok(())
}

fn score_cli(opts: &Options) -> Result<()> {
    let config = Config::load()?;
    let score = AuthenticityScorer::new(config.scoring).score(&opts.text);
    println!("{score:.0}");
    Ok(())
}

fn check_cli(opts: &Options) -> Result<()> {
    let config = Config::load()?;
    let draft = opts.to_draft(&config);
    let validator = PostValidator::new(config.validation);

    if let Err(reason) = validator.validate_global(&draft) {
        bail!("Draft rejected: {reason}");
    }

    let mut all_ok = true;
    for (platform, outcome) in validator.validate(&draft) {
        match outcome {
            Ok(()) => println!("  ✓ {}", platform.name()),
            Err(reason) => {
                all_ok = false;
                println!("  ✗ {}: {}", platform.name(), reason);
            }
        }
    }

    if !all_ok {
        println!("\nPlatforms marked ✗ will be skipped.");
    }
    Ok(())
}

/// Dispatch `draft` with Ctrl-C wired to cancellation and record the outcomes.
///
/// A fully posted draft is removed from storage. Anything else is saved back
/// with only the platforms that did not succeed, so a retry never posts twice.
async fn dispatch_cli(
    config: &Config,
    db: &Database,
    mut draft: Draft,
    sequential: bool,
) -> Result<()> {
    let credentials =
        FallbackCredentials::new(CredentialStore::open_default()?, EnvCredentials::default());
    let http = ReqwestClient::new(config.request_timeout())?;
    let coordinator = DispatchCoordinator::new(credentials, http)
        .with_validator(PostValidator::new(config.validation.clone()))
        .with_poster(Poster::Twitter(TwitterPoster::new(&config.twitter_endpoint)))
        .with_concurrency(config.concurrent_dispatch && !sequential);

    let (handle, signal) = cancellation();
    ctrlc::set_handler(move || handle.cancel()).context("Failed to install Ctrl-C handler")?;

    let (outcomes, aborted) = match coordinator.dispatch_with_cancel(&draft, &signal).await {
        Ok(outcomes) => (outcomes, None),
        Err(mut err) => (std::mem::take(&mut err.partial), Some(err)),
    };
    db.record_outcomes(draft.id, &outcomes)?;

    for outcome in &outcomes {
        let marker = if outcome.is_success() { "✓" } else { "✗" };
        println!("  {marker} {outcome}");
    }

    let summary = DispatchSummary::from_outcomes(&outcomes);
    if aborted.is_none() && summary.all_succeeded() {
        if db.delete_draft(draft.id)? {
            println!("\n✓ Draft removed");
        }
    } else {
        draft.drop_succeeded(&outcomes);
        db.save_draft(&draft)?;
        let id = short_id(&draft);
        println!("\nDraft kept as {id}. Retry with: crosspost draft post {id}");
    }

    if let Some(err) = aborted {
        return Err(err.into());
    }
    finish(summary)
}

async fn post_cli(opts: &Options) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open()?;
    let draft = opts.to_draft(&config);
    dispatch_cli(&config, &db, draft, opts.sequential).await
}

fn draft_save(opts: &Options) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open()?;
    let draft = opts.to_draft(&config);
    db.save_draft(&draft)?;
    println!("✓ Draft saved: {}", short_id(&draft));
    Ok(())
}

fn draft_list() -> Result<()> {
    let db = Database::open()?;
    let drafts = db.get_drafts()?;

    if drafts.is_empty() {
        println!("No saved drafts.");
        return Ok(());
    }

    for draft in drafts {
        let platforms: Vec<&str> = draft.platforms.iter().map(PlatformId::as_str).collect();
        println!(
            "  {}  {}  [{}]{}",
            short_id(&draft),
            draft.updated_at.format("%Y-%m-%d %H:%M"),
            platforms.join(","),
            if draft.has_media() { " +media" } else { "" }
        );
        println!("    {}", preview(&draft.text, 60));
    }

    Ok(())
}

async fn draft_post(id: &str, sequential: bool) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open()?;
    let draft = db
        .find_draft(id)?
        .ok_or_else(|| anyhow!("No draft with id {id}"))?;
    dispatch_cli(&config, &db, draft, sequential).await
}

fn draft_delete(id: &str) -> Result<()> {
    let db = Database::open()?;
    let draft = db
        .find_draft(id)?
        .ok_or_else(|| anyhow!("No draft with id {id}"))?;
    db.delete_draft(draft.id)?;
    println!("✓ Draft deleted");
    Ok(())
}

fn history_cli(limit: usize) -> Result<()> {
    let db = Database::open()?;
    let records = db.recent_outcomes(limit)?;

    if records.is_empty() {
        println!("Nothing dispatched yet.");
        return Ok(());
    }

    for record in records {
        println!(
            "  {}  {}  {}",
            record.dispatched_at.format("%Y-%m-%d %H:%M"),
            &record.draft_id.to_string()[..8],
            record.outcome
        );
    }
    Ok(())
}

fn login(platform: PlatformId, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => {
            println!("Paste the {} bearer token:", platform.name());
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            line
        }
    };
    let token = token.trim();
    if token.is_empty() {
        bail!("Empty token, nothing stored");
    }

    CredentialStore::open_default()?.store_token(platform, token)?;
    println!("✓ Token stored for {}", platform.name());
    Ok(())
}

fn logout(platform: PlatformId) -> Result<()> {
    if CredentialStore::open_default()?.delete_token(platform)? {
        println!("✓ Token removed for {}", platform.name());
    } else {
        println!("No token stored for {}", platform.name());
    }
    Ok(())
}

fn list_accounts() -> Result<()> {
    let store = CredentialStore::open_default()?;
    let stored = store.platforms()?;
    let env = EnvCredentials::default();

    let mut any = false;
    for &platform in PlatformId::all() {
        let source = if stored.contains(&platform) {
            "stored"
        } else if std::env::var(env.var_name(platform)).is_ok_and(|t| !t.trim().is_empty()) {
            "environment"
        } else {
            continue;
        };
        any = true;
        println!("  {:<10} ({})", platform.name(), source);
    }

    if !any {
        println!("No credentials configured.");
        println!("\nAdd one with:");
        println!("  crosspost login twitter");
    }
    Ok(())
}

fn list_platforms() -> Result<()> {
    println!("  {:<10} {:>7}  {:<7} {:<7} {}", "PLATFORM", "LIMIT", "IMAGES", "VIDEO", "MEDIA");
    for &platform in PlatformId::all() {
        let c = constraints_for(platform);
        println!(
            "  {:<10} {:>7}  {:<7} {:<7} {}",
            platform.as_str(),
            c.max_characters,
            yes_no(c.supports_images),
            yes_no(c.supports_video),
            if c.requires_media { "required" } else { "optional" }
        );
    }
    Ok(())
}

fn finish(summary: DispatchSummary) -> Result<()> {
    println!(
        "\n{} posted, {} skipped, {} failed",
        summary.succeeded, summary.skipped, summary.failed
    );
    if summary.succeeded == 0 {
        bail!("Nothing was posted");
    }
    Ok(())
}

fn short_id(draft: &Draft) -> String {
    draft.id.to_string()[..8].to_string()
}

fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn format_list(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
