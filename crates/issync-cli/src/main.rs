use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use issync_config::SyncConfig;
use issync_core::inspection::{self, StateFilter};
use issync_core::lock_middleware::{command_requires_lock, with_workspace_lock};
use issync_core::ports::{ContentConverter, RemoteAdapter};
use issync_core::{draft, executor, planner, pull, push, sync, three_way, transition};
use issync_jira::{AdfConverter, JiraAdapter};
use issync_store::WorkspaceStore;
use issync_transport::RetryingTransport;
use issync_types::{AggregateCounts, CommandInfo, Envelope, IssueStatus, Message, PerIssueResult, SystemClock};

// Re-exported so `cargo doc` surfaces every core module reachable from the
// CLI's entry points even where this binary only calls a handful directly.
#[allow(unused_imports)]
use {draft as _, executor as _, planner as _, three_way as _, transition as _};

#[derive(Parser, Debug)]
#[command(name = "issync", version)]
#[command(about = "A deterministic three-way synchronizer between a Markdown issue workspace and a remote issue tracker")]
struct Cli {
    /// Emit a single JSON envelope on stdout instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Workspace root (default: discovered from `.sync/config.json`, else `.issues`).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the workspace layout and a default config file.
    Init,
    /// Fetch remote issues into the workspace.
    Pull {
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Push local changes to the remote tracker.
    Push {
        #[arg(long)]
        dry_run: bool,
    },
    /// Push then pull.
    Sync {
        #[arg(long)]
        dry_run: bool,
    },
    /// Show local changes relative to each issue's base snapshot.
    Status {
        #[arg(long, default_value = "all")]
        state: String,
        #[arg(long, default_value = "")]
        key: String,
        /// Include `unchanged` records (omitted by default).
        #[arg(long)]
        all: bool,
    },
    /// List every issue file in the workspace.
    List {
        #[arg(long, default_value = "all")]
        state: String,
        #[arg(long, default_value = "")]
        key: String,
    },
    /// Show a line-oriented diff of every modified issue file.
    Diff {
        #[arg(long, default_value = "all")]
        state: String,
        #[arg(long, default_value = "")]
        key: String,
    },
    /// Create a new local-draft issue file.
    New {
        summary: String,
        #[arg(long, default_value = "Task")]
        issue_type: String,
    },
    /// Open an issue file in `$EDITOR`.
    Edit { key: String },
    /// Print an issue file's contents.
    View { key: String },
}

trait Reporter {
    fn info(&mut self, msg: &str);
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

struct CliReporter;

impl Reporter for CliReporter {
    fn info(&mut self, msg: &str) {
        eprintln!("[info] {msg}");
    }
    fn warn(&mut self, msg: &str) {
        eprintln!("[warn] {msg}");
    }
    fn error(&mut self, msg: &str) {
        eprintln!("[error] {msg}");
    }
}

fn main() {
    let cli = Cli::parse();
    let json = cli.json;
    let command_name = command_name(&cli.command).to_string();
    let dry_run = matches!(&cli.command, Commands::Push { dry_run: true } | Commands::Sync { dry_run: true });

    let mut reporter = CliReporter;
    let start = Instant::now();
    let outcome = run(cli, &mut reporter);

    let (counts, issues, fatal) = match outcome {
        Ok((counts, issues)) => (counts, issues, false),
        Err(e) => {
            reporter.error(&format!("{e:#}"));
            (AggregateCounts { errors: 1, ..Default::default() }, Vec::new(), true)
        }
    };

    let envelope = Envelope::new(
        CommandInfo { name: command_name, duration_ms: start.elapsed().as_millis() as u64, dry_run },
        counts,
        issues,
    );
    render_envelope(&envelope, json, fatal);
    std::process::exit(Envelope::exit_code(&envelope.counts, fatal));
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init => "init",
        Commands::Pull { .. } => "pull",
        Commands::Push { .. } => "push",
        Commands::Sync { .. } => "sync",
        Commands::Status { .. } => "status",
        Commands::List { .. } => "list",
        Commands::Diff { .. } => "diff",
        Commands::New { .. } => "new",
        Commands::Edit { .. } => "edit",
        Commands::View { .. } => "view",
    }
}

fn render_envelope(envelope: &Envelope, json: bool, fatal: bool) {
    if json {
        println!("{}", serde_json::to_string(envelope).expect("envelope always serializes"));
        return;
    }
    if fatal {
        return;
    }
    println!(
        "{}: processed={} updated={} created={} conflicts={} warnings={} errors={}",
        envelope.command.name,
        envelope.counts.processed,
        envelope.counts.updated,
        envelope.counts.created,
        envelope.counts.conflicts,
        envelope.counts.warnings,
        envelope.counts.errors
    );
    for issue in &envelope.issues {
        println!("  {} [{:?}] {}", issue.key, issue.status, issue.action);
        for message in &issue.messages {
            let code = message.reason_code.map(|c| format!(" ({})", c.as_str())).unwrap_or_default();
            println!("    {:?}{code}: {}", message.level, message.text);
        }
    }
}

fn run(cli: Cli, reporter: &mut dyn Reporter) -> Result<(AggregateCounts, Vec<PerIssueResult>)> {
    let start_dir = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let config = issync_config::load_config(&start_dir).context("failed to load config")?;
    let root = cli.root.unwrap_or_else(|| config.root.clone());
    let store = WorkspaceStore::new(&root);
    let clock = SystemClock;

    if command_requires_lock(command_name(&cli.command)) {
        with_workspace_lock(&root, &config.lock, &clock, || {
            dispatch(cli.command, &config, &store, &clock, reporter)
        })
    } else {
        dispatch(cli.command, &config, &store, &clock, reporter)
    }
}

fn build_adapter(config: &SyncConfig) -> Result<JiraAdapter> {
    let base_url = config.remote.base_url.clone().context("remote.base_url is not configured")?;
    let email = config.remote.email.clone().context("remote.email is not configured")?;
    let token = config.remote.api_token.clone().context("remote.api_token is not configured")?;
    let transport = RetryingTransport::new(config.retry.clone());
    Ok(JiraAdapter::new(base_url, &email, &token, transport))
}

fn dispatch(
    command: Commands,
    config: &SyncConfig,
    store: &WorkspaceStore,
    clock: &SystemClock,
    reporter: &mut dyn Reporter,
) -> Result<(AggregateCounts, Vec<PerIssueResult>)> {
    match command {
        Commands::Init => {
            store.ensure_layout().context("failed to create workspace layout")?;
            issync_config::save_config(&store.root().to_path_buf(), config).context("failed to write config")?;
            reporter.info(&format!("initialized workspace at {}", store.root().display()));
            Ok((AggregateCounts { processed: 1, ..Default::default() }, Vec::new()))
        }
        Commands::Pull { query } => {
            let adapter = build_adapter(config)?;
            let converter = AdfConverter;
            let options = pull::PullOptions {
                query: if query.is_empty() { String::new() } else { query },
                page_size: config.pull.page_size as u64,
                concurrency: config.pull.concurrency,
            };
            let report = pull::run_pull(&adapter, &converter, store, clock, &options).context("pull failed")?;
            Ok((report.counts, report.results))
        }
        Commands::Push { dry_run } => {
            let adapter = build_adapter(config)?;
            let converter = AdfConverter;
            let options =
                push::PushOptions { dry_run, project_key: config.project_key.clone(), ..push::PushOptions::default() };
            let report = push::run_push(&adapter, &converter, store, &options).context("push failed")?;
            Ok((report.counts, report.results))
        }
        Commands::Sync { dry_run } => {
            let adapter = build_adapter(config)?;
            let converter = AdfConverter;
            let push_options =
                push::PushOptions { dry_run, project_key: config.project_key.clone(), ..push::PushOptions::default() };
            let pull_options = pull::PullOptions {
                page_size: config.pull.page_size as u64,
                concurrency: config.pull.concurrency,
                ..pull::PullOptions::default()
            };
            let (report, error) = sync::run_sync(&adapter, &converter, store, clock, &push_options, &pull_options);
            if let Some(e) = error {
                bail!(e);
            }
            Ok((report.counts, report.results))
        }
        Commands::Status { state, key, all } => {
            let results = inspection::status(store, parse_state(&state)?, &key, all).context("status failed")?;
            Ok((counts_from(&results), results))
        }
        Commands::List { state, key } => {
            let results = inspection::list(store, parse_state(&state)?, &key).context("list failed")?;
            Ok((counts_from(&results), results))
        }
        Commands::Diff { state, key } => {
            let diffs = inspection::diff(store, parse_state(&state)?, &key).context("diff failed")?;
            let results: Vec<PerIssueResult> = diffs
                .into_iter()
                .map(|d| {
                    println!("{}", d.text);
                    PerIssueResult { key: d.key, action: "diff".to_string(), status: IssueStatus::Success, messages: vec![Message::info(d.text)] }
                })
                .collect();
            Ok((counts_from(&results), results))
        }
        Commands::New { summary, issue_type } => {
            let result = run_new(store, &summary, &issue_type)?;
            Ok((counts_from(std::slice::from_ref(&result)), vec![result]))
        }
        Commands::Edit { key } => {
            let result = run_edit(store, &key)?;
            Ok((counts_from(std::slice::from_ref(&result)), vec![result]))
        }
        Commands::View { key } => {
            let contents = find_issue_file(store, &key)?.1;
            println!("{contents}");
            let result =
                PerIssueResult { key, action: "view".to_string(), status: IssueStatus::Success, messages: Vec::new() };
            Ok((counts_from(std::slice::from_ref(&result)), vec![result]))
        }
    }
}

fn parse_state(raw: &str) -> Result<StateFilter> {
    match raw {
        "all" => Ok(StateFilter::All),
        "open" => Ok(StateFilter::Open),
        "closed" => Ok(StateFilter::Closed),
        other => bail!("invalid --state {other:?}: expected all, open, or closed"),
    }
}

fn counts_from(results: &[PerIssueResult]) -> AggregateCounts {
    let mut counts = AggregateCounts::default();
    for result in results {
        counts.record(result);
    }
    counts
}

fn mint_draft_key() -> String {
    let bytes: [u8; 6] = rand::random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("L-{hex}")
}

fn run_new(store: &WorkspaceStore, summary: &str, issue_type: &str) -> Result<PerIssueResult> {
    let key_str = mint_draft_key();
    let canonical_key = issync_types::CanonicalKey::parse(&key_str).expect("minted key always valid");

    let front_matter = issync_types::FrontMatter {
        schema_version: issync_types::SCHEMA_VERSION.to_string(),
        key: key_str.clone(),
        summary: summary.to_string(),
        issue_type: issue_type.to_string(),
        status: "Open".to_string(),
        priority: None,
        assignee: None,
        labels: Default::default(),
        reporter: None,
        created_at: None,
        updated_at: None,
        synced_at: None,
    };
    let doc = issync_types::Document { canonical_key, front_matter, markdown_body: String::new(), raw_rich_text_json: None };
    let canonical = issync_document::render(&doc);
    let filename = issync_document::issue_filename(&doc.canonical_key, summary);

    store.ensure_layout()?;
    store.write_issue_file(&filename, "Open", &canonical, None)?;

    Ok(PerIssueResult {
        key: key_str,
        action: "new".to_string(),
        status: IssueStatus::Success,
        messages: vec![Message::info(format!("created {filename}"))],
    })
}

fn find_issue_file(store: &WorkspaceStore, key: &str) -> Result<(PathBuf, String)> {
    for path in store.list_issue_files()? {
        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if issync_document::parse_filename_key(&filename).map(|k| k.as_str() == key).unwrap_or(false) {
            let contents = store.read_issue_file(&path)?;
            return Ok((path, contents));
        }
    }
    bail!("no issue file found for key {key:?}")
}

fn run_edit(store: &WorkspaceStore, key: &str) -> Result<PerIssueResult> {
    let (path, _contents) = find_issue_file(store, key)?;
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let absolute = store.root().join(&path);
    let status = std::process::Command::new(&editor)
        .arg(&absolute)
        .status()
        .with_context(|| format!("failed to launch editor {editor:?}"))?;
    if !status.success() {
        bail!("editor {editor:?} exited with {status}");
    }

    let rewritten = store.read_issue_file(&path)?;
    let doc = issync_document::parse(&rewritten).context("edited file no longer parses")?;
    let canonical = issync_document::render(&doc);
    if canonical != rewritten {
        let filename = path.file_name().and_then(|n| n.to_str()).context("issue file path has no valid filename")?;
        store.write_issue_file(filename, &doc.front_matter.status, &canonical, None)?;
    }

    Ok(PerIssueResult {
        key: key.to_string(),
        action: "edit".to_string(),
        status: IssueStatus::Success,
        messages: Vec::new(),
    })
}
