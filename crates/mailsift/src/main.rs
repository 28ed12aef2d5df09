//! `mailsift` - LLM-assisted triage for maildir-style mail stores.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod gate;

use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use mailsift_core::config::cache_dir;
use mailsift_core::rules::CompiledRule;
use mailsift_core::store::write_snapshot;
use mailsift_core::{
    AutoApprove, BatchCoordinator, CancelToken, Classifier, CleanupAnalysis, Config,
    ConfirmationGate, CooldownPause, DispositionEngine, Folder, HttpLlmClient, ImapRemoteDeleter,
    LlmReplyDrafter, MailStore, Mode, ReportEntry, RuleRepository, RunReport, SearchCriteria,
    StoredRule, apply_cleanup, review_folder,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command, RulesCommand, RunMode};
use gate::StdinGate;

const SNAPSHOT_FILE: &str = "inbox_snapshot.json";

type Engine = DispositionEngine<ImapRemoteDeleter, LlmReplyDrafter<HttpLlmClient>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsift=info,mailsift_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)
        .await
        .with_context(|| format!("loading {}", config_path.display()))?;

    match cli.command {
        Command::Run {
            mode,
            folder,
            limit,
            batch_size,
            max_batches,
            yes,
        } => {
            let mode = match mode {
                RunMode::Interactive => Mode::Interactive,
                RunMode::Silent => Mode::Silent,
                RunMode::Batched => Mode::SilentBatched {
                    size: batch_size.unwrap_or(config.batch.size),
                    max_batches: max_batches.or(config.batch.max_batches),
                },
            };
            let source = parse_folder(&folder)?;
            if yes {
                run(&config, mode, source, limit, AutoApprove).await
            } else {
                run(&config, mode, source, limit, StdinGate::default()).await
            }
        }
        Command::Review { folder } => review(&config, parse_folder(&folder)?).await,
        Command::Cleanup { folder, top, apply } => {
            cleanup(&config, parse_folder(&folder)?, top, apply).await
        }
        Command::Status => status(&config).await,
        Command::Search {
            folder,
            sender,
            subject,
            from,
            to,
        } => {
            let folder = parse_folder(&folder)?;
            let criteria = SearchCriteria {
                sender,
                subject,
                since: from.as_deref().map(SearchCriteria::parse_date).transpose()?,
                until: to.as_deref().map(SearchCriteria::parse_date).transpose()?,
            };
            search(&config, folder, &criteria).await
        }
        Command::Rules { action } => rules(&config, action).await,
    }
}

fn parse_folder(name: &str) -> anyhow::Result<Folder> {
    match Folder::parse(name) {
        Some(folder) => Ok(folder),
        None => bail!("unknown folder {name:?}"),
    }
}

fn engine(config: &Config, llm: HttpLlmClient) -> Engine {
    DispositionEngine::new(
        MailStore::new(config.store.clone()),
        ImapRemoteDeleter::new(config.imap.clone()),
        LlmReplyDrafter::new(llm, config.reply.clone()),
    )
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancelToken {
    let cancel = CancelToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping after the current message");
            token.cancel();
        }
    });
    cancel
}

async fn open_rules(config: &Config) -> anyhow::Result<RuleRepository> {
    let path = config.rules_db_path();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    RuleRepository::new(&path.to_string_lossy())
        .await
        .with_context(|| format!("opening rules database {}", path.display()))
}

async fn run<G: ConfirmationGate>(
    config: &Config,
    mode: Mode,
    source: Folder,
    limit: Option<usize>,
    gate: G,
) -> anyhow::Result<()> {
    let rules = open_rules(config).await?;
    let llm = HttpLlmClient::new(config.llm.clone())?;
    let engine = engine(config, llm.clone());
    let cancel = cancel_on_ctrl_c();
    let pause = CooldownPause::new(
        Duration::from_secs(config.batch.cooldown_min_secs),
        Duration::from_secs(config.batch.cooldown_max_secs),
    )
    .with_cancel(cancel.clone());

    let coordinator = BatchCoordinator::new(
        Classifier::new(llm, rules.clone()),
        engine,
        rules,
        gate,
        pause,
    )
    .with_cancel(cancel)
    .with_body_limit(config.llm.body_limit)
    .with_source(source);

    let candidates = coordinator.candidates(limit).await?;
    info!(candidates = candidates.len(), folder = %source, "starting run");
    let report = coordinator.run(&candidates, mode).await?;
    print_report(&report);

    if mode != Mode::Interactive {
        let store = coordinator.engine().store();
        let remaining = store
            .search(Folder::Inbox, &SearchCriteria::default())
            .await?;
        let path = cache_dir().join(SNAPSHOT_FILE);
        let count = write_snapshot(&path, &remaining).await?;
        println!("{count} message(s) remain in the inbox (snapshot: {})", path.display());
    }
    Ok(())
}

async fn review(config: &Config, folder: Folder) -> anyhow::Result<()> {
    let llm = HttpLlmClient::new(config.llm.clone())?;
    let engine = engine(config, llm);
    let report = review_folder(&engine, folder, &StdinGate::default(), &cancel_on_ctrl_c()).await?;
    print_report(&report);
    Ok(())
}

async fn cleanup(config: &Config, folder: Folder, top: usize, apply: bool) -> anyhow::Result<()> {
    let llm = HttpLlmClient::new(config.llm.clone())?;
    let store = MailStore::new(config.store.clone());
    let analysis = CleanupAnalysis::new(llm.clone()).with_top(top);
    let Some(report) = analysis.analyze(&store, folder).await? else {
        bail!("no cleanup recommendation from the LLM");
    };
    if report.groups.is_empty() {
        println!("No messages in {folder}.");
        return Ok(());
    }

    for group in &report.groups {
        println!("{} ({} message(s))", group.sender, group.messages.len());
    }
    println!("
{}
", report.explanation);
    println!("Recommended for deletion ({}):", report.recommended.len());
    for message in &report.recommended {
        println!("  {} [{}] {}", message.file, message.date_display, message.subject);
    }

    if apply && !report.recommended.is_empty() {
        let run = apply_cleanup(&engine(config, llm), &report, &StdinGate::default()).await;
        print_report(&run);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    fn section(title: &str, entries: &[ReportEntry]) {
        if entries.is_empty() {
            return;
        }
        println!("\n{title} ({}):", entries.len());
        for entry in entries {
            let decided = match (entry.rule_id, entry.disposition) {
                (Some(id), Some(d)) => format!("{d} by rule #{id}"),
                (None, Some(d)) => d.to_string(),
                (_, None) => "no decision".to_string(),
            };
            println!("  {} [{}] {decided}: {}", entry.file, entry.subject, entry.outcome);
        }
    }

    section("Disposed", &report.disposed);
    section("Skipped", &report.skipped);
    section("Failed", &report.failed);
    if report.cancelled {
        println!("\nRun cancelled after {} batch(es).", report.batches);
    }
}

async fn status(config: &Config) -> anyhow::Result<()> {
    let store = MailStore::new(config.store.clone());
    println!("Mail store: {}", store.root().display());
    for entry in store.status().await? {
        println!("  {:<10} {:>6}", entry.folder.to_string(), entry.count);
    }
    Ok(())
}

async fn search(config: &Config, folder: Folder, criteria: &SearchCriteria) -> anyhow::Result<()> {
    let store = MailStore::new(config.store.clone());
    let found = store.search(folder, criteria).await?;
    for message in &found {
        println!(
            "{} | {} | {} | {}",
            message.date_display, message.sender, message.subject, message.file
        );
    }
    println!("{} match(es) in {folder}", found.len());
    Ok(())
}

async fn rules(config: &Config, action: RulesCommand) -> anyhow::Result<()> {
    let repo = open_rules(config).await?;
    match action {
        RulesCommand::List => {
            let stored = repo.list().await?;
            if stored.is_empty() {
                println!("No rules stored in {}", config.rules_db_path().display());
            }
            for rule in stored {
                let note = match CompiledRule::compile(&rule) {
                    Ok(_) => String::new(),
                    Err(e) => format!("  (skipped: {e})"),
                };
                println!("{:>4}  {:<9} {:<8} {}{note}", rule.id, rule.field, rule.action, rule.pattern);
            }
        }
        RulesCommand::Add {
            field,
            pattern,
            action,
        } => {
            let candidate = StoredRule {
                id: 0,
                field,
                pattern,
                action,
            };
            let compiled = CompiledRule::compile(&candidate)?;
            let id = repo
                .append_raw(compiled.field.as_str(), &candidate.pattern, compiled.action.as_str())
                .await?;
            println!("Added rule #{id}");
        }
        RulesCommand::Remove { id } => {
            if !repo.remove(id).await? {
                bail!("no rule #{id}");
            }
            println!("Removed rule #{id}");
        }
    }
    Ok(())
}
