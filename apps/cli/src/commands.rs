use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use client_core::{
    load_config,
    render::{render_analysis, render_risk},
    templates, Action, ClientConfig, CollaborationSession, HttpContractApi, UploadedFile,
    WorkflowController, WorkflowEvent,
};
use shared::domain::{CommentId, ContractId, Signer, Template, UserSettings};
use storage::{LocalStore, MemoryStore, Storage};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info};

use crate::args::{Cli, CollabCommand, Command, ContractInput, SettingsCommand};

struct Session {
    api: Arc<HttpContractApi>,
    workflow: Arc<WorkflowController>,
}

fn effective_config(cli: &Cli) -> ClientConfig {
    let mut config = load_config(cli.config.as_deref());
    if let Some(url) = &cli.server_url {
        config.server_url = Some(url.clone());
    }
    if let Some(url) = &cli.database_url {
        config.database_url = url.clone();
    }
    // Only `analyze` shows the analysis; elsewhere it would be a wasted backend call.
    if cli.no_auto_analyze || !matches!(cli.command, Command::Analyze { .. }) {
        config.auto_analyze = false;
    }
    config
}

async fn open_session(cli: &Cli) -> Result<Session> {
    let config = effective_config(cli);
    let api = Arc::new(HttpContractApi::from_config(&config).context("failed to build backend client")?);
    info!(server_url = api.base_url(), "contractiq: using backend");

    let store: Arc<dyn LocalStore> = if cli.no_persist {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(Storage::new(&config.database_url).await?)
    };
    let workflow = WorkflowController::new(api.clone(), store, config.workflow_options());
    tokio::spawn(log_events(workflow.subscribe_events()));
    workflow
        .load_settings()
        .await
        .context("failed to load saved settings")?;

    Ok(Session { api, workflow })
}

async fn log_events(mut events: broadcast::Receiver<WorkflowEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => debug!(?event, "workflow event"),
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "workflow events dropped"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn load_contract(workflow: &WorkflowController, input: &ContractInput) -> Result<()> {
    if let Some(path) = &input.file {
        let file = UploadedFile::from_path(path).await?;
        workflow.upload_file(file).await?;
    } else if let Some(key) = &input.template {
        let template = templates::lookup(key)
            .with_context(|| format!("no built-in template matches '{key}'"))?;
        workflow.select_template(template).await?;
    } else if let Some(text) = &input.text {
        workflow.paste_content(text).await?;
    }
    Ok(())
}

async fn add_signers(workflow: &WorkflowController, signers: &[Signer]) {
    for signer in signers {
        workflow.add_signer(signer.clone()).await;
    }
}

/// Shows only the tail of a stored key.
pub fn mask_key(key: Option<&str>) -> String {
    match key.map(str::trim).filter(|key| !key.is_empty()) {
        None => "(not set)".to_string(),
        Some(key) if key.chars().count() <= 4 => "****".to_string(),
        Some(key) => {
            let skip = key.chars().count() - 4;
            format!("****{}", key.chars().skip(skip).collect::<String>())
        }
    }
}

fn print_template_list(list: &[Template]) {
    for template in list {
        println!("{:>4}  {}", template.id.0, template.name);
        if !template.description.is_empty() {
            println!("      {}", template.description);
        }
    }
}

fn timestamp(at: Option<&DateTime<Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub async fn run(cli: Cli) -> Result<()> {
    if let Command::Templates { remote: false, show } = &cli.command {
        match show {
            Some(key) => {
                let template = templates::lookup(key)
                    .with_context(|| format!("no built-in template matches '{key}'"))?;
                println!("{}\n", template.name);
                println!("{}", template.content);
                println!("Placeholders: {}", template.placeholders().join(", "));
            }
            None => print_template_list(&templates::catalog()),
        }
        return Ok(());
    }

    let session = open_session(&cli).await?;
    let workflow = &session.workflow;

    match cli.command {
        Command::Templates { .. } => {
            print_template_list(&workflow.fetch_remote_templates().await?);
        }
        Command::Analyze { input, risks } => {
            load_contract(workflow, &input).await?;
            let snapshot = workflow.snapshot().await;
            let failure = snapshot.error(Action::Analyze).map(str::to_string);
            let analysis = match (snapshot.analysis, failure) {
                (Some(analysis), _) => analysis,
                (None, Some(message)) => bail!("{message}"),
                (None, None) => workflow.analyze().await?,
            };
            print!("{}", render_analysis(&analysis));
            if risks {
                println!();
                print!("{}", render_risk(&workflow.analyze_risks().await?));
            }
        }
        Command::Risks { input } => {
            load_contract(workflow, &input).await?;
            print!("{}", render_risk(&workflow.analyze_risks().await?));
        }
        Command::Rewrite {
            input,
            instructions,
            analyze,
        } => {
            load_contract(workflow, &input).await?;
            workflow.open_rewrite().await;
            let rewritten = workflow.rewrite(&instructions).await?;
            println!("{rewritten}");
            if analyze {
                println!();
                print!("{}", render_analysis(&workflow.analyze().await?));
            }
        }
        Command::Positions { input } => {
            load_contract(workflow, &input).await?;
            let positions = workflow.analyze_signature_positions().await?;
            if positions.is_empty() {
                println!("No signature positions suggested.");
            }
            for (index, position) in positions.iter().enumerate() {
                println!(
                    "{}. {} (anchor '{}', align {})",
                    index + 1,
                    position.description,
                    position.anchor_text,
                    position.align
                );
            }
        }
        Command::Send {
            input,
            signers,
            suggest_positions,
        } => {
            load_contract(workflow, &input).await?;
            add_signers(workflow, &signers).await;
            if suggest_positions {
                workflow.analyze_signature_positions().await?;
            }
            let receipt = workflow.send().await?;
            println!(
                "{}",
                receipt
                    .message
                    .as_deref()
                    .unwrap_or("Contract sent for signature")
            );
            if let Some(envelope) = receipt.envelope_id {
                println!("Envelope: {envelope}");
            }
        }
        Command::Stage { input, signers } => {
            load_contract(workflow, &input).await?;
            add_signers(workflow, &signers).await;
            workflow.stage_for_authorization().await?;
            println!("Contract staged. Authorize with the signing provider, then run `contractiq resume --token <token>`.");
        }
        Command::Resume { token } => {
            let receipt = workflow.resume_after_authorization(&token).await?;
            println!(
                "{}",
                receipt
                    .message
                    .as_deref()
                    .unwrap_or("Contract sent for signature")
            );
        }
        Command::Settings { action } => run_settings(workflow, action).await?,
        Command::Collab { contract, action } => {
            let collab = CollaborationSession::new(session.api.clone(), ContractId(contract));
            run_collab(&collab, action).await?;
        }
    }
    Ok(())
}

async fn run_settings(workflow: &WorkflowController, action: SettingsCommand) -> Result<()> {
    match action {
        SettingsCommand::Show => match workflow.load_settings().await? {
            Some(settings) => {
                println!("OpenAI key:              {}", mask_key(settings.openai_key.as_deref()));
                println!("DocuSign key:            {}", mask_key(settings.docusign_key.as_deref()));
                println!("AI signature positions:  {}", settings.use_ai_positioning);
                println!("Re-analyze after rewrite: {}", settings.reanalyze_after_rewrite);
            }
            None => println!("No settings saved."),
        },
        SettingsCommand::Save {
            openai_key,
            docusign_key,
            ai_positioning,
            reanalyze_after_rewrite,
        } => {
            workflow
                .save_settings(UserSettings {
                    openai_key,
                    docusign_key,
                    use_ai_positioning: ai_positioning,
                    reanalyze_after_rewrite,
                })
                .await?;
            println!("Settings saved.");
        }
        SettingsCommand::Clear => {
            workflow.clear_settings().await?;
            println!("Settings cleared.");
        }
    }
    Ok(())
}

async fn run_collab(collab: &CollaborationSession, action: CollabCommand) -> Result<()> {
    match action {
        CollabCommand::Invitations => {
            for invitation in collab.refresh_invitations().await? {
                println!(
                    "{:>4}  {:<32} {:<7} {:<9} expires {}",
                    invitation.id.0,
                    invitation.email,
                    invitation.role.as_str(),
                    invitation.status,
                    timestamp(invitation.expires_at.as_ref())
                );
            }
        }
        CollabCommand::Invite { email, role } => {
            let invitation = collab.invite(&email, role).await?;
            println!("Invited {} as {}", invitation.email, invitation.role);
        }
        CollabCommand::Comments { all } => {
            let comments = collab.set_show_resolved(all).await?;
            if comments.is_empty() {
                println!("No comments.");
            }
            for comment in comments {
                let resolved = if comment.resolved { " (resolved)" } else { "" };
                println!(
                    "[{}] {} {}: {}{resolved}",
                    comment.id,
                    timestamp(comment.created_at.as_ref()),
                    comment.user.name,
                    comment.content
                );
            }
        }
        CollabCommand::Comment { content } => {
            let comment = collab.add_comment(&content).await?;
            println!("Added comment {}", comment.id);
        }
        CollabCommand::Resolve { comment } => {
            collab.resolve_comment(CommentId(comment)).await?;
            println!("Resolved comment {comment}");
        }
        CollabCommand::Versions => {
            for version in collab.refresh_versions().await? {
                println!(
                    "v{:<4} {}  {}",
                    version.version,
                    timestamp(version.created_at.as_ref()),
                    version.created_by.name
                );
            }
        }
        CollabCommand::Compare { first, second } => {
            collab.toggle_version(first).await;
            collab.toggle_version(second).await;
            let comparison = collab.compare_selected().await?;
            for version in [&comparison.version1, &comparison.version2] {
                println!("## Version {} ({})", version.number, timestamp(version.created_at.as_ref()));
                println!("{}\n", version.content);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
