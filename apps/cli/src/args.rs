use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shared::domain::{CollaboratorRole, Signer};

#[derive(Parser, Debug)]
#[command(
    name = "contractiq",
    version,
    about = "Analyze, rewrite and send contracts through a ContractIQ backend"
)]
pub struct Cli {
    /// Config file, `./contractiq.toml` when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub server_url: Option<String>,
    #[arg(long, global = true)]
    pub database_url: Option<String>,
    /// Keep settings and staged signatures in memory for this run only.
    #[arg(long, global = true)]
    pub no_persist: bool,
    #[arg(long, global = true)]
    pub no_auto_analyze: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Where the working contract comes from.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct ContractInput {
    /// `.txt`, `.md`, `.text` and `.rtf` are read locally; `.pdf`, `.doc`
    /// and `.docx` are extracted by the backend.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Built-in template id or name.
    #[arg(long)]
    pub template: Option<String>,
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List contract templates.
    Templates {
        /// Ask the backend instead of the built-in catalog.
        #[arg(long)]
        remote: bool,
        /// Print one built-in template with its placeholders.
        #[arg(long, conflicts_with = "remote")]
        show: Option<String>,
    },
    /// Summarize a contract.
    Analyze {
        #[command(flatten)]
        input: ContractInput,
        /// Also score its risks.
        #[arg(long)]
        risks: bool,
    },
    Risks {
        #[command(flatten)]
        input: ContractInput,
    },
    /// Rewrite a contract following free-form instructions.
    Rewrite {
        #[command(flatten)]
        input: ContractInput,
        #[arg(long, short)]
        instructions: String,
        /// Analyze the rewritten contract.
        #[arg(long)]
        analyze: bool,
    },
    /// Suggest where signature fields should go.
    Positions {
        #[command(flatten)]
        input: ContractInput,
    },
    /// Send a contract for electronic signature.
    Send {
        #[command(flatten)]
        input: ContractInput,
        /// `Name <email>` or `Name,email`; repeat per signer.
        #[arg(long = "signer", value_parser = parse_signer)]
        signers: Vec<Signer>,
        #[arg(long)]
        suggest_positions: bool,
    },
    /// Park a contract and its signers until provider authorization completes.
    Stage {
        #[command(flatten)]
        input: ContractInput,
        #[arg(long = "signer", value_parser = parse_signer)]
        signers: Vec<Signer>,
    },
    /// Send the staged contract with the provider access token.
    Resume {
        #[arg(long)]
        token: String,
    },
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    /// Invitations, comments and versions of a stored contract.
    Collab {
        #[arg(long)]
        contract: i64,
        #[command(subcommand)]
        action: CollabCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,
    Save {
        #[arg(long)]
        openai_key: Option<String>,
        #[arg(long)]
        docusign_key: Option<String>,
        #[arg(long)]
        ai_positioning: bool,
        #[arg(long)]
        reanalyze_after_rewrite: bool,
    },
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum CollabCommand {
    Invitations,
    Invite {
        email: String,
        #[arg(long, default_value = "viewer")]
        role: CollaboratorRole,
    },
    Comments {
        /// Include resolved comments.
        #[arg(long)]
        all: bool,
    },
    Comment {
        content: String,
    },
    Resolve {
        comment: i64,
    },
    Versions,
    Compare {
        first: u32,
        second: u32,
    },
}

/// Accepts `Name <email>` or `Name,email`. Blank parts are left for the
/// workflow's own signer validation.
pub fn parse_signer(raw: &str) -> Result<Signer, String> {
    let raw = raw.trim();
    if let Some((name, rest)) = raw.split_once('<') {
        let email = rest
            .strip_suffix('>')
            .ok_or_else(|| format!("missing closing '>' in signer '{raw}'"))?;
        return Ok(Signer::new(name.trim(), email.trim()));
    }
    match raw.split_once(',') {
        Some((name, email)) => Ok(Signer::new(name.trim(), email.trim())),
        None => Err(format!(
            "signer '{raw}' must look like 'Name <email>' or 'Name,email'"
        )),
    }
}

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod tests;
