//! govctl: drive a Governor proposal through propose, vote and execute.

mod console;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};

use govctl_governance::{ProposalIdentity, ProposalManifest};
use govctl_node::{
    init_logging, LogFormat, Orchestrator, OrchestratorConfig, Outcome, RpcLedger,
    ShutdownController, DEFAULT_VOTE_REASON,
};
use govctl_rpc::EthClient;
use govctl_types::{Address, ProposalId, VoteChoice};
use govctl_wallet_core::{encrypt_keystore, save_keystore, Signer};

use console::ConsoleSink;

#[derive(Parser)]
#[command(
    name = "govctl",
    version,
    about = "Propose, vote on and execute Governor proposals"
)]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and environment variables override them.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the node.
    #[arg(long, env = "RPC_URL", global = true)]
    rpc_url: Option<String>,

    /// Deployed Governor contract.
    #[arg(long, env = "GOVERNOR_ADDRESS", global = true)]
    governor: Option<Address>,

    /// Deployed ERC20Votes token.
    #[arg(long, env = "TOKEN_ADDRESS", global = true)]
    token: Option<Address>,

    /// Hex private key of the signing account. Takes precedence over --keystore.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true, global = true)]
    private_key: Option<String>,

    /// Encrypted keystore of the signing account.
    #[arg(long = "keystore", env = "KEYSTORE_PATH", global = true)]
    keystore_path: Option<PathBuf>,

    #[arg(long, env = "KEYSTORE_PASSWORD", hide_env_values = true, global = true)]
    keystore_password: Option<String>,

    /// Average block interval, for time estimates.
    #[arg(long, env = "BLOCK_TIME_SECS", global = true)]
    block_time_secs: Option<u64>,

    /// Receipt poll interval while waiting for confirmation.
    #[arg(long, global = true)]
    poll_interval_secs: Option<u64>,

    /// Blocks (inclusion block counted) before a transaction is final.
    #[arg(long, global = true)]
    confirmations: Option<u64>,

    /// Fixed gas limit instead of estimating.
    #[arg(long, global = true)]
    gas_limit: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, env = "GOVCTL_LOG_FORMAT", global = true)]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GOVCTL_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the well-known mint proposal.
    Propose {
        /// Write the proposal parameters here for a later `execute`.
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Vote on an active proposal.
    Vote {
        #[arg(env = "PROPOSAL_ID")]
        proposal_id: Option<ProposalId>,

        /// "for", "against" or "abstain".
        #[arg(long, default_value = "for")]
        support: VoteChoice,

        #[arg(long, default_value = DEFAULT_VOTE_REASON)]
        reason: String,
    },
    /// Execute a succeeded or queued proposal.
    Execute {
        #[arg(env = "PROPOSAL_ID")]
        proposal_id: Option<ProposalId>,

        /// Manifest written by `propose --manifest`. Without it the
        /// well-known mint proposal for this account is assumed.
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Delegate the account's voting power.
    Delegate {
        /// Delegatee; defaults to the signing account itself.
        #[arg(long)]
        to: Option<Address>,
    },
    /// Show the state of a proposal without submitting anything.
    Status {
        #[arg(env = "PROPOSAL_ID")]
        proposal_id: Option<ProposalId>,
    },
    /// Encrypt PRIVATE_KEY into a keystore file protected by KEYSTORE_PASSWORD.
    Keystore {
        #[arg(long)]
        out: PathBuf,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Propose { .. } => "propose",
            Self::Vote { .. } => "vote",
            Self::Execute { .. } => "execute",
            Self::Delegate { .. } => "delegate",
            Self::Status { .. } => "status",
            Self::Keystore { .. } => "keystore",
        }
    }
}

impl Cli {
    /// Defaults, then the TOML file, then flags and environment.
    fn load_config(&self) -> anyhow::Result<OrchestratorConfig> {
        let mut config = match &self.config {
            Some(path) => OrchestratorConfig::from_toml_file(path)?,
            None => OrchestratorConfig::default(),
        };

        if let Some(url) = &self.rpc_url {
            config.rpc_url = Some(url.clone());
        }
        if let Some(governor) = self.governor {
            config.governor = Some(governor);
        }
        if let Some(token) = self.token {
            config.token = Some(token);
        }
        if let Some(key) = &self.private_key {
            config.private_key = Some(key.clone());
        }
        if let Some(path) = &self.keystore_path {
            config.keystore_path = Some(path.clone());
        }
        if let Some(password) = &self.keystore_password {
            config.keystore_password = Some(password.clone());
        }
        if let Some(secs) = self.block_time_secs {
            config.block_time_secs = secs;
        }
        if let Some(secs) = self.poll_interval_secs {
            config.poll_interval_secs = secs;
        }
        if let Some(n) = self.confirmations {
            config.confirmations = n;
        }
        if self.gas_limit.is_some() {
            config.gas_limit = self.gas_limit;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors exit 1 like every other failure; --help and --version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;
    init_logging(config.log_format, &config.log_level).map_err(|e| anyhow!(e))?;
    tracing::debug!(command = cli.command.name(), config = ?config, "configuration loaded");

    if let Command::Keystore { out } = &cli.command {
        return write_keystore(&config, out);
    }

    config.validate()?;
    let signer = config.require_credential()?.load_signer()?;
    let account = signer.address();
    let client = EthClient::new(config.require_rpc_url()?)?;
    let ledger = Arc::new(RpcLedger::new(client).with_signer(signer));

    let shutdown = ShutdownController::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move { shutdown.wait_for_signal().await }
    });

    let orchestrator = Orchestrator::from_config(
        &config,
        ledger,
        account,
        shutdown,
        Arc::new(ConsoleSink::stdout()),
    )?;
    tracing::info!(command = cli.command.name(), %account, "govctl starting");

    let outcome = match cli.command {
        Command::Propose { manifest } => {
            let identity = ProposalIdentity::well_known(config.require_token()?, account)?;
            orchestrator.propose(&identity, manifest.as_deref()).await?
        }
        Command::Vote {
            proposal_id,
            support,
            reason,
        } => {
            let proposal_id = require_proposal_id(proposal_id)?;
            orchestrator.vote(proposal_id, support, &reason).await?
        }
        Command::Execute {
            proposal_id,
            manifest,
        } => {
            let (proposal_id, identity) = match manifest {
                Some(path) => identity_from_manifest(&path, proposal_id, &config)?,
                None => (
                    require_proposal_id(proposal_id)?,
                    ProposalIdentity::well_known(config.require_token()?, account)?,
                ),
            };
            orchestrator.execute(proposal_id, &identity).await?
        }
        Command::Delegate { to } => orchestrator.delegate(to.unwrap_or(account)).await?,
        Command::Status { proposal_id } => {
            orchestrator.status(require_proposal_id(proposal_id)?).await?
        }
        Command::Keystore { .. } => unreachable!("handled before connecting"),
    };

    if let Outcome::Proposed {
        proposal_id,
        matches_local: false,
        ..
    } = outcome
    {
        tracing::warn!(%proposal_id, "use the governor's id for vote and execute");
    }
    Ok(())
}

fn require_proposal_id(proposal_id: Option<ProposalId>) -> anyhow::Result<ProposalId> {
    proposal_id.ok_or_else(|| anyhow!("no proposal id: pass it as an argument or set PROPOSAL_ID"))
}

/// Parameters from a manifest. An explicit id must agree with the recorded one.
fn identity_from_manifest(
    path: &Path,
    proposal_id: Option<ProposalId>,
    config: &OrchestratorConfig,
) -> anyhow::Result<(ProposalId, ProposalIdentity)> {
    let manifest = ProposalManifest::read_from(path)?;
    let identity = manifest
        .identity()
        .with_context(|| format!("manifest {}", path.display()))?;
    let recorded = identity.proposal_id();
    if let Some(requested) = proposal_id {
        if requested != recorded {
            return Err(anyhow!(
                "manifest {} describes proposal {recorded}, not {requested}",
                path.display()
            ));
        }
    }
    if config.governor.is_some_and(|g| g != manifest.governor) {
        tracing::warn!(
            manifest_governor = %manifest.governor,
            "manifest was written for a different governor"
        );
    }
    Ok((recorded, identity))
}

fn write_keystore(config: &OrchestratorConfig, out: &Path) -> anyhow::Result<()> {
    let key = config
        .private_key
        .as_deref()
        .ok_or_else(|| anyhow!("missing private key: set PRIVATE_KEY or --private-key"))?;
    let password = config
        .keystore_password
        .as_deref()
        .ok_or_else(|| anyhow!("missing keystore password: set KEYSTORE_PASSWORD"))?;

    let signer = Signer::from_private_key(key).context("invalid private key")?;
    let keystore = encrypt_keystore(signer.secret_key(), password)?;
    save_keystore(&keystore, out)?;
    println!("keystore for {} written to {}", signer.address(), out.display());
    Ok(())
}
