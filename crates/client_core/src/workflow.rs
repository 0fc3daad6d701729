//! The contract workflow: one contract at a time moving from selection or
//! upload through analysis, rewrite and signer collection to send.
//!
//! State sits behind a [`tokio::sync::Mutex`] that is released before every
//! backend call. Each [`Action`] carries a request token; a response whose
//! token has been superseded is dropped without touching state.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

use shared::{
    domain::{PendingSignature, SignaturePosition, Signer, Template, TemplateId, UserSettings},
    protocol::SendRequest,
};
use storage::LocalStore;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    analysis::Analysis,
    error::{ClientError, ClientResult, ValidationError},
    risk::RiskAssessment,
    signing::{normalize_signers, validate_send},
    upload::{FileKind, UploadedFile},
    ContractApi, SendReceipt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Upload,
    Analyze,
    Risks,
    Rewrite,
    Positions,
    Send,
    Settings,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Analyze => "analyze",
            Self::Risks => "risks",
            Self::Rewrite => "rewrite",
            Self::Positions => "positions",
            Self::Send => "send",
            Self::Settings => "settings",
        }
    }

    fn failure_prefix(&self) -> &'static str {
        match self {
            Self::Upload => "Failed to load contract",
            Self::Analyze => "Failed to analyze contract",
            Self::Risks => "Failed to analyze risks",
            Self::Rewrite => "Failed to rewrite contract",
            Self::Positions => "Failed to analyze signature positions",
            Self::Send => "Failed to send contract",
            Self::Settings => "Failed to save settings",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Advisory position in the workflow, derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowStep {
    Upload,
    Analyze,
    Signers,
    Send,
}

impl WorkflowStep {
    pub fn derive(contract: &str, analysis: Option<&Analysis>, signers: &[Signer]) -> Self {
        if contract.trim().is_empty() {
            Self::Upload
        } else if analysis.is_none() {
            Self::Analyze
        } else if signers.is_empty() {
            Self::Signers
        } else {
            Self::Send
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Analyze => "analyze",
            Self::Signers => "signers",
            Self::Send => "send",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Analyse automatically whenever the contract is replaced.
    pub auto_analyze: bool,
    /// Analyse again after a successful rewrite.
    pub reanalyze_after_rewrite: bool,
    pub use_ai_positioning: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            auto_analyze: true,
            reanalyze_after_rewrite: false,
            use_ai_positioning: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractSource {
    Template { id: TemplateId, name: String },
    Upload { filename: String },
    Paste,
}

impl fmt::Display for ContractSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template { name, .. } => write!(f, "template '{name}'"),
            Self::Upload { filename } => write!(f, "file '{filename}'"),
            Self::Paste => f.write_str("pasted text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    ContractReplaced { source: ContractSource },
    ContractEdited,
    ActionStarted(Action),
    ActionSucceeded(Action),
    ActionFailed { action: Action, message: String },
    StaleResponseDiscarded(Action),
    SignersChanged { count: usize },
    RewriteDialog { open: bool },
    SendCompleted(SendReceipt),
    PendingSignatureStaged,
    SettingsChanged,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    token: u64,
    loading: bool,
}

#[derive(Default)]
struct WorkflowState {
    options: WorkflowOptions,
    contract: String,
    source: Option<ContractSource>,
    selected_template: Option<Template>,
    analysis: Option<Analysis>,
    risk: Option<RiskAssessment>,
    signers: Vec<Signer>,
    positions: Vec<SignaturePosition>,
    rewrite_open: bool,
    last_send: Option<SendReceipt>,
    errors: BTreeMap<Action, String>,
    slots: BTreeMap<Action, Slot>,
    next_token: u64,
}

impl WorkflowState {
    fn begin(&mut self, action: Action) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        let slot = self.slots.entry(action).or_default();
        slot.token = token;
        slot.loading = true;
        self.errors.remove(&action);
        token
    }

    /// Moves the action's token forward so any outstanding response is
    /// treated as stale.
    fn invalidate(&mut self, action: Action) {
        self.next_token += 1;
        let token = self.next_token;
        let slot = self.slots.entry(action).or_default();
        slot.token = token;
        slot.loading = false;
    }

    fn is_current(&self, action: Action, token: u64) -> bool {
        self.slots
            .get(&action)
            .map(|slot| slot.token == token)
            .unwrap_or(false)
    }

    fn is_loading(&self, action: Action) -> bool {
        self.slots
            .get(&action)
            .map(|slot| slot.loading)
            .unwrap_or(false)
    }

    fn finish(&mut self, action: Action) {
        if let Some(slot) = self.slots.get_mut(&action) {
            slot.loading = false;
        }
    }

    /// Installs a new document and drops everything derived from the old one.
    fn replace_contract(&mut self, content: String, source: ContractSource) {
        self.contract = content;
        self.source = Some(source);
        self.analysis = None;
        self.risk = None;
        self.positions.clear();
        self.errors.clear();
        self.last_send = None;
        self.invalidate_contract_work();
    }

    /// Outstanding work derived from the current contract must not land on
    /// whatever replaces it.
    fn invalidate_contract_work(&mut self) {
        for action in [
            Action::Upload,
            Action::Analyze,
            Action::Risks,
            Action::Positions,
            Action::Rewrite,
        ] {
            self.invalidate(action);
        }
    }

    fn apply_settings(&mut self, settings: &UserSettings) {
        self.options.use_ai_positioning = settings.use_ai_positioning;
        self.options.reanalyze_after_rewrite = settings.reanalyze_after_rewrite;
    }

    fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            step: WorkflowStep::derive(&self.contract, self.analysis.as_ref(), &self.signers),
            options: self.options,
            contract: self.contract.clone(),
            source: self.source.clone(),
            selected_template: self.selected_template.clone(),
            analysis: self.analysis.clone(),
            risk: self.risk.clone(),
            signers: self.signers.clone(),
            positions: self.positions.clone(),
            rewrite_open: self.rewrite_open,
            last_send: self.last_send.clone(),
            errors: self.errors.clone(),
            loading: self
                .slots
                .iter()
                .filter(|(_, slot)| slot.loading)
                .map(|(action, _)| *action)
                .collect(),
        }
    }
}

/// Point-in-time copy of the workflow for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSnapshot {
    pub step: WorkflowStep,
    pub options: WorkflowOptions,
    pub contract: String,
    pub source: Option<ContractSource>,
    pub selected_template: Option<Template>,
    pub analysis: Option<Analysis>,
    pub risk: Option<RiskAssessment>,
    pub signers: Vec<Signer>,
    pub positions: Vec<SignaturePosition>,
    pub rewrite_open: bool,
    pub last_send: Option<SendReceipt>,
    pub errors: BTreeMap<Action, String>,
    pub loading: BTreeSet<Action>,
}

impl WorkflowSnapshot {
    pub fn is_loading(&self, action: Action) -> bool {
        self.loading.contains(&action)
    }

    pub fn error(&self, action: Action) -> Option<&str> {
        self.errors.get(&action).map(String::as_str)
    }
}

pub struct WorkflowController {
    api: Arc<dyn ContractApi>,
    store: Arc<dyn LocalStore>,
    inner: Mutex<WorkflowState>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl WorkflowController {
    pub fn new(
        api: Arc<dyn ContractApi>,
        store: Arc<dyn LocalStore>,
        options: WorkflowOptions,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            store,
            inner: Mutex::new(WorkflowState {
                options,
                ..WorkflowState::default()
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn step(&self) -> WorkflowStep {
        let state = self.inner.lock().await;
        WorkflowStep::derive(&state.contract, state.analysis.as_ref(), &state.signers)
    }

    fn emit(&self, event: WorkflowEvent) {
        let _ = self.events.send(event);
    }

    /// Records a failure that never reached the network.
    async fn reject(&self, action: Action, error: ValidationError) -> ClientError {
        let message = error.to_string();
        self.inner.lock().await.errors.insert(action, message.clone());
        debug!(action = action.name(), %message, "workflow: rejected locally");
        self.emit(WorkflowEvent::ActionFailed { action, message });
        ClientError::Validation(error)
    }

    /// Applies a backend result if its token is still current.
    async fn settle<T, R>(
        &self,
        action: Action,
        token: u64,
        result: ClientResult<T>,
        apply: impl FnOnce(&mut WorkflowState, T) -> R,
    ) -> ClientResult<R> {
        let mut state = self.inner.lock().await;
        if !state.is_current(action, token) {
            drop(state);
            debug!(action = action.name(), token, "workflow: discarding stale response");
            self.emit(WorkflowEvent::StaleResponseDiscarded(action));
            return Err(ClientError::Superseded {
                action: action.name(),
            });
        }
        state.finish(action);

        match result {
            Ok(value) => {
                let out = apply(&mut *state, value);
                drop(state);
                self.emit(WorkflowEvent::ActionSucceeded(action));
                Ok(out)
            }
            Err(err) => {
                let message = if err.is_validation() {
                    err.to_string()
                } else {
                    format!("{}: {err}", action.failure_prefix())
                };
                state.errors.insert(action, message.clone());
                drop(state);
                warn!(action = action.name(), error = %err, "workflow: action failed");
                self.emit(WorkflowEvent::ActionFailed { action, message });
                Err(err)
            }
        }
    }

    /// Validates that a contract is present and starts `action`.
    async fn begin_with_contract(&self, action: Action) -> ClientResult<(u64, String)> {
        let started = {
            let mut state = self.inner.lock().await;
            if state.contract.trim().is_empty() {
                None
            } else {
                Some((state.begin(action), state.contract.clone()))
            }
        };
        match started {
            Some(started) => {
                self.emit(WorkflowEvent::ActionStarted(action));
                Ok(started)
            }
            None => Err(self.reject(action, ValidationError::EmptyContract).await),
        }
    }

    async fn install(&self, content: String, source: ContractSource, template: Option<Template>) {
        let auto_analyze = {
            let mut state = self.inner.lock().await;
            state.replace_contract(content, source.clone());
            state.selected_template = template;
            state.options.auto_analyze
        };
        info!(%source, "workflow: contract replaced");
        self.emit(WorkflowEvent::ContractReplaced { source });
        if auto_analyze {
            self.auto_analyze().await;
        }
    }

    /// Runs analysis for a freshly installed contract. The outcome lands in
    /// the analyze slot; the replacement itself has already succeeded.
    async fn auto_analyze(&self) {
        if let Err(err) = self.analyze().await {
            debug!(error = %err, "workflow: automatic analysis did not complete");
        }
    }

    pub async fn select_template(&self, template: Template) -> ClientResult<()> {
        if template.content.trim().is_empty() {
            return Err(self.reject(Action::Upload, ValidationError::EmptyContract).await);
        }
        let source = ContractSource::Template {
            id: template.id.clone(),
            name: template.name.clone(),
        };
        self.install(template.content.clone(), source, Some(template))
            .await;
        Ok(())
    }

    pub async fn paste_content(&self, text: &str) -> ClientResult<()> {
        if text.trim().is_empty() {
            return Err(self.reject(Action::Upload, ValidationError::EmptyContract).await);
        }
        self.install(text.to_string(), ContractSource::Paste, None)
            .await;
        Ok(())
    }

    /// Plain-text files are decoded here; documents go to the backend for
    /// extraction. On any failure the current contract stays untouched.
    pub async fn upload_file(&self, file: UploadedFile) -> ClientResult<()> {
        let source = ContractSource::Upload {
            filename: file.filename.clone(),
        };
        let kind = match file.kind() {
            Ok(kind) => kind,
            Err(ClientError::Validation(err)) => return Err(self.reject(Action::Upload, err).await),
            Err(err) => return Err(err),
        };

        if kind == FileKind::PlainText {
            return match file.decode_text() {
                Ok(text) => {
                    self.install(text, source, None).await;
                    Ok(())
                }
                Err(ClientError::Validation(err)) => Err(self.reject(Action::Upload, err).await),
                Err(err) => Err(err),
            };
        }

        if let Err(ClientError::Validation(err)) = file.ensure_not_empty() {
            return Err(self.reject(Action::Upload, err).await);
        }
        let token = self.inner.lock().await.begin(Action::Upload);
        self.emit(WorkflowEvent::ActionStarted(Action::Upload));

        let result = self.api.upload(&file).await;
        let installed = source.clone();
        let auto_analyze = self
            .settle(Action::Upload, token, result, move |state, text| {
                state.replace_contract(text, installed);
                state.selected_template = None;
                state.options.auto_analyze
            })
            .await?;

        info!(%source, "workflow: contract replaced");
        self.emit(WorkflowEvent::ContractReplaced { source });
        if auto_analyze {
            self.auto_analyze().await;
        }
        Ok(())
    }

    /// In-place edit. Derived results are kept and nothing is re-analysed.
    pub async fn edit_contract(&self, text: &str) {
        self.inner.lock().await.contract = text.to_string();
        self.emit(WorkflowEvent::ContractEdited);
    }

    pub async fn analyze(&self) -> ClientResult<Analysis> {
        let (token, contract) = self.begin_with_contract(Action::Analyze).await?;
        let result = self.api.analyze(&contract).await;
        self.settle(Action::Analyze, token, result, |state, analysis| {
            state.analysis = Some(analysis.clone());
            analysis
        })
        .await
    }

    pub async fn analyze_risks(&self) -> ClientResult<RiskAssessment> {
        let (token, contract) = self.begin_with_contract(Action::Risks).await?;
        let result = self.api.analyze_risks(&contract).await;
        self.settle(Action::Risks, token, result, |state, risk| {
            state.risk = Some(risk.clone());
            risk
        })
        .await
    }

    pub async fn open_rewrite(&self) {
        self.inner.lock().await.rewrite_open = true;
        self.emit(WorkflowEvent::RewriteDialog { open: true });
    }

    pub async fn close_rewrite(&self) {
        self.inner.lock().await.rewrite_open = false;
        self.emit(WorkflowEvent::RewriteDialog { open: false });
    }

    /// Replaces the contract with the rewritten text and closes the rewrite
    /// dialog. The existing analysis is kept unless re-analysis is enabled.
    pub async fn rewrite(&self, instructions: &str) -> ClientResult<String> {
        let instructions = instructions.trim();
        if instructions.is_empty() {
            return Err(self
                .reject(Action::Rewrite, ValidationError::EmptyInstructions)
                .await);
        }
        let (token, contract) = self.begin_with_contract(Action::Rewrite).await?;
        let result = self.api.rewrite(contract.trim(), instructions).await;
        let (rewritten, reanalyze) = self
            .settle(Action::Rewrite, token, result, |state, rewritten| {
                state.contract = rewritten.clone();
                state.rewrite_open = false;
                for action in [Action::Analyze, Action::Risks, Action::Positions] {
                    state.invalidate(action);
                }
                (rewritten, state.options.reanalyze_after_rewrite)
            })
            .await?;

        info!(chars = rewritten.len(), "workflow: contract rewritten");
        self.emit(WorkflowEvent::RewriteDialog { open: false });
        if reanalyze {
            self.auto_analyze().await;
        }
        Ok(rewritten)
    }

    pub async fn analyze_signature_positions(&self) -> ClientResult<Vec<SignaturePosition>> {
        let (token, contract) = self.begin_with_contract(Action::Positions).await?;
        let result = self.api.suggest_signature_positions(&contract).await;
        self.settle(Action::Positions, token, result, |state, positions| {
            state.positions = positions.clone();
            positions
        })
        .await
    }

    /// Adds a signer row. Rows may start blank; completeness is checked on send.
    pub async fn add_signer(&self, signer: Signer) -> usize {
        let count = {
            let mut state = self.inner.lock().await;
            state.signers.push(signer);
            state.signers.len()
        };
        self.emit(WorkflowEvent::SignersChanged { count });
        count - 1
    }

    pub async fn update_signer(&self, index: usize, signer: Signer) -> ClientResult<()> {
        let count = {
            let mut state = self.inner.lock().await;
            let Some(slot) = state.signers.get_mut(index) else {
                return Err(ValidationError::UnknownSigner {
                    position: index + 1,
                }
                .into());
            };
            *slot = signer;
            state.signers.len()
        };
        self.emit(WorkflowEvent::SignersChanged { count });
        Ok(())
    }

    /// Removes a signer and the signature position suggested for it.
    pub async fn remove_signer(&self, index: usize) -> ClientResult<Signer> {
        let (removed, count) = {
            let mut state = self.inner.lock().await;
            if index >= state.signers.len() {
                return Err(ValidationError::UnknownSigner {
                    position: index + 1,
                }
                .into());
            }
            let removed = state.signers.remove(index);
            if index < state.positions.len() {
                state.positions.remove(index);
            }
            (removed, state.signers.len())
        };
        self.emit(WorkflowEvent::SignersChanged { count });
        Ok(removed)
    }

    fn send_request(
        contract: &str,
        signers: &[Signer],
        positions: &[SignaturePosition],
        options: &WorkflowOptions,
    ) -> SendRequest {
        SendRequest {
            contract: contract.trim().to_string(),
            signers: normalize_signers(signers),
            signature_positions: (!positions.is_empty()).then(|| positions.to_vec()),
            use_ai_positioning: Some(options.use_ai_positioning),
        }
    }

    /// Sends the current contract for signature. Validation failures and a
    /// send already in flight are reported without any network call.
    pub async fn send(&self) -> ClientResult<SendReceipt> {
        let started = {
            let mut state = self.inner.lock().await;
            if state.is_loading(Action::Send) {
                warn!("workflow: send requested while another send is in flight");
                return Err(ClientError::SendInProgress);
            }
            match validate_send(&state.contract, &state.signers) {
                Ok(()) => {
                    let request = Self::send_request(
                        &state.contract,
                        &state.signers,
                        &state.positions,
                        &state.options,
                    );
                    Ok((state.begin(Action::Send), request))
                }
                Err(err) => Err(err),
            }
        };
        let (token, request) = match started {
            Ok(started) => started,
            Err(err) => return Err(self.reject(Action::Send, err).await),
        };
        self.emit(WorkflowEvent::ActionStarted(Action::Send));

        let result = self.api.send_for_signature(&request, None).await;
        let sent_contract = request.contract;
        let receipt = self
            .settle(Action::Send, token, result, move |state, receipt| {
                state.last_send = Some(receipt.clone());
                // A document installed while the send was in flight is kept.
                if state.contract.trim() != sent_contract {
                    return receipt;
                }
                state.contract.clear();
                state.source = None;
                state.selected_template = None;
                state.analysis = None;
                state.risk = None;
                state.signers.clear();
                state.positions.clear();
                state.rewrite_open = false;
                state.invalidate_contract_work();
                receipt
            })
            .await?;

        info!(envelope_id = ?receipt.envelope_id, "workflow: contract sent for signature");
        self.emit(WorkflowEvent::SendCompleted(receipt.clone()));
        Ok(receipt)
    }

    /// Parks the current contract and signers while the user authorizes with
    /// the e-signature provider.
    pub async fn stage_for_authorization(&self) -> ClientResult<()> {
        let pending = {
            let state = self.inner.lock().await;
            validate_send(&state.contract, &state.signers).map(|()| PendingSignature {
                contract: state.contract.clone(),
                signers: normalize_signers(&state.signers),
            })
        };
        let pending = match pending {
            Ok(pending) => pending,
            Err(err) => return Err(self.reject(Action::Send, err).await),
        };
        self.store
            .stage(&pending)
            .await
            .map_err(ClientError::Storage)?;
        info!(signers = pending.signers.len(), "workflow: pending signature staged");
        self.emit(WorkflowEvent::PendingSignatureStaged);
        Ok(())
    }

    /// Sends the staged contract with the provider's access token. The staged
    /// pair is only cleared once the send succeeds.
    pub async fn resume_after_authorization(&self, access_token: &str) -> ClientResult<SendReceipt> {
        let pending = self
            .store
            .pending()
            .await
            .map_err(ClientError::Storage)?;
        let Some(pending) = pending else {
            return Err(self.reject(Action::Send, ValidationError::NothingPending).await);
        };

        let started = {
            let mut state = self.inner.lock().await;
            if state.is_loading(Action::Send) {
                return Err(ClientError::SendInProgress);
            }
            let request = Self::send_request(&pending.contract, &pending.signers, &[], &state.options);
            (state.begin(Action::Send), request)
        };
        let (token, request) = started;
        self.emit(WorkflowEvent::ActionStarted(Action::Send));

        let result = self
            .api
            .send_for_signature(&request, Some(access_token))
            .await;
        let receipt = self
            .settle(Action::Send, token, result, |state, receipt| {
                state.last_send = Some(receipt.clone());
                receipt
            })
            .await?;

        // The envelope already exists; failing here would invite a duplicate send.
        if let Err(err) = self.store.clear_pending().await {
            warn!(error = %err, "workflow: sent contract is still staged locally");
        }
        info!(envelope_id = ?receipt.envelope_id, "workflow: pending signature sent");
        self.emit(WorkflowEvent::SendCompleted(receipt.clone()));
        Ok(receipt)
    }

    /// Saves provider keys on the backend, then keeps them locally.
    pub async fn save_settings(&self, settings: UserSettings) -> ClientResult<()> {
        let token = self.inner.lock().await.begin(Action::Settings);
        self.emit(WorkflowEvent::ActionStarted(Action::Settings));
        let result = self.api.save_settings(&settings).await;
        self.settle(Action::Settings, token, result, |state, ()| {
            state.apply_settings(&settings)
        })
        .await?;

        self.store
            .set(&settings)
            .await
            .map_err(ClientError::Storage)?;
        self.emit(WorkflowEvent::SettingsChanged);
        Ok(())
    }

    pub async fn load_settings(&self) -> ClientResult<Option<UserSettings>> {
        let settings = self.store.get().await.map_err(ClientError::Storage)?;
        if let Some(settings) = &settings {
            self.inner.lock().await.apply_settings(settings);
            self.emit(WorkflowEvent::SettingsChanged);
        }
        Ok(settings)
    }

    pub async fn clear_settings(&self) -> ClientResult<()> {
        self.store.clear().await.map_err(ClientError::Storage)?;
        self.emit(WorkflowEvent::SettingsChanged);
        Ok(())
    }

    pub async fn fetch_remote_templates(&self) -> ClientResult<Vec<Template>> {
        let templates = self.api.list_templates().await?;
        debug!(count = templates.len(), "workflow: fetched backend templates");
        Ok(templates)
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
