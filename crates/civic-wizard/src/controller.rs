//! WizardController: stage sequencing over one session's draft
//!
//! The controller owns the draft, the stage plan and the collaborators
//! (devices, classifier, sink). Every operation takes `&mut self`, so user
//! events are processed one at a time and never interleave. After each
//! change a fresh [`WizardView`] is published for the UI.

use chrono::Utc;
use civic_capture::{CameraDevice, CameraSession, DeviceCaptureService, GeolocationProvider};
use civic_core::{
    CivicError, CompletedComplaint, DeviceError, DraftPatch, DraftRecord, Frequency, ImagePayload,
    ImageSlots, Location, Patch, SessionContext, Urgency,
};
use civic_routing::{
    CategoryResolver, Classifier, ClassifierOutcome, Department, NoClassifier, PlaceholderClassifier,
};
use civic_stages::{Requirement, StageCheck, StageKind, StageValidator};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::WizardConfig;
use crate::sink::SubmissionSink;
use crate::store::DraftStore;

// ============================================================================
// STATES & TRANSITIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum WizardState {
    /// Index into the stage plan
    Stage(usize),
    Submitting,
    Complete,
}

impl WizardState {
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            Self::Stage(index) => Some(*index),
            Self::Submitting | Self::Complete => None,
        }
    }
}

/// Outcome of a navigation request. Blocked moves are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Moved { from: usize, to: usize },
    /// The current stage's requirements are not met; nothing changed
    Blocked(StageCheck),
    /// Cannot go back further
    AtFirstStage,
    /// The last stage is left only by finalizing
    AtLastStage,
}

impl Transition {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Everything a UI needs to render the current step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardView {
    pub state: WizardState,
    pub stage: Option<String>,
    /// 1-based, 0 once the flow has left the stages
    pub stage_number: usize,
    pub stage_count: usize,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub can_finalize: bool,
    pub missing: Vec<Requirement>,
    pub hint: Option<String>,
    pub recommended_department: Department,
    pub last_error: Option<String>,
    pub revision: u64,
}

fn render_view(
    validator: &StageValidator,
    resolver: &CategoryResolver,
    state: WizardState,
    draft: &DraftRecord,
    last_error: Option<&str>,
    revision: u64,
) -> WizardView {
    let plan = validator.plan();
    let last = plan.last_index();

    let (check, stage) = match state {
        WizardState::Stage(index) => {
            // On the last stage, surface whatever still blocks finalize
            let check = if index == last {
                validator.first_blocking(draft)
            } else {
                Some(validator.check(index, draft))
            };
            (check, plan.stage(index).map(|s| s.name.clone()))
        }
        WizardState::Submitting | WizardState::Complete => (None, None),
    };
    let passed = check.as_ref().map_or(true, |c| c.passed);

    WizardView {
        state,
        stage,
        stage_number: state.stage_index().map_or(0, |i| i + 1),
        stage_count: plan.len(),
        can_advance: matches!(state, WizardState::Stage(i) if i < last) && passed,
        can_retreat: matches!(state, WizardState::Stage(i) if i > 0),
        can_finalize: state == WizardState::Stage(last) && passed,
        missing: check.as_ref().map(|c| c.missing.clone()).unwrap_or_default(),
        hint: check.as_ref().and_then(StageCheck::hint),
        recommended_department: resolver.recommend(draft),
        last_error: last_error.map(str::to_string),
        revision,
    }
}

/// Puts the wizard back on the last stage if a submission is dropped
/// before the sink answers.
struct SubmitGuard<'a> {
    state: &'a mut WizardState,
    fallback: WizardState,
    armed: bool,
}

impl<'a> SubmitGuard<'a> {
    fn new(state: &'a mut WizardState, fallback: WizardState) -> Self {
        Self {
            state,
            fallback,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(fallback = ?self.fallback, "submission dropped in flight, returning to last stage");
            *self.state = self.fallback;
        }
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

pub struct WizardController {
    config: WizardConfig,
    validator: StageValidator,
    resolver: CategoryResolver,
    capture: DeviceCaptureService,
    classifier: Arc<dyn Classifier>,
    sink: Arc<dyn SubmissionSink>,
    context: SessionContext,
    store: DraftStore,
    state: WizardState,
    last_error: Option<String>,
    completed: Option<CompletedComplaint>,
    /// Department last filled in automatically; a user choice replaces it
    auto_department: Option<String>,
    view_tx: watch::Sender<WizardView>,
}

impl WizardController {
    /// New session at the first stage with an empty draft. No devices and
    /// no classifier are attached until configured.
    pub fn new(config: WizardConfig, sink: Arc<dyn SubmissionSink>) -> Result<Self, CivicError> {
        config.validate()?;

        let validator = StageValidator::new(config.plan.clone());
        let resolver = CategoryResolver::new();
        let store = DraftStore::new();
        let state = WizardState::Stage(0);
        let view = render_view(&validator, &resolver, state, &store.read(), None, store.revision());
        let (view_tx, _) = watch::channel(view);
        let context = SessionContext::new();

        info!(
            session_id = %context.session_id,
            config = %config.name,
            stages = config.plan.len(),
            "wizard session started"
        );

        Ok(Self {
            capture: DeviceCaptureService::new(config.capture.clone()),
            config,
            validator,
            resolver,
            classifier: Arc::new(NoClassifier),
            sink,
            context,
            store,
            state,
            last_error: None,
            completed: None,
            auto_department: None,
            view_tx,
        })
    }

    /// Attach a camera back-end. Facing preference comes from the config.
    pub fn with_camera(mut self, camera: Arc<dyn CameraDevice>) -> Self {
        self.capture = self.capture.with_camera(camera);
        self
    }

    /// Attach a position source, bounded by the configured timeout
    pub fn with_geolocation(mut self, provider: Arc<dyn GeolocationProvider>) -> Self {
        self.capture = self.capture.with_geolocation(provider);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Placeholder classifier with the configured simulated latency
    pub fn with_placeholder_classifier(self) -> Self {
        let delay = self.config.classifier_delay();
        self.with_classifier(Arc::new(PlaceholderClassifier::new(delay)))
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    /// Name of the current stage, `None` once submitting or complete
    pub fn stage_name(&self) -> Option<&str> {
        self.state
            .stage_index()
            .and_then(|i| self.validator.plan().stage(i))
            .map(|s| s.name.as_str())
    }

    /// Current draft snapshot
    pub fn draft(&self) -> Arc<DraftRecord> {
        self.store.read()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The complaint produced by a successful finalize
    pub fn completed(&self) -> Option<&CompletedComplaint> {
        self.completed.as_ref()
    }

    /// Shared handle to the device service. A capture view keeps a clone to
    /// abandon an acquisition the controller is still awaiting.
    pub fn capture(&self) -> &DeviceCaptureService {
        &self.capture
    }

    pub fn view(&self) -> WizardView {
        render_view(
            &self.validator,
            &self.resolver,
            self.state,
            &self.store.read(),
            self.last_error.as_deref(),
            self.store.revision(),
        )
    }

    /// Live view updates, re-evaluated after every change
    pub fn subscribe(&self) -> watch::Receiver<WizardView> {
        self.view_tx.subscribe()
    }

    /// Live check of the current stage
    pub fn check_current(&self) -> Option<StageCheck> {
        self.state
            .stage_index()
            .map(|i| self.validator.check(i, &self.store.read()))
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }

    // ========================================================================
    // NAVIGATION
    // ========================================================================

    /// Move to the next stage if the current one is satisfied
    pub fn advance(&mut self) -> Result<Transition, CivicError> {
        let from = self.current_stage("advance")?;
        if from >= self.validator.plan().last_index() {
            debug!(stage = from, "advance requested on last stage");
            return Ok(Transition::AtLastStage);
        }

        let check = self.validator.check(from, &self.store.read());
        if !check.passed {
            debug!(stage = %check.stage, missing = ?check.missing_names(), "advance blocked");
            return Ok(Transition::Blocked(check));
        }

        if check.kind == StageKind::Classify {
            self.auto_assign_department();
        }

        let to = from + 1;
        self.state = WizardState::Stage(to);
        info!(session_id = %self.context.session_id, from, to, "stage advanced");
        self.publish();
        Ok(Transition::Moved { from, to })
    }

    /// Go back one stage; entered fields are kept
    pub fn retreat(&mut self) -> Result<Transition, CivicError> {
        let from = self.current_stage("retreat")?;
        if from == 0 {
            return Ok(Transition::AtFirstStage);
        }

        let to = from - 1;
        self.state = WizardState::Stage(to);
        info!(session_id = %self.context.session_id, from, to, "stage retreated");
        self.publish();
        Ok(Transition::Moved { from, to })
    }

    fn current_stage(&self, action: &str) -> Result<usize, CivicError> {
        self.state
            .stage_index()
            .ok_or_else(|| CivicError::InvalidState(format!("cannot {} while {:?}", action, self.state)))
    }

    fn auto_assign_department(&mut self) {
        if !self.config.auto_assign_department {
            return;
        }
        let draft = self.store.read();
        let current = draft.assigned_to();
        if current.is_some() && current != self.auto_department.as_deref() {
            return;
        }

        let department = self.resolver.recommend(&draft).name();
        if current != Some(department) {
            self.store.merge(DraftPatch::new().with_assigned_to(department));
            debug!(department, category = ?draft.category(), "department assigned from category");
        }
        self.auto_department = Some(department.to_string());
    }

    // ========================================================================
    // DRAFT EDITS
    // ========================================================================

    /// Merge a partial update into the draft
    pub fn update(&mut self, patch: DraftPatch) -> Result<Arc<DraftRecord>, CivicError> {
        self.ensure_editable()?;
        if let Patch::Set(images) = &patch.images {
            self.check_slots(images)?;
        }
        if !patch.assigned_to.is_keep() {
            self.auto_department = None;
        }

        let draft = self.store.merge(patch);
        self.last_error = None;
        self.publish();
        Ok(draft)
    }

    pub fn set_description(&mut self, text: impl Into<String>) -> Result<Arc<DraftRecord>, CivicError> {
        self.update(DraftPatch::new().with_description(text))
    }

    /// Typed address without coordinates; blank input clears the location
    pub fn set_manual_address(&mut self, address: impl Into<String>) -> Result<Arc<DraftRecord>, CivicError> {
        let patch = match Location::manual(address) {
            Some(location) => DraftPatch::new().with_location(location),
            None => DraftPatch::new().clear_location(),
        };
        self.update(patch)
    }

    /// Known categories are stored in their canonical spelling
    pub fn select_category(&mut self, category: &str) -> Result<Arc<DraftRecord>, CivicError> {
        let category = self
            .resolver
            .canonical(category)
            .map(str::to_string)
            .unwrap_or_else(|| category.trim().to_string());
        self.update(DraftPatch::new().with_category(category))
    }

    pub fn set_urgency(&mut self, urgency: Urgency) -> Result<Arc<DraftRecord>, CivicError> {
        self.update(DraftPatch::new().with_urgency(urgency))
    }

    pub fn set_frequency(&mut self, frequency: Frequency) -> Result<Arc<DraftRecord>, CivicError> {
        self.update(DraftPatch::new().with_frequency(frequency))
    }

    pub fn assign_department(&mut self, department: impl Into<String>) -> Result<Arc<DraftRecord>, CivicError> {
        self.update(DraftPatch::new().with_assigned_to(department))
    }

    /// Write one slot; the other slots keep their contents
    pub fn set_image(&mut self, slot: usize, payload: ImagePayload) -> Result<Arc<DraftRecord>, CivicError> {
        self.write_slot(slot, Some(payload))
    }

    pub fn remove_image(&mut self, slot: usize) -> Result<Arc<DraftRecord>, CivicError> {
        self.write_slot(slot, None)
    }

    fn write_slot(&mut self, slot: usize, payload: Option<ImagePayload>) -> Result<Arc<DraftRecord>, CivicError> {
        self.ensure_slot(slot)?;
        let images = self.store.read().images.with_slot(slot, payload)?;
        debug!(slot, populated = images.populated_count(), "image slot written");
        self.update(DraftPatch::new().with_images(images))
    }

    fn ensure_editable(&self) -> Result<(), CivicError> {
        match self.state {
            WizardState::Stage(_) => Ok(()),
            other => Err(CivicError::InvalidState(format!("draft is read-only while {:?}", other))),
        }
    }

    fn ensure_slot(&self, index: usize) -> Result<(), CivicError> {
        if index >= self.config.image_slots {
            return Err(CivicError::InvalidSlot {
                index,
                capacity: self.config.image_slots,
            });
        }
        Ok(())
    }

    fn check_slots(&self, images: &ImageSlots) -> Result<(), CivicError> {
        match images.populated().find(|(index, _)| *index >= self.config.image_slots) {
            Some((index, _)) => Err(CivicError::InvalidSlot {
                index,
                capacity: self.config.image_slots,
            }),
            None => Ok(()),
        }
    }

    // ========================================================================
    // CAPTURE
    // ========================================================================

    /// One-shot position fix into the draft. On failure the location is left
    /// as it was and the message is kept in `last_error`.
    pub async fn capture_location(&mut self) -> Result<Arc<DraftRecord>, CivicError> {
        self.ensure_editable()?;
        let located = self.capture.locate().await;
        let location = self.record(located)?;
        self.update(DraftPatch::new().with_location(location))
    }

    /// Open the camera for a capture view
    pub async fn open_camera(&mut self) -> Result<CameraSession, CivicError> {
        self.ensure_editable()?;
        let opened = self.capture.open_camera().await;
        self.record(opened)
    }

    /// Take a frame from `session` into `slot`
    pub fn capture_into(&mut self, session: &mut CameraSession, slot: usize) -> Result<Arc<DraftRecord>, CivicError> {
        self.ensure_editable()?;
        self.ensure_slot(slot)?;
        let captured = session.capture();
        let payload = self.record(captured)?;
        self.set_image(slot, payload)
    }

    /// Close the current capture view; late camera results are discarded
    pub fn abandon_camera(&self) {
        self.capture.abandon_camera();
    }

    /// Read a local image file into `slot`
    pub async fn attach_file(&mut self, path: impl AsRef<Path>, slot: usize) -> Result<Arc<DraftRecord>, CivicError> {
        self.ensure_editable()?;
        self.ensure_slot(slot)?;
        let read = self.capture.read_image(path.as_ref()).await;
        let payload = self.record(read)?;
        self.set_image(slot, payload)
    }

    /// Ask the classifier about the image in `slot`. A suggestion fills the
    /// category only while the user has not picked one.
    pub async fn suggest_category(&mut self, slot: usize) -> Result<Option<String>, CivicError> {
        self.ensure_editable()?;
        self.ensure_slot(slot)?;
        let image = self
            .store
            .read()
            .images
            .get(slot)
            .cloned()
            .ok_or_else(|| CivicError::InvalidState(format!("image slot {} is empty", slot)))?;

        let classifier = Arc::clone(&self.classifier);
        let suggestion = match classifier.classify(&image).await {
            ClassifierOutcome::Suggested(category) => category,
            ClassifierOutcome::Unavailable(reason) => {
                debug!(classifier = classifier.name(), %reason, "no category suggestion");
                return Ok(None);
            }
        };

        info!(classifier = classifier.name(), category = %suggestion, slot, "category suggested");
        if self.store.read().category().is_none() {
            self.select_category(&suggestion)?;
        }
        Ok(Some(suggestion))
    }

    /// Keep the user-facing message of a failed device call
    fn record<T>(&mut self, result: Result<T, CivicError>) -> Result<T, CivicError> {
        if let Err(err) = &result {
            if *err != CivicError::DeviceUnavailable(DeviceError::Abandoned) {
                self.last_error = Some(err.user_message());
                self.publish();
            }
        }
        result
    }

    // ========================================================================
    // FINALIZE
    // ========================================================================

    /// Freeze the draft and hand it to the sink. Only valid on the last
    /// stage with every stage's requirements met.
    pub async fn finalize(&mut self) -> Result<CompletedComplaint, CivicError> {
        let last = self.validator.plan().last_index();
        if self.state != WizardState::Stage(last) {
            return Err(CivicError::InvalidState(format!(
                "finalize is only available on the last stage, currently {:?}",
                self.state
            )));
        }

        let draft = self.store.read();
        if let Some(check) = self.validator.first_blocking(&draft) {
            warn!(stage = %check.stage, missing = ?check.missing_names(), "finalize rejected, draft incomplete");
            return Err(check.into_error());
        }

        let at = Utc::now();
        let complaint = CompletedComplaint::freeze(&draft, Uuid::new_v4(), at)?;

        self.state = WizardState::Submitting;
        self.publish();
        info!(session_id = %self.context.session_id, id = %complaint.id(), "submitting complaint");

        let sink = Arc::clone(&self.sink);
        let submitted = {
            let guard = SubmitGuard::new(&mut self.state, WizardState::Stage(last));
            let submitted = sink.submit(&complaint).await;
            guard.disarm();
            submitted
        };

        match submitted {
            Ok(()) => {
                self.store.freeze(at);
                self.state = WizardState::Complete;
                self.last_error = None;
                self.completed = Some(complaint.clone());
                info!(id = %complaint.id(), digest = %complaint.digest(), "complaint submitted");
                self.publish();
                Ok(complaint)
            }
            Err(err) => {
                warn!(error = %err, "submission failed, returning to last stage");
                self.state = WizardState::Stage(last);
                self.last_error = Some(err.user_message());
                self.publish();
                Err(CivicError::SubmissionFailed(err))
            }
        }
    }

    /// Start a new session with an empty draft
    pub fn restart(&mut self) {
        self.capture.abandon_camera();
        self.context = SessionContext::new();
        self.store.reset();
        self.state = WizardState::Stage(0);
        self.last_error = None;
        self.completed = None;
        self.auto_department = None;
        info!(session_id = %self.context.session_id, "wizard session restarted");
        self.publish();
    }
}

impl std::fmt::Debug for WizardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardController")
            .field("config", &self.config.name)
            .field("session_id", &self.context.session_id)
            .field("state", &self.state)
            .field("revision", &self.store.revision())
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn controller(config: WizardConfig) -> WizardController {
        WizardController::new(config, Arc::new(MemorySink::new())).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let wizard = controller(WizardConfig::three_stage());
        assert_eq!(wizard.state(), WizardState::Stage(0));
        assert_eq!(wizard.stage_name(), Some("report"));

        let view = wizard.view();
        assert_eq!(view.stage_number, 1);
        assert_eq!(view.stage_count, 3);
        assert!(!view.can_advance);
        assert!(!view.can_retreat);
        assert_eq!(view.missing, vec![Requirement::Description, Requirement::Evidence]);
    }

    #[test]
    fn test_retreat_from_first_stage() {
        let mut wizard = controller(WizardConfig::two_stage());
        assert_eq!(wizard.retreat().unwrap(), Transition::AtFirstStage);
        assert_eq!(wizard.state(), WizardState::Stage(0));
    }

    #[test]
    fn test_slot_limit_follows_config() {
        let mut wizard = controller(WizardConfig::two_stage());
        let png = ImagePayload::encode("image/png", b"p").unwrap();

        let err = wizard.set_image(1, png.clone()).unwrap_err();
        assert_eq!(err, CivicError::InvalidSlot { index: 1, capacity: 1 });

        let slots = ImageSlots::new().with_slot(2, Some(png)).unwrap();
        assert!(wizard.update(DraftPatch::new().with_images(slots)).is_err());
        assert_eq!(wizard.draft().images.populated_count(), 0);
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let json = serde_json::to_value(WizardState::Stage(1)).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "stage", "stage": 1 }));
        let json = serde_json::to_value(WizardState::Complete).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "complete" }));
    }

    #[test]
    fn test_manual_department_is_not_overwritten() {
        let mut wizard = controller(WizardConfig::three_stage());
        wizard.set_description("Broken swing").unwrap();
        wizard.set_manual_address("Central Park").unwrap();
        wizard.advance().unwrap();

        wizard.select_category("environment").unwrap();
        wizard.assign_department("Parks & Recreation").unwrap();
        wizard.advance().unwrap();

        let draft = wizard.draft();
        assert_eq!(draft.category(), Some("Environment"));
        assert_eq!(draft.assigned_to(), Some("Parks & Recreation"));
    }
}
