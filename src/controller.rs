//! Settlement state for one IOU report screen.
//!
//! [`SettlementController`] owns the selection, menu and in-flight state and is the only
//! thing allowed to change them. Eligibility facts arrive on two paths:
//!
//! ```text
//! on_report_ready ──► baseline + wallet (sync) ──► merge ──► methods
//!        │                                           ▲
//!        └──► peer-app probe (spawned task) ─────────┘  (if not disposed, same generation)
//! ```
//!
//! Every arrival reruns [`PaymentMethodResolver::merge`] over all facts known so far, so the
//! order in which they land does not matter.

use parking_lot::Mutex;
use serde::Serialize;
use settlement_audit::{AuditLogger, EventType, SettlementEvent};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::{ControllerError, Ineligibility};
use crate::flags::FeatureFlags;
use crate::payment_method::{PaymentMethod, PaymentMethodSet};
use crate::probe::AppAvailabilityProbe;
use crate::resolver::PaymentMethodResolver;
use crate::settlement::{SettlementReceipt, SettlementRequest, SettlementService};
use crate::types::{Report, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementPhase {
    /// No report yet, or the last settle attempt has finished.
    Idle,
    /// Baseline known, peer-app probe outstanding.
    Resolving,
    /// Every sub-resolution has landed.
    Ready,
    /// A settlement request is in flight.
    Settling,
}

/// Read-only snapshot for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementView {
    pub phase: SettlementPhase,
    pub methods: PaymentMethodSet,
    pub selected: PaymentMethod,
    pub menu_visible: bool,
    pub in_flight: bool,
    /// Whether the settle action should be enabled.
    pub can_settle: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ineligibility: Option<Ineligibility>,
    /// More than one method, so the action renders with a dropdown.
    pub shows_menu: bool,
}

struct ControllerState {
    phase: SettlementPhase,
    report: Option<Report>,
    /// Bumped on every report update; probe results from older generations are dropped.
    generation: u64,
    /// Cancels the peer-app check started for the current generation.
    resolution: Option<CancellationToken>,
    baseline: PaymentMethodSet,
    wallet: Option<PaymentMethod>,
    peer_app: Option<PaymentMethod>,
    peer_app_phone: Option<String>,
    methods: PaymentMethodSet,
    selected: PaymentMethod,
    user_selected: bool,
    menu_visible: bool,
    in_flight: bool,
    disposed: bool,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            phase: SettlementPhase::Idle,
            report: None,
            generation: 0,
            resolution: None,
            baseline: PaymentMethodSet::manual_only(),
            wallet: None,
            peer_app: None,
            peer_app_phone: None,
            methods: PaymentMethodSet::manual_only(),
            selected: PaymentMethod::Manual,
            user_selected: false,
            menu_visible: false,
            in_flight: false,
            disposed: false,
        }
    }

    fn remerge(&mut self) {
        self.methods = PaymentMethodResolver::merge(&self.baseline, self.wallet, self.peer_app);
        // The request in flight was built for `selected`; reconciled once it finishes.
        if self.in_flight {
            return;
        }
        if !self.user_selected || !self.methods.contains(self.selected) {
            self.selected = PaymentMethodResolver::default_selection(&self.methods);
            self.user_selected = false;
        }
    }
}

fn check_eligibility<'a>(
    session: &Session,
    report: Option<&'a Report>,
) -> Result<&'a Report, Ineligibility> {
    let report = report.ok_or(Ineligibility::ReportNotLoaded)?;
    if !report.has_outstanding_balance {
        return Err(Ineligibility::NoOutstandingBalance);
    }
    if !session.is_payer_of(report) {
        return Err(Ineligibility::NotThePayer);
    }
    Ok(report)
}

/// Clears the in-flight flag when the settle future completes or is dropped.
struct InFlightGuard {
    state: Arc<Mutex<ControllerState>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.in_flight = false;
        if state.phase == SettlementPhase::Settling {
            state.phase = SettlementPhase::Idle;
        }
        if !state.disposed {
            state.remerge();
        }
    }
}

pub struct SettlementController<S> {
    session: Session,
    resolver: Arc<PaymentMethodResolver>,
    probe: Arc<dyn AppAvailabilityProbe>,
    service: S,
    audit: Arc<AuditLogger>,
    state: Arc<Mutex<ControllerState>>,
    tasks: TaskTracker,
    shutdown: CancellationToken,
}

impl<S: SettlementService> SettlementController<S> {
    pub fn new(
        session: Session,
        resolver: Arc<PaymentMethodResolver>,
        probe: Arc<dyn AppAvailabilityProbe>,
        service: S,
    ) -> Self {
        Self {
            session,
            resolver,
            probe,
            service,
            audit: Arc::new(AuditLogger::default()),
            state: Arc::new(Mutex::new(ControllerState::new())),
            tasks: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_audit_logger(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    /// Recomputes the method set for a freshly loaded (or refreshed) report.
    ///
    /// Baseline and wallet are applied before this returns. The peer-app check runs on a
    /// spawned task and lands later, so this must be called from within a Tokio runtime.
    /// A check still running for the previous report is cancelled.
    pub fn on_report_ready(&self, report: Report, flags: &FeatureFlags) {
        let (generation, cancel) = {
            let mut state = self.state.lock();
            if state.disposed {
                tracing::debug!("Ignoring report {} on disposed controller", report.report_id);
                return;
            }
            state.generation += 1;
            if let Some(previous) = state.resolution.take() {
                previous.cancel();
            }
            state.baseline = self.resolver.resolve_baseline(&report);
            state.wallet = self.resolver.resolve_wallet(&report, flags);
            state.peer_app = None;
            state.peer_app_phone = self
                .resolver
                .peer_app_phone_number(&report)
                .map(str::to_string);
            state.report = Some(report.clone());
            state.remerge();

            let peer_app_pending = state.peer_app_phone.is_some();
            if !state.in_flight {
                state.phase = if peer_app_pending {
                    SettlementPhase::Resolving
                } else {
                    SettlementPhase::Ready
                };
            }
            tracing::info!(
                "Report {} ready: {} method(s), selected {}",
                report.report_id,
                state.methods.len(),
                state.selected
            );
            if !peer_app_pending {
                return;
            }
            let cancel = self.shutdown.child_token();
            state.resolution = Some(cancel.clone());
            (state.generation, cancel)
        };

        self.spawn_peer_app_resolution(report, generation, cancel);
    }

    fn spawn_peer_app_resolution(
        &self,
        report: Report,
        generation: u64,
        cancel: CancellationToken,
    ) {
        let resolver = Arc::clone(&self.resolver);
        let probe = Arc::clone(&self.probe);
        let state = Arc::clone(&self.state);

        self.tasks.spawn(async move {
            let resolved = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Peer app check for report {} cancelled", report.report_id);
                    return;
                }
                resolved = resolver.resolve_peer_app(&report, probe.as_ref()) => resolved,
            };

            let mut state = state.lock();
            if state.disposed {
                tracing::debug!(
                    "Discarding peer app result for report {}: controller disposed",
                    report.report_id
                );
                return;
            }
            if state.generation != generation {
                tracing::debug!(
                    "Discarding stale peer app result for report {}",
                    report.report_id
                );
                return;
            }

            state.peer_app = resolved;
            state.remerge();
            if state.phase == SettlementPhase::Resolving {
                state.phase = SettlementPhase::Ready;
            }
            tracing::info!(
                "Peer app resolved for report {}: available={}, selected {}",
                report.report_id,
                resolved.is_some(),
                state.selected
            );
        });
    }

    /// Selects `method` if it is currently offered.
    pub fn select_method(&self, method: PaymentMethod) -> Result<(), ControllerError> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(ControllerError::Disposed);
        }
        if !state.methods.contains(method) {
            tracing::warn!("Rejected selection of unavailable method {}", method);
            return Err(ControllerError::InvalidSelection(method));
        }
        state.selected = method;
        state.user_selected = true;
        Ok(())
    }

    /// A menu item was chosen: select it and close the menu.
    pub fn pick_from_menu(&self, method: PaymentMethod) -> Result<(), ControllerError> {
        let selected = self.select_method(method);
        self.set_menu_visible(false);
        selected
    }

    pub fn set_menu_visible(&self, visible: bool) {
        let mut state = self.state.lock();
        if !state.disposed {
            state.menu_visible = visible;
        }
    }

    /// Issues one settlement request for the selected method.
    ///
    /// The in-flight flag is cleared when the request finishes, fails, or this future is
    /// dropped. There is no automatic retry. The selection stays put while the request is in
    /// flight; results that landed meanwhile are applied to it afterwards.
    pub async fn settle(&self) -> Result<SettlementReceipt, ControllerError> {
        let request = {
            let mut state = self.state.lock();
            match self.begin_settlement(&mut state) {
                Ok(request) => request,
                Err(error) => {
                    let report = state.report.clone();
                    let selected = state.selected;
                    drop(state);
                    self.record_rejection(report.as_ref(), selected, &error);
                    return Err(error);
                }
            }
        };
        let in_flight = InFlightGuard {
            state: Arc::clone(&self.state),
        };

        tracing::info!(
            "Settling report {} via {} ({} {})",
            request.report_id,
            request.payment_method_type,
            request.amount,
            request.currency
        );
        self.record(EventType::Requested, &request, None);

        let outcome = self.service.settle(&request).await;
        drop(in_flight);

        match outcome {
            Ok(receipt) => {
                self.record(EventType::Succeeded, &request, receipt.reference.clone());
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!("Settlement of report {} failed: {}", request.report_id, e);
                self.record(EventType::Failed, &request, Some(e.to_string()));
                Err(ControllerError::SettlementRequestFailure(e.to_string()))
            }
        }
    }

    fn begin_settlement(
        &self,
        state: &mut ControllerState,
    ) -> Result<SettlementRequest, ControllerError> {
        if state.disposed {
            return Err(ControllerError::Disposed);
        }
        if state.in_flight {
            return Err(ControllerError::AlreadyInFlight);
        }
        let report = check_eligibility(&self.session, state.report.as_ref())
            .map_err(ControllerError::NotEligible)?;
        let request =
            SettlementRequest::for_report(report, state.selected, state.peer_app_phone.as_deref());

        state.in_flight = true;
        state.phase = SettlementPhase::Settling;
        Ok(request)
    }

    fn record(&self, event_type: EventType, request: &SettlementRequest, detail: Option<String>) {
        let mut event = SettlementEvent::new(
            event_type,
            request.report_id,
            request.chat_report_id,
            request.payment_method_type.as_str(),
            request.amount,
            request.currency.clone(),
        );
        if let Some(detail) = detail {
            event = event.with_detail(detail);
        }
        self.audit.log_event(&event);
    }

    fn record_rejection(
        &self,
        report: Option<&Report>,
        selected: PaymentMethod,
        error: &ControllerError,
    ) {
        tracing::warn!("Settle attempt rejected: {}", error);
        if let Some(report) = report {
            let event = SettlementEvent::new(
                EventType::Rejected,
                report.report_id,
                report.chat_report_id,
                selected.as_str(),
                report.total,
                report.currency.clone(),
            )
            .with_detail(error.to_string());
            self.audit.log_event(&event);
        }
    }
}

impl<S> SettlementController<S> {
    pub fn view(&self) -> SettlementView {
        let state = self.state.lock();
        let ineligibility = check_eligibility(&self.session, state.report.as_ref()).err();
        SettlementView {
            phase: state.phase,
            methods: state.methods.clone(),
            selected: state.selected,
            menu_visible: state.menu_visible,
            in_flight: state.in_flight,
            can_settle: ineligibility.is_none() && !state.in_flight && !state.disposed,
            ineligibility,
            shows_menu: state.methods.len() > 1,
        }
    }

    pub fn methods(&self) -> PaymentMethodSet {
        self.state.lock().methods.clone()
    }

    pub fn selected_method(&self) -> PaymentMethod {
        self.state.lock().selected
    }

    pub fn menu_visible(&self) -> bool {
        self.state.lock().menu_visible
    }

    pub fn in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    pub fn phase(&self) -> SettlementPhase {
        self.state.lock().phase
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Waits until every outstanding peer-app check has finished or been cancelled.
    pub async fn wait_for_resolutions(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Tears the controller down. Late probe results are discarded from here on.
    pub fn dispose(&self) {
        {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.menu_visible = false;
        }
        self.shutdown.cancel();
        tracing::debug!("Settlement controller disposed");
    }
}

impl<S> Drop for SettlementController<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
