//! Per-vehicle orchestration of sequencing, resolution and guidance.
//!
//! A [`VehicleNavigator`] owns one vehicle's roster, manifest, resolved route
//! and displayed instruction. Every event (a position fix, a roster edit, a
//! completed stop) re-sequences synchronously and refreshes guidance against
//! the last known-good route. Path resolution runs asynchronously behind a
//! latch so at most one resolution per vehicle is in flight:
//!
//! - manifest edits arriving while resolving mark the vehicle dirty and the
//!   in-flight task re-runs once it completes;
//! - drift and position triggers arriving while resolving are dropped.
//!
//! The latch is cleared by a guard, so a resolution future that panics or is
//! dropped mid-flight never wedges the vehicle in [`Phase::Planning`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use geo::{Coord, LineString};
use log::{debug, info, warn};
use schoolrun_core::geodesy::{distance_m, is_valid_coordinate};
use schoolrun_core::{
    Manifest, NavigationInstruction, NearestNeighbourSequencer, PathResolver, Position,
    PositionError, PositionSource, ResolvedRoute, SCHOOL_STOP_ID, Sequencer, Subject,
    SubjectStatus, Subscription, distance_from_route, next_instruction,
    route_eta_minutes,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::{NavigatorConfig, NavigatorError, PeriodicTask};

/// Lifecycle of a vehicle's current leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Phase {
    /// No pickups to plan for.
    #[default]
    Idle,
    /// A resolution is in flight, or the active route no longer serves the
    /// waiting pickups.
    Planning,
    /// A resolved route is active and guidance follows it.
    Guiding,
    /// Every pickup is done and the school was reached.
    Arrived,
}

impl Phase {
    /// Return the phase as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::Guiding => "guiding",
            Self::Arrived => "arrived",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a resolution was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveReason {
    /// The roster, a subject's status or a stop's completion changed.
    ManifestChanged,
    /// A fix arrived while the route was missing or served other pickups.
    PositionUpdate,
    /// Conformance polling found the vehicle off its route.
    Drift,
    /// The host asked for a fresh route.
    Manual,
}

impl ResolveReason {
    /// Return the reason as a kebab-case `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManifestChanged => "manifest-changed",
            Self::PositionUpdate => "position-update",
            Self::Drift => "drift",
            Self::Manual => "manual",
        }
    }

    const fn reruns_when_busy(self) -> bool {
        matches!(self, Self::ManifestChanged | Self::Manual)
    }
}

impl fmt::Display for ResolveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a call to [`VehicleNavigator::resolve_now`] achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// A new route replaced the previous one.
    Applied {
        /// Aggregate ETA of the new route.
        eta_minutes: u32,
    },
    /// The resolver produced nothing; the previous route stays active.
    Failed,
    /// Another resolution was already in flight.
    Skipped,
    /// The manifest changed while resolving and the result was discarded.
    Stale,
    /// There is no origin or no pickup to plan for.
    NothingToPlan,
}

/// Result of one conformance poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConformanceCheck {
    /// No position fix has been received yet.
    NoPosition,
    /// No route has been applied yet.
    NoRoute,
    /// The vehicle is within the threshold of its route.
    OnRoute {
        /// Distance from the route in metres.
        distance_m: f64,
    },
    /// The vehicle drifted beyond the threshold.
    OffRoute {
        /// Distance from the route in metres.
        distance_m: f64,
        /// Whether a re-resolution was started; `false` when one was
        /// already in flight or this drift already requested one.
        resolution_started: bool,
    },
}

/// Point-in-time view of a vehicle for display.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NavigationSnapshot {
    /// Vehicle the snapshot describes.
    pub vehicle_id: String,
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Ordered stops with completion flags and per-stop ETAs.
    pub manifest: Manifest,
    /// Geometry of the active route, for map rendering.
    pub geometry: Option<LineString<f64>>,
    /// Next turn-by-turn instruction.
    pub instruction: Option<NavigationInstruction>,
    /// Aggregate ETA of the active route; `0` without one.
    pub eta_minutes: u32,
    /// Last valid position fix.
    pub position: Option<Position>,
    /// Most recent position source failure, cleared by the next fix.
    pub position_error: Option<PositionError>,
    /// Whether a resolution is in flight.
    pub recalculating: bool,
    /// Whether the last conformance poll found the vehicle off route.
    pub off_route: bool,
}

#[derive(Debug, Default)]
struct State {
    phase: Phase,
    roster: Vec<Subject>,
    position: Option<Position>,
    position_error: Option<PositionError>,
    manifest: Manifest,
    route: Option<ResolvedRoute>,
    // Sorted ids of the waiting subjects the active route serves.
    planned_for: Option<Vec<String>>,
    instruction: Option<NavigationInstruction>,
    resolving: bool,
    dirty: bool,
    generation: u64,
    off_route: bool,
    // Set once a drift has requested a resolution, cleared back on route.
    drifting: bool,
}

struct Request {
    origin: Coord<f64>,
    waiting: Vec<Coord<f64>>,
    waiting_ids: Vec<String>,
    generation: u64,
}

struct Shared {
    vehicle_id: String,
    config: NavigatorConfig,
    sequencer: Box<dyn Sequencer>,
    resolver: Box<dyn PathResolver>,
    state: Mutex<State>,
}

/// Orchestrator for a single vehicle.
///
/// Cloning is cheap and every clone drives the same vehicle. Resolution and
/// polling spawn onto the ambient Tokio runtime; without one, events still
/// update the manifest and guidance but no route is resolved.
///
/// # Examples
/// ```
/// use schoolrun_core::{StraightLineResolver, Subject, geodesy::lat_lng};
/// use schoolrun_navigator::{NavigatorConfig, Phase, ResolveReason, VehicleNavigator};
///
/// # let runtime = tokio::runtime::Builder::new_current_thread()
/// #     .enable_all()
/// #     .build()
/// #     .expect("runtime");
/// # runtime.block_on(async {
/// let config = NavigatorConfig::new(lat_lng(0.0, 0.03), "School")
///     .with_fallback_position(lat_lng(0.0, 0.0));
/// let navigator = VehicleNavigator::new("van-1", config, StraightLineResolver::default());
/// navigator.set_roster(vec![Subject::waiting("ana", lat_lng(0.0, 0.01))]);
/// navigator.resolve_now(ResolveReason::Manual).await;
///
/// let snapshot = navigator.snapshot();
/// assert_eq!(snapshot.phase, Phase::Guiding);
/// assert!(snapshot.geometry.is_some());
/// # });
/// ```
#[derive(Clone)]
pub struct VehicleNavigator {
    shared: Arc<Shared>,
}

impl fmt::Debug for VehicleNavigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VehicleNavigator")
            .field("vehicle_id", &self.shared.vehicle_id)
            .finish_non_exhaustive()
    }
}

impl VehicleNavigator {
    /// Navigate with the nearest-neighbour sequencer from `config`.
    pub fn new(
        vehicle_id: impl Into<String>,
        config: NavigatorConfig,
        resolver: impl PathResolver + 'static,
    ) -> Self {
        let sequencer = NearestNeighbourSequencer::with_config(config.sequencer);
        Self::with_sequencer(vehicle_id, config, sequencer, resolver)
    }

    /// Navigate with an explicit sequencing strategy.
    pub fn with_sequencer(
        vehicle_id: impl Into<String>,
        config: NavigatorConfig,
        sequencer: impl Sequencer + 'static,
        resolver: impl PathResolver + 'static,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                vehicle_id: vehicle_id.into(),
                config,
                sequencer: Box::new(sequencer),
                resolver: Box::new(resolver),
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Identifier of the vehicle.
    #[must_use]
    pub fn vehicle_id(&self) -> &str {
        &self.shared.vehicle_id
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &NavigatorConfig {
        &self.shared.config
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    /// Capture everything a display needs in one consistent view.
    #[must_use]
    pub fn snapshot(&self) -> NavigationSnapshot {
        let state = self.shared.lock();
        NavigationSnapshot {
            vehicle_id: self.shared.vehicle_id.clone(),
            phase: state.phase,
            manifest: state.manifest.clone(),
            geometry: state.route.as_ref().map(|route| route.geometry.clone()),
            instruction: state.instruction.clone(),
            eta_minutes: route_eta_minutes(state.route.as_ref()),
            position: state.position,
            position_error: state.position_error,
            recalculating: state.resolving,
            off_route: state.off_route,
        }
    }

    /// Record a position fix, re-sequence and refresh guidance.
    ///
    /// Malformed fixes are ignored. A resolution starts when no route is
    /// active or the set of waiting pickups changed since the last one.
    pub fn update_position(&self, position: Position) {
        if !is_valid_coordinate(position.coordinate) {
            warn!(
                "vehicle {}: ignoring malformed position {:?}",
                self.shared.vehicle_id, position.coordinate
            );
            return;
        }
        let needs_route = {
            let mut state = self.shared.lock();
            state.position = Some(position);
            state.position_error = None;
            self.shared.replan(&mut state);
            !state.resolving && has_active_manifest(&state.manifest) && !route_is_current(&state)
        };
        if needs_route {
            self.request_resolution(ResolveReason::PositionUpdate);
        }
    }

    /// Record a position source failure; planning continues from the last
    /// known or fallback position.
    pub fn report_position_error(&self, error: PositionError) {
        warn!(
            "vehicle {}: {error}; continuing from last known position",
            self.shared.vehicle_id
        );
        self.shared.lock().position_error = Some(error);
    }

    /// Add `subject` to the roster, replacing any entry with the same id.
    ///
    /// # Errors
    /// Returns [`NavigatorError::InvalidLocation`] when the subject's pickup
    /// coordinate is malformed.
    pub fn assign_subject(&self, subject: Subject) -> Result<(), NavigatorError> {
        if !subject.has_valid_location() {
            return Err(NavigatorError::InvalidLocation {
                subject_id: subject.id,
            });
        }
        let mut state = self.shared.lock();
        if let Some(existing) = state.roster.iter_mut().find(|s| s.id == subject.id) {
            *existing = subject;
        } else {
            state.roster.push(subject);
        }
        self.commit_edit(state);
        Ok(())
    }

    /// Replace the whole roster. Subjects with malformed locations are kept
    /// but skipped when sequencing.
    pub fn set_roster(&self, subjects: Vec<Subject>) {
        let mut state = self.shared.lock();
        state.roster = subjects;
        self.commit_edit(state);
    }

    /// Change the boarding state of a rostered subject.
    ///
    /// # Errors
    /// Returns [`NavigatorError::UnknownSubject`] when `subject_id` is not on
    /// the roster.
    pub fn update_subject_status(
        &self,
        subject_id: &str,
        status: SubjectStatus,
    ) -> Result<(), NavigatorError> {
        let mut state = self.shared.lock();
        find_subject(&mut state, subject_id)?.status = status;
        self.commit_edit(state);
        Ok(())
    }

    /// Confirm a visit by stop id.
    ///
    /// Completing a pickup marks its subject picked up. Completing
    /// [`SCHOOL_STOP_ID`] drops off everyone on board and, when no pickup is
    /// left open, ends the leg in [`Phase::Arrived`].
    ///
    /// # Errors
    /// Returns [`NavigatorError::UnknownSubject`] when the stop does not
    /// belong to a rostered subject.
    pub fn mark_stop_completed(&self, stop_id: &str) -> Result<(), NavigatorError> {
        let mut state = self.shared.lock();
        if stop_id == SCHOOL_STOP_ID {
            for subject in state.roster.iter_mut().filter(|s| s.is_picked_up()) {
                subject.status = SubjectStatus::DroppedOff;
            }
            if !state.roster.iter().any(Subject::is_waiting) {
                debug!("vehicle {}: school reached", self.shared.vehicle_id);
                state.phase = Phase::Arrived;
            }
        } else {
            let subject_id = stop_id.strip_prefix("stop-").unwrap_or(stop_id);
            find_subject(&mut state, subject_id)?.status = SubjectStatus::PickedUp;
        }
        self.commit_edit(state);
        Ok(())
    }

    /// Measure drift from the active route and re-resolve when off route.
    ///
    /// Only the first poll of a drift requests a resolution; the vehicle must
    /// come back within the threshold before another drift can trigger one.
    #[must_use]
    pub fn check_conformance(&self) -> ConformanceCheck {
        let distance_m = {
            let mut state = self.shared.lock();
            let Some(position) = state.position else {
                return ConformanceCheck::NoPosition;
            };
            let Some(route) = state.route.as_ref() else {
                return ConformanceCheck::NoRoute;
            };
            let distance_m = distance_from_route(position.coordinate, &route.geometry);
            state.off_route = distance_m > self.shared.config.conformance.threshold_m;
            if !state.off_route {
                state.drifting = false;
                return ConformanceCheck::OnRoute { distance_m };
            }
            if std::mem::replace(&mut state.drifting, true) {
                return ConformanceCheck::OffRoute {
                    distance_m,
                    resolution_started: false,
                };
            }
            distance_m
        };
        debug!(
            "vehicle {}: {distance_m:.0} m off route",
            self.shared.vehicle_id
        );
        let resolution_started = self.spawn_resolution(ResolveReason::Drift).is_some();
        ConformanceCheck::OffRoute {
            distance_m,
            resolution_started,
        }
    }

    /// Re-sequence and resolve a route, waiting for the result.
    ///
    /// Returns [`ResolutionOutcome::Skipped`] when another resolution holds
    /// the latch. When the manifest changes while this call is resolving,
    /// it resolves again before returning.
    pub async fn resolve_now(&self, reason: ResolveReason) -> ResolutionOutcome {
        let mut reason = reason;
        let mut previous = None;
        loop {
            let request = match self.shared.begin(reason) {
                Ok(request) => request,
                Err(outcome) => {
                    return match (outcome, previous) {
                        (ResolutionOutcome::Skipped, Some(previous)) => previous,
                        (outcome, _) => outcome,
                    };
                }
            };
            let latch = Latch::new(&self.shared);
            let route = self
                .shared
                .resolver
                .resolve(
                    request.origin,
                    &request.waiting,
                    self.shared.config.destination,
                )
                .await;
            let (outcome, rerun) = self.shared.complete(&request, route);
            latch.disarm();
            if !rerun {
                return outcome;
            }
            debug!(
                "vehicle {}: manifest changed while resolving; re-running",
                self.shared.vehicle_id
            );
            previous = Some(outcome);
            reason = ResolveReason::ManifestChanged;
        }
    }

    /// Start a resolution on the current runtime.
    ///
    /// Returns `None` when no runtime is available or a resolution is
    /// already in flight; in the latter case manifest-driven reasons mark
    /// the vehicle for a re-run and other reasons are dropped.
    #[must_use]
    pub fn spawn_resolution(
        &self,
        reason: ResolveReason,
    ) -> Option<JoinHandle<ResolutionOutcome>> {
        {
            let mut state = self.shared.lock();
            if self.shared.defer_if_resolving(&mut state, reason) {
                return None;
            }
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!(
                "vehicle {}: no Tokio runtime; {reason} resolution not started",
                self.shared.vehicle_id
            );
            return None;
        };
        let navigator = self.clone();
        Some(runtime.spawn(async move { navigator.resolve_now(reason).await }))
    }

    /// Poll conformance every [`ConformanceConfig::poll_interval`].
    ///
    /// [`ConformanceConfig::poll_interval`]: schoolrun_core::ConformanceConfig::poll_interval
    pub fn start_conformance_polling(&self) -> PeriodicTask {
        let navigator = self.clone();
        PeriodicTask::spawn(self.shared.config.conformance.poll_interval, move || {
            let _check = navigator.check_conformance();
        })
    }

    /// Feed fixes and failures from `source` into this navigator.
    pub fn attach(&self, source: &dyn PositionSource) -> Subscription {
        let on_update = self.clone();
        let on_error = self.clone();
        source.subscribe(
            Box::new(move |position| on_update.update_position(position)),
            Box::new(move |error| on_error.report_position_error(error)),
        )
    }

    fn request_resolution(&self, reason: ResolveReason) {
        drop(self.spawn_resolution(reason));
    }

    /// Re-sequence after a roster edit, release the lock, then resolve.
    fn commit_edit(&self, mut state: MutexGuard<'_, State>) {
        state.generation = state.generation.wrapping_add(1);
        self.shared.replan(&mut state);
        drop(state);
        self.request_resolution(ResolveReason::ManifestChanged);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn origin(&self, state: &State) -> Option<Coord<f64>> {
        state
            .position
            .map(|position| position.coordinate)
            .or(self.config.fallback_position)
            .filter(|origin| is_valid_coordinate(*origin))
    }

    fn replan(&self, state: &mut State) {
        let manifest = self.origin(state).map_or_else(Manifest::default, |origin| {
            self.sequencer
                .sequence(origin, &state.roster, self.config.destination)
        });
        state.manifest = manifest;
        self.refresh_guidance(state);
    }

    fn refresh_guidance(&self, state: &mut State) {
        let instruction = self
            .origin(state)
            .zip(state.route.as_ref())
            .and_then(|(current, route)| {
                next_instruction(
                    current,
                    route.path(),
                    &self.config.destination_name,
                    &self.config.guidance,
                )
            });
        state.instruction = instruction;
        let at_school = self.origin(state).is_some_and(|current| {
            distance_m(current, self.config.destination) < self.config.guidance.arrival_threshold_m
        });
        let next = next_phase(state, at_school);
        if next != state.phase {
            debug!("vehicle {}: {} -> {next}", self.vehicle_id, state.phase);
            state.phase = next;
        }
    }

    fn defer_if_resolving(&self, state: &mut State, reason: ResolveReason) -> bool {
        if !state.resolving {
            return false;
        }
        if reason.reruns_when_busy() {
            debug!(
                "vehicle {}: resolution in flight; {reason} will re-run it",
                self.vehicle_id
            );
            state.dirty = true;
        } else {
            debug!(
                "vehicle {}: resolution in flight; dropping {reason} trigger",
                self.vehicle_id
            );
        }
        true
    }

    fn begin(&self, reason: ResolveReason) -> Result<Request, ResolutionOutcome> {
        let mut state = self.lock();
        if self.defer_if_resolving(&mut state, reason) {
            return Err(ResolutionOutcome::Skipped);
        }
        self.replan(&mut state);
        let Some(origin) = self.origin(&state) else {
            debug!("vehicle {}: no origin to plan from", self.vehicle_id);
            return Err(ResolutionOutcome::NothingToPlan);
        };
        if !has_active_manifest(&state.manifest) {
            return Err(ResolutionOutcome::NothingToPlan);
        }
        state.resolving = true;
        state.dirty = false;
        self.refresh_guidance(&mut state);
        Ok(Request {
            origin,
            waiting: state.manifest.waiting_locations(),
            waiting_ids: waiting_ids(&state.manifest),
            generation: state.generation,
        })
    }

    /// Release the latch and apply `route` unless the manifest moved on.
    ///
    /// Returns the outcome and whether the caller must resolve again.
    fn complete(
        &self,
        request: &Request,
        route: Option<ResolvedRoute>,
    ) -> (ResolutionOutcome, bool) {
        let mut state = self.lock();
        state.resolving = false;
        let stale = state.generation != request.generation;
        let rerun = std::mem::take(&mut state.dirty) || stale;
        let outcome = match route {
            _ if stale => {
                warn!(
                    "vehicle {}: discarding stale route; manifest changed while resolving",
                    self.vehicle_id
                );
                ResolutionOutcome::Stale
            }
            Some(route) => {
                let eta_minutes = route.eta_minutes();
                info!(
                    "vehicle {}: route applied, {:.0} m, ETA {eta_minutes} min",
                    self.vehicle_id, route.distance_m
                );
                state.route = Some(route);
                state.planned_for = Some(request.waiting_ids.clone());
                state.off_route = false;
                ResolutionOutcome::Applied { eta_minutes }
            }
            None => {
                warn!(
                    "vehicle {}: path resolution failed; keeping previous route",
                    self.vehicle_id
                );
                ResolutionOutcome::Failed
            }
        };
        self.refresh_guidance(&mut state);
        (outcome, rerun)
    }
}

/// Clears the resolving latch if a resolution ends without completing.
struct Latch<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl<'a> Latch<'a> {
    const fn new(shared: &'a Shared) -> Self {
        Self {
            shared,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Latch<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                "vehicle {}: resolution abandoned; releasing latch",
                self.shared.vehicle_id
            );
            let mut state = self.shared.lock();
            state.resolving = false;
            self.shared.refresh_guidance(&mut state);
        }
    }
}

fn next_phase(state: &State, at_school: bool) -> Phase {
    let open = state.manifest.has_open_pickups();
    if state.phase == Phase::Arrived && !open {
        return Phase::Arrived;
    }
    if !has_active_manifest(&state.manifest) {
        return Phase::Idle;
    }
    if state.resolving {
        return Phase::Planning;
    }
    if !route_is_current(state) {
        return Phase::Planning;
    }
    if at_school && !open {
        Phase::Arrived
    } else {
        Phase::Guiding
    }
}

/// Whether the active route was planned for the pickups still waiting.
fn route_is_current(state: &State) -> bool {
    state.route.is_some() && state.planned_for.as_ref() == Some(&waiting_ids(&state.manifest))
}

fn has_active_manifest(manifest: &Manifest) -> bool {
    manifest.pickups().next().is_some()
}

fn waiting_ids(manifest: &Manifest) -> Vec<String> {
    let mut ids: Vec<String> = manifest
        .pickups()
        .filter(|stop| !stop.completed)
        .filter_map(|stop| stop.subject_id.clone())
        .collect();
    ids.sort_unstable();
    ids
}

fn find_subject<'a>(
    state: &'a mut State,
    subject_id: &str,
) -> Result<&'a mut Subject, NavigatorError> {
    state
        .roster
        .iter_mut()
        .find(|subject| subject.id == subject_id)
        .ok_or_else(|| NavigatorError::UnknownSubject {
            subject_id: subject_id.to_owned(),
        })
}
