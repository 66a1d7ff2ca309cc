//! Foreground session loop
//!
//! One task owns the heading stabilizer, the placement engine and the AR
//! session. Host events and fetch completions are processed one at a time in
//! arrival order, so nothing here needs locking except the anchor map, which
//! renderers may read from other tasks.

use serde::{Deserialize, Serialize};
use sightspotter_core::{
    AnchorId, AnchorRecord, ArSession, GeoPoint, HeadingSample, HeadingStabilizer, Placemark,
    PlacementError, SightPlacementEngine,
};
use sightspotter_geosearch::{PlacemarkProvider, ProviderError};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::event::{AuthorizationStatus, HostEvent, SessionEvent};
use crate::sensors::SensorControl;

/// Session tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Capacity of the host event and broadcast channels
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    64
}

/// Completion of a background fetch, tagged with the cycle that started it
struct FetchOutcome {
    generation: u64,
    result: Result<Vec<Placemark>, ProviderError>,
}

/// Read access to the current cycle's anchors for the rendering side
#[derive(Clone)]
pub struct AnchorDirectory {
    engine: Arc<RwLock<SightPlacementEngine>>,
}

impl AnchorDirectory {
    /// Title for an anchor the renderer is asking a node for
    pub async fn title_for(&self, id: &AnchorId) -> Option<String> {
        self.engine.read().await.title_for(id).map(str::to_string)
    }

    pub async fn record(&self, id: &AnchorId) -> Option<AnchorRecord> {
        self.engine.read().await.record(id).cloned()
    }

    /// Snapshot of all anchors in placement order
    pub async fn records(&self) -> Vec<AnchorRecord> {
        self.engine.read().await.records().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.engine.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.engine.read().await.is_empty()
    }
}

/// Drives fetch, heading stabilization and placement for successive
/// location fixes.
///
/// A new location fix cancels whatever the previous cycle was doing: its
/// fetch task is aborted, heading updates stop and the stabilizer restarts.
/// A fetch result from a superseded cycle is discarded.
pub struct SightSession<P, S, A> {
    provider: Arc<P>,
    sensors: S,
    ar: A,
    engine: Arc<RwLock<SightPlacementEngine>>,
    stabilizer: HeadingStabilizer,
    events: broadcast::Sender<SessionEvent>,
    generation: u64,
    user: Option<GeoPoint>,
    pending: Option<Vec<Placemark>>,
    fetch_task: Option<JoinHandle<()>>,
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    fetch_rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl<P, S, A> SightSession<P, S, A>
where
    P: PlacemarkProvider,
    S: SensorControl,
    A: ArSession + Send + 'static,
{
    pub fn new(provider: Arc<P>, sensors: S, ar: A, config: &SessionConfig) -> Self {
        let (events, _) = broadcast::channel(config.channel_capacity.max(1));
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        Self {
            provider,
            sensors,
            ar,
            engine: Arc::new(RwLock::new(SightPlacementEngine::new())),
            stabilizer: HeadingStabilizer::new(),
            events,
            generation: 0,
            user: None,
            pending: None,
            fetch_task: None,
            fetch_tx,
            fetch_rx,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn directory(&self) -> AnchorDirectory {
        AnchorDirectory {
            engine: self.engine.clone(),
        }
    }

    /// Process host events until `Shutdown` or until every sender is dropped.
    /// Returns the AR session so the host can tear it down.
    pub async fn run(mut self, mut host: mpsc::Receiver<HostEvent>) -> A {
        info!("Sight session started");

        loop {
            tokio::select! {
                event = host.recv() => match event {
                    Some(HostEvent::Shutdown) | None => break,
                    Some(event) => self.handle_host_event(event).await,
                },
                Some(outcome) = self.fetch_rx.recv() => self.handle_fetch_outcome(outcome),
            }
        }

        self.cancel_fetch();
        self.stop_heading();
        info!(cycles = self.generation, "Sight session stopped");
        self.ar
    }

    async fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::AuthorizationChanged(status) => self.handle_authorization(status),
            HostEvent::LocationUpdated(fixes) => match fixes.last() {
                Some(fix) => self.start_cycle(*fix),
                None => debug!("Location update without a fix"),
            },
            HostEvent::LocationFailed(message) => {
                warn!(error = %message, "Failed to acquire location");
            }
            HostEvent::HeadingUpdated(sample) => self.handle_heading(sample).await,
            HostEvent::Shutdown => {}
        }
    }

    fn handle_authorization(&mut self, status: AuthorizationStatus) {
        if status.is_authorized() {
            info!(status = ?status, "Location authorized, requesting fix");
            self.sensors.request_location();
        } else if status == AuthorizationStatus::NotDetermined {
            debug!("Location authorization not determined yet");
        } else {
            warn!(status = ?status, "Location access not granted");
        }
    }

    /// Begin a new placement cycle for `fix`, superseding the current one
    fn start_cycle(&mut self, fix: GeoPoint) {
        if let Err(e) = fix.validate() {
            warn!(error = %e, "Ignoring invalid location fix");
            return;
        }

        self.cancel_fetch();
        self.stop_heading();
        self.stabilizer.reset();
        self.pending = None;

        self.generation += 1;
        self.user = Some(fix);
        let generation = self.generation;

        info!(generation = generation, at = %fix, "Location updated, fetching sights");

        let provider = self.provider.clone();
        let tx = self.fetch_tx.clone();
        self.fetch_task = Some(tokio::spawn(async move {
            let result = provider.placemarks_near(fix).await;
            let _ = tx.send(FetchOutcome { generation, result });
        }));

        let _ = self
            .events
            .send(SessionEvent::FetchStarted { generation, at: fix });
    }

    fn handle_fetch_outcome(&mut self, outcome: FetchOutcome) {
        if outcome.generation != self.generation {
            debug!(
                generation = outcome.generation,
                current = self.generation,
                "Discarding stale fetch result"
            );
            return;
        }
        self.fetch_task = None;
        let generation = outcome.generation;

        match outcome.result {
            Ok(placemarks) => {
                info!(generation = generation, count = placemarks.len(), "Sights received");
                let count = placemarks.len();
                self.pending = Some(placemarks);
                self.stabilizer.subscribe();
                self.sensors.start_heading();
                let _ = self
                    .events
                    .send(SessionEvent::PlacemarksReceived { generation, count });
            }
            Err(e) => {
                warn!(generation = generation, error = %e, "Fetching sights failed");
                let _ = self.events.send(SessionEvent::FetchFailed {
                    generation,
                    kind: e.kind(),
                });
            }
        }
    }

    async fn handle_heading(&mut self, sample: HeadingSample) {
        let Some(commit) = self.stabilizer.on_sample(sample) else {
            return;
        };

        self.sensors.stop_heading();
        let generation = self.generation;
        let _ = self.events.send(SessionEvent::HeadingCommitted {
            generation,
            heading: commit.heading,
        });

        self.place(commit.heading).await;
    }

    async fn place(&mut self, heading: f64) {
        let generation = self.generation;
        let (Some(user), Some(placemarks)) = (self.user, self.pending.take()) else {
            debug!("Heading committed without pending placemarks");
            return;
        };

        let mut engine = self.engine.write().await;
        let event = match engine.place(user, heading, &placemarks, &mut self.ar) {
            Ok(report) => SessionEvent::PlacementCompleted {
                generation,
                anchors: report.placed,
            },
            Err(PlacementError::NoCameraFrame { placed, remaining }) => {
                SessionEvent::PlacementAborted {
                    generation,
                    placed,
                    remaining,
                }
            }
        };
        drop(engine);

        let _ = self.events.send(event);
    }

    fn cancel_fetch(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            debug!("Cancelling in-flight fetch");
            task.abort();
        }
    }

    fn stop_heading(&mut self) {
        if self.stabilizer.is_subscribed() {
            self.sensors.stop_heading();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightspotter_core::{CameraPose, MemoryArSession};
    use sightspotter_geosearch::FailureKind;
    use std::sync::Mutex;
    use std::time::Duration;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    /// Provider returning fixed placemarks. Fixes north of 45° never complete.
    struct FakeProvider {
        placemarks: Vec<Placemark>,
        fail: bool,
    }

    impl PlacemarkProvider for FakeProvider {
        async fn placemarks_near(&self, at: GeoPoint) -> Result<Vec<Placemark>, ProviderError> {
            if at.latitude > 45.0 {
                std::future::pending::<()>().await;
            }
            if self.fail {
                return Err(ProviderError::Status(503));
            }
            Ok(self.placemarks.clone())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum SensorCall {
        RequestLocation,
        StartHeading,
        StopHeading,
    }

    #[derive(Clone, Default)]
    struct RecordingSensors {
        calls: Arc<Mutex<Vec<SensorCall>>>,
    }

    impl RecordingSensors {
        fn calls(&self) -> Vec<SensorCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SensorControl for RecordingSensors {
        fn request_location(&mut self) {
            self.calls.lock().unwrap().push(SensorCall::RequestLocation);
        }

        fn start_heading(&mut self) {
            self.calls.lock().unwrap().push(SensorCall::StartHeading);
        }

        fn stop_heading(&mut self) {
            self.calls.lock().unwrap().push(SensorCall::StopHeading);
        }
    }

    fn sights() -> Vec<Placemark> {
        vec![
            Placemark::new("Lighthouse", pt(0.0, 0.01)),
            Placemark::new("Old Mill", pt(0.01, 0.0)),
        ]
    }

    fn session(
        provider: FakeProvider,
        camera: Option<CameraPose>,
    ) -> (
        SightSession<FakeProvider, RecordingSensors, MemoryArSession>,
        RecordingSensors,
    ) {
        let sensors = RecordingSensors::default();
        let session = SightSession::new(
            Arc::new(provider),
            sensors.clone(),
            MemoryArSession::new(camera),
            &SessionConfig::default(),
        );
        (session, sensors)
    }

    async fn next_event(rx: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for session event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_full_cycle_places_anchors() {
        let (session, sensors) = session(
            FakeProvider {
                placemarks: sights(),
                fail: false,
            },
            Some(CameraPose::identity()),
        );
        let mut events = session.subscribe();
        let directory = session.directory();
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(session.run(rx));

        tx.send(HostEvent::AuthorizationChanged(AuthorizationStatus::AuthorizedWhenInUse))
            .await
            .unwrap();
        tx.send(HostEvent::LocationUpdated(vec![pt(0.0, 0.0)]))
            .await
            .unwrap();

        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::FetchStarted {
                generation: 1,
                at: pt(0.0, 0.0)
            }
        );
        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::PlacemarksReceived {
                generation: 1,
                count: 2
            }
        );

        for heading in [10.0, 20.0, 30.0] {
            tx.send(HostEvent::HeadingUpdated(HeadingSample::magnetic(heading)))
                .await
                .unwrap();
        }

        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::HeadingCommitted {
                generation: 1,
                heading: 20.0
            }
        );
        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::PlacementCompleted {
                generation: 1,
                anchors: 2
            }
        );

        let records = directory.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(
            directory.title_for(&records[0].id).await.as_deref(),
            Some("Lighthouse")
        );
        assert_eq!(directory.title_for(&AnchorId::new()).await, None);

        tx.send(HostEvent::Shutdown).await.unwrap();
        let ar = handle.await.unwrap();
        assert_eq!(ar.anchor_count(), 2);

        assert_eq!(
            sensors.calls(),
            vec![
                SensorCall::RequestLocation,
                SensorCall::StartHeading,
                SensorCall::StopHeading
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_camera_aborts_placement() {
        let (session, _sensors) = session(
            FakeProvider {
                placemarks: sights(),
                fail: false,
            },
            None,
        );
        let mut events = session.subscribe();
        let directory = session.directory();
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(session.run(rx));

        tx.send(HostEvent::LocationUpdated(vec![pt(0.0, 0.0)]))
            .await
            .unwrap();
        next_event(&mut events).await;
        next_event(&mut events).await;

        tx.send(HostEvent::HeadingUpdated(HeadingSample::magnetic(1.0)))
            .await
            .unwrap();
        tx.send(HostEvent::HeadingUpdated(HeadingSample::magnetic(2.0)))
            .await
            .unwrap();

        next_event(&mut events).await;
        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::PlacementAborted {
                generation: 1,
                placed: 0,
                remaining: 2
            }
        );
        assert!(directory.is_empty().await);

        drop(tx);
        let ar = handle.await.unwrap();
        assert_eq!(ar.anchor_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_dropped() {
        let (session, sensors) = session(
            FakeProvider {
                placemarks: sights(),
                fail: true,
            },
            Some(CameraPose::identity()),
        );
        let mut events = session.subscribe();
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(session.run(rx));

        tx.send(HostEvent::LocationUpdated(vec![pt(0.0, 0.0)]))
            .await
            .unwrap();
        next_event(&mut events).await;
        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::FetchFailed {
                generation: 1,
                kind: FailureKind::Network
            }
        );

        tx.send(HostEvent::Shutdown).await.unwrap();
        handle.await.unwrap();
        assert!(!sensors.calls().contains(&SensorCall::StartHeading));
    }

    #[tokio::test]
    async fn test_newer_fix_supersedes_in_flight_fetch() {
        let (session, _sensors) = session(
            FakeProvider {
                placemarks: sights(),
                fail: false,
            },
            Some(CameraPose::identity()),
        );
        let mut events = session.subscribe();
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(session.run(rx));

        // No fix: ignored. The slow northern fix never completes.
        tx.send(HostEvent::LocationUpdated(Vec::new())).await.unwrap();
        tx.send(HostEvent::LocationUpdated(vec![pt(0.0, 0.0), pt(50.0, 0.0)]))
            .await
            .unwrap();
        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::FetchStarted {
                generation: 1,
                at: pt(50.0, 0.0)
            }
        );

        tx.send(HostEvent::LocationUpdated(vec![pt(1.0, 1.0)]))
            .await
            .unwrap();
        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::FetchStarted {
                generation: 2,
                at: pt(1.0, 1.0)
            }
        );
        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::PlacemarksReceived {
                generation: 2,
                count: 2
            }
        );

        tx.send(HostEvent::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_fetch_result_is_discarded() {
        let (mut session, sensors) = session(
            FakeProvider {
                placemarks: sights(),
                fail: false,
            },
            Some(CameraPose::identity()),
        );
        session.generation = 3;

        session.handle_fetch_outcome(FetchOutcome {
            generation: 2,
            result: Ok(sights()),
        });
        assert!(session.pending.is_none());
        assert!(!session.stabilizer.is_subscribed());
        assert!(sensors.calls().is_empty());

        session.handle_fetch_outcome(FetchOutcome {
            generation: 3,
            result: Ok(sights()),
        });
        assert_eq!(session.pending.as_ref().map(Vec::len), Some(2));
        assert!(session.stabilizer.is_subscribed());
    }

    #[tokio::test]
    async fn test_new_fix_restarts_heading_stabilization() {
        let (mut session, sensors) = session(
            FakeProvider {
                placemarks: sights(),
                fail: false,
            },
            Some(CameraPose::identity()),
        );
        session.generation = 1;
        session.user = Some(pt(0.0, 0.0));
        session.handle_fetch_outcome(FetchOutcome {
            generation: 1,
            result: Ok(sights()),
        });
        session
            .handle_heading(HeadingSample::magnetic(10.0))
            .await;

        session.start_cycle(pt(2.0, 2.0));
        assert_eq!(session.generation, 2);
        assert!(session.pending.is_none());
        assert!(!session.stabilizer.is_subscribed());
        assert_eq!(
            sensors.calls(),
            vec![SensorCall::StartHeading, SensorCall::StopHeading]
        );
        session.cancel_fetch();
    }
}
