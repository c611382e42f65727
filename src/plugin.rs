use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::DeferConfig;
use crate::host::{AnalyticsHost, HostHandle};
use crate::kernel::event::{CallPayload, EnablePayload, InteractionKind, OperationKind};
use crate::kernel::intercept::{intercept, InterceptOutcome};
use crate::kernel::latch::EnablementLatch;
use crate::kernel::queue::DeferralQueue;
use crate::kernel::release::InteractionRelease;
use crate::kernel::replay::{ReadySignal, ReplayJob, Replayer};
use crate::kernel::telemetry::event::DeferTelemetryEvent;
use crate::kernel::telemetry::metrics::TelemetrySnapshot;
use crate::kernel::telemetry::recorder::TelemetryHandle;
use crate::page::PageEnvironment;

/// Hook surface registered with the host runtime.
///
/// Holds page/track/identify calls for the configured plugins until the
/// visitor interacts with the page or the host enables those plugins, then
/// replays each plugin's calls in their original order.
///
/// The release listener and replays run on tokio tasks, so
/// `on_initialize_complete` and `on_plugins_enabled` must be called from
/// within a tokio runtime. Outside one they log a warning and do nothing:
/// no listener is registered and the queue is left untouched.
pub struct DeferPlugin {
    config: DeferConfig,
    queue: DeferralQueue,
    latch: EnablementLatch,
    release: Option<InteractionRelease>,
    replayer: Replayer,
    telemetry: TelemetryHandle,
}

impl DeferPlugin {
    pub const NAME: &'static str = "defer-plugin";

    pub fn new(config: DeferConfig) -> Self {
        let telemetry = TelemetryHandle::new();
        Self {
            config,
            queue: DeferralQueue::new(),
            latch: EnablementLatch::new(),
            release: None,
            replayer: Replayer::new(None, telemetry.clone()),
            telemetry,
        }
    }

    /// Replays wait for the host's readiness announcement instead of the
    /// fixed delay.
    pub fn with_ready_signal(mut self, signal: ReadySignal) -> Self {
        self.replayer = Replayer::new(Some(signal), self.telemetry.clone());
        self
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn plugins(&self) -> &[String] {
        &self.config.plugins
    }

    /// No async setup is needed.
    pub fn on_ready(&self) -> bool {
        true
    }

    /// Starts listening for the first page interaction. Returns whether a
    /// listener is active; without a document only explicit enablement can
    /// release the queue.
    pub fn on_initialize_complete(&mut self, host: &HostHandle, page: &dyn PageEnvironment) -> bool {
        if self.release.is_some() {
            debug!("Interaction release already set up");
            return true;
        }

        if Handle::try_current().is_err() {
            warn!("No tokio runtime, interaction release disabled");
            return false;
        }

        let Some(subscription) = page.listen(&InteractionKind::ALL) else {
            info!("No page context, interaction release disabled");
            return false;
        };

        self.release = Some(InteractionRelease::spawn(
            subscription,
            self.latch.clone(),
            host.clone(),
            self.config.plugins.clone(),
            self.telemetry.clone(),
        ));
        true
    }

    pub fn on_page_start(&mut self, payload: &CallPayload, host: &dyn AnalyticsHost) -> InterceptOutcome {
        self.intercept(OperationKind::Page, payload, host)
    }

    pub fn on_track_start(&mut self, payload: &CallPayload, host: &dyn AnalyticsHost) -> InterceptOutcome {
        self.intercept(OperationKind::Track, payload, host)
    }

    pub fn on_identify_start(&mut self, payload: &CallPayload, host: &dyn AnalyticsHost) -> InterceptOutcome {
        self.intercept(OperationKind::Identify, payload, host)
    }

    fn intercept(&mut self, kind: OperationKind, payload: &CallPayload, host: &dyn AnalyticsHost) -> InterceptOutcome {
        intercept(kind, payload, &self.config.plugins, host, &mut self.queue, &self.telemetry)
    }

    /// Drains the records of each plugin being enabled and schedules their
    /// replay. Removal happens here, before any wait, so a second notification
    /// for the same plugin finds nothing to replay.
    pub fn on_plugins_enabled(&mut self, payload: &EnablePayload, host: &HostHandle) -> Vec<ReplayJob> {
        let mut jobs = Vec::new();

        // Keep the records queued so a later notification can still release them
        if Handle::try_current().is_err() {
            warn!(plugins = ?payload.plugins, "No tokio runtime, replay postponed");
            return jobs;
        }

        for plugin in &payload.plugins {
            let records = self.queue.drain_for(plugin);
            if records.is_empty() {
                debug!(plugin = %plugin, "Nothing deferred for enabled plugin");
                continue;
            }

            info!(plugin = %plugin, count = records.len(), "Draining deferred calls");
            self.telemetry.record(DeferTelemetryEvent::Drained {
                plugin: plugin.clone(),
                count: records.len(),
            });
            jobs.push(self.replayer.schedule(plugin.clone(), records, host.clone()));
        }

        jobs
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_for(&self, plugin: &str) -> usize {
        self.queue.pending_for(plugin)
    }

    pub fn queue(&self) -> &DeferralQueue {
        &self.queue
    }

    /// Whether the interaction listener is still waiting for a first interaction.
    pub fn is_listening(&self) -> bool {
        self.release.as_ref().map_or(false, |release| !release.is_finished())
    }

    /// Whether the interaction path has already requested the bulk enable.
    pub fn interaction_released(&self) -> bool {
        self.latch.is_fired()
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    pub fn telemetry_events(&self) -> Vec<DeferTelemetryEvent> {
        self.telemetry.events()
    }

    /// Stops the interaction listener. Replays already scheduled still run.
    pub fn shutdown(&mut self) {
        if let Some(release) = self.release.take() {
            release.cancel();
        }
    }
}
