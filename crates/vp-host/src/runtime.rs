//! Event-driven host runtime around one [`Controller`].
//!
//! The controller is single-threaded by construction; the runtime enforces
//! that by owning it behind an mpsc event queue and processing events one at
//! a time. Sensor updates, user commands and the boost expiry timer all
//! arrive as [`HostEvent`]s, and every handled event runs a control tick so
//! the loop reacts immediately instead of waiting for a poll cycle.

use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use vp_control::{
    Controller, Diagnostics, ModeRequest, SendPlan, VALVE_CLOSED_POSITION, virtual_setpoint_c,
};
use vp_core::{ActuatorId, MonotonicClock};

use crate::transport::{ValveCall, ValveTransport};

const EVENT_QUEUE_DEPTH: usize = 32;

/// The runtime's event loop has stopped and can no longer accept commands.
#[derive(Debug, Error)]
#[error("controller runtime is no longer running")]
pub struct RuntimeClosed;

/// Everything that can wake the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    RoomTemperature(Option<f64>),
    FlowTemperature(Option<f64>),
    OutdoorTemperature(Option<f64>),
    SetTarget(Option<f64>),
    SetMode(ModeRequest),
    /// Fired by the boost timer task; stale generations are ignored.
    BoostExpired { generation: u64 },
    Shutdown,
}

/// Cloneable command/query surface for a running [`ControllerRuntime`].
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<HostEvent>,
    diag_rx: watch::Receiver<Diagnostics>,
}

impl ControllerHandle {
    pub async fn room_temperature(&self, reading_c: Option<f64>) -> Result<(), RuntimeClosed> {
        self.send(HostEvent::RoomTemperature(reading_c)).await
    }

    pub async fn flow_temperature(&self, reading_c: Option<f64>) -> Result<(), RuntimeClosed> {
        self.send(HostEvent::FlowTemperature(reading_c)).await
    }

    pub async fn outdoor_temperature(&self, reading_c: Option<f64>) -> Result<(), RuntimeClosed> {
        self.send(HostEvent::OutdoorTemperature(reading_c)).await
    }

    pub async fn set_target(&self, target_c: Option<f64>) -> Result<(), RuntimeClosed> {
        self.send(HostEvent::SetTarget(target_c)).await
    }

    pub async fn set_mode(&self, request: ModeRequest) -> Result<(), RuntimeClosed> {
        self.send(HostEvent::SetMode(request)).await
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeClosed> {
        self.send(HostEvent::Shutdown).await
    }

    /// Latest per-tick diagnostics snapshot.
    pub fn diagnostics(&self) -> Diagnostics {
        self.diag_rx.borrow().clone()
    }

    /// Watch side of the diagnostics stream, for callers that want to await
    /// changes instead of polling.
    pub fn diagnostics_watch(&self) -> watch::Receiver<Diagnostics> {
        self.diag_rx.clone()
    }

    async fn send(&self, event: HostEvent) -> Result<(), RuntimeClosed> {
        self.tx.send(event).await.map_err(|_| RuntimeClosed)
    }
}

/// Owns the controller, the transport and the boost timer.
pub struct ControllerRuntime<T> {
    controller: Controller,
    transport: T,
    clock: MonotonicClock,
    rx: mpsc::Receiver<HostEvent>,
    tx: mpsc::Sender<HostEvent>,
    diag_tx: watch::Sender<Diagnostics>,
    boost_generation: u64,
    boost_timer: Option<JoinHandle<()>>,
}

impl<T: ValveTransport> ControllerRuntime<T> {
    pub fn new(controller: Controller, transport: T) -> (Self, ControllerHandle) {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (diag_tx, diag_rx) = watch::channel(controller.diagnostics().clone());
        let handle = ControllerHandle {
            tx: tx.clone(),
            diag_rx,
        };
        let runtime = Self {
            controller,
            transport,
            clock: MonotonicClock::new(),
            rx,
            tx,
            diag_tx,
            boost_generation: 0,
            boost_timer: None,
        };
        (runtime, handle)
    }

    /// Process events until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            if !self.handle_event(event).await {
                break;
            }
        }
        self.cancel_boost_timer();
    }

    /// Handle one event; returns false on shutdown.
    async fn handle_event(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::RoomTemperature(reading) => {
                self.controller.update_room_temperature(reading);
                self.tick().await;
            }
            HostEvent::FlowTemperature(reading) => {
                self.controller.update_flow_temperature(reading);
                self.tick().await;
            }
            HostEvent::OutdoorTemperature(reading) => {
                self.controller.update_outdoor_temperature(reading);
                self.tick().await;
            }
            HostEvent::SetTarget(target) => {
                if self.controller.set_target_temperature(target) {
                    self.tick().await;
                }
            }
            HostEvent::SetMode(request) => {
                self.cancel_boost_timer();
                let change = self.controller.set_mode(request, self.clock.now_s());
                if let Some(plan) = change.plan {
                    self.execute(plan).await;
                }
                if let Some(until_s) = change.boost_until_s {
                    self.schedule_boost_timer(until_s);
                }
                self.tick().await;
            }
            HostEvent::BoostExpired { generation } => {
                if generation != self.boost_generation {
                    debug!(generation, "ignoring stale boost timer");
                } else {
                    self.tick().await;
                }
            }
            HostEvent::Shutdown => return false,
        }
        true
    }

    /// Run one control tick, execute its plan and refresh observed state.
    async fn tick(&mut self) {
        let effect = self.controller.tick(self.clock.now_s());
        if let Some(plan) = effect.plan {
            self.execute(plan).await;
        }
        self.refresh_observed().await;
        if effect.boost_expired {
            // The controller already reverted to auto; run the first normal
            // tick right away instead of waiting for the next sensor event.
            self.cancel_boost_timer();
            let effect = self.controller.tick(self.clock.now_s());
            if let Some(plan) = effect.plan {
                self.execute(plan).await;
            }
        }
        let _ = self.diag_tx.send(self.controller.diagnostics().clone());
    }

    /// Execute a send plan, one actuator at a time. A failing actuator is
    /// logged and skipped; reconciliation retries it on a later tick.
    async fn execute(&mut self, plan: SendPlan) {
        for id in &plan.actuators {
            let call = if self.transport.has_direct_position(id) {
                ValveCall::SetPosition {
                    position: plan.position,
                }
            } else if plan.position == VALVE_CLOSED_POSITION {
                ValveCall::TurnOff
            } else {
                let config = self.controller.config();
                ValveCall::HeatTo {
                    setpoint_c: virtual_setpoint_c(
                        config.min_temp_c,
                        config.max_temp_c,
                        plan.position,
                    ),
                }
            };
            if let Err(err) = self.transport.send(id, call).await {
                warn!(actuator = %id, error = %err, "valve command failed");
            }
        }
    }

    async fn refresh_observed(&mut self) {
        let ids: Vec<ActuatorId> = self.controller.actuator_ids().to_vec();
        let mut readings = BTreeMap::new();
        for id in ids {
            if let Some(position) = self.transport.observed_position(&id).await {
                readings.insert(id, position);
            }
        }
        self.controller.record_observed(readings);
    }

    fn schedule_boost_timer(&mut self, until_s: f64) {
        let generation = self.boost_generation;
        let delay_s = (until_s - self.clock.now_s()).max(0.0);
        let tx = self.tx.clone();
        self.boost_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs_f64(delay_s)).await;
            let _ = tx.send(HostEvent::BoostExpired { generation }).await;
        }));
    }

    /// Invalidate any pending boost timer. Bumping the generation makes an
    /// already-fired timer event a no-op.
    fn cancel_boost_timer(&mut self) {
        self.boost_generation += 1;
        if let Some(timer) = self.boost_timer.take() {
            timer.abort();
        }
    }
}
