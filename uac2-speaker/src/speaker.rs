//! Cooperative scheduler.
//!
//! [`Speaker`] owns the control state and every component, and runs them
//! from one loop in a fixed order:
//!
//! ```text
//! poll_once ─► dispatch events ─► audio gate ─► command channel
//!     ─► input reconciler (50 ms) ─► drain outbox (deliver + poll_once
//!     per message) ─► status LED
//! ```
//!
//! Host requests and bus events are taken from the transport with
//! [`Transport::next_event`] right after it runs, and answered before the
//! next one is taken. Everything runs on one thread with no preemption, so
//! [`DeviceControlState`] needs no lock. Running any of this from an
//! interrupt handler would need one.

use crate::command::{CommandChannel, SerialPort};
use crate::config::SpeakerConfig;
use crate::constants::{ITF_NUM_AUDIO_STREAMING_SPK, RESOLUTIONS_PER_FORMAT};
use crate::error::ControlError;
use crate::gate::{resolution_for_alt, AudioBlock, AudioGate, AudioSink};
use crate::handler;
use crate::input::{self, InputReconciler, LocalInput};
use crate::notify::Outbox;
use crate::request::{ControlRequest, Response};
use crate::state::DeviceControlState;
use crate::status::{BusState, RgbIndicator, StatusIndicator};
use crate::transport::{Platform, Transport, UsbEvent};

/// Outbox slots; one fewer notification fits.
pub const OUTBOX_SLOTS: usize = 8;

/// Transport events handled per loop iteration. The rest wait for the next.
pub const MAX_EVENTS_PER_POLL: usize = 16;

/// The collaborators a [`Speaker`] drives.
pub struct Board<T, I, S, L, P> {
    pub transport: T,
    pub input: I,
    pub sink: S,
    pub led: L,
    pub serial: P,
}

/// What transport events touch. Kept apart from [`Board`] so an event
/// borrowed from the transport can be handled in place.
struct Core {
    state: DeviceControlState,
    outbox: Outbox<OUTBOX_SLOTS>,
    status: StatusIndicator,
    /// Received but not yet forwarded. At most one.
    pending: Option<AudioBlock>,
    /// Bit resolution of the active streaming alt setting.
    resolution: u8,
    streaming: bool,
}

impl Core {
    fn get(&self, request: &ControlRequest) -> Option<Response> {
        handler::get_entity(&self.state, request)
            .map_err(|e| log::warn!("GET rejected: {}", e))
            .ok()
    }

    fn set(&mut self, request: &ControlRequest) -> bool {
        match handler::set_entity(&mut self.state, request) {
            Ok(notification) => {
                if let Some(notification) = notification {
                    input::queue(&mut self.outbox, notification);
                }
                true
            }
            Err(e) => {
                log::warn!("SET rejected: {}", e);
                false
            }
        }
    }

    fn set_interface(&mut self, interface: u8, alt: u8) -> Result<(), ControlError> {
        if interface != ITF_NUM_AUDIO_STREAMING_SPK {
            return Ok(());
        }

        if alt == 0 {
            if self.pending.take().is_some() {
                log::debug!("Alt setting changed, dropping pending block");
            }
            log::info!("Speaker stream closed");
            self.streaming = false;
            self.status.set_bus_state(BusState::Mounted);
            return Ok(());
        }

        let resolution = resolution_for_alt(alt).ok_or(ControlError::Validation {
            what: "alt setting",
            expected: RESOLUTIONS_PER_FORMAT.len(),
            actual: alt as usize,
        })?;
        if self.pending.take().is_some() {
            log::debug!("Alt setting changed, dropping pending block");
        }
        log::info!("Speaker stream open, alt {} ({} bit)", alt, resolution);
        self.resolution = resolution;
        self.streaming = true;
        self.status.set_bus_state(BusState::Streaming);
        Ok(())
    }

    fn audio_received(&mut self, bytes: &[u8]) -> Result<(), ControlError> {
        let block = AudioBlock::from_bytes(bytes, self.resolution)?;
        if self.pending.replace(block).is_some() {
            log::warn!("Audio block overwritten before it was forwarded");
        }
        Ok(())
    }

    fn mount(&mut self) {
        log::info!("Mounted");
        self.status.set_bus_state(BusState::Mounted);
    }

    fn unmount(&mut self) {
        log::info!("Unmounted");
        self.streaming = false;
        self.pending = None;
        self.status.set_bus_state(BusState::NotMounted);
    }

    fn suspend(&mut self) {
        log::info!("Suspended");
        self.status.set_bus_state(BusState::Suspended);
    }

    fn resume(&mut self) {
        log::info!("Resumed");
        let bus = if self.streaming {
            BusState::Streaming
        } else {
            BusState::Mounted
        };
        self.status.set_bus_state(bus);
    }
}

/// The speaker control surface: control state, audio gate, local input,
/// status LED and serial commands, serviced by one cooperative loop.
pub struct Speaker<T, I, S, L, P> {
    board: Board<T, I, S, L, P>,
    core: Core,
    reconciler: InputReconciler,
    gate: AudioGate,
    command: CommandChannel,
}

impl<T, I, S, L, P> Speaker<T, I, S, L, P>
where
    T: Transport,
    I: LocalInput,
    S: AudioSink,
    L: RgbIndicator,
    P: SerialPort,
{
    /// Build the core. Bus state and resolution start from whatever the
    /// transport reports.
    pub fn new(config: SpeakerConfig, board: Board<T, I, S, L, P>) -> Self {
        let mut speaker = Speaker {
            board,
            core: Core {
                state: DeviceControlState::new(&config),
                outbox: Outbox::new(),
                status: StatusIndicator::new(&config),
                pending: None,
                resolution: RESOLUTIONS_PER_FORMAT[0],
                streaming: false,
            },
            reconciler: InputReconciler::new(&config),
            gate: AudioGate::new(),
            command: CommandChannel::new(&config),
        };
        speaker.sync_bus_state();
        speaker
    }

    /// Re-derive bus state and resolution from the transport queries.
    pub fn sync_bus_state(&mut self) {
        let transport = &self.board.transport;
        let core = &mut self.core;
        let alt = transport.alt_setting(ITF_NUM_AUDIO_STREAMING_SPK);
        if let Some(resolution) = resolution_for_alt(alt) {
            core.resolution = resolution;
        }
        core.streaming = transport.is_mounted() && alt != 0;
        let bus = if !transport.is_mounted() {
            BusState::NotMounted
        } else if transport.is_suspended() {
            BusState::Suspended
        } else if core.streaming {
            BusState::Streaming
        } else {
            BusState::Mounted
        };
        core.status.set_bus_state(bus);
    }

    pub fn state(&self) -> &DeviceControlState {
        &self.core.state
    }

    pub fn board(&self) -> &Board<T, I, S, L, P> {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board<T, I, S, L, P> {
        &mut self.board
    }

    pub fn bus_state(&self) -> BusState {
        self.core.status.bus_state()
    }

    pub fn resolution(&self) -> u8 {
        self.core.resolution
    }

    pub fn has_pending_block(&self) -> bool {
        self.core.pending.is_some()
    }

    /// Notifications waiting for the next drain.
    pub fn queued_notifications(&self) -> usize {
        self.core.outbox.len()
    }

    pub fn blocks_forwarded(&self) -> u32 {
        self.gate.forwarded()
    }

    // ---------------------------------------------------------------
    // Push-style callbacks
    // ---------------------------------------------------------------

    /// Class-specific GET addressed to an entity. `false` stalls the request.
    pub fn on_get_entity_request(&mut self, request: &ControlRequest) -> bool {
        match self.core.get(request) {
            Some(response) => self.board.transport.answer(request, response.as_bytes()),
            None => false,
        }
    }

    /// Class-specific SET addressed to an entity. `false` stalls the request.
    pub fn on_set_entity_request(&mut self, request: &ControlRequest) -> bool {
        self.core.set(request)
    }

    /// SET_INTERFACE. Only the speaker streaming interface matters here; an
    /// unknown alt setting is rejected before anything changes.
    pub fn on_alt_setting_changed(&mut self, interface: u8, alt: u8) -> Result<(), ControlError> {
        self.core.set_interface(interface, alt)
    }

    /// A speaker packet arrived. It is forwarded on the next [`poll`](Self::poll).
    pub fn on_audio_block_received(&mut self, bytes: &[u8]) -> Result<(), ControlError> {
        self.core.audio_received(bytes)
    }

    pub fn on_mount(&mut self) {
        self.core.mount();
    }

    pub fn on_unmount(&mut self) {
        self.core.unmount();
    }

    pub fn on_suspend(&mut self) {
        self.core.suspend();
    }

    pub fn on_resume(&mut self) {
        self.core.resume();
    }

    // ---------------------------------------------------------------
    // Loop
    // ---------------------------------------------------------------

    /// One loop iteration.
    ///
    /// Only [`ControlError::FatalReset`] escapes; the caller must reboot.
    pub fn poll(&mut self, now_ms: u32) -> Result<(), ControlError> {
        self.board.transport.poll_once();
        self.dispatch_events();

        if let Some(block) = self.core.pending.take() {
            self.gate.process(block, &self.core.state, &mut self.board.sink);
        }

        match self.command.poll(now_ms, &mut self.board.serial) {
            Ok(()) | Err(ControlError::Timeout) => {}
            Err(e) => return Err(e),
        }

        self.reconciler.poll(
            now_ms,
            &mut self.board.input,
            &mut self.core.state,
            &mut self.core.outbox,
        )?;

        self.flush_notifications();

        if self
            .core
            .status
            .poll(now_ms, &self.core.state, &mut self.board.led)
            .is_err()
        {
            log::warn!("Status LED write failed");
        }

        Ok(())
    }

    /// Handle what the transport produced this iteration. Control requests
    /// are completed before the next event is taken.
    fn dispatch_events(&mut self) {
        for _ in 0..MAX_EVENTS_PER_POLL {
            let Some(event) = self.board.transport.next_event() else {
                return;
            };
            match event {
                UsbEvent::Mount => self.core.mount(),
                UsbEvent::Unmount => self.core.unmount(),
                UsbEvent::Suspend => self.core.suspend(),
                UsbEvent::Resume => self.core.resume(),
                UsbEvent::SetInterface { interface, alt } => {
                    if let Err(e) = self.core.set_interface(interface, alt) {
                        log::warn!("SET_INTERFACE rejected: {}", e);
                    }
                }
                UsbEvent::AudioReceived(bytes) => {
                    if let Err(e) = self.core.audio_received(bytes) {
                        log::warn!("Audio packet dropped: {}", e);
                    }
                }
                UsbEvent::GetEntity(request) => {
                    let header = request.header();
                    match self.core.get(&request) {
                        Some(response) => {
                            if !self.board.transport.answer(&header, response.as_bytes()) {
                                log::warn!("GET answer refused by the stack");
                            }
                        }
                        None => self.board.transport.stall(),
                    }
                }
                UsbEvent::SetEntity(request) => {
                    let header = request.header();
                    if self.core.set(&request) {
                        if !self.board.transport.answer(&header, &[]) {
                            log::warn!("SET status stage refused by the stack");
                        }
                    } else {
                        self.board.transport.stall();
                    }
                }
            }
        }
        log::debug!("Event budget spent, rest waits for the next iteration");
    }

    /// Hand every queued notification to the transport, pumping it after
    /// each so the message goes out while the host is polling.
    fn flush_notifications(&mut self) {
        while let Some(notification) = self.core.outbox.pop() {
            log::debug!("Notify {:?}", notification);
            self.board.transport.deliver_interrupt(&notification);
            self.board.transport.poll_once();
        }
    }

    /// Loop forever, rebooting through `platform` when asked to.
    pub fn run<X: Platform>(mut self, platform: &mut X) -> ! {
        loop {
            match self.poll(platform.now_ms()) {
                Ok(()) => {}
                Err(ControlError::FatalReset(mode)) => platform.reboot(mode),
                Err(e) => log::warn!("Loop error: {}", e),
            }
        }
    }
}
