//! Simulated speaker: the whole control surface on the host.
//!
//! Runs the scheduler against in-memory collaborators and scripts a short
//! session: the host mounts the device and opens the 24-bit stream, mutes and
//! unmutes it, the encoder turns down, a few audio packets flow, and finally
//! a `multiverse:_rst` on the serial port reboots the "device".
//!
//! ```text
//!   ScriptedHost ──► Speaker ──► SoftwareDac (dsp::scale_pcm)
//!   Encoder ────────┘    └─────► ConsoleLed
//!   Cdc ─────────────────┘
//! ```
//!
//! Every host action reaches the core as a transport event taken by
//! `Speaker::poll`. Run with `RUST_LOG=debug cargo run --bin
//! simulated_speaker` to see the core's own log lines as well.

use std::cell::Cell;
use std::collections::VecDeque;

use uac2_speaker::command::SerialPort;
use uac2_speaker::config::SpeakerConfig;
use uac2_speaker::constants::*;
use uac2_speaker::dsp::scale_pcm;
use uac2_speaker::error::RebootMode;
use uac2_speaker::gate::{AudioBlock, AudioSink};
use uac2_speaker::input::LocalInput;
use uac2_speaker::notify::InterruptNotification;
use uac2_speaker::request::ControlRequest;
use uac2_speaker::speaker::{Board, Speaker};
use uac2_speaker::status::RgbIndicator;
use uac2_speaker::transport::{Platform, Transport, UsbEvent};

// ── Collaborators ──

/// What the scripted host does next, in owned form.
enum HostAction {
    Mount,
    SetInterface(u8),
    Get { b_request: u8, selector: u8, entity: u8 },
    Set { selector: u8, payload: Vec<u8> },
    Packet(Vec<u8>),
}

#[derive(Default)]
struct ScriptedHost {
    mounted: bool,
    alt: u8,
    script: VecDeque<HostAction>,
    current: Option<HostAction>,
}

impl ScriptedHost {
    fn queue(&mut self, action: HostAction) {
        self.script.push_back(action);
    }
}

fn setup(w_value_hi: u8, entity: u8) -> (u16, u16) {
    ((w_value_hi as u16) << 8, (entity as u16) << 8)
}

impl Transport for ScriptedHost {
    fn answer(&mut self, request: &ControlRequest, payload: &[u8]) -> bool {
        if payload.is_empty() {
            println!("  host <- ack selector {}", request.selector);
        } else {
            println!(
                "  host <- GET entity {:#04x} selector {} ch {}: {:02x?}",
                request.entity_id, request.selector, request.channel, payload
            );
        }
        true
    }

    fn stall(&mut self) {
        println!("  host <- stall");
    }

    fn deliver_interrupt(&mut self, notification: &InterruptNotification) {
        println!("  host <- interrupt {:02x?}", notification.to_bytes());
    }

    fn poll_once(&mut self) {}

    fn next_event(&mut self) -> Option<UsbEvent<'_>> {
        self.current = self.script.pop_front();
        let event = match self.current.as_ref()? {
            HostAction::Mount => {
                self.mounted = true;
                UsbEvent::Mount
            }
            HostAction::SetInterface(alt) => {
                self.alt = *alt;
                UsbEvent::SetInterface {
                    interface: ITF_NUM_AUDIO_STREAMING_SPK,
                    alt: *alt,
                }
            }
            HostAction::Get { b_request, selector, entity } => {
                let (w_value, w_index) = setup(*selector, *entity);
                UsbEvent::GetEntity(ControlRequest::from_setup(*b_request, w_value, w_index, &[]))
            }
            HostAction::Set { selector, payload } => {
                println!("  host -> SET selector {} {:02x?}", selector, payload);
                let (w_value, w_index) = setup(*selector, ENTITY_SPK_FEATURE_UNIT);
                UsbEvent::SetEntity(ControlRequest::from_setup(REQ_CUR, w_value, w_index, payload))
            }
            HostAction::Packet(bytes) => UsbEvent::AudioReceived(bytes),
        };
        Some(event)
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn is_suspended(&self) -> bool {
        false
    }

    fn alt_setting(&self, interface: u8) -> u8 {
        if interface == ITF_NUM_AUDIO_STREAMING_SPK {
            self.alt
        } else {
            0
        }
    }
}

#[derive(Default)]
struct Encoder {
    detents: i32,
    press: bool,
}

impl LocalInput for Encoder {
    fn take_volume_delta(&mut self) -> i32 {
        std::mem::take(&mut self.detents)
    }

    fn button_held(&mut self) -> bool {
        false
    }

    fn button_pressed(&mut self) -> bool {
        std::mem::take(&mut self.press)
    }
}

/// Scales in software and reports the peak of each packet.
struct SoftwareDac;

impl AudioSink for SoftwareDac {
    fn give_buffer(&mut self, block: &AudioBlock, gain: u8) {
        let mut out = block.clone();
        let subslot = out.subslot_size();
        scale_pcm(out.as_bytes_mut(), subslot, gain);
        let peak = out
            .as_bytes()
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]).unsigned_abs())
            .max()
            .unwrap_or(0);
        println!("  dac: {} bytes, {} bit, gain {:3}, peak {:#010x}", out.len(), out.resolution(), gain, peak);
    }
}

#[derive(Default)]
struct ConsoleLed {
    last: Option<(u8, u8, u8)>,
}

impl RgbIndicator for ConsoleLed {
    type Error = std::convert::Infallible;

    fn set_rgb(&mut self, red: u8, green: u8, blue: u8) -> Result<(), Self::Error> {
        if self.last != Some((red, green, blue)) {
            println!("  led: r {:3} g {:3} b {:3}", red, green, blue);
            self.last = Some((red, green, blue));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Cdc {
    rx: VecDeque<u8>,
}

impl SerialPort for Cdc {
    fn connected(&self) -> bool {
        true
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        while n < buf.len() {
            match self.rx.pop_front() {
                Some(b) => buf[n] = b,
                None => break,
            }
            n += 1;
        }
        n
    }
}

/// Fake clock, one millisecond per loop iteration.
struct SimPlatform {
    now: Cell<u32>,
}

impl Platform for SimPlatform {
    fn now_ms(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(1));
        now
    }

    fn reboot(&mut self, mode: RebootMode) -> ! {
        println!("platform: reboot ({:?}) at {} ms", mode, self.now.get());
        std::process::exit(0);
    }
}

// ── Script ──

type Sim = Speaker<ScriptedHost, Encoder, SoftwareDac, ConsoleLed, Cdc>;

fn get(b_request: u8, selector: u8, entity: u8) -> HostAction {
    HostAction::Get { b_request, selector, entity }
}

fn set(selector: u8, payload: &[u8]) -> HostAction {
    HostAction::Set { selector, payload: payload.to_vec() }
}

/// A 24-bit stereo packet (1 ms at 48 kHz) with a full-scale first sample.
fn packet() -> Vec<u8> {
    let mut bytes = vec![0u8; 48 * N_CHANNELS_RX * 4];
    bytes[0..4].copy_from_slice(&0x007F_FF00i32.to_le_bytes());
    bytes
}

fn run_for(speaker: &mut Sim, now: &mut u32, ms: u32) {
    for _ in 0..ms {
        if let Err(e) = speaker.poll(*now) {
            println!("  poll: {}", e);
        }
        *now += 1;
    }
}

fn main() {
    env_logger::init();
    log::info!("Simulated speaker starting");

    let board = Board {
        transport: ScriptedHost::default(),
        input: Encoder::default(),
        sink: SoftwareDac,
        led: ConsoleLed::default(),
        serial: Cdc::default(),
    };
    let mut speaker: Sim = Speaker::new(SpeakerConfig::new().with_initial_system_volume(200), board);
    let mut now = 0u32;

    println!("-- enumerate");
    let host = &mut speaker.board_mut().transport;
    host.queue(HostAction::Mount);
    host.queue(get(REQ_RANGE, CS_SAM_FREQ, ENTITY_CLOCK));
    host.queue(get(REQ_CUR, CS_CLK_VALID, ENTITY_CLOCK));
    host.queue(get(REQ_RANGE, FU_VOLUME, ENTITY_SPK_FEATURE_UNIT));
    host.queue(get(REQ_CUR, FU_VOLUME, ENTITY_SPK_FEATURE_UNIT));
    run_for(&mut speaker, &mut now, 1);

    println!("-- open 24-bit stream");
    speaker.board_mut().transport.queue(HostAction::SetInterface(2));
    for _ in 0..2 {
        speaker.board_mut().transport.queue(HostAction::Packet(packet()));
        run_for(&mut speaker, &mut now, 1);
    }

    println!("-- host mutes");
    let host = &mut speaker.board_mut().transport;
    host.queue(set(FU_MUTE, &[1]));
    host.queue(get(REQ_CUR, FU_MUTE, ENTITY_SPK_FEATURE_UNIT));
    host.queue(HostAction::Packet(packet()));
    run_for(&mut speaker, &mut now, 1);

    println!("-- local button unmutes");
    speaker.board_mut().input.press = true;
    run_for(&mut speaker, &mut now, 60);

    println!("-- encoder turns down 8 detents");
    speaker.board_mut().input.detents = -8;
    run_for(&mut speaker, &mut now, 60);
    println!("  knob {}", speaker.state().system_volume());
    let host = &mut speaker.board_mut().transport;
    host.queue(get(REQ_CUR, FU_VOLUME, ENTITY_SPK_FEATURE_UNIT));
    host.queue(HostAction::Packet(packet()));
    run_for(&mut speaker, &mut now, 1);

    println!("-- malformed SET");
    speaker.board_mut().transport.queue(set(FU_VOLUME, &[0x00]));
    run_for(&mut speaker, &mut now, 1);

    println!("-- serial reset command");
    speaker.board_mut().serial.rx.extend(b"multiverse:_rst");
    let mut platform = SimPlatform { now: Cell::new(now) };
    speaker.run(&mut platform);
}
