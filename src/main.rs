//! joy2midi embedded entry point (nRF52840).
//!
//! One cooperative loop drives the whole device: it alternates between
//! servicing inbound USB-MIDI traffic (configuration opcodes and
//! preset selection) and, on a fast tick, sampling the joystick axes
//! and dispatching position transitions through the action engine.
//! Inbound handling always runs to completion before the next sample,
//! so configuration writes are never interleaved with dispatch
//! decisions. Outbound events that cannot be written promptly are
//! dropped - the stick is re-sampled on the next tick and a stale
//! event is not worth delivering.

#![no_std]
#![no_main]

use defmt_rtt as _;
use panic_probe as _;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_nrf::nvmc::Nvmc;
use embassy_nrf::saadc::{self, ChannelConfig, Resolution, Saadc};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_time::{with_timeout, Duration, Ticker};
use embassy_usb::class::midi::Sender;
use embassy_usb::driver::EndpointError;
use embassy_usb::UsbDevice;

use joy2midi::config;
use joy2midi::engine::position::classify_axes;
use joy2midi::engine::Engine;
use joy2midi::error::Error;
use joy2midi::midi::UsbMidiPacket;
use joy2midi::storage::PresetStore;
use joy2midi::usb;

bind_interrupts!(struct AdcIrqs {
    SAADC => saadc::InterruptHandler;
});

type UsbDriver = Driver<'static, peripherals::USBD, HardwareVbusDetect>;

#[embassy_executor::task]
async fn usb_task(device: UsbDevice<'static, UsbDriver>) -> ! {
    usb::run_usb_device(device).await
}

/// Convert a raw 8-bit SAADC conversion to the 0-255 axis range.
/// Single-ended samples can undershoot slightly below zero.
fn axis_sample(raw: i16) -> u8 {
    raw.clamp(0, 255) as u8
}

/// Hand one event to the transport, bounded-wait. No queue exists: a
/// busy endpoint means the event is dropped, by design.
async fn emit(
    sender: &mut Sender<'static, UsbDriver>,
    packet: UsbMidiPacket,
) -> Result<(), Error> {
    let bytes = packet.to_bytes();
    let write = sender.write_packet(&bytes);
    match with_timeout(Duration::from_millis(config::EMIT_TIMEOUT_MS), write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(EndpointError::Disabled | EndpointError::BufferOverflow)) => Err(Error::Usb),
        Err(_) => Err(Error::TransportBusy),
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("joy2midi starting");

    // Joystick axes on AIN0 (vertical) / AIN1 (horizontal), 8-bit.
    let mut saadc_config = saadc::Config::default();
    saadc_config.resolution = Resolution::_8BIT;
    let vertical_channel = ChannelConfig::single_ended(p.P0_02);
    let horizontal_channel = ChannelConfig::single_ended(p.P0_03);
    let mut adc = Saadc::new(
        p.SAADC,
        AdcIrqs,
        saadc_config,
        [vertical_channel, horizontal_channel],
    );

    // Preset area: RAM shadow synced with internal flash.
    let mut flash = embassy_embedded_hal::adapter::BlockingAsync::new(Nvmc::new(p.NVMC));
    let mut store = PresetStore::new();
    store.load_from_flash(&mut flash).await;

    // USB MIDI device.
    let usb_midi = usb::init(p.USBD);
    spawner.must_spawn(usb_task(usb_midi.device));
    let (mut sender, mut receiver) = usb_midi.midi.split();

    receiver.wait_connection().await;
    info!("USB configured - engine running");

    let mut engine = Engine::new();
    let mut ticker = Ticker::every(Duration::from_millis(config::POSITION_POLL_MS));
    let mut rx_buf = [0u8; 64];
    let mut samples = [0i16; 2];

    loop {
        match select(receiver.read_packet(&mut rx_buf), ticker.next()).await {
            // Inbound traffic: run every unit through the engine
            // before anything else happens, then flush config writes.
            Either::First(Ok(n)) => {
                for packet in UsbMidiPacket::units(&rx_buf[..n]) {
                    engine.on_inbound(packet, &mut store);
                }
                if store.is_dirty() {
                    store.save_to_flash(&mut flash).await;
                }
            }
            Either::First(Err(_)) => {
                // Endpoint disabled (suspend/reset): wait for the host.
                receiver.wait_connection().await;
            }
            // Sample tick: one position/dispatch/emit cycle.
            Either::Second(()) => {
                adc.sample(&mut samples).await;
                let position = classify_axes(axis_sample(samples[0]), axis_sample(samples[1]));
                if let Some(packet) = engine.on_position(position) {
                    match emit(&mut sender, packet).await {
                        Ok(()) => {}
                        Err(Error::TransportBusy) => warn!("endpoint busy - event dropped"),
                        Err(_) => warn!("USB write failed - event dropped"),
                    }
                }
            }
        }
    }
}
