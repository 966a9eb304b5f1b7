//! PIO Serial Echo Firmware
//!
//! Entry point for the RP2040 demo: a software serial port on PIO1 that
//! echoes every byte it receives, plus a heartbeat LED.

#![no_std]
#![no_main]

use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_time::Timer;
use {defmt_rtt as _, panic_probe as _};

use pio_serial::hal::gpio::StatusLed;
use pio_serial::prelude::*;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("PIO Serial Echo v{}", env!("CARGO_PKG_VERSION"));

    let p = embassy_rp::init(Default::default());

    info!("Peripherals initialized");

    // Pico on-board LED
    let led = StatusLed::new(Output::new(p.PIN_25, Level::Low));
    spawner.spawn(heartbeat_task(led)).unwrap();

    let cop = RpCoprocessor::pio1(p.PIO1);
    let mut serial = SoftwareSerial::new(cop, Some(pins::SERIAL_TX), Some(pins::SERIAL_RX));
    if let Err(err) = serial.start(DEFAULT_BAUD) {
        error!("serial start failed: {}", err);
        loop {
            Timer::after(Duration::from_secs(10)).await;
        }
    }

    info!(
        "Echoing on {} (tx) / {} (rx), divider {}",
        pins::SERIAL_TX,
        pins::SERIAL_RX,
        serial.divider()
    );
    if let Err(err) = println(&mut serial, "pio-serial echo ready") {
        error!("banner failed: {}", err);
    }

    // Main loop - drain the RX FIFO, echo, then yield
    loop {
        loop {
            match serial.read() {
                Ok(Some(byte)) => {
                    if let Err(err) = serial.write(byte) {
                        error!("echo failed: {}", err);
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    error!("read failed: {}", err);
                    break;
                }
            }
        }
        Timer::after(Duration::from_micros(ECHO_POLL_US)).await;
    }
}

/// Heartbeat task - blinks LED to show system is running
#[embassy_executor::task]
async fn heartbeat_task(mut led: StatusLed<'static>) {
    loop {
        led.toggle();
        Timer::after(Duration::from_millis(HEARTBEAT_PERIOD_MS / 2)).await;
    }
}
