//! Tactor - Haptic Bracelet Firmware
//!
//! Main firmware binary for the RP2040-based bracelet. Wires the
//! board-agnostic control core (`tactor-core`) to the hardware: a 1ms
//! tick task runs the whole control loop, a UART link task stands in for
//! the wireless command collaborator, and an optional calibration task
//! (feature `calibration`) replaces the link for bench tuning.
//!
//! A "tactor" is the actuator element of a tactile display - the part
//! that actually touches the skin.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::BufferedInterruptHandler;
use {defmt_rtt as _, panic_probe as _};

mod board;
mod channels;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

// Static cells for UART buffers (must live forever)
#[cfg(not(feature = "calibration"))]
static TX_BUF: static_cell::StaticCell<[u8; 64]> = static_cell::StaticCell::new();
#[cfg(not(feature = "calibration"))]
static RX_BUF: static_cell::StaticCell<[u8; 64]> = static_cell::StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Tactor firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!(
        "Board: led={} pair={} motor=({}, {}) fault={} aux=({}, {}, {})",
        board::PIN_LED,
        board::PIN_PAIR,
        board::PIN_MOTOR_A1,
        board::PIN_MOTOR_A2,
        board::PIN_MOTOR_FAULT,
        board::PIN_AUX_DETECT,
        board::PIN_AUX_DIGITAL,
        board::PIN_AUX_ANALOG,
    );

    // Indicator LED
    let led = Output::new(p.PIN_19, Level::Low);

    // Buttons and detectors
    let pair = Input::new(p.PIN_18, Pull::Down);
    let aux_detect = Input::new(p.PIN_14, Pull::Down);
    let aux_button = Input::new(p.PIN_15, Pull::Down);

    // Motor driver fault line idles high, pulled to ground on fault
    let fault = Input::new(p.PIN_22, Pull::Up);

    // Both motor legs on one PWM slice: GPIO20 = channel A, GPIO21 = channel B
    let mut pwm_config = PwmConfig::default();
    pwm_config.top = 255;
    let pwm = Pwm::new_output_ab(p.PWM_SLICE2, p.PIN_20, p.PIN_21, pwm_config);

    // Accessory dial on ADC0
    let adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let dial_channel = Channel::new_pin(p.PIN_26, Pull::None);

    info!("Peripherals initialized");

    spawner.must_spawn(tasks::tick::tick_task(
        pwm,
        led,
        pair,
        fault,
        aux_detect,
        aux_button,
        adc,
        dial_channel,
    ));

    // Normal runtime: UART stands in for the wireless command collaborator
    #[cfg(not(feature = "calibration"))]
    {
        let uart_config = embassy_rp::uart::Config::default(); // 115200 baud default

        let tx_buf = TX_BUF.init([0u8; 64]);
        let rx_buf = RX_BUF.init([0u8; 64]);

        let uart =
            embassy_rp::uart::Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
        let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
        let (_tx, rx) = uart.split();

        spawner.must_spawn(tasks::link::link_task(rx));
        info!("Link task spawned");
    }

    // Bench runtime: parameter sweeps instead of the link
    #[cfg(feature = "calibration")]
    {
        spawner.must_spawn(tasks::calibration::calibration_task());
        info!("Calibration task spawned");
    }
}
