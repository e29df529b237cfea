//! Serial command link task
//!
//! Stands in for the wireless collaborator on the bench build: receives
//! command lines over UART and feeds the shared [`LinkState`]. A line is
//! two ASCII integers, "pulse1 pulse2" in milliseconds. The link counts
//! as connected while traffic arrives and drops after an idle timeout.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Read;
use heapless::Vec;

use tactor_core::link::parse_command_line;

use crate::channels::LINK;

/// Idle time after which the link counts as disconnected
const LINK_IDLE_TIMEOUT_MS: u64 = 3000;

/// Longest accepted command line; anything longer is dropped
const LINE_MAX: usize = 64;

/// Link RX task - parses command lines into the shared link state
#[embassy_executor::task]
pub async fn link_task(mut rx: BufferedUartRx) {
    info!("Link task started");

    let mut line: Vec<u8, LINE_MAX> = Vec::new();
    let mut buf = [0u8; 16];

    loop {
        let read = with_timeout(
            Duration::from_millis(LINK_IDLE_TIMEOUT_MS),
            rx.read(&mut buf),
        )
        .await;

        let n = match read {
            Err(_) => {
                // Idle timeout
                if LINK.connected() {
                    info!("Link idle, marking disconnected");
                    LINK.set_connected(false);
                }
                line.clear();
                continue;
            }
            Ok(Err(e)) => {
                warn!("UART read error: {:?}", e);
                continue;
            }
            Ok(Ok(n)) => n,
        };

        if n > 0 && !LINK.connected() {
            info!("Link traffic, marking connected");
            LINK.set_connected(true);
        }

        for &byte in &buf[..n] {
            if byte == b'\n' {
                let (cmd1, cmd2) = parse_command_line(&line);
                debug!("Link command: {} {}", cmd1, cmd2);
                // Both slots written unconditionally: a new line clears
                // any stale pending command
                LINK.post_command1(cmd1);
                LINK.post_command2(cmd2);
                line.clear();
            } else if line.push(byte).is_err() {
                warn!("Command line too long, dropping");
                line.clear();
            }
        }
    }
}
