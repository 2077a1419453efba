//! Broadcast server
//!
//! Serves the current combined FOV multiplier to external overlay tooling.
//! The protocol is deliberately tiny: a client connects, receives one
//! fixed-width decimal string, and the connection closes.

use crate::config::BeatcamConfig;
use crate::prelude::*;
use crate::resources::FoveBroadcast;
use std::io::Write;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

pub struct BroadcastPlugin;

impl Plugin for BroadcastPlugin {
    fn build(&self, app: &mut App) {
        let (address, port) = {
            let config = app.world().resource::<BeatcamConfig>();
            (config.fove_server_ip.clone(), config.fove_server_port)
        };
        let handle = app
            .world_mut()
            .get_resource_or_insert_with(FoveBroadcast::default)
            .handle();

        thread::Builder::new()
            .name("fove-broadcast".to_string())
            .spawn(move || serve(address, port, handle))
            .ok();
    }
}

fn serve(address: String, port: u16, value: Arc<Mutex<f32>>) {
    let listener = match TcpListener::bind((address.as_str(), port)) {
        Ok(listener) => listener,
        Err(e) => {
            error!("broadcast server failed to bind {address}:{port}: {e}");
            return;
        }
    };
    info!("broadcast server listening on {address}:{port}");

    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                let current = value.lock().map(|guard| *guard).unwrap_or(1.0);
                // clients expect the unsigned form
                let response = format_num_digits(current, 8);
                if let Err(e) = stream.write_all(response[1..].as_bytes()) {
                    debug!("broadcast write failed: {e}");
                }
            }
            Err(e) => debug!("broadcast accept failed: {e}"),
        }
    }
}

/// Formats a number as a sign character plus a fixed budget of `digits`
/// characters, truncating or zero-padding the fractional part as needed.
pub fn format_num_digits(number: f32, digits: usize) -> String {
    let mut formatted = format!(
        "{}{:.50}",
        if number >= 0.0 { "+" } else { "" },
        number
    );

    if formatted.contains('.') {
        let budget = digits + 2; // sign and decimal point
        if formatted.len() > budget {
            formatted.truncate(budget);
        } else {
            let padding = budget - formatted.len();
            formatted.push_str(&"0".repeat(padding));
        }
    } else {
        let budget = digits + 1;
        if formatted.len() > budget {
            formatted.truncate(budget);
        } else {
            let padding = "0".repeat(budget - formatted.len());
            formatted.insert_str(1, &padding);
        }
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_values_get_a_plus_sign_and_fixed_width() {
        let formatted = format_num_digits(1.25, 8);
        assert_eq!(formatted, "+1.2500000");
        assert_eq!(formatted.len(), 10);
    }

    #[test]
    fn negative_values_keep_their_own_sign() {
        let formatted = format_num_digits(-0.5, 8);
        assert_eq!(formatted, "-0.5000000");
    }

    #[test]
    fn long_fractions_are_truncated_to_the_budget() {
        let formatted = format_num_digits(std::f32::consts::PI, 8);
        assert_eq!(formatted.len(), 10);
        assert!(formatted.starts_with("+3.141592"));
    }

    #[test]
    fn wire_form_drops_the_sign_character() {
        let formatted = format_num_digits(1.0, 8);
        assert_eq!(&formatted[1..], "1.0000000");
    }
}
