use crate::capture::Capture;
use ssd_core::{EdgeHandler, Reading};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, info};
use std::io;
use std::thread::JoinHandle;

// Owns the handler; every display is written from this thread only
fn decoder_thread(
    mut handler: EdgeHandler,
    captures: Receiver<Capture>,
    readings: Sender<(usize, Reading)>,
) -> EdgeHandler {
    let mut edges: u64 = 0;
    for capture in captures.iter() {
        edges += 1;
        if let Some(update) = handler.on_edge(&capture.edge, &capture) {
            debug!("display {} -> {:?}", update.0, update.1);
            if readings.send(update).is_err() {
                break; // Reporter is gone
            }
        }
    }
    info!("Decoder stopped after {} edges", edges);
    handler
}

/// Starts the decoder thread; it runs until the capture feed closes
pub fn spawn_decoder(
    handler: EdgeHandler,
    captures: Receiver<Capture>,
    readings: Sender<(usize, Reading)>,
) -> io::Result<JoinHandle<EdgeHandler>> {
    std::thread::Builder::new()
        .name("ssd-decoder".into())
        .spawn(move || decoder_thread(handler, captures, readings))
}
