use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{info, trace, warn};
use std::io::{self, Write};
use std::net::{TcpListener, ToSocketAddrs};

/// Forwards report lines to a TCP client
pub struct ReportPublisher {
    tx: Sender<String>,
}

// Serves one client at a time; lines queued while nobody listens are dropped
fn publisher_thread(rx: Receiver<String>, listener: TcpListener) {
    for stream in listener.incoming() {
        let mut client = match stream {
            Ok(client) => client,
            Err(e) => {
                warn!("Report client failed to connect: {}", e);
                continue;
            }
        };
        info!("Report client connected: {:?}", client.peer_addr().ok());

        // Skip whatever piled up before the client arrived
        while rx.try_recv().is_ok() {}

        loop {
            let line = match rx.recv() {
                Ok(line) => line,
                Err(_) => return, // Publisher dropped
            };
            if client
                .write_all(line.as_bytes())
                .and_then(|_| client.write_all(b"\n"))
                .is_err()
            {
                info!("Report client disconnected");
                break;
            }
        }
    }
}

impl ReportPublisher {
    /// Binds `addr` and starts serving report lines
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        info!("Publishing reports on {}", listener.local_addr()?);

        let (tx, rx) = bounded(64);
        std::thread::Builder::new()
            .name("ssd-publisher".into())
            .spawn(move || publisher_thread(rx, listener))?;
        Ok(ReportPublisher { tx })
    }

    pub fn publish(&self, line: &str) {
        match self.tx.try_send(line.to_owned()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => trace!("No report client, dropping line"),
            Err(TrySendError::Disconnected(_)) => warn!("Report publisher thread has stopped"),
        }
    }
}

#[cfg(test)]
mod publish_tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpStream;
    use std::time::Duration;

    #[test]
    fn test_client_receives_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = bounded(64);
        std::thread::spawn(move || publisher_thread(rx, listener));
        let publisher = ReportPublisher { tx };

        let stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_millis(100))).unwrap();
        let mut reader = BufReader::new(stream);

        // The client may be accepted after the first lines; keep publishing until one lands
        let mut line = String::new();
        for _ in 0..50 {
            publisher.publish("tick=1 d0=12.3");
            if reader.get_ref().peek(&mut [0u8; 1]).unwrap_or(0) > 0 {
                break;
            }
        }
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "tick=1 d0=12.3\n");
    }
}
