//! Drive the hub against a scripted transport.
//!
//! Sends a ping and replays a few canned device frames (the startup
//! indication, the ping response, and a trace event), printing each report
//! the way a host application would.

use radiohub_host::{MockTransport, Outcome, RadioHub, RequestParams};
use radiohub_protocol::{slip, Frame};

fn device_frame(sap_id: u8, msg_id: u8, payload: Vec<u8>) -> Vec<u8> {
    slip::encode(&Frame::new(sap_id, msg_id, payload).encode())
}

fn main() {
    let mut transport = MockTransport::new();

    // Startup indication from an iM284A-XL.
    let mut startup = vec![104];
    startup.extend_from_slice(&42u32.to_le_bytes());
    startup.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0xA1, 0xB2, 0xC3, 0xD4]);
    startup.extend_from_slice(&[3, 1]);
    startup.extend_from_slice(&512u16.to_le_bytes());
    startup.extend_from_slice(b"01.02.2024");
    startup.extend_from_slice(b"Mesh Router");
    transport.queue(device_frame(0x01, 0x00, startup));

    // Ping response, status ok.
    transport.queue(device_frame(0x01, 0x02, vec![0x00]));

    // Trace event #1.
    let mut trace = 0x0010u16.to_le_bytes().to_vec();
    trace.extend_from_slice(b"beacon acquired");
    transport.queue(device_frame(0xA0, 0x01, trace));

    let mut hub = RadioHub::new(transport);
    let mut print = |outcome: Outcome| match outcome {
        Outcome::Request(report) | Outcome::Incoming(report) => println!("{}", report),
        Outcome::Failed(e) => println!("error: {}", e),
    };

    hub.submit_request("DeviceMgmt", "pingDevice", &RequestParams::new(), &mut print)
        .expect("transport write");

    // Poll until the scripted transport runs dry.
    for _ in 0..3 {
        hub.process(&mut print).expect("transport read");
    }
}
