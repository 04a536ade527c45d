//! End-to-end dispatch tests: raw serial bytes in, structured reports out.

use radiohub_host::{
    device_management, mesh_router, trace, MockTransport, Outcome, RadioHub, RequestParams,
    Value, SAP_DEVICE_MGMT, SAP_MESH_ROUTER, SAP_TRACE,
};
use radiohub_protocol::{slip, Frame, ProtocolError};

fn wire(sap_id: u8, msg_id: u8, payload: &[u8]) -> Vec<u8> {
    slip::encode(&Frame::new(sap_id, msg_id, payload.to_vec()).encode())
}

fn poll(hub: &mut RadioHub<MockTransport>, raw: &[u8]) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    hub.poll_incoming(raw, &mut |outcome| outcomes.push(outcome));
    outcomes
}

#[test]
fn ping_response_end_to_end() {
    let mut hub = RadioHub::new(MockTransport::new());
    let outcomes = poll(
        &mut hub,
        &wire(SAP_DEVICE_MGMT, device_management::MSG_PING_DEVICE_RSP, &[0x00]),
    );

    assert_eq!(outcomes.len(), 1);
    let Outcome::Incoming(report) = &outcomes[0] else {
        panic!("expected incoming outcome, got {:?}", outcomes[0]);
    };
    assert_eq!(report.text("Response"), Some("pingDevice response"));
    assert_eq!(report.text("Status"), Some("ok"));
}

#[test]
fn reassembly_is_chunk_boundary_independent() {
    let stream = wire(SAP_DEVICE_MGMT, device_management::MSG_PING_DEVICE_RSP, &[0x00]);

    let mut whole = RadioHub::new(MockTransport::new());
    let expected = poll(&mut whole, &stream);

    for split in 0..stream.len() {
        let mut hub = RadioHub::new(MockTransport::new());
        let mut outcomes = poll(&mut hub, &stream[..split]);
        outcomes.extend(poll(&mut hub, &stream[split..]));
        assert_eq!(outcomes, expected, "split at {}", split);
    }
}

#[test]
fn unknown_sap_is_reported_and_stream_continues() {
    let mut hub = RadioHub::new(MockTransport::new());

    let mut stream = wire(0xFF, 0x01, &[]);
    stream.extend(wire(SAP_DEVICE_MGMT, device_management::MSG_PING_DEVICE_RSP, &[0x00]));
    let outcomes = poll(&mut hub, &stream);

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0], Outcome::Failed(ProtocolError::UnknownSap(0xFF)));
    assert!(matches!(&outcomes[1], Outcome::Incoming(r) if r.text("Status") == Some("ok")));
}

#[test]
fn corrupted_frame_is_reported_and_stream_continues() {
    let mut hub = RadioHub::new(MockTransport::new());

    // Flip a payload bit inside the SLIP body (byte 3 is the status byte of
    // the inner frame; 0x00 -> 0x01 keeps it free of SLIP special bytes).
    let mut bad = wire(SAP_DEVICE_MGMT, device_management::MSG_PING_DEVICE_RSP, &[0x00]);
    bad[3] ^= 0x01;

    let mut stream = bad;
    stream.extend(wire(SAP_DEVICE_MGMT, device_management::MSG_PING_DEVICE_RSP, &[0x00]));
    let outcomes = poll(&mut hub, &stream);

    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
        outcomes[0],
        Outcome::Failed(ProtocolError::CrcMismatch { .. })
    ));
    assert!(matches!(&outcomes[1], Outcome::Incoming(_)));
}

#[test]
fn runt_frame_is_too_short() {
    let mut hub = RadioHub::new(MockTransport::new());
    // Three de-escaped bytes between delimiters: below the 4-byte minimum.
    let outcomes = poll(&mut hub, &[0xC0, 0x01, 0x02, 0x03, 0xC0]);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0],
        Outcome::Failed(ProtocolError::FrameTooShort {
            expected: 4,
            actual: 3,
        })
    );
}

#[test]
fn unknown_message_id_within_known_sap() {
    let mut hub = RadioHub::new(MockTransport::new());
    let outcomes = poll(&mut hub, &wire(SAP_DEVICE_MGMT, 0x7F, &[]));

    assert_eq!(
        outcomes,
        vec![Outcome::Failed(ProtocolError::UnknownMessageId(0x7F))]
    );
}

#[test]
fn routing_is_scoped_by_sap_id_before_msg_id() {
    let mut hub = RadioHub::new(MockTransport::new());

    // Message id 0x01 means three different things depending on the SAP:
    // a trace event on 0xA0, nothing inbound on DeviceMgmt (it is the ping
    // *request* id), and nothing inbound on the mesh router either.
    let mut payload = 0x0042u16.to_le_bytes().to_vec();
    payload.extend_from_slice(b"boot");
    let outcomes = poll(&mut hub, &wire(SAP_TRACE, trace::MSG_TRACE_EVENT_1, &payload));
    assert!(matches!(
        &outcomes[0],
        Outcome::Incoming(r) if r.text("Event") == Some("trace event #1")
    ));

    let outcomes = poll(&mut hub, &wire(SAP_DEVICE_MGMT, 0x01, &payload));
    assert_eq!(
        outcomes,
        vec![Outcome::Failed(ProtocolError::UnknownMessageId(0x01))]
    );

    // Message id 0x02 resolves to a response on both DeviceMgmt and the
    // mesh router, each through its own table.
    let outcomes = poll(&mut hub, &wire(SAP_DEVICE_MGMT, 0x02, &[0x00]));
    assert!(matches!(
        &outcomes[0],
        Outcome::Incoming(r) if r.text("Response") == Some("pingDevice response")
    ));

    let mut addr = vec![0x00, 0xCD, 0xAB];
    addr.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    let outcomes = poll(&mut hub, &wire(SAP_MESH_ROUTER, 0x02, &addr));
    assert!(matches!(
        &outcomes[0],
        Outcome::Incoming(r) if r.text("Response") == Some("getNetworkAddress response")
    ));
}

#[test]
fn routing_table_rows_travel_as_records() {
    let mut hub = RadioHub::new(MockTransport::new());

    let mut payload = vec![0x00];
    payload.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    payload.extend_from_slice(&[0x34, 0x12, 0x78, 0x56]);
    payload.extend_from_slice(&[1, 2, 3, 4, 5, 0x50]);
    payload.extend_from_slice(&258u16.to_le_bytes());

    let outcomes = poll(
        &mut hub,
        &wire(SAP_MESH_ROUTER, mesh_router::MSG_GET_ROUTING_INFO_RSP, &payload),
    );

    let Outcome::Incoming(report) = &outcomes[0] else {
        panic!("expected incoming outcome");
    };
    let Some(Value::Records(rows)) = report.get("Mesh Router Nodes") else {
        panic!("missing routing rows");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text("Device-EUI"), Some("08-07-06-05-04-03-02-01"));
    assert_eq!(rows[0].text("RSSI"), Some("16 dBm"));
}

#[test]
fn request_and_reply_round_trip_through_hub() {
    let mut hub = RadioHub::new(MockTransport::new());
    let mut outcomes = Vec::new();

    hub.submit_request(
        "LoRaMeshRouter",
        "getRoutingInfo",
        &RequestParams::new().with_uint("Index", 0).with_uint("MaxItems", 4),
        &mut |outcome| outcomes.push(outcome),
    )
    .unwrap();

    // The request left the hub SLIP-framed with a valid CRC.
    let written = hub.transport_mut().written.remove(0);
    let mut decoder = radiohub_protocol::SlipDecoder::new();
    let frames = decoder.push(&written);
    assert_eq!(frames.len(), 1);
    let frame = Frame::decode(&frames[0]).expect("hub emits valid frames");
    assert_eq!(frame.sap_id, SAP_MESH_ROUTER);
    assert_eq!(frame.msg_id, mesh_router::MSG_GET_ROUTING_INFO_REQ);
    assert_eq!(frame.payload, vec![0x00, 0x04]);

    assert!(matches!(
        &outcomes[0],
        Outcome::Request(r) if r.text("Request") == Some("getRoutingInfo request")
    ));

    // Device answers; the hub decodes it like any other inbound frame.
    hub.transport_mut().queue(wire(
        SAP_MESH_ROUTER,
        mesh_router::MSG_GET_ROUTING_INFO_RSP,
        &[0x00],
    ));
    hub.process(&mut |outcome| outcomes.push(outcome)).unwrap();

    assert!(matches!(
        &outcomes[1],
        Outcome::Incoming(r) if r.text("Response") == Some("getRoutingInfo response")
    ));
}

#[test]
fn every_frame_produces_exactly_one_notification() {
    let mut hub = RadioHub::new(MockTransport::new());

    let mut stream = Vec::new();
    stream.extend(wire(SAP_DEVICE_MGMT, device_management::MSG_PING_DEVICE_RSP, &[0x00]));
    stream.extend(wire(0xEE, 0x01, &[]));
    stream.extend(wire(SAP_DEVICE_MGMT, 0x7F, &[]));
    stream.extend(wire(SAP_TRACE, trace::MSG_TRACE_EVENT_5, &{
        let mut p = 9u16.to_le_bytes().to_vec();
        p.extend_from_slice(&7u32.to_le_bytes());
        p
    }));

    let outcomes = poll(&mut hub, &stream);
    assert_eq!(outcomes.len(), 4);
}
