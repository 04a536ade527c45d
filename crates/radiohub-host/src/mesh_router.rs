//! LoRa Mesh Router service access point.
//!
//! Network-layer commands of the mesh firmware: node addressing, router
//! mode, link status, the routing table, and application packet exchange.

use radiohub_protocol::{PayloadReader, ProtocolError, EVENT_DATA_INDEX, RESPONSE_DATA_INDEX};

use crate::report::Report;
use crate::sap::{
    decode_default_response, encode_empty_request, DecoderEntry, EncoderEntry, RequestParams,
    ServiceAccessPoint, SAP_MESH_ROUTER,
};

// ============================================================================
// Message ids
// ============================================================================

pub const MSG_GET_NETWORK_ADDRESS_REQ: u8 = 0x01;
pub const MSG_GET_NETWORK_ADDRESS_RSP: u8 = 0x02;
pub const MSG_SET_NETWORK_ADDRESS_REQ: u8 = 0x03;
pub const MSG_SET_NETWORK_ADDRESS_RSP: u8 = 0x04;
pub const MSG_GET_MODE_REQ: u8 = 0x11;
pub const MSG_GET_MODE_RSP: u8 = 0x12;
pub const MSG_SET_MODE_REQ: u8 = 0x13;
pub const MSG_SET_MODE_RSP: u8 = 0x14;
pub const MSG_GET_LINK_STATUS_REQ: u8 = 0x15;
pub const MSG_GET_LINK_STATUS_RSP: u8 = 0x16;
pub const MSG_LINK_STATUS_CHANGE_IND: u8 = 0x18;
pub const MSG_GET_ROUTING_INFO_REQ: u8 = 0x19;
pub const MSG_GET_ROUTING_INFO_RSP: u8 = 0x1A;
pub const MSG_SEND_PACKET_REQ: u8 = 0x21;
pub const MSG_SEND_PACKET_RSP: u8 = 0x22;
pub const MSG_PACKET_RECEIVED_IND: u8 = 0x26;

/// Raw RSSI bytes carry this offset; subtract to get dBm.
const RSSI_OFFSET: i32 = 64;

/// Network ID length on the wire.
const NETWORK_ID_SIZE: usize = 2;
/// Device EUI length on the wire.
const DEVICE_EUI_SIZE: usize = 8;

const STATUS_CODES: &[(u8, &str)] = &[
    (0x00, "ok"),
    (0x01, "error"),
    (0x02, "command not supported"),
    (0x03, "wrong parameter"),
    (0x04, "wrong application mode"),
    (0x05, "no more data"),
    (0x06, "application busy"),
    (0x07, "wrong message length"),
    (0x08, "NVM write error"),
    (0x09, "NVM read error"),
    (0x0A, "command rejected"),
    (0x0B, "no link"),
    (0x0C, "no route"),
    (0x0D, "wrong address"),
    (0x0E, "no buffer"),
    (0x0F, "transmit queue full"),
];

// A mesh network must have only one single coordinator.
const MODES: &[(u8, &str)] = &[(0, "Off"), (1, "Router"), (2, "Coordinator")];

fn rssi_dbm(raw: i8) -> String {
    format!("{} dBm", i32::from(raw) - RSSI_OFFSET)
}

// ============================================================================
// Request encoders
// ============================================================================

fn hex_param_exact(
    params: &RequestParams,
    name: &str,
    size: usize,
) -> Result<Vec<u8>, ProtocolError> {
    let bytes = params.hex_bytes_lsb(name)?;
    if bytes.len() != size {
        return Err(ProtocolError::InvalidParameter(format!(
            "{} must be {} bytes, got {}",
            name,
            size,
            bytes.len()
        )));
    }
    Ok(bytes)
}

fn encode_set_network_address(params: &RequestParams) -> Result<Vec<u8>, ProtocolError> {
    let mut payload = hex_param_exact(params, "Network-ID", NETWORK_ID_SIZE)?;
    payload.extend(hex_param_exact(params, "Device-EUI", DEVICE_EUI_SIZE)?);
    Ok(payload)
}

fn encode_set_mode(params: &RequestParams) -> Result<Vec<u8>, ProtocolError> {
    let mode = params.text("Mode")?;
    let value = MODES
        .iter()
        .find(|(_, name)| *name == mode)
        .map(|(value, _)| *value)
        .ok_or_else(|| ProtocolError::InvalidParameter(format!("unknown mode: {}", mode)))?;
    Ok(vec![value])
}

fn encode_get_routing_info(params: &RequestParams) -> Result<Vec<u8>, ProtocolError> {
    Ok(vec![params.byte("Index")?, params.byte("MaxItems")?])
}

fn encode_send_packet(params: &RequestParams) -> Result<Vec<u8>, ProtocolError> {
    let mut payload = Vec::new();
    // Tx options, reserved for future use.
    payload.push(0x00);
    payload.extend(hex_param_exact(params, "Destination-EUI", DEVICE_EUI_SIZE)?);
    payload.push(params.byte("Port")?);
    payload.extend(params.hex_bytes("Payload")?);
    Ok(payload)
}

// ============================================================================
// Response decoders
// ============================================================================

fn decode_network_address(
    sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    decode_default_response(sap, reader, report)?;
    let index = RESPONSE_DATA_INDEX;
    report.push("Network-ID", reader.hex_lsb_at(index, NETWORK_ID_SIZE)?);
    report.push(
        "Device-EUI",
        reader.hex_lsb_at(index + NETWORK_ID_SIZE, DEVICE_EUI_SIZE)?,
    );
    Ok(())
}

fn decode_mode(
    sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    decode_default_response(sap, reader, report)?;
    let mode = reader.u8_at(RESPONSE_DATA_INDEX)?;
    report.push(
        "Mode",
        MODES
            .iter()
            .find(|(value, _)| *value == mode)
            .map(|(_, name)| *name)
            .unwrap_or("unknown mode"),
    );
    Ok(())
}

fn link_status_fields(
    reader: &PayloadReader<'_>,
    index: usize,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    report.push("Node Type", reader.u8_at(index)?.to_string());
    report.push("State", reader.u8_at(index + 1)?.to_string());
    report.push("Node Address", reader.hex_lsb_at(index + 2, 2)?);
    report.push("Rank", reader.u8_at(index + 4)?.to_string());
    report.push("Cell Size", reader.u8_at(index + 5)?.to_string());
    report.push("Beacon Index", reader.u8_at(index + 6)?.to_string());
    Ok(())
}

fn decode_link_status(
    sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    decode_default_response(sap, reader, report)?;
    link_status_fields(reader, RESPONSE_DATA_INDEX, report)
}

/// Routing table rows: fixed 20-byte item slots after the status byte.
///
/// DeviceEUI(8) + NodeAddress(2) + RouterAddress(2) + NodeType(1) +
/// State(1) + Rank(1) + BeaconIndex(1) + Visibility(1) + RSSI(1) +
/// FW_Version(2). A trailing partial slot is never transmitted; if one
/// shows up it is left undecoded rather than read out of bounds.
fn decode_routing_info(
    sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    decode_default_response(sap, reader, report)?;

    const ITEM_SIZE: usize = 20;
    let mut index = RESPONSE_DATA_INDEX;
    let mut rows = Vec::new();

    while index + ITEM_SIZE <= reader.len() {
        let mut row = Report::new();
        row.push("Device-EUI", reader.hex_lsb_at(index, 8)?);
        row.push("Local Address", reader.hex_lsb_at(index + 8, 2)?);
        row.push("Router Address", reader.hex_lsb_at(index + 10, 2)?);
        row.push("Node Type", reader.u8_at(index + 12)?.to_string());
        row.push("State", reader.u8_at(index + 13)?.to_string());
        row.push("Rank", reader.u8_at(index + 14)?.to_string());
        row.push("Beacon Index", reader.u8_at(index + 15)?.to_string());
        row.push("Visibility", reader.u8_at(index + 16)?.to_string());
        row.push("RSSI", rssi_dbm(reader.i8_at(index + 17)?));
        row.push("FW Version", reader.u16_at(index + 18)?.to_string());
        rows.push(row);
        index += ITEM_SIZE;
    }

    report.push("Mesh Router Nodes", rows);
    Ok(())
}

// ============================================================================
// Event decoders
// ============================================================================

fn decode_link_status_change(
    _sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    link_status_fields(reader, EVENT_DATA_INDEX, report)
}

fn decode_packet_received(
    _sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    let index = EVENT_DATA_INDEX;
    report.push("RSSI", rssi_dbm(reader.i8_at(index)?));
    report.push("SNR", format!("{} dB", reader.i8_at(index + 1)?));
    report.push("Source-EUI", reader.hex_lsb_at(index + 2, DEVICE_EUI_SIZE)?);
    report.push("Port", reader.u8_at(index + 10)?.to_string());
    report.push("Payload", reader.hex_to_end(index + 11)?);
    Ok(())
}

// ============================================================================
// Tables
// ============================================================================

const ENCODERS: &[EncoderEntry] = &[
    EncoderEntry {
        name: "getNetworkAddress",
        msg_id: MSG_GET_NETWORK_ADDRESS_REQ,
        encode: encode_empty_request,
    },
    EncoderEntry {
        name: "setNetworkAddress",
        msg_id: MSG_SET_NETWORK_ADDRESS_REQ,
        encode: encode_set_network_address,
    },
    EncoderEntry {
        name: "getMode",
        msg_id: MSG_GET_MODE_REQ,
        encode: encode_empty_request,
    },
    EncoderEntry {
        name: "setMode",
        msg_id: MSG_SET_MODE_REQ,
        encode: encode_set_mode,
    },
    EncoderEntry {
        name: "getLinkStatus",
        msg_id: MSG_GET_LINK_STATUS_REQ,
        encode: encode_empty_request,
    },
    EncoderEntry {
        name: "getRoutingInfo",
        msg_id: MSG_GET_ROUTING_INFO_REQ,
        encode: encode_get_routing_info,
    },
    EncoderEntry {
        name: "sendPacket",
        msg_id: MSG_SEND_PACKET_REQ,
        encode: encode_send_packet,
    },
];

const RESPONSE_DECODERS: &[DecoderEntry] = &[
    DecoderEntry {
        msg_id: MSG_GET_NETWORK_ADDRESS_RSP,
        label: "getNetworkAddress response",
        decode: decode_network_address,
    },
    DecoderEntry {
        msg_id: MSG_SET_NETWORK_ADDRESS_RSP,
        label: "setNetworkAddress response",
        decode: decode_default_response,
    },
    DecoderEntry {
        msg_id: MSG_GET_MODE_RSP,
        label: "getMode response",
        decode: decode_mode,
    },
    DecoderEntry {
        msg_id: MSG_SET_MODE_RSP,
        label: "setMode response",
        decode: decode_default_response,
    },
    DecoderEntry {
        msg_id: MSG_GET_LINK_STATUS_RSP,
        label: "getLinkStatus response",
        decode: decode_link_status,
    },
    DecoderEntry {
        msg_id: MSG_GET_ROUTING_INFO_RSP,
        label: "getRoutingInfo response",
        decode: decode_routing_info,
    },
    DecoderEntry {
        msg_id: MSG_SEND_PACKET_RSP,
        label: "sendPacket response",
        decode: decode_default_response,
    },
];

const EVENT_DECODERS: &[DecoderEntry] = &[
    DecoderEntry {
        msg_id: MSG_LINK_STATUS_CHANGE_IND,
        label: "Link Status change event",
        decode: decode_link_status_change,
    },
    DecoderEntry {
        msg_id: MSG_PACKET_RECEIVED_IND,
        label: "Packet received event",
        decode: decode_packet_received,
    },
];

/// The LoRa Mesh Router SAP.
pub struct LoRaMeshRouter;

impl ServiceAccessPoint for LoRaMeshRouter {
    fn sap_id(&self) -> u8 {
        SAP_MESH_ROUTER
    }

    fn name(&self) -> &'static str {
        "LoRaMeshRouter"
    }

    fn encoders(&self) -> &'static [EncoderEntry] {
        ENCODERS
    }

    fn response_decoders(&self) -> &'static [DecoderEntry] {
        RESPONSE_DECODERS
    }

    fn event_decoders(&self) -> &'static [DecoderEntry] {
        EVENT_DECODERS
    }

    fn status_codes(&self) -> &'static [(u8, &'static str)] {
        STATUS_CODES
    }
}
