//! Firmware trace service access point.
//!
//! Event-only service: the firmware streams diagnostic events, the host
//! never sends requests. Each event starts with a 16-bit event id except
//! event #11, which carries a slot/multiframe record.

use radiohub_protocol::{PayloadReader, ProtocolError, EVENT_DATA_INDEX};

use crate::report::Report;
use crate::sap::{DecoderEntry, ServiceAccessPoint, SAP_TRACE};

pub const MSG_TRACE_EVENT_1: u8 = 0x01;
pub const MSG_TRACE_EVENT_5: u8 = 0x05;
pub const MSG_TRACE_EVENT_6: u8 = 0x06;
pub const MSG_TRACE_EVENT_7: u8 = 0x07;
pub const MSG_TRACE_EVENT_8: u8 = 0x08;
pub const MSG_TRACE_EVENT_9: u8 = 0x09;
pub const MSG_TRACE_EVENT_10: u8 = 0x0A;
pub const MSG_TRACE_EVENT_11: u8 = 0x0B;

fn push_event_id(reader: &PayloadReader<'_>, report: &mut Report) -> Result<(), ProtocolError> {
    let id = reader.u16_at(EVENT_DATA_INDEX)?;
    report.push("Event ID", format!("{:#x}", id));
    Ok(())
}

fn param_value(value: u32) -> String {
    format!("{}({:#x})", value, value)
}

fn decode_event_1(
    _sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    push_event_id(reader, report)?;
    report.push("String", reader.str_to_end(EVENT_DATA_INDEX + 2)?);
    Ok(())
}

fn decode_event_5(
    _sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    push_event_id(reader, report)?;
    report.push("Param 1", param_value(reader.u32_at(EVENT_DATA_INDEX + 2)?));
    Ok(())
}

fn decode_event_6(
    _sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    push_event_id(reader, report)?;
    report.push("Param 1", param_value(reader.u32_at(EVENT_DATA_INDEX + 2)?));
    report.push("Param 2", param_value(reader.u32_at(EVENT_DATA_INDEX + 6)?));
    Ok(())
}

fn decode_event_7(
    _sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    push_event_id(reader, report)?;
    report.push("Param 1", param_value(reader.u32_at(EVENT_DATA_INDEX + 2)?));
    report.push("Param 2", param_value(reader.u32_at(EVENT_DATA_INDEX + 6)?));
    report.push("Param 3", param_value(reader.u32_at(EVENT_DATA_INDEX + 10)?));
    Ok(())
}

fn decode_event_8(
    _sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    push_event_id(reader, report)?;
    let p1 = reader.u32_at(EVENT_DATA_INDEX + 2)?;
    let p2 = reader.u32_at(EVENT_DATA_INDEX + 6)?;
    let p3 = reader.u32_at(EVENT_DATA_INDEX + 10)?;
    let p4 = reader.u32_at(EVENT_DATA_INDEX + 14)?;
    report.push("Param 1", param_value(p1));
    report.push("Param 2", param_value(p2));
    report.push("Param 3", param_value(p3));
    // Observed firmware output renders the decimal portion of param 4 from
    // param 3; kept bit-for-bit until confirmed against a protocol reference.
    report.push("Param 4", format!("{}({:#x})", p3, p4));
    Ok(())
}

fn decode_event_9(
    _sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    push_event_id(reader, report)?;
    report.push("Param 1", param_value(reader.u32_at(EVENT_DATA_INDEX + 2)?));
    report.push("String", reader.str_to_end(EVENT_DATA_INDEX + 6)?);
    Ok(())
}

fn decode_event_10(
    _sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    push_event_id(reader, report)?;
    report.push("Param 1", param_value(reader.u32_at(EVENT_DATA_INDEX + 2)?));
    report.push("Param 2", param_value(reader.u32_at(EVENT_DATA_INDEX + 6)?));
    report.push("String", reader.str_to_end(EVENT_DATA_INDEX + 10)?);
    Ok(())
}

fn decode_event_11(
    _sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    let index = EVENT_DATA_INDEX;
    report.push("Module ID", reader.u8_at(index)?.to_string());
    report.push("State", reader.u8_at(index + 1)?.to_string());
    report.push("Slot", reader.u16_at(index + 2)?.to_string());
    report.push("Multiframe", reader.u16_at(index + 4)?.to_string());
    report.push("String", reader.str_to_end(index + 6)?);
    Ok(())
}

const EVENT_DECODERS: &[DecoderEntry] = &[
    DecoderEntry {
        msg_id: MSG_TRACE_EVENT_1,
        label: "trace event #1",
        decode: decode_event_1,
    },
    DecoderEntry {
        msg_id: MSG_TRACE_EVENT_5,
        label: "trace event #5",
        decode: decode_event_5,
    },
    DecoderEntry {
        msg_id: MSG_TRACE_EVENT_6,
        label: "trace event #6",
        decode: decode_event_6,
    },
    DecoderEntry {
        msg_id: MSG_TRACE_EVENT_7,
        label: "trace event #7",
        decode: decode_event_7,
    },
    DecoderEntry {
        msg_id: MSG_TRACE_EVENT_8,
        label: "trace event #8",
        decode: decode_event_8,
    },
    DecoderEntry {
        msg_id: MSG_TRACE_EVENT_9,
        label: "trace event #9",
        decode: decode_event_9,
    },
    DecoderEntry {
        msg_id: MSG_TRACE_EVENT_10,
        label: "trace event #10",
        decode: decode_event_10,
    },
    DecoderEntry {
        msg_id: MSG_TRACE_EVENT_11,
        label: "trace event #11",
        decode: decode_event_11,
    },
];

/// The firmware trace SAP.
pub struct Trace;

impl ServiceAccessPoint for Trace {
    fn sap_id(&self) -> u8 {
        SAP_TRACE
    }

    fn name(&self) -> &'static str {
        "Trace"
    }

    fn event_decoders(&self) -> &'static [DecoderEntry] {
        EVENT_DECODERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sap::decode_incoming;
    use radiohub_protocol::Frame;

    fn event(msg_id: u8, payload: Vec<u8>) -> Frame {
        Frame::new(SAP_TRACE, msg_id, payload)
    }

    #[test]
    fn test_decode_event_1() {
        let mut payload = 0x1234u16.to_le_bytes().to_vec();
        payload.extend_from_slice(b"hi");
        let report = decode_incoming(&Trace, &event(MSG_TRACE_EVENT_1, payload)).unwrap();

        assert_eq!(report.text("Event"), Some("trace event #1"));
        assert_eq!(report.text("Event ID"), Some("0x1234"));
        assert_eq!(report.text("String"), Some("hi"));
    }

    #[test]
    fn test_decode_event_7_params() {
        let mut payload = 5u16.to_le_bytes().to_vec();
        for p in [10u32, 11, 255] {
            payload.extend_from_slice(&p.to_le_bytes());
        }
        let report = decode_incoming(&Trace, &event(MSG_TRACE_EVENT_7, payload)).unwrap();

        assert_eq!(report.text("Param 1"), Some("10(0xa)"));
        assert_eq!(report.text("Param 2"), Some("11(0xb)"));
        assert_eq!(report.text("Param 3"), Some("255(0xff)"));
    }

    #[test]
    fn test_decode_event_8_param_4_rendering() {
        let mut payload = 5u16.to_le_bytes().to_vec();
        for p in [1u32, 2, 3, 4] {
            payload.extend_from_slice(&p.to_le_bytes());
        }
        let report = decode_incoming(&Trace, &event(MSG_TRACE_EVENT_8, payload)).unwrap();

        assert_eq!(report.text("Param 3"), Some("3(0x3)"));
        // Decimal portion from param 3, hex portion from param 4.
        assert_eq!(report.text("Param 4"), Some("3(0x4)"));
    }

    #[test]
    fn test_decode_event_11() {
        let mut payload = vec![7, 1];
        payload.extend_from_slice(&100u16.to_le_bytes());
        payload.extend_from_slice(&9u16.to_le_bytes());
        payload.extend_from_slice(b"sync");
        let report = decode_incoming(&Trace, &event(MSG_TRACE_EVENT_11, payload)).unwrap();

        assert_eq!(report.text("Module ID"), Some("7"));
        assert_eq!(report.text("State"), Some("1"));
        assert_eq!(report.text("Slot"), Some("100"));
        assert_eq!(report.text("Multiframe"), Some("9"));
        assert_eq!(report.text("String"), Some("sync"));
    }

    #[test]
    fn test_requests_are_rejected() {
        use crate::sap::{encode_request, RequestParams};
        let err = encode_request(&Trace, "anything", &RequestParams::new()).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownEncoder("anything".to_owned()));
    }
}
