//! Service access point abstraction and shared dispatch.
//!
//! A SAP owns three immutable tables (request encoders by name, response
//! decoders by message id, event decoders by message id) plus the
//! status-code table consulted by every response decode. The tables are
//! plain static data built once; the dispatch algorithm over them lives in
//! the free functions [`encode_request`] and [`decode_incoming`] so every
//! service shares one implementation.

use std::collections::HashMap;

use radiohub_protocol::{Frame, PayloadReader, ProtocolError};

use crate::report::Report;

// ============================================================================
// Service access point ids
// ============================================================================

/// Device Management service.
pub const SAP_DEVICE_MGMT: u8 = 0x01;
/// LoRa Mesh Router service.
pub const SAP_MESH_ROUTER: u8 = 0x0A;
/// Firmware trace service.
pub const SAP_TRACE: u8 = 0xA0;

// ============================================================================
// Dispatch tables
// ============================================================================

/// Builds a request payload from named parameters.
pub type EncodeFn = fn(&RequestParams) -> Result<Vec<u8>, ProtocolError>;

/// Decodes one message's fields into a report.
pub type DecodeFn =
    fn(&dyn ServiceAccessPoint, &PayloadReader<'_>, &mut Report) -> Result<(), ProtocolError>;

/// One request encoder, looked up by symbolic name.
pub struct EncoderEntry {
    /// Request name used by callers (e.g. `"pingDevice"`).
    pub name: &'static str,
    /// Message id placed in the frame header.
    pub msg_id: u8,
    /// Payload builder; validates its parameters.
    pub encode: EncodeFn,
}

/// One response or event decoder, looked up by message id.
pub struct DecoderEntry {
    /// Message id this entry handles.
    pub msg_id: u8,
    /// Display name recorded in the report.
    pub label: &'static str,
    /// Field decoder.
    pub decode: DecodeFn,
}

/// A named protocol sub-service with its dispatch tables.
///
/// Implementations return `'static` table slices built at compile time;
/// nothing is mutated after construction. Services without a given
/// capability (e.g. the trace service takes no requests) keep the default
/// empty tables.
pub trait ServiceAccessPoint {
    /// One-byte wire id, unique across the registry.
    fn sap_id(&self) -> u8;

    /// Registry name used by `submit_request`.
    fn name(&self) -> &'static str;

    /// Request encoders by symbolic name.
    fn encoders(&self) -> &'static [EncoderEntry] {
        &[]
    }

    /// Response decoders by message id.
    fn response_decoders(&self) -> &'static [DecoderEntry] {
        &[]
    }

    /// Event decoders by message id.
    fn event_decoders(&self) -> &'static [DecoderEntry] {
        &[]
    }

    /// Status-byte texts for this service's responses.
    fn status_codes(&self) -> &'static [(u8, &'static str)] {
        &[]
    }
}

// ============================================================================
// Shared dispatch
// ============================================================================

/// Build the request frame for a named encoder.
///
/// Fails with [`ProtocolError::UnknownEncoder`] if the service has no such
/// request; parameter validation errors surface from the entry's encode
/// function.
pub fn encode_request(
    sap: &dyn ServiceAccessPoint,
    name: &str,
    params: &RequestParams,
) -> Result<Frame, ProtocolError> {
    let entry = sap
        .encoders()
        .iter()
        .find(|e| e.name == name)
        .ok_or_else(|| ProtocolError::UnknownEncoder(name.to_owned()))?;
    let payload = (entry.encode)(params)?;
    Ok(Frame::new(sap.sap_id(), entry.msg_id, payload))
}

/// Decode a frame already routed to this service.
///
/// The response table is consulted before the event table; the two id
/// spaces are disjoint per service, so the precedence is a protocol
/// assumption rather than a tie-breaker. A message id in neither table is
/// [`ProtocolError::UnknownMessageId`].
pub fn decode_incoming(
    sap: &dyn ServiceAccessPoint,
    frame: &Frame,
) -> Result<Report, ProtocolError> {
    let reader = PayloadReader::new(&frame.payload);
    let mut report = Report::new();

    if let Some(entry) = find_decoder(sap.response_decoders(), frame.msg_id) {
        report.push("Response", entry.label);
        (entry.decode)(sap, &reader, &mut report)?;
    } else if let Some(entry) = find_decoder(sap.event_decoders(), frame.msg_id) {
        report.push("Event", entry.label);
        (entry.decode)(sap, &reader, &mut report)?;
    } else {
        return Err(ProtocolError::UnknownMessageId(frame.msg_id));
    }

    Ok(report)
}

/// Decode the status byte every response starts with.
///
/// Status values missing from the service's table render as
/// `"unknown status code"`; newer firmware may introduce codes this host
/// does not know yet.
pub fn decode_default_response(
    sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    let status = reader.status()?;
    let text = sap
        .status_codes()
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, text)| *text)
        .unwrap_or("unknown status code");
    report.push("Status", text);
    Ok(())
}

/// Payload builder for requests that carry no parameters.
pub fn encode_empty_request(_params: &RequestParams) -> Result<Vec<u8>, ProtocolError> {
    Ok(Vec::new())
}

fn find_decoder(table: &'static [DecoderEntry], msg_id: u8) -> Option<&'static DecoderEntry> {
    table.iter().find(|e| e.msg_id == msg_id)
}

// ============================================================================
// Request parameters
// ============================================================================

/// One named request argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Textual argument (mode names, option lists, hex strings).
    Text(String),
    /// Numeric argument.
    Uint(u32),
}

/// Named, service-specific request arguments.
///
/// Encoders pull arguments out with the typed accessors; a missing or
/// mistyped argument is [`ProtocolError::InvalidParameter`].
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    values: HashMap<String, ParamValue>,
}

impl RequestParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        RequestParams::default()
    }

    /// Add a textual parameter.
    pub fn with_text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values
            .insert(name.to_owned(), ParamValue::Text(value.into()));
        self
    }

    /// Add a numeric parameter.
    pub fn with_uint(mut self, name: &str, value: u32) -> Self {
        self.values.insert(name.to_owned(), ParamValue::Uint(value));
        self
    }

    /// Textual parameter by name.
    pub fn text(&self, name: &str) -> Result<&str, ProtocolError> {
        match self.get(name)? {
            ParamValue::Text(s) => Ok(s),
            ParamValue::Uint(_) => Err(ProtocolError::InvalidParameter(format!(
                "{} must be a string",
                name
            ))),
        }
    }

    /// Numeric parameter by name.
    pub fn uint(&self, name: &str) -> Result<u32, ProtocolError> {
        match self.get(name)? {
            ParamValue::Uint(v) => Ok(*v),
            ParamValue::Text(_) => Err(ProtocolError::InvalidParameter(format!(
                "{} must be numeric",
                name
            ))),
        }
    }

    /// Numeric parameter that must fit one byte.
    pub fn byte(&self, name: &str) -> Result<u8, ProtocolError> {
        let v = self.uint(name)?;
        u8::try_from(v).map_err(|_| {
            ProtocolError::InvalidParameter(format!("{} out of range: {}", name, v))
        })
    }

    /// `-`-separated hex parameter as bytes in natural order.
    pub fn hex_bytes(&self, name: &str) -> Result<Vec<u8>, ProtocolError> {
        let s = self.text(name)?;
        hex::decode(s.replace('-', "")).map_err(|_| {
            ProtocolError::InvalidParameter(format!("{} is not a hex string: {}", name, s))
        })
    }

    /// `-`-separated hex parameter as bytes, reversed for wire transmission.
    ///
    /// Addresses and EUIs are written most-significant-byte first but travel
    /// least-significant-byte first.
    pub fn hex_bytes_lsb(&self, name: &str) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = self.hex_bytes(name)?;
        bytes.reverse();
        Ok(bytes)
    }

    fn get(&self, name: &str) -> Result<&ParamValue, ProtocolError> {
        self.values
            .get(name)
            .ok_or_else(|| ProtocolError::InvalidParameter(format!("missing parameter: {}", name)))
    }
}
