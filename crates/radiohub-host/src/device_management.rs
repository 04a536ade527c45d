//! Device Management service access point.
//!
//! Administrative commands of the radio module: ping, device and firmware
//! identification, restart, real-time clock access, and the system-option
//! bitmask. Also decodes the startup indication the module emits after a
//! reset.

use radiohub_protocol::{PayloadReader, ProtocolError, EVENT_DATA_INDEX, RESPONSE_DATA_INDEX};

use crate::report::Report;
use crate::sap::{
    decode_default_response, encode_empty_request, DecoderEntry, EncoderEntry, RequestParams,
    ServiceAccessPoint, SAP_DEVICE_MGMT,
};

// ============================================================================
// Message ids
// ============================================================================

/// Unsolicited startup indication after reset.
pub const MSG_STARTUP_IND: u8 = 0x00;
pub const MSG_PING_DEVICE_REQ: u8 = 0x01;
pub const MSG_PING_DEVICE_RSP: u8 = 0x02;
pub const MSG_GET_DEVICE_INFO_REQ: u8 = 0x03;
pub const MSG_GET_DEVICE_INFO_RSP: u8 = 0x04;
pub const MSG_GET_FIRMWARE_INFO_REQ: u8 = 0x05;
pub const MSG_GET_FIRMWARE_INFO_RSP: u8 = 0x06;
pub const MSG_RESTART_DEVICE_REQ: u8 = 0x07;
pub const MSG_RESTART_DEVICE_RSP: u8 = 0x08;
pub const MSG_SET_DATE_TIME_REQ: u8 = 0x0D;
pub const MSG_SET_DATE_TIME_RSP: u8 = 0x0E;
pub const MSG_GET_DATE_TIME_REQ: u8 = 0x0F;
pub const MSG_GET_DATE_TIME_RSP: u8 = 0x10;
pub const MSG_SET_SYSTEM_OPTIONS_REQ: u8 = 0xF7;
pub const MSG_SET_SYSTEM_OPTIONS_RSP: u8 = 0xF8;
pub const MSG_GET_SYSTEM_OPTIONS_REQ: u8 = 0xF9;
pub const MSG_GET_SYSTEM_OPTIONS_RSP: u8 = 0xFA;

// ============================================================================
// System option bits
// ============================================================================

pub const SYS_OPT_APS: u32 = 0x01;
pub const SYS_OPT_TRACE: u32 = 0x02;
pub const SYS_OPT_RTC: u32 = 0x04;
pub const SYS_OPT_WATCHDOG: u32 = 0x08;
pub const SYS_OPT_STARTUP_EVENT: u32 = 0x10;

const SYSTEM_OPTIONS: &[(&str, u32)] = &[
    ("APS", SYS_OPT_APS),
    ("Trace", SYS_OPT_TRACE),
    ("RTC", SYS_OPT_RTC),
    ("WatchDog", SYS_OPT_WATCHDOG),
    ("StartupEvent", SYS_OPT_STARTUP_EVENT),
];

const STATUS_CODES: &[(u8, &str)] = &[
    (0x00, "ok"),
    (0x01, "error"),
    (0x02, "command not supported"),
    (0x03, "wrong parameter"),
    (0x04, "wrong application mode"),
    (0x05, "reserved"),
    (0x06, "application busy"),
    (0x07, "wrong message length"),
    (0x08, "NVM write error"),
    (0x09, "NVM read error"),
    (0x0A, "Command rejected"),
];

/// Radio module types by module id byte.
const MODULE_TYPES: &[(u8, &str)] = &[
    (104, "iM284A-XL"),
    (109, "iM891A-XL"),
    (110, "iU891A-XL"),
    (163, "iM881A-XL"),
];

fn module_type_name(module: u8) -> Option<&'static str> {
    MODULE_TYPES
        .iter()
        .find(|(id, _)| *id == module)
        .map(|(_, name)| *name)
}

// ============================================================================
// Request encoders
// ============================================================================

fn encode_set_date_time(params: &RequestParams) -> Result<Vec<u8>, ProtocolError> {
    let secs = params.uint("SecondsSinceEpoch")?;
    Ok(secs.to_le_bytes().to_vec())
}

/// Build the mask/options word pair from an option list.
///
/// The `Options` parameter is a `", "`-separated list of `"<Name> = on"` /
/// `"<Name> = off"` clauses; named options go into the mask, the `on` ones
/// additionally into the option word.
fn encode_set_system_options(params: &RequestParams) -> Result<Vec<u8>, ProtocolError> {
    let list = params.text("Options")?;

    let mut mask = 0u32;
    let mut options = 0u32;

    for clause in list.split(", ") {
        let (name, state) = clause.split_once(" = ").ok_or_else(|| {
            ProtocolError::InvalidParameter(format!("malformed option clause: {}", clause))
        })?;
        let bit = SYSTEM_OPTIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, bit)| *bit)
            .ok_or_else(|| {
                ProtocolError::InvalidParameter(format!("unknown system option: {}", name))
            })?;
        match state {
            "on" => {
                mask |= bit;
                options |= bit;
            }
            "off" => mask |= bit,
            _ => {
                return Err(ProtocolError::InvalidParameter(format!(
                    "option state must be on or off: {}",
                    clause
                )))
            }
        }
    }

    let mut payload = Vec::with_capacity(8);
    payload.extend_from_slice(&mask.to_le_bytes());
    payload.extend_from_slice(&options.to_le_bytes());
    Ok(payload)
}

// ============================================================================
// Response decoders
// ============================================================================

fn decode_device_info(
    sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    decode_default_response(sap, reader, report)?;
    let index = RESPONSE_DATA_INDEX;
    let module = reader.u8_at(index)?;
    report.push(
        "Module Type",
        module_type_name(module)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("unknown module type:{}", module)),
    );
    report.push("Module ID", reader.u32_at(index + 1)?.to_string());
    report.push("Product Type", reader.hex_at(index + 5, 4)?);
    report.push("Product ID", reader.hex_at(index + 9, 4)?);
    Ok(())
}

fn decode_firmware_info(
    sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    decode_default_response(sap, reader, report)?;
    let index = RESPONSE_DATA_INDEX;
    // Minor version travels before major.
    report.push(
        "Version",
        format!("{}.{}", reader.u8_at(index + 1)?, reader.u8_at(index)?),
    );
    report.push("Build Count", reader.u16_at(index + 2)?.to_string());
    report.push("Build Date", reader.str_at(index + 4, 10)?);
    report.push("Firmware Name", reader.str_to_end(index + 14)?);
    Ok(())
}

fn decode_date_time(
    sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    decode_default_response(sap, reader, report)?;
    let date_time = reader.datetime_at(RESPONSE_DATA_INDEX)?;
    report.push(
        "Date Time",
        date_time.format("%d.%m.%Y %H:%M:%S").to_string(),
    );
    Ok(())
}

fn decode_system_options(
    sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    decode_default_response(sap, reader, report)?;
    let options = reader.u32_at(RESPONSE_DATA_INDEX)?;
    for (name, bit) in SYSTEM_OPTIONS {
        report.push(
            format!("Options.{}", name),
            if options & bit != 0 { "on" } else { "off" },
        );
    }
    Ok(())
}

// ============================================================================
// Event decoders
// ============================================================================

/// Startup indication: device identification followed by firmware
/// identification, no status byte.
fn decode_startup(
    _sap: &dyn ServiceAccessPoint,
    reader: &PayloadReader<'_>,
    report: &mut Report,
) -> Result<(), ProtocolError> {
    let index = EVENT_DATA_INDEX;

    let module = reader.u8_at(index)?;
    report.push(
        "Module Type",
        module_type_name(module).unwrap_or("unknown module type"),
    );
    report.push("Module ID", reader.u32_at(index + 1)?.to_string());
    report.push("Product Type", reader.hex_at(index + 5, 4)?);
    report.push("Product ID", reader.hex_at(index + 9, 4)?);

    report.push(
        "Version",
        format!(
            "{}.{}",
            reader.u8_at(index + 14)?,
            reader.u8_at(index + 13)?
        ),
    );
    report.push("Build Count", reader.u16_at(index + 15)?.to_string());
    report.push("Build Date", reader.str_at(index + 17, 10)?);
    report.push("Firmware Name", reader.str_to_end(index + 27)?);
    Ok(())
}

// ============================================================================
// Tables
// ============================================================================

const ENCODERS: &[EncoderEntry] = &[
    EncoderEntry {
        name: "pingDevice",
        msg_id: MSG_PING_DEVICE_REQ,
        encode: encode_empty_request,
    },
    EncoderEntry {
        name: "getDeviceInfo",
        msg_id: MSG_GET_DEVICE_INFO_REQ,
        encode: encode_empty_request,
    },
    EncoderEntry {
        name: "getFirmwareInfo",
        msg_id: MSG_GET_FIRMWARE_INFO_REQ,
        encode: encode_empty_request,
    },
    EncoderEntry {
        name: "getDateTime",
        msg_id: MSG_GET_DATE_TIME_REQ,
        encode: encode_empty_request,
    },
    EncoderEntry {
        name: "setDateTime",
        msg_id: MSG_SET_DATE_TIME_REQ,
        encode: encode_set_date_time,
    },
    EncoderEntry {
        name: "restartDevice",
        msg_id: MSG_RESTART_DEVICE_REQ,
        encode: encode_empty_request,
    },
    EncoderEntry {
        name: "setSystemOptions",
        msg_id: MSG_SET_SYSTEM_OPTIONS_REQ,
        encode: encode_set_system_options,
    },
    EncoderEntry {
        name: "getSystemOptions",
        msg_id: MSG_GET_SYSTEM_OPTIONS_REQ,
        encode: encode_empty_request,
    },
];

const RESPONSE_DECODERS: &[DecoderEntry] = &[
    DecoderEntry {
        msg_id: MSG_PING_DEVICE_RSP,
        label: "pingDevice response",
        decode: decode_default_response,
    },
    DecoderEntry {
        msg_id: MSG_GET_DEVICE_INFO_RSP,
        label: "getDeviceInfo response",
        decode: decode_device_info,
    },
    DecoderEntry {
        msg_id: MSG_GET_FIRMWARE_INFO_RSP,
        label: "getFirmwareInfo response",
        decode: decode_firmware_info,
    },
    DecoderEntry {
        msg_id: MSG_GET_DATE_TIME_RSP,
        label: "getDateTime response",
        decode: decode_date_time,
    },
    DecoderEntry {
        msg_id: MSG_SET_DATE_TIME_RSP,
        label: "setDateTime response",
        decode: decode_default_response,
    },
    DecoderEntry {
        msg_id: MSG_RESTART_DEVICE_RSP,
        label: "restartDevice response",
        decode: decode_default_response,
    },
    DecoderEntry {
        msg_id: MSG_GET_SYSTEM_OPTIONS_RSP,
        label: "getSystemOptions response",
        decode: decode_system_options,
    },
    DecoderEntry {
        msg_id: MSG_SET_SYSTEM_OPTIONS_RSP,
        label: "setSystemOptions response",
        decode: decode_default_response,
    },
];

const EVENT_DECODERS: &[DecoderEntry] = &[DecoderEntry {
    msg_id: MSG_STARTUP_IND,
    label: "startup indication",
    decode: decode_startup,
}];

/// The Device Management SAP.
pub struct DeviceManagement;

impl ServiceAccessPoint for DeviceManagement {
    fn sap_id(&self) -> u8 {
        SAP_DEVICE_MGMT
    }

    fn name(&self) -> &'static str {
        "DeviceMgmt"
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
