//! The radio hub: frame reassembly and service dispatch.
//!
//! One `RadioHub` owns the transport, the SLIP reassembly state, and the
//! registry of service access points keyed by SAP id. Inbound bytes flow
//! from the transport through the framer and frame codec to the owning
//! SAP; every reassembled frame
//! produces exactly one [`Outcome`] on the caller's sink, error or not, and
//! a bad frame never stops processing of the ones behind it.

use std::collections::BTreeMap;
use std::io;

use log::{debug, warn};
use radiohub_protocol::{slip, Frame, ProtocolError, SlipDecoder};

use crate::device_management::DeviceManagement;
use crate::mesh_router::LoRaMeshRouter;
use crate::report::Report;
use crate::sap::{decode_incoming, encode_request, RequestParams, ServiceAccessPoint};
use crate::trace::Trace;
use crate::transport::Transport;

/// One notification delivered to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A request was encoded and written to the transport.
    Request(Report),
    /// An inbound response or event was decoded.
    Incoming(Report),
    /// A frame or request could not be processed.
    Failed(ProtocolError),
}

/// Caller-supplied notification channel.
///
/// Implemented for any `FnMut(Outcome)` closure.
pub trait NotificationSink {
    /// Deliver one outcome.
    fn notify(&mut self, outcome: Outcome);
}

impl<F: FnMut(Outcome)> NotificationSink for F {
    fn notify(&mut self, outcome: Outcome) {
        self(outcome)
    }
}

/// Dispatcher over a set of service access points.
///
/// The hub is single-owner state: the reassembly buffer mutates on every
/// poll, so a multi-threaded host must confine each instance to one task
/// or guard it with a mutex.
pub struct RadioHub<T: Transport> {
    transport: T,
    decoder: SlipDecoder,
    saps: BTreeMap<u8, Box<dyn ServiceAccessPoint>>,
}

impl<T: Transport> RadioHub<T> {
    /// Create a hub with the standard services registered: Device
    /// Management, LoRa Mesh Router, and Trace.
    pub fn new(transport: T) -> Self {
        let mut hub = RadioHub {
            transport,
            decoder: SlipDecoder::new(),
            saps: BTreeMap::new(),
        };
        // The standard set has pairwise distinct ids.
        for sap in [
            Box::new(DeviceManagement) as Box<dyn ServiceAccessPoint>,
            Box::new(LoRaMeshRouter),
            Box::new(Trace),
        ] {
            hub.saps.insert(sap.sap_id(), sap);
        }
        hub
    }

    /// Register an additional service access point.
    ///
    /// SAP ids are unique across the registry; a duplicate id is a startup
    /// configuration error, not a runtime condition.
    pub fn register(&mut self, sap: Box<dyn ServiceAccessPoint>) -> Result<(), ProtocolError> {
        let id = sap.sap_id();
        if self.saps.contains_key(&id) {
            return Err(ProtocolError::DuplicateSap(id));
        }
        self.saps.insert(id, sap);
        Ok(())
    }

    /// Encode and send a named request, fire-and-forget.
    ///
    /// No response correlation state is kept; the device's reply arrives
    /// later through [`RadioHub::poll_incoming`] like any other frame.
    /// Unknown service or request names are reported through the sink;
    /// only transport failures surface as `io::Error`.
    pub fn submit_request(
        &mut self,
        sap_name: &str,
        request: &str,
        params: &RequestParams,
        sink: &mut dyn NotificationSink,
    ) -> io::Result<()> {
        let Some(sap) = self.saps.values().find(|s| s.name() == sap_name) else {
            sink.notify(Outcome::Failed(ProtocolError::UnknownSapName(
                sap_name.to_owned(),
            )));
            return Ok(());
        };

        match encode_request(sap.as_ref(), request, params) {
            Ok(frame) => {
                debug!(
                    "request {} -> sap 0x{:02X} msg 0x{:02X}",
                    request, frame.sap_id, frame.msg_id
                );
                self.transport.write(&slip::encode(&frame.encode()))?;

                let mut report = Report::new();
                report.push("Request", format!("{} request", request));
                sink.notify(Outcome::Request(report));
            }
            Err(e) => sink.notify(Outcome::Failed(e)),
        }
        Ok(())
    }

    /// Feed raw transport bytes through reassembly and dispatch.
    ///
    /// Every frame completed by `raw` yields one notification: the decoded
    /// report, or the error that stopped it. Processing always continues
    /// with the next frame.
    pub fn poll_incoming(&mut self, raw: &[u8], sink: &mut dyn NotificationSink) {
        for blob in self.decoder.push(raw) {
            let frame = match Frame::decode(&blob) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("dropping frame: {}", e);
                    sink.notify(Outcome::Failed(e));
                    continue;
                }
            };

            match self.saps.get(&frame.sap_id) {
                Some(sap) => match decode_incoming(sap.as_ref(), &frame) {
                    Ok(report) => sink.notify(Outcome::Incoming(report)),
                    Err(e) => sink.notify(Outcome::Failed(e)),
                },
                None => sink.notify(Outcome::Failed(ProtocolError::UnknownSap(frame.sap_id))),
            }
        }
    }

    /// One polling step: read whatever the transport has pending and
    /// dispatch it. Nothing pending is a normal empty step.
    pub fn process(&mut self, sink: &mut dyn NotificationSink) -> io::Result<()> {
        let data = self.transport.read()?;
        if !data.is_empty() {
            self.poll_incoming(&data, sink);
        }
        Ok(())
    }

    /// Access the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
