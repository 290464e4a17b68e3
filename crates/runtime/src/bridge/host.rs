//! Outbound calls from the overlay to the host.

use strum::{EnumIter, EnumString, IntoStaticStr};
use tracing::{debug, trace};

use super::registry::{BridgeAddress, BridgeArg, BridgeRegistry};

/// Callbacks the host installs to hear from the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum OutboundCall {
    OnSettingsChanged,
    OnImportResult,
    OnExportSettings,
    OnRequestUnfocus,
}

impl OutboundCall {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Receiver of every overlay-to-host call. Calls are fire-and-forget.
pub trait HostSink: Send + Sync {
    /// Debounced, revision-tagged settings JSON for persistence.
    fn on_settings_changed(&self, json: String);

    fn on_import_result(&self, success: bool);

    /// Plain settings JSON the user asked to export.
    fn on_export_settings(&self, json: String);

    fn on_request_unfocus(&self, reason: String);
}

impl BridgeRegistry {
    fn call_host(&self, call: OutboundCall, arg: BridgeArg) {
        if self.invoke(BridgeAddress::Legacy(call.name()), arg) {
            trace!(target: "overlay::bridge", call = call.name(), "host call delivered");
        } else {
            debug!(target: "overlay::bridge", call = call.name(), "host has no callback installed; dropping call");
        }
    }
}

/// The host installs outbound callbacks on the same registry it calls into.
impl HostSink for BridgeRegistry {
    fn on_settings_changed(&self, json: String) {
        self.call_host(OutboundCall::OnSettingsChanged, BridgeArg::Text(json));
    }

    fn on_import_result(&self, success: bool) {
        self.call_host(OutboundCall::OnImportResult, BridgeArg::Flag(success));
    }

    fn on_export_settings(&self, json: String) {
        self.call_host(OutboundCall::OnExportSettings, BridgeArg::Text(json));
    }

    fn on_request_unfocus(&self, reason: String) {
        self.call_host(OutboundCall::OnRequestUnfocus, BridgeArg::Text(reason));
    }
}
