//! Host double that installs outbound callbacks on the bridge and records them.

use std::sync::{Arc, Mutex};

use overlay_runtime::{BridgeArg, BridgeRegistry, OutboundCall, Registration};
use strum::IntoEnumIterator;

#[derive(Clone, Debug, PartialEq)]
pub struct HostCall {
    pub name: &'static str,
    pub arg: BridgeArg,
}

pub struct RecordingHost {
    calls: Arc<Mutex<Vec<HostCall>>>,
    _registrations: Vec<Registration>,
}

impl RecordingHost {
    pub fn install(bridge: &BridgeRegistry) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registrations = OutboundCall::iter()
            .map(|call| {
                let calls = Arc::clone(&calls);
                bridge.register(call.name(), move |arg| {
                    calls.lock().unwrap().push(HostCall { name: call.name(), arg });
                })
            })
            .collect();
        Self {
            calls,
            _registrations: registrations,
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, call: OutboundCall) -> Vec<BridgeArg> {
        self.calls()
            .into_iter()
            .filter(|recorded| recorded.name == call.name())
            .map(|recorded| recorded.arg)
            .collect()
    }

    /// Decoded payloads of every `onSettingsChanged` call so far.
    pub fn settings_writes(&self) -> Vec<serde_json::Value> {
        self.calls_to(OutboundCall::OnSettingsChanged)
            .into_iter()
            .filter_map(|arg| serde_json::from_str(arg.as_text()?).ok())
            .collect()
    }
}
