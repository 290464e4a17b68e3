//! Host-to-overlay entry points.
//!
//! Each inbound call only translates its argument into a worker command and
//! enqueues it; the host never waits on overlay work.

use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::warn;

use super::registry::{BridgeArg, BridgeRegistry, Registration};
use crate::api::OverlayHandle;
use crate::workers::Command;

/// Functions the overlay exposes to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum InboundCall {
    UpdateStats,
    UpdateSettings,
    ImportSettingsFromNative,
    UpdateRuntimeStatus,
    ToggleSettings,
    ToggleWidgetsVisibility,
    CloseSettings,
    #[strum(serialize = "setHUDColor")]
    SetHudColor,
    OnSettingsSyncResult,
    OnExportResult,
}

impl InboundCall {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Translates the bridge argument; `None` when it has the wrong shape.
    fn command(self, arg: BridgeArg) -> Option<Command> {
        let text = || match &arg {
            BridgeArg::Text(text) => text.clone(),
            BridgeArg::Empty | BridgeArg::Flag(_) => String::new(),
        };

        let command = match self {
            InboundCall::UpdateStats => Command::UpdateStats(text()),
            InboundCall::UpdateSettings => Command::UpdateSettings(text()),
            InboundCall::ImportSettingsFromNative => Command::ImportSettings(text()),
            InboundCall::UpdateRuntimeStatus => Command::UpdateRuntimeStatus(text()),
            InboundCall::ToggleSettings => Command::ToggleSettings,
            InboundCall::ToggleWidgetsVisibility => Command::ToggleWidgetsVisibility,
            InboundCall::CloseSettings => Command::CloseSettings {
                request_unfocus: false,
            },
            InboundCall::SetHudColor => Command::SetHudColor(text()),
            InboundCall::OnSettingsSyncResult => Command::SettingsSyncResult(arg.as_flag()?),
            InboundCall::OnExportResult => Command::ExportResult(arg.as_flag()?),
        };
        Some(command)
    }
}

/// Registers every [`InboundCall`] on `registry`, forwarding to `handle`.
pub(crate) fn install(registry: &BridgeRegistry, handle: &OverlayHandle) -> Vec<Registration> {
    InboundCall::iter()
        .map(|call| {
            let handle = handle.clone();
            registry.register(call.name(), move |arg| match call.command(arg) {
                Some(command) => handle.dispatch(command),
                None => warn!(target: "overlay::bridge", call = call.name(), "ignoring call with malformed argument"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_host_functions() {
        assert_eq!(InboundCall::SetHudColor.name(), "setHUDColor");
        assert_eq!(InboundCall::ImportSettingsFromNative.name(), "importSettingsFromNative");
        assert_eq!("onSettingsSyncResult".parse::<InboundCall>().ok(), Some(InboundCall::OnSettingsSyncResult));
        assert_eq!(InboundCall::iter().count(), 10);
    }

    #[test]
    fn result_callbacks_need_a_boolean() {
        assert!(InboundCall::OnExportResult.command(BridgeArg::Empty).is_none());
        assert!(matches!(
            InboundCall::OnSettingsSyncResult.command(BridgeArg::Flag(false)),
            Some(Command::SettingsSyncResult(false))
        ));
    }
}
