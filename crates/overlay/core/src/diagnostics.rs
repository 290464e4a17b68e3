//! Host runtime compatibility report.

use serde::Serialize;
use serde_json::Value;
use strum::{EnumString, IntoStaticStr};

use crate::readers::{self, field};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RuntimeWarningCode {
    #[default]
    None,
    UnsupportedRuntime,
    MissingAddressLibrary,
    UnsupportedRuntimeAndMissingAddressLibrary,
}

/// What the host reported about its game runtime and address library.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeDiagnostics {
    pub runtime_version: String,
    pub skse_version: String,
    pub address_library_path: String,
    pub address_library_present: bool,
    pub runtime_supported: bool,
    pub uses_address_library: bool,
    pub warning_code: RuntimeWarningCode,
}

impl RuntimeDiagnostics {
    /// Normalizes a raw status record; `None` unless `raw` is an object.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let raw = Some(readers::as_object(raw)?);
        Some(Self {
            runtime_version: readers::read_text(field(raw, "runtimeVersion"), "", true),
            skse_version: readers::read_text(field(raw, "skseVersion"), "", true),
            address_library_path: readers::read_text(field(raw, "addressLibraryPath"), "", true),
            address_library_present: readers::read_bool(field(raw, "addressLibraryPresent"), true),
            runtime_supported: readers::read_bool(field(raw, "runtimeSupported"), true),
            uses_address_library: readers::read_bool(field(raw, "usesAddressLibrary"), true),
            warning_code: readers::read_enum(field(raw, "warningCode"), RuntimeWarningCode::None),
        })
    }

    pub fn has_warning(&self) -> bool {
        self.warning_code != RuntimeWarningCode::None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_fields_take_permissive_defaults() {
        let diagnostics = RuntimeDiagnostics::from_raw(&json!({"runtimeVersion": "1.6.1170"})).unwrap();

        assert_eq!(diagnostics.runtime_version, "1.6.1170");
        assert_eq!(diagnostics.skse_version, "");
        assert!(diagnostics.address_library_present);
        assert!(diagnostics.runtime_supported);
        assert!(!diagnostics.has_warning());
    }

    #[test]
    fn warning_codes_parse_or_default_to_none() {
        let known = RuntimeDiagnostics::from_raw(&json!({"warningCode": "missing-address-library"})).unwrap();
        let unknown = RuntimeDiagnostics::from_raw(&json!({"warningCode": "on-fire"})).unwrap();

        assert_eq!(known.warning_code, RuntimeWarningCode::MissingAddressLibrary);
        assert_eq!(unknown.warning_code, RuntimeWarningCode::None);
    }

    #[test]
    fn non_objects_clear_the_report() {
        assert_eq!(RuntimeDiagnostics::from_raw(&json!(null)), None);
        assert_eq!(RuntimeDiagnostics::from_raw(&json!("ok")), None);
    }
}
