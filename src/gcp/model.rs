//! Compute Engine resources
//!
//! Pass-through representations of the API's `Image`, `Instance` and `Operation`
//! resources. Fields the crate reads are typed; everything else lands in `extra`
//! so a value decoded from the API encodes back to the same document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The API encodes 64-bit integers as JSON strings; accept numbers too.
mod int64 {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr<T> {
        Text(String),
        Number(T),
    }

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Display,
    {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + Deserialize<'de>,
        T::Err: Display,
    {
        match Option::<Repr<T>>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Repr::Number(n)) => Ok(Some(n)),
            Some(Repr::Text(s)) => s.parse().map(Some).map_err(de::Error::custom),
        }
    }
}

// =============================================================================
// Images
// =============================================================================

/// A boot disk image, looked up by name or as the newest member of a family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `PENDING`, `READY`, `FAILED` or `DELETING`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub archive_size_bytes: Option<i64>,
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Instances
// =============================================================================

/// A VM instance. Used both as the insert request body and the get response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Zone URL on responses; may be left unset on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// e.g. `zones/us-central1-a/machineTypes/e2-medium`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_ip_forward: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_protection: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<AttachedDisk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_accounts: Vec<ServiceAccount>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// `PERSISTENT` or `SCRATCH`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Existing disk URL; mutually exclusive with `initialize_params`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialize_params: Option<AttachedDiskInitializeParams>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDiskInitializeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,
    #[serde(rename = "networkIP", default, skip_serializing_if = "Option::is_none")]
    pub network_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_configs: Vec<AccessConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Usually `ONE_TO_ONE_NAT`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub access_type: Option<String>,
    #[serde(rename = "natIP", default, skip_serializing_if = "Option::is_none")]
    pub nat_ip: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<MetadataItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataItem {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Operations
// =============================================================================

/// Lifecycle state reported for an [`Operation`].
///
/// Values this crate does not know are kept verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
    Unknown(String),
}

impl OperationStatus {
    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for OperationStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PENDING" => Self::Pending,
            "RUNNING" => Self::Running,
            "DONE" => Self::Done,
            _ => Self::Unknown(raw),
        }
    }
}

impl Serialize for OperationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OperationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Snapshot of a provider-side asynchronous action.
///
/// Returned by insert/delete and by zone operation lookups. The facade never
/// tracks these; callers poll [`zone_operations_get`](super::service::ComputeService::zone_operations_get)
/// with `name` until [`is_done`](Operation::is_done).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// `insert`, `delete`, `start`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OperationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    /// 0-100, advisory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub target_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_error_status_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrors>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<OperationWarning>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationErrors {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<OperationErrorItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationErrorItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Structured details such as `quotaInfo` or `errorInfo`, kept as sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationWarning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<WarningData>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarningData {
    pub key: String,
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Operation {
    /// The provider reports the operation as finished (successfully or not).
    pub fn is_done(&self) -> bool {
        self.status == Some(OperationStatus::Done)
    }

    /// Errors attached to the operation, empty while running or on success.
    pub fn errors(&self) -> &[OperationErrorItem] {
        self.error.as_ref().map(|e| e.errors.as_slice()).unwrap_or_default()
    }

    /// Finished without errors.
    pub fn succeeded(&self) -> bool {
        self.is_done() && self.errors().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_decodes_string_encoded_sizes() {
        let image: Image = serde_json::from_value(json!({
            "kind": "compute#image",
            "id": "8043624917523372044",
            "name": "debian-12-bookworm-v20240910",
            "family": "debian-12",
            "archiveSizeBytes": "544",
            "diskSizeGb": "10",
            "status": "READY"
        }))
        .unwrap();

        assert_eq!(image.id, Some(8043624917523372044));
        assert_eq!(image.archive_size_bytes, Some(544));
        assert_eq!(image.disk_size_gb, Some(10));
        assert_eq!(image.extra.get("kind"), Some(&json!("compute#image")));
    }

    #[test]
    fn test_int64_accepts_numbers() {
        let op: Operation = serde_json::from_value(json!({"id": 4501, "targetId": "77"})).unwrap();
        assert_eq!(op.id, Some(4501));
        assert_eq!(op.target_id, Some(77));
    }

    #[test]
    fn test_int64_rejects_garbage() {
        let result = serde_json::from_value::<Image>(json!({"archiveSizeBytes": "lots"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_instance_round_trips_unknown_fields() {
        let document = json!({
            "name": "vm-1",
            "zone": "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a",
            "machineType": "zones/us-central1-a/machineTypes/e2-medium",
            "scheduling": {"preemptible": true, "onHostMaintenance": "TERMINATE"},
            "disks": [{
                "boot": true,
                "autoDelete": true,
                "type": "PERSISTENT",
                "initializeParams": {
                    "sourceImage": "projects/debian-cloud/global/images/family/debian-12",
                    "diskSizeGb": "20",
                    "provisionedIops": "3000"
                }
            }],
            "networkInterfaces": [{
                "network": "global/networks/default",
                "networkIP": "10.0.0.2",
                "accessConfigs": [{"type": "ONE_TO_ONE_NAT", "name": "External NAT", "natIP": "34.1.2.3"}]
            }],
            "metadata": {"items": [{"key": "startup-script", "value": "echo hi"}]},
            "labels": {"env": "test"}
        });

        let instance: Instance = serde_json::from_value(document.clone()).unwrap();
        assert_eq!(instance.disks[0].initialize_params.as_ref().unwrap().disk_size_gb, Some(20));
        assert_eq!(instance.network_interfaces[0].access_configs[0].nat_ip.as_deref(), Some("34.1.2.3"));
        assert!(instance.extra.contains_key("scheduling"));

        assert_eq!(serde_json::to_value(&instance).unwrap(), document);
    }

    #[test]
    fn test_default_instance_encodes_empty_object() {
        assert_eq!(serde_json::to_value(Instance::default()).unwrap(), json!({}));
    }

    #[test]
    fn test_operation_state_helpers() {
        let running: Operation = serde_json::from_value(json!({"status": "RUNNING", "progress": 40})).unwrap();
        assert!(!running.is_done());
        assert!(running.errors().is_empty());

        let failed: Operation = serde_json::from_value(json!({
            "status": "DONE",
            "error": {"errors": [{"code": "ZONE_RESOURCE_POOL_EXHAUSTED", "message": "no capacity"}]}
        }))
        .unwrap();
        assert!(failed.is_done());
        assert!(!failed.succeeded());
        assert_eq!(failed.errors()[0].code.as_deref(), Some("ZONE_RESOURCE_POOL_EXHAUSTED"));

        let done: Operation = serde_json::from_value(json!({"status": "DONE"})).unwrap();
        assert!(done.succeeded());
    }

    #[test]
    fn test_unrecognised_status_is_tolerated() {
        let op: Operation = serde_json::from_value(json!({"status": "SUSPENDING"})).unwrap();
        assert_eq!(op.status, Some(OperationStatus::Unknown("SUSPENDING".to_string())));
        assert!(!op.is_done());
        assert_eq!(serde_json::to_value(&op).unwrap(), json!({"status": "SUSPENDING"}));
    }

    #[test]
    fn test_operation_error_details_round_trip() {
        let document = json!({
            "status": "DONE",
            "error": {
                "errors": [{
                    "code": "QUOTA_EXCEEDED",
                    "message": "Quota 'CPUS' exceeded. Limit: 24.0 in region us-central1.",
                    "errorDetails": [{
                        "quotaInfo": {
                            "metricName": "compute.googleapis.com/cpus",
                            "limitName": "CPUS-per-project-region",
                            "dimensions": {"region": "us-central1"},
                            "limit": 24
                        }
                    }]
                }]
            },
            "warnings": [{
                "code": "LARGE_DEPLOYMENT_WARNING",
                "message": "large",
                "data": [{"key": "zone", "value": "us-central1-a", "scope": "zonal"}],
                "help": "see docs"
            }]
        });

        let op: Operation = serde_json::from_value(document.clone()).unwrap();
        assert_eq!(op.errors()[0].code.as_deref(), Some("QUOTA_EXCEEDED"));
        assert!(op.errors()[0].extra.contains_key("errorDetails"));

        assert_eq!(serde_json::to_value(&op).unwrap(), document);
    }

    #[test]
    fn test_nested_instance_fields_round_trip() {
        let document = json!({
            "name": "vm-1",
            "metadata": {"items": [{"key": "ssh-keys", "value": "k", "kind": "x"}]},
            "tags": {"items": ["http"], "kind": "y"},
            "serviceAccounts": [{"email": "sa@p.iam.gserviceaccount.com", "scopes": [], "extraField": true}]
        });

        let instance: Instance = serde_json::from_value(document.clone()).unwrap();
        let mut expected = document;
        // empty lists are omitted on encode
        expected["serviceAccounts"][0].as_object_mut().unwrap().remove("scopes");
        assert_eq!(serde_json::to_value(&instance).unwrap(), expected);
    }
}
