use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::Error;

/// The classified remote host pool: at most one coordination host (the
/// instance tagged `Root`) plus every other reachable instance as a worker.
/// Built once from the instance-description document, immutable after.
#[derive(Debug, Clone, Default)]
pub struct InstancePool {
    pub root: Option<String>,
    pub workers: Vec<String>,
}

/// Container structure of an `ec2 describe-instances` document. Instances are
/// kept as raw values so a malformed record spoils only itself.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Document {
    reservations: Vec<Reservation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceRecord {
    private_ip_address: String,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Tag {
    #[serde(default)]
    value: String,
}

/// Best-effort decode of one instance record. Records without a private IP,
/// or otherwise malformed, yield `None` and are skipped. Returns the IP and
/// whether the record carries the `Root` tag.
fn decode_record(record: Value) -> Option<(String, bool)> {
    let record: InstanceRecord = serde_json::from_value(record).ok()?;
    let is_root = record.tags.first().is_some_and(|tag| tag.value == "Root");
    Some((record.private_ip_address, is_root))
}

impl InstancePool {
    /// Read and parse the description file. `None` (or never calling this)
    /// marks the run local-only.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let document = std::fs::read_to_string(path)?;
        Self::from_document(&document)
    }

    /// Parse a description document into a pool.
    ///
    /// Fails only when the document is not a `Reservations` container of
    /// `Instances` lists. The first `Root`-tagged instance becomes the
    /// coordination host; later `Root` tags are ignored; every other instance
    /// with an IP joins the worker pool.
    pub fn from_document(document: &str) -> crate::Result<Self> {
        let document: Document =
            serde_json::from_str(document).map_err(|err| Error::Discovery(err.to_string()))?;
        let mut pool = Self::default();
        for reservation in document.reservations {
            for record in reservation.instances {
                let Some((ip, is_root)) = decode_record(record) else {
                    continue;
                };
                if is_root {
                    pool.root.get_or_insert(ip);
                } else {
                    pool.workers.push(ip);
                }
            }
        }
        info!(
            workers = pool.workers.len(),
            root = pool.root.is_some(),
            "discovered instance pool"
        );
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn classifies_root_and_workers() {
        let document = r#"{
            "Reservations": [
                {"Instances": [
                    {"PrivateIpAddress": "10.0.0.1", "Tags": [{"Key": "Name", "Value": "Root"}]},
                    {"PrivateIpAddress": "10.0.0.2"},
                    {"PrivateIpAddress": "10.0.0.3", "Tags": []}
                ]}
            ]
        }"#;
        let pool = InstancePool::from_document(document).unwrap();
        assert_eq!(pool.root.as_deref(), Some("10.0.0.1"));
        assert_eq!(pool.workers, ["10.0.0.2", "10.0.0.3"]);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let document = r#"{
            "Reservations": [
                {"Instances": [
                    {"State": "pending"},
                    {"PrivateIpAddress": 42},
                    "not even an object",
                    {"PrivateIpAddress": "10.0.0.9", "Tags": [{"Value": "Root"}]},
                    {"PrivateIpAddress": "10.0.0.7"}
                ]},
                {"Instances": [{"PrivateIpAddress": "10.0.0.8"}]},
                {}
            ]
        }"#;
        let pool = InstancePool::from_document(document).unwrap();
        assert_eq!(pool.root.as_deref(), Some("10.0.0.9"));
        assert_eq!(pool.workers, ["10.0.0.7", "10.0.0.8"]);
    }

    #[test]
    fn first_root_wins() {
        let document = r#"{
            "Reservations": [
                {"Instances": [
                    {"PrivateIpAddress": "10.0.0.1", "Tags": [{"Value": "Root"}]},
                    {"PrivateIpAddress": "10.0.0.2", "Tags": [{"Value": "Root"}]}
                ]}
            ]
        }"#;
        let pool = InstancePool::from_document(document).unwrap();
        assert_eq!(pool.root.as_deref(), Some("10.0.0.1"));
        assert!(pool.workers.is_empty());
    }

    #[test]
    fn tagged_but_not_root_is_a_worker() {
        let document = r#"{
            "Reservations": [
                {"Instances": [
                    {"PrivateIpAddress": "10.0.0.5", "Tags": [{"Value": "bench-3"}]}
                ]}
            ]
        }"#;
        let pool = InstancePool::from_document(document).unwrap();
        assert!(pool.root.is_none());
        assert_eq!(pool.workers, ["10.0.0.5"]);
    }

    #[test]
    fn unparseable_container_is_fatal() {
        assert!(matches!(
            InstancePool::from_document("[]"),
            Err(Error::Discovery(_))
        ));
        assert!(matches!(
            InstancePool::from_document(r#"{"Spot": []}"#),
            Err(Error::Discovery(_))
        ));
        assert!(matches!(
            InstancePool::from_document("not json"),
            Err(Error::Discovery(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"Reservations": [{{"Instances": [{{"PrivateIpAddress": "10.0.0.4"}}]}}]}}"#
        )
        .unwrap();
        let pool = InstancePool::load(file.path()).unwrap();
        assert_eq!(pool.workers, ["10.0.0.4"]);
    }
}
