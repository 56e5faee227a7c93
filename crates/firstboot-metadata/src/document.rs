//! Raw metadata documents and path resolution
//!
//! A document is a tree of [`Node`]s built from what the metadata endpoint
//! returned. Lookups address it with slash-separated paths:
//!
//! - `metadata/hostname`
//! - `metadata/operating_system/distro`
//! - `metadata/ssh_keys`
//! - `metadata/ssh_keys/0`
//!
//! Empty segments are ignored, so `/metadata//hostname/` is the same path as
//! `metadata/hostname`. A segment made only of ASCII digits indexes into a
//! sequence; anything else is a mapping key. A digit segment applied to a
//! mapping is looked up as the literal key, since JSON object keys are
//! always strings.
//!
//! # Containers resolve to their length
//!
//! When a path ends on a sequence or mapping, [`resolve`] does **not**
//! return the container. It returns [`Resolved::Count`] with the number of
//! direct children. Callers that need to enumerate a list ask for the count
//! first and then resolve `path/0`, `path/1`, ... themselves.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Number, Value};

use crate::error::{MetadataError, Result};

/// A node of a raw metadata document
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(BTreeMap<String, Node>),
}

/// Leaf value of a metadata document
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    /// Undecoded payload, e.g. user-data as served by the endpoint
    Bytes(Vec<u8>),
}

/// Result of resolving a path
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// The path ended on a leaf
    Scalar(Scalar),
    /// The path ended on a sequence or mapping with this many children
    Count(usize),
}

impl Node {
    /// Parse a JSON payload into a document
    pub fn from_json_slice(payload: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(payload)?;
        Ok(Self::from(value))
    }

    /// Wrap an opaque payload as a single bytes leaf
    pub fn bytes(payload: impl Into<Vec<u8>>) -> Self {
        Node::Scalar(Scalar::Bytes(payload.into()))
    }

    fn child(&self, segment: &str) -> Option<&Node> {
        match self {
            Node::Mapping(entries) => entries.get(segment),
            Node::Sequence(items) if is_index(segment) => {
                segment.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            Node::Sequence(_) | Node::Scalar(_) => None,
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Node::Scalar(Scalar::Number(n)),
            Value::String(s) => Node::Scalar(Scalar::Text(s)),
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Object(entries) => Node::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Node::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Scalar {
    /// Turn a bytes payload into text; other scalars are left alone
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn decode(self) -> Self {
        match self {
            Scalar::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Scalar::Text(text),
                Err(e) => Scalar::Text(String::from_utf8_lossy(e.as_bytes()).into_owned()),
            },
            other => other,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}

impl Resolved {
    /// Apply [`Scalar::decode`] to a leaf result
    pub fn decode(self) -> Self {
        match self {
            Resolved::Scalar(scalar) => Resolved::Scalar(scalar.decode()),
            count => count,
        }
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Resolve `path` against `document`
///
/// Returns the leaf value, or the child count when the path ends on a
/// container. Fails with [`MetadataError::NotFound`] when the path has no
/// segments or any segment cannot be applied.
pub fn resolve(document: &Node, path: &str) -> Result<Resolved> {
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
    if segments.peek().is_none() {
        return Err(MetadataError::NotFound(path.to_string()));
    }

    let mut current = document;
    for segment in segments {
        current = match current.child(segment) {
            Some(node) => node,
            None => {
                tracing::debug!(path = %path, segment = %segment, "Metadata path segment does not exist");
                return Err(MetadataError::NotFound(path.to_string()));
            }
        };
    }

    Ok(match current {
        Node::Sequence(items) => Resolved::Count(items.len()),
        Node::Mapping(entries) => Resolved::Count(entries.len()),
        Node::Scalar(scalar) => Resolved::Scalar(scalar.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_document() -> Node {
        Node::from(json!({
            "id": "a1b2c3",
            "hostname": "worker-01.example.com",
            "ssh_keys": ["ssh-ed25519 AAAA k1", "ssh-rsa BBBB k2"],
            "operating_system": {
                "distro": "debian",
                "version": 12,
                "licensed": false
            },
            "network": {
                "interfaces": [
                    {"name": "eth0", "mac": "aa:bb:cc:dd:ee:ff"},
                    {"name": "eth1", "mac": "aa:bb:cc:dd:ee:00"}
                ]
            },
            "numbered": {"0": "zero"},
            "nothing": null
        }))
    }

    fn text(value: &str) -> Resolved {
        Resolved::Scalar(Scalar::Text(value.to_string()))
    }

    #[test]
    fn test_resolve_scalar() {
        let doc = test_document();
        assert_eq!(resolve(&doc, "id").unwrap(), text("a1b2c3"));
        assert_eq!(resolve(&doc, "operating_system/distro").unwrap(), text("debian"));
        assert_eq!(
            resolve(&doc, "operating_system/version").unwrap(),
            Resolved::Scalar(Scalar::Number(12.into()))
        );
        assert_eq!(
            resolve(&doc, "operating_system/licensed").unwrap(),
            Resolved::Scalar(Scalar::Bool(false))
        );
        assert_eq!(resolve(&doc, "nothing").unwrap(), Resolved::Scalar(Scalar::Null));
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let doc = test_document();
        let before = doc.clone();
        let first = resolve(&doc, "ssh_keys/1").unwrap();
        let second = resolve(&doc, "ssh_keys/1").unwrap();
        assert_eq!(first, second);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_resolve_container_counts() {
        let doc = test_document();
        assert_eq!(resolve(&doc, "ssh_keys").unwrap(), Resolved::Count(2));
        assert_eq!(resolve(&doc, "operating_system").unwrap(), Resolved::Count(3));
        assert_eq!(resolve(&doc, "network/interfaces").unwrap(), Resolved::Count(2));
        assert_eq!(resolve(&doc, "network/interfaces/1").unwrap(), Resolved::Count(2));
    }

    #[test]
    fn test_resolve_indexes() {
        let doc = test_document();
        assert_eq!(resolve(&doc, "ssh_keys/0").unwrap(), text("ssh-ed25519 AAAA k1"));
        assert_eq!(
            resolve(&doc, "network/interfaces/1/mac").unwrap(),
            text("aa:bb:cc:dd:ee:00")
        );
        assert!(matches!(
            resolve(&doc, "ssh_keys/5"),
            Err(MetadataError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_spec_example() {
        let doc = Node::from(json!({"ssh_keys": ["k1", "k2"]}));
        assert_eq!(resolve(&doc, "ssh_keys").unwrap(), Resolved::Count(2));
        assert_eq!(resolve(&doc, "ssh_keys/0").unwrap(), text("k1"));
        assert!(matches!(
            resolve(&doc, "ssh_keys/5"),
            Err(MetadataError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_empty_path() {
        let doc = test_document();
        assert!(matches!(resolve(&doc, ""), Err(MetadataError::NotFound(_))));
        assert!(matches!(resolve(&doc, "///"), Err(MetadataError::NotFound(_))));
    }

    #[test]
    fn test_resolve_ignores_empty_segments() {
        let doc = test_document();
        assert_eq!(resolve(&doc, "/operating_system//distro/").unwrap(), text("debian"));
    }

    #[test]
    fn test_resolve_failures() {
        let doc = test_document();
        // missing key
        assert!(resolve(&doc, "missing").is_err());
        // descending into a leaf
        assert!(resolve(&doc, "id/0").is_err());
        assert!(resolve(&doc, "hostname/domain").is_err());
        // named segment on a sequence
        assert!(resolve(&doc, "ssh_keys/first").is_err());
        // partial match is not returned
        assert!(resolve(&doc, "operating_system/distro/codename").is_err());
    }

    #[test]
    fn test_resolve_digit_key_on_mapping() {
        let doc = test_document();
        assert_eq!(resolve(&doc, "numbered/0").unwrap(), text("zero"));
        assert!(resolve(&doc, "numbered/1").is_err());
    }

    #[test]
    fn test_resolve_bytes_leaf() {
        let doc = Node::Mapping(BTreeMap::from([(
            "userdata".to_string(),
            Node::bytes(b"#cloud-config\n".to_vec()),
        )]));
        let resolved = resolve(&doc, "userdata").unwrap();
        assert_eq!(resolved, Resolved::Scalar(Scalar::Bytes(b"#cloud-config\n".to_vec())));
        assert_eq!(resolved.decode(), text("#cloud-config\n"));
    }

    #[test]
    fn test_decode_replaces_invalid_utf8() {
        let decoded = Scalar::Bytes(vec![b'h', 0xff, b'i']).decode();
        assert_eq!(decoded, Scalar::Text("h\u{fffd}i".to_string()));
        assert_eq!(Resolved::Count(4).decode(), Resolved::Count(4));
    }

    #[test]
    fn test_from_json_slice() {
        let doc = Node::from_json_slice(br#"{"hostname": "node-7"}"#).unwrap();
        assert_eq!(resolve(&doc, "hostname").unwrap(), text("node-7"));

        assert!(matches!(
            Node::from_json_slice(b"not json"),
            Err(MetadataError::Parse(_))
        ));
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Number(42.into()).to_string(), "42");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::Text("x".to_string()).to_string(), "x");
    }
}
