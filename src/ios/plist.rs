//! Property list documents
//!
//! [`PlistDocument`] wraps an insertion-ordered `plist::Dictionary` and only
//! exposes whole-document transformations: a setter consumes the document and
//! returns the next one, touching a single key.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{bail, Context, Result};
use plist::{Dictionary, Value};

/// Contents of a newly created entitlements file
pub const ENTITLEMENTS_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
</dict>
</plist>
"#;

/// An XML property list whose root is a dictionary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlistDocument {
    dict: Dictionary,
}

impl PlistDocument {
    pub fn from_dictionary(dict: Dictionary) -> Self {
        Self { dict }
    }

    /// Read a plist file from disk
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_bytes(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse a plist in any format the `plist` crate understands
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value = Value::from_reader(Cursor::new(bytes))?;
        match value {
            Value::Dictionary(dict) => Ok(Self { dict }),
            _ => bail!("Property list root is not a dictionary"),
        }
    }

    /// Write the document as XML
    pub fn write(&self, path: &Path) -> Result<()> {
        let xml = self.to_xml_bytes()?;
        fs::write(path, xml).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn to_xml_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        Value::Dictionary(self.dict.clone())
            .to_writer_xml(&mut buf)
            .context("Failed to serialize property list")?;
        buf.push(b'\n');
        Ok(buf)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.dict.get(key)
    }

    #[cfg(test)]
    pub fn contains_key(&self, key: &str) -> bool {
        self.dict.contains_key(key)
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.dict.keys().map(String::as_str)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.dict.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    /// Drop `key`, then re-insert it at the end when `value` is `Some`.
    ///
    /// The relative order and values of every other key are kept as they were.
    pub fn upsert_or_remove(self, key: &str, value: Option<Value>) -> Self {
        let mut dict = Dictionary::new();
        for (k, v) in self.dict {
            if k != key {
                dict.insert(k, v);
            }
        }
        if let Some(value) = value {
            dict.insert(key.to_string(), value);
        }
        Self { dict }
    }

    /// Overlay `entries` on the document; entries win on key collisions
    pub fn merge(self, entries: Dictionary) -> Self {
        entries
            .into_iter()
            .fold(self, |doc, (key, value)| doc.upsert_or_remove(&key, Some(value)))
    }
}

/// Convert a JSON value (from the manifest) into a plist value.
///
/// JSON `null` has no plist counterpart and yields `None`; nulls inside arrays
/// and objects are dropped.
pub fn json_to_plist(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(Value::Boolean(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Integer(i.into()))
            } else if let Some(u) = n.as_u64() {
                Some(Value::Integer(u.into()))
            } else {
                n.as_f64().map(Value::Real)
            }
        }
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Array(items) => {
            Some(Value::Array(items.iter().filter_map(json_to_plist).collect()))
        }
        serde_json::Value::Object(map) => {
            let mut dict = Dictionary::new();
            for (key, value) in map {
                if let Some(value) = json_to_plist(value) {
                    dict.insert(key.clone(), value);
                }
            }
            Some(Value::Dictionary(dict))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(entries: &[(&str, Value)]) -> PlistDocument {
        let mut dict = Dictionary::new();
        for (k, v) in entries {
            dict.insert(k.to_string(), v.clone());
        }
        PlistDocument::from_dictionary(dict)
    }

    #[test]
    fn test_template_parses_as_empty_dict() {
        let doc = PlistDocument::from_bytes(ENTITLEMENTS_TEMPLATE.as_bytes()).unwrap();
        assert!(doc.is_empty());
        assert!(ENTITLEMENTS_TEMPLATE.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE plist"));
    }

    #[test]
    fn test_non_dict_root_rejected() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><array><string>x</string></array></plist>"#;
        assert!(PlistDocument::from_bytes(xml.as_bytes()).is_err());
    }

    #[test]
    fn test_upsert_keeps_other_keys_in_order() {
        let before = doc(&[
            ("a", Value::Boolean(true)),
            ("target", Value::String("old".into())),
            ("b", Value::Integer(7.into())),
        ]);

        let after = before.upsert_or_remove("target", Some(Value::String("new".into())));
        assert_eq!(after.keys().collect::<Vec<_>>(), vec!["a", "b", "target"]);
        assert_eq!(after.get("a"), Some(&Value::Boolean(true)));
        assert_eq!(after.get("b"), Some(&Value::Integer(7.into())));
        assert_eq!(after.get("target"), Some(&Value::String("new".into())));
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let before = doc(&[("a", Value::Boolean(true))]);
        let after = before.clone().upsert_or_remove("missing", None);
        assert_eq!(after, before);

        let after = after.upsert_or_remove("a", None);
        assert!(after.is_empty());
    }

    #[test]
    fn test_merge_overrides() {
        let base = doc(&[("a", Value::Boolean(false)), ("b", Value::Boolean(true))]);
        let mut extra = Dictionary::new();
        extra.insert("a".into(), Value::Boolean(true));
        extra.insert("c".into(), Value::String("x".into()));

        let merged = base.merge(extra);
        assert_eq!(merged.get("a"), Some(&Value::Boolean(true)));
        assert_eq!(merged.get("b"), Some(&Value::Boolean(true)));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("App.entitlements");
        let original = doc(&[(
            "com.apple.developer.applesignin",
            Value::Array(vec![Value::String("Default".into())]),
        )]);

        original.write(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("<key>com.apple.developer.applesignin</key>"));
        assert_eq!(PlistDocument::read(&path).unwrap(), original);
    }

    #[test]
    fn test_json_to_plist() {
        let json = serde_json::json!({
            "flag": true,
            "count": 3,
            "name": "x",
            "list": ["a", null],
            "skip": null
        });
        let Some(Value::Dictionary(dict)) = json_to_plist(&json) else {
            panic!("expected dictionary");
        };
        assert_eq!(dict.get("flag"), Some(&Value::Boolean(true)));
        assert_eq!(dict.get("count"), Some(&Value::Integer(3.into())));
        assert_eq!(dict.get("list"), Some(&Value::Array(vec![Value::String("a".into())])));
        assert!(!dict.contains_key("skip"));
    }
}
