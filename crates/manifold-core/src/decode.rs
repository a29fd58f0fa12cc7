//! Document decoding
//!
//! Turns one document into a [`Resource`]: the document is parsed as YAML,
//! the identity fields are validated into a [`BaseObject`], and the `kind`
//! discriminant selects a constructor from the [`KindRegistry`].

use miette::{NamedSource, SourceSpan};
use serde_yaml::{Mapping, Value};

use crate::error::DecodeError;
use crate::id;
use crate::object::{BaseObject, Metadata};
use crate::registry::{self, KindRegistry};
use crate::resource::{List, Resource};
use crate::split::Document;

/// Kind of the container documents whose items are decoded individually
pub const LIST_KIND: &str = "List";

/// Decodes documents using a kind registry
#[derive(Debug, Clone)]
pub struct Decoder {
    registry: KindRegistry,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(KindRegistry::standard())
    }
}

impl Decoder {
    pub fn new(registry: KindRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Decode one document of a stream
    ///
    /// Returns `Ok(None)` for documents carrying no resource: `null`, an
    /// empty mapping, or a mapping without a `kind`.
    pub fn decode(&self, doc: &Document<'_>, source: &str) -> Result<Option<Resource>, DecodeError> {
        let fail = |message: String, location: Option<serde_yaml::Location>| {
            decode_error(doc, source, message, location)
        };

        let value: Value = serde_yaml::from_slice(doc.bytes)
            .map_err(|e| fail(e.to_string(), e.location()))?;

        let value = match value {
            Value::Null => return Ok(None),
            Value::Mapping(mapping) if mapping.is_empty() => return Ok(None),
            Value::Mapping(mapping) => Value::Mapping(mapping),
            Value::Tagged(tagged) => {
                return Err(fail(
                    format!("document is tagged '{}', expected a plain mapping", tagged.tag),
                    None,
                ));
            }
            other => {
                return Err(fail(
                    format!("document is a {}, expected a mapping", type_name(&other)),
                    None,
                ));
            }
        };

        self.decode_value(value, doc.bytes.to_vec(), source)
            .map_err(|message| fail(message, None))
    }

    /// Decode a standalone document
    pub fn decode_bytes(&self, bytes: &[u8], source: &str) -> Result<Option<Resource>, DecodeError> {
        let doc = Document {
            index: 0,
            line: 1,
            offset: 0,
            bytes,
        };
        self.decode(&doc, source)
    }

    fn decode_value(&self, value: Value, bytes: Vec<u8>, source: &str) -> Result<Option<Resource>, String> {
        let Some(mapping) = value.as_mapping() else {
            return Err(format!("expected a mapping, found a {}", type_name(&value)));
        };

        let kind = string_field(mapping, "kind")?;
        if kind.is_empty() {
            tracing::trace!(source, "document without kind, skipping");
            return Ok(None);
        }
        let api_version = string_field(mapping, "apiVersion")?;
        let metadata = metadata_field(mapping)?;

        let base = BaseObject {
            source: source.to_string(),
            api_version,
            kind,
            metadata,
            bytes,
        };

        if base.kind == LIST_KIND {
            return self.decode_list(base, value, source).map(Some);
        }

        if let Some(reason) = id::invalid_part(&base.metadata.namespace, &base.kind, &base.metadata.name) {
            return Err(format!("invalid identity for {}: {}", base.kind, reason));
        }

        let constructor = self.registry.get(&base.kind).unwrap_or(registry::generic);
        tracing::trace!(source, kind = %base.kind, name = %base.metadata.name, "decoded document");

        let kind = base.kind.clone();
        constructor(base, value)
            .map(Some)
            .map_err(|e| format!("invalid {}: {}", kind, e))
    }

    /// Decode every entry of a list's `items`
    ///
    /// Each item gets its own YAML rendering as raw payload.
    fn decode_list(&self, base: BaseObject, mut value: Value, source: &str) -> Result<Resource, String> {
        let items = match value.as_mapping_mut().and_then(|m| m.remove("items")) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Sequence(items)) => items,
            Some(other) => {
                return Err(format!("list items must be a sequence, found a {}", type_name(&other)));
            }
        };

        let mut decoded = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let bytes = serde_yaml::to_string(&item)
                .map_err(|e| format!("list item {}: {}", i, e))?
                .into_bytes();
            match self.decode_value(item, bytes, source) {
                Ok(Some(resource)) => decoded.push(resource),
                Ok(None) => {}
                Err(message) => return Err(format!("list item {}: {}", i, message)),
            }
        }

        Ok(Resource::List(List { base, items: decoded }))
    }
}

fn string_field(mapping: &Mapping, key: &str) -> Result<String, String> {
    match mapping.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("{} must be a string, found a {}", key, type_name(other))),
    }
}

fn metadata_field(mapping: &Mapping) -> Result<Metadata, String> {
    match mapping.get("metadata") {
        None | Some(Value::Null) => Ok(Metadata::default()),
        Some(Value::Mapping(meta)) => Ok(Metadata {
            namespace: scalar_field(meta, "namespace")?,
            name: scalar_field(meta, "name")?,
        }),
        Some(other) => Err(format!("metadata must be a mapping, found a {}", type_name(other))),
    }
}

/// A metadata value as text; unquoted numbers and booleans are accepted
fn scalar_field(meta: &Mapping, key: &str) -> Result<String, String> {
    match meta.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(format!(
            "invalid metadata: {} must be a string, found a {}",
            key,
            type_name(other)
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn decode_error(
    doc: &Document<'_>,
    source: &str,
    message: String,
    location: Option<serde_yaml::Location>,
) -> DecodeError {
    let text = String::from_utf8_lossy(doc.bytes).into_owned();
    let (line, column, span) = match &location {
        Some(loc) => (
            doc.line + loc.line().saturating_sub(1),
            Some(loc.column()),
            Some(SourceSpan::from((loc.index().min(text.len()), 0))),
        ),
        // shape errors point at the start of the document
        None => (doc.line, None, None),
    };

    DecodeError {
        source_label: source.to_string(),
        document: doc.index,
        line: Some(line),
        column,
        message,
        src: NamedSource::new(source, text),
        span,
    }
}
