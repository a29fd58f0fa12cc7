//! Multi-document parsing
//!
//! Combines the splitter and the decoder: one stream in, one map of
//! resources keyed by id out. Lists are flattened into their items and every
//! id must be unique within the stream.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::decode::Decoder;
use crate::error::{DuplicateResourceError, ManifestError, Result};
use crate::id::ResourceId;
use crate::resource::Resource;
use crate::split::split_documents;

/// Resources keyed by id, in id order
pub type Resources = BTreeMap<ResourceId, Resource>;

/// Parse a stream with the standard kinds
///
/// `source` labels every resource and error, typically with the file path.
pub fn parse_multidoc(bytes: &[u8], source: &str) -> Result<Resources> {
    MultidocParser::default().parse(bytes, source)
}

/// Multi-document parser with a configurable decoder
#[derive(Debug, Clone, Default)]
pub struct MultidocParser {
    decoder: Decoder,
    skip_malformed: bool,
}

impl MultidocParser {
    pub fn new(decoder: Decoder) -> Self {
        Self {
            decoder,
            skip_malformed: false,
        }
    }

    /// Skip documents that fail to decode instead of failing the stream
    pub fn skip_malformed(mut self, skip: bool) -> Self {
        self.skip_malformed = skip;
        self
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Parse every document of a stream
    pub fn parse(&self, bytes: &[u8], source: &str) -> Result<Resources> {
        let mut resources = Resources::new();
        // id -> index of the document defining it
        let mut origins: BTreeMap<ResourceId, usize> = BTreeMap::new();

        for doc in split_documents(bytes) {
            let resource = match self.decoder.decode(&doc, source) {
                Ok(Some(resource)) => resource,
                Ok(None) => continue,
                Err(err) if self.skip_malformed => {
                    tracing::warn!(source, document = doc.index, error = %err, "skipping malformed document");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let items = match resource {
                Resource::List(list) => list.items,
                single => vec![single],
            };

            for item in items {
                insert_unique(&mut resources, &mut origins, item, source, doc.index)?;
            }
        }

        tracing::debug!(source, count = resources.len(), "parsed stream");
        Ok(resources)
    }
}

fn insert_unique(
    resources: &mut Resources,
    origins: &mut BTreeMap<ResourceId, usize>,
    resource: Resource,
    source: &str,
    document: usize,
) -> Result<()> {
    let id = resource.id();
    match resources.entry(id.clone()) {
        Entry::Occupied(_) => {
            let first = origins.get(&id).copied().unwrap_or(document);
            Err(ManifestError::Duplicate(DuplicateResourceError {
                id,
                first: format!("{} (document {})", source, first),
                second: format!("{} (document {})", source, document),
            }))
        }
        Entry::Vacant(slot) => {
            origins.insert(id, document);
            slot.insert(resource);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{BaseObject, Metadata};
    use crate::resource::{Workload, WorkloadSpec};

    fn base(source: &str, kind: &str, namespace: &str, name: &str) -> BaseObject {
        BaseObject {
            source: source.to_string(),
            api_version: String::new(),
            kind: kind.to_string(),
            metadata: Metadata {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            bytes: Vec::new(),
        }
    }

    fn deployment(base: BaseObject) -> Resource {
        Resource::Deployment(Workload {
            base,
            spec: WorkloadSpec::default(),
        })
    }

    const TWO_DEPLOYMENTS: &str = r#"---
kind: Deployment
metadata:
  name: b-deployment
  namespace: b-namespace
---
kind: Deployment
metadata:
  name: a-deployment
"#;

    fn assert_two_deployments(objs: &Resources) {
        let a = base("test", "Deployment", "", "a-deployment");
        let b = base("test", "Deployment", "b-namespace", "b-deployment");

        assert_eq!(objs.len(), 2);
        for expected in [deployment(a), deployment(b)] {
            let got = objs.get(&expected.id()).expect("resource missing");
            assert_eq!(got.without_payload(), expected);
        }
    }

    #[test]
    fn test_parse_empty() {
        let objs = parse_multidoc(b"", "test").unwrap();
        assert!(objs.is_empty());
    }

    #[test]
    fn test_parse_some() {
        let objs = parse_multidoc(TWO_DEPLOYMENTS.as_bytes(), "test").unwrap();
        assert_two_deployments(&objs);
    }

    #[test]
    fn test_parse_some_with_comment() {
        let docs = format!("# some random comment\n{}", TWO_DEPLOYMENTS);
        let objs = parse_multidoc(docs.as_bytes(), "test").unwrap();
        assert_two_deployments(&objs);
    }

    #[test]
    fn test_payload_is_the_document() {
        let objs = parse_multidoc(TWO_DEPLOYMENTS.as_bytes(), "test").unwrap();
        let id: ResourceId = "<cluster>:deployment/a-deployment".parse().unwrap();

        assert_eq!(
            objs[&id].bytes(),
            b"kind: Deployment\nmetadata:\n  name: a-deployment\n"
        );
    }

    #[test]
    fn test_parse_some_long() {
        let mut doc = String::from("---\nkind: ConfigMap\nmetadata:\n  name: bigmap\ndata:\n  bigdata: |\n");
        let line = "    The quick brown fox jumps over the lazy dog.\n";
        let value_line = line.trim_start();
        let mut lines = 0;
        while lines * value_line.len() <= 1024 * 1024 {
            doc.push_str(line);
            lines += 1;
        }

        let objs = parse_multidoc(doc.as_bytes(), "test").unwrap();
        assert_eq!(objs.len(), 1);

        let Resource::ConfigMap(config) = objs.values().next().unwrap() else {
            panic!("expected a config map");
        };
        // the block indentation is not part of the value
        let expected = value_line.repeat(lines);
        let data = config.payload.data["bigdata"].as_str().unwrap();
        assert_eq!(data.len(), expected.len());
        assert_eq!(data, expected);
        assert_eq!(config.base.bytes.len(), doc.len() - 4);
    }

    #[test]
    fn test_trailing_separators_and_empty_documents() {
        let docs = "kind: Namespace\nmetadata:\n  name: a\n---\n---\n{}\n---\n# just a comment\n---\n";
        let objs = parse_multidoc(docs.as_bytes(), "test").unwrap();
        assert_eq!(objs.len(), 1);
    }

    #[test]
    fn test_duplicate_in_stream() {
        let docs = "kind: Service\nmetadata:\n  name: web\n---\nkind: service\nmetadata:\n  name: web\n";
        let err = parse_multidoc(docs.as_bytes(), "svc.yaml").unwrap_err();

        let ManifestError::Duplicate(dup) = &err else {
            panic!("expected a duplicate error, got {err}");
        };
        assert_eq!(dup.id.to_string(), "<cluster>:service/web");
        assert_eq!(dup.first, "svc.yaml (document 0)");
        assert_eq!(dup.second, "svc.yaml (document 1)");
    }

    #[test]
    fn test_same_name_different_namespace_is_distinct() {
        let docs = "kind: Service\nmetadata:\n  name: web\n  namespace: a\n---\nkind: Service\nmetadata:\n  name: web\n  namespace: b\n";
        let objs = parse_multidoc(docs.as_bytes(), "test").unwrap();
        assert_eq!(objs.len(), 2);
    }

    #[test]
    fn test_list_is_flattened() {
        let docs = r#"kind: List
items:
  - kind: Namespace
    metadata:
      name: apps
  - kind: Service
    metadata:
      name: web
      namespace: apps
---
kind: Deployment
metadata:
  name: web
  namespace: apps
"#;
        let objs = parse_multidoc(docs.as_bytes(), "list.yaml").unwrap();
        let ids: Vec<String> = objs.keys().map(ToString::to_string).collect();

        insta::assert_snapshot!(ids.join("\n"), @r"
        <cluster>:namespace/apps
        apps:deployment/web
        apps:service/web
        ");
        assert!(objs.values().all(|r| r.source() == "list.yaml"));
    }

    #[test]
    fn test_duplicate_between_list_and_document() {
        let docs = "kind: List\nitems:\n  - kind: Namespace\n    metadata:\n      name: apps\n---\nkind: Namespace\nmetadata:\n  name: apps\n";
        let err = parse_multidoc(docs.as_bytes(), "test").unwrap_err();
        assert!(err.duplicate_id().is_some());
    }

    #[test]
    fn test_malformed_document_fails_stream() {
        let docs = "kind: Namespace\nmetadata:\n  name: ok\n---\nkind: Namespace\nmetadata: nope\n";
        let err = parse_multidoc(docs.as_bytes(), "test").unwrap_err();

        let ManifestError::Decode(decode) = err else {
            panic!("expected a decode error");
        };
        assert_eq!(decode.document, 1);
        assert_eq!(decode.line, Some(5));
    }

    #[test]
    fn test_skip_malformed() {
        let docs = "kind: Namespace\nmetadata:\n  name: ok\n---\nkind: Namespace\nmetadata: nope\n---\nkind: Namespace\nmetadata:\n  name: also-ok\n";
        let objs = MultidocParser::default()
            .skip_malformed(true)
            .parse(docs.as_bytes(), "test")
            .unwrap();
        assert_eq!(objs.len(), 2);
    }
}
