//! Integration tests for loading manifest trees

use std::fs;
use std::path::Path;

use manifold_core::{BaseObject, Metadata};
use manifold_load::{ChartTracker, LoadError, LoadOptions, Loader, Resource, load};
use tempfile::TempDir;

const HELLOWORLD_DEPLOY: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: helloworld
  namespace: demo
spec:
  replicas: 2
  template:
    spec:
      containers:
      - name: greeter
        image: quay.io/example/helloworld:master-a000001
      - name: sidecar
        image: quay.io/example/sidecar:master-a000001
"#;

const HELLOWORLD_SVC: &str = r#"apiVersion: v1
kind: Service
metadata:
  name: helloworld
  namespace: demo
spec:
  ports:
  - port: 80
"#;

const LOCKED_DEPLOY: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: locked-service
  namespace: demo
spec:
  template:
    spec:
      containers:
      - name: locked
        image: quay.io/example/locked:1
"#;

const TEST_DEPLOY: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: test-service
  namespace: demo
spec:
  template:
    spec:
      containers:
      - name: test
        image: quay.io/example/test:1
"#;

const NAMESPACE_AND_CONFIG: &str = r#"# namespace and its settings
---
apiVersion: v1
kind: Namespace
metadata:
  name: demo
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
  namespace: demo
data:
  motd: |
    # shown on login
    ---
    welcome
"#;

const LIST: &str = r#"apiVersion: v1
kind: List
items:
- apiVersion: v1
  kind: ServiceAccount
  metadata:
    name: deployer
    namespace: demo
- apiVersion: rbac.authorization.k8s.io/v1
  kind: ClusterRole
  metadata:
    name: reader
"#;

const CHART: &str = "apiVersion: v1\nname: nginx\nversion: 0.1.0\n";

// Would collide with helloworld-deploy.yaml if charts were loaded
const CHART_VALUES: &str = r#"kind: Deployment
metadata:
  name: helloworld
  namespace: demo
"#;

const CHART_TEMPLATE: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: {{ template "fullname" . }}
  labels:
{{ include "labels" . | indent 4 }}
"#;

/// Number of resources in the non-chart files of the test tree
const EXPECTED_RESOURCES: usize = 8;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Build the test tree
fn manifest_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "garbage", "This should just be ignored, since it's not YAML\n");
    write(root, "README.md", "# manifests\n");
    write(root, "helloworld-deploy.yaml", HELLOWORLD_DEPLOY);
    write(root, "helloworld-svc.yaml", HELLOWORLD_SVC);
    write(root, "locked-service-deploy.yaml", LOCKED_DEPLOY);
    write(root, "test/test-service-deploy.yaml", TEST_DEPLOY);
    write(root, "multi/namespace-and-config.yaml", NAMESPACE_AND_CONFIG);
    write(root, "multi/list.yml", LIST);
    write(root, "charts/nginx/Chart.yaml", CHART);
    write(root, "charts/nginx/values.yaml", CHART_VALUES);
    write(root, "charts/nginx/templates/deployment.yaml", CHART_TEMPLATE);
    write(root, "charts/nginx/charts/sub/Chart.yaml", CHART);

    dir
}

mod load_tree {
    use super::*;

    #[test]
    fn test_load_some() {
        let dir = manifest_tree();
        let objs = load(dir.path(), dir.path()).unwrap();
        assert_eq!(objs.len(), EXPECTED_RESOURCES);
    }

    #[test]
    fn test_load_sum_of_files() {
        let dir = manifest_tree();
        let root = dir.path();

        let files = [
            "helloworld-deploy.yaml",
            "helloworld-svc.yaml",
            "locked-service-deploy.yaml",
            "test/test-service-deploy.yaml",
            "multi/namespace-and-config.yaml",
            "multi/list.yml",
        ];
        let total: usize = files
            .iter()
            .map(|f| load(root, root.join(f)).unwrap().len())
            .sum();
        assert_eq!(total, EXPECTED_RESOURCES);
    }

    #[test]
    fn test_ids_and_sources() {
        let dir = manifest_tree();
        let objs = load(dir.path(), dir.path()).unwrap();

        let listing: Vec<String> = objs
            .iter()
            .map(|(id, res)| format!("{} <- {}", id, res.source()))
            .collect();

        insta::assert_snapshot!(listing.join("\n"), @r"
        <cluster>:clusterrole/reader <- multi/list.yml
        <cluster>:namespace/demo <- multi/namespace-and-config.yaml
        demo:configmap/settings <- multi/namespace-and-config.yaml
        demo:deployment/helloworld <- helloworld-deploy.yaml
        demo:deployment/locked-service <- locked-service-deploy.yaml
        demo:deployment/test-service <- test/test-service-deploy.yaml
        demo:service/helloworld <- helloworld-svc.yaml
        demo:serviceaccount/deployer <- multi/list.yml
        ");
    }

    #[test]
    fn test_decoded_variants() {
        let dir = manifest_tree();
        let objs = load(dir.path(), dir.path()).unwrap();

        let id = "demo:deployment/helloworld".parse().unwrap();
        let deploy = objs[&id].as_workload().expect("deployment is a workload");
        let images: Vec<&str> = deploy.containers().filter_map(|c| c.image.as_deref()).collect();
        assert_eq!(
            images,
            vec![
                "quay.io/example/helloworld:master-a000001",
                "quay.io/example/sidecar:master-a000001",
            ]
        );

        let id = "demo:configmap/settings".parse().unwrap();
        let Resource::ConfigMap(config) = &objs[&id] else {
            panic!("expected a config map");
        };
        assert_eq!(config.payload.data["motd"].as_str(), Some("# shown on login\n---\nwelcome\n"));

        let id = "demo:service/helloworld".parse().unwrap();
        assert!(objs[&id].is_generic());
        assert_eq!(objs[&id].bytes(), HELLOWORLD_SVC.as_bytes());
    }

    #[test]
    fn test_decoded_identity_ignoring_payload() {
        let dir = manifest_tree();
        let objs = load(dir.path(), dir.path().join("multi")).unwrap();

        let expected = Resource::Namespace(BaseObject {
            source: "multi/namespace-and-config.yaml".to_string(),
            api_version: "v1".to_string(),
            kind: "Namespace".to_string(),
            metadata: Metadata {
                namespace: String::new(),
                name: "demo".to_string(),
            },
            bytes: Vec::new(),
        });
        let id = "<cluster>:namespace/demo".parse().unwrap();
        assert_eq!(objs[&id].without_payload(), expected);
        assert!(!objs[&id].bytes().is_empty());

        let id = "demo:serviceaccount/deployer".parse().unwrap();
        let account = objs[&id].without_payload();
        assert!(account.is_generic());
        assert_eq!(account.source(), "multi/list.yml");
        assert!(account.bytes().is_empty());
    }

    #[test]
    fn test_load_subdirectory() {
        let dir = manifest_tree();
        let objs = load(dir.path(), dir.path().join("multi")).unwrap();
        assert_eq!(objs.len(), 4);
        assert!(objs.values().all(|r| r.source().starts_with("multi/")));
    }

    #[test]
    fn test_nonexistent_target() {
        let dir = manifest_tree();
        let err = load(dir.path(), "does/not/exist").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_target_outside_root() {
        let dir = manifest_tree();
        let err = load(dir.path().join("multi"), dir.path().join("test")).unwrap_err();
        assert!(matches!(err, LoadError::OutsideRoot { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let dir = manifest_tree();
        write(dir.path(), "broken.yaml", "kind: Service\nmetadata: [unclosed\n");

        let err = load(dir.path(), dir.path()).unwrap_err();
        let LoadError::Manifest { path, .. } = &err else {
            panic!("expected a manifest error, got {err}");
        };
        assert!(path.ends_with("broken.yaml"));
    }
}

mod charts {
    use super::*;

    #[test]
    fn test_chart_tracker() {
        let dir = manifest_tree();
        let root = dir.path();
        let tracker = ChartTracker::new(root).unwrap();

        for noncharty in [
            "garbage",
            "locked-service-deploy.yaml",
            "test",
            "test/test-service-deploy.yaml",
        ] {
            let path = root.join(noncharty);
            assert!(!tracker.is_chart(&path), "{noncharty} thought to be a chart");
            if noncharty == "garbage" {
                continue;
            }
            let objs = load(root, &path).unwrap();
            assert!(!objs.is_empty(), "expected resources from {noncharty}");
        }

        let chart_path = root.join("charts/nginx");
        assert!(tracker.is_chart(&chart_path));
        assert!(tracker.in_chart(chart_path.join("Chart.yaml")));

        for path in [
            "charts",
            "charts/nginx",
            "charts/nginx/Chart.yaml",
            "charts/nginx/values.yaml",
            "charts/nginx/templates/deployment.yaml",
            "charts/nginx/charts/sub",
        ] {
            let objs = load(root, root.join(path)).unwrap();
            assert!(objs.is_empty(), "expected no resources from {path}");
        }
    }

    #[test]
    fn test_is_chart_implies_in_chart() {
        let dir = manifest_tree();
        let tracker = ChartTracker::new(dir.path()).unwrap();

        for chart in tracker.chart_roots() {
            assert!(tracker.in_chart(chart));
        }
        assert_eq!(tracker.chart_roots().len(), 2);
    }

    #[test]
    fn test_custom_chart_marker() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "helloworld-deploy.yaml", HELLOWORLD_DEPLOY);
        write(root, "packs/redis/Pack.yaml", "name: redis\n");
        write(root, "packs/redis/values.yaml", CHART_VALUES);

        let loader = Loader::new(LoadOptions::new().with_chart_marker("Pack.yaml"));
        let objs = loader.load(root, root).unwrap();
        assert_eq!(objs.len(), 1);
        assert!(loader.load(root, "packs").unwrap().is_empty());

        // with the default marker packs/redis is ordinary, so its values collide
        let err = load(root, root).unwrap_err();
        let LoadError::Duplicate(dup) = &err else {
            panic!("expected a duplicate error, got {err}");
        };
        assert_eq!(dup.id.to_string(), "demo:deployment/helloworld");
        assert_eq!(dup.first, "helloworld-deploy.yaml");
        assert_eq!(dup.second, "packs/redis/values.yaml");
    }

    #[test]
    fn test_whole_root_is_chart() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Chart.yaml", CHART);
        write(dir.path(), "values.yaml", CHART_VALUES);

        let objs = load(dir.path(), dir.path()).unwrap();
        assert!(objs.is_empty());
    }
}

mod duplicates {
    use super::*;

    #[test]
    fn test_duplicate_across_files() {
        let dir = manifest_tree();
        write(dir.path(), "zz-copy.yaml", HELLOWORLD_SVC);

        let err = load(dir.path(), dir.path()).unwrap_err();
        let LoadError::Duplicate(dup) = &err else {
            panic!("expected a duplicate error, got {err}");
        };
        assert_eq!(dup.id.to_string(), "demo:service/helloworld");
        assert_eq!(dup.first, "helloworld-svc.yaml");
        assert_eq!(dup.second, "zz-copy.yaml");
    }

    #[test]
    fn test_duplicate_kind_case_insensitive() {
        let dir = manifest_tree();
        let lower = HELLOWORLD_SVC.replace("kind: Service", "kind: service");
        write(dir.path(), "test/svc.yaml", &lower);

        let err = load(dir.path(), dir.path()).unwrap_err();
        assert_eq!(
            err.duplicate_id().map(ToString::to_string).as_deref(),
            Some("demo:service/helloworld")
        );
    }

    #[test]
    fn test_duplicate_within_file() {
        let dir = manifest_tree();
        let twice = format!("{}---\n{}", TEST_DEPLOY, TEST_DEPLOY);
        write(dir.path(), "test/test-service-deploy.yaml", &twice);

        let err = load(dir.path(), "test").unwrap_err();
        assert!(matches!(err, LoadError::Manifest { .. }));
        assert_eq!(
            err.duplicate_id().map(ToString::to_string).as_deref(),
            Some("demo:deployment/test-service")
        );
    }
}

mod options {
    use super::*;

    #[test]
    fn test_options_from_file() {
        let dir = manifest_tree();
        let config = dir.path().join("manifold.conf");
        fs::write(&config, "chartMarker: Chart.yaml\nextensions: [yaml]\n").unwrap();

        let options = LoadOptions::load_from(&config).unwrap();
        let objs = Loader::new(options).load(dir.path(), dir.path()).unwrap();

        // multi/list.yml is no longer a manifest
        assert_eq!(objs.len(), EXPECTED_RESOURCES - 2);
    }
}
