//! Integration tests for label resolution, filtering and reporting

use argodiff_core::labels::{is_affected, LabelIndex};
use argodiff_core::report::{paginate_report, report_marker, ReportRenderer, MAX_COMMENT_LENGTH};
use argodiff_core::types::{AppSource, SyncStatus};
use argodiff_core::{filter_diff, AppDiff, Application, DiffFilter, DiffResult, RunConfig};
use chrono::{TimeZone, Utc};
use std::fs;
use tempfile::TempDir;

/// `argocd app diff` output with `KUBECTL_EXTERNAL_DIFF="diff -N -u"`
const ARGOCD_OUTPUT: &str = "\
===== apps/Deployment shop/web ======
--- /tmp/argocd-diff1234/web-live.yaml\t2024-03-01 12:00:00.000000000 +0000
+++ /tmp/argocd-diff1234/web\t2024-03-01 12:00:00.000000000 +0000
@@ -4,12 +4,12 @@
   labels:
     app: web
-    argocd.argoproj.io/instance: web-old
+    argocd.argoproj.io/instance: web
   name: web
   namespace: shop
 spec:
-  replicas: 2
+  replicas: 3
   selector:
     matchLabels:
       app: web
===== /ConfigMap shop/web-config ======
--- /tmp/argocd-diff1234/web-config-live.yaml
+++ /tmp/argocd-diff1234/web-config
@@ -0,0 +1,15 @@
+apiVersion: v1
+data:
+  LOG_LEVEL: info
+kind: ConfigMap
+metadata:
+  managedFields:
+  - apiVersion: v1
+    fieldsType: FieldsV1
+    fieldsV1:
+      f:data:
+        f:LOG_LEVEL: {}
+    manager: argocd-controller
+    operation: Apply
+  name: web-config
+  namespace: shop
===== /Service shop/web ======
--- /tmp/argocd-diff1234/web-live.yaml
+++ /tmp/argocd-diff1234/web
@@ -4,7 +4,7 @@
   labels:
     app: web
-    argocd.argoproj.io/instance: web-old
+    argocd.argoproj.io/instance: web
   name: web
   namespace: shop
 spec:
===== /Secret shop/empty ======
";

#[test]
fn test_realistic_argocd_output() {
    let filtered = filter_diff(ARGOCD_OUTPUT);

    assert!(filtered.starts_with("===== apps/Deployment shop/web ======"));
    assert!(filtered.contains("-  replicas: 2\n+  replicas: 3"));
    assert!(!filtered.contains("managedFields"));
    assert!(!filtered.contains("argocd-controller"));
    assert!(!filtered.contains("argocd.argoproj.io/instance"));
    assert!(!filtered.contains("/Service shop/web"));
    assert!(!filtered.contains("/Secret shop/empty"));
    assert!(filtered.contains("+metadata:\n+  name: web-config\n+  namespace: shop"));
    assert!(!filtered.contains("\n\n\n"));

    // Context and file markers of the surviving section are untouched
    assert!(filtered.contains("+++ /tmp/argocd-diff1234/web\t"));
    assert!(filtered.contains("\n   name: web\n"));

    assert_eq!(filter_diff(&filtered), filtered);
}

#[test]
fn test_normal_format_output() {
    let raw = "\
===== apps/Deployment shop/web ======
7c7
<     argocd.argoproj.io/instance: web-old
---
>     argocd.argoproj.io/instance: web
12c12
<   replicas: 2
---
>   replicas: 3
===== /Service shop/web ======
5d4
<     app.kubernetes.io/part-of: shop
";
    assert_eq!(
        filter_diff(raw),
        "===== apps/Deployment shop/web ======\n12c12\n<   replicas: 2\n---\n>   replicas: 3"
    );
}

fn write(dir: &TempDir, relative: &str, content: &str) -> String {
    let path = dir.path().join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    relative.to_string()
}

#[test]
fn test_resolver_over_working_tree() {
    let dir = TempDir::new().unwrap();
    let files = vec![
        write(
            &dir,
            "apps/web/deployment.yaml",
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  labels:\n    argocd.argoproj.io/instance: web\n",
        ),
        write(
            &dir,
            "apps/api/kustomization.yaml",
            "resources:\n  - deployment.yaml\nlabels:\n  - pairs:\n      team: core\n  - pairs:\n      argocd.argoproj.io/instance: api\n",
        ),
        write(
            &dir,
            "apps/jobs/all.yaml",
            "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: jobs\n---\napiVersion: batch/v1\nkind: CronJob\nmetadata:\n  labels:\n    argocd.argoproj.io/instance: jobs\n",
        ),
        write(&dir, "README.md", "# Deployments\n\nSee `apps/`.\n"),
        write(&dir, "apps/broken.yaml", "metadata: [labels: {\n"),
        "apps/deleted.yaml".to_string(),
    ];

    let mut index = LabelIndex::new(dir.path(), "argocd.argoproj.io/instance");
    assert!(index.is_affected(&files, "web"));
    assert!(index.is_affected(&files, "api"));
    assert!(index.is_affected(&files, "jobs"));
    assert!(!index.is_affected(&files, "billing"));
    assert_eq!(index.len(), files.len());

    let absolute: Vec<_> = files.iter().map(|f| dir.path().join(f)).collect();
    assert!(is_affected(&absolute, "api", "argocd.argoproj.io/instance"));
    assert!(!is_affected(&absolute, "api", "example.com/owner"));
    assert!(!is_affected::<&str>(&[], "web", "argocd.argoproj.io/instance"));
}

fn report_config() -> RunConfig {
    RunConfig {
        argocd_server: "argocd.example.com".into(),
        argocd_token: "argo-secret".into(),
        environment: "prod".into(),
        owner: "acme".into(),
        repo: "deploy".into(),
        pr_number: 42,
        head_sha: "0123456789abcdef".into(),
        ..Default::default()
    }
}

#[test]
fn test_filtered_output_renders_into_report() {
    let config = report_config();
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let renderer = ReportRenderer::new(&config, now).unwrap();

    let filter = DiffFilter::new(&config.tracking_label).unwrap();
    let results = vec![AppDiff {
        app: Application::new("web", AppSource::default(), SyncStatus::OutOfSync),
        result: DiffResult::Diff(filter.filter(ARGOCD_OUTPUT)),
    }];

    let report = renderer.render(&results).unwrap();
    assert!(report.starts_with(&report_marker("prod")));
    assert!(report.contains("### ⚠️ App: [`web`](https://argocd.example.com/applications/web)"));
    assert!(report.contains("+  replicas: 3"));
    assert_eq!(paginate_report(&report, &report_marker("prod"), MAX_COMMENT_LENGTH), vec![report]);
}

#[test]
fn test_oversized_report_is_paginated() {
    let config = report_config();
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let renderer = ReportRenderer::new(&config, now).unwrap();

    let mut diff = String::from("===== /ConfigMap shop/big ======\n");
    for i in 0..5000 {
        diff.push_str(&format!("+  key-{:05}: {}\n", i, "x".repeat(20)));
    }
    let results = vec![AppDiff {
        app: Application::new("big", AppSource::default(), SyncStatus::Synced),
        result: DiffResult::Diff(diff),
    }];

    let report = renderer.render(&results).unwrap();
    assert!(report.len() > MAX_COMMENT_LENGTH);

    let marker = report_marker("prod");
    let parts = paginate_report(&report, &marker, MAX_COMMENT_LENGTH);
    assert!(parts.len() >= 3);
    for part in &parts {
        assert!(part.len() <= MAX_COMMENT_LENGTH);
        assert!(part.contains(&marker));
    }
    assert!(parts.last().unwrap().contains("| Legend | Status |"));
}
