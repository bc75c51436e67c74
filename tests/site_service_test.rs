//! Tests for SiteService: a full library-to-site run on a temp directory

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_yaml::Value;
use tempfile::TempDir;

use lorewiki::application::services::SiteService;
use lorewiki::application::ApplicationError;
use lorewiki::config::Settings;
use lorewiki::domain::DomainError;
use lorewiki::infrastructure::di::ServiceContainer;
use lorewiki::infrastructure::traits::RealFileSystem;
use lorewiki::util::testing::init_test_setup;

fn write_doc(lib: &Path, name: &str, content: &str) {
    let path = lib.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).expect("write document");
}

fn service(temp: &TempDir) -> (SiteService, PathBuf, PathBuf) {
    let lib = temp.path().join("lib");
    let out = temp.path().join("docs");
    let settings = Settings {
        lib_dir: lib.clone(),
        output_dir: out.clone(),
        ..Settings::default()
    };
    let svc = ServiceContainer::with_deps(settings, Arc::new(RealFileSystem)).site_service();
    (svc, lib, out)
}

fn read_yaml(path: &Path) -> Value {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
    serde_yaml::from_str(&content).unwrap()
}

fn library(lib: &Path) {
    write_doc(
        lib,
        "people/aria.yml",
        r#"
node: People
title: Aria
altLinks: [The Wanderer]
Bio: Aria was born in Ostra and left at dawn.
Diagram: |
  graph TD
  click a "Ostra"
  click b "Atlantis"
History:
  Timeline:
    - {Date: "12Y 4M KAL", Event: Crowned in Ostra}
    - {Date: "-3Y 1M KAL", Event: Born}
"#,
    );
    write_doc(
        lib,
        "places/ostra.yml",
        r#"
node: Places
title: Ostra
Summary: Home port of The Wanderer.
History:
  Timeline:
    - {Date: "5Y 6M 15IDE", Event: Founded}
"#,
    );
    write_doc(
        lib,
        "lore/secret.yml",
        r#"
node: Lore
title: Secret
control: [no_autolink, no_link]
Text: Aria knows.
"#,
    );
}

#[test]
fn given_library_when_generating_then_writes_all_outputs() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let (svc, lib, out) = service(&temp);
    library(&lib);

    let report = svc.generate().unwrap();

    assert_eq!(report.documents, 3);
    assert_eq!(report.events, 3);
    for file in ["links.md", "nav.yml", "Timeline.yml", "link_index.yml"] {
        assert!(out.join(file).exists(), "missing {file}");
    }
    for page in ["aria", "ostra", "secret", "People", "Places", "Lore"] {
        assert!(
            out.join("pages").join(format!("{page}.yml")).exists(),
            "missing page {page}"
        );
    }
}

#[test]
fn given_library_when_generating_then_pages_are_linked() {
    let temp = TempDir::new().unwrap();
    let (svc, lib, out) = service(&temp);
    library(&lib);

    let report = svc.generate().unwrap();

    let aria = read_yaml(&out.join("pages/aria.yml"));
    assert_eq!(
        aria.get("Bio").and_then(Value::as_str),
        Some("Aria was born in [Ostra][Ostra] and left at dawn.")
    );
    let diagram = aria.get("Diagram").and_then(Value::as_str).unwrap();
    assert!(diagram.contains(r#"click a "../ostra/""#));
    assert!(diagram.contains(r#"click b "Atlantis""#));

    let ostra = read_yaml(&out.join("pages/ostra.yml"));
    assert_eq!(
        ostra.get("Summary").and_then(Value::as_str),
        Some("Home port of [The Wanderer][Aria].")
    );

    let secret = read_yaml(&out.join("pages/secret.yml"));
    assert_eq!(secret.get("Text").and_then(Value::as_str), Some("Aria knows."));

    let labels: Vec<_> = report.warnings.iter().map(|w| w.label.as_str()).collect();
    assert_eq!(labels, vec!["Atlantis"]);
    assert_eq!(report.warnings[0].source, "aria.yml");
}

#[test]
fn given_library_when_generating_then_timeline_and_index_written_in_order() {
    let temp = TempDir::new().unwrap();
    let (svc, lib, out) = service(&temp);
    library(&lib);

    svc.generate().unwrap();

    let timeline = read_yaml(&out.join("Timeline.yml"));
    let events: Vec<_> = timeline
        .as_sequence()
        .unwrap()
        .iter()
        .map(|e| e.get("Event").and_then(Value::as_str).unwrap().to_string())
        .collect();
    assert_eq!(events, vec!["Born", "Founded", "Crowned in Ostra"]);

    let aria = read_yaml(&out.join("pages/aria.yml"));
    let own = aria["History"]["Timeline"].as_sequence().unwrap();
    assert_eq!(own[0].get("Event").and_then(Value::as_str), Some("Born"));
    assert_eq!(own[0].get("Source").and_then(Value::as_str), Some("Aria"));

    let index = read_yaml(&out.join("link_index.yml"));
    let texts: Vec<_> = index
        .as_sequence()
        .unwrap()
        .iter()
        .map(|e| e.get("text").and_then(Value::as_str).unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["The Wanderer", "Timeline", "Ostra", "Aria"]);

    let links = std::fs::read_to_string(out.join("links.md")).unwrap();
    assert!(links.contains("[Timeline]: Timeline.md"));
    assert!(!links.contains("Secret"));
}

#[test]
fn given_no_link_page_when_generating_then_left_out_of_navigation() {
    let temp = TempDir::new().unwrap();
    let (svc, lib, out) = service(&temp);
    library(&lib);

    svc.generate().unwrap();

    let nav = std::fs::read_to_string(out.join("nav.yml")).unwrap();
    assert!(nav.contains("Aria"));
    assert!(nav.contains("Timeline"));
    assert!(!nav.contains("Secret"));
}

#[test]
fn given_stale_output_when_generating_then_output_replaced() {
    let temp = TempDir::new().unwrap();
    let (svc, lib, out) = service(&temp);
    library(&lib);
    write_doc(&out, "stale.txt", "old");

    svc.generate().unwrap();

    assert!(!out.join("stale.txt").exists());
    assert!(out.join("nav.yml").exists());
}

#[test]
fn given_bad_event_date_when_generating_then_aborts_without_output() {
    let temp = TempDir::new().unwrap();
    let (svc, lib, out) = service(&temp);
    write_doc(
        &lib,
        "aria.yml",
        "node: People\ntitle: Aria\nHistory:\n  Timeline:\n    - {Date: \"1Y 1M WAT\"}\n",
    );

    let result = svc.generate();

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::Chrono(_)))
    ));
    assert!(!out.exists());
}

#[test]
fn given_invalid_yaml_when_loading_then_invalid_document_error() {
    let temp = TempDir::new().unwrap();
    let (svc, lib, _) = service(&temp);
    write_doc(&lib, "broken.yml", "title: [unclosed\n");

    let result = svc.load_documents(&lib);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidDocument { .. }))
    ));
}

#[test]
fn given_current_directory_as_output_when_generating_then_refuses_and_keeps_library() {
    let temp = TempDir::new().unwrap();
    library(&temp.path().join("lib"));
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(temp.path()).unwrap();

    let settings = Settings {
        lib_dir: PathBuf::from("lib"),
        output_dir: PathBuf::from("."),
        ..Settings::default()
    };
    let svc = ServiceContainer::with_deps(settings, Arc::new(RealFileSystem)).site_service();
    let result = svc.generate();

    std::env::set_current_dir(previous).unwrap();
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
    assert!(temp.path().join("lib/people/aria.yml").exists());
}
