//! Document lifecycle against a reloadable registry, as the language server
//! drives it.

mod common;

use baseline::data::SharedRegistry;
use baseline::session::Session;
use common::{create_temp_project, fixtures_dir};

const HTML: &str = "file:///project/index.html";
const CSS: &str = "file:///project/site.css";

fn diagnostic_ids(session: &Session, uri: &str, registry: &baseline_core::FeatureRegistry) -> Vec<String> {
    session
        .validate(uri, registry)
        .map(|run| run.diagnostics.into_iter().map(|d| d.feature_id).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_reload_revalidates_every_open_document() {
    let temp = tempfile::tempdir().unwrap();
    let data_path = temp.path().join("data.json");
    let shared = SharedRegistry::load(data_path.clone());

    let mut session = Session::new();
    session.open(HTML, 1, r#"<baseline-status featureId="gird">"#);
    session.open(CSS, 1, "/* baseline/grid */");

    // No data yet: nothing is flagged
    let registry = shared.snapshot();
    for uri in session.open_uris() {
        assert!(diagnostic_ids(&session, &uri, &registry).is_empty());
    }

    std::fs::copy(fixtures_dir().join("data.json"), &data_path).unwrap();
    let registry = shared.reload().await;

    let flagged: Vec<(String, Vec<String>)> = session
        .open_uris()
        .into_iter()
        .map(|uri| {
            let ids = diagnostic_ids(&session, &uri, &registry);
            (uri, ids)
        })
        .collect();
    assert_eq!(
        flagged,
        vec![
            (HTML.to_string(), vec!["gird".to_string()]),
            (CSS.to_string(), vec![]),
        ]
    );
}

#[tokio::test]
async fn test_edit_cycle_publishes_only_current_runs() {
    let project = create_temp_project();
    let shared = SharedRegistry::load(
        project
            .path()
            .join("node_modules/web-features/data.json"),
    );
    let registry = shared.snapshot();
    assert_eq!(registry.len(), 3);

    let mut session = Session::new();
    session.open(CSS, 1, "/* baseline/container-querie */");
    let first = session.validate(CSS, &registry).unwrap();
    assert_eq!(first.diagnostics.len(), 1);

    // The user finishes typing before the first run is published
    assert!(session.change(CSS, 2, "/* baseline/container-queries */"));
    assert!(!session.is_current(&first));

    let second = session.validate(CSS, &registry).unwrap();
    assert!(session.is_current(&second));
    assert!(second.diagnostics.is_empty());

    assert!(session.close(CSS));
    assert!(session.open_uris().is_empty());
}
