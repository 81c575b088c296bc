mod common;

use doc_sync_core::config::SiteConfig;
use doc_sync_core::generate::generate;
use doc_sync_core::write::Outcome;
use doc_sync_core::SyncError;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn site(root: &Path) -> SiteConfig {
    SiteConfig {
        root: root.to_path_buf(),
        ..SiteConfig::default()
    }
}

#[test]
fn one_page_per_module_with_placeholders_for_missing_readmes() {
    let core = tempdir().unwrap();
    let site_dir = tempdir().unwrap();
    common::module_tree(core.path());

    let report = generate(&site(site_dir.path()), &common::generate_config(core.path().to_path_buf()))
        .unwrap();

    let out = site_dir.path().join("docs/strategiz-core");
    let auth = fs::read_to_string(out.join("service/service-auth.md")).unwrap();
    assert!(auth.contains("title: Auth Service"));
    assert!(auth.contains(
        "[TOTP](https://github.com/strategiz-io/strategiz-core/blob/main/service/service-auth/./docs/TOTP.md)"
    ));

    let logging = fs::read_to_string(out.join("framework/framework-logging.md")).unwrap();
    assert!(logging.contains("`Map<String, Object>`"));

    let coinbase = fs::read_to_string(out.join("client/client-coinbase.md")).unwrap();
    assert!(coinbase.contains("Documentation coming soon"));
    assert!(coinbase.contains("title: client-coinbase"));

    assert!(out.join("application/application.md").is_file());

    let totals = report.totals();
    assert_eq!((totals.total, totals.success, totals.placeholder), (5, 4, 1));
    assert_eq!(report.coverage_percent(), 80);
    assert!(report
        .items()
        .iter()
        .any(|i| i.name == "client-coinbase" && i.outcome == Outcome::Placeholder));
}

#[test]
fn previous_output_is_removed() {
    let core = tempdir().unwrap();
    let site_dir = tempdir().unwrap();
    common::module_tree(core.path());
    common::write_file(site_dir.path(), "docs/strategiz-core/service/service-gone.md", "stale");
    common::write_file(site_dir.path(), "docs/intro.md", "# Intro\n");

    generate(&site(site_dir.path()), &common::generate_config(core.path().to_path_buf())).unwrap();

    assert!(!site_dir.path().join("docs/strategiz-core/service/service-gone.md").exists());
    assert!(site_dir.path().join("docs/intro.md").exists());
}

#[test]
fn sidebar_nests_type_categories_under_the_root_label() {
    let core = tempdir().unwrap();
    let site_dir = tempdir().unwrap();
    common::module_tree(core.path());

    generate(&site(site_dir.path()), &common::generate_config(core.path().to_path_buf())).unwrap();

    let sidebars = fs::read_to_string(site_dir.path().join("sidebars.js")).unwrap();
    assert!(sidebars.contains("\"strategizCoreSidebar\": ["));
    assert!(sidebars.contains("\"label\": \"Strategiz Core\""));
    assert!(sidebars.contains("\"label\": \"Service\""));
    assert!(sidebars.contains("\"strategiz-core/service/service-auth\""));
    assert!(sidebars.contains("\"strategiz-core/client/client-coinbase\""));
    let service = sidebars.find("\"label\": \"Service\"").unwrap();
    let application = sidebars.find("\"label\": \"Application\"").unwrap();
    assert!(service < application);
}

#[test]
fn report_lists_modules_with_readme_paths() {
    let core = tempdir().unwrap();
    let site_dir = tempdir().unwrap();
    common::module_tree(core.path());

    let report = generate(&site(site_dir.path()), &common::generate_config(core.path().to_path_buf()))
        .unwrap();
    let printed = report.to_string();

    assert!(printed.contains("SERVICE:"));
    assert!(printed.contains("✓ service-auth (service/service-auth/README.md)"));
    assert!(printed.contains("⚠ client-coinbase (no README)"));
    assert!(printed.contains("Coverage: 80%"));
}

#[test]
fn missing_source_root_fails_without_touching_the_site() {
    let site_dir = tempdir().unwrap();
    common::write_file(site_dir.path(), "docs/strategiz-core/keep.md", "kept");

    let err = generate(
        &site(site_dir.path()),
        &common::generate_config(site_dir.path().join("no-such-checkout")),
    )
    .unwrap_err();

    assert!(matches!(err, SyncError::Scan { .. }), "{err:?}");
    assert!(site_dir.path().join("docs/strategiz-core/keep.md").exists());
}
