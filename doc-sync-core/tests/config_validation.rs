use doc_sync_core::config::{GenerateConfig, ScheduleConfig, SyncConfig};
use doc_sync_core::SyncError;
use std::time::Duration;

fn sync_from(yaml: &str) -> SyncConfig {
    serde_yaml::from_str(yaml).expect("valid sync yaml")
}

const REPOS: &str = r#"
repositories:
  - id: core
    slug: strategiz-io/strategiz-core
"#;

#[test]
fn defaults_are_filled_in() {
    let config = sync_from(REPOS);
    assert_eq!(config.raw_base_url, "https://raw.githubusercontent.com");
    assert_eq!(config.web_base_url, "https://github.com");
    assert_eq!(config.timeout(), Duration::from_secs(10));
    assert_eq!(config.sidebar_id, "syncedSidebar");
    assert_eq!(config.repositories[0].branch, "main");
    assert!(config.mappings.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn duplicate_destinations_are_rejected() {
    let config = sync_from(&format!(
        "{REPOS}mappings:\n  - {{ source: a.md, repo: core, destination: docs/x.md }}\n  - {{ source: b.md, repo: core, destination: docs/./x.md }}\n"
    ));
    let err = config.validate().unwrap_err();
    assert!(matches!(err, SyncError::Config(ref msg) if msg.contains("docs/./x.md")), "{err}");
}

#[test]
fn unknown_repository_is_rejected() {
    let config = sync_from(&format!(
        "{REPOS}mappings:\n  - {{ source: a.md, repo: other, destination: docs/a.md }}\n"
    ));
    assert!(matches!(config.validate(), Err(SyncError::Config(_))));
}

#[test]
fn escaping_destination_is_rejected() {
    let config = sync_from(&format!(
        "{REPOS}mappings:\n  - {{ source: a.md, repo: core, destination: ../outside.md }}\n"
    ));
    assert!(matches!(config.validate(), Err(SyncError::Config(_))));
}

#[test]
fn malformed_slug_is_rejected() {
    let config = sync_from("repositories:\n  - { id: core, slug: just-a-name }\n");
    assert!(matches!(config.validate(), Err(SyncError::Config(_))));
}

#[test]
fn generate_defaults_cover_the_standard_layout() {
    let config: GenerateConfig =
        serde_yaml::from_str("source_root: ../core\noutput_dir: strategiz-core\n").unwrap();
    assert_eq!(
        config.module_folders,
        ["service", "client", "business", "data", "framework"]
    );
    assert_eq!(config.readme_candidates, ["README.md", "docs/README.md"]);
    assert_eq!(config.sidebar_id, "strategizCoreSidebar");
    assert!(config.repository.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn generate_output_dir_must_stay_inside_docs() {
    let config: GenerateConfig =
        serde_yaml::from_str("source_root: ../core\noutput_dir: /tmp/out\n").unwrap();
    assert!(matches!(config.validate(), Err(SyncError::Config(_))));
}

#[test]
fn schedule_interval_defaults_to_five_hours() {
    assert_eq!(ScheduleConfig::default().interval(), Duration::from_secs(5 * 3600));
    assert!(ScheduleConfig::default().validate().is_ok());
}

#[test]
fn zero_hour_schedule_interval_is_rejected() {
    let zero = ScheduleConfig { interval_hours: 0 };
    assert!(matches!(zero.validate(), Err(SyncError::Config(_))));
}
