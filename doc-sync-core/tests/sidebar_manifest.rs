use doc_sync_core::sidebar::{doc_id, label_for, ManifestBuilder, SidebarCategory, SidebarItem};
use doc_sync_core::SyncError;
use std::path::Path;

fn synced() -> ManifestBuilder {
    let mut builder = ManifestBuilder::new("syncedSidebar");
    builder.record(Some(("auth", "Auth")), "auth/totp");
    builder.record(Some(("api", "Api")), "api/endpoints");
    builder.record(Some(("auth", "Auth")), "auth/sms");
    builder.record(None, "intro");
    builder
}

#[test]
fn categories_keep_first_seen_order() {
    let manifest = synced().build();
    assert_eq!(
        manifest.items,
        vec![
            SidebarItem::Category(SidebarCategory::new(
                "Auth",
                vec![
                    SidebarItem::Doc("auth/totp".into()),
                    SidebarItem::Doc("auth/sms".into()),
                ],
            )),
            SidebarItem::Category(SidebarCategory::new(
                "Api",
                vec![SidebarItem::Doc("api/endpoints".into())],
            )),
            SidebarItem::Doc("intro".into()),
        ]
    );
}

#[test]
fn empty_builder_has_no_root_category() {
    let manifest = ManifestBuilder::new("x").with_root_category("Root").build();
    assert!(manifest.items.is_empty());
}

#[test]
fn fresh_file_gets_the_full_template() {
    let merged = synced().build().merge_into(None).unwrap();
    assert!(merged.contains("// @ts-check"));
    assert!(merged.contains("const sidebars = {\n  // @generated-begin syncedSidebar\n  \"syncedSidebar\": ["));
    assert!(merged.contains("\"type\": \"category\""));
    assert!(merged.trim_end().ends_with("module.exports = sidebars;"));
}

#[test]
fn block_is_inserted_after_the_opening_line() {
    let existing = "// hand written\nconst sidebars = {\n  tutorialSidebar: ['intro'],\n};\n\nmodule.exports = sidebars;\n";
    let merged = synced().build().merge_into(Some(existing)).unwrap();

    assert!(merged.starts_with("// hand written\nconst sidebars = {\n  // @generated-begin syncedSidebar\n"));
    assert!(merged.contains("  // @generated-end syncedSidebar\n  tutorialSidebar: ['intro'],\n};\n"));
}

#[test]
fn merging_twice_is_stable_and_replaces_stale_entries() {
    let existing = "const sidebars = {\n  other: [],\n};\n";
    let first = synced().build().merge_into(Some(existing)).unwrap();

    let mut changed = ManifestBuilder::new("syncedSidebar");
    changed.record(None, "only");
    let second = changed.build().merge_into(Some(&first)).unwrap();

    assert!(second.contains("\"only\""));
    assert!(!second.contains("auth/totp"));
    assert!(second.contains("  other: [],"));

    let again = {
        let mut b = ManifestBuilder::new("syncedSidebar");
        b.record(None, "only");
        b.build().merge_into(Some(&second)).unwrap()
    };
    assert_eq!(again, second);
}

#[test]
fn blocks_of_different_sidebars_coexist() {
    let first = synced().build().merge_into(None).unwrap();
    let mut core = ManifestBuilder::new("strategizCoreSidebar").with_root_category("Strategiz Core");
    core.record(Some(("service", "Service")), "strategiz-core/service/service-auth");
    let merged = core.build().merge_into(Some(&first)).unwrap();

    assert!(merged.contains("// @generated-begin syncedSidebar"));
    assert!(merged.contains("// @generated-begin strategizCoreSidebar"));
    assert!(merged.contains("\"label\": \"Strategiz Core\""));
}

#[test]
fn sidebar_id_prefix_does_not_claim_a_longer_ids_block() {
    let mut extra = ManifestBuilder::new("syncedSidebarExtra");
    extra.record(None, "extra/page");
    let existing = extra.build().merge_into(None).unwrap();

    let once = synced().build().merge_into(Some(&existing)).unwrap();
    let twice = synced().build().merge_into(Some(&once)).unwrap();

    assert_eq!(twice, once);
    assert_eq!(twice.matches("// @generated-begin syncedSidebar\n").count(), 1);
    assert_eq!(twice.matches("// @generated-begin syncedSidebarExtra\n").count(), 1);
    assert!(twice.contains("\"extra/page\""));
}

#[test]
fn unrecognised_file_is_a_manifest_error() {
    let err = synced()
        .build()
        .merge_into(Some("export default {};\n"))
        .unwrap_err();
    assert!(matches!(err, SyncError::Manifest(_)));
}

#[test]
fn lone_marker_is_a_manifest_error() {
    let broken = "const sidebars = {\n  // @generated-begin syncedSidebar\n};\n";
    let err = synced().build().merge_into(Some(broken)).unwrap_err();
    assert!(matches!(err, SyncError::Manifest(_)));
}

#[test]
fn doc_ids_are_relative_to_the_docs_dir() {
    assert_eq!(
        doc_id(Path::new("docs"), Path::new("docs/auth/totp.md")),
        Some("auth/totp".to_string())
    );
    assert_eq!(
        doc_id(Path::new("./docs"), Path::new("docs/intro.md")),
        Some("intro".to_string())
    );
    assert_eq!(doc_id(Path::new("docs"), Path::new("blog/post.md")), None);
    assert_eq!(label_for("email-otp"), "Email Otp");
}
