#![allow(dead_code)]

use doc_sync_core::config::{GenerateConfig, Repository};
use std::fs;
use std::path::{Path, PathBuf};

pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small modular checkout:
///
/// ```text
/// service/service-auth/README.md
/// service/service-device/docs/README.md
/// service/notes/                    (no module prefix)
/// client/client-coinbase/           (no README)
/// framework/framework-logging/README.md
/// application/README.md
/// ```
pub fn module_tree(root: &Path) {
    write_file(
        root,
        "service/service-auth/README.md",
        "# Auth Service\n\nHandles authentication.\n\nSee [TOTP](./docs/TOTP.md).\n",
    );
    write_file(
        root,
        "service/service-device/docs/README.md",
        "# Device Service\n\nTracks devices.\n",
    );
    fs::create_dir_all(root.join("service/notes")).unwrap();
    fs::create_dir_all(root.join("client/client-coinbase/src")).unwrap();
    write_file(
        root,
        "framework/framework-logging/README.md",
        "# Logging\n\nStructured logging returning Map<String, Object>.\n",
    );
    write_file(root, "application/README.md", "# Application\n\nBoots it all.\n");
}

pub fn repository() -> Repository {
    Repository {
        id: "strategiz-core".into(),
        slug: "strategiz-io/strategiz-core".into(),
        branch: "main".into(),
        local_path: None,
    }
}

pub fn generate_config(source_root: PathBuf) -> GenerateConfig {
    GenerateConfig {
        source_root,
        output_dir: PathBuf::from("strategiz-core"),
        repository: Some(repository()),
        web_base_url: "https://github.com".into(),
        sidebar_id: "strategizCoreSidebar".into(),
        sidebar_label: "Strategiz Core".into(),
        module_folders: ["service", "client", "business", "data", "framework"]
            .into_iter()
            .map(String::from)
            .collect(),
        readme_candidates: vec!["README.md".into(), "docs/README.md".into()],
    }
}
