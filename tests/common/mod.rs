use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vapor::config::{ConfigStore, WORKSPACE_CONFIG_FILE};
use vapor::controller::SessionController;
use vapor::providers::HttpChatBackend;
use vapor::storage::StorageLayout;

/// A scratch data root plus a workspace directory inside one tempdir
#[allow(dead_code)]
pub struct TestWorkspace {
    pub tmp: TempDir,
    pub data_root: PathBuf,
    pub workspace_root: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("failed to create tempdir");
        let data_root = tmp.path().join("data");
        let workspace_root = tmp.path().join("project");
        fs::create_dir_all(&workspace_root).expect("failed to create workspace dir");
        Self {
            tmp,
            data_root,
            workspace_root,
        }
    }

    /// Path of the workspace-local config file
    pub fn config_path(&self) -> PathBuf {
        self.workspace_root.join(WORKSPACE_CONFIG_FILE)
    }

    /// Write the workspace-local config file
    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.config_path();
        fs::write(&path, contents).expect("failed to write config file");
        path
    }

    /// Config store bound to the workspace-local file, loaded if present
    pub fn config_store(&self) -> ConfigStore {
        let store = ConfigStore::new(Some(self.config_path()));
        if self.config_path().exists() {
            store.load();
        }
        store
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.data_root)
    }

    pub fn key(&self) -> String {
        self.workspace_root.to_string_lossy().into_owned()
    }

    /// Controller using the real HTTP backend
    pub fn controller(&self, config: ConfigStore) -> SessionController {
        SessionController::open(
            &self.layout(),
            self.key(),
            config,
            Box::new(HttpChatBackend::new().expect("failed to build http client")),
        )
        .expect("failed to open session controller")
    }
}

#[allow(dead_code)]
pub fn read_json(path: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(path).expect("failed to read json file");
    serde_json::from_str(&raw).expect("invalid json")
}
