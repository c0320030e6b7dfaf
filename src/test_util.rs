use std::path::{Path, PathBuf};

use fs_err as fs;

/// A scratch folder under the system temp dir that is removed on drop.
pub struct TestFolder {
    path: PathBuf,
}

impl TestFolder {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "gazeatlas-test-{}-{}",
            name,
            std::process::id()
        ));

        if path.exists() {
            fs::remove_dir_all(&path).unwrap();
        }
        fs::create_dir_all(&path).unwrap();

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.path.join(relative)
    }

    /// Creates empty files.
    pub fn touch(&self, names: &[&str]) {
        for name in names {
            self.write(name, &[]);
        }
    }

    pub fn write<P: AsRef<Path>>(&self, relative: P, contents: &[u8]) {
        let path = self.path.join(relative);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(path, contents).unwrap();
    }
}

impl Drop for TestFolder {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
