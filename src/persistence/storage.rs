// Storage backends - byte-oriented slots keyed by namespace and slot id

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Durable byte storage.
///
/// `load` returns `Ok(None)` for a slot that was never written.
pub trait Storage {
    fn save(&mut self, namespace: &str, slot: u8, bytes: &[u8]) -> io::Result<()>;
    fn load(&self, namespace: &str, slot: u8) -> io::Result<Option<Vec<u8>>>;
}

/// One file per slot: `<root>/<namespace>/<slot>.ron`
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, namespace: &str, slot: u8) -> PathBuf {
        self.root.join(namespace).join(format!("{:02}.ron", slot))
    }
}

impl Storage for FileStorage {
    fn save(&mut self, namespace: &str, slot: u8, bytes: &[u8]) -> io::Result<()> {
        let path = self.slot_path(namespace, slot);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        // Write then rename so a crash never leaves a half-written slot
        let temp_path = path.with_extension("ron.tmp");
        std::fs::write(&temp_path, bytes)?;
        std::fs::rename(&temp_path, &path)
    }

    fn load(&self, namespace: &str, slot: u8) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(self.slot_path(namespace, slot)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Volatile storage, for tests and for running without a data directory
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<(String, u8), Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn save(&mut self, namespace: &str, slot: u8, bytes: &[u8]) -> io::Result<()> {
        self.slots
            .insert((namespace.to_string(), slot), bytes.to_vec());
        Ok(())
    }

    fn load(&self, namespace: &str, slot: u8) -> io::Result<Option<Vec<u8>>> {
        Ok(self.slots.get(&(namespace.to_string(), slot)).cloned())
    }
}
