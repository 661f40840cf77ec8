use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::models::{ProductCatalog, ProductRecord};
use crate::utils::error::{AppError, Result};

/// All tracked products, mirrored to a single JSON document.
///
/// Every mutating call rewrites the whole document before returning. If the
/// write fails the in-memory change is undone, so memory and disk never
/// disagree about what was committed.
#[derive(Debug)]
pub struct PriceStore {
    path: PathBuf,
    catalog: ProductCatalog,
}

impl PriceStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let catalog = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No state at {}, starting empty", path.display());
                ProductCatalog::default()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("Loaded {} products from {}", catalog.products.len(), path.display());
        Ok(Self { path, catalog })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the document atomically: temp file in the target directory, then rename.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.catalog)?;
        self.write_atomic(json.as_bytes())
            .map_err(|e| AppError::persistence(&self.path, e))
    }

    fn write_atomic(&self, contents: &[u8]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(contents)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.catalog.products.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ProductRecord> {
        self.catalog.products.get(name)
    }

    /// Records in iteration order (alphabetical by name).
    pub fn list(&self) -> impl Iterator<Item = (&String, &ProductRecord)> {
        self.catalog.products.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.catalog.products.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.catalog.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.products.is_empty()
    }

    pub fn add(&mut self, name: &str, record: ProductRecord) -> Result<()> {
        if self.contains(name) {
            return Err(AppError::DuplicateProduct { name: name.to_string() });
        }

        self.catalog.products.insert(name.to_string(), record);
        if let Err(e) = self.save() {
            self.catalog.products.remove(name);
            return Err(e);
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<ProductRecord> {
        let record = self
            .catalog
            .products
            .remove(name)
            .ok_or_else(|| AppError::ProductNotFound { name: name.to_string() })?;

        if let Err(e) = self.save() {
            self.catalog.products.insert(name.to_string(), record);
            return Err(e);
        }
        Ok(record)
    }

    /// Apply `f` to the named record and persist the result.
    pub fn update<T>(&mut self, name: &str, f: impl FnOnce(&mut ProductRecord) -> T) -> Result<T> {
        let record = self
            .catalog
            .products
            .get_mut(name)
            .ok_or_else(|| AppError::ProductNotFound { name: name.to_string() })?;

        let snapshot = record.clone();
        let value = f(record);

        if let Err(e) = self.save() {
            self.catalog.products.insert(name.to_string(), snapshot);
            return Err(e);
        }
        Ok(value)
    }
}
