//! In-place edits of `ptpack.toml`.
//!
//! The descriptor is user-owned text, so writes go through a `toml_edit`
//! document: comments and unrelated layout survive `ptpack lock` and
//! `ptpack fmt`.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use toml_edit::{ArrayOfTables, DocumentMut, Item, RawString, Table, Value, value};
use tracing::debug;

use super::{ConfigError, DescriptorFile};
use crate::lock::LockHash;

/// Canonical section order, each with its canonical key order.
const SECTIONS: &[(&str, &[&str])] = &[
  (
    "package",
    &["name", "version", "source", "bin", "lock_hash", "license", "description", "homepage"],
  ),
  ("toolchain", &["channel", "version", "components"]),
  ("native", &["profile", "link", "build"]),
  ("platforms", &["systems", "default"]),
  ("devshell", &["tools", "env"]),
];

/// A descriptor file opened for editing.
///
/// Holds both the typed view (validated on load) and the editable document.
pub struct DescriptorDocument {
  path: PathBuf,
  original: String,
  doc: DocumentMut,
  file: DescriptorFile,
}

impl DescriptorDocument {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let original = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let file = DescriptorFile::parse(&original).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    let doc = original.parse::<DocumentMut>().map_err(|source| ConfigError::Edit {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(Self {
      path: path.to_path_buf(),
      original,
      doc,
      file,
    })
  }

  pub fn file(&self) -> &DescriptorFile {
    &self.file
  }

  /// Record `hash` as `package.lock_hash`. Returns whether anything changed.
  ///
  /// Only that one value is touched; an existing value keeps its trailing comment.
  pub fn set_lock_hash(&mut self, hash: &LockHash) -> Result<bool, ConfigError> {
    if self.file.package.lock_hash.as_deref() == Some(hash.as_str()) {
      return Ok(false);
    }
    let package = self
      .doc
      .as_table_mut()
      .get_mut("package")
      .and_then(Item::as_table_like_mut)
      .ok_or(ConfigError::NotATable("package"))?;

    match package.get_mut("lock_hash").and_then(Item::as_value_mut) {
      Some(existing) => {
        let decor = existing.decor().clone();
        *existing = Value::from(hash.as_str());
        *existing.decor_mut() = decor;
      }
      None => {
        package.insert("lock_hash", value(hash.as_str()));
      }
    }
    self.file.package.lock_hash = Some(hash.to_string());
    Ok(true)
  }

  /// Rewrite into canonical form: sections and keys in a fixed order, one
  /// space around `=`, one blank line between tables. Comments are kept with
  /// the key or table they precede. Idempotent.
  pub fn format(&mut self) {
    let names: Vec<&str> = SECTIONS.iter().map(|(name, _)| *name).collect();
    let root = self.doc.as_table_mut();
    root.sort_values_by(|a, _, b, _| by_order(&names, a.get(), b.get()));

    let mut position = 0;
    for (name, keys) in SECTIONS {
      let Some(item) = root.get_mut(name) else {
        continue;
      };
      match item {
        Item::Table(table) => format_table(table, keys, &mut position),
        Item::ArrayOfTables(array) => format_array(array, &mut position),
        _ => {}
      }
    }
  }

  /// The document as it would be written.
  pub fn render(&self) -> String {
    self.doc.to_string()
  }

  /// Whether the rendered document differs from what was loaded.
  pub fn is_modified(&self) -> bool {
    self.render() != self.original
  }

  /// Write the document, replacing the file atomically.
  pub fn save(&self) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
      path: self.path.clone(),
      source,
    };
    let tmp = self.path.with_extension("toml.tmp");
    fs::write(&tmp, self.render()).map_err(write_err)?;
    fs::rename(&tmp, &self.path).map_err(write_err)?;
    debug!(path = %self.path.display(), "descriptor written");
    Ok(())
  }
}

/// Listed keys first in listed order, everything else alphabetically after.
fn by_order(order: &[&str], a: &str, b: &str) -> Ordering {
  let rank = |k: &str| order.iter().position(|o| *o == k).unwrap_or(order.len());
  rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

fn raw_text(raw: Option<&RawString>) -> &str {
  raw.and_then(RawString::as_str).unwrap_or("")
}

fn format_table(table: &mut Table, keys: &[&str], position: &mut usize) {
  if !table.is_implicit() {
    let prefix = raw_text(table.decor().prefix()).trim_start().to_string();
    let prefix = if *position == 0 { prefix } else { format!("\n{}", prefix) };
    table.decor_mut().set_prefix(prefix);
    table.set_position(*position);
    *position += 1;
  }

  table.sort_values_by(|a, _, b, _| by_order(keys, a.get(), b.get()));
  for (mut key, item) in table.iter_mut() {
    let decor = key.leaf_decor_mut();
    if !raw_text(decor.prefix()).contains('#') {
      decor.set_prefix("");
    }
    decor.set_suffix(" ");

    match item {
      Item::Value(v) => {
        let decor = v.decor_mut();
        decor.set_prefix(" ");
        if !raw_text(decor.suffix()).contains('#') {
          decor.set_suffix("");
        }
      }
      Item::Table(child) => format_table(child, &[], position),
      Item::ArrayOfTables(array) => format_array(array, position),
      Item::None => {}
    }
  }
}

fn format_array(array: &mut ArrayOfTables, position: &mut usize) {
  for table in array.iter_mut() {
    format_table(table, &[], position);
  }
}
