//! Disposable staging trees presented to the schema compiler.
//!
//! Schema files cannot be compiled in place: the import paths baked into the
//! generated bindings depend on the destination package layout. Each job
//! therefore copies its sources into a uniquely named temp tree shaped like
//! that layout, with every import rewritten to match, and the compiler runs
//! against the copy. The tree is removed when the job ends, whatever the
//! outcome.

use crate::interrupt;
use crate::rewrite::{rewrite_imports, ImportLayout, FILE_PACKAGE_SUFFIX};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use tempfile::TempDir;
use tracing::debug;

/// File extension of interface-definition sources.
pub const SCHEMA_EXT: &str = "proto";

/// A staged copy of one job's schema files. Dropping the tree deletes it.
#[derive(Debug)]
pub struct StagingTree {
    // Held for its Drop impl; `root` is the same path as UTF-8.
    _dir: TempDir,
    root: Utf8PathBuf,
    files: Vec<Utf8PathBuf>,
}

impl StagingTree {
    /// Copy every schema file directly inside `source_dir` (subdirectories
    /// are not scanned) into a fresh temp tree at the path dictated by
    /// `layout`, rewriting imports for `namespace` on the way.
    ///
    /// Any read or write failure aborts the whole job; partially staged
    /// files go away with the tree.
    pub fn stage(
        source_dir: &Utf8Path,
        namespace: &str,
        layout: ImportLayout,
    ) -> anyhow::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("protodrive-")
            .tempdir()
            .context("create staging dir")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|p| anyhow::anyhow!("staging dir is not UTF-8: {}", p.display()))?;
        interrupt::register(&root);

        let mut files = Vec::new();
        for name in schema_file_names(source_dir)? {
            let source_path = source_dir.join(&name);
            let contents = fs::read_to_string(&source_path)
                .with_context(|| format!("read {}", source_path))?;
            let rewritten = rewrite_imports(&contents, namespace, layout);

            let staged_rel = match layout {
                ImportLayout::Flat => Utf8PathBuf::from(namespace).join(&name),
                ImportLayout::PerFilePackage => {
                    let stem = name.strip_suffix(&format!(".{SCHEMA_EXT}")).unwrap_or(&name);
                    Utf8PathBuf::from(namespace)
                        .join(format!("{stem}{FILE_PACKAGE_SUFFIX}"))
                        .join(&name)
                }
            };
            let staged = root.join(staged_rel);
            if let Some(parent) = staged.parent() {
                fs::create_dir_all(parent).with_context(|| format!("create {}", parent))?;
            }
            fs::write(&staged, &rewritten).with_context(|| format!("write {}", staged))?;
            debug!(source = %source_path, staged = %staged, "staged schema file");
            files.push(staged);
        }

        Ok(Self {
            _dir: dir,
            root,
            files,
        })
    }

    /// Root of the tree; passed to the compiler as its include search path.
    pub fn include_root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute paths of the staged files, in deterministic name order.
    pub fn files(&self) -> &[Utf8PathBuf] {
        &self.files
    }
}

impl Drop for StagingTree {
    fn drop(&mut self) {
        interrupt::unregister(&self.root);
    }
}

/// Schema file names directly under `dir`, sorted for deterministic staging
/// and invocation order.
fn schema_file_names(dir: &Utf8Path) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read source dir {}", dir))? {
        let entry = entry.with_context(|| format!("read source dir {}", dir))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(&format!(".{SCHEMA_EXT}")) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn utf8(p: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(p.to_path_buf()).expect("utf8 path")
    }

    fn source_dir_with(files: &[(&str, &str)]) -> (TempDir, Utf8PathBuf) {
        let td = TempDir::new().expect("tempdir");
        let dir = utf8(td.path());
        for (name, contents) in files {
            std_fs::write(dir.join(name).as_std_path(), contents).expect("write source");
        }
        (td, dir)
    }

    #[test]
    fn flat_layout_stages_under_namespace() {
        let (_td, src) = source_dir_with(&[("a.proto", "import \"b.proto\";\n"), ("b.proto", "")]);
        let tree = StagingTree::stage(&src, "ns", ImportLayout::Flat).expect("stage");

        let rels: Vec<String> = tree
            .files()
            .iter()
            .map(|f| f.strip_prefix(tree.include_root()).unwrap().to_string())
            .collect();
        assert_eq!(rels, vec!["ns/a.proto", "ns/b.proto"]);

        let staged_a = std_fs::read_to_string(tree.files()[0].as_std_path()).expect("read staged");
        assert_eq!(staged_a, "import \"ns/b.proto\";\n");
    }

    #[test]
    fn per_file_package_layout_gives_each_file_its_own_dir() {
        let (_td, src) = source_dir_with(&[("a.proto", "import \"b.proto\";\n"), ("b.proto", "")]);
        let tree = StagingTree::stage(&src, "ns", ImportLayout::PerFilePackage).expect("stage");

        let rels: Vec<String> = tree
            .files()
            .iter()
            .map(|f| f.strip_prefix(tree.include_root()).unwrap().to_string())
            .collect();
        assert_eq!(rels, vec!["ns/a_pb2/a.proto", "ns/b_pb2/b.proto"]);

        let staged_a = std_fs::read_to_string(tree.files()[0].as_std_path()).expect("read staged");
        assert_eq!(staged_a, "import \"ns/b_pb2/b.proto\";\n");
    }

    #[test]
    fn subdirectories_and_non_schema_files_are_skipped() {
        let (_td, src) = source_dir_with(&[("a.proto", ""), ("notes.txt", "x")]);
        std_fs::create_dir(src.join("nested").as_std_path()).expect("mkdir");
        std_fs::write(src.join("nested/c.proto").as_std_path(), "").expect("write");

        let tree = StagingTree::stage(&src, "ns", ImportLayout::Flat).expect("stage");
        assert_eq!(tree.files().len(), 1);
        assert!(tree.files()[0].as_str().ends_with("ns/a.proto"));
    }

    #[test]
    fn staged_order_is_sorted_by_name() {
        let (_td, src) = source_dir_with(&[("z.proto", ""), ("a.proto", ""), ("m.proto", "")]);
        let tree = StagingTree::stage(&src, "ns", ImportLayout::Flat).expect("stage");
        let names: Vec<&str> = tree
            .files()
            .iter()
            .map(|f| f.file_name().unwrap())
            .collect();
        assert_eq!(names, vec!["a.proto", "m.proto", "z.proto"]);
    }

    #[test]
    fn tree_is_removed_on_drop() {
        let (_td, src) = source_dir_with(&[("a.proto", "")]);
        let root = {
            let tree = StagingTree::stage(&src, "ns", ImportLayout::Flat).expect("stage");
            tree.include_root().to_path_buf()
        };
        assert!(!root.as_std_path().exists());
    }

    #[test]
    fn missing_source_dir_is_fatal() {
        let err = StagingTree::stage(Utf8Path::new("/nonexistent/protos"), "ns", ImportLayout::Flat)
            .expect_err("should fail");
        assert!(format!("{err:#}").contains("read source dir"));
    }
}
