//! Import rewriting for staged schema files.
//!
//! protoc resolves `import` statements relative to its include paths, so a
//! schema file compiled into a package must reference its siblings through
//! the package path, not the bare file name. The rewrite runs on the staged
//! copy only; source files are never modified.

/// Generated Python modules are named `<stem>_pb2`; per-file packages reuse
/// that stem so the generated imports line up with the package directory.
pub const FILE_PACKAGE_SUFFIX: &str = "_pb2";

/// How staged files sit relative to the package namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportLayout {
    /// Every schema file directly under the namespace directory.
    Flat,
    /// Each schema file in its own `<stem>_pb2/` directory under the
    /// namespace. Used where the output language wants one package per file.
    PerFilePackage,
}

/// Rewrite every cross-file import in `source` to its fully qualified form
/// under `namespace`.
///
/// Matching is line-anchored: a line rewrites iff it starts with
/// `import "`. All matching lines rewrite, non-matching lines pass through
/// unchanged, and a file with no imports comes back byte-identical.
pub fn rewrite_imports(source: &str, namespace: &str, layout: ImportLayout) -> String {
    let mut out = String::with_capacity(source.len() + 64);
    for line in source.split_inclusive('\n') {
        match split_import(line) {
            Some((target, rest)) => {
                out.push_str("import \"");
                out.push_str(namespace);
                out.push('/');
                if layout == ImportLayout::PerFilePackage {
                    out.push_str(stem_of(target));
                    out.push_str(FILE_PACKAGE_SUFFIX);
                    out.push('/');
                }
                out.push_str(target);
                out.push_str(rest);
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Split an import line into the quoted target and everything after the
/// closing quote (including the line terminator). Returns `None` for
/// non-import lines.
fn split_import(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("import \"")?;
    let end = rest.find('"')?;
    Some((&rest[..end], &rest[end..]))
}

fn stem_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => &name[..dot],
        None => name,
    }
}
