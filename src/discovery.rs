//! Test Discovery (spec.md §4.3): enumerate test methods by attribute
//! marker, independent of any one test framework.
//!
//! The recognised-marker table is data, not branches (spec §9), so a
//! future framework is one more entry in [`TEST_MARKERS`], not a change
//! to the walk.

use crate::ast::SourceFile;
use std::path::{Path, PathBuf};
use syn::{Item, ImplItem};

/// Attribute final-segment names (case-insensitive) that mark a function
/// as a test, carried over verbatim from spec.md §4.3. `test` covers
/// Rust's built-in `#[test]` with zero special-casing.
pub const TEST_MARKERS: &[&str] = &["fact", "theory", "testmethod", "test", "datatestmethod"];

/// One discovered test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTest {
    /// File the test function lives in
    pub file: PathBuf,
    /// Nearest enclosing type (impl block) name, or the module path for
    /// free functions — the `<TypeDisplayName>` half of a coverage stem
    pub type_name: String,
    /// The test function/method's name
    pub method_name: String,
    /// `namespace.type.method`, or `type.method` when there is no
    /// enclosing namespace above `type_name`
    pub fully_qualified_name: String,
}

impl DiscoveredTest {
    /// `<TypeDisplayName>.<MethodName>`, used to name coverage files and
    /// key the pass/fail map (spec §3's "stem").
    pub fn stem(&self) -> String {
        format!("{}.{}", self.type_name, self.method_name)
    }
}

/// Discover every test under `root`, deduplicated by fully-qualified name
/// and sorted by ordinal (byte-wise) comparison (spec §4.3).
pub fn discover_tests(root: &Path, excluded_segments: &[String], excluded_suffixes: &[String]) -> Vec<DiscoveredTest> {
    let files = crate::fsutil::walk_rust_files(root, excluded_segments, excluded_suffixes);
    let mut found = Vec::new();

    for file in files {
        match SourceFile::parse(file.clone()) {
            Ok(source) => {
                let mut out = Vec::new();
                let mut module_path = Vec::new();
                collect_from_items(&source.syntax_tree.items, &file, &mut module_path, &mut out);
                found.extend(out);
            }
            Err(e) => log::warn!("{e}"),
        }
    }

    found.sort_by(|a, b| a.fully_qualified_name.cmp(&b.fully_qualified_name));
    found.dedup_by(|a, b| a.fully_qualified_name == b.fully_qualified_name);
    found
}

fn collect_from_items(items: &[Item], file: &Path, module_path: &mut Vec<String>, out: &mut Vec<DiscoveredTest>) {
    for item in items {
        match item {
            Item::Mod(item_mod) => {
                if let Some((_, inner)) = &item_mod.content {
                    module_path.push(item_mod.ident.to_string());
                    collect_from_items(inner, file, module_path, out);
                    module_path.pop();
                }
                // `mod foo;` pointing at another file: that file is
                // walked and parsed independently by the caller.
            }
            Item::Fn(item_fn) => {
                if has_test_marker(&item_fn.attrs) {
                    let type_name = if module_path.is_empty() {
                        "crate".to_string()
                    } else {
                        module_path.join("::")
                    };
                    let method_name = item_fn.sig.ident.to_string();
                    out.push(DiscoveredTest {
                        file: file.to_path_buf(),
                        fully_qualified_name: format!("{type_name}.{method_name}"),
                        type_name,
                        method_name,
                    });
                }
            }
            Item::Impl(item_impl) => {
                let type_name = self_type_name(item_impl);
                for impl_item in &item_impl.items {
                    if let ImplItem::Fn(method) = impl_item {
                        if has_test_marker(&method.attrs) {
                            let method_name = method.sig.ident.to_string();
                            let namespace = module_path.join("::");
                            let fully_qualified_name = if namespace.is_empty() {
                                format!("{type_name}.{method_name}")
                            } else {
                                format!("{namespace}.{type_name}.{method_name}")
                            };
                            out.push(DiscoveredTest {
                                file: file.to_path_buf(),
                                type_name: type_name.clone(),
                                method_name,
                                fully_qualified_name,
                            });
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn self_type_name(item_impl: &syn::ItemImpl) -> String {
    if let syn::Type::Path(type_path) = &*item_impl.self_ty {
        type_path
            .path
            .segments
            .last()
            .map(|s| s.ident.to_string())
            .unwrap_or_else(|| "UnknownImpl".to_string())
    } else {
        "UnknownImpl".to_string()
    }
}

fn has_test_marker(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path()
            .segments
            .last()
            .map(|seg| {
                let name = seg.ident.to_string().to_lowercase();
                TEST_MARKERS.contains(&name.as_str())
            })
            .unwrap_or(false)
    })
}
