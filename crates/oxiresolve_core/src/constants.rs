//! Constants for file extensions, well-known file names and watched globals.
//!
//! Resolution probes candidates in a fixed order. Two orderings exist:
//!
//! - **typed-first**: `.ts`, `.tsx` before `.js`, `.jsx`, `.mjs`
//! - **script-first**: the reverse, used for importers that are plain scripts
//!
//! Directory indexes follow the same two orderings.

/// Extensions appended to an extensionless path, typed-first order
pub const TS_EXTENSIONS_FIRST: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs"];

/// Extensions appended to an extensionless path, script-first order
pub const JS_EXTENSIONS_FIRST: &[&str] = &[".js", ".jsx", ".mjs", ".ts", ".tsx"];

/// Directory index files, typed-first order
pub const TS_INDEXES_FIRST: &[&str] = &["index.ts", "index.tsx", "index.js", "index.jsx"];

/// Directory index files, script-first order
pub const JS_INDEXES_FIRST: &[&str] = &["index.js", "index.jsx", "index.ts", "index.tsx"];

/// Extension tried when every other probe failed
pub const JSON_EXTENSION: &str = ".json";

/// File extensions for JavaScript/TypeScript files that should be analyzed
pub const JS_TS_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Script extensions whose importers resolve script-first
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

pub const PACKAGE_MANIFEST: &str = "package.json";
pub const TSCONFIG_FILE: &str = "tsconfig.json";
pub const VENDOR_DIR: &str = "node_modules";

/// Manifest field that overrides `main` for first-party packages
pub const LOCAL_MAIN_FIELD: &str = "local:main";

/// Entry used when a manifest names none
pub const DEFAULT_PACKAGE_ENTRY: &str = "index.js";

/// Emitted artifacts per TypeScript source extension.
///
/// Declaration files and `.json` sources emit nothing.
pub const TS_OUTPUT_EXTENSIONS: &[(&str, &[&str])] = &[
    (".tsx", &[".jsx", ".d.ts", ".jsx.map", ".d.ts.map"]),
    (".ts", &[".js", ".d.ts", ".js.map", ".d.ts.map"]),
    (".mts", &[".mjs", ".d.mts", ".mjs.map", ".d.mts.map"]),
    (".cts", &[".cjs", ".d.cts", ".cjs.map", ".d.cts.map"]),
];

pub const DECLARATION_SUFFIXES: &[&str] = &[".d.ts", ".d.mts", ".d.cts"];

/// Directories a tsconfig excludes when it declares no `exclude`
pub const DEFAULT_TSCONFIG_EXCLUDES: &[&str] =
    &["node_modules", "bower_components", "jspm_packages"];

/// Global the scanner watches for that means "this module's file path"
pub const FILENAME_GLOBAL: &str = "__filename";

/// Global the scanner watches for that means "this module's directory"
pub const DIRNAME_GLOBAL: &str = "__dirname";

/// Runtime globals that need a browser shim: (variable, module, exposed as)
pub const BROWSER_ESSENTIALS: &[(&str, &str, Option<&str>)] = &[
    ("buffer", "buffer", Some("Buffer")),
    ("Buffer", "buffer", Some("Buffer")),
    ("http", "http", None),
    ("process", "process", None),
];

pub fn is_watched_global(name: &str) -> bool {
    name == FILENAME_GLOBAL
        || name == DIRNAME_GLOBAL
        || BROWSER_ESSENTIALS.iter().any(|(variable, _, _)| *variable == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orderings_are_permutations() {
        assert_eq!(TS_EXTENSIONS_FIRST.len(), JS_EXTENSIONS_FIRST.len());
        for ext in TS_EXTENSIONS_FIRST {
            assert!(JS_EXTENSIONS_FIRST.contains(ext), "script-first missing '{}'", ext);
        }
        for index in TS_INDEXES_FIRST {
            assert!(JS_INDEXES_FIRST.contains(index), "script-first missing '{}'", index);
        }
    }

    #[test]
    fn test_typed_first_starts_with_ts() {
        assert_eq!(TS_EXTENSIONS_FIRST[0], ".ts");
        assert_eq!(JS_EXTENSIONS_FIRST[0], ".js");
        assert_eq!(TS_INDEXES_FIRST[0], "index.ts");
        assert_eq!(JS_INDEXES_FIRST[0], "index.js");
    }

    #[test]
    fn test_declaration_suffixes_emit_nothing() {
        for (source_ext, _) in TS_OUTPUT_EXTENSIONS {
            assert!(!DECLARATION_SUFFIXES.contains(source_ext));
        }
    }

    #[test]
    fn test_watched_globals() {
        assert!(is_watched_global("__dirname"));
        assert!(is_watched_global("__filename"));
        assert!(is_watched_global("Buffer"));
        assert!(is_watched_global("process"));
        assert!(!is_watched_global("window"));
        assert!(!is_watched_global("require"));
    }
}
