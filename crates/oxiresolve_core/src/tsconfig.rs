use log::{debug, trace};
use path_clean::clean;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
};

use crate::constants::{TSCONFIG_FILE, VENDOR_DIR};
use crate::error::{Error, Result};
use crate::types::ProjectConfigRef;

/// compilerOptions whose values are paths relative to the declaring config
const PATH_OPTIONS: &[&str] = &["baseUrl", "rootDir", "outDir", "declarationDir"];

pub fn find_git_root() -> std::io::Result<PathBuf> {
    debug!("Searching for git root");
    let mut current_dir = env::current_dir()?;
    trace!("Starting search from: {:?}", current_dir);

    loop {
        let git_dir = current_dir.join(".git");
        trace!("Checking for .git at: {:?}", git_dir);
        if git_dir.exists() {
            debug!("Found git root at: {:?}", current_dir);
            return Ok(current_dir);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                debug!("Could not find .git directory in any parent folder");
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Could not find .git directory in any parent folder",
                ));
            }
        }
    }
}

/// Reads a JSON-with-comments document. An empty document reads as `{}`.
pub fn read_jsonc(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_jsonc(path, &text)
}

pub(crate) fn parse_jsonc(path: &Path, text: &str) -> Result<Value> {
    match jsonc_parser::parse_to_serde_value(text, &Default::default()) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Ok(Value::Object(Map::new())),
        Err(e) => Err(Error::Parse { path: path.to_path_buf(), message: e.to_string() }),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TsReference {
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTsConfig {
    #[serde(default)]
    extends: Option<Extends>,
    #[serde(default)]
    compiler_options: Map<String, Value>,
    #[serde(default)]
    files: Option<Vec<String>>,
    #[serde(default)]
    include: Option<Vec<String>>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
    #[serde(default)]
    references: Vec<TsReference>,
}

/// A `paths` entry: `pattern` may hold one `*`, targets are absolute patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAlias {
    pub pattern: String,
    pub targets: Vec<String>,
}

/// A loaded tsconfig with its `extends` chain already merged.
///
/// Path-valued compiler options are absolute after loading, so values inherited
/// from a base config stay relative to the file that declared them.
#[derive(Debug, Clone, Default)]
pub struct TsConfig {
    pub path: PathBuf,
    pub compiler_options: Map<String, Value>,
    pub files: Option<Vec<String>>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub references: Vec<TsReference>,
}

impl TsConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let mut seen = HashSet::new();
        load_with_extends(&clean(path), &mut seen)
    }

    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }

    fn path_option(&self, key: &str) -> Option<PathBuf> {
        self.compiler_options.get(key).and_then(Value::as_str).map(PathBuf::from)
    }

    pub fn base_url(&self) -> Option<PathBuf> {
        self.path_option("baseUrl")
    }

    /// `rootDir`, defaulting to the config's own directory.
    pub fn root_dir(&self) -> PathBuf {
        self.path_option("rootDir").unwrap_or_else(|| self.dir().to_path_buf())
    }

    /// `outDir`; emitted files sit next to their sources when unset.
    pub fn out_dir(&self) -> Option<PathBuf> {
        self.path_option("outDir")
    }

    pub fn allow_js(&self) -> bool {
        self.compiler_options.get("allowJs").and_then(Value::as_bool).unwrap_or(false)
    }

    /// `references[].path`, made absolute against the config directory.
    pub fn reference_paths(&self) -> Vec<PathBuf> {
        self.references
            .iter()
            .filter(|r| !r.path.is_empty())
            .map(|r| clean(self.dir().join(&r.path)))
            .collect()
    }

    /// `compilerOptions.paths`, with targets anchored at `baseUrl` (or the config dir).
    pub fn path_aliases(&self) -> Vec<PathAlias> {
        let Some(paths) = self.compiler_options.get("paths").and_then(Value::as_object) else {
            return Vec::new();
        };
        let base = self.base_url().unwrap_or_else(|| self.dir().to_path_buf());

        let mut aliases = Vec::new();
        for (pattern, targets) in paths {
            let Some(target_arr) = targets.as_array() else {
                continue;
            };
            let targets: Vec<String> = target_arr
                .iter()
                .filter_map(Value::as_str)
                .map(|t| base.join(t).to_string_lossy().to_string())
                .collect();
            if !targets.is_empty() {
                trace!("Found tsconfig path alias: '{}' -> {:?}", pattern, targets);
                aliases.push(PathAlias { pattern: pattern.clone(), targets });
            }
        }
        debug!("Loaded {} tsconfig path aliases from {}", aliases.len(), self.path.display());
        aliases
    }

    pub fn as_project_config_ref(&self) -> ProjectConfigRef {
        ProjectConfigRef {
            directory: self.dir().to_path_buf(),
            compiler_options: self.compiler_options.clone(),
            config_file_path: self.path.clone(),
        }
    }
}

fn load_with_extends(path: &Path, seen: &mut HashSet<PathBuf>) -> Result<TsConfig> {
    trace!("Loading tsconfig at: {:?}", path);
    if !seen.insert(path.to_path_buf()) {
        return Err(Error::Parse {
            path: path.to_path_buf(),
            message: "circular \"extends\" chain".to_string(),
        });
    }

    let value = read_jsonc(path)?;
    let raw: RawTsConfig = serde_json::from_value(value)
        .map_err(|e| Error::Json { path: path.to_path_buf(), source: e })?;
    let dir = path.parent().unwrap_or(path);

    let mut options = raw.compiler_options;
    absolutize_path_options(&mut options, dir);

    let mut config = TsConfig {
        path: path.to_path_buf(),
        compiler_options: Map::new(),
        files: None,
        include: None,
        exclude: None,
        references: raw.references,
    };

    let bases = match raw.extends {
        Some(Extends::One(base)) => vec![base],
        Some(Extends::Many(bases)) => bases,
        None => Vec::new(),
    };
    for base in bases {
        let base_path = resolve_extends(dir, &base);
        debug!("{} extends {}", path.display(), base_path.display());
        let base_config = load_with_extends(&base_path, seen)?;
        config.compiler_options.extend(base_config.compiler_options);
        config.files = base_config.files.or(config.files);
        config.include = base_config.include.or(config.include);
        config.exclude = base_config.exclude.or(config.exclude);
    }

    config.compiler_options.extend(options);
    config.files = raw.files.map(|f| rebase(&f, dir)).or(config.files);
    config.include = raw.include.map(|f| rebase(&f, dir)).or(config.include);
    config.exclude = raw.exclude.map(|f| rebase(&f, dir)).or(config.exclude);

    // only the current chain counts; two siblings may share a base
    seen.remove(path);
    Ok(config)
}

fn absolutize_path_options(options: &mut Map<String, Value>, dir: &Path) {
    for key in PATH_OPTIONS {
        if let Some(Value::String(s)) = options.get_mut(*key) {
            *s = clean(dir.join(&*s)).to_string_lossy().to_string();
        }
    }
}

/// File lists are stored absolute so inherited lists keep their meaning.
fn rebase(entries: &[String], dir: &Path) -> Vec<String> {
    entries.iter().map(|e| clean(dir.join(e)).to_string_lossy().to_string()).collect()
}

/// Relative `extends` join the config dir; bare ones are looked up in `node_modules`.
fn resolve_extends(dir: &Path, base: &str) -> PathBuf {
    let with_json = |p: PathBuf| {
        if p.extension().is_some() { p } else { p.with_extension("json") }
    };

    if base.starts_with('.') || Path::new(base).is_absolute() {
        return with_json(clean(dir.join(base)));
    }

    let mut current = Some(dir);
    while let Some(d) = current {
        let candidate = d.join(VENDOR_DIR).join(base);
        if candidate.is_dir() {
            return candidate.join(TSCONFIG_FILE);
        }
        let candidate = with_json(candidate);
        if candidate.is_file() {
            return candidate;
        }
        current = d.parent();
    }
    with_json(dir.join(VENDOR_DIR).join(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    #[test]
    fn test_find_git_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join(".git")).unwrap();
        let subdir = root.join("src").join("components");
        fs::create_dir_all(&subdir).unwrap();

        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(&subdir).unwrap();

        let git_root = find_git_root();

        env::set_current_dir(original_dir).unwrap();
        // Normalize paths for comparison (canonicalize can add /private prefix on macOS)
        assert_eq!(git_root.unwrap().canonicalize().unwrap(), root.canonicalize().unwrap());
    }

    #[test]
    fn test_read_jsonc_with_comments_and_trailing_commas() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(
            temp_dir.path(),
            "tsconfig.json",
            r#"{
  // line comment
  "compilerOptions": {
    "baseUrl": "./src", /* block */
    "paths": { "@app/*": ["app/*"], },
  },
}"#,
        );
        let value = read_jsonc(&path).unwrap();
        assert_eq!(value["compilerOptions"]["baseUrl"], "./src");
    }

    #[test]
    fn test_read_jsonc_keeps_urls_in_strings() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(
            temp_dir.path(),
            "tsconfig.json",
            r#"{ "$schema": "https://json.schemastore.org/tsconfig" }"#,
        );
        let value = read_jsonc(&path).unwrap();
        assert_eq!(value["$schema"], "https://json.schemastore.org/tsconfig");
    }

    #[test]
    fn test_read_jsonc_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(temp_dir.path(), "tsconfig.json", "{ \"a\": ");
        assert!(matches!(read_jsonc(&path), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_path_options_are_absolute() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let path = create_test_file(
            root,
            "tsconfig.json",
            r#"{ "compilerOptions": { "rootDir": "src", "outDir": "./dist", "allowJs": true } }"#,
        );
        let config = TsConfig::load(&path).unwrap();
        assert_eq!(config.root_dir(), root.join("src"));
        assert_eq!(config.out_dir(), Some(root.join("dist")));
        assert!(config.allow_js());
    }

    #[test]
    fn test_root_dir_defaults_to_config_dir() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let path = create_test_file(root, "tsconfig.json", "{}");
        let config = TsConfig::load(&path).unwrap();
        assert_eq!(config.root_dir(), root.to_path_buf());
        assert_eq!(config.out_dir(), None);
    }

    #[test]
    fn test_extends_merges_compiler_options() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "configs/base.json",
            r#"{ "compilerOptions": { "baseUrl": "..", "strict": true, "jsx": "preserve" } }"#,
        );
        let path = create_test_file(
            root,
            "app/tsconfig.json",
            r#"{ "extends": "../configs/base", "compilerOptions": { "jsx": "react" } }"#,
        );

        let config = TsConfig::load(&path).unwrap();
        // baseUrl stays relative to the base config that declared it
        assert_eq!(config.base_url(), Some(root.to_path_buf()));
        assert_eq!(config.compiler_options["strict"], Value::Bool(true));
        assert_eq!(config.compiler_options["jsx"], "react");
    }

    #[test]
    fn test_extends_from_node_modules() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "node_modules/@tsconfig/strictest/tsconfig.json",
            r#"{ "compilerOptions": { "strict": true } }"#,
        );
        let path = create_test_file(
            root,
            "packages/a/tsconfig.json",
            r#"{ "extends": "@tsconfig/strictest" }"#,
        );
        let config = TsConfig::load(&path).unwrap();
        assert_eq!(config.compiler_options["strict"], Value::Bool(true));
    }

    #[test]
    fn test_circular_extends_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "a.json", r#"{ "extends": "./b.json" }"#);
        create_test_file(root, "b.json", r#"{ "extends": "./a.json" }"#);
        assert!(TsConfig::load(&root.join("a.json")).is_err());
    }

    #[test]
    fn test_path_aliases_with_base_url() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let path = create_test_file(
            root,
            "tsconfig.json",
            r#"{
  "compilerOptions": {
    "baseUrl": "src",
    "paths": {
      "@components/*": ["components/*"],
      "@utils": ["utils/index.ts"]
    }
  }
}"#,
        );
        let config = TsConfig::load(&path).unwrap();
        let aliases = config.path_aliases();
        assert_eq!(aliases.len(), 2);

        let components = aliases.iter().find(|a| a.pattern == "@components/*").unwrap();
        assert_eq!(
            components.targets,
            vec![root.join("src").join("components/*").to_string_lossy().to_string()]
        );
    }

    #[test]
    fn test_path_aliases_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(
            temp_dir.path(),
            "tsconfig.json",
            r#"{ "compilerOptions": { "target": "ES2020" } }"#,
        );
        let config = TsConfig::load(&path).unwrap();
        assert!(config.path_aliases().is_empty());
    }

    #[test]
    fn test_reference_paths_are_absolute() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let path = create_test_file(
            root,
            "tsconfig.json",
            r#"{ "references": [{ "path": "./packages/core" }, { "path": "" }] }"#,
        );
        let config = TsConfig::load(&path).unwrap();
        assert_eq!(config.reference_paths(), vec![root.join("packages/core")]);
    }

    #[test]
    fn test_include_is_rebased() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let path =
            create_test_file(root, "lib/tsconfig.json", r#"{ "include": ["src"], "files": ["x.ts"] }"#);
        let config = TsConfig::load(&path).unwrap();
        assert_eq!(
            config.include,
            Some(vec![root.join("lib/src").to_string_lossy().to_string()])
        );
        assert_eq!(config.files, Some(vec![root.join("lib/x.ts").to_string_lossy().to_string()]));
    }
}
