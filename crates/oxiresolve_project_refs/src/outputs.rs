use log::trace;
use oxiresolve_core::{DECLARATION_SUFFIXES, Error, Result, TS_OUTPUT_EXTENSIONS};
use path_clean::clean;
use std::path::{Path, PathBuf};

/// `allowJs` sources are copied to `outDir` under their own extension
const SCRIPT_OUTPUT_EXTENSIONS: &[&str] = &[".js", ".jsx", ".mjs", ".cjs"];

/// Every file the compiler would emit for `input`, placed under `out_dir`.
///
/// Declaration files and sources without a known extension emit nothing.
pub fn output_files(input: &Path, root_dir: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let input = clean(input);
    let root_dir = clean(root_dir);
    let relative = input
        .strip_prefix(&root_dir)
        .map_err(|_| Error::OutsideRootDir { file: input.clone(), root_dir: root_dir.clone() })?;

    let name = relative.to_string_lossy();
    if DECLARATION_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
        return Ok(Vec::new());
    }

    let outputs: Vec<PathBuf> = match split_extension(&name) {
        Some((stem, ext)) => output_extensions(ext)
            .iter()
            .map(|out_ext| clean(out_dir.join(format!("{}{}", stem, out_ext))))
            .collect(),
        None => Vec::new(),
    };
    trace!("{} emits {} files", input.display(), outputs.len());
    Ok(outputs)
}

fn split_extension(name: &str) -> Option<(&str, &str)> {
    let dot = name.rfind('.')?;
    let (stem, ext) = name.split_at(dot);
    (!stem.is_empty() && !stem.ends_with('/')).then_some((stem, ext))
}

fn output_extensions(ext: &str) -> &'static [&'static str] {
    if let Some((_, outputs)) = TS_OUTPUT_EXTENSIONS.iter().find(|(source, _)| *source == ext) {
        return *outputs;
    }
    match SCRIPT_OUTPUT_EXTENSIONS.iter().find(|script| **script == ext) {
        Some(script) => std::slice::from_ref(script),
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(input: &str) -> Vec<PathBuf> {
        output_files(Path::new(input), Path::new("/p/src"), Path::new("/p/dist")).unwrap()
    }

    #[test]
    fn test_ts_outputs() {
        assert_eq!(
            outputs("/p/src/lib/a.ts"),
            vec![
                PathBuf::from("/p/dist/lib/a.js"),
                PathBuf::from("/p/dist/lib/a.d.ts"),
                PathBuf::from("/p/dist/lib/a.js.map"),
                PathBuf::from("/p/dist/lib/a.d.ts.map"),
            ]
        );
    }

    #[test]
    fn test_tsx_outputs() {
        assert_eq!(
            outputs("/p/src/App.tsx"),
            vec![
                PathBuf::from("/p/dist/App.jsx"),
                PathBuf::from("/p/dist/App.d.ts"),
                PathBuf::from("/p/dist/App.jsx.map"),
                PathBuf::from("/p/dist/App.d.ts.map"),
            ]
        );
    }

    #[test]
    fn test_module_flavoured_outputs() {
        assert_eq!(outputs("/p/src/a.mts")[0], PathBuf::from("/p/dist/a.mjs"));
        assert_eq!(outputs("/p/src/a.cts")[1], PathBuf::from("/p/dist/a.d.cts"));
    }

    #[test]
    fn test_no_outputs() {
        assert!(outputs("/p/src/types.d.ts").is_empty());
        assert!(outputs("/p/src/data.json").is_empty());
        assert!(outputs("/p/src/README").is_empty());
    }

    #[test]
    fn test_script_sources_are_copied() {
        assert_eq!(outputs("/p/src/legacy.js"), vec![PathBuf::from("/p/dist/legacy.js")]);
    }

    #[test]
    fn test_outside_root_dir() {
        let err =
            output_files(Path::new("/p/other/a.ts"), Path::new("/p/src"), Path::new("/p/dist"))
                .unwrap_err();
        assert!(matches!(err, Error::OutsideRootDir { .. }));
        assert!(err.is_build_fatal());
    }

    #[test]
    fn test_root_dir_prefix_is_per_component() {
        let err =
            output_files(Path::new("/p/srcx/a.ts"), Path::new("/p/src"), Path::new("/p/dist"));
        assert!(err.is_err());
    }

    #[test]
    fn test_in_place_outputs() {
        let out = output_files(Path::new("/p/a.ts"), Path::new("/p"), Path::new("/p")).unwrap();
        assert_eq!(out[0], PathBuf::from("/p/a.js"));
    }
}
