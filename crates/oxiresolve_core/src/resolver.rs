use dashmap::DashMap;
use log::{debug, trace};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::constants::{SCRIPT_EXTENSIONS, VENDOR_DIR};
use crate::error::Result;
use crate::lookup::lookup;
use crate::package::is_vendored;
use crate::remap::RemapTable;
use crate::tsconfig::{PathAlias, TsConfig};
use crate::types::{ExtensionOrder, ResolutionRequest, ResolutionResult};

/// Memo of `(importer, specifier)` to the file it resolved to, if any.
pub type ResolveCache = DashMap<(PathBuf, String), Option<ResolutionResult>>;

/// Everything a resolution needs beyond the importer and the specifier.
#[derive(Debug, Clone, Default)]
pub struct ResolverContext {
    pub root: PathBuf,
    /// Sorted so that exact patterns come first, then the longest prefix
    pub aliases: Vec<PathAlias>,
    pub base_url: Option<PathBuf>,
    pub remap: Arc<RemapTable>,
    pub order: ExtensionOrder,
    pub browser: bool,
    /// Extra `node_modules` directories searched after the importer's ancestors
    pub module_roots: Vec<PathBuf>,
}

impl ResolverContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ..Default::default() }
    }

    pub fn from_tsconfig(root: impl Into<PathBuf>, tsconfig: &TsConfig) -> Self {
        let mut ctx = Self::new(root);
        ctx.base_url = tsconfig.base_url();
        ctx.set_aliases(tsconfig.path_aliases());
        ctx
    }

    pub fn set_aliases(&mut self, mut aliases: Vec<PathAlias>) {
        aliases.sort_by_key(|alias| {
            let wildcard = alias.pattern.contains('*');
            let prefix = alias.pattern.split('*').next().map_or(0, str::len);
            (wildcard, std::cmp::Reverse(prefix))
        });
        self.aliases = aliases;
    }

    pub fn with_remap(mut self, remap: Arc<RemapTable>) -> Self {
        self.remap = remap;
        self
    }

    fn request<'a>(
        &'a self,
        specifier: &'a str,
        dir: &'a Path,
        order: ExtensionOrder,
    ) -> ResolutionRequest<'a> {
        ResolutionRequest::from_dir(specifier, dir)
            .with_order(order)
            .with_remap(&self.remap)
            .with_browser(self.browser)
    }
}

/// Plain scripts and vendored files resolve their own imports script-first.
pub fn order_for(importer: &Path, default: ExtensionOrder) -> ExtensionOrder {
    let is_script = importer
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext));
    if is_script || is_vendored(importer) { ExtensionOrder::ScriptFirst } else { default }
}

fn is_path_like(request: &str) -> bool {
    request.starts_with("./")
        || request.starts_with("../")
        || request.starts_with('/')
        || request == "."
        || request == ".."
}

/// `@scope/name/sub` → `@scope/name`, `name/sub` → `name`.
fn package_name(request: &str) -> &str {
    let mut slashes = request.match_indices('/').map(|(i, _)| i);
    let end = if request.starts_with('@') {
        slashes.nth(1)
    } else {
        slashes.next()
    };
    end.map_or(request, |i| &request[..i])
}

/// The text matched by `*` in `pattern`, or `""` for an exact pattern match.
fn match_alias<'r>(pattern: &str, request: &'r str) -> Option<&'r str> {
    match pattern.split_once('*') {
        None => (pattern == request).then_some(""),
        Some((prefix, suffix)) => {
            if request.len() >= prefix.len() + suffix.len()
                && request.starts_with(prefix)
                && request.ends_with(suffix)
            {
                Some(&request[prefix.len()..request.len() - suffix.len()])
            } else {
                None
            }
        }
    }
}

pub fn resolve(
    ctx: &ResolverContext,
    from_file: &Path,
    request: &str,
    cache: &ResolveCache,
) -> Result<Option<ResolutionResult>> {
    let key = (from_file.to_path_buf(), request.to_string());
    if let Some(v) = cache.get(&key) {
        trace!("Cache hit for resolve: '{}' from {}", request, from_file.display());
        return Ok(v.clone());
    }
    trace!("Resolving: '{}' from {}", request, from_file.display());

    let order = order_for(from_file, ctx.order);
    let base = from_file.parent().unwrap_or(&ctx.root);

    let resolved = if is_path_like(request) {
        trace!("Resolving as relative import: '{}'", request);
        existing(lookup(&ctx.request(request, base, order))?)
    } else {
        match resolve_alias(ctx, request, order)? {
            Some(found) => Some(found),
            None => match resolve_base_url(ctx, request, order)? {
                Some(found) => Some(found),
                None => resolve_node_module(ctx, base, request)?,
            },
        }
    };

    cache.insert(key, resolved.clone());
    match &resolved {
        Some(r) => debug!(
            "Resolved '{}' from {} to {}",
            request,
            from_file.display(),
            r.absolute_path.display()
        ),
        None => debug!("Unresolved '{}' from {}", request, from_file.display()),
    }
    Ok(resolved)
}

fn existing(result: ResolutionResult) -> Option<ResolutionResult> {
    result.exists.then_some(result)
}

fn resolve_alias(
    ctx: &ResolverContext,
    request: &str,
    order: ExtensionOrder,
) -> Result<Option<ResolutionResult>> {
    for alias in &ctx.aliases {
        let Some(capture) = match_alias(&alias.pattern, request) else {
            continue;
        };
        trace!("Matched alias '{}' for request '{}'", alias.pattern, request);
        for target in &alias.targets {
            let candidate = target.replacen('*', capture, 1);
            if let Some(found) = existing(lookup(&ctx.request(&candidate, &ctx.root, order))?) {
                return Ok(Some(found));
            }
        }
    }
    Ok(None)
}

fn resolve_base_url(
    ctx: &ResolverContext,
    request: &str,
    order: ExtensionOrder,
) -> Result<Option<ResolutionResult>> {
    let Some(base_url) = &ctx.base_url else {
        return Ok(None);
    };
    trace!("Trying baseUrl {} for '{}'", base_url.display(), request);
    Ok(existing(lookup(&ctx.request(request, base_url, order))?))
}

fn resolve_node_module(
    ctx: &ResolverContext,
    start_dir: &Path,
    request: &str,
) -> Result<Option<ResolutionResult>> {
    trace!("Walking up from {:?} to find node_modules for '{}'", start_dir, request);
    let package = package_name(request);

    let mut candidates = Vec::new();
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        candidates.push(dir.join(VENDOR_DIR));
        // stop at workspace root
        if dir == ctx.root.as_path() {
            break;
        }
        current = dir.parent();
    }
    candidates.extend(ctx.module_roots.iter().cloned());

    for modules in candidates {
        if !modules.join(package).exists() {
            continue;
        }
        trace!("Checking node_modules at: {:?}", modules);
        let vendored = ctx.request(request, &modules, ExtensionOrder::ScriptFirst);
        if let Some(found) = existing(lookup(&vendored)?) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
