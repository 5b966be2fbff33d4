//! Specifiers the graph treats as provided by the runtime.
//!
//! Bare `node:` specifiers and the Node.js core modules never resolve to a file;
//! a bundler substitutes a shim for them instead.

pub const NODE_PREFIX: &str = "node:";

/// Node.js core modules
pub const NODE_BUILTINS: &[&str] = &[
    "assert",
    "buffer",
    "child_process",
    "cluster",
    "crypto",
    "dgram",
    "dns",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "querystring",
    "readline",
    "stream",
    "string_decoder",
    "timers",
    "tls",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "worker_threads",
    "zlib",
];

pub fn is_builtin(specifier: &str) -> bool {
    if specifier.starts_with(NODE_PREFIX) {
        return true;
    }
    let name = specifier.split('/').next().unwrap_or(specifier);
    NODE_BUILTINS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_builtin() {
        assert!(is_builtin("fs"));
        assert!(is_builtin("fs/promises"));
        assert!(is_builtin("node:path"));
        assert!(!is_builtin("react"));
        assert!(!is_builtin("./fs"));
        assert!(!is_builtin("fsevents"));
    }
}
