//! Boundary lint for the ledger backend.
//!
//! Every Rust file under `backend/src/{domain,inbound,outbound}` is parsed
//! with `syn`, and each path it names is checked against [`RULES`]. A rule
//! covers a set of source directories, may exempt specific files, and lists
//! the paths that code in its scope must not reach for.
//!
//! Test code is not linted: items gated on `#[cfg(test)]` are skipped, as are
//! files named `tests.rs`.
//!
//! Run it with `cargo run -p architecture-lint`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

/// Name under which integration code refers to the backend library.
const LIBRARY_CRATE: &str = "ledger_backend";

/// Top-level source directories the lint walks.
const LINTED_ROOTS: [&str; 3] = ["domain", "inbound", "outbound"];

/// A path shape a rule forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forbidden {
    /// A module of the backend itself, named from the crate root.
    Internal(&'static [&'static str]),
    /// Any path starting with these segments outside the backend crate.
    External(&'static [&'static str]),
}

impl Forbidden {
    fn matches(self, path: &NamedPath) -> bool {
        match (self, path) {
            (Self::Internal(prefix), NamedPath::Internal(segments))
            | (Self::External(prefix), NamedPath::External(segments)) => {
                segments.len() >= prefix.len()
                    && prefix.iter().zip(segments).all(|(want, got)| *want == got.as_str())
            }
            _ => false,
        }
    }
}

impl fmt::Display for Forbidden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(prefix) => write!(f, "crate::{}", prefix.join("::")),
            Self::External(prefix) => f.write_str(&prefix.join("::")),
        }
    }
}

/// One boundary the backend keeps.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Short identifier printed with each violation.
    pub name: &'static str,
    /// Source directories, relative to `backend/src`, the rule applies to.
    pub scope: &'static [&'static str],
    /// Files, relative to `backend/src`, allowed to break the rule.
    pub exempt: &'static [&'static str],
    /// Paths code in scope must not name.
    pub forbidden: &'static [Forbidden],
}

impl Rule {
    fn covers(&self, file: &Path) -> bool {
        self.scope.iter().any(|dir| file.starts_with(dir))
            && !self.exempt.iter().any(|exempt| file == Path::new(exempt))
    }
}

const HTTP_CRATES: [Forbidden; 4] = [
    Forbidden::External(&["actix_web"]),
    Forbidden::External(&["actix_http"]),
    Forbidden::External(&["utoipa"]),
    Forbidden::External(&["utoipa_swagger_ui"]),
];

const REDIS_CRATES: [Forbidden; 3] = [
    Forbidden::External(&["bb8"]),
    Forbidden::External(&["bb8_redis"]),
    Forbidden::External(&["redis"]),
];

/// The rules the backend is held to.
pub const RULES: &[Rule] = &[
    Rule {
        name: "domain-without-adapters",
        scope: &["domain"],
        exempt: &[],
        forbidden: &[
            Forbidden::Internal(&["inbound"]),
            Forbidden::Internal(&["outbound"]),
            HTTP_CRATES[0],
            HTTP_CRATES[1],
            HTTP_CRATES[2],
            HTTP_CRATES[3],
            REDIS_CRATES[0],
            REDIS_CRATES[1],
            REDIS_CRATES[2],
        ],
    },
    Rule {
        name: "inbound-through-ports",
        scope: &["inbound"],
        exempt: &[],
        forbidden: &[
            Forbidden::Internal(&["outbound"]),
            Forbidden::Internal(&["domain", "store"]),
            Forbidden::Internal(&["domain", "ports", "ItemStore"]),
            REDIS_CRATES[0],
            REDIS_CRATES[1],
            REDIS_CRATES[2],
        ],
    },
    Rule {
        name: "outbound-without-transport",
        scope: &["outbound"],
        exempt: &[],
        forbidden: &[
            Forbidden::Internal(&["inbound"]),
            Forbidden::Internal(&["domain", "store"]),
            HTTP_CRATES[0],
            HTTP_CRATES[1],
            HTTP_CRATES[2],
            HTTP_CRATES[3],
        ],
    },
    // Randomness and time are injected through `CostSampler`, `WorkSleeper`,
    // `CredentialEntropy` and `mockable::Clock`; only their production
    // implementations touch the real sources.
    Rule {
        name: "effects-behind-ports",
        scope: &["domain", "inbound", "outbound"],
        exempt: &["domain/metered_call.rs", "domain/credentials.rs"],
        forbidden: &[
            Forbidden::External(&["rand"]),
            Forbidden::External(&["tokio", "time"]),
            Forbidden::External(&["Utc", "now"]),
            Forbidden::External(&["chrono", "Utc", "now"]),
            Forbidden::External(&["SystemTime"]),
            Forbidden::External(&["std", "time", "SystemTime"]),
            Forbidden::External(&["Instant"]),
            Forbidden::External(&["std", "time", "Instant"]),
        ],
    },
    // Payload encoding belongs to the dispatcher; the domain only carries
    // free-form error details.
    Rule {
        name: "json-at-the-edge",
        scope: &["domain"],
        exempt: &["domain/error.rs"],
        forbidden: &[Forbidden::External(&["serde_json"])],
    },
];

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Violation {
    /// File path relative to `backend/src`.
    pub file: PathBuf,
    /// Name of the broken rule.
    pub rule: &'static str,
    /// The forbidden path as written in the source.
    pub path: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] must not name `{}`",
            self.file.display(),
            self.rule,
            self.path
        )
    }
}

/// Failures reported by the lint.
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    /// A directory or file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A file is not valid Rust.
    #[error("failed to parse {}: {message}", .file.display())]
    Parse {
        /// File relative to `backend/src`.
        file: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
    /// One or more rules were broken.
    #[error("{}", render_violations(.0))]
    Violations(Vec<Violation>),
}

fn render_violations(violations: &[Violation]) -> String {
    let mut rendered = format!("{} boundary violation(s):", violations.len());
    for violation in violations {
        rendered.push_str("\n- ");
        rendered.push_str(&violation.to_string());
    }
    rendered
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `backend/src`.
    pub file: PathBuf,
    /// File contents.
    pub contents: String,
}

/// Lint the backend crate sources on disk.
///
/// `backend_dir` is the directory holding the backend's `Cargo.toml`.
pub fn lint_backend_sources(backend_dir: &Path) -> Result<(), LintError> {
    let src_dir = backend_dir.join("src");
    let mut sources = Vec::new();
    for root in LINTED_ROOTS {
        let dir = src_dir.join(root);
        if dir.is_dir() {
            collect_sources(&src_dir, &dir, &mut sources)?;
        }
    }
    lint_sources(&sources)
}

/// Lint in-memory sources against [`RULES`].
pub fn lint_sources(sources: &[LintSource]) -> Result<(), LintError> {
    let mut violations = BTreeSet::new();
    for source in sources {
        if is_test_file(&source.file) {
            continue;
        }
        let rules: Vec<&Rule> = RULES.iter().filter(|rule| rule.covers(&source.file)).collect();
        if rules.is_empty() {
            continue;
        }
        let parsed = syn::parse_file(&source.contents).map_err(|err| LintError::Parse {
            file: source.file.clone(),
            message: err.to_string(),
        })?;
        let mut collector = PathCollector::default();
        collector.visit_file(&parsed);

        for (segments, named) in &collector.paths {
            for rule in &rules {
                if rule.forbidden.iter().any(|forbidden| forbidden.matches(named)) {
                    violations.insert(Violation {
                        file: source.file.clone(),
                        rule: rule.name,
                        path: segments.join("::"),
                    });
                }
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(LintError::Violations(violations.into_iter().collect()))
    }
}

fn is_test_file(file: &Path) -> bool {
    file.file_name().is_some_and(|name| name == "tests.rs")
}

/// A path resolved against the crate it points into.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum NamedPath {
    /// Segments after the crate root, for example `["domain", "store"]`.
    Internal(Vec<String>),
    /// Segments as written, for example `["tokio", "time", "sleep"]`.
    External(Vec<String>),
}

impl NamedPath {
    fn resolve(segments: &[String]) -> Option<Self> {
        let first = segments.first()?.as_str();
        if LINTED_ROOTS.contains(&first) {
            return Some(Self::Internal(segments.to_vec()));
        }
        if first == LIBRARY_CRATE {
            return segments.get(1..).map(|rest| Self::Internal(rest.to_vec()));
        }
        if is_relative(first) {
            // `super::super::outbound` still lands on a crate-root module.
            let rest: Vec<String> = segments
                .iter()
                .skip_while(|segment| is_relative(segment))
                .cloned()
                .collect();
            return Some(Self::Internal(rest));
        }
        Some(Self::External(segments.to_vec()))
    }
}

fn is_relative(segment: &str) -> bool {
    matches!(segment, "crate" | "self" | "super")
}

fn is_cfg_test(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .parse_args::<syn::Ident>()
                .is_ok_and(|ident| ident == "test")
    })
}

#[derive(Default)]
struct PathCollector {
    paths: BTreeSet<(Vec<String>, NamedPath)>,
}

impl PathCollector {
    fn record(&mut self, segments: Vec<String>) {
        if let Some(named) = NamedPath::resolve(&segments) {
            self.paths.insert((segments, named));
        }
    }

    fn record_use_tree(&mut self, tree: &syn::UseTree, mut prefix: Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.record_use_tree(&path.tree, prefix);
            }
            syn::UseTree::Name(name) => {
                prefix.push(name.ident.to_string());
                self.record(prefix);
            }
            syn::UseTree::Rename(rename) => {
                prefix.push(rename.ident.to_string());
                self.record(prefix);
            }
            syn::UseTree::Glob(_) => self.record(prefix),
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.record_use_tree(item, prefix.clone());
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for PathCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        self.record(
            node.segments
                .iter()
                .map(|segment| segment.ident.to_string())
                .collect(),
        );
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        if !is_cfg_test(&node.attrs) {
            self.record_use_tree(&node.tree, Vec::new());
        }
    }

    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        if !is_cfg_test(&node.attrs) {
            syn::visit::visit_item_mod(self, node);
        }
    }

    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        if !is_cfg_test(&node.attrs) {
            syn::visit::visit_item_fn(self, node);
        }
    }
}

fn collect_sources(
    src_root: &Path,
    dir: &Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), LintError> {
    let read_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| LintError::Read { path, source }
    };
    let mut entries = fs::read_dir(dir)
        .map_err(read_error(dir))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error(dir))?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_sources(src_root, &path, sources)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            let contents = fs::read_to_string(&path).map_err(read_error(&path))?;
            let file = path.strip_prefix(src_root).unwrap_or(&path).to_path_buf();
            sources.push(LintSource { file, contents });
        }
    }
    Ok(())
}
