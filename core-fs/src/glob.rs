//! Glob expansion on top of the walk engine.
//!
//! A glob is made absolute, split into its literal base directory and the
//! remaining pattern, and the base is walked with the pattern as the only
//! match filter. Globs without wildcards become a single `lstat`.

use std::path::{Component, Path, PathBuf};

use bridge_traits::WalkEntry;
use futures::stream::{self, BoxStream, StreamExt};

use crate::dispatch::Fs;
use crate::error::{invalid_input, Result};
use crate::walk::{Pattern, WalkOptions};

#[derive(Debug, Clone)]
pub struct ExpandGlobOptions {
    /// Directory relative globs resolve against. Defaults to the current
    /// working directory.
    pub root: Option<PathBuf>,
    /// Globs, relative to `root`, whose matches are pruned with their
    /// descendants.
    pub exclude: Vec<String>,
    pub include_dirs: bool,
    pub follow_symlinks: bool,
    pub canonicalize: bool,
    pub case_insensitive: bool,
}

impl Default for ExpandGlobOptions {
    fn default() -> Self {
        Self {
            root: None,
            exclude: Vec::new(),
            include_dirs: true,
            follow_symlinks: false,
            canonicalize: true,
            case_insensitive: false,
        }
    }
}

impl ExpandGlobOptions {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_exclude(mut self, glob: impl Into<String>) -> Self {
        self.exclude.push(glob.into());
        self
    }

    pub fn with_include_dirs(mut self, include: bool) -> Self {
        self.include_dirs = include;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn with_canonicalize(mut self, canonicalize: bool) -> Self {
        self.canonicalize = canonicalize;
        self
    }

    pub fn with_case_insensitive(mut self, insensitive: bool) -> Self {
        self.case_insensitive = insensitive;
        self
    }
}

enum Plan {
    /// No wildcard: the path either exists or it doesn't.
    Literal(PathBuf),
    Walk { base: PathBuf, options: WalkOptions },
}

fn has_magic(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

fn compile(source: &str, case_insensitive: bool) -> Result<Pattern> {
    let compiled = if case_insensitive {
        Pattern::glob_case_insensitive(source)
    } else {
        Pattern::glob(source)
    };
    compiled.map_err(|e| invalid_input(format!("Invalid glob '{source}': {e}")))
}

fn plan(glob: &str, root: &Path, options: &ExpandGlobOptions) -> Result<Plan> {
    let absolute = root.join(glob);

    let mut base = PathBuf::new();
    let mut rest = Vec::new();
    for component in absolute.components() {
        let text = component.as_os_str().to_string_lossy();
        if rest.is_empty() && !has_magic(&text) {
            base.push(component);
        } else {
            rest.push(text.into_owned());
        }
    }

    if rest.is_empty() {
        return Ok(Plan::Literal(absolute));
    }

    let max_depth = if rest.iter().any(|c| c.contains("**")) {
        None
    } else {
        Some(rest.len())
    };

    let matcher = compile(&absolute.to_string_lossy(), options.case_insensitive)?;
    let mut skip = Vec::with_capacity(options.exclude.len());
    for exclude in &options.exclude {
        let excluded = root.join(exclude);
        skip.push(compile(&excluded.to_string_lossy(), options.case_insensitive)?);
    }

    let walk = WalkOptions {
        max_depth,
        include_dirs: options.include_dirs,
        follow_symlinks: options.follow_symlinks,
        canonicalize: options.canonicalize,
        match_patterns: vec![matcher],
        skip,
        ..WalkOptions::default()
    };
    Ok(Plan::Walk {
        base: normalize_base(base),
        options: walk,
    })
}

/// A relative root whose first component is already a wildcard leaves no
/// literal prefix; walk from the current directory then.
fn normalize_base(base: PathBuf) -> PathBuf {
    if base.as_os_str().is_empty() {
        PathBuf::from(Component::CurDir.as_os_str())
    } else {
        base
    }
}

type GlobIter<'a> = Box<dyn Iterator<Item = Result<WalkEntry>> + 'a>;

impl Fs {
    /// Expands `glob` into the matching entries with the blocking
    /// operations. A base directory that doesn't exist yields nothing.
    pub fn expand_glob_sync(&self, glob: &str, options: &ExpandGlobOptions) -> GlobIter<'_> {
        let root = match options.root.clone().map_or_else(|| self.cwd(), Ok) {
            Ok(root) => root,
            Err(err) => return Box::new(std::iter::once(Err(err))),
        };
        match plan(glob, &root, options) {
            Err(err) => Box::new(std::iter::once(Err(err))),
            Ok(Plan::Literal(path)) => match self.lstat_sync(&path) {
                Ok(info) if info.is_directory && !options.include_dirs => {
                    Box::new(std::iter::empty())
                }
                Ok(info) => Box::new(std::iter::once(Ok(WalkEntry::from_info(path, &info)))),
                Err(err) if err.is_not_found() => Box::new(std::iter::empty()),
                Err(err) => Box::new(std::iter::once(Err(err))),
            },
            Ok(Plan::Walk { base, options }) => match self.stat_sync(&base) {
                Err(err) if err.is_not_found() => Box::new(std::iter::empty()),
                _ => Box::new(self.walk_sync(base, options)),
            },
        }
    }

    /// Async form of [`expand_glob_sync`](Self::expand_glob_sync).
    pub fn expand_glob(
        &self,
        glob: &str,
        options: &ExpandGlobOptions,
    ) -> BoxStream<'_, Result<WalkEntry>> {
        let glob = glob.to_string();
        let options = options.clone();
        let planned = async move {
            let root = match options.root.clone().map_or_else(|| self.cwd(), Ok) {
                Ok(root) => root,
                Err(err) => return stream::iter([Err(err)]).boxed(),
            };
            match plan(&glob, &root, &options) {
                Err(err) => stream::iter([Err(err)]).boxed(),
                Ok(Plan::Literal(path)) => match self.lstat(&path).await {
                    Ok(info) if info.is_directory && !options.include_dirs => {
                        stream::empty().boxed()
                    }
                    Ok(info) => stream::iter([Ok(WalkEntry::from_info(path, &info))]).boxed(),
                    Err(err) if err.is_not_found() => stream::empty().boxed(),
                    Err(err) => stream::iter([Err(err)]).boxed(),
                },
                Ok(Plan::Walk { base, options }) => match self.stat(&base).await {
                    Err(err) if err.is_not_found() => stream::empty().boxed(),
                    _ => self.walk(base, options),
                },
            }
        };
        stream::once(planned).flatten().boxed()
    }
}
