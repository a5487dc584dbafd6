//! Depth-first directory walk.
//!
//! The traversal is a state machine over an explicit stack of open
//! directories. [`WalkIter`] drives it with the blocking operations and
//! [`Fs::walk`] with the async ones; both make the same decisions, only the
//! I/O differs. Directories are listed lazily, so dropping the iterator or
//! stream stops the walk without further backend calls.

use std::fmt;
use std::path::{Path, PathBuf};

use bridge_traits::{AbortSignal, DirectoryInfo, FileInfo, WalkEntry};
use futures::stream::{self, BoxStream, StreamExt};
use regex::Regex;
use tracing::debug;

use crate::dispatch::Fs;
use crate::error::{FsError, Result};

/// Path filter used by [`WalkOptions::match_patterns`] and
/// [`WalkOptions::skip`].
#[derive(Clone)]
pub enum Pattern {
    Regex(Regex),
    /// Matched with `require_literal_separator`, so `*` stays inside one
    /// path component.
    Glob {
        pattern: glob::Pattern,
        case_sensitive: bool,
    },
}

impl Pattern {
    pub fn regex(source: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(source).map(Pattern::Regex)
    }

    pub fn glob(source: &str) -> std::result::Result<Self, glob::PatternError> {
        glob::Pattern::new(source).map(|pattern| Pattern::Glob {
            pattern,
            case_sensitive: true,
        })
    }

    /// Case-insensitive glob; regexes carry their own `(?i)` flag.
    pub fn glob_case_insensitive(source: &str) -> std::result::Result<Self, glob::PatternError> {
        glob::Pattern::new(source).map(|pattern| Pattern::Glob {
            pattern,
            case_sensitive: false,
        })
    }

    pub fn is_match(&self, path: &str) -> bool {
        match self {
            Pattern::Regex(re) => re.is_match(path),
            Pattern::Glob {
                pattern,
                case_sensitive,
            } => pattern.matches_with(
                path,
                glob::MatchOptions {
                    case_sensitive: *case_sensitive,
                    require_literal_separator: true,
                    require_literal_leading_dot: false,
                },
            ),
        }
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Pattern::Regex(re)
    }
}

impl From<glob::Pattern> for Pattern {
    fn from(pattern: glob::Pattern) -> Self {
        Pattern::Glob {
            pattern,
            case_sensitive: true,
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Pattern::Glob {
                pattern,
                case_sensitive,
            } => f
                .debug_struct("Glob")
                .field("pattern", &pattern.as_str())
                .field("case_sensitive", case_sensitive)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// `None` walks without bound. The root is depth 0.
    pub max_depth: Option<usize>,
    pub include_files: bool,
    pub include_dirs: bool,
    /// Only consulted for links that are not followed.
    pub include_symlinks: bool,
    pub follow_symlinks: bool,
    /// With `follow_symlinks`, report followed links by their real path and
    /// refuse to re-enter a directory already on the stack.
    pub canonicalize: bool,
    /// Suffixes a yielded path must end with. A missing leading `.` is added.
    pub exts: Vec<String>,
    pub match_patterns: Vec<Pattern>,
    pub skip: Vec<Pattern>,
    pub signal: Option<AbortSignal>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            include_files: true,
            include_dirs: true,
            include_symlinks: true,
            follow_symlinks: false,
            canonicalize: true,
            exts: Vec::new(),
            match_patterns: Vec::new(),
            skip: Vec::new(),
            signal: None,
        }
    }
}

impl WalkOptions {
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_include_files(mut self, include: bool) -> Self {
        self.include_files = include;
        self
    }

    pub fn with_include_dirs(mut self, include: bool) -> Self {
        self.include_dirs = include;
        self
    }

    pub fn with_include_symlinks(mut self, include: bool) -> Self {
        self.include_symlinks = include;
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

    pub fn with_exts<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exts = exts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_match(mut self, pattern: impl Into<Pattern>) -> Self {
        self.match_patterns.push(pattern.into());
        self
    }

    pub fn with_skip(mut self, pattern: impl Into<Pattern>) -> Self {
        self.skip.push(pattern.into());
        self
    }

    pub fn with_signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Running,
    Done,
}

struct Frame {
    path: PathBuf,
    /// Canonical location, tracked only when cycles can occur.
    real: Option<PathBuf>,
    depth: usize,
    entries: Option<std::vec::IntoIter<DirectoryInfo>>,
}

/// A directory child waiting to be classified.
struct Child {
    parent: PathBuf,
    parent_real: Option<PathBuf>,
    path: PathBuf,
    depth: usize,
    info: DirectoryInfo,
}

type Step = Option<Result<WalkEntry>>;

struct WalkState {
    root: PathBuf,
    options: WalkOptions,
    phase: Phase,
    stack: Vec<Frame>,
}

impl WalkState {
    fn new(root: PathBuf, mut options: WalkOptions) -> Self {
        options.exts = options
            .exts
            .into_iter()
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self {
            root,
            options,
            phase: Phase::Start,
            stack: Vec::new(),
        }
    }

    fn tracks_real_paths(&self) -> bool {
        self.options.follow_symlinks && self.options.canonicalize
    }

    fn is_skipped(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.options.skip.iter().any(|p| p.is_match(&path))
    }

    fn is_included(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        if !self.options.exts.is_empty()
            && !self.options.exts.iter().any(|ext| text.ends_with(ext.as_str()))
        {
            return false;
        }
        if !self.options.match_patterns.is_empty()
            && !self.options.match_patterns.iter().any(|p| p.is_match(&text))
        {
            return false;
        }
        !self.is_skipped(path)
    }

    fn can_descend(&self, depth: usize) -> bool {
        self.options.max_depth.map_or(true, |max| depth < max)
    }

    /// Aborts the walk if the signal fired.
    fn check_signal(&mut self) -> Step {
        match &self.options.signal {
            Some(signal) if signal.is_aborted() => {
                self.phase = Phase::Done;
                Some(Err(FsError::Aborted))
            }
            _ => None,
        }
    }

    fn fail(&mut self, dir: PathBuf, err: FsError) -> Step {
        debug!(dir = ?dir, error = %err, "Walk stopped");
        self.phase = Phase::Done;
        self.stack.clear();
        Some(Err(FsError::walk(dir, err)))
    }

    /// Handles the root `stat` (and `real_path` when tracked). Root errors
    /// are reported unwrapped.
    fn visit_root(&mut self, stat: Result<FileInfo>, real: Option<Result<PathBuf>>) -> Step {
        self.phase = Phase::Running;
        let resolved = stat.and_then(|info| real.transpose().map(|real| (info, real)));
        let (info, real) = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                self.phase = Phase::Done;
                return Some(Err(err));
            }
        };

        let root = self.root.clone();
        let entry = WalkEntry::from_info(&root, &info);
        if !info.is_directory {
            return self.file_entry(entry);
        }
        let item = self.dir_entry(entry);
        if self.can_descend(0) && !self.is_skipped(&root) {
            self.stack.push(Frame {
                path: root,
                real,
                depth: 0,
                entries: None,
            });
        }
        item
    }

    /// Directory on top of the stack that still has to be listed.
    fn pending_listing(&self) -> Option<PathBuf> {
        self.stack
            .last()
            .filter(|frame| frame.entries.is_none())
            .map(|frame| frame.path.clone())
    }

    fn set_listing(&mut self, dir: PathBuf, listing: Result<Vec<DirectoryInfo>>) -> Step {
        match listing {
            Ok(entries) => {
                if let Some(frame) = self.stack.last_mut() {
                    frame.entries = Some(entries.into_iter());
                }
                None
            }
            Err(err) => self.fail(dir, err),
        }
    }

    /// Next child of the innermost listed directory, popping exhausted
    /// frames. Marks the walk done when the stack empties.
    fn next_child(&mut self) -> Option<Child> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                self.phase = Phase::Done;
                return None;
            };
            match frame.entries.as_mut().and_then(Iterator::next) {
                Some(info) => {
                    return Some(Child {
                        path: join_child(&frame.path, &info.name),
                        parent: frame.path.clone(),
                        parent_real: frame.real.clone(),
                        depth: frame.depth + 1,
                        info,
                    });
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }

    fn should_follow(&self, child: &Child) -> bool {
        child.info.is_symlink && self.options.follow_symlinks
    }

    fn visit_child(&mut self, child: Child) -> Step {
        if self.is_skipped(&child.path) {
            return None;
        }
        let entry = WalkEntry {
            path: child.path.clone(),
            name: child.info.name.clone(),
            is_file: child.info.is_file,
            is_directory: child.info.is_directory,
            is_symlink: child.info.is_symlink,
        };

        if child.info.is_symlink {
            return (self.options.include_symlinks && self.is_included(&entry.path))
                .then_some(Ok(entry));
        }
        if child.info.is_directory {
            let real = child.parent_real.map(|real| real.join(&child.info.name));
            return self.enter_dir(entry, real, child.depth, true);
        }
        self.file_entry(entry)
    }

    /// Classifies a followed link from the `real_path` + `lstat` of its
    /// target.
    fn visit_followed(&mut self, child: Child, resolved: Result<(PathBuf, FileInfo)>) -> Step {
        let (real, info) = match resolved {
            Ok(resolved) => resolved,
            Err(err) => return self.fail(child.parent, err),
        };
        let path = if self.options.canonicalize {
            real.clone()
        } else {
            child.path
        };
        if self.is_skipped(&path) {
            return None;
        }

        let entry = WalkEntry::from_info(&path, &info);
        if !info.is_directory {
            return self.file_entry(entry);
        }
        if self.tracks_real_paths() {
            let on_stack = self
                .stack
                .iter()
                .any(|frame| frame.real.as_deref() == Some(real.as_path()));
            if on_stack {
                debug!(path = ?path, "Not re-entering directory already on the walk stack");
            }
            self.enter_dir(entry, Some(real), child.depth, !on_stack)
        } else {
            self.enter_dir(entry, None, child.depth, true)
        }
    }

    fn enter_dir(
        &mut self,
        entry: WalkEntry,
        real: Option<PathBuf>,
        depth: usize,
        traverse: bool,
    ) -> Step {
        let path = entry.path.clone();
        let item = self.dir_entry(entry);
        if traverse && self.can_descend(depth) {
            self.stack.push(Frame {
                path,
                real,
                depth,
                entries: None,
            });
        }
        item
    }

    fn dir_entry(&self, entry: WalkEntry) -> Step {
        (self.options.include_dirs && self.is_included(&entry.path)).then_some(Ok(entry))
    }

    fn file_entry(&self, entry: WalkEntry) -> Step {
        (self.options.include_files && self.is_included(&entry.path)).then_some(Ok(entry))
    }
}

/// Joins without introducing a `./` prefix for the current directory.
fn join_child(parent: &Path, name: &str) -> PathBuf {
    if parent == Path::new(".") {
        PathBuf::from(name)
    } else {
        parent.join(name)
    }
}

/// Blocking walk returned by [`Fs::walk_sync`].
pub struct WalkIter<'a> {
    fs: &'a Fs,
    state: WalkState,
}

impl<'a> WalkIter<'a> {
    fn new(fs: &'a Fs, root: PathBuf, options: WalkOptions) -> Self {
        Self {
            fs,
            state: WalkState::new(root, options),
        }
    }
}

impl Iterator for WalkIter<'_> {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.phase == Phase::Done {
            return None;
        }
        if let Some(item) = self.state.check_signal() {
            return Some(item);
        }

        if self.state.phase == Phase::Start {
            let root = self.state.root.clone();
            let stat = self.fs.stat_sync(&root);
            let real = (stat.is_ok() && self.state.tracks_real_paths())
                .then(|| self.fs.real_path_sync(&root));
            if let Some(item) = self.state.visit_root(stat, real) {
                return Some(item);
            }
        }

        while self.state.phase == Phase::Running {
            if let Some(dir) = self.state.pending_listing() {
                let listing = self.fs.read_dir_sync(&dir);
                if let Some(item) = self.state.set_listing(dir, listing) {
                    return Some(item);
                }
            }
            let child = self.state.next_child()?;
            let item = if self.state.should_follow(&child) {
                let resolved = self
                    .fs
                    .real_path_sync(&child.path)
                    .and_then(|real| self.fs.lstat_sync(&real).map(|info| (real, info)));
                self.state.visit_followed(child, resolved)
            } else {
                self.state.visit_child(child)
            };
            if item.is_some() {
                return item;
            }
        }
        None
    }
}

/// Async counterpart of [`WalkIter`], driven through `stream::unfold`.
struct AsyncWalk<'a> {
    fs: &'a Fs,
    state: WalkState,
}

impl AsyncWalk<'_> {
    async fn next(&mut self) -> Step {
        if self.state.phase == Phase::Done {
            return None;
        }
        if let Some(item) = self.state.check_signal() {
            return Some(item);
        }

        if self.state.phase == Phase::Start {
            let root = self.state.root.clone();
            let stat = self.fs.stat(&root).await;
            let real = if stat.is_ok() && self.state.tracks_real_paths() {
                Some(self.fs.real_path(&root).await)
            } else {
                None
            };
            if let Some(item) = self.state.visit_root(stat, real) {
                return Some(item);
            }
        }

        while self.state.phase == Phase::Running {
            if let Some(dir) = self.state.pending_listing() {
                let listing = self.fs.read_dir(&dir).await;
                if let Some(item) = self.state.set_listing(dir, listing) {
                    return Some(item);
                }
            }
            let child = self.state.next_child()?;
            let item = if self.state.should_follow(&child) {
                let resolved = match self.fs.real_path(&child.path).await {
                    Ok(real) => self.fs.lstat(&real).await.map(|info| (real, info)),
                    Err(err) => Err(err),
                };
                self.state.visit_followed(child, resolved)
            } else {
                self.state.visit_child(child)
            };
            if item.is_some() {
                return item;
            }
        }
        None
    }
}

impl Fs {
    /// Lazily walks `root` depth-first with the blocking operations.
    pub fn walk_sync(&self, root: impl AsRef<Path>, options: WalkOptions) -> WalkIter<'_> {
        WalkIter::new(self, root.as_ref().to_path_buf(), options)
    }

    /// Lazily walks `root` depth-first with the async operations.
    pub fn walk(
        &self,
        root: impl AsRef<Path>,
        options: WalkOptions,
    ) -> BoxStream<'_, Result<WalkEntry>> {
        let walk = AsyncWalk {
            fs: self,
            state: WalkState::new(root.as_ref().to_path_buf(), options),
        };
        stream::unfold(walk, |mut walk| async move {
            let item = walk.next().await?;
            Some((item, walk))
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(options: WalkOptions) -> WalkState {
        WalkState::new(PathBuf::from("/root"), options)
    }

    #[test]
    fn test_exts_get_leading_dot() {
        let s = state(WalkOptions::default().with_exts(["rs", ".toml"]));
        assert_eq!(s.options.exts, [".rs", ".toml"]);
        assert!(s.is_included(Path::new("/root/lib.rs")));
        assert!(s.is_included(Path::new("/root/Cargo.toml")));
        assert!(!s.is_included(Path::new("/root/notes.txt")));
    }

    #[test]
    fn test_match_requires_one_hit() {
        let s = state(
            WalkOptions::default()
                .with_match(Pattern::regex(r"x$").unwrap())
                .with_match(Pattern::regex(r"y$").unwrap()),
        );
        assert!(s.is_included(Path::new("/root/x")));
        assert!(s.is_included(Path::new("/root/y")));
        assert!(!s.is_included(Path::new("/root/z")));
    }

    #[test]
    fn test_skip_wins_over_match() {
        let s = state(
            WalkOptions::default()
                .with_match(Pattern::regex("a").unwrap())
                .with_skip(Pattern::glob("/root/a*").unwrap()),
        );
        assert!(s.is_skipped(Path::new("/root/abc")));
        assert!(!s.is_included(Path::new("/root/abc")));
    }

    #[test]
    fn test_glob_star_stays_in_component() {
        let pattern = Pattern::glob("/root/*.rs").unwrap();
        assert!(pattern.is_match("/root/main.rs"));
        assert!(!pattern.is_match("/root/src/main.rs"));

        let deep = Pattern::glob("/root/**/*.rs").unwrap();
        assert!(deep.is_match("/root/src/main.rs"));
    }

    #[test]
    fn test_case_insensitive_glob() {
        let pattern = Pattern::glob_case_insensitive("/root/*.TXT").unwrap();
        assert!(pattern.is_match("/root/readme.txt"));
        assert!(!Pattern::glob("/root/*.TXT").unwrap().is_match("/root/readme.txt"));
    }

    #[test]
    fn test_join_child_drops_current_dir() {
        assert_eq!(join_child(Path::new("."), "a"), PathBuf::from("a"));
        assert_eq!(join_child(Path::new("/x"), "a"), PathBuf::from("/x/a"));
    }

    #[test]
    fn test_depth_bound() {
        let s = state(WalkOptions::default().with_max_depth(1));
        assert!(s.can_descend(0));
        assert!(!s.can_descend(1));
        assert!(state(WalkOptions::default()).can_descend(usize::MAX - 1));
    }

    #[test]
    fn test_root_error_is_unwrapped() {
        let mut s = state(WalkOptions::default());
        let err = std::io::Error::from(std::io::ErrorKind::NotFound);
        let item = s.visit_root(Err(err.into()), None).unwrap();
        assert!(matches!(
            item,
            Err(FsError::Io(ref e)) if e.kind() == std::io::ErrorKind::NotFound
        ));
        assert_eq!(s.phase, Phase::Done);
    }

    #[test]
    fn test_aborted_signal_ends_walk() {
        let mut s = state(WalkOptions::default().with_signal(AbortSignal::aborted_signal()));
        assert!(matches!(s.check_signal(), Some(Err(FsError::Aborted))));
        assert_eq!(s.phase, Phase::Done);
    }
}
