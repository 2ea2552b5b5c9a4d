//! The engine handle: lifecycle, mutation operations and the error record.
//!
//! Every public operation compiles its path arguments, resolves them against
//! the tree and only then mutates it, so a call that fails never leaves a
//! partial write behind. Each call overwrites the engine's [`ErrorInfo`]:
//! success resets it, failure records the error.
//!
//! # Examples
//!
//! ```
//! use cfgtree::{Engine, Flags};
//!
//! let mut aug = Engine::create("/tmp", None, Flags::SAVE_NEWFILE);
//! assert_eq!(aug.get("/augeas/save").unwrap().as_deref(), Some("newfile"));
//!
//! aug.set("/files/etc/hosts/1/ipaddr", Some("127.0.0.1")).unwrap();
//! assert_eq!(aug.get("/files/etc/hosts/1/ipaddr").unwrap().as_deref(), Some("127.0.0.1"));
//!
//! aug.close().unwrap();
//! assert!(aug.get("/files").is_err());
//! ```

use std::{fmt, ops::BitOr, str::FromStr};

use tracing::{debug, info, warn};

use crate::{
    ast::{Axis, CompiledPath, LabelMatcher, PathRef, Step},
    command,
    error::{EngineError, ErrorInfo, ErrorReporter, PathError, PathErrorKind, Result},
    evaluator::{Evaluator, LocateError, Target},
    output::{self, Entry, NodeSnapshot},
    parser::compile,
    tree::{NodeId, NodeStore},
};

/// Label of the reserved meta subtree holding the engine configuration.
pub const META: &str = "augeas";

/// Default context for relative paths.
pub const DEFAULT_CONTEXT: &str = "/files";

/// Status returned by [`Engine::srun`] for a failed command.
pub const STATUS_FAILURE: i32 = -1;

/// Status returned by [`Engine::srun`] when the script ran `quit`.
pub const STATUS_QUIT: i32 = -2;

/// Engine configuration flags, combinable with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// Keep the original file with a `.augsave` extension
    pub const SAVE_BACKUP: Flags = Flags(1 << 0);
    /// Write changes into a `.augnew` file next to the original
    pub const SAVE_NEWFILE: Flags = Flags(1 << 1);
    /// Go through a save without writing anything
    pub const SAVE_NOOP: Flags = Flags(1 << 2);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Flags {
        Flags(bits)
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// How the persistence layer writes changed files back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    #[default]
    Overwrite,
    Backup,
    NewFile,
    Noop,
}

impl SaveMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SaveMode::Overwrite => "overwrite",
            SaveMode::Backup => "backup",
            SaveMode::NewFile => "newfile",
            SaveMode::Noop => "noop",
        }
    }
}

impl From<Flags> for SaveMode {
    fn from(flags: Flags) -> Self {
        if flags.contains(Flags::SAVE_NOOP) {
            SaveMode::Noop
        } else if flags.contains(Flags::SAVE_NEWFILE) {
            SaveMode::NewFile
        } else if flags.contains(Flags::SAVE_BACKUP) {
            SaveMode::Backup
        } else {
            SaveMode::Overwrite
        }
    }
}

impl FromStr for SaveMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "overwrite" => Ok(SaveMode::Overwrite),
            "backup" => Ok(SaveMode::Backup),
            "newfile" => Ok(SaveMode::NewFile),
            "noop" => Ok(SaveMode::Noop),
            other => Err(EngineError::BadArgument(format!(
                "unknown save mode '{}' in /{}/save",
                other, META
            ))),
        }
    }
}

impl fmt::Display for SaveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configuration session over one tree.
///
/// Not thread-safe; wrap it in a lock to share it.
#[derive(Debug)]
pub struct Engine {
    session: Option<Session>,
    reporter: ErrorReporter,
}

#[derive(Debug)]
struct Session {
    store: NodeStore,
    flags: Flags,
    /// Changes outside the meta subtree since the last save
    pending: bool,
    saves: usize,
}

impl Engine {
    /// Open an engine.
    ///
    /// `root` is the filesystem root the tree describes; it is normalised to
    /// end with `/`. `load_path` is a `:`-separated list of module
    /// directories. Both, and the save mode chosen by `flags`, are readable
    /// under `/augeas`.
    pub fn create(root: &str, load_path: Option<&str>, flags: Flags) -> Engine {
        let mut store = NodeStore::new();
        let top = store.root();

        let mut root_dir = if root.is_empty() { "/".to_string() } else { root.to_string() };
        if !root_dir.ends_with('/') {
            root_dir.push('/');
        }

        if let Some(meta) = store.append_child(top, META) {
            let entries = [
                ("root", root_dir.as_str()),
                ("save", SaveMode::from(flags).as_str()),
                ("context", DEFAULT_CONTEXT),
                ("version", env!("CARGO_PKG_VERSION")),
            ];
            for (label, value) in entries {
                if let Some(node) = store.append_child(meta, label) {
                    store.set_value(node, Some(value.to_string()));
                }
            }
            if let Some(loadpath) = store.append_child(meta, "loadpath") {
                let dirs = load_path.unwrap_or_default().split(':').filter(|d| !d.is_empty());
                for dir in dirs {
                    if let Some(node) = store.append_child(loadpath, "path") {
                        store.set_value(node, Some(dir.to_string()));
                    }
                }
            }
        }
        store.append_child(top, DEFAULT_CONTEXT.trim_start_matches('/'));

        debug!(root = %root_dir, flags = flags.bits(), "engine created");
        Engine {
            session: Some(Session {
                store,
                flags,
                pending: false,
                saves: 0,
            }),
            reporter: ErrorReporter::new(),
        }
    }

    /// Details of the most recent call; `NoError` after a success.
    pub fn error(&self) -> &ErrorInfo {
        self.reporter.last()
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Release the tree. Every later call, `close` included, fails with
    /// [`EngineError::InstanceClosed`].
    pub fn close(&mut self) -> Result<()> {
        let result = match self.session.take() {
            Some(session) => {
                info!(nodes = session.store.len(), "engine closed");
                Ok(())
            }
            None => Err(EngineError::InstanceClosed),
        };
        self.finish(result)
    }

    /// Value of the single node `path` resolves to.
    ///
    /// `Ok(None)` when nothing matches or the node has no value; more than
    /// one match fails with [`EngineError::MultipleMatches`].
    pub fn get<'p>(&mut self, path: impl Into<PathRef<'p>>) -> Result<Option<String>> {
        let path = path.into();
        let result = self.session().and_then(|s| s.get(path));
        self.finish(result)
    }

    /// Assign `value` to the single node `path` denotes, creating it and any
    /// missing ancestors. A final `label[last()+1]` step always creates a new
    /// trailing sibling.
    pub fn set<'p>(&mut self, path: impl Into<PathRef<'p>>, value: Option<&str>) -> Result<()> {
        let path = path.into();
        let result = self.session().and_then(|s| s.set_many(path, &[value]).map(|_| ()));
        self.finish(result)
    }

    /// Assign the first value like [`Engine::set`], then add one new sibling
    /// with the same label per remaining value, in order.
    ///
    /// Returns the number of nodes written.
    pub fn set_many<'p>(
        &mut self,
        path: impl Into<PathRef<'p>>,
        values: &[Option<&str>],
    ) -> Result<usize> {
        let path = path.into();
        let result = self.session().and_then(|s| s.set_many(path, values));
        self.finish(result)
    }

    /// Remove the value of the node, keeping the node.
    pub fn clear<'p>(&mut self, path: impl Into<PathRef<'p>>) -> Result<()> {
        self.set(path, None)
    }

    /// Delete every node `path` resolves to, with their subtrees.
    ///
    /// Returns the number of nodes deleted; a path matching nothing deletes
    /// 0 nodes and is not an error.
    pub fn remove<'p>(&mut self, path: impl Into<PathRef<'p>>) -> Result<usize> {
        let path = path.into();
        let result = self.session().and_then(|s| s.remove(path));
        self.finish(result)
    }

    /// Move the single node `src` resolves to so that it takes the place of
    /// `dst`.
    ///
    /// An existing `dst` is deleted first; a missing one is created. The
    /// moved node takes the label of `dst`.
    pub fn move_node<'p, 'q>(
        &mut self,
        src: impl Into<PathRef<'p>>,
        dst: impl Into<PathRef<'q>>,
    ) -> Result<()> {
        let (src, dst) = (src.into(), dst.into());
        let result = self.session().and_then(|s| s.move_node(src, dst));
        self.finish(result)
    }

    /// Add a value-less sibling labelled `label` right before or after the
    /// single node `path` resolves to.
    pub fn insert<'p>(
        &mut self,
        path: impl Into<PathRef<'p>>,
        label: &str,
        before: bool,
    ) -> Result<()> {
        let path = path.into();
        let result = self.session().and_then(|s| s.insert(path, label, before));
        self.finish(result)
    }

    /// Canonical paths of every node `path` resolves to.
    pub fn matches<'p>(&mut self, path: impl Into<PathRef<'p>>) -> Result<Vec<String>> {
        let path = path.into();
        let result = self
            .session()
            .and_then(|s| s.entries(path, Scope::Nodes))
            .map(|entries| entries.into_iter().map(|e| e.path).collect());
        self.finish(result)
    }

    /// One entry per node `path` resolves to.
    pub fn entries<'p>(&mut self, path: impl Into<PathRef<'p>>) -> Result<Vec<Entry>> {
        let path = path.into();
        let result = self.session().and_then(|s| s.entries(path, Scope::Nodes));
        self.finish(result)
    }

    /// The children of every node `path` resolves to.
    pub fn children<'p>(&mut self, path: impl Into<PathRef<'p>>) -> Result<Vec<Entry>> {
        let path = path.into();
        let result = self.session().and_then(|s| s.entries(path, Scope::Children));
        self.finish(result)
    }

    /// Every node in the subtrees `path` resolves to, in document order.
    /// The root itself is never listed.
    pub fn subtree<'p>(&mut self, path: impl Into<PathRef<'p>>) -> Result<Vec<Entry>> {
        let path = path.into();
        let result = self.session().and_then(|s| s.entries(path, Scope::Subtree));
        self.finish(result)
    }

    /// Signal a save.
    ///
    /// Writing files belongs to the persistence layer; the engine reads the
    /// mode from `/augeas/save`, counts saves that had pending changes under
    /// `/augeas/events/saved`, and clears the pending flag.
    pub fn save(&mut self) -> Result<SaveMode> {
        let result = self.session().and_then(Session::save);
        self.finish(result)
    }

    /// Serializable copy of the single node `path` resolves to.
    pub fn snapshot<'p>(&mut self, path: impl Into<PathRef<'p>>) -> Result<NodeSnapshot> {
        let path = path.into();
        let result = self.session().and_then(|s| s.snapshot(path));
        self.finish(result)
    }

    /// Graft the snapshot's children below the single node `path` denotes
    /// (created when missing). A snapshot value replaces the node's value.
    ///
    /// Returns the number of nodes created by the graft.
    pub fn load_snapshot<'p>(
        &mut self,
        path: impl Into<PathRef<'p>>,
        snapshot: &NodeSnapshot,
    ) -> Result<usize> {
        let path = path.into();
        let result = self.session().and_then(|s| s.load_snapshot(path, snapshot));
        self.finish(result)
    }

    /// Run a script of commands; see [`crate::command`].
    ///
    /// Returns the number of commands executed and their output, or
    /// [`STATUS_FAILURE`] / [`STATUS_QUIT`] with the output produced so far.
    pub fn srun(&mut self, text: &str) -> (i32, String) {
        if self.session.is_none() {
            let _ = self.finish::<()>(Err(EngineError::InstanceClosed));
            return (STATUS_FAILURE, String::new());
        }
        self.reporter.clear();
        command::run(self, text)
    }

    fn session(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(EngineError::InstanceClosed)
    }

    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.reporter.clear(),
            Err(err) => {
                warn!(code = err.code().as_i32(), error = %err, "operation failed");
                self.reporter.record(err);
            }
        }
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Nodes,
    Children,
    Subtree,
}

impl Session {
    /// Value of a direct child of the meta subtree
    fn meta_value(&self, name: &str) -> Option<&str> {
        let meta = self.meta_node()?;
        let node = self
            .store
            .children(meta)
            .iter()
            .copied()
            .find(|&c| self.store.label(c) == Some(name))?;
        self.store.value(node)
    }

    fn meta_node(&self) -> Option<NodeId> {
        let root = self.store.root();
        self.store
            .children(root)
            .iter()
            .copied()
            .find(|&c| self.store.label(c) == Some(META))
    }

    fn in_meta(&self, id: NodeId) -> bool {
        self.meta_node().is_some_and(|meta| self.store.is_within(id, meta))
    }

    fn touch(&mut self, id: NodeId) {
        if !self.in_meta(id) {
            self.pending = true;
        }
    }

    /// Compile a path argument, anchoring relative paths at the context.
    fn prepare(&self, path: PathRef<'_>) -> Result<CompiledPath> {
        let compiled = compile_arg(path)?;
        self.anchor(compiled)
    }

    /// Like [`Session::prepare`], for paths that must name existing nodes.
    ///
    /// The append check runs before rebasing so its offset refers to the
    /// text the caller passed.
    fn prepare_existing(&self, path: PathRef<'_>) -> Result<CompiledPath> {
        let compiled = compile_arg(path)?;
        reject_append(&compiled)?;
        self.anchor(compiled)
    }

    fn anchor(&self, compiled: CompiledPath) -> Result<CompiledPath> {
        if compiled.is_absolute() {
            return Ok(compiled);
        }
        let context = self
            .meta_value("context")
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("/");
        let base = compile(context).map_err(|e| EngineError::invalid_path(context, e))?;
        Ok(compiled.rebase(&base))
    }

    /// Resolve a path prepared with [`Session::prepare_existing`].
    fn resolve(&self, path: &CompiledPath) -> Vec<NodeId> {
        Evaluator::new(&self.store).resolve(path, self.store.root())
    }

    fn resolve_single(&self, path: &CompiledPath) -> Result<NodeId> {
        match self.resolve(path).as_slice() {
            [] => Err(EngineError::NoMatch {
                path: path.text().to_string(),
            }),
            [single] => Ok(*single),
            many => Err(EngineError::MultipleMatches {
                path: path.text().to_string(),
                count: many.len(),
            }),
        }
    }

    fn locate(&self, path: &CompiledPath) -> Result<Target> {
        Evaluator::new(&self.store)
            .locate(path, self.store.root())
            .map_err(|err| match err {
                LocateError::MultipleMatches(count) => EngineError::MultipleMatches {
                    path: path.text().to_string(),
                    count,
                },
                LocateError::CannotCreate { step, reason } => EngineError::CannotCreate {
                    path: path.text().to_string(),
                    reason: format!("step {}: {}", step + 1, reason),
                },
            })
    }

    /// Create the missing steps of a located path. The steps were checked by
    /// the evaluator, so only labelled child and append steps occur here.
    fn create(&mut self, path: &CompiledPath, anchor: NodeId, from: usize) -> Result<NodeId> {
        let mut parent = anchor;
        for step in &path.steps()[from..] {
            let label = match step {
                Step::Append { label, .. } => label,
                Step::Select {
                    axis: Axis::Child(LabelMatcher::Exact(label)),
                    ..
                } => label,
                Step::Select { .. } => {
                    return Err(EngineError::CannotCreate {
                        path: path.text().to_string(),
                        reason: "step does not name a label".to_string(),
                    });
                }
            };
            parent = self
                .store
                .append_after_label(parent, label)
                .ok_or_else(|| EngineError::CannotCreate {
                    path: path.text().to_string(),
                    reason: "parent node no longer exists".to_string(),
                })?;
        }
        self.touch(parent);
        Ok(parent)
    }

    /// Existing node for `path`, or a freshly created one
    fn locate_or_create(&mut self, path: &CompiledPath) -> Result<NodeId> {
        match self.locate(path)? {
            Target::Found(id) => Ok(id),
            Target::Missing { anchor, from } => self.create(path, anchor, from),
        }
    }

    fn get(&self, path: PathRef<'_>) -> Result<Option<String>> {
        let path = self.prepare_existing(path)?;
        let nodes = self.resolve(&path);
        debug!(path = %path, matches = nodes.len(), "get");
        match nodes.as_slice() {
            [] => Ok(None),
            [single] => Ok(self.store.value(*single).map(str::to_string)),
            many => Err(EngineError::MultipleMatches {
                path: path.text().to_string(),
                count: many.len(),
            }),
        }
    }

    fn set_many(&mut self, path: PathRef<'_>, values: &[Option<&str>]) -> Result<usize> {
        let Some((first, rest)) = values.split_first() else {
            return Err(EngineError::BadArgument(
                "set needs at least one value".to_string(),
            ));
        };
        let path = self.prepare(path)?;

        let target = self.locate(&path)?;
        if target == Target::Found(self.store.root()) {
            return Err(EngineError::BadArgument(
                "the root node cannot hold a value".to_string(),
            ));
        }
        let node = match target {
            Target::Found(id) => id,
            Target::Missing { anchor, from } => self.create(&path, anchor, from)?,
        };
        self.store.set_value(node, first.map(str::to_string));

        // Each further value goes right after the previous one
        if let (Some(parent), Some(label)) =
            (self.store.parent(node), self.store.label(node).map(str::to_string))
        {
            let mut prev = node;
            for value in rest {
                let at = self.store.index_in_parent(prev).map_or(usize::MAX, |i| i + 1);
                let Some(sibling) = self.store.insert_child(parent, at, label.as_str()) else {
                    break;
                };
                self.store.set_value(sibling, value.map(str::to_string));
                prev = sibling;
            }
        }
        self.touch(node);

        debug!(path = %path, values = values.len(), "set");
        Ok(values.len())
    }

    fn remove(&mut self, path: PathRef<'_>) -> Result<usize> {
        let path = self.prepare_existing(path)?;
        let nodes = self.resolve(&path);
        if nodes.contains(&self.store.root()) {
            return Err(EngineError::BadArgument(
                "the root node cannot be removed".to_string(),
            ));
        }

        let mut removed = 0;
        for id in nodes {
            self.touch(id);
            removed += self.store.remove(id);
        }
        debug!(path = %path, removed, "rm");
        Ok(removed)
    }

    fn move_node(&mut self, src: PathRef<'_>, dst: PathRef<'_>) -> Result<()> {
        let src_path = self.prepare_existing(src)?;
        let dst_path = self.prepare(dst)?;
        let root = self.store.root();

        let src = self.resolve_single(&src_path)?;
        let into_descendant = || EngineError::MoveIntoDescendant {
            src: src_path.text().to_string(),
            dst: dst_path.text().to_string(),
        };

        let target = self.locate(&dst_path)?;
        if src == root || target == Target::Found(root) {
            return Err(EngineError::BadArgument(
                "the root node cannot be moved or replaced".to_string(),
            ));
        }
        match target {
            Target::Found(dst) if self.store.is_within(dst, src) => return Err(into_descendant()),
            Target::Missing { anchor, .. } if self.store.is_within(anchor, src) => {
                return Err(into_descendant());
            }
            _ => {}
        }

        let dst = match target {
            Target::Found(id) => id,
            Target::Missing { anchor, from } => self.create(&dst_path, anchor, from)?,
        };
        let label = self.store.label(dst).unwrap_or_default().to_string();

        self.touch(src);
        self.store.detach(src);
        let parent = self.store.parent(dst).unwrap_or(root);
        let index = self.store.index_in_parent(dst).unwrap_or(usize::MAX);
        self.store.remove(dst);
        self.store.attach(src, parent, index);
        self.store.set_label(src, label);
        self.touch(src);

        debug!(src = %src_path, dst = %dst_path, "mv");
        Ok(())
    }

    fn insert(&mut self, path: PathRef<'_>, label: &str, before: bool) -> Result<()> {
        if label.is_empty() || label.contains('/') {
            return Err(EngineError::BadArgument(format!(
                "invalid label '{}' for insert",
                label
            )));
        }
        let path = self.prepare_existing(path)?;
        let sibling = self.resolve_single(&path)?;
        let (Some(parent), Some(index)) = (
            self.store.parent(sibling),
            self.store.index_in_parent(sibling),
        ) else {
            return Err(EngineError::BadArgument(
                "cannot insert a sibling of the root node".to_string(),
            ));
        };

        let at = if before { index } else { index + 1 };
        if let Some(created) = self.store.insert_child(parent, at, label) {
            self.touch(created);
        }
        debug!(path = %path, label, before, "ins");
        Ok(())
    }

    fn entries(&self, path: PathRef<'_>, scope: Scope) -> Result<Vec<Entry>> {
        let path = self.prepare_existing(path)?;
        let nodes = self.resolve(&path);
        let listed: Vec<Entry> = match scope {
            Scope::Nodes => nodes
                .into_iter()
                .map(|id| output::entry(&self.store, id))
                .collect(),
            Scope::Children => nodes
                .iter()
                .flat_map(|&n| self.store.children(n).iter().copied())
                .map(|id| output::entry(&self.store, id))
                .collect(),
            Scope::Subtree => nodes
                .iter()
                .flat_map(|&n| output::subtree_entries(&self.store, n))
                .collect(),
        };
        debug!(path = %path, matches = listed.len(), "entries");
        Ok(listed)
    }

    fn save(&mut self) -> Result<SaveMode> {
        let mode = match self.meta_value("save") {
            Some(mode) => mode.parse()?,
            None => SaveMode::from(self.flags),
        };

        if self.pending {
            self.saves += 1;
        }
        let saved = self.saves.to_string();
        if let Some(meta) = self.meta_node()
            && let Some(events) = find_or_append(&mut self.store, meta, "events")
            && let Some(node) = find_or_append(&mut self.store, events, "saved")
        {
            self.store.set_value(node, Some(saved));
        }

        info!(mode = %mode, pending = self.pending, saves = self.saves, "save");
        self.pending = false;
        Ok(mode)
    }

    fn snapshot(&self, path: PathRef<'_>) -> Result<NodeSnapshot> {
        let path = self.prepare_existing(path)?;
        let node = self.resolve_single(&path)?;
        let depth = output::subtree_depth(&self.store, node);
        if depth > output::MAX_SNAPSHOT_DEPTH {
            return Err(EngineError::BadArgument(format!(
                "subtree at {} is {} levels deep; snapshots hold at most {}",
                path,
                depth,
                output::MAX_SNAPSHOT_DEPTH
            )));
        }
        Ok(output::snapshot(&self.store, node))
    }

    fn load_snapshot(&mut self, path: PathRef<'_>, snapshot: &NodeSnapshot) -> Result<usize> {
        if let Some(label) = output::first_bad_label(snapshot) {
            return Err(EngineError::BadArgument(format!(
                "snapshot contains invalid label '{}'",
                label
            )));
        }
        let path = self.prepare(path)?;
        let node = self.locate_or_create(&path)?;
        if snapshot.value.is_some() {
            if node == self.store.root() {
                return Err(EngineError::BadArgument(
                    "the root node cannot hold a value".to_string(),
                ));
            }
            self.store.set_value(node, snapshot.value.clone());
        }
        let created = output::graft(&mut self.store, node, snapshot);
        self.touch(node);
        debug!(path = %path, created, "load snapshot");
        Ok(created)
    }
}

fn compile_arg(path: PathRef<'_>) -> Result<CompiledPath> {
    match path {
        PathRef::Text(text) => {
            let text = text.trim();
            compile(text).map_err(|e| EngineError::invalid_path(text, e))
        }
        PathRef::Compiled(compiled) => Ok(compiled.clone()),
    }
}

fn find_or_append(store: &mut NodeStore, parent: NodeId, label: &str) -> Option<NodeId> {
    let existing = store
        .children(parent)
        .iter()
        .copied()
        .find(|&c| store.label(c) == Some(label));
    existing.or_else(|| store.append_child(parent, label))
}

/// Paths ending in `last()+1` only make sense to operations that create.
fn reject_append(path: &CompiledPath) -> Result<()> {
    match path.steps().last() {
        Some(Step::Append { offset, .. }) => Err(EngineError::invalid_path(
            path.text(),
            PathError::new(PathErrorKind::AppendNotAllowed, *offset),
        )),
        _ => Ok(()),
    }
}
