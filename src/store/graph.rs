//! Transactional in-memory graph store.
//!
//! Committed state is an immutable [`Snapshot`] behind an `Arc`. Readers
//! clone the `Arc` and never wait on writers. A single writer records its
//! changes in a journal and applies them on commit; dropping a write
//! transaction without committing discards the journal.
//!
//! Commits patch the quad index with the changed graphs only. When no reader
//! still holds the previous snapshot it is updated in place; otherwise it is
//! copied first.
//!
//! Graphs are bags, the quad index is a set. `default_graph().len()` and
//! `triples_loaded` count duplicates, SPARQL sees each distinct triple once.

use std::{
    collections::BTreeMap,
    mem,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, RwLock,
    },
};

use oxrdf::{Dataset, Graph, GraphNameRef, NamedNode, NamedNodeRef, Triple};

/// Where triples are loaded.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum GraphTarget {
    Default,
    Named(NamedNode),
}

impl GraphTarget {
    fn graph_name(&self) -> GraphNameRef<'_> {
        match self {
            Self::Default => GraphNameRef::DefaultGraph,
            Self::Named(name) => name.as_ref().into(),
        }
    }
}

/// Graph contents. Graphs are bags: inserting a triple twice stores it twice.
#[derive(Clone, Debug, Default)]
struct GraphState {
    default: Vec<Triple>,
    named: BTreeMap<NamedNode, Vec<Triple>>,
}

/// Pending change to one graph.
#[derive(Debug)]
enum Staged {
    /// Triples added after the committed contents.
    Appended(Vec<Triple>),
    /// Full new contents.
    Replaced(Vec<Triple>),
}

/// Immutable committed state with a query index.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    state: GraphState,
    dataset: Dataset,
}

impl Snapshot {
    fn graph(&self, target: &GraphTarget) -> &[Triple] {
        match target {
            GraphTarget::Default => &self.state.default,
            GraphTarget::Named(name) => self.state.named.get(name).map_or(&[][..], Vec::as_slice),
        }
    }

    fn apply(&mut self, target: &GraphTarget, staged: Staged) {
        let graph_name = target.graph_name();
        let graph = match target {
            GraphTarget::Default => &mut self.state.default,
            GraphTarget::Named(name) => self.state.named.entry(name.clone()).or_default(),
        };
        match staged {
            Staged::Appended(triples) => {
                for triple in &triples {
                    self.dataset.insert(triple.as_ref().in_graph(graph_name));
                }
                graph.extend(triples);
            }
            Staged::Replaced(triples) => {
                for triple in graph.iter() {
                    self.dataset.remove(triple.as_ref().in_graph(graph_name));
                }
                for triple in &triples {
                    self.dataset.insert(triple.as_ref().in_graph(graph_name));
                }
                *graph = triples;
            }
        }
    }

    #[must_use]
    pub fn default_graph(&self) -> &[Triple] {
        &self.state.default
    }

    #[must_use]
    pub fn named_graph(&self, name: NamedNodeRef<'_>) -> Option<&[Triple]> {
        self.state
            .named
            .get(&name.into_owned())
            .map(Vec::as_slice)
    }

    pub fn graph_names(&self) -> impl Iterator<Item = &NamedNode> {
        self.state.named.keys()
    }

    /// Default and named graphs merged, duplicates collapsed.
    #[must_use]
    pub fn union_graph(&self) -> Graph {
        let mut graph = Graph::new();
        for triple in self
            .state
            .default
            .iter()
            .chain(self.state.named.values().flatten())
        {
            graph.insert(triple);
        }
        graph
    }

    /// Quad index used for SPARQL evaluation.
    #[must_use]
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Stored triples across all graphs, duplicates counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.default.len() + self.state.named.values().map(Vec::len).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct GraphStore {
    committed: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
    opened: AtomicU64,
}

impl GraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a read transaction on the last committed snapshot.
    pub fn begin_read(&self) -> ReadTransaction {
        self.opened.fetch_add(1, Ordering::Relaxed);
        ReadTransaction {
            snapshot: self.snapshot(),
        }
    }

    /// Starts the write transaction, waiting for any other writer to finish.
    pub fn begin_write(&self) -> WriteTransaction<'_> {
        let guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.opened.fetch_add(1, Ordering::Relaxed);
        WriteTransaction {
            store: self,
            _writer: guard,
            changes: BTreeMap::new(),
            committed: false,
        }
    }

    /// Number of read and write transactions started so far.
    #[must_use]
    pub fn transactions_opened(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.committed.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn publish(&self, changes: BTreeMap<GraphTarget, Staged>) {
        let mut committed = self.committed.write().unwrap_or_else(PoisonError::into_inner);
        let mut snapshot =
            Arc::try_unwrap(mem::take(&mut *committed)).unwrap_or_else(|shared| (*shared).clone());
        for (target, staged) in changes {
            snapshot.apply(&target, staged);
        }
        *committed = Arc::new(snapshot);
    }
}

/// Read access to one committed snapshot. Writes committed after the
/// transaction started are not visible through it.
#[derive(Debug)]
pub struct ReadTransaction {
    snapshot: Arc<Snapshot>,
}

impl ReadTransaction {
    #[must_use]
    pub fn default_graph(&self) -> &[Triple] {
        self.snapshot.default_graph()
    }

    #[must_use]
    pub fn named_graph(&self, name: NamedNodeRef<'_>) -> Option<&[Triple]> {
        self.snapshot.named_graph(name)
    }

    #[must_use]
    pub fn union_graph(&self) -> Graph {
        self.snapshot.union_graph()
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        self.snapshot.dataset()
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Releases the reader. Dropping the transaction has the same effect.
    pub fn end(self) {}
}

/// Exclusive write access. Changes become visible only through
/// [`WriteTransaction::commit`].
pub struct WriteTransaction<'a> {
    store: &'a GraphStore,
    _writer: MutexGuard<'a, ()>,
    changes: BTreeMap<GraphTarget, Staged>,
    committed: bool,
}

impl WriteTransaction<'_> {
    /// The staged default graph, committed contents included.
    pub fn default_graph(&mut self) -> &mut Vec<Triple> {
        self.replaced(GraphTarget::Default)
    }

    /// The staged named graph `name`, created empty on first use.
    pub fn named_graph(&mut self, name: NamedNode) -> &mut Vec<Triple> {
        self.replaced(GraphTarget::Named(name))
    }

    /// Appends `triples` to `target` and returns how many were added.
    pub fn load_into(
        &mut self,
        target: GraphTarget,
        triples: impl IntoIterator<Item = Triple>,
    ) -> usize {
        let (Staged::Appended(graph) | Staged::Replaced(graph)) = self
            .changes
            .entry(target)
            .or_insert_with(|| Staged::Appended(Vec::new()));
        let before = graph.len();
        graph.extend(triples);
        graph.len() - before
    }

    /// Full contents of `target` for arbitrary edits. Copies the committed
    /// graph once per transaction.
    fn replaced(&mut self, target: GraphTarget) -> &mut Vec<Triple> {
        let committed = self.store.snapshot();
        let current = committed.graph(&target);
        let staged = self
            .changes
            .entry(target.clone())
            .or_insert_with(|| Staged::Appended(Vec::new()));
        if let Staged::Appended(appended) = staged {
            let mut graph = current.to_vec();
            graph.append(appended);
            *staged = Staged::Replaced(graph);
        }
        let (Staged::Appended(graph) | Staged::Replaced(graph)) = staged;
        graph
    }

    pub fn commit(mut self) {
        let changes = mem::take(&mut self.changes);
        self.store.publish(changes);
        self.committed = true;
    }

    /// Discards every change made in this transaction.
    pub fn abort(self) {}
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::debug!("write transaction rolled back");
        }
    }
}
