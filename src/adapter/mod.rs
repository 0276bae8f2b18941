//! `DocumentAdapter`: the single mutable handle onto a document (spec §4.1).
//!
//! Everything above this layer (hierarchy helpers, layout, actions,
//! presentation, migrations) talks to the document only through here. The
//! adapter itself never borrows a `yrs` transaction across a method
//! boundary — every call opens its own short-lived `store.transact()` /
//! `store.transact_mut()`, so the `yrs` document is always left in a
//! consistent state between adapter calls. Subscriber-visible atomicity
//! (spec §5: "no subscriber sees an intermediate state") instead comes from
//! `transaction()`'s depth counter, which defers notification dispatch until
//! the outermost call commits.

pub mod subscribe;

use crate::error::{CoreError, CoreResult};
use crate::ids::{DeployableId, EdgeId, NodeId, PageId, PortSchemaId, SchemaGroupId, SchemaId, SchemaPackageId, SchemaRelationshipId};
use crate::model::document::{Document, Page, CURRENT_VERSION};
use crate::model::edge::{Edge, EdgeData};
use crate::model::geometry::{Point, Size};
use crate::model::node::{Node, NodeData};
use crate::model::pin::PinConstraint;
use crate::model::schema::{Deployable, PackageManifestEntry, PortSchema, Schema, SchemaGroup, SchemaPackage, SchemaRelationship};
use crate::origin::Origin;
use crate::store::ordered::OrderedCollection;
use crate::store::{self, Store};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use subscribe::{SubscriptionId, Subscribers, Topic};
use yrs::{ArrayRef, MapRef, ReadTxn, TransactionMut};

/// Generates the repetitive get-all/get-one/set-all/add/update/remove
/// quintet for a document-level registry that has a dedicated subscription
/// topic. `schema_packages`/`schema_relationships` have none, so they're
/// written out by hand instead of through this macro.
macro_rules! registry_ops {
    ($get_all:ident, $get_one:ident, $set_all:ident, $add:ident, $update:ident, $remove:ident, $field:ident, $ty:ty, $id_ty:ty, $topic:expr) => {
        pub fn $get_all(&self) -> Vec<$ty> {
            let txn = self.store.transact();
            self.$field.get_all(&txn)
        }

        pub fn $get_one(&self, id: &$id_ty) -> Option<$ty> {
            let txn = self.store.transact();
            self.$field.get(&txn, id.as_str())
        }

        pub fn $set_all(&self, values: Vec<$ty>) {
            self.mutate(Origin::User, Some($topic), |txn| {
                self.$field.replace_all(txn, values, |v: &$ty| v.id.0.clone());
            });
        }

        pub fn $add(&self, value: $ty) {
            self.mutate(Origin::User, Some($topic), |txn| {
                let id = value.id.0.clone();
                self.$field.upsert(txn, &id, &value);
            });
        }

        pub fn $update(&self, id: &$id_ty, f: impl FnOnce(&mut $ty)) -> bool {
            self.mutate(Origin::User, Some($topic), |txn| {
                let Some(mut value) = self.$field.get::<$ty>(txn, id.as_str()) else { return false };
                f(&mut value);
                self.$field.upsert(txn, id.as_str(), &value);
                true
            })
        }

        pub fn $remove(&self, id: &$id_ty) -> bool {
            self.mutate(Origin::User, Some($topic), |txn| self.$field.remove(txn, id.as_str()))
        }
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PageMeta {
    id: PageId,
    name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocMeta {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    active_page_id: Option<PageId>,
    version: u32,
    #[serde(default)]
    migration_version: u32,
}

impl Default for DocMeta {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            active_page_id: None,
            version: CURRENT_VERSION,
            // A freshly created (never-persisted) document starts at
            // version 0, same as anything else `run_pending` might load
            // (spec §4.7) -- migrations that find nothing to do are cheap
            // no-ops, and this keeps "create a document, then load it" on
            // the same migration path instead of a document's very
            // creation silently skipping migrations that haven't run yet.
            migration_version: 0,
        }
    }
}

/// Optional partial update applied by `update_node` (spec §4.1 `updateNode`).
/// Fields use `Option<Option<T>>` where the outer `None` means "leave
/// unchanged" and `Some(None)` means "clear this field" — the only way to
/// distinguish the two through a single flat patch struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(default)]
    pub parent_id: Option<Option<NodeId>>,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub width: Option<Option<f64>>,
    #[serde(default)]
    pub height: Option<Option<f64>>,
    #[serde(default)]
    pub style_size: Option<Option<Size>>,
    #[serde(default)]
    pub measured: Option<Option<Size>>,
    #[serde(default)]
    pub data: Option<NodeData>,
}

impl NodePatch {
    fn apply(self, node: &mut Node) {
        if let Some(parent_id) = self.parent_id {
            node.parent_id = parent_id;
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(width) = self.width {
            node.width = width;
        }
        if let Some(height) = self.height {
            node.height = height;
        }
        if let Some(style_size) = self.style_size {
            node.style_size = style_size;
        }
        if let Some(measured) = self.measured {
            node.measured = measured;
        }
        if let Some(data) = self.data {
            node.data = data;
        }
    }
}

/// One entry of a `patch_nodes` batch (spec §4.1 `patchNodes`): a position
/// and/or style-size change for an existing node. An id that no longer
/// exists is silently skipped, same as `patch_edge_data`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePositionStylePatch {
    pub id: NodeId,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub style_size: Option<Size>,
}

/// One entry of a `patch_edge_data` batch (spec §4.1 `patchEdgeData`): a
/// sparse update of `EdgeData`'s fields. A value of `null` deletes that key;
/// any other value upserts it; keys absent from the map are left untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeDataPatch {
    pub id: EdgeId,
    pub data: serde_json::Map<String, Option<serde_json::Value>>,
}

pub struct DocumentAdapter {
    store: Store,
    meta: MapRef,
    pages: OrderedCollection,
    schemas: OrderedCollection,
    port_schemas: OrderedCollection,
    schema_groups: OrderedCollection,
    schema_packages: OrderedCollection,
    schema_relationships: OrderedCollection,
    package_manifest: ArrayRef,
    subscribers: RefCell<Subscribers>,
    /// Re-entrancy depth for `transaction()`. Only the call that takes this
    /// from 0 to 1 owns the commit: it is the one that clears `dirty` on the
    /// way in and dispatches notifications on the way out.
    depth: Cell<u32>,
    current_origin: Cell<Origin>,
    last_origin: Cell<Origin>,
    dirty: RefCell<HashSet<Topic>>,
    /// Set on any mutation, even ones with no dedicated `Topic` (document
    /// title/description, schema packages, schema relationships) — the
    /// general subscriber fires on these too.
    any_change: Cell<bool>,
}

impl DocumentAdapter {
    pub fn new(title: impl Into<String>) -> Self {
        let store = Store::new();
        let meta = store.root_map("meta");
        let pages = OrderedCollection::new(&store, "pages", "pages_order");
        let schemas = OrderedCollection::new(&store, "schemas", "schemas_order");
        let port_schemas = OrderedCollection::new(&store, "port_schemas", "port_schemas_order");
        let schema_groups = OrderedCollection::new(&store, "schema_groups", "schema_groups_order");
        let schema_packages = OrderedCollection::new(&store, "schema_packages", "schema_packages_order");
        let schema_relationships = OrderedCollection::new(&store, "schema_relationships", "schema_relationships_order");
        let package_manifest = store.root_array("package_manifest");

        let adapter = Self {
            store,
            meta,
            pages,
            schemas,
            port_schemas,
            schema_groups,
            schema_packages,
            schema_relationships,
            package_manifest,
            subscribers: RefCell::new(Subscribers::default()),
            depth: Cell::new(0),
            current_origin: Cell::new(Origin::User),
            last_origin: Cell::new(Origin::User),
            dirty: RefCell::new(HashSet::new()),
            any_change: Cell::new(false),
        };

        let init_meta = DocMeta { title: title.into(), ..DocMeta::default() };
        let mut txn = adapter.store.transact_mut();
        store::map_set(&adapter.meta, &mut txn, "value", &init_meta);
        drop(txn);
        adapter
    }

    /// Bulk-loads a previously-serialized [`Document`] into a fresh adapter
    /// (spec §4.7 "on load"), preserving page/node/edge ids and the
    /// document's own `migration_version` rather than treating it as
    /// already current. Runs as a single `sync` transaction: this is
    /// reconstruction of existing state, not a user edit, and callers are
    /// expected to follow it with [`crate::migrations::run_pending`].
    pub fn from_document(document: Document) -> Self {
        let adapter = Self::new(document.title.clone());
        adapter.load_document(&document, Origin::Sync);
        adapter
    }

    /// Overwrites every field this adapter holds with `document`'s, under a
    /// single transaction tagged `origin`. Shared by [`Self::from_document`]
    /// (a fresh adapter) and by [`crate::migrations::run_pending`], which
    /// computes a fully-migrated in-memory [`Document`] and writes it back
    /// only once every transform has succeeded (spec §7: a failing migration
    /// must leave the store at its pre-migration state, not a partial one).
    pub(crate) fn load_document(&self, document: &Document, origin: Origin) {
        self.transaction(origin, || {
            self.set_description(document.description.clone());
            self.mutate(Origin::Migration, None, |txn| {
                let mut meta = self.get_meta(txn);
                meta.version = document.version;
                meta.migration_version = document.migration_version;
                self.set_meta(txn, &meta);
            });

            self.set_schemas(document.schemas.values().cloned().collect());
            self.set_port_schemas(document.port_schemas.values().cloned().collect());
            self.set_schema_groups(document.schema_groups.values().cloned().collect());
            self.set_schema_packages(document.schema_packages.values().cloned().collect());
            self.set_schema_relationships(document.schema_relationships.values().cloned().collect());
            self.set_package_manifest(document.package_manifest.clone());

            for page in &document.pages {
                self.mutate(Origin::User, Some(Topic::Levels), |txn| {
                    self.pages.upsert(txn, page.id.as_str(), &PageMeta { id: page.id.clone(), name: page.name.clone() });
                });
                self.nodes_collection(&page.id).replace_all(
                    &mut self.store.transact_mut(),
                    page.nodes.values().cloned().collect::<Vec<Node>>(),
                    |n: &Node| n.id.0.clone(),
                );
                self.edges_collection(&page.id).replace_all(
                    &mut self.store.transact_mut(),
                    page.edges.values().cloned().collect::<Vec<Edge>>(),
                    |e: &Edge| e.id.0.clone(),
                );
                self.deployables_collection(&page.id).replace_all(
                    &mut self.store.transact_mut(),
                    page.deployables.values().cloned().collect::<Vec<Deployable>>(),
                    |d: &Deployable| d.id.0.clone(),
                );
                store::array_set_all::<PinConstraint>(&self.pins_array(&page.id), &mut self.store.transact_mut(), &page.pin_constraints);
            }

            if let Some(active) = &document.active_page_id {
                self.mutate(Origin::User, Some(Topic::Levels), |txn| {
                    let mut meta = self.get_meta(txn);
                    meta.active_page_id = Some(active.clone());
                    self.set_meta(txn, &meta);
                });
            }
        });
    }

    // ---- transactions & subscriptions (spec §4.1, §5) ----

    /// Run `body` as one logical transaction tagged with `origin`. Calls
    /// nested inside an already-open transaction join it: they neither reset
    /// the recorded origin nor trigger their own notification pass. Only the
    /// outermost call dispatches subscribers, once, after `body` returns.
    pub fn transaction<R>(&self, origin: Origin, body: impl FnOnce() -> R) -> R {
        let opened = self.depth.get() == 0;
        let _span = opened.then(|| tracing::info_span!("transaction", ?origin).entered());
        if opened {
            self.current_origin.set(origin);
            self.dirty.borrow_mut().clear();
            self.any_change.set(false);
        }
        self.depth.set(self.depth.get() + 1);
        let result = body();
        self.depth.set(self.depth.get() - 1);
        if opened {
            self.last_origin.set(self.current_origin.get());
            let dirty = std::mem::take(&mut *self.dirty.borrow_mut());
            let changed = self.any_change.replace(false);
            self.subscribers.borrow_mut().notify(&dirty, changed);
        }
        result
    }

    pub fn get_last_origin(&self) -> Origin {
        self.last_origin.get()
    }

    /// The underlying CRDT document handle (spec §6), for a sync transport
    /// to attach remote-delta application and local-update forwarding to.
    /// Everything above this layer only ever reaches `yrs` through `store`,
    /// but the transport is an external collaborator (§1 non-goal) that
    /// needs the raw handle itself.
    pub fn crdt_doc(&self) -> &yrs::Doc {
        &self.store.doc
    }

    pub fn subscribe(&self, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.subscribers.borrow_mut().subscribe_general(Box::new(handler))
    }

    pub fn subscribe_topic(&self, topic: Topic, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.subscribers.borrow_mut().subscribe_topic(topic, Box::new(handler))
    }

    pub fn subscribe_nodes(&self, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.subscribe_topic(Topic::Nodes, handler)
    }

    pub fn subscribe_edges(&self, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.subscribe_topic(Topic::Edges, handler)
    }

    pub fn subscribe_schemas(&self, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.subscribe_topic(Topic::Schemas, handler)
    }

    pub fn subscribe_port_schemas(&self, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.subscribe_topic(Topic::PortSchemas, handler)
    }

    pub fn subscribe_schema_groups(&self, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.subscribe_topic(Topic::SchemaGroups, handler)
    }

    pub fn subscribe_package_manifest(&self, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.subscribe_topic(Topic::PackageManifest, handler)
    }

    pub fn subscribe_deployables(&self, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.subscribe_topic(Topic::Deployables, handler)
    }

    pub fn subscribe_levels(&self, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.subscribe_topic(Topic::Levels, handler)
    }

    /// Run `f` inside a transaction and mark `topic` (if any) plus the
    /// general-change flag dirty once it returns.
    fn mutate<R>(&self, origin: Origin, topic: Option<Topic>, f: impl FnOnce(&mut TransactionMut) -> R) -> R {
        self.transaction(origin, || {
            let mut txn = self.store.transact_mut();
            let result = f(&mut txn);
            drop(txn);
            self.any_change.set(true);
            if let Some(topic) = topic {
                self.dirty.borrow_mut().insert(topic);
            }
            result
        })
    }

    fn get_meta(&self, txn: &impl ReadTxn) -> DocMeta {
        store::map_get(&self.meta, txn, "value").unwrap_or_default()
    }

    fn set_meta(&self, txn: &mut TransactionMut, meta: &DocMeta) {
        store::map_set(&self.meta, txn, "value", meta);
    }

    // ---- document-level fields (spec §4.1) ----

    pub fn get_title(&self) -> String {
        let txn = self.store.transact();
        self.get_meta(&txn).title
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.mutate(Origin::User, None, |txn| {
            let mut meta = self.get_meta(txn);
            meta.title = title;
            self.set_meta(txn, &meta);
        });
    }

    pub fn get_description(&self) -> Option<String> {
        let txn = self.store.transact();
        self.get_meta(&txn).description
    }

    pub fn set_description(&self, description: Option<String>) {
        self.mutate(Origin::User, None, |txn| {
            let mut meta = self.get_meta(txn);
            meta.description = description;
            self.set_meta(txn, &meta);
        });
    }

    pub fn migration_version(&self) -> u32 {
        let txn = self.store.transact();
        self.get_meta(&txn).migration_version
    }

    pub(crate) fn set_migration_version(&self, version: u32) {
        self.mutate(Origin::Migration, None, |txn| {
            let mut meta = self.get_meta(txn);
            meta.migration_version = version;
            self.set_meta(txn, &meta);
        });
    }

    pub fn generate_node_id(&self) -> NodeId {
        crate::ids::generate_node_id()
    }

    // ---- pages (spec §4.1) ----

    fn nodes_collection(&self, page_id: &PageId) -> OrderedCollection {
        OrderedCollection::new(&self.store, &format!("nodes#{page_id}"), &format!("nodes_order#{page_id}"))
    }

    fn edges_collection(&self, page_id: &PageId) -> OrderedCollection {
        OrderedCollection::new(&self.store, &format!("edges#{page_id}"), &format!("edges_order#{page_id}"))
    }

    fn deployables_collection(&self, page_id: &PageId) -> OrderedCollection {
        OrderedCollection::new(&self.store, &format!("deployables#{page_id}"), &format!("deployables_order#{page_id}"))
    }

    fn pins_array(&self, page_id: &PageId) -> ArrayRef {
        self.store.root_array(&format!("pins#{page_id}"))
    }

    fn assemble_page(&self, meta: &PageMeta) -> Page {
        let txn = self.store.transact();
        let nodes: IndexMap<NodeId, Node> = self
            .nodes_collection(&meta.id)
            .get_all::<Node>(&txn)
            .into_iter()
            .map(|n| (n.id.clone(), n))
            .collect();
        let edges: IndexMap<EdgeId, Edge> = self
            .edges_collection(&meta.id)
            .get_all::<Edge>(&txn)
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();
        let deployables: IndexMap<DeployableId, Deployable> = self
            .deployables_collection(&meta.id)
            .get_all::<Deployable>(&txn)
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();
        let pin_constraints: Vec<PinConstraint> = store::array_get_all(&self.pins_array(&meta.id), &txn);
        Page { id: meta.id.clone(), name: meta.name.clone(), nodes, edges, pin_constraints, deployables }
    }

    pub fn get_pages(&self) -> Vec<Page> {
        let txn = self.store.transact();
        let metas: Vec<PageMeta> = self.pages.get_all(&txn);
        drop(txn);
        metas.iter().map(|m| self.assemble_page(m)).collect()
    }

    pub fn create_page(&self, name: impl Into<String>) -> Page {
        let name = name.into();
        let id = crate::ids::generate_page_id();
        let meta = PageMeta { id: id.clone(), name: name.clone() };
        let activate = {
            let txn = self.store.transact();
            self.get_meta(&txn).active_page_id.is_none()
        };
        self.mutate(Origin::User, Some(Topic::Levels), |txn| {
            self.pages.upsert(txn, id.as_str(), &meta);
            if activate {
                let mut doc_meta = self.get_meta(txn);
                doc_meta.active_page_id = Some(id.clone());
                self.set_meta(txn, &doc_meta);
            }
        });
        Page::new(id, name)
    }

    pub fn delete_page(&self, id: &PageId) -> bool {
        self.mutate(Origin::User, Some(Topic::Levels), |txn| {
            let removed = self.pages.remove(txn, id.as_str());
            if removed {
                self.nodes_collection(id).replace_all(txn, Vec::<Node>::new(), |n: &Node| n.id.0.clone());
                self.edges_collection(id).replace_all(txn, Vec::<Edge>::new(), |e: &Edge| e.id.0.clone());
                self.deployables_collection(id).replace_all(txn, Vec::<Deployable>::new(), |d: &Deployable| d.id.0.clone());
                store::array_set_all::<PinConstraint>(&self.pins_array(id), txn, &[]);

                let mut meta = self.get_meta(txn);
                if meta.active_page_id.as_ref() == Some(id) {
                    meta.active_page_id = None;
                    self.set_meta(txn, &meta);
                }
            }
            removed
        })
    }

    pub fn active_page_id(&self) -> Option<PageId> {
        let txn = self.store.transact();
        self.get_meta(&txn).active_page_id
    }

    pub fn get_active_page(&self) -> Option<Page> {
        let page_id = self.active_page_id()?;
        let txn = self.store.transact();
        let meta: PageMeta = self.pages.get(&txn, page_id.as_str())?;
        drop(txn);
        Some(self.assemble_page(&meta))
    }

    pub fn set_active_page(&self, id: &PageId) -> CoreResult<()> {
        let exists = {
            let txn = self.store.transact();
            self.pages.contains(&txn, id.as_str())
        };
        if !exists {
            return Err(CoreError::UnknownId { kind: "page", id: id.0.clone() });
        }
        self.mutate(Origin::User, Some(Topic::Levels), |txn| {
            let mut meta = self.get_meta(txn);
            meta.active_page_id = Some(id.clone());
            self.set_meta(txn, &meta);
        });
        Ok(())
    }

    // ---- nodes, scoped to the active page (spec §4.1) ----

    pub fn get_nodes(&self) -> Vec<Node> {
        let Some(page_id) = self.active_page_id() else { return Vec::new() };
        let txn = self.store.transact();
        self.nodes_collection(&page_id).get_all(&txn)
    }

    pub fn set_nodes(&self, nodes: Vec<Node>) {
        let Some(page_id) = self.active_page_id() else { return };
        self.mutate(Origin::User, Some(Topic::Nodes), |txn| {
            self.nodes_collection(&page_id).replace_all(txn, nodes, |n: &Node| n.id.0.clone());
        });
    }

    /// Page-scoped variant of `set_nodes`, used by migrations (spec §4.7)
    /// which must rewrite node data across every page, not just the active
    /// one.
    pub(crate) fn set_nodes_for_page(&self, page_id: &PageId, nodes: Vec<Node>) {
        self.mutate(Origin::Migration, Some(Topic::Nodes), |txn| {
            self.nodes_collection(page_id).replace_all(txn, nodes, |n: &Node| n.id.0.clone());
        });
    }

    /// The "updater" form of `set_nodes`: reads the current ordered node
    /// list, lets `f` mutate it in place, and writes the result back.
    pub fn update_nodes(&self, f: impl FnOnce(&mut Vec<Node>)) {
        let Some(page_id) = self.active_page_id() else { return };
        self.mutate(Origin::User, Some(Topic::Nodes), |txn| {
            let coll = self.nodes_collection(&page_id);
            let mut nodes = coll.get_all::<Node>(txn);
            f(&mut nodes);
            coll.replace_all(txn, nodes, |n: &Node| n.id.0.clone());
        });
    }

    /// Rejects a `parent_id` change that would close a cycle before it ever
    /// reaches the store (spec §7: "writes that would violate a structural
    /// invariant (cycle, dangling parent) throw `InvariantViolation`").
    pub fn update_node(&self, id: &NodeId, patch: NodePatch) -> CoreResult<()> {
        let Some(page_id) = self.active_page_id() else { return Ok(()) };
        if let Some(Some(new_parent_id)) = &patch.parent_id {
            let nodes = self.get_nodes();
            let by_id = crate::hierarchy::index_by_id(&nodes);
            if crate::hierarchy::would_create_cycle(id, new_parent_id, &by_id) {
                let error = CoreError::InvariantViolation(format!(
                    "attaching {id} under {new_parent_id} would create a parentId cycle"
                ));
                tracing::error!(node_id = %id, new_parent_id = %new_parent_id, "{error}");
                return Err(error);
            }
        }
        self.mutate(Origin::User, Some(Topic::Nodes), |txn| {
            let coll = self.nodes_collection(&page_id);
            let Some(mut node) = coll.get::<Node>(txn, id.as_str()) else {
                tracing::debug!(node_id = %id, "updateNode: unknown id, skipped");
                return;
            };
            patch.apply(&mut node);
            coll.upsert(txn, id.as_str(), &node);
        });
        Ok(())
    }

    pub fn patch_nodes(&self, patches: Vec<NodePositionStylePatch>) {
        self.patch_nodes_with_origin(Origin::User, patches);
    }

    /// Same as `patch_nodes`, but tagged with an explicit origin. Layout
    /// actions (spec §4.5) use this with `Origin::Layout` so position
    /// patches they write back do not pollute undo history.
    pub(crate) fn patch_nodes_with_origin(&self, origin: Origin, patches: Vec<NodePositionStylePatch>) {
        let Some(page_id) = self.active_page_id() else { return };
        self.mutate(origin, Some(Topic::Nodes), |txn| {
            let coll = self.nodes_collection(&page_id);
            for patch in &patches {
                let Some(mut node) = coll.get::<Node>(txn, patch.id.as_str()) else {
                    tracing::debug!(node_id = %patch.id, "patchNodes: unknown id, skipped");
                    continue;
                };
                if let Some(position) = patch.position {
                    node.position = position;
                }
                if let Some(style_size) = patch.style_size {
                    node.style_size = Some(style_size);
                }
                coll.upsert(txn, patch.id.as_str(), &node);
            }
        });
    }

    // ---- edges, scoped to the active page (spec §4.1) ----

    pub fn get_edges(&self) -> Vec<Edge> {
        let Some(page_id) = self.active_page_id() else { return Vec::new() };
        let txn = self.store.transact();
        self.edges_collection(&page_id).get_all(&txn)
    }

    pub fn set_edges(&self, edges: Vec<Edge>) {
        let Some(page_id) = self.active_page_id() else { return };
        self.mutate(Origin::User, Some(Topic::Edges), |txn| {
            self.edges_collection(&page_id).replace_all(txn, edges, |e: &Edge| e.id.0.clone());
        });
    }

    pub fn update_edges(&self, f: impl FnOnce(&mut Vec<Edge>)) {
        let Some(page_id) = self.active_page_id() else { return };
        self.mutate(Origin::User, Some(Topic::Edges), |txn| {
            let coll = self.edges_collection(&page_id);
            let mut edges = coll.get_all::<Edge>(txn);
            f(&mut edges);
            coll.replace_all(txn, edges, |e: &Edge| e.id.0.clone());
        });
    }

    pub fn patch_edge_data(&self, patches: Vec<EdgeDataPatch>) {
        self.patch_edge_data_with_origin(Origin::User, patches);
    }

    /// Same as `patch_edge_data`, but tagged with an explicit origin. The
    /// edge-routing action (spec §4.5 `routeEdges`/`clearRoutes`) writes
    /// waypoints under `Origin::Layout`.
    pub(crate) fn patch_edge_data_with_origin(&self, origin: Origin, patches: Vec<EdgeDataPatch>) {
        let Some(page_id) = self.active_page_id() else { return };
        self.mutate(origin, Some(Topic::Edges), |txn| {
            let coll = self.edges_collection(&page_id);
            for patch in &patches {
                let Some(mut edge) = coll.get::<Edge>(txn, patch.id.as_str()) else {
                    tracing::debug!(edge_id = %patch.id, "patchEdgeData: unknown id, skipped");
                    continue;
                };
                let mut data_json = serde_json::to_value(&edge.data).unwrap_or(serde_json::Value::Object(Default::default()));
                if let serde_json::Value::Object(fields) = &mut data_json {
                    for (key, value) in &patch.data {
                        match value {
                            Some(value) => {
                                fields.insert(key.clone(), value.clone());
                            }
                            None => {
                                fields.remove(key);
                            }
                        }
                    }
                }
                if let Ok(new_data) = serde_json::from_value::<EdgeData>(data_json) {
                    edge.data = new_data;
                    coll.upsert(txn, patch.id.as_str(), &edge);
                }
            }
        });
    }

    // ---- pin constraints, explicitly page-scoped (spec §3, §4.1) ----

    pub fn list_pin_constraints(&self, page_id: &PageId) -> Vec<PinConstraint> {
        let txn = self.store.transact();
        store::array_get_all(&self.pins_array(page_id), &txn)
    }

    pub fn add_pin_constraint(&self, page_id: &PageId, constraint: PinConstraint) {
        self.mutate(Origin::User, None, |txn| {
            let array = self.pins_array(page_id);
            let mut constraints: Vec<PinConstraint> = store::array_get_all(&array, txn);
            constraints.push(constraint);
            store::array_set_all(&array, txn, &constraints);
        });
    }

    pub fn remove_pin_constraint(&self, page_id: &PageId, constraint_id: &crate::ids::PinConstraintId) -> bool {
        self.mutate(Origin::User, None, |txn| {
            let array = self.pins_array(page_id);
            let mut constraints: Vec<PinConstraint> = store::array_get_all(&array, txn);
            let before = constraints.len();
            constraints.retain(|c| &c.id != constraint_id);
            let removed = constraints.len() != before;
            if removed {
                store::array_set_all(&array, txn, &constraints);
            }
            removed
        })
    }

    // ---- deployables, per-page (spec §3) ----

    pub fn get_deployables(&self, page_id: &PageId) -> Vec<Deployable> {
        let txn = self.store.transact();
        self.deployables_collection(page_id).get_all(&txn)
    }

    pub fn set_deployables(&self, page_id: &PageId, deployables: Vec<Deployable>) {
        self.mutate(Origin::User, Some(Topic::Deployables), |txn| {
            self.deployables_collection(page_id).replace_all(txn, deployables, |d: &Deployable| d.id.0.clone());
        });
    }

    pub fn add_deployable(&self, page_id: &PageId, deployable: Deployable) {
        self.mutate(Origin::User, Some(Topic::Deployables), |txn| {
            let id = deployable.id.0.clone();
            self.deployables_collection(page_id).upsert(txn, &id, &deployable);
        });
    }

    pub fn remove_deployable(&self, page_id: &PageId, id: &DeployableId) -> bool {
        self.mutate(Origin::User, Some(Topic::Deployables), |txn| self.deployables_collection(page_id).remove(txn, id.as_str()))
    }

    // ---- schema registries (document-level; spec §4.1, §6) ----

    registry_ops!(get_schemas, get_schema, set_schemas, add_schema, update_schema, remove_schema, schemas, Schema, SchemaId, Topic::Schemas);
    registry_ops!(
        get_port_schemas,
        get_port_schema,
        set_port_schemas,
        add_port_schema,
        update_port_schema,
        remove_port_schema,
        port_schemas,
        PortSchema,
        PortSchemaId,
        Topic::PortSchemas
    );
    registry_ops!(
        get_schema_groups,
        get_schema_group,
        set_schema_groups,
        add_schema_group,
        update_schema_group,
        remove_schema_group,
        schema_groups,
        SchemaGroup,
        SchemaGroupId,
        Topic::SchemaGroups
    );

    // `schema_packages` and `schema_relationships` have no dedicated
    // subscription topic in spec §4.1's granular list, so their mutations
    // only ever flip `any_change` — the general subscriber still fires.

    pub fn get_schema_packages(&self) -> Vec<SchemaPackage> {
        let txn = self.store.transact();
        self.schema_packages.get_all(&txn)
    }

    pub fn get_schema_package(&self, id: &SchemaPackageId) -> Option<SchemaPackage> {
        let txn = self.store.transact();
        self.schema_packages.get(&txn, id.as_str())
    }

    pub fn set_schema_packages(&self, packages: Vec<SchemaPackage>) {
        self.mutate(Origin::User, None, |txn| {
            self.schema_packages.replace_all(txn, packages, |p: &SchemaPackage| p.id.0.clone());
        });
    }

    pub fn add_schema_package(&self, package: SchemaPackage) {
        self.mutate(Origin::User, None, |txn| {
            let id = package.id.0.clone();
            self.schema_packages.upsert(txn, &id, &package);
        });
    }

    pub fn remove_schema_package(&self, id: &SchemaPackageId) -> bool {
        self.mutate(Origin::User, None, |txn| self.schema_packages.remove(txn, id.as_str()))
    }

    pub fn get_schema_relationships(&self) -> Vec<SchemaRelationship> {
        let txn = self.store.transact();
        self.schema_relationships.get_all(&txn)
    }

    pub fn set_schema_relationships(&self, relationships: Vec<SchemaRelationship>) {
        self.mutate(Origin::User, None, |txn| {
            self.schema_relationships.replace_all(txn, relationships, |r: &SchemaRelationship| r.id.0.clone());
        });
    }

    pub fn add_schema_relationship(&self, relationship: SchemaRelationship) {
        self.mutate(Origin::User, None, |txn| {
            let id = relationship.id.0.clone();
            self.schema_relationships.upsert(txn, &id, &relationship);
        });
    }

    pub fn remove_schema_relationship(&self, id: &SchemaRelationshipId) -> bool {
        self.mutate(Origin::User, None, |txn| self.schema_relationships.remove(txn, id.as_str()))
    }

    pub fn get_package_manifest(&self) -> Vec<PackageManifestEntry> {
        let txn = self.store.transact();
        store::array_get_all(&self.package_manifest, &txn)
    }

    pub fn set_package_manifest(&self, manifest: Vec<PackageManifestEntry>) {
        self.mutate(Origin::User, Some(Topic::PackageManifest), |txn| {
            store::array_set_all(&self.package_manifest, txn, &manifest);
        });
    }

    // ---- whole-document snapshot (spec §6 `toJSON`) ----

    pub fn snapshot(&self) -> Document {
        let txn = self.store.transact();
        let meta = self.get_meta(&txn);
        let page_metas: Vec<PageMeta> = self.pages.get_all(&txn);
        let schemas = self.schemas.get_all::<Schema>(&txn);
        let port_schemas = self.port_schemas.get_all::<PortSchema>(&txn);
        let schema_groups = self.schema_groups.get_all::<SchemaGroup>(&txn);
        let schema_packages = self.schema_packages.get_all::<SchemaPackage>(&txn);
        let schema_relationships = self.schema_relationships.get_all::<SchemaRelationship>(&txn);
        let package_manifest: Vec<PackageManifestEntry> = store::array_get_all(&self.package_manifest, &txn);
        drop(txn);

        Document {
            version: meta.version,
            title: meta.title,
            description: meta.description,
            pages: page_metas.iter().map(|m| self.assemble_page(m)).collect(),
            active_page_id: meta.active_page_id,
            schemas: schemas.into_iter().map(|s| (s.id.clone(), s)).collect(),
            port_schemas: port_schemas.into_iter().map(|p| (p.id.clone(), p)).collect(),
            schema_groups: schema_groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
            schema_packages: schema_packages.into_iter().map(|p| (p.id.clone(), p)).collect(),
            schema_relationships: schema_relationships.into_iter().map(|r| (r.id.clone(), r)).collect(),
            package_manifest,
            migration_version: meta.migration_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{ConstructData, NodeData};

    fn sample_construct(id: &str) -> Node {
        Node {
            id: NodeId::new(id),
            position: Point::new(0.0, 0.0),
            parent_id: None,
            width: None,
            height: None,
            style_size: None,
            measured: None,
            data: NodeData::Construct(ConstructData {
                construct_type: "service".into(),
                semantic_id: id.into(),
                values: Default::default(),
                connections: Vec::new(),
                deployable_id: None,
            }),
        }
    }

    #[test]
    fn first_created_page_becomes_active() {
        let adapter = DocumentAdapter::new("doc");
        assert!(adapter.active_page_id().is_none());
        let page = adapter.create_page("main");
        assert_eq!(adapter.active_page_id(), Some(page.id));
    }

    #[test]
    fn nodes_round_trip_through_active_page() {
        let adapter = DocumentAdapter::new("doc");
        adapter.create_page("main");
        adapter.set_nodes(vec![sample_construct("n1"), sample_construct("n2")]);
        let nodes = adapter.get_nodes();
        assert_eq!(nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(), vec!["n1", "n2"]);
    }

    #[test]
    fn patch_nodes_skips_unknown_ids_silently() {
        let adapter = DocumentAdapter::new("doc");
        adapter.create_page("main");
        adapter.set_nodes(vec![sample_construct("n1")]);
        adapter.patch_nodes(vec![
            NodePositionStylePatch { id: NodeId::new("n1"), position: Some(Point::new(5.0, 5.0)), style_size: None },
            NodePositionStylePatch { id: NodeId::new("missing"), position: Some(Point::new(1.0, 1.0)), style_size: None },
        ]);
        let nodes = adapter.get_nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].position, Point::new(5.0, 5.0));
    }

    #[test]
    fn update_node_rejects_a_parent_id_cycle() {
        let adapter = DocumentAdapter::new("doc");
        adapter.create_page("main");
        let a = sample_construct("a");
        let mut b = sample_construct("b");
        b.parent_id = Some(NodeId::new("a"));
        adapter.set_nodes(vec![a, b]);

        let result = adapter.update_node(&NodeId::new("a"), NodePatch { parent_id: Some(Some(NodeId::new("b"))), ..Default::default() });
        assert!(matches!(result, Err(CoreError::InvariantViolation(_))));

        // The rejected write never touched the store.
        let nodes = adapter.get_nodes();
        assert_eq!(nodes.iter().find(|n| n.id == NodeId::new("a")).unwrap().parent_id, None);
    }

    #[test]
    fn nested_transactions_notify_once() {
        let adapter = DocumentAdapter::new("doc");
        adapter.create_page("main");
        let count = std::rc::Rc::new(Cell::new(0));
        {
            let count = count.clone();
            adapter.subscribe(move || count.set(count.get() + 1));
        }
        adapter.transaction(Origin::User, || {
            adapter.set_nodes(vec![sample_construct("n1")]);
            adapter.set_nodes(vec![sample_construct("n1"), sample_construct("n2")]);
        });
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn delete_page_clears_its_nodes_and_active_pointer() {
        let adapter = DocumentAdapter::new("doc");
        let page = adapter.create_page("main");
        adapter.set_nodes(vec![sample_construct("n1")]);
        assert!(adapter.delete_page(&page.id));
        assert!(adapter.active_page_id().is_none());
        assert!(adapter.get_pages().is_empty());
    }

    #[test]
    fn set_active_page_rejects_unknown_id() {
        let adapter = DocumentAdapter::new("doc");
        let result = adapter.set_active_page(&PageId::new("nope"));
        assert!(matches!(result, Err(CoreError::UnknownId { kind: "page", .. })));
    }

    #[test]
    fn patch_edge_data_applies_upsert_and_delete() {
        let adapter = DocumentAdapter::new("doc");
        adapter.create_page("main");
        adapter.set_nodes(vec![sample_construct("n1"), sample_construct("n2")]);
        adapter.set_edges(vec![Edge {
            id: EdgeId::new("e1"),
            source: NodeId::new("n1"),
            target: NodeId::new("n2"),
            source_handle: None,
            target_handle: None,
            data: EdgeData { label: Some("old".into()), ..Default::default() },
        }]);
        let mut patch = serde_json::Map::new();
        patch.insert("label".to_string(), None);
        patch.insert("bundleCount".to_string(), Some(serde_json::json!(3)));
        adapter.patch_edge_data(vec![EdgeDataPatch { id: EdgeId::new("e1"), data: patch }]);
        let edges = adapter.get_edges();
        assert_eq!(edges[0].data.label, None);
        assert_eq!(edges[0].data.bundle_count, Some(3));
    }
}
