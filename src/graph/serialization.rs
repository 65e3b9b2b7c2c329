//! Graph serialization for saving and loading.
//!
//! Nodes are addressed by a dense index assigned in visitation order when the
//! document is written; types by their position in the document's type table.
//! The format is closed: any field a record does not define fails the load.

use crate::catalog::HookCatalog;
use crate::core::config::DocumentConfig;
use crate::core::error::{BoundaryId, CodecError, CodecResult, GraphError, ModelSystemId, NodeId};
use crate::core::module::ModuleType;
use crate::core::types::Position;
use crate::graph::boundary::Boundary;
use crate::graph::link::{Endpoint, Link};
use crate::graph::model_system::ModelSystem;
use crate::graph::structure::StructureNode;
use indexmap::IndexSet;
use log::debug;
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Current document format version.
pub const FORMAT_VERSION: Version = Version::new(1, 0, 0);

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

/// Serializable representation of a node (Start or module).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub x: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub y: f64,
    /// Position in the document's type table. Absent for Start nodes.
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    /// Fields this record does not define.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

/// Serializable representation of a link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkRecord {
    /// Index of the origin node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<i64>,
    /// Name of the origin hook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<String>,
    /// Index of the destination node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<i64>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

/// Serializable representation of a boundary and everything inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoundaryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub starts: Vec<NodeRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<NodeRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boundaries: Vec<BoundaryRecord>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

/// Serializable representation of a complete model system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelSystemDocument {
    /// Document format version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    /// Fully-qualified names of every module type used, referenced by position
    #[serde(default)]
    pub types: Vec<String>,
    /// The global boundary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryRecord>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

impl ModelSystemDocument {
    /// Create an empty document at the current format version.
    pub fn new() -> Self {
        Self {
            version: Some(FORMAT_VERSION),
            types: Vec::new(),
            boundary: Some(BoundaryRecord::default()),
            unknown: BTreeMap::new(),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize to compact JSON (no whitespace).
    pub fn to_json_compact(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for ModelSystemDocument {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Reads and writes model system documents.
#[derive(Debug, Clone, Copy)]
pub struct GraphCodec {
    pretty: bool,
}

impl GraphCodec {
    /// Create a codec that writes indented JSON.
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Create a codec from the document settings.
    pub fn from_config(config: &DocumentConfig) -> Self {
        Self {
            pretty: config.pretty,
        }
    }

    /// Write compact JSON instead.
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Build the document for a model system.
    pub fn encode(&self, model_system: &ModelSystem) -> CodecResult<ModelSystemDocument> {
        let mut indices = HashMap::new();
        for (index, node) in model_system.nodes().into_iter().enumerate() {
            indices.insert(node.id(), index as i64);
        }

        let mut writer = Writer {
            model_system,
            indices,
            types: IndexSet::new(),
        };
        let boundary = writer.boundary(model_system.global_boundary())?;

        Ok(ModelSystemDocument {
            version: Some(FORMAT_VERSION),
            types: writer.types.into_iter().collect(),
            boundary: Some(boundary),
            unknown: BTreeMap::new(),
        })
    }

    /// Rebuild a model system from a document.
    ///
    /// The result is either a complete model system or an error; nothing is
    /// installed anywhere on failure.
    pub fn decode(
        &self,
        id: ModelSystemId,
        document: ModelSystemDocument,
        catalog: &HookCatalog,
    ) -> CodecResult<ModelSystem> {
        reject_unknown("ModelSystem", &document.unknown)?;
        let version = document
            .version
            .ok_or_else(|| missing("ModelSystem", "Version"))?;
        if version.major != FORMAT_VERSION.major {
            return Err(CodecError::UnsupportedVersion {
                found: version.to_string(),
                expected: FORMAT_VERSION.to_string(),
            });
        }

        let types = document
            .types
            .iter()
            .map(|name| catalog.get(name).ok_or_else(|| CodecError::UnresolvedType(name.clone())))
            .collect::<CodecResult<Vec<_>>>()?;
        let root = document
            .boundary
            .ok_or_else(|| missing("ModelSystem", "Boundary"))?;

        let mut reader = Reader {
            types,
            model_system: ModelSystem::with_id(id),
            indices: HashMap::new(),
            pending_links: Vec::new(),
        };
        let global = reader.model_system.global_boundary();
        reader.boundary(global, root)?;
        reader.links()?;

        debug!(
            "Loaded model system {} with {} node(s) and {} link(s)",
            id,
            reader.model_system.node_count(),
            reader.model_system.link_count()
        );
        Ok(reader.model_system)
    }

    /// Serialize a model system to document bytes.
    pub fn to_bytes(&self, model_system: &ModelSystem) -> CodecResult<Vec<u8>> {
        let document = self.encode(model_system)?;
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&document)?
        } else {
            serde_json::to_vec(&document)?
        };
        Ok(bytes)
    }

    /// Deserialize a model system from document bytes.
    pub fn from_bytes(
        &self,
        id: ModelSystemId,
        bytes: &[u8],
        catalog: &HookCatalog,
    ) -> CodecResult<ModelSystem> {
        let document: ModelSystemDocument = serde_json::from_slice(bytes)?;
        self.decode(id, document, catalog)
    }
}

impl Default for GraphCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(record: &str, field: &str) -> CodecError {
    CodecError::MissingField {
        record: record.to_string(),
        field: field.to_string(),
    }
}

fn reject_unknown(record: &str, unknown: &BTreeMap<String, Value>) -> CodecResult<()> {
    match unknown.keys().next() {
        Some(field) => Err(CodecError::UnknownField {
            record: record.to_string(),
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

// ============================================================================
// Writer
// ============================================================================

struct Writer<'a> {
    model_system: &'a ModelSystem,
    indices: HashMap<NodeId, i64>,
    types: IndexSet<String>,
}

impl Writer<'_> {
    fn index(&self, node_id: NodeId) -> CodecResult<i64> {
        self.indices
            .get(&node_id)
            .copied()
            .ok_or(CodecError::Graph(GraphError::NodeNotFound(node_id)))
    }

    fn boundary(&mut self, id: BoundaryId) -> CodecResult<BoundaryRecord> {
        let model_system = self.model_system;
        let boundary = model_system.boundary(id)?;
        let mut record = BoundaryRecord {
            name: Some(boundary.name().to_string()),
            description: boundary.description().map(str::to_string),
            ..BoundaryRecord::default()
        };

        for node in boundary.nodes() {
            if !node.position().is_finite() {
                return Err(CodecError::InvalidPosition {
                    boundary: model_system.full_path(id)?,
                    name: node.name().to_string(),
                });
            }
            let mut node_record = NodeRecord {
                name: Some(node.name().to_string()),
                description: node.description().map(str::to_string),
                index: Some(self.index(node.id())?),
                x: node.position().x,
                y: node.position().y,
                disabled: node.is_disabled(),
                ..NodeRecord::default()
            };
            match node.type_name() {
                None => record.starts.push(node_record),
                Some(type_name) => {
                    let (type_id, _) = self.types.insert_full(type_name.to_string());
                    node_record.type_id = Some(type_id as i64);
                    node_record.parameter = node.parameter().map(str::to_string);
                    record.modules.push(node_record);
                }
            }
        }

        for link in boundary.links() {
            record.links.push(LinkRecord {
                origin: Some(self.index(link.origin.node_id)?),
                hook: Some(link.origin.hook_name.clone()),
                destination: Some(self.index(link.destination)?),
                unknown: BTreeMap::new(),
            });
        }

        for child in boundary.children() {
            record.boundaries.push(self.boundary(*child)?);
        }
        Ok(record)
    }
}

// ============================================================================
// Reader
// ============================================================================

struct Reader {
    types: Vec<Arc<ModuleType>>,
    model_system: ModelSystem,
    indices: HashMap<i64, NodeId>,
    pending_links: Vec<LinkRecord>,
}

impl Reader {
    fn boundary(&mut self, id: BoundaryId, record: BoundaryRecord) -> CodecResult<()> {
        reject_unknown("Boundary", &record.unknown)?;
        let path = self.model_system.full_path(id)?;
        self.model_system
            .boundary_mut(id)?
            .set_description(record.description);

        let mut placed = Vec::with_capacity(record.starts.len() + record.modules.len());
        for start in record.starts {
            placed.push(self.start(&path, start)?);
        }
        for module in record.modules {
            placed.push(self.module(&path, module)?);
        }
        // Visitation order is index order.
        placed.sort_by_key(|(index, _)| *index);
        for (_, node) in placed {
            self.model_system.insert_node(id, usize::MAX, node)?;
        }

        self.pending_links.extend(record.links);

        for child in record.boundaries {
            let name = child
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .ok_or_else(|| CodecError::MissingName {
                    boundary: path.clone(),
                })?;
            if self.model_system.child_named(id, &name).is_some() {
                return Err(GraphError::DuplicateBoundary {
                    parent: path.clone(),
                    name,
                }
                .into());
            }
            let child_id = self.model_system.allocate_boundary_id();
            self.model_system
                .attach_subtree(usize::MAX, vec![Boundary::new(child_id, name, Some(id))])?;
            self.boundary(child_id, child)?;
        }
        Ok(())
    }

    /// Validate a record's name and index and reserve a node handle for it.
    fn identify(&mut self, path: &str, record: &NodeRecord) -> CodecResult<(String, i64, NodeId)> {
        let name = record
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| CodecError::MissingName {
                boundary: path.to_string(),
            })?;
        let index = record
            .index
            .filter(|i| *i >= 0)
            .ok_or_else(|| CodecError::InvalidIndex {
                boundary: path.to_string(),
                name: name.clone(),
            })?;
        if self.indices.contains_key(&index) {
            return Err(CodecError::DuplicateIndex(index));
        }
        let node_id = self.model_system.allocate_node_id();
        self.indices.insert(index, node_id);
        Ok((name, index, node_id))
    }

    fn start(&mut self, path: &str, record: NodeRecord) -> CodecResult<(i64, StructureNode)> {
        reject_unknown("Start", &record.unknown)?;
        let unexpected = [
            ("Type", record.type_id.is_some()),
            ("Parameter", record.parameter.is_some()),
        ];
        if let Some((field, _)) = unexpected.iter().find(|(_, present)| *present) {
            return Err(CodecError::UnknownField {
                record: "Start".to_string(),
                field: field.to_string(),
            });
        }

        let (name, index, node_id) = self.identify(path, &record)?;
        let mut node = StructureNode::start(
            node_id,
            name,
            record.description,
            Position::new(record.x, record.y),
        );
        node.set_disabled(record.disabled);
        Ok((index, node))
    }

    fn module(&mut self, path: &str, record: NodeRecord) -> CodecResult<(i64, StructureNode)> {
        reject_unknown("Module", &record.unknown)?;
        let (name, index, node_id) = self.identify(path, &record)?;

        let type_id = record.type_id.ok_or_else(|| CodecError::InvalidType {
            boundary: path.to_string(),
            name: name.clone(),
            reason: "no type given".to_string(),
        })?;
        let module_type = usize::try_from(type_id)
            .ok()
            .and_then(|i| self.types.get(i))
            .cloned()
            .ok_or_else(|| CodecError::InvalidType {
                boundary: path.to_string(),
                name: name.clone(),
                reason: format!("type {} is not in the type table", type_id),
            })?;

        let mut node = StructureNode::module(node_id, name, module_type);
        node.set_description(record.description);
        node.set_position(Position::new(record.x, record.y));
        node.set_disabled(record.disabled);
        if let Some(literal) = record.parameter.filter(|p| !p.is_empty()) {
            node.check_parameter(&literal)?;
            node.set_parameter(Some(literal));
        }
        Ok((index, node))
    }

    /// Resolve link records once every node is known.
    fn links(&mut self) -> CodecResult<()> {
        for record in std::mem::take(&mut self.pending_links) {
            reject_unknown("Link", &record.unknown)?;
            let origin = self.resolve(record.origin, "Origin")?;
            let destination = self.resolve(record.destination, "Destination")?;
            let hook = record.hook.ok_or_else(|| missing("Link", "Hook"))?;

            let boundary = self.model_system.check_link(origin, &hook, destination)?;
            let link_id = self.model_system.allocate_link_id();
            let link = Link::new(link_id, Endpoint::new(origin, hook), destination);
            self.model_system.insert_link(boundary, usize::MAX, link)?;
        }
        Ok(())
    }

    fn resolve(&self, index: Option<i64>, field: &str) -> CodecResult<NodeId> {
        let index = index.ok_or_else(|| missing("Link", field))?;
        self.indices
            .get(&index)
            .copied()
            .ok_or(CodecError::UnresolvedReference(index))
    }
}
