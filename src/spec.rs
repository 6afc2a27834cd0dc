//! Spec model: the validated in-memory representation of a diagram.
//!
//! The input is a structured JSON document (groups of labeled nodes plus
//! the edges between them). Validation rejects structural problems —
//! duplicate ids, dangling edge references, malformed explicit geometry —
//! before any other component runs. After validation the model is an
//! arena of entities with id-to-index lookup maps; edges hold indices,
//! never references.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::Rect;

/// Primary flow direction of the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "top-to-bottom")]
    TopToBottom,
    #[serde(rename = "left-to-right")]
    LeftToRight,
    #[serde(rename = "bottom-to-top")]
    BottomToTop,
}

/// Visual category of a node. Controls palette and shape downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Primary,
    Secondary,
    Decision,
    Critical,
    Risk,
    Auxiliary,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Primary => "primary",
            NodeKind::Secondary => "secondary",
            NodeKind::Decision => "decision",
            NodeKind::Critical => "critical",
            NodeKind::Risk => "risk",
            NodeKind::Auxiliary => "auxiliary",
        }
    }

    pub fn all() -> [NodeKind; 6] {
        [
            NodeKind::Primary,
            NodeKind::Secondary,
            NodeKind::Decision,
            NodeKind::Critical,
            NodeKind::Risk,
            NodeKind::Auxiliary,
        ]
    }
}

/// Semantic hint on a node, independent of its visual kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Main,
    Support,
    Output,
    Risk,
    Header,
    Input,
    Method,
    Validate,
    Deploy,
    Compare,
}

/// Edge category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    #[default]
    Main,
    Aux,
    Risk,
    Custom,
}

/// Requested routing for an edge. `Auto` resolves to the configured
/// default at routing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    Straight,
    Orthogonal,
    #[default]
    Auto,
}

/// Container kind (v2 layout hint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    #[default]
    Stack,
    Panel,
    Swimlane,
    Custom,
}

// ── Input document ────────────────────────────────────────────────

/// Raw JSON document shape. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagramDoc {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub canvas: Option<CanvasDoc>,
    #[serde(default)]
    pub groups: Vec<GroupDoc>,
    #[serde(default)]
    pub edges: Vec<EdgeDoc>,
    #[serde(default)]
    pub containers: Vec<ContainerDoc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CanvasDoc {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupDoc {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub children: Vec<NodeDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeDoc {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub role: Option<NodeRole>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub w: Option<f64>,
    #[serde(default)]
    pub h: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeDoc {
    #[serde(default)]
    pub id: Option<String>,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub kind: EdgeKind,
    #[serde(default)]
    pub route: RouteMode,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub waypoints: Option<Vec<(f64, f64)>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerDoc {
    pub id: String,
    #[serde(default)]
    pub kind: ContainerKind,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub padding: Option<f64>,
}

// ── Validated model ───────────────────────────────────────────────

/// A single labeled box with resolved geometry.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub role: Option<NodeRole>,
    /// Index of the owning group in `DiagramSpec::groups`.
    pub group: usize,
    /// Only meaningful after layout resolution.
    pub rect: Rect,
    /// Geometry came from the input document and must not be rewritten.
    pub explicit_geometry: bool,
}

/// A labeled cluster of nodes with its own bounding rectangle.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: String,
    pub label: String,
    /// Indices into `DiagramSpec::nodes`, in document order.
    pub children: Vec<usize>,
    /// Only meaningful after layout resolution.
    pub rect: Rect,
}

/// A directed connector between two nodes, by arena index.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: String,
    pub from: usize,
    pub to: usize,
    pub kind: EdgeKind,
    pub route: RouteMode,
    pub label: Option<String>,
    pub waypoints: Option<Vec<(f64, f64)>>,
}

/// Layout hint grouping related nodes or groups.
#[derive(Debug, Clone)]
pub struct Container {
    pub id: String,
    pub kind: ContainerKind,
    pub children: Vec<String>,
    pub padding: Option<f64>,
}

/// The validated, immutable diagram model. The layout resolver is the
/// only writer of geometry fields; everything else reads.
#[derive(Debug, Clone)]
pub struct DiagramSpec {
    pub title: String,
    pub direction: Direction,
    pub canvas_w: f64,
    pub canvas_h: f64,
    pub nodes: Vec<Node>,
    pub groups: Vec<Group>,
    pub edges: Vec<Edge>,
    pub containers: Vec<Container>,
    node_index: HashMap<String, usize>,
    layout_resolved: bool,
}

/// Structural errors. These are precondition violations and fail the
/// whole evaluation; they are not part of the defect severity system.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("duplicate node id '{id}'")]
    DuplicateNodeId { id: String },

    #[error("duplicate group id '{id}'")]
    DuplicateGroupId { id: String },

    #[error("duplicate container id '{id}'")]
    DuplicateContainerId { id: String },

    #[error("edge '{edge}' references unknown node '{name}'{}", format_suggestions(suggestions))]
    UnknownEdgeEndpoint {
        edge: String,
        name: String,
        suggestions: Vec<String>,
    },

    #[error("container '{container}' references unknown id '{name}'{}", format_suggestions(suggestions))]
    UnknownContainerChild {
        container: String,
        name: String,
        suggestions: Vec<String>,
    },

    #[error("node '{id}' has malformed geometry: {reason}")]
    MalformedGeometry { id: String, reason: String },

    #[error("spec contains no nodes")]
    Empty,

    #[error("canvas dimensions must be positive, got {width}x{height}")]
    BadCanvas { width: f64, height: f64 },
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean {}?)", suggestions.join(", "))
    }
}

impl DiagramSpec {
    /// Validate a raw document and build the arena model. The default
    /// canvas applies when the document declares none.
    pub fn from_doc(doc: DiagramDoc, default_canvas: (f64, f64)) -> Result<Self, SpecError> {
        let (canvas_w, canvas_h) = match doc.canvas {
            Some(c) => (c.width, c.height),
            None => default_canvas,
        };
        if canvas_w <= 0.0 || canvas_h <= 0.0 {
            return Err(SpecError::BadCanvas {
                width: canvas_w,
                height: canvas_h,
            });
        }

        let mut nodes = Vec::new();
        let mut groups = Vec::new();
        let mut node_index = HashMap::new();
        let mut group_ids = HashSet::new();

        for group_doc in &doc.groups {
            if !group_ids.insert(group_doc.id.clone()) {
                return Err(SpecError::DuplicateGroupId {
                    id: group_doc.id.clone(),
                });
            }
            let group_ix = groups.len();
            let mut children = Vec::new();
            for node_doc in &group_doc.children {
                if node_index.contains_key(&node_doc.id) {
                    return Err(SpecError::DuplicateNodeId {
                        id: node_doc.id.clone(),
                    });
                }
                let (rect, explicit) = explicit_rect(node_doc)?;
                let node_ix = nodes.len();
                node_index.insert(node_doc.id.clone(), node_ix);
                children.push(node_ix);
                nodes.push(Node {
                    id: node_doc.id.clone(),
                    label: node_doc.label.clone(),
                    kind: node_doc.kind,
                    role: node_doc.role,
                    group: group_ix,
                    rect,
                    explicit_geometry: explicit,
                });
            }
            groups.push(Group {
                id: group_doc.id.clone(),
                label: group_doc.label.clone(),
                children,
                rect: Rect::default(),
            });
        }

        if nodes.is_empty() {
            return Err(SpecError::Empty);
        }

        let mut edges = Vec::new();
        for (i, edge_doc) in doc.edges.iter().enumerate() {
            let id = edge_doc
                .id
                .clone()
                .unwrap_or_else(|| format!("{}->{}#{}", edge_doc.from, edge_doc.to, i));
            let from = resolve_endpoint(&node_index, &id, &edge_doc.from)?;
            let to = resolve_endpoint(&node_index, &id, &edge_doc.to)?;
            edges.push(Edge {
                id,
                from,
                to,
                kind: edge_doc.kind,
                route: edge_doc.route,
                label: edge_doc.label.clone(),
                waypoints: edge_doc.waypoints.clone(),
            });
        }

        let mut container_ids = HashSet::new();
        let mut containers = Vec::new();
        for container_doc in &doc.containers {
            if !container_ids.insert(container_doc.id.clone()) {
                return Err(SpecError::DuplicateContainerId {
                    id: container_doc.id.clone(),
                });
            }
            for child in &container_doc.children {
                if !node_index.contains_key(child) && !group_ids.contains(child) {
                    let mut known: HashSet<String> = node_index.keys().cloned().collect();
                    known.extend(group_ids.iter().cloned());
                    return Err(SpecError::UnknownContainerChild {
                        container: container_doc.id.clone(),
                        name: child.clone(),
                        suggestions: find_similar(&known, child, 2),
                    });
                }
            }
            containers.push(Container {
                id: container_doc.id.clone(),
                kind: container_doc.kind,
                children: container_doc.children.clone(),
                padding: container_doc.padding,
            });
        }

        Ok(DiagramSpec {
            title: doc.title,
            direction: doc.direction,
            canvas_w,
            canvas_h,
            nodes,
            groups,
            edges,
            containers,
            node_index,
            layout_resolved: false,
        })
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str, default_canvas: (f64, f64)) -> Result<Self, ParseSpecError> {
        let doc: DiagramDoc = serde_json::from_str(json)?;
        Ok(Self::from_doc(doc, default_canvas)?)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&ix| &self.nodes[ix])
    }

    pub fn node_ix(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    /// Whether the layout pass has assigned geometry.
    pub fn is_layout_resolved(&self) -> bool {
        self.layout_resolved
    }

    /// Marked by the layout resolver once geometry fields are written.
    pub(crate) fn mark_layout_resolved(&mut self) {
        self.layout_resolved = true;
    }
}

/// Errors when building a spec from JSON text.
#[derive(Debug, Error)]
pub enum ParseSpecError {
    #[error("malformed spec document: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Spec(#[from] SpecError),
}

fn explicit_rect(node: &NodeDoc) -> Result<(Rect, bool), SpecError> {
    match (node.x, node.y, node.w, node.h) {
        (Some(x), Some(y), Some(w), Some(h)) => {
            if w < 0.0 || h < 0.0 {
                return Err(SpecError::MalformedGeometry {
                    id: node.id.clone(),
                    reason: format!("negative size {}x{}", w, h),
                });
            }
            if !(x.is_finite() && y.is_finite() && w.is_finite() && h.is_finite()) {
                return Err(SpecError::MalformedGeometry {
                    id: node.id.clone(),
                    reason: "non-finite coordinate".to_string(),
                });
            }
            Ok((Rect::new(x, y, w, h), true))
        }
        (None, None, None, None) => Ok((Rect::default(), false)),
        _ => Err(SpecError::MalformedGeometry {
            id: node.id.clone(),
            reason: "partial geometry: x, y, w, h must all be present or all absent".to_string(),
        }),
    }
}

fn resolve_endpoint(
    index: &HashMap<String, usize>,
    edge: &str,
    name: &str,
) -> Result<usize, SpecError> {
    index.get(name).copied().ok_or_else(|| {
        let known: HashSet<String> = index.keys().cloned().collect();
        SpecError::UnknownEdgeEndpoint {
            edge: edge.to_string(),
            name: name.to_string(),
            suggestions: find_similar(&known, name, 2),
        }
    })
}

/// Compute Levenshtein edit distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }

    dp[m][n]
}

/// Find similar identifiers within a maximum edit distance.
fn find_similar(defined: &HashSet<String>, target: &str, max_distance: usize) -> Vec<String> {
    let mut candidates: Vec<(String, usize)> = defined
        .iter()
        .filter_map(|name| {
            let dist = levenshtein_distance(name, target);
            if dist <= max_distance && dist > 0 {
                Some((name.clone(), dist))
            } else {
                None
            }
        })
        .collect();

    candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    candidates.into_iter().map(|(name, _)| name).take(3).collect()
}
