//! Layout resolution: the single pass that assigns node and group
//! rectangles within the canvas.
//!
//! Groups flow along the main axis of the diagram direction; nodes flow
//! across it inside their group. Nodes that carry explicit geometry from
//! the input document are left untouched. The pass is deterministic and
//! owns all writes to geometry fields; every other component only reads.

pub mod config;
pub mod routing;

pub use config::LayoutConfig;
pub use routing::{route_edge, RouteRequest, RoutedEdge, RoutingMode};

use crate::geometry::Rect;
use crate::spec::{DiagramSpec, Direction};

/// Resolve geometry for every node and group in the spec.
pub fn resolve(spec: &mut DiagramSpec, config: &LayoutConfig) {
    let order: Vec<usize> = match spec.direction {
        Direction::BottomToTop => (0..spec.groups.len()).rev().collect(),
        _ => (0..spec.groups.len()).collect(),
    };

    match spec.direction {
        Direction::TopToBottom | Direction::BottomToTop => {
            resolve_vertical_flow(spec, config, &order)
        }
        Direction::LeftToRight => resolve_horizontal_flow(spec, config, &order),
    }

    spec.mark_layout_resolved();
}

/// Groups stacked top to bottom, nodes in a row inside each group.
fn resolve_vertical_flow(spec: &mut DiagramSpec, config: &LayoutConfig, order: &[usize]) {
    let (node_w, node_h) = config.node_size;
    let mut cursor = config.group_gap;

    for &gix in order {
        let children = spec.groups[gix].children.clone();
        let count = children.len();
        let row_w = count as f64 * node_w + count.saturating_sub(1) as f64 * config.node_gap;
        let x0 = (spec.canvas_w - row_w) / 2.0;
        let node_y = cursor + config.group_label_height + config.group_padding;

        for (i, &nix) in children.iter().enumerate() {
            if spec.nodes[nix].explicit_geometry {
                continue;
            }
            spec.nodes[nix].rect = Rect::new(
                x0 + i as f64 * (node_w + config.node_gap),
                node_y,
                node_w,
                node_h,
            );
        }

        let rect = group_rect(spec, gix, config, cursor);
        spec.groups[gix].rect = rect;
        cursor = rect.bottom() + config.group_gap;
    }
}

/// Groups flowing left to right, nodes in a column inside each group.
fn resolve_horizontal_flow(spec: &mut DiagramSpec, config: &LayoutConfig, order: &[usize]) {
    let (node_w, node_h) = config.node_size;
    let mut cursor = config.group_gap;

    for &gix in order {
        let children = spec.groups[gix].children.clone();
        let count = children.len();
        let col_h = count as f64 * node_h + count.saturating_sub(1) as f64 * config.node_gap;
        let y0 = (spec.canvas_h - col_h) / 2.0;
        let node_x = cursor + config.group_padding;

        for (i, &nix) in children.iter().enumerate() {
            if spec.nodes[nix].explicit_geometry {
                continue;
            }
            spec.nodes[nix].rect = Rect::new(
                node_x,
                y0 + i as f64 * (node_h + config.node_gap),
                node_w,
                node_h,
            );
        }

        let rect = group_rect(spec, gix, config, cursor);
        spec.groups[gix].rect = rect;
        cursor = rect.right() + config.group_gap;
    }
}

/// Group bounding rectangle: the padded union of its children plus label
/// headroom. Empty groups get a label-sized placeholder at the cursor.
fn group_rect(spec: &DiagramSpec, gix: usize, config: &LayoutConfig, cursor: f64) -> Rect {
    let group = &spec.groups[gix];
    let mut bounds: Option<Rect> = None;
    for &nix in &group.children {
        let r = spec.nodes[nix].rect;
        bounds = Some(match bounds {
            Some(b) => b.union(&r),
            None => r,
        });
    }

    match bounds {
        Some(b) => {
            let mut rect = b.expand(config.group_padding);
            rect.y -= config.group_label_height;
            rect.h += config.group_label_height;
            rect
        }
        None => {
            let (node_w, _) = config.node_size;
            Rect::new(
                (spec.canvas_w - node_w) / 2.0,
                cursor,
                node_w,
                config.group_label_height + 2.0 * config.group_padding,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::DiagramSpec;

    fn spec_from(json: &str) -> DiagramSpec {
        DiagramSpec::from_json(json, (1200.0, 900.0)).expect("valid spec")
    }

    fn two_stage_spec() -> DiagramSpec {
        spec_from(
            r#"{
                "direction": "top-to-bottom",
                "groups": [
                    {"id": "g1", "label": "First", "children": [
                        {"id": "a"}, {"id": "b"}
                    ]},
                    {"id": "g2", "label": "Second", "children": [{"id": "c"}]}
                ],
                "edges": [{"from": "a", "to": "c"}]
            }"#,
        )
    }

    #[test]
    fn test_resolve_assigns_all_rects() {
        let mut spec = two_stage_spec();
        resolve(&mut spec, &LayoutConfig::default());

        assert!(spec.is_layout_resolved());
        for node in &spec.nodes {
            assert!(node.rect.w > 0.0 && node.rect.h > 0.0, "node {} unsized", node.id);
        }
    }

    #[test]
    fn test_groups_contain_children_with_padding() {
        let mut spec = two_stage_spec();
        let config = LayoutConfig::default();
        resolve(&mut spec, &config);

        for group in &spec.groups {
            for &nix in &group.children {
                let n = spec.nodes[nix].rect;
                let g = group.rect;
                assert!(g.x <= n.x - config.group_padding + 1e-9);
                assert!(g.right() >= n.right() + config.group_padding - 1e-9);
                assert!(g.bottom() >= n.bottom() + config.group_padding - 1e-9);
            }
        }
    }

    #[test]
    fn test_groups_stack_without_overlap() {
        let mut spec = two_stage_spec();
        resolve(&mut spec, &LayoutConfig::default());
        assert!(spec.groups[0].rect.bottom() < spec.groups[1].rect.y);
    }

    #[test]
    fn test_bottom_to_top_reverses_group_order() {
        let mut down = spec_from(
            r#"{"direction": "top-to-bottom", "groups": [
                {"id": "g1", "children": [{"id": "a"}]},
                {"id": "g2", "children": [{"id": "b"}]}
            ]}"#,
        );
        let mut up = spec_from(
            r#"{"direction": "bottom-to-top", "groups": [
                {"id": "g1", "children": [{"id": "a"}]},
                {"id": "g2", "children": [{"id": "b"}]}
            ]}"#,
        );
        let config = LayoutConfig::default();
        resolve(&mut down, &config);
        resolve(&mut up, &config);

        // Flowing upward, the first group lands below the second.
        assert!(down.groups[0].rect.y < down.groups[1].rect.y);
        assert!(up.groups[0].rect.y > up.groups[1].rect.y);
    }

    #[test]
    fn test_left_to_right_flows_horizontally() {
        let mut spec = spec_from(
            r#"{"direction": "left-to-right", "groups": [
                {"id": "g1", "children": [{"id": "a"}, {"id": "b"}]},
                {"id": "g2", "children": [{"id": "c"}]}
            ]}"#,
        );
        resolve(&mut spec, &LayoutConfig::default());

        assert!(spec.groups[0].rect.right() < spec.groups[1].rect.x);
        // Nodes in a group stack vertically.
        let a = spec.node_by_id("a").unwrap().rect;
        let b = spec.node_by_id("b").unwrap().rect;
        assert_eq!(a.x, b.x);
        assert!(a.bottom() < b.y);
    }

    #[test]
    fn test_explicit_geometry_untouched() {
        let mut spec = spec_from(
            r#"{"groups": [{"id": "g", "children": [
                {"id": "pinned", "x": 30, "y": 40, "w": 90, "h": 50},
                {"id": "free"}
            ]}]}"#,
        );
        resolve(&mut spec, &LayoutConfig::default());
        let pinned = spec.node_by_id("pinned").unwrap();
        assert_eq!(pinned.rect, Rect::new(30.0, 40.0, 90.0, 50.0));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut spec = two_stage_spec();
        let config = LayoutConfig::default();
        resolve(&mut spec, &config);
        let first: Vec<Rect> = spec.nodes.iter().map(|n| n.rect).collect();
        resolve(&mut spec, &config);
        let second: Vec<Rect> = spec.nodes.iter().map(|n| n.rect).collect();
        assert_eq!(first, second);
    }
}
