//! Configuration for layout resolution and routing.

/// Configuration options for the geometry resolution pass and the router.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Canvas size used when the spec document declares none.
    pub default_canvas: (f64, f64),

    /// Default size for nodes (width, height).
    pub node_size: (f64, f64),

    /// Spacing between sibling nodes within a group.
    pub node_gap: f64,

    /// Spacing between groups along the flow axis.
    pub group_gap: f64,

    /// Padding between a group's bounding rectangle and its children.
    pub group_padding: f64,

    /// Headroom reserved at the top of a group for its label.
    pub group_label_height: f64,

    /// Padding added around obstacle rectangles during routing.
    pub obstacle_padding: f64,

    /// Step size for the router's mid-line candidate sweep.
    pub route_step: f64,

    /// Mid-line sweep extent, in steps, on each side of the midpoint.
    pub route_sweep: usize,

    /// Escape distance before a corridor candidate turns.
    pub corridor_escape: f64,

    /// Margin kept between corridor candidates and the canvas edge.
    pub corridor_margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_canvas: (1200.0, 900.0),
            node_size: (160.0, 60.0),
            node_gap: 24.0,
            group_gap: 48.0,
            group_padding: 16.0,
            group_label_height: 24.0,
            obstacle_padding: 8.0,
            route_step: 24.0,
            route_sweep: 16,
            corridor_escape: 20.0,
            corridor_margin: 16.0,
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default node size.
    pub fn with_node_size(mut self, width: f64, height: f64) -> Self {
        self.node_size = (width, height);
        self
    }

    /// Set the fallback canvas size.
    pub fn with_canvas(mut self, width: f64, height: f64) -> Self {
        self.default_canvas = (width, height);
        self
    }

    /// Set the spacing between nodes.
    pub fn with_node_gap(mut self, gap: f64) -> Self {
        self.node_gap = gap;
        self
    }

    /// Set the obstacle padding used during routing.
    pub fn with_obstacle_padding(mut self, pad: f64) -> Self {
        self.obstacle_padding = pad;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayoutConfig::default();
        assert_eq!(config.node_size, (160.0, 60.0));
        assert_eq!(config.default_canvas, (1200.0, 900.0));
        assert_eq!(config.route_sweep, 16);
    }

    #[test]
    fn test_builder_pattern() {
        let config = LayoutConfig::new()
            .with_node_size(120.0, 48.0)
            .with_node_gap(30.0)
            .with_obstacle_padding(12.0);

        assert_eq!(config.node_size, (120.0, 48.0));
        assert_eq!(config.node_gap, 30.0);
        assert_eq!(config.obstacle_padding, 12.0);
    }
}
