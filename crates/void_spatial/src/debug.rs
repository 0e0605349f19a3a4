//! BVH debug visualization
//!
//! Emits one box draw call per visited node into an external immediate-mode
//! renderer. What gets drawn is controlled by three integer toggles:
//!
//! | Toggle                 | Meaning                                        |
//! |------------------------|------------------------------------------------|
//! | `debug_bvh_mode`       | 0-1 off, 2 tree, 3 tree + objects, 4 one node  |
//! | `debug_bvh_maxdepth`   | stop descending at this depth                  |
//! | `debug_bvh_node_index` | node drawn in single-node mode                 |
//!
//! Missing toggles draw everything.
//!
//! # Example
//!
//! ```ignore
//! use void_core::ToggleTable;
//! use void_spatial::{draw_bvh, Bvh, BvhDebugSettings};
//!
//! let mut toggles = ToggleTable::new();
//! toggles.set("debug_bvh_mode", 2).set("debug_bvh_maxdepth", 4);
//!
//! let settings = BvhDebugSettings::from_toggles(&toggles);
//! draw_bvh(&bvh, &boxes, &settings, &mut renderer);
//! ```

use serde::{Deserialize, Serialize};
use void_core::ToggleSource;
use void_math::{Vec3, AABB};

use crate::bvh::Bvh;

/// Toggle selecting the draw mode
pub const MODE_TOGGLE: &str = "debug_bvh_mode";
/// Toggle limiting tree depth
pub const MAX_DEPTH_TOGGLE: &str = "debug_bvh_maxdepth";
/// Toggle picking the node for single-node mode
pub const NODE_INDEX_TOGGLE: &str = "debug_bvh_node_index";

/// How a box is rasterized
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderMode {
    Solid,
    WireFrame,
}

/// Immediate-mode box renderer
pub trait DebugDraw {
    /// Draw an axis-aligned box with full extents `size` around `center`
    fn draw_box(&mut self, center: Vec3, size: Vec3, color: [f32; 4], mode: RenderMode);
}

/// What to draw
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BvhDrawMode {
    Off,
    /// Node boxes down to the depth limit
    Tree,
    /// Node boxes plus every primitive's box and a marker at its center
    #[default]
    TreeAndObjects,
    /// A single node
    SingleNode,
}

impl BvhDrawMode {
    /// Interpret the raw mode toggle
    pub fn from_toggle(value: Option<i64>) -> Self {
        match value {
            None => Self::default(),
            Some(4) => Self::SingleNode,
            Some(v) if v > 2 => Self::TreeAndObjects,
            Some(2) => Self::Tree,
            Some(_) => Self::Off,
        }
    }
}

/// Visualization settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhDebugSettings {
    pub mode: BvhDrawMode,
    /// Nodes at this depth and below are not drawn. `None` draws all levels.
    pub max_depth: Option<u32>,
    /// Node for [`BvhDrawMode::SingleNode`], clamped to the last used node
    pub node_index: usize,
    pub node_color: [f32; 4],
    pub marker_color: [f32; 4],
    /// Half-size of the marker drawn at each primitive center
    pub marker_size: f32,
    /// Primitive box colors, cycled by primitive index
    pub object_colors: [[f32; 4]; 8],
}

impl Default for BvhDebugSettings {
    fn default() -> Self {
        Self {
            mode: BvhDrawMode::default(),
            max_depth: None,
            node_index: 0,
            node_color: [1.0, 1.0, 1.0, 1.0],
            marker_color: [1.0, 1.0, 1.0, 1.0],
            marker_size: 0.015,
            object_colors: [
                [1.0, 0.3, 0.3, 1.0],
                [0.3, 1.0, 0.3, 1.0],
                [0.3, 0.3, 1.0, 1.0],
                [1.0, 1.0, 0.3, 1.0],
                [1.0, 0.3, 1.0, 1.0],
                [0.3, 1.0, 1.0, 1.0],
                [1.0, 0.6, 0.2, 1.0],
                [0.6, 0.4, 1.0, 1.0],
            ],
        }
    }
}

impl BvhDebugSettings {
    /// Read the three toggles, keeping defaults for any that are missing.
    /// A negative depth means unlimited; a negative node index means 0.
    pub fn from_toggles(toggles: &impl ToggleSource) -> Self {
        Self {
            mode: BvhDrawMode::from_toggle(toggles.read_int(MODE_TOGGLE)),
            max_depth: toggles
                .read_int(MAX_DEPTH_TOGGLE)
                .and_then(|d| u32::try_from(d).ok()),
            node_index: toggles
                .read_int(NODE_INDEX_TOGGLE)
                .map_or(0, |i| usize::try_from(i).unwrap_or(0)),
            ..Default::default()
        }
    }

    fn object_color(&self, prim: usize) -> [f32; 4] {
        self.object_colors[prim % self.object_colors.len()]
    }
}

fn draw_aabb(draw: &mut impl DebugDraw, aabb: &AABB, color: [f32; 4], mode: RenderMode) {
    draw.draw_box(aabb.center(), aabb.size(), color, mode);
}

/// Draw a BVH and, depending on the mode, the boxes it was built from.
/// Returns the number of draw calls issued.
pub fn draw_bvh(bvh: &Bvh, objects: &[AABB], settings: &BvhDebugSettings, draw: &mut impl DebugDraw) -> usize {
    let mut calls = 0;

    match settings.mode {
        BvhDrawMode::Off => {}
        BvhDrawMode::SingleNode => {
            if let Some(last) = bvh.nodes_used().checked_sub(1) {
                let node = &bvh.nodes()[settings.node_index.min(last)];
                draw_aabb(draw, &node.bounds, settings.node_color, RenderMode::WireFrame);
                calls += 1;
            }
        }
        BvhDrawMode::Tree | BvhDrawMode::TreeAndObjects => {
            if settings.mode == BvhDrawMode::TreeAndObjects {
                let marker = Vec3::splat(settings.marker_size * 2.0);
                for aabb in objects {
                    draw.draw_box(aabb.center(), marker, settings.marker_color, RenderMode::Solid);
                }
                for (prim, aabb) in objects.iter().enumerate() {
                    draw_aabb(draw, aabb, settings.object_color(prim), RenderMode::WireFrame);
                }
                calls += objects.len() * 2;
            }

            bvh.walk(|_, node, depth| {
                if settings.max_depth.map_or(false, |max| depth >= max) {
                    return false;
                }
                draw_aabb(draw, &node.bounds, settings.node_color, RenderMode::WireFrame);
                calls += 1;
                true
            });
        }
    }

    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_core::{NoToggles, ToggleTable};

    #[derive(Default)]
    struct Recorder {
        boxes: Vec<(Vec3, Vec3, RenderMode)>,
    }

    impl DebugDraw for Recorder {
        fn draw_box(&mut self, center: Vec3, size: Vec3, _color: [f32; 4], mode: RenderMode) {
            self.boxes.push((center, size, mode));
        }
    }

    fn scene() -> (Bvh, Vec<AABB>) {
        let boxes: Vec<_> = [0.0, 1.0, 50.0, 51.0]
            .iter()
            .map(|&x| AABB::from_center_half_extents(Vec3::new(x, 0.0, 0.0), Vec3::splat(0.5)))
            .collect();
        (Bvh::build(&boxes), boxes)
    }

    #[test]
    fn test_mode_toggle_values() {
        assert_eq!(BvhDrawMode::from_toggle(None), BvhDrawMode::TreeAndObjects);
        assert_eq!(BvhDrawMode::from_toggle(Some(0)), BvhDrawMode::Off);
        assert_eq!(BvhDrawMode::from_toggle(Some(1)), BvhDrawMode::Off);
        assert_eq!(BvhDrawMode::from_toggle(Some(2)), BvhDrawMode::Tree);
        assert_eq!(BvhDrawMode::from_toggle(Some(3)), BvhDrawMode::TreeAndObjects);
        assert_eq!(BvhDrawMode::from_toggle(Some(4)), BvhDrawMode::SingleNode);
        assert_eq!(BvhDrawMode::from_toggle(Some(9)), BvhDrawMode::TreeAndObjects);
    }

    #[test]
    fn test_missing_toggles_draw_everything() {
        let (bvh, boxes) = scene();
        let settings = BvhDebugSettings::from_toggles(&NoToggles);
        assert_eq!(settings.max_depth, None);

        let mut recorder = Recorder::default();
        let calls = draw_bvh(&bvh, &boxes, &settings, &mut recorder);
        assert_eq!(calls, bvh.nodes_used() + boxes.len() * 2);
        assert_eq!(recorder.boxes.len(), calls);
    }

    #[test]
    fn test_depth_limit() {
        let (bvh, boxes) = scene();
        let mut toggles = ToggleTable::new();
        toggles.set(MODE_TOGGLE, 2).set(MAX_DEPTH_TOGGLE, 1);

        let mut recorder = Recorder::default();
        let calls = draw_bvh(&bvh, &boxes, &BvhDebugSettings::from_toggles(&toggles), &mut recorder);
        assert_eq!(calls, 1);
        assert_eq!(recorder.boxes[0].0, bvh.root_bounds().unwrap().center());

        toggles.set(MAX_DEPTH_TOGGLE, 0);
        let calls = draw_bvh(&bvh, &boxes, &BvhDebugSettings::from_toggles(&toggles), &mut recorder);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_single_node_is_clamped() {
        let (bvh, boxes) = scene();
        let mut toggles = ToggleTable::new();
        toggles.set(MODE_TOGGLE, 4).set(NODE_INDEX_TOGGLE, 1000);

        let mut recorder = Recorder::default();
        let calls = draw_bvh(&bvh, &boxes, &BvhDebugSettings::from_toggles(&toggles), &mut recorder);
        assert_eq!(calls, 1);

        let last = bvh.nodes()[bvh.nodes_used() - 1].bounds;
        assert_eq!(recorder.boxes[0], (last.center(), last.size(), RenderMode::WireFrame));
    }

    #[test]
    fn test_off_and_empty_tree_draw_nothing() {
        let (bvh, boxes) = scene();
        let mut toggles = ToggleTable::new();
        toggles.set(MODE_TOGGLE, 1);
        let mut recorder = Recorder::default();
        assert_eq!(draw_bvh(&bvh, &boxes, &BvhDebugSettings::from_toggles(&toggles), &mut recorder), 0);

        toggles.set(MODE_TOGGLE, 4);
        let empty = Bvh::new();
        assert_eq!(draw_bvh(&empty, &[], &BvhDebugSettings::from_toggles(&toggles), &mut recorder), 0);
        assert!(recorder.boxes.is_empty());
    }
}
