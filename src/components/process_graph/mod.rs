//! Process graph engine: hierarchy, tidy-tree layout, camera, scene,
//! canvas painting and exports, plus the Leptos component hosting them.

mod component;
mod config;
pub mod export;
mod hierarchy;
mod layout;
mod render;
pub mod scene;
mod state;
pub mod style;
mod types;
mod viewport;

pub use component::{ProcessGraphCanvas, ProcessGraphHandle};
pub use config::{CanvasConfig, EngineConfig, LayoutConfig, ViewportConfig};
pub use export::ExportFormat;
pub use hierarchy::{Tree, TreeNode};
pub use layout::{Connector, EdgeLabel, Layout, Link, Point, PositionedNode, Rect};
pub use scene::{Scene, SceneEdge, SceneNode};
pub use state::{GraphCommands, HoverState, PanState, ProcessGraphState};
pub use types::{Edge, Graph, Node, NodeKind};
pub use viewport::{ViewTransform, Viewport};
