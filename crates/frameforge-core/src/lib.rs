//! FrameForge Core Library
//!
//! Scene graph, geometry, interaction and history engine for the FrameForge
//! design surface. Rendering lives in `frameforge-render`.

pub mod actions;
pub mod animation;
pub mod camera;
pub mod canvas;
pub mod config;
pub mod geometry;
pub mod history;
pub mod import;
pub mod input;
pub mod interaction;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod snap;
pub mod storage;
pub mod tools;
pub mod units;

pub use actions::{ActionBinding, ActionRegistry};
pub use animation::{Animator, CancelToken, Keyframe};
pub use camera::{Camera, MAX_ZOOM, MIN_ZOOM};
pub use canvas::Canvas;
pub use config::{CanvasConfig, ConfigError};
pub use geometry::{Layout, ScrollMetrics};
pub use history::{HistoryEntry, HistoryManager};
pub use import::{ImportError, ImportResult, parse_nodes};
pub use input::{KeyEvent, Modifiers, MouseButton, PointerEvent, Shortcut};
pub use interaction::InteractionState;
pub use scene::{ParentLookup, Scene};
pub use selection::{HandleKind, HandleMetrics, ManipulationState, MultiMoveState};
pub use shapes::{Node, NodeId, NodeKind, NodeType, ScrollDirection, Style, accepted_types};
pub use snap::{GRID_SIZE, Guide, GuideAxis, SnapMode, snap_to_grid};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, StorageResult};
pub use tools::{ToolKind, ToolManager};
pub use units::UnitResolver;
