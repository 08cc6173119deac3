#![cfg_attr(docsrs, feature(doc_cfg))]
//! Point-and-plane locomotion over static triangle meshes.
//! Re-exports the mesh, index and driver types used by the demo binary and tests.
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod frame_links;
pub mod logging;
pub mod mesh;
pub mod numeric;
pub mod spatial;
pub mod triangle;
pub mod vector_math;
pub use constants::*;

// Re-export commonly used items
pub use config::{PhysicsSettings, SettingsError};
pub use driver::{
    displaced_location_of, find_on_segment_displacement, lift_off, location_of,
    segment_displacement_to_v3, AbsorbingHandler, Driver, EventHandler, InAir, OnSegment,
    Remainder, SlidingHandler, State, TransferOutcome,
};
pub use error::{ErrorKind, PointPlaneError};
pub use frame_links::FrameLinkContainer;
pub use logging::init as init_logging;
pub use mesh::{Attachment, LinkHandle, MeshArena, MeshLink, RegionId, Transfer};
pub use numeric::Tolerance;
pub use spatial::{Interval, ProjectedSpatialMap, ProjectionLine, SpatialPartitionMap};
pub use triangle::{LimitIntersection, Side, SideCrossing, Triangle};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use pointplane::prelude::*;
    //! ```

    pub use crate::driver::{Driver, EventHandler, InAir, OnSegment, Remainder, State};
    pub use crate::mesh::{LinkHandle, MeshArena, RegionId};
    pub use crate::triangle::{Side, Triangle};
    pub use crate::PhysicsSettings;
    pub use glam::{DVec2, DVec3};
}
