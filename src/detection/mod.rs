pub mod edges;
pub mod frame;
pub mod overlay;
pub mod preprocessing;
pub mod scale;
pub mod sizing;
pub mod stability;

pub use edges::{estimate_thickness, find_edge_peak, SearchBounds};
pub use frame::{build_frame, hand_guidance, DistanceHint, HandGuidance, Handedness};
pub use preprocessing::PixelSource;
pub use scale::{
    resolve_scale, AnthropometricReference, DepthFrame, DepthSource, ScaleMethod, ScaleOutcome,
    ScaledDiameter, ThicknessSource,
};
pub use sizing::{ring_size, RingSize, SizeMappingPolicy};
pub use stability::{StabilityFilter, StabilityPolicy, StabilityUpdate};
