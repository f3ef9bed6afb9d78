//! Synthetic training-image generator: paste a random material cut-out onto the non-black
//! region of each target image.
//!
//! The per-image work is [`composite`]: mask extraction, slight desaturation of the lit area,
//! placement planning, material resize/fade and masked over-compositing. [`run_batch`] drives
//! it over a directory of targets.
#![forbid(unsafe_code)]

pub mod batch;
pub mod composite_cpu;
pub mod foundation;
pub mod geometry;
pub mod mask;
pub mod material;
pub mod pipeline;
pub mod rename;
pub mod saturation;

pub use batch::{BatchConfig, BatchReport, list_pngs, process_target, run_batch, write_report};
pub use foundation::core::{BoundingBox, PlacementPlan};
pub use foundation::error::{OverlayError, OverlayResult};
pub use geometry::{PlacementMode, ScaleRange};
pub use mask::{BLACK_THRESHOLD, Mask};
pub use pipeline::{CompositeOutcome, CompositeParams, composite};
pub use rename::{RenameReport, rename_pngs};
