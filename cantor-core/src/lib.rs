//! # 🎵 cantor-core — Motion Curves
//!
//! Data model and pure transforms for driving servo "mouths" from a
//! pre-computed motion curve per channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 cantor-core                          │
//! │  ┌────────────┐   ┌────────────────┐                 │
//! │  │ MotionCurve│ → │ RateLimitFilter│ → stored curve  │
//! │  │ (t, p)*    │   │ (min dwell)    │                 │
//! │  └────────────┘   └────────────────┘                 │
//! │        ↑                    ↓                        │
//! │  ┌────────────┐   ┌────────────────┐                 │
//! │  │  Recorder  │   │ io / library   │  <song>_<ch>.json│
//! │  │ press/rel. │   │ read, write    │                 │
//! │  └────────────┘   └────────────────┘                 │
//! └──────────────────────────────────────────────────────┘
//!                          ↓
//!                  cantor-sync (SyncPlayer)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use cantor_core::{MotionCurve, RateLimitFilter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = MotionCurve::from_pairs([(0.0, 0.0), (0.1, 1.0), (0.2, 1.0), (0.3, 0.0)])?;
//! let filtered = RateLimitFilter::new(0.15).apply(raw);
//!
//! // the rise at 0.1 s comes too soon after the start and is held back
//! assert_eq!(filtered.position_at(0.1), 0.0);
//! assert_eq!(filtered.len(), 4);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod channel;
pub mod curve;
pub mod filter;
pub mod io;
pub mod library;
pub mod recorder;

pub use error::{CurveError, CurveResult};
pub use channel::{ChannelId, ChannelMap};
pub use curve::{MotionCurve, Sample, clamp_position};
pub use filter::{RateLimitFilter, DEFAULT_MIN_DWELL_MS};
pub use library::{CurveLibrary, SongCurves};
pub use recorder::{KeyAction, KeyEvent, MovementRecorder};

/// Re-exports for downstream crates
pub mod prelude {
    pub use crate::channel::{ChannelId, ChannelMap};
    pub use crate::curve::{MotionCurve, Sample};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::filter::RateLimitFilter;
}
