//! # Backdrops
//!
//! The decorative fill the recording is framed on: the editor's gradient
//! presets, flat colours and picture files.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use screen_studio::backgrounds::BackdropRegistry;
//! use screen_studio::video::Frame;
//!
//! let registry = BackdropRegistry::new();
//! let backdrop = registry.preset(3).unwrap();
//!
//! let mut frame = Frame::new_filled(1280, 720, [255, 255, 255, 255]);
//! backdrop.paint(&mut frame).unwrap();
//! ```

pub mod fill;
pub mod palette;
pub mod picture;
pub mod registry;
pub mod traits;

pub use fill::{LinearGradient, RadialGradient, RadialShape, SolidBackdrop};
pub use picture::ImageBackdrop;
pub use registry::{preset_name, BackdropRegistry, PRESET_COUNT};
pub use traits::{Backdrop, ColorStop};
