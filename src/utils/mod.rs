//! Utility functions for loading probability channels, exporting results and
//! logging setup.

pub mod export;
pub mod image;
pub mod logging;

pub use export::{
    OutputNaming, difference_to_gray, labels_to_luma16, probability_to_gray, save_gray,
    save_label_map,
};
pub use image::{ProbabilityVolume, load_channel, load_volume, stack_channels};
pub use logging::init_tracing;
