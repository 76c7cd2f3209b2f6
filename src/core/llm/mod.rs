//! Optional generative augmentation of the deterministic diagram
//!
//! A provider is asked once for an alternative diagram. Every failure is
//! classified, reported to a notification sink, and answered with the
//! deterministic diagram unchanged.

mod augmenter;
mod failure;
mod providers;

pub use augmenter::{
    validate_diagram, AugmentOutcome, AugmentRequest, DiagramAugmenter, DiagramSource,
    GenerativeAugmenter,
};
pub use failure::{AugmentFailure, FailureReason};
pub use providers::{create_augmenter, ChatCompletionsProvider};
