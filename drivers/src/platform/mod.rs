//! Platform Abstraction Layer
//!
//! Platform-specific MMIO drivers implementing the [`crate::hal`] traits.
//! The platform is selected with a Cargo feature.

// Platform selection based on Cargo features
cfg_if::cfg_if! {
    if #[cfg(feature = "t210")] {
        pub mod t210;
    } else {
        compile_error!(
            "No platform selected!\n\
            Use: cargo build --features t210"
        );
    }
}
