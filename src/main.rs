//! # bio-tissue runner
//!
//! Headless entry point: grows one embryo and logs its development.
//!
//! ```text
//! RUST_LOG=info bio-tissue [run.ron]
//! ```
//!
//! See [`bio_tissue::app::RunConfig`] for the file format.

fn main() {
    bio_tissue::app::run();
}
