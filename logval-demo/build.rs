//! Generates the provider tables for this crate.

fn main() {
    if let Err(e) = logval_build::generate() {
        panic!("logval provider generation failed: {e}");
    }
}
