//! # Voxel Streaming Demo Entry Point
//!
//! Calls into the library's `run()` function, which flies an observer through
//! a generated world and logs what the streaming pipeline does.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

fn main() {
    if let Err(error) = voxel_streaming::run() {
        log::error!("{}", error);
        std::process::exit(1);
    }
}
