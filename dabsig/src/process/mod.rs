/// Fast Information Channel decoding.
///
/// Provides the [`FibProcessor`](fic::FibProcessor) for folding Fast
/// Information Blocks into the live ensemble configuration and querying it.
pub mod fic;

/// MOT object reassembly.
///
/// Provides the [`MotManager`](mot::MotManager) for rebuilding segmented
/// MOT objects from MSC data groups.
pub mod mot;
