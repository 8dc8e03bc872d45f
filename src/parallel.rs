/// How the data-parallel stage loops execute.
///
/// Every stage is written as a per-item kernel and dispatched through one of
/// these. `Sequential` runs the items in index order, which makes the P2G
/// scatter bit-for-bit deterministic -- the tests use it for exactly that
/// reason. `Threaded` runs the same kernels on the rayon thread pool; the
/// only cross-item hazard in the pipeline (the P2G scatter) is handled there
/// by merging per-worker grid buffers, so results agree with the sequential
/// backend up to floating-point summation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Backend {
    Sequential,
    Threaded,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Threaded
    }
}

/// Minimum number of items a rayon job gets before splitting. The per-item
/// kernels are tiny; without this the scheduling overhead swamps them.
pub const MIN_CHUNK: usize = 128;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_roundtrips_through_serde() {
        let json = serde_json::to_string(&Backend::Sequential).unwrap();
        let back: Backend = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Backend::Sequential);
    }
}
