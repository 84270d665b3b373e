/// S3 Standard monthly rate, dollars per GiB.
///
/// Kept as a flat constant rather than a pricing-table entry; storage is not
/// region-resolved the way compute is.
pub const STORAGE_RATE_PER_GB_MONTH: f64 = 0.023;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Per-vector metadata overhead in an S3 Vectors index, bytes.
const VECTOR_METADATA_BYTES: u64 = 100;

pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GIB
}

/// Estimated monthly cost of keeping `bytes` in standard storage.
pub fn storage_cost(bytes: u64) -> f64 {
    bytes_to_gib(bytes) * STORAGE_RATE_PER_GB_MONTH
}

/// Footprint of `count` float32 embeddings of `dimension` in a vector index.
pub fn estimate_vector_bytes(count: u64, dimension: u64) -> u64 {
    count.saturating_mul(dimension.saturating_mul(4) + VECTOR_METADATA_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bytes_cost_nothing() {
        assert_eq!(storage_cost(0), 0.0);
    }

    #[test]
    fn one_gib_costs_rate() {
        assert!((storage_cost(1 << 30) - 0.023).abs() < 1e-12);
        assert!((storage_cost(10 << 30) - 0.23).abs() < 1e-12);
    }

    #[test]
    fn cost_is_monotonic() {
        let sizes = [0u64, 1, 1023, 1 << 20, 5 << 30, 1 << 40, u64::MAX / 2];
        for pair in sizes.windows(2) {
            assert!(storage_cost(pair[0]) <= storage_cost(pair[1]));
        }
    }

    #[test]
    fn gib_conversion() {
        assert!((bytes_to_gib(512 << 20) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn vector_estimate() {
        // 1024 dims * 4 bytes + 100 metadata
        assert_eq!(estimate_vector_bytes(1, 1024), 4196);
        assert_eq!(estimate_vector_bytes(10, 1024), 41960);
        assert_eq!(estimate_vector_bytes(0, 1024), 0);
    }
}
