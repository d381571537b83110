use crate::error::{PipelineError, Result};

/// Splits `items` into consecutive slices of `size`; the last one holds the
/// remainder. Nothing is copied and no batch is produced for empty input.
pub fn batch<T>(items: &[T], size: usize) -> Result<std::slice::Chunks<'_, T>> {
    if size == 0 {
        return Err(PipelineError::InvalidArgument(
            "batch size must be positive".to_string(),
        ));
    }

    Ok(items.chunks(size))
}

pub fn batch_count(len: usize, size: usize) -> usize {
    if size == 0 {
        0
    } else {
        len.div_ceil(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenated_batches_reproduce_the_input() {
        for len in 0..20usize {
            let items: Vec<usize> = (0..len).collect();
            for size in 1..7usize {
                let batches: Vec<&[usize]> = batch(&items, size).expect("valid size").collect();
                assert_eq!(batches.len(), batch_count(len, size));
                assert_eq!(batches.concat(), items);
                assert!(batches.iter().all(|slice| !slice.is_empty() && slice.len() <= size));
            }
        }
    }

    #[test]
    fn last_batch_holds_the_remainder() {
        let items = ["a", "b", "c", "d", "e"];
        let sizes: Vec<usize> = batch(&items, 2)
            .expect("valid size")
            .map(|slice| slice.len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn empty_input_has_no_batches() {
        let items: [u8; 0] = [];
        assert_eq!(batch(&items, 3).expect("valid size").count(), 0);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            batch(&[1, 2, 3], 0),
            Err(PipelineError::InvalidArgument(_))
        ));
    }
}
