use crate::engine::error::EngineError;

/// Allocates a vector of `len` copies of `value`, reporting failure instead of aborting.
pub(crate) fn try_filled<T: Clone>(
    what: &'static str,
    len: usize,
    value: T,
) -> Result<Vec<T>, EngineError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| EngineError::Allocation {
            what,
            requested: len,
        })?;
    buffer.resize(len, value);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_filled_produces_requested_length() {
        let buffer = try_filled("test buffer", 5, 1.5).unwrap();
        assert_eq!(buffer, vec![1.5; 5]);
    }

    #[test]
    fn try_filled_reports_impossible_requests() {
        let result = try_filled("huge buffer", usize::MAX, 0.0f64);
        assert!(matches!(
            result,
            Err(EngineError::Allocation {
                what: "huge buffer",
                ..
            })
        ));
    }
}
