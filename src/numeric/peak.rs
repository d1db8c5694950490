//! Peak finding over `f32` arrays (used for constant-Q argmax checks and
//! onset-style curve analysis in tests and downstream consumers).

/// Index of the maximum value, or `None` for an empty slice.
pub fn argmax(v: &[f32]) -> Option<usize> {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

/// Indices of local maxima: `v[i] > v[i-1]` and `v[i] > v[i+1]`.
/// Endpoints are never peaks.
pub fn local_maxima(v: &[f32]) -> Vec<usize> {
    if v.len() < 3 {
        return Vec::new();
    }
    (1..v.len() - 1)
        .filter(|&i| v[i] > v[i - 1] && v[i] > v[i + 1])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_finds_the_peak() {
        assert_eq!(argmax(&[0.0, 3.0, 1.0]), Some(1));
    }

    #[test]
    fn argmax_of_empty_is_none() {
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn local_maxima_ignores_endpoints() {
        let v = [5.0, 1.0, 2.0, 1.0, 5.0];
        assert_eq!(local_maxima(&v), vec![2]);
    }
}
