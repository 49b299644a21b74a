//! Default labels for rows and columns of problem data

/// Generate `count` labels of the form "{prefix}{index}", starting at 1
pub(crate) fn default_names(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{prefix}{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_one_based_labels() {
        assert_eq!(default_names("x", 3), vec!["x1", "x2", "x3"]);
        assert_eq!(default_names("Worker ", 1), vec!["Worker 1"]);
        assert!(default_names("x", 0).is_empty());
    }
}
