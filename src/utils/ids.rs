use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Globally-unique record id: millisecond timestamp plus a random
/// alphanumeric suffix. Sorts roughly by creation time as a side effect.
pub fn generate_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("{}{}", Utc::now().timestamp_millis(), suffix.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_suffixed() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert!(a.len() > 13);
    }
}
