use rand::Rng;

/// Temporary-password alphabet: letters, digits, and symbols.
const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_+";

/// Generate a random temporary password.
///
/// Delivered to the fresher in cleartext by design (see DESIGN.md for
/// the flagged alternative of a one-time reset link).
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_alphabet() {
        let pw = generate_password(10);
        assert_eq!(pw.len(), 10);
        assert!(pw.bytes().all(|b| CHARSET.contains(&b)));
    }

    #[test]
    fn test_not_constant() {
        // Two draws colliding at length 32 would mean a broken RNG.
        assert_ne!(generate_password(32), generate_password(32));
    }
}
