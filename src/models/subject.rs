/// Subject names compare case-insensitively: "Math" and "MATH" are one subject.
pub fn same_subject(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
