/// Short base-36 id used to correlate a request across log lines.
pub fn gen_request_id(length: usize) -> String {
    std::iter::repeat_with(|| fastrand::u32(0..36))
        .take(length)
        .filter_map(|digit| char::from_digit(digit, 36))
        .collect()
}

/// Joins a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
