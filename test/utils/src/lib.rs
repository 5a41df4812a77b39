/// Path to a document under `test/fixtures`, relative to the crate root.
pub fn fixture_path(name: &str) -> String {
    return format!("./test/fixtures/{name}");
}

/// Fixture documents that are safe to upload, in a stable order.
pub fn document_fixtures() -> Vec<String> {
    return [
        "alpha.txt",
        "beta.txt",
        "gamma.pdf",
        "delta.txt",
        "epsilon.txt",
        "zeta.txt",
    ]
    .iter()
    .map(|name| return fixture_path(name))
    .collect();
}

pub fn json_header() -> (&'static str, &'static str) {
    return ("content-type", "application/json");
}
