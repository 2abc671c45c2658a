//! Image references used when fuzzing argument round-trips.

pub const SAMPLE_SOURCES: &[&str] = &[
    "images/cat.png",
    "/images/photo one.jpg",
    "https://www.example.com/pics/dog.webp",
    "https://cdn.test/a/b.gif?size=large&v=2",
    "//cdn.test/protocol-relative.bmp",
];

pub fn arbitrary_source(u: &mut arbitrary::Unstructured) -> arbitrary::Result<String> {
    Ok((*u.choose(SAMPLE_SOURCES)?).to_string())
}

pub fn arbitrary_timeout(
    u: &mut arbitrary::Unstructured,
) -> arbitrary::Result<Option<std::time::Duration>> {
    if u.arbitrary()? {
        let secs = u.int_in_range(1..=300)?;
        Ok(Some(std::time::Duration::from_secs(secs)))
    } else {
        Ok(None)
    }
}
