pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Read a document from `--input`, or from piped stdin when no path is given.
/// `None` when neither is present.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => file::read_document(p).map(Some),
        None => stdin::read_stdin(),
    }
}
