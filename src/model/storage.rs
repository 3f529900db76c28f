use serde::Deserialize;

#[derive(Clone, Debug)]
pub struct Session {
    pub storage_url: String,
    pub token: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StorageFile {
    pub name: String,
    pub content: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Listing {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

// Listing pages carry more fields (bytes, hash, last_modified); only the
// name is consumed.
#[derive(Clone, Debug, Deserialize)]
pub struct ListEntry {
    pub name: String,
}
