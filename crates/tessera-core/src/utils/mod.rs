//! Small file system helpers shared by the catalog, storage and transport
//! layers.
pub mod fs;

#[cfg(test)]
mod tests;
