pub mod archive;
pub mod backoff;
pub mod cache;
pub mod data_loader;
pub mod error;
pub mod fetcher;
pub mod transport;
pub mod url;

#[cfg(test)]
pub(crate) mod testing;
