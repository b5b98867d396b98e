pub(crate) mod arena;
pub(crate) mod error;
pub(crate) mod handle;
pub(crate) mod region;
pub(crate) mod stats;

#[cfg(test)]
pub(crate) static TEST_MUTEX: std::sync::RwLock<()> = std::sync::RwLock::new(());
