pub mod consumer;
pub mod error;
pub mod producer;
pub mod retry;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_utils;
