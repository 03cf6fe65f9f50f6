//! Pipeline services: the worker, its hosting client, and the retry pass

pub mod hosting;
pub mod retry;
pub mod worker;
