//! Test support: a throwaway database per test and the services wired onto it.

mod context;
mod helpers;

pub(crate) use context::TestContext;
