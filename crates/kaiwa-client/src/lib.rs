//! Headless messaging controllers: the conversation list, one open thread,
//! and the participant finder, plus the store/feed boundary traits they sit
//! on. The same controllers drive an in-process store (tests, embedded use)
//! or the REST surface via [`remote::RemoteStore`].

pub mod feed;
pub mod finder;
pub mod list;
pub mod remote;
pub mod store;
pub mod thread;

#[cfg(test)]
mod testing;
