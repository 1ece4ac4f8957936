//! Stream-based recursive directory watcher built on [`inotify`](https://man7.org/linux/man-pages/man7/inotify.7.html).
//!
//! inotify watches single directories and does not recurse. [`DirWatcher`](DirWatcher) walks a
//! tree, watches every directory in it, follows directories as they come and go, and turns the
//! whole thing into one [`Stream`](futures_core::Stream) of file events.
//!
//! ## Features
//!
//! - Files present at startup are reported as `CREATE` events before any live event.
//! - New subdirectories are scanned as soon as they are seen, so files created in them before
//!   their watch was installed are still reported. Such files may be reported twice.
//! - Events about directories themselves are filtered out.
//! - The stream ends with exactly one [`FileEvent::EndOfStream`](FileEvent::EndOfStream) when
//!   the watched tree disappears, or silently when the supplied
//!   [`CancellationToken`](tokio_util::sync::CancellationToken) is cancelled.
//! - Other per-path primitives can be plugged in through [`WatchPrimitive`](WatchPrimitive).
//!
//! ## Example
//!
//! ```rust,no_run
//! use dirwatch_stream::{DirWatcher, EventMask};
//! use futures_util::StreamExt;
//! use tokio_util::sync::CancellationToken;
//! # #[cfg(feature = "tokio")]
//! # use tokio1 as tokio;
//! # #[cfg(feature = "async-std")]
//! # use async_std1 as async_std;
//! #
//! # #[cfg(feature = "async-std")]
//! # #[async_std::main]
//! # async fn main() {
//! #     run().await;
//! # }
//! #
//! # #[cfg(feature = "tokio")]
//! # #[tokio::main]
//! # async fn main() {
//! #     run().await;
//! # }
//!
//! # async fn run() {
//! let ctx = CancellationToken::new();
//! let mut watcher = DirWatcher::new(&ctx, EventMask::ALL_EVENTS, ".")
//!     .expect("watcher to be created");
//!
//! while let Some(event) = watcher.next().await {
//!     println!("{}", event);
//! }
//! # }
//! ```
//!
//! ## Runtime Support
//!
//! Both [`tokio`](https://github.com/tokio-rs/tokio) and [`async-std`](https://github.com/async-rs/async-std) are supported
//! via feature flags.
//!
//! `tokio` support is enabled by default. To enable `async-std` support, disable default features and enable `async-std`
//! feature.
//!
//! ## License
//!
//! This project is licensed under MIT License.

pub use error::{Error, Result};
pub use events::FileEvent;
pub use flags::EventMask;
#[cfg(target_os = "linux")]
pub use inotify::{Inotify, InotifyInterrupt};
pub use primitive::{Interrupt, RawEvent, WatchDescriptor, WatchPrimitive};
pub use watcher::DirWatcher;

mod error;
mod events;
#[cfg(test)]
mod fake;
#[cfg(target_os = "linux")]
mod ffi;
pub mod flags;
#[cfg(target_os = "linux")]
pub mod inotify;
mod installer;
pub mod primitive;
mod translate;
mod watcher;
