use std::env;
use std::path::PathBuf;

#[cfg(feature = "async-std")]
use async_std1 as async_std;
use futures_util::StreamExt;
use log::info;
#[cfg(feature = "tokio")]
use tokio1 as tokio;
use tokio_util::sync::CancellationToken;

use dirwatch_stream::{DirWatcher, EventMask};

#[cfg(feature = "tokio")]
#[tokio::main]
async fn main() {
    run().await;
}

#[cfg(feature = "async-std")]
#[async_std::main]
async fn main() {
    run().await;
}

async fn run() {
    pretty_env_logger::init();
    let root = env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("./"), PathBuf::from);

    let ctx = CancellationToken::new();
    let mut watcher =
        DirWatcher::new(&ctx, EventMask::ALL_EVENTS, &root).expect("watcher to be created");
    while let Some(event) = watcher.next().await {
        info!("{}", event);
    }
}
