#![forbid(unsafe_code)]
//! rangeline-io: object-store adapters and the ranged record reader.
//!
//! `RangedRecordReader` pulls an object through a `RemoteObjectStore` in
//! bounded, byte-inclusive ranges and feeds the bytes to the core
//! `RecordSplitter`. Adapters live under `store`.

pub mod location;
pub mod reader;
pub mod store;
pub mod telemetry;

pub use location::ObjectLocation;
pub use reader::{planned_fetches, RangedRecordReader, ReadStats, ReaderOptions, Record, Records, Step};
pub use store::{
    build_store_from_config, ByteStream, FsObjectStore, MemoryObjectStore, RemoteObjectStore,
    RetryConfig,
};

#[cfg(any(feature = "s3", feature = "gcs", feature = "azure"))]
pub use store::{CloudObjectStore, CloudStoreBuilderError};
