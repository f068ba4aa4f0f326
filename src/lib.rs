mod acquisition;
mod error;
mod normalize;
mod nyiso;
mod report;
mod types;
mod utils;

pub use error::{ConfigError, NyisoError};
pub use nyiso::*;

pub use acquisition::backoff::BackoffPolicy;
pub use acquisition::cache::LocalCache;
pub use acquisition::error::{ArchiveError, CacheError, FetchError};
pub use acquisition::transport::{HttpTransport, Transport};
pub use acquisition::url::UrlBuilder;

pub use normalize::clean;
pub use normalize::error::NormalizeError;
pub use normalize::normalizer::{canonicalize_zone, normalize, COL_FUEL_TYPE, COL_TIMESTAMP, COL_ZONE};
pub use normalize::outliers::{flag_outliers, outlier_column_name};
pub use normalize::reshape::{pivot_zones, resample_hourly};

pub use report::{FetchEvent, LogReporter, RecordingReporter, Reporter};

pub use types::dataset::{DatasetDescriptor, Granularity, UrlRule};
pub use types::period::{Period, PeriodRange};
pub use types::registry::{DatasetRegistry, NYISO_BASE_URL, NYISO_TIMEZONE, NYISO_ZONES};
