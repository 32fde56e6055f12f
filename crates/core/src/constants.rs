use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Italian standard VAT rate, in percent.
pub const DEFAULT_VAT_RATE: Decimal = dec!(22);

/// Volumetric weight divisor (cm³ per kg).
pub const DEFAULT_VOLUMETRIC_DIVISOR: Decimal = dec!(5000);

/// Margin applied to new commercial quotes, in percent.
pub const DEFAULT_QUOTE_MARGIN_PERCENT: Decimal = dec!(20);

pub const DEFAULT_QUOTE_VALIDITY_DAYS: i32 = 30;

/// Decimal places of every monetary amount shown to a customer.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Attempts made when two revisions race for the same revision number.
pub const REVISION_INSERT_ATTEMPTS: usize = 3;

/// Synthetic parcel used for every rate probe, in centimetres and kilograms.
pub const PROBE_PARCEL_LENGTH_CM: Decimal = dec!(30);
pub const PROBE_PARCEL_WIDTH_CM: Decimal = dec!(20);
pub const PROBE_PARCEL_HEIGHT_CM: Decimal = dec!(15);

/// Zones probed together in a full matrix scan.
pub const MATRIX_ZONE_BATCH_SIZE: usize = 3;

pub const SYNC_BATCH_DELAY_MS: u64 = 1000;

pub const PROBE_TIMEOUT_SECS: u64 = 30;

/// Probes of one zone in flight at the same time.
pub const PROBE_CONCURRENCY: usize = 4;
