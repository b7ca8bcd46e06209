pub mod imei;
pub mod luhn;
pub mod media;
pub mod report;
pub mod scan;

pub use imei::Imei;
pub use luhn::{LuhnError, IMEI_LEN};
pub use media::{MediaKind, UnsupportedMediaType, UploadedDocument};
pub use report::{ExtractionMethod, ExtractionResult, ImeiReport};
