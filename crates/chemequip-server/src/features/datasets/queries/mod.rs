pub mod equipment;
pub mod get;
pub mod list;
pub mod report;
pub mod summary;

pub use equipment::{ListDatasetEquipmentError, ListDatasetEquipmentQuery};
pub use get::{DatasetDetail, GetDatasetError, GetDatasetQuery};
pub use list::{ListDatasetsError, ListDatasetsQuery};
pub use report::{GenerateReportError, GenerateReportQuery};
pub use summary::{DatasetSummaryError, DatasetSummaryQuery, DatasetSummaryResponse};
